use grid_planner::{waypoints_to_path, GridMap, GridSolver, JpsSolver, Point};

/// This example illustrates the type of output [JpsSolver::find_waypoints] gives: a minimal
/// representation of the path made of jump points, which [waypoints_to_path] expands.
/// A path is found on a 5x5 grid with shape
/// S
///  #
///
///
///     E
/// where
/// - S marks the start
/// - E marks the end
fn main() {
    env_logger::init();
    let mut grid = GridMap::new(5, 5, false);
    grid.set(1, 1, true);
    grid.generate_components();
    println!("{}", grid);
    let start = Point::new(0, 0);
    let end = Point::new(4, 4);
    let solver = JpsSolver::new();
    let plan = solver.find_waypoints(&grid, start, end).unwrap();
    if let Some(waypoints) = plan.path {
        println!("Unexpanded path:");
        for p in &waypoints {
            println!("{}", p);
        }
        println!("Expanded path:");
        for p in waypoints_to_path(waypoints) {
            println!("{}", p);
        }
    }
    // get_path expands the waypoints automatically.
    let expanded = solver.get_path(&grid, start, end).unwrap();
    println!("{:?}", expanded.path);
}
