use grid_planner::{AstarSolver, GridMap, Planner, Point};

// In this example a path is found on a grid with shape
// #####
// #S  #
// # # #
// #  E#
// #####
// S marks the start
// E marks the end
fn main() {
    env_logger::init();
    let mut grid = GridMap::new(5, 5, true);
    grid.set_rect(Point::new(1, 1), 3, 3, false);
    grid.set(2, 2, true);
    grid.generate_components();
    println!("{}", grid);
    let start = Point::new(1, 1);
    let end = Point::new(3, 3);
    match AstarSolver.find_path(&grid, start, end) {
        Ok(plan) => {
            if let Some(path) = plan.path {
                println!("A path has been found:");
                for p in path {
                    println!("{}", p);
                }
            }
        }
        Err(e) => eprintln!("{}", e),
    }
}
