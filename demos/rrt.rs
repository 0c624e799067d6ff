use grid_planner::solver::polyline_length;
use grid_planner::{ObstacleMap, Point, RrtConfig, RrtSolver, Vec2};

/// Grows an RRT through a gap in a wall and compares the raw tree path with the
/// shortcut one.
fn main() {
    env_logger::init();
    let mut map = ObstacleMap::new(40, 30);
    map.add_static_rect(Point::new(18, 0), 2, 22);
    map.add_static_rect(Point::new(28, 10), 2, 20);
    let solver = RrtSolver::new(RrtConfig::default().with_seed(42)).unwrap();
    let start = Vec2::new(2.5, 2.5);
    let goal = Vec2::new(37.5, 27.5);
    let run = solver.grow_tree(&map, start, goal).unwrap();
    println!(
        "Tree of {} nodes after {} iterations",
        run.tree.len(),
        run.stats.iterations
    );
    match run.raw_path() {
        Some(raw) => {
            let smooth = grid_planner::optimizer::shortcut_polyline(&map, &raw);
            println!("Raw path: {} points, length {:.2}", raw.len(), polyline_length(&raw));
            println!(
                "Shortcut path: {} points, length {:.2}",
                smooth.len(),
                polyline_length(&smooth)
            );
            for p in smooth {
                println!("{}", p);
            }
        }
        None => println!("No path found"),
    }
}
