use grid_planner::{JpsSolver, ObstacleMap, Planner, Point};

/// Replans every tick while an obstacle sweeps up and down through a corridor. The
/// planner always runs on a snapshot so the obstacle layout is fixed during a query.
fn main() {
    env_logger::init();
    let mut map = ObstacleMap::new(30, 10);
    map.add_static_rect(Point::new(10, 0), 1, 4);
    map.add_static_rect(Point::new(20, 6), 1, 4);
    let start = Point::new(0, 5);
    let goal = Point::new(29, 5);
    let solver = JpsSolver::new();
    for tick in 0..10 {
        let y = tick as i32;
        map.set_dynamic((13..17).map(|x| Point::new(x, y)));
        let snapshot = map.snapshot();
        match solver.find_path(&snapshot, start, goal) {
            Ok(plan) => println!(
                "tick {}: cost {:?} with {} nodes explored",
                tick,
                plan.cost(),
                plan.stats.nodes_explored
            ),
            Err(e) => println!("tick {}: {}", tick, e),
        }
    }
}
