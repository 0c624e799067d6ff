use grid_planner::solver::convert_cost_to_unit_cost_float;
use grid_planner::{GridMap, GridStrategy, Planner, Point};
use std::env;

/// Runs every grid planner (or the ones named on the command line, e.g. `jps astar`) on a
/// 50x50 grid with a single 5x5 block and prints cost and search effort.
fn main() {
    env_logger::init();
    let strategies: Vec<GridStrategy> = {
        let names: Vec<String> = env::args().skip(1).collect();
        if names.is_empty() {
            GridStrategy::ALL.to_vec()
        } else {
            match names
                .iter()
                .map(|n| n.parse::<GridStrategy>())
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(strategies) => strategies,
                Err(e) => {
                    eprintln!("{}", e);
                    return;
                }
            }
        }
    };
    let mut grid = GridMap::new(50, 50, false);
    grid.set_rect(Point::new(20, 20), 5, 5, true);
    grid.generate_components();
    let start = Point::new(0, 0);
    let end = Point::new(49, 49);
    for strategy in strategies {
        let plan = match strategy.find_path(&grid, start, end) {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("{}: {}", strategy.name(), e);
                continue;
            }
        };
        let cost = plan.cost().map(convert_cost_to_unit_cost_float);
        println!(
            "{:>18}: cost {:?}, {} nodes explored, {} jump calls, {} sight checks, {} cells, {:?}",
            strategy.name(),
            cost,
            plan.stats.nodes_explored,
            plan.stats.jump_calls,
            plan.stats.sight_checks,
            plan.stats.path_length,
            plan.stats.elapsed
        );
    }
}
