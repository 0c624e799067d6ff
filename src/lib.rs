//! # grid_planner
//!
//! Path planning on 8-connected occupancy grids and in the continuous plane
//! covered by them. Offers interchangeable planners behind one
//! [Planner] interface:
//!
//! - [AstarSolver]: plain A* with the octile heuristic.
//! - [BidirectionalAstarSolver]: two alternating A* frontiers meeting in the middle.
//! - [JpsSolver]: [Jump Point Search](https://en.wikipedia.org/wiki/Jump_point_search)
//!   with memoized rays, returning the same costs as A* with far fewer expansions.
//! - [VisibilityGraphSolver]: A* over obstacle corners linked by lines of sight,
//!   again at the cost A* finds.
//! - [RrtSolver]: a goal-biased Rapidly-exploring Random Tree with periodic
//!   pruning and shortcut smoothing.
//!
//! Every planner reads obstacles through [ObstacleField]. Diagonal moves are
//! allowed unless both orthogonal cells they pass between are blocked. A
//! [GridMap] can pre-compute
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! so that queries without a solution return without searching.
pub mod error;
pub mod field;
pub mod grid_map;
pub mod line;
pub mod optimizer;
pub mod point;
pub mod search;
pub mod solver;

pub use error::{Endpoint, PlanError, Result};
pub use field::{ObstacleField, ObstacleMap};
pub use grid_map::GridMap;
pub use point::{Direction, Point, Vec2};
pub use solver::astar::AstarSolver;
pub use solver::bidirectional::BidirectionalAstarSolver;
pub use solver::jps::JpsSolver;
pub use solver::rrt::{RrtConfig, RrtRun, RrtSolver, RrtTree};
pub use solver::visibility::VisibilityGraphSolver;
pub use solver::{GridSolver, GridStrategy, Plan, Planner, SearchStats};

/// Cost of a straight (cardinal) move.
pub const C: i32 = 10;
/// Cost of a diagonal move, `C * sqrt(2)` rounded.
pub const D: i32 = 14;
pub const N_SMALLVEC_SIZE: usize = 8;

/// Turns waypoints into a path on the grid which can be followed step by step. Due to symmetry this
/// is typically one of many ways to follow the waypoints. Between two waypoints the path moves
/// diagonally first and straight after.
pub fn waypoints_to_path(waypoints: Vec<Point>) -> Vec<Point> {
    let mut waypoints = waypoints.into_iter();
    let mut current = match waypoints.next() {
        Some(first) => first,
        None => return Vec::new(),
    };
    let mut path: Vec<Point> = vec![current];
    for next in waypoints {
        while current.move_distance(&next) >= 1 {
            let delta = current.dir(&next);
            current = current + delta;
            path.push(current);
        }
    }
    path
}
