use log::{debug, info, warn};
use smallvec::SmallVec;
use std::time::Instant;

use crate::error::{Endpoint, Result};
use crate::field::ObstacleField;
use crate::point::Point;
use crate::search::SearchContext;
use crate::solver::{validate_endpoint, GridSolver, Plan, SearchStats};
use crate::N_SMALLVEC_SIZE;

enum Step {
    Exhausted,
    Expanded,
    /// Index of the meeting node on the stepping side, then on the other side.
    Met(usize, usize),
}

/// Meet-in-the-middle A*: a forward search from the start and a backward search
/// from the goal expand one node each in strict alternation until a node closed
/// by one side is closed by the other.
///
/// The first meeting point is returned as is, so paths are optimal when the
/// heuristic is exact (an open grid) and may be slightly longer around
/// obstacles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BidirectionalAstarSolver;

impl BidirectionalAstarSolver {
    pub fn new() -> BidirectionalAstarSolver {
        BidirectionalAstarSolver
    }

    /// Closes the next node of `side` and looks for it among the nodes closed by
    /// `other`.
    fn step<F: ObstacleField>(
        &self,
        field: &F,
        side: &mut SearchContext<Point, i32>,
        other: &SearchContext<Point, i32>,
        target: &Point,
    ) -> Step {
        let Some(index) = side.pop() else {
            return Step::Exhausted;
        };
        let (node, g) = match (side.key(index), side.node(index)) {
            (Some(key), Some(node)) => (*key, node.g),
            _ => return Step::Exhausted,
        };
        if let Some(other_index) = other.closed_index(&node) {
            return Step::Met(index, other_index);
        }
        for (successor, cost) in self.successors(field, &mut (), None, &node, target) {
            side.relax(successor, index, g + cost, |p| self.heuristic(p, target));
        }
        Step::Expanded
    }
}

impl GridSolver for BidirectionalAstarSolver {
    type Scratch = ();
    type Successors = SmallVec<[(Point, i32); N_SMALLVEC_SIZE]>;

    fn name(&self) -> &'static str {
        "bidirectional A*"
    }

    /// Moves are symmetric, so both sides use the plain neighbourhood.
    fn successors<F: ObstacleField>(
        &self,
        field: &F,
        _scratch: &mut (),
        _parent: Option<&Point>,
        node: &Point,
        _goal: &Point,
    ) -> Self::Successors {
        field.neighborhood_points_and_cost(node)
    }

    fn get_waypoints<F: ObstacleField>(
        &self,
        field: &F,
        start: Point,
        goal: Point,
    ) -> Result<Plan<Point>> {
        validate_endpoint(field, start, Endpoint::Start)?;
        validate_endpoint(field, goal, Endpoint::Goal)?;
        let timer = Instant::now();
        let mut stats = SearchStats::default();
        if field.unreachable(&start, &goal) {
            info!("{start} and {goal} are not connected, skipping search");
            stats.elapsed = timer.elapsed();
            return Ok(Plan::new(None, stats));
        }
        debug!("{}: searching from {start} to {goal}", self.name());
        let cap = field.width() * field.height();
        let mut forward: SearchContext<Point, i32> = SearchContext::new(cap);
        let mut backward: SearchContext<Point, i32> = SearchContext::new(cap);
        forward.push_start(start, self.heuristic(&start, &goal));
        backward.push_start(goal, self.heuristic(&goal, &start));

        let meeting = loop {
            match self.step(field, &mut forward, &backward, &goal) {
                Step::Met(f, b) => break Some((f, b)),
                Step::Expanded => {}
                Step::Exhausted => break None,
            }
            match self.step(field, &mut backward, &forward, &start) {
                Step::Met(b, f) => break Some((f, b)),
                Step::Expanded => {}
                Step::Exhausted => break None,
            }
        };
        if forward.capped() || backward.capped() {
            warn!("{}: expansion cap of {cap} reached", self.name());
        }

        // Forward chain up to the meeting node, then the backward chain from the
        // node after it down to the goal.
        let path = meeting.map(|(f, b)| {
            let mut path = forward.reverse_path(f);
            path.extend(backward.ancestors(b).skip(1).copied());
            path
        });
        stats.forward_expanded = forward.expanded();
        stats.backward_expanded = backward.expanded();
        stats.nodes_explored = stats.forward_expanded + stats.backward_expanded;
        stats.iterations = forward.iterations() + backward.iterations();
        stats.elapsed = timer.elapsed();
        Ok(Plan::new(path, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_map::GridMap;
    use crate::solver::astar::AstarSolver;

    #[test]
    fn equal_start_goal() {
        let grid = GridMap::new(3, 3, false);
        let start = Point::new(1, 2);
        let plan = BidirectionalAstarSolver
            .get_path(&grid, start, start)
            .unwrap();
        assert_eq!(plan.path, Some(vec![start]));
        assert!(plan.stats.nodes_explored >= 1);
    }

    #[test]
    fn open_grid_is_optimal() {
        let grid = GridMap::new(12, 8, false);
        for (start, goal) in [
            (Point::new(0, 0), Point::new(11, 7)),
            (Point::new(11, 0), Point::new(0, 5)),
            (Point::new(3, 3), Point::new(4, 3)),
        ] {
            let plan = BidirectionalAstarSolver
                .get_path(&grid, start, goal)
                .unwrap();
            let path = plan.path.as_ref().unwrap();
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&goal));
            let astar = AstarSolver.get_path(&grid, start, goal).unwrap();
            assert_eq!(plan.cost(), astar.cost());
        }
    }

    #[test]
    fn stitched_path_is_connected() {
        let mut grid = GridMap::new(9, 9, false);
        grid.set_rect(Point::new(4, 0), 1, 7, true);
        let plan = BidirectionalAstarSolver
            .get_path(&grid, Point::new(0, 0), Point::new(8, 0))
            .unwrap();
        let path = plan.path.unwrap();
        for w in path.windows(2) {
            assert!(grid.can_move_to(w[1], w[0]), "illegal step {} -> {}", w[0], w[1]);
        }
        // No cell is visited twice around the meeting point.
        let mut cells = path.clone();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), path.len());
    }

    #[test]
    fn walled_off_goal_is_not_found() {
        let mut grid = GridMap::new(5, 5, false);
        grid.set_rect(Point::new(2, 0), 1, 5, true);
        let plan = BidirectionalAstarSolver
            .get_path(&grid, Point::new(0, 0), Point::new(4, 4))
            .unwrap();
        assert!(plan.path.is_none());
    }

    /// The side with the smaller region runs dry first; the other side must not
    /// have raced ahead of it.
    #[test]
    fn sides_take_turns() {
        let mut grid = GridMap::new(5, 5, false);
        grid.set_rect(Point::new(1, 0), 1, 5, true);
        let plan = BidirectionalAstarSolver
            .get_path(&grid, Point::new(0, 0), Point::new(4, 4))
            .unwrap();
        assert!(plan.path.is_none());
        let stats = &plan.stats;
        assert_eq!(stats.forward_expanded, 5);
        assert_eq!(stats.backward_expanded, 5);
        assert_eq!(stats.nodes_explored, 10);

        let open = GridMap::new(9, 9, false);
        for (start, goal) in [
            (Point::new(0, 0), Point::new(8, 8)),
            (Point::new(0, 4), Point::new(8, 4)),
            (Point::new(2, 7), Point::new(3, 7)),
        ] {
            let stats = BidirectionalAstarSolver
                .get_path(&open, start, goal)
                .unwrap()
                .stats;
            let (f, b) = (stats.forward_expanded, stats.backward_expanded);
            assert!(f.abs_diff(b) <= 1, "forward {f}, backward {b}");
            assert_eq!(f + b, stats.nodes_explored);
        }
    }
}
