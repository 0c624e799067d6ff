//! [Jump Point Search](https://en.wikipedia.org/wiki/Jump_point_search) for
//! grids where a diagonal step is allowed unless both cells it passes between
//! are blocked.
//!
//! Instead of queueing every neighbour, a node's successors are found by
//! casting rays in the directions that cannot be reached more cheaply through
//! the parent, stopping at the first *jump point*: the goal, a cell with a
//! forced neighbour, or (for diagonal rays) a cell from which a straight ray
//! finds one. Rays are memoized per query so the straight scans that every
//! diagonal step triggers are only walked once.
use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::error::Result;
use crate::field::ObstacleField;
use crate::point::{Direction, Point};
use crate::solver::{octile_distance, GridSolver, Plan};
use crate::N_SMALLVEC_SIZE;

/// Ray results of a single query, keyed by ray origin and direction.
#[derive(Clone, Debug, Default)]
pub struct JumpCache {
    memo: FxHashMap<(Point, Direction), Option<Point>>,
    jump_calls: usize,
}

impl JumpCache {
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Ray steps actually walked, memoized lookups excluded.
    pub fn jump_calls(&self) -> usize {
        self.jump_calls
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JpsSolver;

impl JpsSolver {
    pub fn new() -> JpsSolver {
        JpsSolver
    }

    /// The jump points from start to goal, without expanding them into cells.
    pub fn find_waypoints<F: ObstacleField>(
        &self,
        field: &F,
        start: Point,
        goal: Point,
    ) -> Result<Plan<Point>> {
        self.get_waypoints(field, start, goal)
    }

    /// Whether `node`, entered by moving in `dir`, has a neighbour that is only
    /// reached optimally through it.
    fn is_forced<F: ObstacleField>(field: &F, node: &Point, dir: Direction) -> bool {
        let (dx, dy) = (dir.x(), dir.y());
        let (x, y) = (node.x, node.y);
        let b = |x, y| field.is_blocked(x, y);
        if dir.diagonal() {
            (b(x - dx, y) && !b(x - dx, y + dy)) || (b(x, y - dy) && !b(x + dx, y - dy))
        } else if dx != 0 {
            (b(x, y + 1) && !b(x + dx, y + 1)) || (b(x, y - 1) && !b(x + dx, y - 1))
        } else {
            (b(x + 1, y) && !b(x + 1, y + dy)) || (b(x - 1, y) && !b(x - 1, y + dy))
        }
    }

    /// Directions worth following from `node` when it was entered moving in
    /// `dir`: the natural ones plus those made necessary by blocked cells.
    fn pruned_directions<F: ObstacleField>(
        field: &F,
        node: &Point,
        dir: Direction,
    ) -> SmallVec<[Direction; 5]> {
        let (dx, dy) = (dir.x(), dir.y());
        let (x, y) = (node.x, node.y);
        let mut dirs: SmallVec<[Direction; 5]> = SmallVec::new();
        dirs.push(dir);
        if dir.diagonal() {
            dirs.push(dir.x_dir());
            dirs.push(dir.y_dir());
            if field.is_blocked(x - dx, y) {
                dirs.push(Point::new(-dx, dy).abs_dir());
            }
            if field.is_blocked(x, y - dy) {
                dirs.push(Point::new(dx, -dy).abs_dir());
            }
        } else if dx != 0 {
            for side in [-1, 1] {
                if field.is_blocked(x, y + side) {
                    dirs.push(Point::new(dx, side).abs_dir());
                }
            }
        } else {
            for side in [-1, 1] {
                if field.is_blocked(x + side, y) {
                    dirs.push(Point::new(side, dy).abs_dir());
                }
            }
        }
        dirs
    }

    /// Follows the ray from `from` in `dir` and returns the first jump point on
    /// it, or [None] when the ray runs into a blocked cell or the border first.
    /// Every origin passed on the way is memoized with the same answer.
    fn jump<F: ObstacleField>(
        field: &F,
        cache: &mut JumpCache,
        from: Point,
        dir: Direction,
        goal: &Point,
    ) -> Option<Point> {
        let mut trail: SmallVec<[Point; 16]> = SmallVec::new();
        let mut current = from;
        let result = loop {
            if let Some(cached) = cache.memo.get(&(current, dir)) {
                break *cached;
            }
            trail.push(current);
            cache.jump_calls += 1;
            let next = current + dir;
            if !field.can_move_to(next, current) {
                break None;
            }
            if next == *goal || Self::is_forced(field, &next, dir) {
                break Some(next);
            }
            if dir.diagonal()
                && (Self::jump(field, cache, next, dir.x_dir(), goal).is_some()
                    || Self::jump(field, cache, next, dir.y_dir(), goal).is_some())
            {
                break Some(next);
            }
            current = next;
        };
        for origin in trail {
            cache.memo.insert((origin, dir), result);
        }
        result
    }
}

impl GridSolver for JpsSolver {
    type Scratch = JumpCache;
    type Successors = SmallVec<[(Point, i32); N_SMALLVEC_SIZE]>;

    fn name(&self) -> &'static str {
        "JPS"
    }

    fn successors<F: ObstacleField>(
        &self,
        field: &F,
        cache: &mut JumpCache,
        parent: Option<&Point>,
        node: &Point,
        goal: &Point,
    ) -> Self::Successors {
        let directions: SmallVec<[Direction; 8]> = match parent {
            Some(parent_node) => {
                let dir = parent_node.dir_obj(node);
                Self::pruned_directions(field, node, dir).into_iter().collect()
            }
            // The start node has no incoming direction and jumps in all of them.
            None => node
                .moore_neighborhood_smallvec()
                .iter()
                .map(|n| node.dir_obj(n))
                .collect(),
        };
        directions
            .into_iter()
            .filter_map(|dir| Self::jump(field, cache, *node, dir, goal))
            .map(|jump_point| (jump_point, octile_distance(node, &jump_point)))
            .collect()
    }

    fn jump_calls(cache: &JumpCache) -> usize {
        cache.jump_calls()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_map::GridMap;
    use crate::solver::astar::AstarSolver;

    /// Asserts that the case in which start and goal are equal is handled correctly.
    #[test]
    fn equal_start_goal() {
        let grid = GridMap::new(1, 1, false);
        let start = Point::new(0, 0);
        let plan = JpsSolver.get_path(&grid, start, start).unwrap();
        assert_eq!(plan.path, Some(vec![start]));
        assert!(plan.stats.nodes_explored >= 1);
    }

    /// Asserts that the optimal 4 step solution is found.
    #[test]
    fn solve_simple_problem() {
        let mut grid = GridMap::new(3, 3, false);
        grid.set(1, 1, true);
        grid.generate_components();
        let plan = JpsSolver
            .get_path(&grid, Point::new(0, 0), Point::new(2, 2))
            .unwrap();
        assert_eq!(plan.path.as_ref().map(Vec::len), Some(4));
        assert_eq!(plan.cost(), Some(34));
    }

    #[test]
    fn open_grid_needs_one_ray() {
        let grid = GridMap::new(8, 8, false);
        let plan = JpsSolver
            .find_waypoints(&grid, Point::new(0, 0), Point::new(7, 7))
            .unwrap();
        assert_eq!(plan.path, Some(vec![Point::new(0, 0), Point::new(7, 7)]));
        let path = JpsSolver
            .get_path(&grid, Point::new(0, 0), Point::new(7, 7))
            .unwrap();
        assert_eq!(path.path.map(|p| p.len()), Some(8));
        assert!(path.stats.jump_calls > 0);
    }

    #[test]
    fn forced_neighbour_next_to_wall_end() {
        // Moving right along y = 1 past a wall ending at x = 2 above it.
        let mut grid = GridMap::new(5, 3, false);
        grid.set(1, 0, true);
        grid.set(2, 0, true);
        assert!(!JpsSolver::is_forced(&grid, &Point::new(1, 1), Direction::EAST));
        assert!(JpsSolver::is_forced(&grid, &Point::new(2, 1), Direction::EAST));
        let dirs = JpsSolver::pruned_directions(&grid, &Point::new(2, 1), Direction::EAST);
        assert!(dirs.contains(&Direction::EAST));
        // Towards the end of the wall at y = 0, which grid_util calls south.
        assert!(dirs.contains(&Direction::SOUTHEAST));
        assert!(!dirs.contains(&Direction::NORTHEAST));
    }

    #[test]
    fn jumps_are_memoized_along_the_ray() {
        let grid = GridMap::new(10, 1, false);
        let mut cache = JumpCache::default();
        let goal = Point::new(9, 0);
        let first = JpsSolver::jump(&grid, &mut cache, Point::new(0, 0), Direction::EAST, &goal);
        assert_eq!(first, Some(goal));
        let calls = cache.jump_calls();
        assert_eq!(calls, 9);
        // Every origin on the ray was cached, so this walks nothing.
        let again = JpsSolver::jump(&grid, &mut cache, Point::new(4, 0), Direction::EAST, &goal);
        assert_eq!(again, Some(goal));
        assert_eq!(cache.jump_calls(), calls);
        assert_eq!(
            JpsSolver::jump(&grid, &mut cache, Point::new(0, 0), Direction::WEST, &goal),
            None
        );
    }

    #[test]
    fn test_diagonal_switch_path() {
        //  ___
        // | #|
        // |# |
        //  __
        let grid = GridMap::from_rows(&[[0u8, 1], [1, 0]]).unwrap();
        let plan = JpsSolver
            .get_path(&grid, Point::new(0, 0), Point::new(1, 1))
            .unwrap();
        assert!(plan.path.is_none());
    }

    #[test]
    fn fewer_expansions_than_astar() {
        let mut grid = GridMap::new(50, 50, false);
        grid.set_rect(Point::new(20, 20), 5, 5, true);
        let (start, goal) = (Point::new(0, 0), Point::new(49, 49));
        let jps = JpsSolver.get_path(&grid, start, goal).unwrap();
        let astar = AstarSolver.get_path(&grid, start, goal).unwrap();
        assert_eq!(jps.cost(), astar.cost());
        assert!(jps.stats.nodes_explored < astar.stats.nodes_explored);
        // The expanded path steps between neighbours only.
        let path = jps.path.unwrap();
        for w in path.windows(2) {
            assert!(grid.can_move_to(w[1], w[0]));
        }
    }
}
