//! The obstacle query surface every planner consumes, and the movement rules
//! derived from it.
use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::grid_map::GridMap;
use crate::point::Point;
use crate::{C, D, N_SMALLVEC_SIZE};

/// Read-only view of blocked cells inside a `width` x `height` workspace.
///
/// Cells outside the bounds must report as blocked. Implementations are assumed
/// infallible and must not change while a planner is running on them; callers
/// with moving obstacles plan on a [snapshot](ObstacleMap::snapshot).
pub trait ObstacleField {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn is_blocked(&self, x: i32, y: i32) -> bool;

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    fn point_in_bounds(&self, point: Point) -> bool {
        self.in_bounds(point.x, point.y)
    }

    fn is_blocked_point(&self, point: Point) -> bool {
        self.is_blocked(point.x, point.y)
    }

    fn can_move_to_simple(&self, pos: Point) -> bool {
        self.point_in_bounds(pos) && !self.is_blocked_point(pos)
    }

    /// Whether a single step from `start` to the adjacent `pos` is legal. Diagonal
    /// steps are refused when both flanking orthogonal cells are blocked.
    fn can_move_to(&self, pos: Point, start: Point) -> bool {
        debug_assert!((start.x - pos.x).abs() <= 1 && (start.y - pos.y).abs() <= 1);
        if !self.can_move_to_simple(pos) {
            return false;
        }
        if start.x == pos.x || start.y == pos.y {
            return true;
        }
        !(self.is_blocked(start.x, pos.y) && self.is_blocked(pos.x, start.y))
    }

    /// Legal neighbours of `pos` with their move cost.
    fn neighborhood_points_and_cost(
        &self,
        pos: &Point,
    ) -> SmallVec<[(Point, i32); N_SMALLVEC_SIZE]> {
        pos.moore_neighborhood_smallvec()
            .into_iter()
            .filter(|p| self.can_move_to(*p, *pos))
            // Odd direction numbers are diagonals, so this is D for them and C otherwise
            .map(|p| (p, (pos.dir_obj(&p).num() % 2) * (D - C) + C))
            .collect()
    }

    /// Cheap pre-check that may prove the goal unreachable before any search is
    /// run. Returning `false` only means "not known to be unreachable".
    fn unreachable(&self, _start: &Point, _goal: &Point) -> bool {
        false
    }
}

impl<T: ObstacleField + ?Sized> ObstacleField for &T {
    fn width(&self) -> usize {
        (**self).width()
    }
    fn height(&self) -> usize {
        (**self).height()
    }
    fn is_blocked(&self, x: i32, y: i32) -> bool {
        (**self).is_blocked(x, y)
    }
    fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        (**self).unreachable(start, goal)
    }
}

/// Sparse obstacle store keeping static and dynamic obstacles apart, so moving
/// obstacles can be replaced wholesale every tick while the static layout stays.
#[derive(Clone, Debug, Default)]
pub struct ObstacleMap {
    width: usize,
    height: usize,
    static_obstacles: FxHashSet<Point>,
    dynamic_obstacles: FxHashSet<Point>,
}

impl ObstacleMap {
    pub fn new(width: usize, height: usize) -> ObstacleMap {
        ObstacleMap {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn add_static(&mut self, point: Point) -> bool {
        self.static_obstacles.insert(point)
    }

    pub fn remove_static(&mut self, point: &Point) -> bool {
        self.static_obstacles.remove(point)
    }

    /// Blocks the `width` x `height` rectangle whose top-left corner is `corner`.
    pub fn add_static_rect(&mut self, corner: Point, width: i32, height: i32) {
        for x in corner.x..corner.x + width {
            for y in corner.y..corner.y + height {
                self.static_obstacles.insert(Point::new(x, y));
            }
        }
    }

    pub fn add_dynamic(&mut self, point: Point) -> bool {
        self.dynamic_obstacles.insert(point)
    }

    pub fn remove_dynamic(&mut self, point: &Point) -> bool {
        self.dynamic_obstacles.remove(point)
    }

    /// Replaces every dynamic obstacle, typically once per simulation tick.
    pub fn set_dynamic<I: IntoIterator<Item = Point>>(&mut self, obstacles: I) {
        self.dynamic_obstacles.clear();
        self.dynamic_obstacles.extend(obstacles);
    }

    pub fn clear_dynamic(&mut self) {
        self.dynamic_obstacles.clear();
    }

    pub fn static_obstacles(&self) -> impl Iterator<Item = &Point> {
        self.static_obstacles.iter()
    }

    pub fn dynamic_obstacles(&self) -> impl Iterator<Item = &Point> {
        self.dynamic_obstacles.iter()
    }

    /// Freezes the current obstacle layout into a dense grid for one planning call.
    pub fn snapshot(&self) -> GridMap {
        let mut grid = GridMap::new(self.width, self.height, false);
        for p in self.static_obstacles.iter().chain(self.dynamic_obstacles.iter()) {
            if grid.point_in_bounds(*p) {
                grid.set_point(*p, true);
            }
        }
        grid
    }
}

impl ObstacleField for ObstacleMap {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn is_blocked(&self, x: i32, y: i32) -> bool {
        let p = Point::new(x, y);
        !self.in_bounds(x, y)
            || self.static_obstacles.contains(&p)
            || self.dynamic_obstacles.contains(&p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_is_blocked() {
        let map = ObstacleMap::new(3, 2);
        assert!(map.is_blocked(-1, 0));
        assert!(map.is_blocked(3, 0));
        assert!(map.is_blocked(0, 2));
        assert!(!map.is_blocked(2, 1));
    }

    #[test]
    fn static_and_dynamic_layers() {
        let mut map = ObstacleMap::new(5, 5);
        map.add_static(Point::new(1, 1));
        map.set_dynamic([Point::new(2, 2), Point::new(3, 3)]);
        assert!(map.is_blocked(1, 1));
        assert!(map.is_blocked(2, 2));
        map.set_dynamic([Point::new(4, 4)]);
        assert!(!map.is_blocked(2, 2));
        assert!(map.add_dynamic(Point::new(0, 4)));
        assert!(map.remove_dynamic(&Point::new(0, 4)));
        assert!(!map.remove_dynamic(&Point::new(0, 4)));
        assert_eq!(map.dynamic_obstacles().count(), 1);
        assert!(map.is_blocked(4, 4));
        map.clear_dynamic();
        assert!(!map.is_blocked(4, 4));
        assert!(map.is_blocked(1, 1));
        assert_eq!(map.static_obstacles().collect::<Vec<_>>(), vec![&Point::new(1, 1)]);
    }

    #[test]
    fn snapshot_copies_both_layers() {
        let mut map = ObstacleMap::new(4, 4);
        map.add_static_rect(Point::new(0, 0), 2, 1);
        map.add_dynamic(Point::new(3, 3));
        // Out of bounds obstacles are ignored
        map.add_dynamic(Point::new(9, 9));
        let grid = map.snapshot();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(grid.is_blocked(x, y), map.is_blocked(x, y));
            }
        }
    }

    #[test]
    fn diagonal_squeeze_is_refused() {
        //  ___
        // | #|
        // |# |
        //  __
        let mut map = ObstacleMap::new(2, 2);
        map.add_static(Point::new(1, 0));
        map.add_static(Point::new(0, 1));
        assert!(!map.can_move_to(Point::new(1, 1), Point::new(0, 0)));
        map.remove_static(&Point::new(1, 0));
        assert!(map.can_move_to(Point::new(1, 1), Point::new(0, 0)));
    }

    #[test]
    fn neighbourhood_costs() {
        let map = ObstacleMap::new(3, 3);
        let n = map.neighborhood_points_and_cost(&Point::new(1, 1));
        assert_eq!(n.len(), 8);
        for (p, c) in n {
            let diagonal = p.x != 1 && p.y != 1;
            assert_eq!(c, if diagonal { D } else { C });
        }
        assert_eq!(map.neighborhood_points_and_cost(&Point::new(0, 0)).len(), 3);
    }
}
