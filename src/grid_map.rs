use core::fmt;
use grid_util::grid::{BoolGrid, ValueGrid};
use petgraph::unionfind::UnionFind;

use crate::error::{PlanError, Result};
use crate::field::ObstacleField;
use crate::point::Point;

/// Dense occupancy grid backed by a [BoolGrid]: `true` cells are blocked.
///
/// [GridMap] optionally maintains connected components in a [UnionFind] so that
/// queries between disconnected cells can be answered without flood-filling
/// the grid. Components only exist after [generate_components](Self::generate_components)
/// has been called; until then every pair is treated as possibly reachable.
#[derive(Clone, Debug, Default)]
pub struct GridMap {
    pub grid: BoolGrid,
    components: Option<UnionFind<usize>>,
    pub components_dirty: bool,
}

impl GridMap {
    pub fn new(width: usize, height: usize, default_value: bool) -> GridMap {
        GridMap {
            grid: BoolGrid::new(width, height, default_value),
            components: None,
            components_dirty: false,
        }
    }

    /// Builds a grid from rows where `rows[y][x]` is 0 for free and anything else
    /// for blocked.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<GridMap> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if width == 0 {
            return Err(PlanError::Grid("grid has no cells".to_owned()));
        }
        let mut grid = GridMap::new(width, height, false);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(PlanError::Grid(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            for (x, &value) in row.iter().enumerate() {
                grid.grid.set(x as i32, y as i32, value != 0);
            }
        }
        Ok(grid)
    }

    pub fn get_ix_point(&self, point: &Point) -> usize {
        self.grid.get_ix_point(point)
    }

    /// Raw cell value. Panics when out of bounds.
    pub fn get(&self, x: i32, y: i32) -> bool {
        assert!(self.in_bounds(x, y), "({}, {}) is outside the grid", x, y);
        self.grid.get(x, y)
    }

    /// Updates a position on the grid. Joins newly connected components and flags
    /// the components as dirty if they are (potentially) broken apart.
    pub fn set(&mut self, x: i32, y: i32, blocked: bool) {
        assert!(self.in_bounds(x, y), "({}, {}) is outside the grid", x, y);
        let ix = self.grid.compute_ix(x, y);
        let was_blocked = self.grid.get(x, y);
        self.grid.set(x, y, blocked);
        if self.components.is_none() {
            return;
        }
        if blocked {
            if !was_blocked {
                self.components_dirty = true;
            }
        } else {
            let p = Point::new(x, y);
            let joined = self
                .neighborhood_points_and_cost(&p)
                .into_iter()
                .map(|(n, _)| self.get_ix_point(&n))
                .collect::<Vec<_>>();
            if let Some(components) = self.components.as_mut() {
                for n_ix in joined {
                    components.union(ix, n_ix);
                }
            }
        }
    }

    pub fn set_point(&mut self, point: Point, blocked: bool) {
        self.set(point.x, point.y, blocked)
    }

    /// Sets every cell of the `width` x `height` rectangle whose top-left corner is
    /// `corner`, clipped to the grid.
    pub fn set_rect(&mut self, corner: Point, width: i32, height: i32, blocked: bool) {
        for x in corner.x..corner.x + width {
            for y in corner.y..corner.y + height {
                if self.in_bounds(x, y) {
                    self.set(x, y, blocked);
                }
            }
        }
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Retrieves the component id a given [Point] belongs to, if components exist.
    pub fn get_component(&self, point: &Point) -> Option<usize> {
        self.components
            .as_ref()
            .map(|c| c.find(self.get_ix_point(point)))
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            log::debug!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up grid neighbours that can
    /// step onto each other to the same components.
    pub fn generate_components(&mut self) {
        let w = self.grid.width;
        let h = self.grid.height;
        let mut components = UnionFind::new(w * h);
        for x in 0..w as i32 {
            for y in 0..h as i32 {
                let point = Point::new(x, y);
                if self.is_blocked_point(point) {
                    continue;
                }
                let parent_ix = self.get_ix_point(&point);
                // Movement is symmetric, so looking forward covers every edge once.
                [
                    Point::new(x + 1, y - 1),
                    Point::new(x + 1, y),
                    Point::new(x + 1, y + 1),
                    Point::new(x, y + 1),
                ]
                .into_iter()
                .filter(|p| self.can_move_to(*p, point))
                .for_each(|p| {
                    components.union(parent_ix, self.get_ix_point(&p));
                });
            }
        }
        self.components = Some(components);
        self.components_dirty = false;
    }
}

impl ObstacleField for GridMap {
    fn width(&self) -> usize {
        self.grid.width
    }
    fn height(&self) -> usize {
        self.grid.height
    }
    fn is_blocked(&self, x: i32, y: i32) -> bool {
        !self.grid.index_in_bounds(x, y) || self.grid.get(x, y)
    }
    /// Start and goal on different components can never be connected. Stale
    /// (dirty) components can only merge too much, so they never give a false
    /// negative here.
    fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        match &self.components {
            Some(components) => {
                if self.point_in_bounds(*start) && self.point_in_bounds(*goal) {
                    !components.equiv(self.get_ix_point(start), self.get_ix_point(goal))
                } else {
                    true
                }
            }
            None => false,
        }
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Grid:")?;
        for y in 0..self.grid.height as i32 {
            let values = (0..self.grid.width as i32)
                .map(|x| self.grid.get(x, y) as i32)
                .collect::<Vec<i32>>();
            writeln!(f, "{:?}", values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_indexed_y_then_x() {
        let grid = GridMap::from_rows(&[[0u8, 1, 0], [0, 0, 1]]).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert!(grid.get(1, 0));
        assert!(grid.get(2, 1));
        assert!(!grid.get(0, 1));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows: Vec<Vec<u8>> = vec![vec![0, 0], vec![0]];
        assert!(matches!(GridMap::from_rows(&rows), Err(PlanError::Grid(_))));
        let empty: Vec<Vec<u8>> = vec![];
        assert!(GridMap::from_rows(&empty).is_err());
    }

    /// Tests whether points are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // Corresponds to the following 3x2 grid:
        //  ___
        // | # |
        // | # |
        //  ___
        let mut grid = GridMap::new(3, 2, false);
        grid.set(1, 0, true);
        grid.set(1, 1, true);
        let p1 = Point::new(0, 0);
        let p2 = Point::new(1, 1);
        let p3 = Point::new(0, 1);
        let p4 = Point::new(2, 0);
        assert!(grid.reachable(&p1, &p4), "no components means no pruning");
        assert_eq!(grid.get_component(&p1), None);
        grid.generate_components();
        assert!(grid.unreachable(&p1, &p2));
        assert!(grid.reachable(&p1, &p3));
        assert!(grid.unreachable(&p1, &p4));
        assert_eq!(grid.get_component(&p1), grid.get_component(&p3));
        assert_ne!(grid.get_component(&p1), grid.get_component(&p4));
    }

    #[test]
    fn unblocking_joins_components() {
        let mut grid = GridMap::new(3, 1, false);
        grid.set(1, 0, true);
        grid.generate_components();
        let left = Point::new(0, 0);
        let right = Point::new(2, 0);
        assert!(grid.unreachable(&left, &right));
        grid.set(1, 0, false);
        assert!(grid.reachable(&left, &right));
        assert!(!grid.components_dirty);
        grid.set(1, 0, true);
        assert!(grid.components_dirty);
        grid.update();
        assert!(grid.unreachable(&left, &right));
    }

    // Squeezing diagonally between two blocked cells does not connect components.
    #[test]
    fn test_diagonal_switch_reachable() {
        //  ___
        // | #|
        // |# |
        //  __
        let mut grid = GridMap::from_rows(&[[0u8, 1], [1, 0]]).unwrap();
        grid.generate_components();
        assert!(grid.unreachable(&Point::new(0, 0), &Point::new(1, 1)));
        grid.set(1, 0, false);
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(1, 1)));
    }
}
