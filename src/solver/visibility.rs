//! A* over a lazily built visibility graph.
//!
//! The vertices are the start, the goal and every free cell at a convex
//! obstacle corner: a cell whose diagonal neighbour is blocked while both cells
//! beside that diagonal are free. Any path that has to bend around an obstacle
//! can bend at such a cell. The start and corner vertices are linked to every
//! vertex they can see, every expanded cell checks whether it can see the goal,
//! and grid neighbours stay linked so passages that no sight line covers are
//! still found. Sight lines are Bresenham lines walked with legal moves, so an
//! edge costs exactly the octile distance between its ends and paths keep the
//! cost A* would find.
use fxhash::FxBuildHasher;
use indexmap::IndexSet;
use itertools::Itertools;
use log::debug;

use crate::error::Result;
use crate::field::ObstacleField;
use crate::line::{line_of_sight, LineCells};
use crate::point::Point;
use crate::solver::{octile_distance, GridSolver, Plan};

type FxIndexSet<K> = IndexSet<K, FxBuildHasher>;

/// Corner vertices of the field being searched, found on the first expansion.
#[derive(Clone, Debug, Default)]
pub struct CornerGraph {
    corners: Option<FxIndexSet<Point>>,
    sight_checks: usize,
}

impl CornerGraph {
    /// Lines of sight tested so far.
    pub fn sight_checks(&self) -> usize {
        self.sight_checks
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibilityGraphSolver;

impl VisibilityGraphSolver {
    pub fn new() -> VisibilityGraphSolver {
        VisibilityGraphSolver
    }

    /// Free cells at convex obstacle corners, row by row.
    pub fn corners<F: ObstacleField>(&self, field: &F) -> Vec<Point> {
        find_corners(field).into_iter().collect()
    }

    /// The vertices from start to goal. Consecutive vertices see each other.
    pub fn find_waypoints<F: ObstacleField>(
        &self,
        field: &F,
        start: Point,
        goal: Point,
    ) -> Result<Plan<Point>> {
        self.get_waypoints(field, start, goal)
    }
}

fn find_corners<F: ObstacleField>(field: &F) -> FxIndexSet<Point> {
    let mut corners = FxIndexSet::default();
    for y in 0..field.height() as i32 {
        for x in 0..field.width() as i32 {
            if field.is_blocked(x, y) {
                continue;
            }
            let convex = [(1, 1), (1, -1), (-1, 1), (-1, -1)]
                .into_iter()
                .any(|(dx, dy)| {
                    field.is_blocked(x + dx, y + dy)
                        && !field.is_blocked(x + dx, y)
                        && !field.is_blocked(x, y + dy)
                });
            if convex {
                corners.insert(Point::new(x, y));
            }
        }
    }
    debug!("visibility graph: {} corner vertices", corners.len());
    corners
}

/// Walks every sight line between consecutive waypoints cell by cell.
fn expand_sight_lines(waypoints: Vec<Point>) -> Vec<Point> {
    let mut path: Vec<Point> = waypoints.first().copied().into_iter().collect();
    for (a, b) in waypoints.iter().tuple_windows() {
        path.extend(LineCells::new(*a, *b).skip(1));
    }
    path
}

impl GridSolver for VisibilityGraphSolver {
    type Scratch = CornerGraph;
    type Successors = Vec<(Point, i32)>;

    fn name(&self) -> &'static str {
        "visibility graph"
    }

    fn successors<F: ObstacleField>(
        &self,
        field: &F,
        graph: &mut CornerGraph,
        parent: Option<&Point>,
        node: &Point,
        goal: &Point,
    ) -> Self::Successors {
        let corners = graph.corners.get_or_insert_with(|| find_corners(field));
        let mut sight_checks = 0;
        let mut sees = |target: &Point| {
            sight_checks += 1;
            line_of_sight(field, *node, *target)
        };
        let mut successors = Vec::new();
        // Neighbours are linked below, only longer sight lines are checked here.
        if node.move_distance(goal) > 1 && sees(goal) {
            successors.push((*goal, octile_distance(node, goal)));
        }
        if parent.is_none() || corners.contains(node) {
            for corner in corners.iter() {
                if node.move_distance(corner) > 1 && sees(corner) {
                    successors.push((*corner, octile_distance(node, corner)));
                }
            }
        }
        graph.sight_checks += sight_checks;
        successors.extend(field.neighborhood_points_and_cost(node));
        successors
    }

    fn sight_checks(graph: &CornerGraph) -> usize {
        graph.sight_checks()
    }

    /// Sight lines are not straight or diagonal rays, so they are walked with
    /// [LineCells] instead of [waypoints_to_path](crate::waypoints_to_path).
    fn get_path<F: ObstacleField>(
        &self,
        field: &F,
        start: Point,
        goal: Point,
    ) -> Result<Plan<Point>> {
        Ok(self
            .get_waypoints(field, start, goal)?
            .map_path(expand_sight_lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_map::GridMap;
    use crate::solver::astar::AstarSolver;

    #[test]
    fn equal_start_goal() {
        let grid = GridMap::new(2, 2, false);
        let start = Point::new(1, 0);
        let plan = VisibilityGraphSolver.get_path(&grid, start, start).unwrap();
        assert_eq!(plan.path, Some(vec![start]));
        assert_eq!(plan.cost(), Some(0));
    }

    #[test]
    fn corners_of_a_block() {
        let mut grid = GridMap::new(6, 6, false);
        grid.set_rect(Point::new(2, 2), 2, 2, true);
        assert_eq!(
            VisibilityGraphSolver.corners(&grid),
            vec![
                Point::new(1, 1),
                Point::new(4, 1),
                Point::new(1, 4),
                Point::new(4, 4)
            ]
        );
        // The border does not make corners.
        assert!(VisibilityGraphSolver.corners(&GridMap::new(4, 4, false)).is_empty());
    }

    #[test]
    fn visible_goal_is_reached_directly() {
        let grid = GridMap::new(8, 8, false);
        let (start, goal) = (Point::new(0, 0), Point::new(7, 7));
        let waypoints = VisibilityGraphSolver
            .find_waypoints(&grid, start, goal)
            .unwrap();
        assert_eq!(waypoints.path, Some(vec![start, goal]));
        assert_eq!(waypoints.stats.nodes_explored, 2);
        assert_eq!(waypoints.stats.sight_checks, 1);

        let plan = VisibilityGraphSolver.get_path(&grid, start, goal).unwrap();
        let astar = AstarSolver.get_path(&grid, start, goal).unwrap();
        assert_eq!(plan.path.as_ref().map(Vec::len), Some(8));
        assert_eq!(plan.cost(), astar.cost());
        assert!(plan.stats.nodes_explored < astar.stats.nodes_explored);
    }

    #[test]
    fn bends_around_a_wall() {
        let mut grid = GridMap::new(9, 9, false);
        grid.set_rect(Point::new(4, 0), 1, 7, true);
        let (start, goal) = (Point::new(0, 0), Point::new(8, 0));
        let waypoints = VisibilityGraphSolver
            .find_waypoints(&grid, start, goal)
            .unwrap()
            .path
            .unwrap();
        for (a, b) in waypoints.iter().tuple_windows() {
            assert!(line_of_sight(&grid, *a, *b), "{a} cannot see {b}");
        }
        let plan = VisibilityGraphSolver.get_path(&grid, start, goal).unwrap();
        let path = plan.path.as_ref().unwrap();
        assert!(waypoints.len() < path.len());
        for w in path.windows(2) {
            assert!(grid.can_move_to(w[1], w[0]), "illegal step {} -> {}", w[0], w[1]);
        }
        let astar = AstarSolver.get_path(&grid, start, goal).unwrap();
        assert_eq!(plan.cost(), astar.cost());
        assert!(plan.stats.sight_checks > 0);
    }

    #[test]
    fn walled_off_goal_is_not_found() {
        let mut grid = GridMap::new(5, 5, false);
        grid.set_rect(Point::new(2, 0), 1, 5, true);
        let plan = VisibilityGraphSolver
            .get_path(&grid, Point::new(0, 0), Point::new(4, 4))
            .unwrap();
        assert!(plan.path.is_none());
    }
}
