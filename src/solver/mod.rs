use crate::error::{Endpoint, PlanError, Result};
use crate::field::ObstacleField;
use crate::point::{Point, Vec2};
use crate::search::SearchContext;
use crate::{waypoints_to_path, C, D};

use itertools::Itertools;
use log::{debug, info, warn};
use std::str::FromStr;
use std::time::{Duration, Instant};

pub mod astar;
pub mod bidirectional;
pub mod jps;
pub mod rrt;
pub mod visibility;

use astar::AstarSolver;
use bidirectional::BidirectionalAstarSolver;
use jps::JpsSolver;
use visibility::VisibilityGraphSolver;

/// Converts the integer cost to an approximate floating point equivalent where cardinal directions have cost 1.0.
pub fn convert_cost_to_unit_cost_float(cost: i32) -> f64 {
    (cost as f64) / (C as f64)
}

/// Octile distance: the cost of taking as many diagonal steps as possible and
/// going straight for the rest. Exact on an empty grid, so it is admissible
/// and consistent everywhere else.
pub fn octile_distance(p1: &Point, p2: &Point) -> i32 {
    let delta_x = (p1.x - p2.x).abs();
    let delta_y = (p1.y - p2.y).abs();
    C * (delta_x + delta_y) + (D - 2 * C) * delta_x.min(delta_y)
}

/// Cost of following `path` where every leg is walked as a straight, diagonal or
/// Bresenham line. Each of those takes `min(dx, dy)` diagonal steps and straight
/// steps for the rest, so this holds for cell paths and for all waypoints.
pub fn grid_path_cost(path: &[Point]) -> i32 {
    path.iter()
        .tuple_windows()
        .map(|(a, b)| octile_distance(a, b))
        .sum()
}

/// Euclidean length of a polyline.
pub fn polyline_length(path: &[Vec2]) -> f64 {
    path.iter()
        .tuple_windows()
        .map(|(a, b)| a.distance(b))
        .sum()
}

/// Diagnostics gathered during a single query. Informational only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchStats {
    /// Nodes closed (grid planners) or inserted into the tree (RRT).
    pub nodes_explored: usize,
    /// Frontier pops (grid planners) or sampling rounds (RRT).
    pub iterations: usize,
    pub jump_calls: usize,
    /// Lines of sight tested by the visibility graph planner.
    pub sight_checks: usize,
    /// Nodes closed by the forward and the backward half of a bidirectional
    /// search. Both stay zero for one-sided planners.
    pub forward_expanded: usize,
    pub backward_expanded: usize,
    pub path_length: usize,
    pub elapsed: Duration,
}

/// Outcome of a query: a path from start to goal, or [None] if no path exists.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan<P> {
    pub path: Option<Vec<P>>,
    pub stats: SearchStats,
}

impl<P> Plan<P> {
    pub fn new(path: Option<Vec<P>>, mut stats: SearchStats) -> Plan<P> {
        stats.path_length = path.as_ref().map_or(0, Vec::len);
        Plan { path, stats }
    }

    pub fn is_found(&self) -> bool {
        self.path.is_some()
    }

    /// Transforms the path, if any, keeping the diagnostics up to date.
    pub fn map_path<FP: FnOnce(Vec<P>) -> Vec<P>>(self, f: FP) -> Plan<P> {
        Plan::new(self.path.map(f), self.stats)
    }
}

impl Plan<Point> {
    pub fn cost(&self) -> Option<i32> {
        self.path.as_deref().map(grid_path_cost)
    }
}

impl Plan<Vec2> {
    pub fn length(&self) -> Option<f64> {
        self.path.as_deref().map(polyline_length)
    }
}

/// Rejects endpoints outside the field or on a blocked cell.
pub(crate) fn validate_endpoint<F: ObstacleField>(
    field: &F,
    point: Point,
    endpoint: Endpoint,
) -> Result<()> {
    if !field.point_in_bounds(point) {
        return Err(PlanError::OutOfBounds {
            endpoint,
            position: point.to_string(),
            width: field.width(),
            height: field.height(),
        });
    }
    if field.is_blocked_point(point) {
        return Err(PlanError::Blocked {
            endpoint,
            position: point.to_string(),
        });
    }
    Ok(())
}

/// A best-first planner over grid cells. Implementors describe how to generate
/// successors; the search loop, validation and path expansion are shared.
pub trait GridSolver {
    /// Per-query state owned by the successor function, such as a jump cache.
    type Scratch: Default;
    type Successors: IntoIterator<Item = (Point, i32)>;

    fn name(&self) -> &'static str;

    fn successors<F: ObstacleField>(
        &self,
        field: &F,
        scratch: &mut Self::Scratch,
        parent: Option<&Point>,
        node: &Point,
        goal: &Point,
    ) -> Self::Successors;

    fn heuristic(&self, p1: &Point, p2: &Point) -> i32 {
        octile_distance(p1, p2)
    }

    /// Jump calls recorded in the scratch state, zero for solvers that do not jump.
    fn jump_calls(_scratch: &Self::Scratch) -> usize {
        0
    }

    /// Sight line tests recorded in the scratch state.
    fn sight_checks(_scratch: &Self::Scratch) -> usize {
        0
    }

    /// The raw waypoints from which [get_path](Self::get_path) makes a path.
    /// Consecutive waypoints are connected by a straight or diagonal ray, or by
    /// a line of sight for [VisibilityGraphSolver].
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
        // Check if start and goal are on the same connected component.
        if field.unreachable(&start, &goal) {
            info!("{start} and {goal} are not connected, skipping search");
            stats.elapsed = timer.elapsed();
            return Ok(Plan::new(None, stats));
        }
        debug!("{}: searching from {start} to {goal}", self.name());
        let mut ctx = SearchContext::new(field.width() * field.height());
        let mut scratch = Self::Scratch::default();
        let result = ctx.astar_jps(
            &start,
            |parent, node| self.successors(field, &mut scratch, parent, node, &goal),
            |point| self.heuristic(point, &goal),
            |point| *point == goal,
        );
        if ctx.capped() {
            warn!(
                "{}: expansion cap of {} reached before finding {goal}",
                self.name(),
                field.width() * field.height()
            );
        }
        stats.nodes_explored = ctx.expanded();
        stats.iterations = ctx.iterations();
        stats.jump_calls = Self::jump_calls(&scratch);
        stats.sight_checks = Self::sight_checks(&scratch);
        stats.elapsed = timer.elapsed();
        Ok(Plan::new(result.map(|(v, _c)| v), stats))
    }

    /// Computes a cell by cell path from start to goal.
    fn get_path<F: ObstacleField>(
        &self,
        field: &F,
        start: Point,
        goal: Point,
    ) -> Result<Plan<Point>> {
        Ok(self
            .get_waypoints(field, start, goal)?
            .map_path(waypoints_to_path))
    }
}

/// Common entry point of every planner.
pub trait Planner<F: ObstacleField> {
    type Position;

    fn find_path(
        &self,
        field: &F,
        start: Self::Position,
        goal: Self::Position,
    ) -> Result<Plan<Self::Position>>;
}

impl<F: ObstacleField, S: GridSolver> Planner<F> for S {
    type Position = Point;

    fn find_path(&self, field: &F, start: Point, goal: Point) -> Result<Plan<Point>> {
        self.get_path(field, start, goal)
    }
}

/// One of the grid planners, selectable at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridStrategy {
    Astar(AstarSolver),
    Bidirectional(BidirectionalAstarSolver),
    Jps(JpsSolver),
    Visibility(VisibilityGraphSolver),
}

impl GridStrategy {
    pub const ALL: [GridStrategy; 4] = [
        GridStrategy::Astar(AstarSolver),
        GridStrategy::Bidirectional(BidirectionalAstarSolver),
        GridStrategy::Jps(JpsSolver),
        GridStrategy::Visibility(VisibilityGraphSolver),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GridStrategy::Astar(s) => s.name(),
            GridStrategy::Bidirectional(s) => s.name(),
            GridStrategy::Jps(s) => s.name(),
            GridStrategy::Visibility(s) => s.name(),
        }
    }
}

impl FromStr for GridStrategy {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<GridStrategy> {
        match s.to_ascii_lowercase().as_str() {
            "astar" | "a*" => Ok(GridStrategy::Astar(AstarSolver)),
            "bidirectional" | "bidirectional_astar" => {
                Ok(GridStrategy::Bidirectional(BidirectionalAstarSolver))
            }
            "jps" => Ok(GridStrategy::Jps(JpsSolver)),
            "visibility" | "visibility_graph" => {
                Ok(GridStrategy::Visibility(VisibilityGraphSolver))
            }
            _ => Err(PlanError::Config(format!("unknown grid strategy '{s}'"))),
        }
    }
}

impl<F: ObstacleField> Planner<F> for GridStrategy {
    type Position = Point;

    fn find_path(&self, field: &F, start: Point, goal: Point) -> Result<Plan<Point>> {
        match self {
            GridStrategy::Astar(s) => s.get_path(field, start, goal),
            GridStrategy::Bidirectional(s) => s.get_path(field, start, goal),
            GridStrategy::Jps(s) => s.get_path(field, start, goal),
            GridStrategy::Visibility(s) => s.get_path(field, start, goal),
        }
    }
}
