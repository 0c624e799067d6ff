use smallvec::SmallVec;

use crate::field::ObstacleField;
use crate::point::Point;
use crate::solver::GridSolver;
use crate::N_SMALLVEC_SIZE;

/// A* expanding all 8 neighbours of every node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AstarSolver;

impl AstarSolver {
    pub fn new() -> AstarSolver {
        AstarSolver
    }
}

impl GridSolver for AstarSolver {
    type Scratch = ();
    type Successors = SmallVec<[(Point, i32); N_SMALLVEC_SIZE]>;

    fn name(&self) -> &'static str {
        "A*"
    }

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
}
