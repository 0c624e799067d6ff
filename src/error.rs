//! Error types for planner calls.

use core::fmt;
use thiserror::Error;

/// Which end of a query an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    Goal,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endpoint::Start => write!(f, "start"),
            Endpoint::Goal => write!(f, "goal"),
        }
    }
}

/// Rejected inputs. Not finding a path is not an error: it is reported as a
/// [Plan](crate::solver::Plan) without a path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("{endpoint} {position} lies outside the {width}x{height} workspace")]
    OutOfBounds {
        endpoint: Endpoint,
        position: String,
        width: usize,
        height: usize,
    },

    #[error("{endpoint} {position} is on a blocked cell")]
    Blocked { endpoint: Endpoint, position: String },

    #[error("invalid planner configuration: {0}")]
    Config(String),

    #[error("malformed grid: {0}")]
    Grid(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
