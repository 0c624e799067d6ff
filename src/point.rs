//! Cell coordinates come from [grid_util]; [Vec2] is the real-valued position
//! the sampling planner works with. A cell `p` covers `[p.x, p.x + 1) x [p.y, p.y + 1)`.
use core::fmt;

pub use grid_util::direction::Direction;
pub use grid_util::point::Point;

/// Real-valued workspace position used by the sampling planner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }

    pub fn distance(&self, other: &Vec2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// The grid cell containing this position.
    pub fn cell(&self) -> Point {
        Point::new(self.x.floor() as i32, self.y.floor() as i32)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Vec2 {
        Vec2::new(x, y)
    }
}

impl From<Point> for Vec2 {
    /// Centre of the cell.
    fn from(p: Point) -> Vec2 {
        Vec2::new(p.x as f64 + 0.5, p.y as f64 + 0.5)
    }
}
