//! Rasterised line of sight between cells.
use itertools::Itertools;

use crate::field::ObstacleField;
use crate::point::{Point, Vec2};

/// Iterator over the cells of a [Bresenham line](https://en.wikipedia.org/wiki/Bresenham%27s_line_algorithm),
/// both endpoints included. Consecutive cells are 8-neighbours.
#[derive(Clone, Debug)]
pub struct LineCells {
    current: Point,
    end: Point,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    done: bool,
}

impl LineCells {
    pub fn new(start: Point, end: Point) -> LineCells {
        let dx = (end.x - start.x).abs();
        let dy = -(end.y - start.y).abs();
        LineCells {
            current: start,
            end,
            dx,
            dy,
            sx: (end.x - start.x).signum(),
            sy: (end.y - start.y).signum(),
            err: dx + dy,
            done: false,
        }
    }
}

impl Iterator for LineCells {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.done {
            return None;
        }
        let cell = self.current;
        if cell == self.end {
            self.done = true;
            return Some(cell);
        }
        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.current.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.current.y += self.sy;
        }
        Some(cell)
    }
}

/// Iterator over every cell a real-valued segment passes through, in order, using
/// the [Amanatides-Woo traversal](http://www.cse.yorku.ca/~amana/research/grid.pdf).
///
/// Unlike [LineCells] between the containing cells, no cell the segment crosses
/// is skipped. A segment passing exactly through a cell corner steps diagonally,
/// so consecutive cells are always 8-neighbours.
#[derive(Clone, Debug)]
pub struct SegmentCells {
    cell: Point,
    end: Point,
    step_x: i32,
    step_y: i32,
    t_max_x: f64,
    t_max_y: f64,
    t_delta_x: f64,
    t_delta_y: f64,
    done: bool,
}

/// Direction of travel along one axis, the parameter `t` at which the first cell
/// border is crossed and the `t` it takes to cross a whole cell.
fn axis_traversal(from: f64, delta: f64, cell: i32) -> (i32, f64, f64) {
    if delta > 0.0 {
        (1, (cell as f64 + 1.0 - from) / delta, 1.0 / delta)
    } else if delta < 0.0 {
        (-1, (from - cell as f64) / -delta, -1.0 / delta)
    } else {
        (0, f64::INFINITY, f64::INFINITY)
    }
}

impl SegmentCells {
    pub fn new(start: Vec2, end: Vec2) -> SegmentCells {
        let cell = start.cell();
        let (step_x, t_max_x, t_delta_x) = axis_traversal(start.x, end.x - start.x, cell.x);
        let (step_y, t_max_y, t_delta_y) = axis_traversal(start.y, end.y - start.y, cell.y);
        SegmentCells {
            cell,
            end: end.cell(),
            step_x,
            step_y,
            t_max_x,
            t_max_y,
            t_delta_x,
            t_delta_y,
            done: false,
        }
    }
}

impl Iterator for SegmentCells {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.done {
            return None;
        }
        let cell = self.cell;
        // The second check stops rounding errors from walking past the end.
        if cell == self.end || self.t_max_x.min(self.t_max_y) > 1.0 {
            self.done = true;
            return Some(cell);
        }
        if self.t_max_x < self.t_max_y {
            self.cell.x += self.step_x;
            self.t_max_x += self.t_delta_x;
        } else if self.t_max_y < self.t_max_x {
            self.cell.y += self.step_y;
            self.t_max_y += self.t_delta_y;
        } else {
            self.cell.x += self.step_x;
            self.cell.y += self.step_y;
            self.t_max_x += self.t_delta_x;
            self.t_max_y += self.t_delta_y;
        }
        Some(cell)
    }
}

/// Whether no cell on the line from `a` to `b` is blocked.
pub fn segment_clear<F: ObstacleField>(field: &F, a: Point, b: Point) -> bool {
    LineCells::new(a, b).all(|p| !field.is_blocked_point(p))
}

/// Whether a real-valued segment crosses no blocked cell. Passing exactly through
/// a corner follows the diagonal move rule: it is refused only when both cells
/// beside the corner are blocked.
pub fn segment_clear_vec2<F: ObstacleField>(field: &F, a: Vec2, b: Vec2) -> bool {
    !field.is_blocked_point(a.cell())
        && !field.is_blocked_point(b.cell())
        && SegmentCells::new(a, b)
            .tuple_windows()
            .all(|(p, q)| field.can_move_to(q, p))
}

/// Whether the line from `a` to `b` can be walked cell by cell with legal moves,
/// so diagonal steps between two blocked cells are refused too.
pub fn line_of_sight<F: ObstacleField>(field: &F, a: Point, b: Point) -> bool {
    !field.is_blocked_point(a)
        && LineCells::new(a, b)
            .tuple_windows()
            .all(|(p, q)| field.can_move_to(q, p))
}
