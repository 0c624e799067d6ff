//! Greedy shortcut smoothing of paths.
use crate::field::ObstacleField;
use crate::line::{line_of_sight, segment_clear_vec2};
use crate::point::{Point, Vec2};

/// Removes detours from `path`. Starting at the goal, the earliest waypoint with
/// a clear direct connection (according to `clear`) becomes the next anchor, and
/// everything between the two is dropped. Repeats until the start is reached.
///
/// Endpoints are kept and the result is a subsequence of the input, so with a
/// metric cost it is never longer than the input.
pub fn shortcut<P, FC>(path: &[P], mut clear: FC) -> Vec<P>
where
    P: Copy,
    FC: FnMut(&P, &P) -> bool,
{
    if path.len() <= 2 {
        return path.to_vec();
    }
    let mut anchor = path.len() - 1;
    let mut result = vec![path[anchor]];
    while anchor > 0 {
        // Falls back to the direct predecessor, an edge of the input path.
        let next = (0..anchor)
            .find(|&i| clear(&path[i], &path[anchor]))
            .unwrap_or(anchor - 1);
        result.push(path[next]);
        anchor = next;
    }
    result.reverse();
    result
}

/// Shortcuts a polyline against the cells it crosses.
pub fn shortcut_polyline<F: ObstacleField>(field: &F, path: &[Vec2]) -> Vec<Vec2> {
    shortcut(path, |a, b| segment_clear_vec2(field, *a, *b))
}

/// Shortcuts a cell path into any-angle waypoints. Consecutive waypoints have a
/// legal cell by cell line between them, though not necessarily a straight or
/// diagonal one.
pub fn shortcut_grid<F: ObstacleField>(field: &F, path: &[Point]) -> Vec<Point> {
    shortcut(path, |a, b| line_of_sight(field, *a, *b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_map::GridMap;
    use crate::solver::polyline_length;

    #[test]
    fn short_paths_are_untouched() {
        let path = [Point::new(0, 0), Point::new(1, 1)];
        assert_eq!(shortcut(&path, |_, _| false), path.to_vec());
        assert!(shortcut::<Point, _>(&[], |_, _| true).is_empty());
    }

    #[test]
    fn open_field_collapses_to_endpoints() {
        let grid = GridMap::new(10, 10, false);
        let path = [
            Vec2::new(0.5, 0.5),
            Vec2::new(3.0, 1.0),
            Vec2::new(4.0, 6.0),
            Vec2::new(9.5, 9.5),
        ];
        let smooth = shortcut_polyline(&grid, &path);
        assert_eq!(smooth, vec![path[0], path[3]]);
        assert!(polyline_length(&smooth) <= polyline_length(&path));
    }

    #[test]
    fn keeps_corner_around_obstacle() {
        let mut grid = GridMap::new(5, 5, false);
        grid.set_rect(Point::new(1, 1), 3, 3, true);
        let path: Vec<Point> = (0..5)
            .map(|x| Point::new(x, 0))
            .chain((1..5).map(|y| Point::new(4, y)))
            .collect();
        let smooth = shortcut_grid(&grid, &path);
        assert_eq!(
            smooth,
            vec![Point::new(0, 0), Point::new(4, 0), Point::new(4, 4)]
        );
    }

    #[test]
    fn unclear_neighbours_are_kept() {
        let path = [1, 2, 3, 4];
        assert_eq!(shortcut(&path, |_, _| false), vec![1, 2, 3, 4]);
        assert_eq!(shortcut(&path, |a, b| b - a <= 2), vec![1, 2, 4]);
    }
}
