//! Outline Extractor (spec §4.1): walks the alpha boundary of the
//! opaque foreground region and returns an ordered clockwise outline,
//! or classifies why no single outline exists.

use crate::buffer::PixelSampler;
use crate::error::CreationError;
use crate::geometry::{Dir8, Rect};

/// A single boundary pixel with its outward-facing normal (spec §3
/// "Outline point").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinePoint {
    pub x: i64,
    pub y: i64,
    pub outward_normal: Dir8,
}

/// Ordered, non-repeating, closed clockwise walk of a single opaque
/// region's boundary (spec §3 "Outline").
#[derive(Debug, Clone)]
pub struct Outline {
    pub points: Vec<OutlinePoint>,
    pub ignored_islands: bool,
}

impl Outline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sorted copy of the points by `(y, x)`, used for the update
    /// fast-path equality check (spec §4.6) and [`check_if_single`].
    fn sorted_points(&self) -> Vec<OutlinePoint> {
        let mut pts = self.points.clone();
        pts.sort_by_key(|p| (p.y, p.x));
        pts
    }

    /// Length-then-sorted-point equality, per spec §4.6.
    pub fn geometrically_equal(&self, other: &Outline) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let a = self.sorted_points();
        let b = other.sorted_points();
        a.iter().zip(b.iter()).all(|(x, y)| x.x == y.x && x.y == y.y)
    }
}

fn is_opaque(sampler: &impl PixelSampler, roi: &Rect, threshold: f32, x: i64, y: i64) -> bool {
    if !roi.contains_point(x, y) {
        return false;
    }
    sampler.sample_nearest(x as f64, y as f64)[3] >= threshold
}

fn is_island(sampler: &impl PixelSampler, roi: &Rect, threshold: f32, x: i64, y: i64) -> bool {
    Dir8::all()
        .iter()
        .all(|d| {
            let (dx, dy) = d.offset();
            !is_opaque(sampler, roi, threshold, x + dx as i64, y + dy as i64)
        })
}

/// Walk clockwise from `(cur_x, cur_y)`, having arrived via `in_dir`,
/// to the next boundary pixel (spec §4.1 "Clockwise walk").
fn walk_clockwise(
    sampler: &impl PixelSampler,
    roi: &Rect,
    threshold: f32,
    cur_x: i64,
    cur_y: i64,
    in_dir: Dir8,
) -> (i64, i64, Dir8) {
    let to_prev = in_dir.opposite();
    let mut to_next = to_prev.clockwise();
    loop {
        let (dx, dy) = to_next.offset();
        let (cx, cy) = (cur_x + dx as i64, cur_y + dy as i64);
        if is_opaque(sampler, roi, threshold, cx, cy) {
            return (cx, cy, to_next);
        }
        to_next = to_next.clockwise();
    }
}

/// Outline extraction (spec §4.1). `roi` bounds both the opacity
/// predicate and the scan order.
pub fn find_outline(
    sampler: &impl PixelSampler,
    roi: Rect,
    threshold: f32,
) -> Result<Outline, CreationError> {
    let mut seed = None;
    let mut ignored_islands = false;

    'scan: for y in roi.top()..roi.bottom() {
        for x in roi.left()..roi.right() {
            if is_opaque(sampler, &roi, threshold, x, y) {
                if is_island(sampler, &roi, threshold, x, y) {
                    ignored_islands = true;
                    continue;
                }
                seed = Some((x, y));
                break 'scan;
            }
        }
    }

    let Some((sx, sy)) = seed else {
        if ignored_islands {
            return Err(CreationError::TooSmall);
        }
        return Err(CreationError::Empty);
    };

    let mut points = vec![OutlinePoint { x: sx, y: sy, outward_normal: Dir8::N }];
    let (mut cx, mut cy, mut in_dir) = walk_clockwise(sampler, &roi, threshold, sx, sy, Dir8::E);

    while (cx, cy) != (sx, sy) {
        let normal = in_dir.clockwise().clockwise();
        points.push(OutlinePoint { x: cx, y: cy, outward_normal: normal });
        let (nx, ny, ndir) = walk_clockwise(sampler, &roi, threshold, cx, cy, in_dir);
        cx = nx;
        cy = ny;
        in_dir = ndir;
    }

    if points.len() < 3 {
        return Err(CreationError::TooSmall);
    }

    let outline = Outline { points, ignored_islands };
    if !check_if_single(sampler, &roi, threshold, &outline) {
        return Err(CreationError::HoledOrSplit);
    }
    Ok(outline)
}

/// Verify the outline is the sole opaque region in `roi` using an
/// even-odd row scan (spec §4.1.1). Resolves the Open Question of
/// spec §9 in favor of the *intended* semantics: a disagreement
/// between the even-odd "inside" flag and actual opacity means the
/// region is not single. See `DESIGN.md` for why the legacy
/// `not_single = FALSE` typo is not preserved here.
pub fn check_if_single(
    sampler: &impl PixelSampler,
    roi: &Rect,
    threshold: f32,
    outline: &Outline,
) -> bool {
    let sorted = outline.sorted_points();
    let mut s_index = 0usize;
    let mut not_single = false;

    'rows: for y in roi.top()..roi.bottom() {
        let mut inside = false;
        for x in roi.left()..roi.right() {
            let opaque = is_opaque(sampler, roi, threshold, x, y);
            let mut hit = s_index < sorted.len() && sorted[s_index].x == x && sorted[s_index].y == y;

            if hit && !inside {
                inside = true;
                s_index += 1;
                hit = false;
            }

            if inside != opaque && !(opaque && is_island(sampler, roi, threshold, x, y)) {
                not_single = true;
                break 'rows;
            }

            if hit && inside {
                inside = false;
                s_index += 1;
            }
        }
    }

    !not_single
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RgbaBuffer;

    fn filled_square(size: u32) -> RgbaBuffer {
        let mut buf = RgbaBuffer::new(size, size);
        for y in 0..size {
            for x in 0..size {
                buf.put(x as i64, y as i64, [0.2, 0.4, 0.6, 1.0]);
            }
        }
        buf
    }

    #[test]
    fn outline_of_solid_square_is_closed_and_8_connected() {
        let buf = filled_square(10);
        let roi = Rect::new(0, 0, 10, 10);
        let outline = find_outline(&buf, roi, 0.5).expect("outline");
        assert!(outline.len() >= 3);
        for w in outline.points.windows(2) {
            let dx = (w[0].x - w[1].x).abs();
            let dy = (w[0].y - w[1].y).abs();
            assert!(dx <= 1 && dy <= 1 && (dx != 0 || dy != 0));
        }
        let first = outline.points[0];
        let last = *outline.points.last().unwrap();
        assert!((first.x - last.x).abs() <= 1 && (first.y - last.y).abs() <= 1);
    }

    #[test]
    fn single_filled_square_passes_single_region_check() {
        let buf = filled_square(10);
        let roi = Rect::new(0, 0, 10, 10);
        let outline = find_outline(&buf, roi, 0.5).expect("outline");
        assert!(check_if_single(&buf, &roi, 0.5, &outline));
    }

    #[test]
    fn empty_buffer_is_empty_error() {
        let buf = RgbaBuffer::new(10, 10);
        let roi = Rect::new(0, 0, 10, 10);
        assert_eq!(find_outline(&buf, roi, 0.5).unwrap_err(), CreationError::Empty);
    }

    #[test]
    fn lone_island_pixel_is_too_small() {
        let mut buf = RgbaBuffer::new(5, 5);
        buf.put(2, 2, [1.0, 1.0, 1.0, 1.0]);
        let roi = Rect::new(0, 0, 5, 5);
        assert_eq!(find_outline(&buf, roi, 0.5).unwrap_err(), CreationError::TooSmall);
    }

    #[test]
    fn two_disjoint_squares_are_holed_or_split() {
        let mut buf = RgbaBuffer::new(10, 10);
        for y in 0..3 {
            for x in 0..3 {
                buf.put(x, y, [1.0, 0.0, 0.0, 1.0]);
            }
        }
        for y in 6..9 {
            for x in 6..9 {
                buf.put(x, y, [0.0, 1.0, 0.0, 1.0]);
            }
        }
        let roi = Rect::new(0, 0, 10, 10);
        assert_eq!(find_outline(&buf, roi, 0.5).unwrap_err(), CreationError::HoledOrSplit);
    }

    #[test]
    fn thin_strip_outline_length_matches_perimeter() {
        let mut buf = RgbaBuffer::new(5, 5);
        for y in 0..3 {
            for x in 0..2 {
                buf.put(x, y, [1.0, 1.0, 1.0, 1.0]);
            }
        }
        let roi = Rect::new(0, 0, 5, 5);
        let outline = find_outline(&buf, roi, 0.5).expect("outline");
        assert_eq!(outline.len(), 10);
    }
}
