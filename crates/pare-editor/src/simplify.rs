//! Douglas–Peucker point-sequence simplification.
//!
//! Keeps the first and last point, then repeatedly splits each range at the
//! point farthest from its chord while that distance exceeds the tolerance.
//! Ranges are processed from an explicit work stack, so stroke length never
//! turns into call depth.

use kurbo::{Point, Vec2};

/// Distance from `p` to the segment `a`–`b` (not the infinite line):
/// the projection is clamped to the segment's ends.
pub fn point_to_segment_dist(p: Point, a: Point, b: Point) -> f64 {
    let ab: Vec2 = b - a;
    let ap: Vec2 = p - a;
    let len_sq = ab.hypot2();
    if len_sq < 1e-12 {
        return ap.hypot();
    }
    let t = (ap.dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Farthest interior point of `points[first..=last]` from its chord.
/// Ties go to the lowest index.
fn farthest(points: &[Point], first: usize, last: usize) -> Option<(usize, f64)> {
    let (a, b) = (points[first], points[last]);
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in points.iter().enumerate().take(last).skip(first + 1) {
        let d = point_to_segment_dist(p, a, b);
        if best.is_none_or(|(_, max)| d > max) {
            best = Some((i, d));
        }
    }
    best
}

/// Simplify `points` so that no dropped point lies farther than
/// `tolerance` from the kept polyline. Sequences of two or fewer points
/// come back unchanged.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0, last)];
    while let Some((first, last)) = stack.pop() {
        if let Some((split, dist)) = farthest(points, first, last) {
            if dist > tolerance {
                keep[split] = true;
                stack.push((split, last));
                stack.push((first, split));
            }
        }
    }

    let out: Vec<Point> = points
        .iter()
        .zip(&keep)
        .filter_map(|(&p, &k)| k.then_some(p))
        .collect();
    log::trace!("simplify: {} -> {} points (tolerance {tolerance})", points.len(), out.len());
    out
}
