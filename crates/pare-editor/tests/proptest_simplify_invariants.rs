//! Property-based invariant tests for point simplification and stroke
//! finalization.
//!
//! 1. Endpoints are always kept.
//! 2. Output never grows, and is an in-order subsequence of the input.
//! 3. Every dropped point lies within tolerance of the kept polyline.
//! 4. Simplifying again at the same tolerance changes nothing.
//! 5. Finalize picks its variant from the sample count alone.

use kurbo::Point;
use pare_editor::simplify::point_to_segment_dist;
use pare_editor::*;
use proptest::prelude::*;
use std::collections::HashSet;

// ── Helpers ─────────────────────────────────────────────────────────────

fn point_strategy() -> impl Strategy<Value = Point> {
    (-500i32..=500, -500i32..=500)
        .prop_map(|(x, y)| Point::new(f64::from(x) / 4.0, f64::from(y) / 4.0))
}

/// Strokes without repeated samples, so kept points map back to a
/// unique input index.
fn stroke_strategy() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(point_strategy(), 1..60).prop_map(|points| {
        let mut seen = HashSet::new();
        points
            .into_iter()
            .filter(|p| seen.insert((p.x.to_bits(), p.y.to_bits())))
            .collect()
    })
}

fn tolerance_strategy() -> impl Strategy<Value = f64> {
    (0u32..=40).prop_map(|t| f64::from(t) / 4.0)
}

/// Indices of `kept` within `points`, matched in order.
fn subsequence_indices(points: &[Point], kept: &[Point]) -> Option<Vec<usize>> {
    let mut indices = Vec::with_capacity(kept.len());
    let mut from = 0;
    for k in kept {
        let offset = points[from..].iter().position(|p| p == k)?;
        indices.push(from + offset);
        from += offset + 1;
    }
    Some(indices)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Endpoints
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn endpoints_are_kept(points in stroke_strategy(), tol in tolerance_strategy()) {
        let out = simplify(&points, tol);
        prop_assert_eq!(out.first(), points.first());
        prop_assert_eq!(out.last(), points.last());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Never grows; in-order subsequence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn output_is_a_subsequence(points in stroke_strategy(), tol in tolerance_strategy()) {
        let out = simplify(&points, tol);
        prop_assert!(out.len() <= points.len());
        prop_assert!(subsequence_indices(&points, &out).is_some());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Tolerance bound
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dropped_points_are_within_tolerance(points in stroke_strategy(), tol in tolerance_strategy()) {
        let out = simplify(&points, tol);
        let Some(indices) = subsequence_indices(&points, &out) else {
            return Err(TestCaseError::fail("not a subsequence"));
        };
        for pair in indices.windows(2) {
            let (a, b) = (points[pair[0]], points[pair[1]]);
            for p in &points[pair[0] + 1..pair[1]] {
                let d = point_to_segment_dist(*p, a, b);
                prop_assert!(d <= tol + 1e-9, "{:?} is {} from its chord", p, d);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Stable under repetition
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn simplify_is_stable(points in stroke_strategy(), tol in tolerance_strategy()) {
        let once = simplify(&points, tol);
        let twice = simplify(&once, tol);
        prop_assert_eq!(once, twice);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Finalize variant by count
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn finalize_variant_by_count(points in prop::collection::vec(point_strategy(), 0..60)) {
        let config = StrokeConfig::default();
        match (points.len(), finalize(&points, &config)) {
            (0 | 1, FinalStroke::Discarded) => {}
            (2, FinalStroke::Line { from, to }) => {
                prop_assert_eq!(from, points[0]);
                prop_assert_eq!(to, points[1]);
            }
            (n, FinalStroke::Path { points: kept }) if (3..=20).contains(&n) => {
                prop_assert_eq!(kept, points);
            }
            (n, FinalStroke::Path { points: kept }) if n > 20 => {
                prop_assert_eq!(kept, simplify(&points, 2.0));
            }
            (n, other) => {
                return Err(TestCaseError::fail(format!("{n} samples gave {other:?}")));
            }
        }
    }
}
