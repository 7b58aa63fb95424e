//! Integration tests: stroke finalization boundaries and pen capture into
//! a document that then goes through the optimizer.

use kurbo::Point;
use pare_core::{OptimizeConfig, emit_document, optimize, parse_document};
use pare_editor::*;
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────

/// A wobbly horizontal stroke: y alternates ±0.5 around 0, x steps by 1.
fn wobble(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| Point::new(i as f64, if i % 2 == 0 { 0.5 } else { -0.5 }))
        .collect()
}

// ─── Boundaries ──────────────────────────────────────────────────────────

#[test]
fn empty_and_single_sample_are_discarded() {
    let config = StrokeConfig::default();
    assert_eq!(finalize(&[], &config), FinalStroke::Discarded);
    assert_eq!(finalize(&wobble(1), &config), FinalStroke::Discarded);
}

#[test]
fn two_samples_are_a_verbatim_line() {
    let points = [Point::new(3.25, 1.0), Point::new(-7.0, 2.0)];
    assert_eq!(
        finalize(&points, &StrokeConfig::default()),
        FinalStroke::Line {
            from: points[0],
            to: points[1]
        }
    );
}

#[test]
fn three_samples_are_a_raw_path() {
    let points = wobble(3);
    assert_eq!(
        finalize(&points, &StrokeConfig::default()),
        FinalStroke::Path { points }
    );
}

#[test]
fn twenty_samples_are_kept_raw() {
    let points = wobble(20);
    assert_eq!(
        finalize(&points, &StrokeConfig::default()),
        FinalStroke::Path { points }
    );
}

#[test]
fn twenty_one_samples_are_simplified() {
    let points = wobble(21);
    let expected = simplify(&points, 2.0);
    assert_eq!(expected, vec![points[0], points[20]]);
    assert_eq!(
        finalize(&points, &StrokeConfig::default()),
        FinalStroke::Path { points: expected }
    );
}

#[test]
fn threshold_and_tolerance_are_configurable() {
    let config = StrokeConfig {
        tolerance: 0.1,
        dense_threshold: 4,
    };
    let points = wobble(5);
    let FinalStroke::Path { points: kept } = finalize(&points, &config) else {
        panic!("expected a path");
    };
    assert_eq!(kept, points, "every wobble exceeds 0.1");
}

// ─── Pen tool → document → optimizer ─────────────────────────────────────

#[test]
fn captured_strokes_survive_optimization() {
    let mut doc = parse_document(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><g id="ink"/></svg>"#,
    )
    .unwrap();
    let layer = doc.find_by_id("ink").unwrap();
    let mut pen = PenTool::default();

    let samples = wobble(30);
    let (first, rest) = samples.split_first().unwrap();
    pen.handle(&InputEvent::from_pointer_down(first.x, first.y), &mut doc, layer)
        .unwrap();
    for p in rest {
        pen.handle(&InputEvent::from_pointer_move(p.x, p.y), &mut doc, layer)
            .unwrap();
    }
    let last = samples[samples.len() - 1];
    let added = pen
        .handle(&InputEvent::from_pointer_up(last.x, last.y), &mut doc, layer)
        .unwrap()
        .expect("stroke should be kept");

    assert_eq!(doc.attr(added, "d"), Some("M 0 0.5 L 29 -0.5"));

    let doc = optimize(doc, &OptimizeConfig::default()).unwrap();
    assert_eq!(
        emit_document(&doc),
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"100\">\n  <g id=\"ink\">\n    <path id=\"path_1\" d=\"M 0 0.5 L 29 -0.5\" fill=\"none\" stroke=\"#000000\" stroke-width=\"2\"/>\n  </g>\n</svg>\n"
    );
}
