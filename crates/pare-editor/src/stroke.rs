//! Stroke finalization: what a freehand stroke becomes once the pointer
//! lifts.
//!
//! | Samples | Outcome |
//! |---------|---------|
//! | 0–1 | `Discarded` |
//! | 2 | `Line`, verbatim |
//! | 3..=`dense_threshold` | `Path`, raw samples |
//! | more | `Path`, simplified at `tolerance` |

use crate::simplify::simplify;
use kurbo::Point;
use pare_core::model::{Element, format_num};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Policy constants for `finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeConfig {
    /// Simplification tolerance for dense strokes. Default: **2.0**.
    pub tolerance: f64,
    /// Longest stroke kept verbatim. Default: **20**.
    pub dense_threshold: usize,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            tolerance: 2.0,
            dense_threshold: 20,
        }
    }
}

/// The classified result of a captured stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FinalStroke {
    Discarded,
    Line { from: Point, to: Point },
    Path { points: Vec<Point> },
}

/// Classify a stroke under `config`.
pub fn finalize(points: &[Point], config: &StrokeConfig) -> FinalStroke {
    let outcome = match points {
        [] | [_] => FinalStroke::Discarded,
        [from, to] => FinalStroke::Line {
            from: *from,
            to: *to,
        },
        _ if points.len() <= config.dense_threshold => FinalStroke::Path {
            points: points.to_vec(),
        },
        _ => FinalStroke::Path {
            points: simplify(points, config.tolerance),
        },
    };
    log::debug!(
        "finalize: {} samples -> {}",
        points.len(),
        outcome.summary()
    );
    outcome
}

/// Presentation attributes for elements produced from strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenStyle {
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            stroke: "#000000".into(),
            stroke_width: 2.0,
        }
    }
}

impl FinalStroke {
    fn summary(&self) -> String {
        match self {
            FinalStroke::Discarded => "discarded".into(),
            FinalStroke::Line { .. } => "line".into(),
            FinalStroke::Path { points } => format!("path of {}", points.len()),
        }
    }

    /// The element this stroke draws as: a `line`, or an unfilled `path`
    /// of straight segments. `None` for a discarded stroke.
    pub fn to_element(&self, style: &PenStyle) -> Option<Element> {
        let element = match self {
            FinalStroke::Discarded => return None,
            FinalStroke::Line { from, to } => Element::new("line")
                .with_attr("x1", format_num(from.x))
                .with_attr("y1", format_num(from.y))
                .with_attr("x2", format_num(to.x))
                .with_attr("y2", format_num(to.y)),
            FinalStroke::Path { points } => Element::new("path")
                .with_attr("d", path_data(points))
                .with_attr("fill", "none"),
        };
        Some(
            element
                .with_attr("stroke", style.stroke.clone())
                .with_attr("stroke-width", format_num(style.stroke_width)),
        )
    }
}

/// `M x y L x y …` for a polyline.
fn path_data(points: &[Point]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        let _ = write!(d, "{cmd} {} {}", format_num(p.x), format_num(p.y));
    }
    d
}
