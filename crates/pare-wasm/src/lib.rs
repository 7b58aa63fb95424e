//! WASM bridge for Pare: exposes the simplification core to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the editor's
//! presentation layer. Structured results cross the boundary as JSON.

use kurbo::Point;
use pare_core::{
    DocError, Document, NodeIndex, OptimizeConfig, emit_document, lint_document, optimize_text,
    parse_document,
};
use pare_editor::{InputEvent, PenStyle, PenTool, StrokeConfig, finalize};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// A drawing session: one document plus the pen tool drawing into it.
///
/// All interaction from the page goes through this struct; there is no
/// global document or selection state.
#[wasm_bindgen]
pub struct PareCanvas {
    doc: Document,
    pen: PenTool,
    /// Where new strokes are appended; the root unless set by id.
    target: NodeIndex,
}

#[wasm_bindgen]
impl PareCanvas {
    /// Create a fresh drawing with the given canvas size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        let doc = Document::new(width, height);
        let target = doc.root;
        Self {
            doc,
            pen: PenTool::default(),
            target,
        }
    }

    /// Replace the document with parsed markup.
    /// Returns `true` on success, `false` on a malformed document.
    pub fn set_text(&mut self, text: &str) -> bool {
        match parse_document(text) {
            Ok(doc) => {
                self.target = doc.root;
                self.doc = doc;
                true
            }
            Err(e) => {
                log::warn!("set_text rejected: {e}");
                false
            }
        }
    }

    /// Current document as markup.
    pub fn get_text(&self) -> String {
        emit_document(&self.doc)
    }

    /// Direct new strokes into the element with `id`.
    /// Returns `false` if no such element exists.
    pub fn set_target(&mut self, id: &str) -> bool {
        match self.doc.find_by_id(id) {
            Ok(idx) => {
                self.target = idx;
                true
            }
            Err(_) => false,
        }
    }

    /// Configure stroke finalization and the pen's presentation.
    pub fn set_pen(
        &mut self,
        tolerance: f64,
        dense_threshold: u32,
        stroke: &str,
        stroke_width: f64,
    ) {
        self.pen.config = StrokeConfig {
            tolerance,
            dense_threshold: dense_threshold as usize,
        };
        self.pen.style = PenStyle {
            stroke: stroke.to_string(),
            stroke_width,
        };
    }

    pub fn handle_pointer_down(&mut self, x: f64, y: f64) {
        self.dispatch(InputEvent::from_pointer_down(x, y));
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) {
        self.dispatch(InputEvent::from_pointer_move(x, y));
    }

    /// Finish the stroke. Returns the id of the element added, or an empty
    /// string if the stroke was discarded.
    pub fn handle_pointer_up(&mut self, x: f64, y: f64) -> String {
        self.dispatch(InputEvent::from_pointer_up(x, y))
            .and_then(|idx| self.doc.attr(idx, "id"))
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn handle_pointer_cancel(&mut self) {
        self.dispatch(InputEvent::Cancel);
    }

    /// Optimize the document in place. Returns `false` (leaving the
    /// document unchanged) if it is malformed. The stroke target is kept
    /// when it survives, and falls back to the root otherwise.
    pub fn optimize(&mut self) -> bool {
        let target_id = self.doc.element(self.target).and_then(|el| el.id);
        match pare_core::optimize(self.doc.clone(), &OptimizeConfig::default()) {
            Ok(optimized) => {
                self.target = target_id
                    .and_then(|id| optimized.find_by_id(id.as_str()).ok())
                    .unwrap_or(optimized.root);
                self.doc = optimized;
                true
            }
            Err(e) => {
                log::warn!("optimize rejected: {e}");
                false
            }
        }
    }

    /// Lint diagnostics for the current document as a JSON array.
    pub fn lint(&self) -> String {
        serde_json::to_string(&lint_document(&self.doc)).unwrap_or_else(|_| "[]".into())
    }
}

impl PareCanvas {
    fn dispatch(&mut self, event: InputEvent) -> Option<NodeIndex> {
        match self.pen.handle(&event, &mut self.doc, self.target) {
            Ok(added) => added,
            Err(e) => {
                log::warn!("pen stroke dropped: {e}");
                None
            }
        }
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Pare WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Optimize serialized markup. Throws the error message on a malformed
/// document.
#[wasm_bindgen]
pub fn optimize(text: &str) -> Result<String, JsValue> {
    optimize_markup(text).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn optimize_markup(text: &str) -> Result<String, DocError> {
    optimize_text(text, &OptimizeConfig::default())
}

/// Finalize a stroke given as flat `[x0, y0, x1, y1, …]` coordinates.
/// Returns JSON: `{"kind":"discarded"}`, `{"kind":"line","from":…,"to":…}`
/// or `{"kind":"path","points":[…]}`.
#[wasm_bindgen(js_name = finalizeStroke)]
pub fn finalize_stroke(
    flat_xy: &[f64],
    tolerance: Option<f64>,
    dense_threshold: Option<u32>,
) -> String {
    finalize_stroke_json(flat_xy, tolerance, dense_threshold)
}

fn finalize_stroke_json(
    flat_xy: &[f64],
    tolerance: Option<f64>,
    dense_threshold: Option<u32>,
) -> String {
    let defaults = StrokeConfig::default();
    let config = StrokeConfig {
        tolerance: tolerance.unwrap_or(defaults.tolerance),
        dense_threshold: dense_threshold.map_or(defaults.dense_threshold, |n| n as usize),
    };
    if flat_xy.len() % 2 != 0 {
        log::warn!("finalizeStroke: odd coordinate count, dropping the last value");
    }
    let points: Vec<Point> = flat_xy
        .chunks_exact(2)
        .map(|xy| Point::new(xy[0], xy[1]))
        .collect();
    serde_json::to_string(&finalize(&points, &config))
        .unwrap_or_else(|e| error_json(&e.to_string()))
}

/// Lint serialized markup. Returns JSON `{"ok":true,"diagnostics":[…]}` or
/// `{"ok":false,"error":"…"}`.
#[wasm_bindgen]
pub fn lint(text: &str) -> String {
    lint_json(text)
}

#[derive(Serialize)]
struct LintReport<'a> {
    ok: bool,
    diagnostics: &'a [pare_core::LintDiagnostic],
}

fn lint_json(text: &str) -> String {
    match parse_document(text) {
        Ok(doc) => {
            let diagnostics = lint_document(&doc);
            serde_json::to_string(&LintReport {
                ok: true,
                diagnostics: &diagnostics,
            })
            .unwrap_or_else(|e| error_json(&e.to_string()))
        }
        Err(e) => error_json(&e.to_string()),
    }
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    ok: bool,
    error: &'a str,
}

fn error_json(message: &str) -> String {
    serde_json::to_string(&ErrorReport { ok: false, error: message })
        .unwrap_or_else(|_| r#"{"ok":false}"#.to_string())
}
