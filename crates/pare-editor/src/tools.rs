//! Pen tool: freehand capture into document elements.
//!
//! Samples accumulate between pointer-down and pointer-up. On release the
//! stroke is finalized and, unless discarded, appended to the document
//! under the parent the caller names. The tool holds no reference to the
//! document or to any selection; both are passed in per event.

use crate::input::InputEvent;
use crate::stroke::{FinalStroke, PenStyle, StrokeConfig, finalize};
use kurbo::Point;
use pare_core::{DocError, Document, NodeIndex};

#[derive(Debug, Clone, Default)]
pub struct PenTool {
    drawing: bool,
    points: Vec<Point>,
    pub config: StrokeConfig,
    pub style: PenStyle,
}

impl PenTool {
    pub fn new(config: StrokeConfig, style: PenStyle) -> Self {
        Self {
            drawing: false,
            points: Vec::new(),
            config,
            style,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Samples captured so far in the current stroke.
    pub fn samples(&self) -> &[Point] {
        &self.points
    }

    /// Handle an input event. Returns the index of the element added on
    /// pointer-up, or `None` when nothing was added.
    ///
    /// # Errors
    /// Propagates a failed insertion under `parent` (e.g. `NotAnElement`).
    pub fn handle(
        &mut self,
        event: &InputEvent,
        doc: &mut Document,
        parent: NodeIndex,
    ) -> Result<Option<NodeIndex>, DocError> {
        match *event {
            InputEvent::PointerDown { x, y } => {
                self.drawing = true;
                self.points.clear();
                self.points.push(Point::new(x, y));
                Ok(None)
            }
            InputEvent::PointerMove { x, y } => {
                if self.drawing {
                    self.points.push(Point::new(x, y));
                }
                Ok(None)
            }
            InputEvent::PointerUp { x, y } => {
                if !self.drawing {
                    return Ok(None);
                }
                self.drawing = false;
                let end = Point::new(x, y);
                if self.points.last() != Some(&end) {
                    self.points.push(end);
                }
                let points = std::mem::take(&mut self.points);
                self.commit(&finalize(&points, &self.config), doc, parent)
            }
            InputEvent::Cancel => {
                self.drawing = false;
                self.points.clear();
                Ok(None)
            }
        }
    }

    fn commit(
        &self,
        stroke: &FinalStroke,
        doc: &mut Document,
        parent: NodeIndex,
    ) -> Result<Option<NodeIndex>, DocError> {
        let Some(mut element) = stroke.to_element(&self.style) else {
            return Ok(None);
        };
        element.id = Some(doc.fresh_id(&element.tag));
        let idx = doc.append_child(parent, element)?;
        log::debug!("pen: added {:?}", doc.attr(idx, "id"));
        Ok(Some(idx))
    }
}
