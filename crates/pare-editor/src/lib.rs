pub mod input;
pub mod simplify;
pub mod stroke;
pub mod tools;

pub use input::InputEvent;
pub use simplify::simplify;
pub use stroke::{FinalStroke, PenStyle, StrokeConfig, finalize};
pub use tools::PenTool;
