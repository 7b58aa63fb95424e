pub mod emitter;
pub mod error;
pub mod id;
pub mod lint;
pub mod model;
pub mod optimize;
pub mod parser;
pub mod path_data;
pub mod refs;
pub mod transform;

pub use emitter::emit_document;
pub use error::DocError;
pub use id::ElemId;
pub use lint::{LintDiagnostic, LintSeverity, lint_document};
pub use model::*;
pub use optimize::{OptimizeConfig, optimize, optimize_text};
pub use parser::parse_document;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
