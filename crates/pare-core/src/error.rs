use thiserror::Error;

/// Errors raised by document construction, editing, and optimization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocError {
    /// The input breaks the tree invariants (unique ids, single parent,
    /// no cycles) or is not well-formed markup.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// No element carries the requested identifier.
    #[error("no element with id `{0}`")]
    NotFound(String),

    /// The edit would give two elements the same identifier.
    #[error("identifier `{0}` is already in use")]
    DuplicateId(String),

    /// A child position outside `0..len` (or `0..=len` for inserts).
    #[error("child position {pos} out of range (parent has {len} children)")]
    NoSuchChild { pos: usize, len: usize },

    /// An element operation was aimed at a text or comment leaf.
    #[error("node is not an element")]
    NotAnElement,
}
