//! Error types for the pagination engine and the document tree.

use crate::document::PageId;
use crate::editing::Position;
use thiserror::Error;

/// Result type alias for document and pagination operations.
pub type Result<T> = std::result::Result<T, PaginationError>;

/// Errors raised by the document tree and the pagination engine.
///
/// None of these are fatal. The sweep treats every variant as "leave this
/// page as-is and continue", and editing operations report them as a
/// rejected edit.
#[derive(Error, Debug)]
pub enum PaginationError {
    /// A position or anchor no longer addresses the content it was
    /// resolved for.
    #[error("stale reference at position {pos}")]
    StaleReference { pos: Position },

    /// A page could not be resolved or has no rendered children.
    #[error("page {0:?} is missing or has no children")]
    InvalidPageState(PageId),

    /// The mutation would leave a page (or the document) without children.
    #[error("structural violation: {0}")]
    StructuralViolation(&'static str),

    /// The range does not start and end on node boundaries of one parent.
    #[error("range {from}..{to} is not aligned to node boundaries")]
    UnalignedRange { from: Position, to: Position },

    /// Position lies outside the document.
    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),

    /// Markup could not be parsed.
    #[error("markup error at byte {offset}: {message}")]
    Markup { offset: usize, message: String },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl PaginationError {
    /// Whether the error came from a reference that went stale mid-pass.
    pub fn is_stale(&self) -> bool {
        matches!(self, PaginationError::StaleReference { .. })
    }

    pub(crate) fn markup(offset: usize, message: impl Into<String>) -> Self {
        PaginationError::Markup {
            offset,
            message: message.into(),
        }
    }
}
