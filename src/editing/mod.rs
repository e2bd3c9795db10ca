//! Editing model: cursor and document mutations

mod cursor;
mod operation;

pub use cursor::{Cursor, DocPosition};
pub use operation::{Content, Mutation, MutationResult, Position};
