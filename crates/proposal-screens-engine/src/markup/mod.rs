//! Lenient, lossless HTML fragment tree.
//!
//! Parsing keeps the exact source text of every tag and text node so that a
//! fragment nobody edited serializes back byte for byte, and an edited one
//! only changes where it was edited.

mod builder;
pub mod cursor;
pub mod selector;
mod serialize;
pub mod tags;
pub mod token;
mod tree;

use thiserror::Error;

pub use builder::{MAX_DEPTH, TreeBuilder};
pub use selector::Selector;
pub use tree::{Attribute, Element, EndTag, NodeData, NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
    #[error("elements nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Parses an HTML fragment into a tree.
pub fn parse_fragment(src: &str) -> Result<Tree, MarkupError> {
    TreeBuilder::new().build(src)
}
