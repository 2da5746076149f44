pub mod fields;
pub mod io;
pub mod markup;
pub mod models;
pub mod patch;
pub mod print;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use fields::{
    DecomposeOptions, Decomposition, Field, FieldId, FieldKind, ListEditor, ListItem,
    SelectOption, Session, StyleOverrideMap, decompose, decompose_with, reconstruct,
    remove_invalid_breaks, strip_anchors,
};
pub use io::*;
pub use markup::MarkupError;
pub use models::Screen;
pub use patch::{PatchRequest, TextEdit, apply_patch, apply_text_edits};
pub use print::{PageSize, PrintDocument, compose_print_document, detect_page_size};
