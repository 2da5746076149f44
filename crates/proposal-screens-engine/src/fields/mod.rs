//! Field decomposition and reconstruction.
//!
//! A fragment is split into [`Field`]s: runs of text and whitelisted
//! elements, each anchored in a marked copy of the fragment. Edited fields
//! are written back through those anchors, leaving all other markup as it
//! was.

pub mod anchors;
pub mod br_policy;
pub(crate) mod content;
pub(crate) mod decompose;
mod field;
pub mod list_items;
pub(crate) mod reconstruct;
mod session;
pub mod whitelist;

pub use anchors::strip_anchors;
pub use br_policy::{BrPolicy, BreakRole, remove_invalid_breaks};
pub use decompose::{DecomposeOptions, Decomposition, decompose, decompose_with};
pub use field::{Field, FieldId, FieldKind, ListItem, SelectOption, StyleOverrideMap};
pub use list_items::{ListEditor, render_item_inner};
pub use reconstruct::{apply_to_marked, reconstruct, reconstruct_marked, render_fields};
pub use session::Session;
pub use whitelist::NodeWhitelist;
