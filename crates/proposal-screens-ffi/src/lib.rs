//! UniFFI bindings for proposal-screens editing hosts
//!
//! Exposes decomposition, reconstruction, the text patch service and an
//! editing session to foreign hosts. Fields cross the boundary as records
//! carrying their full JSON form, so hosts can send edited fields back
//! without knowing every field kind.

use proposal_screens_engine::fields::{self, DecomposeOptions, Field, FieldKind, Session};
use proposal_screens_engine::patch::{self, PatchRequest};
use std::collections::HashMap;
use std::sync::Mutex;

uniffi::setup_scaffolding!();

// ============ Errors ============

/// Errors that can cross the FFI boundary
/// Note: Field is named `reason` not `message` to avoid conflict with Throwable.message in Kotlin
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    #[error("Invalid JSON: {reason}")]
    InvalidJson { reason: String },
}

impl From<serde_json::Error> for FfiError {
    fn from(err: serde_json::Error) -> Self {
        FfiError::InvalidJson {
            reason: err.to_string(),
        }
    }
}

// ============ Session Handle ============

/// A handle to one screen open for editing.
#[derive(uniffi::Object)]
pub struct SessionHandle {
    inner: Mutex<Session>,
}

#[uniffi::export]
impl SessionHandle {
    #[uniffi::constructor]
    pub fn open(fragment: String, is_list_item: bool) -> Self {
        let options = if is_list_item {
            DecomposeOptions::list_item()
        } else {
            DecomposeOptions::default()
        };
        Self {
            inner: Mutex::new(Session::open(&fragment, options)),
        }
    }

    pub fn id(&self) -> String {
        self.session().id().to_string()
    }

    pub fn fields(&self) -> Vec<FieldDto> {
        self.session()
            .fields()
            .into_iter()
            .map(FieldDto::from_engine)
            .collect()
    }

    pub fn edit_content(&self, field_id: String, content: String) -> bool {
        self.session().edit_content(&field_id, &content)
    }

    pub fn set_attribute(&self, field_id: String, name: String, value: String) -> bool {
        self.session().set_attribute(&field_id, &name, &value)
    }

    pub fn set_style_override(&self, field_id: String, style: String) -> bool {
        self.session().set_style_override(&field_id, &style)
    }

    /// Apply a batch of edited fields given as a JSON array.
    pub fn apply_fields_json(&self, fields_json: String) -> Result<(), FfiError> {
        let fields: Vec<Field> = serde_json::from_str(&fields_json)?;
        self.session().apply(&fields);
        Ok(())
    }

    pub fn render(&self) -> String {
        self.session().render()
    }

    pub fn selector_for(&self, field_id: String) -> Option<String> {
        self.session().selector_for(&field_id)
    }
}

impl SessionHandle {
    fn session(&self) -> std::sync::MutexGuard<'_, Session> {
        // Recover from poisoned mutex (another thread panicked while holding lock)
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============ DTOs ============

#[derive(Debug, uniffi::Record)]
pub struct DecompositionDto {
    pub marked_fragment: String,
    pub fields: Vec<FieldDto>,
}

/// One editable field.
#[derive(Debug, uniffi::Record)]
pub struct FieldDto {
    pub id: String,
    /// "text", "element", "image", "input", "select" or "list"
    pub kind: String,
    /// Tag name for element-like fields
    pub tag_name: Option<String>,
    pub content: String,
    pub style: String,
    /// The complete field as JSON, for sending edits back
    pub json: String,
}

impl FieldDto {
    fn from_engine(field: &Field) -> Self {
        let kind = match &field.kind {
            FieldKind::Text => "text",
            FieldKind::Element { .. } => "element",
            FieldKind::Image { .. } => "image",
            FieldKind::Input { .. } => "input",
            FieldKind::Select { .. } => "select",
            FieldKind::List { .. } => "list",
        };
        Self {
            id: field.id.to_string(),
            kind: kind.to_string(),
            tag_name: field.tag_name().map(str::to_string),
            content: field.content.clone(),
            style: field.style().to_string(),
            json: serde_json::to_string(field).unwrap_or_default(),
        }
    }
}

// ============ Standalone Functions ============

#[uniffi::export]
pub fn decompose(fragment: String, is_list_item: bool) -> DecompositionDto {
    let decomposition = fields::decompose(&fragment, is_list_item);
    DecompositionDto {
        fields: decomposition
            .fields
            .iter()
            .map(FieldDto::from_engine)
            .collect(),
        marked_fragment: decomposition.marked_fragment,
    }
}

/// Rebuild a fragment from a JSON array of fields.
#[uniffi::export]
pub fn reconstruct(
    marked_fragment: Option<String>,
    fields_json: String,
    style_overrides: HashMap<String, String>,
) -> Result<String, FfiError> {
    let fields: Vec<Field> = serde_json::from_str(&fields_json)?;
    let overrides: fields::StyleOverrideMap = style_overrides
        .into_iter()
        .map(|(id, style)| (id.into(), style))
        .collect();
    Ok(fields::reconstruct(
        marked_fragment.as_deref(),
        &fields,
        (!overrides.is_empty()).then_some(&overrides),
    ))
}

/// Apply a JSON patch request to a stored fragment.
#[uniffi::export]
pub fn apply_patch(current_html: String, request_json: String) -> Result<String, FfiError> {
    let request: PatchRequest = serde_json::from_str(&request_json)?;
    Ok(patch::apply_patch(&current_html, &request))
}

#[uniffi::export]
pub fn remove_invalid_breaks(html: String) -> String {
    fields::remove_invalid_breaks(&html)
}
