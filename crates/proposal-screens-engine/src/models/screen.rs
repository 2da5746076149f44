use serde::{Deserialize, Serialize};

use crate::patch::{PatchRequest, apply_patch};

const DEFAULT_NAME: &str = "New Screen";

/// One proposal screen: the imported fragment and its edited form.
///
/// `original_html` is written once at import. Edits only ever touch
/// `edited_html`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    name: String,
    original_html: String,
    #[serde(default)]
    edited_html: String,
}

impl Screen {
    /// A freshly imported screen. A blank name becomes `New Screen`.
    pub fn import(name: &str, html: impl Into<String>) -> Self {
        let html = html.into();
        let name = name.trim();
        Self {
            name: if name.is_empty() { DEFAULT_NAME } else { name }.to_string(),
            edited_html: html.clone(),
            original_html: html,
        }
    }

    /// Rebuilds a screen from stored parts.
    pub fn from_parts(
        name: impl Into<String>,
        original_html: impl Into<String>,
        edited_html: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            original_html: original_html.into(),
            edited_html: edited_html.into(),
        }
    }

    /// Screen name for an imported file: the file name without `.html`.
    pub fn name_from_file(file_name: &str) -> &str {
        file_name.strip_suffix(".html").unwrap_or(file_name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original_html(&self) -> &str {
        &self.original_html
    }

    pub fn edited_html(&self) -> &str {
        &self.edited_html
    }

    /// The fragment to show and edit: the edited form unless it is empty.
    pub fn current_html(&self) -> &str {
        if self.edited_html.is_empty() {
            &self.original_html
        } else {
            &self.edited_html
        }
    }

    pub fn rename(&mut self, name: &str) {
        if !name.trim().is_empty() {
            self.name = name.trim().to_string();
        }
    }

    pub fn apply_patch(&mut self, request: &PatchRequest) {
        self.edited_html = apply_patch(self.current_html(), request);
    }

    pub fn replace_html(&mut self, html: impl Into<String>) {
        self.edited_html = html.into();
    }

    /// Drops all edits.
    pub fn revert(&mut self) {
        self.edited_html = self.original_html.clone();
    }

    pub fn duplicate(&self) -> Self {
        Self {
            name: format!("{} (Copy)", self.name),
            original_html: self.original_html.clone(),
            edited_html: self.current_html().to_string(),
        }
    }
}
