use std::collections::BTreeMap;

use uuid::Uuid;

use crate::markup::{Selector, parse_fragment};

use super::anchors::{Anchors, Target};
use super::decompose::{DecomposeOptions, decompose_with};
use super::field::{Field, FieldId, StyleOverrideMap};
use super::reconstruct::{apply_to_marked_reporting, reconstruct_marked};

/// One screen open for editing.
///
/// Owns the marked template and the current field values. Every edit is
/// written into the template straight away with anchors kept, so later
/// edits address the same fields. Nothing is shared between sessions.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    marked_fragment: String,
    fields: BTreeMap<FieldId, Field>,
    order: Vec<FieldId>,
    options: DecomposeOptions,
    overrides: StyleOverrideMap,
}

impl Session {
    pub fn open(fragment: &str, options: DecomposeOptions) -> Self {
        let decomposition = decompose_with(fragment, options);
        let order = decomposition.fields.iter().map(|f| f.id.clone()).collect();
        let fields = decomposition
            .fields
            .into_iter()
            .map(|f| (f.id.clone(), f))
            .collect();
        let session = Self {
            id: Uuid::new_v4(),
            marked_fragment: decomposition.marked_fragment,
            fields,
            order,
            options,
            overrides: StyleOverrideMap::new(),
        };
        log::debug!("session {} opened with {} fields", session.id, session.order.len());
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> DecomposeOptions {
        self.options
    }

    pub fn marked_fragment(&self) -> &str {
        &self.marked_fragment
    }

    /// Fields in document order.
    pub fn fields(&self) -> Vec<&Field> {
        self.order.iter().filter_map(|id| self.fields.get(id)).collect()
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.get(&FieldId::new(id))
    }

    pub fn style_overrides(&self) -> &StyleOverrideMap {
        &self.overrides
    }

    pub fn edit_content(&mut self, id: &str, text: &str) -> bool {
        self.edit(id, |field| field.set_content(text))
    }

    pub fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> bool {
        self.edit(id, |field| field.set_attribute(name, value))
    }

    /// Layers a style over a field's own style. An empty style removes the
    /// override. Unknown ids are ignored.
    pub fn set_style_override(&mut self, id: &str, style: &str) -> bool {
        let key = FieldId::new(id);
        if !self.fields.contains_key(&key) {
            log::debug!("style override for unknown field {id} ignored");
            return false;
        }
        if style.trim().is_empty() {
            self.overrides.remove(&key);
        } else {
            self.overrides.insert(key, style.trim().to_string());
        }
        self.edit(id, |_| {})
    }

    /// Takes a batch of edited fields. Fields this session does not know,
    /// and fields the template has no place for, are dropped.
    pub fn apply(&mut self, fields: &[Field]) {
        let known: Vec<Field> = fields
            .iter()
            .filter(|f| {
                let known = self.fields.contains_key(&f.id);
                if !known {
                    log::warn!("session {} has no field {}; edit dropped", self.id, f.id);
                }
                known
            })
            .cloned()
            .collect();
        let (marked, applied) =
            apply_to_marked_reporting(&self.marked_fragment, &known, Some(&self.overrides));
        self.marked_fragment = marked;
        for field in known {
            if applied.contains(&field.id) {
                self.fields.insert(field.id.clone(), field);
            }
        }
    }

    /// The current fragment: anchors stripped, structural breaks removed.
    pub fn render(&self) -> String {
        reconstruct_marked(&self.marked_fragment, &[], None)
    }

    /// A selector for the element holding field `id`. Text runs resolve to
    /// their parent element; runs at the top level have none.
    pub fn selector_for(&self, id: &str) -> Option<String> {
        let mut tree = parse_fragment(&self.marked_fragment).ok()?;
        let anchors = Anchors::take(&mut tree);
        let node = match anchors.get(&FieldId::new(id))? {
            Target::Element(node) => *node,
            Target::Run(run) if run.parent != tree.root() => run.parent,
            Target::Run(_) => return None,
        };
        Selector::for_node(&tree, node).map(|s| s.to_string())
    }

    /// Ends the session and returns the final fragment.
    pub fn close(self) -> String {
        log::debug!("session {} closed", self.id);
        self.render()
    }

    fn edit(&mut self, id: &str, change: impl FnOnce(&mut Field)) -> bool {
        let Some(mut field) = self.field(id).cloned() else {
            log::debug!("session {} has no field {id}", self.id);
            return false;
        };
        change(&mut field);
        self.apply(&[field]);
        true
    }
}
