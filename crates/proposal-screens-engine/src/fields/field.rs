use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a field within one decomposition pass, e.g. `text-0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub(crate) fn numbered(prefix: &str, n: usize) -> Self {
        Self(format!("{prefix}-{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FieldId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Per-field style strings layered over a field's own style.
pub type StyleOverrideMap = BTreeMap<FieldId, String>;

/// One independently editable unit of a fragment.
///
/// `content` is what an editing form shows: trimmed text where `\n` stands
/// for a forced line break. Kinds other than text and element carry their
/// editable state in [`FieldKind`]; their `content` is a readable summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Element {
        tag: String,
        /// Attributes other than `style`, decoded.
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        style: String,
        #[serde(default)]
        has_children: bool,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        width: String,
        #[serde(default)]
        height: String,
        #[serde(default)]
        class_name: String,
        #[serde(default)]
        style: String,
    },
    Input {
        /// `input` or `textarea`.
        tag: String,
        #[serde(default)]
        input_type: String,
        #[serde(default)]
        value: String,
    },
    Select {
        options: Vec<SelectOption>,
        #[serde(default)]
        value: String,
    },
    List {
        #[serde(default)]
        ordered: bool,
        items: Vec<ListItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    #[serde(default)]
    pub selected: bool,
}

/// Display state of one `<li>`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default)]
    pub has_html: bool,
    /// The `<li>`'s own style attribute.
    #[serde(default)]
    pub styles: String,
    /// Styles of inline elements inside the item, by field id.
    #[serde(default)]
    pub element_styles: StyleOverrideMap,
}

impl ListItem {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

impl Field {
    pub fn text(id: impl Into<FieldId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            kind: FieldKind::Text,
        }
    }

    pub fn element(
        id: impl Into<FieldId>,
        tag: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            kind: FieldKind::Element {
                tag: tag.into(),
                attributes: BTreeMap::new(),
                style: String::new(),
                has_children: false,
            },
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_style(mut self, value: &str) -> Self {
        self.set_style(value);
        self
    }

    /// Tag name for element-like kinds.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Text => None,
            FieldKind::Element { tag, .. } | FieldKind::Input { tag, .. } => Some(tag),
            FieldKind::Image { .. } => Some("img"),
            FieldKind::Select { .. } => Some("select"),
            FieldKind::List { ordered: true, .. } => Some("ol"),
            FieldKind::List { ordered: false, .. } => Some("ul"),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, FieldKind::Text)
    }

    /// Style carried by the field itself, if its kind has one.
    pub fn style(&self) -> &str {
        match &self.kind {
            FieldKind::Element { style, .. } | FieldKind::Image { style, .. } => style,
            _ => "",
        }
    }

    pub fn set_style(&mut self, value: &str) {
        match &mut self.kind {
            FieldKind::Element { style, .. } | FieldKind::Image { style, .. } => {
                *style = value.to_string();
            }
            _ => log::debug!("field {} has no style to set", self.id),
        }
    }

    /// Replaces the editable content, routed to the kind's own state.
    pub fn set_content(&mut self, text: &str) {
        match &mut self.kind {
            FieldKind::Text | FieldKind::Element { .. } => {}
            FieldKind::Image { alt, .. } => *alt = text.to_string(),
            FieldKind::Input { value, .. } => *value = text.to_string(),
            FieldKind::Select { options, value } => {
                let Some(chosen) = options
                    .iter()
                    .position(|o| o.value == text || o.text == text)
                else {
                    log::warn!("select field {} has no option {text:?}", self.id);
                    return;
                };
                for (i, option) in options.iter_mut().enumerate() {
                    option.selected = i == chosen;
                }
                *value = options[chosen].value.clone();
                self.content = options[chosen].text.clone();
                return;
            }
            FieldKind::List { items, .. } => {
                *items = text.lines().map(ListItem::plain).collect();
            }
        }
        self.content = text.to_string();
    }

    /// Sets an attribute on an element-like field. An empty value marks the
    /// attribute for removal.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            self.set_style(value);
            return;
        }
        match &mut self.kind {
            FieldKind::Element { attributes, .. } => {
                attributes.insert(name, value.to_string());
            }
            FieldKind::Image {
                src,
                alt,
                title,
                width,
                height,
                class_name,
                ..
            } => {
                let slot = match name.as_str() {
                    "src" => src,
                    "alt" => alt,
                    "title" => title,
                    "width" => width,
                    "height" => height,
                    "class" => class_name,
                    _ => {
                        log::debug!("image field {} ignores attribute {name}", self.id);
                        return;
                    }
                };
                *slot = value.to_string();
            }
            FieldKind::Input {
                input_type, value: v, ..
            } => match name.as_str() {
                "type" => *input_type = value.to_string(),
                "value" => *v = value.to_string(),
                _ => log::debug!("input field {} ignores attribute {name}", self.id),
            },
            _ => log::debug!("field {} has no attributes", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fields_serialize_with_kind_tag() {
        let field = Field::element("element-0", "a", "Home").with_attribute("href", "/");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "element-0",
                "content": "Home",
                "kind": "element",
                "tag": "a",
                "attributes": { "href": "/" },
                "style": "",
                "has_children": false
            })
        );
        let back: Field = serde_json::from_value(json).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn text_field_json_is_minimal() {
        let json = serde_json::to_string(&Field::text("text-3", "Hi")).unwrap();
        assert_eq!(json, r#"{"id":"text-3","content":"Hi","kind":"text"}"#);
    }

    #[test]
    fn set_attribute_style_goes_to_style_slot() {
        let mut field = Field::element("element-1", "span", "x");
        field.set_attribute("style", "color: red");
        assert_eq!(field.style(), "color: red");
        let FieldKind::Element { attributes, .. } = &field.kind else {
            unreachable!()
        };
        assert!(attributes.is_empty());
    }

    #[test]
    fn select_content_picks_option_by_text_or_value() {
        let mut field = Field {
            id: FieldId::new("select-0"),
            content: "One".into(),
            kind: FieldKind::Select {
                options: vec![
                    SelectOption {
                        value: "1".into(),
                        text: "One".into(),
                        selected: true,
                    },
                    SelectOption {
                        value: "2".into(),
                        text: "Two".into(),
                        selected: false,
                    },
                ],
                value: "1".into(),
            },
        };
        field.set_content("2");
        assert_eq!(field.content, "Two");
        let FieldKind::Select { options, value } = &field.kind else {
            unreachable!()
        };
        assert_eq!(value, "2");
        assert!(!options[0].selected && options[1].selected);
    }
}
