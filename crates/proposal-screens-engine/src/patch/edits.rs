use serde::{Deserialize, Serialize};

use crate::fields::{ListItem, SelectOption};

/// One edit sent by an editing client.
///
/// `data_id` is tried first, then `selector`. Every node the address
/// matches is updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEdit {
    #[serde(default)]
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,
    #[serde(flatten)]
    pub payload: EditPayload,
}

impl TextEdit {
    pub fn new(selector: impl Into<String>, payload: EditPayload) -> Self {
        Self {
            selector: selector.into(),
            data_id: None,
            payload,
        }
    }

    pub fn with_data_id(mut self, id: impl Into<String>) -> Self {
        self.data_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditPayload {
    Text(TextPayload),
    Html { html: String },
    Value(ValuePayload),
    List { items: Vec<ListEntry> },
    Image(ImagePayload),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub has_children: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl TextPayload {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Input,
    Textarea,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePayload {
    /// Falls back to the matched element's tag when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<Control>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// A new option set for a `<select>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
}

/// A list item as sent by clients: bare text or text with markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListEntry {
    Plain(String),
    Rich {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
        #[serde(default)]
        styles: String,
    },
}

impl ListEntry {
    pub(crate) fn to_item(&self) -> ListItem {
        match self {
            ListEntry::Plain(text) => ListItem::plain(text.as_str()),
            ListEntry::Rich { text, html, styles } => {
                let html = html.as_ref().filter(|h| !h.trim().is_empty()).cloned();
                ListItem {
                    text: text.clone(),
                    has_html: html.is_some(),
                    html,
                    styles: styles.clone(),
                    ..ListItem::default()
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn text_edit_reads_from_client_json() {
        let edit: TextEdit = serde_json::from_value(json!({
            "selector": "p:nth-of-type(2)",
            "data_id": "text-1",
            "kind": "text",
            "text": "Hello",
            "has_children": false
        }))
        .unwrap();
        assert_eq!(edit.selector, "p:nth-of-type(2)");
        assert_eq!(edit.data_id.as_deref(), Some("text-1"));
        assert_eq!(edit.payload, EditPayload::Text(TextPayload::plain("Hello")));
    }

    #[test]
    fn unrecognised_kinds_become_unknown() {
        let edit: TextEdit =
            serde_json::from_value(json!({ "selector": "p", "kind": "video" })).unwrap();
        assert_eq!(edit.payload, EditPayload::Unknown);
    }

    #[test]
    fn list_items_accept_strings_and_objects() {
        let edit: TextEdit = serde_json::from_value(json!({
            "selector": "ul",
            "kind": "list",
            "items": ["one", { "text": "two", "html": "<b>two</b>", "styles": "color:red" }]
        }))
        .unwrap();
        let EditPayload::List { items } = edit.payload else {
            panic!("expected a list payload");
        };
        assert_eq!(items[0].to_item(), ListItem::plain("one"));
        let rich = items[1].to_item();
        assert_eq!(rich.html.as_deref(), Some("<b>two</b>"));
        assert!(rich.has_html);
        assert_eq!(rich.styles, "color:red");
    }

    #[test]
    fn value_payload_control_is_optional() {
        let edit: TextEdit = serde_json::from_value(json!({
            "selector": "#size",
            "kind": "value",
            "value": "L"
        }))
        .unwrap();
        assert_eq!(
            edit.payload,
            EditPayload::Value(ValuePayload {
                control: None,
                value: Some("L".to_string()),
                options: None,
            })
        );
    }
}
