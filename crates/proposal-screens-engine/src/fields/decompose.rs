use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::markup::{NodeData, NodeId, Tree, parse_fragment};

use super::anchors::{Anchors, FIELD_ID_ATTR, TEXT_RUNS_ATTR, Target, TextRun};
use super::br_policy::{BrPolicy, BreakRole};
use super::content::{element_content, run_content};
use super::field::{Field, FieldId, FieldKind, SelectOption};
use super::list_items::read_list_item;
use super::whitelist::NodeWhitelist;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecomposeOptions {
    /// The fragment is the inner content of one `<li>`.
    #[serde(default)]
    pub list_item: bool,
    /// Whole `<ul>`/`<ol>` lists become single list fields.
    #[serde(default)]
    pub collapse_lists: bool,
}

impl DecomposeOptions {
    pub fn list_item() -> Self {
        Self {
            list_item: true,
            ..Self::default()
        }
    }
}

/// A marked fragment and the fields anchored in it, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub marked_fragment: String,
    pub fields: Vec<Field>,
}

impl Decomposition {
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id.as_str() == id)
    }
}

/// Splits a fragment into editable fields.
pub fn decompose(fragment: &str, is_list_item: bool) -> Decomposition {
    decompose_with(
        fragment,
        DecomposeOptions {
            list_item: is_list_item,
            ..DecomposeOptions::default()
        },
    )
}

pub fn decompose_with(fragment: &str, options: DecomposeOptions) -> Decomposition {
    if fragment.trim().is_empty() {
        return Decomposition {
            marked_fragment: fragment.to_string(),
            fields: vec![Field::text("text-0", "")],
        };
    }
    let mut tree = match parse_fragment(fragment) {
        Ok(tree) => tree,
        Err(err) => {
            log::warn!("fragment kept as one opaque text field: {err}");
            return Decomposition {
                marked_fragment: fragment.to_string(),
                fields: vec![Field::text("text-0", fragment.trim())],
            };
        }
    };

    let stale = Anchors::take(&mut tree);
    if !stale.is_empty() {
        log::debug!("dropped anchors left over from an earlier pass");
    }
    let (fields, anchors) = analyze(&tree, options);
    anchors.write(&mut tree);
    Decomposition {
        marked_fragment: tree.to_html(),
        fields,
    }
}

/// Finds the fields of an anchor-free tree and where each one lives.
pub(crate) fn analyze(tree: &Tree, options: DecomposeOptions) -> (Vec<Field>, Anchors) {
    let mut decomposer = Decomposer {
        tree,
        options,
        fields: Vec::new(),
        anchors: Anchors::default(),
        counters: BTreeMap::new(),
    };
    decomposer.walk(tree.root());
    let Decomposer {
        mut fields,
        anchors,
        ..
    } = decomposer;
    if fields.is_empty() {
        fields.push(Field::text("text-0", ""));
    }
    (fields, anchors)
}

struct Decomposer<'t> {
    tree: &'t Tree,
    options: DecomposeOptions,
    fields: Vec<Field>,
    anchors: Anchors,
    counters: BTreeMap<&'static str, usize>,
}

impl Decomposer<'_> {
    fn next_id(&mut self, prefix: &'static str) -> FieldId {
        let n = self.counters.entry(prefix).or_insert(0);
        let id = FieldId::numbered(prefix, *n);
        *n += 1;
        id
    }

    /// Collects text runs among the children of `parent`. A run ends at any
    /// element that is not a break, and at comments, so every run is a
    /// contiguous slice of one parent's children that can be rewritten in
    /// place without touching the markup around it.
    fn walk(&mut self, parent: NodeId) {
        let tree = self.tree;
        let mut run = Vec::new();
        for &child in tree.children(parent) {
            match tree.data(child) {
                NodeData::Text(_) => run.push(child),
                NodeData::Element(el) if el.name() == "br" => {
                    match BrPolicy::role_in(tree, child, self.options.list_item) {
                        BreakRole::Untouched => self.flush_run(parent, &mut run),
                        BreakRole::Text | BreakRole::Noise => run.push(child),
                    }
                }
                NodeData::Element(_) => {
                    self.flush_run(parent, &mut run);
                    self.visit_element(child);
                }
                _ => self.flush_run(parent, &mut run),
            }
        }
        self.flush_run(parent, &mut run);
    }

    /// Emits the pending run, trimmed to its first and last non-blank text.
    fn flush_run(&mut self, parent: NodeId, run: &mut Vec<NodeId>) {
        let members = std::mem::take(run);
        let tree = self.tree;
        let has_text = |&n: &NodeId| tree.is_text(n) && !tree.is_blank_text(n);
        let (Some(first), Some(last)) = (
            members.iter().position(has_text),
            members.iter().rposition(has_text),
        ) else {
            return;
        };
        let nodes = members[first..=last].to_vec();
        let content = run_content(tree, &nodes, self.options.list_item);
        let id = self.next_id("text");
        self.fields.push(Field::text(id.clone(), content));
        self.anchors.push(id, Target::Run(TextRun { parent, nodes }));
    }

    fn visit_element(&mut self, node: NodeId) {
        let tree = self.tree;
        let Some(tag) = tree.tag(node) else {
            return;
        };
        if NodeWhitelist::is_opaque(tag) {
            return;
        }
        match tag {
            "img" => {
                let kind = read_image(tree, node);
                let alt = tree.attribute(node, "alt").unwrap_or_default();
                self.push_field("image", node, alt, kind);
            }
            "input" => {
                let value = tree.attribute(node, "value").unwrap_or_default();
                let kind = FieldKind::Input {
                    tag: "input".to_string(),
                    input_type: tree
                        .attribute(node, "type")
                        .map(|t| t.to_ascii_lowercase())
                        .unwrap_or_default(),
                    value: value.clone(),
                };
                self.push_field("input", node, value, kind);
            }
            "textarea" => {
                let value = tree.raw_text_content(node);
                let kind = FieldKind::Input {
                    tag: "textarea".to_string(),
                    input_type: String::new(),
                    value: value.clone(),
                };
                self.push_field("input", node, value, kind);
            }
            "select" => {
                let (options, value) = read_select(tree, node);
                let content = options
                    .iter()
                    .find(|o| o.value == value)
                    .map(|o| o.text.clone())
                    .unwrap_or_default();
                self.push_field("select", node, content, FieldKind::Select { options, value });
            }
            "ul" | "ol" if self.options.collapse_lists => {
                let items: Vec<_> = tree
                    .children(node)
                    .iter()
                    .filter(|&&c| tree.is_tag(c, "li"))
                    .map(|&li| read_list_item(tree, li))
                    .collect();
                let content = items
                    .iter()
                    .map(|i| i.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                let kind = FieldKind::List {
                    ordered: tag == "ol",
                    items,
                };
                self.push_field("list", node, content, kind);
            }
            _ if NodeWhitelist::is_element_field(tag) => {
                let kind = read_element(tree, node, tag);
                let content = element_content(tree, node);
                self.push_field("element", node, content, kind);
            }
            _ => self.walk(node),
        }
    }

    fn push_field(&mut self, prefix: &'static str, node: NodeId, content: String, kind: FieldKind) {
        let id = self.next_id(prefix);
        self.fields.push(Field {
            id: id.clone(),
            content,
            kind,
        });
        self.anchors.push(id, Target::Element(node));
    }
}

fn read_element(tree: &Tree, node: NodeId, tag: &str) -> FieldKind {
    let attributes = tree
        .element(node)
        .map(|el| {
            el.attrs()
                .iter()
                .filter(|a| {
                    !a.is_named("style") && !a.is_named(FIELD_ID_ATTR) && !a.is_named(TEXT_RUNS_ATTR)
                })
                .map(|a| (a.name().to_ascii_lowercase(), a.value()))
                .collect()
        })
        .unwrap_or_default();
    let has_children = tree
        .children(node)
        .iter()
        .any(|&c| tree.tag(c).is_some_and(NodeWhitelist::is_element_field));
    FieldKind::Element {
        tag: tag.to_string(),
        attributes,
        style: tree.attribute(node, "style").unwrap_or_default(),
        has_children,
    }
}

pub(crate) fn read_image(tree: &Tree, node: NodeId) -> FieldKind {
    let attr = |name: &str| tree.attribute(node, name).unwrap_or_default();
    FieldKind::Image {
        src: attr("src"),
        alt: attr("alt"),
        title: attr("title"),
        width: attr("width"),
        height: attr("height"),
        class_name: attr("class"),
        style: attr("style"),
    }
}

/// Options of a `<select>` and its effective value.
pub(crate) fn read_select(tree: &Tree, node: NodeId) -> (Vec<SelectOption>, String) {
    let options: Vec<SelectOption> = tree
        .elements_named(node, "option")
        .into_iter()
        .map(|opt| {
            let text = element_content(tree, opt);
            SelectOption {
                value: tree.attribute(opt, "value").unwrap_or_else(|| text.clone()),
                text,
                selected: tree.has_attribute(opt, "selected"),
            }
        })
        .collect();
    let value = options
        .iter()
        .find(|o| o.selected)
        .or(options.first())
        .map(|o| o.value.clone())
        .unwrap_or_default();
    (options, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary(fields: &[Field]) -> Vec<(String, String)> {
        fields
            .iter()
            .map(|f| (f.id.to_string(), f.content.clone()))
            .collect()
    }

    #[test]
    fn text_runs_and_elements_interleave_in_document_order() {
        let result = decompose("<div>Hello <b>world</b>! Bye</div>", false);
        assert_eq!(
            summary(&result.fields),
            vec![
                ("text-0".to_string(), "Hello".to_string()),
                ("element-0".to_string(), "world".to_string()),
                ("text-1".to_string(), "! Bye".to_string()),
            ]
        );
        assert_eq!(
            result.marked_fragment,
            r#"<div data-edit-text-runs="text-0:0+1;text-1:2+1">Hello <b data-edit-field-id="element-0">world</b>! Bye</div>"#
        );
    }

    #[test]
    fn meaningful_breaks_join_a_run() {
        let result = decompose("<table><tr><td>a<br>b</td></tr></table>", false);
        assert_eq!(
            summary(&result.fields),
            vec![("text-0".to_string(), "a\nb".to_string())]
        );
    }

    #[test]
    fn noise_breaks_merge_with_a_space() {
        let result = decompose("<div>hi<br>there</div>", false);
        assert_eq!(result.fields[0].content, "hi there");
    }

    #[test]
    fn element_fields_are_not_searched_further() {
        let result = decompose("<p>Hi <a href=\"/x\">there</a></p>", false);
        assert_eq!(result.fields.len(), 1);
        let FieldKind::Element {
            tag, has_children, ..
        } = &result.fields[0].kind
        else {
            panic!("expected element field");
        };
        assert_eq!(tag, "p");
        assert!(has_children);
        assert_eq!(result.fields[0].content, "Hi there");
    }

    #[test]
    fn break_only_content_does_not_count_as_children() {
        let result = decompose("<p>a<br>b</p>", false);
        let FieldKind::Element { has_children, .. } = &result.fields[0].kind else {
            panic!("expected element field");
        };
        assert!(!has_children);
        assert_eq!(result.fields[0].content, "a\nb");
    }

    #[test]
    fn style_is_kept_out_of_attributes() {
        let result = decompose(r#"<span class="k" style="color:red">x</span>"#, false);
        let FieldKind::Element {
            attributes, style, ..
        } = &result.fields[0].kind
        else {
            panic!("expected element field");
        };
        assert_eq!(style, "color:red");
        assert_eq!(attributes.get("class").map(String::as_str), Some("k"));
        assert!(!attributes.contains_key("style"));
    }

    #[test]
    fn empty_fragment_yields_one_empty_text_field() {
        for input in ["", "   ", "<div><br></div>"] {
            let result = decompose(input, false);
            assert_eq!(result.fields, vec![Field::text("text-0", "")], "{input:?}");
        }
    }

    #[test]
    fn unparseable_fragment_is_one_opaque_field() {
        let result = decompose("<p>a</p><!-- open", false);
        assert_eq!(result.fields, vec![Field::text("text-0", "<p>a</p><!-- open")]);
        assert_eq!(result.marked_fragment, "<p>a</p><!-- open");
    }

    #[test]
    fn form_controls_become_fields() {
        let result = decompose(
            concat!(
                r#"<form><img src="a.png" alt="Logo">"#,
                r#"<input type="Text" value="Ann"><textarea>Notes</textarea>"#,
                r#"<select><option value="1">One<option value="2" selected>Two</select></form>"#
            ),
            false,
        );
        let ids: Vec<_> = result.fields.iter().map(|f| f.id.to_string()).collect();
        assert_eq!(ids, ["image-0", "input-0", "input-1", "select-0"]);
        assert_eq!(result.fields[0].content, "Logo");
        assert!(matches!(
            &result.fields[1].kind,
            FieldKind::Input { input_type, value, .. } if input_type == "text" && value == "Ann"
        ));
        assert_eq!(result.fields[2].content, "Notes");
        assert_eq!(result.fields[3].content, "Two");
    }

    #[test]
    fn lists_collapse_only_when_asked() {
        let html = "<ul><li>One</li><li><b>Two</b></li></ul>";
        let open = decompose(html, false);
        assert_eq!(open.fields.len(), 2);

        let collapsed = decompose_with(
            html,
            DecomposeOptions {
                collapse_lists: true,
                ..DecomposeOptions::default()
            },
        );
        assert_eq!(collapsed.fields.len(), 1);
        let FieldKind::List { ordered, items } = &collapsed.fields[0].kind else {
            panic!("expected list field");
        };
        assert!(!ordered);
        assert_eq!(items.len(), 2);
        assert!(items[1].has_html);
        assert_eq!(collapsed.fields[0].content, "One\nTwo");
    }

    #[test]
    fn scripts_and_styles_are_skipped() {
        let result = decompose("<style>p{}</style><script>var a;</script>Hi", false);
        assert_eq!(
            summary(&result.fields),
            vec![("text-0".to_string(), "Hi".to_string())]
        );
    }

    #[test]
    fn stale_anchors_are_replaced() {
        let once = decompose("<p>x</p>", false);
        let twice = decompose(&once.marked_fragment, false);
        assert_eq!(once, twice);
    }
}
