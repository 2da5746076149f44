use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};

use super::tags;

/// Index of a node in a [`Tree`] arena.
///
/// Ids stay valid for the lifetime of the tree: detaching a node removes it
/// from its parent's child list but never reuses or shifts the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One attribute of a start tag.
///
/// `value` is kept in its encoded (source) form; [`Attribute::value`] decodes.
/// Attributes read from source keep their raw text, including the whitespace
/// in front of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    value: Option<String>,
    raw: Option<String>,
}

impl Attribute {
    pub(crate) fn from_source(name: &str, value: Option<&str>, raw: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.map(str::to_string),
            raw: Some(raw.to_string()),
        }
    }

    /// Creates an attribute from a decoded value, encoding it for output.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(encode_double_quoted_attribute(value).into_owned()),
            raw: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Decoded value; a bare attribute (`<input disabled>`) reads as empty.
    pub fn value(&self) -> String {
        self.value
            .as_deref()
            .map(|v| decode_html_entities(v).into_owned())
            .unwrap_or_default()
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        if let Some(raw) = &self.raw {
            out.push_str(raw);
            return;
        }
        out.push(' ');
        out.push_str(&self.name);
        if let Some(value) = &self.value {
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
    }
}

/// How an element's end tag is written back.
#[derive(Debug, Clone, PartialEq)]
pub enum EndTag {
    /// The exact end tag text found in the source.
    Source(String),
    /// The source closed the element implicitly; nothing is written.
    Implied,
    /// Element created by an edit; `</name>` is written unless void.
    Synthesized,
}

#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    written_name: String,
    attrs: Vec<Attribute>,
    /// Everything after the last attribute: whitespace, `/`, `>`.
    tail: String,
    self_closing: bool,
    pub(crate) end: EndTag,
}

impl Element {
    pub(crate) fn from_source(
        written_name: &str,
        attrs: Vec<Attribute>,
        self_closing: bool,
        raw: &str,
    ) -> Self {
        let head_len = 1
            + written_name.len()
            + attrs
                .iter()
                .map(|a| a.raw.as_deref().map_or(0, str::len))
                .sum::<usize>();
        Self {
            name: written_name.to_ascii_lowercase(),
            written_name: written_name.to_string(),
            attrs,
            tail: raw.get(head_len..).unwrap_or(">").to_string(),
            self_closing,
            end: EndTag::Implied,
        }
    }

    fn synthesized(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            written_name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            tail: ">".to_string(),
            self_closing: false,
            end: EndTag::Synthesized,
        }
    }

    /// Lowercase tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.is_named(name))
    }

    pub fn is_void(&self) -> bool {
        tags::is_void(&self.name)
    }

    pub fn self_closing(&self) -> bool {
        self.self_closing
    }

    pub(crate) fn written_name(&self) -> &str {
        &self.written_name
    }

    pub(crate) fn tail(&self) -> &str {
        &self.tail
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Root,
    Element(Element),
    /// Text in source (entity-encoded) form.
    Text(String),
    /// Verbatim content of a raw-text element such as `<style>`.
    RawText(String),
    /// A full comment including its delimiters.
    Comment(String),
    /// Doctype, processing instruction or a stray end tag, kept verbatim.
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Arena tree for one parsed fragment.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates an empty tree holding only the fragment root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub(crate) fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id) {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.data_mut(id) {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Lowercase tag name for element nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    pub fn is_tag(&self, id: NodeId, name: &str) -> bool {
        self.tag(id) == Some(name)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Decoded text of a text node.
    pub fn text(&self, id: NodeId) -> Option<String> {
        match self.data(id) {
            NodeData::Text(raw) => Some(decode_html_entities(raw).into_owned()),
            _ => None,
        }
    }

    /// Source form of a text node.
    pub fn raw_text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    /// Whether the node is a text node holding only whitespace.
    pub fn is_blank_text(&self, id: NodeId) -> bool {
        self.text(id).is_some_and(|t| t.trim().is_empty())
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Removes a node from its parent. The subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Creates a detached element whose end tag is written on output.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(Element::synthesized(name)))
    }

    /// Creates a detached text node from decoded text.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(encode_text(text).into_owned()))
    }

    /// Creates a detached raw-text node, e.g. a `<textarea>` body.
    pub fn create_raw_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::RawText(encode_text(text).into_owned()))
    }

    /// Replaces the source form of a text node with encoded `text`.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeData::Text(raw) = self.data_mut(id) {
            *raw = encode_text(text).into_owned();
        }
    }

    /// All descendants of `id` in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Descendant elements named `tag`, in document order.
    pub fn elements_named(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_tag(n, tag))
            .collect()
    }

    /// Concatenated decoded text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let NodeData::Text(raw) = self.data(node) {
                out.push_str(&decode_html_entities(raw));
            }
        }
        out
    }

    /// Decoded content of raw-text children (`<textarea>`, `<title>`).
    pub fn raw_text_content(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|&c| match self.data(c) {
                NodeData::RawText(raw) | NodeData::Text(raw) => {
                    Some(decode_html_entities(raw).into_owned())
                }
                _ => None,
            })
            .collect()
    }

    /// Decoded attribute value.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.element(id)?.attr(name).map(Attribute::value)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.attr(name).is_some())
    }

    /// Sets an attribute from a decoded value.
    ///
    /// Returns false and leaves the source form untouched when the decoded
    /// value is already equal.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(el) = self.element_mut(id) else {
            return false;
        };
        match el.attrs.iter_mut().find(|a| a.is_named(name)) {
            Some(existing) if existing.value() == value && existing.value.is_some() => false,
            Some(existing) => {
                *existing = Attribute::new(existing.name(), value);
                true
            }
            None => {
                el.attrs.push(Attribute::new(name, value));
                true
            }
        }
    }

    /// Sets a bare attribute such as `selected` or `checked`.
    pub fn set_flag_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let Some(el) = self.element_mut(id) else {
            return false;
        };
        if el.attr(name).is_some() {
            return false;
        }
        el.attrs.push(Attribute {
            name: name.to_string(),
            value: None,
            raw: None,
        });
        true
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let Some(el) = self.element_mut(id) else {
            return false;
        };
        let before = el.attrs.len();
        el.attrs.retain(|a| !a.is_named(name));
        before != el.attrs.len()
    }

    /// Copies the top-level nodes of `other` into this tree under `parent`,
    /// starting at child index `index`. Returns the new top-level ids.
    pub fn graft(&mut self, parent: NodeId, index: usize, other: &Tree) -> Vec<NodeId> {
        let mut inserted = Vec::new();
        for (offset, &child) in other.children(other.root()).iter().enumerate() {
            let copy = self.copy_subtree(other, child);
            self.insert(parent, index + offset, copy);
            inserted.push(copy);
        }
        inserted
    }

    fn copy_subtree(&mut self, other: &Tree, id: NodeId) -> NodeId {
        let copy = self.push(other.data(id).clone());
        for &child in other.children(id) {
            let child_copy = self.copy_subtree(other, child);
            self.append(copy, child_copy);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;

    #[test]
    fn set_attribute_is_noop_for_equal_decoded_value() {
        let mut tree = parse_fragment(r#"<a href="a?x=1&amp;y=2">x</a>"#).unwrap();
        let a = tree.children(tree.root())[0];
        assert!(!tree.set_attribute(a, "href", "a?x=1&y=2"));
        assert_eq!(tree.to_html(), r#"<a href="a?x=1&amp;y=2">x</a>"#);
    }

    #[test]
    fn set_attribute_encodes_new_value() {
        let mut tree = parse_fragment(r#"<a href="/old">x</a>"#).unwrap();
        let a = tree.children(tree.root())[0];
        assert!(tree.set_attribute(a, "title", r#"say "hi""#));
        assert_eq!(tree.attribute(a, "title").as_deref(), Some(r#"say "hi""#));
        assert_eq!(
            tree.to_html(),
            r#"<a href="/old" title="say &quot;hi&quot;">x</a>"#
        );
    }

    #[test]
    fn removing_an_added_attribute_restores_source_start_tag() {
        let mut tree = parse_fragment("<p  class='lead' >Hi</p>").unwrap();
        let p = tree.children(tree.root())[0];
        tree.set_attribute(p, "data-x", "1");
        tree.remove_attribute(p, "data-x");
        assert_eq!(tree.to_html(), "<p  class='lead' >Hi</p>");
    }

    #[test]
    fn detach_keeps_other_children_in_order() {
        let mut tree = parse_fragment("<b>1</b><i>2</i><u>3</u>").unwrap();
        let root = tree.root();
        let middle = tree.children(root)[1];
        tree.detach(middle);
        assert_eq!(tree.to_html(), "<b>1</b><u>3</u>");
        assert_eq!(tree.parent(middle), None);
    }

    #[test]
    fn text_content_decodes_entities_and_skips_comments() {
        let tree = parse_fragment("<p>A &amp; <!-- note --><b>B</b></p>").unwrap();
        let p = tree.children(tree.root())[0];
        assert_eq!(tree.text_content(p), "A & B");
    }

    #[test]
    fn graft_copies_nodes_into_position() {
        let mut tree = parse_fragment("<p>a</p><p>c</p>").unwrap();
        let other = parse_fragment("<p>b</p>").unwrap();
        let root = tree.root();
        tree.graft(root, 1, &other);
        assert_eq!(tree.to_html(), "<p>a</p><p>b</p><p>c</p>");
    }
}
