//! Conversion between live nodes and field content strings.
//!
//! Content collapses whitespace the way a browser renders it, turns
//! meaningful breaks into `\n`, and is trimmed. The same functions read the
//! template at decomposition time and at reconstruction time, so a field
//! whose content still matches is recognised as unedited.

use crate::markup::{NodeData, NodeId, Tree};

use super::br_policy::{BrPolicy, BreakRole};

#[derive(Default)]
struct ContentBuilder {
    out: String,
    pending_space: bool,
}

impl ContentBuilder {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            if self.pending_space && !self.out.is_empty() && !self.out.ends_with('\n') {
                self.out.push(' ');
            }
            self.pending_space = false;
            self.out.push(c);
        }
    }

    fn push_break(&mut self) {
        self.out.push('\n');
        self.pending_space = false;
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}

/// Content of a text run: its text nodes and the breaks between them.
pub fn run_content(tree: &Tree, nodes: &[NodeId], list_item: bool) -> String {
    let mut builder = ContentBuilder::default();
    for &node in nodes {
        if let Some(text) = tree.text(node) {
            builder.push_text(&text);
        } else if tree.is_tag(node, "br") {
            match BrPolicy::role_in(tree, node, list_item) {
                BreakRole::Noise => builder.push_text(" "),
                BreakRole::Text | BreakRole::Untouched => builder.push_break(),
            }
        }
    }
    builder.finish()
}

/// Content of an element field: all descendant text, breaks as `\n`.
pub fn element_content(tree: &Tree, element: NodeId) -> String {
    let mut builder = ContentBuilder::default();
    for node in tree.descendants(element) {
        match tree.data(node) {
            NodeData::Text(_) => {
                if let Some(text) = tree.text(node) {
                    builder.push_text(&text);
                }
            }
            NodeData::Element(el) if el.name() == "br" => builder.push_break(),
            _ => {}
        }
    }
    builder.finish()
}

/// Leading and trailing whitespace of a text node's source.
pub fn edge_whitespace(tree: &Tree, node: NodeId) -> (String, String) {
    let Some(raw) = tree.raw_text(node) else {
        return (String::new(), String::new());
    };
    let trimmed_start = raw.trim_start();
    let lead = &raw[..raw.len() - trimmed_start.len()];
    let trail = &trimmed_start[trimmed_start.trim_end().len()..];
    (lead.to_string(), trail.to_string())
}

/// Creates detached nodes for `content`. Lines become text nodes separated
/// by `<br>` when `breaks` is set and are joined by spaces otherwise.
/// `lead`/`trail` wrap the result. At least one node is always returned so
/// the position stays addressable.
pub fn expand(tree: &mut Tree, content: &str, breaks: bool, lead: &str, trail: &str) -> Vec<NodeId> {
    let mut lines: Vec<String> = if breaks {
        content.split('\n').map(str::to_string).collect()
    } else {
        vec![content.replace('\n', " ")]
    };
    if let Some(first) = lines.first_mut() {
        first.insert_str(0, lead);
    }
    if let Some(last) = lines.last_mut() {
        last.push_str(trail);
    }

    let mut nodes = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            nodes.push(tree.create_element("br"));
        }
        if !line.is_empty() {
            nodes.push(tree.create_text(line));
        }
    }
    if nodes.is_empty() {
        nodes.push(tree.create_text(""));
    }
    nodes
}
