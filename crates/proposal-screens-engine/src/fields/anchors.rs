//! Anchors tie field ids to nodes of a marked fragment.
//!
//! Element-like fields carry `data-edit-field-id`. Text runs cannot carry
//! attributes, so their parent records them as `id:start+len` entries in
//! `data-edit-text-runs`; runs directly under the fragment root are recorded
//! in a leading `<!--edit-text-runs ...-->` comment. Child indices count the
//! parent's children with that comment removed.

use std::collections::BTreeMap;

use crate::markup::{NodeData, NodeId, Tree};

use super::field::FieldId;

pub const FIELD_ID_ATTR: &str = "data-edit-field-id";
pub const TEXT_RUNS_ATTR: &str = "data-edit-text-runs";
const ROOT_RUNS_OPEN: &str = "<!--edit-text-runs ";
const ROOT_RUNS_CLOSE: &str = "-->";

/// Consecutive siblings that make up one text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub parent: NodeId,
    pub nodes: Vec<NodeId>,
}

/// Where a field lives in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Element(NodeId),
    Run(TextRun),
}

/// Field id to node mapping for one tree, in document order of recording.
#[derive(Debug, Default, Clone)]
pub struct Anchors {
    entries: Vec<(FieldId, Target)>,
}

impl Anchors {
    pub fn push(&mut self, id: FieldId, target: Target) {
        self.entries.push((id, target));
    }

    pub fn get(&self, id: &FieldId) -> Option<&Target> {
        self.entries.iter().find(|(i, _)| i == id).map(|(_, t)| t)
    }

    pub fn get_mut(&mut self, id: &FieldId) -> Option<&mut Target> {
        self.entries.iter_mut().find(|(i, _)| i == id).map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &Target)> {
        self.entries.iter().map(|(i, t)| (i, t))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every anchor from `tree` and returns what they pointed at.
    /// Records that no longer fit the tree are dropped with a warning.
    pub fn take(tree: &mut Tree) -> Self {
        let root = tree.root();
        let mut records: Vec<(NodeId, String)> = Vec::new();

        if let Some(&first) = tree.children(root).first() {
            let body = match tree.data(first) {
                NodeData::Comment(raw) => raw
                    .strip_prefix(ROOT_RUNS_OPEN)
                    .and_then(|b| b.strip_suffix(ROOT_RUNS_CLOSE))
                    .map(|b| b.trim().to_string()),
                _ => None,
            };
            if let Some(body) = body {
                records.push((root, body));
                tree.detach(first);
            }
        }

        let mut anchors = Anchors::default();
        for node in tree.descendants(root) {
            if tree.element(node).is_none() {
                continue;
            }
            if let Some(id) = tree.attribute(node, FIELD_ID_ATTR) {
                tree.remove_attribute(node, FIELD_ID_ATTR);
                anchors.push(FieldId::new(id), Target::Element(node));
            }
            if let Some(runs) = tree.attribute(node, TEXT_RUNS_ATTR) {
                tree.remove_attribute(node, TEXT_RUNS_ATTR);
                records.push((node, runs));
            }
        }

        for (parent, record) in records {
            for entry in record.split(';').filter(|e| !e.trim().is_empty()) {
                let Some((id, start, len)) = parse_run_record(entry) else {
                    log::warn!("ignoring malformed text run record {entry:?}");
                    continue;
                };
                let nodes = start
                    .checked_add(len)
                    .and_then(|end| tree.children(parent).get(start..end));
                let Some(nodes) = nodes else {
                    log::warn!("text run {id} points past the children of its parent");
                    continue;
                };
                anchors.push(
                    id,
                    Target::Run(TextRun {
                        parent,
                        nodes: nodes.to_vec(),
                    }),
                );
            }
        }
        anchors
    }

    /// Writes the anchors into `tree` using the live positions of their
    /// nodes. Runs whose nodes were detached are skipped.
    pub fn write(&self, tree: &mut Tree) {
        let mut records: BTreeMap<NodeId, Vec<String>> = BTreeMap::new();
        for (id, target) in &self.entries {
            match target {
                Target::Element(node) => {
                    tree.set_attribute(*node, FIELD_ID_ATTR, id.as_str());
                }
                Target::Run(run) => {
                    let Some(&first) = run.nodes.first() else {
                        continue;
                    };
                    if tree.parent(first) != Some(run.parent) {
                        continue;
                    }
                    let Some(start) = tree.index_in_parent(first) else {
                        continue;
                    };
                    records
                        .entry(run.parent)
                        .or_default()
                        .push(format!("{id}:{start}+{}", run.nodes.len()));
                }
            }
        }

        let root = tree.root();
        for (parent, entries) in records {
            let joined = entries.join(";");
            if parent == root {
                let comment = tree.push(NodeData::Comment(format!(
                    "{ROOT_RUNS_OPEN}{joined}{ROOT_RUNS_CLOSE}"
                )));
                tree.insert(root, 0, comment);
            } else {
                tree.set_attribute(parent, TEXT_RUNS_ATTR, &joined);
            }
        }
    }
}

fn parse_run_record(entry: &str) -> Option<(FieldId, usize, usize)> {
    let (id, span) = entry.trim().rsplit_once(':')?;
    let (start, len) = span.split_once('+')?;
    Some((FieldId::new(id), start.parse().ok()?, len.parse().ok()?))
}

/// Removes all anchors from a marked fragment. Unparseable input is
/// returned unchanged.
pub fn strip_anchors(marked: &str) -> String {
    match crate::markup::parse_fragment(marked) {
        Ok(mut tree) => {
            let anchors = Anchors::take(&mut tree);
            if anchors.is_empty() {
                return marked.to_string();
            }
            tree.to_html()
        }
        Err(err) => {
            log::warn!("cannot strip anchors: {err}");
            marked.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;
    use pretty_assertions::assert_eq;

    #[test]
    fn take_reads_and_removes_both_encodings() {
        let marked = concat!(
            "<!--edit-text-runs text-0:0+1-->Intro",
            r#"<div data-edit-text-runs="text-1:1+3"><b data-edit-field-id="element-0">x</b>a<br>b</div>"#
        );
        let mut tree = parse_fragment(marked).unwrap();
        let anchors = Anchors::take(&mut tree);
        assert_eq!(tree.to_html(), "Intro<div><b>x</b>a<br>b</div>");

        let Some(Target::Run(root_run)) = anchors.get(&FieldId::new("text-0")) else {
            panic!("root run missing");
        };
        assert_eq!(tree.text(root_run.nodes[0]).as_deref(), Some("Intro"));

        let Some(Target::Run(div_run)) = anchors.get(&FieldId::new("text-1")) else {
            panic!("div run missing");
        };
        assert_eq!(div_run.nodes.len(), 3);
        assert!(matches!(
            anchors.get(&FieldId::new("element-0")),
            Some(Target::Element(_))
        ));
    }

    #[test]
    fn write_then_take_round_trips() {
        let mut tree = parse_fragment("Hi<p>x</p>").unwrap();
        let root = tree.root();
        let text = tree.children(root)[0];
        let p = tree.children(root)[1];
        let mut anchors = Anchors::default();
        anchors.push(
            FieldId::new("text-0"),
            Target::Run(TextRun {
                parent: root,
                nodes: vec![text],
            }),
        );
        anchors.push(FieldId::new("element-0"), Target::Element(p));
        anchors.write(&mut tree);
        let marked = tree.to_html();
        assert_eq!(
            marked,
            r#"<!--edit-text-runs text-0:0+1-->Hi<p data-edit-field-id="element-0">x</p>"#
        );
        assert_eq!(strip_anchors(&marked), "Hi<p>x</p>");
    }

    #[test]
    fn out_of_range_records_are_dropped() {
        let mut tree = parse_fragment(r#"<td data-edit-text-runs="text-0:5+1;bogus">a</td>"#).unwrap();
        let anchors = Anchors::take(&mut tree);
        assert!(anchors.is_empty());
        assert_eq!(tree.to_html(), "<td>a</td>");
    }
}
