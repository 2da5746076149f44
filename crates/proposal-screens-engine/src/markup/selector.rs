//! The small selector dialect edits are addressed with: `tag`, `#id`,
//! `.a.b`, `tag.a`, each optionally followed by `:nth-of-type(n)`.

use std::fmt;

use super::tree::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    nth_of_type: Option<usize>,
}

impl Selector {
    /// Parses a compound selector. Combinators and unsupported pseudo
    /// classes yield `None`.
    pub fn parse(src: &str) -> Option<Self> {
        let src = src.trim();
        let (base, nth_of_type) = match src.find(":nth-of-type(") {
            Some(at) => {
                let arg = src[at + ":nth-of-type(".len()..].strip_suffix(')')?;
                let n: usize = arg.trim().parse().ok()?;
                if n == 0 {
                    return None;
                }
                (&src[..at], Some(n))
            }
            None => (src, None),
        };
        if base.is_empty()
            || base
                .bytes()
                .any(|b| b.is_ascii_whitespace() || matches!(b, b'>' | b'+' | b'~' | b':' | b'['))
        {
            return None;
        }

        let mut selector = Selector {
            nth_of_type,
            ..Default::default()
        };
        let mut rest = base;
        let tag_end = rest.find(['#', '.']).unwrap_or(rest.len());
        if tag_end > 0 {
            selector.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];
        while !rest.is_empty() {
            let marker = rest.as_bytes()[0];
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let part = &body[..end];
            if part.is_empty() {
                return None;
            }
            match marker {
                b'#' => selector.id = Some(part.to_string()),
                _ => selector.classes.push(part.to_string()),
            }
            rest = &body[end..];
        }
        Some(selector)
    }

    /// Builds the selector an editor would use to address `node`: `#id` when
    /// present, else the class list, else the tag; `:nth-of-type` is added
    /// when the node has siblings of the same tag.
    pub fn for_node(tree: &Tree, node: NodeId) -> Option<Self> {
        let tag = tree.tag(node)?.to_string();
        let mut selector = Selector::default();
        let id = tree.attribute(node, "id").filter(|id| !id.trim().is_empty());
        let classes = class_list(tree, node);
        if let Some(id) = id {
            selector.id = Some(id.trim().to_string());
        } else if !classes.is_empty() {
            selector.classes = classes;
        } else {
            selector.tag = Some(tag.clone());
        }

        if let Some(parent) = tree.parent(node) {
            let same_tag: Vec<NodeId> = tree
                .children(parent)
                .iter()
                .copied()
                .filter(|&c| tree.is_tag(c, &tag))
                .collect();
            if same_tag.len() > 1 {
                selector.nth_of_type = same_tag.iter().position(|&c| c == node).map(|p| p + 1);
            }
        }
        Some(selector)
    }

    pub fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let Some(tag) = tree.tag(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if self
            .id
            .as_ref()
            .is_some_and(|id| tree.attribute(node, "id").as_deref() != Some(id.as_str()))
        {
            return false;
        }
        if !self.classes.is_empty() {
            let have = class_list(tree, node);
            if !self.classes.iter().all(|c| have.contains(c)) {
                return false;
            }
        }
        match self.nth_of_type {
            Some(n) => nth_of_type(tree, node) == n,
            None => true,
        }
    }

    /// Every element below `scope` matching this selector, in document order.
    pub fn select(&self, tree: &Tree, scope: NodeId) -> Vec<NodeId> {
        tree.descendants(scope)
            .into_iter()
            .filter(|&n| self.matches(tree, n))
            .collect()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        if let Some(n) = self.nth_of_type {
            write!(f, ":nth-of-type({n})")?;
        }
        Ok(())
    }
}

fn class_list(tree: &Tree, node: NodeId) -> Vec<String> {
    tree.attribute(node, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// 1-based position among siblings with the same tag.
fn nth_of_type(tree: &Tree, node: NodeId) -> usize {
    let (Some(parent), Some(tag)) = (tree.parent(node), tree.tag(node)) else {
        return 1;
    };
    tree.children(parent)
        .iter()
        .take_while(|&&c| c != node)
        .filter(|&&c| tree.is_tag(c, tag))
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;
    use rstest::rstest;

    #[rstest]
    #[case("p", "p")]
    #[case("#hero", "#hero")]
    #[case(".a.b", ".a.b")]
    #[case("SPAN.note", "span.note")]
    #[case("li:nth-of-type(2)", "li:nth-of-type(2)")]
    fn parse_and_display(#[case] src: &str, #[case] shown: &str) {
        assert_eq!(Selector::parse(src).unwrap().to_string(), shown);
    }

    #[rstest]
    #[case("div p")]
    #[case("a > b")]
    #[case("p:first-child")]
    #[case("li:nth-of-type(0)")]
    #[case("")]
    #[case("p..x")]
    fn unsupported_selectors_are_rejected(#[case] src: &str) {
        assert_eq!(Selector::parse(src), None);
    }

    #[test]
    fn nth_of_type_counts_same_tag_siblings_only() {
        let tree = parse_fragment("<ul><li>a</li><p>x</p><li>b</li></ul>").unwrap();
        let hits = Selector::parse("li:nth-of-type(2)").unwrap().select(&tree, tree.root());
        assert_eq!(hits.len(), 1);
        assert_eq!(tree.text_content(hits[0]), "b");
    }

    #[test]
    fn class_selector_requires_every_class() {
        let tree = parse_fragment(r#"<p class="a b">1</p><p class="a">2</p>"#).unwrap();
        let hits = Selector::parse(".a.b").unwrap().select(&tree, tree.root());
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn generated_selectors_find_their_node() {
        let tree = parse_fragment(
            r#"<div id="top"><p>one</p><p class="lead big">two</p><span>three</span></div>"#,
        )
        .unwrap();
        for node in tree.descendants(tree.root()) {
            let Some(selector) = Selector::for_node(&tree, node) else {
                continue;
            };
            assert!(
                selector.select(&tree, tree.root()).contains(&node),
                "{selector} should select its own node"
            );
        }
        let div = tree.children(tree.root())[0];
        let second_p = tree.children(div)[1];
        assert_eq!(
            Selector::for_node(&tree, second_p).unwrap().to_string(),
            ".lead.big:nth-of-type(2)"
        );
        assert_eq!(Selector::for_node(&tree, div).unwrap().to_string(), "#top");
    }
}
