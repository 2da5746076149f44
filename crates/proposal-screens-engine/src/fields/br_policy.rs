use crate::markup::{NodeId, Tree, parse_fragment};

use super::whitelist::NodeWhitelist;

/// What a `<br>` means where it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakRole {
    /// Inside a text-bearing element: a forced line break, `\n` in content.
    Text,
    /// Directly inside a block container or the fragment root: discarded.
    Noise,
    /// Anywhere else: kept as markup but not part of any text field.
    Untouched,
}

pub struct BrPolicy;

impl BrPolicy {
    /// Classifies a break by its parent's tag. `None` is the fragment root.
    pub fn classify(parent_tag: Option<&str>, top_level_of_list_item: bool) -> BreakRole {
        match parent_tag {
            _ if top_level_of_list_item => BreakRole::Noise,
            None => BreakRole::Noise,
            Some(tag) if NodeWhitelist::is_text_bearing(tag) => BreakRole::Text,
            Some(tag) if NodeWhitelist::is_block_container(tag) => BreakRole::Noise,
            Some(_) => BreakRole::Untouched,
        }
    }

    pub fn is_meaningful_break(parent_tag: Option<&str>, top_level_of_list_item: bool) -> bool {
        Self::classify(parent_tag, top_level_of_list_item) == BreakRole::Text
    }

    /// Role of the break `node` in `tree`. `list_item` marks a tree parsed
    /// from a list item's inner content.
    pub fn role_in(tree: &Tree, node: NodeId, list_item: bool) -> BreakRole {
        let parent = tree.parent(node).unwrap_or(tree.root());
        let parent_tag = tree.tag(parent);
        Self::classify(parent_tag, list_item && parent == tree.root())
    }

    /// Role a break would have if inserted under `parent`.
    pub fn role_under(tree: &Tree, parent: NodeId) -> BreakRole {
        Self::classify(tree.tag(parent), false)
    }

    /// Removes every noise break in the tree, returning how many went. A
    /// break that is the only separation between two words becomes a space,
    /// matching how it reads as field content.
    pub fn prune_noise_breaks(tree: &mut Tree) -> usize {
        let noise: Vec<NodeId> = tree
            .elements_named(tree.root(), "br")
            .into_iter()
            .filter(|&br| Self::role_in(tree, br, false) == BreakRole::Noise)
            .collect();
        for &br in &noise {
            let (Some(parent), Some(index)) = (tree.parent(br), tree.index_in_parent(br)) else {
                continue;
            };
            let joins_words = separates_words(tree, parent, index);
            tree.detach(br);
            if joins_words {
                let space = tree.create_text(" ");
                tree.insert(parent, index, space);
            }
        }
        noise.len()
    }
}

/// Whether the child at `index` sits between two text nodes that would run
/// together without it.
fn separates_words(tree: &Tree, parent: NodeId, index: usize) -> bool {
    let children = tree.children(parent);
    let (Some(&before), Some(&after)) = (
        index.checked_sub(1).and_then(|i| children.get(i)),
        children.get(index + 1),
    ) else {
        return false;
    };
    let (Some(before), Some(after)) = (tree.text(before), tree.text(after)) else {
        return false;
    };
    !before.trim().is_empty()
        && !after.trim().is_empty()
        && !before.ends_with(char::is_whitespace)
        && !after.starts_with(char::is_whitespace)
}

/// Removes `<br>` elements that sit directly inside block containers or at
/// the top level. Input that cannot be parsed is returned unchanged.
pub fn remove_invalid_breaks(html: &str) -> String {
    if html.trim().is_empty() {
        return html.to_string();
    }
    match parse_fragment(html) {
        Ok(mut tree) => {
            let removed = BrPolicy::prune_noise_breaks(&mut tree);
            if removed == 0 {
                return html.to_string();
            }
            log::debug!("removed {removed} structural line breaks");
            tree.to_html()
        }
        Err(err) => {
            log::warn!("line break cleanup skipped: {err}");
            html.to_string()
        }
    }
}
