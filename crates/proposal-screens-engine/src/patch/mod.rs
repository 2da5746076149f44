//! Batch edits against a persisted fragment.
//!
//! Unlike [`crate::fields::reconstruct`], no marked template from a client
//! is involved: every batch is resolved against a fresh decomposition of
//! the fragment as it is stored now.

mod edits;

pub use edits::{
    Control, EditPayload, ImagePayload, ListEntry, TextEdit, TextPayload, ValuePayload,
};

use serde::{Deserialize, Serialize};

use crate::fields::anchors::{Anchors, Target, TextRun};
use crate::fields::br_policy::{BrPolicy, BreakRole};
use crate::fields::content::expand;
use crate::fields::decompose::{analyze, read_select};
use crate::fields::list_items::append_list_items;
use crate::fields::reconstruct::{apply_select, rewrite_run, sync_attribute};
use crate::fields::{DecomposeOptions, FieldId, ListItem};
use crate::markup::{NodeId, Selector, Tree, parse_fragment};

/// Attribute some editors put on elements by hand to address them.
pub const EDIT_ID_ATTR: &str = "data-edit-id";

/// What a client sends when saving a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PatchRequest {
    /// Field-level edits applied to the stored fragment.
    Edits { edits: Vec<TextEdit> },
    /// The whole fragment, stored verbatim.
    Replace { html: String },
}

/// Applies a save request to the stored fragment.
pub fn apply_patch(current: &str, request: &PatchRequest) -> String {
    match request {
        PatchRequest::Edits { edits } => apply_text_edits(current, edits),
        PatchRequest::Replace { html } => {
            log::debug!("replacing whole fragment ({} bytes)", html.len());
            html.clone()
        }
    }
}

/// Applies `edits` in order. Edits whose address matches nothing are
/// skipped; a fragment that cannot be parsed is returned unchanged.
pub fn apply_text_edits(html: &str, edits: &[TextEdit]) -> String {
    if edits.is_empty() {
        return html.to_string();
    }
    let mut tree = match parse_fragment(html) {
        Ok(tree) => tree,
        Err(err) => {
            log::warn!("fragment unreadable ({err}); {} edits skipped", edits.len());
            return html.to_string();
        }
    };
    Anchors::take(&mut tree);
    let (_, anchors) = analyze(&tree, DecomposeOptions::default());

    // Every address is resolved against the stored fragment before any
    // edit runs.
    let planned: Vec<(&TextEdit, Vec<PatchTarget>)> = edits
        .iter()
        .map(|edit| (edit, resolve(&tree, &anchors, edit)))
        .collect();

    for (edit, targets) in planned {
        if targets.is_empty() {
            log::debug!("no match for edit {:?} / {:?}", edit.selector, edit.data_id);
            continue;
        }
        for target in targets {
            apply_edit(&mut tree, target, edit);
        }
    }

    BrPolicy::prune_noise_breaks(&mut tree);
    tree.to_html()
}

#[derive(Debug, Clone)]
enum PatchTarget {
    Node(NodeId),
    Run(TextRun),
}

fn resolve(tree: &Tree, anchors: &Anchors, edit: &TextEdit) -> Vec<PatchTarget> {
    if let Some(id) = edit.data_id.as_deref().filter(|id| !id.is_empty()) {
        match anchors.get(&FieldId::new(id)) {
            Some(Target::Element(node)) => return vec![PatchTarget::Node(*node)],
            Some(Target::Run(run)) => return vec![PatchTarget::Run(run.clone())],
            None => {}
        }
        let literal: Vec<PatchTarget> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|&n| tree.attribute(n, EDIT_ID_ATTR).as_deref() == Some(id))
            .map(PatchTarget::Node)
            .collect();
        if !literal.is_empty() {
            return literal;
        }
    }
    if edit.selector.trim().is_empty() {
        return Vec::new();
    }
    match Selector::parse(&edit.selector) {
        Some(selector) => selector
            .select(tree, tree.root())
            .into_iter()
            .map(PatchTarget::Node)
            .collect(),
        None => {
            log::warn!("unsupported selector {:?}; edit skipped", edit.selector);
            Vec::new()
        }
    }
}

fn apply_edit(tree: &mut Tree, target: PatchTarget, edit: &TextEdit) {
    match (target, &edit.payload) {
        (PatchTarget::Node(node), EditPayload::Text(text)) => apply_text(tree, node, text),
        (PatchTarget::Node(node), EditPayload::Html { html }) => set_inner_html(tree, node, html),
        (PatchTarget::Node(node), EditPayload::Value(value)) => apply_value(tree, node, value),
        (PatchTarget::Node(node), EditPayload::List { items }) => {
            let items: Vec<ListItem> = items.iter().map(ListEntry::to_item).collect();
            tree.clear_children(node);
            append_list_items(tree, node, &items);
        }
        (PatchTarget::Node(node), EditPayload::Image(image)) => apply_image(tree, node, image),
        (PatchTarget::Run(run), EditPayload::Text(text)) => match markup_of(text) {
            Some(html) => replace_run_with_html(tree, &run, html),
            None => match text.text.as_deref() {
                Some(content) => {
                    rewrite_run(tree, &run, content);
                }
                None => log::warn!("text edit for {:?} carries neither text nor markup", edit.data_id),
            },
        },
        (PatchTarget::Run(run), EditPayload::Html { html }) => {
            replace_run_with_html(tree, &run, html)
        }
        (_, EditPayload::Unknown) => {
            log::debug!("edit of unknown kind for {:?} ignored", edit.selector);
        }
        (PatchTarget::Run(_), _) => {
            log::warn!("text field {:?} cannot take this edit", edit.data_id);
        }
    }
}

/// The markup of a text edit, when it should be used instead of its text.
fn markup_of(payload: &TextPayload) -> Option<&str> {
    payload
        .html
        .as_deref()
        .filter(|html| payload.has_children || html.contains('<'))
}

fn apply_text(tree: &mut Tree, node: NodeId, payload: &TextPayload) {
    if let Some(html) = markup_of(payload) {
        set_inner_html(tree, node, html);
    } else if let Some(text) = payload.text.as_deref() {
        set_text_keeping_markup(tree, node, text);
    } else {
        log::warn!("text edit carries neither text nor markup");
    }

    let carried = match tree.tag(node) {
        Some("a") => Some(("href", &payload.href)),
        Some("abbr") => Some(("title", &payload.title)),
        Some("time") => Some(("datetime", &payload.datetime)),
        Some("bdo") => Some(("dir", &payload.dir)),
        _ => None,
    };
    if let Some((name, Some(value))) = carried {
        tree.set_attribute(node, name, value);
    }
    set_if_given(tree, node, "style", payload.styles.as_deref());
    set_if_given(tree, node, "class", payload.class_name.as_deref());
}

/// Plain text replaces the content of an element without child elements.
/// Otherwise only the first direct text node changes, so inline markup
/// around it survives.
fn set_text_keeping_markup(tree: &mut Tree, node: NodeId, text: &str) {
    let has_elements = tree.children(node).iter().any(|&c| tree.element(c).is_some());
    if !has_elements {
        let breaks = BrPolicy::role_under(tree, node) == BreakRole::Text;
        tree.clear_children(node);
        for child in expand(tree, text, breaks, "", "") {
            tree.append(node, child);
        }
        return;
    }

    let first_text = tree
        .children(node)
        .iter()
        .copied()
        .find(|&c| tree.raw_text(c).is_some_and(|raw| !raw.is_empty()));
    if let Some(first) = first_text {
        tree.set_text(first, &text.replace('\n', " "));
    }
    if tree.text_content(node).trim().is_empty() {
        let lead = tree.create_text(&text.replace('\n', " "));
        tree.insert(node, 0, lead);
    }
}

fn set_inner_html(tree: &mut Tree, node: NodeId, html: &str) {
    match parse_fragment(html) {
        Ok(inner) => {
            tree.clear_children(node);
            tree.graft(node, 0, &inner);
        }
        Err(err) => log::warn!("replacement markup unreadable ({err}); edit skipped"),
    }
}

fn replace_run_with_html(tree: &mut Tree, run: &TextRun, html: &str) {
    let Some(index) = run
        .nodes
        .first()
        .filter(|&&first| tree.parent(first) == Some(run.parent))
        .and_then(|&first| tree.index_in_parent(first))
    else {
        log::warn!("text run no longer attached; edit skipped");
        return;
    };
    let inner = match parse_fragment(html) {
        Ok(inner) => inner,
        Err(err) => {
            log::warn!("replacement markup unreadable ({err}); edit skipped");
            return;
        }
    };
    for &old in &run.nodes {
        tree.detach(old);
    }
    tree.graft(run.parent, index, &inner);
}

fn apply_value(tree: &mut Tree, node: NodeId, payload: &ValuePayload) {
    let control = payload.control.or_else(|| match tree.tag(node)? {
        "input" => Some(Control::Input),
        "textarea" => Some(Control::Textarea),
        "select" => Some(Control::Select),
        _ => None,
    });
    let (Some(control), Some(value)) = (control, payload.value.as_deref()) else {
        log::debug!("value edit without a control or a value ignored");
        return;
    };
    match control {
        Control::Input => {
            tree.set_attribute(node, "value", value);
        }
        Control::Textarea => {
            tree.clear_children(node);
            let body = tree.create_raw_text(value);
            tree.append(node, body);
        }
        Control::Select => match &payload.options {
            Some(options) => apply_select(tree, node, options, value),
            None => {
                let (current, _) = read_select(tree, node);
                apply_select(tree, node, &current, value);
            }
        },
    }
}

fn apply_image(tree: &mut Tree, node: NodeId, payload: &ImagePayload) {
    if let Some(src) = payload.src.as_deref() {
        tree.set_attribute(node, "src", src);
    }
    if let Some(alt) = payload.alt.as_deref() {
        tree.set_attribute(node, "alt", alt);
    }
    for (name, value) in [
        ("title", &payload.title),
        ("width", &payload.width),
        ("height", &payload.height),
    ] {
        if let Some(value) = value.as_deref() {
            sync_attribute(tree, node, name, value);
        }
    }
    set_if_given(tree, node, "style", payload.styles.as_deref());
    set_if_given(tree, node, "class", payload.class_name.as_deref());
}

fn set_if_given(tree: &mut Tree, node: NodeId, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        tree.set_attribute(node, name, value);
    }
}
