use std::collections::{HashMap, HashSet};

use crate::markup::{MarkupError, NodeId, Tree, parse_fragment};

use super::anchors::{Anchors, FIELD_ID_ATTR, TEXT_RUNS_ATTR, Target, TextRun};
use super::br_policy::{BrPolicy, BreakRole};
use super::content::{edge_whitespace, element_content, expand, run_content};
use super::decompose::{read_image, read_select};
use super::field::{Field, FieldId, FieldKind, ListItem, SelectOption, StyleOverrideMap};
use super::list_items::{append_list_items, read_list_item};
use super::whitelist::NodeWhitelist;

/// Rebuilds a fragment from edited fields.
///
/// With a marked template only the anchored nodes of the given fields are
/// touched; everything else is written back as it was. Without one, the
/// fields are rendered flat in order. Anchors are stripped and structural
/// breaks removed from the result.
pub fn reconstruct(
    marked: Option<&str>,
    fields: &[Field],
    style_overrides: Option<&StyleOverrideMap>,
) -> String {
    match marked {
        Some(marked) => reconstruct_marked(marked, fields, style_overrides),
        None => render_fields(fields, style_overrides),
    }
}

pub fn reconstruct_marked(
    marked: &str,
    fields: &[Field],
    style_overrides: Option<&StyleOverrideMap>,
) -> String {
    match rewrite(marked, fields, style_overrides) {
        Ok((mut tree, _, _)) => {
            BrPolicy::prune_noise_breaks(&mut tree);
            tree.to_html()
        }
        Err(err) => {
            log::warn!("marked template unreadable ({err}); returning opaque content");
            fields
                .iter()
                .find(|f| f.id.as_str() == "text-0" && f.is_text())
                .map(|f| f.content.clone())
                .unwrap_or_else(|| marked.to_string())
        }
    }
}

/// Applies edits but keeps the anchors, so the returned template can take
/// further edits.
pub fn apply_to_marked(
    marked: &str,
    fields: &[Field],
    style_overrides: Option<&StyleOverrideMap>,
) -> String {
    apply_to_marked_reporting(marked, fields, style_overrides).0
}

/// Like [`apply_to_marked`], also returning the ids of the fields that
/// found a target in the template.
pub(crate) fn apply_to_marked_reporting(
    marked: &str,
    fields: &[Field],
    style_overrides: Option<&StyleOverrideMap>,
) -> (String, Vec<FieldId>) {
    match rewrite(marked, fields, style_overrides) {
        Ok((mut tree, anchors, applied)) => {
            anchors.write(&mut tree);
            (tree.to_html(), applied)
        }
        Err(err) => {
            log::warn!("marked template unreadable ({err}); edits dropped");
            (marked.to_string(), Vec::new())
        }
    }
}

fn rewrite(
    marked: &str,
    fields: &[Field],
    style_overrides: Option<&StyleOverrideMap>,
) -> Result<(Tree, Anchors, Vec<FieldId>), MarkupError> {
    let mut tree = parse_fragment(marked)?;
    let mut anchors = Anchors::take(&mut tree);
    let mut applied = Vec::new();
    for (field, target) in resolve(&tree, &anchors, fields) {
        let moved = apply(&mut tree, field, &target, style_overrides);
        if let (Some(nodes), Some(Target::Run(run))) = (moved, anchors.get_mut(&field.id)) {
            run.nodes = nodes;
        }
        applied.push(field.id.clone());
    }
    Ok((tree, anchors, applied))
}

/// Pairs each field with the node it edits. Every target is resolved
/// against the untouched tree before anything is changed.
fn resolve<'f>(tree: &Tree, anchors: &Anchors, fields: &'f [Field]) -> Vec<(&'f Field, Target)> {
    let mut plan = Vec::new();
    let mut seen = HashSet::new();
    let mut claimed: HashSet<NodeId> = HashSet::new();
    let mut ordinals: HashMap<&str, usize> = HashMap::new();

    for field in fields {
        if !seen.insert(&field.id) {
            log::debug!("repeated edit for {} ignored", field.id);
            continue;
        }
        let ordinal = match &field.kind {
            FieldKind::Element { tag, .. } => {
                let n = ordinals.entry(tag.as_str()).or_insert(0);
                *n += 1;
                *n - 1
            }
            _ => 0,
        };

        let target = match (anchors.get(&field.id), &field.kind) {
            (Some(Target::Run(run)), FieldKind::Text) => Some(Target::Run(run.clone())),
            (Some(Target::Element(node)), kind) if !matches!(kind, FieldKind::Text) => {
                if tree.tag(*node) == field.tag_name() {
                    Some(Target::Element(*node))
                } else if let FieldKind::Element { tag, .. } = kind {
                    let fallback = tree.elements_named(tree.root(), tag).get(ordinal).copied();
                    if fallback.is_none() {
                        log::warn!("no <{tag}> #{ordinal} for field {}; edit dropped", field.id);
                    }
                    fallback.map(Target::Element)
                } else {
                    log::warn!("field {} does not match its anchor; edit dropped", field.id);
                    None
                }
            }
            (Some(_), _) => {
                log::warn!("field {} does not match its anchor; edit dropped", field.id);
                None
            }
            (None, _) if field.is_text() && field.content.is_empty() => None,
            (None, _) => {
                log::warn!("no anchor for field {}; edit dropped", field.id);
                None
            }
        };

        match target {
            Some(Target::Element(node)) if !claimed.insert(node) => {
                log::warn!("node for field {} already edited; edit dropped", field.id);
            }
            Some(target) => plan.push((field, target)),
            None => {}
        }
    }
    plan
}

/// Applies one field. Returns the new nodes of a rewritten text run.
fn apply(
    tree: &mut Tree,
    field: &Field,
    target: &Target,
    style_overrides: Option<&StyleOverrideMap>,
) -> Option<Vec<NodeId>> {
    match (&field.kind, target) {
        (FieldKind::Text, Target::Run(run)) => {
            if run_content(tree, &run.nodes, false) == field.content {
                return None;
            }
            Some(rewrite_run(tree, run, &field.content))
        }
        (FieldKind::Element { attributes, .. }, Target::Element(node)) => {
            let node = *node;
            if element_content(tree, node) != field.content {
                replace_content(tree, node, &field.content);
            }
            for (name, value) in attributes {
                if name == "style" || name == FIELD_ID_ATTR || name == TEXT_RUNS_ATTR {
                    continue;
                }
                sync_attribute(tree, node, name, value);
            }
            apply_style(tree, node, resolve_style(field, style_overrides));
            None
        }
        (
            FieldKind::Image {
                src,
                alt,
                title,
                width,
                height,
                class_name,
                ..
            },
            Target::Element(node),
        ) => {
            let node = *node;
            if read_image(tree, node) != field.kind || style_overrides.is_some() {
                if !src.is_empty() {
                    tree.set_attribute(node, "src", src);
                }
                sync_attribute(tree, node, "alt", alt);
                sync_attribute(tree, node, "title", title);
                sync_attribute(tree, node, "width", width);
                sync_attribute(tree, node, "height", height);
                if !class_name.is_empty() {
                    tree.set_attribute(node, "class", class_name);
                }
                let style = resolve_style(field, style_overrides);
                if !style.is_empty() {
                    tree.set_attribute(node, "style", style);
                }
            }
            None
        }
        (FieldKind::Input { tag, value, .. }, Target::Element(node)) => {
            let node = *node;
            if tag == "textarea" {
                if tree.raw_text_content(node) != *value {
                    tree.clear_children(node);
                    let body = tree.create_raw_text(value);
                    tree.append(node, body);
                }
            } else {
                tree.set_attribute(node, "value", value);
            }
            None
        }
        (FieldKind::Select { options, value }, Target::Element(node)) => {
            apply_select(tree, *node, options, value);
            None
        }
        (FieldKind::List { items, .. }, Target::Element(node)) => {
            apply_list(tree, *node, items);
            None
        }
        _ => {
            log::warn!("field {} cannot edit its target", field.id);
            None
        }
    }
}

pub(crate) fn rewrite_run(tree: &mut Tree, run: &TextRun, content: &str) -> Vec<NodeId> {
    let (Some(&first), Some(&last)) = (run.nodes.first(), run.nodes.last()) else {
        return Vec::new();
    };
    let Some(index) = tree
        .index_in_parent(first)
        .filter(|_| tree.parent(first) == Some(run.parent))
    else {
        log::warn!("text run no longer attached; edit dropped");
        return run.nodes.clone();
    };
    let (lead, _) = edge_whitespace(tree, first);
    let (_, trail) = edge_whitespace(tree, last);
    let breaks = BrPolicy::role_under(tree, run.parent) != BreakRole::Noise;
    let nodes = expand(tree, content, breaks, &lead, &trail);
    for &old in &run.nodes {
        tree.detach(old);
    }
    for (offset, &node) in nodes.iter().enumerate() {
        tree.insert(run.parent, index + offset, node);
    }
    nodes
}

pub(crate) fn replace_content(tree: &mut Tree, node: NodeId, content: &str) {
    tree.clear_children(node);
    for child in expand(tree, content, true, "", "") {
        tree.append(node, child);
    }
}

/// Sets a non-empty value; an empty value removes an attribute that has one.
pub(crate) fn sync_attribute(tree: &mut Tree, node: NodeId, name: &str, value: &str) {
    if !value.is_empty() {
        tree.set_attribute(node, name, value);
    } else if tree.attribute(node, name).is_some_and(|v| !v.is_empty()) {
        tree.remove_attribute(node, name);
    }
}

/// Override first, then the field's own style.
fn resolve_style<'a>(field: &'a Field, style_overrides: Option<&'a StyleOverrideMap>) -> &'a str {
    style_overrides
        .and_then(|o| o.get(&field.id))
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(field.style())
}

fn apply_style(tree: &mut Tree, node: NodeId, style: &str) {
    if style.trim().is_empty() {
        if tree.attribute(node, "style").is_some_and(|s| !s.trim().is_empty()) {
            tree.remove_attribute(node, "style");
        }
    } else {
        tree.set_attribute(node, "style", style);
    }
}

pub(crate) fn apply_select(tree: &mut Tree, node: NodeId, options: &[SelectOption], value: &str) {
    let (current, current_value) = read_select(tree, node);
    if current == options && current_value == value {
        return;
    }
    let chosen = options
        .iter()
        .position(|o| o.value == value)
        .or_else(|| options.iter().position(|o| o.selected));

    let same_set = current.len() == options.len()
        && current
            .iter()
            .zip(options)
            .all(|(a, b)| a.value == b.value && a.text == b.text);
    if same_set {
        for (i, option) in tree.elements_named(node, "option").into_iter().enumerate() {
            if Some(i) == chosen {
                tree.set_flag_attribute(option, "selected");
            } else {
                tree.remove_attribute(option, "selected");
            }
        }
        return;
    }

    tree.clear_children(node);
    for (i, opt) in options.iter().enumerate() {
        let option = tree.create_element("option");
        tree.set_attribute(option, "value", &opt.value);
        if Some(i) == chosen {
            tree.set_flag_attribute(option, "selected");
        }
        let text = tree.create_text(&opt.text);
        tree.append(option, text);
        tree.append(node, option);
    }
}

fn apply_list(tree: &mut Tree, node: NodeId, items: &[ListItem]) {
    let current: Vec<ListItem> = tree
        .children(node)
        .iter()
        .filter(|&&c| tree.is_tag(c, "li"))
        .map(|&li| read_list_item(tree, li))
        .collect();
    if current == items {
        return;
    }
    tree.clear_children(node);
    append_list_items(tree, node, items);
}

/// Degraded rendering without a template: each field becomes markup of its
/// own, in order. Structure between fields is lost.
pub fn render_fields(fields: &[Field], style_overrides: Option<&StyleOverrideMap>) -> String {
    let mut tree = Tree::new();
    let root = tree.root();
    for field in fields {
        match &field.kind {
            FieldKind::Text => {
                for node in expand(&mut tree, &field.content, false, "", "") {
                    tree.append(root, node);
                }
            }
            FieldKind::Element {
                tag, attributes, ..
            } => {
                let el = tree.create_element(tag);
                for (name, value) in attributes {
                    if name != "style" && !value.trim().is_empty() {
                        tree.set_attribute(el, name, value);
                    }
                }
                apply_style(&mut tree, el, resolve_style(field, style_overrides));
                let breaks = NodeWhitelist::is_text_bearing(tag);
                for node in expand(&mut tree, &field.content, breaks, "", "") {
                    tree.append(el, node);
                }
                tree.append(root, el);
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
                let img = tree.create_element("img");
                tree.set_attribute(img, "src", src);
                tree.set_attribute(img, "alt", alt);
                for (name, value) in [
                    ("title", title),
                    ("width", width),
                    ("height", height),
                    ("class", class_name),
                ] {
                    if !value.is_empty() {
                        tree.set_attribute(img, name, value);
                    }
                }
                apply_style(&mut tree, img, resolve_style(field, style_overrides));
                tree.append(root, img);
            }
            FieldKind::Input {
                tag,
                input_type,
                value,
            } => {
                let el = tree.create_element(tag);
                if tag == "textarea" {
                    let body = tree.create_raw_text(value);
                    tree.append(el, body);
                } else {
                    if !input_type.is_empty() {
                        tree.set_attribute(el, "type", input_type);
                    }
                    tree.set_attribute(el, "value", value);
                }
                tree.append(root, el);
            }
            FieldKind::Select { options, value } => {
                let el = tree.create_element("select");
                apply_select(&mut tree, el, options, value);
                tree.append(root, el);
            }
            FieldKind::List { ordered, items } => {
                let el = tree.create_element(if *ordered { "ol" } else { "ul" });
                append_list_items(&mut tree, el, items);
                tree.append(root, el);
            }
        }
    }
    BrPolicy::prune_noise_breaks(&mut tree);
    tree.to_html()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::decompose::decompose;
    use pretty_assertions::assert_eq;

    fn edited(fields: &[Field], id: &str, content: &str) -> Vec<Field> {
        fields
            .iter()
            .map(|f| {
                let mut f = f.clone();
                if f.id.as_str() == id {
                    f.content = content.to_string();
                }
                f
            })
            .collect()
    }

    #[test]
    fn unedited_fields_reproduce_the_fragment() {
        let html = r#"<section class="hero">
  <h1 id="t">Title &amp; more</h1>
  <div>Intro <em>text</em> here</div>
</section>"#;
        let d = decompose(html, false);
        assert_eq!(reconstruct(Some(&d.marked_fragment), &d.fields, None), html);
    }

    #[test]
    fn text_run_edit_keeps_surrounding_whitespace() {
        let d = decompose("<div>\n  Old text\n</div>", false);
        let fields = edited(&d.fields, "text-0", "New text");
        assert_eq!(
            reconstruct(Some(&d.marked_fragment), &fields, None),
            "<div>\n  New text\n</div>"
        );
    }

    #[test]
    fn newlines_in_block_container_runs_become_spaces() {
        let d = decompose("<li>one</li>", false);
        let fields = edited(&d.fields, "text-0", "one\ntwo");
        assert_eq!(
            reconstruct(Some(&d.marked_fragment), &fields, None),
            "<li>one two</li>"
        );
    }

    #[test]
    fn element_edit_encodes_text_and_updates_attributes() {
        let d = decompose(r#"<a href="/old" title="t">Go</a>"#, false);
        let mut field = d.fields[0].clone();
        field.content = "Fish & <chips>".to_string();
        field.set_attribute("href", "/new");
        field.set_attribute("title", "");
        assert_eq!(
            reconstruct(Some(&d.marked_fragment), &[field], None),
            r#"<a href="/new">Fish &amp; &lt;chips&gt;</a>"#
        );
    }

    #[test]
    fn override_beats_carried_style_and_empty_style_removes() {
        let d = decompose(r#"<b style="color:red">x</b><i style="color:green">y</i>"#, false);
        let mut overrides = StyleOverrideMap::new();
        overrides.insert(d.fields[0].id.clone(), "color:blue".to_string());
        let mut fields = d.fields.clone();
        fields[1].set_style("");
        assert_eq!(
            reconstruct(Some(&d.marked_fragment), &fields, Some(&overrides)),
            r#"<b style="color:blue">x</b><i>y</i>"#
        );
    }

    #[test]
    fn positional_fallback_applies_when_anchor_tag_differs() {
        let marked = r#"<p data-edit-field-id="element-0">a</p><b>z</b>"#;
        let field = Field::element("element-0", "b", "changed");
        assert_eq!(
            reconstruct(Some(marked), &[field], None),
            "<p>a</p><b>changed</b>"
        );
    }

    #[test]
    fn unknown_ids_leave_the_fragment_alone() {
        let d = decompose("<p>keep</p>", false);
        let stray = Field::element("element-9", "p", "lost");
        assert_eq!(
            reconstruct(Some(&d.marked_fragment), &[stray], None),
            "<p>keep</p>"
        );
    }

    #[test]
    fn unreadable_template_returns_opaque_text() {
        let fields = vec![Field::text("text-0", "<p>raw")];
        assert_eq!(reconstruct(Some("<p>raw<!--"), &fields, None), "<p>raw");
    }

    #[test]
    fn select_edit_toggles_selected_option() {
        let html = r#"<select><option value="a" selected>A</option><option value="b">B</option></select>"#;
        let d = decompose(html, false);
        let mut field = d.fields[0].clone();
        field.set_content("b");
        assert_eq!(
            reconstruct(Some(&d.marked_fragment), &[field], None),
            r#"<select><option value="a">A</option><option value="b" selected>B</option></select>"#
        );
    }

    #[test]
    fn textarea_and_input_values_are_written() {
        let d = decompose(r#"<input value="1"><textarea>old</textarea>"#, false);
        let fields = vec![
            {
                let mut f = d.fields[0].clone();
                f.set_content("2");
                f
            },
            {
                let mut f = d.fields[1].clone();
                f.set_content("a < b");
                f
            },
        ];
        assert_eq!(
            reconstruct(Some(&d.marked_fragment), &fields, None),
            r#"<input value="2"><textarea>a &lt; b</textarea>"#
        );
    }

    #[test]
    fn fallback_renders_fields_flat() {
        let fields = vec![
            Field::text("text-0", "Hello\nthere"),
            Field::element("element-0", "p", "a\nb")
                .with_attribute("class", "lead")
                .with_style("color:red"),
            Field::element("element-1", "span", "x").with_attribute("title", ""),
        ];
        assert_eq!(
            reconstruct(None, &fields, None),
            r#"Hello there<p class="lead" style="color:red">a<br>b</p><span>x</span>"#
        );
    }
}
