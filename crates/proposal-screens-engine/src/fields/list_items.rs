//! Per-item editing of `<ul>`/`<ol>` lists.
//!
//! Each item is decomposed on its own with the list-item break policy, and
//! carries a style override map for the inline elements inside it. Items are
//! addressed by position, so anything that shifts positions rebuilds the
//! state of every item from the first shifted one onwards.

use html_escape::encode_text;

use crate::markup::{NodeId, Tree, parse_fragment};

use super::content::element_content;
use super::decompose::{Decomposition, decompose};
use super::field::{Field, FieldId, FieldKind, ListItem, StyleOverrideMap};
use super::reconstruct::reconstruct;

const NEW_ITEM_TEXT: &str = "New item";

/// Reads the display state of one `<li>` of an anchor-free tree.
pub(crate) fn read_list_item(tree: &Tree, li: NodeId) -> ListItem {
    let has_html = tree
        .descendants(li)
        .into_iter()
        .any(|n| tree.tag(n).is_some_and(|t| t != "br"));
    let html = has_html.then(|| tree.inner_html(li));
    let element_styles = html
        .as_deref()
        .map(|html| carried_styles(&decompose(html, true)))
        .unwrap_or_default();
    ListItem {
        text: element_content(tree, li),
        html,
        has_html,
        styles: tree.attribute(li, "style").unwrap_or_default(),
        element_styles,
    }
}

fn carried_styles(decomposition: &Decomposition) -> StyleOverrideMap {
    decomposition
        .fields
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::Element { .. }) && !f.style().is_empty())
        .map(|f| (f.id.clone(), f.style().to_string()))
        .collect()
}

/// Inner markup of an item with its element styles applied.
pub fn render_item_inner(item: &ListItem) -> String {
    match item.html.as_deref() {
        Some(html) if item.has_html => {
            if item.element_styles.is_empty() {
                return html.to_string();
            }
            let decomposition = decompose(html, true);
            reconstruct(
                Some(&decomposition.marked_fragment),
                &decomposition.fields,
                Some(&item.element_styles),
            )
        }
        _ => encode_text(&item.text.replace('\n', " ")).into_owned(),
    }
}

/// Appends one `<li>` per item under `list`.
pub(crate) fn append_list_items(tree: &mut Tree, list: NodeId, items: &[ListItem]) {
    for item in items {
        let li = tree.create_element("li");
        if !item.styles.trim().is_empty() {
            tree.set_attribute(li, "style", &item.styles);
        }
        match parse_fragment(&render_item_inner(item)) {
            Ok(inner) => {
                tree.graft(li, 0, &inner);
            }
            Err(err) => {
                log::warn!("list item markup unreadable ({err}); writing its text");
                let text = tree.create_text(&item.text);
                tree.append(li, text);
            }
        }
        tree.append(list, li);
    }
}

#[derive(Debug, Clone)]
struct ItemState {
    item: ListItem,
    decomposition: Decomposition,
}

impl ItemState {
    fn new(item: ListItem) -> Self {
        let decomposition = decompose(&render_item_inner(&item), true);
        Self {
            item,
            decomposition,
        }
    }

    /// Replaces the item's content with `inner`, keeping the overrides that
    /// still name a field of the new content.
    fn set_inner_html(&mut self, inner: &str) {
        let mut item = match parse_fragment(inner) {
            Ok(tree) => {
                let root = tree.root();
                let has_html = tree
                    .descendants(root)
                    .into_iter()
                    .any(|n| tree.tag(n).is_some_and(|t| t != "br"));
                ListItem {
                    text: element_content(&tree, root),
                    html: has_html.then(|| inner.to_string()),
                    has_html,
                    ..ListItem::default()
                }
            }
            Err(_) => ListItem::plain(inner),
        };
        item.styles = std::mem::take(&mut self.item.styles);
        let decomposition = decompose(&render_item_inner(&item), true);
        item.element_styles = std::mem::take(&mut self.item.element_styles)
            .into_iter()
            .filter(|(id, _)| decomposition.field(id.as_str()).is_some())
            .collect();
        self.item = item;
        self.decomposition = decomposition;
    }
}

/// Editing state for one list.
#[derive(Debug, Clone)]
pub struct ListEditor {
    ordered: bool,
    attributes: Vec<(String, String)>,
    items: Vec<ItemState>,
}

impl ListEditor {
    /// Reads the first `<ul>` or `<ol>` in `html`.
    pub fn from_list_html(html: &str) -> Option<Self> {
        let tree = match parse_fragment(html) {
            Ok(tree) => tree,
            Err(err) => {
                log::warn!("list markup unreadable: {err}");
                return None;
            }
        };
        let list = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&n| tree.is_tag(n, "ul") || tree.is_tag(n, "ol"))?;
        let attributes = tree
            .element(list)
            .map(|el| {
                el.attrs()
                    .iter()
                    .map(|a| (a.name().to_string(), a.value()))
                    .collect()
            })
            .unwrap_or_default();
        let items = tree
            .children(list)
            .iter()
            .filter(|&&c| tree.is_tag(c, "li"))
            .map(|&li| ItemState::new(read_list_item(&tree, li)))
            .collect();
        Some(Self {
            ordered: tree.is_tag(list, "ol"),
            attributes,
            items,
        })
    }

    pub fn from_items(ordered: bool, items: Vec<ListItem>) -> Self {
        Self {
            ordered,
            attributes: Vec::new(),
            items: items.into_iter().map(ItemState::new).collect(),
        }
    }

    pub fn ordered(&self) -> bool {
        self.ordered
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> Vec<&ListItem> {
        self.items.iter().map(|s| &s.item).collect()
    }

    pub fn item(&self, index: usize) -> Option<&ListItem> {
        self.items.get(index).map(|s| &s.item)
    }

    /// Fields of one item's own decomposition.
    pub fn item_fields(&self, index: usize) -> Option<&[Field]> {
        self.items
            .get(index)
            .map(|s| s.decomposition.fields.as_slice())
    }

    /// Replaces an item's content with plain text.
    pub fn edit_item_text(&mut self, index: usize, text: &str) -> bool {
        let Some(state) = self.items.get_mut(index) else {
            return false;
        };
        state.set_inner_html(&encode_text(&text.replace('\n', " ")));
        true
    }

    pub fn edit_item_field(&mut self, index: usize, field_id: &str, content: &str) -> bool {
        self.rewrite_item_field(index, field_id, |field| field.content = content.to_string())
    }

    pub fn set_item_field_attribute(
        &mut self,
        index: usize,
        field_id: &str,
        name: &str,
        value: &str,
    ) -> bool {
        self.rewrite_item_field(index, field_id, |field| field.set_attribute(name, value))
    }

    /// Sets the `<li>`'s own style.
    pub fn set_item_style(&mut self, index: usize, style: &str) -> bool {
        let Some(state) = self.items.get_mut(index) else {
            return false;
        };
        state.item.styles = style.trim().to_string();
        true
    }

    /// Overrides the style of one inline element inside an item. An empty
    /// style drops the override and the element's own style.
    pub fn set_element_style(&mut self, index: usize, field_id: &str, style: &str) -> bool {
        let Some(state) = self.items.get(index) else {
            return false;
        };
        if state.decomposition.field(field_id).is_none() {
            log::debug!("item {index} has no field {field_id}; style ignored");
            return false;
        }
        let style = style.trim();
        if style.is_empty() {
            if let Some(state) = self.items.get_mut(index) {
                state.item.element_styles.remove(&FieldId::new(field_id));
            }
            return self.rewrite_item_field(index, field_id, |field| field.set_style(""));
        }
        if let Some(state) = self.items.get_mut(index) {
            state
                .item
                .element_styles
                .insert(FieldId::new(field_id), style.to_string());
        }
        true
    }

    /// Appends a copy of the last item, or a placeholder item.
    pub fn add_item(&mut self) -> usize {
        let item = self
            .items
            .last()
            .map(|s| s.item.clone())
            .unwrap_or_else(|| ListItem::plain(NEW_ITEM_TEXT));
        self.items.push(ItemState::new(item));
        self.items.len() - 1
    }

    pub fn remove_item(&mut self, index: usize) -> Option<ListItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.rebuild_from(index);
        Some(removed.item)
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        let state = self.items.remove(from);
        self.items.insert(to, state);
        self.rebuild_from(from.min(to));
        true
    }

    /// Markup of all items, without the list element.
    pub fn to_inner_html(&self) -> String {
        let mut tree = Tree::new();
        let root = tree.root();
        append_list_items(&mut tree, root, &self.item_values());
        tree.to_html()
    }

    pub fn to_html(&self) -> String {
        let mut tree = Tree::new();
        let list = tree.create_element(if self.ordered { "ol" } else { "ul" });
        for (name, value) in &self.attributes {
            tree.set_attribute(list, name, value);
        }
        append_list_items(&mut tree, list, &self.item_values());
        let root = tree.root();
        tree.append(root, list);
        tree.to_html()
    }

    fn item_values(&self) -> Vec<ListItem> {
        self.items.iter().map(|s| s.item.clone()).collect()
    }

    fn rebuild_from(&mut self, index: usize) {
        for state in self.items.iter_mut().skip(index) {
            *state = ItemState::new(std::mem::take(&mut state.item));
        }
    }

    fn rewrite_item_field(
        &mut self,
        index: usize,
        field_id: &str,
        edit: impl FnOnce(&mut Field),
    ) -> bool {
        let Some(state) = self.items.get_mut(index) else {
            return false;
        };
        let Some(mut field) = state.decomposition.field(field_id).cloned() else {
            log::debug!("item {index} has no field {field_id}; edit ignored");
            return false;
        };
        edit(&mut field);
        let html = reconstruct(
            Some(&state.decomposition.marked_fragment),
            &[field],
            Some(&state.item.element_styles),
        );
        state.set_inner_html(&html);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn styled_list() -> ListEditor {
        let mut editor = ListEditor::from_list_html(
            "<ul><li><b>one</b></li><li><b>two</b></li><li><b>three</b></li></ul>",
        )
        .unwrap();
        for (i, color) in ["red", "green", "blue"].iter().enumerate() {
            assert!(editor.set_element_style(i, "element-0", &format!("color:{color}")));
        }
        editor
    }

    #[test]
    fn reads_items_with_and_without_markup() {
        let editor =
            ListEditor::from_list_html(r#"<ol class="steps"><li style="x">Plain</li><li>A <em>b</em></li></ol>"#)
                .unwrap();
        assert!(editor.ordered());
        let items = editor.items();
        assert_eq!(items[0].text, "Plain");
        assert!(!items[0].has_html);
        assert_eq!(items[0].styles, "x");
        assert!(items[1].has_html);
        assert_eq!(items[1].html.as_deref(), Some("A <em>b</em>"));
        assert_eq!(
            editor.to_html(),
            r#"<ol class="steps"><li style="x">Plain</li><li>A <em>b</em></li></ol>"#
        );
    }

    #[test]
    fn element_style_override_wins_over_carried_style() {
        let mut editor =
            ListEditor::from_list_html(r#"<ul><li><b style="color:red">x</b></li></ul>"#).unwrap();
        assert!(editor.set_element_style(0, "element-0", "color:blue"));
        assert_eq!(editor.to_inner_html(), r#"<li><b style="color:blue">x</b></li>"#);
    }

    #[test]
    fn empty_element_style_clears_override_and_carried_style() {
        let mut editor =
            ListEditor::from_list_html(r#"<ul><li><b style="color:red">x</b></li></ul>"#).unwrap();
        assert!(editor.set_element_style(0, "element-0", ""));
        assert!(editor.item(0).unwrap().element_styles.is_empty());
        assert_eq!(editor.to_inner_html(), "<li><b>x</b></li>");
    }

    #[test]
    fn style_for_unknown_field_is_ignored() {
        let mut editor = ListEditor::from_list_html("<ul><li>x</li></ul>").unwrap();
        assert!(!editor.set_element_style(0, "element-7", "color:red"));
        assert!(editor.item(0).unwrap().element_styles.is_empty());
    }

    #[test]
    fn removing_an_item_shifts_later_style_maps() {
        let mut editor = styled_list();
        let third = editor.item(2).unwrap().element_styles.clone();
        let removed = editor.remove_item(1).unwrap();
        assert_eq!(
            removed.element_styles.get(&FieldId::new("element-0")).map(String::as_str),
            Some("color:green")
        );
        assert_eq!(editor.len(), 2);
        assert_eq!(editor.item(1).unwrap().element_styles, third);
        assert_eq!(
            editor.to_inner_html(),
            r#"<li><b style="color:red">one</b></li><li><b style="color:blue">three</b></li>"#
        );
    }

    #[test]
    fn move_item_carries_styles_with_the_item() {
        let mut editor = styled_list();
        assert!(editor.move_item(0, 2));
        let texts: Vec<_> = editor.items().iter().map(|i| i.text.clone()).collect();
        assert_eq!(texts, ["two", "three", "one"]);
        assert_eq!(
            editor.item(2).unwrap().element_styles.get(&FieldId::new("element-0")).map(String::as_str),
            Some("color:red")
        );
    }

    #[test]
    fn add_item_copies_last_or_uses_placeholder() {
        let mut empty = ListEditor::from_items(false, Vec::new());
        empty.add_item();
        assert_eq!(empty.item(0).unwrap().text, "New item");

        let mut editor = styled_list();
        let at = editor.add_item();
        assert_eq!(at, 3);
        assert_eq!(editor.item(3), editor.item(2));
    }

    #[test]
    fn editing_an_inline_field_rewrites_only_that_item() {
        let mut editor = ListEditor::from_list_html(
            "<ul><li>Intro <b>bold</b></li><li>Second</li></ul>",
        )
        .unwrap();
        assert!(editor.edit_item_field(0, "element-0", "BOLD"));
        assert!(editor.set_item_field_attribute(0, "element-0", "class", "hot"));
        assert!(!editor.edit_item_field(1, "element-0", "nope"));
        assert_eq!(
            editor.to_html(),
            r#"<ul><li>Intro <b class="hot">BOLD</b></li><li>Second</li></ul>"#
        );
        assert_eq!(editor.item(0).unwrap().text, "Intro BOLD");
    }

    #[test]
    fn plain_text_edit_escapes_markup() {
        let mut editor = ListEditor::from_list_html("<ul><li><b>x</b></li></ul>").unwrap();
        editor.edit_item_text(0, "a < b");
        let item = editor.item(0).unwrap();
        assert!(!item.has_html);
        assert_eq!(item.text, "a < b");
        assert_eq!(editor.to_inner_html(), "<li>a &lt; b</li>");
    }
}
