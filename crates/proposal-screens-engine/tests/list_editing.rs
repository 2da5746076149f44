use pretty_assertions::assert_eq;
use proposal_screens_engine::fields::{FieldId, ListEditor, render_item_inner};
use proposal_screens_engine::patch::{EditPayload, ListEntry, TextEdit, apply_text_edits};

const LIST: &str = r#"<ul class="points"><li><b style="color:red">Fast</b> delivery</li><li>Fair <i>price</i></li><li>Support</li></ul>"#;

#[test]
fn list_editor_output_saves_through_a_list_patch() {
    // Given a list edited item by item
    let mut editor = ListEditor::from_list_html(LIST).unwrap();
    assert!(editor.set_element_style(0, "element-0", "color:blue"));
    assert!(editor.edit_item_field(1, "element-0", "prices"));
    assert!(editor.set_item_style(2, "font-weight:bold"));

    // When the client sends the items back as a list edit
    let items = editor
        .items()
        .into_iter()
        .map(|item| ListEntry::Rich {
            text: item.text.clone(),
            html: item.has_html.then(|| render_item_inner(item)),
            styles: item.styles.clone(),
        })
        .collect();
    let page = format!("<section>{LIST}</section>");
    let out = apply_text_edits(&page, &[TextEdit::new("ul.points", EditPayload::List { items })]);

    // Then the stored list carries every change
    assert_eq!(
        out,
        r#"<section><ul class="points"><li><b style="color:blue">Fast</b> delivery</li><li>Fair <i>prices</i></li><li style="font-weight:bold">Support</li></ul></section>"#
    );
}

#[test]
fn removal_rebuilds_every_following_item() {
    // Given three items with their own inline styles
    let mut editor = ListEditor::from_list_html(LIST).unwrap();
    assert!(editor.set_element_style(1, "element-0", "color:green"));
    let last_before = editor.item_fields(2).unwrap().to_vec();

    // When the first item is removed
    editor.remove_item(0);

    // Then the old second item is now first and keeps its style map, and
    // nothing of the removed item remains
    let first = editor.item(0).unwrap();
    assert_eq!(first.text, "Fair price");
    assert_eq!(
        first.element_styles.get(&FieldId::new("element-0")).map(String::as_str),
        Some("color:green")
    );
    assert_eq!(editor.item_fields(1).unwrap(), last_before.as_slice());
    assert!(!editor.to_html().contains("Fast"));
}
