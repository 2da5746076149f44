use pretty_assertions::assert_eq;
use proposal_screens_engine::fields::{
    FieldKind, decompose, reconstruct, remove_invalid_breaks, strip_anchors,
};
use rstest::rstest;

#[rstest]
#[case::break_inside_paragraph("<div><p>hi<br>there</p></div>")]
#[case::break_inside_block("<div>hi<br><p>there</p></div>")]
#[case::nested_sections(
    "<section class=\"hero\">\n  <h1 id=\"t\">Title &amp; more</h1>\n  <p>Body <b>bold</b> text</p>\n</section>"
)]
#[case::comments_and_quotes("<!-- note --><div data-x='1'>a<span>b</span>c</div>")]
#[case::table_cells("<table><tr><td>1</td><td>2<br>3</td></tr></table>")]
#[case::list_breaks("<ul><li>One</li><li>Two<br></li></ul>")]
#[case::controls(
    "<form><label>Name <input name=\"n\" value=\"x\"></label><select name=\"s\"><option value=\"a\" selected>A</option></select><img src=\"a.png\" alt=\"A\"></form>"
)]
#[case::top_level_text("Loose text <em>with</em> emphasis")]
#[case::scripts_untouched("<div>a</div><script>if (a < b) { x(); }</script>")]
fn unchanged_fields_reproduce_the_cleaned_fragment(#[case] fragment: &str) {
    // Given a decomposed fragment
    let decomposition = decompose(fragment, false);

    // When it is reconstructed without edits
    let out = reconstruct(
        Some(&decomposition.marked_fragment),
        &decomposition.fields,
        None,
    );

    // Then only structural breaks are gone
    assert_eq!(out, remove_invalid_breaks(fragment));
}

#[test]
fn stripping_the_marked_fragment_restores_the_input() {
    let fragment = "<div class=\"a\">x <b>y</b> z</div>\n<p>tail</p>";
    let decomposition = decompose(fragment, false);
    assert_ne!(decomposition.marked_fragment, fragment);
    assert_eq!(strip_anchors(&decomposition.marked_fragment), fragment);
}

#[test]
fn reconstructed_output_decomposes_to_the_edited_fields() {
    // Given the field merge example with one text field edited
    let fragment = "<div>Hello <b>world</b>! Bye</div>";
    let decomposition = decompose(fragment, false);
    let mut fields = decomposition.fields.clone();
    fields[2].set_content("! Later\nfriend");

    // When reconstructed and decomposed again
    let out = reconstruct(Some(&decomposition.marked_fragment), &fields, None);
    let again = decompose(&out, false);

    // Then the same fields come back; the block container turned the
    // newline into a space
    let contents: Vec<&str> = again.fields.iter().map(|f| f.content.as_str()).collect();
    assert_eq!(contents, vec!["Hello", "world", "! Later friend"]);
    assert_eq!(out, "<div>Hello <b>world</b>! Later friend</div>");
}

#[rstest]
#[case::break_between_words("<div>hi<br>there</div>", "hi there")]
#[case::break_at_top_level("one<br>two", "one two")]
#[case::break_after_space("<div>hi <br>there</div>", "hi there")]
fn structural_break_keeps_its_space_through_a_round_trip(
    #[case] fragment: &str,
    #[case] content: &str,
) {
    // Given a structural break read as a space
    let decomposition = decompose(fragment, false);
    assert_eq!(decomposition.fields[0].content, content);

    // When reconstructed without edits and decomposed again
    let out = reconstruct(
        Some(&decomposition.marked_fragment),
        &decomposition.fields,
        None,
    );
    let again = decompose(&out, false);

    // Then the field reads the same
    assert!(!out.contains("<br"));
    assert_eq!(again.fields[0].content, content);
}

#[test]
fn field_merge_yields_three_fields_in_order() {
    let decomposition = decompose("<div>Hello <b>world</b>! Bye</div>", false);
    let summary: Vec<(&str, &str)> = decomposition
        .fields
        .iter()
        .map(|f| (f.id.as_str(), f.content.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![("text-0", "Hello"), ("element-0", "world"), ("text-1", "! Bye")]
    );
    assert!(matches!(
        &decomposition.fields[1].kind,
        FieldKind::Element { tag, .. } if tag == "b"
    ));
}

#[test]
fn meaningful_break_is_merged_into_one_text_field() {
    let decomposition = decompose("<div><p>hi<br>there</p></div>", false);
    assert_eq!(decomposition.fields.len(), 1);
    assert_eq!(decomposition.fields[0].content, "hi\nthere");
}

#[test]
fn missing_anchor_leaves_the_fragment_alone() {
    let fragment = "<p>one</p><div>two</div>";
    let decomposition = decompose(fragment, false);
    let mut stray = decomposition.fields[0].clone();
    stray.id = "element-42".into();
    stray.set_content("changed");

    let out = reconstruct(Some(&decomposition.marked_fragment), &[stray], None);
    assert_eq!(out, fragment);
}
