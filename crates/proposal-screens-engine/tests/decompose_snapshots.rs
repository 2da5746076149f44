use std::fmt::Write;

use proposal_screens_engine::fields::{DecomposeOptions, Decomposition, decompose_with};

#[test]
fn fixture_hero_section() {
    assert_fixture("hero_section", DecomposeOptions::default());
}

#[test]
fn fixture_price_table() {
    assert_fixture("price_table", DecomposeOptions::default());
}

#[test]
fn fixture_list_item() {
    assert_fixture("list_item", DecomposeOptions::list_item());
}

fn assert_fixture(name: &str, options: DecomposeOptions) {
    let html = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.html",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();

    let decomposition = decompose_with(&html, options);
    assert_eq!(
        proposal_screens_engine::reconstruct(
            Some(&decomposition.marked_fragment),
            &decomposition.fields,
            None
        ),
        proposal_screens_engine::remove_invalid_breaks(&html)
    );

    insta::assert_snapshot!(name, format_decomposition(&decomposition));
}

/// One line per field, then the marked fragment.
fn format_decomposition(decomposition: &Decomposition) -> String {
    let mut out = String::new();
    for field in &decomposition.fields {
        match field.tag_name() {
            Some(tag) => writeln!(out, "{} <{tag}> {:?}", field.id, field.content).unwrap(),
            None => writeln!(out, "{} {:?}", field.id, field.content).unwrap(),
        }
    }
    out.push_str("marked:\n");
    out.push_str(decomposition.marked_fragment.trim_end());
    out
}
