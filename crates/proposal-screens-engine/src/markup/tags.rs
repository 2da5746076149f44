//! Tag classes the tree builder needs to shape a lenient parse.
//!
//! These are structural facts about HTML, not editing policy. Editing policy
//! (which tags become fields, where breaks are meaningful) lives in
//! `fields::whitelist` and `fields::br_policy`.

/// Elements that never have children or an end tag.
pub const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is consumed verbatim up to the matching end tag.
pub const RAW_TEXT: &[&str] = &["script", "style", "textarea", "title"];

/// Start tags that implicitly close an open `<p>`.
pub const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "div",
    "dl",
    "fieldset",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

/// Elements an implied `</p>` search never crosses.
pub const PARAGRAPH_SCOPE: &[&str] = &[
    "article",
    "aside",
    "blockquote",
    "body",
    "button",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "footer",
    "form",
    "header",
    "html",
    "li",
    "main",
    "nav",
    "ol",
    "section",
    "table",
    "td",
    "th",
    "ul",
];

pub fn is_void(tag: &str) -> bool {
    VOID.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT.contains(&tag)
}

/// For a start tag, the open element names it implicitly closes and the
/// names that bound the search.
pub fn implied_close(tag: &str) -> Option<(&'static [&'static str], &'static [&'static str])> {
    match tag {
        "li" => Some((&["li"], &["ul", "ol", "menu"])),
        "option" | "optgroup" => Some((&["option"], &["select", "datalist"])),
        "td" | "th" => Some((&["td", "th"], &["tr", "table"])),
        "tr" => Some((&["tr"], &["table", "tbody", "thead", "tfoot"])),
        "dt" | "dd" => Some((&["dt", "dd"], &["dl"])),
        _ => None,
    }
}
