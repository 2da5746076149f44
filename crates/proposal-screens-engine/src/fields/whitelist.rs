//! Static tag policy for field extraction.
//!
//! Each set owns one question the decomposer and the break policy ask about
//! a tag name. Keep the sets here rather than inlining tag lists elsewhere.

pub struct NodeWhitelist;

impl NodeWhitelist {
    /// Tags that become one element field each. Their children are not
    /// searched for further fields.
    pub const ELEMENT_FIELD_TAGS: &'static [&'static str] = &[
        "span", "strong", "em", "b", "i", "mark", "code", "kbd", "abbr", "small", "sup", "sub",
        "time", "bdi", "bdo", "a", "p", "h1", "h2", "h3", "h4", "h5", "h6",
    ];

    /// Containers whose direct `<br>` children are part of the text.
    pub const TEXT_BEARING_TAGS: &'static [&'static str] = &[
        "p", "span", "strong", "em", "b", "i", "mark", "code", "kbd", "abbr", "small", "sup", "sub",
        "time", "bdi", "bdo", "a", "h1", "h2", "h3", "h4", "h5", "h6", "td", "th", "label",
    ];

    /// Containers that must never keep a direct `<br>` child.
    pub const BLOCK_CONTAINER_TAGS: &'static [&'static str] = &[
        "div", "li", "ul", "ol", "section", "article", "header", "footer", "nav", "main", "dl",
        "dt", "dd", "table", "tr", "tbody", "thead", "tfoot", "form", "body", "html",
    ];

    /// Subtrees that never contain editable text.
    pub const OPAQUE_TAGS: &'static [&'static str] =
        &["head", "script", "style", "template", "noscript", "title"];

    pub fn is_element_field(tag: &str) -> bool {
        Self::ELEMENT_FIELD_TAGS.contains(&tag)
    }

    pub fn is_text_bearing(tag: &str) -> bool {
        Self::TEXT_BEARING_TAGS.contains(&tag)
    }

    pub fn is_block_container(tag: &str) -> bool {
        Self::BLOCK_CONTAINER_TAGS.contains(&tag) && !Self::is_text_bearing(tag)
    }

    pub fn is_opaque(tag: &str) -> bool {
        Self::OPAQUE_TAGS.contains(&tag)
    }
}
