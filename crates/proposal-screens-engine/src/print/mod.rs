//! Composition of several screens into one printable document.
//!
//! Screens may declare their slide size through the `--slide-w` and
//! `--slide-h` custom properties; the first screen declaring both sets the
//! page size for the whole document.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const PX_PER_IN: f64 = 96.0;
const PX_PER_CM: f64 = 37.795275591;
const PX_PER_MM: f64 = 3.7795275591;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssUnit {
    Px,
    Cm,
    Mm,
    In,
}

impl CssUnit {
    fn parse(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "px" => Some(Self::Px),
            "cm" => Some(Self::Cm),
            "mm" => Some(Self::Mm),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Cm => "cm",
            Self::Mm => "mm",
            Self::In => "in",
        }
    }
}

/// An absolute CSS length as written, e.g. `8.5in`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CssLength {
    number: String,
    unit: CssUnit,
}

impl CssLength {
    pub fn px(value: u32) -> Self {
        Self {
            number: value.to_string(),
            unit: CssUnit::Px,
        }
    }

    /// Parses `<number><unit>` with optional surrounding whitespace.
    pub fn parse(src: &str) -> Option<Self> {
        let src = src.trim();
        let split = src.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        let (number, unit) = src.split_at(split);
        number.parse::<f64>().ok()?;
        Some(Self {
            number: number.to_string(),
            unit: CssUnit::parse(unit)?,
        })
    }

    pub fn unit(&self) -> CssUnit {
        self.unit
    }

    pub fn to_pixels(&self) -> f64 {
        let value: f64 = self.number.parse().unwrap_or(0.0);
        match self.unit {
            CssUnit::Px => value,
            CssUnit::In => value * PX_PER_IN,
            CssUnit::Cm => value * PX_PER_CM,
            CssUnit::Mm => value * PX_PER_MM,
        }
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.unit.as_str())
    }
}

impl From<CssLength> for String {
    fn from(length: CssLength) -> Self {
        length.to_string()
    }
}

impl TryFrom<String> for CssLength {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not an absolute CSS length: {value:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: CssLength,
    pub height: CssLength,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: CssLength::px(1440),
            height: CssLength::px(1024),
        }
    }
}

impl PageSize {
    /// Viewport in whole pixels.
    pub fn viewport(&self) -> (u32, u32) {
        (
            self.width.to_pixels().round() as u32,
            self.height.to_pixels().round() as u32,
        )
    }
}

fn slide_dimension(axis: char) -> &'static Regex {
    static WIDTH: OnceLock<Regex> = OnceLock::new();
    static HEIGHT: OnceLock<Regex> = OnceLock::new();
    let cell = if axis == 'w' { &WIDTH } else { &HEIGHT };
    cell.get_or_init(|| {
        Regex::new(&format!(r"(?i)--slide-{axis}\s*:\s*([0-9.]+)(px|cm|mm|in)"))
            .expect("Invalid slide size regex")
    })
}

fn declared_length(fragment: &str, axis: char) -> Option<CssLength> {
    let caps = slide_dimension(axis).captures(fragment)?;
    CssLength::parse(&format!("{}{}", &caps[1], &caps[2]))
}

/// Page size declared by the first fragment that declares both a width and
/// a height.
pub fn detect_page_size<S: AsRef<str>>(fragments: &[S]) -> Option<PageSize> {
    fragments.iter().find_map(|fragment| {
        let fragment = fragment.as_ref();
        Some(PageSize {
            width: declared_length(fragment, 'w')?,
            height: declared_length(fragment, 'h')?,
        })
    })
}

/// A composed document ready for a headless renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintDocument {
    pub html: String,
    pub page_size: PageSize,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

pub fn compose_print_document<S: AsRef<str>>(fragments: &[S]) -> PrintDocument {
    compose_print_document_with(fragments, PageSize::default())
}

/// Like [`compose_print_document`], with the page size used when no
/// fragment declares one.
pub fn compose_print_document_with<S: AsRef<str>>(
    fragments: &[S],
    fallback: PageSize,
) -> PrintDocument {
    let page_size = detect_page_size(fragments).unwrap_or(fallback);
    let (viewport_width, viewport_height) = page_size.viewport();
    log::debug!(
        "composing {} screens at {} x {}",
        fragments.len(),
        page_size.width,
        page_size.height
    );

    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(&global_style(&page_size));
    html.push_str("</head>\n<body>\n");
    for fragment in fragments {
        html.push_str("<div class=\"screen-page\">");
        html.push_str(fragment.as_ref());
        html.push_str("</div>\n");
    }
    html.push_str("</body>\n</html>\n");

    PrintDocument {
        html,
        page_size,
        viewport_width,
        viewport_height,
    }
}

fn global_style(page: &PageSize) -> String {
    format!(
        "<style>
body {{ margin: 0; padding: 0; font-family: Arial, sans-serif; }}
.screen-page {{ page-break-after: always; margin: 0; }}
.screen-page:last-child {{ page-break-after: auto; }}
:root {{ --slide-w: {w}; --slide-h: {h}; }}
@page {{ size: {w} {h}; margin: 0; }}
</style>
",
        w = page.width,
        h = page.height
    )
}
