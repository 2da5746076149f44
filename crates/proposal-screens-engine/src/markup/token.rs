//! Lenient tokenizer for HTML fragments.
//!
//! Every token borrows its exact source text so the tree can re-emit
//! untouched markup byte for byte. Anything that does not look like markup
//! (a lone `<`, `</>`) is treated as text.

use super::MarkupError;
use super::cursor::Cursor;
use super::tags;
use super::tree::Attribute;

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    StartTag {
        name: &'a str,
        attrs: Vec<Attribute>,
        self_closing: bool,
        raw: &'a str,
    },
    EndTag {
        name: &'a str,
        raw: &'a str,
    },
    Text(&'a str),
    /// Verbatim body of a raw-text element.
    RawText(&'a str),
    Comment(&'a str),
    /// Doctype or processing instruction.
    Declaration(&'a str),
}

pub struct Tokenizer<'a> {
    cur: Cursor<'a>,
    raw_text_end: Option<String>,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            cur: Cursor::new(src),
            raw_text_end: None,
            failed: false,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, MarkupError> {
        if let Some(name) = self.raw_text_end.take() {
            let start = self.cur.pos();
            let end = self.find_end_tag(&name).unwrap_or(self.cur.s.len());
            if end > start {
                self.cur.i = end;
                return Ok(Some(Token::RawText(self.cur.slice_from(start))));
            }
        }

        if self.cur.eof() {
            return Ok(None);
        }

        if self.cur.starts_with(b"<!--") {
            return self.comment().map(Some);
        }
        if self.cur.starts_with(b"<!") || self.cur.starts_with(b"<?") {
            return self.declaration().map(Some);
        }
        if self.cur.starts_with(b"</") && self.cur.peek_at(2).is_some_and(|b| b.is_ascii_alphabetic())
        {
            return self.end_tag().map(Some);
        }
        if self.cur.peek() == Some(b'<') && self.cur.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic())
        {
            return self.start_tag().map(Some);
        }
        Ok(Some(self.text()))
    }

    /// Offset of the `</name` that closes the current raw-text element.
    fn find_end_tag(&self, name: &str) -> Option<usize> {
        let bytes = self.cur.s.as_bytes();
        let mut probe = self.cur.clone();
        while let Some(at) = probe.find("</") {
            probe.i = at;
            let after = at + 2 + name.len();
            if probe.starts_with_ignore_case(format!("</{name}").as_bytes())
                && bytes
                    .get(after)
                    .is_none_or(|&b| b == b'>' || b == b'/' || b.is_ascii_whitespace())
            {
                return Some(at);
            }
            probe.bump_n(2);
        }
        None
    }

    fn comment(&mut self) -> Result<Token<'a>, MarkupError> {
        let start = self.cur.pos();
        self.cur.bump_n(4);
        let end = self
            .cur
            .find("-->")
            .ok_or(MarkupError::UnterminatedComment { offset: start })?;
        self.cur.i = end + 3;
        Ok(Token::Comment(self.cur.slice_from(start)))
    }

    fn declaration(&mut self) -> Result<Token<'a>, MarkupError> {
        let start = self.cur.pos();
        let end = self
            .cur
            .find(">")
            .ok_or(MarkupError::UnterminatedTag { offset: start })?;
        self.cur.i = end + 1;
        Ok(Token::Declaration(self.cur.slice_from(start)))
    }

    fn end_tag(&mut self) -> Result<Token<'a>, MarkupError> {
        let start = self.cur.pos();
        self.cur.bump_n(2);
        let name_start = self.cur.pos();
        self.cur.bump_while(is_name_byte);
        let name = self.cur.slice_from(name_start);
        let end = self
            .cur
            .find(">")
            .ok_or(MarkupError::UnterminatedTag { offset: start })?;
        self.cur.i = end + 1;
        Ok(Token::EndTag {
            name,
            raw: self.cur.slice_from(start),
        })
    }

    fn start_tag(&mut self) -> Result<Token<'a>, MarkupError> {
        let start = self.cur.pos();
        let unterminated = MarkupError::UnterminatedTag { offset: start };
        self.cur.bump();
        let name_start = self.cur.pos();
        self.cur.bump_while(is_name_byte);
        let name = self.cur.slice_from(name_start);

        let mut attrs = Vec::new();
        let mut self_closing = false;
        let mut lead_start = self.cur.pos();
        loop {
            self.cur.bump_while(|b| b.is_ascii_whitespace());
            match self.cur.peek() {
                None => return Err(unterminated),
                Some(b'>') => {
                    self.cur.bump();
                    break;
                }
                Some(b'/') if self.cur.peek_at(1) == Some(b'>') => {
                    self.cur.bump_n(2);
                    self_closing = true;
                    break;
                }
                // A stray slash stays in front of the next attribute.
                Some(b'/') => {
                    self.cur.bump();
                }
                Some(_) => {
                    attrs.push(self.attribute(lead_start).ok_or(unterminated.clone())?);
                    lead_start = self.cur.pos();
                }
            }
        }

        let lower = name.to_ascii_lowercase();
        if tags::is_raw_text(&lower) && !self_closing {
            self.raw_text_end = Some(lower);
        }
        Ok(Token::StartTag {
            name,
            attrs,
            self_closing,
            raw: self.cur.slice_from(start),
        })
    }

    /// Parses one attribute whose leading whitespace began at `lead_start`.
    /// `None` means a quoted value ran to end of input.
    fn attribute(&mut self, lead_start: usize) -> Option<Attribute> {
        let start = self.cur.pos();
        // Always consume one byte so stray characters cannot stall the loop.
        self.cur.bump();
        self.cur
            .bump_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/'));
        let name = self.cur.slice_from(start);

        let before_eq = self.cur.pos();
        self.cur.bump_while(|b| b.is_ascii_whitespace());
        if self.cur.peek() != Some(b'=') {
            self.cur.i = before_eq;
            return Some(Attribute::from_source(
                name,
                None,
                self.cur.slice_from(lead_start),
            ));
        }
        self.cur.bump();
        self.cur.bump_while(|b| b.is_ascii_whitespace());

        let value = match self.cur.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.cur.bump();
                let value_start = self.cur.pos();
                let close = self.cur.find(if quote == b'"' { "\"" } else { "'" })?;
                self.cur.i = close;
                let value = self.cur.slice_from(value_start);
                self.cur.bump();
                value
            }
            _ => {
                let value_start = self.cur.pos();
                self.cur.bump_while(|b| !b.is_ascii_whitespace() && b != b'>');
                self.cur.slice_from(value_start)
            }
        };
        Some(Attribute::from_source(
            name,
            Some(value),
            self.cur.slice_from(lead_start),
        ))
    }

    fn text(&mut self) -> Token<'a> {
        let start = self.cur.pos();
        let bytes = self.cur.s.as_bytes();
        let mut end = start + 1;
        while end < bytes.len() && !(bytes[end] == b'<' && opens_markup(bytes, end)) {
            end += 1;
        }
        self.cur.i = end;
        Token::Text(self.cur.slice_from(start))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, MarkupError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

/// Whether the `<` at `at` starts a tag, comment or declaration.
fn opens_markup(bytes: &[u8], at: usize) -> bool {
    match bytes.get(at + 1) {
        Some(b) if b.is_ascii_alphabetic() => true,
        Some(b'!' | b'?') => true,
        Some(b'/') => bytes.get(at + 2).is_some_and(|b| b.is_ascii_alphabetic()),
        _ => false,
    }
}
