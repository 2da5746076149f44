/// A cursor for byte-by-byte markup scanning with position tracking.
///
/// All delimiters the tokenizer looks for are ASCII, so every position the
/// cursor stops at on a delimiter is also a valid `char` boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The source being scanned.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of `s`.
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Returns the current byte position.
    pub fn pos(&self) -> usize {
        self.i
    }

    /// Returns true if at end of input.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Peeks `n` bytes ahead of the current position.
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.s.as_bytes().get(self.i + n).copied()
    }

    /// Checks if the remaining input starts with the given byte pattern.
    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i.min(self.s.len())..].starts_with(pat)
    }

    /// Like [`Cursor::starts_with`] but ASCII case-insensitive.
    pub fn starts_with_ignore_case(&self, pat: &[u8]) -> bool {
        let rest = &self.s.as_bytes()[self.i.min(self.s.len())..];
        rest.len() >= pat.len() && rest[..pat.len()].eq_ignore_ascii_case(pat)
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.s.as_bytes().get(self.i).copied()?;
        self.i += 1;
        Some(b)
    }

    /// Advances by `n` bytes.
    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Advances while `pred` holds for the current byte.
    pub fn bump_while(&mut self, pred: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.i += 1;
        }
    }

    /// Finds `pat` at or after the current position, returning its absolute offset.
    pub fn find(&self, pat: &str) -> Option<usize> {
        self.s[self.i.min(self.s.len())..]
            .find(pat)
            .map(|offset| self.i + offset)
    }

    /// Returns the source text between `start` and the current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.s[start..self.i.min(self.s.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("<p>");
        assert_eq!(cur.pos(), 0);
        assert!(!cur.eof());
        assert_eq!(cur.peek(), Some(b'<'));
        assert_eq!(cur.peek_at(1), Some(b'p'));
        assert_eq!(cur.bump(), Some(b'<'));
        assert_eq!(cur.pos(), 1);
    }

    #[test]
    fn starts_with_ignore_case_matches_mixed_case() {
        let cur = Cursor::new("</SCRIPT>");
        assert!(cur.starts_with_ignore_case(b"</script"));
        assert!(!cur.starts_with(b"</script"));
    }

    #[test]
    fn starts_with_at_eof() {
        let mut cur = Cursor::new("ab");
        cur.bump_n(2);
        assert!(cur.eof());
        assert!(cur.starts_with(b""));
        assert!(!cur.starts_with(b"a"));
    }

    #[test]
    fn bump_while_stops_on_predicate() {
        let mut cur = Cursor::new("   x");
        cur.bump_while(|b| b.is_ascii_whitespace());
        assert_eq!(cur.peek(), Some(b'x'));
        assert_eq!(cur.slice_from(0), "   ");
    }

    #[test]
    fn find_reports_absolute_offset() {
        let mut cur = Cursor::new("<!-- a --> b");
        cur.bump_n(4);
        assert_eq!(cur.find("-->"), Some(7));
        assert_eq!(cur.find("zzz"), None);
    }

    #[test]
    fn bump_past_end_is_eof() {
        let mut cur = Cursor::new("hi");
        cur.bump_n(10);
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
        assert!(!cur.starts_with(b"h"));
    }
}
