use super::MarkupError;
use super::tags;
use super::token::{Token, Tokenizer};
use super::tree::{Element, EndTag, NodeData, NodeId, Tree};

/// Maximum number of simultaneously open elements.
pub const MAX_DEPTH: usize = 512;

/// Builds a tree from tokens, closing elements the way browsers imply.
pub struct TreeBuilder {
    tree: Tree,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        let tree = Tree::new();
        let root = tree.root();
        Self {
            tree,
            open: vec![root],
        }
    }

    pub fn build(mut self, src: &str) -> Result<Tree, MarkupError> {
        for token in Tokenizer::new(src) {
            self.push_token(token?)?;
        }
        Ok(self.tree)
    }

    fn current(&self) -> NodeId {
        self.open[self.open.len() - 1]
    }

    fn append(&mut self, data: NodeData) -> NodeId {
        let id = self.tree.push(data);
        let parent = self.current();
        self.tree.append(parent, id);
        id
    }

    fn push_token(&mut self, token: Token<'_>) -> Result<(), MarkupError> {
        match token {
            Token::Text(text) => {
                self.append(NodeData::Text(text.to_string()));
            }
            Token::RawText(text) => {
                self.append(NodeData::RawText(text.to_string()));
            }
            Token::Comment(text) => {
                self.append(NodeData::Comment(text.to_string()));
            }
            Token::Declaration(text) => {
                self.append(NodeData::Raw(text.to_string()));
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
                raw,
            } => {
                let tag = name.to_ascii_lowercase();
                self.close_implied(&tag);
                let id = self.append(NodeData::Element(Element::from_source(
                    name,
                    attrs,
                    self_closing,
                    raw,
                )));
                if !self_closing && !tags::is_void(&tag) {
                    self.open.push(id);
                    if self.open.len() > MAX_DEPTH + 1 {
                        return Err(MarkupError::TooDeep { limit: MAX_DEPTH });
                    }
                }
            }
            Token::EndTag { name, raw } => {
                let tag = name.to_ascii_lowercase();
                let matching = self
                    .open
                    .iter()
                    .rposition(|&n| self.tree.is_tag(n, &tag))
                    .filter(|&at| at > 0);
                match matching {
                    Some(at) => {
                        if let Some(el) = self.tree.element_mut(self.open[at]) {
                            el.end = EndTag::Source(raw.to_string());
                        }
                        self.open.truncate(at);
                    }
                    None => {
                        log::debug!("stray end tag {raw} kept verbatim");
                        self.append(NodeData::Raw(raw.to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Pops elements a start tag `tag` closes implicitly.
    fn close_implied(&mut self, tag: &str) {
        if tags::CLOSES_PARAGRAPH.contains(&tag) {
            self.close_within("p", |t| tags::PARAGRAPH_SCOPE.contains(&t));
        }
        if let Some((closes, bounds)) = tags::implied_close(tag) {
            for &close in closes {
                if self.close_within(close, |t| bounds.contains(&t)) {
                    break;
                }
            }
        }
    }

    fn close_within(&mut self, target: &str, is_bound: impl Fn(&str) -> bool) -> bool {
        for at in (1..self.open.len()).rev() {
            let Some(tag) = self.tree.tag(self.open[at]) else {
                continue;
            };
            if tag == target {
                self.open.truncate(at);
                return true;
            }
            if is_bound(tag) {
                return false;
            }
        }
        false
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
