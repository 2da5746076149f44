use super::tree::{EndTag, NodeData, NodeId, Tree};

impl Tree {
    /// Serializes the whole fragment.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Root => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(el.written_name());
                for attr in el.attrs() {
                    attr.write_to(out);
                }
                out.push_str(el.tail());
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                match &el.end {
                    EndTag::Source(raw) => out.push_str(raw),
                    EndTag::Implied => {}
                    EndTag::Synthesized if el.is_void() => {}
                    EndTag::Synthesized => {
                        out.push_str("</");
                        out.push_str(el.written_name());
                        out.push('>');
                    }
                }
            }
            NodeData::Text(raw)
            | NodeData::RawText(raw)
            | NodeData::Comment(raw)
            | NodeData::Raw(raw) => out.push_str(raw),
        }
    }
}
