use crate::document::document_impl::DocumentImpl;
use crate::node::data::comment::CommentData;
use crate::node::data::doctype::DocTypeData;
use crate::node::data::document::DocumentData;
use crate::node::data::element::ElementData;
use crate::node::data::text::TextData;
use crate::node::elements::{RAW_TEXT_HTML_ELEMENTS, VOID_HTML_ELEMENTS};
use crate::node::node_impl::Node;
use crate::node::visitor::Visitor;
use crate::node::HTML_NAMESPACE;
use umbra_shared::document::DocumentHandle;
use umbra_shared::node::NodeId;

/// Serializes a (sub)tree back to markup. The output is not the input: it is
/// the parsed tree, so implied elements and recovery results are made
/// explicit. Re-parsing the output yields the same tree.
#[derive(Debug, Default)]
pub struct DocumentWriter {
    buffer: String,
    /// Names of the HTML elements currently open, to detect raw text content
    open_elements: Vec<String>,
}

impl DocumentWriter {
    /// Serializes the subtree rooted at `node_id`
    #[must_use]
    pub fn write_from_node(node_id: NodeId, handle: &DocumentHandle<DocumentImpl>) -> String {
        let mut writer = Self::default();
        handle.get().visit_subtree(node_id, &mut writer);
        writer.buffer
    }

    fn in_raw_text(&self) -> bool {
        self.open_elements
            .last()
            .is_some_and(|name| RAW_TEXT_HTML_ELEMENTS.contains(name.as_str()))
    }
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn is_void_element(data: &ElementData) -> bool {
    data.is_namespace(HTML_NAMESPACE) && VOID_HTML_ELEMENTS.contains(data.name())
}

impl Visitor for DocumentWriter {
    fn document_enter(&mut self, _node: &Node, _data: &DocumentData) {}
    fn document_leave(&mut self, _node: &Node, _data: &DocumentData) {}

    fn doctype_enter(&mut self, _node: &Node, data: &DocTypeData) {
        self.buffer.push_str(&format!("{data}"));
    }
    fn doctype_leave(&mut self, _node: &Node, _data: &DocTypeData) {}

    fn text_enter(&mut self, _node: &Node, data: &TextData) {
        if self.in_raw_text() {
            self.buffer.push_str(data.value());
        } else {
            self.buffer.push_str(&escape_text(data.value()));
        }
    }
    fn text_leave(&mut self, _node: &Node, _data: &TextData) {}

    fn comment_enter(&mut self, _node: &Node, data: &CommentData) {
        self.buffer.push_str("<!--");
        self.buffer.push_str(data.value());
        self.buffer.push_str("-->");
    }
    fn comment_leave(&mut self, _node: &Node, _data: &CommentData) {}

    fn element_enter(&mut self, _node: &Node, data: &ElementData) {
        self.buffer.push('<');
        self.buffer.push_str(data.name());
        for (name, value) in data.attributes().iter() {
            self.buffer.push(' ');
            self.buffer.push_str(name);
            self.buffer.push_str("=\"");
            self.buffer.push_str(&escape_attribute(value));
            self.buffer.push('"');
        }
        self.buffer.push('>');

        if data.is_namespace(HTML_NAMESPACE) {
            self.open_elements.push(data.name().to_owned());
        }
    }

    fn element_leave(&mut self, _node: &Node, data: &ElementData) {
        if data.is_namespace(HTML_NAMESPACE) {
            self.open_elements.pop();
        }
        if is_void_element(data) {
            return;
        }
        self.buffer.push_str("</");
        self.buffer.push_str(data.name());
        self.buffer.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::builder::DocumentBuilder;
    use crate::node::data::element::AttrMap;

    fn element(name: &str) -> Node {
        Node::new_element(
            name,
            Some(HTML_NAMESPACE),
            AttrMap::new(),
            umbra_shared::byte_stream::Location::default(),
        )
    }

    #[test]
    fn writes_escaped_text_and_attributes() {
        let handle = DocumentBuilder::new_document(None);
        {
            let mut doc = handle.get_mut();
            let node = Node::new_element(
                "div",
                Some(HTML_NAMESPACE),
                AttrMap::from([("title", "a \"b\" & c")]),
                umbra_shared::byte_stream::Location::default(),
            );
            let div = doc.register_node_at(node, NodeId::root(), None);
            let text = Node::new_text("1 < 2 & 3 > 2", umbra_shared::byte_stream::Location::default());
            doc.register_node_at(text, div, None);
        }

        let html = DocumentWriter::write_from_node(NodeId::root(), &handle);
        assert_eq!(
            html,
            "<div title=\"a &quot;b&quot; &amp; c\">1 &lt; 2 &amp; 3 &gt; 2</div>"
        );
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let handle = DocumentBuilder::new_document(None);
        {
            let mut doc = handle.get_mut();
            let body = doc.register_node_at(element("body"), NodeId::root(), None);
            doc.register_node_at(element("br"), body, None);
            doc.register_node_at(element("img"), body, None);
        }

        let html = DocumentWriter::write_from_node(NodeId::root(), &handle);
        assert_eq!(html, "<body><br><img></body>");
    }

    #[test]
    fn raw_text_is_not_escaped() {
        let handle = DocumentBuilder::new_document(None);
        {
            let mut doc = handle.get_mut();
            let script = doc.register_node_at(element("script"), NodeId::root(), None);
            let text = Node::new_text("if (a < b) { c(); }", umbra_shared::byte_stream::Location::default());
            doc.register_node_at(text, script, None);
        }

        let html = DocumentWriter::write_from_node(NodeId::root(), &handle);
        assert_eq!(html, "<script>if (a < b) { c(); }</script>");
    }
}
