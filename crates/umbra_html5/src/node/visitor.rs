use crate::node::data::comment::CommentData;
use crate::node::data::doctype::DocTypeData;
use crate::node::data::document::DocumentData;
use crate::node::data::element::ElementData;
use crate::node::data::text::TextData;
use crate::node::node_impl::Node;

/// Called for every node while walking a (sub)tree in document order.
/// Element callbacks are invoked on entry and exit so implementors can emit
/// balanced output.
pub trait Visitor {
    fn document_enter(&mut self, node: &Node, data: &DocumentData);
    fn document_leave(&mut self, node: &Node, data: &DocumentData);

    fn doctype_enter(&mut self, node: &Node, data: &DocTypeData);
    fn doctype_leave(&mut self, node: &Node, data: &DocTypeData);

    fn text_enter(&mut self, node: &Node, data: &TextData);
    fn text_leave(&mut self, node: &Node, data: &TextData);

    fn comment_enter(&mut self, node: &Node, data: &CommentData);
    fn comment_leave(&mut self, node: &Node, data: &CommentData);

    fn element_enter(&mut self, node: &Node, data: &ElementData);
    fn element_leave(&mut self, node: &Node, data: &ElementData);
}
