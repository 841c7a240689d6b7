use umbra_html5::document::builder::DocumentBuilder;
use umbra_html5::document::document_impl::{DocumentImpl, QuirksMode, TreeIterator};
use umbra_html5::node::data::element::AttrMap;
use umbra_html5::node::node_impl::Node;
use umbra_html5::node::{HTML_NAMESPACE, SVG_NAMESPACE};
use umbra_html5::parser::{Html5Parser, ParseProgress};
use umbra_html5::parse_str;
use umbra_html5::writer::DocumentWriter;
use umbra_shared::byte_stream::{ByteStream, Location, Stream};
use umbra_shared::document::DocumentHandle;
use umbra_shared::node::NodeId;

/// Returns the id of the first element with the given tag name, in document order
fn find_element(handle: &DocumentHandle<DocumentImpl>, name: &str) -> Option<NodeId> {
    let doc = handle.get();
    TreeIterator::new(&doc, NodeId::root()).find(|&node_id| {
        doc.node_by_id(node_id)
            .and_then(Node::get_element_data)
            .is_some_and(|data| data.name() == name)
    })
}

/// Tag names of the element children of the given node
fn child_names(handle: &DocumentHandle<DocumentImpl>, node_id: NodeId) -> Vec<String> {
    let doc = handle.get();
    let node = doc.node_by_id(node_id).unwrap();
    node.children()
        .iter()
        .filter_map(|&child_id| {
            doc.node_by_id(child_id)
                .and_then(Node::get_element_data)
                .map(|data| data.name().to_string())
        })
        .collect()
}

#[test]
fn implied_elements_are_synthesized() {
    let handle = parse_str("hello");

    let html = find_element(&handle, "html").expect("html");
    assert_eq!(child_names(&handle, html), vec!["head", "body"]);

    let body = find_element(&handle, "body").unwrap();
    let doc = handle.get();
    let text_id = doc.node_by_id(body).unwrap().children()[0];
    assert_eq!(doc.node_by_id(text_id).unwrap().get_text_data().unwrap().value(), "hello");
}

#[test]
fn paragraph_closed_by_block_element() {
    let handle = parse_str("<p>text<div>block</div>");

    let body = find_element(&handle, "body").unwrap();
    assert_eq!(child_names(&handle, body), vec!["p", "div"]);

    // the text stays inside the implicitly closed p
    let p = find_element(&handle, "p").unwrap();
    let doc = handle.get();
    let text_id = doc.node_by_id(p).unwrap().children()[0];
    assert_eq!(doc.node_by_id(text_id).unwrap().get_text_data().unwrap().value(), "text");
}

#[test]
fn table_closes_paragraph_outside_quirks_mode() {
    let handle = parse_str("<!DOCTYPE html><p>x<table></table>");
    assert_eq!(handle.get().quirks_mode(), QuirksMode::NoQuirks);

    let body = find_element(&handle, "body").unwrap();
    assert_eq!(child_names(&handle, body), vec!["p", "table"]);
}

#[test]
fn table_nests_in_paragraph_in_quirks_mode() {
    // A doctype-less document is in quirks mode, where a table start tag
    // does not close an open p
    let handle = parse_str("<p>x<table></table>");
    assert_eq!(handle.get().quirks_mode(), QuirksMode::Quirks);

    let body = find_element(&handle, "body").unwrap();
    assert_eq!(child_names(&handle, body), vec!["p"]);

    let p = find_element(&handle, "p").unwrap();
    assert_eq!(child_names(&handle, p), vec!["table"]);
}

#[test]
fn stray_end_tags_are_ignored() {
    let mut stream = ByteStream::new(None);
    stream.read_from_str("<div></span>content</div></b>");
    stream.close();

    let handle = DocumentBuilder::new_document(None);
    let errors = Html5Parser::parse_document(&mut stream, handle.clone(), None).unwrap();
    assert!(!errors.is_empty());

    let body = find_element(&handle, "body").unwrap();
    assert_eq!(child_names(&handle, body), vec!["div"]);
}

#[test]
fn bare_cell_gets_row_and_section() {
    let handle = parse_str("<table><td>x</td></table>");

    let table = find_element(&handle, "table").unwrap();
    assert_eq!(child_names(&handle, table), vec!["tbody"]);

    let tbody = find_element(&handle, "tbody").unwrap();
    assert_eq!(child_names(&handle, tbody), vec!["tr"]);

    let tr = find_element(&handle, "tr").unwrap();
    assert_eq!(child_names(&handle, tr), vec!["td"]);
}

#[test]
fn misplaced_content_is_foster_parented() {
    let handle = parse_str("<table><div>oops</div><tr><td>a</td></tr></table>");

    // The div is relocated in front of the table
    let body = find_element(&handle, "body").unwrap();
    assert_eq!(child_names(&handle, body), vec!["div", "table"]);

    let tr = find_element(&handle, "tr").unwrap();
    assert_eq!(child_names(&handle, tr), vec!["td"]);
}

#[test]
fn svg_content_keeps_namespace_and_case() {
    let handle = parse_str("<svg><linearGradient gradientUnits=\"userSpaceOnUse\"></linearGradient></svg>");

    let gradient_id = find_element(&handle, "linearGradient").expect("camelCase tag restored");
    let doc = handle.get();
    let gradient = doc.node_by_id(gradient_id).unwrap();
    let data = gradient.get_element_data().unwrap();

    assert!(data.is_namespace(SVG_NAMESPACE));
    assert_eq!(data.attributes().get("gradientUnits"), Some("userSpaceOnUse"));
}

#[test]
fn adjacent_text_is_coalesced() {
    // The entity forces a tokenizer flush; the tree still ends up with one text node
    let handle = parse_str("<p>a&amp;b</p>");

    let p = find_element(&handle, "p").unwrap();
    let doc = handle.get();
    let p_node = doc.node_by_id(p).unwrap();
    assert_eq!(p_node.children().len(), 1);

    let text = doc.node_by_id(p_node.children()[0]).unwrap();
    assert_eq!(text.get_text_data().unwrap().value(), "a&b");
}

#[test]
fn adoption_agency_restructures_misnested_formatting() {
    let handle = parse_str("<b>1<i>2</b>3</i>");

    let body = find_element(&handle, "body").unwrap();
    let serialized = DocumentWriter::write_from_node(body, &handle);
    assert_eq!(serialized, "<body><b>1<i>2</i></b><i>3</i></body>");
}

#[test]
fn serialization_is_structurally_idempotent() {
    // Malformed input: after one parse/serialize round, the output is a fixpoint
    let handle = parse_str("<p>one<p>two<table><td>x</table>trailing");
    let body = find_element(&handle, "body").unwrap();
    let first = DocumentWriter::write_from_node(body, &handle);

    let handle2 = parse_str(&first);
    let body2 = find_element(&handle2, "body").unwrap();
    let second = DocumentWriter::write_from_node(body2, &handle2);

    assert_eq!(first, second);
}

#[test]
fn doctype_is_preserved_in_output() {
    let handle = parse_str("<!DOCTYPE html><p>hi</p>");
    assert_eq!(handle.get().quirks_mode(), QuirksMode::NoQuirks);

    let serialized = DocumentWriter::write_from_node(NodeId::root(), &handle);
    assert!(serialized.starts_with("<!DOCTYPE html>"));
}

#[test]
fn fragment_parsing_in_table_section_context() {
    let context_doc = DocumentBuilder::new_document(None);
    let tbody = {
        let mut doc = context_doc.get_mut();
        let html = doc.register_node_at(
            Node::new_element("html", Some(HTML_NAMESPACE), AttrMap::new(), Location::default()),
            NodeId::root(),
            None,
        );
        let table = doc.register_node_at(
            Node::new_element("table", Some(HTML_NAMESPACE), AttrMap::new(), Location::default()),
            html,
            None,
        );
        let tbody = doc.register_node_at(
            Node::new_element("tbody", Some(HTML_NAMESPACE), AttrMap::new(), Location::default()),
            table,
            None,
        );
        doc.cloned_node_by_id(tbody).unwrap()
    };

    let mut stream = ByteStream::new(None);
    stream.read_from_str("<tr><td>cell</td></tr>");
    stream.close();

    let fragment_doc = DocumentBuilder::new_document_fragment(&context_doc, &tbody).unwrap();
    let (fragment, _errors) = Html5Parser::parse_fragment(
        &mut stream,
        fragment_doc.clone(),
        &context_doc,
        &tbody,
        None,
        Location::default(),
    )
    .unwrap();

    // Parsed rows hang directly off the fragment root
    assert_eq!(fragment.children().len(), 1);
    assert_eq!(child_names(&fragment.handle, fragment.root), vec!["tr"]);

    let tr = find_element(&fragment.handle, "tr").unwrap();
    assert_eq!(child_names(&fragment.handle, tr), vec!["td"]);
}

#[test]
fn fragment_parsing_rcdata_context() {
    let context_doc = DocumentBuilder::new_document(None);
    let title = Node::new_element("title", Some(HTML_NAMESPACE), AttrMap::new(), Location::default());

    let mut stream = ByteStream::new(None);
    stream.read_from_str("<b>not an element</b>");
    stream.close();

    let fragment_doc = DocumentBuilder::new_document_fragment(&context_doc, &title).unwrap();
    let (fragment, _errors) = Html5Parser::parse_fragment(
        &mut stream,
        fragment_doc.clone(),
        &context_doc,
        &title,
        None,
        Location::default(),
    )
    .unwrap();

    // In an RCDATA context the markup is text, not elements
    assert!(find_element(&fragment.handle, "b").is_none());

    let children = fragment.children();
    assert_eq!(children.len(), 1);

    let doc = fragment.handle.get();
    assert_eq!(
        doc.node_by_id(children[0]).unwrap().get_text_data().unwrap().value(),
        "<b>not an element</b>"
    );
}

#[test]
fn streaming_input_split_inside_a_tag() {
    let mut stream = ByteStream::new(None);
    stream.read_from_str("<di");

    let mut parser = Html5Parser::new_parser(&mut stream, Location::default());
    assert_eq!(parser.resume().unwrap(), ParseProgress::Suspended);

    parser.append_input("v class=\"x\">hello");
    assert_eq!(parser.resume().unwrap(), ParseProgress::Suspended);

    parser.append_input("</div>");
    parser.close_input();
    assert_eq!(parser.resume().unwrap(), ParseProgress::Complete);

    let handle = parser.document();
    let div = find_element(&handle, "div").expect("div spanned the chunk boundary");
    let doc = handle.get();
    let div_node = doc.node_by_id(div).unwrap();
    assert_eq!(div_node.get_element_data().unwrap().attributes().get("class"), Some("x"));

    let text_id = div_node.children()[0];
    assert_eq!(doc.node_by_id(text_id).unwrap().get_text_data().unwrap().value(), "hello");
}

#[test]
fn parse_document_rejects_open_stream() {
    let mut stream = ByteStream::new(None);
    stream.read_from_str("<p>unterminated");
    // stream intentionally left open

    let handle = DocumentBuilder::new_document(None);
    assert!(Html5Parser::parse_document(&mut stream, handle, None).is_err());
}
