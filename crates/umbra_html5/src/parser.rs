use core::cell::RefCell;
#[cfg(all(feature = "debug_parser", test))]
use std::io::Write;
use std::rc::Rc;

use crate::document::builder::DocumentBuilder;
use crate::document::document_impl::{DocumentImpl, QuirksMode};
use crate::document::fragment::DocumentFragment;
use crate::errors::{ErrorLogger, ParserError};
use crate::node::data::element::AttrMap;
use crate::node::elements::KNOWN_HTML_ELEMENTS;
use crate::node::node_impl::Node;
use crate::node::{HTML_NAMESPACE, MATHML_NAMESPACE, SVG_NAMESPACE};
use crate::parser::attr_replacements::{
    MATHML_ADJUSTMENTS, SVG_ADJUSTMENTS_ATTRIBUTES, SVG_ADJUSTMENTS_TAGS, XML_ADJUSTMENTS,
};
use crate::parser::quirks::identify_quirks_mode;
use crate::tokenizer::state::State;
use crate::tokenizer::token::Token;
use crate::tokenizer::{Tokenizer, CHAR_REPLACEMENT};
use cow_utils::CowUtils;
use log::{debug, warn};
use umbra_shared::byte_stream::{ByteStream, Location};
use umbra_shared::document::DocumentHandle;
use umbra_shared::node::NodeId;
use umbra_shared::types::{Error, ParseError, Result};

// ------------------------------------------------------------

/// Insertion modes as defined in 13.2.4.1
#[derive(Debug, Copy, Clone, PartialEq)]
enum InsertionMode {
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    AfterBody,
    AfterAfterBody,
}

macro_rules! get_node_by_id {
    ($doc_handle:expr, $id:expr) => {
        $doc_handle
            .get()
            .node_by_id($id)
            .expect("Node not found")
            .clone()
    };
}

macro_rules! get_element_data {
    ($node:expr) => {
        $node.get_element_data().expect("Node is not an element node")
    };
}

macro_rules! get_element_data_mut {
    ($node:expr) => {
        $node.get_element_data_mut().expect("Node is not an element node")
    };
}

macro_rules! get_text_data_mut {
    ($node:expr) => {
        $node.get_text_data_mut().expect("Node is not a text node")
    };
}

macro_rules! current_node {
    ($self:expr) => {{
        let current_node_idx = $self.open_elements.last().copied().unwrap_or_default();
        $self
            .document
            .get()
            .node_by_id(current_node_idx)
            .expect("Current node not found")
            .clone()
    }};
}

macro_rules! open_elements_get {
    ($self:expr, $idx:expr) => {{
        $self
            .document
            .get()
            .node_by_id($self.open_elements[$idx])
            .expect("node in open_elements not found")
            .clone()
    }};
}

mod attr_replacements;
#[macro_use]
mod helper;
mod quirks;

/// Active formatting elements, which could be a regular node(id), or a marker
#[derive(PartialEq, Clone, Copy)]
enum ActiveElement {
    Node(NodeId),
    Marker,
}

impl ActiveElement {
    fn node_id(&self) -> Option<NodeId> {
        match self {
            ActiveElement::Node(id) => Some(*id),
            ActiveElement::Marker => None,
        }
    }
}

/// Context the tree builder hands to the tokenizer with every token request.
/// CDATA sections are only legal when the adjusted current node sits in a
/// foreign (SVG or MathML) namespace.
#[derive(Clone, Debug, PartialEq)]
pub struct ParserData {
    pub adjusted_node_namespace: String,
}

impl Default for ParserData {
    fn default() -> Self {
        Self {
            adjusted_node_namespace: HTML_NAMESPACE.to_string(),
        }
    }
}

pub struct Html5ParserOptions {
    pub scripting_enabled: bool,
}

impl Html5ParserOptions {
    #[must_use]
    pub fn new(scripting_enabled: bool) -> Self {
        Self { scripting_enabled }
    }
}

impl Default for Html5ParserOptions {
    fn default() -> Self {
        Self {
            scripting_enabled: true,
        }
    }
}

/// Callback for an embedder that wants to run scripts. Invoked synchronously
/// when a complete `script` element has been closed; the engine itself never
/// executes anything.
pub trait ScriptHandler {
    fn handle_script(&mut self, document: DocumentHandle<DocumentImpl>, script_node_id: NodeId);
}

/// Outcome of a (resumable) parse run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseProgress {
    /// The open input stream starved; append more input and resume
    Suspended,
    /// Parsing ran to completion
    Complete,
}

/// The main parser object
pub struct Html5Parser<'stream> {
    /// tokenizer object
    tokenizer: Tokenizer<'stream>,
    /// current insertion mode
    insertion_mode: InsertionMode,
    /// original insertion mode (used for text mode)
    original_insertion_mode: InsertionMode,
    /// Current token from the tokenizer
    current_token: Token,
    /// If true, the current token should be processed again
    reprocess_token: bool,
    /// Stack of open elements
    open_elements: Vec<NodeId>,
    /// Current head element
    head_element: Option<NodeId>,
    /// Current form element
    form_element: Option<NodeId>,
    /// If true, scripting is enabled
    scripting_enabled: bool,
    /// if true, the body can still be replaced by other content
    frameset_ok: bool,
    /// Foster parenting flag
    foster_parenting: bool,
    /// Pending table character tokens
    pending_table_character_tokens: String,
    /// Acknowledge self-closing tags
    ack_self_closing: bool,
    /// List of active formatting elements or markers
    active_formatting_elements: Vec<ActiveElement>,
    /// Is the current parsing a fragment case. If so, context_node is set as well.
    is_fragment_case: bool,
    /// A reference to the document we are parsing
    document: DocumentHandle<DocumentImpl>,
    /// Error logger, which is shared with the tokenizer
    error_logger: Rc<RefCell<ErrorLogger>>,
    /// Levels of scripting we currently are in
    script_nesting_level: u32,
    /// If true, the parser is paused
    parser_pause_flag: bool,
    /// Keeps the position where a script-inserted write would land
    insertion_point: Option<usize>,
    /// Ignore when next token is LF
    ignore_lf: bool,
    /// Sometimes tokens needs to be split up on the parser side
    token_queue: Vec<Token>,
    /// When true, the parser is finished and should not consume more tokens
    parser_finished: bool,
    /// Context node for fragment parsing (detached clone)
    context_node: Option<Node>,
    /// Tag names of inserted elements that are not known built-ins; the
    /// embedder uses this list for custom element upgrades
    upgrade_candidates: Vec<String>,
    /// Optional script collaborator
    script_handler: Option<Box<dyn ScriptHandler>>,
}

/// Defines the scopes for is_in_scope()
#[derive(Clone, Copy)]
enum Scope {
    Regular,
    ListItem,
    Button,
    Table,
    Select,
}

/// Defines the mode we should dispatch
enum DispatcherMode {
    Foreign,
    Html,
}

impl<'stream> Html5Parser<'stream> {
    // Initializes the parser for whole document parsing
    fn init(
        tokenizer: Tokenizer<'stream>,
        document: DocumentHandle<DocumentImpl>,
        error_logger: Rc<RefCell<ErrorLogger>>,
        options: Option<Html5ParserOptions>,
    ) -> Self {
        Self {
            tokenizer,
            insertion_mode: InsertionMode::Initial,
            original_insertion_mode: InsertionMode::Initial,
            current_token: Token::Eof {
                location: Location::default(),
            },
            reprocess_token: false,
            open_elements: Vec::new(),
            head_element: None,
            form_element: None,
            scripting_enabled: options.unwrap_or_default().scripting_enabled,
            frameset_ok: true,
            foster_parenting: false,
            pending_table_character_tokens: String::new(),
            ack_self_closing: false,
            active_formatting_elements: vec![],
            is_fragment_case: false,
            document,
            error_logger,
            script_nesting_level: 0,
            parser_pause_flag: false,
            insertion_point: None,
            ignore_lf: false,
            token_queue: vec![],
            parser_finished: false,
            context_node: None,
            upgrade_candidates: vec![],
            script_handler: None,
        }
    }

    /// Creates a parser over the given stream with a fresh document. This is
    /// the entry point for incremental parsing: feed input with
    /// `append_input`, drive with `resume`, and finish with `close_input`.
    pub fn new_parser(stream: &'stream mut ByteStream, start_location: Location) -> Self {
        let doc_handle = DocumentBuilder::new_document(None);
        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let tokenizer = Tokenizer::new(stream, error_logger.clone(), start_location);

        Self::init(tokenizer, doc_handle, error_logger, None)
    }

    /// The document being built
    pub fn document(&self) -> DocumentHandle<DocumentImpl> {
        self.document.clone()
    }

    /// Installs the script collaborator
    pub fn set_script_handler(&mut self, handler: Box<dyn ScriptHandler>) {
        self.script_handler = Some(handler);
    }

    /// Appends more input to the underlying stream
    pub fn append_input(&mut self, s: &str) {
        self.tokenizer.append_str(s);
    }

    /// Closes the input stream; the next resume can run to completion
    pub fn close_input(&mut self) {
        self.tokenizer.close();
    }

    /// Runs tree construction until the input starves or parsing completes.
    /// All tokenizer and tree builder state survives a suspension, so the
    /// next call picks up exactly where this one stopped.
    pub fn resume(&mut self) -> Result<ParseProgress> {
        self.do_parse()
    }

    /// Parses a fragment of HTML instead of a whole document, against the
    /// given context element. This is used for innerHTML-style parsing. The
    /// parsed content ends up in `document` under a synthetic `html` root;
    /// the returned fragment wraps that root together with the recoverable
    /// parse errors.
    pub fn parse_fragment(
        stream: &mut ByteStream,
        document: DocumentHandle<DocumentImpl>,
        context_doc: &DocumentHandle<DocumentImpl>,
        context_node: &Node,
        options: Option<Html5ParserOptions>,
        start_location: Location,
    ) -> Result<(DocumentFragment, Vec<ParseError>)> {
        let Some(context_element_data) = context_node.get_element_data() else {
            return Err(Error::FragmentContext("context node is not an element".into()).into());
        };

        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let tokenizer = Tokenizer::new(stream, error_logger.clone(), start_location);
        let mut parser = Html5Parser::init(tokenizer, document, error_logger, options);

        parser.initialize_fragment_case(context_node);

        // The content-model states match end tags against the context
        // element's tag name, as if its start tag had just been seen
        parser.tokenizer.set_last_start_tag(context_element_data.name());

        // Synthetic root element the parsed content hangs off
        let root = Node::new_element("html", Some(HTML_NAMESPACE), AttrMap::new(), start_location);
        let root_id = parser
            .document
            .get_mut()
            .register_node_at(root, NodeId::root(), None);
        parser.open_elements.push(root_id);

        parser.reset_insertion_mode();

        // The nearest form ancestor (including the context element itself)
        // becomes the form pointer
        let mut node = context_node.clone();
        loop {
            if node.get_element_data().is_some_and(|data| data.name() == "form") {
                parser.form_element = Some(node.id());
                break;
            }

            let Some(parent_id) = node.parent_id() else {
                break;
            };
            match context_doc.get().node_by_id(parent_id) {
                Some(parent) => node = parent.clone(),
                None => break,
            }
        }

        match parser.do_parse()? {
            ParseProgress::Complete => {
                let fragment = DocumentFragment::new(parser.document.clone(), root_id);
                Ok((fragment, parser.get_parse_errors()))
            }
            ParseProgress::Suspended => {
                warn!("fragment parse suspended on an open stream");
                Err(Error::Parse("input stream is still open; close it before parsing".into()).into())
            }
        }
    }

    /// Parses the input stream into a full document (including html, body,
    /// head, etc.). The stream must be closed; for incremental input use
    /// `new_parser` with `resume`.
    pub fn parse_document(
        stream: &mut ByteStream,
        document: DocumentHandle<DocumentImpl>,
        options: Option<Html5ParserOptions>,
    ) -> Result<Vec<ParseError>> {
        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let tokenizer = Tokenizer::new(stream, error_logger.clone(), Location::default());
        let mut parser = Html5Parser::init(tokenizer, document, error_logger, options);

        match parser.do_parse()? {
            ParseProgress::Complete => Ok(parser.get_parse_errors()),
            ParseProgress::Suspended => {
                warn!("parse_document called with an open stream");
                Err(Error::Parse("input stream is still open; close it before parsing".into()).into())
            }
        }
    }

    /// Internal parser function that does the actual parsing
    fn do_parse(&mut self) -> Result<ParseProgress> {
        let mut dispatcher_mode = DispatcherMode::Html;

        loop {
            // When the parser is signalled to finish, we break our main parser loop
            if self.parser_finished {
                break;
            }

            // If reprocess_token is true, we should process the same token again
            if !self.reprocess_token {
                let Some(token) = self.fetch_next_token()? else {
                    // Starved while the stream is still open. All partial
                    // state stays put so the caller can append and resume.
                    debug!("input starved; suspending tree construction");
                    return Ok(ParseProgress::Suspended);
                };
                self.current_token = token;

                // If we reprocess a given token, the dispatcher mode should stay
                // the same and should not be re-evaluated
                dispatcher_mode = self.select_dispatch_mode();
            }

            self.reprocess_token = false;

            // Check how we should dispatch the token, and dispatch to the correct function
            match dispatcher_mode {
                DispatcherMode::Foreign => {
                    self.process_foreign_content();
                }
                DispatcherMode::Html => {
                    self.process_html_content();
                }
            }

            #[cfg(all(feature = "debug_parser", test))]
            self.display_debug_info();
        }

        Ok(ParseProgress::Complete)
    }

    // Process token in foreign content (svg, mathml)
    fn process_foreign_content(&mut self) {
        let mut handle_as_script_endtag = false;

        match &self.current_token.clone() {
            Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                let tokens = self.split_mixed_token(value);
                self.tokenizer.insert_tokens_at_queue_start(tokens);
                return;
            }
            Token::Text { .. } if self.current_token.is_null() => {
                self.parse_error("null character not allowed in foreign content");
                self.insert_text_element(&Token::Text {
                    text: CHAR_REPLACEMENT.to_string(),
                    location: self.tokenizer.get_location(),
                });
            }
            Token::Text { .. } if self.current_token.is_empty_or_white() => {
                self.insert_text_element(&self.current_token.clone());
            }
            Token::Text { .. } => {
                self.insert_text_element(&self.current_token.clone());

                self.frameset_ok = false;
            }
            Token::Comment { .. } => {
                self.insert_comment_element(&self.current_token.clone(), None);
            }
            Token::DocType { .. } => {
                self.parse_error("doctype not allowed in foreign content");
                // ignore token
            }
            Token::StartTag { name, .. }
                if name == "b"
                    || name == "big"
                    || name == "blockquote"
                    || name == "body"
                    || name == "br"
                    || name == "center"
                    || name == "code"
                    || name == "dd"
                    || name == "div"
                    || name == "dl"
                    || name == "dt"
                    || name == "em"
                    || name == "embed"
                    || name == "h1"
                    || name == "h2"
                    || name == "h3"
                    || name == "h4"
                    || name == "h5"
                    || name == "h6"
                    || name == "head"
                    || name == "hr"
                    || name == "i"
                    || name == "img"
                    || name == "li"
                    || name == "listing"
                    || name == "menu"
                    || name == "meta"
                    || name == "nobr"
                    || name == "ol"
                    || name == "p"
                    || name == "pre"
                    || name == "ruby"
                    || name == "s"
                    || name == "small"
                    || name == "span"
                    || name == "strong"
                    || name == "strike"
                    || name == "sub"
                    || name == "sup"
                    || name == "table"
                    || name == "tt"
                    || name == "u"
                    || name == "ul"
                    || name == "var" =>
            {
                self.process_unexpected_html_tag();
            }
            Token::StartTag { name, attributes, .. }
                if name == "font"
                    && (attributes.contains("color")
                        || attributes.contains("face")
                        || attributes.contains("size")) =>
            {
                self.process_unexpected_html_tag();
            }
            Token::EndTag { name, .. } if name == "br" || name == "p" => {
                self.process_unexpected_html_tag();
            }
            Token::StartTag {
                name, is_self_closing, ..
            } => {
                let mut current_token = self.current_token.clone();

                let acn = self.get_adjusted_current_node();
                let acn_element_data = get_element_data!(acn);
                if acn_element_data.is_namespace(MATHML_NAMESPACE) {
                    self.adjust_mathml_attributes(&mut current_token);
                }

                if acn_element_data.is_namespace(SVG_NAMESPACE) {
                    self.adjust_svg_tag_names(&mut current_token);
                    self.adjust_svg_attributes(&mut current_token);
                }

                self.adjust_foreign_attributes(&mut current_token);
                self.insert_foreign_element(&current_token, acn_element_data.namespace());

                if *is_self_closing {
                    if name == "script" && get_element_data!(current_node!(self)).namespace() == SVG_NAMESPACE {
                        self.ack_self_closing = true;
                        handle_as_script_endtag = true;
                    } else {
                        self.open_elements.pop();
                        self.ack_self_closing = true;
                    }
                }
            }
            Token::EndTag { name, .. } if name == "script" => {
                handle_as_script_endtag = true;
            }
            Token::EndTag { name, .. } => {
                if self.open_elements.is_empty() {
                    return;
                }

                let mut node_idx = self.open_elements.len() - 1;
                let mut node = get_node_by_id!(self.document, self.open_elements[node_idx]);

                if get_element_data!(node).name().cow_to_ascii_lowercase() != *name {
                    self.parse_error("end tag does not match current node");
                }

                loop {
                    // Fragment case is when the first element in the stack is this node
                    match self.open_elements.first() {
                        // fragment case
                        Some(node_id) if *node_id == node.id() => return,
                        _ => {}
                    }

                    if get_element_data!(node).name().cow_to_ascii_lowercase() == *name {
                        while let Some(node_id) = self.open_elements.pop() {
                            if node_id == node.id() {
                                break;
                            }
                        }
                        return;
                    }

                    node_idx -= 1;
                    node = get_node_by_id!(self.document, self.open_elements[node_idx]);

                    if !get_element_data!(node).is_namespace(HTML_NAMESPACE) {
                        continue;
                    }

                    self.process_html_content();
                    break;
                }
            }
            Token::Eof { .. } => {
                panic!("eof is not expected here");
            }
        }

        if handle_as_script_endtag {
            let script_node_id = self.open_elements.pop();

            let old_insertion_point = self.insertion_point;
            self.insertion_point = Some(self.tokenizer.get_location().offset);

            self.script_nesting_level += 1;

            if let Some(node_id) = script_node_id {
                self.run_script_handler(node_id);
            }

            self.script_nesting_level -= 1;
            if self.script_nesting_level == 0 {
                self.parser_pause_flag = false;
            }

            self.insertion_point = old_insertion_point;
        }
    }

    /// Process a token in HTML content
    fn process_html_content(&mut self) {
        if self.ignore_lf {
            if let Token::Text { text: value, location } = &self.current_token {
                if value.starts_with('\n') {
                    self.current_token = Token::Text {
                        text: value.chars().skip(1).collect::<String>(),
                        location: *location,
                    };
                }
            }
            self.ignore_lf = false;
        }

        match self.insertion_mode {
            InsertionMode::Initial => {
                let mut anything_else = false;

                match &self.current_token.clone() {
                    Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                        let tokens = self.split_mixed_token(value);
                        self.tokenizer.insert_tokens_at_queue_start(tokens);
                        return;
                    }
                    Token::Text { .. } if self.current_token.is_empty_or_white() => {
                        // ignore token
                    }
                    Token::Comment { .. } => {
                        self.insert_comment_element(&self.current_token.clone(), Some(NodeId::root()));
                    }
                    Token::DocType {
                        name,
                        pub_identifier,
                        sys_identifier,
                        force_quirks,
                        ..
                    } => {
                        if name.is_some() && name.as_deref() != Some("html")
                            || pub_identifier.is_some()
                            || (sys_identifier.is_some() && sys_identifier.as_deref() != Some("about:legacy-compat"))
                        {
                            self.parse_error("doctype not allowed in initial insertion mode");
                        }

                        self.insert_doctype_element(&self.current_token.clone());

                        self.set_quirks_mode(identify_quirks_mode(
                            name.as_deref(),
                            pub_identifier.as_deref(),
                            sys_identifier.as_deref(),
                            *force_quirks,
                        ));

                        self.insertion_mode = InsertionMode::BeforeHtml;
                    }
                    Token::StartTag { .. } => {
                        self.parse_error(&ParserError::ExpectedDocTypeButGotStartTag.to_string());
                        anything_else = true;
                    }
                    Token::EndTag { .. } => {
                        self.parse_error(&ParserError::ExpectedDocTypeButGotEndTag.to_string());
                        anything_else = true;
                    }
                    Token::Text { .. } => {
                        self.parse_error(&ParserError::ExpectedDocTypeButGotChars.to_string());
                        anything_else = true;
                    }
                    Token::Eof { .. } => anything_else = true,
                }

                if anything_else {
                    self.set_quirks_mode(QuirksMode::Quirks);
                    self.insertion_mode = InsertionMode::BeforeHtml;
                    self.reprocess_token = true;
                }
            }
            InsertionMode::BeforeHtml => {
                let mut anything_else = false;

                match &self.current_token {
                    Token::DocType { .. } => {
                        self.parse_error("doctype not allowed in before html insertion mode");
                    }
                    Token::Comment { .. } => {
                        self.insert_comment_element(&self.current_token.clone(), Some(NodeId::root()));
                    }
                    Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                        let tokens = self.split_mixed_token(value);
                        self.tokenizer.insert_tokens_at_queue_start(tokens);
                        return;
                    }
                    Token::Text { .. } if self.current_token.is_empty_or_white() => {
                        // ignore token
                    }
                    Token::StartTag { name, .. } if name == "html" => {
                        self.insert_document_element(&self.current_token.clone());

                        self.insertion_mode = InsertionMode::BeforeHead;
                    }
                    Token::EndTag { name, .. }
                        if name == "head" || name == "body" || name == "html" || name == "br" =>
                    {
                        anything_else = true;
                    }
                    Token::EndTag { .. } => {
                        self.parse_error("end tag not allowed in before html insertion mode");
                    }
                    _ => {
                        anything_else = true;
                    }
                }

                if anything_else {
                    let token = Token::StartTag {
                        name: "html".to_string(),
                        is_self_closing: false,
                        attributes: AttrMap::new(),
                        location: self.current_token.get_location(),
                    };
                    self.insert_document_element(&token);

                    self.insertion_mode = InsertionMode::BeforeHead;
                    self.reprocess_token = true;
                }
            }
            InsertionMode::BeforeHead => {
                let mut anything_else = false;

                match &self.current_token {
                    Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                        let tokens = self.split_mixed_token(value);
                        self.tokenizer.insert_tokens_at_queue_start(tokens);
                        return;
                    }
                    Token::Text { .. } if self.current_token.is_empty_or_white() => {
                        // ignore token
                    }
                    Token::Comment { .. } => {
                        self.insert_comment_element(&self.current_token.clone(), None);
                    }
                    Token::DocType { .. } => {
                        self.parse_error("doctype not allowed in before head insertion mode");
                        // ignore token
                    }
                    Token::StartTag { name, .. } if name == "html" => {
                        self.handle_in_body();
                    }
                    Token::StartTag { name, .. } if name == "head" => {
                        let node_id = self.insert_html_element(&self.current_token.clone());
                        self.head_element = Some(node_id);
                        self.insertion_mode = InsertionMode::InHead;
                    }
                    Token::EndTag { name, .. }
                        if name == "head" || name == "body" || name == "html" || name == "br" =>
                    {
                        anything_else = true;
                    }
                    Token::EndTag { .. } => {
                        self.parse_error("end tag not allowed in before head insertion mode");
                        // ignore token
                    }
                    _ => {
                        anything_else = true;
                    }
                }
                if anything_else {
                    let token = Token::StartTag {
                        name: "head".to_string(),
                        is_self_closing: false,
                        attributes: AttrMap::new(),
                        location: self.current_token.get_location(),
                    };
                    let node_id = self.insert_html_element(&token);
                    self.head_element = Some(node_id);
                    self.insertion_mode = InsertionMode::InHead;
                    self.reprocess_token = true;
                }
            }
            InsertionMode::InHead => self.handle_in_head(),
            InsertionMode::InHeadNoscript => {
                let mut anything_else = false;

                match &self.current_token {
                    Token::DocType { .. } => {
                        self.parse_error("doctype not allowed in 'head no script' insertion mode");
                        // ignore token
                        return;
                    }
                    Token::StartTag { name, .. } if name == "html" => {
                        self.handle_in_body();
                    }
                    Token::EndTag { name, .. } if name == "noscript" => {
                        self.pop_check("noscript");
                        self.check_last_element("head");
                        self.insertion_mode = InsertionMode::InHead;
                    }
                    Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                        let tokens = self.split_mixed_token(value);
                        self.tokenizer.insert_tokens_at_queue_start(tokens);
                        return;
                    }
                    Token::Text { .. } if self.current_token.is_empty_or_white() => {
                        self.handle_in_head();
                    }
                    Token::Comment { .. } => {
                        self.handle_in_head();
                    }
                    Token::StartTag { name, .. }
                        if name == "basefont"
                            || name == "bgsound"
                            || name == "link"
                            || name == "meta"
                            || name == "noframes"
                            || name == "style" =>
                    {
                        self.handle_in_head();
                    }
                    Token::EndTag { name, .. } if name == "br" => {
                        anything_else = true;
                    }
                    Token::StartTag { name, .. } if name == "head" || name == "noscript" => {
                        self.parse_error("head or noscript tag not allowed in 'head no script' insertion mode");
                        // ignore token
                    }
                    Token::EndTag { .. } => {
                        self.parse_error("end tag not allowed in 'head no script' insertion mode");
                        // ignore token
                    }
                    _ => {
                        anything_else = true;
                    }
                }
                if anything_else {
                    self.parse_error("anything else not allowed in 'head no script' insertion mode");

                    self.pop_check("noscript");
                    self.check_last_element("head");

                    self.insertion_mode = InsertionMode::InHead;
                    self.reprocess_token = true;
                }
            }
            InsertionMode::AfterHead => {
                let mut anything_else = false;

                match &self.current_token {
                    Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                        let tokens = self.split_mixed_token(value);
                        self.tokenizer.insert_tokens_at_queue_start(tokens);
                        return;
                    }
                    Token::Text { .. } if self.current_token.is_empty_or_white() => {
                        self.insert_text_element(&self.current_token.clone());
                    }
                    Token::Comment { .. } => {
                        self.insert_comment_element(&self.current_token.clone(), None);
                    }
                    Token::DocType { .. } => {
                        self.parse_error("doctype not allowed in after head insertion mode");
                        // ignore token
                    }
                    Token::StartTag { name, .. } if name == "html" => {
                        self.handle_in_body();
                    }
                    Token::StartTag { name, .. } if name == "body" => {
                        self.insert_html_element(&self.current_token.clone());

                        self.frameset_ok = false;
                        self.insertion_mode = InsertionMode::InBody;
                    }
                    Token::StartTag { name, .. } if name == "frameset" => {
                        self.parse_error("frameset not supported");
                        // ignore token
                    }
                    Token::StartTag { name, .. }
                        if [
                            "base", "basefont", "bgsound", "link", "meta", "noframes", "script", "style", "title",
                        ]
                        .contains(&name.as_str()) =>
                    {
                        self.parse_error("invalid start tag in after head insertion mode");

                        assert!(self.head_element.is_some(), "Head element should not be None");

                        if let Some(node_id) = self.head_element {
                            self.open_elements.push(node_id);
                        }

                        self.handle_in_head();

                        // Remove the head element from the stack again (it might not
                        // be the current node at this point)
                        if let Some(node_id) = self.head_element {
                            self.open_elements_remove(node_id);
                        }
                    }
                    Token::EndTag { name, .. } if name == "body" || name == "html" || name == "br" => {
                        anything_else = true;
                    }
                    Token::StartTag { name, .. } if name == "head" => {
                        self.parse_error("head tag not allowed in after head insertion mode");
                        // ignore token
                    }
                    Token::EndTag { .. } => {
                        self.parse_error("end tag not allowed in after head insertion mode");
                        // Ignore token
                    }
                    _ => {
                        anything_else = true;
                    }
                }

                if anything_else {
                    let token = Token::StartTag {
                        name: "body".to_string(),
                        is_self_closing: false,
                        attributes: AttrMap::new(),
                        location: self.current_token.get_location(),
                    };
                    self.insert_html_element(&token);

                    self.insertion_mode = InsertionMode::InBody;
                    self.reprocess_token = true;
                }
            }
            InsertionMode::InBody => self.handle_in_body(),
            InsertionMode::Text => {
                match &self.current_token {
                    Token::Text { .. } => {
                        self.insert_text_element(&self.current_token.clone());
                    }
                    Token::Eof { .. } => {
                        self.parse_error("eof not allowed in text insertion mode");

                        self.open_elements.pop();
                        self.insertion_mode = self.original_insertion_mode;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. } if name == "script" => {
                        let script_node_id = current_node!(self).id();

                        self.open_elements.pop();
                        self.insertion_mode = self.original_insertion_mode;

                        let old_insertion_point = self.insertion_point;
                        self.insertion_point = Some(self.tokenizer.get_location().offset);

                        self.script_nesting_level += 1;

                        self.run_script_handler(script_node_id);

                        self.script_nesting_level -= 1;
                        if self.script_nesting_level == 0 {
                            self.parser_pause_flag = false;
                        }

                        self.insertion_point = old_insertion_point;
                    }
                    _ => {
                        self.open_elements.pop();
                        self.insertion_mode = self.original_insertion_mode;
                    }
                }
            }
            InsertionMode::InTable => self.handle_in_table(),
            InsertionMode::InTableText => {
                match &self.current_token {
                    Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                        let tokens = self.split_mixed_token(value);
                        self.tokenizer.insert_tokens_at_queue_start(tokens);
                    }
                    Token::Text { .. } if self.current_token.is_null() => {
                        self.parse_error("null character not allowed in in table text insertion mode");
                        // ignore token
                    }
                    Token::Text { text: value, .. } => {
                        self.pending_table_character_tokens.push_str(value);
                    }
                    _ => {
                        let pending_chars = self.pending_table_character_tokens.clone();

                        let mut process_as_intable_anything_else = false;

                        for c in self.pending_table_character_tokens.chars() {
                            if !c.is_ascii_whitespace() {
                                self.parse_error("non whitespace character in pending table character tokens");
                                process_as_intable_anything_else = true;
                                break;
                            }
                        }

                        if process_as_intable_anything_else {
                            let tmp = self.current_token.clone();
                            self.foster_parenting = true;

                            let tokens = self.split_mixed_token(&pending_chars);
                            for token in tokens {
                                self.current_token = token;
                                self.handle_in_body();
                            }

                            self.foster_parenting = false;
                            self.current_token = tmp;
                        } else {
                            self.insert_text_element(&Token::Text {
                                text: pending_chars,
                                location: self.tokenizer.get_location(),
                            });
                        }

                        self.pending_table_character_tokens.clear();

                        self.insertion_mode = self.original_insertion_mode;
                        self.reprocess_token = true;
                    }
                }
            }
            InsertionMode::InCaption => {
                let mut process_incaption_body = false;

                match &self.current_token {
                    Token::EndTag { name, .. } if name == "caption" => {
                        process_incaption_body = true;
                    }
                    Token::StartTag { name, .. }
                        if [
                            "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
                        ]
                        .contains(&name.as_str()) =>
                    {
                        process_incaption_body = true;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. } if name == "table" => {
                        process_incaption_body = true;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. }
                        if name == "body"
                            || name == "col"
                            || name == "colgroup"
                            || name == "html"
                            || name == "tbody"
                            || name == "td"
                            || name == "tfoot"
                            || name == "th"
                            || name == "thead"
                            || name == "tr" =>
                    {
                        self.parse_error("end tag not allowed in in caption insertion mode");
                        // ignore token
                    }
                    _ => self.handle_in_body(),
                }

                if process_incaption_body {
                    if !self.open_elements_has("caption") {
                        // fragment case
                        self.parse_error("caption end tag not allowed in in caption insertion mode");
                        // ignore token
                        self.reprocess_token = false;
                        return;
                    }

                    self.generate_implied_end_tags(None, false);

                    if get_element_data!(current_node!(self)).name() != "caption" {
                        self.parse_error("caption end tag not at top of stack");
                    }

                    self.pop_until_named("caption");
                    self.active_formatting_elements_clear_until_marker();

                    self.insertion_mode = InsertionMode::InTable;
                }
            }
            InsertionMode::InColumnGroup => {
                match &self.current_token {
                    Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                        let tokens = self.split_mixed_token(value);
                        self.tokenizer.insert_tokens_at_queue_start(tokens);
                    }
                    Token::Text { .. } if self.current_token.is_empty_or_white() => {
                        self.insert_text_element(&self.current_token.clone());
                    }
                    Token::Comment { .. } => {
                        self.insert_comment_element(&self.current_token.clone(), None);
                    }
                    Token::DocType { .. } => {
                        self.parse_error("doctype not allowed in column group insertion mode");
                        // ignore token
                    }
                    Token::StartTag { name, .. } if name == "html" => {
                        self.handle_in_body();
                    }
                    Token::StartTag {
                        name, is_self_closing, ..
                    } if name == "col" => {
                        self.acknowledge_closing_tag(*is_self_closing);

                        self.insert_html_element(&self.current_token.clone());
                        self.open_elements.pop();
                    }
                    Token::Eof { .. } => {
                        self.handle_in_body();
                    }
                    Token::EndTag { name, .. } if name == "colgroup" => {
                        if get_element_data!(current_node!(self)).name() != "colgroup" {
                            self.parse_error("colgroup end tag not at top of stack");
                            // ignore token
                            return;
                        }

                        self.open_elements.pop();
                        self.insertion_mode = InsertionMode::InTable;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. } if name == "col" => {
                        self.parse_error("col end tag not allowed in column group insertion mode");
                        // ignore token
                    }
                    _ => {
                        if get_element_data!(current_node!(self)).name() != "colgroup" {
                            self.parse_error("colgroup end tag not at top of stack");
                            // ignore token
                            return;
                        }
                        self.open_elements.pop();
                        self.insertion_mode = InsertionMode::InTable;
                        self.reprocess_token = true;
                    }
                }
            }
            InsertionMode::InTableBody => {
                match &self.current_token {
                    Token::StartTag { name, .. } if name == "tr" => {
                        self.clear_stack_back_to_table_body_context();

                        self.insert_html_element(&self.current_token.clone());

                        self.insertion_mode = InsertionMode::InRow;
                    }
                    Token::StartTag { name, .. } if name == "th" || name == "td" => {
                        self.parse_error("th or td tag not allowed in in table body insertion mode");

                        self.clear_stack_back_to_table_body_context();

                        let token = Token::StartTag {
                            name: "tr".to_string(),
                            is_self_closing: false,
                            attributes: AttrMap::new(),
                            location: self.current_token.get_location(),
                        };
                        self.insert_html_element(&token);

                        self.insertion_mode = InsertionMode::InRow;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. } if name == "tbody" || name == "tfoot" || name == "thead" => {
                        if !self.is_in_scope(name, HTML_NAMESPACE, Scope::Table) {
                            self.parse_error("tbody, tfoot or thead tag not allowed in in table body insertion mode");
                            // ignore token
                            return;
                        }

                        self.clear_stack_back_to_table_body_context();
                        self.open_elements.pop();

                        self.insertion_mode = InsertionMode::InTable;
                    }
                    Token::StartTag { name, .. }
                        if ["caption", "col", "colgroup", "tbody", "tfoot", "thead"].contains(&name.as_str()) =>
                    {
                        if !self.is_in_scope("tbody", HTML_NAMESPACE, Scope::Table)
                            && !self.is_in_scope("tfoot", HTML_NAMESPACE, Scope::Table)
                            && !self.is_in_scope("thead", HTML_NAMESPACE, Scope::Table)
                        {
                            self.parse_error("caption, col, colgroup, tbody, tfoot or thead tag not allowed in in table body insertion mode");
                            // ignore token
                            return;
                        }

                        self.clear_stack_back_to_table_body_context();
                        self.open_elements.pop();

                        self.insertion_mode = InsertionMode::InTable;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. } if name == "table" => {
                        if !self.is_in_scope("tbody", HTML_NAMESPACE, Scope::Table)
                            && !self.is_in_scope("tfoot", HTML_NAMESPACE, Scope::Table)
                            && !self.is_in_scope("thead", HTML_NAMESPACE, Scope::Table)
                        {
                            self.parse_error("table end tag not allowed in in table body insertion mode");
                            return;
                        }

                        self.clear_stack_back_to_table_body_context();
                        self.open_elements.pop();

                        self.insertion_mode = InsertionMode::InTable;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. }
                        if ["body", "caption", "col", "colgroup", "html", "td", "th", "tr"]
                            .contains(&name.as_str()) =>
                    {
                        self.parse_error("end tag not allowed in in table body insertion mode");
                        // ignore token
                    }
                    _ => {
                        self.handle_in_table();
                    }
                }
            }
            InsertionMode::InRow => {
                match &self.current_token {
                    Token::StartTag { name, .. } if name == "th" || name == "td" => {
                        self.clear_stack_back_to_table_row_context();

                        self.insert_html_element(&self.current_token.clone());

                        self.insertion_mode = InsertionMode::InCell;
                        self.active_formatting_elements_push_marker();
                    }
                    Token::EndTag { name, .. } if name == "tr" => {
                        if !self.is_in_scope("tr", HTML_NAMESPACE, Scope::Table) {
                            self.parse_error("tr tag not allowed in in row insertion mode");
                            // ignore token
                            return;
                        }

                        self.clear_stack_back_to_table_row_context();
                        self.pop_check("tr");

                        self.insertion_mode = InsertionMode::InTableBody;
                    }
                    Token::StartTag { name, .. }
                        if ["caption", "col", "colgroup", "tbody", "tfoot", "thead", "tr"].contains(&name.as_str()) =>
                    {
                        if !self.is_in_scope("tr", HTML_NAMESPACE, Scope::Table) {
                            self.parse_error("caption, col, colgroup, tbody, tfoot or thead tag not allowed in in row insertion mode");
                            // ignore token
                            return;
                        }

                        self.clear_stack_back_to_table_row_context();
                        self.pop_check("tr");

                        self.insertion_mode = InsertionMode::InTableBody;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. } if name == "table" => {
                        if !self.is_in_scope("tr", HTML_NAMESPACE, Scope::Table) {
                            self.parse_error("table tag not allowed in in row insertion mode");
                            // ignore token
                            return;
                        }

                        self.clear_stack_back_to_table_row_context();
                        self.pop_check("tr");

                        self.insertion_mode = InsertionMode::InTableBody;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. } if name == "tbody" || name == "tfoot" || name == "thead" => {
                        if !self.is_in_scope(name, HTML_NAMESPACE, Scope::Table) {
                            self.parse_error("tbody, tfoot or thead tag not allowed in in row insertion mode");
                            // ignore token
                            return;
                        }

                        if !self.is_in_scope("tr", HTML_NAMESPACE, Scope::Table) {
                            // ignore token
                            return;
                        }

                        self.clear_stack_back_to_table_row_context();
                        self.pop_check("tr");

                        self.insertion_mode = InsertionMode::InTableBody;
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. }
                        if name == "body"
                            || name == "caption"
                            || name == "col"
                            || name == "colgroup"
                            || name == "html"
                            || name == "td"
                            || name == "th" =>
                    {
                        self.parse_error("end tag not allowed in in row insertion mode");
                        // ignore token
                    }
                    _ => self.handle_in_table(),
                }
            }
            InsertionMode::InCell => {
                match &self.current_token {
                    Token::EndTag { name, .. } if name == "th" || name == "td" => {
                        let token_name = name.clone();

                        if !self.is_in_scope(name.as_str(), HTML_NAMESPACE, Scope::Table) {
                            self.parse_error("th or td tag not allowed in in cell insertion mode");
                            // ignore token
                            return;
                        }
                        self.generate_implied_end_tags(None, false);

                        if get_element_data!(current_node!(self)).name() != token_name {
                            self.parse_error("current node should be th or td");
                        }

                        self.pop_until_named(&token_name);

                        self.active_formatting_elements_clear_until_marker();

                        self.insertion_mode = InsertionMode::InRow;
                    }
                    Token::StartTag { name, .. }
                        if [
                            "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
                        ]
                        .contains(&name.as_str()) =>
                    {
                        if !self.is_in_scope("td", HTML_NAMESPACE, Scope::Table)
                            && !self.is_in_scope("th", HTML_NAMESPACE, Scope::Table)
                        {
                            // fragment case
                            self.parse_error("caption, col, colgroup, tbody, tfoot or thead tag not allowed in in cell insertion mode");
                            // ignore token
                            return;
                        }

                        self.close_cell();
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. }
                        if name == "body"
                            || name == "caption"
                            || name == "col"
                            || name == "colgroup"
                            || name == "html" =>
                    {
                        self.parse_error("end tag not allowed in in cell insertion mode");
                        // ignore token
                    }
                    Token::EndTag { name, .. }
                        if name == "table" || name == "tbody" || name == "tfoot" || name == "thead" || name == "tr" =>
                    {
                        if !self.is_in_scope(name.as_str(), HTML_NAMESPACE, Scope::Table) {
                            self.parse_error("tbody, tfoot or thead tag not allowed in in cell insertion mode");
                            // ignore token
                            return;
                        }

                        self.close_cell();
                        self.reprocess_token = true;
                    }
                    _ => self.handle_in_body(),
                }
            }
            InsertionMode::InSelect => self.handle_in_select(),
            InsertionMode::InSelectInTable => {
                match &self.current_token {
                    Token::StartTag { name, .. }
                        if name == "caption"
                            || name == "table"
                            || name == "tbody"
                            || name == "tfoot"
                            || name == "thead"
                            || name == "tr"
                            || name == "td"
                            || name == "th" =>
                    {
                        self.parse_error("caption, table, tbody, tfoot, thead, tr, td or th tag not allowed in in select in table insertion mode");

                        self.pop_until_named("select");
                        self.reset_insertion_mode();
                        self.reprocess_token = true;
                    }
                    Token::EndTag { name, .. }
                        if name == "caption"
                            || name == "table"
                            || name == "tbody"
                            || name == "tfoot"
                            || name == "thead"
                            || name == "tr"
                            || name == "td"
                            || name == "th" =>
                    {
                        self.parse_error("caption, table, tbody, tfoot, thead, tr, td or th tag not allowed in in select in table insertion mode");

                        if !self.is_in_scope(name, HTML_NAMESPACE, Scope::Table) {
                            // ignore token
                            return;
                        }

                        self.pop_until_named("select");
                        self.reset_insertion_mode();
                        self.reprocess_token = true;
                    }
                    _ => self.handle_in_select(),
                }
            }
            InsertionMode::AfterBody => {
                match &self.current_token {
                    Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                        let tokens = self.split_mixed_token(value);
                        self.tokenizer.insert_tokens_at_queue_start(tokens);
                    }
                    Token::Text { .. } if self.current_token.is_empty_or_white() => {
                        self.handle_in_body();
                    }
                    Token::Comment { .. } => {
                        let html_node_id = self.open_elements.first().copied().unwrap_or(NodeId::root());
                        self.insert_comment_element(&self.current_token.clone(), Some(html_node_id));
                    }
                    Token::DocType { .. } => {
                        self.parse_error("doctype not allowed in after body insertion mode");
                        // ignore token
                    }
                    Token::StartTag { name, .. } if name == "html" => {
                        self.handle_in_body();
                    }
                    Token::EndTag { name, .. } if name == "html" => {
                        if self.is_fragment_case {
                            // fragment case
                            self.parse_error("html end tag not allowed in after body insertion mode");
                            // ignore token
                            return;
                        }
                        self.insertion_mode = InsertionMode::AfterAfterBody;
                    }
                    Token::Eof { .. } => {
                        self.stop_parsing();
                    }
                    _ => {
                        self.parse_error("anything else not allowed in after body insertion mode");
                        self.insertion_mode = InsertionMode::InBody;
                        self.reprocess_token = true;
                    }
                }
            }
            InsertionMode::AfterAfterBody => match &self.current_token {
                Token::Comment { .. } => {
                    self.insert_comment_element(&self.current_token.clone(), Some(NodeId::root()));
                }
                Token::DocType { .. } => {
                    self.handle_in_body();
                }
                Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                    let tokens = self.split_mixed_token(value);
                    self.tokenizer.insert_tokens_at_queue_start(tokens);
                }
                Token::Text { .. } if self.current_token.is_empty_or_white() => {
                    self.handle_in_body();
                }
                Token::StartTag { name, .. } if name == "html" => {
                    self.handle_in_body();
                }
                Token::Eof { .. } => {
                    self.stop_parsing();
                }
                _ => {
                    self.parse_error("anything else not allowed in after after body insertion mode");
                    self.insertion_mode = InsertionMode::InBody;
                    self.reprocess_token = true;
                }
            },
        }
    }

    fn set_quirks_mode(&mut self, quirks_mode: QuirksMode) {
        self.document.get_mut().set_quirks_mode(quirks_mode);
    }

    /// Enables or disables scripting
    pub fn enabled_scripting(&mut self, enabled: bool) {
        self.scripting_enabled = enabled;
    }

    fn acknowledge_closing_tag(&mut self, is_self_closing: bool) {
        if is_self_closing {
            self.ack_self_closing = true;
        }
    }

    fn run_script_handler(&mut self, script_node_id: NodeId) {
        let document = self.document.clone();
        if let Some(handler) = self.script_handler.as_mut() {
            handler.handle_script(document, script_node_id);
        }
    }

    /// Pops the last element from the open elements until we reach $name
    fn pop_until_named(&mut self, name: &str) {
        loop {
            if self.open_elements.is_empty() {
                break;
            }

            let node = current_node!(self);
            let element_data = get_element_data!(node);
            if element_data.name() == name && element_data.is_namespace(HTML_NAMESPACE) {
                self.open_elements.pop();
                break;
            }

            self.open_elements.pop();
        }
    }

    /// Pops the last element from the open elements until we reach any of the elements in $arr
    fn pop_until_any(&mut self, arr: &[&str]) {
        while !self.open_elements.is_empty() {
            let node_id = self.open_elements.pop();
            if node_id.is_none() {
                break;
            }

            let element_node = get_node_by_id!(self.document, node_id.unwrap());
            let data = get_element_data!(element_node);
            if arr.contains(&data.name()) {
                break;
            }
        }
    }

    /// Remove the given node_id from the open elements stack. Will do nothing when the node_id is not found
    fn open_elements_remove(&mut self, target_node_id: NodeId) {
        self.open_elements.retain(|&node_id| node_id != target_node_id);
    }

    /// Pops the last element from the open elements, and panics if it is not $name
    fn pop_check(&mut self, name: &str) {
        let node_id = self.open_elements.pop().expect("Open elements is empty");
        let node = get_node_by_id!(self.document, node_id);

        assert_eq!(
            get_element_data!(node).name(),
            name,
            "{name} tag should be popped from open elements",
        );
    }

    /// Checks if the last element on the open elements is $name, and panics if not
    fn check_last_element(&self, name: &str) {
        let node_id = self.open_elements.last().copied().unwrap_or_default();
        let node = get_node_by_id!(self.document, node_id);

        assert_eq!(
            get_element_data!(node).name(),
            name,
            "{name} tag should be last element in open elements"
        );
    }

    /// Returns true when the open elements have $name
    fn open_elements_has(&self, name: &str) -> bool {
        self.open_elements.iter().rev().any(|node_id| {
            let node = get_node_by_id!(self.document, *node_id);
            let data = get_element_data!(node);

            data.name() == name
        })
    }

    /// Retrieves a list of all errors generated by the parser/tokenizer
    pub fn get_parse_errors(&self) -> Vec<ParseError> {
        self.error_logger.borrow().get_errors().clone()
    }

    /// Tag names of inserted elements that are not known built-in HTML
    /// elements, in first-seen order
    pub fn upgrade_candidates(&self) -> &[String] {
        &self.upgrade_candidates
    }

    /// Send a parse error to the error logger
    fn parse_error(&self, message: &str) {
        self.error_logger
            .borrow_mut()
            .add_error(self.current_token.get_location(), message);
    }

    /// Create a new node that is not connected or attached to the document arena
    fn create_node(&self, token: &Token, namespace: &str) -> Node {
        match token {
            Token::DocType {
                name,
                force_quirks: _,
                pub_identifier,
                sys_identifier,
                location,
            } => Node::new_doctype(
                &name.clone().unwrap_or_default(),
                pub_identifier.as_deref().unwrap_or_default(),
                sys_identifier.as_deref().unwrap_or_default(),
                *location,
            ),
            Token::StartTag {
                name,
                attributes,
                location,
                ..
            } => Node::new_element(name, Some(namespace), attributes.clone(), *location),
            Token::EndTag { name, location, .. } => {
                Node::new_element(name, Some(namespace), AttrMap::new(), *location)
            }
            Token::Comment {
                comment: value,
                location,
            } => Node::new_comment(value, *location),
            Token::Text {
                text: value, location, ..
            } => Node::new_text(value.as_str(), *location),
            Token::Eof { .. } => {
                panic!("EOF token not allowed");
            }
        }
    }

    /// Records elements whose tag name is not a known built-in; the embedder
    /// performs custom element upgrades from this list after parsing
    fn record_upgrade_candidate(&mut self, node: &Node) {
        let Some(data) = node.get_element_data() else {
            return;
        };
        if !data.is_namespace(HTML_NAMESPACE) || KNOWN_HTML_ELEMENTS.contains(data.name()) {
            return;
        }

        if !self.upgrade_candidates.iter().any(|name| name == data.name()) {
            self.upgrade_candidates.push(data.name().to_string());
        }
    }

    /// This function will pop elements off the stack until it reaches the first element that matches
    /// our condition (which can be changed with the except and thoroughly parameters)
    fn generate_implied_end_tags(&mut self, except: Option<&str>, thoroughly: bool) {
        loop {
            if self.open_elements.is_empty() {
                return;
            }

            let node = current_node!(self);
            let data = get_element_data!(node);
            let tag = data.name();

            let is_html = data.is_namespace(HTML_NAMESPACE);
            if let Some(except) = except {
                if except == tag && is_html {
                    return;
                }
            }
            if thoroughly {
                if !([
                    "tbody", "td", "tfoot", "th", "thead", "tr", "dd", "dt", "li", "option", "optgroup", "p", "rb",
                    "rp", "rt", "rtc",
                ]
                .contains(&tag)
                    && is_html)
                {
                    return;
                }
            } else if !(["dd", "dt", "li", "option", "optgroup", "p", "rb", "rp", "rt", "rtc"].contains(&tag)
                && is_html)
            {
                return;
            }

            self.open_elements.pop();
        }
    }

    /// Reset insertion mode based on the open elements (used after table and
    /// select recovery, and in the fragment case)
    fn reset_insertion_mode(&mut self) {
        let mut last = false;
        let mut idx = self.open_elements.len() - 1;

        loop {
            let mut node = open_elements_get!(self, idx);
            if idx == 0 {
                last = true;

                // fragment case
                if self.is_fragment_case {
                    node = self.context_node.clone().expect("context node not found");
                }
            }
            match get_element_data!(node).name() {
                "select" => {
                    if last {
                        self.insertion_mode = InsertionMode::InSelect;
                        return;
                    }

                    let mut ancestor_idx = idx;
                    loop {
                        if ancestor_idx == 0 {
                            self.insertion_mode = InsertionMode::InSelect;
                            return;
                        }

                        ancestor_idx -= 1;
                        let ancestor = open_elements_get!(self, ancestor_idx);
                        if get_element_data!(ancestor).name() == "table" {
                            self.insertion_mode = InsertionMode::InSelectInTable;
                            return;
                        }
                    }
                }
                "td" | "th" if !last => {
                    self.insertion_mode = InsertionMode::InCell;
                    return;
                }
                "tr" => {
                    self.insertion_mode = InsertionMode::InRow;
                    return;
                }
                "tbody" | "thead" | "tfoot" => {
                    self.insertion_mode = InsertionMode::InTableBody;
                    return;
                }
                "caption" => {
                    self.insertion_mode = InsertionMode::InCaption;
                    return;
                }
                "colgroup" => {
                    self.insertion_mode = InsertionMode::InColumnGroup;
                    return;
                }
                "table" => {
                    self.insertion_mode = InsertionMode::InTable;
                    return;
                }
                "head" if !last => {
                    self.insertion_mode = InsertionMode::InHead;
                    return;
                }
                "body" => {
                    self.insertion_mode = InsertionMode::InBody;
                    return;
                }
                "html" => {
                    if self.head_element.is_none() {
                        // fragment case
                        self.insertion_mode = InsertionMode::BeforeHead;
                        return;
                    }
                    self.insertion_mode = InsertionMode::AfterHead;
                    return;
                }
                _ => {}
            }

            if last {
                // fragment case
                self.insertion_mode = InsertionMode::InBody;
                return;
            }

            idx -= 1;
        }
    }

    /// Pop all elements back to a table context
    fn clear_stack_back_to_table_context(&mut self) {
        while !self.open_elements.is_empty() {
            if ["table", "html"].contains(&get_element_data!(current_node!(self)).name()) {
                return;
            }
            self.open_elements.pop();
        }
    }

    /// Pop all elements back to a table body context
    fn clear_stack_back_to_table_body_context(&mut self) {
        while !self.open_elements.is_empty() {
            if ["tbody", "tfoot", "thead", "html"].contains(&get_element_data!(current_node!(self)).name()) {
                return;
            }
            self.open_elements.pop();
        }
    }

    /// Pop all elements back to a table row context
    fn clear_stack_back_to_table_row_context(&mut self) {
        while !self.open_elements.is_empty() {
            let node = current_node!(self);
            let data = get_element_data!(node);
            if ["tr", "html"].contains(&data.name()) {
                return;
            }
            self.open_elements.pop();
        }
    }

    /// Checks if the given element is in given scope
    fn is_in_scope(&self, tag: &str, namespace: &str, scope: Scope) -> bool {
        for &node_id in self.open_elements.iter().rev() {
            let node = get_node_by_id!(self.document, node_id);
            if !node.is_element_node() {
                return false;
            }

            let node_element_data = get_element_data!(node);
            if node_element_data.name() == tag && node_element_data.is_namespace(namespace) {
                return true;
            }
            let default_html_scope = [
                "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
            ];
            let default_mathml_scope = ["mo", "mi", "ms", "mn", "mtext", "annotation-xml"];
            let default_svg_scope = ["foreignObject", "desc", "title"];
            match scope {
                Scope::Regular => {
                    if (node_element_data.is_namespace(HTML_NAMESPACE)
                        && default_html_scope.contains(&node_element_data.name()))
                        || (node_element_data.is_namespace(MATHML_NAMESPACE)
                            && default_mathml_scope.contains(&node_element_data.name()))
                        || (node_element_data.is_namespace(SVG_NAMESPACE)
                            && default_svg_scope.contains(&node_element_data.name()))
                    {
                        return false;
                    }
                }
                Scope::ListItem => {
                    if (node_element_data.is_namespace(HTML_NAMESPACE)
                        && (default_html_scope.contains(&node_element_data.name())
                            || ["ol", "ul"].contains(&node_element_data.name())))
                        || (node_element_data.is_namespace(MATHML_NAMESPACE)
                            && default_mathml_scope.contains(&node_element_data.name()))
                        || (node_element_data.is_namespace(SVG_NAMESPACE)
                            && default_svg_scope.contains(&node_element_data.name()))
                    {
                        return false;
                    }
                }
                Scope::Button => {
                    if (node_element_data.is_namespace(HTML_NAMESPACE)
                        && (default_html_scope.contains(&node_element_data.name())
                            || node_element_data.name() == "button"))
                        || (node_element_data.is_namespace(MATHML_NAMESPACE)
                            && default_mathml_scope.contains(&node_element_data.name()))
                        || (node_element_data.is_namespace(SVG_NAMESPACE)
                            && default_svg_scope.contains(&node_element_data.name()))
                    {
                        return false;
                    }
                }
                Scope::Table => {
                    if node_element_data.is_namespace(HTML_NAMESPACE)
                        && ["html", "template", "table"].contains(&node_element_data.name())
                    {
                        return false;
                    }
                }
                Scope::Select => {
                    if !(node_element_data.is_namespace(HTML_NAMESPACE)
                        && ["optgroup", "option"].contains(&node_element_data.name()))
                    {
                        return false;
                    }
                }
            }
        }

        false
    }

    /// Closes a table cell and switches the insertion mode to InRow
    fn close_cell(&mut self) {
        self.generate_implied_end_tags(None, false);

        let node = current_node!(self);
        let data = get_element_data!(node);
        let tag = data.name();

        if tag != "td" && tag != "th" {
            self.parse_error("current node should be td or th");
        }

        self.pop_until_any(&["td", "th"]);

        self.active_formatting_elements_clear_until_marker();
        self.insertion_mode = InsertionMode::InRow;
    }

    /// Handle insertion mode "in_body"
    fn handle_in_body(&mut self) {
        match &self.current_token.clone() {
            Token::Text { text: value, .. } if self.current_token.is_mixed_null() => {
                let tokens = self.split_mixed_token_null(value);
                self.tokenizer.insert_tokens_at_queue_start(tokens);
            }
            Token::Text { .. } if self.current_token.is_null() => {
                self.parse_error("null character not allowed in in body insertion mode");
                // ignore token
            }
            Token::Text { .. } => {
                self.reconstruct_formatting();

                self.insert_text_element(&self.current_token.clone());

                if !self.current_token.is_empty_or_white() {
                    self.frameset_ok = false;
                }
            }
            Token::Comment { .. } => {
                self.insert_comment_element(&self.current_token.clone(), None);
            }
            Token::DocType { .. } => {
                self.parse_error("doctype not allowed in in body insertion mode");
                // ignore token
            }
            Token::StartTag { name, attributes, .. } if name == "html" => {
                self.parse_error("html tag not allowed in in body insertion mode");

                // Add missing attributes to the html element
                let first_node_id = *self.open_elements.first().unwrap();
                let mut first_node = get_node_by_id!(self.document, first_node_id);

                if first_node.is_element_node() {
                    let element_data = get_element_data_mut!(first_node);
                    for (key, value) in attributes.iter() {
                        if !element_data.attributes().contains(key) {
                            element_data.add_attribute(key, value);
                        }
                    }
                    self.document.get_mut().update_node(first_node);
                }
            }
            Token::StartTag { name, .. }
                if name == "base"
                    || name == "basefont"
                    || name == "bgsound"
                    || name == "link"
                    || name == "meta"
                    || name == "noframes"
                    || name == "script"
                    || name == "style"
                    || name == "title" =>
            {
                self.handle_in_head();
            }
            Token::StartTag { name, attributes, .. } if name == "body" => {
                self.parse_error("body tag not allowed in in body insertion mode");

                if self.open_elements.len() == 1
                    || get_element_data!(open_elements_get!(self, 1)).name() != "body"
                {
                    // fragment case
                    // ignore token
                    return;
                }

                self.frameset_ok = false;

                let body_node_id = self.open_elements.iter().find(|&node_id| {
                    let node = get_node_by_id!(self.document, *node_id);
                    let node_element_data = get_element_data!(node);

                    node_element_data.name() == "body" && node_element_data.is_namespace(HTML_NAMESPACE)
                });

                if let Some(&body_node_id) = body_node_id {
                    let mut body_node = get_node_by_id!(self.document, body_node_id);

                    if body_node.is_element_node() {
                        let element_data = get_element_data_mut!(body_node);
                        for (key, value) in attributes.iter() {
                            if !element_data.attributes().contains(key) {
                                element_data.add_attribute(key, value);
                            }
                        }
                        self.document.get_mut().update_node(body_node);
                    }
                }
            }
            Token::StartTag { name, .. } if name == "frameset" => {
                self.parse_error("frameset not supported");
                // ignore token
            }
            Token::Eof { .. } => {
                self.stop_parsing();
            }
            Token::EndTag { name, .. } if name == "body" => {
                if !self.is_in_scope("body", HTML_NAMESPACE, Scope::Regular) {
                    self.parse_error("body end tag not in scope");
                    // ignore token
                    return;
                }

                self.insertion_mode = InsertionMode::AfterBody;
            }
            Token::EndTag { name, .. } if name == "html" => {
                if !self.is_in_scope("body", HTML_NAMESPACE, Scope::Regular) {
                    self.parse_error("body end tag not in scope");
                    // ignore token
                    return;
                }

                self.insertion_mode = InsertionMode::AfterBody;
                self.reprocess_token = true;
            }
            Token::StartTag { name, .. }
                if name == "address"
                    || name == "article"
                    || name == "aside"
                    || name == "blockquote"
                    || name == "center"
                    || name == "details"
                    || name == "dialog"
                    || name == "dir"
                    || name == "div"
                    || name == "dl"
                    || name == "fieldset"
                    || name == "figcaption"
                    || name == "figure"
                    || name == "footer"
                    || name == "header"
                    || name == "hgroup"
                    || name == "main"
                    || name == "menu"
                    || name == "nav"
                    || name == "ol"
                    || name == "p"
                    || name == "search"
                    || name == "section"
                    || name == "summary"
                    || name == "ul" =>
            {
                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag { name, .. }
                if name == "h1" || name == "h2" || name == "h3" || name == "h4" || name == "h5" || name == "h6" =>
            {
                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                if ["h1", "h2", "h3", "h4", "h5", "h6"].contains(&get_element_data!(current_node!(self)).name()) {
                    self.parse_error("h1-h6 not allowed in in body insertion mode");
                    self.open_elements.pop();
                }

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag { name, .. } if name == "pre" || name == "listing" => {
                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                self.insert_html_element(&self.current_token.clone());

                self.ignore_lf = true;

                self.frameset_ok = false;
            }
            Token::StartTag { name, .. } if name == "form" => {
                if self.form_element.is_some() {
                    self.parse_error("form tag not allowed when form element is already open");
                    // ignore token
                    return;
                }

                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                let node_id = self.insert_html_element(&self.current_token.clone());
                self.form_element = Some(node_id);
            }
            Token::StartTag { name, .. } if name == "li" => {
                self.frameset_ok = false;

                let mut idx = self.open_elements.len() - 1;
                loop {
                    let node = open_elements_get!(self, idx);
                    let node_element_data = get_element_data!(node);
                    let tag = node_element_data.name();

                    if tag == "li" {
                        self.generate_implied_end_tags(Some("li"), false);

                        if get_element_data!(current_node!(self)).name() != "li" {
                            self.parse_error("li tag not at top of stack");
                        }

                        self.pop_until_named("li");
                        break;
                    }

                    if !["address", "div", "p"].contains(&tag) && node_element_data.is_special() {
                        break;
                    }

                    idx -= 1;
                }

                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag { name, .. } if name == "dd" || name == "dt" => {
                self.frameset_ok = false;

                let mut idx = self.open_elements.len() - 1;
                loop {
                    let node = open_elements_get!(self, idx);
                    let node_element_data = get_element_data!(node);
                    let tag = node_element_data.name();

                    if ["dd", "dt"].contains(&tag) {
                        self.generate_implied_end_tags(Some(tag), false);

                        if get_element_data!(current_node!(self)).name() != tag {
                            self.parse_error("dd or dt tag not at top of stack");
                        }

                        self.pop_until_named(tag);
                        break;
                    }

                    if !["address", "div", "p"].contains(&tag) && node_element_data.is_special() {
                        break;
                    }

                    idx -= 1;
                }

                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag { name, .. } if name == "plaintext" => {
                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                self.insert_html_element(&self.current_token.clone());

                self.tokenizer.state = State::PLAINTEXT;
            }
            Token::StartTag { name, .. } if name == "button" => {
                if self.is_in_scope("button", HTML_NAMESPACE, Scope::Regular) {
                    self.parse_error("button tag not allowed in in body insertion mode");
                    self.generate_implied_end_tags(None, false);
                    self.pop_until_named("button");
                }

                self.reconstruct_formatting();
                self.insert_html_element(&self.current_token.clone());
                self.frameset_ok = false;
            }
            Token::EndTag { name, .. }
                if name == "address"
                    || name == "article"
                    || name == "aside"
                    || name == "blockquote"
                    || name == "button"
                    || name == "center"
                    || name == "details"
                    || name == "dialog"
                    || name == "dir"
                    || name == "div"
                    || name == "dl"
                    || name == "fieldset"
                    || name == "figcaption"
                    || name == "figure"
                    || name == "footer"
                    || name == "header"
                    || name == "hgroup"
                    || name == "listing"
                    || name == "main"
                    || name == "menu"
                    || name == "nav"
                    || name == "ol"
                    || name == "pre"
                    || name == "search"
                    || name == "section"
                    || name == "summary"
                    || name == "ul" =>
            {
                if !self.is_in_scope(name, HTML_NAMESPACE, Scope::Regular) {
                    self.parse_error("end tag not in scope");
                    // ignore token
                    return;
                }

                self.generate_implied_end_tags(None, false);

                if get_element_data!(current_node!(self)).name() != *name {
                    self.parse_error("end tag not at top of stack");
                }

                self.pop_until_named(name);
            }
            Token::EndTag { name, .. } if name == "form" => {
                let node_id = self.form_element;
                self.form_element = None;

                if node_id.is_none() || !self.is_in_scope(name, HTML_NAMESPACE, Scope::Regular) {
                    self.parse_error("end tag not in scope");
                    // ignore token
                    return;
                }
                let node_id = node_id.expect("node_id");

                self.generate_implied_end_tags(None, false);

                if get_element_data!(current_node!(self)).name() != *name {
                    self.parse_error("end tag not at top of stack");
                }

                if node_id != current_node!(self).id() {
                    self.parse_error("end tag not at top of stack");
                }
                self.open_elements_remove(node_id);
            }
            Token::EndTag { name, .. } if name == "p" => {
                if !self.is_in_scope(name, HTML_NAMESPACE, Scope::Button) {
                    self.parse_error("end tag not in scope");

                    let token = Token::StartTag {
                        name: "p".to_string(),
                        is_self_closing: false,
                        attributes: AttrMap::new(),
                        location: self.current_token.get_location(),
                    };
                    self.insert_html_element(&token);
                }

                self.close_p_element();
            }
            Token::EndTag { name, .. } if name == "li" => {
                if !self.is_in_scope(name, HTML_NAMESPACE, Scope::ListItem) {
                    self.parse_error("end tag not in scope");
                    // ignore token
                    return;
                }

                self.generate_implied_end_tags(Some("li"), false);

                if get_element_data!(current_node!(self)).name() != *name {
                    self.parse_error("end tag not at top of stack");
                }

                self.pop_until_named(name);
            }
            Token::EndTag { name, .. } if name == "dd" || name == "dt" => {
                if !self.is_in_scope(name, HTML_NAMESPACE, Scope::Regular) {
                    self.parse_error("end tag not in scope");
                    // ignore token
                    return;
                }

                self.generate_implied_end_tags(Some(name), false);

                if get_element_data!(current_node!(self)).name() != *name {
                    self.parse_error("end tag not at top of stack");
                }

                self.pop_until_named(name);
            }
            Token::EndTag { name, .. }
                if name == "h1" || name == "h2" || name == "h3" || name == "h4" || name == "h5" || name == "h6" =>
            {
                if ["h1", "h2", "h3", "h4", "h5", "h6"]
                    .iter()
                    .any(|tag| self.is_in_scope(tag, HTML_NAMESPACE, Scope::Regular))
                {
                    self.generate_implied_end_tags(Some(name), false);

                    if get_element_data!(current_node!(self)).name() != *name {
                        self.parse_error("end tag not at top of stack");
                    }

                    self.pop_until_any(&["h1", "h2", "h3", "h4", "h5", "h6"]);
                } else {
                    self.parse_error("end tag not in scope");
                    // ignore token
                }
            }
            Token::EndTag { name, .. } if name == "sarcasm" => {
                // Take a deep breath
                self.handle_in_body_any_other_end_tag(name);
            }
            Token::StartTag { name, .. } if name == "a" => {
                if let Some(node_id) = self.active_formatting_elements_has_until_marker("a") {
                    self.parse_error("a tag in active formatting elements");
                    self.adoption_agency_algorithm(&self.current_token.clone());

                    // Remove from lists if not done already by the adoption agency
                    self.open_elements_remove(node_id);
                    self.active_formatting_elements_remove(node_id);
                }

                self.reconstruct_formatting();

                let node_id = self.insert_html_element(&self.current_token.clone());
                self.active_formatting_elements_push(node_id);
            }
            Token::StartTag { name, .. }
                if name == "b"
                    || name == "big"
                    || name == "code"
                    || name == "em"
                    || name == "font"
                    || name == "i"
                    || name == "s"
                    || name == "small"
                    || name == "strike"
                    || name == "strong"
                    || name == "tt"
                    || name == "u" =>
            {
                self.reconstruct_formatting();

                let node_id = self.insert_html_element(&self.current_token.clone());
                self.active_formatting_elements_push(node_id);
            }
            Token::StartTag { name, .. } if name == "nobr" => {
                self.reconstruct_formatting();

                if self.is_in_scope("nobr", HTML_NAMESPACE, Scope::Regular) {
                    self.parse_error("nobr tag in scope");
                    self.adoption_agency_algorithm(&self.current_token.clone());
                    self.reconstruct_formatting();
                }

                let node_id = self.insert_html_element(&self.current_token.clone());
                self.active_formatting_elements_push(node_id);
            }
            Token::EndTag { name, .. }
                if name == "a"
                    || name == "b"
                    || name == "big"
                    || name == "code"
                    || name == "em"
                    || name == "font"
                    || name == "i"
                    || name == "nobr"
                    || name == "s"
                    || name == "small"
                    || name == "strike"
                    || name == "strong"
                    || name == "tt"
                    || name == "u" =>
            {
                self.adoption_agency_algorithm(&self.current_token.clone());

                #[cfg(all(feature = "debug_parser", test))]
                self.display_debug_info();
            }
            Token::StartTag { name, .. } if name == "applet" || name == "marquee" || name == "object" => {
                self.reconstruct_formatting();

                self.insert_html_element(&self.current_token.clone());

                self.active_formatting_elements_push_marker();
                self.frameset_ok = false;
            }
            Token::EndTag { name, .. } if name == "applet" || name == "marquee" || name == "object" => {
                if !self.is_in_scope(name, HTML_NAMESPACE, Scope::Regular) {
                    self.parse_error("end tag not in scope");
                    // ignore token
                    return;
                }

                self.generate_implied_end_tags(None, false);

                if get_element_data!(current_node!(self)).name() != *name {
                    self.parse_error("end tag not at top of stack");
                }

                self.pop_until_named(name);
                self.active_formatting_elements_clear_until_marker();
            }
            Token::StartTag { name, .. } if name == "table" => {
                if self.document.get().quirks_mode() != QuirksMode::Quirks
                    && self.is_in_scope("p", HTML_NAMESPACE, Scope::Button)
                {
                    self.close_p_element();
                }

                self.insert_html_element(&self.current_token.clone());

                self.frameset_ok = false;
                self.insertion_mode = InsertionMode::InTable;
            }
            Token::EndTag {
                name, is_self_closing, ..
            } if name == "br" => {
                self.parse_error("br end tag not allowed");
                self.reconstruct_formatting();

                // A </br> acts like a <br> without attributes
                let br = Token::StartTag {
                    name: "br".to_string(),
                    is_self_closing: false,
                    attributes: AttrMap::new(),
                    location: self.current_token.get_location(),
                };
                self.insert_html_element(&br);

                self.open_elements.pop();
                self.acknowledge_closing_tag(*is_self_closing);
                self.frameset_ok = false;
            }
            Token::StartTag {
                name, is_self_closing, ..
            } if name == "area"
                || name == "br"
                || name == "embed"
                || name == "img"
                || name == "keygen"
                || name == "wbr" =>
            {
                self.reconstruct_formatting();

                self.insert_html_element(&self.current_token.clone());
                self.open_elements.pop();

                self.acknowledge_closing_tag(*is_self_closing);
                self.frameset_ok = false;
            }
            Token::StartTag {
                name,
                is_self_closing,
                attributes,
                ..
            } if name == "input" => {
                self.reconstruct_formatting();

                self.insert_html_element(&self.current_token.clone());
                self.open_elements.pop();

                self.acknowledge_closing_tag(*is_self_closing);

                if attributes.get("type").map_or(true, |t| t.cow_to_ascii_lowercase() != "hidden") {
                    self.frameset_ok = false;
                }
            }
            Token::StartTag {
                name, is_self_closing, ..
            } if name == "param" || name == "source" || name == "track" => {
                self.insert_html_element(&self.current_token.clone());
                self.open_elements.pop();

                self.acknowledge_closing_tag(*is_self_closing);
            }
            Token::StartTag {
                name, is_self_closing, ..
            } if name == "hr" => {
                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                self.insert_html_element(&self.current_token.clone());
                self.open_elements.pop();

                self.acknowledge_closing_tag(*is_self_closing);
                self.frameset_ok = false;
            }
            Token::StartTag {
                name,
                is_self_closing,
                attributes,
                ..
            } if name == "image" => {
                self.parse_error("image tag not allowed");
                self.current_token = Token::StartTag {
                    name: "img".to_string(),
                    attributes: attributes.clone(),
                    is_self_closing: *is_self_closing,
                    location: self.current_token.get_location(),
                };
                self.reprocess_token = true;
            }
            Token::StartTag { name, .. } if name == "textarea" => {
                self.insert_html_element(&self.current_token.clone());

                self.ignore_lf = true;

                self.tokenizer.state = State::RCDATA;
                self.original_insertion_mode = self.insertion_mode;
                self.frameset_ok = false;
                self.insertion_mode = InsertionMode::Text;
            }
            Token::StartTag { name, .. } if name == "xmp" => {
                if self.is_in_scope("p", HTML_NAMESPACE, Scope::Button) {
                    self.close_p_element();
                }

                self.reconstruct_formatting();

                self.frameset_ok = false;
                self.parse_raw_data();
            }
            Token::StartTag { name, .. } if name == "iframe" => {
                self.frameset_ok = false;
                self.parse_raw_data();
            }
            Token::StartTag { name, .. } if name == "noembed" => {
                self.parse_raw_data();
            }
            Token::StartTag { name, .. } if name == "noscript" && self.scripting_enabled => {
                self.parse_raw_data();
            }
            Token::StartTag { name, .. } if name == "select" => {
                self.reconstruct_formatting();

                self.insert_html_element(&self.current_token.clone());
                self.frameset_ok = false;

                if self.insertion_mode == InsertionMode::InTable
                    || self.insertion_mode == InsertionMode::InCaption
                    || self.insertion_mode == InsertionMode::InTableBody
                    || self.insertion_mode == InsertionMode::InRow
                    || self.insertion_mode == InsertionMode::InCell
                {
                    self.insertion_mode = InsertionMode::InSelectInTable;
                } else {
                    self.insertion_mode = InsertionMode::InSelect;
                }
            }
            Token::StartTag { name, .. } if name == "optgroup" || name == "option" => {
                if get_element_data!(current_node!(self)).name() == "option" {
                    self.open_elements.pop();
                }

                self.reconstruct_formatting();

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag { name, .. } if name == "rb" || name == "rtc" => {
                if self.is_in_scope("ruby", HTML_NAMESPACE, Scope::Regular) {
                    self.generate_implied_end_tags(None, false);
                }

                if get_element_data!(current_node!(self)).name() != "ruby" {
                    self.parse_error("rb or rtc not in scope");
                }

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag { name, .. } if name == "rp" || name == "rt" => {
                if self.is_in_scope("ruby", HTML_NAMESPACE, Scope::Regular) {
                    self.generate_implied_end_tags(Some("rtc"), false);
                }

                if get_element_data!(current_node!(self)).name() != "rtc"
                    && get_element_data!(current_node!(self)).name() != "ruby"
                {
                    self.parse_error("rp or rt not in scope");
                }

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag {
                name,
                is_self_closing,
                attributes,
                ..
            } if name == "math" => {
                self.reconstruct_formatting();

                let mut token = Token::StartTag {
                    name: name.clone(),
                    attributes: attributes.clone(),
                    is_self_closing: *is_self_closing,
                    location: self.current_token.get_location(),
                };
                self.adjust_mathml_attributes(&mut token);
                self.adjust_foreign_attributes(&mut token);

                self.insert_foreign_element(&token, MATHML_NAMESPACE);

                if *is_self_closing {
                    self.open_elements.pop();
                    self.acknowledge_closing_tag(*is_self_closing);
                }
            }
            Token::StartTag {
                name,
                is_self_closing,
                attributes,
                ..
            } if name == "svg" => {
                self.reconstruct_formatting();

                let mut token = Token::StartTag {
                    name: name.clone(),
                    attributes: attributes.clone(),
                    is_self_closing: *is_self_closing,
                    location: self.current_token.get_location(),
                };

                self.adjust_svg_attributes(&mut token);
                self.adjust_foreign_attributes(&mut token);
                self.insert_foreign_element(&token, SVG_NAMESPACE);

                if *is_self_closing {
                    self.open_elements.pop();
                    self.acknowledge_closing_tag(*is_self_closing);
                }
            }
            Token::StartTag { name, .. }
                if name == "caption"
                    || name == "col"
                    || name == "colgroup"
                    || name == "frame"
                    || name == "head"
                    || name == "tbody"
                    || name == "td"
                    || name == "tfoot"
                    || name == "th"
                    || name == "thead"
                    || name == "tr" =>
            {
                self.parse_error("tag not allowed in in body insertion mode");
                // ignore token
            }
            Token::StartTag { .. } => {
                self.reconstruct_formatting();
                self.insert_html_element(&self.current_token.clone());
            }
            Token::EndTag { name, .. } => {
                self.handle_in_body_any_other_end_tag(name);
            }
        }
    }

    /// Handle insertion mode "in_head"
    fn handle_in_head(&mut self) {
        let mut anything_else = false;

        let token = self.current_token.clone();

        match &token {
            Token::Text { text: value, .. } if token.is_mixed() => {
                let tokens = self.split_mixed_token(value);
                self.tokenizer.insert_tokens_at_queue_start(tokens);
                return;
            }
            Token::Text { .. } if token.is_empty_or_white() => {
                self.insert_text_element(&token.clone());
            }
            Token::Comment { .. } => {
                self.insert_comment_element(&token.clone(), None);
            }
            Token::DocType { .. } => {
                self.parse_error("doctype not allowed in in head insertion mode");
                // ignore token
            }
            Token::StartTag { name, .. } if name == "html" => {
                self.handle_in_body();
            }
            Token::StartTag {
                name, is_self_closing, ..
            } if name == "base" || name == "basefont" || name == "bgsound" || name == "link" => {
                self.acknowledge_closing_tag(*is_self_closing);

                self.insert_html_element(&token.clone());
                self.open_elements.pop();
            }
            Token::StartTag {
                name, is_self_closing, ..
            } if name == "meta" => {
                self.acknowledge_closing_tag(*is_self_closing);

                self.insert_html_element(&self.current_token.clone());
                self.open_elements.pop();
            }
            Token::StartTag { name, .. } if name == "title" => {
                self.parse_rcdata();
            }
            Token::StartTag { name, .. } if name == "noscript" && self.scripting_enabled => {
                self.parse_raw_data();
            }
            Token::StartTag { name, .. } if name == "noframes" => {
                self.parse_raw_data();
            }
            Token::StartTag { name, .. } if name == "style" => {
                self.parse_raw_data();
            }
            Token::StartTag { name, .. } if name == "noscript" && !self.scripting_enabled => {
                self.insert_html_element(&self.current_token.clone());
                self.insertion_mode = InsertionMode::InHeadNoscript;
            }
            Token::StartTag { name, .. } if name == "script" => {
                let insert_position = self.appropriate_place_insert(None);
                let node = self.create_node(&self.current_token.clone(), HTML_NAMESPACE);
                let node_id = self.document.get_mut().register_node(node);
                self.insert_element_helper(node_id, insert_position);

                self.open_elements.push(node_id);

                self.tokenizer.state = State::ScriptData;
                self.original_insertion_mode = self.insertion_mode;
                self.insertion_mode = InsertionMode::Text;
            }
            Token::EndTag { name, .. } if name == "head" => {
                self.pop_check("head");
                self.insertion_mode = InsertionMode::AfterHead;
            }
            Token::EndTag { name, .. } if name == "body" || name == "html" || name == "br" => {
                anything_else = true;
            }
            Token::StartTag { name, .. } if name == "head" => {
                self.parse_error("head tag not allowed in in head insertion mode");
                // ignore token
                return;
            }
            Token::EndTag { .. } => {
                self.parse_error("end tag not allowed in in head insertion mode");
                // ignore token
                return;
            }
            _ => {
                anything_else = true;
            }
        }
        if anything_else {
            self.pop_check("head");
            self.insertion_mode = InsertionMode::AfterHead;
            self.reprocess_token = true;
        }
    }

    /// Handle insertion mode "in_table"
    fn handle_in_table(&mut self) {
        let mut anything_else = false;

        match &self.current_token {
            Token::Text { .. }
                if ["table", "tbody", "tfoot", "thead", "tr"]
                    .iter()
                    .any(|&node| node == get_element_data!(current_node!(self)).name()) =>
            {
                self.pending_table_character_tokens = String::new();
                self.original_insertion_mode = self.insertion_mode;
                self.insertion_mode = InsertionMode::InTableText;
                self.reprocess_token = true;
            }
            Token::Comment { .. } => {
                self.insert_comment_element(&self.current_token.clone(), None);
            }
            Token::DocType { .. } => {
                self.parse_error("doctype not allowed in in table insertion mode");
                // ignore token
            }
            Token::StartTag { name, .. } if name == "caption" => {
                self.clear_stack_back_to_table_context();
                self.active_formatting_elements_push_marker();
                self.insert_html_element(&self.current_token.clone());
                self.insertion_mode = InsertionMode::InCaption;
            }
            Token::StartTag { name, .. } if name == "colgroup" => {
                self.clear_stack_back_to_table_context();
                self.insert_html_element(&self.current_token.clone());
                self.insertion_mode = InsertionMode::InColumnGroup;
            }
            Token::StartTag { name, .. } if name == "col" => {
                self.clear_stack_back_to_table_context();

                let token = Token::StartTag {
                    name: "colgroup".to_string(),
                    is_self_closing: false,
                    attributes: AttrMap::new(),
                    location: self.current_token.get_location(),
                };
                self.insert_html_element(&token);

                self.insertion_mode = InsertionMode::InColumnGroup;
                self.reprocess_token = true;
            }
            Token::StartTag { name, .. } if name == "tbody" || name == "tfoot" || name == "thead" => {
                self.clear_stack_back_to_table_context();

                self.insert_html_element(&self.current_token.clone());

                self.insertion_mode = InsertionMode::InTableBody;
            }
            Token::StartTag { name, .. } if name == "td" || name == "th" || name == "tr" => {
                self.clear_stack_back_to_table_context();

                let token = Token::StartTag {
                    name: "tbody".to_string(),
                    is_self_closing: false,
                    attributes: AttrMap::new(),
                    location: self.current_token.get_location(),
                };
                self.insert_html_element(&token);

                self.insertion_mode = InsertionMode::InTableBody;
                self.reprocess_token = true;
            }
            Token::StartTag { name, .. } if name == "table" => {
                self.parse_error("table tag not allowed in in table insertion mode");

                if !self.open_elements_has("table") {
                    // ignore token
                    return;
                }

                self.pop_until_named("table");
                self.reset_insertion_mode();
                self.reprocess_token = true;
            }
            Token::EndTag { name, .. } if name == "table" => {
                if !self.open_elements_has("table") {
                    self.parse_error("table end tag not allowed in in table insertion mode");
                    // ignore token
                    return;
                }

                self.pop_until_named("table");
                self.reset_insertion_mode();
            }
            Token::EndTag { name, .. }
                if name == "body"
                    || name == "caption"
                    || name == "col"
                    || name == "colgroup"
                    || name == "html"
                    || name == "tbody"
                    || name == "td"
                    || name == "tfoot"
                    || name == "th"
                    || name == "thead"
                    || name == "tr" =>
            {
                self.parse_error("end tag not allowed in in table insertion mode");
                // ignore token
                return;
            }
            Token::StartTag { name, .. } if name == "style" || name == "script" => {
                self.handle_in_head();
            }
            Token::StartTag {
                name,
                is_self_closing,
                attributes,
                ..
            } if name == "input" => {
                if attributes.get("type").map_or(true, |t| t.cow_to_ascii_lowercase() != "hidden") {
                    anything_else = true;
                } else {
                    self.parse_error("input tag not allowed in in table insertion mode");

                    self.acknowledge_closing_tag(*is_self_closing);

                    self.insert_html_element(&self.current_token.clone());
                    self.pop_check("input");
                }
            }
            Token::StartTag { name, .. } if name == "form" => {
                self.parse_error("form tag not allowed in in table insertion mode");

                if self.form_element.is_some() {
                    // ignore token
                    return;
                }

                let node_id = self.insert_html_element(&self.current_token.clone());
                self.form_element = Some(node_id);

                self.pop_check("form");
            }
            Token::Eof { .. } => {
                self.handle_in_body();
            }
            _ => anything_else = true,
        }

        if anything_else {
            self.parse_error("anything else not allowed in in table insertion mode");

            self.foster_parenting = true;
            self.handle_in_body();
            self.foster_parenting = false;
        }
    }

    /// Handle insertion mode "in_select"
    fn handle_in_select(&mut self) {
        match &self.current_token {
            Token::Text { text: value, .. } if self.current_token.is_mixed() => {
                let tokens = self.split_mixed_token(value);
                self.tokenizer.insert_tokens_at_queue_start(tokens);
            }
            Token::Text { .. } if self.current_token.is_null() => {
                self.parse_error("null character not allowed in in select insertion mode");
                // ignore token
            }
            Token::Text { .. } => {
                self.insert_text_element(&self.current_token.clone());
            }
            Token::Comment { .. } => {
                self.insert_comment_element(&self.current_token.clone(), None);
            }
            Token::DocType { .. } => {
                self.parse_error("doctype not allowed in in select insertion mode");
                // ignore token
            }
            Token::StartTag { name, .. } if name == "html" => {
                self.handle_in_body();
            }
            Token::StartTag { name, .. } if name == "option" => {
                if get_element_data!(current_node!(self)).name() == "option" {
                    self.open_elements.pop();
                }

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag { name, .. } if name == "optgroup" => {
                if get_element_data!(current_node!(self)).name() == "option" {
                    self.open_elements.pop();
                }

                if get_element_data!(current_node!(self)).name() == "optgroup" {
                    self.open_elements.pop();
                }

                self.insert_html_element(&self.current_token.clone());
            }
            Token::StartTag {
                name, is_self_closing, ..
            } if name == "hr" => {
                if get_element_data!(current_node!(self)).name() == "option" {
                    self.open_elements.pop();
                }

                if get_element_data!(current_node!(self)).name() == "optgroup" {
                    self.open_elements.pop();
                }

                self.acknowledge_closing_tag(*is_self_closing);

                self.insert_html_element(&self.current_token.clone());
                self.open_elements.pop();
            }
            Token::EndTag { name, .. } if name == "optgroup" => {
                if get_element_data!(current_node!(self)).name() == "option"
                    && self.open_elements.len() > 1
                    && get_element_data!(open_elements_get!(self, self.open_elements.len() - 2)).name() == "optgroup"
                {
                    self.open_elements.pop();
                }

                if get_element_data!(current_node!(self)).name() == "optgroup" {
                    self.open_elements.pop();
                } else {
                    self.parse_error("optgroup end tag not allowed in in select insertion mode");
                    // ignore token
                }
            }
            Token::EndTag { name, .. } if name == "option" => {
                if get_element_data!(current_node!(self)).name() == "option" {
                    self.open_elements.pop();
                } else {
                    self.parse_error("option end tag not allowed in in select insertion mode");
                    // ignore token
                }
            }
            Token::EndTag { name, .. } if name == "select" => {
                if !self.is_in_scope("select", HTML_NAMESPACE, Scope::Select) {
                    // fragment case
                    self.parse_error("select end tag not allowed in in select insertion mode");
                    // ignore token
                    return;
                }

                self.pop_until_named("select");
                self.reset_insertion_mode();
            }
            Token::StartTag { name, .. } if name == "select" => {
                self.parse_error("select tag not allowed in in select insertion mode");

                if !self.is_in_scope("select", HTML_NAMESPACE, Scope::Select) {
                    // fragment case
                    // ignore token
                    return;
                }

                self.pop_until_named("select");
                self.reset_insertion_mode();
            }
            Token::StartTag { name, .. } if name == "input" || name == "keygen" || name == "textarea" => {
                self.parse_error("input, keygen or textarea tag not allowed in in select insertion mode");

                if !self.is_in_scope("select", HTML_NAMESPACE, Scope::Select) {
                    // fragment case
                    // ignore token
                    return;
                }

                self.pop_until_named("select");
                self.reset_insertion_mode();
                self.reprocess_token = true;
            }
            Token::StartTag { name, .. } if name == "script" => {
                self.handle_in_head();
            }
            Token::Eof { .. } => {
                self.handle_in_body();
            }
            _ => {
                self.parse_error("anything else not allowed in in select insertion mode");
                // ignore token
            }
        }
    }

    /// Returns the node id of the given tag if found in the active formatting elements list (until the first marker)
    fn active_formatting_elements_has_until_marker(&self, tag: &str) -> Option<NodeId> {
        if self.active_formatting_elements.is_empty() {
            return None;
        }

        let mut idx = self.active_formatting_elements.len() - 1;
        loop {
            match self.active_formatting_elements[idx] {
                ActiveElement::Marker => return None,
                ActiveElement::Node(node_id) => {
                    if get_element_data!(get_node_by_id!(self.document, node_id)).name() == tag {
                        return Some(node_id);
                    }
                }
            }

            if idx == 0 {
                // Reached the beginning of the list
                return None;
            }

            idx -= 1;
        }
    }

    /// Adds a marker to the active formatting stack
    fn active_formatting_elements_push_marker(&mut self) {
        self.active_formatting_elements.push(ActiveElement::Marker);
    }

    /// Clear the active formatting stack until we reach the first marker
    fn active_formatting_elements_clear_until_marker(&mut self) {
        while let Some(active_elem) = self.active_formatting_elements.pop() {
            if let ActiveElement::Marker = active_elem {
                // Found the marker
                return;
            }
        }
    }

    /// Remove the given node_id from the active formatting elements list. Will do nothing when the node is not found
    fn active_formatting_elements_remove(&mut self, target_node_id: NodeId) {
        self.active_formatting_elements.retain(|node_id| match node_id {
            ActiveElement::Node(node_id) => *node_id != target_node_id,
            ActiveElement::Marker => true,
        });
    }

    /// Push a node onto the active formatting stack. The Noah's Ark clause
    /// caps matching entries between markers at three.
    fn active_formatting_elements_push(&mut self, node_id: NodeId) {
        let mut matched = 0;
        let mut first_matched = None;
        let node = get_node_by_id!(self.document, node_id);
        let node_element_data = get_element_data!(node);

        for entry in self.active_formatting_elements.iter().rev() {
            match entry {
                ActiveElement::Marker => break,
                &ActiveElement::Node(id) => {
                    let current_node = get_node_by_id!(self.document, id);
                    if get_element_data!(current_node).matches_tag_and_attrs_without_order(node_element_data) {
                        if matched >= 2 {
                            first_matched = Some(id);
                            break;
                        }
                        matched += 1;
                    }
                }
            }
        }
        if let Some(first_matched) = first_matched {
            self.active_formatting_elements
                .retain(|n| n != &ActiveElement::Node(first_matched));
        }

        self.active_formatting_elements.push(ActiveElement::Node(node_id));
    }

    fn reconstruct_formatting(&mut self) {
        if self.active_formatting_elements.is_empty() {
            return; // Nothing to reconstruct.
        }

        let mut entry_index: usize = self.active_formatting_elements.len() - 1;
        let entry = self.active_formatting_elements[entry_index];

        // If it's a marker or in the stack of open elements, nothing to reconstruct.
        if let ActiveElement::Marker = entry {
            return;
        }

        if self
            .open_elements
            .contains(&entry.node_id().expect("node id not found"))
        {
            return;
        }

        loop {
            // If it's a marker or in the stack of open elements, nothing to reconstruct.
            let entry = self.active_formatting_elements[entry_index];
            if let ActiveElement::Marker = entry {
                entry_index += 1;
                break;
            }

            if self
                .open_elements
                .contains(&entry.node_id().expect("node id not found"))
            {
                entry_index += 1;
                break;
            }

            if entry_index == 0 {
                break;
            }

            entry_index -= 1;
        }

        loop {
            let entry = self.active_formatting_elements[entry_index];
            if let ActiveElement::Marker = entry {
                // Marker found. This should not happen!
                break;
            }
            let node_id = entry.node_id().expect("node id not found");

            let entry_node = get_node_by_id!(self.document, node_id);
            let new_node_id = self.insert_element_from_node(&entry_node, None);

            self.active_formatting_elements[entry_index] = ActiveElement::Node(new_node_id);

            if entry_index == self.active_formatting_elements.len() - 1 {
                break;
            }

            entry_index += 1;
        }
    }

    fn stop_parsing(&mut self) {
        self.parser_finished = true;
    }

    /// Close the p element that may or may not be on the open elements stack
    fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some("p"), false);

        if get_element_data!(current_node!(self)).name() != "p" {
            self.parse_error("p element not at top of stack");
        }

        self.pop_until_named("p");
    }

    /// Adjusts attribute names in the given token for SVG
    fn adjust_svg_attributes(&self, token: &mut Token) {
        if let Token::StartTag { attributes, .. } = token {
            let mut new_attributes = AttrMap::new();
            for (name, value) in attributes.iter() {
                if let Some(&new_name) = SVG_ADJUSTMENTS_ATTRIBUTES.get(name) {
                    new_attributes.insert(new_name, value);
                } else {
                    new_attributes.insert(name, value);
                }
            }
            *attributes = new_attributes;
        }
    }

    /// Adjusts the tag name in the given token for SVG
    fn adjust_svg_tag_names(&self, token: &mut Token) {
        if let Token::StartTag { name, .. } = token {
            if let Some(&new_name) = SVG_ADJUSTMENTS_TAGS.get(name) {
                *name = new_name.to_owned();
            }
        }
    }

    /// Adjusts attribute names in the given token for MathML
    fn adjust_mathml_attributes(&self, token: &mut Token) {
        if let Token::StartTag { attributes, .. } = token {
            let mut new_attributes = AttrMap::new();
            for (name, value) in attributes.iter() {
                if let Some(&new_name) = MATHML_ADJUSTMENTS.get(name) {
                    new_attributes.insert(new_name, value);
                } else {
                    new_attributes.insert(name, value);
                }
            }
            *attributes = new_attributes;
        }
    }

    /// Rewrites namespaced (xlink/xml/xmlns) attributes to their canonical
    /// prefixed form
    fn adjust_foreign_attributes(&self, token: &mut Token) {
        if let Token::StartTag { attributes, .. } = token {
            let mut new_attributes = AttrMap::new();
            for (name, value) in attributes.iter() {
                if let Some((prefix, local_name, _namespace)) = XML_ADJUSTMENTS.get(name) {
                    if prefix.is_empty() {
                        new_attributes.insert(local_name, value);
                    } else {
                        new_attributes.insert(&format!("{prefix}:{local_name}"), value);
                    }
                } else {
                    new_attributes.insert(name, value);
                }
            }
            *attributes = new_attributes;
        }
    }

    /// Switch the parser and tokenizer to the RAWTEXT state
    fn parse_raw_data(&mut self) {
        self.insert_html_element(&self.current_token.clone());

        self.tokenizer.state = State::RAWTEXT;

        self.original_insertion_mode = self.insertion_mode;
        self.insertion_mode = InsertionMode::Text;
    }

    /// Switch the parser and tokenizer to the RCDATA state
    fn parse_rcdata(&mut self) {
        self.insert_html_element(&self.current_token.clone());

        self.tokenizer.state = State::RCDATA;

        self.original_insertion_mode = self.insertion_mode;
        self.insertion_mode = InsertionMode::Text;
    }

    #[cfg(all(feature = "debug_parser", test))]
    fn display_debug_info(&self) {
        println!("-----------------------------------------\n");
        println!("current token   : '{}'", self.current_token);
        println!("insertion mode  : {:?}", self.insertion_mode);
        print!("Open elements   : [ ");
        for node_id in &self.open_elements {
            let node = get_node_by_id!(self.document, *node_id);
            if node.is_element_node() {
                print!("({}) {}, ", node_id, get_element_data!(node).name());
            } else {
                print!("({}), ", node_id);
            }
        }
        println!("]");

        print!("Active elements : [");
        for elem in &self.active_formatting_elements {
            match elem {
                ActiveElement::Node(node_id) => {
                    let node = get_node_by_id!(self.document, *node_id);
                    if node.is_element_node() {
                        print!("({}) {}, ", node_id, get_element_data!(node).name());
                    } else {
                        print!("({}), ", node_id);
                    }
                }
                ActiveElement::Marker => {
                    print!("marker, ");
                }
            }
        }
        println!("]");

        std::io::stdout().flush().ok();
    }

    /// Handles any other end tag as found during the in-body insertion mode. This needs to be a
    /// separate function as this is also called during the adoption agency algorithm
    fn handle_in_body_any_other_end_tag(&mut self, tag_name: &str) {
        if self.open_elements.is_empty() {
            self.parse_error("no open elements");
            // ignore token
            return;
        }

        for idx in (0..self.open_elements.len()).rev() {
            let node_id = self.open_elements[idx];
            let node = get_node_by_id!(self.document, node_id);

            if get_element_data!(node).name() == tag_name {
                self.generate_implied_end_tags(Some(get_element_data!(node).name()), false);

                // It might be possible that the last item is not our node_id. Emit parse error if so
                if current_node!(self).id() != node.id() {
                    self.parse_error("end tag not at top of stack");
                }

                // Pop until we reach the node.id
                while current_node!(self).id() != node.id() {
                    self.open_elements.pop();
                }
                // Pop node_id as well
                self.open_elements.pop();

                break;
            }

            if get_element_data!(node).is_special() {
                self.parse_error("special node");
                // ignore token
                return;
            }
        }
    }

    fn parser_data(&self) -> ParserData {
        if self.open_elements.is_empty() {
            return ParserData {
                adjusted_node_namespace: HTML_NAMESPACE.to_string(),
            };
        }

        let node = self.get_adjusted_current_node();
        let data = get_element_data!(node);
        ParserData {
            adjusted_node_namespace: data.namespace().to_string(),
        }
    }

    /// Fetches the next token from the tokenizer. Returns None when the open
    /// stream starved before a complete token was available.
    fn fetch_next_token(&mut self) -> Result<Option<Token>> {
        // If there are no tokens to fetch, fetch the next token from the tokenizer
        if self.token_queue.is_empty() {
            let Some(token) = self.tokenizer.next_token(self.parser_data())? else {
                return Ok(None);
            };

            match token {
                Token::Text { text, location } => {
                    self.token_queue.push(Token::Text { text, location });
                }
                // Simply return the token
                token => return Ok(Some(token)),
            }
        }

        Ok(Some(self.token_queue.remove(0)))
    }

    fn get_adjusted_current_node(&self) -> Node {
        if self.is_fragment_case && self.open_elements.len() == 1 {
            // fragment case
            return self.context_node.clone().expect("context node not found");
        }

        current_node!(self)
    }

    /// Checks the current token, node and parser context to see if the parser needs to switch to
    /// the foreign content or html content mode.
    fn select_dispatch_mode(&self) -> DispatcherMode {
        if self.open_elements.is_empty() {
            return DispatcherMode::Html;
        }

        let acn = self.get_adjusted_current_node();
        if !acn.is_element_node() {
            return DispatcherMode::Html;
        }

        let acn_element_data = get_element_data!(acn);
        if acn_element_data.is_namespace(HTML_NAMESPACE) {
            return DispatcherMode::Html;
        }

        if acn_element_data.is_mathml_integration_point()
            && (!self.current_token.is_start_tag("mglyph") && !self.current_token.is_start_tag("malignmark"))
        {
            return DispatcherMode::Html;
        }

        if acn_element_data.is_mathml_integration_point() && self.current_token.is_text_token() {
            return DispatcherMode::Html;
        }

        if acn_element_data.is_namespace(MATHML_NAMESPACE)
            && acn_element_data.name() == "annotation-xml"
            && self.current_token.is_start_tag("svg")
        {
            return DispatcherMode::Html;
        }

        if acn_element_data.is_html_integration_point() && self.current_token.is_any_start_tag() {
            return DispatcherMode::Html;
        }

        if acn_element_data.is_html_integration_point() && self.current_token.is_text_token() {
            return DispatcherMode::Html;
        }

        if self.current_token.is_eof() {
            return DispatcherMode::Html;
        }

        DispatcherMode::Foreign
    }

    /// Finds the node where to place an unexpected html tag. This can only be done on a mathml
    /// integration point, an html integration point, or at a regular html namespaced node.
    fn process_unexpected_html_tag(&mut self) {
        self.parse_error("html tag not allowed in foreign content");

        let mut tmp_node = current_node!(self);
        let mut current_node_element_data = get_element_data!(tmp_node);

        while !current_node_element_data.is_mathml_integration_point()
            && !current_node_element_data.is_html_integration_point()
            && !current_node_element_data.is_namespace(HTML_NAMESPACE)
        {
            self.open_elements.pop();
            if self.open_elements.is_empty() {
                return;
            }

            // Make sure tmp_node that current_node_element_data relies on is dropped, so we can change it.
            let _ = current_node_element_data;

            tmp_node = current_node!(self);
            current_node_element_data = get_element_data!(tmp_node);
        }

        // Process as HTML content
        self.process_html_content();
    }

    /// Find the correct tokenizer state when we are about to parse a fragment case
    fn find_initial_state_for_context(&self, context_node: &Node) -> State {
        let context_node_element_data = get_element_data!(context_node);
        if !context_node_element_data.is_namespace(HTML_NAMESPACE) {
            return State::Data;
        }

        match context_node_element_data.name() {
            "title" | "textarea" => State::RCDATA,
            "style" | "xmp" | "iframe" | "noembed" | "noframes" => State::RAWTEXT,
            "script" => State::ScriptData,
            "noscript" => {
                if self.scripting_enabled {
                    State::RAWTEXT
                } else {
                    State::Data
                }
            }
            "plaintext" => State::PLAINTEXT,
            _ => State::Data,
        }
    }

    // Initialize all parser settings for parsing a fragment case
    fn initialize_fragment_case(&mut self, context_node: &Node) {
        self.is_fragment_case = true;
        self.context_node = Some(context_node.clone());

        self.tokenizer.state = self.find_initial_state_for_context(context_node);
    }

    /// Splits a regular text token with mixed characters into tokens of 3 groups:
    /// null-characters, (ascii) whitespaces, and regular (rest) characters.
    /// These tokens are then inserted into the token buffer queue, so they can get parsed
    /// correctly.
    ///
    /// example:
    ///
    ///   Token::Text("  foo bar\0  ")
    ///
    /// is split into 6 tokens:
    ///
    ///   Token::Text("  ")  // whitespace
    ///   Token::Text("foo") // regular
    ///   Token::Text(" ")   // whitespace
    ///   Token::Text("bar") // regular
    ///   Token::Text("\0")  // null
    ///   Token::Text("  ")  // whitespace
    ///
    /// This is needed because the tokenizer does not know about the context of the text it is
    /// tokenizing, so it will always coalesce as greedily as possible. Some insertion modes need
    /// the distinction between whitespace, null and regular characters, and only there the token
    /// is split up. The idea is that large blobs of javascript for instance will not be split
    /// into separate tokens, but still be seen and parsed as a single text token.
    fn split_mixed_token(&self, text: &str) -> Vec<Token> {
        let mut tokens = vec![];
        let mut last_group = 'x';

        let mut found = String::new();

        for ch in text.chars() {
            let group = if ch == '\0' {
                '0'
            } else if ch.is_ascii_whitespace() {
                'w'
            } else {
                'r'
            };

            if last_group != group && !found.is_empty() {
                tokens.push(Token::Text {
                    text: found.clone(),
                    location: self.tokenizer.get_location(),
                });
                found.clear();
            }

            found.push(ch);
            last_group = group;
        }

        if !found.is_empty() {
            tokens.push(Token::Text {
                text: found.clone(),
                location: self.tokenizer.get_location(),
            });
        }

        tokens
    }

    /// This will split tokens into \0 groups and non-\0 groups.
    fn split_mixed_token_null(&self, text: &str) -> Vec<Token> {
        let mut tokens = vec![];
        let mut last_group = 'x';

        let mut found = String::new();

        for ch in text.chars() {
            let group = if ch == '\0' { '0' } else { 'r' };

            if last_group != group && !found.is_empty() {
                tokens.push(Token::Text {
                    text: found.clone(),
                    location: self.tokenizer.get_location(),
                });
                found.clear();
            }

            found.push(ch);
            last_group = group;
        }

        if !found.is_empty() {
            tokens.push(Token::Text {
                text: found.clone(),
                location: self.tokenizer.get_location(),
            });
        }

        tokens
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::builder::DocumentBuilder;
    use umbra_shared::byte_stream::Stream;

    macro_rules! node_create {
        ($self:expr, $name:expr) => {{
            let node = Node::new_element($name, Some(HTML_NAMESPACE), AttrMap::new(), Location::default());
            let node_id = $self.document.get_mut().register_node_at(node, NodeId::root(), None);
            $self.open_elements.push(node_id);
        }};
    }

    #[test]
    fn is_in_scope() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "div");
        node_create!(parser, "p");
        node_create!(parser, "button");
        assert!(parser.is_in_scope("p", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("p", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("p", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("p", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_empty_stack() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        parser.open_elements.clear();
        assert!(!parser.is_in_scope("p", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("p", HTML_NAMESPACE, Scope::Button));
        assert!(!parser.is_in_scope("p", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("p", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_non_existing_node() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "div");
        node_create!(parser, "p");
        node_create!(parser, "button");

        assert!(!parser.is_in_scope("foo", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("foo", HTML_NAMESPACE, Scope::Button));
        assert!(!parser.is_in_scope("foo", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("foo", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_1() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "div");
        node_create!(parser, "table");
        node_create!(parser, "tr");
        node_create!(parser, "td");
        node_create!(parser, "p");
        node_create!(parser, "span");

        assert!(parser.is_in_scope("p", HTML_NAMESPACE, Scope::Regular));
        assert!(parser.is_in_scope("p", HTML_NAMESPACE, Scope::ListItem));
        assert!(parser.is_in_scope("p", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("p", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("p", HTML_NAMESPACE, Scope::Select));

        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::Button));
        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::Select));

        assert!(!parser.is_in_scope("tr", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("tr", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("tr", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("tr", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("tr", HTML_NAMESPACE, Scope::Select));

        assert!(!parser.is_in_scope("xmp", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("xmp", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("xmp", HTML_NAMESPACE, Scope::Button));
        assert!(!parser.is_in_scope("xmp", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("xmp", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_2() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "body");
        node_create!(parser, "ul");
        node_create!(parser, "li");
        node_create!(parser, "div");
        node_create!(parser, "button");

        assert!(parser.is_in_scope("li", HTML_NAMESPACE, Scope::Regular));
        assert!(parser.is_in_scope("li", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("li", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("li", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("li", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_3() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "body");
        node_create!(parser, "div");
        node_create!(parser, "ul");
        node_create!(parser, "li");
        node_create!(parser, "p");

        assert!(parser.is_in_scope("li", HTML_NAMESPACE, Scope::Regular));
        assert!(parser.is_in_scope("li", HTML_NAMESPACE, Scope::ListItem));
        assert!(parser.is_in_scope("li", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("li", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("li", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_4() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "body");
        node_create!(parser, "table");
        node_create!(parser, "tbody");
        node_create!(parser, "tr");
        node_create!(parser, "td");
        node_create!(parser, "button");
        node_create!(parser, "span");

        assert!(parser.is_in_scope("td", HTML_NAMESPACE, Scope::Regular));
        assert!(parser.is_in_scope("td", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("td", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("td", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("td", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_5() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "body");
        node_create!(parser, "div");
        node_create!(parser, "object");
        node_create!(parser, "p");
        node_create!(parser, "a");
        node_create!(parser, "span");

        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("div", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("div", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_6() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "body");
        node_create!(parser, "div");
        node_create!(parser, "ul");
        node_create!(parser, "li");
        node_create!(parser, "marquee");
        node_create!(parser, "p");

        assert!(!parser.is_in_scope("ul", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("ul", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("ul", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("ul", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("ul", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_7() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "body");
        node_create!(parser, "div");
        node_create!(parser, "table");
        node_create!(parser, "caption");
        node_create!(parser, "p");

        assert!(!parser.is_in_scope("table", HTML_NAMESPACE, Scope::Regular));
        assert!(!parser.is_in_scope("table", HTML_NAMESPACE, Scope::ListItem));
        assert!(!parser.is_in_scope("table", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("table", HTML_NAMESPACE, Scope::Table));
        assert!(!parser.is_in_scope("table", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn is_in_scope_8() {
        let stream = &mut ByteStream::new(None);
        let mut parser = Html5Parser::new_parser(stream, Location::default());

        node_create!(parser, "html");
        node_create!(parser, "body");
        node_create!(parser, "select");
        node_create!(parser, "optgroup");
        node_create!(parser, "option");

        assert!(parser.is_in_scope("select", HTML_NAMESPACE, Scope::Regular));
        assert!(parser.is_in_scope("select", HTML_NAMESPACE, Scope::ListItem));
        assert!(parser.is_in_scope("select", HTML_NAMESPACE, Scope::Button));
        assert!(parser.is_in_scope("select", HTML_NAMESPACE, Scope::Table));
        assert!(parser.is_in_scope("select", HTML_NAMESPACE, Scope::Select));
    }

    #[test]
    fn reconstruct_formatting() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("<p><b>bold<i>bold and italic</b>italic</i></p>");
        stream.close();

        let doc_handle = DocumentBuilder::new_document(None);
        let _ = Html5Parser::parse_document(&mut stream, doc_handle.clone(), None);

        // The adoption agency should have restructured the mis-nesting into
        // a tree; just check it produced both formatting elements.
        let doc = doc_handle.get();
        let mut names = vec![];
        for node_id in crate::document::document_impl::TreeIterator::new(&doc, NodeId::root()) {
            if let Some(data) = doc.node_by_id(node_id).and_then(|n| n.get_element_data()) {
                names.push(data.name().to_string());
            }
        }
        assert!(names.contains(&"b".to_string()));
        assert!(names.contains(&"i".to_string()));
    }

    #[test]
    fn doctype_selects_quirks_mode() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("<!DOCTYPE html><html></html>");
        stream.close();

        let doc_handle = DocumentBuilder::new_document(None);
        let _ = Html5Parser::parse_document(&mut stream, doc_handle.clone(), None);
        assert_eq!(doc_handle.get().quirks_mode(), QuirksMode::NoQuirks);

        let mut stream = ByteStream::new(None);
        stream.read_from_str("<html></html>");
        stream.close();

        let doc_handle = DocumentBuilder::new_document(None);
        let _ = Html5Parser::parse_document(&mut stream, doc_handle.clone(), None);
        assert_eq!(doc_handle.get().quirks_mode(), QuirksMode::Quirks);
    }

    #[test]
    fn element_with_named_id() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str(
            "<div id=\"myid\"></div> \
             <p id=\"myid\"></p>",
        );
        stream.close();

        let doc_handle = DocumentBuilder::new_document(None);
        let _ = Html5Parser::parse_document(&mut stream, doc_handle.clone(), None);

        // we are expecting the div (id 4); the p with the same id is ignored
        let doc_read = doc_handle.get();
        let div = doc_read.get_node_by_named_id("myid").unwrap();
        assert_eq!(div.id, NodeId::from(4_usize));
        assert_eq!(get_element_data!(div).name(), "div");
    }

    #[test]
    fn element_with_invalid_named_id() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str(
            "<div id=\"my id\"></div> \
             <div id=\"\"></div>",
        );
        stream.close();

        let doc_handle = DocumentBuilder::new_document(None);
        let _ = Html5Parser::parse_document(&mut stream, doc_handle.clone(), None);

        // Invalid ids are not indexed, and thus not searchable
        assert!(doc_handle.get().get_node_by_named_id("my id").is_none());
        assert!(doc_handle.get().get_node_by_named_id("").is_none());
    }

    #[test]
    fn custom_elements_are_recorded() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("<body><my-widget></my-widget><div></div><my-widget></my-widget></body>");
        stream.close();

        let mut parser = Html5Parser::new_parser(&mut stream, Location::default());
        assert_eq!(parser.resume().unwrap(), ParseProgress::Complete);
        assert_eq!(parser.upgrade_candidates(), &["my-widget".to_string()]);
    }

    #[test]
    fn parser_suspends_and_resumes_on_open_stream() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("<div>first");

        let mut parser = Html5Parser::new_parser(&mut stream, Location::default());
        assert_eq!(parser.resume().unwrap(), ParseProgress::Suspended);

        parser.append_input(" second</div>");
        assert_eq!(parser.resume().unwrap(), ParseProgress::Suspended);

        parser.close_input();
        assert_eq!(parser.resume().unwrap(), ParseProgress::Complete);

        // document -> html -> head -> body -> div -> text
        let doc_handle = parser.document();
        let doc = doc_handle.get();
        let div = doc.node_by_id(NodeId::from(4_usize)).unwrap();
        assert_eq!(get_element_data!(div).name(), "div");

        let text = doc.node_by_id(div.children()[0]).unwrap();
        assert_eq!(text.get_text_data().unwrap().value(), "first second");
    }

    #[test]
    fn implicitly_closed_paragraphs() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("<p>one<p>two<p>three");
        stream.close();

        let doc_handle = DocumentBuilder::new_document(None);
        let _ = Html5Parser::parse_document(&mut stream, doc_handle.clone(), None);

        let doc = doc_handle.get();
        // document -> html -> head -> body
        let body = doc.node_by_id(NodeId::from(3_usize)).unwrap();
        assert_eq!(get_element_data!(body).name(), "body");
        assert_eq!(body.children().len(), 3);

        for &child_id in body.children() {
            let child = doc.node_by_id(child_id).unwrap();
            assert_eq!(get_element_data!(child).name(), "p");
            assert_eq!(child.children().len(), 1);
        }
    }
}
