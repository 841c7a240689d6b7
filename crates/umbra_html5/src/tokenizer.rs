pub mod character_reference;
pub mod entities;
pub mod state;
pub mod token;

use crate::errors::ErrorLogger;
use crate::node::HTML_NAMESPACE;
use crate::parser::ParserData;
use crate::tokenizer::state::State;
use crate::tokenizer::token::Token;
use std::cell::RefCell;
use std::rc::Rc;
use umbra_shared::byte_stream::Character::{Ch, StreamEmpty, StreamEnd};
use umbra_shared::byte_stream::{ByteStream, Character, Location, LocationHandler, Stream};
use umbra_shared::types::Result;

pub const CHAR_NUL: char = '\u{0000}';
pub const CHAR_TAB: char = '\u{0009}';
pub const CHAR_LF: char = '\u{000A}';
pub const CHAR_CR: char = '\u{000D}';
pub const CHAR_FF: char = '\u{000C}';
pub const CHAR_SPACE: char = '\u{0020}';
pub const CHAR_REPLACEMENT: char = '\u{FFFD}';

/// The tokenizer reads from the stream and emits tokens on demand. It never
/// fails on malformed input; errors go to the error logger and tokenization
/// continues with the recovery the syntax rules prescribe.
///
/// When the stream runs dry before a complete token is available and the
/// stream is still open, `next_token` returns `Ok(None)`. All intermediate
/// state lives on the tokenizer itself, so the same call can be retried once
/// more input has been appended.
pub struct Tokenizer<'stream> {
    /// Input stream
    pub stream: &'stream mut ByteStream,
    /// Position tracking for emitted tokens and errors
    location_handler: LocationHandler,
    /// Current state of the state machine
    pub state: State,
    /// Text buffer; flushed as a single text token when a non-text token is
    /// emitted
    pub(crate) consumed: String,
    /// Start position of the text currently in the consume buffer
    text_location: Location,
    /// Start position of the token under construction
    current_location: Location,
    /// Name of the attribute under construction
    pub(crate) current_attr_name: String,
    /// Value of the attribute under construction
    pub(crate) current_attr_value: String,
    /// Completed attributes of the tag under construction
    current_attrs: Vec<(String, String)>,
    /// Token under construction
    current_token: Option<Token>,
    /// Scratch buffer used by entity decoding and the script data states
    pub(crate) temporary_buffer: String,
    /// Tokens ready to be handed out
    token_queue: Vec<Token>,
    /// Name of the last start tag emitted, for appropriate-end-tag checks
    last_start_token: String,
    /// Namespace context supplied by the tree builder for the current call
    parser_data: ParserData,
    /// Parse errors are reported here
    error_logger: Rc<RefCell<ErrorLogger>>,
}

impl<'stream> Tokenizer<'stream> {
    #[must_use]
    pub fn new(stream: &'stream mut ByteStream, error_logger: Rc<RefCell<ErrorLogger>>, start_location: Location) -> Self {
        Self {
            stream,
            location_handler: LocationHandler::new(start_location),
            state: State::Data,
            consumed: String::new(),
            text_location: start_location,
            current_location: start_location,
            current_attr_name: String::new(),
            current_attr_value: String::new(),
            current_attrs: Vec::new(),
            current_token: None,
            temporary_buffer: String::new(),
            token_queue: Vec::new(),
            last_start_token: String::new(),
            parser_data: ParserData::default(),
            error_logger,
        }
    }

    /// Current position in the source text
    pub fn get_location(&self) -> Location {
        self.location_handler.cur_location
    }

    /// Appends more input to the underlying stream
    pub fn append_str(&mut self, s: &str) {
        self.stream.append_str(s);
    }

    /// Closes the underlying stream; starved reads become end-of-stream
    pub fn close(&mut self) {
        self.stream.close();
    }

    /// Sets the name used for appropriate-end-tag matching. Fragment parsing
    /// seeds this with the context element's tag name.
    pub fn set_last_start_tag(&mut self, name: &str) {
        self.last_start_token = name.to_owned();
    }

    /// Pushes tokens to the front of the queue; they are returned before any
    /// newly tokenized input
    pub fn insert_tokens_at_queue_start(&mut self, tokens: Vec<Token>) {
        let mut new_queue = tokens;
        new_queue.extend(std::mem::take(&mut self.token_queue));
        self.token_queue = new_queue;
    }

    /// Returns the next token, or `Ok(None)` when the open stream has no
    /// complete token available yet
    pub fn next_token(&mut self, parser_data: ParserData) -> Result<Option<Token>> {
        self.parser_data = parser_data;
        self.consume_stream()?;

        if self.token_queue.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.token_queue.remove(0)))
    }

    /// Runs the state machine until at least one token is queued or the
    /// stream starves
    #[allow(clippy::too_many_lines)]
    fn consume_stream(&mut self) -> Result<()> {
        loop {
            if !self.token_queue.is_empty() {
                return Ok(());
            }

            match self.state {
                State::Data => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('&') => {
                            if !self.consume_character_reference(None, false) {
                                self.stream_prev();
                                return Ok(());
                            }
                        }
                        Ch('<') => {
                            self.current_location = loc;
                            self.state = State::TagOpen;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_NUL);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => self.emit_token(Token::Eof { location: loc }),
                        Ch(c) => self.consume(c),
                    }
                }
                State::RCDATA => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('&') => {
                            if !self.consume_character_reference(None, false) {
                                self.stream_prev();
                                return Ok(());
                            }
                        }
                        Ch('<') => {
                            self.current_location = loc;
                            self.state = State::RCDATALessThanSign;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => self.emit_token(Token::Eof { location: loc }),
                        Ch(c) => self.consume(c),
                    }
                }
                State::RAWTEXT => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('<') => {
                            self.current_location = loc;
                            self.state = State::RAWTEXTLessThanSign;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => self.emit_token(Token::Eof { location: loc }),
                        Ch(c) => self.consume(c),
                    }
                }
                State::ScriptData => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('<') => {
                            self.current_location = loc;
                            self.state = State::ScriptDataLessThanSign;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => self.emit_token(Token::Eof { location: loc }),
                        Ch(c) => self.consume(c),
                    }
                }
                State::PLAINTEXT => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => self.emit_token(Token::Eof { location: loc }),
                        Ch(c) => self.consume(c),
                    }
                }
                State::TagOpen => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('!') => self.state = State::MarkupDeclarationOpen,
                        Ch('/') => self.state = State::EndTagOpen,
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.current_token = Some(Token::StartTag {
                                name: String::new(),
                                is_self_closing: false,
                                attributes: crate::node::data::element::AttrMap::new(),
                                location: self.current_location,
                            });
                            self.stream_prev();
                            self.state = State::TagName;
                        }
                        Ch('?') => {
                            self.parse_error("unexpected-question-mark-instead-of-tag-name", loc);
                            self.current_token = Some(Token::Comment {
                                comment: String::new(),
                                location: self.current_location,
                            });
                            self.stream_prev();
                            self.state = State::BogusComment;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-before-tag-name", loc);
                            self.consume('<');
                            self.emit_token(Token::Eof { location: loc });
                        }
                        _ => {
                            self.parse_error("invalid-first-character-of-tag-name", loc);
                            self.consume('<');
                            self.stream_prev();
                            self.state = State::Data;
                        }
                    }
                }
                State::EndTagOpen => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.current_token = Some(Token::EndTag {
                                name: String::new(),
                                is_self_closing: false,
                                location: self.current_location,
                            });
                            self.stream_prev();
                            self.state = State::TagName;
                        }
                        Ch('>') => {
                            self.parse_error("missing-end-tag-name", loc);
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-before-tag-name", loc);
                            self.consume('<');
                            self.consume('/');
                            self.emit_token(Token::Eof { location: loc });
                        }
                        _ => {
                            self.parse_error("invalid-first-character-of-tag-name", loc);
                            self.current_token = Some(Token::Comment {
                                comment: String::new(),
                                location: self.current_location,
                            });
                            self.stream_prev();
                            self.state = State::BogusComment;
                        }
                    }
                }
                State::TagName => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::BeforeAttributeName,
                        Ch('/') => self.state = State::SelfClosingStart,
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        Ch(ch) if ch.is_ascii_uppercase() => self.add_to_token_name(ch.to_ascii_lowercase()),
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.add_to_token_name(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-tag", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.add_to_token_name(c),
                    }
                }
                State::RCDATALessThanSign => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('/') => {
                            self.temporary_buffer.clear();
                            self.state = State::RCDATAEndTagOpen;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume('<');
                            self.stream_prev_on_char(c);
                            self.state = State::RCDATA;
                        }
                    }
                }
                State::RCDATAEndTagOpen => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.current_token = Some(Token::EndTag {
                                name: String::new(),
                                is_self_closing: false,
                                location: self.current_location,
                            });
                            self.stream_prev();
                            self.state = State::RCDATAEndTagName;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume('<');
                            self.consume('/');
                            self.stream_prev_on_char(c);
                            self.state = State::RCDATA;
                        }
                    }
                }
                State::RCDATAEndTagName => {
                    if let Some(next_state) = self.handle_raw_end_tag_name(State::RCDATA)? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::RAWTEXTLessThanSign => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('/') => {
                            self.temporary_buffer.clear();
                            self.state = State::RAWTEXTEndTagOpen;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume('<');
                            self.stream_prev_on_char(c);
                            self.state = State::RAWTEXT;
                        }
                    }
                }
                State::RAWTEXTEndTagOpen => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.current_token = Some(Token::EndTag {
                                name: String::new(),
                                is_self_closing: false,
                                location: self.current_location,
                            });
                            self.stream_prev();
                            self.state = State::RAWTEXTEndTagName;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume('<');
                            self.consume('/');
                            self.stream_prev_on_char(c);
                            self.state = State::RAWTEXT;
                        }
                    }
                }
                State::RAWTEXTEndTagName => {
                    if let Some(next_state) = self.handle_raw_end_tag_name(State::RAWTEXT)? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::ScriptDataLessThanSign => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('/') => {
                            self.temporary_buffer.clear();
                            self.state = State::ScriptDataEndTagOpen;
                        }
                        Ch('!') => {
                            self.consume('<');
                            self.consume('!');
                            self.state = State::ScriptDataEscapeStart;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume('<');
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptData;
                        }
                    }
                }
                State::ScriptDataEndTagOpen => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.current_token = Some(Token::EndTag {
                                name: String::new(),
                                is_self_closing: false,
                                location: self.current_location,
                            });
                            self.stream_prev();
                            self.state = State::ScriptDataEndTagName;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume('<');
                            self.consume('/');
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptData;
                        }
                    }
                }
                State::ScriptDataEndTagName => {
                    if let Some(next_state) = self.handle_raw_end_tag_name(State::ScriptData)? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::ScriptDataEscapeStart => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => {
                            self.consume('-');
                            self.state = State::ScriptDataEscapeStartDash;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptData;
                        }
                    }
                }
                State::ScriptDataEscapeStartDash => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => {
                            self.consume('-');
                            self.state = State::ScriptDataEscapedDashDash;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptData;
                        }
                    }
                }
                State::ScriptDataEscaped => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => {
                            self.consume('-');
                            self.state = State::ScriptDataEscapedDash;
                        }
                        Ch('<') => {
                            self.current_location = loc;
                            self.state = State::ScriptDataEscapedLessThanSign;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-script-html-comment-like-text", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.consume(c),
                    }
                }
                State::ScriptDataEscapedDash => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => {
                            self.consume('-');
                            self.state = State::ScriptDataEscapedDashDash;
                        }
                        Ch('<') => {
                            self.current_location = loc;
                            self.state = State::ScriptDataEscapedLessThanSign;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                            self.state = State::ScriptDataEscaped;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-script-html-comment-like-text", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => {
                            self.consume(c);
                            self.state = State::ScriptDataEscaped;
                        }
                    }
                }
                State::ScriptDataEscapedDashDash => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => self.consume('-'),
                        Ch('<') => {
                            self.current_location = loc;
                            self.state = State::ScriptDataEscapedLessThanSign;
                        }
                        Ch('>') => {
                            self.consume('>');
                            self.state = State::ScriptData;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                            self.state = State::ScriptDataEscaped;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-script-html-comment-like-text", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => {
                            self.consume(c);
                            self.state = State::ScriptDataEscaped;
                        }
                    }
                }
                State::ScriptDataEscapedLessThanSign => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('/') => {
                            self.temporary_buffer.clear();
                            self.state = State::ScriptDataEscapedEndTagOpen;
                        }
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.temporary_buffer.clear();
                            self.consume('<');
                            self.stream_prev();
                            self.state = State::ScriptDataDoubleEscapeStart;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume('<');
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptDataEscaped;
                        }
                    }
                }
                State::ScriptDataEscapedEndTagOpen => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.current_token = Some(Token::EndTag {
                                name: String::new(),
                                is_self_closing: false,
                                location: self.current_location,
                            });
                            self.stream_prev();
                            self.state = State::ScriptDataEscapedEndTagName;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume('<');
                            self.consume('/');
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptDataEscaped;
                        }
                    }
                }
                State::ScriptDataEscapedEndTagName => {
                    if let Some(next_state) = self.handle_raw_end_tag_name(State::ScriptDataEscaped)? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::ScriptDataDoubleEscapeStart => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(ch @ (CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE | '/' | '>')) => {
                            if self.temporary_buffer == "script" {
                                self.state = State::ScriptDataDoubleEscaped;
                            } else {
                                self.state = State::ScriptDataEscaped;
                            }
                            self.consume(ch);
                        }
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.temporary_buffer.push(ch.to_ascii_lowercase());
                            self.consume(ch);
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptDataEscaped;
                        }
                    }
                }
                State::ScriptDataDoubleEscaped => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => {
                            self.consume('-');
                            self.state = State::ScriptDataDoubleEscapedDash;
                        }
                        Ch('<') => {
                            self.consume('<');
                            self.state = State::ScriptDataDoubleEscapedLessThanSign;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-script-html-comment-like-text", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.consume(c),
                    }
                }
                State::ScriptDataDoubleEscapedDash => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => {
                            self.consume('-');
                            self.state = State::ScriptDataDoubleEscapedDashDash;
                        }
                        Ch('<') => {
                            self.consume('<');
                            self.state = State::ScriptDataDoubleEscapedLessThanSign;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                            self.state = State::ScriptDataDoubleEscaped;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-script-html-comment-like-text", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => {
                            self.consume(c);
                            self.state = State::ScriptDataDoubleEscaped;
                        }
                    }
                }
                State::ScriptDataDoubleEscapedDashDash => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => self.consume('-'),
                        Ch('<') => {
                            self.consume('<');
                            self.state = State::ScriptDataDoubleEscapedLessThanSign;
                        }
                        Ch('>') => {
                            self.consume('>');
                            self.state = State::ScriptData;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.consume(CHAR_REPLACEMENT);
                            self.state = State::ScriptDataDoubleEscaped;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-script-html-comment-like-text", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => {
                            self.consume(c);
                            self.state = State::ScriptDataDoubleEscaped;
                        }
                    }
                }
                State::ScriptDataDoubleEscapedLessThanSign => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('/') => {
                            self.temporary_buffer.clear();
                            self.consume('/');
                            self.state = State::ScriptDataDoubleEscapeEnd;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptDataDoubleEscaped;
                        }
                    }
                }
                State::ScriptDataDoubleEscapeEnd => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(ch @ (CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE | '/' | '>')) => {
                            if self.temporary_buffer == "script" {
                                self.state = State::ScriptDataEscaped;
                            } else {
                                self.state = State::ScriptDataDoubleEscaped;
                            }
                            self.consume(ch);
                        }
                        Ch(ch) if ch.is_ascii_alphabetic() => {
                            self.temporary_buffer.push(ch.to_ascii_lowercase());
                            self.consume(ch);
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::ScriptDataDoubleEscaped;
                        }
                    }
                }
                State::BeforeAttributeName => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch('/' | '>') | StreamEnd => {
                            self.stream_prev_on_char(c);
                            self.state = State::AfterAttributeName;
                        }
                        Ch('=') => {
                            self.parse_error("unexpected-equals-sign-before-attribute-name", loc);
                            self.store_and_clear_current_attribute();
                            self.current_attr_name.push('=');
                            self.state = State::AttributeName;
                        }
                        StreamEmpty => return Ok(()),
                        Ch(_) => {
                            self.store_and_clear_current_attribute();
                            self.stream_prev();
                            self.state = State::AttributeName;
                        }
                    }
                }
                State::AttributeName => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE | '/' | '>') | StreamEnd => {
                            self.stream_prev_on_char(c);
                            self.state = State::AfterAttributeName;
                        }
                        Ch('=') => self.state = State::BeforeAttributeValue,
                        Ch(ch) if ch.is_ascii_uppercase() => self.current_attr_name.push(ch.to_ascii_lowercase()),
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.current_attr_name.push(CHAR_REPLACEMENT);
                        }
                        Ch(ch @ ('"' | '\'' | '<')) => {
                            self.parse_error("unexpected-character-in-attribute-name", loc);
                            self.current_attr_name.push(ch);
                        }
                        StreamEmpty => return Ok(()),
                        Ch(c) => self.current_attr_name.push(c),
                    }
                }
                State::AfterAttributeName => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch('/') => self.state = State::SelfClosingStart,
                        Ch('=') => self.state = State::BeforeAttributeValue,
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-tag", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.store_and_clear_current_attribute();
                            self.stream_prev();
                            self.state = State::AttributeName;
                        }
                    }
                }
                State::BeforeAttributeValue => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch('"') => self.state = State::AttributeValueDoubleQuoted,
                        Ch('\'') => self.state = State::AttributeValueSingleQuoted,
                        Ch('>') => {
                            self.parse_error("missing-attribute-value", loc);
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::AttributeValueUnquoted;
                        }
                    }
                }
                State::AttributeValueDoubleQuoted => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('"') => self.state = State::AfterAttributeValueQuoted,
                        Ch('&') => {
                            if !self.consume_character_reference(Some(Ch('"')), true) {
                                self.stream_prev();
                                return Ok(());
                            }
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.current_attr_value.push(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-tag", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.current_attr_value.push(c),
                    }
                }
                State::AttributeValueSingleQuoted => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('\'') => self.state = State::AfterAttributeValueQuoted,
                        Ch('&') => {
                            if !self.consume_character_reference(Some(Ch('\'')), true) {
                                self.stream_prev();
                                return Ok(());
                            }
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.current_attr_value.push(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-tag", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.current_attr_value.push(c),
                    }
                }
                State::AttributeValueUnquoted => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::BeforeAttributeName,
                        Ch('&') => {
                            if !self.consume_character_reference(Some(Ch('>')), true) {
                                self.stream_prev();
                                return Ok(());
                            }
                        }
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.current_attr_value.push(CHAR_REPLACEMENT);
                        }
                        Ch(ch @ ('"' | '\'' | '<' | '=' | '`')) => {
                            self.parse_error("unexpected-character-in-unquoted-attribute-value", loc);
                            self.current_attr_value.push(ch);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-tag", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.current_attr_value.push(c),
                    }
                }
                State::AfterAttributeValueQuoted => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::BeforeAttributeName,
                        Ch('/') => self.state = State::SelfClosingStart,
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-tag", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        _ => {
                            self.parse_error("missing-whitespace-between-attributes", loc);
                            self.stream_prev();
                            self.state = State::BeforeAttributeName;
                        }
                    }
                }
                State::SelfClosingStart => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('>') => {
                            self.set_self_closing();
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-tag", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        _ => {
                            self.parse_error("unexpected-solidus-in-tag", loc);
                            self.stream_prev();
                            self.state = State::BeforeAttributeName;
                        }
                    }
                }
                State::BogusComment => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.add_to_token_value(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.add_to_token_value(c),
                    }
                }
                State::MarkupDeclarationOpen => {
                    if let Some(next_state) = self.handle_markup_declaration_open()? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::CommentStart => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => self.state = State::CommentStartDash,
                        Ch('>') => {
                            self.parse_error("abrupt-closing-of-empty-comment", loc);
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::Comment;
                        }
                    }
                }
                State::CommentStartDash => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => self.state = State::CommentEnd,
                        Ch('>') => {
                            self.parse_error("abrupt-closing-of-empty-comment", loc);
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-comment", loc);
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        _ => {
                            self.add_to_token_value('-');
                            self.stream_prev();
                            self.state = State::Comment;
                        }
                    }
                }
                State::Comment => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('<') => {
                            self.add_to_token_value('<');
                            self.state = State::CommentLessThanSign;
                        }
                        Ch('-') => self.state = State::CommentEndDash,
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.add_to_token_value(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-comment", loc);
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.add_to_token_value(c),
                    }
                }
                State::CommentLessThanSign => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('!') => {
                            self.add_to_token_value('!');
                            self.state = State::CommentLessThanSignBang;
                        }
                        Ch('<') => self.add_to_token_value('<'),
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::Comment;
                        }
                    }
                }
                State::CommentLessThanSignBang => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => self.state = State::CommentLessThanSignBangDash,
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::Comment;
                        }
                    }
                }
                State::CommentLessThanSignBangDash => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => self.state = State::CommentLessThanSignBangDashDash,
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.stream_prev_on_char(c);
                            self.state = State::CommentEndDash;
                        }
                    }
                }
                State::CommentLessThanSignBangDashDash => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('>') | StreamEnd => {
                            self.stream_prev_on_char(c);
                            self.state = State::CommentEnd;
                        }
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.parse_error("nested-comment", loc);
                            self.stream_prev();
                            self.state = State::CommentEnd;
                        }
                    }
                }
                State::CommentEndDash => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => self.state = State::CommentEnd,
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-comment", loc);
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        _ => {
                            self.add_to_token_value('-');
                            self.stream_prev();
                            self.state = State::Comment;
                        }
                    }
                }
                State::CommentEnd => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        Ch('!') => self.state = State::CommentEndBang,
                        Ch('-') => self.add_to_token_value('-'),
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-comment", loc);
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        _ => {
                            self.add_to_token_value('-');
                            self.add_to_token_value('-');
                            self.stream_prev();
                            self.state = State::Comment;
                        }
                    }
                }
                State::CommentEndBang => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('-') => {
                            self.add_to_token_value('-');
                            self.add_to_token_value('-');
                            self.add_to_token_value('!');
                            self.state = State::CommentEndDash;
                        }
                        Ch('>') => {
                            self.parse_error("incorrectly-closed-comment", loc);
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-comment", loc);
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        _ => {
                            self.add_to_token_value('-');
                            self.add_to_token_value('-');
                            self.add_to_token_value('!');
                            self.stream_prev();
                            self.state = State::Comment;
                        }
                    }
                }
                State::DOCTYPE => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::BeforeDOCTYPEName,
                        Ch('>') => {
                            self.stream_prev();
                            self.state = State::BeforeDOCTYPEName;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.emit_token(Token::DocType {
                                name: None,
                                force_quirks: true,
                                pub_identifier: None,
                                sys_identifier: None,
                                location: self.current_location,
                            });
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.parse_error("missing-whitespace-before-doctype-name", loc);
                            self.stream_prev();
                            self.state = State::BeforeDOCTYPEName;
                        }
                    }
                }
                State::BeforeDOCTYPEName => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch(ch) if ch.is_ascii_uppercase() => {
                            self.current_token = Some(Token::DocType {
                                name: Some(ch.to_ascii_lowercase().to_string()),
                                force_quirks: false,
                                pub_identifier: None,
                                sys_identifier: None,
                                location: self.current_location,
                            });
                            self.state = State::DOCTYPEName;
                        }
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.current_token = Some(Token::DocType {
                                name: Some(CHAR_REPLACEMENT.to_string()),
                                force_quirks: false,
                                pub_identifier: None,
                                sys_identifier: None,
                                location: self.current_location,
                            });
                            self.state = State::DOCTYPEName;
                        }
                        Ch('>') => {
                            self.parse_error("missing-doctype-name", loc);
                            self.emit_token(Token::DocType {
                                name: None,
                                force_quirks: true,
                                pub_identifier: None,
                                sys_identifier: None,
                                location: self.current_location,
                            });
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.emit_token(Token::DocType {
                                name: None,
                                force_quirks: true,
                                pub_identifier: None,
                                sys_identifier: None,
                                location: self.current_location,
                            });
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => {
                            self.current_token = Some(Token::DocType {
                                name: Some(c.to_string()),
                                force_quirks: false,
                                pub_identifier: None,
                                sys_identifier: None,
                                location: self.current_location,
                            });
                            self.state = State::DOCTYPEName;
                        }
                    }
                }
                State::DOCTYPEName => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::AfterDOCTYPEName,
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        Ch(ch) if ch.is_ascii_uppercase() => self.add_to_token_name(ch.to_ascii_lowercase()),
                        Ch(CHAR_NUL) => {
                            self.parse_error("unexpected-null-character", loc);
                            self.add_to_token_name(CHAR_REPLACEMENT);
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.add_to_token_name(c),
                    }
                }
                State::AfterDOCTYPEName => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.stream_prev();
                            if let Some(next_state) = self.handle_after_doctype_name_keyword()? {
                                self.state = next_state;
                            } else {
                                return Ok(());
                            }
                        }
                    }
                }
                State::AfterDOCTYPEPublicKeyword => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {
                            self.state = State::BeforeDOCTYPEPublicIdentifier;
                        }
                        Ch('"') => {
                            self.parse_error("missing-whitespace-after-doctype-public-keyword", loc);
                            self.set_public_identifier(String::new());
                            self.state = State::DOCTYPEPublicIdentifierDoubleQuoted;
                        }
                        Ch('\'') => {
                            self.parse_error("missing-whitespace-after-doctype-public-keyword", loc);
                            self.set_public_identifier(String::new());
                            self.state = State::DOCTYPEPublicIdentifierSingleQuoted;
                        }
                        Ch('>') => {
                            self.parse_error("missing-doctype-public-identifier", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.parse_error("missing-quote-before-doctype-public-identifier", loc);
                            self.set_quirks_mode();
                            self.stream_prev();
                            self.state = State::BogusDOCTYPE;
                        }
                    }
                }
                State::BeforeDOCTYPEPublicIdentifier => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch('"') => {
                            self.set_public_identifier(String::new());
                            self.state = State::DOCTYPEPublicIdentifierDoubleQuoted;
                        }
                        Ch('\'') => {
                            self.set_public_identifier(String::new());
                            self.state = State::DOCTYPEPublicIdentifierSingleQuoted;
                        }
                        Ch('>') => {
                            self.parse_error("missing-doctype-public-identifier", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.parse_error("missing-quote-before-doctype-public-identifier", loc);
                            self.set_quirks_mode();
                            self.stream_prev();
                            self.state = State::BogusDOCTYPE;
                        }
                    }
                }
                State::DOCTYPEPublicIdentifierDoubleQuoted => {
                    if let Some(next_state) = self.handle_doctype_identifier('"', true, State::AfterDOCTYPEPublicIdentifier)? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::DOCTYPEPublicIdentifierSingleQuoted => {
                    if let Some(next_state) = self.handle_doctype_identifier('\'', true, State::AfterDOCTYPEPublicIdentifier)? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::AfterDOCTYPEPublicIdentifier => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {
                            self.state = State::BetweenDOCTYPEPublicAndSystemIdentifiers;
                        }
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        Ch('"') => {
                            self.parse_error("missing-whitespace-between-doctype-public-and-system-identifiers", loc);
                            self.set_system_identifier(String::new());
                            self.state = State::DOCTYPESystemIdentifierDoubleQuoted;
                        }
                        Ch('\'') => {
                            self.parse_error("missing-whitespace-between-doctype-public-and-system-identifiers", loc);
                            self.set_system_identifier(String::new());
                            self.state = State::DOCTYPESystemIdentifierSingleQuoted;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.parse_error("missing-quote-before-doctype-system-identifier", loc);
                            self.set_quirks_mode();
                            self.stream_prev();
                            self.state = State::BogusDOCTYPE;
                        }
                    }
                }
                State::BetweenDOCTYPEPublicAndSystemIdentifiers => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        Ch('"') => {
                            self.set_system_identifier(String::new());
                            self.state = State::DOCTYPESystemIdentifierDoubleQuoted;
                        }
                        Ch('\'') => {
                            self.set_system_identifier(String::new());
                            self.state = State::DOCTYPESystemIdentifierSingleQuoted;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.parse_error("missing-quote-before-doctype-system-identifier", loc);
                            self.set_quirks_mode();
                            self.stream_prev();
                            self.state = State::BogusDOCTYPE;
                        }
                    }
                }
                State::AfterDOCTYPESystemKeyword => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {
                            self.state = State::BeforeDOCTYPESystemIdentifier;
                        }
                        Ch('"') => {
                            self.parse_error("missing-whitespace-after-doctype-system-keyword", loc);
                            self.set_system_identifier(String::new());
                            self.state = State::DOCTYPESystemIdentifierDoubleQuoted;
                        }
                        Ch('\'') => {
                            self.parse_error("missing-whitespace-after-doctype-system-keyword", loc);
                            self.set_system_identifier(String::new());
                            self.state = State::DOCTYPESystemIdentifierSingleQuoted;
                        }
                        Ch('>') => {
                            self.parse_error("missing-doctype-system-identifier", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.parse_error("missing-quote-before-doctype-system-identifier", loc);
                            self.set_quirks_mode();
                            self.stream_prev();
                            self.state = State::BogusDOCTYPE;
                        }
                    }
                }
                State::BeforeDOCTYPESystemIdentifier => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch('"') => {
                            self.set_system_identifier(String::new());
                            self.state = State::DOCTYPESystemIdentifierDoubleQuoted;
                        }
                        Ch('\'') => {
                            self.set_system_identifier(String::new());
                            self.state = State::DOCTYPESystemIdentifierSingleQuoted;
                        }
                        Ch('>') => {
                            self.parse_error("missing-doctype-system-identifier", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.parse_error("missing-quote-before-doctype-system-identifier", loc);
                            self.set_quirks_mode();
                            self.stream_prev();
                            self.state = State::BogusDOCTYPE;
                        }
                    }
                }
                State::DOCTYPESystemIdentifierDoubleQuoted => {
                    if let Some(next_state) = self.handle_doctype_identifier('"', false, State::AfterDOCTYPESystemIdentifier)? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::DOCTYPESystemIdentifierSingleQuoted => {
                    if let Some(next_state) = self.handle_doctype_identifier('\'', false, State::AfterDOCTYPESystemIdentifier)? {
                        self.state = next_state;
                    } else {
                        return Ok(());
                    }
                }
                State::AfterDOCTYPESystemIdentifier => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-doctype", loc);
                            self.set_quirks_mode();
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {
                            self.parse_error("unexpected-character-after-doctype-system-identifier", loc);
                            self.stream_prev();
                            self.state = State::BogusDOCTYPE;
                        }
                    }
                }
                State::BogusDOCTYPE => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch('>') => {
                            self.emit_current_token();
                            self.state = State::Data;
                        }
                        Ch(CHAR_NUL) => self.parse_error("unexpected-null-character", loc),
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.emit_current_token();
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(_) => {}
                    }
                }
                State::CDATASection => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(']') => self.state = State::CDATASectionBracket,
                        StreamEmpty => return Ok(()),
                        StreamEnd => {
                            self.parse_error("eof-in-cdata", loc);
                            self.emit_token(Token::Eof { location: loc });
                        }
                        Ch(c) => self.consume(c),
                    }
                }
                State::CDATASectionBracket => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(']') => self.state = State::CDATASectionEnd,
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume(']');
                            self.stream_prev_on_char(c);
                            self.state = State::CDATASection;
                        }
                    }
                }
                State::CDATASectionEnd => {
                    let c = self.stream_read_and_next();
                    match c {
                        Ch(']') => self.consume(']'),
                        Ch('>') => self.state = State::Data,
                        StreamEmpty => return Ok(()),
                        _ => {
                            self.consume(']');
                            self.consume(']');
                            self.stream_prev_on_char(c);
                            self.state = State::CDATASection;
                        }
                    }
                }
            }
        }
    }

    /// Shared handler for the RCDATA / RAWTEXT / script data end tag name
    /// states. Returns the next state, or None when the stream starved.
    fn handle_raw_end_tag_name(&mut self, return_state: State) -> Result<Option<State>> {
        let c = self.stream_read_and_next();
        match c {
            Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) if self.is_appropriate_end_token() => {
                Ok(Some(State::BeforeAttributeName))
            }
            Ch('/') if self.is_appropriate_end_token() => Ok(Some(State::SelfClosingStart)),
            Ch('>') if self.is_appropriate_end_token() => {
                self.emit_current_token();
                Ok(Some(State::Data))
            }
            Ch(ch) if ch.is_ascii_alphabetic() => {
                self.add_to_token_name(ch.to_ascii_lowercase());
                self.temporary_buffer.push(ch);
                Ok(Some(self.state))
            }
            StreamEmpty => Ok(None),
            _ => {
                self.current_token = None;
                self.consume('<');
                self.consume('/');
                let buffer = std::mem::take(&mut self.temporary_buffer);
                for ch in buffer.chars() {
                    self.consume(ch);
                }
                self.stream_prev_on_char(c);
                Ok(Some(return_state))
            }
        }
    }

    /// Dispatches on what follows `<!`. Returns the next state, or None when
    /// the open stream does not yet hold enough characters to decide.
    fn handle_markup_declaration_open(&mut self) -> Result<Option<State>> {
        let chars = self.stream.get_slice(7);
        let prefix: String = chars.iter().take_while(|c| matches!(c, Ch(_))).map(|c| char::from(*c)).collect();

        if prefix.starts_with("--") {
            self.stream_next_n(2);
            self.current_token = Some(Token::Comment {
                comment: String::new(),
                location: self.current_location,
            });
            return Ok(Some(State::CommentStart));
        }

        if prefix.len() >= 7 && prefix[0..7].eq_ignore_ascii_case("doctype") {
            self.stream_next_n(7);
            return Ok(Some(State::DOCTYPE));
        }

        if prefix.len() >= 7 && &prefix[0..7] == "[CDATA[" {
            self.stream_next_n(7);

            if self.parser_data.adjusted_node_namespace != HTML_NAMESPACE {
                return Ok(Some(State::CDATASection));
            }

            self.parse_error("cdata-in-html-content", self.get_location());
            self.current_token = Some(Token::Comment {
                comment: "[CDATA[".to_owned(),
                location: self.current_location,
            });
            return Ok(Some(State::BogusComment));
        }

        // With an open stream a short prefix may still grow into one of the
        // keywords above
        if !self.stream.closed() && prefix.len() < 7 {
            let lower = prefix.to_ascii_lowercase();
            if "doctype".starts_with(&lower) || "[CDATA[".starts_with(&prefix) || prefix == "-" {
                return Ok(None);
            }
        }

        self.parse_error("incorrectly-opened-comment", self.get_location());
        self.current_token = Some(Token::Comment {
            comment: String::new(),
            location: self.current_location,
        });
        Ok(Some(State::BogusComment))
    }

    /// Matches the PUBLIC / SYSTEM keyword after the doctype name. Returns
    /// the next state, or None when the open stream starved.
    fn handle_after_doctype_name_keyword(&mut self) -> Result<Option<State>> {
        let chars = self.stream.get_slice(6);
        let prefix: String = chars.iter().take_while(|c| matches!(c, Ch(_))).map(|c| char::from(*c)).collect();

        if prefix.len() >= 6 && prefix[0..6].eq_ignore_ascii_case("public") {
            self.stream_next_n(6);
            return Ok(Some(State::AfterDOCTYPEPublicKeyword));
        }
        if prefix.len() >= 6 && prefix[0..6].eq_ignore_ascii_case("system") {
            self.stream_next_n(6);
            return Ok(Some(State::AfterDOCTYPESystemKeyword));
        }

        if !self.stream.closed() && prefix.len() < 6 {
            let lower = prefix.to_ascii_lowercase();
            if "public".starts_with(&lower) || "system".starts_with(&lower) {
                return Ok(None);
            }
        }

        self.parse_error("invalid-character-sequence-after-doctype-name", self.get_location());
        self.set_quirks_mode();
        Ok(Some(State::BogusDOCTYPE))
    }

    /// Shared handler for the four quoted doctype identifier states
    fn handle_doctype_identifier(&mut self, quote: char, public: bool, after_state: State) -> Result<Option<State>> {
        let loc = self.get_location();
        let c = self.stream_read_and_next();
        match c {
            Ch(ch) if ch == quote => Ok(Some(after_state)),
            Ch(CHAR_NUL) => {
                self.parse_error("unexpected-null-character", loc);
                self.add_to_identifier(CHAR_REPLACEMENT, public);
                Ok(Some(self.state))
            }
            Ch('>') => {
                if public {
                    self.parse_error("abrupt-doctype-public-identifier", loc);
                } else {
                    self.parse_error("abrupt-doctype-system-identifier", loc);
                }
                self.set_quirks_mode();
                self.emit_current_token();
                Ok(Some(State::Data))
            }
            StreamEmpty => Ok(None),
            StreamEnd => {
                self.parse_error("eof-in-doctype", loc);
                self.set_quirks_mode();
                self.emit_current_token();
                self.emit_token(Token::Eof { location: loc });
                Ok(Some(State::Data))
            }
            Ch(c) => {
                self.add_to_identifier(c, public);
                Ok(Some(self.state))
            }
        }
    }

    /// Reads the current character and advances, keeping the location handler
    /// in sync
    pub(crate) fn stream_read_and_next(&mut self) -> Character {
        let c = self.stream.read_and_next();
        self.location_handler.inc(c);
        c
    }

    /// Steps back one character, keeping the location handler in sync
    pub(crate) fn stream_prev(&mut self) {
        self.stream.prev();
        self.location_handler.dec();
    }

    /// Steps back only when the given read result actually consumed a
    /// character
    fn stream_prev_on_char(&mut self, c: Character) {
        if matches!(c, Ch(_)) {
            self.stream_prev();
        }
    }

    pub(crate) fn stream_prev_n(&mut self, n: usize) {
        for _ in 0..n {
            self.stream_prev();
        }
    }

    pub(crate) fn stream_next_n(&mut self, n: usize) {
        for _ in 0..n {
            let c = self.stream.read_and_next();
            self.location_handler.inc(c);
        }
    }

    /// Appends a character to the text buffer
    pub(crate) fn consume(&mut self, c: char) {
        if self.consumed.is_empty() {
            // Location of a text token is the location of its first character
            let mut loc = self.get_location();
            if loc.offset > 0 {
                loc.offset -= 1;
                loc.column = loc.column.saturating_sub(1).max(1);
            }
            self.text_location = loc;
        }
        self.consumed.push(c);
    }

    /// Queues the buffered text as a single token, if any
    fn flush_text(&mut self) {
        if self.consumed.is_empty() {
            return;
        }
        let token = Token::Text {
            text: std::mem::take(&mut self.consumed),
            location: self.text_location,
        };
        self.token_queue.push(token);
    }

    /// Queues a completed token, flushing buffered text first so text always
    /// precedes the token that terminated it
    fn emit_token(&mut self, token: Token) {
        self.flush_text();
        self.token_queue.push(token);
    }

    /// Completes and queues the token under construction
    fn emit_current_token(&mut self) {
        let Some(mut token) = self.current_token.take() else {
            return;
        };

        match &mut token {
            Token::StartTag { name, attributes, .. } => {
                self.store_and_clear_current_attribute();
                for (attr_name, attr_value) in std::mem::take(&mut self.current_attrs) {
                    attributes.insert(&attr_name, &attr_value);
                }
                self.last_start_token = name.clone();
            }
            Token::EndTag { .. } => {
                self.store_and_clear_current_attribute();
                if !self.current_attrs.is_empty() {
                    self.parse_error("end-tag-with-attributes", self.get_location());
                    self.current_attrs.clear();
                }
            }
            _ => {}
        }

        self.emit_token(token);
    }

    fn add_to_token_name(&mut self, c: char) {
        match &mut self.current_token {
            Some(Token::StartTag { name, .. } | Token::EndTag { name, .. }) => name.push(c),
            Some(Token::DocType { name, .. }) => name.get_or_insert_with(String::new).push(c),
            _ => {}
        }
    }

    fn add_to_token_value(&mut self, c: char) {
        if let Some(Token::Comment { comment, .. }) = &mut self.current_token {
            comment.push(c);
        }
    }

    fn add_to_identifier(&mut self, c: char, public: bool) {
        if let Some(Token::DocType {
            pub_identifier,
            sys_identifier,
            ..
        }) = &mut self.current_token
        {
            let target = if public { pub_identifier } else { sys_identifier };
            target.get_or_insert_with(String::new).push(c);
        }
    }

    fn set_public_identifier(&mut self, value: String) {
        if let Some(Token::DocType { pub_identifier, .. }) = &mut self.current_token {
            *pub_identifier = Some(value);
        }
    }

    fn set_system_identifier(&mut self, value: String) {
        if let Some(Token::DocType { sys_identifier, .. }) = &mut self.current_token {
            *sys_identifier = Some(value);
        }
    }

    fn set_quirks_mode(&mut self) {
        if let Some(Token::DocType { force_quirks, .. }) = &mut self.current_token {
            *force_quirks = true;
        }
    }

    fn set_self_closing(&mut self) {
        if let Some(Token::StartTag { is_self_closing, .. } | Token::EndTag { is_self_closing, .. }) =
            &mut self.current_token
        {
            *is_self_closing = true;
        }
    }

    /// Stores the attribute under construction on the pending list, unless a
    /// same-named attribute already exists
    fn store_and_clear_current_attribute(&mut self) {
        if self.current_attr_name.is_empty() {
            return;
        }

        if self.current_attrs.iter().any(|(name, _)| name == &self.current_attr_name) {
            self.parse_error("duplicate-attribute", self.get_location());
        } else {
            self.current_attrs.push((
                std::mem::take(&mut self.current_attr_name),
                std::mem::take(&mut self.current_attr_value),
            ));
        }

        self.current_attr_name.clear();
        self.current_attr_value.clear();
    }

    fn is_appropriate_end_token(&self) -> bool {
        if let Some(Token::EndTag { name, .. }) = &self.current_token {
            return name == &self.last_start_token;
        }
        false
    }

    pub(crate) fn parse_error(&mut self, message: &str, location: Location) {
        self.error_logger.borrow_mut().add_error(location, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn tokenize(input: &str) -> Vec<Token> {
        let mut stream = ByteStream::new(None);
        stream.read_from_str(input);
        stream.close();

        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(&mut stream, error_logger, Location::default());

        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.next_token(ParserData::default()).unwrap().unwrap();
            let eof = token.is_eof();
            tokens.push(token);
            if eof {
                break;
            }
        }
        tokens
    }

    fn strings(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(ToString::to_string).collect()
    }

    #[test_case("<div>", &["<div>", "EOF"]; "simple start tag")]
    #[test_case("</div>", &["</div>", "EOF"]; "simple end tag")]
    #[test_case("<br/>", &["<br />", "EOF"]; "self closing")]
    #[test_case("<DIV>", &["<div>", "EOF"]; "tag name lowercased")]
    #[test_case("<p class=\"a\">", &["<p class=\"a\">", "EOF"]; "double quoted attribute")]
    #[test_case("<p class='a'>", &["<p class=\"a\">", "EOF"]; "single quoted attribute")]
    #[test_case("<p class=a>", &["<p class=\"a\">", "EOF"]; "unquoted attribute")]
    #[test_case("<p CLASS=a>", &["<p class=\"a\">", "EOF"]; "attribute name lowercased")]
    #[test_case("<p a=1 a=2>", &["<p a=\"1\">", "EOF"]; "duplicate attribute dropped")]
    #[test_case("<!-- hi -->", &["<!--  hi  -->", "EOF"]; "comment")]
    #[test_case("<!---->", &["<!--  -->", "EOF"]; "empty comment")]
    #[test_case("hello", &["hello", "EOF"]; "plain text")]
    #[test_case("a<b>c", &["a", "<b>", "c", "EOF"]; "text between tags")]
    #[test_case("<!DOCTYPE html>", &["<!DOCTYPE html />", "EOF"]; "doctype")]
    #[test_case("<!doctype HTML>", &["<!DOCTYPE html />", "EOF"]; "doctype case insensitive")]
    fn tokenize_cases(input: &str, expected: &[&str]) {
        assert_eq!(strings(&tokenize(input)), expected);
    }

    #[test]
    fn text_is_coalesced_into_one_token() {
        let tokens = tokenize("foo &amp; bar");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], Token::Text {
            text: "foo & bar".to_owned(),
            location: Location::default(),
        });
    }

    #[test]
    fn doctype_with_public_identifier() {
        let tokens = tokenize("<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\">");
        assert_eq!(
            tokens[0],
            Token::DocType {
                name: Some("html".to_owned()),
                force_quirks: false,
                pub_identifier: Some("-//W3C//DTD HTML 4.01//EN".to_owned()),
                sys_identifier: None,
                location: Location::default(),
            }
        );
    }

    #[test]
    fn attribute_order_is_preserved() {
        let tokens = tokenize("<a z=1 m=2 a=3>");
        let Token::StartTag { attributes, .. } = &tokens[0] else {
            panic!("expected a start tag");
        };
        let names: Vec<&str> = attributes.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["z", "m", "a"]);
    }

    #[test]
    fn script_data_swallows_markup() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("foo <b>bar</b></script>");
        stream.close();

        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(&mut stream, error_logger, Location::default());
        tokenizer.state = State::ScriptData;
        tokenizer.set_last_start_tag("script");

        let token = tokenizer.next_token(ParserData::default()).unwrap().unwrap();
        assert_eq!(token.to_string(), "foo <b>bar</b>");
        let token = tokenizer.next_token(ParserData::default()).unwrap().unwrap();
        assert_eq!(token.to_string(), "</script>");
    }

    #[test]
    fn rcdata_decodes_entities() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("a &amp; b</title>");
        stream.close();

        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(&mut stream, error_logger, Location::default());
        tokenizer.state = State::RCDATA;
        tokenizer.set_last_start_tag("title");

        let token = tokenizer.next_token(ParserData::default()).unwrap().unwrap();
        assert_eq!(token.to_string(), "a & b");
    }

    #[test]
    fn starved_tag_resumes() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("<di");

        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(&mut stream, error_logger, Location::default());

        assert!(tokenizer.next_token(ParserData::default()).unwrap().is_none());

        tokenizer.append_str("v class=x>text");
        assert_eq!(
            tokenizer.next_token(ParserData::default()).unwrap().unwrap().to_string(),
            "<div class=\"x\">"
        );

        // Text stays buffered until the stream closes
        assert!(tokenizer.next_token(ParserData::default()).unwrap().is_none());
        tokenizer.close();
        assert_eq!(tokenizer.next_token(ParserData::default()).unwrap().unwrap().to_string(), "text");
    }

    #[test]
    fn starved_markup_declaration_resumes() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("<!DOC");

        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(&mut stream, error_logger, Location::default());

        assert!(tokenizer.next_token(ParserData::default()).unwrap().is_none());

        tokenizer.append_str("TYPE html>");
        tokenizer.close();
        assert_eq!(
            tokenizer.next_token(ParserData::default()).unwrap().unwrap().to_string(),
            "<!DOCTYPE html />"
        );
    }

    #[test]
    fn crlf_is_normalized() {
        let tokens = tokenize("a\r\nb\rc");
        assert_eq!(tokens[0].to_string(), "a\nb\nc");
    }
}
