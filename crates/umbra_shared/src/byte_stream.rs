use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

pub const CHAR_LF: char = '\u{000A}';
pub const CHAR_CR: char = '\u{000D}';

/// A single read result from the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Character {
    /// A decoded character
    Ch(char),
    /// The stream is closed and fully consumed
    StreamEnd,
    /// The buffer is consumed, but the stream is still open: more input may
    /// be appended and reading can resume at the same position
    StreamEmpty,
}

use Character::{Ch, StreamEmpty, StreamEnd};

impl From<Character> for char {
    fn from(c: Character) -> Self {
        match c {
            Ch(c) => c,
            _ => 0 as Self,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ch(ch) => write!(f, "{ch}"),
            StreamEnd => write!(f, "StreamEnd"),
            StreamEmpty => write!(f, "StreamEmpty"),
        }
    }
}

impl Character {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Ch(ch) if ch.is_whitespace())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Ch(ch) if ch.is_numeric())
    }
}

/// Preprocessing configuration. The defaults implement the newline
/// normalization the markup parser expects: CRLF pairs and lone CRs both
/// read as a single LF.
#[derive(Clone, Debug)]
pub struct Config {
    /// Treat a CR LF pair as a single LF
    pub cr_lf_as_one: bool,
    /// Replace a lone CR with LF
    pub replace_cr_as_lf: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cr_lf_as_one: true,
            replace_cr_as_lf: true,
        }
    }
}

/// A cursor over decoded (UTF-8) text. The buffer can stay open so that more
/// input can be appended later; readers observe `StreamEmpty` at the end of
/// an open buffer and `StreamEnd` once the stream has been closed.
pub struct ByteStream {
    /// UTF-8 text buffer
    buffer: Vec<u8>,
    /// Current read position (byte offset). Interior mutability so reads can
    /// advance the cursor through a shared reference.
    buffer_pos: RefCell<usize>,
    /// True when no more input will be appended
    closed: bool,
    config: Config,
}

/// Stream reading interface used by the tokenizer.
pub trait Stream {
    /// Returns the current character without advancing
    fn read(&self) -> Character;
    /// Returns the current character and advances the cursor
    fn read_and_next(&self) -> Character;
    /// Returns the character `offset` characters ahead of the cursor
    fn look_ahead(&self, offset: usize) -> Character;
    /// Advances the cursor one character
    fn next(&self);
    /// Advances the cursor `n` characters
    fn next_n(&self, n: usize);
    /// Moves the cursor back one character
    fn prev(&self);
    /// Moves the cursor back `n` characters
    fn prev_n(&self, n: usize);
    /// Returns up to `len` characters ahead of the cursor without advancing
    fn get_slice(&self, len: usize) -> Vec<Character>;
    /// Current cursor position in bytes
    fn tell_bytes(&self) -> usize;
    /// Sets the cursor position in bytes
    fn seek_bytes(&self, offset: usize);
    /// Resets the cursor to the start of the buffer
    fn reset_stream(&self);
    /// Marks the stream as complete; no more input will be appended
    fn close(&mut self);
    fn closed(&self) -> bool;
    /// True when the cursor is at the end of the current buffer
    fn exhausted(&self) -> bool;
    /// True when the stream is closed and fully consumed
    fn eof(&self) -> bool;
}

impl Default for ByteStream {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ByteStream {
    #[must_use]
    pub fn new(config: Option<Config>) -> Self {
        Self {
            buffer: Vec::new(),
            buffer_pos: RefCell::new(0),
            closed: false,
            config: config.unwrap_or_default(),
        }
    }

    /// Replaces the buffer contents with the given string and rewinds the
    /// cursor. The stream stays open until `close()` is called.
    pub fn read_from_str(&mut self, s: &str) {
        self.buffer = s.as_bytes().to_vec();
        self.reset_stream();
    }

    /// Appends text to an open stream. Reading resumes at the position where
    /// the previous read starved.
    pub fn append_str(&mut self, s: &str) {
        assert!(!self.closed, "cannot append to a closed stream");
        self.buffer.extend_from_slice(s.as_bytes());
    }

    pub fn length(&self) -> usize {
        self.buffer.len()
    }

    /// Decodes the character at the given byte offset. Returns the character
    /// and its width in bytes, or None when the offset is at or beyond the
    /// end of the buffer (including a partially appended code point).
    fn char_at(&self, pos: usize) -> Option<(char, usize)> {
        if pos >= self.buffer.len() {
            return None;
        }
        let width = utf8_char_width(self.buffer[pos]);
        if pos + width > self.buffer.len() {
            // Partial code point at the end of an open buffer
            return None;
        }
        let s = std::str::from_utf8(&self.buffer[pos..pos + width]).ok()?;
        s.chars().next().map(|ch| (ch, width))
    }

    /// Reads the logical character at the given position, applying newline
    /// normalization. Returns the character and the byte width consumed.
    fn logical_char_at(&self, pos: usize) -> LogicalChar {
        let Some((ch, width)) = self.char_at(pos) else {
            return if self.closed {
                LogicalChar::End
            } else {
                LogicalChar::Empty
            };
        };

        if ch == CHAR_CR {
            if self.config.cr_lf_as_one {
                match self.char_at(pos + width) {
                    Some((CHAR_LF, lf_width)) => return LogicalChar::Ch(CHAR_LF, width + lf_width),
                    Some(_) => {}
                    None if !self.closed => {
                        // Cannot decide yet whether a LF follows
                        return LogicalChar::Empty;
                    }
                    None => {}
                }
            }
            if self.config.replace_cr_as_lf {
                return LogicalChar::Ch(CHAR_LF, width);
            }
        }

        LogicalChar::Ch(ch, width)
    }
}

enum LogicalChar {
    Ch(char, usize),
    End,
    Empty,
}

impl Stream for ByteStream {
    fn read(&self) -> Character {
        match self.logical_char_at(*self.buffer_pos.borrow()) {
            LogicalChar::Ch(ch, _) => Ch(ch),
            LogicalChar::End => StreamEnd,
            LogicalChar::Empty => StreamEmpty,
        }
    }

    fn read_and_next(&self) -> Character {
        let pos = *self.buffer_pos.borrow();
        match self.logical_char_at(pos) {
            LogicalChar::Ch(ch, width) => {
                *self.buffer_pos.borrow_mut() = pos + width;
                Ch(ch)
            }
            LogicalChar::End => StreamEnd,
            LogicalChar::Empty => StreamEmpty,
        }
    }

    fn look_ahead(&self, offset: usize) -> Character {
        let mut pos = *self.buffer_pos.borrow();
        let mut remaining = offset;
        loop {
            match self.logical_char_at(pos) {
                LogicalChar::Ch(ch, width) => {
                    if remaining == 0 {
                        return Ch(ch);
                    }
                    pos += width;
                    remaining -= 1;
                }
                LogicalChar::End => return StreamEnd,
                LogicalChar::Empty => return StreamEmpty,
            }
        }
    }

    fn next(&self) {
        self.next_n(1);
    }

    fn next_n(&self, n: usize) {
        for _ in 0..n {
            let pos = *self.buffer_pos.borrow();
            match self.logical_char_at(pos) {
                LogicalChar::Ch(_, width) => *self.buffer_pos.borrow_mut() = pos + width,
                LogicalChar::End | LogicalChar::Empty => return,
            }
        }
    }

    fn prev(&self) {
        self.prev_n(1);
    }

    fn prev_n(&self, n: usize) {
        for _ in 0..n {
            let mut pos = *self.buffer_pos.borrow();
            if pos == 0 {
                return;
            }
            // Step back to the start of the previous code point
            pos -= 1;
            while pos > 0 && (self.buffer[pos] & 0b1100_0000) == 0b1000_0000 {
                pos -= 1;
            }
            // A CRLF pair reads as one logical character
            if self.config.cr_lf_as_one
                && self.buffer[pos] == CHAR_LF as u8
                && pos > 0
                && self.buffer[pos - 1] == CHAR_CR as u8
            {
                pos -= 1;
            }
            *self.buffer_pos.borrow_mut() = pos;
        }
    }

    fn get_slice(&self, len: usize) -> Vec<Character> {
        let mut result = Vec::with_capacity(len);
        for offset in 0..len {
            result.push(self.look_ahead(offset));
        }
        result
    }

    fn tell_bytes(&self) -> usize {
        *self.buffer_pos.borrow()
    }

    fn seek_bytes(&self, offset: usize) {
        *self.buffer_pos.borrow_mut() = offset.min(self.buffer.len());
    }

    fn reset_stream(&self) {
        *self.buffer_pos.borrow_mut() = 0;
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn closed(&self) -> bool {
        self.closed
    }

    fn exhausted(&self) -> bool {
        *self.buffer_pos.borrow() >= self.buffer.len()
    }

    fn eof(&self) -> bool {
        self.closed && self.exhausted()
    }
}

/// Width in bytes of a UTF-8 sequence, derived from its first byte.
fn utf8_char_width(first_byte: u8) -> usize {
    if first_byte < 0x80 {
        1
    } else {
        match first_byte & 0xF0 {
            0xE0 => 3,
            0xF0 => 4,
            _ => 2,
        }
    }
}

/// A position in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    /// Line number, 1-based
    pub line: usize,
    /// Column number, 1-based
    pub column: usize,
    /// Character offset, 0-based
    pub offset: usize,
}

impl Default for Location {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Location {
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps cursor movement onto line/column positions. The tokenizer feeds every
/// consumed character through this handler so emitted tokens carry their
/// source location.
pub struct LocationHandler {
    pub start_location: Location,
    pub cur_location: Location,
    /// Column at which each completed line ended, so the cursor can step back
    /// over a line ending
    line_columns: HashMap<usize, usize>,
}

impl LocationHandler {
    #[must_use]
    pub fn new(start_location: Location) -> Self {
        Self {
            start_location,
            cur_location: start_location,
            line_columns: HashMap::new(),
        }
    }

    pub fn inc(&mut self, ch: Character) {
        if let Ch(ch) = ch {
            self.cur_location.offset += 1;
            if ch == CHAR_LF {
                self.line_columns.insert(self.cur_location.line, self.cur_location.column);
                self.cur_location.line += 1;
                self.cur_location.column = 1;
            } else {
                self.cur_location.column += 1;
            }
        }
    }

    pub fn dec(&mut self) {
        if self.cur_location.offset == 0 {
            return;
        }
        self.cur_location.offset -= 1;
        if self.cur_location.column > 1 {
            self.cur_location.column -= 1;
        } else if self.cur_location.line > 1 {
            self.cur_location.line -= 1;
            self.cur_location.column = self.line_columns.get(&self.cur_location.line).copied().unwrap_or(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_read() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("foo");
        stream.close();

        assert_eq!(stream.read_and_next(), Ch('f'));
        assert_eq!(stream.read_and_next(), Ch('o'));
        assert_eq!(stream.read(), Ch('o'));
        assert_eq!(stream.read_and_next(), Ch('o'));
        assert_eq!(stream.read_and_next(), StreamEnd);
        assert!(stream.eof());
    }

    #[test]
    fn multibyte_characters() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("a❤b");
        stream.close();

        assert_eq!(stream.read_and_next(), Ch('a'));
        assert_eq!(stream.read_and_next(), Ch('❤'));
        assert_eq!(stream.read_and_next(), Ch('b'));
        assert_eq!(stream.read_and_next(), StreamEnd);
    }

    #[test]
    fn prev_over_multibyte() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("a❤b");
        stream.close();

        stream.next_n(2);
        assert_eq!(stream.read(), Ch('b'));
        stream.prev();
        assert_eq!(stream.read(), Ch('❤'));
        stream.prev();
        assert_eq!(stream.read(), Ch('a'));
    }

    #[test]
    fn look_ahead() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("abcd");
        stream.close();

        assert_eq!(stream.look_ahead(0), Ch('a'));
        assert_eq!(stream.look_ahead(3), Ch('d'));
        assert_eq!(stream.look_ahead(4), StreamEnd);
        assert_eq!(stream.tell_bytes(), 0);
    }

    #[test]
    fn crlf_reads_as_single_lf() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("a\r\nb\rc");
        stream.close();

        assert_eq!(stream.read_and_next(), Ch('a'));
        assert_eq!(stream.read_and_next(), Ch('\n'));
        assert_eq!(stream.read_and_next(), Ch('b'));
        assert_eq!(stream.read_and_next(), Ch('\n'));
        assert_eq!(stream.read_and_next(), Ch('c'));
        assert_eq!(stream.read_and_next(), StreamEnd);
    }

    #[test]
    fn open_stream_starves_instead_of_ending() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("ab");

        assert_eq!(stream.read_and_next(), Ch('a'));
        assert_eq!(stream.read_and_next(), Ch('b'));
        assert_eq!(stream.read_and_next(), StreamEmpty);

        stream.append_str("cd");
        assert_eq!(stream.read_and_next(), Ch('c'));
        assert_eq!(stream.read_and_next(), Ch('d'));
        assert_eq!(stream.read_and_next(), StreamEmpty);

        stream.close();
        assert_eq!(stream.read_and_next(), StreamEnd);
    }

    #[test]
    fn trailing_cr_waits_for_more_input() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("a\r");

        assert_eq!(stream.read_and_next(), Ch('a'));
        // Cannot tell yet whether the CR starts a CRLF pair
        assert_eq!(stream.read_and_next(), StreamEmpty);

        stream.append_str("\nb");
        assert_eq!(stream.read_and_next(), Ch('\n'));
        assert_eq!(stream.read_and_next(), Ch('b'));
    }

    #[test]
    fn location_tracking() {
        let mut handler = LocationHandler::new(Location::default());
        for ch in "ab\ncd".chars() {
            handler.inc(Ch(ch));
        }
        assert_eq!(handler.cur_location, Location::new(2, 3, 5));

        handler.dec();
        handler.dec();
        handler.dec();
        assert_eq!(handler.cur_location.line, 1);
        assert_eq!(handler.cur_location.column, 3);
    }

    #[test]
    fn seek_and_tell() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("abcdef");
        stream.close();

        stream.next_n(3);
        let pos = stream.tell_bytes();
        stream.next_n(2);
        stream.seek_bytes(pos);
        assert_eq!(stream.read(), Ch('d'));
    }
}
