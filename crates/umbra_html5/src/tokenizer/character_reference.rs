extern crate lazy_static;

use crate::tokenizer::entities::{TOKEN_NAMED_CHARS, TOKEN_REPLACEMENTS};
use crate::tokenizer::{Tokenizer, CHAR_REPLACEMENT};
use lazy_static::lazy_static;
use umbra_shared::byte_stream::Character::Ch;
use umbra_shared::byte_stream::{Character, Stream};

/// Different states for the character references
pub enum CcrState {
    CharacterReference,
    NamedCharacterReference,
    AmbiguousAmpersand,
    NumericCharacterReference,
    HexadecimalCharacterReferenceStart,
    DecimalCharacterReferenceStart,
    HexadecimalCharacterReference,
    DecimalCharacterReference,
    NumericalCharacterReferenceEnd,
}

impl Tokenizer<'_> {
    /// Consumes a character reference and places the result in the tokenizer
    /// consume buffer (or the current attribute value).
    ///
    /// Returns false when the stream ran dry before the reference could be
    /// resolved; in that case every consumed character is pushed back and the
    /// buffers are restored, so the caller can retry once more input arrives.
    pub fn consume_character_reference(&mut self, _additional_allowed_char: Option<Character>, as_attribute: bool) -> bool {
        let mut ccr_state = CcrState::CharacterReference;
        let mut char_ref_code: Option<u32> = Some(0);

        // Everything needed to unwind the whole attempt on starvation
        let mut chars_consumed = 0_usize;
        let consumed_mark = self.consumed.len();
        let attr_value_mark = self.current_attr_value.len();

        macro_rules! starve {
            () => {{
                self.stream_prev_n(chars_consumed);
                self.consumed.truncate(consumed_mark);
                self.current_attr_value.truncate(attr_value_mark);
                self.temporary_buffer.clear();
                return false;
            }};
        }

        loop {
            match ccr_state {
                CcrState::CharacterReference => {
                    self.temporary_buffer.clear();
                    self.temporary_buffer.push('&');

                    let c = self.stream_read_and_next();
                    match c {
                        Character::StreamEmpty => starve!(),
                        Ch(ch) if ch.is_ascii_alphanumeric() => {
                            self.stream_prev();
                            if self.entity_lookahead_starved() {
                                starve!();
                            }
                            ccr_state = CcrState::NamedCharacterReference;
                        }
                        Ch(c @ '#') => {
                            chars_consumed += 1;
                            self.temporary_buffer.push(c);
                            ccr_state = CcrState::NumericCharacterReference;
                        }
                        Character::StreamEnd => {
                            self.consume_temp_buffer(as_attribute);
                            return true;
                        }
                        _ => {
                            self.consume_temp_buffer(as_attribute);
                            self.stream_prev();
                            return true;
                        }
                    }
                }
                CcrState::NamedCharacterReference => {
                    if let Some(entity) = self.find_entity() {
                        self.stream_next_n(entity.chars().count());
                        let c = self.stream.look_ahead(0);

                        if as_attribute
                            && !entity.ends_with(';')
                            && (c == Ch('=') || matches!(c, Ch(c) if c.is_ascii_alphanumeric()))
                        {
                            // For historical reasons the code points are
                            // flushed as is
                            for c in entity.chars() {
                                self.temporary_buffer.push(c);
                            }

                            self.consume_temp_buffer(as_attribute);
                            return true;
                        }

                        let entity_chars = *TOKEN_NAMED_CHARS.get(entity.as_str()).unwrap();

                        // Flush code points consumed as character reference
                        for c in entity_chars.chars() {
                            if as_attribute {
                                self.current_attr_value.push(c);
                            } else {
                                self.consume(c);
                            }
                        }
                        self.temporary_buffer.clear();

                        if !entity.ends_with(';') {
                            self.parse_error("missing-semicolon-after-character-reference", self.get_location());
                        }

                        return true;
                    }

                    self.consume_temp_buffer(as_attribute);
                    ccr_state = CcrState::AmbiguousAmpersand;
                }
                CcrState::AmbiguousAmpersand => {
                    let c = self.stream_read_and_next();
                    match c {
                        Character::StreamEmpty => starve!(),
                        Ch(ch) if ch.is_ascii_alphanumeric() => {
                            chars_consumed += 1;
                            if as_attribute {
                                self.current_attr_value.push(ch);
                            } else {
                                self.consume(ch);
                            }
                        }
                        Ch(';') => {
                            self.stream_prev();
                            self.parse_error("unknown-named-character-reference", self.get_location());
                            return true;
                        }
                        Character::StreamEnd => return true,
                        _ => {
                            self.stream_prev();
                            return true;
                        }
                    }
                }
                CcrState::NumericCharacterReference => {
                    char_ref_code = Some(0);

                    let c = self.stream_read_and_next();
                    match c {
                        Character::StreamEmpty => starve!(),
                        Ch(c @ ('X' | 'x')) => {
                            chars_consumed += 1;
                            self.temporary_buffer.push(c);
                            ccr_state = CcrState::HexadecimalCharacterReferenceStart;
                        }
                        Character::StreamEnd => {
                            ccr_state = CcrState::DecimalCharacterReferenceStart;
                        }
                        _ => {
                            self.stream_prev();
                            ccr_state = CcrState::DecimalCharacterReferenceStart;
                        }
                    }
                }
                CcrState::HexadecimalCharacterReferenceStart => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Character::StreamEmpty => starve!(),
                        Ch('0'..='9' | 'A'..='F' | 'a'..='f') => {
                            self.stream_prev();
                            ccr_state = CcrState::HexadecimalCharacterReference;
                        }
                        Character::StreamEnd => {
                            self.parse_error("absence-of-digits-in-numeric-character-reference", loc);
                            self.consume_temp_buffer(as_attribute);
                            return true;
                        }
                        _ => {
                            self.parse_error("absence-of-digits-in-numeric-character-reference", loc);
                            self.consume_temp_buffer(as_attribute);

                            self.stream_prev();
                            return true;
                        }
                    }
                }
                CcrState::DecimalCharacterReferenceStart => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Character::StreamEmpty => starve!(),
                        Ch('0'..='9') => {
                            self.stream_prev();
                            ccr_state = CcrState::DecimalCharacterReference;
                        }
                        Character::StreamEnd => {
                            self.parse_error("absence-of-digits-in-numeric-character-reference", loc);
                            self.consume_temp_buffer(as_attribute);
                            return true;
                        }
                        _ => {
                            self.parse_error("absence-of-digits-in-numeric-character-reference", loc);
                            self.consume_temp_buffer(as_attribute);

                            self.stream_prev();
                            return true;
                        }
                    }
                }
                CcrState::HexadecimalCharacterReference => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Character::StreamEmpty => starve!(),
                        Ch(c @ '0'..='9') => {
                            chars_consumed += 1;
                            let i = c as u32 - 0x30;
                            if let Some(value) = char_ref_code {
                                char_ref_code = value.checked_mul(16).and_then(|mul_result| mul_result.checked_add(i));
                            }
                        }
                        Ch(c @ 'A'..='F') => {
                            chars_consumed += 1;
                            let i = c as u32 - 0x37;
                            if let Some(value) = char_ref_code {
                                char_ref_code = value.checked_mul(16).and_then(|mul_result| mul_result.checked_add(i));
                            }
                        }
                        Ch(c @ 'a'..='f') => {
                            chars_consumed += 1;
                            let i = c as u32 - 0x57;
                            if let Some(value) = char_ref_code {
                                char_ref_code = value.checked_mul(16).and_then(|mul_result| mul_result.checked_add(i));
                            }
                        }
                        Ch(';') => {
                            ccr_state = CcrState::NumericalCharacterReferenceEnd;
                        }
                        Character::StreamEnd => {
                            self.parse_error("missing-semicolon-after-character-reference", loc);
                            ccr_state = CcrState::NumericalCharacterReferenceEnd;
                        }
                        _ => {
                            self.parse_error("missing-semicolon-after-character-reference", loc);
                            self.stream_prev();
                            ccr_state = CcrState::NumericalCharacterReferenceEnd;
                        }
                    }
                }
                CcrState::DecimalCharacterReference => {
                    let loc = self.get_location();
                    let c = self.stream_read_and_next();
                    match c {
                        Character::StreamEmpty => starve!(),
                        Ch(c @ '0'..='9') => {
                            chars_consumed += 1;
                            let i = c as u32 - 0x30;
                            if let Some(value) = char_ref_code {
                                char_ref_code = value.checked_mul(10).and_then(|mul_result| mul_result.checked_add(i));
                            }
                        }
                        Ch(';') => {
                            ccr_state = CcrState::NumericalCharacterReferenceEnd;
                        }
                        Character::StreamEnd => {
                            self.parse_error("missing-semicolon-after-character-reference", loc);
                            ccr_state = CcrState::NumericalCharacterReferenceEnd;
                        }
                        _ => {
                            self.parse_error("missing-semicolon-after-character-reference", loc);
                            ccr_state = CcrState::NumericalCharacterReferenceEnd;
                            self.stream_prev();
                        }
                    }
                }
                CcrState::NumericalCharacterReferenceEnd => {
                    let overflow = char_ref_code.is_none();
                    let mut char_ref_code = char_ref_code.unwrap_or(0);

                    if char_ref_code == 0 && !overflow {
                        self.parse_error("null-character-reference", self.get_location());
                        char_ref_code = CHAR_REPLACEMENT as u32;
                    }

                    if char_ref_code > 0x0010_FFFF || overflow {
                        self.parse_error("character-reference-outside-unicode-range", self.get_location());
                        char_ref_code = CHAR_REPLACEMENT as u32;
                    }

                    if self.is_surrogate(char_ref_code) {
                        self.parse_error("surrogate-character-reference", self.get_location());
                        char_ref_code = CHAR_REPLACEMENT as u32;
                    }
                    if self.is_noncharacter(char_ref_code) {
                        self.parse_error("noncharacter-character-reference", self.get_location());
                    }
                    if self.is_control_char(char_ref_code) || char_ref_code == 0x0D {
                        self.parse_error("control-character-reference", self.get_location());

                        if let Some(replacement) = TOKEN_REPLACEMENTS.get(&char_ref_code) {
                            char_ref_code = *replacement as u32;
                        }
                    }

                    self.temporary_buffer.clear();
                    let c = char::from_u32(char_ref_code).unwrap_or(CHAR_REPLACEMENT);
                    self.temporary_buffer.push(c);
                    self.consume_temp_buffer(as_attribute);

                    return true;
                }
            }
        }
    }

    fn consume_temp_buffer(&mut self, as_attribute: bool) {
        if as_attribute {
            self.current_attr_value.push_str(&self.temporary_buffer);
        } else {
            let buffer = self.temporary_buffer.clone();
            self.consumed.push_str(&buffer);
        }
        self.temporary_buffer.clear();
    }

    pub(crate) fn is_surrogate(&self, num: u32) -> bool {
        (0xD800..=0xDFFF).contains(&num)
    }

    pub(crate) fn is_noncharacter(&self, num: u32) -> bool {
        (0xFDD0..=0xFDEF).contains(&num)
            || [
                0xFFFE, 0xFFFF, 0x1FFFE, 0x1FFFF, 0x2FFFE, 0x2FFFF, 0x3FFFE, 0x3FFFF, 0x4FFFE, 0x4FFFF, 0x5FFFE,
                0x5FFFF, 0x6FFFE, 0x6FFFF, 0x7FFFE, 0x7FFFF, 0x8FFFE, 0x8FFFF, 0x9FFFE, 0x9FFFF, 0xAFFFE, 0xAFFFF,
                0xBFFFE, 0xBFFFF, 0xCFFFE, 0xCFFFF, 0xDFFFE, 0xDFFFF, 0xEFFFE, 0xEFFFF, 0xFFFFE, 0xFFFFF, 0x10FFFE,
                0x10FFFF,
            ]
            .contains(&num)
    }

    pub(crate) fn is_control_char(&self, num: u32) -> bool {
        // White spaces are ok
        if [0x0009, 0x000A, 0x000C, 0x000D, 0x0020].contains(&num) {
            return false;
        }

        (0x0001..=0x001F).contains(&num) || (0x007F..=0x009F).contains(&num)
    }

    /// True when more input could still change the outcome of the named
    /// entity lookup. A semicolon in the lookahead always settles it, since
    /// no entity name extends past one.
    fn entity_lookahead_starved(&self) -> bool {
        if self.stream.closed() {
            return false;
        }
        let chars = self.stream.get_slice(*LONGEST_ENTITY_LENGTH);
        if !chars.contains(&Character::StreamEmpty) {
            return false;
        }
        !chars.iter().any(|c| matches!(c, Ch(';')))
    }

    /// Finds the longest entity from the current position in the stream.
    /// Returns the matched entity name OR None when no entity has been found.
    fn find_entity(&mut self) -> Option<String> {
        let chars = self.stream.get_slice(*LONGEST_ENTITY_LENGTH);

        for i in (0..=chars.len()).rev() {
            if let Some(slice) = chars.get(0..i) {
                if slice.iter().any(|c| !matches!(c, Ch(_))) {
                    continue;
                }
                let entity: String = slice.iter().map(|c| char::from(*c)).collect();
                if TOKEN_NAMED_CHARS.contains_key(entity.as_str()) {
                    return Some(entity);
                }
            }
        }

        None
    }
}

lazy_static! {
    // Longest key in the TOKEN_NAMED_CHARS map
    static ref LONGEST_ENTITY_LENGTH: usize = {
        TOKEN_NAMED_CHARS.keys().map(|key| key.len()).max().unwrap_or(0)
    };
}

#[cfg(test)]
mod tests {
    use crate::errors::ErrorLogger;
    use crate::parser::ParserData;
    use crate::tokenizer::Tokenizer;
    use std::cell::RefCell;
    use std::rc::Rc;
    use umbra_shared::byte_stream::{ByteStream, Location, Stream};

    macro_rules! entity_tests {
        ($($name:ident : $value:expr)*) => {
            $(
                #[test]
                fn $name() {
                    let (input, expected) = $value;

                    let mut stream = ByteStream::new(None);
                    stream.read_from_str(input);
                    stream.close();

                    let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
                    let mut tokenizer = Tokenizer::new(&mut stream, error_logger.clone(), Location::default());

                    let token = tokenizer.next_token(ParserData::default()).unwrap().unwrap();
                    assert_eq!(expected, token.to_string());
                }
            )*
        }
    }

    entity_tests! {
        // Numbers
        entity_0: ("&#10;", "\n")
        entity_1: ("&#0;", "\u{fffd}")
        entity_2: ("&#x0;", "\u{fffd}")
        entity_3: ("&#xdeadbeef;", "\u{fffd}")
        entity_4: ("&#xd888;", "\u{fffd}")
        entity_5: ("&#xbeef;", "\u{beef}")
        entity_6: ("&#x10;", "\u{10}")
        entity_7: ("&#;", "&#;")
        entity_8: ("&;", "&;")
        entity_9: ("&", "&")
        entity_10: ("&#x1;", "\u{1}")
        entity_11: ("&#x0008;", "\u{8}")
        entity_12: ("&#0008;", "\u{8}")
        entity_13: ("&#8;", "\u{8}")
        entity_14: ("&#x0009;", "\t")
        entity_15: ("&#x007F;", "\u{7f}")
        entity_16: ("&#x80;", "\u{20ac}")
        entity_17: ("&#x82;", "\u{201a}")
        entity_18: ("&#X8c;", "\u{0152}")
        entity_19: ("&#x8d;", "\u{8d}")

        // Entities
        entity_100: ("&copy;", "\u{a9}")
        entity_101: ("&copyThing;", "\u{a9}Thing;")
        entity_102: ("&raquo;", "\u{bb}")
        entity_103: ("&laquo;", "\u{ab}")
        entity_104: ("&not;", "\u{ac}")
        entity_105: ("&notit;", "\u{ac}it;")
        entity_106: ("&notin;", "\u{2209}")
        entity_107: ("&fo", "&fo")
        entity_108: ("&xxx", "&xxx")
        entity_109: ("&copy", "\u{a9}")
        entity_110: ("&copy ", "\u{a9} ")
        entity_111: ("&copya", "\u{a9}a")
        entity_112: ("&copya;", "\u{a9}a;")
        entity_113: ("&#169;", "\u{a9}")
        entity_114: ("&copy&", "\u{a9}&")
        entity_115: ("&copya ", "\u{a9}a ")
        entity_116: ("&#169X ", "\u{a9}X ")

        // Punctuation and symbols
        entity_200: ("&amp;", "&")
        entity_201: ("&lt;", "<")
        entity_202: ("&gt;", ">")
        entity_203: ("&quot;", "\"")
        entity_204: ("&apos;", "'")
        entity_205: ("&unknown;", "&unknown;")
        entity_206: ("&#60;", "<")
        entity_207: ("&#x3C;", "<")
        entity_208: ("&euro;", "\u{20ac}")
        entity_209: ("&reg;", "\u{ae}")
        entity_210: ("&#174;", "\u{ae}")
        entity_211: ("&#xAE;", "\u{ae}")
        entity_212: ("&#34;", "\"")
        entity_213: ("&#x22;", "\"")
        entity_214: ("&#39;", "'")
        entity_215: ("&#x27;", "'")
        entity_216: ("&excl;", "!")
        entity_217: ("&num;", "#")
        entity_218: ("&dollar;", "$")
        entity_219: ("&percnt;", "%")
        entity_220: ("&ast;", "*")
        entity_221: ("&plus;", "+")
        entity_222: ("&comma;", ",")
        entity_223: ("&minus;", "\u{2212}")
        entity_224: ("&period;", ".")
        entity_225: ("&sol;", "/")
        entity_226: ("&colon;", ":")
        entity_227: ("&semi;", ";")
        entity_228: ("&equals;", "=")
        entity_229: ("&quest;", "?")
        entity_230: ("&commat;", "@")
        entity_231: ("&COPY;", "\u{a9}")
        entity_232: ("&#128;", "\u{20ac}")
        entity_233: ("&#x9F;", "\u{178}")
        entity_234: ("&#31;", "\u{1f}")
        entity_235: ("&#xD800;", "\u{fffd}")
        entity_236: ("&#9999999;", "\u{fffd}")
        entity_237: ("&#11;", "\u{b}")
        entity_238: ("&#12;", "\u{c}")
        entity_239: ("&#13;", "\r")
    }

    #[test]
    fn starved_entity_resumes_after_more_input() {
        let mut stream = ByteStream::new(None);
        stream.read_from_str("&co");

        let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(&mut stream, error_logger.clone(), Location::default());

        // The entity cannot be resolved yet
        assert!(tokenizer.next_token(ParserData::default()).unwrap().is_none());

        tokenizer.append_str("py; done");
        tokenizer.close();

        let token = tokenizer.next_token(ParserData::default()).unwrap().unwrap();
        assert_eq!(token.to_string(), "\u{a9} done");
    }
}
