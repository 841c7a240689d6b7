use crate::node::data::element::AttrMap;
use core::fmt::{Display, Formatter};
use umbra_shared::byte_stream::Location;

/// The tokens produced by the tokenizer and consumed by the tree builder
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    DocType {
        name: Option<String>,
        force_quirks: bool,
        pub_identifier: Option<String>,
        sys_identifier: Option<String>,
        location: Location,
    },
    StartTag {
        name: String,
        is_self_closing: bool,
        attributes: AttrMap,
        location: Location,
    },
    EndTag {
        name: String,
        is_self_closing: bool,
        location: Location,
    },
    Comment {
        comment: String,
        location: Location,
    },
    Text {
        text: String,
        location: Location,
    },
    Eof {
        location: Location,
    },
}

impl Token {
    pub fn get_location(&self) -> Location {
        match self {
            Token::DocType { location, .. }
            | Token::StartTag { location, .. }
            | Token::EndTag { location, .. }
            | Token::Comment { location, .. }
            | Token::Text { location, .. }
            | Token::Eof { location } => *location,
        }
    }

    pub fn set_location(&mut self, loc: Location) {
        match self {
            Token::DocType { location, .. }
            | Token::StartTag { location, .. }
            | Token::EndTag { location, .. }
            | Token::Comment { location, .. }
            | Token::Text { location, .. }
            | Token::Eof { location } => *location = loc,
        }
    }

    /// Returns true when the token is a text token with mixed white and
    /// non-whitespace characters
    pub fn is_mixed(&self) -> bool {
        if let Token::Text { text: value, .. } = self {
            if value.chars().any(|ch| ch.is_ascii_whitespace()) {
                value.chars().any(|ch| !ch.is_ascii_whitespace())
            } else {
                false
            }
        } else {
            false
        }
    }

    /// Returns true when the token is a text token with both NUL and
    /// non-NUL characters
    pub fn is_mixed_null(&self) -> bool {
        if let Token::Text { text: value, .. } = self {
            value.chars().any(|ch| ch == '\0') && value.chars().any(|ch| ch != '\0')
        } else {
            false
        }
    }

    /// Returns true when the token is a text token consisting of a single NUL
    pub fn is_null(&self) -> bool {
        if let Token::Text { text: value, .. } = self {
            value == "\u{0000}"
        } else {
            false
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Token::Eof { .. })
    }

    /// Returns true when the token is a text token with nothing but whitespace
    pub fn is_empty_or_white(&self) -> bool {
        if let Token::Text { text: value, .. } = self {
            if value.is_empty() {
                return true;
            }
            value.chars().all(|ch| matches!(ch, '\u{0009}' | '\u{000a}' | '\u{000c}' | '\u{000d}' | '\u{0020}'))
        } else {
            false
        }
    }

    pub fn is_start_tag(&self, wanted_name: &str) -> bool {
        if let Token::StartTag { name, .. } = self {
            name == wanted_name
        } else {
            false
        }
    }

    pub fn is_any_start_tag(&self) -> bool {
        matches!(self, Token::StartTag { .. })
    }

    pub fn is_text_token(&self) -> bool {
        matches!(self, Token::Text { .. })
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Token::DocType {
                name,
                pub_identifier,
                sys_identifier,
                ..
            } => {
                write!(f, "<!DOCTYPE {}", name.clone().unwrap_or_default())?;
                if let Some(pub_id) = pub_identifier {
                    write!(f, " PUBLIC \"{pub_id}\"")?;
                }
                if let Some(sys_id) = sys_identifier {
                    write!(f, " SYSTEM \"{sys_id}\"")?;
                }
                write!(f, " />")
            }
            Token::Comment { comment: value, .. } => write!(f, "<!-- {value} -->"),
            Token::Text { text: value, .. } => write!(f, "{value}"),
            Token::StartTag {
                name,
                is_self_closing,
                attributes,
                ..
            } => {
                write!(f, "<{name}")?;
                for (key, value) in attributes.iter() {
                    write!(f, " {key}=\"{value}\"")?;
                }
                if *is_self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Token::EndTag { name, .. } => write!(f, "</{name}>"),
            Token::Eof { .. } => write!(f, "EOF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_display() {
        let token = Token::Text {
            text: "hello".to_owned(),
            location: Location::default(),
        };
        assert_eq!(format!("{token}"), "hello");

        let token = Token::StartTag {
            name: "input".to_owned(),
            is_self_closing: true,
            attributes: AttrMap::from([("type", "text")]),
            location: Location::default(),
        };
        assert_eq!(format!("{token}"), "<input type=\"text\" />");

        let token = Token::EndTag {
            name: "div".to_owned(),
            is_self_closing: false,
            location: Location::default(),
        };
        assert_eq!(format!("{token}"), "</div>");

        let token = Token::Comment {
            comment: "sample".to_owned(),
            location: Location::default(),
        };
        assert_eq!(format!("{token}"), "<!-- sample -->");
    }

    #[test]
    fn is_empty_or_white() {
        let token = Token::Text {
            text: " \t\n ".to_owned(),
            location: Location::default(),
        };
        assert!(token.is_empty_or_white());

        let token = Token::Text {
            text: " a ".to_owned(),
            location: Location::default(),
        };
        assert!(!token.is_empty_or_white());
    }

    #[test]
    fn is_mixed() {
        let token = Token::Text {
            text: " a ".to_owned(),
            location: Location::default(),
        };
        assert!(token.is_mixed());

        let token = Token::Text {
            text: "abc".to_owned(),
            location: Location::default(),
        };
        assert!(!token.is_mixed());

        let token = Token::Text {
            text: "a\0b".to_owned(),
            location: Location::default(),
        };
        assert!(token.is_mixed_null());
    }

    #[test]
    fn start_tag_checks() {
        let token = Token::StartTag {
            name: "div".to_owned(),
            is_self_closing: false,
            attributes: AttrMap::new(),
            location: Location::default(),
        };
        assert!(token.is_start_tag("div"));
        assert!(!token.is_start_tag("span"));
        assert!(token.is_any_start_tag());
        assert!(!token.is_eof());
    }
}
