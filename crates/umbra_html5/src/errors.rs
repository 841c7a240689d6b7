use thiserror::Error;
use umbra_shared::byte_stream::Location;
use umbra_shared::types::ParseError;

/// Well-known tree construction errors with their canonical message codes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParserError {
    #[error("expected-doctype-but-got-start-tag")]
    ExpectedDocTypeButGotStartTag,
    #[error("expected-doctype-but-got-end-tag")]
    ExpectedDocTypeButGotEndTag,
    #[error("expected-doctype-but-got-chars")]
    ExpectedDocTypeButGotChars,
}

/// Parse errors are collected, never fatal: the tokenizer and tree builder
/// report them here and carry on with the recovery path.
#[derive(Debug, Default)]
pub struct ErrorLogger {
    errors: Vec<ParseError>,
}

impl ErrorLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_errors(&self) -> &Vec<ParseError> {
        &self.errors
    }

    pub fn add_error(&mut self, location: Location, message: &str) {
        // Deduplicate errors at the same position; recovery paths can report
        // the same condition from both the tokenizer and the tree builder
        for err in &self.errors {
            if err.location == location && err.message == *message {
                return;
            }
        }

        self.errors.push(ParseError {
            message: message.to_string(),
            location,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_errors() {
        let mut logger = ErrorLogger::new();
        logger.add_error(Location::new(1, 4, 3), "unexpected-null-character");
        logger.add_error(Location::new(2, 1, 10), "eof-in-tag");

        assert_eq!(logger.get_errors().len(), 2);
        assert_eq!(logger.get_errors()[0].message, "unexpected-null-character");
    }

    #[test]
    fn deduplicates_same_position() {
        let mut logger = ErrorLogger::new();
        logger.add_error(Location::new(1, 4, 3), "unexpected-null-character");
        logger.add_error(Location::new(1, 4, 3), "unexpected-null-character");
        logger.add_error(Location::new(1, 4, 3), "eof-in-tag");

        assert_eq!(logger.get_errors().len(), 2);
    }
}
