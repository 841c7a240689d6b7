#[derive(Debug, Clone, PartialEq)]
pub struct CommentData {
    /// The comment text
    pub value: String,
}

impl Default for CommentData {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentData {
    #[must_use]
    pub fn new() -> Self {
        Self { value: String::new() }
    }

    #[must_use]
    pub fn with_value(value: &str) -> Self {
        Self { value: value.to_owned() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}
