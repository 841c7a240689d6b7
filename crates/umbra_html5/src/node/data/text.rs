#[derive(Debug, Clone, PartialEq)]
pub struct TextData {
    /// Character data of this node
    pub value: String,
}

impl Default for TextData {
    fn default() -> Self {
        Self::new()
    }
}

impl TextData {
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

    pub fn value_mut(&mut self) -> &mut String {
        &mut self.value
    }

    /// True when the text consists solely of ASCII whitespace
    pub fn only_whitespace(&self) -> bool {
        self.value.chars().all(|ch| ch.is_ascii_whitespace())
    }
}
