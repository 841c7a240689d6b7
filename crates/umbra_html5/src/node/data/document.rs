#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentData {}

impl DocumentData {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }
}
