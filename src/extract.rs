use serde::Serialize;

mod assertions;
mod blocks;

pub use assertions::extract_assertions;
pub use blocks::{TestBlock, extract_blocks};

pub const DEFAULT_PROXIMITY_WINDOW: usize = 50;
pub const DEFAULT_LOOKAHEAD_WINDOW: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Largest distance in bytes between an `expect(` anchor and the call
    /// that feeds it.
    pub proximity_window: usize,
    /// How far past an invocation to look for the expectation marker.
    pub lookahead_window: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            proximity_window: DEFAULT_PROXIMITY_WINDOW,
            lookahead_window: DEFAULT_LOOKAHEAD_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    Match { expected_css: String },
    Empty,
    /// Recognized but not evaluated: needs theme configuration the verifier
    /// does not model.
    Deferred,
}

impl Expectation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Match { .. } => "match",
            Self::Empty => "empty",
            Self::Deferred => "deferred",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub group_name: String,
    pub ordinal: usize,
    pub line: usize,
    pub input_tokens: Vec<String>,
    #[serde(flatten)]
    pub expectation: Expectation,
}

pub fn extract_cases(source: &str, options: &ExtractOptions) -> Vec<TestCase> {
    extract_blocks(source)
        .iter()
        .flat_map(|block| extract_assertions(block, options))
        .collect()
}

#[cfg(test)]
mod tests;
