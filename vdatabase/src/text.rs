use regex::Regex;

use crate::error::{Result, VectorDBError};

/// Normalises disclosure text before it is embedded.
///
/// The same sanitiser runs over corpus snippets at rebuild time and over query text at
/// classification time, so both sides of the similarity search see identical cleaning.
#[derive(Debug, Clone)]
pub struct TextSanitizer {
    punctuation_regex: Regex,
}

impl TextSanitizer {
    pub fn new() -> Result<Self> {
        let punctuation_regex = Regex::new(r"[^\w\s]")
            .map_err(|e| VectorDBError::internal(format!("Invalid sanitizer pattern: {}", e)))?;

        Ok(Self { punctuation_regex })
    }

    /// Punctuation becomes a space, control characters are dropped, whitespace collapses.
    pub fn clean(&self, text: &str) -> String {
        let without_punctuation = self.punctuation_regex.replace_all(text, " ");
        inference::tokenizer::normalize_whitespace(&without_punctuation)
    }
}
