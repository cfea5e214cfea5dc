//! Line tokenizer
//!
//! Turns a raw log line into normalized word tokens used as classifier
//! attributes.

use regex::Regex;

use crate::bayes::Attributes;
use crate::error::Result;

/// Separators between tokens: whitespace, comma, semicolon
const SEPARATOR_PATTERN: &str = r"[\s,;]+";

/// Leading `{...}` annotation left by a previous classification pass
const TAG_PATTERN: &str = r"^\{[^}]*\}";

/// Drive-letter style prefix (`C:`), kept verbatim
const DRIVE_PATTERN: &str = r"^[A-Z]:";

/// Tokenizer with precompiled patterns
#[derive(Debug, Clone)]
pub struct Tokenizer {
    separator: Regex,
    tag: Regex,
    drive: Regex,
}

impl Tokenizer {
    /// Create a new tokenizer
    pub fn new() -> Result<Self> {
        Ok(Self {
            separator: Regex::new(SEPARATOR_PATTERN)?,
            tag: Regex::new(TAG_PATTERN)?,
            drive: Regex::new(DRIVE_PATTERN)?,
        })
    }

    /// Split a line into normalized tokens.
    ///
    /// Leading `{tag}` tokens are dropped, then every token is stripped of
    /// trailing `.` and `:` and lowercased, except drive-letter prefixes
    /// which are returned untouched. Empty fragments never appear in the
    /// output, so an empty line yields no tokens.
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        let words = self
            .separator
            .split(line)
            .filter(|w| !w.is_empty())
            .skip_while(|w| self.tag.is_match(w));

        let mut tokens = Vec::new();
        for word in words {
            if self.drive.is_match(word) {
                tokens.push(word.to_string());
                continue;
            }

            let normalized = word.trim_end_matches(['.', ':']).to_lowercase();
            if !normalized.is_empty() {
                tokens.push(normalized);
            }
        }

        tokens
    }

    /// Tokenize a line into a deduplicated attribute set, every token with weight 1
    pub fn attributes(&self, line: &str) -> Attributes {
        self.tokenize(line).into_iter().map(|t| (t, 1)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new().unwrap()
    }

    #[test]
    fn test_tokenize_normalizes_case_and_punctuation() {
        let tokens = tokenizer().tokenize("Error: disk Failed.");
        assert_eq!(tokens, vec!["error", "disk", "failed"]);
    }

    #[test]
    fn test_tokenize_strips_leading_tag() {
        let tokens = tokenizer().tokenize("{host1} disk error");
        assert_eq!(tokens, vec!["disk", "error"]);
    }

    #[test]
    fn test_tokenize_strips_repeated_leading_tags() {
        let tokens = tokenizer().tokenize("{error} {disk} disk error {kept}");
        assert_eq!(tokens, vec!["disk", "error", "{kept}"]);
    }

    #[test]
    fn test_tokenize_splits_on_comma_and_semicolon() {
        let tokens = tokenizer().tokenize("a,b;c  d,;e");
        assert_eq!(tokens, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_tokenize_keeps_drive_prefix() {
        let tokens = tokenizer().tokenize("cannot open C:\\Temp\\Log.TXT.");
        assert_eq!(tokens, vec!["cannot", "open", "C:\\Temp\\Log.TXT."]);
    }

    #[test]
    fn test_tokenize_empty_line() {
        assert!(tokenizer().tokenize("").is_empty());
        assert!(tokenizer().tokenize("  ,; ").is_empty());
    }

    #[test]
    fn test_tokenize_drops_punctuation_only_tokens() {
        let tokens = tokenizer().tokenize("done ... :");
        assert_eq!(tokens, vec!["done"]);
    }

    #[test]
    fn test_attributes_deduplicate() {
        let attrs = tokenizer().attributes("error error Error.");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("error"), Some(&1));
    }
}
