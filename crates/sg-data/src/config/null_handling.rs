//! Null token handling for text input

use serde::{Serialize, Deserialize};

/// Which raw text fields load as missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullConfig {
    /// Tokens that mean "no value"
    pub patterns: Vec<String>,

    /// Whether to trim whitespace before checking
    pub trim_whitespace: bool,

    /// Case sensitive matching
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: ["", "-", "N/A", "NULL", "None", "NaN", "NaT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            trim_whitespace: true,
            case_sensitive: false,
        }
    }
}

impl NullConfig {
    /// Check if a raw field should load as missing
    pub fn is_null(&self, value: &str) -> bool {
        let value = if self.trim_whitespace { value.trim() } else { value };

        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                value == pattern
            } else {
                value.eq_ignore_ascii_case(pattern)
            }
        })
    }

    /// Add a null token if not already present
    pub fn add_pattern(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokens() {
        let config = NullConfig::default();
        assert!(config.is_null(""));
        assert!(config.is_null("  n/a "));
        assert!(config.is_null("nat"));
        assert!(!config.is_null("Bob"));
    }

    #[test]
    fn test_case_sensitive_tokens() {
        let mut config = NullConfig {
            patterns: vec![],
            trim_whitespace: false,
            case_sensitive: true,
        };
        config.add_pattern("NULL");
        config.add_pattern("NULL");
        assert_eq!(config.patterns.len(), 1);
        assert!(config.is_null("NULL"));
        assert!(!config.is_null("null"));
        assert!(!config.is_null(" NULL"));
    }
}
