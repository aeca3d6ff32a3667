//! Write-time policy applied to memory content before it is stored.

use crate::error::MemoryError;
use crate::model::MemoryValue;
use regex::Regex;

/// Policy for sanitizing memory values on write.
#[derive(Debug, Clone)]
pub struct MemoryWritePolicy {
    /// Patterns to redact from content and context.
    pub redact_patterns: Vec<String>,
    /// Optional maximum content length in characters.
    pub max_content_chars: Option<usize>,
    /// Detect secrets using entropy heuristics.
    pub detect_secrets: bool,
    /// Entropy threshold for secret detection.
    pub secret_entropy_threshold: f32,
    /// Replacement string for redactions.
    pub redaction_replacement: String,
}

impl Default for MemoryWritePolicy {
    fn default() -> Self {
        Self {
            redact_patterns: Vec::new(),
            max_content_chars: None,
            detect_secrets: true,
            secret_entropy_threshold: 3.7,
            redaction_replacement: "[REDACTED]".to_string(),
        }
    }
}

impl MemoryWritePolicy {
    /// A policy that stores values untouched.
    pub fn passthrough() -> Self {
        Self {
            detect_secrets: false,
            ..Self::default()
        }
    }

    /// Apply redaction, secret detection, and truncation to a value.
    pub fn apply(&self, value: MemoryValue) -> Result<MemoryValue, MemoryError> {
        let mut patterns = Vec::with_capacity(self.redact_patterns.len());
        for pattern in &self.redact_patterns {
            let regex = Regex::new(pattern).map_err(|err| MemoryError::Regex(err.to_string()))?;
            patterns.push(regex);
        }

        let mut content = self.sanitize(&value.content, &patterns);
        if let Some(max_chars) = self.max_content_chars {
            content = truncate_chars(&content, max_chars);
        }
        let context = self.sanitize(&value.context, &patterns);
        Ok(MemoryValue { content, context })
    }

    fn sanitize(&self, text: &str, patterns: &[Regex]) -> String {
        let mut text = text.to_string();
        for regex in patterns {
            text = regex
                .replace_all(&text, self.redaction_replacement.as_str())
                .to_string();
        }
        if self.detect_secrets {
            text = redact_high_entropy(
                &text,
                self.secret_entropy_threshold,
                self.redaction_replacement.as_str(),
            );
        }
        text
    }
}

/// Truncate a string to a maximum character count.
fn truncate_chars(value: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect()
}

/// Redact high-entropy tokens that resemble secrets.
fn redact_high_entropy(content: &str, threshold: f32, replacement: &str) -> String {
    let Ok(regex) = Regex::new(r"[A-Za-z0-9+/=]{20,}") else {
        return content.to_string();
    };
    regex
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let token = caps.get(0).map_or("", |m| m.as_str());
            if shannon_entropy(token) >= threshold {
                replacement.to_string()
            } else {
                token.to_string()
            }
        })
        .to_string()
}

/// Calculate Shannon entropy for a token string.
fn shannon_entropy(token: &str) -> f32 {
    let mut counts = [0usize; 256];
    let bytes = token.as_bytes();
    if bytes.is_empty() {
        return 0.0;
    }
    for byte in bytes {
        counts[*byte as usize] += 1;
    }
    let len = bytes.len() as f32;
    let mut entropy = 0.0;
    for count in counts.iter().copied().filter(|count| *count > 0) {
        let p = count as f32 / len;
        entropy -= p * p.log2();
    }
    entropy
}

#[cfg(test)]
mod tests {
    use super::{MemoryWritePolicy, redact_high_entropy, truncate_chars};
    use crate::MemoryValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn ordinary_health_facts_pass_default_policy() {
        let value = MemoryValue::new("User's name is Sam; goal is 10k steps/day")
            .with_context("Introduced themselves");
        let stored = MemoryWritePolicy::default()
            .apply(value.clone())
            .expect("policy");
        assert_eq!(stored, value);
    }

    #[test]
    fn policy_redacts_patterns_and_truncates_content() {
        let policy = MemoryWritePolicy {
            redact_patterns: vec![r"\d{3}-\d{2}-\d{4}".to_string()],
            max_content_chars: Some(24),
            ..MemoryWritePolicy::passthrough()
        };
        let value = MemoryValue::new("SSN 123-45-6789 belongs to the user")
            .with_context("id 999-99-9999");
        let stored = policy.apply(value).expect("policy");
        assert_eq!(stored.content, "SSN [REDACTED] belongs t");
        assert_eq!(stored.context, "id [REDACTED]");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let policy = MemoryWritePolicy {
            redact_patterns: vec!["(".to_string()],
            ..MemoryWritePolicy::default()
        };
        assert!(policy.apply(MemoryValue::new("anything")).is_err());
    }

    #[test]
    fn redact_high_entropy_uses_replacement() {
        let content = "api key AbCdEfGhIjKlMnOpQrStUvWxYz012345 saved";
        let redacted = redact_high_entropy(content, 3.0, "[X]");
        assert_eq!(redacted, "api key [X] saved");
    }

    #[test]
    fn truncate_chars_handles_limits() {
        assert_eq!(truncate_chars("hello", 0), "");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hello", 10), "hello");
    }
}
