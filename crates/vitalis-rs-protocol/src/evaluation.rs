//! Memory evaluation verdict shared by the evaluator and turn events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision on whether the current turn warrants a memory write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemoryEvaluation {
    /// The conversation revealed a fact worth remembering.
    Store,
    /// Nothing new to remember.
    #[default]
    Skip,
    /// The user explicitly asked to remember something.
    Explicit,
}

impl MemoryEvaluation {
    /// Return the verdict as its uppercase wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryEvaluation::Store => "STORE",
            MemoryEvaluation::Skip => "SKIP",
            MemoryEvaluation::Explicit => "EXPLICIT",
        }
    }

    /// Parse a verdict leniently; anything unrecognized yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_matches('"').to_ascii_uppercase().as_str() {
            "STORE" => Some(MemoryEvaluation::Store),
            "SKIP" => Some(MemoryEvaluation::Skip),
            "EXPLICIT" => Some(MemoryEvaluation::Explicit),
            _ => None,
        }
    }

    /// Whether this verdict routes the turn through the tool-enabled path.
    pub fn wants_memory_write(&self) -> bool {
        matches!(self, MemoryEvaluation::Store | MemoryEvaluation::Explicit)
    }
}

impl fmt::Display for MemoryEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryEvaluation;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_accepts_case_and_quotes() {
        assert_eq!(MemoryEvaluation::parse("store"), Some(MemoryEvaluation::Store));
        assert_eq!(
            MemoryEvaluation::parse(" \"EXPLICIT\" "),
            Some(MemoryEvaluation::Explicit)
        );
        assert_eq!(MemoryEvaluation::parse("maybe"), None);
    }

    #[test]
    fn only_store_and_explicit_route_to_tools() {
        assert!(MemoryEvaluation::Store.wants_memory_write());
        assert!(MemoryEvaluation::Explicit.wants_memory_write());
        assert!(!MemoryEvaluation::Skip.wants_memory_write());
        assert_eq!(MemoryEvaluation::default(), MemoryEvaluation::Skip);
    }
}
