//! Conversions from memory config into store-side policies.

use vitalis_rs_config::MemoryWriteConfig;
use vitalis_rs_memory::MemoryWritePolicy;

pub(crate) fn write_policy_from_config(config: &MemoryWriteConfig) -> MemoryWritePolicy {
    MemoryWritePolicy {
        redact_patterns: config.redact_patterns.clone(),
        max_content_chars: config.max_content_chars,
        detect_secrets: config.detect_secrets,
        secret_entropy_threshold: config.secret_entropy_threshold,
        redaction_replacement: config.redaction_replacement.clone(),
    }
}
