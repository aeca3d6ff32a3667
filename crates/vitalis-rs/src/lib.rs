//! Public SDK surface for Vitalis.
//!
//! This crate re-exports the assistant building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use vitalis_rs_config as config;
pub use vitalis_rs_core as core;
/// Re-export for convenience.
pub use vitalis_rs_memory as memory;
/// Re-export for convenience.
pub use vitalis_rs_protocol as protocol;
pub use vitalis_rs_server as server;
pub use vitalis_rs_tools as tools;

pub use vitalis_rs_core::{Assistant, ChatReply, ChatRequest, ModelGateway};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// Defaults to `info` unless `RUST_LOG` says otherwise. This is a no-op if the
/// feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .try_init();
    }
}
