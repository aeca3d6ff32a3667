use vitalis_rs_core::Assistant;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Assistant,
}

impl AppState {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }
}
