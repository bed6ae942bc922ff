//! Format configuration threaded into serializers.

use serde::Deserialize;

use crate::constants::{CLIENT_VERSION, MAX_TX_IN_PER_MESSAGE};

/// Process-wide format settings.
///
/// Built once at startup and passed by reference to every encode/decode call
/// that needs it; never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Version tag written at the head of each block-index record.
    pub client_version: i32,
    /// Upper bound on the coin count of one transaction's undo record.
    pub max_inputs_per_tx: u64,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            client_version: CLIENT_VERSION,
            max_inputs_per_tx: MAX_TX_IN_PER_MESSAGE,
        }
    }
}

impl FormatConfig {
    /// Same settings with a different input bound.
    pub fn with_max_inputs(self, max_inputs_per_tx: u64) -> Self {
        Self { max_inputs_per_tx, ..self }
    }
}
