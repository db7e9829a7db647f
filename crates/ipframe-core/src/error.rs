//! Error types for the encapsulator.

use thiserror::Error;

/// A port refused an item because it was not ready.
///
/// The rejected item is handed back so the producer can retry it on a later
/// tick without cloning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("port not ready")]
pub struct Backpressure<T>(pub T);

impl<T> Backpressure<T> {
    /// Recover the rejected item.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A channel was configured with no storage, so it could never be ready.
    #[error("{channel} depth must be at least 1")]
    ZeroDepth {
        /// Which channel
        channel: &'static str,
    },
}
