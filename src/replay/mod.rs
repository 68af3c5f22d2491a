//! Replay engine contract and the built-in in-memory engine

mod broker;

pub use broker::{Broker, ReplayStats};

use crate::cassette::{Cassette, InteractionRequest, ResponseChunk};
use crate::fingerprint::Fingerprint;
use crate::Result;

/// Record/replay engine consumed by the adapter
///
/// Implementations must be safe to call concurrently; the adapter never
/// serializes access.
pub trait ReplayEngine: Send + Sync {
    /// Loaded cassette, read-only for the engine's lifetime
    fn cassette(&self) -> &Cassette;

    /// Deterministic fingerprint of a request
    ///
    /// The interactions in [`cassette`](Self::cassette) must carry
    /// fingerprints computed by this same function.
    fn fingerprint(&self, request: &InteractionRequest) -> Fingerprint;

    /// Look up the response chunks recorded for `request`
    ///
    /// # Errors
    ///
    /// Returns [`InterposeError::InteractionNotFound`](crate::InterposeError::InteractionNotFound)
    /// when no interaction matches. Any other error is an engine fault.
    fn replay(&self, request: &InteractionRequest) -> Result<Vec<ResponseChunk>>;
}
