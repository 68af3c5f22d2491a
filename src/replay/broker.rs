//! In-memory replay engine backed by a loaded cassette

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info};

use crate::cassette::{Cassette, InteractionRequest, ResponseChunk};
use crate::fingerprint::{fingerprint_request, Fingerprint};
use crate::{InterposeError, Result};

use super::ReplayEngine;

/// Replay engine serving a single read-only cassette
pub struct Broker {
    cassette: Cassette,
    /// Map of fingerprint to interaction index; first recording wins
    index: HashMap<Fingerprint, usize>,
    /// Lookup hit counter
    hits: AtomicUsize,
    /// Lookup miss counter
    misses: AtomicUsize,
}

impl Broker {
    /// Create a broker over a loaded cassette
    ///
    /// Interaction fingerprints are recomputed with the broker's own
    /// function so the index and candidate dedup always agree.
    #[must_use]
    pub fn new(cassette: Cassette) -> Self {
        let cassette = cassette.with_fingerprints(fingerprint_request);
        let mut index = HashMap::with_capacity(cassette.len());
        for (position, interaction) in cassette.interactions().iter().enumerate() {
            if let Entry::Vacant(slot) = index.entry(interaction.fingerprint) {
                slot.insert(position);
            } else {
                debug!(
                    "Duplicate recording {} at position {}",
                    interaction.fingerprint.short(),
                    position
                );
            }
        }

        info!(
            "Replay broker ready: {} interactions, {} distinct fingerprints",
            cassette.len(),
            index.len()
        );

        Self {
            cassette,
            index,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Load a cassette file and create a broker over it
    ///
    /// # Errors
    ///
    /// Returns error if the cassette cannot be loaded
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(Cassette::from_file(path)?))
    }

    /// Get lookup statistics
    #[must_use]
    pub fn stats(&self) -> ReplayStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        ReplayStats {
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            size: self.index.len(),
        }
    }

    /// Reset lookup statistics
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl ReplayEngine for Broker {
    fn cassette(&self) -> &Cassette {
        &self.cassette
    }

    fn fingerprint(&self, request: &InteractionRequest) -> Fingerprint {
        fingerprint_request(request)
    }

    fn replay(&self, request: &InteractionRequest) -> Result<Vec<ResponseChunk>> {
        let fingerprint = self.fingerprint(request);

        if let Some(&position) = self.index.get(&fingerprint) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            let interaction = &self.cassette.interactions()[position];
            debug!(
                "Replay hit: {} {} -> {} chunks",
                request.action,
                request.target,
                interaction.response_chunks.len()
            );
            Ok(interaction.response_chunks.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Replay miss: {} {} (fingerprint: {})",
                request.action,
                request.target,
                fingerprint.short()
            );
            Err(InterposeError::InteractionNotFound(fingerprint))
        }
    }
}

/// Lookup statistics
#[derive(Debug, Clone, Copy)]
pub struct ReplayStats {
    /// Lookup hits
    pub hits: usize,
    /// Lookup misses
    pub misses: usize,
    /// Hit rate (0.0 to 1.0)
    pub hit_rate: f64,
    /// Number of distinct fingerprints
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::{Interaction, STATUS_CODE_KEY};
    use hyper::Method;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logs_at(level: tracing::Level, f: impl FnOnce()) -> String {
        let captured = CapturedLogs::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        captured.contents()
    }

    fn interaction(target: &str, body: &'static str) -> Interaction {
        Interaction::new(
            InteractionRequest::http(Method::GET, target, vec![], ""),
            vec![ResponseChunk::new(0, body).with_metadata(STATUS_CODE_KEY, "200")],
        )
    }

    #[test]
    fn test_broker_creation() {
        let broker = Broker::new(Cassette::default());

        let stats = broker.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_replay_hit() {
        let broker = Broker::new(Cassette::new(vec![interaction("/a", "hello")]));

        let chunks = broker
            .replay(&InteractionRequest::http(Method::GET, "/a", vec![], ""))
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].data, "hello");
        assert_eq!(broker.stats().hits, 1);
    }

    #[test]
    fn test_replay_miss() {
        let broker = Broker::new(Cassette::new(vec![interaction("/a", "hello")]));

        let result = broker.replay(&InteractionRequest::http(Method::GET, "/b", vec![], ""));

        assert!(matches!(result, Err(InterposeError::InteractionNotFound(_))));
        assert_eq!(broker.stats().misses, 1);
    }

    #[test]
    fn test_miss_is_not_a_warning() {
        let broker = Broker::new(Cassette::new(vec![interaction("/a", "hello")]));
        let miss = InteractionRequest::http(Method::GET, "/b", vec![], "");

        let warnings = logs_at(tracing::Level::WARN, || {
            let _ = broker.replay(&miss);
        });
        assert!(warnings.is_empty(), "unexpected warning: {warnings}");

        let debug = logs_at(tracing::Level::DEBUG, || {
            let _ = broker.replay(&miss);
        });
        assert!(debug.contains("Replay miss"));
    }

    #[test]
    fn test_index_uses_broker_fingerprint() {
        let request = InteractionRequest::http(Method::GET, "/a", vec![], "");
        let stale = fingerprint_request(&InteractionRequest::http(Method::GET, "/other", vec![], ""));
        let cassette = Cassette::new(vec![interaction("/a", "hello")]).with_fingerprints(|_| stale);

        let broker = Broker::new(cassette);

        assert_eq!(
            broker.cassette().interactions()[0].fingerprint,
            broker.fingerprint(&request)
        );
        assert_eq!(broker.replay(&request).unwrap()[0].data, "hello");
    }

    #[test]
    fn test_duplicate_recordings_first_wins() {
        let broker = Broker::new(Cassette::new(vec![
            interaction("/a", "first"),
            interaction("/a", "second"),
        ]));

        let chunks = broker
            .replay(&InteractionRequest::http(Method::GET, "/a", vec![], ""))
            .unwrap();

        assert_eq!(chunks[0].data, "first");
        assert_eq!(broker.stats().size, 1);
    }

    #[test]
    fn test_stats_hit_rate_and_reset() {
        let broker = Broker::new(Cassette::new(vec![interaction("/a", "hello")]));

        let _ = broker.replay(&InteractionRequest::http(Method::GET, "/a", vec![], ""));
        let _ = broker.replay(&InteractionRequest::http(Method::GET, "/b", vec![], ""));
        assert!((broker.stats().hit_rate - 0.5).abs() < 0.01);

        broker.reset_stats();
        assert_eq!(broker.stats().hits, 0);
        assert_eq!(broker.stats().misses, 0);
    }
}
