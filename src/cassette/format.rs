//! Cassette data structures

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use hyper::Method;

use crate::fingerprint::{fingerprint_request, Fingerprint};

/// Metadata key carrying the recorded HTTP status code
pub const STATUS_CODE_KEY: &str = "status_code";

/// Protocol tag of a recorded request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plain HTTP, the only protocol this adapter replays
    Http,
    /// Any other protocol found in a cassette
    Other(String),
}

impl Protocol {
    /// Lowercase wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Http => "http",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Protocol {
    fn from(name: String) -> Self {
        if name == "http" {
            Self::Http
        } else {
            Self::Other(name)
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as the replay engine sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRequest {
    /// Protocol tag
    pub protocol: Protocol,
    /// HTTP method
    pub action: Method,
    /// Path, with `?query` when present
    pub target: String,
    /// Ordered header pairs; order and presence matter
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Bytes,
}

impl InteractionRequest {
    /// Create an HTTP interaction request
    #[must_use]
    pub fn http(
        action: Method,
        target: impl Into<String>,
        headers: Vec<(String, String)>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            protocol: Protocol::Http,
            action,
            target: target.into(),
            headers,
            body: body.into(),
        }
    }

    /// Header names in recorded order
    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|(name, _)| name.as_str())
    }
}

/// One ordered fragment of a recorded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChunk {
    /// Position of this fragment within the response
    pub sequence: u64,
    /// Body bytes
    pub data: Bytes,
    /// String metadata, e.g. `status_code`
    pub metadata: BTreeMap<String, String>,
}

impl ResponseChunk {
    /// Create a chunk without metadata
    #[must_use]
    pub fn new(sequence: u64, data: impl Into<Bytes>) -> Self {
        Self {
            sequence,
            data: data.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Recorded status code entry, if any
    #[must_use]
    pub fn status_code(&self) -> Option<&str> {
        self.metadata.get(STATUS_CODE_KEY).map(String::as_str)
    }
}

/// A recorded request with its fingerprint and response fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Recorded request
    pub request: InteractionRequest,
    /// Fingerprint of `request`
    pub fingerprint: Fingerprint,
    /// Response fragments in sequence order
    pub response_chunks: Vec<ResponseChunk>,
}

impl Interaction {
    /// Pair a request with its response, fingerprinting the request with
    /// [`fingerprint_request`]
    #[must_use]
    pub fn new(request: InteractionRequest, response_chunks: Vec<ResponseChunk>) -> Self {
        let fingerprint = fingerprint_request(&request);
        Self {
            request,
            fingerprint,
            response_chunks,
        }
    }
}

/// Ordered, read-only collection of interactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cassette {
    interactions: Vec<Interaction>,
}

impl Cassette {
    /// Create a cassette from interactions in recording order
    #[must_use]
    pub fn new(interactions: Vec<Interaction>) -> Self {
        Self { interactions }
    }

    /// Interactions in recording order
    #[must_use]
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Recompute every interaction fingerprint with `fingerprint`
    #[must_use]
    pub fn with_fingerprints<F>(mut self, fingerprint: F) -> Self
    where
        F: Fn(&InteractionRequest) -> Fingerprint,
    {
        for interaction in &mut self.interactions {
            interaction.fingerprint = fingerprint(&interaction.request);
        }
        self
    }

    /// Number of interactions
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether the cassette holds no interactions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}
