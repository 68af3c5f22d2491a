//! Cassette loading from JSON documents

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use hyper::Method;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{InterposeError, Result};

use super::format::{Cassette, Interaction, InteractionRequest, Protocol, ResponseChunk};

#[derive(Debug, Deserialize)]
struct CassetteDocument {
    interactions: Vec<InteractionDocument>,
}

#[derive(Debug, Deserialize)]
struct InteractionDocument {
    request: RequestDocument,
    #[serde(default)]
    response_chunks: Vec<ChunkDocument>,
}

#[derive(Debug, Deserialize)]
struct RequestDocument {
    protocol: String,
    action: String,
    target: String,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct ChunkDocument {
    sequence: u64,
    #[serde(default)]
    data: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl Cassette {
    /// Load a cassette from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, unreadable or malformed
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InterposeError::FileNotFound(path.display().to_string()));
        }

        debug!("Loading cassette: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let cassette = Self::from_json(&content)?;

        info!(
            "Loaded cassette '{}': {} interactions",
            path.display(),
            cassette.len()
        );

        Ok(cassette)
    }

    /// Parse a cassette from a JSON string
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or names an invalid method
    pub fn from_json(content: &str) -> Result<Self> {
        let document: CassetteDocument = serde_json::from_str(content)
            .map_err(|e| InterposeError::InvalidFormat(format!("Failed to parse cassette: {e}")))?;

        let interactions = document
            .interactions
            .into_iter()
            .enumerate()
            .map(|(index, interaction)| interaction.into_interaction(index))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(interactions))
    }
}

impl InteractionDocument {
    fn into_interaction(self, index: usize) -> Result<Interaction> {
        let action = Method::from_bytes(self.request.action.as_bytes()).map_err(|e| {
            InterposeError::InvalidFormat(format!(
                "Interaction {index}: invalid action {:?}: {e}",
                self.request.action
            ))
        })?;

        let request = InteractionRequest {
            protocol: Protocol::from(self.request.protocol),
            action,
            target: self.request.target,
            headers: self.request.headers,
            body: Bytes::from(self.request.body),
        };

        let response_chunks = self
            .response_chunks
            .into_iter()
            .map(|chunk| ResponseChunk {
                sequence: chunk.sequence,
                data: Bytes::from(chunk.data),
                metadata: chunk.metadata,
            })
            .collect();

        Ok(Interaction::new(request, response_chunks))
    }
}
