//! Inbound request normalization

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::header::{HeaderName, CONTENT_LENGTH};
use hyper::{HeaderMap, Method, Request, Uri};

use crate::{InterposeError, Result};

/// Inbound request reduced to what candidate building needs
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    /// Inbound method
    pub method: Method,
    /// Path plus `?query` when a non-empty query is present
    pub target: String,
    /// Inbound headers
    pub headers: HeaderMap,
    /// Fully buffered body
    pub body: Bytes,
}

impl NormalizedRequest {
    /// Case-insensitive header lookup, first value wins
    ///
    /// Names that are not valid header names never match. Values are
    /// decoded as latin-1, so every byte maps to one char and opaque
    /// bytes still compare equal to their recorded form.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        self.headers
            .get(&name)
            .map(|value| value.as_bytes().iter().copied().map(char::from).collect())
    }
}

/// Derive the match target from a request URI
///
/// The raw query is appended verbatim; no reordering or decoding.
#[must_use]
pub fn normalized_target(uri: &Uri) -> String {
    match uri.query() {
        Some(query) if !query.is_empty() => format!("{}?{query}", uri.path()),
        _ => uri.path().to_string(),
    }
}

/// Normalize an inbound request, buffering its body
///
/// # Errors
///
/// Returns error if the body exceeds `max_size` or cannot be read
pub async fn normalize<B>(request: Request<B>, max_size: usize) -> Result<NormalizedRequest>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    check_content_length(request.headers(), max_size)?;

    let (parts, body) = request.into_parts();
    let body = read_body(body, max_size).await?;

    Ok(NormalizedRequest {
        target: normalized_target(&parts.uri),
        method: parts.method,
        headers: parts.headers,
        body,
    })
}

fn check_content_length(headers: &HeaderMap, max_size: usize) -> Result<()> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    match declared {
        Some(length) if length > max_size => Err(InterposeError::DataTooLarge {
            size: length,
            limit: max_size,
        }),
        _ => Ok(()),
    }
}

/// Buffer the body, stopping at the first frame that crosses `max_size`
async fn read_body<B>(body: B, max_size: usize) -> Result<Bytes>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let collected = Limited::new(body, max_size).collect().await.map_err(|e| {
        if e.is::<LengthLimitError>() {
            // The rest of the stream is never read, so only a lower bound is known
            InterposeError::DataTooLarge {
                size: max_size.saturating_add(1),
                limit: max_size,
            }
        } else {
            InterposeError::Other(format!("Failed to read body: {e}"))
        }
    })?;

    Ok(collected.to_bytes())
}
