//! Catch-all request handler wiring normalization, matching and assembly

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, ALLOW};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_MAX_REQUEST_SIZE;
use crate::replay::ReplayEngine;
use crate::{InterposeError, Result};

use super::assemble::assemble;
use super::candidates::build_candidates;
use super::normalize::normalize;
use super::resolver::{resolve, Resolution};

/// Methods served by the adapter; everything else gets 405
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Status returned when no candidate replays
pub const NOT_FOUND_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

/// Body returned when no candidate replays
pub const NOT_FOUND_BODY: &str = "Interaction Not Found";

/// Whether `method` is in [`SUPPORTED_METHODS`]
#[must_use]
pub fn is_supported(method: &Method) -> bool {
    SUPPORTED_METHODS.contains(method)
}

/// HTTP adapter replaying interactions through an injected engine
pub struct Adapter<E: ?Sized> {
    engine: Arc<E>,
    max_request_size: usize,
}

impl<E: ?Sized> Clone for Adapter<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            max_request_size: self.max_request_size,
        }
    }
}

impl<E: ReplayEngine + ?Sized> Adapter<E> {
    /// Create an adapter over `engine`
    #[must_use]
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }

    /// Limit buffered request bodies to `limit` bytes
    #[must_use]
    pub fn with_max_request_size(mut self, limit: usize) -> Self {
        self.max_request_size = limit;
        self
    }

    /// The injected engine
    #[must_use]
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Handle one inbound request on any path
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be buffered, the engine faults, or
    /// the replayed status metadata is malformed
    pub async fn handle<B>(&self, request: Request<B>) -> Result<Response<Full<Bytes>>>
    where
        B: hyper::body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if !is_supported(request.method()) {
            debug!("Rejecting unsupported method {}", request.method());
            return Ok(method_not_allowed());
        }

        let inbound = normalize(request, self.max_request_size).await?;
        let engine = &*self.engine;

        let candidates = build_candidates(engine.cassette().interactions(), &inbound, |request| {
            engine.fingerprint(request)
        });

        debug!(
            "{} {}: {} candidate(s)",
            inbound.method,
            inbound.target,
            candidates.len()
        );

        match resolve(engine, &candidates)? {
            Resolution::Replayed { chunks, candidate } => {
                let assembled = assemble(&chunks)?;
                info!(
                    "Replayed {} {} -> {} (candidate {})",
                    inbound.method,
                    inbound.target,
                    assembled.status,
                    candidate + 1
                );
                Ok(create_response(assembled.status, assembled.body))
            }
            Resolution::Exhausted { attempts } => {
                warn!(
                    "No interaction for {} {} after {} candidate(s)",
                    inbound.method, inbound.target, attempts
                );
                Ok(create_response(
                    NOT_FOUND_STATUS,
                    Bytes::from_static(NOT_FOUND_BODY.as_bytes()),
                ))
            }
        }
    }
}

/// Create a response with a fully materialized body
#[must_use]
pub fn create_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}

/// Map a handler error to a response
#[must_use]
pub fn error_response(error: &InterposeError) -> Response<Full<Bytes>> {
    let status = match error {
        InterposeError::DataTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    create_response(status, Bytes::from(format!("Error: {error}")))
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let allow = SUPPORTED_METHODS
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut response = create_response(StatusCode::METHOD_NOT_ALLOWED, Bytes::new());
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}
