//! Response assembly from replayed chunks

use bytes::{Bytes, BytesMut};
use hyper::StatusCode;

use crate::cassette::ResponseChunk;
use crate::{InterposeError, Result};

/// Status and fully materialized body of a replayed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResponse {
    /// Status from the first chunk, or 200
    pub status: StatusCode,
    /// Concatenated chunk data
    pub body: Bytes,
}

/// Assemble chunks into a single response
///
/// Chunks are concatenated in the order given, not by sequence number.
///
/// # Errors
///
/// Returns error if the first chunk's `status_code` is not an integer
/// or not a valid HTTP status
pub fn assemble(chunks: &[ResponseChunk]) -> Result<AssembledResponse> {
    let status = match chunks.first().and_then(ResponseChunk::status_code) {
        Some(value) => parse_status(value)?,
        None => StatusCode::OK,
    };

    let mut body = BytesMut::with_capacity(chunks.iter().map(|c| c.data.len()).sum());
    for chunk in chunks {
        body.extend_from_slice(&chunk.data);
    }

    Ok(AssembledResponse {
        status,
        body: body.freeze(),
    })
}

fn parse_status(value: &str) -> Result<StatusCode> {
    let code = value
        .trim()
        .parse::<u16>()
        .map_err(|_| InterposeError::MalformedStatus {
            value: value.to_string(),
        })?;

    StatusCode::from_u16(code).map_err(|_| InterposeError::InvalidStatus(code))
}
