//! Ordered candidate resolution against the replay engine

use tracing::debug;

use crate::cassette::ResponseChunk;
use crate::replay::ReplayEngine;
use crate::Result;

use super::candidates::Candidate;

/// Outcome of trying every candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A candidate matched; its chunks in engine order
    Replayed {
        /// Response chunks, possibly empty
        chunks: Vec<ResponseChunk>,
        /// Index of the matching candidate
        candidate: usize,
    },
    /// Every candidate missed
    Exhausted {
        /// Number of candidates tried
        attempts: usize,
    },
}

/// Try candidates in order, stopping at the first replayed response
///
/// # Errors
///
/// Returns engine faults other than the not-found signal unchanged
pub fn resolve<E>(engine: &E, candidates: &[Candidate]) -> Result<Resolution>
where
    E: ReplayEngine + ?Sized,
{
    for (index, candidate) in candidates.iter().enumerate() {
        match engine.replay(&candidate.request) {
            Ok(chunks) => {
                debug!(
                    "Candidate {}/{} matched ({})",
                    index + 1,
                    candidates.len(),
                    candidate.fingerprint.short()
                );
                return Ok(Resolution::Replayed {
                    chunks,
                    candidate: index,
                });
            }
            Err(e) if e.is_not_found() => {
                debug!(
                    "Candidate {}/{} missed ({})",
                    index + 1,
                    candidates.len(),
                    candidate.fingerprint.short()
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Resolution::Exhausted {
        attempts: candidates.len(),
    })
}
