//! HTTP replay adapter
//!
//! Request flow: [`normalize`] buffers the request and derives its match
//! target, [`build_candidates`] projects recorded header schemas onto it,
//! [`resolve`] tries each candidate against the engine, and [`assemble`]
//! turns the replayed chunks into a status and body. [`Adapter`] wires
//! them into one handler for every supported method.

mod assemble;
mod candidates;
mod normalize;
mod resolver;
mod router;

pub use assemble::{assemble, AssembledResponse};
pub use candidates::{build_candidates, Candidate};
pub use normalize::{normalize, normalized_target, NormalizedRequest};
pub use resolver::{resolve, Resolution};
pub use router::{
    create_response, error_response, is_supported, Adapter, NOT_FOUND_BODY, NOT_FOUND_STATUS,
    SUPPORTED_METHODS,
};
