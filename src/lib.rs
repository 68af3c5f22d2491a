//! Interpose - HTTP adapter that replays recorded interactions
//!
//! Inbound requests are matched against a cassette through an injected
//! [`replay::ReplayEngine`] and answered with the recorded response.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::multiple_crate_versions
)]

pub mod adapter;
pub mod cassette;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod network;
pub mod replay;

pub use error::{InterposeError, Result};
