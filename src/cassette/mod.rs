//! Recorded interactions and the cassette that holds them

mod format;
mod loader;

pub use format::{
    Cassette, Interaction, InteractionRequest, Protocol, ResponseChunk, STATUS_CODE_KEY,
};
