//! Server-sent event streaming over HTTP.

pub mod client;
pub mod decoder;

pub use client::{pump_events, StreamClient, StreamState, StreamSummary};
pub use decoder::{data_payload, LineBuffer, SseDecoder, Utf8Decoder};
