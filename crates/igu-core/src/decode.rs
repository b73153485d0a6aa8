//! Update-body decoding.
//!
//! Decoding sits behind a trait because production decoders may run out of
//! process; a decoder that dies mid-parse reports `DecodeError::Crashed`,
//! which the job treats exactly like malformed JSON.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("decoder crashed")]
    Crashed,
}

pub trait Decoder: Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError>;
}

/// In-process `serde_json` decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        Ok(serde_json::from_slice(body)?)
    }
}
