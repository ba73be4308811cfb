//! Protocol types and translation rules for the agent call relay.
//!
//! Nothing in this crate touches a socket. The server crate owns the
//! connections and asks the [`translate::Translator`] what to do with every
//! frame it reads.

pub mod agent;
pub mod client;
pub mod telephony;
pub mod translate;

/// A frame from either side could not be decoded into a known shape.
///
/// Decode errors never end a session; the offending frame is logged and
/// skipped.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

/// Rejects frames above `limit` bytes before any parsing happens.
pub fn check_frame_size(text: &str, limit: usize) -> Result<(), DecodeError> {
    if text.len() > limit {
        return Err(DecodeError::TooLarge {
            size: text.len(),
            limit,
        });
    }
    Ok(())
}
