//! Error types for the TETHER protocol.

use thiserror::Error;

/// Errors that can occur when encoding outbound property records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The encoded payload exceeds the transmit buffer capacity.
    ///
    /// This is a configuration or programmer defect (too many properties
    /// for the configured buffer), not a runtime condition to recover
    /// from; the payload is never truncated.
    #[error("encoded payload of {size} bytes exceeds transmit capacity of {capacity}")]
    PayloadTooLarge {
        /// Size the encode produced.
        size: usize,
        /// Configured transmit buffer capacity.
        capacity: usize,
    },
}

/// Errors that can occur when decoding inbound property records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Unexpected end of data.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Invalid encoding.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(&'static str),

    /// A declared length exceeds what untrusted input may allocate.
    #[error("declared length {len} exceeds limit {max}")]
    LengthOverflow {
        /// Declared element or byte count.
        len: u64,
        /// Maximum the decoder accepts.
        max: u64,
    },

    /// A property record carries no name.
    #[error("property record has no name")]
    MissingName,

    /// A property record carries no value.
    #[error("property record has no value")]
    MissingValue,

    /// Data remains after the outermost value.
    #[error("trailing bytes after payload")]
    TrailingBytes,
}

/// Errors reported by a [`BrokerTransport`](super::BrokerTransport)
/// implementation.
///
/// The state machine treats all of these as transient: it logs them and
/// retries on a later tick. They are never surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Broker connect attempt failed.
    #[error("broker connect failed: {0}")]
    Connect(String),

    /// Subscription was rejected or timed out.
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    /// Publish was rejected or the connection dropped mid-send.
    #[error("publish failed: {0}")]
    Publish(String),

    /// Operation attempted while the broker session is down.
    #[error("not connected to broker")]
    NotConnected,
}

/// Errors reported by an [`UpdateHandler`](crate::update::UpdateHandler).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// Fetching the update image failed.
    #[error("update download failed: {0}")]
    Download(String),

    /// The downloaded image failed verification.
    #[error("update verification failed: {0}")]
    Verify(String),

    /// Applying the image failed.
    #[error("update apply failed: {0}")]
    Apply(String),
}

impl UpdateError {
    /// Numeric error code reported to the cloud through the update-error
    /// property.
    ///
    /// `0` is reserved for "no error".
    pub fn code(&self) -> i64 {
        match self {
            UpdateError::Download(_) => 1,
            UpdateError::Verify(_) => 2,
            UpdateError::Apply(_) => 3,
        }
    }
}

/// Top-level TETHER errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TetherError {
    /// Encode error.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Decode error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Update error.
    #[error("update error: {0}")]
    Update(#[from] UpdateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_error_codes() {
        assert_eq!(UpdateError::Download("timeout".into()).code(), 1);
        assert_eq!(UpdateError::Verify("bad digest".into()).code(), 2);
        assert_eq!(UpdateError::Apply("flash write".into()).code(), 3);
    }

    #[test]
    fn test_error_display() {
        let err = EncodeError::PayloadTooLarge {
            size: 300,
            capacity: 256,
        };
        assert_eq!(
            err.to_string(),
            "encoded payload of 300 bytes exceeds transmit capacity of 256"
        );

        let err: TetherError = DecodeError::UnexpectedEof.into();
        assert_eq!(err.to_string(), "decode error: unexpected end of data");
    }
}
