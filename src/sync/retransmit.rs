//! Single-payload retransmission buffer.
//!
//! Holds the most recently transmitted property payload so it can be
//! re-sent after a transport interruption. Exactly one payload is
//! retained - a deliberate bounded-memory trade-off, not a queue - so
//! redelivery is guaranteed across one disconnect/reconnect cycle only.

use crate::core::EncodeError;
use crate::core::constants::MAX_TRANSMIT_BUFFER_SIZE;

/// Buffer for the last transmitted payload and its resend flag.
#[derive(Debug, Clone)]
pub struct RetransmitBuffer {
    payload: Vec<u8>,
    capacity: usize,
    pending: bool,
}

impl Default for RetransmitBuffer {
    fn default() -> Self {
        Self::new(MAX_TRANSMIT_BUFFER_SIZE)
    }
}

impl RetransmitBuffer {
    /// Create a buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            payload: Vec::with_capacity(capacity),
            capacity,
            pending: false,
        }
    }

    /// Capture a payload after a transmit attempt.
    ///
    /// A payload larger than the capacity is a configuration defect and
    /// is rejected without touching the stored payload.
    pub fn store(&mut self, payload: &[u8]) -> Result<(), EncodeError> {
        if payload.len() > self.capacity {
            return Err(EncodeError::PayloadTooLarge {
                size: payload.len(),
                capacity: self.capacity,
            });
        }
        self.payload.clear();
        self.payload.extend_from_slice(payload);
        Ok(())
    }

    /// Flag the stored payload for resend; called when a transmit is
    /// believed lost to a transport-level disconnection. No-op while
    /// nothing is stored.
    pub fn mark_pending(&mut self) {
        if !self.payload.is_empty() {
            self.pending = true;
        }
    }

    /// Take the payload for one resend, clearing the pending flag.
    ///
    /// Returns `None` unless a resend is due. The payload itself stays
    /// stored for a later disconnect.
    pub fn drain(&mut self) -> Option<Vec<u8>> {
        if !self.pending || self.payload.is_empty() {
            return None;
        }
        self.pending = false;
        Some(self.payload.clone())
    }

    /// Whether a resend is due.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Length of the stored payload.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether no payload is stored.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop the stored payload and clear the pending flag, for a full
    /// session restart.
    pub fn reset(&mut self) {
        self.payload.clear();
        self.pending = false;
    }
}
