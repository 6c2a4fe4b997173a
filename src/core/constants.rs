//! Protocol constants.
//!
//! The wire-level values are fixed by the cloud protocol and MUST NOT be
//! changed; the timing values are reference defaults that a session may
//! override at construction.

use std::time::Duration;

// =============================================================================
// RECONCILIATION HANDSHAKE
// =============================================================================

/// Minimum interval between reconciliation (last-values) requests.
///
/// Bounds retry traffic while the handshake response is outstanding; it
/// does not bound latency.
pub const LAST_VALUES_REQUEST_INTERVAL: Duration = Duration::from_secs(10);

/// The fixed reconciliation request payload, published on the shadow-out
/// channel to ask the cloud for its authoritative last-known values.
///
/// Compact binary map encoding of `[{0: "r:m", 3: "getLastValues"}]`.
/// The exact byte sequence is part of the wire protocol.
pub const LAST_VALUES_REQUEST: [u8; 22] = [
    0x81, 0xA2, 0x00, 0x63, 0x72, 0x3A, 0x6D, 0x03, 0x6D, 0x67, 0x65, 0x74, 0x4C, 0x61, 0x73,
    0x74, 0x56, 0x61, 0x6C, 0x75, 0x65, 0x73,
];

// =============================================================================
// TRANSMIT BOUNDS
// =============================================================================

/// Default capacity of the outbound transmit / retransmission buffer.
///
/// An encode that produces more bytes than the configured capacity is a
/// configuration or programmer defect and is reported as
/// [`EncodeError::PayloadTooLarge`](super::EncodeError::PayloadTooLarge),
/// never silently truncated.
pub const MAX_TRANSMIT_BUFFER_SIZE: usize = 256;

// =============================================================================
// TRANSPORT PARAMETERS (reference values)
// =============================================================================

/// Default broker port (TLS-terminated publish/subscribe endpoint).
pub const DEFAULT_BROKER_PORT: u16 = 8883;

/// Recommended keep-alive interval for the broker session.
///
/// Applied by the transport implementation, not by the engine.
pub const BROKER_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Recommended timeout for a single broker connect attempt.
///
/// The engine retries on the next tick either way; this only bounds how
/// long one non-blocking attempt may take inside the transport.
pub const BROKER_CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);
