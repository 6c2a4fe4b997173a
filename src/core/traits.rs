//! Collaborator traits for the TETHER protocol.
//!
//! These traits define what the engine needs from its environment. All
//! of them are synchronous and non-blocking: a call performs at most one
//! bounded unit of work and returns, and the engine retries on a later
//! tick when an operation has not completed yet.

use super::error::TransportError;

/// State of the physical network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Link is up and traffic can flow.
    Up,
    /// Link is down or still coming up.
    Down,
}

/// The physical connection handler (WiFi, cellular, Ethernet, ...).
///
/// Implementations own link bring-up entirely; `check` may advance an
/// internal reconnection state machine, but must never block.
pub trait NetworkLink {
    /// Advance link bring-up and report the current status.
    fn check(&mut self) -> LinkStatus;
}

/// A message that arrived on a subscribed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message arrived on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// The publish/subscribe transport terminating at the cloud broker.
///
/// Connection security (TLS, certificates, secure-element identity) is
/// owned entirely by the implementation; the engine only drives the
/// session. Failures are reported as [`TransportError`] values and
/// handled by state retry, never escalated.
pub trait BrokerTransport {
    /// Begin or complete a broker connect attempt. Non-blocking: a
    /// transport that cannot finish within its own connect timeout
    /// reports an error and the engine retries from an earlier state.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    /// Whether the broker session is currently up.
    fn connected(&self) -> bool;

    /// Subscribe to a topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Publish a payload to a topic.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Fetch the next inbound message, if one has arrived.
    ///
    /// Called repeatedly within a tick until it returns `None`. A
    /// transport that dispatches messages on its own call stack instead
    /// may deliver them directly to
    /// [`TetherSession::handle_message`](crate::session::TetherSession::handle_message)
    /// and always return `None` here.
    fn poll(&mut self) -> Option<InboundMessage>;

    /// Tear down the broker session. The engine calls this when it
    /// detects a lost connection, before regressing to link bring-up.
    fn stop(&mut self);
}

/// Time as seen by the engine.
///
/// Two clocks are needed: a monotonic one for request pacing, and a
/// synchronized wall clock for stamping locally-changed properties. The
/// wall clock only needs to be valid while the session is connected;
/// time synchronization itself is an external concern.
pub trait TimeSource {
    /// Milliseconds since an arbitrary fixed origin; monotonic.
    fn now_millis(&self) -> u64;

    /// Seconds since the Unix epoch, from the synchronized clock.
    fn unix_time(&self) -> u64;
}
