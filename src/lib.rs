//! # TETHER Protocol
//!
//! TETHER is a client-side protocol engine that maintains a persistent
//! data-synchronization session between a constrained device and a cloud
//! broker, over a publish/subscribe transport with a compact binary
//! property encoding. It provides:
//!
//! - **Resilience**: every failure degrades to a retry; the engine never
//!   terminates, it reconnects
//! - **Delivery**: the last transmitted property payload is redelivered
//!   after a transport interruption
//! - **Reconciliation**: the cloud's authoritative last-known values are
//!   fetched before local writes are accepted
//! - **Simplicity**: single-threaded, cooperatively polled, non-blocking
//!
//! ## Modules
//!
//! - [`core`]: Constants, error types, and the collaborator traits
//! - [`codec`]: Compact binary (CBOR) property record encoding
//! - [`property`]: The synchronized property set
//! - [`sync`]: Property sync engine, retransmission buffer, request timer
//! - [`session`]: The connection state machine
//! - [`update`]: Firmware-update orchestration seam
//!
//! ## Example Usage
//!
//! ```rust
//! use tether_protocol::prelude::*;
//! use tether_protocol::core::{InboundMessage, LinkStatus, TransportError};
//! # struct Link;
//! # impl NetworkLink for Link {
//! #     fn check(&mut self) -> LinkStatus { LinkStatus::Up }
//! # }
//! # struct Broker;
//! # impl BrokerTransport for Broker {
//! #     fn connect(&mut self, _: &str, _: u16) -> Result<(), TransportError> { Ok(()) }
//! #     fn connected(&self) -> bool { true }
//! #     fn subscribe(&mut self, _: &str) -> Result<(), TransportError> { Ok(()) }
//! #     fn publish(&mut self, _: &str, _: &[u8]) -> Result<(), TransportError> { Ok(()) }
//! #     fn poll(&mut self) -> Option<InboundMessage> { None }
//! #     fn stop(&mut self) {}
//! # }
//!
//! let config = SessionConfig::builder()
//!     .broker("broker.example.com", 8883)
//!     .device_id("device-0001")
//!     .thing_id("thing-0001")
//!     .build();
//!
//! let mut session = TetherSession::new(config, Link, Broker, SystemClock::new());
//! session.on_event(|event| println!("lifecycle: {event:?}"));
//! session.properties_mut().register(Property::read_write("counter", 0i64));
//!
//! // The caller owns the loop; each tick performs one bounded unit of work.
//! session.tick();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod core;
pub mod property;
pub mod session;
pub mod sync;
pub mod update;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{
        BrokerTransport, NetworkLink, SystemClock, TetherError, TimeSource, TransportError,
    };
    pub use crate::property::{Permission, Property, PropertyContainer, PropertyValue, SyncPolicy};
    pub use crate::session::{SessionConfig, SessionEvent, SessionState, TetherSession, TopicSet};
    pub use crate::update::UpdateHandler;
}

// Re-export commonly used items at crate root
pub use self::core::{BrokerTransport, NetworkLink, SystemClock, TetherError, TimeSource};
pub use property::{Property, PropertyContainer, PropertyValue};
pub use session::{SessionConfig, SessionEvent, SessionState, TetherSession};
