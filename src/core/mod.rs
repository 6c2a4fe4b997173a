//! TETHER Protocol - Core Layer
//!
//! Constants, error types, and the collaborator traits. Everything the
//! engine needs from the outside world crosses one of the seams defined
//! here:
//!
//! - [`NetworkLink`]: the physical connection handler
//! - [`BrokerTransport`]: the publish/subscribe transport
//! - [`TimeSource`]: monotonic and synchronized wall-clock time
//!
//! The engine itself never performs I/O; it drives these collaborators
//! one non-blocking call at a time.

pub mod constants;

mod error;
mod time;
mod traits;

pub use error::*;
pub use time::*;
pub use traits::*;
