//! TETHER Protocol - Update Orchestration Seam
//!
//! The cloud drives firmware updates through a handful of reserved
//! properties; the download/apply mechanism itself is an external
//! collaborator behind [`UpdateHandler`]. A session constructed without
//! a handler registers none of this and reports no update capability.

use crate::core::UpdateError;
use crate::property::{Property, PropertyContainer, SyncPolicy};

/// Whether the device can accept updates (bool, device-owned).
pub const CAPABLE_PROPERTY: &str = "OTA_CAP";

/// Last update error code, `0` for none (int, device-owned).
pub const ERROR_PROPERTY: &str = "OTA_ERROR";

/// Digest of the currently running image (text, device-owned).
pub const DIGEST_PROPERTY: &str = "OTA_SHA256";

/// URL of the image to fetch (text, cloud-writable).
pub const URL_PROPERTY: &str = "OTA_URL";

/// Set true by the cloud to request an update (bool, cloud-writable).
pub const REQUEST_PROPERTY: &str = "OTA_REQ";

/// Strategy object that fetches and applies a firmware image.
///
/// Selected at construction time per target; the state machine stays
/// target-agnostic. `apply` runs inline within a tick, so an
/// implementation that cannot finish quickly should hand off to its own
/// mechanism (e.g. stage the request and reboot into a loader).
pub trait UpdateHandler {
    /// Digest of the currently running image, reported to the cloud for
    /// post-update version checks. Empty when unknown.
    fn image_digest(&self) -> String {
        String::new()
    }

    /// Fetch the image at `url` and apply it.
    fn apply(&mut self, url: &str) -> Result<(), UpdateError>;
}

/// Register the reserved update properties for a session that has a
/// handler installed.
///
/// The writable pair is device-wins on shadow reconciliation: a stale
/// request echoed back by the cloud must not retrigger an update.
pub(crate) fn register_properties(properties: &mut PropertyContainer, digest: String) {
    properties.register(Property::read_only(CAPABLE_PROPERTY, true));
    properties.register(Property::read_only(ERROR_PROPERTY, 0i64));
    properties.register(Property::read_only(DIGEST_PROPERTY, digest));
    properties.register(
        Property::read_write(URL_PROPERTY, "").with_sync_policy(SyncPolicy::DeviceWins),
    );
    properties.register(
        Property::read_write(REQUEST_PROPERTY, false).with_sync_policy(SyncPolicy::DeviceWins),
    );
}
