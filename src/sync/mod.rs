//! TETHER Protocol - Sync Layer
//!
//! Implements:
//! - Outbound encoding of locally-changed properties
//! - Inbound application of delta updates and the shadow snapshot
//! - The single-payload retransmission guarantee
//! - Pacing of the reconciliation request
//!
//! The sync engine owns the wire-facing semantics of the property set;
//! the state machine in [`session`](crate::session) decides *when* each
//! operation runs.

mod retransmit;
mod timer;

pub use retransmit::*;
pub use timer::*;

use tracing::{debug, warn};

use crate::codec::{PropertyRecord, decode_records, encode_records};
use crate::core::constants::MAX_TRANSMIT_BUFFER_SIZE;
use crate::core::{DecodeError, EncodeError};
use crate::property::{Permission, Property, PropertyContainer, SyncPolicy};

/// Encodes outbound property payloads and applies inbound ones.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    transmit_capacity: usize,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(MAX_TRANSMIT_BUFFER_SIZE)
    }
}

impl SyncEngine {
    /// Create an engine that bounds outbound payloads to
    /// `transmit_capacity` bytes.
    pub fn new(transmit_capacity: usize) -> Self {
        Self { transmit_capacity }
    }

    /// Configured outbound payload bound.
    pub fn transmit_capacity(&self) -> usize {
        self.transmit_capacity
    }

    /// Encode every locally-changed property into a wire payload.
    ///
    /// Returns `Ok(None)` when nothing needs sending - not an error, the
    /// caller simply skips transmission. On success the changed markers
    /// are cleared; on [`EncodeError::PayloadTooLarge`] they are left
    /// set, since nothing was transmitted.
    pub fn encode_outbound(
        &self,
        properties: &mut PropertyContainer,
    ) -> Result<Option<Vec<u8>>, EncodeError> {
        let records: Vec<PropertyRecord> = properties
            .iter()
            .filter(|p| p.is_locally_changed())
            .map(|p| PropertyRecord {
                name: p.name().to_string(),
                value: p.value().clone(),
                time: (p.last_change_at() > 0).then_some(p.last_change_at()),
            })
            .collect();

        if records.is_empty() {
            return Ok(None);
        }

        let payload = encode_records(&records);
        if payload.len() > self.transmit_capacity {
            return Err(EncodeError::PayloadTooLarge {
                size: payload.len(),
                capacity: self.transmit_capacity,
            });
        }

        properties.clear_changed();
        Ok(Some(payload))
    }

    /// Apply a partial (delta) update: incoming values land on top of
    /// existing state. Returns the number of records applied.
    pub fn apply_delta(
        &self,
        properties: &mut PropertyContainer,
        payload: &[u8],
    ) -> Result<usize, DecodeError> {
        let records = decode_records(payload)?;
        let mut applied = 0;
        for record in records {
            if self.apply_record(properties, record, false) {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Apply the shadow snapshot: the cloud's authoritative last-known
    /// values, reconciled per property against local changes. Returns
    /// the number of records applied.
    pub fn apply_shadow(
        &self,
        properties: &mut PropertyContainer,
        payload: &[u8],
    ) -> Result<usize, DecodeError> {
        let records = decode_records(payload)?;
        let mut applied = 0;
        for record in records {
            if self.apply_record(properties, record, true) {
                applied += 1;
            }
        }
        Ok(applied)
    }

    fn apply_record(
        &self,
        properties: &mut PropertyContainer,
        record: PropertyRecord,
        shadow: bool,
    ) -> bool {
        let Some(property) = properties.get_mut(&record.name) else {
            debug!(name = %record.name, "ignoring update for unknown property");
            return false;
        };

        if property.permission() == Permission::Read {
            warn!(name = %record.name, "discarding cloud write to read-only property");
            return false;
        }

        if shadow && !self.shadow_wins(property.sync_policy(), property, &record) {
            debug!(name = %record.name, "keeping local value over shadow");
            return false;
        }

        let Some(value) = record.value.coerce_to(property.value()) else {
            warn!(
                name = %record.name,
                expected = property.value().kind(),
                "discarding update with mismatched value kind"
            );
            return false;
        };

        property.apply_cloud_value(value, record.time);
        true
    }

    /// Whether the shadow record overrides the local value.
    ///
    /// Only relevant when the property changed locally; an unchanged
    /// property always takes the authoritative value.
    fn shadow_wins(
        &self,
        policy: SyncPolicy,
        property: &Property,
        record: &PropertyRecord,
    ) -> bool {
        if !property.is_locally_changed() {
            return true;
        }
        match policy {
            SyncPolicy::CloudWins => true,
            SyncPolicy::DeviceWins => false,
            SyncPolicy::MostRecentWins => record.time.unwrap_or(0) >= property.last_change_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{Property, PropertyValue};

    fn container() -> PropertyContainer {
        let mut c = PropertyContainer::new();
        c.register(Property::read_write("counter", 0i64));
        c.register(Property::read_write("mode", "auto"));
        c.register(Property::read_only("uptime", 100i64));
        c.clear_changed();
        c
    }

    #[test]
    fn test_encode_nothing_changed() {
        let engine = SyncEngine::default();
        let mut props = container();
        assert_eq!(engine.encode_outbound(&mut props).unwrap(), None);
    }

    #[test]
    fn test_encode_clears_markers() {
        let engine = SyncEngine::default();
        let mut props = container();
        props.set("counter", 5i64);

        let payload = engine.encode_outbound(&mut props).unwrap().unwrap();
        assert!(!payload.is_empty());
        assert_eq!(props.changed_count(), 0);

        // Nothing left to send on the next pass.
        assert_eq!(engine.encode_outbound(&mut props).unwrap(), None);
    }

    #[test]
    fn test_encode_over_capacity_keeps_markers() {
        let engine = SyncEngine::new(8);
        let mut props = container();
        props.set("mode", "a value that cannot fit in eight bytes");

        let err = engine.encode_outbound(&mut props).unwrap_err();
        assert!(matches!(err, EncodeError::PayloadTooLarge { capacity: 8, .. }));
        assert_eq!(props.changed_count(), 1);
    }

    #[test]
    fn test_delta_applies_on_top() {
        let engine = SyncEngine::default();
        let mut props = container();

        let payload = encode_records(&[PropertyRecord::new("counter", 42i64)]);
        assert_eq!(engine.apply_delta(&mut props, &payload).unwrap(), 1);
        assert_eq!(props.int_value("counter"), Some(42));
        assert!(!props.get("counter").unwrap().is_locally_changed());
    }

    #[test]
    fn test_delta_ignores_unknown_and_read_only() {
        let engine = SyncEngine::default();
        let mut props = container();

        let payload = encode_records(&[
            PropertyRecord::new("nonexistent", 1i64),
            PropertyRecord::new("uptime", 0i64),
        ]);
        assert_eq!(engine.apply_delta(&mut props, &payload).unwrap(), 0);
        assert_eq!(props.int_value("uptime"), Some(100));
    }

    #[test]
    fn test_delta_kind_mismatch_discarded() {
        let engine = SyncEngine::default();
        let mut props = container();

        let payload = encode_records(&[PropertyRecord::new("counter", "not a number")]);
        assert_eq!(engine.apply_delta(&mut props, &payload).unwrap(), 0);
        assert_eq!(props.int_value("counter"), Some(0));
    }

    #[test]
    fn test_malformed_payload_reported() {
        let engine = SyncEngine::default();
        let mut props = container();
        assert!(engine.apply_delta(&mut props, &[0xa0]).is_err());
    }

    #[test]
    fn test_shadow_unchanged_property_takes_cloud_value() {
        let engine = SyncEngine::default();
        let mut props = container();

        let payload = encode_records(&[PropertyRecord::new("mode", "manual").with_time(50)]);
        assert_eq!(engine.apply_shadow(&mut props, &payload).unwrap(), 1);
        assert_eq!(props.text_value("mode"), Some("manual"));
    }

    #[test]
    fn test_shadow_most_recent_wins() {
        let engine = SyncEngine::default();
        let mut props = container();

        // Local change stamped at t=100; shadow value from t=50 loses.
        props.set("counter", 9i64);
        props.stamp_locally_changed(100);
        let stale = encode_records(&[PropertyRecord::new("counter", 1i64).with_time(50)]);
        assert_eq!(engine.apply_shadow(&mut props, &stale).unwrap(), 0);
        assert_eq!(props.int_value("counter"), Some(9));
        assert!(props.get("counter").unwrap().is_locally_changed());

        // A newer shadow value wins.
        let fresh = encode_records(&[PropertyRecord::new("counter", 2i64).with_time(200)]);
        assert_eq!(engine.apply_shadow(&mut props, &fresh).unwrap(), 1);
        assert_eq!(props.int_value("counter"), Some(2));
    }

    #[test]
    fn test_shadow_policies() {
        let engine = SyncEngine::default();
        let mut props = PropertyContainer::new();
        props.register(
            Property::read_write("cloud_led", false).with_sync_policy(SyncPolicy::CloudWins),
        );
        props.register(
            Property::read_write("target", 1i64).with_sync_policy(SyncPolicy::DeviceWins),
        );
        props.clear_changed();
        props.set("cloud_led", true);
        props.set("target", 2i64);
        props.stamp_locally_changed(100);

        let payload = encode_records(&[
            PropertyRecord::new("cloud_led", false).with_time(999),
            PropertyRecord::new("target", 7i64).with_time(999),
        ]);
        assert_eq!(engine.apply_shadow(&mut props, &payload).unwrap(), 1);
        assert_eq!(props.bool_value("cloud_led"), Some(false));
        assert_eq!(props.int_value("target"), Some(2));
    }

    #[test]
    fn test_shadow_int_coerced_to_float() {
        let engine = SyncEngine::default();
        let mut props = PropertyContainer::new();
        props.register(Property::read_write("temp", 0.0f64));
        props.clear_changed();

        let payload = encode_records(&[PropertyRecord::new("temp", 21i64).with_time(5)]);
        assert_eq!(engine.apply_shadow(&mut props, &payload).unwrap(), 1);
        assert_eq!(props.get("temp").unwrap().value(), &PropertyValue::Float(21.0));
    }
}
