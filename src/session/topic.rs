//! Logical channel names for a synchronization session.

/// The four channels a session uses, derived once from the device and
/// thing identifiers and cached for the session lifetime.
///
/// The shadow pair exists only when a thing identifier is configured;
/// without it the reconciliation handshake is skipped entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    data_out: String,
    data_in: String,
    shadow_out: Option<String>,
    shadow_in: Option<String>,
}

impl TopicSet {
    /// Derive the channel names.
    pub fn new(device_id: &str, thing_id: Option<&str>) -> Self {
        Self {
            data_out: format!("/a/d/{device_id}/e/o"),
            data_in: format!("/a/d/{device_id}/e/i"),
            shadow_out: thing_id.map(|t| format!("/a/t/{t}/shadow/o")),
            shadow_in: thing_id.map(|t| format!("/a/t/{t}/shadow/i")),
        }
    }

    /// Channel for outbound property payloads.
    pub fn data_out(&self) -> &str {
        &self.data_out
    }

    /// Channel for inbound delta updates.
    pub fn data_in(&self) -> &str {
        &self.data_in
    }

    /// Channel for the reconciliation request, when shadow is in use.
    pub fn shadow_out(&self) -> Option<&str> {
        self.shadow_out.as_deref()
    }

    /// Channel for the shadow snapshot, when shadow is in use.
    pub fn shadow_in(&self) -> Option<&str> {
        self.shadow_in.as_deref()
    }

    /// Whether the shadow channels exist.
    pub fn has_shadow(&self) -> bool {
        self.shadow_in.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_with_shadow() {
        let topics = TopicSet::new("dev-1", Some("thing-9"));
        assert_eq!(topics.data_out(), "/a/d/dev-1/e/o");
        assert_eq!(topics.data_in(), "/a/d/dev-1/e/i");
        assert_eq!(topics.shadow_out(), Some("/a/t/thing-9/shadow/o"));
        assert_eq!(topics.shadow_in(), Some("/a/t/thing-9/shadow/i"));
        assert!(topics.has_shadow());
    }

    #[test]
    fn test_topics_without_shadow() {
        let topics = TopicSet::new("dev-1", None);
        assert_eq!(topics.shadow_out(), None);
        assert_eq!(topics.shadow_in(), None);
        assert!(!topics.has_shadow());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(
            TopicSet::new("d", Some("t")),
            TopicSet::new("d", Some("t"))
        );
    }
}
