//! TETHER Protocol - Session Layer
//!
//! The connection state machine. An external caller invokes
//! [`TetherSession::tick`] once per loop iteration; each tick performs
//! one bounded, non-blocking unit of work, driving the transport through
//! physical connection, time sync, broker connection, subscription,
//! initial state reconciliation, and steady-state synchronization.
//!
//! Nothing here is fatal: every failure degrades to retrying the same or
//! an earlier state, and a systemic outage shows up as a permanently
//! cycling [`SessionState::ConnectPhy`] observable through
//! [`TetherSession::state`] and [`TetherSession::stats`].

mod events;
mod topic;

pub use events::*;
pub use topic::*;

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::core::constants::{
    DEFAULT_BROKER_PORT, LAST_VALUES_REQUEST, LAST_VALUES_REQUEST_INTERVAL,
    MAX_TRANSMIT_BUFFER_SIZE,
};
use crate::core::{BrokerTransport, LinkStatus, NetworkLink, TimeSource};
use crate::property::PropertyContainer;
use crate::sync::{RequestTimer, RetransmitBuffer, SyncEngine};
use crate::update::{self, UpdateHandler};

/// Connection/synchronization state. Exactly one is active; it is
/// mutated only by the per-tick transition function (and by the shadow
/// response short-circuiting `RequestLastValues` to `Connected`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the physical link to come up.
    ConnectPhy,
    /// Reading the synchronized clock.
    SyncTime,
    /// Connecting to the cloud broker.
    ConnectBroker,
    /// Subscribing to the inbound channels.
    SubscribeTopics,
    /// Waiting for the cloud's authoritative last-known values.
    RequestLastValues,
    /// Steady-state synchronization.
    Connected,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Broker host name or address.
    pub broker_host: String,
    /// Broker port.
    pub broker_port: u16,
    /// Device identifier; names the data channels.
    pub device_id: String,
    /// Thing identifier; names the shadow channels. Without one the
    /// reconciliation handshake is skipped.
    pub thing_id: Option<String>,
    /// Minimum interval between reconciliation requests.
    pub request_interval: Duration,
    /// Outbound payload / retransmission buffer capacity.
    pub transmit_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            broker_host: String::new(),
            broker_port: DEFAULT_BROKER_PORT,
            device_id: String::new(),
            thing_id: None,
            request_interval: LAST_VALUES_REQUEST_INTERVAL,
            transmit_capacity: MAX_TRANSMIT_BUFFER_SIZE,
        }
    }
}

impl SessionConfig {
    /// Start building a configuration.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    /// Create a builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the broker endpoint.
    pub fn broker(mut self, host: &str, port: u16) -> Self {
        self.config.broker_host = host.to_string();
        self.config.broker_port = port;
        self
    }

    /// Set the device identifier.
    pub fn device_id(mut self, id: &str) -> Self {
        self.config.device_id = id.to_string();
        self
    }

    /// Set the thing identifier, enabling the shadow channels.
    pub fn thing_id(mut self, id: &str) -> Self {
        self.config.thing_id = Some(id.to_string());
        self
    }

    /// Set the minimum interval between reconciliation requests.
    pub fn request_interval(mut self, interval: Duration) -> Self {
        self.config.request_interval = interval;
        self
    }

    /// Set the outbound payload capacity.
    pub fn transmit_capacity(mut self, capacity: usize) -> Self {
        self.config.transmit_capacity = capacity;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// Counters exposed for operators; the engine never gives up, so
/// sustained failure is visible here rather than as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Broker connect attempts that failed.
    pub connect_failures: u64,
    /// Subscribe attempts that failed.
    pub subscribe_failures: u64,
    /// Property payloads published.
    pub publishes: u64,
    /// Payloads re-sent after a reconnect.
    pub retransmits: u64,
    /// Inbound payloads discarded as malformed.
    pub decode_errors: u64,
    /// Broker connection losses detected.
    pub disconnects: u64,
}

/// A device-to-cloud synchronization session.
///
/// Owns the connection state machine and the property set. Collaborators
/// (link, transport, clock, optional update handler) are injected at
/// construction. Single-threaded: the caller drives it by invoking
/// [`tick`](Self::tick) periodically, and a multi-threaded embedder must
/// guard the whole session behind one exclusive-access boundary.
pub struct TetherSession<L, T, C> {
    config: SessionConfig,
    topics: TopicSet,
    link: L,
    transport: T,
    time: C,
    state: SessionState,
    properties: PropertyContainer,
    engine: SyncEngine,
    retransmit: RetransmitBuffer,
    request_timer: RequestTimer,
    notifier: EventNotifier,
    update_handler: Option<Box<dyn UpdateHandler>>,
    stats: SessionStats,
}

impl<L, T, C> TetherSession<L, T, C>
where
    L: NetworkLink,
    T: BrokerTransport,
    C: TimeSource,
{
    /// Create a session.
    pub fn new(config: SessionConfig, link: L, transport: T, time: C) -> Self {
        let topics = TopicSet::new(&config.device_id, config.thing_id.as_deref());
        let engine = SyncEngine::new(config.transmit_capacity);
        let retransmit = RetransmitBuffer::new(config.transmit_capacity);
        let request_timer = RequestTimer::new(config.request_interval);
        Self {
            config,
            topics,
            link,
            transport,
            time,
            state: SessionState::ConnectPhy,
            properties: PropertyContainer::new(),
            engine,
            retransmit,
            request_timer,
            notifier: EventNotifier::new(),
            update_handler: None,
            stats: SessionStats::default(),
        }
    }

    /// Install a firmware-update handler and register the reserved
    /// update properties.
    pub fn with_update_handler(mut self, handler: impl UpdateHandler + 'static) -> Self {
        update::register_properties(&mut self.properties, handler.image_digest());
        self.update_handler = Some(Box::new(handler));
        self
    }

    /// Register the lifecycle-event observer, replacing any previous
    /// one. The observer runs inline within the tick and must not block.
    pub fn on_event(&mut self, observer: impl FnMut(SessionEvent) + 'static) {
        self.notifier.register(observer);
    }

    /// Current state, for observability.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Counters, for observability.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The channel names this session uses.
    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    /// The synchronized property set.
    pub fn properties(&self) -> &PropertyContainer {
        &self.properties
    }

    /// The synchronized property set, mutably.
    pub fn properties_mut(&mut self) -> &mut PropertyContainer {
        &mut self.properties
    }

    /// Log the session configuration.
    pub fn log_configuration(&self) {
        info!(
            device_id = %self.config.device_id,
            thing_id = self.config.thing_id.as_deref().unwrap_or("-"),
            broker = %self.config.broker_host,
            port = self.config.broker_port,
            "session configuration"
        );
    }

    /// Advance the state machine by one step, then drain inbound
    /// messages. Never blocks; every tick performs at most one bounded
    /// unit of work and returns.
    pub fn tick(&mut self) {
        let next = match self.state {
            SessionState::ConnectPhy => self.on_connect_phy(),
            SessionState::SyncTime => self.on_sync_time(),
            SessionState::ConnectBroker => self.on_connect_broker(),
            SessionState::SubscribeTopics => self.on_subscribe_topics(),
            SessionState::RequestLastValues => self.on_request_last_values(),
            SessionState::Connected => self.on_connected(),
        };
        self.transition(next);

        if self.transport.connected() {
            while let Some(message) = self.transport.poll() {
                self.handle_message(&message.topic, &message.payload);
            }
        }
    }

    /// Route an inbound message.
    ///
    /// This is the callback surface for transports that dispatch on
    /// their own call stack; [`tick`](Self::tick) also feeds polled
    /// messages through here. It must never be called from within the
    /// observer, and it never invokes `tick` itself.
    pub fn handle_message(&mut self, topic: &str, payload: &[u8]) {
        if topic == self.topics.data_in() {
            match self.engine.apply_delta(&mut self.properties, payload) {
                Ok(applied) => debug!(records = applied, "applied delta update"),
                Err(err) => {
                    self.stats.decode_errors += 1;
                    warn!(%err, "discarding malformed delta payload");
                }
            }
        } else if self.topics.shadow_in() == Some(topic)
            && self.state == SessionState::RequestLastValues
        {
            match self.engine.apply_shadow(&mut self.properties, payload) {
                Ok(applied) => {
                    debug!(records = applied, "last values received");
                    self.send_changed_properties();
                    self.notifier.emit(SessionEvent::Sync);
                    self.transition(SessionState::Connected);
                }
                Err(err) => {
                    self.stats.decode_errors += 1;
                    warn!(%err, "discarding malformed shadow payload");
                }
            }
        }
    }

    /// Restart the session from scratch: back to link bring-up with the
    /// retransmission buffer and request pacing cleared.
    pub fn reset(&mut self) {
        self.transport.stop();
        self.retransmit.reset();
        self.request_timer.reset();
        self.transition(SessionState::ConnectPhy);
    }

    fn transition(&mut self, next: SessionState) {
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "state transition");
            self.state = next;
        }
    }

    fn on_connect_phy(&mut self) -> SessionState {
        match self.link.check() {
            LinkStatus::Up => SessionState::SyncTime,
            LinkStatus::Down => SessionState::ConnectPhy,
        }
    }

    fn on_sync_time(&mut self) -> SessionState {
        let unix_time = self.time.unix_time();
        debug!(unix_time, "internal clock synchronized");
        SessionState::ConnectBroker
    }

    fn on_connect_broker(&mut self) -> SessionState {
        match self
            .transport
            .connect(&self.config.broker_host, self.config.broker_port)
        {
            Ok(()) => SessionState::SubscribeTopics,
            Err(err) => {
                self.stats.connect_failures += 1;
                warn!(
                    host = %self.config.broker_host,
                    port = self.config.broker_port,
                    %err,
                    "broker connect failed"
                );
                // Conservative regression: assume the transport needs a
                // full restart from link bring-up.
                SessionState::ConnectPhy
            }
        }
    }

    fn on_subscribe_topics(&mut self) -> SessionState {
        if let Err(err) = self.transport.subscribe(self.topics.data_in()) {
            self.stats.subscribe_failures += 1;
            warn!(topic = self.topics.data_in(), %err, "subscribe failed");
            return SessionState::SubscribeTopics;
        }

        if let Some(shadow_in) = self.topics.shadow_in() {
            if let Err(err) = self.transport.subscribe(shadow_in) {
                self.stats.subscribe_failures += 1;
                warn!(topic = shadow_in, %err, "subscribe failed");
                return SessionState::SubscribeTopics;
            }
        }

        info!("connected to cloud broker");
        self.notifier.emit(SessionEvent::Connect);

        if self.topics.has_shadow() {
            SessionState::RequestLastValues
        } else {
            SessionState::Connected
        }
    }

    fn on_request_last_values(&mut self) -> SessionState {
        let now = self.time.now_millis();
        if self.request_timer.should_fire(now) {
            debug!("requesting last values from cloud shadow");
            if let Some(shadow_out) = self.topics.shadow_out() {
                if let Err(err) = self.transport.publish(shadow_out, &LAST_VALUES_REQUEST) {
                    warn!(%err, "last-values request failed");
                }
            }
            self.request_timer.mark_fired(now);
        }
        SessionState::RequestLastValues
    }

    fn on_connected(&mut self) -> SessionState {
        if !self.transport.connected() {
            warn!("broker connection lost");
            self.transport.stop();
            // The last payload may not have made it; flag it for resend.
            self.retransmit.mark_pending();
            self.request_timer.reset();
            self.stats.disconnects += 1;
            self.notifier.emit(SessionEvent::Disconnect);
            return SessionState::ConnectPhy;
        }

        // Timestamps feed the shadow conflict resolution and a valid
        // clock only exists once connected.
        let now = self.time.unix_time();
        self.properties.stamp_locally_changed(now);

        if let Some(payload) = self.retransmit.drain() {
            debug!(len = payload.len(), "retransmitting last payload");
            self.publish_data(&payload);
            self.stats.retransmits += 1;
        }

        self.send_changed_properties();
        self.service_update_request();

        SessionState::Connected
    }

    fn send_changed_properties(&mut self) {
        match self.engine.encode_outbound(&mut self.properties) {
            Ok(None) => {}
            Ok(Some(payload)) => {
                if let Err(err) = self.retransmit.store(&payload) {
                    error!(%err, "payload not captured for retransmission");
                }
                self.publish_data(&payload);
                self.stats.publishes += 1;
            }
            Err(err) => error!(%err, "outbound encode rejected"),
        }
    }

    fn publish_data(&mut self, payload: &[u8]) {
        if let Err(err) = self.transport.publish(self.topics.data_out(), payload) {
            warn!(%err, "publish failed");
        }
    }

    fn service_update_request(&mut self) {
        if self.update_handler.is_none() {
            return;
        }
        if self.properties.bool_value(update::REQUEST_PROPERTY) != Some(true) {
            return;
        }

        // Clear the previous error and report that before starting.
        self.properties.set(update::ERROR_PROPERTY, 0i64);
        self.send_changed_properties();
        self.properties.set(update::REQUEST_PROPERTY, false);

        let url = self
            .properties
            .text_value(update::URL_PROPERTY)
            .unwrap_or_default()
            .to_string();
        info!(%url, "starting firmware update");

        let result = self.update_handler.as_mut().map(|h| h.apply(&url));
        if let Some(Err(err)) = result {
            warn!(%err, "firmware update failed");
            self.properties.set(update::ERROR_PROPERTY, err.code());
        }
    }
}
