//! The interaction tracker.
//!
//! A [`Tracker`] is built once by the application and shared by cloning.
//! It owns the two ring buffers, stamps drafts into full events, hands them
//! to [`Delivery`], and answers queries over what is buffered.
//!
//! # Example
//!
//! ```
//! use clicktrail::{Config, Tracker};
//! use clicktrail::config::Mode;
//! use clicktrail::event::{InteractionDraft, InteractionType};
//!
//! let mut config = Config::default();
//! config.tracker.mode = Mode::Development;
//!
//! let tracker = Tracker::new(config);
//! tracker.init();
//! tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));
//!
//! assert_eq!(tracker.interaction_count(), 1);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::buffer::RingBuffer;
use crate::capture::{Captured, Capturer};
use crate::config::{Config, Mode};
use crate::event::{ErrorDraft, ErrorEvent, InteractionDraft, InteractionEvent};
use crate::host::{HostInfo, StaticHost};
use crate::http::{HttpClient, TrackedClient};
use crate::privacy::FieldFilter;
use crate::source::{EventSink, EventSource, HostEvent, NoopSource};
use crate::summary::AnalyticsSummary;
use crate::transport::{Channel, Delivery, HttpTransport, Transport};

/// Lifecycle of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Built, source not attached yet.
    Uninitialized,
    /// Source attached.
    Initialized,
    /// Source detached for good.
    Disposed,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized => write!(f, "initialized"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

/// Point-in-time status of a tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerStatus {
    /// Lifecycle state.
    pub lifecycle: Lifecycle,
    /// Runtime mode.
    pub mode: Mode,
    /// Name of the event source.
    pub source: &'static str,
    /// Whether the event source is attached.
    pub source_attached: bool,
    /// Buffered interactions.
    pub interaction_count: usize,
    /// Buffered errors.
    pub error_count: usize,
    /// Capacity of each buffer.
    pub max_events: usize,
    /// Deliveries spawned and not yet finished.
    pub pending_deliveries: usize,
}

#[derive(Debug, Default, Clone)]
struct Identity {
    user_id: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug)]
struct Inner {
    host: Arc<dyn HostInfo>,
    capturer: Capturer,
    delivery: Delivery,
    interactions: Mutex<RingBuffer<InteractionEvent>>,
    errors: Mutex<RingBuffer<ErrorEvent>>,
    source: Mutex<Box<dyn EventSource>>,
    lifecycle: Mutex<Lifecycle>,
    identity: RwLock<Identity>,
    recent_limit: usize,
    max_events: usize,
    observe_http: bool,
    /// Collection endpoints, full URLs and bare paths.
    own_endpoints: Vec<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for a [`Tracker`] with injected capabilities.
#[derive(Debug)]
pub struct TrackerBuilder {
    config: Config,
    host: Option<Arc<dyn HostInfo>>,
    source: Option<Box<dyn EventSource>>,
    transport: Option<Arc<dyn Transport>>,
    runtime: Option<Handle>,
}

impl TrackerBuilder {
    /// Use `host` for page, user agent and viewport.
    #[must_use]
    pub fn host(mut self, host: Arc<dyn HostInfo>) -> Self {
        self.host = Some(host);
        self
    }

    /// Use `source` for host events.
    #[must_use]
    pub fn source(mut self, source: impl EventSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Use `transport` for production delivery.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Spawn deliveries on `runtime`.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the tracker.
    ///
    /// Unset capabilities default to a [`StaticHost`] from the `[host]`
    /// section, a [`NoopSource`], an [`HttpTransport`] on the configured
    /// endpoints, and the tokio runtime the caller is running on, if any.
    #[must_use]
    pub fn build(self) -> Tracker {
        let config = self.config;
        let host = self
            .host
            .unwrap_or_else(|| Arc::new(StaticHost::from_config(&config.host)));
        let source = self
            .source
            .unwrap_or_else(|| Box::new(NoopSource::new()));
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::from_config(&config)));
        let runtime = self.runtime.or_else(|| Handle::try_current().ok());

        let own_endpoints = vec![
            config.interactions_url(),
            config.errors_url(),
            config.endpoints.interactions.clone(),
            config.endpoints.errors.clone(),
        ];

        Tracker {
            inner: Arc::new(Inner {
                host,
                capturer: Capturer::new(
                    config.capture.clone(),
                    FieldFilter::with_config(&config.privacy),
                ),
                delivery: Delivery::new(config.tracker.mode, transport, runtime),
                interactions: Mutex::new(RingBuffer::new(config.tracker.max_events)),
                errors: Mutex::new(RingBuffer::new(config.tracker.max_events)),
                source: Mutex::new(source),
                lifecycle: Mutex::new(Lifecycle::Uninitialized),
                identity: RwLock::new(Identity::default()),
                recent_limit: config.tracker.recent_limit,
                max_events: config.tracker.max_events,
                observe_http: config.capture.http,
                own_endpoints,
            }),
        }
    }
}

/// Records interactions and errors into bounded buffers and forwards them
/// to the collection endpoints.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("lifecycle", &*lock(&self.inner.lifecycle))
            .field("mode", &self.inner.delivery.mode())
            .field("max_events", &self.inner.max_events)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    /// Build a tracker with default capabilities.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::builder(config).build()
    }

    /// Start building a tracker.
    #[must_use]
    pub fn builder(config: Config) -> TrackerBuilder {
        TrackerBuilder {
            config,
            host: None,
            source: None,
            transport: None,
            runtime: None,
        }
    }

    /// Attach the event source. Only the first call has an effect; calls
    /// after [`dispose`](Self::dispose) are ignored. An attach failure is
    /// logged and the tracker stays usable through the direct API.
    pub fn init(&self) {
        let mut lifecycle = lock(&self.inner.lifecycle);
        match *lifecycle {
            Lifecycle::Initialized => {
                trace!("Tracker already initialized");
                return;
            }
            Lifecycle::Disposed => {
                debug!("Tracker disposed, init ignored");
                return;
            }
            Lifecycle::Uninitialized => {}
        }

        let weak = Arc::downgrade(&self.inner);
        let sink = EventSink::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                Tracker { inner }.handle_host_event(event);
            }
        });

        let mut source = lock(&self.inner.source);
        match source.attach(sink) {
            Ok(()) => debug!(source = source.name(), "Tracker initialized"),
            Err(e) => warn!(source = source.name(), error = %e, "Failed to attach event source"),
        }
        *lifecycle = Lifecycle::Initialized;
    }

    /// Detach the event source for good. Buffers and direct tracking keep
    /// working.
    pub fn dispose(&self) {
        let mut lifecycle = lock(&self.inner.lifecycle);
        if *lifecycle == Lifecycle::Initialized {
            let mut source = lock(&self.inner.source);
            if let Err(e) = source.detach() {
                warn!(source = source.name(), error = %e, "Failed to detach event source");
            }
        }
        *lifecycle = Lifecycle::Disposed;
        debug!("Tracker disposed");
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        *lock(&self.inner.lifecycle)
    }

    /// Set or clear the acting user.
    pub fn identify(&self, user_id: Option<String>) {
        self.inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .user_id = user_id;
    }

    /// Set or clear the session.
    pub fn set_session(&self, session_id: Option<String>) {
        self.inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .session_id = session_id;
    }

    fn identity(&self) -> Identity {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Classify and record one host event.
    ///
    /// Attached sources call this; hosts can also call it directly.
    pub fn handle_host_event(&self, event: HostEvent) {
        let current_page = self.inner.host.page();
        if let HostEvent::Navigation { to, .. } = &event {
            self.inner.host.navigated(to);
        }

        match self.inner.capturer.capture(&event, &current_page) {
            Some(Captured::Interaction(draft)) => self.track_interaction(draft),
            Some(Captured::Error(draft)) => self.track_error(draft),
            None => {}
        }
    }

    /// Record an interaction.
    ///
    /// Stamps page, time, user agent and viewport, buffers the event, then
    /// delivers it without waiting. Never fails.
    pub fn track_interaction(&self, mut draft: InteractionDraft) {
        let identity = self.identity();
        if draft.user_id.is_none() {
            draft.user_id = identity.user_id;
        }
        if draft.session_id.is_none() {
            draft.session_id = identity.session_id;
        }

        let host = &self.inner.host;
        let event = InteractionEvent::stamp(
            draft,
            host.page(),
            Utc::now(),
            host.user_agent(),
            host.viewport(),
        );
        trace!(kind = %event.kind, element = %event.element, "Interaction recorded");

        lock(&self.inner.interactions).push(event.clone());
        self.inner.delivery.dispatch(Channel::Interactions, &event);
    }

    /// Record an error. Same contract as [`track_interaction`](Self::track_interaction).
    pub fn track_error(&self, mut draft: ErrorDraft) {
        if draft.user_id.is_none() {
            draft.user_id = self.identity().user_id;
        }

        let event = ErrorEvent::stamp(draft, self.inner.host.page(), Utc::now());
        trace!(kind = %event.kind, "Error recorded");

        lock(&self.inner.errors).push(event.clone());
        self.inner.delivery.dispatch(Channel::Errors, &event);
    }

    /// The last `limit` interactions, oldest first. `None` uses the
    /// configured default (50).
    #[must_use]
    pub fn recent_interactions(&self, limit: Option<usize>) -> Vec<InteractionEvent> {
        lock(&self.inner.interactions).recent(limit.unwrap_or(self.inner.recent_limit))
    }

    /// The last `limit` errors, oldest first. `None` uses the configured
    /// default (50).
    #[must_use]
    pub fn recent_errors(&self, limit: Option<usize>) -> Vec<ErrorEvent> {
        lock(&self.inner.errors).recent(limit.unwrap_or(self.inner.recent_limit))
    }

    /// Number of buffered interactions.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        lock(&self.inner.interactions).len()
    }

    /// Number of buffered errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        lock(&self.inner.errors).len()
    }

    /// Empty both buffers.
    pub fn clear_data(&self) {
        lock(&self.inner.interactions).clear();
        lock(&self.inner.errors).clear();
        debug!("Tracker buffers cleared");
    }

    /// Aggregate the buffered events.
    #[must_use]
    pub fn analytics_summary(&self) -> AnalyticsSummary {
        let interactions = lock(&self.inner.interactions);
        let errors = lock(&self.inner.errors);
        AnalyticsSummary::from_buffers(&interactions, &errors)
    }

    /// Point-in-time status.
    #[must_use]
    pub fn status(&self) -> TrackerStatus {
        let (source, source_attached) = {
            let source = lock(&self.inner.source);
            (source.name(), source.is_attached())
        };
        TrackerStatus {
            lifecycle: self.lifecycle(),
            mode: self.inner.delivery.mode(),
            source,
            source_attached,
            interaction_count: self.interaction_count(),
            error_count: self.error_count(),
            max_events: self.inner.max_events,
            pending_deliveries: self.inner.delivery.pending(),
        }
    }

    /// Wait up to `timeout` for spawned deliveries to finish. Returns
    /// `false` if some were still pending.
    pub async fn flush(&self, timeout: Duration) -> bool {
        self.inner.delivery.settle(timeout).await
    }

    /// Wrap `client` so its calls are recorded with this tracker.
    pub fn tracked_client<C: HttpClient>(&self, client: C) -> TrackedClient<C> {
        TrackedClient::new(client, self.clone())
    }

    /// Whether a tracked HTTP call to `url` should be recorded.
    pub(crate) fn observes_url(&self, url: &str) -> bool {
        self.inner.observe_http
            && !self
                .inner
                .own_endpoints
                .iter()
                .any(|endpoint| targets_endpoint(url, endpoint))
    }
}

/// Whether `url` is `endpoint`, optionally followed by a query or fragment.
fn targets_endpoint(url: &str, endpoint: &str) -> bool {
    url.strip_prefix(endpoint)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['?', '#']))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ErrorType, InteractionContext, InteractionType, Viewport};
    use crate::source::{ElementNode, FormSnapshot, ManualSource};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    #[derive(Debug)]
    struct FailingTransport(mpsc::UnboundedSender<Channel>);

    #[async_trait]
    impl Transport for FailingTransport {
        async fn deliver(
            &self,
            channel: Channel,
            _payload: &serde_json::Value,
        ) -> crate::Result<()> {
            let _ = self.0.send(channel);
            Err(crate::Error::DeliveryTransport {
                url: "http://collector".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    #[derive(Debug)]
    struct CapturingTransport(mpsc::UnboundedSender<(Channel, serde_json::Value)>);

    #[async_trait]
    impl Transport for CapturingTransport {
        async fn deliver(
            &self,
            channel: Channel,
            payload: &serde_json::Value,
        ) -> crate::Result<()> {
            let _ = self.0.send((channel, payload.clone()));
            Ok(())
        }
    }

    fn dev_config() -> Config {
        let mut config = Config::default();
        config.tracker.mode = Mode::Development;
        config
    }

    fn host() -> Arc<StaticHost> {
        Arc::new(StaticHost::new(
            "https://rides.example.com/",
            "test-agent",
            Viewport {
                width: 1440,
                height: 900,
            },
        ))
    }

    fn click_on(tag: &str) -> HostEvent {
        HostEvent::Click {
            path: vec![ElementNode::new(tag)],
        }
    }

    #[test]
    fn test_bounded_buffer_keeps_last_events_in_order() {
        let mut config = dev_config();
        config.tracker.max_events = 5;
        let tracker = Tracker::new(config);

        for i in 0..12 {
            tracker.track_interaction(InteractionDraft::new(
                InteractionType::Click,
                format!("el{i}"),
            ));
        }

        assert_eq!(tracker.interaction_count(), 5);
        let elements: Vec<String> = tracker
            .recent_interactions(Some(5))
            .into_iter()
            .map(|e| e.element)
            .collect();
        assert_eq!(elements, vec!["el7", "el8", "el9", "el10", "el11"]);
    }

    #[test]
    fn test_default_recent_limit_is_fifty() {
        let tracker = Tracker::new(dev_config());
        for _ in 0..60 {
            tracker.track_error(ErrorDraft::new(ErrorType::User, "oops"));
        }
        assert_eq!(tracker.recent_errors(None).len(), 50);
        assert_eq!(tracker.recent_errors(Some(3)).len(), 3);
    }

    #[test]
    fn test_derived_fields_come_from_host() {
        let tracker = Tracker::builder(dev_config()).host(host()).build();
        tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));

        let event = &tracker.recent_interactions(None)[0];
        assert_eq!(event.page, "https://rides.example.com/");
        assert_eq!(event.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(event.viewport.map(|v| v.width), Some(1440));
    }

    #[test]
    fn test_identity_fills_missing_ids() {
        let tracker = Tracker::new(dev_config());
        tracker.identify(Some("rider-7".to_string()));
        tracker.set_session(Some("sess-1".to_string()));

        tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));
        tracker.track_interaction(
            InteractionDraft::new(InteractionType::Click, "button").user_id("admin"),
        );
        tracker.track_error(ErrorDraft::new(ErrorType::Api, "quote failed"));

        let interactions = tracker.recent_interactions(None);
        assert_eq!(interactions[0].user_id.as_deref(), Some("rider-7"));
        assert_eq!(interactions[0].session_id.as_deref(), Some("sess-1"));
        assert_eq!(interactions[1].user_id.as_deref(), Some("admin"));
        assert_eq!(
            tracker.recent_errors(None)[0].user_id.as_deref(),
            Some("rider-7")
        );
    }

    #[test]
    fn test_init_is_idempotent() {
        let source = ManualSource::new();
        let handle = source.handle();
        let tracker = Tracker::builder(dev_config()).source(source).build();

        tracker.init();
        tracker.init();
        tracker.init();
        handle.dispatch(click_on("button"));

        assert_eq!(tracker.lifecycle(), Lifecycle::Initialized);
        assert_eq!(tracker.interaction_count(), 1);
    }

    #[test]
    fn test_events_before_init_are_not_seen() {
        let source = ManualSource::new();
        let handle = source.handle();
        let tracker = Tracker::builder(dev_config()).source(source).build();

        assert!(!handle.dispatch(click_on("button")));
        assert_eq!(tracker.interaction_count(), 0);
    }

    #[test]
    fn test_init_with_noop_source_is_silent() {
        let tracker = Tracker::new(dev_config());
        tracker.init();

        let status = tracker.status();
        assert_eq!(status.lifecycle, Lifecycle::Initialized);
        assert_eq!(status.source, "noop");
        assert!(status.source_attached);
    }

    #[test]
    fn test_init_survives_attach_failure() {
        let mut source = ManualSource::new();
        source.attach(EventSink::new(|_| {})).unwrap();
        let tracker = Tracker::builder(dev_config()).source(source).build();

        tracker.init();
        assert_eq!(tracker.lifecycle(), Lifecycle::Initialized);
        tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));
        assert_eq!(tracker.interaction_count(), 1);
    }

    #[test]
    fn test_dispose_detaches_and_blocks_reinit() {
        let source = ManualSource::new();
        let handle = source.handle();
        let tracker = Tracker::builder(dev_config()).source(source).build();

        tracker.init();
        tracker.dispose();
        tracker.init();

        assert_eq!(tracker.lifecycle(), Lifecycle::Disposed);
        assert!(!handle.dispatch(click_on("button")));
        tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));
        assert_eq!(tracker.interaction_count(), 1);
    }

    #[test]
    fn test_submit_redaction_through_source() {
        let source = ManualSource::new();
        let handle = source.handle();
        let tracker = Tracker::builder(dev_config()).source(source).build();
        tracker.init();

        let form = FormSnapshot {
            method: Some("post".to_string()),
            ..FormSnapshot::default()
        }
        .field("Password", "hunter2")
        .field("email", "rider@example.com")
        .field("comments", "c".repeat(150));
        handle.dispatch(HostEvent::Submit { form });

        let event = &tracker.recent_interactions(None)[0];
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["context"]["formData"]["Password"], "[REDACTED]");
        assert_eq!(
            json["context"]["formData"]["comments"]
                .as_str()
                .map(str::len),
            Some(100)
        );
        assert!(!json.to_string().contains("hunter2"));
    }

    #[test]
    fn test_navigation_updates_page() {
        let host = host();
        let source = ManualSource::new();
        let handle = source.handle();
        let tracker = Tracker::builder(dev_config())
            .host(host.clone())
            .source(source)
            .build();
        tracker.init();

        handle.dispatch(HostEvent::Navigation {
            from: None,
            to: "https://rides.example.com/checkout".to_string(),
        });
        handle.dispatch(click_on("button"));

        let events = tracker.recent_interactions(None);
        assert_eq!(events[0].kind, InteractionType::Navigation);
        assert_eq!(events[0].page, "https://rides.example.com/checkout");
        match &events[0].context {
            Some(InteractionContext::Navigation(ctx)) => {
                assert_eq!(ctx.from.as_deref(), Some("https://rides.example.com/"));
            }
            other => panic!("unexpected context: {other:?}"),
        }
        assert_eq!(events[1].page, "https://rides.example.com/checkout");
        assert_eq!(host.page(), "https://rides.example.com/checkout");
    }

    #[test]
    fn test_host_errors_feed_error_buffer() {
        let tracker = Tracker::new(dev_config());
        tracker.handle_host_event(HostEvent::UnhandledRejection {
            reason: "timeout".to_string(),
        });
        tracker.handle_host_event(HostEvent::ResourceError {
            element: ElementNode::new("img").with_src("/logo.png"),
        });

        let errors = tracker.recent_errors(None);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ErrorType::Javascript);
        assert_eq!(errors[1].kind, ErrorType::Network);
    }

    #[test]
    fn test_summary_for_known_sequence() {
        let tracker = Tracker::new(dev_config());
        for _ in 0..3 {
            tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));
        }
        for _ in 0..2 {
            tracker.track_interaction(InteractionDraft::new(InteractionType::Submit, "form"));
        }
        tracker.track_error(ErrorDraft::new(ErrorType::Network, "offline"));

        let summary = tracker.analytics_summary();
        assert_eq!(summary.total_interactions, 5);
        assert_eq!(summary.total_errors, 1);
        assert_eq!(summary.interaction_types.len(), 2);
        assert_eq!(summary.interaction_types[&InteractionType::Click], 3);
        assert_eq!(summary.interaction_types[&InteractionType::Submit], 2);
        assert_eq!(summary.error_types.len(), 1);
        assert_eq!(summary.error_types[&ErrorType::Network], 1);

        assert_eq!(tracker.analytics_summary(), summary);
    }

    #[test]
    fn test_clear_data_resets_counts() {
        let tracker = Tracker::new(dev_config());
        tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));
        tracker.track_error(ErrorDraft::new(ErrorType::User, "oops"));

        tracker.clear_data();
        assert_eq!(tracker.interaction_count(), 0);
        assert_eq!(tracker.error_count(), 0);
        assert_eq!(tracker.analytics_summary().total_interactions, 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_not_observable() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tracker = Tracker::builder(Config::default())
            .transport(Arc::new(FailingTransport(tx)))
            .build();

        tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));
        tracker.track_error(ErrorDraft::new(ErrorType::Api, "bad gateway"));

        assert_eq!(rx.recv().await, Some(Channel::Interactions));
        assert_eq!(rx.recv().await, Some(Channel::Errors));
        assert_eq!(tracker.interaction_count(), 1);
        assert_eq!(tracker.error_count(), 1);
    }

    #[tokio::test]
    async fn test_production_delivers_full_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tracker = Tracker::builder(Config::default())
            .host(host())
            .transport(Arc::new(CapturingTransport(tx)))
            .build();

        tracker.track_interaction(
            InteractionDraft::new(InteractionType::Click, "button").element_id("book"),
        );

        assert!(tracker.flush(Duration::from_secs(5)).await);
        assert_eq!(tracker.status().pending_deliveries, 0);

        let (channel, payload) = rx.recv().await.unwrap();
        assert_eq!(channel, Channel::Interactions);
        assert_eq!(payload["type"], "click");
        assert_eq!(payload["elementId"], "book");
        assert_eq!(payload["page"], "https://rides.example.com/");
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn test_production_without_runtime_still_buffers() {
        let tracker = Tracker::new(Config::default());
        tracker.track_interaction(InteractionDraft::new(InteractionType::Click, "button"));
        assert_eq!(tracker.interaction_count(), 1);
    }

    #[test]
    fn test_tracker_is_shared_across_threads() {
        let tracker = Tracker::new(dev_config());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        tracker.track_interaction(InteractionDraft::new(
                            InteractionType::Input,
                            "input",
                        ));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.interaction_count(), 100);
    }

    #[test]
    fn test_own_endpoints_are_not_observed() {
        let tracker = Tracker::new(dev_config());

        assert!(!tracker.observes_url("http://localhost:3000/api/analytics/interactions"));
        assert!(!tracker.observes_url("/api/analytics/errors"));
        assert!(!tracker.observes_url("/api/analytics/errors?retry=1"));
    }

    #[test]
    fn test_app_urls_sharing_endpoint_prefix_are_observed() {
        let tracker = Tracker::new(dev_config());

        assert!(tracker.observes_url("/api/analytics/errors-report"));
        assert!(tracker.observes_url("/api/analytics/interactions/export"));
        assert!(tracker.observes_url("http://localhost:3000/api/analytics/errors-report"));
        assert!(tracker.observes_url("/api/quote"));
    }

    #[test]
    fn test_debug_output() {
        let tracker = Tracker::new(dev_config());
        let debug = format!("{tracker:?}");
        assert!(debug.contains("Tracker"));
        assert!(debug.contains("Uninitialized"));
    }
}
