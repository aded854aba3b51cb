//! Delivery of recorded events to the collection endpoints.
//!
//! [`Delivery`] is what the tracker calls after buffering an event. In
//! production mode it spawns a detached task that hands the serialized
//! event to a [`Transport`]; a failure is logged and dropped. In development
//! mode the event goes to the local log instead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::config::{Config, Mode};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpRequest, UreqClient};

/// Which collection endpoint an event goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Interaction events.
    Interactions,
    /// Error events.
    Errors,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interactions => write!(f, "interactions"),
            Self::Errors => write!(f, "errors"),
        }
    }
}

/// Something that can deliver one serialized event.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Deliver `payload` to the endpoint for `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint was unreachable or did not answer 2xx.
    async fn deliver(&self, channel: Channel, payload: &serde_json::Value) -> Result<()>;
}

/// POSTs events as JSON to the configured endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransport<C> {
    client: C,
    interactions_url: String,
    errors_url: String,
}

impl HttpTransport<UreqClient> {
    /// Build a transport from the `[endpoints]` configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            UreqClient::with_timeout(config.timeout()),
            config.interactions_url(),
            config.errors_url(),
        )
    }
}

impl<C: HttpClient> HttpTransport<C> {
    /// Create a transport over `client`.
    pub fn new(
        client: C,
        interactions_url: impl Into<String>,
        errors_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            interactions_url: interactions_url.into(),
            errors_url: errors_url.into(),
        }
    }

    /// The endpoint for `channel`.
    #[must_use]
    pub fn url(&self, channel: Channel) -> &str {
        match channel {
            Channel::Interactions => &self.interactions_url,
            Channel::Errors => &self.errors_url,
        }
    }
}

#[async_trait]
impl<C: HttpClient> Transport for HttpTransport<C> {
    async fn deliver(&self, channel: Channel, payload: &serde_json::Value) -> Result<()> {
        let url = self.url(channel).to_string();
        let request = HttpRequest::post_json(url.clone(), payload.to_string());

        match self.client.execute(request).await {
            Ok(response) if response.ok() => {
                debug!(%channel, status = response.status, "Event delivered");
                Ok(())
            }
            Ok(response) => Err(Error::DeliveryStatus {
                url,
                status: response.status,
            }),
            Err(e) => Err(Error::DeliveryTransport {
                url,
                message: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Counts one delivery as pending until dropped, whether the task
/// finished, panicked or was never polled.
#[derive(Debug)]
struct PendingDelivery(Arc<InFlight>);

impl PendingDelivery {
    fn start(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(in_flight))
    }
}

impl Drop for PendingDelivery {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Fire-and-forget dispatcher used by the tracker.
#[derive(Debug, Clone)]
pub struct Delivery {
    mode: Mode,
    transport: Arc<dyn Transport>,
    runtime: Option<Handle>,
    in_flight: Arc<InFlight>,
}

impl Delivery {
    /// Create a dispatcher. Without a runtime, production delivery is skipped.
    #[must_use]
    pub fn new(mode: Mode, transport: Arc<dyn Transport>, runtime: Option<Handle>) -> Self {
        Self {
            mode,
            transport,
            runtime,
            in_flight: Arc::default(),
        }
    }

    /// The runtime mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The transport used in production mode.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send `event` without waiting. Never fails and never blocks.
    pub fn dispatch<T: Serialize>(&self, channel: Channel, event: &T) {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%channel, error = %e, "Failed to serialize event");
                return;
            }
        };

        match self.mode {
            Mode::Development => {
                info!(target: "clicktrail::dev", %channel, event = %payload, "Event recorded");
            }
            Mode::Production => {
                let Some(runtime) = &self.runtime else {
                    warn!(%channel, "No async runtime available, event not delivered");
                    return;
                };
                let transport = Arc::clone(&self.transport);
                let pending = PendingDelivery::start(&self.in_flight);
                runtime.spawn(async move {
                    let _pending = pending;
                    if let Err(e) = transport.deliver(channel, &payload).await {
                        warn!(%channel, error = %e, "Failed to deliver event");
                    }
                });
            }
        }
    }

    /// Number of deliveries spawned and not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Wait until no delivery is pending, at most `timeout`.
    ///
    /// Returns `false` if deliveries were still pending when the timeout hit.
    /// Dispatching never waits on this; it is meant for shutdown.
    pub async fn settle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let idle = self.in_flight.idle.notified();
                if self.pending() == 0 {
                    return;
                }
                idle.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Debug, Default)]
    struct RecordingClient {
        requests: Mutex<Vec<HttpRequest>>,
        status: u16,
    }

    #[async_trait]
    impl HttpClient for RecordingClient {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, HttpError> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                status_text: String::new(),
                body: String::new(),
            })
        }
    }

    #[derive(Debug)]
    struct UnreachableClient;

    #[async_trait]
    impl HttpClient for UnreachableClient {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, HttpError> {
            Err(HttpError::Transport {
                url: request.url,
                message: "connection refused".to_string(),
            })
        }
    }

    #[derive(Debug)]
    struct ChannelTransport(mpsc::UnboundedSender<(Channel, serde_json::Value)>);

    #[async_trait]
    impl Transport for ChannelTransport {
        async fn deliver(&self, channel: Channel, payload: &serde_json::Value) -> Result<()> {
            let _ = self.0.send((channel, payload.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::Interactions.to_string(), "interactions");
        assert_eq!(Channel::Errors.to_string(), "errors");
    }

    #[test]
    fn test_from_config_urls() {
        let transport = HttpTransport::from_config(&Config::default());
        assert_eq!(
            transport.url(Channel::Interactions),
            "http://localhost:3000/api/analytics/interactions"
        );
        assert_eq!(
            transport.url(Channel::Errors),
            "http://localhost:3000/api/analytics/errors"
        );
    }

    #[tokio::test]
    async fn test_http_transport_posts_json() {
        let client = Arc::new(RecordingClient {
            status: 201,
            ..RecordingClient::default()
        });
        let transport = HttpTransport::new(Arc::clone(&client), "/i", "/e");

        transport
            .deliver(Channel::Errors, &serde_json::json!({"message": "boom"}))
            .await
            .unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "/e");
        assert_eq!(requests[0].body.as_deref(), Some(r#"{"message":"boom"}"#));
    }

    #[tokio::test]
    async fn test_http_transport_non_2xx_is_error() {
        let client = RecordingClient {
            status: 500,
            ..RecordingClient::default()
        };
        let transport = HttpTransport::new(client, "/i", "/e");

        let err = transport
            .deliver(Channel::Interactions, &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeliveryStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_http_transport_unreachable_is_error() {
        let transport = HttpTransport::new(UnreachableClient, "/i", "/e");

        let err = transport
            .deliver(Channel::Interactions, &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.is_delivery_error());
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_production_dispatch_spawns_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let delivery = Delivery::new(
            Mode::Production,
            Arc::new(ChannelTransport(tx)),
            Some(Handle::current()),
        );

        delivery.dispatch(Channel::Interactions, &serde_json::json!({"type": "click"}));

        let (channel, payload) = rx.recv().await.unwrap();
        assert_eq!(channel, Channel::Interactions);
        assert_eq!(payload["type"], "click");
    }

    #[tokio::test]
    async fn test_development_dispatch_does_not_send() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let delivery = Delivery::new(
            Mode::Development,
            Arc::new(ChannelTransport(tx)),
            Some(Handle::current()),
        );

        delivery.dispatch(Channel::Errors, &serde_json::json!({"message": "x"}));
        drop(delivery);

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_settle_waits_for_pending_deliveries() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let delivery = Delivery::new(
            Mode::Production,
            Arc::new(ChannelTransport(tx)),
            Some(Handle::current()),
        );

        for _ in 0..3 {
            delivery.dispatch(Channel::Errors, &serde_json::json!({}));
        }

        assert!(delivery.settle(Duration::from_secs(5)).await);
        assert_eq!(delivery.pending(), 0);
        for _ in 0..3 {
            assert!(rx.try_recv().is_ok());
        }
    }

    #[tokio::test]
    async fn test_settle_with_nothing_pending() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let delivery = Delivery::new(Mode::Development, Arc::new(ChannelTransport(tx)), None);
        assert!(delivery.settle(Duration::from_millis(10)).await);
    }

    #[derive(Debug)]
    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn deliver(&self, _channel: Channel, _payload: &serde_json::Value) -> Result<()> {
            panic!("transport blew up");
        }
    }

    #[tokio::test]
    async fn test_panicking_delivery_is_no_longer_pending() {
        let delivery = Delivery::new(
            Mode::Production,
            Arc::new(PanickingTransport),
            Some(Handle::current()),
        );

        delivery.dispatch(Channel::Interactions, &serde_json::json!({}));

        assert!(delivery.settle(Duration::from_secs(5)).await);
        assert_eq!(delivery.pending(), 0);
    }

    #[test]
    fn test_dispatch_on_shut_down_runtime_is_not_pending() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let (tx, _rx) = mpsc::unbounded_channel();
        let delivery = Delivery::new(
            Mode::Production,
            Arc::new(ChannelTransport(tx)),
            Some(handle),
        );
        delivery.dispatch(Channel::Errors, &serde_json::json!({}));

        assert_eq!(delivery.pending(), 0);
    }

    #[test]
    fn test_production_dispatch_without_runtime_is_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let delivery = Delivery::new(Mode::Production, Arc::new(ChannelTransport(tx)), None);

        delivery.dispatch(Channel::Interactions, &serde_json::json!({}));
        drop(delivery);

        assert!(rx.try_recv().is_err());
    }
}
