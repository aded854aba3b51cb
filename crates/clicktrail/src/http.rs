//! Outbound HTTP: a minimal client abstraction and an observing decorator.
//!
//! The application is handed a [`TrackedClient`] instead of a bare client.
//! It times every call and records the outcome with the tracker, then
//! returns exactly what the wrapped client returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

use crate::event::{
    ApiContext, ErrorContext, ErrorDraft, ErrorType, InteractionContext, InteractionDraft,
    InteractionType, NetworkContext,
};
use crate::tracker::Tracker;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// The method token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute or host-relative URL.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<String>,
}

impl HttpRequest {
    /// A bodiless request.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// A POST request with a JSON body.
    #[must_use]
    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
            .header("content-type", "application/json")
            .body(body)
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase.
    pub status_text: String,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A request that produced no response.
///
/// Non-2xx statuses are responses, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The response body could not be read.
    #[error("failed to read response from {url}: {message}")]
    Body {
        /// Requested URL.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The blocking request task did not complete.
    #[error("request task failed: {0}")]
    Task(String),
}

/// Something that can perform HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync + std::fmt::Debug {
    /// Perform a request.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).execute(request).await
    }
}

/// [`HttpClient`] backed by a blocking `ureq` agent run on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Create a client with ureq's default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// Create a client with an overall request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }

    fn execute_blocking(
        agent: &ureq::Agent,
        request: &HttpRequest,
    ) -> Result<HttpResponse, HttpError> {
        let mut call = agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match &request.body {
            Some(body) => call.send_string(body),
            None => call.call(),
        };

        match result {
            Ok(response) | Err(ureq::Error::Status(_, response)) => {
                read_response(&request.url, response)
            }
            Err(ureq::Error::Transport(transport)) => Err(HttpError::Transport {
                url: request.url.clone(),
                message: transport.to_string(),
            }),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

fn read_response(url: &str, response: ureq::Response) -> Result<HttpResponse, HttpError> {
    let status = response.status();
    let status_text = response.status_text().to_string();
    let body = response.into_string().map_err(|e| HttpError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(HttpResponse {
        status,
        status_text,
        body,
    })
}

#[async_trait]
impl HttpClient for UreqClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || Self::execute_blocking(&agent, &request))
            .await
            .map_err(|e| HttpError::Task(e.to_string()))?
    }
}

/// An [`HttpClient`] decorator that records every call with a [`Tracker`].
///
/// Successful responses become `load` interactions on element `api`;
/// failures become `network` errors. Calls to the tracker's own collection
/// endpoints pass through unrecorded.
#[derive(Debug, Clone)]
pub struct TrackedClient<C> {
    inner: C,
    tracker: Tracker,
}

impl<C: HttpClient> TrackedClient<C> {
    /// Wrap `inner`, recording into `tracker`.
    pub fn new(inner: C, tracker: Tracker) -> Self {
        Self { inner, tracker }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for TrackedClient<C> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        if !self.tracker.observes_url(&request.url) {
            return self.inner.execute(request).await;
        }

        let url = request.url.clone();
        let method = request.method;
        let started = Instant::now();
        let result = self.inner.execute(request).await;
        let duration = elapsed_ms(started);

        match &result {
            Ok(response) => {
                let mut draft = InteractionDraft::new(InteractionType::Load, "api")
                    .context(InteractionContext::Api(ApiContext {
                        url,
                        method: method.to_string(),
                        status: response.status,
                        status_text: response.status_text.clone(),
                    }))
                    .success(response.ok())
                    .duration_ms(duration);
                if !response.ok() {
                    draft = draft.error(format!("HTTP {}", response.status));
                }
                self.tracker.track_interaction(draft);
            }
            Err(error) => {
                self.tracker.track_error(
                    ErrorDraft::new(ErrorType::Network, error.to_string())
                        .element("api")
                        .context(ErrorContext::Network(NetworkContext {
                            url,
                            method: method.to_string(),
                            duration,
                        })),
                );
            }
        }

        result
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
