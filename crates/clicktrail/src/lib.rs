//! `clicktrail` - interaction and error tracking for client applications
//!
//! A [`Tracker`] observes a UI surface through an [`source::EventSource`] and
//! outbound HTTP calls through [`http::TrackedClient`]. Every recorded event
//! is kept in a bounded in-memory buffer and forwarded, fire-and-forget, to
//! a collection endpoint. Sensitive form fields are redacted before anything
//! leaves the capture layer.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod http;
pub mod logging;
pub mod privacy;
pub mod source;
pub mod summary;
pub mod tracker;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use event::{
    ErrorDraft, ErrorEvent, ErrorType, InteractionDraft, InteractionEvent, InteractionType,
};
pub use http::{HttpClient, TrackedClient, UreqClient};
pub use logging::init_logging;
pub use summary::AnalyticsSummary;
pub use tracker::{Lifecycle, Tracker, TrackerBuilder, TrackerStatus};
