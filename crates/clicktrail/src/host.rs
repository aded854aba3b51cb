//! Host capabilities the tracker reads when stamping events.
//!
//! The tracker never asks the caller for page, user agent or viewport. It
//! reads them from a [`HostInfo`] chosen when the tracker is built.

use std::sync::{PoisonError, RwLock};

use crate::event::Viewport;

/// Read access to the hosting surface.
pub trait HostInfo: Send + Sync + std::fmt::Debug {
    /// The current page URL.
    fn page(&self) -> String;

    /// The user agent string.
    fn user_agent(&self) -> String;

    /// The visible area.
    fn viewport(&self) -> Viewport;

    /// Called when the host navigated to `to`. Hosts that track the page
    /// themselves can ignore it.
    fn navigated(&self, _to: &str) {}
}

/// A host with a fixed user agent and viewport and a page that follows
/// navigation events.
#[derive(Debug)]
pub struct StaticHost {
    page: RwLock<String>,
    user_agent: String,
    viewport: RwLock<Viewport>,
}

impl StaticHost {
    /// Create a host starting on `page`.
    #[must_use]
    pub fn new(page: impl Into<String>, user_agent: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            page: RwLock::new(page.into()),
            user_agent: user_agent.into(),
            viewport: RwLock::new(viewport),
        }
    }

    /// Build a host from the `[host]` configuration section.
    #[must_use]
    pub fn from_config(config: &crate::config::HostConfig) -> Self {
        Self::new(
            config.page.clone(),
            config.user_agent.clone(),
            Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
            },
        )
    }

    /// Replace the current page.
    pub fn set_page(&self, page: impl Into<String>) {
        *self.page.write().unwrap_or_else(PoisonError::into_inner) = page.into();
    }

    /// Replace the viewport, e.g. after a resize.
    pub fn resize(&self, viewport: Viewport) {
        *self.viewport.write().unwrap_or_else(PoisonError::into_inner) = viewport;
    }
}

impl HostInfo for StaticHost {
    fn page(&self) -> String {
        self.page
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn viewport(&self) -> Viewport {
        *self.viewport.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn navigated(&self, to: &str) {
        self.set_page(to);
    }
}
