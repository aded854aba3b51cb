//! Host event sources.
//!
//! An [`EventSource`] connects the tracker to whatever surface produces UI
//! events. The tracker attaches to it once in [`crate::Tracker::init`] and
//! receives [`HostEvent`]s through an [`EventSink`].
//!
//! Two sources ship with the crate:
//!
//! - [`ManualSource`]: the embedding application (or a replay file) pushes
//!   events through a [`ManualSourceHandle`].
//! - [`NoopSource`]: hosts without a UI. Attaching succeeds and nothing is
//!   ever emitted.

mod manual;
mod noop;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use manual::{ManualSource, ManualSourceHandle};
pub use noop::NoopSource;

/// A node of the host's element tree, as much of it as the tracker reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementNode {
    /// Tag name, e.g. `button`.
    pub tag: String,
    /// `id` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `class` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// `name` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `type` attribute of inputs and buttons.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// `role` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// `href` attribute of links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// `src` attribute of media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ElementNode {
    /// Create a node with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the `id` attribute.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the `class` attribute.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the `name` attribute.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the `type` attribute.
    #[must_use]
    pub fn with_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    /// Set the `role` attribute.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the `href` attribute.
    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Set the `src` attribute.
    #[must_use]
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Lowercased tag name.
    #[must_use]
    pub fn tag_lower(&self) -> String {
        self.tag.to_ascii_lowercase()
    }

    /// Whether this is an `input`, `select` or `textarea`.
    #[must_use]
    pub fn is_form_control(&self) -> bool {
        matches!(self.tag_lower().as_str(), "input" | "select" | "textarea")
    }
}

/// One field of a submitted form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormField {
    /// Field name.
    pub name: String,
    /// Field value as the host reports it.
    pub value: String,
}

/// The state of a form at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSnapshot {
    /// `id` of the form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `class` of the form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Submission method as written in the markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Submission target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Fields in document order.
    pub fields: Vec<FormField>,
}

impl FormSnapshot {
    /// Append a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// A raw event observed on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    /// A click. `path` starts at the target and walks up its ancestors.
    Click {
        /// Target followed by its ancestors.
        path: Vec<ElementNode>,
    },
    /// A form control changed.
    Input {
        /// The control.
        element: ElementNode,
        /// Its new value. Only the length is ever recorded.
        value: String,
    },
    /// A form was submitted.
    Submit {
        /// The form.
        form: FormSnapshot,
    },
    /// An element gained focus.
    Focus {
        /// The element.
        element: ElementNode,
    },
    /// An element lost focus.
    Blur {
        /// The element.
        element: ElementNode,
    },
    /// The page changed.
    Navigation {
        /// Previous page, if the host knows it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        /// New page.
        to: String,
    },
    /// The page finished loading.
    #[serde(rename_all = "camelCase")]
    Load {
        /// Time from navigation start, if measured.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        load_time_ms: Option<u64>,
    },
    /// An exception nobody caught.
    UncaughtError {
        /// Error message.
        message: String,
        /// Script that raised it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        /// Line number.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<u32>,
        /// Column number.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column: Option<u32>,
        /// Stack trace.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
    /// A rejected promise nobody handled.
    UnhandledRejection {
        /// Rendered reason.
        reason: String,
    },
    /// A resource referenced by an element failed to load.
    ResourceError {
        /// The element, e.g. an `img`.
        element: ElementNode,
    },
}

/// The receiving end handed to an [`EventSource`] on attach.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(HostEvent) + Send + Sync>,
}

impl EventSink {
    /// Wrap a callback.
    pub fn new(deliver: impl Fn(HostEvent) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Deliver one event. Runs the tracker's capture synchronously.
    pub fn emit(&self, event: HostEvent) {
        (self.deliver)(event);
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// A producer of host events.
///
/// Implementors connect to a concrete UI surface and forward what they see
/// to the sink until detached.
pub trait EventSource: Send + Sync + std::fmt::Debug {
    /// The name of this source (for logging).
    fn name(&self) -> &'static str;

    /// Start forwarding events to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is already attached or cannot reach
    /// its host.
    fn attach(&mut self, sink: EventSink) -> crate::Result<()>;

    /// Stop forwarding events.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to release its host.
    fn detach(&mut self) -> crate::Result<()>;

    /// Whether the source is currently attached.
    fn is_attached(&self) -> bool;
}
