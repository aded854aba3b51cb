//! Core event types for clicktrail.
//!
//! This module defines the records the tracker buffers and delivers
//! ([`InteractionEvent`], [`ErrorEvent`]) and the drafts callers hand to the
//! tracker ([`InteractionDraft`], [`ErrorDraft`]). A draft carries only the
//! semantic fields; the tracker stamps page, time, user agent and viewport.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of interaction that was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    /// A pointer click.
    Click,
    /// A change to a form control.
    Input,
    /// A form submission.
    Submit,
    /// A form control gained focus.
    Focus,
    /// A form control lost focus.
    Blur,
    /// An interaction that ended in an error.
    Error,
    /// A page or resource finished loading, including observed API calls.
    Load,
    /// The current page changed.
    Navigation,
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Click => write!(f, "click"),
            Self::Input => write!(f, "input"),
            Self::Submit => write!(f, "submit"),
            Self::Focus => write!(f, "focus"),
            Self::Blur => write!(f, "blur"),
            Self::Error => write!(f, "error"),
            Self::Load => write!(f, "load"),
            Self::Navigation => write!(f, "navigation"),
        }
    }
}

/// Classification of a recorded fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    /// Uncaught exceptions and unhandled rejections in the host.
    Javascript,
    /// Failed HTTP calls and failed image loads.
    Network,
    /// Caller-classified validation failures.
    Validation,
    /// Caller-classified API-level failures.
    Api,
    /// Caller-classified user-triggered errors.
    User,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Javascript => write!(f, "javascript"),
            Self::Network => write!(f, "network"),
            Self::Validation => write!(f, "validation"),
            Self::Api => write!(f, "api"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Size of the visible area at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
}

/// Context of a click.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickContext {
    /// Leading text of the clicked element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Link target, for links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Metadata about a change to a form control. Never holds the value itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputContext {
    /// `name` attribute of the control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// `type` attribute of the control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Length of the current value in characters.
    pub value_length: usize,
    /// Whether the control holds a non-empty value.
    pub has_value: bool,
}

/// A serialized form submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitContext {
    /// `id` of the form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    /// Uppercased submission method.
    pub method: String,
    /// Submission target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Field values after redaction and truncation.
    pub form_data: BTreeMap<String, String>,
    /// Number of fields in the form.
    pub field_count: usize,
}

/// A form control gaining or losing focus.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusContext {
    /// `name` attribute of the control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// `type` attribute of the control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

/// A page change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationContext {
    /// Page before the change, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Page after the change.
    pub to: String,
}

/// A completed page load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadContext {
    /// Time from navigation start to load, when the host reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_time_ms: Option<u64>,
}

/// An outbound HTTP call that produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContext {
    /// Requested URL.
    pub url: String,
    /// Request method.
    pub method: String,
    /// Response status code.
    pub status: u16,
    /// Response reason phrase.
    pub status_text: String,
}

/// Strongly typed supplementary attributes of an interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InteractionContext {
    /// See [`ClickContext`].
    Click(ClickContext),
    /// See [`InputContext`].
    Input(InputContext),
    /// See [`SubmitContext`].
    Submit(SubmitContext),
    /// See [`FocusContext`].
    Focus(FocusContext),
    /// See [`NavigationContext`].
    Navigation(NavigationContext),
    /// See [`LoadContext`].
    Load(LoadContext),
    /// See [`ApiContext`].
    Api(ApiContext),
    /// Free-form attributes supplied by the caller, nested so they never
    /// collide with the `kind` tag.
    Custom {
        /// Caller-defined keys and values.
        attributes: serde_json::Map<String, serde_json::Value>,
    },
}

/// An outbound HTTP call that never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkContext {
    /// Requested URL.
    pub url: String,
    /// Request method.
    pub method: String,
    /// Elapsed time until the failure, in milliseconds.
    pub duration: u64,
}

/// Source location of an uncaught error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptContext {
    /// Script that raised the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Line number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Column number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// An unhandled rejection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionContext {
    /// Rendered rejection reason.
    pub reason: String,
}

/// A resource that failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContext {
    /// Tag of the element that requested the resource.
    pub tag: String,
    /// Resource location.
    pub src: String,
}

/// Strongly typed supplementary attributes of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ErrorContext {
    /// See [`NetworkContext`].
    Network(NetworkContext),
    /// See [`ScriptContext`].
    Script(ScriptContext),
    /// See [`RejectionContext`].
    Rejection(RejectionContext),
    /// See [`ResourceContext`].
    Resource(ResourceContext),
    /// Free-form attributes supplied by the caller, nested so they never
    /// collide with the `kind` tag.
    Custom {
        /// Caller-defined keys and values.
        attributes: serde_json::Map<String, serde_json::Value>,
    },
}

/// The caller-supplied part of an interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionDraft {
    /// What happened.
    pub kind: InteractionType,
    /// Canonical element category, e.g. `button` or `api`.
    pub element: String,
    /// `id` of the element.
    pub element_id: Option<String>,
    /// `class` of the element.
    pub element_class: Option<String>,
    /// Acting user; filled from the tracker identity when unset.
    pub user_id: Option<String>,
    /// Session; filled from the tracker identity when unset.
    pub session_id: Option<String>,
    /// Supplementary attributes.
    pub context: Option<InteractionContext>,
    /// Outcome, for outcome-bearing interactions.
    pub success: Option<bool>,
    /// Failure message, for failed interactions.
    pub error: Option<String>,
    /// Duration of a timed operation in milliseconds.
    pub duration_ms: Option<u64>,
}

impl InteractionDraft {
    /// Start a draft for the given kind and element.
    #[must_use]
    pub fn new(kind: InteractionType, element: impl Into<String>) -> Self {
        Self {
            kind,
            element: element.into(),
            element_id: None,
            element_class: None,
            user_id: None,
            session_id: None,
            context: None,
            success: None,
            error: None,
            duration_ms: None,
        }
    }

    /// Set the element id.
    #[must_use]
    pub fn element_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Set the element class.
    #[must_use]
    pub fn element_class(mut self, class: impl Into<String>) -> Self {
        self.element_class = Some(class.into());
        self
    }

    /// Set the context.
    #[must_use]
    pub fn context(mut self, context: InteractionContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the outcome.
    #[must_use]
    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Set the failure message.
    #[must_use]
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Set the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Set the acting user.
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// The caller-supplied part of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDraft {
    /// Human-readable message.
    pub message: String,
    /// Stack trace, if available.
    pub stack: Option<String>,
    /// Classification.
    pub kind: ErrorType,
    /// Element involved, if any.
    pub element: Option<String>,
    /// Acting user; filled from the tracker identity when unset.
    pub user_id: Option<String>,
    /// Supplementary attributes.
    pub context: Option<ErrorContext>,
}

impl ErrorDraft {
    /// Start a draft with the given classification and message.
    #[must_use]
    pub fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            kind,
            element: None,
            user_id: None,
            context: None,
        }
    }

    /// Set the stack trace.
    #[must_use]
    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Set the element involved.
    #[must_use]
    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Set the context.
    #[must_use]
    pub fn context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the acting user.
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// A recorded user or system action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    /// What happened.
    #[serde(rename = "type")]
    pub kind: InteractionType,
    /// Canonical element category.
    pub element: String,
    /// `id` of the element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// `class` of the element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_class: Option<String>,
    /// Page at capture time.
    pub page: String,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Acting user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Supplementary attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<InteractionContext>,
    /// Outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Duration in milliseconds.
    #[serde(rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// User agent at capture time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Viewport at capture time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

impl InteractionEvent {
    /// Complete a draft with the fields only the capture layer may set.
    #[must_use]
    pub fn stamp(
        draft: InteractionDraft,
        page: String,
        timestamp: DateTime<Utc>,
        user_agent: String,
        viewport: Viewport,
    ) -> Self {
        Self {
            kind: draft.kind,
            element: draft.element,
            element_id: draft.element_id,
            element_class: draft.element_class,
            page,
            timestamp,
            user_id: draft.user_id,
            session_id: draft.session_id,
            context: draft.context,
            success: draft.success,
            error: draft.error,
            duration_ms: draft.duration_ms,
            user_agent: Some(user_agent),
            viewport: Some(viewport),
        }
    }
}

/// A recorded fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    /// Human-readable message.
    pub message: String,
    /// Stack trace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Classification.
    #[serde(rename = "type")]
    pub kind: ErrorType,
    /// Element involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    /// Page at capture time.
    pub page: String,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Acting user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Supplementary attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
}

impl ErrorEvent {
    /// Complete a draft with the page and capture time.
    #[must_use]
    pub fn stamp(draft: ErrorDraft, page: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            message: draft.message,
            stack: draft.stack,
            kind: draft.kind,
            element: draft.element,
            page,
            timestamp,
            user_id: draft.user_id,
            context: draft.context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(draft: InteractionDraft) -> InteractionEvent {
        InteractionEvent::stamp(
            draft,
            "https://example.test/book".to_string(),
            Utc::now(),
            "agent".to_string(),
            Viewport {
                width: 800,
                height: 600,
            },
        )
    }

    #[test]
    fn test_interaction_type_display() {
        assert_eq!(InteractionType::Click.to_string(), "click");
        assert_eq!(InteractionType::Navigation.to_string(), "navigation");
        assert_eq!(ErrorType::Javascript.to_string(), "javascript");
        assert_eq!(ErrorType::Network.to_string(), "network");
    }

    #[test]
    fn test_stamp_populates_derived_fields() {
        let event = stamped(InteractionDraft::new(InteractionType::Click, "button"));

        assert_eq!(event.page, "https://example.test/book");
        assert_eq!(event.user_agent.as_deref(), Some("agent"));
        assert_eq!(
            event.viewport,
            Some(Viewport {
                width: 800,
                height: 600
            })
        );
    }

    #[test]
    fn test_interaction_wire_names() {
        let event = stamped(
            InteractionDraft::new(InteractionType::Load, "api")
                .element_id("quote")
                .duration_ms(42)
                .success(true),
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "load");
        assert_eq!(json["elementId"], "quote");
        assert_eq!(json["duration"], 42);
        assert_eq!(json["userAgent"], "agent");
        assert_eq!(json["viewport"]["width"], 800);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_submit_context_wire_names() {
        let mut form_data = BTreeMap::new();
        form_data.insert("password".to_string(), "[REDACTED]".to_string());
        let event = stamped(
            InteractionDraft::new(InteractionType::Submit, "form").context(
                InteractionContext::Submit(SubmitContext {
                    form_id: None,
                    method: "POST".to_string(),
                    action: Some("/api/bookings".to_string()),
                    form_data,
                    field_count: 1,
                }),
            ),
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["context"]["kind"], "submit");
        assert_eq!(json["context"]["formData"]["password"], "[REDACTED]");
        assert_eq!(json["context"]["fieldCount"], 1);
    }

    #[test]
    fn test_error_event_serialization() {
        let draft = ErrorDraft::new(ErrorType::Network, "fetch failed").context(
            ErrorContext::Network(NetworkContext {
                url: "/api/quote".to_string(),
                method: "GET".to_string(),
                duration: 12,
            }),
        );
        let event = ErrorEvent::stamp(draft, "/".to_string(), Utc::now());

        let json = serde_json::to_string(&event).unwrap();
        let back: ErrorEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(json.contains("\"type\":\"network\""));
    }

    #[test]
    fn test_custom_context_keeps_free_form_keys() {
        let mut attributes = serde_json::Map::new();
        attributes.insert("campaign".to_string(), serde_json::json!("spring"));
        let event = stamped(
            InteractionDraft::new(InteractionType::Click, "banner")
                .context(InteractionContext::Custom { attributes }),
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["context"]["kind"], "custom");
        assert_eq!(json["context"]["attributes"]["campaign"], "spring");
    }

    #[test]
    fn test_custom_context_with_kind_key_round_trips() {
        let mut attributes = serde_json::Map::new();
        attributes.insert("kind".to_string(), serde_json::json!("promo"));
        let event = stamped(
            InteractionDraft::new(InteractionType::Click, "banner")
                .context(InteractionContext::Custom { attributes }),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["context"]["kind"], "custom");
        assert_eq!(json["context"]["attributes"]["kind"], "promo");

        let back: InteractionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_custom_error_context_with_kind_key_round_trips() {
        let mut attributes = serde_json::Map::new();
        attributes.insert("kind".to_string(), serde_json::json!("network"));
        let event = ErrorEvent::stamp(
            ErrorDraft::new(ErrorType::User, "coupon rejected")
                .context(ErrorContext::Custom { attributes }),
            "/".to_string(),
            Utc::now(),
        );

        let json = serde_json::to_string(&event).unwrap();
        let back: ErrorEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
