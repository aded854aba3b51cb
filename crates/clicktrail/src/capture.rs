//! Turning raw host events into event drafts.
//!
//! [`Capturer`] holds the classification rules: which element a click is
//! attributed to, what an input change may reveal, how a form is
//! serialized. It never stamps page or time; the tracker does that.

use tracing::trace;

use crate::config::CaptureConfig;
use crate::event::{
    ClickContext, ErrorContext, ErrorDraft, ErrorType, FocusContext, InputContext,
    InteractionContext, InteractionDraft, InteractionType, LoadContext, NavigationContext,
    RejectionContext, ResourceContext, ScriptContext, SubmitContext,
};
use crate::privacy::FieldFilter;
use crate::source::{ElementNode, FormSnapshot, HostEvent};

/// What a host event turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Captured {
    /// An interaction to record.
    Interaction(InteractionDraft),
    /// An error to record.
    Error(ErrorDraft),
}

/// Classification rules applied to every host event.
#[derive(Debug, Default)]
pub struct Capturer {
    toggles: CaptureConfig,
    filter: FieldFilter,
}

impl Capturer {
    /// Create a capturer from capture toggles and a field filter.
    #[must_use]
    pub fn new(toggles: CaptureConfig, filter: FieldFilter) -> Self {
        Self { toggles, filter }
    }

    /// Classify one host event. `current_page` is the page before the event
    /// was applied. Returns `None` for events that are switched off or not
    /// worth recording.
    #[must_use]
    pub fn capture(&self, event: &HostEvent, current_page: &str) -> Option<Captured> {
        let captured = match event {
            HostEvent::Click { path } if self.toggles.clicks => self.click(path),
            HostEvent::Input { element, value } if self.toggles.inputs => {
                Some(Self::input(element, value))
            }
            HostEvent::Submit { form } if self.toggles.submits => Some(self.submit(form)),
            HostEvent::Focus { element } if self.toggles.focus => {
                Self::focus(InteractionType::Focus, element)
            }
            HostEvent::Blur { element } if self.toggles.focus => {
                Self::focus(InteractionType::Blur, element)
            }
            HostEvent::Navigation { from, to } if self.toggles.navigation => {
                Some(Self::navigation(from.as_deref().unwrap_or(current_page), to))
            }
            HostEvent::Load { load_time_ms } if self.toggles.loads => Some(Captured::Interaction(
                InteractionDraft::new(InteractionType::Load, "page").context(
                    InteractionContext::Load(LoadContext {
                        load_time_ms: *load_time_ms,
                    }),
                ),
            )),
            HostEvent::UncaughtError {
                message,
                filename,
                line,
                column,
                stack,
            } if self.toggles.errors => {
                let mut draft = ErrorDraft::new(ErrorType::Javascript, message.clone()).context(
                    ErrorContext::Script(ScriptContext {
                        filename: filename.clone(),
                        line: *line,
                        column: *column,
                    }),
                );
                draft.stack.clone_from(stack);
                Some(Captured::Error(draft))
            }
            HostEvent::UnhandledRejection { reason } if self.toggles.errors => {
                Some(Captured::Error(
                    ErrorDraft::new(
                        ErrorType::Javascript,
                        format!("Unhandled promise rejection: {reason}"),
                    )
                    .context(ErrorContext::Rejection(RejectionContext {
                        reason: reason.clone(),
                    })),
                ))
            }
            HostEvent::ResourceError { element } if self.toggles.errors => {
                Self::resource_error(element)
            }
            _ => None,
        };

        if captured.is_none() {
            trace!(?event, "Host event not recorded");
        }
        captured
    }

    fn click(&self, path: &[ElementNode]) -> Option<Captured> {
        let target = path.first()?;
        let (element, node) = classify_click(path, target);

        let text = node
            .text
            .as_deref()
            .or(target.text.as_deref())
            .and_then(|t| self.filter.snippet(t));
        let href = if element == "link" {
            node.href.clone()
        } else {
            None
        };

        let mut draft = InteractionDraft::new(InteractionType::Click, element)
            .context(InteractionContext::Click(ClickContext { text, href }));
        draft.element_id.clone_from(&node.id);
        draft.element_class.clone_from(&node.class);
        Some(Captured::Interaction(draft))
    }

    fn input(element: &ElementNode, value: &str) -> Captured {
        let value_length = value.chars().count();
        let mut draft = InteractionDraft::new(InteractionType::Input, element.tag_lower()).context(
            InteractionContext::Input(InputContext {
                field_name: element.name.clone(),
                field_type: element.input_type.clone(),
                value_length,
                has_value: value_length > 0,
            }),
        );
        draft.element_id.clone_from(&element.id);
        draft.element_class.clone_from(&element.class);
        Captured::Interaction(draft)
    }

    fn submit(&self, form: &FormSnapshot) -> Captured {
        let method = form
            .method
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .map_or_else(|| "GET".to_string(), |m| m.trim().to_ascii_uppercase());
        let form_data = self.filter.filter_form(
            form.fields
                .iter()
                .map(|f| (f.name.as_str(), f.value.as_str())),
        );

        let mut draft = InteractionDraft::new(InteractionType::Submit, "form").context(
            InteractionContext::Submit(SubmitContext {
                form_id: form.id.clone(),
                method,
                action: form.action.clone(),
                form_data,
                field_count: form.fields.len(),
            }),
        );
        draft.element_id.clone_from(&form.id);
        draft.element_class.clone_from(&form.class);
        Captured::Interaction(draft)
    }

    fn focus(kind: InteractionType, element: &ElementNode) -> Option<Captured> {
        if !element.is_form_control() {
            return None;
        }
        let mut draft = InteractionDraft::new(kind, element.tag_lower()).context(
            InteractionContext::Focus(FocusContext {
                field_name: element.name.clone(),
                field_type: element.input_type.clone(),
            }),
        );
        draft.element_id.clone_from(&element.id);
        draft.element_class.clone_from(&element.class);
        Some(Captured::Interaction(draft))
    }

    fn navigation(from: &str, to: &str) -> Captured {
        Captured::Interaction(
            InteractionDraft::new(InteractionType::Navigation, "page").context(
                InteractionContext::Navigation(NavigationContext {
                    from: Some(from.to_string()),
                    to: to.to_string(),
                }),
            ),
        )
    }

    fn resource_error(element: &ElementNode) -> Option<Captured> {
        let tag = element.tag_lower();
        if tag != "img" {
            return None;
        }
        let src = element.src.clone().unwrap_or_default();
        Some(Captured::Error(
            ErrorDraft::new(ErrorType::Network, format!("Failed to load image: {src}"))
                .element(tag.clone())
                .context(ErrorContext::Resource(ResourceContext { tag, src })),
        ))
    }
}

/// Attribute a click to the nearest meaningful element on its path.
///
/// Returns the element category and the node it was taken from. Falls back
/// to the target's own tag.
fn classify_click<'a>(
    path: &'a [ElementNode],
    target: &'a ElementNode,
) -> (String, &'a ElementNode) {
    for node in path {
        if let Some(category) = category_of(node) {
            return (category.to_string(), node);
        }
    }
    (target.tag_lower(), target)
}

fn category_of(node: &ElementNode) -> Option<&'static str> {
    let tag = node.tag_lower();
    let is_button_role = node
        .role
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case("button"));
    match tag.as_str() {
        "button" => Some("button"),
        _ if is_button_role => Some("button"),
        "input" => match node.input_type.as_deref().map(str::to_ascii_lowercase) {
            Some(t) if matches!(t.as_str(), "submit" | "button" | "reset") => Some("button"),
            _ => Some("input"),
        },
        "a" => Some("link"),
        "select" => Some("select"),
        "textarea" => Some("textarea"),
        "form" => Some("form"),
        _ => None,
    }
}
