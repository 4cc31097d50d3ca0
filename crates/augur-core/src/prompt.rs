//! Prompt composition for the upstream inference backend.
//!
//! The backend accepts a single JSON object per session:
//! `{"user_prompt", "system_context", "assistant_context", "max_tokens"}`.

use serde_json::json;

/// Token budget sent upstream when composing a prompt.
pub const DEFAULT_MAX_TOKENS: u32 = 10_000;

/// Built-in system context used when the event-lookup collaborator has no
/// stored prompt for the current event.
pub const DEFAULT_SYSTEM_CONTEXT: &str = "Generate a response in a simple list format with \
     hierarchy, including up to three options. Begin with a headline to set up the answer. \
     Reiterate the product category mentioned in the inquiry for context.";

/// Built-in assistant context counterpart of [`DEFAULT_SYSTEM_CONTEXT`].
pub const DEFAULT_ASSISTANT_CONTEXT: &str = "As an expert language model specialized in the \
     Food & Beverage sector in the U.S., your knowledge spans various aspects such as market \
     trends, consumer preferences, industry regulations, and product innovations. Your \
     expertise allows you to provide insightful information and recommendations tailored to \
     the unique challenges and opportunities within this dynamic sector.";

/// Context supplied by the event-lookup collaborator for the current event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// Stable key of the event predictions are made against.
    pub event_key: String,
    pub system_context: String,
    pub assistant_context: String,
}

impl EventContext {
    /// Context for `event_key` with the built-in default prompts.
    pub fn with_default_prompts(event_key: impl Into<String>) -> Self {
        Self {
            event_key: event_key.into(),
            system_context: DEFAULT_SYSTEM_CONTEXT.to_owned(),
            assistant_context: DEFAULT_ASSISTANT_CONTEXT.to_owned(),
        }
    }
}

/// The composed prompt object sent once per upstream session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub user_prompt: String,
    pub system_context: String,
    pub assistant_context: String,
    pub max_tokens: u32,
}

impl ComposedPrompt {
    /// Combine the client's prompt with the current event context.
    #[must_use]
    pub fn compose(user_prompt: &str, event: &EventContext) -> Self {
        Self {
            user_prompt: user_prompt.to_owned(),
            system_context: event.system_context.clone(),
            assistant_context: event.assistant_context.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// JSON payload for the backend's opening message.
    #[must_use]
    pub fn to_payload(&self) -> String {
        json!({
            "user_prompt": self.user_prompt,
            "system_context": self.system_context,
            "assistant_context": self.assistant_context,
            "max_tokens": self.max_tokens,
        })
        .to_string()
    }
}
