//! # Hello World skill
//!
//! Voice skill that receives platform request envelopes, routes them through an
//! ordered list of predicate/handler pairs and returns a speech/visual response.
//!
//! ```text
//! RequestEnvelope ─► LocaleResolver ─► HandlerInput ─► Dispatcher ─► Response
//!                     (Translator)                     (first match,
//!                                                       or ErrorHandler)
//! ```

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod handlers;
pub mod i18n;
pub mod registry;
pub mod resources;
pub mod response;
pub mod skill;

#[cfg(test)]
mod skill_tests;

pub use config::SkillConfig;
pub use dispatch::{handler_fn, Dispatcher, ErrorHandler, FnHandler, HandlerInput, RequestHandler};
pub use envelope::{Request, RequestEnvelope, RequestKind};
pub use handlers::hello_world_skill;
pub use i18n::{LanguageStrings, LocaleResolver, Translator};
pub use registry::{HandlerEntry, HandlerRegistry, Predicate, RouteConflict};
pub use response::{Directive, OutputSpeech, Response, ResponseBuilder, ResponseEnvelope};
pub use skill::{Skill, SkillBuilder};

/// Main error type for skill operations
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(
        "Unhandled request: no handler for {request_type} (intent: {})",
        .intent_name.as_deref().unwrap_or("none")
    )]
    UnhandledRequest {
        request_type: String,
        intent_name: Option<String>,
    },

    #[error("Handler '{handler}' failed: {error}")]
    ActionFailed {
        handler: String,
        error: anyhow::Error,
    },

    #[error("Handler '{handler}' panicked: {message}")]
    ActionPanicked { handler: String, message: String },

    #[error("Response already built for this invocation")]
    ResponseAlreadyBuilt,

    #[error("Invalid request envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),
}

impl SkillError {
    /// Short machine-readable name, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            SkillError::Configuration(_) => "configuration",
            SkillError::UnhandledRequest { .. } => "unhandled_request",
            SkillError::ActionFailed { .. } => "action_failed",
            SkillError::ActionPanicked { .. } => "action_panicked",
            SkillError::ResponseAlreadyBuilt => "response_already_built",
            SkillError::InvalidEnvelope(_) => "invalid_envelope",
        }
    }
}

pub type Result<T> = std::result::Result<T, SkillError>;
