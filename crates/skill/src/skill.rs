//! Skill assembly and the per-invocation pipeline

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    config::SkillConfig,
    dispatch::{Dispatcher, ErrorHandler, HandlerInput, RequestHandler},
    envelope::RequestEnvelope,
    i18n::{LanguageStrings, LocaleResolver},
    registry::{HandlerRegistry, Predicate},
    response::ResponseEnvelope,
    Result, SkillError,
};

/// User agent prefix identifying this runtime
const USER_AGENT_PREFIX: &str = concat!("skill-rs/", env!("CARGO_PKG_VERSION"));

/// A built skill: immutable, shared by every invocation
#[derive(Clone)]
pub struct Skill {
    resolver: LocaleResolver,
    dispatcher: Dispatcher,
    user_agent: String,
}

impl Skill {
    pub fn builder() -> SkillBuilder {
        SkillBuilder::default()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        self.dispatcher.registry()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Localise, dispatch and wrap the response for the platform
    ///
    /// Only a locale configuration error can fail an invocation; handler
    /// failures are turned into the error handler's response.
    pub async fn invoke(&self, envelope: RequestEnvelope) -> Result<ResponseEnvelope> {
        let envelope = Arc::new(envelope);
        let translator = self.resolver.resolve(envelope.locale())?;
        let input = HandlerInput::new(envelope.clone(), translator);

        let response = self.dispatcher.dispatch(input).await;

        Ok(ResponseEnvelope {
            version: "1.0".to_string(),
            session_attributes: envelope.session_attributes().cloned(),
            user_agent: Some(self.user_agent.clone()),
            response,
        })
    }

    /// Parse a raw request body and invoke
    pub async fn invoke_json(&self, body: &[u8]) -> Result<ResponseEnvelope> {
        let envelope: RequestEnvelope = serde_json::from_slice(body)?;
        self.invoke(envelope).await
    }
}

/// Collects handlers and settings, validated once in [`SkillBuilder::build`]
#[derive(Default)]
pub struct SkillBuilder {
    registry: HandlerRegistry,
    error_handlers: Vec<Arc<dyn ErrorHandler>>,
    strings: Option<LanguageStrings>,
    default_locale: Option<String>,
    custom_user_agent: Option<String>,
    strict_routing: bool,
}

impl SkillBuilder {
    /// Builder pre-populated from configuration (strings, locale, user agent, strictness)
    pub fn from_config(config: &SkillConfig) -> Result<Self> {
        Ok(Self {
            strings: Some(config.language_strings()?),
            default_locale: config.default_locale.clone(),
            custom_user_agent: config.custom_user_agent.clone(),
            strict_routing: config.strict_routing,
            ..Self::default()
        })
    }

    /// Register a handler after all handlers added so far
    pub fn add_request_handler<H>(mut self, name: &str, predicate: Predicate, handler: H) -> Self
    where
        H: RequestHandler + 'static,
    {
        self.registry = self.registry.register(name, predicate, handler);
        self
    }

    pub fn add_error_handler<H>(mut self, handler: H) -> Self
    where
        H: ErrorHandler + 'static,
    {
        self.error_handlers.push(Arc::new(handler));
        self
    }

    pub fn with_language_strings(mut self, strings: LanguageStrings) -> Self {
        self.strings = Some(strings);
        self
    }

    pub fn with_default_locale(mut self, locale: Option<&str>) -> Self {
        self.default_locale = locale.map(str::to_string);
        self
    }

    pub fn with_custom_user_agent(mut self, user_agent: &str) -> Self {
        self.custom_user_agent = Some(user_agent.to_string());
        self
    }

    pub fn strict_routing(mut self, strict: bool) -> Self {
        self.strict_routing = strict;
        self
    }

    pub fn build(self) -> Result<Skill> {
        if self.error_handlers.is_empty() {
            return Err(SkillError::Configuration(
                "at least one error handler is required".into(),
            ));
        }

        let strings = match self.strings {
            Some(strings) => strings,
            None => LanguageStrings::embedded()?,
        };
        let resolver = LocaleResolver::new(Arc::new(strings), self.default_locale);
        if let Some(locale) = resolver.default_locale() {
            if !resolver.has_default_table() {
                return Err(SkillError::Configuration(format!(
                    "default locale '{}' has no string table",
                    locale
                )));
            }
        }

        for conflict in self.registry.conflicts() {
            if !conflict.shadowed {
                debug!(
                    earlier = %conflict.earlier,
                    later = %conflict.later,
                    "Handlers overlap; registration order decides"
                );
                continue;
            }
            if self.strict_routing {
                return Err(SkillError::Configuration(format!(
                    "handler '{}' can never run: '{}' is registered earlier and matches everything it does",
                    conflict.later, conflict.earlier
                )));
            }
            warn!(
                earlier = %conflict.earlier,
                later = %conflict.later,
                "Handler is unreachable"
            );
        }

        let user_agent = match self.custom_user_agent {
            Some(custom) => format!("{} {}", USER_AGENT_PREFIX, custom),
            None => USER_AGENT_PREFIX.to_string(),
        };

        info!(
            handlers = self.registry.len(),
            error_handlers = self.error_handlers.len(),
            default_locale = ?resolver.default_locale(),
            "Skill built"
        );

        Ok(Skill {
            resolver,
            dispatcher: Dispatcher::new(Arc::new(self.registry), Arc::new(self.error_handlers)),
            user_agent,
        })
    }
}
