//! Request dispatch
//!
//! Runs the first registered handler whose predicate matches the request. A
//! failing or panicking handler is replaced by the error handler chain, so a
//! dispatch always ends in exactly one [`Response`].

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::{
    envelope::RequestEnvelope,
    i18n::Translator,
    registry::HandlerRegistry,
    response::{Response, ResponseBuilder},
    SkillError,
};

/// Per-invocation context handed to handlers
///
/// Can only be built with a resolved [`Translator`], so localisation always
/// completes before any predicate runs.
#[derive(Debug)]
pub struct HandlerInput {
    pub envelope: Arc<RequestEnvelope>,
    pub response_builder: ResponseBuilder,
    translator: Translator,
}

impl HandlerInput {
    pub fn new(envelope: Arc<RequestEnvelope>, translator: Translator) -> Self {
        Self {
            envelope,
            response_builder: ResponseBuilder::new(),
            translator,
        }
    }

    pub fn t(&self, key: &str) -> String {
        self.translator.t(key)
    }

    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.translator.t_args(key, args)
    }

    /// Same request and locale with an empty response builder
    fn fresh(&self) -> Self {
        Self::new(self.envelope.clone(), self.translator.clone())
    }
}

/// Action run when a handler entry's predicate matches
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response>;
}

/// Handles failures from request handlers and unmatched requests
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    fn can_handle(&self, input: &HandlerInput, error: &SkillError) -> bool;

    async fn handle(&self, input: &mut HandlerInput, error: &SkillError)
        -> anyhow::Result<Response>;
}

/// Adapts a synchronous closure into a [`RequestHandler`]
pub struct FnHandler<F>(F);

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut HandlerInput) -> anyhow::Result<Response> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> RequestHandler for FnHandler<F>
where
    F: Fn(&mut HandlerInput) -> anyhow::Result<Response> + Send + Sync,
{
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        (self.0)(input)
    }
}

/// Routes one [`HandlerInput`] through the registry
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    error_handlers: Arc<Vec<Arc<dyn ErrorHandler>>>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        error_handlers: Arc<Vec<Arc<dyn ErrorHandler>>>,
    ) -> Self {
        Self {
            registry,
            error_handlers,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Produce the response for one invocation. Never fails.
    pub async fn dispatch(&self, input: HandlerInput) -> Response {
        let span = info_span!(
            "dispatch",
            request_id = %input.envelope.request_id(),
            request_type = %input.envelope.request_type(),
            intent = input.envelope.intent_name().unwrap_or(""),
        );
        self.dispatch_inner(input).instrument(span).await
    }

    async fn dispatch_inner(&self, mut input: HandlerInput) -> Response {
        let error = match self.registry.find(&input) {
            Some(entry) => {
                debug!(handler = %entry.name, "Dispatching request");
                let outcome = AssertUnwindSafe(entry.handler.handle(&mut input))
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(response)) => return response,
                    Ok(Err(error)) => SkillError::ActionFailed {
                        handler: entry.name.clone(),
                        error,
                    },
                    Err(panic) => SkillError::ActionPanicked {
                        handler: entry.name.clone(),
                        message: panic_message(panic.as_ref()),
                    },
                }
            }
            None => SkillError::UnhandledRequest {
                request_type: input.envelope.request_type().to_string(),
                intent_name: input.envelope.intent_name().map(str::to_string),
            },
        };

        // Partial builder state from the failed handler is dropped here
        self.handle_error(input.fresh(), error).await
    }

    async fn handle_error(&self, mut input: HandlerInput, error: SkillError) -> Response {
        for handler in self.error_handlers.iter() {
            if !handler.can_handle(&input, &error) {
                continue;
            }

            let outcome = AssertUnwindSafe(handler.handle(&mut input, &error))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(response)) => return response,
                Ok(Err(e)) => {
                    error!(error = %error, handler_error = %e, "Error handler failed");
                }
                Err(panic) => {
                    error!(
                        error = %error,
                        panic = %panic_message(panic.as_ref()),
                        "Error handler panicked"
                    );
                }
            }
            return Response::ended();
        }

        warn!(error = %error, "No error handler accepted the error");
        Response::ended()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
