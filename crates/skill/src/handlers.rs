//! Hello World handler set
//!
//! Registration order matters: handlers are tried top to bottom and the
//! intent reflector must stay last so it only sees intents nothing else claimed.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    config::SkillConfig,
    dispatch::{ErrorHandler, HandlerInput, RequestHandler},
    envelope::{Request, RequestKind, APL_INTERFACE},
    registry::Predicate,
    resources::{SkillResources, HELLO_WORLD_WITH_BUTTON_DOCUMENT},
    response::{Directive, Response},
    skill::{Skill, SkillBuilder},
    Result, SkillError,
};

/// Token of the document rendered by the "with button" intent
pub const HELLO_WORLD_WITH_BUTTON_TOKEN: &str = "helloworldWithButtonToken";

/// Token of the linked authoring-tool document
pub const HELLO_WORLD_DOCUMENT_TOKEN: &str = "DocumentToken";

/// Id of the button component in the "with button" document
pub const FADE_BUTTON_ID: &str = "fadeHelloTextButton";

const HELLO_TEXT_COMPONENT: &str = "helloTextComponent";
const HELLO_WORLD_DOCUMENT_SRC: &str = "doc://alexa/apl/documents/HelloWorldDocument";

pub const HELLO_WORLD_WITH_BUTTON_INTENT: &str = "HelloWorldWithButtonIntent";
pub const HELLO_WORLD_INTENT: &str = "HelloWorldIntent";
pub const START_OVER_INTENT: &str = "AMAZON.StartOverIntent";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const FALLBACK_INTENT: &str = "AMAZON.FallbackIntent";

pub const SCREEN_SENTENCE: &str =
    "Welcome to Alexa Presentation Language. Click the button to see what happens!";
pub const NO_SCREEN_SENTENCE: &str =
    "This example would be more interesting on a device with a screen, such as an Echo Show or Fire TV.";
pub const BUTTON_THANKS: &str = "Thank you for clicking the button! I imagine you already noticed that the text faded away. Tell me to start over to bring it back!";
pub const BUTTON_REPROMPT: &str = "Tell me to start over if you want me to bring the text back into view. Or, you can just say hello again.";
pub const RESTORING_TEXT: &str = "OK, I'm going to try to bring that text back into view.";
pub const NOTHING_TO_RESET: &str = "Hmm, there isn't anything for me to reset. Try invoking the 'hello world with button intent', then click the button and see what happens!";
pub const START_OVER_NO_SCREEN: &str = "Hello, this sample is more interesting when used on a device with a screen. Try it on an Echo Show, Echo Spot or a Fire TV device.";

/// Assemble the Hello World skill in dispatch order
pub fn hello_world_skill(config: &SkillConfig) -> Result<Skill> {
    SkillBuilder::from_config(config)?
        .add_request_handler(
            "launch",
            Predicate::request_type(RequestKind::Launch),
            LaunchRequestHandler,
        )
        .add_request_handler(
            "hello_world_with_button",
            Predicate::intent(HELLO_WORLD_WITH_BUTTON_INTENT),
            HelloWorldWithButtonIntentHandler::new()?,
        )
        .add_request_handler(
            "hello_world_button_event",
            Predicate::user_event(FADE_BUTTON_ID),
            HelloWorldButtonEventHandler,
        )
        .add_request_handler(
            "start_over",
            Predicate::intent(START_OVER_INTENT),
            StartOverIntentHandler,
        )
        .add_request_handler(
            "hello_world",
            Predicate::intent(HELLO_WORLD_INTENT),
            HelloWorldIntentHandler,
        )
        .add_request_handler("help", Predicate::intent(HELP_INTENT), HelpIntentHandler)
        .add_request_handler(
            "cancel_and_stop",
            Predicate::intents(&[CANCEL_INTENT, STOP_INTENT]),
            CancelAndStopIntentHandler,
        )
        .add_request_handler(
            "fallback",
            Predicate::intent(FALLBACK_INTENT),
            FallbackIntentHandler,
        )
        .add_request_handler(
            "session_ended",
            Predicate::request_type(RequestKind::SessionEnded),
            SessionEndedRequestHandler,
        )
        .add_request_handler(
            "intent_reflector",
            Predicate::request_type(RequestKind::Intent),
            IntentReflectorHandler,
        )
        .add_error_handler(GenericErrorHandler)
        .build()
}

pub struct LaunchRequestHandler;

#[async_trait]
impl RequestHandler for LaunchRequestHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        let speak_output = input.t("WELCOME_MSG");

        Ok(input
            .response_builder
            .speak(&speak_output)
            .reprompt(&speak_output)
            .get_response()?)
    }
}

/// Renders the button document on APL devices
pub struct HelloWorldWithButtonIntentHandler {
    document: Value,
}

impl HelloWorldWithButtonIntentHandler {
    pub fn new() -> Result<Self> {
        Ok(Self {
            document: SkillResources::apl_document(HELLO_WORLD_WITH_BUTTON_DOCUMENT)?,
        })
    }
}

#[async_trait]
impl RequestHandler for HelloWorldWithButtonIntentHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        let mut speak_output = String::from("Hello world.");

        if input.envelope.supports_interface(APL_INTERFACE) {
            input.response_builder.add_directive(Directive::render_document(
                HELLO_WORLD_WITH_BUTTON_TOKEN,
                self.document.clone(),
                None,
            ));
            speak_output.push(' ');
            speak_output.push_str(SCREEN_SENTENCE);
        } else {
            speak_output.push(' ');
            speak_output.push_str(NO_SCREEN_SENTENCE);
        }

        Ok(input.response_builder.speak(&speak_output).get_response()?)
    }
}

pub struct HelloWorldButtonEventHandler;

#[async_trait]
impl RequestHandler for HelloWorldButtonEventHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        Ok(input
            .response_builder
            .speak(BUTTON_THANKS)
            .reprompt(BUTTON_REPROMPT)
            .get_response()?)
    }
}

/// Fades the hello text back in if the button document is still on screen
pub struct StartOverIntentHandler;

#[async_trait]
impl RequestHandler for StartOverIntentHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        let speak_output = if !input.envelope.supports_interface(APL_INTERFACE) {
            START_OVER_NO_SCREEN
        } else if input.envelope.visual_token() == Some(HELLO_WORLD_WITH_BUTTON_TOKEN) {
            // The directive token must match the document being displayed
            let animate_item = json!({
                "type": "AnimateItem",
                "componentId": HELLO_TEXT_COMPONENT,
                "duration": 3000,
                "value": [{ "property": "opacity", "to": 1 }]
            });
            input.response_builder.add_directive(Directive::execute_commands(
                HELLO_WORLD_WITH_BUTTON_TOKEN,
                vec![animate_item],
            ));
            RESTORING_TEXT
        } else {
            NOTHING_TO_RESET
        };

        Ok(input.response_builder.speak(speak_output).get_response()?)
    }
}

pub struct HelloWorldIntentHandler;

#[async_trait]
impl RequestHandler for HelloWorldIntentHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        let speak_output = input.t("HELLO_MSG");

        if input.envelope.supports_interface(APL_INTERFACE) {
            info!("The user's device supports APL");
            input.response_builder.add_directive(Directive::render_document(
                HELLO_WORLD_DOCUMENT_TOKEN,
                json!({ "src": HELLO_WORLD_DOCUMENT_SRC, "type": "Link" }),
                Some(json!({
                    "helloWorldDataSource": {
                        "primaryText": "Hello World!",
                        "secondaryText": "Welcome to Alexa Presentation Language!",
                        "color": "@colorTeal800"
                    }
                })),
            ));
        } else {
            info!("The user's device doesn't support APL");
        }

        Ok(input.response_builder.speak(&speak_output).get_response()?)
    }
}

pub struct HelpIntentHandler;

#[async_trait]
impl RequestHandler for HelpIntentHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        let speak_output = input.t("HELP_MSG");

        Ok(input
            .response_builder
            .speak(&speak_output)
            .reprompt(&speak_output)
            .get_response()?)
    }
}

pub struct CancelAndStopIntentHandler;

#[async_trait]
impl RequestHandler for CancelAndStopIntentHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        let speak_output = input.t("GOODBYE_MSG");
        Ok(input.response_builder.speak(&speak_output).get_response()?)
    }
}

/// Utterances that map to no intent of the skill
pub struct FallbackIntentHandler;

#[async_trait]
impl RequestHandler for FallbackIntentHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        let speak_output = input.t("FALLBACK_MSG");

        Ok(input
            .response_builder
            .speak(&speak_output)
            .reprompt(&speak_output)
            .get_response()?)
    }
}

/// Session closed by the user, a timeout or an error. Sends an empty response.
pub struct SessionEndedRequestHandler;

#[async_trait]
impl RequestHandler for SessionEndedRequestHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        if let Request::SessionEnded(request) = &input.envelope.request {
            info!(
                request_id = %request.common.request_id,
                session_id = input.envelope.session.as_ref().map(|s| s.session_id.as_str()).unwrap_or(""),
                reason = request.reason.as_deref().unwrap_or("unknown"),
                error_type = request.error.as_ref().map(|e| e.error_type.as_str()),
                error_message = request.error.as_ref().and_then(|e| e.message.as_deref()),
                "Session ended"
            );
        }

        Ok(input.response_builder.get_response()?)
    }
}

/// Repeats the intent name back; used while testing the interaction model
pub struct IntentReflectorHandler;

#[async_trait]
impl RequestHandler for IntentReflectorHandler {
    async fn handle(&self, input: &mut HandlerInput) -> anyhow::Result<Response> {
        let intent_name = input
            .envelope
            .intent_name()
            .context("intent request carries no intent")?
            .to_string();
        let speak_output = input.t_args("REFLECTOR_MSG", &[("intentName", &intent_name)]);

        Ok(input.response_builder.speak(&speak_output).get_response()?)
    }
}

/// Catches every routing or handler error with a generic apology
pub struct GenericErrorHandler;

#[async_trait]
impl ErrorHandler for GenericErrorHandler {
    fn can_handle(&self, _input: &HandlerInput, _error: &SkillError) -> bool {
        true
    }

    async fn handle(
        &self,
        input: &mut HandlerInput,
        err: &SkillError,
    ) -> anyhow::Result<Response> {
        error!(
            kind = err.kind(),
            request_id = %input.envelope.request_id(),
            error = %err,
            details = ?err,
            "Error handled"
        );

        let speak_output = input.t("ERROR_MSG");
        Ok(input
            .response_builder
            .speak(&speak_output)
            .reprompt(&speak_output)
            .get_response()?)
    }
}
