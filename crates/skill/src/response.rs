//! Response model and the builder handlers use to produce it
//!
//! Creates the JSON response the voice platform uses to speak, reprompt and
//! drive visual directives on the device.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Result, SkillError};

/// Directive type that renders an APL document
pub const RENDER_DOCUMENT: &str = "Alexa.Presentation.APL.RenderDocument";

/// Directive type that runs APL commands against a rendered document
pub const EXECUTE_COMMANDS: &str = "Alexa.Presentation.APL.ExecuteCommands";

/// Speech the device should say
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
    PlainText { text: String },
}

impl OutputSpeech {
    fn ssml(text: &str) -> Self {
        OutputSpeech::Ssml {
            ssml: format!("<speak>{}</speak>", strip_speak_tags(text)),
        }
    }

    /// The spoken text with any `<speak>` wrapper removed
    pub fn text(&self) -> &str {
        match self {
            OutputSpeech::Ssml { ssml } => strip_speak_tags(ssml),
            OutputSpeech::PlainText { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

/// A structured instruction for the device, opaque beyond its type and token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directive {
    #[serde(rename = "type")]
    pub directive_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Directive {
    pub fn new(directive_type: impl Into<String>) -> Self {
        Self {
            directive_type: directive_type.into(),
            token: None,
            payload: Map::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Attach a payload field, passed through to the device unmodified
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// APL RenderDocument directive
    pub fn render_document(token: &str, document: Value, datasources: Option<Value>) -> Self {
        let directive = Directive::new(RENDER_DOCUMENT)
            .with_token(token)
            .with_field("document", document);

        match datasources {
            Some(datasources) => directive.with_field("datasources", datasources),
            None => directive,
        }
    }

    /// APL ExecuteCommands directive; `token` must match the rendered document
    pub fn execute_commands(token: &str, commands: Vec<Value>) -> Self {
        Directive::new(EXECUTE_COMMANDS)
            .with_token(token)
            .with_field("commands", Value::Array(commands))
    }

    /// Dialog directives hand the next turn back to the platform, which needs an open session
    pub fn keeps_session_open(&self) -> bool {
        self.directive_type.starts_with("Dialog.")
    }
}

/// Finalized response for one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<Directive>,
    pub should_end_session: bool,
}

impl Response {
    /// An empty response that closes the session
    pub fn ended() -> Self {
        Self {
            output_speech: None,
            reprompt: None,
            directives: Vec::new(),
            should_end_session: true,
        }
    }

    pub fn speech_text(&self) -> Option<&str> {
        self.output_speech.as_ref().map(OutputSpeech::text)
    }

    pub fn reprompt_text(&self) -> Option<&str> {
        self.reprompt.as_ref().map(|r| r.output_speech.text())
    }
}

/// Accumulates speech, reprompt and directives for a single invocation
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    output_speech: Option<OutputSpeech>,
    reprompt: Option<OutputSpeech>,
    directives: Vec<Directive>,
    should_end_session: Option<bool>,
    built: bool,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SSML speech, replacing any earlier speech
    pub fn speak(&mut self, text: &str) -> &mut Self {
        self.output_speech = Some(OutputSpeech::ssml(text));
        self
    }

    /// Set plain (non-SSML) speech
    pub fn speak_plain_text(&mut self, text: &str) -> &mut Self {
        self.output_speech = Some(OutputSpeech::PlainText {
            text: text.to_string(),
        });
        self
    }

    /// Set the reprompt; keeps the session open
    pub fn reprompt(&mut self, text: &str) -> &mut Self {
        self.reprompt = Some(OutputSpeech::ssml(text));
        self
    }

    pub fn add_directive(&mut self, directive: Directive) -> &mut Self {
        self.directives.push(directive);
        self
    }

    /// Force the session flag regardless of reprompt and directives
    pub fn with_should_end_session(&mut self, should_end_session: bool) -> &mut Self {
        self.should_end_session = Some(should_end_session);
        self
    }

    /// Snapshot the accumulated state. May only be called once.
    pub fn get_response(&mut self) -> Result<Response> {
        if self.built {
            return Err(SkillError::ResponseAlreadyBuilt);
        }
        self.built = true;

        let keeps_open = self.reprompt.is_some()
            || self.directives.iter().any(Directive::keeps_session_open);
        let should_end_session = self.should_end_session.unwrap_or(!keeps_open);

        Ok(Response {
            output_speech: self.output_speech.take(),
            reprompt: self
                .reprompt
                .take()
                .map(|output_speech| Reprompt { output_speech }),
            directives: std::mem::take(&mut self.directives),
            should_end_session,
        })
    }
}

/// Wire envelope returned to the platform
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub response: Response,
}

impl ResponseEnvelope {
    pub fn new(response: Response) -> Self {
        Self {
            version: "1.0".to_string(),
            session_attributes: None,
            user_agent: None,
            response,
        }
    }
}

fn strip_speak_tags(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("<speak>")
        .and_then(|inner| inner.strip_suffix("</speak>"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
