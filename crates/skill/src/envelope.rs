//! Request envelope sent by the voice platform
//!
//! Mirrors the platform's JSON schema closely enough to route requests and
//! read the capability flags the handlers care about. Unknown request types
//! are preserved as [`Request::Other`] so they can still be reported.

use std::collections::HashMap;

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Interface name the platform uses for APL-capable devices
pub const APL_INTERFACE: &str = "Alexa.Presentation.APL";

/// Request type string for APL user events
pub const APL_USER_EVENT: &str = "Alexa.Presentation.APL.UserEvent";

/// One invocation's worth of platform input
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub context: Context,
    pub request: Request,
}

fn default_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub new: bool,
    pub session_id: String,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
}

/// Device and interface state at the time of the request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Context {
    #[serde(rename = "System", default)]
    pub system: Option<SystemContext>,
    /// Interface-specific state, e.g. the APL document currently on screen
    #[serde(flatten)]
    pub interfaces: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemContext {
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub supported_interfaces: Map<String, Value>,
}

/// Fields every request kind carries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCommon {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// The request body, discriminated by its `type` field
#[derive(Debug, Clone)]
pub enum Request {
    Launch(LaunchRequest),
    Intent(IntentRequest),
    UserEvent(UserEventRequest),
    SessionEnded(SessionEndedRequest),
    Other {
        request_type: String,
        common: RequestCommon,
        body: Value,
    },
}

/// Request kinds a predicate can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Launch,
    Intent,
    UserEvent,
    SessionEnded,
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    #[serde(flatten)]
    pub common: RequestCommon,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    #[serde(flatten)]
    pub common: RequestCommon,
    #[serde(default)]
    pub dialog_state: Option<String>,
    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub confirmation_status: Option<String>,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventRequest {
    #[serde(flatten)]
    pub common: RequestCommon,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default)]
    pub source: Option<EventSource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type", default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub handler: Option<String>,
    pub id: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndedRequest {
    #[serde(flatten)]
    pub common: RequestCommon,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error: Option<SessionEndedError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionEndedError {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let request_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::missing_field("type"))?
            .to_string();

        let parsed = match request_type.as_str() {
            "LaunchRequest" => serde_json::from_value(value).map(Request::Launch),
            "IntentRequest" => serde_json::from_value(value).map(Request::Intent),
            APL_USER_EVENT => serde_json::from_value(value).map(Request::UserEvent),
            "SessionEndedRequest" => serde_json::from_value(value).map(Request::SessionEnded),
            _ => serde_json::from_value::<RequestCommon>(value.clone()).map(|common| {
                Request::Other {
                    request_type,
                    common,
                    body: value,
                }
            }),
        };

        parsed.map_err(D::Error::custom)
    }
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Launch(_) => RequestKind::Launch,
            Request::Intent(_) => RequestKind::Intent,
            Request::UserEvent(_) => RequestKind::UserEvent,
            Request::SessionEnded(_) => RequestKind::SessionEnded,
            Request::Other { .. } => RequestKind::Other,
        }
    }

    /// The wire `type` string of this request
    pub fn request_type(&self) -> &str {
        match self {
            Request::Launch(_) => "LaunchRequest",
            Request::Intent(_) => "IntentRequest",
            Request::UserEvent(_) => APL_USER_EVENT,
            Request::SessionEnded(_) => "SessionEndedRequest",
            Request::Other { request_type, .. } => request_type,
        }
    }

    pub fn common(&self) -> &RequestCommon {
        match self {
            Request::Launch(r) => &r.common,
            Request::Intent(r) => &r.common,
            Request::UserEvent(r) => &r.common,
            Request::SessionEnded(r) => &r.common,
            Request::Other { common, .. } => common,
        }
    }
}

impl RequestEnvelope {
    pub fn request_type(&self) -> &str {
        self.request.request_type()
    }

    pub fn request_kind(&self) -> RequestKind {
        self.request.kind()
    }

    pub fn request_id(&self) -> &str {
        &self.request.common().request_id
    }

    /// Intent name, only for intent requests
    pub fn intent_name(&self) -> Option<&str> {
        match &self.request {
            Request::Intent(r) => r.intent.as_ref().map(|intent| intent.name.as_str()),
            _ => None,
        }
    }

    pub fn locale(&self) -> Option<&str> {
        self.request.common().locale.as_deref()
    }

    /// Value of a filled slot on the current intent
    pub fn slot_value(&self, slot: &str) -> Option<&str> {
        match &self.request {
            Request::Intent(r) => r.intent.as_ref()?.slots.get(slot)?.value.as_deref(),
            _ => None,
        }
    }

    /// Source component id of an APL user event
    pub fn user_event_source_id(&self) -> Option<&str> {
        match &self.request {
            Request::UserEvent(r) => r.source.as_ref().map(|source| source.id.as_str()),
            _ => None,
        }
    }

    pub fn supported_interfaces(&self) -> Option<&Map<String, Value>> {
        self.context
            .system
            .as_ref()
            .and_then(|s| s.device.as_ref())
            .map(|d| &d.supported_interfaces)
    }

    /// A `null` entry counts as unsupported
    pub fn supports_interface(&self, interface: &str) -> bool {
        self.supported_interfaces()
            .and_then(|interfaces| interfaces.get(interface))
            .map(|state| !state.is_null())
            .unwrap_or(false)
    }

    /// Interface-specific context state, e.g. `Alexa.Presentation.APL`
    pub fn interface_state(&self, interface: &str) -> Option<&Value> {
        self.context.interfaces.get(interface)
    }

    /// Token of the APL document currently rendered on the device
    pub fn visual_token(&self) -> Option<&str> {
        self.interface_state(APL_INTERFACE)?
            .get("token")
            .and_then(Value::as_str)
    }

    pub fn session_attributes(&self) -> Option<&Map<String, Value>> {
        self.session.as_ref().map(|s| &s.attributes)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_intent_request() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "version": "1.0",
            "session": {
                "new": true,
                "sessionId": "amzn1.echo-api.session.1",
                "attributes": { "visits": 2 }
            },
            "context": {
                "System": {
                    "device": {
                        "deviceId": "device-1",
                        "supportedInterfaces": { "Alexa.Presentation.APL": { "runtime": { "maxVersion": "1.9" } } }
                    }
                },
                "Alexa.Presentation.APL": { "token": "helloworldWithButtonToken", "version": "1.9" }
            },
            "request": {
                "type": "IntentRequest",
                "requestId": "req-1",
                "timestamp": "2024-01-01T00:00:00Z",
                "locale": "en-GB",
                "intent": {
                    "name": "HelloWorldIntent",
                    "slots": { "name": { "name": "name", "value": "Ada" } }
                }
            }
        }))
        .unwrap();

        assert_eq!(envelope.request_kind(), RequestKind::Intent);
        assert_eq!(envelope.request_type(), "IntentRequest");
        assert_eq!(envelope.intent_name(), Some("HelloWorldIntent"));
        assert_eq!(envelope.locale(), Some("en-GB"));
        assert_eq!(envelope.request_id(), "req-1");
        assert_eq!(envelope.slot_value("name"), Some("Ada"));
        assert!(envelope.supports_interface(APL_INTERFACE));
        assert_eq!(envelope.visual_token(), Some("helloworldWithButtonToken"));
        assert_eq!(envelope.session_attributes().unwrap()["visits"], json!(2));
    }

    #[test]
    fn test_parse_user_event() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "request": {
                "type": "Alexa.Presentation.APL.UserEvent",
                "requestId": "req-2",
                "source": { "type": "TouchWrapper", "handler": "Press", "id": "fadeHelloTextButton" }
            }
        }))
        .unwrap();

        assert_eq!(envelope.request_kind(), RequestKind::UserEvent);
        assert_eq!(envelope.user_event_source_id(), Some("fadeHelloTextButton"));
        assert_eq!(envelope.intent_name(), None);
        assert!(!envelope.supports_interface(APL_INTERFACE));
        assert_eq!(envelope.locale(), None);
    }

    #[test]
    fn test_unknown_request_type_is_preserved() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "request": {
                "type": "CanFulfillIntentRequest",
                "requestId": "req-3",
                "locale": "de-DE"
            }
        }))
        .unwrap();

        assert_eq!(envelope.request_kind(), RequestKind::Other);
        assert_eq!(envelope.request_type(), "CanFulfillIntentRequest");
        assert_eq!(envelope.locale(), Some("de-DE"));
    }

    #[test]
    fn test_missing_request_type_is_rejected() {
        let result = serde_json::from_value::<RequestEnvelope>(json!({
            "request": { "requestId": "req-4" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_null_interface_entry_is_unsupported() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "context": {
                "System": {
                    "device": { "supportedInterfaces": { "Alexa.Presentation.APL": null, "AudioPlayer": {} } }
                }
            },
            "request": { "type": "LaunchRequest", "requestId": "req-5" }
        }))
        .unwrap();

        assert!(!envelope.supports_interface(APL_INTERFACE));
        assert!(envelope.supports_interface("AudioPlayer"));
    }

    #[test]
    fn test_requests_missing_their_payload_still_parse() {
        let event: RequestEnvelope = serde_json::from_value(json!({
            "request": { "type": "Alexa.Presentation.APL.UserEvent", "requestId": "req-6" }
        }))
        .unwrap();
        assert_eq!(event.request_kind(), RequestKind::UserEvent);
        assert_eq!(event.user_event_source_id(), None);

        let intent: RequestEnvelope = serde_json::from_value(json!({
            "request": { "type": "IntentRequest", "requestId": "req-7" }
        }))
        .unwrap();
        assert_eq!(intent.request_kind(), RequestKind::Intent);
        assert_eq!(intent.intent_name(), None);
        assert_eq!(intent.slot_value("name"), None);
    }
}
