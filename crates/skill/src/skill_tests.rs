use std::sync::Arc;

use serde_json::{json, Value};

use crate::{
    config::SkillConfig,
    dispatch::{handler_fn, HandlerInput},
    envelope::RequestKind,
    handlers::{hello_world_skill, GenericErrorHandler},
    i18n::LanguageStrings,
    registry::Predicate,
    response::Response,
    skill::Skill,
    SkillError,
};

fn launch(locale: &str) -> Value {
    json!({
        "version": "1.0",
        "session": {
            "new": true,
            "sessionId": "session-1",
            "attributes": { "visits": 3, "lastIntent": "HelloWorldIntent" }
        },
        "request": { "type": "LaunchRequest", "requestId": "req-1", "locale": locale }
    })
}

fn echo() -> impl crate::dispatch::RequestHandler {
    handler_fn(|input: &mut HandlerInput| {
        let text = input.t("GREETING");
        Ok(input.response_builder.speak(&text).get_response()?)
    })
}

fn strings() -> LanguageStrings {
    let mut strings = LanguageStrings::default();
    strings.insert("en", "GREETING", "hi");
    strings.insert("pt-BR", "GREETING", "oi");
    strings
}

#[tokio::test]
async fn test_invoke_wraps_response() {
    let skill = hello_world_skill(&SkillConfig::default()).unwrap();
    let envelope = serde_json::from_value(launch("en-US")).unwrap();

    let out = skill.invoke(envelope).await.unwrap();

    assert_eq!(out.version, "1.0");
    let attributes = out.session_attributes.as_ref().unwrap();
    assert_eq!(attributes["visits"], json!(3));
    assert_eq!(attributes["lastIntent"], json!("HelloWorldIntent"));
    assert!(out.response.speech_text().is_some());
}

#[test]
fn test_user_agent() {
    let skill = hello_world_skill(&SkillConfig::default()).unwrap();
    let user_agent = skill.user_agent();
    assert!(user_agent.starts_with("skill-rs/"));
    assert!(user_agent.ends_with(" sample/hello-world/v1.2"));

    let plain = Skill::builder()
        .add_error_handler(GenericErrorHandler)
        .with_default_locale(Some("en"))
        .build()
        .unwrap();
    assert!(!plain.user_agent().contains(' '));
}

#[tokio::test]
async fn test_response_wire_format() {
    let skill = hello_world_skill(&SkillConfig::default()).unwrap();
    let out = skill
        .invoke_json(launch("en-US").to_string().as_bytes())
        .await
        .unwrap();

    let wire = serde_json::to_value(&out).unwrap();
    assert_eq!(wire["version"], "1.0");
    assert_eq!(wire["sessionAttributes"]["visits"], 3);
    assert_eq!(wire["response"]["outputSpeech"]["type"], "SSML");
    assert!(wire["response"]["outputSpeech"]["ssml"]
        .as_str()
        .unwrap()
        .starts_with("<speak>"));
    assert_eq!(wire["response"]["shouldEndSession"], false);
    assert!(wire["userAgent"].as_str().unwrap().contains("sample/hello-world"));
}

#[tokio::test]
async fn test_invoke_json_rejects_garbage() {
    let skill = hello_world_skill(&SkillConfig::default()).unwrap();

    let err = skill.invoke_json(b"{ not json").await.unwrap_err();
    assert!(matches!(err, SkillError::InvalidEnvelope(_)));
    assert_eq!(err.kind(), "invalid_envelope");

    let err = skill.invoke_json(br#"{ "request": {} }"#).await.unwrap_err();
    assert!(matches!(err, SkillError::InvalidEnvelope(_)));
}

#[tokio::test]
async fn test_without_session_has_no_attributes() {
    let skill = hello_world_skill(&SkillConfig::default()).unwrap();
    let body = json!({ "request": { "type": "LaunchRequest", "requestId": "r", "locale": "en-US" } });

    let out = skill.invoke_json(body.to_string().as_bytes()).await.unwrap();
    assert!(out.session_attributes.is_none());
}

#[test]
fn test_build_requires_error_handler() {
    let result = Skill::builder()
        .with_language_strings(strings())
        .with_default_locale(Some("en"))
        .add_request_handler("launch", Predicate::request_type(RequestKind::Launch), echo())
        .build();

    assert!(matches!(result, Err(SkillError::Configuration(_))));
}

#[test]
fn test_build_rejects_default_locale_without_table() {
    let result = Skill::builder()
        .with_language_strings(strings())
        .with_default_locale(Some("ja-JP"))
        .add_error_handler(GenericErrorHandler)
        .build();

    match result {
        Err(SkillError::Configuration(message)) => assert!(message.contains("ja-JP")),
        _ => panic!("expected configuration error"),
    }
}

#[test]
fn test_strict_routing_rejects_unreachable_handler() {
    let builder = || {
        Skill::builder()
            .with_language_strings(strings())
            .with_default_locale(Some("en"))
            .add_request_handler(
                "reflector",
                Predicate::request_type(RequestKind::Intent),
                echo(),
            )
            .add_request_handler("help", Predicate::intent("AMAZON.HelpIntent"), echo())
            .add_error_handler(GenericErrorHandler)
    };

    assert!(builder().build().is_ok());
    match builder().strict_routing(true).build() {
        Err(SkillError::Configuration(message)) => {
            assert!(message.contains("help"));
            assert!(message.contains("reflector"));
        }
        _ => panic!("expected configuration error"),
    }
}

#[tokio::test]
async fn test_region_then_language_then_default() {
    let skill = Skill::builder()
        .with_language_strings(strings())
        .with_default_locale(Some("en-US"))
        .add_request_handler("launch", Predicate::request_type(RequestKind::Launch), echo())
        .add_error_handler(GenericErrorHandler)
        .build()
        .unwrap();

    for (locale, expected) in [("pt-BR", "oi"), ("pt-PT", "hi"), ("en-AU", "hi")] {
        let out = skill
            .invoke_json(launch(locale).to_string().as_bytes())
            .await
            .unwrap();
        assert_eq!(out.response.speech_text(), Some(expected), "{}", locale);
    }
}

#[tokio::test]
async fn test_no_usable_locale_fails_invocation() {
    let skill = Skill::builder()
        .with_language_strings(strings())
        .with_default_locale(None)
        .add_request_handler("launch", Predicate::request_type(RequestKind::Launch), echo())
        .add_error_handler(GenericErrorHandler)
        .build()
        .unwrap();

    let out = skill
        .invoke_json(launch("en-GB").to_string().as_bytes())
        .await
        .unwrap();
    assert_eq!(out.response.speech_text(), Some("hi"));

    let err = skill
        .invoke_json(launch("ja-JP").to_string().as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, SkillError::Configuration(_)));
}

#[tokio::test]
async fn test_missing_key_speaks_key() {
    let skill = Skill::builder()
        .with_language_strings(strings())
        .with_default_locale(Some("en"))
        .add_request_handler(
            "launch",
            Predicate::request_type(RequestKind::Launch),
            handler_fn(|input: &mut HandlerInput| {
                let text = input.t("NOT_A_KEY");
                Ok(input.response_builder.speak(&text).get_response()?)
            }),
        )
        .add_error_handler(GenericErrorHandler)
        .build()
        .unwrap();

    let out = skill
        .invoke_json(launch("en-US").to_string().as_bytes())
        .await
        .unwrap();
    assert_eq!(out.response.speech_text(), Some("NOT_A_KEY"));
}

#[tokio::test]
async fn test_second_get_response_routes_to_error_handler() {
    let skill = Skill::builder()
        .add_request_handler(
            "twice",
            Predicate::request_type(RequestKind::Launch),
            handler_fn(|input: &mut HandlerInput| {
                input.response_builder.speak("one").get_response()?;
                Ok(input.response_builder.speak("two").get_response()?)
            }),
        )
        .add_error_handler(GenericErrorHandler)
        .build()
        .unwrap();

    let out = skill
        .invoke_json(launch("en-US").to_string().as_bytes())
        .await
        .unwrap();
    assert_eq!(
        out.response.speech_text(),
        Some("Sorry, I had trouble doing what you asked. Please try again.")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invocations_are_isolated() {
    let skill = Arc::new(hello_world_skill(&SkillConfig::default()).unwrap());
    let locales = ["en-US", "de-DE", "fr-FR", "es-ES", "it-IT"];

    let mut tasks = Vec::new();
    for i in 0..50 {
        let skill = skill.clone();
        let locale = locales[i % locales.len()];
        tasks.push(tokio::spawn(async move {
            let response = skill
                .invoke_json(launch(locale).to_string().as_bytes())
                .await
                .unwrap()
                .response;
            (locale, response)
        }));
    }

    for task in tasks {
        let (locale, response) = task.await.unwrap();
        let expected = skill
            .invoke_json(launch(locale).to_string().as_bytes())
            .await
            .unwrap()
            .response;
        assert_eq!(response, expected);
        assert_ne!(response, Response::ended());
    }
}
