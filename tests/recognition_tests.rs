// Integration tests for live speech recognition

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sula_assistant::audio::UnavailableMicrophone;
use sula_assistant::voice::{ListenState, ListenToggle, RecognitionEvent};
use sula_assistant::AssistantSession;
use support::{eventually, last_content, session_with, test_config, MockRecognizer, StubAnswers, StubTranscriber};

fn listening_session(answers: Arc<StubAnswers>) -> (AssistantSession, Arc<MockRecognizer>) {
    let recognizer = MockRecognizer::new();
    let session = session_with(
        answers,
        StubTranscriber::returning(json!({})),
        Some(Arc::clone(&recognizer)),
        Arc::new(UnavailableMicrophone),
    );
    (session, recognizer)
}

#[tokio::test]
async fn test_unsupported_platform_reports_notice() {
    let session = session_with(
        Arc::new(StubAnswers::default()),
        StubTranscriber::returning(json!({})),
        None,
        Arc::new(UnavailableMicrophone),
    );
    let timeline = session.timeline();

    let toggle = session.toggle_listening();

    assert_eq!(
        toggle,
        ListenToggle::Unsupported(test_config().messages.recognition_unsupported)
    );
    assert_eq!(session.stats().listening, ListenState::Idle);
    assert_eq!(session.timeline(), timeline);
}

#[tokio::test]
async fn test_toggle_starts_and_stops() {
    let (session, recognizer) = listening_session(Arc::new(StubAnswers::default()));

    assert_eq!(session.toggle_listening(), ListenToggle::Started);
    assert_eq!(session.stats().listening, ListenState::Listening);
    assert_eq!(recognizer.starts(), 1);

    // Stopping is immediate; no end event is awaited
    assert_eq!(session.toggle_listening(), ListenToggle::Stopped);
    assert_eq!(session.stats().listening, ListenState::Idle);
    assert_eq!(recognizer.stops(), 1);
}

#[tokio::test]
async fn test_result_dispatches_top_alternative() {
    let answers = StubAnswers::answering(json!({"BK9": "Refer friends."}));
    let (session, recognizer) = listening_session(answers.clone());

    session.toggle_listening();
    recognizer.emit(RecognitionEvent::Result {
        alternatives: vec!["How to earn coins?".to_string(), "How to urn coins".to_string()],
    });

    assert!(eventually(|| last_content(&session.timeline()) == "Refer friends.").await);

    let prompts = answers.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("How to earn coins?"));
    assert!(!prompts[0].contains("How to urn coins"));
}

#[tokio::test]
async fn test_result_without_alternatives_is_ignored() {
    let answers = Arc::new(StubAnswers::default());
    let (session, recognizer) = listening_session(answers.clone());

    session.toggle_listening();
    recognizer.emit(RecognitionEvent::Result { alternatives: vec![] });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(answers.prompts().is_empty());
    assert_eq!(session.stats().listening, ListenState::Listening);
}

#[tokio::test]
async fn test_end_event_returns_to_idle() {
    let (session, recognizer) = listening_session(Arc::new(StubAnswers::default()));

    session.toggle_listening();
    recognizer.emit(RecognitionEvent::End);

    assert!(eventually(|| session.stats().listening == ListenState::Idle).await);
}

#[tokio::test]
async fn test_error_event_returns_to_idle() {
    let (session, recognizer) = listening_session(Arc::new(StubAnswers::default()));

    session.toggle_listening();
    recognizer.emit(RecognitionEvent::Error("no-speech".to_string()));

    assert!(eventually(|| session.stats().listening == ListenState::Idle).await);
    // The error is not surfaced in the conversation
    assert_eq!(session.timeline().len(), test_config().messages.greeting.len());
}

#[tokio::test]
async fn test_stale_end_does_not_stop_new_session() {
    let (session, recognizer) = listening_session(Arc::new(StubAnswers::default()));

    session.toggle_listening();
    session.toggle_listening();
    // Restarting replaces the recognizer channel, ending the first session
    session.toggle_listening();
    assert_eq!(recognizer.starts(), 2);

    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(session.stats().listening, ListenState::Listening);
}

#[tokio::test]
async fn test_speech_during_in_flight_query_stays_visible() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let answers = StubAnswers::gated(Arc::clone(&gate));
    let (session, recognizer) = listening_session(answers.clone());

    let send = tokio::spawn({
        let session = session.clone();
        async move { session.send("typed question").await }
    });
    assert!(eventually(|| session.stats().dispatch_in_flight).await);

    session.toggle_listening();
    recognizer.emit(RecognitionEvent::Result {
        alternatives: vec!["spoken words".to_string()],
    });

    let busy = test_config().messages.voice_busy;
    assert!(eventually(|| last_content(&session.timeline()) == busy).await);

    // Shown as what the user said, but never sent
    let history = session.history();
    assert!(history.iter().any(|m| m.content == "spoken words"));
    assert_eq!(answers.prompts().len(), 1);

    gate.notify_one();
    send.await.unwrap();
}
