//! Session loop tests driven through in-memory streams.

mod common;

use std::io;

use axum::extract::ws::Message;
use futures_util::{sink, stream};
use gazewatch_api::{run_session, SessionEnd};
use gazewatch_models::{AnalysisOutcome, AnalysisStatus, Emotion};

use common::{EMPTY_ROOM, NEUTRAL_FACE, TALKING_FACE, TURNED_FACE};

fn inbound(messages: Vec<Message>) -> impl futures_util::Stream<Item = Result<Message, io::Error>> + Unpin {
    stream::iter(messages.into_iter().map(Ok::<Message, io::Error>))
}

/// Connect, send a neutral frame then a talking frame, disconnect.
#[tokio::test]
async fn test_full_session_scenario() {
    let mut sent = Vec::new();
    let end = run_session(
        "student_1",
        inbound(vec![
            common::frame(NEUTRAL_FACE),
            common::frame(TALKING_FACE),
            Message::Close(None),
        ]),
        &mut sent,
        common::analyzer(),
    )
    .await;

    assert_eq!(end, SessionEnd::ClientDisconnected);

    let outcomes = common::outcomes(&sent);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].status, AnalysisStatus::Active);
    assert_eq!(outcomes[0].emotion, Emotion::Neutral);
    assert!(!outcomes[0].gaze_alert);
    assert_eq!(outcomes[1].status, AnalysisStatus::Active);
    assert_eq!(outcomes[1].emotion, Emotion::Talking);
}

#[tokio::test]
async fn test_outcome_json_shape() {
    let mut sent = Vec::new();
    run_session("c", inbound(vec![common::frame(EMPTY_ROOM)]), &mut sent, common::analyzer()).await;

    let Message::Text(text) = &sent[0] else {
        panic!("expected text reply");
    };
    let json: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "status": "active",
            "emotion": "Neutral",
            "gaze_alert": false,
            "debug_msg": "No face detected"
        })
    );
}

#[tokio::test]
async fn test_decode_failure_keeps_session_open() {
    let mut sent = Vec::new();
    let end = run_session(
        "c",
        inbound(vec![
            Message::Text("data:image/jpeg;base64,!!!garbage!!!".to_string()),
            common::frame(TALKING_FACE),
        ]),
        &mut sent,
        common::analyzer(),
    )
    .await;

    // end of stream counts as a disconnect
    assert_eq!(end, SessionEnd::ClientDisconnected);

    let outcomes = common::outcomes(&sent);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0], AnalysisOutcome::decode_failed());
    assert_eq!(outcomes[1].emotion, Emotion::Talking);
}

#[tokio::test]
async fn test_gaze_alert_reported() {
    let mut sent = Vec::new();
    run_session("c", inbound(vec![common::frame(TURNED_FACE)]), &mut sent, common::analyzer()).await;

    let outcomes = common::outcomes(&sent);
    assert!(outcomes[0].gaze_alert);
    assert_eq!(outcomes[0].debug_msg, "looking left");
}

#[tokio::test]
async fn test_one_reply_per_frame_and_pings_ignored() {
    let mut sent = Vec::new();
    run_session(
        "c",
        inbound(vec![
            Message::Ping(vec![1]),
            common::frame(NEUTRAL_FACE),
            Message::Pong(vec![]),
            Message::Binary(common::png_bytes(TALKING_FACE)),
            Message::Binary(vec![0xde, 0xad]),
        ]),
        &mut sent,
        common::analyzer(),
    )
    .await;

    let outcomes = common::outcomes(&sent);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].emotion, Emotion::Neutral);
    assert_eq!(outcomes[1].emotion, Emotion::Talking);
    assert_eq!(outcomes[2], AnalysisOutcome::decode_failed());
}

#[tokio::test]
async fn test_unavailable_model_answers_every_frame() {
    let mut sent = Vec::new();
    let end = run_session(
        "c",
        inbound(vec![common::frame(NEUTRAL_FACE), common::frame(TALKING_FACE)]),
        &mut sent,
        common::unavailable_analyzer(),
    )
    .await;

    assert_eq!(end, SessionEnd::ClientDisconnected);
    let outcomes = common::outcomes(&sent);
    assert_eq!(outcomes.len(), 2);
    for outcome in outcomes {
        assert_eq!(outcome, AnalysisOutcome::error("Vision model not loaded"));
    }
}

/// A crashing analysis answers with an error and the session keeps going.
#[tokio::test]
async fn test_analysis_panic_keeps_session_open() {
    let mut sent = Vec::new();
    let end = run_session(
        "c",
        inbound(vec![
            common::frame(NEUTRAL_FACE),
            common::frame(TALKING_FACE),
            Message::Close(None),
        ]),
        &mut sent,
        common::panicking_analyzer(),
    )
    .await;

    assert_eq!(end, SessionEnd::ClientDisconnected);
    let outcomes = common::outcomes(&sent);
    assert_eq!(outcomes.len(), 2);
    for outcome in outcomes {
        assert_eq!(outcome.status, AnalysisStatus::Error);
        assert_eq!(outcome.emotion, Emotion::Neutral);
        assert!(!outcome.gaze_alert);
        assert!(outcome.debug_msg.starts_with("Analysis task failed"));
        assert!(outcome.debug_msg.contains("detector crashed"));
    }
}

#[tokio::test]
async fn test_receive_error_ends_session() {
    let messages = vec![
        Ok(common::frame(NEUTRAL_FACE)),
        Err(io::Error::other("connection reset")),
        Ok(common::frame(NEUTRAL_FACE)),
    ];
    let mut sent = Vec::new();
    let end = run_session("c", stream::iter(messages), &mut sent, common::analyzer()).await;

    assert_eq!(end, SessionEnd::TransportError("connection reset".to_string()));
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn test_send_error_ends_session() {
    let failing = Box::pin(sink::unfold((), |_, _msg: Message| async move {
        Err::<(), io::Error>(io::Error::other("broken pipe"))
    }));

    let end = run_session(
        "c",
        inbound(vec![common::frame(NEUTRAL_FACE), common::frame(NEUTRAL_FACE)]),
        failing,
        common::analyzer(),
    )
    .await;

    assert_eq!(end, SessionEnd::TransportError("broken pipe".to_string()));
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let mut sent_a = Vec::new();
    let mut sent_b = Vec::new();

    let session_a = run_session(
        "a",
        stream::iter(vec![
            Ok(common::frame(TALKING_FACE)),
            Err(io::Error::other("connection reset")),
        ]),
        &mut sent_a,
        common::analyzer(),
    );
    let session_b = run_session(
        "b",
        inbound(vec![
            common::frame(NEUTRAL_FACE),
            common::frame(TALKING_FACE),
            common::frame(EMPTY_ROOM),
            Message::Close(None),
        ]),
        &mut sent_b,
        common::analyzer(),
    );

    let (end_a, end_b) = tokio::join!(session_a, session_b);

    assert!(matches!(end_a, SessionEnd::TransportError(_)));
    assert_eq!(end_b, SessionEnd::ClientDisconnected);

    assert_eq!(common::outcomes(&sent_a).len(), 1);
    let outcomes_b = common::outcomes(&sent_b);
    assert_eq!(outcomes_b.len(), 3);
    assert_eq!(outcomes_b[1].emotion, Emotion::Talking);
    assert_eq!(outcomes_b[2], AnalysisOutcome::no_face());
}
