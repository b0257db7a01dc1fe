//! Single session lifecycle against the fake server.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tokio::net::TcpListener;

use chat_load::application::services::run_session;
use chat_load::domain::{ChatAction, ClientMessage, SessionId, SessionPhase, SessionTiming};
use chat_load::infrastructure::WsConnector;

use crate::common::{assert_near, reference_timing, setup, FakeServer, ROOM_ID};

fn id(worker: u32) -> SessionId {
    SessionId::new(1, 0, worker)
}

/// Leave at the session duration, close after the grace period
#[tokio::test(start_paused = true)]
async fn test_leave_then_disconnect_on_schedule() {
    let server = FakeServer::new();
    let report = run_session(id(0), setup(&server), reference_timing()).await;

    assert_eq!(report.phase, SessionPhase::Closed);
    let active_at = report.active_at.unwrap();
    assert_near(report.left_at.unwrap() - active_at, Duration::from_millis(80_000));

    let connections = server.connections();
    assert_eq!(connections.len(), 1);
    let connection = &connections[0];
    assert_near(
        connection.close_requested_at.unwrap() - connection.opened_at,
        Duration::from_millis(83_000),
    );
}

/// 80s at one message every 3-4s
#[tokio::test(start_paused = true)]
async fn test_message_count_within_interval_bounds() {
    let server = FakeServer::new();
    for worker in 0..5 {
        run_session(id(worker), setup(&server), reference_timing()).await;
    }

    for connection in server.connections() {
        let sent = connection.chat_messages().len();
        assert!((20..=27).contains(&sent), "sent {} messages", sent);
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_message_at_or_after_leave() {
    let server = FakeServer::new();
    for worker in 0..5 {
        let report = run_session(id(worker), setup(&server), reference_timing()).await;
        assert_eq!(report.phase, SessionPhase::Closed);
    }

    for connection in server.connections() {
        let leave_at = connection.opened_at + Duration::from_millis(80_000);
        for (at, _) in connection.chat_messages() {
            assert!(at < leave_at, "message sent {:?} after open", at - connection.opened_at);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_frame_uses_one_nickname_and_room() {
    let server = FakeServer::new();
    let report = run_session(id(0), setup(&server), reference_timing()).await;

    let connection = &server.connections()[0];
    let (_, first) = &connection.frames[0];
    assert_eq!(first.action(), ChatAction::PutNickname);

    let nickname = connection.nickname().unwrap().to_string();
    assert_eq!(nickname.len(), 7);
    assert_eq!(report.nickname.as_deref(), Some(nickname.as_str()));

    for (_, message) in &connection.frames {
        assert_eq!(message.nickname(), nickname);
        assert_eq!(message.room_id(), ROOM_ID);
    }
    let put_nickname = connection
        .frames
        .iter()
        .filter(|(_, m)| m.action() == ChatAction::PutNickname)
        .count();
    assert_eq!(put_nickname, 1);
}

#[tokio::test(start_paused = true)]
async fn test_chat_payload_shape() {
    let server = FakeServer::new();
    run_session(id(0), setup(&server), reference_timing()).await;

    let connection = &server.connections()[0];
    for (_, message) in connection.chat_messages() {
        let ClientMessage::SendMessage(payload) = message else {
            panic!("expected SEND_MESSAGE");
        };
        assert!((10..=30).contains(&payload.text.len()));
        assert!(payload.send_at.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&payload.send_at).is_ok());
    }
}

#[tokio::test(start_paused = true)]
async fn test_refused_connection_schedules_nothing() {
    let server = FakeServer::new().refusing(0);
    let report = run_session(id(0), setup(&server), reference_timing()).await;

    assert_eq!(report.phase, SessionPhase::Errored);
    assert!(report.active_at.is_none());
    assert!(report.nickname.is_none());
    assert_eq!(report.messages_sent, 0);
    assert!(server.connections().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_server_close_ends_session_early() {
    let server = FakeServer::new().dropping_after(Duration::from_secs(10));
    let report = run_session(id(0), setup(&server), reference_timing()).await;

    assert_eq!(report.phase, SessionPhase::Closed);
    assert!(report.left_at.is_none());
    assert_near(
        report.closed_at.unwrap() - report.active_at.unwrap(),
        Duration::from_secs(10),
    );

    let connection = &server.connections()[0];
    assert!(connection.close_requested_at.is_none());
    let cutoff = connection.opened_at + Duration::from_secs(10);
    assert!(connection.chat_messages().iter().all(|(at, _)| *at <= cutoff));
}

#[tokio::test(start_paused = true)]
async fn test_broadcasts_are_decoded() {
    let server = FakeServer::new().echoing();
    let report = run_session(id(0), setup(&server), reference_timing()).await;

    assert!(report.messages_sent > 0);
    assert_eq!(report.messages_received, report.messages_sent);
    assert_eq!(report.decode_failures, 0);
}

/// Real socket: the server accepts the upgrade and never answers the close
#[tokio::test]
async fn test_session_ends_when_close_is_never_acknowledged() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let socket = tokio_tungstenite::accept_async(tcp).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(socket);
    });

    let mut setup = setup(&FakeServer::new());
    setup.url = Arc::new(format!("ws://{}/ws", addr).parse().unwrap());
    setup.connector = Arc::new(
        WsConnector::new(Duration::from_secs(5)).with_close_timeout(Duration::from_millis(300)),
    );
    let timing = SessionTiming::new(
        Duration::from_millis(200),
        Duration::from_millis(100),
        Duration::from_millis(50),
        Duration::from_millis(100),
    )
    .unwrap();

    let report = tokio::time::timeout(Duration::from_secs(10), run_session(id(0), setup, timing))
        .await
        .expect("session never finished");

    assert_eq!(report.phase, SessionPhase::Closed);
    assert!(report.disconnect_at.is_some());
    assert!(report.messages_sent > 0);
    server.abort();
}
