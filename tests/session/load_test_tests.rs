//! Full runs through `LoadTest`.

use std::sync::Arc;
use std::time::Duration;

use chat_load::config::{DurationScope, Settings};
use chat_load::infrastructure::ThreadRandom;
use chat_load::startup::LoadTest;

use crate::common::{settings, FakeServer};

fn short_run(scope: &str) -> Settings {
    let mut settings = settings(&[
        ("load.virtual_users", 2),
        ("load.iterations", 2),
        ("load.workers_per_iteration", 2),
        ("session.duration_min_ms", 10_000),
        ("session.duration_max_ms", 10_000),
        ("session.grace_period_ms", 500),
        ("session.message_interval_min_ms", 1_000),
        ("session.message_interval_max_ms", 1_500),
    ]);
    settings.load.session_duration_scope = match scope {
        "iteration" => DurationScope::Iteration,
        "session" => DurationScope::Session,
        _ => DurationScope::Run,
    };
    settings
}

#[tokio::test(start_paused = true)]
async fn test_users_run_concurrently_and_iterations_in_sequence() {
    let server = FakeServer::new();
    let load_test = LoadTest::with_components(
        short_run("run"),
        Arc::new(server.clone()),
        Arc::new(ThreadRandom),
    )
    .unwrap();

    let started = tokio::time::Instant::now();
    load_test.run_until_complete().await.unwrap();

    let connections = server.connections();
    assert_eq!(connections.len(), 8);

    let first_wave = connections
        .iter()
        .filter(|c| c.opened_at - started < Duration::from_millis(100))
        .count();
    assert_eq!(first_wave, 4);

    let second_wave = connections
        .iter()
        .filter(|c| c.opened_at - started >= Duration::from_millis(10_500))
        .count();
    assert_eq!(second_wave, 4);

    assert!(connections.iter().all(|c| c.close_requested_at.is_some()));
}

#[tokio::test(start_paused = true)]
async fn test_every_scope_completes() {
    for scope in ["run", "iteration", "session"] {
        let server = FakeServer::new();
        LoadTest::with_components(
            short_run(scope),
            Arc::new(server.clone()),
            Arc::new(ThreadRandom),
        )
        .unwrap()
        .run_until_complete()
        .await
        .unwrap();

        assert_eq!(server.connections().len(), 8, "scope {}", scope);
    }
}

#[test]
fn test_rejects_non_websocket_target() {
    let mut settings = short_run("run");
    settings.target.url = "http://chat.test/ws".into();

    let result =
        LoadTest::with_components(settings, Arc::new(FakeServer::new()), Arc::new(ThreadRandom));
    assert!(result.is_err());
}
