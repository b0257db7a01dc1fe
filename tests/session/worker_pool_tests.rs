//! Worker pool: concurrent sessions of one iteration.

use std::collections::HashSet;
use std::time::Duration;

use chat_load::application::services::{IterationContext, WorkerPool};

use crate::common::{assert_near, settings, setup, FakeServer};

fn pool(server: &FakeServer, workers: u32) -> WorkerPool {
    let settings = settings(&[]);
    WorkerPool::new(setup(server), settings.session, workers).unwrap()
}

fn context(session_duration: Option<Duration>) -> IterationContext {
    IterationContext {
        vu: 1,
        iteration: 0,
        session_duration,
    }
}

#[tokio::test(start_paused = true)]
async fn test_each_worker_gets_its_own_nickname() {
    let server = FakeServer::new();
    pool(&server, 4)
        .run_iteration(context(Some(Duration::from_secs(80))))
        .await;

    let connections = server.connections();
    assert_eq!(connections.len(), 4);

    let nicknames: HashSet<_> = connections
        .iter()
        .map(|c| c.nickname().unwrap().to_string())
        .collect();
    assert_eq!(nicknames.len(), 4);

    for connection in &connections {
        let own = connection.nickname().unwrap();
        assert!(connection.frames.iter().all(|(_, m)| m.nickname() == own));
    }
}

#[tokio::test(start_paused = true)]
async fn test_workers_share_the_iteration_duration() {
    let server = FakeServer::new();
    pool(&server, 3)
        .run_iteration(context(Some(Duration::from_secs(60))))
        .await;

    for connection in server.connections() {
        assert_near(
            connection.close_requested_at.unwrap() - connection.opened_at,
            Duration::from_millis(63_000),
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_per_session_duration_draws_stay_in_range() {
    let server = FakeServer::new();
    pool(&server, 4).run_iteration(context(None)).await;

    for connection in server.connections() {
        let lifetime = connection.close_requested_at.unwrap() - connection.opened_at;
        assert!(lifetime >= Duration::from_millis(83_000));
        assert!(lifetime <= Duration::from_millis(103_005));
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_worker_does_not_affect_siblings() {
    let server = FakeServer::new().refusing(1);
    pool(&server, 4)
        .run_iteration(context(Some(Duration::from_secs(80))))
        .await;

    assert_eq!(server.attempts(), 4);
    let connections = server.connections();
    assert_eq!(connections.len(), 3);

    for connection in connections {
        assert!(connection.close_requested_at.is_some());
        assert!(connection.chat_messages().len() >= 20);
    }
}

#[tokio::test(start_paused = true)]
async fn test_iteration_waits_for_every_session() {
    let server = FakeServer::new();
    let started = tokio::time::Instant::now();
    pool(&server, 2)
        .run_iteration(context(Some(Duration::from_secs(30))))
        .await;

    assert!(started.elapsed() >= Duration::from_secs(33));
    assert!(server
        .connections()
        .iter()
        .all(|c| c.close_requested_at.is_some()));
}
