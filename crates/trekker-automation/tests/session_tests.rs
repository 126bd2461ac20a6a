//! End-to-end tests through the session hooks: notifications are classified,
//! reactions hit the gateway, and autowalk resumes after the cool-down.

mod common;

use std::sync::Arc;

use common::{assert_near, ms, test_config, Call, RecordingGateway};
use tokio::time::{sleep, sleep_until, Instant};
use trekker_automation::{AutomationState, DispatchOutcome, Session};
use trekker_events::{Coordinate, WorldNotification};

fn session(gateway: &Arc<RecordingGateway>) -> Session {
    Session::new(&test_config(), gateway.clone())
}

fn curio(id: u64, name: &str) -> WorldNotification {
    WorldNotification::CurioFound {
        id,
        name: name.to_string(),
        coord: Coordinate::new(10, 10),
    }
}

fn creature(id: u64, name: &str) -> WorldNotification {
    WorldNotification::CreatureFound {
        id,
        name: name.to_string(),
        coord: Coordinate::new(-5, 5),
    }
}

fn player(id: u64, is_kin: bool) -> WorldNotification {
    WorldNotification::PlayerFound {
        id,
        is_kin,
        coord: Coordinate::new(100, 0),
    }
}

#[tokio::test(start_paused = true)]
async fn test_walk_pick_and_resume_scenario() {
    let gateway = RecordingGateway::new();
    let session = session(&gateway);
    let started = Instant::now();

    session.on_ready().unwrap();

    sleep_until(started + ms(1001)).await;
    let moves = gateway.moves();
    assert_eq!(moves.len(), 1);
    assert_near(moves[0].0, ms(1000));
    assert_eq!(moves[0].1, Coordinate::new(50, 50));

    sleep_until(started + ms(1500)).await;
    let outcome = session.on_notification(&curio(42, "flint")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Reacted);
    assert_eq!(gateway.count(&Call::PickUp(42)), 1);
    assert_eq!(gateway.commits(), 0);
    assert_eq!(gateway.count(&Call::QueryCapacity), 0);

    sleep_until(started + ms(11_400)).await;
    assert_eq!(session.state(), AutomationState::Suspended);
    assert_eq!(gateway.moves().len(), 1);

    sleep_until(started + ms(11_600)).await;
    assert_eq!(session.state(), AutomationState::Walking);

    sleep_until(started + ms(12_600)).await;
    let moves = gateway.moves();
    assert_eq!(moves.len(), 2);
    assert_near(moves[1].0, ms(12_500));
    assert_eq!(moves[1].1, Coordinate::new(100, 100));
}

#[tokio::test(start_paused = true)]
async fn test_collectible_commits_when_capacity_allows() {
    let gateway = RecordingGateway::new();
    gateway.set_capacity(10, 9);
    let session = session(&gateway);

    session.on_ready().unwrap();
    sleep(ms(1500)).await;
    session.on_notification(&curio(7, "dandelion")).await.unwrap();

    assert_eq!(gateway.count(&Call::PickUp(7)), 1);
    assert_eq!(gateway.count(&Call::CommitItem("dandelion".to_string())), 1);
}

#[tokio::test(start_paused = true)]
async fn test_collectible_skipped_when_capacity_full() {
    let gateway = RecordingGateway::new();
    gateway.set_capacity(10, 10);
    let session = session(&gateway);

    session.on_ready().unwrap();
    sleep(ms(1500)).await;
    let outcome = session.on_notification(&curio(7, "dandelion")).await.unwrap();

    // Skipping the commit is not a failure
    assert_eq!(outcome, DispatchOutcome::Reacted);
    assert_eq!(gateway.count(&Call::PickUp(7)), 1);
    assert_eq!(gateway.count(&Call::QueryCapacity), 1);
    assert_eq!(gateway.commits(), 0);
    assert_eq!(session.controller().stats().reactions_run(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_pick_skips_commit() {
    let gateway = RecordingGateway::new();
    gateway.set_pick_succeeds(false);
    let session = session(&gateway);

    session.on_ready().unwrap();
    sleep(ms(1500)).await;
    session.on_notification(&curio(3, "dandelion")).await.unwrap();

    assert_eq!(gateway.count(&Call::PickUp(3)), 1);
    assert_eq!(gateway.count(&Call::QueryCapacity), 0);
    assert_eq!(gateway.commits(), 0);
    assert_eq!(session.state(), AutomationState::Suspended);
}

#[tokio::test(start_paused = true)]
async fn test_hostile_creature_and_stranger_in_one_cooldown() {
    let gateway = RecordingGateway::new();
    let session = session(&gateway);
    let timers = session.controller().timers().clone();
    let started = Instant::now();

    session.on_ready().unwrap();

    sleep_until(started + ms(1500)).await;
    let first = session.on_notification(&creature(1, "lynx")).await.unwrap();
    sleep_until(started + ms(3000)).await;
    let second = session.on_notification(&player(2, false)).await.unwrap();

    assert_eq!(first, DispatchOutcome::Reacted);
    assert_eq!(second, DispatchOutcome::Reacted);
    assert_eq!(gateway.count(&Call::Retreat), 2);
    assert_eq!(timers.active_count(), 1);

    // Resume counts from the stranger at 3000
    sleep_until(started + ms(12_000)).await;
    assert_eq!(session.state(), AutomationState::Suspended);
    sleep_until(started + ms(13_100)).await;
    assert_eq!(session.state(), AutomationState::Walking);
    assert_eq!(session.controller().stats().resumes_fired(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_threats_each_retreat_once() {
    let gateway = RecordingGateway::new();
    let session = session(&gateway);

    session.on_ready().unwrap();
    sleep(ms(1500)).await;

    let lynx = creature(1, "lynx");
    let stranger = player(2, false);
    let (a, b) = tokio::join!(
        session.on_notification(&lynx),
        session.on_notification(&stranger)
    );
    assert_eq!(a.unwrap(), DispatchOutcome::Reacted);
    assert_eq!(b.unwrap(), DispatchOutcome::Reacted);

    assert_eq!(gateway.count(&Call::Retreat), 2);
    assert_eq!(session.controller().timers().active_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_benign_events_do_not_interrupt() {
    let gateway = RecordingGateway::new();
    let session = session(&gateway);

    session.on_ready().unwrap();
    sleep(ms(1500)).await;

    let rabbit = session.on_notification(&creature(1, "rabbit")).await.unwrap();
    let friend = session.on_notification(&player(2, true)).await.unwrap();
    assert_eq!(rabbit, DispatchOutcome::Ignored);
    assert_eq!(friend, DispatchOutcome::Ignored);
    assert_eq!(session.state(), AutomationState::Walking);
    assert_eq!(gateway.count(&Call::Retreat), 0);

    sleep(ms(1000)).await;
    assert_eq!(gateway.moves().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_notifications_before_ready_are_dropped() {
    let gateway = RecordingGateway::new();
    let session = session(&gateway);

    let outcome = session.on_notification(&creature(1, "lynx")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Ignored);
    let outcome = session.on_notification(&curio(2, "dandelion")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Ignored);

    assert!(gateway.calls().is_empty());
    assert_eq!(session.state(), AutomationState::Idle);
    assert!(!session.is_ready());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_everything() {
    let gateway = RecordingGateway::new();
    let session = session(&gateway);

    session.on_ready().unwrap();
    sleep(ms(1500)).await;
    session.on_notification(&creature(1, "lynx")).await.unwrap();

    session.on_shutdown().await;
    assert_eq!(session.state(), AutomationState::Idle);
    assert_eq!(session.controller().timers().active_count(), 0);

    // Late notifications after shutdown are dropped
    let outcome = session.on_notification(&player(2, false)).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Ignored);

    sleep(ms(20_000)).await;
    assert_eq!(gateway.moves().len(), 1);
    assert_eq!(gateway.count(&Call::Retreat), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_retreat_is_not_fatal() {
    let gateway = RecordingGateway::new();
    gateway.set_fail_retreat(true);
    let session = session(&gateway);

    session.on_ready().unwrap();
    sleep(ms(1500)).await;
    let outcome = session.on_notification(&creature(1, "lynx")).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Reacted);

    sleep(ms(10_100)).await;
    assert_eq!(session.state(), AutomationState::Walking);
}
