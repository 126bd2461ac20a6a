//! Shared test doubles for the automation integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use trekker_automation::{
    ActionGateway, AutomationConfig, Capacity, CurioEntry, GatewayError, PolicyConfig,
    TrekkerConfig,
};
use trekker_events::{Coordinate, ObjectId};

/// A gateway call, as recorded by [`RecordingGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetPosition,
    MoveTo(Coordinate),
    PickUp(ObjectId),
    QueryCapacity,
    CommitItem(String),
    Retreat,
}

/// In-memory gateway that journals every call with the (paused) clock offset
pub struct RecordingGateway {
    started: Instant,
    journal: Mutex<Vec<(Duration, Call)>>,
    position: Mutex<Coordinate>,
    capacity: Mutex<Capacity>,
    move_delay: Mutex<Duration>,
    pick_succeeds: AtomicBool,
    fail_moves: AtomicBool,
    fail_retreat: AtomicBool,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            journal: Mutex::new(Vec::new()),
            position: Mutex::new(Coordinate::new(0, 0)),
            capacity: Mutex::new(Capacity { max: 10, used: 0 }),
            move_delay: Mutex::new(Duration::ZERO),
            pick_succeeds: AtomicBool::new(true),
            fail_moves: AtomicBool::new(false),
            fail_retreat: AtomicBool::new(false),
        })
    }

    pub fn set_capacity(&self, max: u32, used: u32) {
        *self.capacity.lock().unwrap() = Capacity { max, used };
    }

    pub fn set_move_delay(&self, delay: Duration) {
        *self.move_delay.lock().unwrap() = delay;
    }

    pub fn set_pick_succeeds(&self, succeeds: bool) {
        self.pick_succeeds.store(succeeds, Ordering::SeqCst);
    }

    pub fn set_fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_retreat(&self, fail: bool) {
        self.fail_retreat.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(Duration, Call)> {
        self.journal.lock().unwrap().clone()
    }

    pub fn moves(&self) -> Vec<(Duration, Coordinate)> {
        self.calls()
            .into_iter()
            .filter_map(|(at, call)| match call {
                Call::MoveTo(target) => Some((at, target)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|(_, call)| call == wanted).count()
    }

    pub fn commits(&self) -> usize {
        self.calls()
            .iter()
            .filter(|(_, call)| matches!(call, Call::CommitItem(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.journal
            .lock()
            .unwrap()
            .push((self.started.elapsed(), call));
    }
}

#[async_trait]
impl ActionGateway for RecordingGateway {
    async fn get_position(&self) -> Result<Coordinate, GatewayError> {
        self.record(Call::GetPosition);
        Ok(*self.position.lock().unwrap())
    }

    async fn move_to(&self, target: Coordinate) -> Result<(), GatewayError> {
        self.record(Call::MoveTo(target));
        let delay = *self.move_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(GatewayError::failed("move_to", "path blocked"));
        }
        *self.position.lock().unwrap() = target;
        Ok(())
    }

    async fn pick_up(&self, id: ObjectId) -> Result<bool, GatewayError> {
        self.record(Call::PickUp(id));
        Ok(self.pick_succeeds.load(Ordering::SeqCst))
    }

    async fn query_capacity(&self) -> Result<Capacity, GatewayError> {
        self.record(Call::QueryCapacity);
        Ok(*self.capacity.lock().unwrap())
    }

    async fn commit_item(&self, name: &str) -> Result<bool, GatewayError> {
        self.record(Call::CommitItem(name.to_string()));
        Ok(true)
    }

    async fn retreat_to_safe_point(&self) -> Result<(), GatewayError> {
        self.record(Call::Retreat);
        if self.fail_retreat.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("no hearth fire".to_string()));
        }
        Ok(())
    }
}

pub fn test_config() -> TrekkerConfig {
    let mut policy = PolicyConfig::default();
    policy.hostile_creatures.insert("lynx".to_string());
    policy.curios.insert(
        "dandelion".to_string(),
        CurioEntry {
            collectible: true,
            cost: 1,
        },
    );
    policy.curios.insert(
        "flint".to_string(),
        CurioEntry {
            collectible: false,
            cost: 0,
        },
    );

    TrekkerConfig {
        automation: AutomationConfig {
            walk_interval_ms: 1000,
            step: 50,
            cooldown_ms: 10_000,
            stop_grace_ms: 2000,
        },
        policy,
    }
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Asserts `actual` lies within a few milliseconds of `expected`
#[track_caller]
pub fn assert_near(actual: Duration, expected: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= Duration::from_millis(5),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}
