// In-memory stand-in for a game client, for dry runs and tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use trekker_automation::{ActionGateway, Capacity, GatewayError};
use trekker_events::{Coordinate, ObjectId, WorldNotification};

const CURIO_NAMES: &[&str] = &["dandelion", "flint", "chantarelle", "bluebell", "stinging nettle"];
const CREATURE_NAMES: &[&str] = &["badger", "rabbit", "lynx", "bat", "squirrel"];

#[derive(Debug)]
struct WorldState {
    position: Coordinate,
    capacity: Capacity,
    /// Objects lying around that can still be picked
    pickable: Vec<ObjectId>,
    inventory: Vec<ObjectId>,
    committed: Vec<String>,
}

/// Counters of gateway calls the simulated world has served
#[derive(Debug, Default)]
pub struct WorldCounters {
    pub moves: AtomicU64,
    pub picks: AtomicU64,
    pub commits: AtomicU64,
    pub retreats: AtomicU64,
}

/// An [`ActionGateway`] backed by plain in-memory state.
///
/// Movement is instantaneous apart from the configured latency, which every
/// call sleeps for before touching the state.
#[derive(Debug)]
pub struct SimulatedWorld {
    state: Mutex<WorldState>,
    safe_point: Coordinate,
    latency: Duration,
    /// Capacity spent per committed item; names not listed cost 1
    item_costs: HashMap<String, u32>,
    counters: WorldCounters,
}

impl SimulatedWorld {
    pub fn new(start: Coordinate, capacity: Capacity) -> Self {
        Self {
            state: Mutex::new(WorldState {
                position: start,
                capacity,
                pickable: Vec::new(),
                inventory: Vec::new(),
                committed: Vec::new(),
            }),
            safe_point: start,
            latency: Duration::ZERO,
            item_costs: HashMap::new(),
            counters: WorldCounters::default(),
        }
    }

    pub fn with_safe_point(mut self, safe_point: Coordinate) -> Self {
        self.safe_point = safe_point;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Capacity each named item spends when committed
    pub fn with_item_costs<I, S>(mut self, costs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        self.item_costs = costs.into_iter().map(|(name, cost)| (name.into(), cost)).collect();
        self
    }

    /// Make `id` available for picking
    pub fn place_object(&self, id: ObjectId) {
        self.lock_state().pickable.push(id);
    }

    pub fn position(&self) -> Coordinate {
        self.lock_state().position
    }

    pub fn capacity(&self) -> Capacity {
        self.lock_state().capacity
    }

    /// Objects picked so far
    pub fn inventory(&self) -> Vec<ObjectId> {
        self.lock_state().inventory.clone()
    }

    /// Names of items committed so far
    pub fn committed(&self) -> Vec<String> {
        self.lock_state().committed.clone()
    }

    pub fn counters(&self) -> &WorldCounters {
        &self.counters
    }

    /// Print statistics to the log
    pub fn print_stats(&self) {
        let st = self.lock_state();
        info!(
            target: "world",
            "World: at {} | Moves: {} | Picks: {} | Commits: {} | Retreats: {} | Capacity: {}/{}",
            st.position,
            self.counters.moves.load(Ordering::SeqCst),
            self.counters.picks.load(Ordering::SeqCst),
            self.counters.commits.load(Ordering::SeqCst),
            self.counters.retreats.load(Ordering::SeqCst),
            st.capacity.used,
            st.capacity.max,
        );
    }

    fn lock_state(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ActionGateway for SimulatedWorld {
    async fn get_position(&self) -> Result<Coordinate, GatewayError> {
        self.simulate_latency().await;
        Ok(self.lock_state().position)
    }

    async fn move_to(&self, target: Coordinate) -> Result<(), GatewayError> {
        self.simulate_latency().await;
        self.lock_state().position = target;
        self.counters.moves.fetch_add(1, Ordering::SeqCst);
        debug!(target: "world", "Moved to {}", target);
        Ok(())
    }

    async fn pick_up(&self, id: ObjectId) -> Result<bool, GatewayError> {
        self.simulate_latency().await;
        let mut st = self.lock_state();
        let Some(index) = st.pickable.iter().position(|&o| o == id) else {
            return Ok(false);
        };
        st.pickable.swap_remove(index);
        st.inventory.push(id);
        self.counters.picks.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn query_capacity(&self) -> Result<Capacity, GatewayError> {
        self.simulate_latency().await;
        Ok(self.lock_state().capacity)
    }

    async fn commit_item(&self, name: &str) -> Result<bool, GatewayError> {
        self.simulate_latency().await;
        let cost = self.item_costs.get(name).copied().unwrap_or(1);
        let mut st = self.lock_state();
        if !st.capacity.can_afford(cost) {
            return Err(GatewayError::failed("commit", "capacity exhausted"));
        }
        st.capacity.used += cost;
        st.committed.push(name.to_string());
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn retreat_to_safe_point(&self) -> Result<(), GatewayError> {
        self.simulate_latency().await;
        self.lock_state().position = self.safe_point;
        self.counters.retreats.fetch_add(1, Ordering::SeqCst);
        debug!(target: "world", "Retreated to {}", self.safe_point);
        Ok(())
    }
}

/// Random sightings around a moving point, reproducible from a seed
pub struct NotificationFeed {
    rng: StdRng,
    next_id: ObjectId,
    radius: i32,
}

impl NotificationFeed {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_id: 1,
            radius: 30,
        }
    }

    /// Next sighting near `around`
    pub fn next_notification(&mut self, around: Coordinate) -> WorldNotification {
        let id = self.next_id;
        self.next_id += 1;
        let coord = around.offset(
            self.rng.gen_range(-self.radius..=self.radius),
            self.rng.gen_range(-self.radius..=self.radius),
        );

        match self.rng.gen_range(0..10) {
            0..=4 => WorldNotification::CurioFound {
                id,
                name: CURIO_NAMES[self.rng.gen_range(0..CURIO_NAMES.len())].to_string(),
                coord,
            },
            5..=7 => WorldNotification::CreatureFound {
                id,
                name: CREATURE_NAMES[self.rng.gen_range(0..CREATURE_NAMES.len())].to_string(),
                coord,
            },
            _ => WorldNotification::PlayerFound {
                id,
                is_kin: self.rng.gen_bool(0.5),
                coord,
            },
        }
    }

    /// Delay before the next sighting, between `mean / 2` and `mean * 3 / 2`
    pub fn next_delay(&mut self, mean: Duration) -> Duration {
        let mean_ms = u64::try_from(mean.as_millis()).unwrap_or(u64::MAX).max(2);
        let low = mean_ms / 2;
        let high = mean_ms.saturating_add(mean_ms / 2);
        Duration::from_millis(self.rng.gen_range(low..=high))
    }
}

/// Publish random sightings into `raw_tx` until shutdown or the receiver goes away.
///
/// Curios are placed in `world` before being announced so picking them succeeds.
pub fn spawn_notification_feed(
    world: Arc<SimulatedWorld>,
    raw_tx: mpsc::Sender<WorldNotification>,
    seed: u64,
    mean_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut feed = NotificationFeed::new(seed);
        info!(target: "world", "Notification feed started (seed {})", seed);

        loop {
            let delay = feed.next_delay(mean_interval);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.changed() => break,
            }

            let notification = feed.next_notification(world.position());
            if let WorldNotification::CurioFound { id, .. } = &notification {
                world.place_object(*id);
            }
            if raw_tx.send(notification).await.is_err() {
                break;
            }
        }

        debug!(target: "world", "Notification feed stopped");
    })
}
