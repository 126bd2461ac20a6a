use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use trekker_automation::{ActionGateway, Capacity, ConfigError, Session, TrekkerConfig};
use trekker_events::{Coordinate, EventSource};
use trekker_runner::{
    init_logging, spawn_consumers, spawn_notification_feed, AutomationConsumer, EventBus,
    EventConsumer, EventWrapper, LoggingConsumer, SessionEvent, SimulatedWorld,
};

const AGENT_ID: u32 = 0;
const CONSUMER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enables debug mode
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    debug: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Autowalk through a simulated world
    Run {
        /// Config file to use instead of the default location
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(long)]
        duration: Option<u64>,

        /// Seed for the simulated sightings
        #[arg(long)]
        seed: Option<u64>,

        /// Mean time between simulated sightings, in milliseconds
        #[arg(long, default_value_t = 4000)]
        sighting_interval_ms: u64,

        /// Also write logs to the data directory
        #[arg(long)]
        log_file: bool,
    },
    /// Load, validate and print the effective config
    CheckConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Load config from `path`, or from the default location.
///
/// Returns `None` after writing an example file when the default location has no config yet.
fn load_config(path: Option<PathBuf>) -> Result<Option<TrekkerConfig>, Box<dyn Error>> {
    if let Some(path) = path {
        return Ok(Some(TrekkerConfig::load_from(&path)?));
    }

    match TrekkerConfig::load() {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::NotFound(path)) => {
            info!("No config found, creating example config");
            TrekkerConfig::write_example(&path)?;
            eprintln!("Config file created at: {}", path.display());
            eprintln!("Please review it, then run trekker again.");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            duration,
            seed,
            sighting_interval_ms,
            log_file,
        } => {
            let _guard = init_logging("trekker", log_file, cli.debug)?;
            let Some(config) = load_config(config)? else {
                return Ok(());
            };
            let seed = seed.unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);
            run(
                config,
                duration.map(Duration::from_secs),
                seed,
                Duration::from_millis(sighting_interval_ms),
            )
            .await
        }
        Command::CheckConfig { config } => {
            let _guard = init_logging("trekker", false, cli.debug)?;
            let Some(config) = load_config(config)? else {
                return Ok(());
            };
            println!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn run(
    config: TrekkerConfig,
    duration: Option<Duration>,
    seed: u64,
    sighting_interval: Duration,
) -> Result<(), Box<dyn Error>> {
    info!("Starting trekker (seed {})", seed);

    let world = Arc::new(
        SimulatedWorld::new(Coordinate::new(0, 0), Capacity { max: 20, used: 0 })
            .with_latency(Duration::from_millis(50))
            .with_item_costs(
                config
                    .policy
                    .curios
                    .iter()
                    .map(|(name, entry)| (name.clone(), entry.cost)),
            ),
    );
    let gateway: Arc<dyn ActionGateway> = world.clone();
    let session = Arc::new(Session::new(&config, gateway));

    let (bus, event_rx) = EventBus::new(256);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let consumers: Vec<Box<dyn EventConsumer>> = vec![
        Box::new(LoggingConsumer),
        Box::new(AutomationConsumer::new(session.clone())),
    ];
    let consumer_task = spawn_consumers(event_rx, consumers, shutdown_rx.clone());

    let (raw_tx, raw_rx) = mpsc::channel(256);
    let wrapper = EventWrapper::new(bus.create_sender(AGENT_ID), EventSource::Simulated);
    tokio::spawn(wrapper.run(raw_rx));
    let feed_task =
        spawn_notification_feed(world.clone(), raw_tx, seed, sighting_interval, shutdown_rx);

    let session_sender = bus.create_sender(AGENT_ID);
    session_sender.publish_session(SessionEvent::Ready);

    let reason = match duration {
        Some(duration) => tokio::select! {
            _ = tokio::time::sleep(duration) => "duration elapsed",
            _ = tokio::signal::ctrl_c() => "interrupted",
        },
        None => {
            tokio::signal::ctrl_c().await?;
            "interrupted"
        }
    };

    info!("Shutting down: {}", reason);
    session_sender.publish_session(SessionEvent::Shutdown {
        reason: reason.to_string(),
    });

    if tokio::time::timeout(CONSUMER_SHUTDOWN_TIMEOUT, consumer_task)
        .await
        .is_err()
    {
        warn!("Event consumers did not finish within timeout, continuing shutdown");
    }
    let _ = shutdown_tx.send(true);
    let _ = feed_task.await;

    session.controller().stats().print();
    world.print_stats();
    println!(
        "trekker finished at {} after {} moves, {} reactions",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        session.controller().stats().moves_issued(),
        session.controller().stats().reactions_run(),
    );

    Ok(())
}
