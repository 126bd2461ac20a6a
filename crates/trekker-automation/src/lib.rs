/// Autowalk automation core
///
/// A [`TimerService`] drives a recurring movement task owned by the
/// [`AutomationController`]. World notifications go through the
/// [`EventDispatcher`], which classifies them against a [`Policy`] and, for
/// the interesting ones, suspends autowalk, runs a reaction against the
/// [`ActionGateway`] and schedules a resume after the cool-down. [`Session`]
/// ties these to the host's lifecycle hooks.
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod policy;
pub mod session;
pub mod timer;

pub use config::{AutomationConfig, ConfigError, CurioEntry, PolicyConfig, TrekkerConfig};
pub use controller::{AutomationController, AutomationState, AutomationStats};
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use error::{AutomationError, GatewayError};
pub use gateway::{ActionGateway, Capacity};
pub use policy::{CreatureClass, CurioClass, PlayerClass, Policy};
pub use session::Session;
pub use timer::{Quiescence, TimerHandle, TimerService};
