pub mod automation_config;
pub mod policy_config;
pub mod trekker_config;

pub use automation_config::AutomationConfig;
pub use policy_config::{CurioEntry, PolicyConfig};
pub use trekker_config::{ConfigError, TrekkerConfig};
