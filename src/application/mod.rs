pub mod controller;
pub mod executor;
pub mod health;
pub mod positions;

pub use controller::{BotController, BotDeps, BotState, BotStatus, ControllerError};
pub use executor::{ExecutorError, PacingRules, TradeExecutor};
pub use health::{HealthMonitor, HealthReport};
pub use positions::{PositionManager, PositionStats};
