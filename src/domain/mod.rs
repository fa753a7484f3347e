//! Domain Layer - Core decision logic for the launch sniper
//!
//! This module contains pure domain types and logic with no external dependencies.
//! All external interactions happen through the ports layer.
//!
//! - `position`: Position lifecycle (Open -> Closing -> Closed) and exit rules
//! - `clock`: Injectable time source for deterministic pacing tests

pub mod clock;
pub mod position;

pub use clock::{Clock, ManualClock, SystemClock};
pub use position::{
    safe_divide, ExitRules, ExitTrigger, Position, PositionError, PositionStatus,
};
