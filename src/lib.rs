#![allow(dead_code, unused_imports, unused_variables)]
//! Curve Sniper - Bonding Curve Launch Sniper Library
//!
//! Watches pump.fun-style token launches, filters them through safety and
//! opportunity gates, and manages the resulting positions through exit rules.
//!
//! # Modules
//!
//! - `domain`: Core business logic (Position, ExitRules, Clock)
//! - `ports`: Trait abstractions (LaunchMonitor, TokenValidator, Buyer, Seller)
//! - `strategy`: Trade gating (EventGate, RejectReason)
//! - `adapters`: External implementations (paper trading stack, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Bot controller, trade executor, position manager
pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
