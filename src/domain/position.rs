//! Open position lifecycle and exit rules
//!
//! A position is created from a buy fill, repriced on every tick, and
//! closed through the Open -> Closing -> Closed sequence. Closing marks a
//! pending sell so a position can never have two sell requests in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Safe division helper that returns None for division by zero
/// or non-finite inputs
pub fn safe_divide(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator.abs() < f64::EPSILON || !denominator.is_finite() || !numerator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Exit thresholds as percentages of entry price
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExitRules {
    /// Close when price gains this percentage over entry
    pub take_profit_pct: f64,
    /// Close when price loses this percentage from entry
    pub stop_loss_pct: f64,
    /// Close when price retraces this percentage from its post-entry peak
    pub trailing_stop_pct: f64,
}

/// Position lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Held and re-evaluated every tick
    Open,
    /// A sell request is in flight
    Closing,
    /// Sold; immutable from here on
    Closed,
}

/// Which exit rule fired, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitTrigger {
    StopLoss,
    TakeProfit,
    TrailingStop,
}

impl fmt::Display for ExitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitTrigger::StopLoss => write!(f, "stop-loss"),
            ExitTrigger::TakeProfit => write!(f, "take-profit"),
            ExitTrigger::TrailingStop => write!(f, "trailing-stop"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("Position is already closed")]
    AlreadyClosed,
    #[error("A sell is already pending for this position")]
    SellPending,
    #[error("No sell is pending for this position")]
    NoSellPending,
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
    #[error("Invalid entry price: {0}")]
    InvalidEntryPrice(f64),
}

/// One tracked holding of a launched token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub token_address: String,
    pub token_symbol: String,
    /// Token quantity held
    pub amount: f64,
    pub entry_price: f64,
    pub current_price: f64,
    /// Highest price observed since entry, never below entry price
    pub highest_price: f64,
    /// Unrealized P&L in SOL, realized once closed
    pub pnl: f64,
    pub pnl_percentage: f64,
    /// Fixed at creation from the take-profit percentage
    pub take_profit_price: f64,
    /// Fixed at creation from the stop-loss percentage
    pub stop_loss_price: f64,
    pub status: PositionStatus,
    /// The rule that closed (or is closing) the position
    pub closed_by: Option<ExitTrigger>,
    pub opened_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Position {
    /// Create an open position from a buy fill
    ///
    /// Take-profit and stop-loss prices are derived from the entry price
    /// here and never recomputed.
    pub fn open(
        token_address: String,
        token_symbol: String,
        amount: f64,
        entry_price: f64,
        rules: &ExitRules,
        now: DateTime<Utc>,
    ) -> Result<Self, PositionError> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(PositionError::InvalidAmount(amount));
        }
        if entry_price <= 0.0 || !entry_price.is_finite() {
            return Err(PositionError::InvalidEntryPrice(entry_price));
        }

        Ok(Self {
            token_address,
            token_symbol,
            amount,
            entry_price,
            current_price: entry_price,
            highest_price: entry_price,
            pnl: 0.0,
            pnl_percentage: 0.0,
            take_profit_price: entry_price * (1.0 + rules.take_profit_pct / 100.0),
            stop_loss_price: entry_price * (1.0 - rules.stop_loss_pct / 100.0),
            status: PositionStatus::Open,
            closed_by: None,
            opened_at: now,
            last_updated: now,
        })
    }

    /// Refresh the mark price and recompute P&L
    ///
    /// Closed positions are immutable, so updates on them are ignored.
    pub fn update_price(&mut self, price: f64, now: DateTime<Utc>) {
        if self.status == PositionStatus::Closed {
            return;
        }
        self.current_price = price;
        if price > self.highest_price {
            self.highest_price = price;
        }
        self.pnl = (price - self.entry_price) * self.amount;
        self.pnl_percentage = safe_divide(price - self.entry_price, self.entry_price)
            .map(|r| r * 100.0)
            .unwrap_or(0.0);
        self.last_updated = now;
    }

    /// Evaluate exit rules against the current price
    ///
    /// Rules are checked in a fixed priority: stop-loss first (cutting
    /// losses beats taking profit on the same tick), then take-profit,
    /// then trailing-stop. Only Open positions produce a trigger.
    pub fn check_exit(&self, trailing_stop_pct: f64) -> Option<ExitTrigger> {
        if self.status != PositionStatus::Open {
            return None;
        }
        if self.current_price <= self.stop_loss_price {
            return Some(ExitTrigger::StopLoss);
        }
        if self.current_price >= self.take_profit_price {
            return Some(ExitTrigger::TakeProfit);
        }
        let trail_floor = self.highest_price * (1.0 - trailing_stop_pct / 100.0);
        if self.current_price <= trail_floor {
            return Some(ExitTrigger::TrailingStop);
        }
        None
    }

    /// Mark a sell as pending
    pub fn begin_close(&mut self, trigger: ExitTrigger) -> Result<(), PositionError> {
        match self.status {
            PositionStatus::Open => {
                self.status = PositionStatus::Closing;
                self.closed_by = Some(trigger);
                Ok(())
            }
            PositionStatus::Closing => Err(PositionError::SellPending),
            PositionStatus::Closed => Err(PositionError::AlreadyClosed),
        }
    }

    /// Finalize the close with the sell fill price, realizing P&L
    pub fn confirm_close(&mut self, fill_price: f64, now: DateTime<Utc>) -> Result<(), PositionError> {
        if self.status != PositionStatus::Closing {
            return Err(PositionError::NoSellPending);
        }
        self.update_price(fill_price, now);
        self.status = PositionStatus::Closed;
        Ok(())
    }

    /// Revert a failed sell, making the position eligible again next tick
    pub fn revert_close(&mut self) -> Result<(), PositionError> {
        if self.status != PositionStatus::Closing {
            return Err(PositionError::NoSellPending);
        }
        self.status = PositionStatus::Open;
        self.closed_by = None;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == PositionStatus::Closed
    }
}
