//! Tradesim Core — candle-driven backtest simulation driver.
//!
//! This crate contains:
//! - Domain types (periods, charts, data dependencies, session parameters, snapshot, episode)
//! - Chart alignment of indicator series to the current candle
//! - Stop conditions and next-candle/day-rollover logic
//! - Heartbeat progress reporting
//! - The two-cycle simulation driver and its collaborator traits

pub mod domain;
pub mod engine;
