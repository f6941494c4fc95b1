//! Sandwich Detector Library
//!
//! Finds sandwich attacks in batches of AMM trade events and separates fat
//! sandwiches (one attacker wrapping several victims on one pair) from
//! multi-hop arbitrage that merely looks like one.
//!
//! Created: 2026-10-18

pub mod analysis;
pub mod config;
pub mod detection;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, DetectorConfig};
pub use detection::{DetectionReport, NoOracle, OracleSignal, SandwichDetector};
pub use types::{AttackRecord, AttackType, ConfidenceLevel, TokenPair, TradeEvent};
