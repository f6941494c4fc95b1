//! Core data structures
//!
//! Trade events consumed by the scanner and the attack records it emits.
//!
//! Created: 2026-10-18

use serde::{Deserialize, Serialize};
use std::fmt;

/// One swap on an AMM pool, as delivered by the cleaning stage.
///
/// Events are read-only input. Within a pool they arrive sorted by
/// `timestamp_ms`; ties keep ingestion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Actor identity (wallet / fee payer)
    pub signer: String,
    pub timestamp_ms: u64,
    /// Coarse ordering unit (block / slot), when the source has one
    #[serde(default)]
    pub slot: Option<u64>,
    pub pool_id: String,
    #[serde(default)]
    pub from_token: Option<String>,
    #[serde(default)]
    pub to_token: Option<String>,
    #[serde(default)]
    pub validator: Option<String>,
}

impl TradeEvent {
    pub fn new(signer: &str, timestamp_ms: u64, pool_id: &str) -> Self {
        Self {
            signer: signer.to_string(),
            timestamp_ms,
            slot: None,
            pool_id: pool_id.to_string(),
            from_token: None,
            to_token: None,
            validator: None,
        }
    }

    /// Builder-style token setter, mostly for fixtures.
    pub fn with_tokens(mut self, from: &str, to: &str) -> Self {
        self.from_token = Some(from.to_string());
        self.to_token = Some(to.to_string());
        self
    }

    pub fn with_slot(mut self, slot: u64) -> Self {
        self.slot = Some(slot);
        self
    }

    /// `(from, to)` when both token fields are populated.
    pub fn direction(&self) -> Option<(&str, &str)> {
        match (&self.from_token, &self.to_token) {
            (Some(from), Some(to)) => Some((from.as_str(), to.as_str())),
            _ => None,
        }
    }

    /// Unordered token pair, when both token fields are populated.
    pub fn token_pair(&self) -> Option<TokenPair> {
        self.direction().map(|(from, to)| TokenPair::new(from, to))
    }
}

/// Unordered token pair: `SOL/X` and `X/SOL` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenPair {
    pub token_a: String,
    pub token_b: String,
}

impl TokenPair {
    pub fn new(a: &str, b: &str) -> Self {
        let (token_a, token_b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            token_a: token_a.to_string(),
            token_b: token_b.to_string(),
        }
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.token_a, self.token_b)
    }
}

/// Bucketed scanner confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfidenceLevel::Low => write!(f, "low"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::High => write!(f, "high"),
        }
    }
}

/// Final label from the attack classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    FatSandwich,
    MultiHopArbitrage,
    Ambiguous,
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttackType::FatSandwich => write!(f, "fat_sandwich"),
            AttackType::MultiHopArbitrage => write!(f, "multi_hop_arbitrage"),
            AttackType::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// One detected, classified sandwich candidate. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub pool_id: String,
    pub attacker_signer: String,
    /// Sorted, so identical input serializes identically
    pub victim_signers: Vec<String>,
    pub victim_count: usize,
    pub window_seconds: u64,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
    pub confidence_level: ConfidenceLevel,
    pub confidence_score: u32,
    pub attack_type: AttackType,
    /// In [0, 1]
    pub classification_confidence: f64,
    pub fat_sandwich_score: f64,
    pub multi_hop_score: f64,
}
