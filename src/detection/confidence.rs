//! Confidence Scorer
//!
//! Additive points over a surviving window, bucketed into high / medium /
//! low. Independent of the fat-sandwich vs. multi-hop classification.
//!
//! Created: 2026-10-18

use super::scanner::CandidateWindow;
use crate::config::ConfidenceWeights;
use crate::types::ConfidenceLevel;

/// Observations the scorer needs from a candidate window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    pub victim_ratio: f64,
    pub attacker_trade_count: usize,
    pub reversal_validated: bool,
    pub window_seconds: u64,
    pub unique_victim_count: usize,
}

impl From<&CandidateWindow<'_>> for ConfidenceInputs {
    fn from(candidate: &CandidateWindow<'_>) -> Self {
        Self {
            victim_ratio: candidate.victim_ratio,
            attacker_trade_count: candidate.attacker_trade_count,
            reversal_validated: candidate.reversal_validated,
            window_seconds: candidate.window_seconds,
            unique_victim_count: candidate.victims.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceScore {
    pub score: u32,
    pub level: ConfidenceLevel,
}

/// Score a window. Each rule contributes at most once.
pub fn score_confidence(inputs: &ConfidenceInputs, weights: &ConfidenceWeights) -> ConfidenceScore {
    let mut score = 0;

    if inputs.victim_ratio < weights.strong_ratio_below {
        score += weights.strong_ratio_points;
    } else if inputs.victim_ratio < weights.moderate_ratio_below {
        score += weights.moderate_ratio_points;
    }

    if inputs.attacker_trade_count >= weights.attacker_trades_min {
        score += weights.attacker_trades_points;
    }

    if inputs.reversal_validated {
        score += weights.reversal_points;
    }

    // Tight timing reads as deliberate
    if inputs.window_seconds <= weights.short_window_max_seconds {
        score += weights.short_window_points;
    }

    if inputs.unique_victim_count >= weights.many_victims_min {
        score += weights.many_victims_points;
    }

    ConfidenceScore {
        score,
        level: bucket(score, weights),
    }
}

pub fn bucket(score: u32, weights: &ConfidenceWeights) -> ConfidenceLevel {
    if score >= weights.high_threshold {
        ConfidenceLevel::High
    } else if score >= weights.medium_threshold {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}
