//! Attack Classifier
//!
//! Two competing hypotheses for every candidate:
//!
//! - fat sandwich: several wrapped victims, one token pair, one or two pools,
//!   optionally an oracle burst in the window
//! - multi-hop arbitrage: the attacker's token path closes into a loop across
//!   several pairs and pools, with nobody wrapped
//!
//! The higher score wins only if it clears the other by the tie-break margin;
//! otherwise the candidate is labelled ambiguous.
//!
//! Created: 2026-10-18

use crate::analysis::{
    analyze_pool_diversity, detect_cycle, detect_victims, CycleAnalysis, PoolDiversity,
    VictimAnalysis,
};
use crate::config::{ClassifierWeights, DetectorConfig};
use crate::types::{AttackType, TradeEvent};
use tracing::debug;

/// Absorbs float noise when a score gap sits exactly on the margin
const MARGIN_EPSILON: f64 = 1e-9;

/// Observations feeding both hypothesis scores
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassifierInputs {
    pub has_mandatory_victims: bool,
    pub is_same_pair_throughout: bool,
    pub unique_pools: usize,
    pub unique_token_pairs: usize,
    pub is_cycle: bool,
    pub cycle_confidence: f64,
    pub oracle_burst: bool,
}

impl ClassifierInputs {
    pub fn from_analysis(
        victims: &VictimAnalysis,
        cycle: &CycleAnalysis,
        diversity: &PoolDiversity,
        oracle_burst: bool,
    ) -> Self {
        Self {
            has_mandatory_victims: victims.has_mandatory_victims,
            is_same_pair_throughout: diversity.is_same_pair_throughout,
            unique_pools: diversity.unique_pools,
            unique_token_pairs: diversity.unique_token_pairs,
            is_cycle: cycle.is_cycle,
            cycle_confidence: cycle.cycle_confidence,
            oracle_burst,
        }
    }
}

/// Final label plus the evidence behind it
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub attack_type: AttackType,
    /// In [0, 1]
    pub confidence: f64,
    pub fat_sandwich_score: f64,
    pub multi_hop_score: f64,
    pub inputs: ClassifierInputs,
}

pub fn fat_sandwich_score(inputs: &ClassifierInputs, w: &ClassifierWeights) -> f64 {
    let mut score = 0.0;
    if inputs.has_mandatory_victims {
        score += w.mandatory_victims_weight;
    }
    if inputs.is_same_pair_throughout {
        score += w.same_pair_weight;
    }
    score += match inputs.unique_pools {
        0..=2 => w.few_pools_weight,
        3 => w.three_pools_weight,
        _ => 0.0,
    };
    if inputs.oracle_burst {
        score += w.oracle_burst_weight;
    }
    score
}

pub fn multi_hop_score(inputs: &ClassifierInputs, w: &ClassifierWeights) -> f64 {
    let mut score = 0.0;
    if inputs.is_cycle && inputs.cycle_confidence >= w.min_cycle_confidence {
        score += inputs.cycle_confidence * w.cycle_weight;
    }
    score += match inputs.unique_token_pairs {
        0 | 1 => 0.0,
        2 => w.two_pairs_weight,
        _ => w.many_pairs_weight,
    };
    score += match inputs.unique_pools {
        0 | 1 => 0.0,
        2 => w.two_pools_weight,
        _ => w.many_pools_weight,
    };
    if !inputs.has_mandatory_victims {
        score += w.no_victims_weight;
    }
    score
}

/// Pick a label from the two scores.
///
/// A hypothesis wins when it leads by at least `margin`; a gap sitting on
/// the margin counts as decisive. Exact ties are always ambiguous.
pub fn decide(fat: f64, multi: f64, margin: f64) -> (AttackType, f64) {
    let clears = |lead: f64| lead > 0.0 && lead - margin > -MARGIN_EPSILON;

    if clears(fat - multi) {
        (AttackType::FatSandwich, fat.min(1.0))
    } else if clears(multi - fat) {
        (AttackType::MultiHopArbitrage, multi.min(1.0))
    } else {
        let total = fat + multi;
        let confidence = if total <= 0.0 {
            0.0
        } else {
            1.0 - (fat - multi).abs() / total.max(1.0)
        };
        (AttackType::Ambiguous, confidence)
    }
}

pub struct AttackClassifier<'c> {
    config: &'c DetectorConfig,
}

impl<'c> AttackClassifier<'c> {
    pub fn new(config: &'c DetectorConfig) -> Self {
        Self { config }
    }

    /// Classify the attacker's behaviour.
    ///
    /// `cluster` is the cross-pool extraction around the window (token path,
    /// pool diversity); `window` is the scanned window itself, whose first
    /// and last legs bracket the victims.
    pub fn classify(
        &self,
        cluster: &[&TradeEvent],
        window: &[TradeEvent],
        attacker: &str,
        oracle_burst: bool,
    ) -> Classification {
        let weights = &self.config.classifier;

        let victims = detect_victims(window, attacker, weights.min_mandatory_victims);
        let cycle = detect_cycle(cluster, attacker, |token| self.config.is_base_token(token));
        let diversity = analyze_pool_diversity(cluster, attacker);
        let inputs = ClassifierInputs::from_analysis(&victims, &cycle, &diversity, oracle_burst);

        let classification = self.classify_inputs(inputs);
        debug!(
            "Classified {} as {} (fat {:.2} / multi {:.2}): path {:?}, {} pools, {} pairs, {} victims",
            attacker,
            classification.attack_type,
            classification.fat_sandwich_score,
            classification.multi_hop_score,
            cycle.path.tokens,
            diversity.unique_pools,
            diversity.unique_token_pairs,
            victims.victim_count
        );
        classification
    }

    /// Score and label precomputed observations.
    pub fn classify_inputs(&self, inputs: ClassifierInputs) -> Classification {
        let weights = &self.config.classifier;
        let fat = fat_sandwich_score(&inputs, weights);
        let multi = multi_hop_score(&inputs, weights);
        let (attack_type, confidence) = decide(fat, multi, weights.tie_break_margin);

        Classification {
            attack_type,
            confidence,
            fat_sandwich_score: fat,
            multi_hop_score: multi,
            inputs,
        }
    }
}
