//! Detector configuration
//!
//! Every heuristic threshold and weight used by the scanner, the confidence
//! scorer and the attack classifier lives here as a named field. Loaded from
//! TOML; any field left out of the file keeps its default.
//!
//! Created: 2026-10-18

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration problems. Any of these aborts the run before scanning.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window_seconds must not be empty")]
    NoWindows,
    #[error("window duration must be positive (got {0})")]
    NonPositiveWindow(u64),
    #[error("min_trades must be at least 2 (got {0})")]
    MinTradesTooSmall(usize),
    #[error("min_attacker_trades must be at least 2 (got {0})")]
    MinAttackerTradesTooSmall(usize),
    #[error("max_victim_ratio must be in (0, 1] (got {0})")]
    VictimRatioOutOfRange(f64),
    #[error("advance_divisor must be positive")]
    ZeroAdvanceDivisor,
    #[error("{field} must be a finite value in [0, 1] (got {value})")]
    WeightOutOfRange { field: &'static str, value: f64 },
    #[error("medium_threshold ({medium}) must not exceed high_threshold ({high})")]
    BucketOrder { medium: u32, high: u32 },
    #[error("tie_break_margin must be finite and non-negative (got {0})")]
    InvalidMargin(f64),
}

/// Window Scanner parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Window durations to scan, in seconds
    pub window_seconds: Vec<u64>,
    pub min_trades: usize,
    pub min_attacker_trades: usize,
    pub max_victim_ratio: f64,
    /// After a hit, advance by `max(1, attacker_trades / advance_divisor)`
    pub advance_divisor: usize,
    /// Apply the token-pair reversal filter when token fields are present
    pub require_token_reversal: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            window_seconds: vec![1, 2, 5, 10],
            min_trades: 5,
            min_attacker_trades: 2,
            max_victim_ratio: 0.8,
            advance_divisor: 2,
            require_token_reversal: true,
        }
    }
}

/// Confidence Scorer points and buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub strong_ratio_below: f64,
    pub strong_ratio_points: u32,
    pub moderate_ratio_below: f64,
    pub moderate_ratio_points: u32,
    pub attacker_trades_min: usize,
    pub attacker_trades_points: u32,
    pub reversal_points: u32,
    pub short_window_max_seconds: u64,
    pub short_window_points: u32,
    pub many_victims_min: usize,
    pub many_victims_points: u32,
    pub high_threshold: u32,
    pub medium_threshold: u32,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            strong_ratio_below: 0.3,
            strong_ratio_points: 3,
            moderate_ratio_below: 0.5,
            moderate_ratio_points: 2,
            attacker_trades_min: 3,
            attacker_trades_points: 2,
            reversal_points: 2,
            short_window_max_seconds: 2,
            short_window_points: 1,
            many_victims_min: 3,
            many_victims_points: 1,
            high_threshold: 6,
            medium_threshold: 4,
        }
    }
}

/// Attack Classifier weights and tie-break
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierWeights {
    // Fat-sandwich hypothesis
    pub mandatory_victims_weight: f64,
    pub same_pair_weight: f64,
    pub few_pools_weight: f64,
    pub three_pools_weight: f64,
    pub oracle_burst_weight: f64,

    // Multi-hop hypothesis
    pub cycle_weight: f64,
    pub many_pairs_weight: f64,
    pub two_pairs_weight: f64,
    pub many_pools_weight: f64,
    pub two_pools_weight: f64,
    pub no_victims_weight: f64,

    /// Minimum cycle confidence for the cycle term to count
    pub min_cycle_confidence: f64,
    /// Distinct wrapped signers needed for `has_mandatory_victims`
    pub min_mandatory_victims: usize,
    /// Hysteresis band between the two hypotheses
    pub tie_break_margin: f64,
}

impl Default for ClassifierWeights {
    fn default() -> Self {
        Self {
            mandatory_victims_weight: 0.35,
            same_pair_weight: 0.25,
            few_pools_weight: 0.20,
            three_pools_weight: 0.10,
            oracle_burst_weight: 0.20,
            cycle_weight: 0.35,
            many_pairs_weight: 0.25,
            two_pairs_weight: 0.12,
            many_pools_weight: 0.20,
            two_pools_weight: 0.10,
            no_victims_weight: 0.20,
            min_cycle_confidence: 0.5,
            min_mandatory_victims: 2,
            tie_break_margin: 0.15,
        }
    }
}

impl ClassifierWeights {
    fn named_weights(&self) -> [(&'static str, f64); 12] {
        [
            ("mandatory_victims_weight", self.mandatory_victims_weight),
            ("same_pair_weight", self.same_pair_weight),
            ("few_pools_weight", self.few_pools_weight),
            ("three_pools_weight", self.three_pools_weight),
            ("oracle_burst_weight", self.oracle_burst_weight),
            ("cycle_weight", self.cycle_weight),
            ("many_pairs_weight", self.many_pairs_weight),
            ("two_pairs_weight", self.two_pairs_weight),
            ("many_pools_weight", self.many_pools_weight),
            ("two_pools_weight", self.two_pools_weight),
            ("no_victims_weight", self.no_victims_weight),
            ("min_cycle_confidence", self.min_cycle_confidence),
        ]
    }
}

/// How far the classification cluster may reach past the scan window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub time_padding_ms: u64,
    pub slot_padding: u64,
}

/// Full detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub scanner: ScannerConfig,
    pub confidence: ConfidenceWeights,
    pub classifier: ClassifierWeights,
    pub cluster: ClusterConfig,
    /// Settlement assets that close a token cycle on their own
    pub base_tokens: Vec<String>,
}

/// Native SOL / wrapped SOL and the major stables, by symbol and mint
pub const DEFAULT_BASE_TOKENS: &[&str] = &[
    "SOL",
    "WSOL",
    "So11111111111111111111111111111111111111112",
    "USDC",
    "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
    "USDT",
    "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
];

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            confidence: ConfidenceWeights::default(),
            classifier: ClassifierWeights::default(),
            cluster: ClusterConfig::default(),
            base_tokens: DEFAULT_BASE_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl DetectorConfig {
    /// Load and validate a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Check every tunable before any pool is scanned
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scanner;
        if s.window_seconds.is_empty() {
            return Err(ConfigError::NoWindows);
        }
        if let Some(&bad) = s.window_seconds.iter().find(|&&w| w == 0) {
            return Err(ConfigError::NonPositiveWindow(bad));
        }
        if s.min_trades < 2 {
            return Err(ConfigError::MinTradesTooSmall(s.min_trades));
        }
        if s.min_attacker_trades < 2 {
            return Err(ConfigError::MinAttackerTradesTooSmall(s.min_attacker_trades));
        }
        if !(s.max_victim_ratio > 0.0 && s.max_victim_ratio <= 1.0) {
            return Err(ConfigError::VictimRatioOutOfRange(s.max_victim_ratio));
        }
        if s.advance_divisor == 0 {
            return Err(ConfigError::ZeroAdvanceDivisor);
        }

        let c = &self.confidence;
        for (field, value) in [
            ("strong_ratio_below", c.strong_ratio_below),
            ("moderate_ratio_below", c.moderate_ratio_below),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { field, value });
            }
        }
        if c.medium_threshold > c.high_threshold {
            return Err(ConfigError::BucketOrder {
                medium: c.medium_threshold,
                high: c.high_threshold,
            });
        }

        for (field, value) in self.classifier.named_weights() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { field, value });
            }
        }
        let margin = self.classifier.tie_break_margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(ConfigError::InvalidMargin(margin));
        }

        Ok(())
    }

    pub fn is_base_token(&self, token: &str) -> bool {
        self.base_tokens.iter().any(|t| t == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectorConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.scanner.window_seconds, vec![1, 2, 5, 10]);
        assert_eq!(config.scanner.min_trades, 5);
        assert_eq!(config.classifier.tie_break_margin, 0.15);
        assert!(config.is_base_token("SOL"));
        assert!(!config.is_base_token("BONK"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
base_tokens = ["SOL"]

[scanner]
window_seconds = [3]
min_trades = 6

[classifier]
tie_break_margin = 0.2
"#;
        let config: DetectorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scanner.window_seconds, vec![3]);
        assert_eq!(config.scanner.min_trades, 6);
        assert_eq!(config.scanner.max_victim_ratio, 0.8);
        assert_eq!(config.classifier.tie_break_margin, 0.2);
        assert_eq!(config.classifier.mandatory_victims_weight, 0.35);
        assert_eq!(config.confidence.high_threshold, 6);
        assert_eq!(config.base_tokens, vec!["SOL".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = DetectorConfig::default();
        config.scanner.window_seconds = vec![1, 0];
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveWindow(0)));

        config.scanner.window_seconds.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoWindows));
    }

    #[test]
    fn test_bad_scanner_values_rejected() {
        let mut config = DetectorConfig::default();
        config.scanner.max_victim_ratio = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::VictimRatioOutOfRange(_))));

        let mut config = DetectorConfig::default();
        config.scanner.advance_divisor = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroAdvanceDivisor));

        let mut config = DetectorConfig::default();
        config.scanner.min_attacker_trades = 1;
        assert_eq!(config.validate(), Err(ConfigError::MinAttackerTradesTooSmall(1)));
    }

    #[test]
    fn test_bad_weights_rejected() {
        let mut config = DetectorConfig::default();
        config.classifier.cycle_weight = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightOutOfRange {
                field: "cycle_weight",
                ..
            })
        ));

        let mut config = DetectorConfig::default();
        config.classifier.tie_break_margin = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMargin(_))));

        let mut config = DetectorConfig::default();
        config.confidence.medium_threshold = 7;
        assert_eq!(
            config.validate(),
            Err(ConfigError::BucketOrder { medium: 7, high: 6 })
        );
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("sandwich_detector_config_test.toml");
        std::fs::write(&path, "[scanner]\nmin_trades = 7\n").unwrap();
        let config = DetectorConfig::load(&path).unwrap();
        assert_eq!(config.scanner.min_trades, 7);

        std::fs::write(&path, "[scanner]\nwindow_seconds = [0]\n").unwrap();
        assert!(DetectorConfig::load(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
