//! Sandwich Detection Module
//!
//! Window scanning, confidence scoring, attack classification and the
//! batch engine that ties them together.
//!
//! Created: 2026-10-18

pub mod classifier;
pub mod confidence;
pub mod engine;
pub mod oracle;
pub mod scanner;

pub use classifier::{decide, AttackClassifier, Classification, ClassifierInputs};
pub use confidence::{score_confidence, ConfidenceInputs, ConfidenceScore};
pub use engine::{
    group_by_pool, validate_pool_sequence, DetectionReport, PoolScanError, SandwichDetector,
    SkippedPool,
};
pub use oracle::{BurstTimeline, NoOracle, OracleSignal};
pub use scanner::{advance_after_hit, CandidateWindow, Rejection, WindowScanner};
