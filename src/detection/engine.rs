//! Detection engine
//!
//! Drives a whole batch: groups events by pool, validates each pool's
//! sequence, runs the window scanner, scores and classifies every candidate
//! and emits one `AttackRecord` per candidate.
//!
//! A malformed pool is skipped and reported; the other pools still run.
//! Pools share nothing mutable, so `detect_concurrent` fans them out over
//! blocking tokio tasks and merges in the same order as `detect`.
//!
//! Created: 2026-10-18

use super::classifier::{AttackClassifier, Classification};
use super::confidence::{score_confidence, ConfidenceInputs};
use super::oracle::OracleSignal;
use super::scanner::{CandidateWindow, WindowScanner};
use crate::analysis::{ClusterBounds, EventIndex};
use crate::config::{ConfigError, DetectorConfig};
use crate::types::{AttackRecord, TradeEvent};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};

/// Per-pool input problems. The pool yields no records; others continue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolScanError {
    #[error("event {index} has an empty {field}")]
    MalformedEvent { index: usize, field: &'static str },
    #[error("timestamp goes backwards at event {index} ({previous_ms} -> {current_ms})")]
    NonMonotonic {
        index: usize,
        previous_ms: u64,
        current_ms: u64,
    },
    #[error("scan task failed: {0}")]
    TaskFailed(String),
}

/// A pool left out of the run, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPool {
    pub pool_id: String,
    pub reason: String,
}

/// Everything one run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionReport {
    pub records: Vec<AttackRecord>,
    pub skipped_pools: Vec<SkippedPool>,
    pub pools_scanned: usize,
    pub candidates_found: usize,
    /// Candidates whose classification came from the per-run cache
    pub classifications_reused: usize,
}

/// (pool, attacker, start_index, start_ms, end_ms)
type ClusterKey = (String, String, usize, u64, u64);

/// Per-run memo: the same bracket found under several window durations is
/// classified once.
type ClassificationCache = DashMap<ClusterKey, Classification>;

#[derive(Debug, Default)]
struct PoolScan {
    records: Vec<AttackRecord>,
    candidates: usize,
    reused: usize,
}

type PoolOutcome = (String, Result<PoolScan, PoolScanError>);

/// Check the invariants the scanner relies on: required fields present,
/// timestamps non-decreasing.
pub fn validate_pool_sequence(events: &[TradeEvent]) -> Result<(), PoolScanError> {
    let mut previous_ms = 0;
    for (index, ev) in events.iter().enumerate() {
        if ev.signer.trim().is_empty() {
            return Err(PoolScanError::MalformedEvent {
                index,
                field: "signer",
            });
        }
        if ev.pool_id.trim().is_empty() {
            return Err(PoolScanError::MalformedEvent {
                index,
                field: "pool_id",
            });
        }
        if index > 0 && ev.timestamp_ms < previous_ms {
            return Err(PoolScanError::NonMonotonic {
                index,
                previous_ms,
                current_ms: ev.timestamp_ms,
            });
        }
        previous_ms = ev.timestamp_ms;
    }
    Ok(())
}

/// Split a batch into per-pool sequences, keeping ingestion order inside
/// each pool. Pools come out sorted by id.
pub fn group_by_pool(events: &[TradeEvent]) -> BTreeMap<String, Vec<TradeEvent>> {
    let mut pools: BTreeMap<String, Vec<TradeEvent>> = BTreeMap::new();
    for ev in events {
        pools.entry(ev.pool_id.clone()).or_default().push(ev.clone());
    }
    pools
}

/// Sandwich detection over a complete, pre-sorted batch of trade events
#[derive(Debug, Clone)]
pub struct SandwichDetector {
    config: DetectorConfig,
}

impl SandwichDetector {
    /// Build a detector. Fails on any configuration error, before any
    /// scanning can start.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Scan every pool in the batch, one after another.
    pub fn detect(&self, events: &[TradeEvent], oracle: &dyn OracleSignal) -> DetectionReport {
        let pools = group_by_pool(events);
        let index = EventIndex::new(events.to_vec());
        let cache = ClassificationCache::new();

        info!(
            "Scanning {} events across {} pools ({} window sizes)",
            events.len(),
            pools.len(),
            self.config.scanner.window_seconds.len()
        );

        let results = pools.into_iter().map(|(pool_id, pool_events)| {
            let result = self.scan_pool(&pool_events, &index, oracle, &cache);
            (pool_id, result)
        });

        assemble(results)
    }

    /// Scan pools in parallel on tokio's blocking pool.
    ///
    /// Output is identical to [`SandwichDetector::detect`] on the same input.
    pub async fn detect_concurrent(
        self: Arc<Self>,
        events: Vec<TradeEvent>,
        oracle: Arc<dyn OracleSignal>,
    ) -> DetectionReport {
        let pools = group_by_pool(&events);
        info!(
            "Scanning {} events across {} pools concurrently",
            events.len(),
            pools.len()
        );

        let index = Arc::new(EventIndex::new(events));
        let cache = Arc::new(ClassificationCache::new());
        let mut tasks = JoinSet::new();
        let mut pool_of_task = HashMap::new();

        for (pool_id, pool_events) in pools {
            let detector = Arc::clone(&self);
            let index = Arc::clone(&index);
            let oracle = Arc::clone(&oracle);
            let cache = Arc::clone(&cache);
            let task_pool = pool_id.clone();
            let handle = tasks.spawn_blocking(move || {
                let result = detector.scan_pool(&pool_events, &index, &*oracle, &cache);
                (task_pool, result)
            });
            pool_of_task.insert(handle.id(), pool_id);
        }

        assemble(join_pool_scans(tasks, pool_of_task).await)
    }

    fn scan_pool(
        &self,
        pool_events: &[TradeEvent],
        index: &EventIndex,
        oracle: &dyn OracleSignal,
        cache: &ClassificationCache,
    ) -> Result<PoolScan, PoolScanError> {
        validate_pool_sequence(pool_events)?;

        let scanner = WindowScanner::new(&self.config.scanner);
        let candidates = scanner.scan(pool_events);

        let mut scan = PoolScan {
            candidates: candidates.len(),
            ..PoolScan::default()
        };
        for candidate in &candidates {
            let (classification, reused) = self.classify_candidate(candidate, index, oracle, cache);
            if reused {
                scan.reused += 1;
            }
            scan.records.push(self.build_record(candidate, &classification));
        }

        if let Some(first) = pool_events.first() {
            debug!(
                "Pool {}: {} events, {} candidates",
                first.pool_id,
                pool_events.len(),
                scan.candidates
            );
        }
        Ok(scan)
    }

    /// Classify one candidate over its cluster, reusing a cached result for
    /// an identical bracket.
    fn classify_candidate(
        &self,
        candidate: &CandidateWindow<'_>,
        index: &EventIndex,
        oracle: &dyn OracleSignal,
        cache: &ClassificationCache,
    ) -> (Classification, bool) {
        let key: ClusterKey = (
            candidate.pool_id.to_string(),
            candidate.attacker.to_string(),
            candidate.start_index,
            candidate.start_time_ms(),
            candidate.end_time_ms(),
        );
        if let Some(hit) = cache.get(&key) {
            return (hit.value().clone(), true);
        }

        let cluster = self.classification_cluster(candidate, index);
        let burst = oracle.burst_between(
            candidate.pool_id,
            candidate.start_time_ms(),
            candidate.end_time_ms(),
        );

        let classification = AttackClassifier::new(&self.config).classify(
            &cluster,
            candidate.events,
            candidate.attacker,
            burst,
        );
        cache.insert(key, classification.clone());
        (classification, false)
    }

    /// Events the classifier sees around a candidate, in time order.
    ///
    /// Without time padding the candidate's own pool contributes exactly the
    /// scan window: same-pool events that share the opening timestamp but
    /// were ingested before `events[start_index]` stay out.
    fn classification_cluster<'a>(
        &self,
        candidate: &CandidateWindow<'a>,
        index: &'a EventIndex,
    ) -> Vec<&'a TradeEvent> {
        let bounds = match ClusterBounds::around(candidate.events, &self.config.cluster) {
            Some(bounds) => bounds,
            None => return Vec::new(),
        };
        let mut cluster = index.cluster(&bounds);
        if self.config.cluster.time_padding_ms == 0 {
            cluster.retain(|ev| ev.pool_id != candidate.pool_id);
            cluster.extend(candidate.events.iter());
            // Stable: cross-pool events keep their order on ties
            cluster.sort_by_key(|ev| ev.timestamp_ms);
        }
        cluster
    }

    fn build_record(
        &self,
        candidate: &CandidateWindow<'_>,
        classification: &Classification,
    ) -> AttackRecord {
        let confidence = score_confidence(
            &ConfidenceInputs::from(candidate),
            &self.config.confidence,
        );

        AttackRecord {
            pool_id: candidate.pool_id.to_string(),
            attacker_signer: candidate.attacker.to_string(),
            victim_signers: candidate.victims.clone(),
            victim_count: candidate.victims.len(),
            window_seconds: candidate.window_seconds,
            start_time_ms: candidate.start_time_ms(),
            end_time_ms: candidate.end_time_ms(),
            confidence_level: confidence.level,
            confidence_score: confidence.score,
            attack_type: classification.attack_type,
            classification_confidence: classification.confidence,
            fat_sandwich_score: classification.fat_sandwich_score,
            multi_hop_score: classification.multi_hop_score,
        }
    }
}

/// Collect finished pool scans. A task that panicked or was cancelled is
/// reported against its pool instead of vanishing from the report.
async fn join_pool_scans(
    mut tasks: JoinSet<PoolOutcome>,
    pool_of_task: HashMap<Id, String>,
) -> BTreeMap<String, Result<PoolScan, PoolScanError>> {
    let mut results = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((pool_id, result)) => {
                results.insert(pool_id, result);
            }
            Err(e) => {
                let pool_id = pool_of_task
                    .get(&e.id())
                    .cloned()
                    .unwrap_or_else(|| format!("task-{}", e.id()));
                error!("Pool scan task for {} failed: {}", pool_id, e);
                results.insert(pool_id, Err(PoolScanError::TaskFailed(e.to_string())));
            }
        }
    }
    results
}

/// Fold per-pool results, in pool-id order, into one report.
fn assemble<I>(results: I) -> DetectionReport
where
    I: IntoIterator<Item = PoolOutcome>,
{
    let mut report = DetectionReport::default();

    for (pool_id, result) in results {
        match result {
            Ok(scan) => {
                report.pools_scanned += 1;
                report.candidates_found += scan.candidates;
                report.classifications_reused += scan.reused;
                if !scan.records.is_empty() {
                    info!("Pool {}: {} attack records", pool_id, scan.records.len());
                }
                report.records.extend(scan.records);
            }
            Err(e) => {
                warn!("Skipping pool {}: {}", pool_id, e);
                report.skipped_pools.push(SkippedPool {
                    pool_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Detection complete: {} records from {} pools ({} skipped, {} cached classifications)",
        report.records.len(),
        report.pools_scanned,
        report.skipped_pools.len(),
        report.classifications_reused
    );
    report
}
