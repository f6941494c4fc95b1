//! Oracle-burst signal
//!
//! The classifier can take an external hint that an oracle price burst
//! happened inside a candidate's time window. The oracle analysis itself
//! lives elsewhere; this module only defines the seam and a timeline backed
//! by burst timestamps exported from that analysis.
//!
//! Created: 2026-10-18

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Source of "an oracle burst occurred in this window" flags
pub trait OracleSignal: Send + Sync {
    fn burst_between(&self, pool_id: &str, start_ms: u64, end_ms: u64) -> bool;
}

/// No oracle data: every window reports no burst
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

impl OracleSignal for NoOracle {
    fn burst_between(&self, _pool_id: &str, _start_ms: u64, _end_ms: u64) -> bool {
        false
    }
}

/// Burst timestamps, either chain-wide or per pool.
///
/// JSON form:
/// `{"global": [1700000000123], "pools": {"<pool_id>": [1700000000456]}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstTimeline {
    pub global: Vec<u64>,
    pub pools: BTreeMap<String, Vec<u64>>,
}

impl BurstTimeline {
    pub fn new(mut global: Vec<u64>, mut pools: BTreeMap<String, Vec<u64>>) -> Self {
        global.sort_unstable();
        for bursts in pools.values_mut() {
            bursts.sort_unstable();
        }
        Self { global, pools }
    }

    /// Load a burst timeline from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read oracle burst file: {}", path.as_ref().display())
        })?;
        let raw: Self = serde_json::from_str(&content)
            .with_context(|| "Failed to parse oracle burst JSON")?;
        Ok(Self::new(raw.global, raw.pools))
    }

    pub fn burst_count(&self) -> usize {
        self.global.len() + self.pools.values().map(Vec::len).sum::<usize>()
    }
}

/// Any sorted timestamp inside `[start_ms, end_ms]`
fn any_within(sorted: &[u64], start_ms: u64, end_ms: u64) -> bool {
    let idx = sorted.partition_point(|&ts| ts < start_ms);
    sorted.get(idx).is_some_and(|&ts| ts <= end_ms)
}

impl OracleSignal for BurstTimeline {
    fn burst_between(&self, pool_id: &str, start_ms: u64, end_ms: u64) -> bool {
        any_within(&self.global, start_ms, end_ms)
            || self
                .pools
                .get(pool_id)
                .is_some_and(|bursts| any_within(bursts, start_ms, end_ms))
    }
}
