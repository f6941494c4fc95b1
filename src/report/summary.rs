//! Run Summary
//!
//! Aggregate counts over one detection run, written as pretty JSON next to
//! the record stream.
//!
//! Created: 2026-10-18

use crate::detection::{DetectionReport, SkippedPool};
use crate::types::{AttackType, ConfidenceLevel};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,

    // Input
    pub events_read: usize,
    pub malformed_lines: usize,

    // Pools
    pub pools_scanned: usize,
    pub skipped_pools: Vec<SkippedPool>,

    // Output
    pub candidates_found: usize,
    pub records_emitted: usize,
    pub classifications_reused: usize,
    pub by_attack_type: BTreeMap<AttackType, usize>,
    pub by_confidence: BTreeMap<ConfidenceLevel, usize>,
    pub unique_attackers: usize,
    pub unique_victims: usize,
}

impl RunSummary {
    pub fn from_report(
        report: &DetectionReport,
        events_read: usize,
        malformed_lines: usize,
    ) -> Self {
        let mut by_attack_type = BTreeMap::new();
        let mut by_confidence = BTreeMap::new();
        let mut attackers = BTreeSet::new();
        let mut victims = BTreeSet::new();

        for record in &report.records {
            *by_attack_type.entry(record.attack_type).or_insert(0) += 1;
            *by_confidence.entry(record.confidence_level).or_insert(0) += 1;
            attackers.insert(record.attacker_signer.as_str());
            victims.extend(record.victim_signers.iter().map(String::as_str));
        }

        Self {
            generated_at: Utc::now(),
            events_read,
            malformed_lines,
            pools_scanned: report.pools_scanned,
            skipped_pools: report.skipped_pools.clone(),
            candidates_found: report.candidates_found,
            records_emitted: report.records.len(),
            classifications_reused: report.classifications_reused,
            by_attack_type,
            by_confidence,
            unique_attackers: attackers.len(),
            unique_victims: victims.len(),
        }
    }

    pub fn count_of(&self, attack_type: AttackType) -> usize {
        self.by_attack_type.get(&attack_type).copied().unwrap_or(0)
    }

    /// Write as pretty JSON
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create summary directory: {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run summary")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;
        Ok(())
    }

    pub fn log(&self) {
        info!("===========================================");
        info!("  Detection Summary");
        info!("===========================================");
        info!(
            "Events: {} read, {} malformed lines",
            self.events_read, self.malformed_lines
        );
        info!(
            "Pools: {} scanned, {} skipped",
            self.pools_scanned,
            self.skipped_pools.len()
        );
        info!(
            "Records: {} ({} fat sandwich, {} multi-hop, {} ambiguous)",
            self.records_emitted,
            self.count_of(AttackType::FatSandwich),
            self.count_of(AttackType::MultiHopArbitrage),
            self.count_of(AttackType::Ambiguous)
        );
        info!(
            "Attackers: {}, victims: {}",
            self.unique_attackers, self.unique_victims
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttackRecord;

    fn record(attacker: &str, victims: &[&str], attack_type: AttackType) -> AttackRecord {
        AttackRecord {
            pool_id: "P".to_string(),
            attacker_signer: attacker.to_string(),
            victim_signers: victims.iter().map(|v| v.to_string()).collect(),
            victim_count: victims.len(),
            window_seconds: 1,
            start_time_ms: 0,
            end_time_ms: 100,
            confidence_level: ConfidenceLevel::High,
            confidence_score: 7,
            attack_type,
            classification_confidence: 0.7,
            fat_sandwich_score: 0.7,
            multi_hop_score: 0.2,
        }
    }

    fn report() -> DetectionReport {
        DetectionReport {
            records: vec![
                record("A", &["B", "C"], AttackType::FatSandwich),
                record("A", &["C", "D"], AttackType::FatSandwich),
                record("X", &["B"], AttackType::Ambiguous),
            ],
            skipped_pools: vec![SkippedPool {
                pool_id: "Q".to_string(),
                reason: "event 0 has an empty signer".to_string(),
            }],
            pools_scanned: 2,
            candidates_found: 3,
            classifications_reused: 1,
        }
    }

    #[test]
    fn test_counts() {
        let summary = RunSummary::from_report(&report(), 40, 2);
        assert_eq!(summary.records_emitted, 3);
        assert_eq!(summary.count_of(AttackType::FatSandwich), 2);
        assert_eq!(summary.count_of(AttackType::MultiHopArbitrage), 0);
        assert_eq!(summary.by_confidence[&ConfidenceLevel::High], 3);
        assert_eq!(summary.unique_attackers, 2);
        assert_eq!(summary.unique_victims, 3);
        assert_eq!(summary.skipped_pools.len(), 1);
    }

    #[test]
    fn test_write_pretty_json() {
        let path = std::env::temp_dir().join("sandwich_detector_summary_test.json");
        let summary = RunSummary::from_report(&report(), 40, 2);
        summary.write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"fat_sandwich\": 2"));
        let parsed: RunSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, summary);
        let _ = std::fs::remove_file(&path);
    }
}
