//! JSONL input and output
//!
//! Trade events come in one JSON object per line; attack records go out the
//! same way. A line that does not parse is logged and skipped so one bad
//! row never sinks a batch.
//!
//! Created: 2026-10-18

use crate::types::{AttackRecord, TradeEvent};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// Events parsed from a JSONL file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedEvents {
    pub events: Vec<TradeEvent>,
    /// Non-empty lines that failed to parse
    pub malformed_lines: usize,
}

/// Parse trade events from any buffered reader
pub fn read_events<R: BufRead>(reader: R) -> Result<LoadedEvents> {
    let mut loaded = LoadedEvents::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read event line")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TradeEvent>(&line) {
            Ok(event) => loaded.events.push(event),
            Err(e) => {
                warn!("Skipping malformed event on line {}: {}", line_no + 1, e);
                loaded.malformed_lines += 1;
            }
        }
    }

    Ok(loaded)
}

/// Read trade events from a JSONL file
pub fn read_events_jsonl<P: AsRef<Path>>(path: P) -> Result<LoadedEvents> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open events file: {}", path.display()))?;
    read_events(BufReader::new(file))
}

/// Write attack records, one per line
pub fn write_records<W: Write>(mut writer: W, records: &[AttackRecord]) -> Result<()> {
    for record in records {
        let json =
            serde_json::to_string(record).context("Failed to serialize attack record to JSON")?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write attack records to a JSONL file, replacing any previous contents
pub fn write_records_jsonl<P: AsRef<Path>>(path: P, records: &[AttackRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create records file: {}", path.display()))?;
    write_records(BufWriter::new(file), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttackType, ConfidenceLevel};

    fn record(pool: &str) -> AttackRecord {
        AttackRecord {
            pool_id: pool.to_string(),
            attacker_signer: "A".to_string(),
            victim_signers: vec!["B".to_string(), "C".to_string()],
            victim_count: 2,
            window_seconds: 1,
            start_time_ms: 0,
            end_time_ms: 200,
            confidence_level: ConfidenceLevel::Medium,
            confidence_score: 4,
            attack_type: AttackType::FatSandwich,
            classification_confidence: 0.8,
            fat_sandwich_score: 0.8,
            multi_hop_score: 0.245,
        }
    }

    #[test]
    fn test_read_skips_blank_and_malformed_lines() {
        let input = concat!(
            r#"{"signer":"A","timestamp_ms":0,"pool_id":"P","from_token":"SOL","to_token":"X"}"#,
            "\n\n",
            "not json\n",
            r#"{"signer":"B","timestamp_ms":100,"pool_id":"P","slot":7}"#,
            "\n",
            r#"{"signer":"C","pool_id":"P"}"#,
            "\n",
        );
        let loaded = read_events(input.as_bytes()).unwrap();
        assert_eq!(loaded.events.len(), 2);
        assert_eq!(loaded.malformed_lines, 2);
        assert_eq!(loaded.events[0].direction(), Some(("SOL", "X")));
        assert_eq!(loaded.events[1].slot, Some(7));
    }

    #[test]
    fn test_write_one_record_per_line() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[record("P1"), record("P2")]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""attack_type":"fat_sandwich""#));
        assert!(lines[1].contains(r#""pool_id":"P2""#));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join("sandwich_detector_jsonl_test");
        let path = dir.join("records.jsonl");
        write_records_jsonl(&path, &[record("P1")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: AttackRecord = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(parsed, record("P1"));

        assert!(read_events_jsonl(dir.join("missing.jsonl")).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
