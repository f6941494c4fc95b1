//! Reporting Module
//!
//! JSONL event ingestion, attack record output and run summaries.
//!
//! Created: 2026-10-18

pub mod jsonl;
pub mod summary;

pub use jsonl::{read_events, read_events_jsonl, write_records, write_records_jsonl, LoadedEvents};
pub use summary::RunSummary;
