//! Classification clusters
//!
//! The classifier looks at more than the scan window: every event in the
//! whole batch that falls inside the window's time span (plus padding) and,
//! when slots are known, inside its slot span. `EventIndex` keeps the batch
//! sorted by time so a cluster is a binary search plus a short walk.
//!
//! Created: 2026-10-18

use crate::config::ClusterConfig;
use crate::types::TradeEvent;

/// Time and slot bounds for one cluster extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterBounds {
    pub start_ms: u64,
    pub end_ms: u64,
    /// Inclusive slot range, applied only to events that carry a slot
    pub slots: Option<(u64, u64)>,
}

impl ClusterBounds {
    /// Bounds covering a scan window, widened by the configured padding.
    pub fn around(window: &[TradeEvent], padding: &ClusterConfig) -> Option<Self> {
        let first = window.first()?;
        let last = window.last()?;

        let slots = window
            .iter()
            .filter_map(|ev| ev.slot)
            .fold(None, |acc: Option<(u64, u64)>, slot| match acc {
                Some((lo, hi)) => Some((lo.min(slot), hi.max(slot))),
                None => Some((slot, slot)),
            })
            .map(|(lo, hi)| {
                (
                    lo.saturating_sub(padding.slot_padding),
                    hi.saturating_add(padding.slot_padding),
                )
            });

        Some(Self {
            start_ms: first.timestamp_ms.saturating_sub(padding.time_padding_ms),
            end_ms: last.timestamp_ms.saturating_add(padding.time_padding_ms),
            slots,
        })
    }

    fn admits(&self, ev: &TradeEvent) -> bool {
        match (self.slots, ev.slot) {
            (Some((lo, hi)), Some(slot)) => slot >= lo && slot <= hi,
            _ => true,
        }
    }
}

/// The whole batch, sorted by timestamp with ingestion order kept on ties.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    events: Vec<TradeEvent>,
}

impl EventIndex {
    pub fn new(mut events: Vec<TradeEvent>) -> Self {
        events.sort_by_key(|ev| ev.timestamp_ms);
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every event inside `bounds`, in time order.
    pub fn cluster(&self, bounds: &ClusterBounds) -> Vec<&TradeEvent> {
        let from = self.events.partition_point(|ev| ev.timestamp_ms < bounds.start_ms);
        self.events[from..]
            .iter()
            .take_while(|ev| ev.timestamp_ms <= bounds.end_ms)
            .filter(|ev| bounds.admits(ev))
            .collect()
    }
}
