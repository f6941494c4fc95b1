//! Window Scanner
//!
//! Slides fixed-duration windows over one pool's time-sorted events and keeps
//! the windows shaped like a sandwich: the same signer opens and closes the
//! window, other signers trade in between, and the attacker round-trips the
//! same token pair.
//!
//! Rejection filters run cheapest first; the first failure drops the
//! position and the scan moves on by one event. After a hit the scan skips
//! ahead by half the attacker's trade count so overlapping copies of the
//! same attack are not reported again.
//!
//! Created: 2026-10-18

use crate::analysis::detect_victims;
use crate::config::ScannerConfig;
use crate::types::TradeEvent;
use std::fmt;
use tracing::{debug, trace};

/// Why a scan position was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooFewTrades,
    NoBracket,
    NoVictims,
    AttackerTooQuiet,
    VictimRatioTooHigh,
    NoTokenReversal,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rejection::TooFewTrades => write!(f, "too few trades"),
            Rejection::NoBracket => write!(f, "first and last signer differ"),
            Rejection::NoVictims => write!(f, "no wrapped victims"),
            Rejection::AttackerTooQuiet => write!(f, "attacker traded too few times"),
            Rejection::VictimRatioTooHigh => write!(f, "victim ratio above limit"),
            Rejection::NoTokenReversal => write!(f, "attacker legs do not reverse"),
        }
    }
}

/// A window that survived every rejection filter.
///
/// Borrows the pool's event slice; `events.first()` and `events.last()`
/// are always the attacker.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateWindow<'a> {
    pub pool_id: &'a str,
    pub window_seconds: u64,
    /// Offset of the first event in the pool sequence
    pub start_index: usize,
    pub events: &'a [TradeEvent],
    pub attacker: &'a str,
    /// Distinct wrapped signers, sorted
    pub victims: Vec<String>,
    pub attacker_trade_count: usize,
    /// `victims.len() / events.len()`
    pub victim_ratio: f64,
    /// Token fields were present and the attacker's legs reversed
    pub reversal_validated: bool,
}

impl<'a> CandidateWindow<'a> {
    pub fn start_time_ms(&self) -> u64 {
        self.events.first().map(|ev| ev.timestamp_ms).unwrap_or_default()
    }

    pub fn end_time_ms(&self) -> u64 {
        self.events.last().map(|ev| ev.timestamp_ms).unwrap_or_default()
    }

    pub fn trade_count(&self) -> usize {
        self.events.len()
    }
}

/// Scan-pointer advance after a recorded hit.
pub fn advance_after_hit(attacker_trade_count: usize, divisor: usize) -> usize {
    (attacker_trade_count / divisor.max(1)).max(1)
}

pub struct WindowScanner<'c> {
    config: &'c ScannerConfig,
}

impl<'c> WindowScanner<'c> {
    pub fn new(config: &'c ScannerConfig) -> Self {
        Self { config }
    }

    /// All candidate windows for one pool, for every configured duration.
    ///
    /// `events` must belong to a single pool and be sorted by timestamp.
    /// Durations are scanned in configured order.
    pub fn scan<'a>(&self, events: &'a [TradeEvent]) -> Vec<CandidateWindow<'a>> {
        let mut candidates = Vec::new();
        if events.len() < self.config.min_trades {
            return candidates;
        }
        for &window_seconds in &self.config.window_seconds {
            self.scan_duration(events, window_seconds, &mut candidates);
        }
        candidates
    }

    fn scan_duration<'a>(
        &self,
        events: &'a [TradeEvent],
        window_seconds: u64,
        out: &mut Vec<CandidateWindow<'a>>,
    ) {
        let mut i = 0;
        // No window starting past this point can hold min_trades events
        while i + self.config.min_trades <= events.len() {
            match self.evaluate(events, i, window_seconds) {
                Ok(candidate) => {
                    let step = advance_after_hit(
                        candidate.attacker_trade_count,
                        self.config.advance_divisor,
                    );
                    debug!(
                        "Candidate {}s window at {} on {}: attacker {} ({} legs), {} victims",
                        window_seconds,
                        candidate.start_time_ms(),
                        candidate.pool_id,
                        candidate.attacker,
                        candidate.attacker_trade_count,
                        candidate.victims.len()
                    );
                    out.push(candidate);
                    i += step;
                }
                Err(reason) => {
                    trace!("{}s window at index {} rejected: {}", window_seconds, i, reason);
                    i += 1;
                }
            }
        }
    }

    /// Evaluate the window opening at `events[start]`.
    pub fn evaluate<'a>(
        &self,
        events: &'a [TradeEvent],
        start: usize,
        window_seconds: u64,
    ) -> Result<CandidateWindow<'a>, Rejection> {
        let opening = events.get(start).ok_or(Rejection::TooFewTrades)?;
        let limit = opening
            .timestamp_ms
            .saturating_add(window_seconds.saturating_mul(1000));
        let len = events[start..].partition_point(|ev| ev.timestamp_ms <= limit);
        let window = &events[start..start + len];

        // 1. Minimum trade count
        if window.len() < self.config.min_trades {
            return Err(Rejection::TooFewTrades);
        }

        // 2. Bracket: same signer opens and closes
        let first = &window[0];
        let last = &window[window.len() - 1];
        if first.signer != last.signer {
            return Err(Rejection::NoBracket);
        }
        let attacker = first.signer.as_str();

        // 3. Someone else traded inside the bracket
        let wrapped = detect_victims(window, attacker, 1);
        if wrapped.victim_count == 0 {
            return Err(Rejection::NoVictims);
        }

        // 4. Front leg and back leg at least
        let attacker_trade_count = window.iter().filter(|ev| ev.signer == attacker).count();
        if attacker_trade_count < self.config.min_attacker_trades {
            return Err(Rejection::AttackerTooQuiet);
        }

        // 5. Near-uniform participants look like aggregator fan-out
        let victim_ratio = wrapped.victim_count as f64 / window.len() as f64;
        if victim_ratio > self.config.max_victim_ratio {
            return Err(Rejection::VictimRatioTooHigh);
        }

        // 6. Attacker round-trips the same pair, when tokens are known
        let reversal_validated = match (first.direction(), last.direction()) {
            (Some((in_a, out_a)), Some((in_b, out_b))) => {
                let reversed = in_a == out_b && out_a == in_b;
                if !reversed && self.config.require_token_reversal {
                    return Err(Rejection::NoTokenReversal);
                }
                reversed
            }
            _ => false,
        };

        Ok(CandidateWindow {
            pool_id: first.pool_id.as_str(),
            window_seconds,
            start_index: start,
            events: window,
            attacker,
            victims: wrapped.victims,
            attacker_trade_count,
            victim_ratio,
            reversal_validated,
        })
    }
}
