//! Token-Path Builder and Cycle Detector
//!
//! Rebuilds one actor's chronological chain of token conversions inside a
//! cluster and decides whether it closes into a loop. A closed loop (back to
//! the start token, or into a settlement asset) is the arbitrage signature;
//! an open path is a directional trade.
//!
//! Created: 2026-10-18

use crate::types::TradeEvent;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};

/// Cycle confidence contributions
const CLOSED_LOOP_POINTS: f64 = 0.3;
const MULTI_HOP_POINTS: f64 = 0.2;
const FLAT_EXPOSURE_POINTS: f64 = 0.2;
const DISTINCT_HOPS_POINTS: f64 = 0.2;

/// Trades needed before a path counts as deliberate multi-hop routing
const MULTI_HOP_MIN_TRADES: usize = 3;

/// An actor's ordered token sequence: the first trade's input token, then
/// each trade's output token in time order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenPath {
    pub tokens: Vec<String>,
    /// Trades that contributed a hop
    pub trade_count: usize,
}

impl TokenPath {
    pub fn start(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn end(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Result of cycle detection for one actor
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleAnalysis {
    pub path: TokenPath,
    pub is_cycle: bool,
    /// In [0, 1]
    pub cycle_confidence: f64,
    /// Tokens whose net unit balance is non-zero
    pub open_positions: usize,
}

/// Collect the actor's trades that carry both token fields, in time order.
fn actor_trades<'a, E: Borrow<TradeEvent>>(cluster: &'a [E], actor: &str) -> Vec<&'a TradeEvent> {
    let mut trades: Vec<&TradeEvent> = cluster
        .iter()
        .map(<E as Borrow<TradeEvent>>::borrow)
        .filter(|ev| ev.signer == actor && ev.direction().is_some())
        .collect();
    // Stable: equal timestamps keep cluster order
    trades.sort_by_key(|ev| ev.timestamp_ms);
    trades
}

/// Build the actor's token path. Trades without token fields are skipped.
pub fn build_token_path<E: Borrow<TradeEvent>>(cluster: &[E], actor: &str) -> TokenPath {
    let trades = actor_trades(cluster, actor);
    let mut tokens = Vec::with_capacity(trades.len() + 1);

    for (i, (from, to)) in trades.iter().filter_map(|ev| ev.direction()).enumerate() {
        if i == 0 {
            tokens.push(from.to_string());
        }
        tokens.push(to.to_string());
    }

    TokenPath {
        tokens,
        trade_count: trades.len(),
    }
}

/// Count tokens left with non-zero net exposure, treating every trade as
/// -1 unit of `from_token` and +1 unit of `to_token`.
fn open_positions(trades: &[&TradeEvent]) -> usize {
    let mut balances: BTreeMap<&str, i64> = BTreeMap::new();
    for (from, to) in trades.iter().filter_map(|ev| ev.direction()) {
        *balances.entry(from).or_insert(0) -= 1;
        *balances.entry(to).or_insert(0) += 1;
    }
    balances.values().filter(|&&net| net != 0).count()
}

/// Decide whether the actor's path closes into a cycle.
///
/// `is_base_token` recognises settlement assets; a path ending in one of
/// them counts as closed even if it started elsewhere.
pub fn detect_cycle<E, F>(cluster: &[E], actor: &str, is_base_token: F) -> CycleAnalysis
where
    E: Borrow<TradeEvent>,
    F: Fn(&str) -> bool,
{
    let trades = actor_trades(cluster, actor);
    if trades.len() < 2 {
        return CycleAnalysis {
            path: build_token_path(cluster, actor),
            ..CycleAnalysis::default()
        };
    }

    let path = build_token_path(cluster, actor);
    let (start, end) = match (path.start(), path.end()) {
        (Some(start), Some(end)) => (start, end),
        _ => return CycleAnalysis::default(),
    };

    let is_cycle = end == start || is_base_token(end);
    let open = open_positions(&trades);

    let mut confidence = 0.0;
    if is_cycle {
        confidence += CLOSED_LOOP_POINTS;
    }
    if trades.len() >= MULTI_HOP_MIN_TRADES {
        confidence += MULTI_HOP_POINTS;
    }
    if open <= 1 {
        confidence += FLAT_EXPOSURE_POINTS;
    }

    // Every token except the final one must be visited once
    let hops = &path.tokens[..path.tokens.len() - 1];
    let mut seen = HashSet::with_capacity(hops.len());
    if hops.iter().all(|token| seen.insert(token.as_str())) {
        confidence += DISTINCT_HOPS_POINTS;
    }

    CycleAnalysis {
        is_cycle,
        cycle_confidence: f64::min(confidence, 1.0),
        open_positions: open,
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(signer: &str, ts: u64, from: &str, to: &str) -> TradeEvent {
        TradeEvent::new(signer, ts, "P").with_tokens(from, to)
    }

    fn is_base(token: &str) -> bool {
        token == "SOL" || token == "USDC"
    }

    #[test]
    fn test_three_hop_loop_is_cycle() {
        let cluster = vec![
            trade("A", 0, "SOL", "TOKA"),
            trade("B", 5, "SOL", "TOKA"),
            trade("A", 10, "TOKA", "TOKB"),
            trade("A", 20, "TOKB", "SOL"),
        ];
        let result = detect_cycle(&cluster, "A", is_base);
        assert!(result.is_cycle);
        assert!(result.cycle_confidence >= 0.7);
        assert!((result.cycle_confidence - 0.9).abs() < 1e-9);
        assert_eq!(result.path.tokens, vec!["SOL", "TOKA", "TOKB", "SOL"]);
        assert_eq!(result.open_positions, 0);
    }

    #[test]
    fn test_single_trade_is_not_cycle() {
        let cluster = vec![trade("A", 0, "SOL", "X"), trade("B", 1, "X", "SOL")];
        let result = detect_cycle(&cluster, "A", is_base);
        assert!(!result.is_cycle);
        assert_eq!(result.cycle_confidence, 0.0);
    }

    #[test]
    fn test_ending_in_base_token_closes_cycle() {
        let cluster = vec![trade("A", 0, "BONK", "X"), trade("A", 1, "X", "USDC")];
        let result = detect_cycle(&cluster, "A", is_base);
        assert!(result.is_cycle);
        // BONK and USDC stay open, so no flat-exposure bonus
        assert_eq!(result.open_positions, 2);
        assert!((result.cycle_confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_open_directional_path() {
        let cluster = vec![
            trade("A", 0, "BONK", "X"),
            trade("A", 1, "X", "Y"),
            trade("A", 2, "Y", "Z"),
        ];
        let result = detect_cycle(&cluster, "A", is_base);
        assert!(!result.is_cycle);
        // multi-hop + distinct hops, exposure is open on BONK and Z
        assert!((result.cycle_confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_intermediate_token_loses_bonus() {
        let cluster = vec![
            trade("A", 0, "SOL", "X"),
            trade("A", 1, "X", "SOL"),
            trade("A", 2, "SOL", "X"),
            trade("A", 3, "X", "SOL"),
        ];
        let result = detect_cycle(&cluster, "A", is_base);
        assert!(result.is_cycle);
        // 0.3 closed + 0.2 multi-hop + 0.2 flat, SOL repeats among hops
        assert!((result.cycle_confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_path_uses_time_order_and_skips_tokenless_trades() {
        let cluster = vec![
            trade("A", 30, "Y", "SOL"),
            TradeEvent::new("A", 15, "P"),
            trade("A", 10, "SOL", "Y"),
        ];
        let path = build_token_path(&cluster, "A");
        assert_eq!(path.tokens, vec!["SOL", "Y", "SOL"]);
        assert_eq!(path.trade_count, 2);
    }

    #[test]
    fn test_works_over_borrowed_cluster() {
        let owned = vec![trade("A", 0, "SOL", "X"), trade("A", 1, "X", "SOL")];
        let borrowed: Vec<&TradeEvent> = owned.iter().collect();
        let result = detect_cycle(&borrowed, "A", is_base);
        assert!(result.is_cycle);
        assert!((result.cycle_confidence - 0.7).abs() < 1e-9);
    }
}
