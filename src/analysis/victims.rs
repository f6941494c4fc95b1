//! Victim Detector
//!
//! Isolates the trades wrapped between an attacker's first and last trade
//! in a cluster and names the distinct signers behind them.
//!
//! Created: 2026-10-18

use crate::types::TradeEvent;
use std::borrow::Borrow;
use std::collections::BTreeSet;

/// Wrapped trades and victim identities for one attacker
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VictimAnalysis {
    /// Distinct non-attacker signers strictly inside the bracket, sorted
    pub victims: Vec<String>,
    pub victim_count: usize,
    /// Non-attacker trades strictly inside the bracket
    pub wrapped_trade_count: usize,
    /// `wrapped_trade_count / cluster_len`
    pub wrapped_ratio: f64,
    /// At least `min_victims` distinct victims were wrapped
    pub has_mandatory_victims: bool,
}

/// Find the victims wrapped by `attacker` inside `cluster`.
///
/// The bracket runs from the attacker's first occurrence to their last.
/// With fewer than two attacker trades there is no bracket and the result
/// is empty.
pub fn detect_victims<E: Borrow<TradeEvent>>(
    cluster: &[E],
    attacker: &str,
    min_victims: usize,
) -> VictimAnalysis {
    let signers: Vec<&str> = cluster
        .iter()
        .map(|ev| <E as Borrow<TradeEvent>>::borrow(ev).signer.as_str())
        .collect();

    let first = signers.iter().position(|&s| s == attacker);
    let last = signers.iter().rposition(|&s| s == attacker);
    let (first, last) = match (first, last) {
        (Some(first), Some(last)) if last > first => (first, last),
        _ => return VictimAnalysis::default(),
    };

    let mut victims = BTreeSet::new();
    let mut wrapped_trade_count = 0;
    for &signer in &signers[first + 1..last] {
        if signer != attacker {
            wrapped_trade_count += 1;
            victims.insert(signer);
        }
    }

    let victim_count = victims.len();
    VictimAnalysis {
        victims: victims.into_iter().map(str::to_string).collect(),
        victim_count,
        wrapped_trade_count,
        wrapped_ratio: wrapped_trade_count as f64 / cluster.len() as f64,
        has_mandatory_victims: victim_count >= min_victims,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(signers: &[&str]) -> Vec<TradeEvent> {
        signers
            .iter()
            .enumerate()
            .map(|(i, s)| TradeEvent::new(s, i as u64 * 10, "P"))
            .collect()
    }

    #[test]
    fn test_two_victims_wrapped() {
        let cluster = events(&["A", "B", "C", "B", "C", "A"]);
        let result = detect_victims(&cluster, "A", 2);
        assert_eq!(result.victims, vec!["B", "C"]);
        assert_eq!(result.victim_count, 2);
        assert_eq!(result.wrapped_trade_count, 4);
        assert!((result.wrapped_ratio - 4.0 / 6.0).abs() < 1e-9);
        assert!(result.has_mandatory_victims);
    }

    #[test]
    fn test_single_victim_is_not_mandatory() {
        let cluster = events(&["A", "B", "A"]);
        let result = detect_victims(&cluster, "A", 2);
        assert_eq!(result.victim_count, 1);
        assert!(!result.has_mandatory_victims);
    }

    #[test]
    fn test_trades_outside_bracket_ignored() {
        let cluster = events(&["X", "A", "B", "A", "A", "Y"]);
        let result = detect_victims(&cluster, "A", 2);
        assert_eq!(result.victims, vec!["B"]);
        // Attacker's middle leg is not a wrapped trade
        assert_eq!(result.wrapped_trade_count, 1);
    }

    #[test]
    fn test_no_bracket_without_two_attacker_trades() {
        let cluster = events(&["B", "A", "C"]);
        assert_eq!(detect_victims(&cluster, "A", 2), VictimAnalysis::default());
        assert_eq!(detect_victims(&cluster, "Z", 2), VictimAnalysis::default());
    }
}
