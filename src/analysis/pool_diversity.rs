//! Pool-Diversity Analyzer
//!
//! Counts the distinct pools and unordered token pairs an actor touched in a
//! cluster. A sandwich hammers one pool on one pair; routing fans out.
//!
//! Created: 2026-10-18

use crate::types::{TokenPair, TradeEvent};
use std::borrow::Borrow;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolDiversity {
    pub unique_pools: usize,
    pub unique_token_pairs: usize,
    /// Exactly one token pair across all of the actor's trades
    pub is_same_pair_throughout: bool,
}

pub fn analyze_pool_diversity<E: Borrow<TradeEvent>>(cluster: &[E], actor: &str) -> PoolDiversity {
    let mut pools: BTreeSet<&str> = BTreeSet::new();
    let mut pairs: BTreeSet<TokenPair> = BTreeSet::new();

    for ev in cluster.iter().map(<E as Borrow<TradeEvent>>::borrow) {
        if ev.signer != actor {
            continue;
        }
        pools.insert(ev.pool_id.as_str());
        if let Some(pair) = ev.token_pair() {
            pairs.insert(pair);
        }
    }

    PoolDiversity {
        unique_pools: pools.len(),
        unique_token_pairs: pairs.len(),
        is_same_pair_throughout: pairs.len() == 1,
    }
}
