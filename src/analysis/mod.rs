//! Cluster analyzers
//!
//! Pure functions over a slice of trade events: token paths and cycles,
//! wrapped victims, pool diversity, and the time/slot-bounded cluster index
//! they run on.
//!
//! Created: 2026-10-18

pub mod cluster;
pub mod pool_diversity;
pub mod token_path;
pub mod victims;

pub use cluster::{ClusterBounds, EventIndex};
pub use pool_diversity::{analyze_pool_diversity, PoolDiversity};
pub use token_path::{build_token_path, detect_cycle, CycleAnalysis, TokenPath};
pub use victims::{detect_victims, VictimAnalysis};
