//! booru-sidebar-kit - helper layer for a booru image sidebar
//!
//! - `similarity`: edit distance, partial ratio and composite fuzzy scores
//! - `ranking`: rank tag/title candidates against a query
//! - `booru`: normalize per-API-family responses into one post/tag shape
//! - `snapshot`: plain snapshots of, and patches onto, JSON object trees
//! - `strings`, `shell`, `file_url`: formatting and escaping helpers

pub mod booru;
pub mod config;
pub mod error;
pub mod file_url;
pub mod ranking;
pub mod shell;
pub mod similarity;
pub mod snapshot;
pub mod strings;


pub use error::KitError;
pub use ranking::{best_match, rank_candidates, Confidence, RankOptions, RankedMatch, Scorer};
pub use similarity::{
    compute_score, compute_text_match_score, levenshtein_distance, partial_ratio,
};
