//! Component matcher for modmerge.
//!
//! Turns two unordered component lists plus an injected [`MatchScorer`]
//! into a deterministic one-to-one pairing.
//!
//! [`MatchScorer`]: modmerge_types::MatchScorer

pub mod matcher;

pub use matcher::{match_components, GreedyMatcher, MatchOutcome, MatchedIndices, PairingStrategy};
