//! Interactive merge sessions for modmerge.
//!
//! A [`MergeSession`] wraps two component catalogs, pairs them with a
//! matcher, and holds the state a user edits: selections, manual links,
//! per-field preferences, and GUID choices. Everything shown to the user
//! (preview, merged catalog, impact counters, diffs) is derived from that
//! state on demand through [`MergeSession::recompute`].
//!
//! # Key Types
//!
//! - [`MergeSession`] -- Session state and its mutating operations
//! - [`ConflictItem`] / [`MatchedPair`] -- Items and the 1:1 pairs between them
//! - [`PreviewEntry`] -- One row of the assembled catalog
//! - [`Derived`] -- Result of a full recompute
//! - [`SessionConfig`] -- Order mode, duplicate handling, diff algorithm

pub mod config;
pub mod derived;
pub mod error;
pub mod impact;
pub mod item;
pub mod preview;
pub mod session;

pub use config::{OrderMode, SessionConfig};
pub use derived::Derived;
pub use error::{ConfigError, SessionError, SessionResult};
pub use impact::ChangeImpact;
pub use item::{ConflictItem, ItemId, ItemStatus, MatchedPair, PairId};
pub use preview::{EntrySource, PreviewEntry, PreviewLabel};
pub use session::{LinkOutcome, MergeSession};

// Re-export key types
pub use modmerge_diff::{DiffMode, DiffType, LineDiff};
pub use modmerge_merge::{
    FieldPreference, GuidConflictResolver, GuidResolution, IdentityGuidResolver,
};
pub use modmerge_types::{Component, ComponentSerializer, Guid, MatchScorer, MergeField, Side};
