//! Merge engine for modmerge.
//!
//! Decides field by field which side of a matched pair wins, which GUID
//! survives an identity collision, and rewrites cross-references so a
//! merged catalog never points at a rejected identity.
//!
//! # Key Types
//!
//! - [`FieldMergePreferences`] / [`FieldPreference`] -- Per-pair field policy
//! - [`GuidResolution`] / [`GuidConflictResolver`] -- Identity collision verdicts
//! - [`RenameMap`] -- Rejected-to-chosen GUID map and reference rewrite
//! - [`merge_components`] -- Materialize one matched pair

pub mod component_merge;
pub mod guid;
pub mod policy;

pub use component_merge::{merge_components, merge_lists};
pub use guid::{GuidConflictResolver, GuidResolution, IdentityGuidResolver, RenameMap};
pub use policy::{FieldMergePreferences, FieldPreference};
