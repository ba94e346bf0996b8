//! Foundation types for modmerge.
//!
//! This crate provides the component record, identity, and field catalogue
//! used throughout the catalog merge engine. Every other modmerge crate
//! depends on `modmerge-types`.
//!
//! # Key Types
//!
//! - [`Component`] -- A mod descriptor with metadata, instructions, and cross-references
//! - [`Guid`] -- Opaque, normalized component identity
//! - [`MergeField`] / [`FieldKind`] -- Fields a merge preference can decide, and how they combine
//! - [`Side`] -- Existing or incoming input list
//! - [`MatchScorer`] / [`ComponentSerializer`] -- Collaborator seams

pub mod component;
pub mod error;
pub mod field;
pub mod guid;
pub mod traits;

pub use component::{Component, ComponentOption, InstallState, Instruction};
pub use error::TypeError;
pub use field::{FieldKind, MergeField, Side};
pub use guid::Guid;
pub use traits::{ComponentSerializer, FnScorer, MatchScorer, SerializeError};
