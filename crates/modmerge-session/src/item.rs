//! Conflict items and matched pairs.

use std::fmt;

use serde::{Deserialize, Serialize};

use modmerge_types::{Component, Side};

/// Stable handle of a [`ConflictItem`] within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub(crate) usize);

impl ItemId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable handle of a [`MatchedPair`]. Never reused after unlink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId(pub(crate) u64);

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pair-{}", self.0)
    }
}

/// Lifecycle of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Incoming item without a partner.
    New,
    /// Existing item without a partner.
    ExistingOnly,
    /// Paired, and both sides carry identical mergeable content.
    Matched,
    /// Paired, and the sides differ in at least one mergeable field.
    Updated,
}

impl ItemStatus {
    /// Returns `true` for the two paired states.
    pub fn is_paired(self) -> bool {
        matches!(self, Self::Matched | Self::Updated)
    }

    /// Status of an unpaired item on `side`.
    pub fn unpaired(side: Side) -> Self {
        match side {
            Side::Existing => Self::ExistingOnly,
            Side::Incoming => Self::New,
        }
    }
}

/// One input component plus its session state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictItem {
    pub id: ItemId,
    pub side: Side,
    /// Index in the original list of `side`.
    pub position: usize,
    pub status: ItemStatus,
    pub is_selected: bool,
    pub has_guid_conflict: bool,
    /// Tooltip text while a GUID conflict awaits manual resolution.
    pub conflict_reason: Option<String>,
    pub component: Component,
}

impl ConflictItem {
    pub(crate) fn new(id: ItemId, side: Side, position: usize, component: Component) -> Self {
        Self {
            id,
            side,
            position,
            status: ItemStatus::unpaired(side),
            is_selected: true,
            has_guid_conflict: false,
            conflict_reason: None,
            component,
        }
    }

    pub(crate) fn clear_conflict(&mut self) {
        self.has_guid_conflict = false;
        self.conflict_reason = None;
    }

    pub(crate) fn flag_conflict(&mut self, reason: &str) {
        self.has_guid_conflict = true;
        self.conflict_reason = Some(reason.to_string());
    }
}

/// A one-to-one association between an existing and an incoming item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub id: PairId,
    pub existing: ItemId,
    pub incoming: ItemId,
}

impl MatchedPair {
    /// The item on `side`.
    pub fn item(&self, side: Side) -> ItemId {
        match side {
            Side::Existing => self.existing,
            Side::Incoming => self.incoming,
        }
    }

    /// The partner of `item`, if `item` belongs to this pair.
    pub fn partner(&self, item: ItemId) -> Option<ItemId> {
        if item == self.existing {
            Some(self.incoming)
        } else if item == self.incoming {
            Some(self.existing)
        } else {
            None
        }
    }
}
