use serde::{Deserialize, Serialize};

use crate::session::MergeSession;

/// Change-impact counters for the current selections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeImpact {
    /// Selected incoming items without a partner.
    pub new: usize,
    /// Pairs whose incoming side is selected.
    pub updated: usize,
    /// Existing items carried over unchanged.
    pub kept: usize,
    /// Existing items that will not appear in the catalog.
    pub removed: usize,
}

impl ChangeImpact {
    pub fn total_changes(&self) -> usize {
        self.new + self.updated + self.removed
    }
}

impl MergeSession {
    pub fn impact(&self) -> ChangeImpact {
        let mut impact = ChangeImpact::default();

        for pair in self.pairs() {
            let existing = self.items()[pair.existing.index()].is_selected;
            let incoming = self.items()[pair.incoming.index()].is_selected;
            match (existing, incoming) {
                (_, true) => impact.updated += 1,
                (true, false) => impact.kept += 1,
                (false, false) => impact.removed += 1,
            }
        }
        for item in self.existing_only() {
            if item.is_selected {
                impact.kept += 1;
            } else {
                impact.removed += 1;
            }
        }
        impact.new = self
            .incoming_only()
            .into_iter()
            .filter(|item| item.is_selected)
            .count();

        impact
    }
}
