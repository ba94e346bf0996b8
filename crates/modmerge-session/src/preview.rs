//! Catalog assembly and materialization.
//!
//! Assembly decides which entries the merged catalog contains and in what
//! order. Materialization turns those entries into components and then runs
//! the cross-reference rewrite over the whole result.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use modmerge_merge::{merge_components, FieldMergePreferences, RenameMap};
use modmerge_types::{Component, Side};

use crate::config::OrderMode;
use crate::item::{ConflictItem, ItemId, MatchedPair, PairId};
use crate::session::MergeSession;

/// How an entry came to be in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreviewLabel {
    /// Pair with both sides selected, emitted as an update.
    Updated,
    /// Pair with both sides selected, emitted as a duplicate.
    Match,
    /// Incoming item of a pair whose existing side is deselected.
    Incoming,
    /// Unpaired incoming item.
    New,
    /// Existing item slotted into an incoming-first catalog.
    Existing,
    /// Existing item emitted alone in an existing-first catalog.
    Kept,
}

impl PreviewLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "Updated",
            Self::Match => "Match",
            Self::Incoming => "Incoming",
            Self::New => "New",
            Self::Existing => "Existing",
            Self::Kept => "Kept",
        }
    }
}

impl fmt::Display for PreviewLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an entry materializes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntrySource {
    /// Both sides of a pair, merged.
    Pair(PairId),
    /// A single item, passed through.
    Item(ItemId),
}

/// One row of the assembled catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewEntry {
    /// 1-based position in the catalog.
    pub position: usize,
    pub label: PreviewLabel,
    pub source: EntrySource,
    pub name: String,
}

struct Slot {
    label: PreviewLabel,
    source: EntrySource,
    name: String,
    /// Original existing position this entry stands for, if any.
    anchor: Option<usize>,
}

impl MergeSession {
    /// Assemble the catalog for the current selections and order mode.
    ///
    /// A pair yields at most one entry. When only one side of a pair is
    /// selected, that side is emitted alone.
    pub fn preview(&self) -> Vec<PreviewEntry> {
        let slots = match self.config().order_mode {
            OrderMode::IncomingFirst => self.assemble_incoming_first(),
            OrderMode::ExistingFirst => self.assemble_existing_first(),
        };
        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| PreviewEntry {
                position: idx + 1,
                label: slot.label,
                source: slot.source,
                name: slot.name,
            })
            .collect()
    }

    fn assemble_incoming_first(&self) -> Vec<Slot> {
        let skip_duplicates = self.config().skip_duplicates;
        let mut slots = Vec::new();

        for item in self.side_items(Side::Incoming).filter(|i| i.is_selected) {
            let slot = match self.partner_state(item.id) {
                Some((pair, partner, true)) => {
                    let existing = self.item_ref(partner);
                    let (e, i) = self.pair_components(pair);
                    Slot {
                        label: if skip_duplicates {
                            PreviewLabel::Match
                        } else {
                            PreviewLabel::Updated
                        },
                        source: EntrySource::Pair(pair.id),
                        name: merged_name(e, i, self.preferences(pair.id)),
                        anchor: Some(existing.position),
                    }
                }
                Some((_, _, false)) => Slot {
                    label: PreviewLabel::Incoming,
                    source: EntrySource::Item(item.id),
                    name: item.component.display_name().to_string(),
                    anchor: None,
                },
                None => Slot {
                    label: PreviewLabel::New,
                    source: EntrySource::Item(item.id),
                    name: item.component.display_name().to_string(),
                    anchor: None,
                },
            };
            slots.push(slot);
        }

        // Existing items not already covered by a merged pair.
        for item in self.side_items(Side::Existing).filter(|i| i.is_selected) {
            if matches!(self.partner_state(item.id), Some((_, _, true))) {
                continue;
            }
            let slot = Slot {
                label: PreviewLabel::Existing,
                source: EntrySource::Item(item.id),
                name: item.component.display_name().to_string(),
                anchor: Some(item.position),
            };
            let at = slots
                .iter()
                .position(|s| s.anchor.is_some_and(|a| a > item.position))
                .unwrap_or(slots.len());
            slots.insert(at, slot);
        }
        slots
    }

    fn assemble_existing_first(&self) -> Vec<Slot> {
        let mut slots = Vec::new();

        for item in self.side_items(Side::Existing).filter(|i| i.is_selected) {
            let slot = match self.partner_state(item.id) {
                Some((pair, _, true)) => {
                    let (e, i) = self.pair_components(pair);
                    Slot {
                        label: PreviewLabel::Match,
                        source: EntrySource::Pair(pair.id),
                        name: merged_name(e, i, self.preferences(pair.id)),
                        anchor: Some(item.position),
                    }
                }
                _ => Slot {
                    label: PreviewLabel::Kept,
                    source: EntrySource::Item(item.id),
                    name: item.component.display_name().to_string(),
                    anchor: Some(item.position),
                },
            };
            slots.push(slot);
        }

        for item in self.side_items(Side::Incoming).filter(|i| i.is_selected) {
            let label = match self.partner_state(item.id) {
                Some((_, _, true)) => continue,
                Some((_, _, false)) => PreviewLabel::Incoming,
                None => PreviewLabel::New,
            };
            slots.push(Slot {
                label,
                source: EntrySource::Item(item.id),
                name: item.component.display_name().to_string(),
                anchor: None,
            });
        }
        slots
    }

    /// The item's pair, its partner, and whether the partner is selected.
    fn partner_state(&self, item: ItemId) -> Option<(&MatchedPair, ItemId, bool)> {
        let pair = self.pair_of(item)?;
        let partner = pair.partner(item)?;
        Some((pair, partner, self.item_ref(partner).is_selected))
    }

    fn item_ref(&self, id: ItemId) -> &ConflictItem {
        &self.items()[id.index()]
    }

    /// Materialize the current preview into a reference-consistent catalog.
    ///
    /// Every pair is merged first; the rename map built from all GUID
    /// resolutions is then applied to every component in the result.
    pub fn merged_components(&self) -> Vec<Component> {
        let mut catalog: Vec<Component> = self
            .preview()
            .iter()
            .filter_map(|entry| self.materialize(entry.source))
            .collect();

        let renames = RenameMap::from_resolutions(self.resolutions());
        let rewritten = renames.rewrite(&mut catalog);
        debug!(
            components = catalog.len(),
            renames = renames.len(),
            rewritten,
            "materialized merged catalog"
        );
        catalog
    }

    fn materialize(&self, source: EntrySource) -> Option<Component> {
        match source {
            EntrySource::Pair(pid) => {
                let pair = self.pair(pid)?;
                let (e, i) = self.pair_components(pair);
                let merged = match self.preferences(pid) {
                    Some(prefs) => merge_components(e, i, prefs, self.resolution(pid)),
                    None => {
                        let prefs = FieldMergePreferences::defaults_for(e, i);
                        merge_components(e, i, &prefs, self.resolution(pid))
                    }
                };
                Some(merged)
            }
            EntrySource::Item(id) => {
                let item = self.item(id)?;
                let mut component = item.component.clone();
                if let Some(resolution) = self
                    .pair_of(id)
                    .and_then(|pair| self.resolution(pair.id))
                {
                    component.guid = resolution.chosen_guid.clone();
                }
                Some(component)
            }
        }
    }
}

fn merged_name(e: &Component, i: &Component, prefs: Option<&FieldMergePreferences>) -> String {
    let merged = match prefs {
        Some(prefs) => merge_components(e, i, prefs, None),
        None => merge_components(e, i, &FieldMergePreferences::defaults_for(e, i), None),
    };
    merged.display_name().to_string()
}
