//! The merge session: conflict items, pairs, and the user-editable state
//! around them.
//!
//! # Invariants
//!
//! - Every item is in exactly one pool: paired, existing-only, or
//!   incoming-only.
//! - No item appears in more than one [`MatchedPair`].
//! - Every pair has exactly one [`FieldMergePreferences`]; a
//!   [`GuidResolution`] exists only when the resolver reported a conflict.
//! - A GUID kept by one pair and rejected by another is never renamed; both
//!   pairs are flagged for a manual choice when the collision appears.
//!
//! Mutating operations never fail. An operation whose precondition does not
//! hold (linking an already-paired item, unlinking an unknown pair) is a
//! no-op reported through its return value.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, warn};

use modmerge_match::{GreedyMatcher, PairingStrategy};
use modmerge_merge::{
    FieldMergePreferences, FieldPreference, GuidConflictResolver, GuidResolution, RenameMap,
};
use modmerge_types::{Component, MatchScorer, MergeField, Side};

use crate::config::{OrderMode, SessionConfig};
use crate::item::{ConflictItem, ItemId, ItemStatus, MatchedPair, PairId};

/// Result of a manual link request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked(PairId),
    /// One of the items is already in a pair.
    AlreadyPaired,
    /// Both items come from the same side.
    SameSide,
    UnknownItem,
}

impl LinkOutcome {
    pub fn is_linked(self) -> bool {
        matches!(self, Self::Linked(_))
    }
}

/// State of an interactive catalog merge.
pub struct MergeSession {
    items: Vec<ConflictItem>,
    existing_order: Vec<ItemId>,
    incoming_order: Vec<ItemId>,
    pairs: BTreeMap<PairId, MatchedPair>,
    pair_by_item: HashMap<ItemId, PairId>,
    preferences: BTreeMap<PairId, FieldMergePreferences>,
    resolutions: BTreeMap<PairId, GuidResolution>,
    /// Pairs whose resolution takes part in a GUID collision.
    collided: BTreeSet<PairId>,
    next_pair: u64,
    resolver: Box<dyn GuidConflictResolver>,
    config: SessionConfig,
}

impl MergeSession {
    /// Start a session, pairing the lists with [`GreedyMatcher`].
    pub fn new(
        existing: Vec<Component>,
        incoming: Vec<Component>,
        scorer: &dyn MatchScorer,
        resolver: impl GuidConflictResolver + 'static,
        config: SessionConfig,
    ) -> Self {
        Self::with_strategy(existing, incoming, &GreedyMatcher, scorer, resolver, config)
    }

    /// Start a session with a custom pairing strategy.
    pub fn with_strategy(
        existing: Vec<Component>,
        incoming: Vec<Component>,
        strategy: &dyn PairingStrategy,
        scorer: &dyn MatchScorer,
        resolver: impl GuidConflictResolver + 'static,
        config: SessionConfig,
    ) -> Self {
        let outcome = strategy.pair(&existing, &incoming, scorer);
        let existing_count = existing.len();

        let mut items = Vec::with_capacity(existing.len() + incoming.len());
        for (pos, component) in existing.into_iter().enumerate() {
            items.push(ConflictItem::new(ItemId(pos), Side::Existing, pos, component));
        }
        for (pos, component) in incoming.into_iter().enumerate() {
            let id = ItemId(existing_count + pos);
            items.push(ConflictItem::new(id, Side::Incoming, pos, component));
        }

        let existing_order = (0..existing_count).map(ItemId).collect();
        let incoming_order = (existing_count..items.len()).map(ItemId).collect();

        let mut session = Self {
            items,
            existing_order,
            incoming_order,
            pairs: BTreeMap::new(),
            pair_by_item: HashMap::new(),
            preferences: BTreeMap::new(),
            resolutions: BTreeMap::new(),
            collided: BTreeSet::new(),
            next_pair: 0,
            resolver: Box::new(resolver),
            config,
        };

        let incoming_count = session.incoming_order.len();
        for matched in &outcome.pairs {
            if matched.existing >= existing_count || matched.incoming >= incoming_count {
                warn!(
                    existing = matched.existing,
                    incoming = matched.incoming,
                    "pairing strategy returned an index out of range; skipped"
                );
                continue;
            }
            let existing = ItemId(matched.existing);
            let incoming = ItemId(existing_count + matched.incoming);
            if session.pair_by_item.contains_key(&existing)
                || session.pair_by_item.contains_key(&incoming)
            {
                warn!(
                    existing = matched.existing,
                    incoming = matched.incoming,
                    "pairing strategy reused an item; skipped"
                );
                continue;
            }
            session.create_pair(existing, incoming);
        }
        session.sync_guid_collisions();

        info!(
            existing = session.existing_order.len(),
            incoming = session.incoming_order.len(),
            pairs = session.pairs.len(),
            "merge session started"
        );
        session
    }

    // ---- Accessors ----

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn item(&self, id: ItemId) -> Option<&ConflictItem> {
        self.items.get(id.0)
    }

    /// All items, existing side first, each side in original order.
    pub fn items(&self) -> &[ConflictItem] {
        &self.items
    }

    /// Items of `side` in original order.
    pub fn side_items(&self, side: Side) -> impl Iterator<Item = &ConflictItem> + '_ {
        self.order(side).iter().map(move |id| &self.items[id.0])
    }

    pub(crate) fn order(&self, side: Side) -> &[ItemId] {
        match side {
            Side::Existing => &self.existing_order,
            Side::Incoming => &self.incoming_order,
        }
    }

    /// Unpaired existing items in original order.
    pub fn existing_only(&self) -> Vec<&ConflictItem> {
        self.unpaired(Side::Existing)
    }

    /// Unpaired incoming items in original order.
    pub fn incoming_only(&self) -> Vec<&ConflictItem> {
        self.unpaired(Side::Incoming)
    }

    fn unpaired(&self, side: Side) -> Vec<&ConflictItem> {
        self.side_items(side)
            .filter(|item| !self.pair_by_item.contains_key(&item.id))
            .collect()
    }

    /// Pairs ordered by the existing item's original position.
    pub fn pairs(&self) -> Vec<&MatchedPair> {
        let mut pairs: Vec<&MatchedPair> = self.pairs.values().collect();
        pairs.sort_by_key(|p| self.items[p.existing.0].position);
        pairs
    }

    pub fn pair(&self, id: PairId) -> Option<&MatchedPair> {
        self.pairs.get(&id)
    }

    /// The pair containing `item`, if any.
    pub fn pair_of(&self, item: ItemId) -> Option<&MatchedPair> {
        self.pair_by_item
            .get(&item)
            .and_then(|pid| self.pairs.get(pid))
    }

    /// The paired components `(existing, incoming)`.
    pub(crate) fn pair_components(&self, pair: &MatchedPair) -> (&Component, &Component) {
        (
            &self.items[pair.existing.0].component,
            &self.items[pair.incoming.0].component,
        )
    }

    // ---- Link / unlink ----

    /// Pair two currently unpaired items from opposite sides.
    ///
    /// Argument order does not matter. The new pair gets data-driven
    /// default preferences and a fresh verdict from the GUID resolver.
    pub fn link(&mut self, a: ItemId, b: ItemId) -> LinkOutcome {
        let (Some(item_a), Some(item_b)) = (self.items.get(a.0), self.items.get(b.0)) else {
            return LinkOutcome::UnknownItem;
        };
        if item_a.side == item_b.side {
            return LinkOutcome::SameSide;
        }
        if self.pair_by_item.contains_key(&a) || self.pair_by_item.contains_key(&b) {
            debug!(%a, %b, "cannot link: item already paired");
            return LinkOutcome::AlreadyPaired;
        }
        let (existing, incoming) = if item_a.side == Side::Existing {
            (a, b)
        } else {
            (b, a)
        };
        let pair = self.create_pair(existing, incoming);
        self.sync_guid_collisions();
        info!(%pair, %existing, %incoming, "linked items");
        LinkOutcome::Linked(pair)
    }

    /// Dissolve a pair, returning both items to their unpaired pools.
    ///
    /// Both items end up selected. The pair's preferences and GUID
    /// resolution are discarded. Returns `false` for an unknown pair.
    pub fn unlink(&mut self, pair_id: PairId) -> bool {
        let Some(pair) = self.pairs.remove(&pair_id) else {
            return false;
        };
        self.pair_by_item.remove(&pair.existing);
        self.pair_by_item.remove(&pair.incoming);
        self.preferences.remove(&pair_id);
        self.resolutions.remove(&pair_id);
        self.sync_guid_collisions();

        for id in [pair.existing, pair.incoming] {
            let item = &mut self.items[id.0];
            item.status = ItemStatus::unpaired(item.side);
            item.is_selected = true;
            item.clear_conflict();
        }
        info!(pair = %pair_id, "unlinked pair");
        true
    }

    /// Unlink whatever pair `item` belongs to.
    pub fn unlink_item(&mut self, item: ItemId) -> bool {
        match self.pair_by_item.get(&item).copied() {
            Some(pid) => self.unlink(pid),
            None => false,
        }
    }

    fn create_pair(&mut self, existing: ItemId, incoming: ItemId) -> PairId {
        let id = PairId(self.next_pair);
        self.next_pair += 1;

        let pair = MatchedPair {
            id,
            existing,
            incoming,
        };
        self.pairs.insert(id, pair);
        self.pair_by_item.insert(existing, id);
        self.pair_by_item.insert(incoming, id);

        let (e, i) = self.pair_components(&pair);
        let status = if e.differing_fields(i).is_empty() {
            ItemStatus::Matched
        } else {
            ItemStatus::Updated
        };
        let resolution = self.resolver.resolve(e, i);

        for item_id in [existing, incoming] {
            self.items[item_id.0].status = status;
        }

        if let Some(resolution) = resolution {
            if resolution.requires_manual_resolution {
                for item_id in [existing, incoming] {
                    self.items[item_id.0].flag_conflict(&resolution.reason);
                }
            }
            self.resolutions.insert(id, resolution);
        }

        self.get_or_create_preferences(id);
        id
    }

    // ---- Selection ----

    /// Returns `false` for an unknown item.
    pub fn set_selected(&mut self, item: ItemId, selected: bool) -> bool {
        match self.items.get_mut(item.0) {
            Some(item) => {
                item.is_selected = selected;
                true
            }
            None => false,
        }
    }

    /// Flip selection; returns the new state.
    pub fn toggle_selected(&mut self, item: ItemId) -> Option<bool> {
        let item = self.items.get_mut(item.0)?;
        item.is_selected = !item.is_selected;
        Some(item.is_selected)
    }

    /// Select or deselect every item of `side`.
    pub fn select_all(&mut self, side: Side, selected: bool) {
        for item in self.items.iter_mut().filter(|i| i.side == side) {
            item.is_selected = selected;
        }
    }

    // ---- Field preferences ----

    /// Preferences of a pair, creating defaults on first access.
    pub fn get_or_create_preferences(
        &mut self,
        pair: PairId,
    ) -> Option<&mut FieldMergePreferences> {
        let matched = *self.pairs.get(&pair)?;
        if !self.preferences.contains_key(&pair) {
            let (e, i) = self.pair_components(&matched);
            let defaults = FieldMergePreferences::defaults_for(e, i);
            self.preferences.insert(pair, defaults);
        }
        self.preferences.get_mut(&pair)
    }

    pub fn preferences(&self, pair: PairId) -> Option<&FieldMergePreferences> {
        self.preferences.get(&pair)
    }

    /// Override one field of one pair.
    ///
    /// Returns `false` for an unknown pair or a `Merge` request on a field
    /// that is not a reference list.
    pub fn set_preference(
        &mut self,
        pair: PairId,
        field: MergeField,
        pref: FieldPreference,
    ) -> bool {
        match self.get_or_create_preferences(pair) {
            Some(prefs) => prefs.set(field, pref),
            None => false,
        }
    }

    /// Re-derive every pair's preferences with incoming as the tiebreak.
    pub fn use_all_incoming_fields(&mut self) {
        self.rebias_all(Side::Incoming);
    }

    /// Re-derive every pair's preferences with existing as the tiebreak.
    ///
    /// A field the existing side leaves empty still takes incoming's value.
    pub fn use_all_existing_fields(&mut self) {
        self.rebias_all(Side::Existing);
    }

    fn rebias_all(&mut self, primary: Side) {
        let rebased: Vec<(PairId, FieldMergePreferences)> = self
            .pairs
            .values()
            .map(|pair| {
                let (e, i) = self.pair_components(pair);
                (pair.id, FieldMergePreferences::biased_toward(e, i, primary))
            })
            .collect();
        for (id, prefs) in rebased {
            self.preferences.insert(id, prefs);
        }
        debug!(%primary, pairs = self.pairs.len(), "re-derived all field preferences");
    }

    // ---- GUID reconciliation ----

    pub fn resolution(&self, pair: PairId) -> Option<&GuidResolution> {
        self.resolutions.get(&pair)
    }

    /// Make `item`'s GUID the survivor of its pair.
    ///
    /// Clears the manual-resolution flag and both items' conflict markers.
    /// Returns `false` if the item is unpaired, or if its pair has no
    /// GUID conflict to resolve.
    pub fn choose_guid(&mut self, item: ItemId) -> bool {
        let Some(pair) = self.pair_of(item).copied() else {
            return false;
        };
        let Some(partner) = pair.partner(item) else {
            return false;
        };
        let chosen = self.items[item.0].component.guid.clone();
        let rejected = self.items[partner.0].component.guid.clone();
        let Some(resolution) = self.resolutions.get_mut(&pair.id) else {
            return false;
        };
        resolution.choose(chosen, rejected);
        info!(
            pair = %pair.id,
            chosen = %resolution.chosen_guid.short_id(),
            rejected = %resolution.rejected_guid.short_id(),
            "GUID chosen"
        );
        for id in [pair.existing, pair.incoming] {
            self.items[id.0].clear_conflict();
        }
        self.sync_guid_collisions();
        true
    }

    /// Flag pairs that newly take part in a GUID collision.
    ///
    /// A pair already known to collide is not re-flagged, so an explicit
    /// [`choose_guid`](Self::choose_guid) settles it. A pair that stops
    /// colliding keeps its flag until a choice is made.
    fn sync_guid_collisions(&mut self) {
        let renames = RenameMap::from_resolutions(self.resolutions.values());
        let colliding: BTreeSet<PairId> = self
            .resolutions
            .iter()
            .filter(|(_, r)| renames.collides(r))
            .map(|(id, _)| *id)
            .collect();

        let fresh: Vec<PairId> = colliding.difference(&self.collided).copied().collect();
        for pair_id in fresh {
            let (Some(pair), Some(resolution)) =
                (self.pairs.get(&pair_id), self.resolutions.get_mut(&pair_id))
            else {
                continue;
            };
            let guid = if renames.collisions().contains(&resolution.rejected_guid) {
                resolution.rejected_guid.short_id().to_string()
            } else {
                resolution.chosen_guid.short_id().to_string()
            };
            warn!(pair = %pair_id, %guid, "GUID collision between pairs");
            resolution.requires_manual_resolution = true;
            resolution.reason = format!("GUID {guid} is kept by one pair and rejected by another");
            for id in [pair.existing, pair.incoming] {
                self.items[id.0].flag_conflict(&resolution.reason);
            }
        }
        self.collided = colliding;
    }

    /// Pairs whose GUID conflict still needs a manual choice.
    pub fn pending_guid_conflicts(&self) -> Vec<PairId> {
        self.resolutions
            .iter()
            .filter(|(_, r)| r.requires_manual_resolution)
            .map(|(id, _)| *id)
            .collect()
    }

    /// All resolutions in pair-creation order.
    pub(crate) fn resolutions(&self) -> impl Iterator<Item = &GuidResolution> + '_ {
        self.resolutions.values()
    }

    // ---- Configuration ----

    pub fn set_order_mode(&mut self, mode: OrderMode) {
        self.config.order_mode = mode;
    }

    pub fn set_skip_duplicates(&mut self, skip: bool) {
        self.config.skip_duplicates = skip;
    }
}
