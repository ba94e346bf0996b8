//! GUID reconciliation: which identity survives a matched pair, and the
//! global rename that repoints references at the survivor.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use modmerge_types::{Component, Guid};

/// The decision for one matched pair whose GUIDs collide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidResolution {
    pub chosen_guid: Guid,
    pub rejected_guid: Guid,
    /// Set while the choice is a placeholder awaiting the user.
    pub requires_manual_resolution: bool,
    pub reason: String,
}

impl GuidResolution {
    /// A settled resolution.
    pub fn automatic(chosen: Guid, rejected: Guid, reason: impl Into<String>) -> Self {
        Self {
            chosen_guid: chosen,
            rejected_guid: rejected,
            requires_manual_resolution: false,
            reason: reason.into(),
        }
    }

    /// A provisional resolution that needs a manual choice.
    pub fn manual(chosen: Guid, rejected: Guid, reason: impl Into<String>) -> Self {
        Self {
            requires_manual_resolution: true,
            ..Self::automatic(chosen, rejected, reason)
        }
    }

    /// Record an explicit user choice and clear the manual flag.
    pub fn choose(&mut self, chosen: Guid, rejected: Guid) {
        self.chosen_guid = chosen;
        self.rejected_guid = rejected;
        self.requires_manual_resolution = false;
        self.reason = "chosen manually".into();
    }

    /// Returns `true` if applying this resolution renames anything.
    pub fn renames(&self) -> bool {
        self.chosen_guid != self.rejected_guid && !self.rejected_guid.is_nil()
    }
}

/// Source of GUID conflict verdicts.
///
/// Returns `None` when the pair does not conflict.
pub trait GuidConflictResolver {
    fn resolve(&self, existing: &Component, incoming: &Component) -> Option<GuidResolution>;
}

impl<F> GuidConflictResolver for F
where
    F: Fn(&Component, &Component) -> Option<GuidResolution>,
{
    fn resolve(&self, existing: &Component, incoming: &Component) -> Option<GuidResolution> {
        self(existing, incoming)
    }
}

/// Built-in resolver.
///
/// - Equal GUIDs: no conflict.
/// - One nil GUID: the other one wins, no review needed.
/// - Otherwise the existing GUID wins. If the two names disagree (ignoring
///   case and surrounding whitespace) the choice is flagged for review.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityGuidResolver;

impl GuidConflictResolver for IdentityGuidResolver {
    fn resolve(&self, existing: &Component, incoming: &Component) -> Option<GuidResolution> {
        if existing.guid == incoming.guid {
            return None;
        }
        if existing.guid.is_nil() {
            return Some(GuidResolution::automatic(
                incoming.guid.clone(),
                existing.guid.clone(),
                "existing component has no GUID",
            ));
        }
        if incoming.guid.is_nil() {
            return Some(GuidResolution::automatic(
                existing.guid.clone(),
                incoming.guid.clone(),
                "incoming component has no GUID",
            ));
        }

        let same_name = existing.name.trim().to_lowercase() == incoming.name.trim().to_lowercase();
        if same_name {
            Some(GuidResolution::automatic(
                existing.guid.clone(),
                incoming.guid.clone(),
                "kept existing GUID",
            ))
        } else {
            Some(GuidResolution::manual(
                existing.guid.clone(),
                incoming.guid.clone(),
                format!(
                    "GUIDs differ and names disagree: {:?} vs {:?}",
                    existing.name, incoming.name
                ),
            ))
        }
    }
}

/// Map from rejected GUIDs to the identity that replaces them.
///
/// A GUID that some resolution keeps as its chosen identity is live: it
/// still names a component in the merged catalog, so it is never renamed
/// even when another resolution rejects it. Every such kept-and-rejected
/// GUID is recorded as a collision instead. Because targets are always kept
/// GUIDs and keys never are, a single lookup yields the survivor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenameMap {
    renames: BTreeMap<Guid, Guid>,
    collisions: BTreeSet<Guid>,
}

impl RenameMap {
    /// Build from resolutions, first one wins for a given rejected GUID.
    pub fn from_resolutions<'a>(resolutions: impl IntoIterator<Item = &'a GuidResolution>) -> Self {
        let resolutions: Vec<&GuidResolution> = resolutions.into_iter().collect();
        let kept: HashSet<&Guid> = resolutions
            .iter()
            .map(|r| &r.chosen_guid)
            .filter(|g| !g.is_nil())
            .collect();

        let mut renames: BTreeMap<Guid, Guid> = BTreeMap::new();
        let mut collisions = BTreeSet::new();
        for resolution in resolutions {
            if !resolution.renames() {
                continue;
            }
            if kept.contains(&resolution.rejected_guid) {
                warn!(
                    rejected = %resolution.rejected_guid.short_id(),
                    chosen = %resolution.chosen_guid.short_id(),
                    "rejected GUID is kept by another pair; not renaming"
                );
                collisions.insert(resolution.rejected_guid.clone());
                continue;
            }
            match renames.get(&resolution.rejected_guid) {
                Some(existing) if *existing != resolution.chosen_guid => {
                    warn!(
                        rejected = %resolution.rejected_guid.short_id(),
                        kept = %existing.short_id(),
                        ignored = %resolution.chosen_guid.short_id(),
                        "conflicting renames for one GUID"
                    );
                }
                Some(_) => {}
                None => {
                    renames.insert(
                        resolution.rejected_guid.clone(),
                        resolution.chosen_guid.clone(),
                    );
                }
            }
        }

        debug!(
            renames = renames.len(),
            collisions = collisions.len(),
            "built GUID rename map"
        );
        Self {
            renames,
            collisions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    /// The survivor for `guid`, if it was rejected.
    pub fn get(&self, guid: &Guid) -> Option<&Guid> {
        self.renames.get(guid)
    }

    /// `guid` after renaming.
    pub fn apply<'a>(&'a self, guid: &'a Guid) -> &'a Guid {
        self.renames.get(guid).unwrap_or(guid)
    }

    /// GUIDs that one resolution rejects while another keeps them.
    pub fn collisions(&self) -> &BTreeSet<Guid> {
        &self.collisions
    }

    /// Returns `true` if `resolution` keeps or rejects a colliding GUID.
    pub fn collides(&self, resolution: &GuidResolution) -> bool {
        resolution.renames()
            && (self.collisions.contains(&resolution.rejected_guid)
                || self.collisions.contains(&resolution.chosen_guid))
    }

    /// Rewrite every GUID reference in `components`.
    ///
    /// A renamed entry that lands on a GUID already in the same list is
    /// dropped, keeping the first occurrence. Duplicates that were in the
    /// input and involve no rename are left alone. Returns the number of
    /// entries rewritten.
    pub fn rewrite(&self, components: &mut [Component]) -> usize {
        if self.renames.is_empty() {
            return 0;
        }
        let mut rewritten = 0;
        for component in components.iter_mut() {
            for list in component.guid_lists_mut() {
                if !list.iter().any(|g| self.renames.contains_key(g)) {
                    continue;
                }
                let mut emitted: HashSet<Guid> = HashSet::with_capacity(list.len());
                let mut targets: HashSet<Guid> = HashSet::new();
                let mut out = Vec::with_capacity(list.len());
                for guid in list.drain(..) {
                    match self.renames.get(&guid) {
                        Some(target) => {
                            rewritten += 1;
                            if emitted.insert(target.clone()) {
                                targets.insert(target.clone());
                                out.push(target.clone());
                            }
                        }
                        None if targets.contains(&guid) => {}
                        None => {
                            emitted.insert(guid.clone());
                            out.push(guid);
                        }
                    }
                }
                *list = out;
            }
        }
        debug!(rewritten, "rewrote cross-references");
        rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn g(s: &str) -> Guid {
        Guid::new(s)
    }

    fn auto(chosen: &str, rejected: &str) -> GuidResolution {
        GuidResolution::automatic(g(chosen), g(rejected), "test")
    }

    #[test]
    fn identical_guids_no_conflict() {
        let a = Component::new("g1", "Foo");
        let b = Component::new("g1", "Foo");
        assert!(IdentityGuidResolver.resolve(&a, &b).is_none());
    }

    #[test]
    fn differing_guids_prefer_existing() {
        let a = Component::new("g1", "Foo");
        let b = Component::new("g2", "foo ");
        let r = IdentityGuidResolver.resolve(&a, &b).unwrap();
        assert_eq!(r.chosen_guid, g("g1"));
        assert_eq!(r.rejected_guid, g("g2"));
        assert!(!r.requires_manual_resolution);
    }

    #[test]
    fn differing_names_need_review() {
        let a = Component::new("g1", "Foo");
        let b = Component::new("g2", "Foo Reborn");
        let r = IdentityGuidResolver.resolve(&a, &b).unwrap();
        assert!(r.requires_manual_resolution);
        assert_eq!(r.chosen_guid, g("g1"));
    }

    #[test]
    fn nil_guid_loses() {
        let a = Component::new("", "Foo");
        let b = Component::new("g2", "Bar");
        let r = IdentityGuidResolver.resolve(&a, &b).unwrap();
        assert_eq!(r.chosen_guid, g("g2"));
        assert!(!r.requires_manual_resolution);
        assert!(!r.renames());
    }

    #[test]
    fn choose_clears_manual_flag() {
        let mut r = GuidResolution::manual(g("g1"), g("g2"), "review");
        r.choose(g("g2"), g("g1"));
        assert_eq!(r.chosen_guid, g("g2"));
        assert_eq!(r.rejected_guid, g("g1"));
        assert!(!r.requires_manual_resolution);
    }

    #[test]
    fn rename_map_skips_noops() {
        let map = RenameMap::from_resolutions(&[auto("g1", "g1")]);
        assert!(map.is_empty());
    }

    #[test]
    fn kept_guid_is_never_renamed() {
        // Alpha keeps b over c; Beta keeps a over b. b is still Alpha.
        let alpha = auto("b", "c");
        let beta = auto("a", "b");
        let map = RenameMap::from_resolutions([&alpha, &beta]);
        assert_eq!(map.get(&g("c")), Some(&g("b")));
        assert_eq!(map.get(&g("b")), None);
        assert!(map.collisions().contains(&g("b")));
        assert!(map.collides(&alpha));
        assert!(map.collides(&beta));
    }

    #[test]
    fn swapped_guids_rename_nothing() {
        let x = auto("a", "b");
        let y = auto("b", "a");
        let map = RenameMap::from_resolutions([&x, &y]);
        assert!(map.is_empty());
        assert_eq!(map.collisions().len(), 2);
        assert_eq!(map.apply(&g("b")), &g("b"));
    }

    #[test]
    fn independent_resolutions_do_not_collide() {
        let first = auto("a", "b");
        let second = auto("c", "d");
        let map = RenameMap::from_resolutions([&first, &second]);
        assert_eq!(map.len(), 2);
        assert!(map.collisions().is_empty());
        assert!(!map.collides(&first));
    }

    #[test]
    fn first_rename_wins() {
        let map = RenameMap::from_resolutions(&[auto("a", "x"), auto("b", "x")]);
        assert_eq!(map.get(&g("x")), Some(&g("a")));
    }

    #[test]
    fn rewrite_repoints_and_dedups() {
        let map = RenameMap::from_resolutions(&[auto("g1", "g2")]);
        let mut c = Component::new("x", "X");
        c.dependencies = vec![g("g2"), g("g1"), g("other")];
        c.install_after = vec![g("g2")];
        let mut list = vec![c];
        let count = map.rewrite(&mut list);
        assert_eq!(count, 2);
        assert_eq!(list[0].dependencies, vec![g("g1"), g("other")]);
        assert_eq!(list[0].install_after, vec![g("g1")]);
    }

    #[test]
    fn rewrite_keeps_unrelated_duplicates() {
        let map = RenameMap::from_resolutions(&[auto("g1", "g2")]);
        let mut c = Component::new("x", "X");
        c.dependencies = vec![g("x1"), g("x1"), g("g2"), g("g1"), g("g2")];
        let mut list = vec![c];
        assert_eq!(map.rewrite(&mut list), 2);
        assert_eq!(list[0].dependencies, vec![g("x1"), g("x1"), g("g1")]);
    }

    proptest! {
        #[test]
        fn rewrite_leaves_no_rejected_guid(
            pairs in prop::collection::vec((0u8..6, 0u8..6), 0..6),
            refs in prop::collection::vec(0u8..6, 0..10),
        ) {
            let resolutions: Vec<GuidResolution> = pairs
                .iter()
                .map(|(c, r)| auto(&format!("g{c}"), &format!("g{r}")))
                .collect();
            let map = RenameMap::from_resolutions(&resolutions);
            let mut c = Component::new("x", "X");
            c.dependencies = refs.iter().map(|r| g(&format!("g{r}"))).collect();
            let mut list = vec![c];
            map.rewrite(&mut list);
            for guid in list[0].referenced_guids() {
                prop_assert!(map.get(guid).is_none());
            }
        }
    }
}
