//! Per-pair materialization: one merged component from a matched pair.

use std::collections::HashSet;
use std::hash::Hash;

use modmerge_types::{Component, FieldKind, MergeField};

use crate::guid::GuidResolution;
use crate::policy::{FieldMergePreferences, FieldPreference};

/// Merge a matched pair into one component.
///
/// For every mergeable field, a side that has data beats a side that has
/// none; when both or neither have data, `prefs` decides. `Merge` on a
/// reference list concatenates existing entries with novel incoming ones;
/// on any other field it behaves as `UseExisting`.
///
/// Installation state (`is_selected`, `install_state`, `is_downloaded`)
/// always comes from `existing`. The result carries `existing.guid` unless
/// `resolution` supplies a chosen GUID.
pub fn merge_components(
    existing: &Component,
    incoming: &Component,
    prefs: &FieldMergePreferences,
    resolution: Option<&GuidResolution>,
) -> Component {
    let mut merged = existing.clone();

    for field in MergeField::ALL {
        let existing_has = existing.has_value(field);
        let incoming_has = incoming.has_value(field);
        match (existing_has, incoming_has) {
            (true, false) => {}
            (false, true) => merged.take_field(incoming, field),
            _ => match prefs.get(field) {
                FieldPreference::UseExisting => {}
                FieldPreference::UseIncoming => merged.take_field(incoming, field),
                FieldPreference::Merge if field.kind() == FieldKind::ReferenceList => {
                    merge_reference_field(&mut merged, existing, incoming, field);
                }
                FieldPreference::Merge => {}
            },
        }
    }

    if let Some(resolution) = resolution {
        merged.guid = resolution.chosen_guid.clone();
    }

    merged
}

fn merge_reference_field(
    merged: &mut Component,
    existing: &Component,
    incoming: &Component,
    field: MergeField,
) {
    match field {
        MergeField::Language => {
            merged.language = merge_lists(&existing.language, &incoming.language)
        }
        MergeField::Links => merged.links = merge_lists(&existing.links, &incoming.links),
        MergeField::Dependencies => {
            merged.dependencies = merge_lists(&existing.dependencies, &incoming.dependencies)
        }
        MergeField::Restrictions => {
            merged.restrictions = merge_lists(&existing.restrictions, &incoming.restrictions)
        }
        MergeField::InstallBefore => {
            merged.install_before = merge_lists(&existing.install_before, &incoming.install_before)
        }
        MergeField::InstallAfter => {
            merged.install_after = merge_lists(&existing.install_after, &incoming.install_after)
        }
        _ => {}
    }
}

/// Order-preserving union: `a` in order, then entries of `b` not yet seen.
///
/// Duplicates inside either input are dropped as well.
pub fn merge_lists<T>(a: &[T], b: &[T]) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let mut seen = HashSet::with_capacity(a.len() + b.len());
    let mut out = Vec::with_capacity(a.len() + b.len());
    for item in a.iter().chain(b) {
        if seen.insert(item) {
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmerge_types::{Guid, InstallState, Instruction, Side};
    use proptest::prelude::*;

    fn g(s: &str) -> Guid {
        Guid::new(s)
    }

    fn existing() -> Component {
        Component {
            author: "Alice".into(),
            tier: "Recommended".into(),
            dependencies: vec![g("d1"), g("d2")],
            is_selected: true,
            install_state: InstallState::Completed,
            is_downloaded: true,
            instructions: vec![Instruction {
                action: "extract".into(),
                ..Default::default()
            }],
            ..Component::new("g1", "Foo")
        }
    }

    fn incoming() -> Component {
        Component {
            name: "Foo v2".into(),
            description: "New description".into(),
            tier: "Essential".into(),
            dependencies: vec![g("d2"), g("d3")],
            install_state: InstallState::Pending,
            instructions: vec![Instruction {
                action: "move".into(),
                ..Default::default()
            }],
            ..Component::new("g2", "Foo v2")
        }
    }

    #[test]
    fn defaults_take_incoming_on_ties() {
        let (e, i) = (existing(), incoming());
        let prefs = FieldMergePreferences::defaults_for(&e, &i);
        let m = merge_components(&e, &i, &prefs, None);
        assert_eq!(m.name, "Foo v2");
        assert_eq!(m.tier, "Essential");
        assert_eq!(m.author, "Alice");
        assert_eq!(m.description, "New description");
        assert_eq!(m.instructions[0].action, "move");
    }

    #[test]
    fn reference_lists_union_by_default() {
        let (e, i) = (existing(), incoming());
        let prefs = FieldMergePreferences::defaults_for(&e, &i);
        let m = merge_components(&e, &i, &prefs, None);
        assert_eq!(m.dependencies, vec![g("d1"), g("d2"), g("d3")]);
    }

    #[test]
    fn state_fields_come_from_existing() {
        let (e, i) = (existing(), incoming());
        let prefs = FieldMergePreferences::uniform(FieldPreference::UseIncoming);
        let m = merge_components(&e, &i, &prefs, None);
        assert!(m.is_selected);
        assert!(m.is_downloaded);
        assert_eq!(m.install_state, InstallState::Completed);
    }

    #[test]
    fn guid_defaults_to_existing_then_resolution() {
        let (e, i) = (existing(), incoming());
        let prefs = FieldMergePreferences::defaults_for(&e, &i);
        assert_eq!(merge_components(&e, &i, &prefs, None).guid, g("g1"));

        let r = GuidResolution::automatic(g("g2"), g("g1"), "test");
        assert_eq!(merge_components(&e, &i, &prefs, Some(&r)).guid, g("g2"));
    }

    #[test]
    fn existing_preference_keeps_existing_values() {
        let (e, i) = (existing(), incoming());
        let prefs = FieldMergePreferences::uniform(FieldPreference::UseExisting);
        let m = merge_components(&e, &i, &prefs, None);
        assert_eq!(m.name, "Foo");
        assert_eq!(m.tier, "Recommended");
        assert_eq!(m.dependencies, vec![g("d1"), g("d2")]);
        // Existing had no description, so incoming's still wins.
        assert_eq!(m.description, "New description");
    }

    #[test]
    fn stray_merge_on_override_list_keeps_existing() {
        let (e, i) = (existing(), incoming());
        let mut prefs = FieldMergePreferences::uniform(FieldPreference::Merge);
        // `set` refuses this, so uniform() maps it to UseExisting already.
        assert!(!prefs.set(MergeField::Instructions, FieldPreference::Merge));
        let m = merge_components(&e, &i, &prefs, None);
        assert_eq!(m.instructions, e.instructions);
    }

    #[test]
    fn merge_lists_preserves_order() {
        let a = vec![3, 1, 3];
        let b = vec![2, 1, 4, 2];
        assert_eq!(merge_lists(&a, &b), vec![3, 1, 2, 4]);
    }

    #[test]
    fn use_all_existing_still_takes_missing_description() {
        let (e, i) = (existing(), incoming());
        let prefs = FieldMergePreferences::biased_toward(&e, &i, Side::Existing);
        let m = merge_components(&e, &i, &prefs, None);
        assert_eq!(m.description, "New description");
        assert_eq!(m.name, "Foo");
    }

    fn arb_component() -> impl Strategy<Value = Component> {
        (
            "[a-z]{0,4}",
            "[a-z]{0,4}",
            "[a-z]{0,4}",
            prop::collection::vec("[a-c]", 0..4),
            prop::collection::vec("[a-c]", 0..4),
        )
            .prop_map(|(name, author, tier, deps, langs)| Component {
                author,
                tier,
                dependencies: deps.iter().map(Guid::new).collect(),
                language: langs,
                ..Component::new("g", name)
            })
    }

    fn arb_preference() -> impl Strategy<Value = FieldPreference> {
        prop_oneof![
            Just(FieldPreference::UseExisting),
            Just(FieldPreference::UseIncoming),
            Just(FieldPreference::Merge),
        ]
    }

    proptest! {
        #[test]
        fn merging_with_itself_is_identity(c in arb_component(), pref in arb_preference()) {
            let mut c = c;
            // Self-union drops duplicates, so start from deduplicated lists.
            c.dependencies = merge_lists(&c.dependencies, &[]);
            c.language = merge_lists(&c.language, &[]);
            let prefs = FieldMergePreferences::uniform(pref);
            prop_assert_eq!(merge_components(&c, &c, &prefs, None), c);
        }

        #[test]
        fn merge_lists_is_dedup_union(
            a in prop::collection::vec(0u8..8, 0..10),
            b in prop::collection::vec(0u8..8, 0..10),
        ) {
            let merged = merge_lists(&a, &b);
            let unique: HashSet<_> = merged.iter().collect();
            prop_assert_eq!(unique.len(), merged.len());
            for x in a.iter().chain(&b) {
                prop_assert!(merged.contains(x));
            }
            // A's first occurrences come first, in A's order.
            let a_dedup = merge_lists(&a, &[]);
            prop_assert_eq!(&merged[..a_dedup.len()], &a_dedup[..]);
        }
    }
}
