//! Diffs and the full recompute of everything derived from session state.

use serde::Serialize;
use tracing::debug;

use modmerge_diff::{diff_with, LineDiff};
use modmerge_merge::{merge_components, FieldMergePreferences, RenameMap};
use modmerge_types::{Component, ComponentSerializer, Side};

use crate::error::{SessionError, SessionResult};
use crate::impact::ChangeImpact;
use crate::item::ItemId;
use crate::preview::PreviewEntry;
use crate::session::MergeSession;

/// Everything a front end renders after a mutation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Derived {
    pub preview: Vec<PreviewEntry>,
    pub merged: Vec<Component>,
    pub impact: ChangeImpact,
    /// Existing catalog against the merged catalog.
    pub catalog_diff: LineDiff,
    pending_guid_conflicts: usize,
}

impl Derived {
    /// `true` while a pair still awaits a manual GUID choice. The merged
    /// catalog then uses placeholder GUIDs for those pairs.
    pub fn is_provisional(&self) -> bool {
        self.pending_guid_conflicts > 0
    }

    pub fn pending_guid_conflicts(&self) -> usize {
        self.pending_guid_conflicts
    }
}

impl MergeSession {
    /// Re-derive preview, merged catalog, impact, and catalog diff.
    ///
    /// Call after every mutating operation.
    pub fn recompute(&self, serializer: &dyn ComponentSerializer) -> SessionResult<Derived> {
        let merged = self.merged_components();
        let catalog_diff = self.diff_catalogs(&merged, serializer)?;
        let derived = Derived {
            preview: self.preview(),
            merged,
            impact: self.impact(),
            catalog_diff,
            pending_guid_conflicts: self.pending_guid_conflicts().len(),
        };
        debug!(
            entries = derived.preview.len(),
            new = derived.impact.new,
            updated = derived.impact.updated,
            kept = derived.impact.kept,
            removed = derived.impact.removed,
            provisional = derived.is_provisional(),
            "recomputed session"
        );
        Ok(derived)
    }

    /// Diff of the existing catalog against the merged catalog.
    pub fn catalog_diff(&self, serializer: &dyn ComponentSerializer) -> SessionResult<LineDiff> {
        let merged = self.merged_components();
        self.diff_catalogs(&merged, serializer)
    }

    fn diff_catalogs(
        &self,
        merged: &[Component],
        serializer: &dyn ComponentSerializer,
    ) -> SessionResult<LineDiff> {
        let original = serialize_all(
            self.side_items(Side::Existing).map(|item| &item.component),
            serializer,
        )?;
        let merged = serialize_all(merged.iter(), serializer)?;
        Ok(diff_with(self.config().diff_mode, &original, &merged))
    }

    /// Diff for one item.
    ///
    /// A paired item compares the existing component with the merged pair.
    /// An unpaired existing item diffs against itself. An unpaired incoming
    /// item is all additions. Returns `Ok(None)` for an unknown item.
    pub fn item_diff(
        &self,
        id: ItemId,
        serializer: &dyn ComponentSerializer,
    ) -> SessionResult<Option<LineDiff>> {
        let Some(item) = self.item(id) else {
            return Ok(None);
        };
        let (original, merged) = match self.pair_of(id) {
            Some(pair) => {
                let (e, i) = self.pair_components(pair);
                let mut merged = match self.preferences(pair.id) {
                    Some(prefs) => merge_components(e, i, prefs, self.resolution(pair.id)),
                    None => merge_components(
                        e,
                        i,
                        &FieldMergePreferences::defaults_for(e, i),
                        self.resolution(pair.id),
                    ),
                };
                RenameMap::from_resolutions(self.resolutions())
                    .rewrite(std::slice::from_mut(&mut merged));
                (render(e, serializer)?, render(&merged, serializer)?)
            }
            None => match item.side {
                Side::Existing => {
                    let text = render(&item.component, serializer)?;
                    (text.clone(), text)
                }
                Side::Incoming => (String::new(), render(&item.component, serializer)?),
            },
        };
        Ok(Some(diff_with(self.config().diff_mode, &original, &merged)))
    }
}

fn render(component: &Component, serializer: &dyn ComponentSerializer) -> SessionResult<String> {
    serializer
        .serialize(component)
        .map_err(|source| SessionError::Serialize {
            guid: component.guid.clone(),
            name: component.name.clone(),
            source,
        })
}

/// Concatenate serializations, one component per block.
fn serialize_all<'a>(
    components: impl Iterator<Item = &'a Component>,
    serializer: &dyn ComponentSerializer,
) -> SessionResult<String> {
    let mut out = String::new();
    for component in components {
        out.push_str(&render(component, serializer)?);
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use modmerge_diff::DiffType;
    use modmerge_merge::IdentityGuidResolver;
    use modmerge_types::{FnScorer, SerializeError};

    fn line_serializer(c: &Component) -> Result<String, SerializeError> {
        Ok(format!("guid={}\nname={}\nauthor={}\n", c.guid, c.name, c.author))
    }

    fn failing_serializer(c: &Component) -> Result<String, SerializeError> {
        if c.name == "Bad" {
            Err("cannot render".into())
        } else {
            line_serializer(c)
        }
    }

    fn session(existing: Vec<Component>, incoming: Vec<Component>) -> MergeSession {
        let scorer = FnScorer::new(
            |a: &Component, b: &Component| a.name == b.name,
            |_: &Component, _: &Component| 1.0,
        );
        MergeSession::new(
            existing,
            incoming,
            &scorer,
            IdentityGuidResolver,
            SessionConfig::default(),
        )
    }

    #[test]
    fn pair_diff_shows_field_change() {
        let mut i = Component::new("g1", "Foo");
        i.author = "Bob".into();
        let s = session(vec![Component::new("g1", "Foo")], vec![i]);
        let diff = s.item_diff(ItemId(0), &line_serializer).unwrap().unwrap();
        assert_eq!(diff.modifications(), 1);
        assert_eq!(diff.lines[2].kind, DiffType::Modified);
        assert_eq!(diff.lines[2].text, "author=Bob");
    }

    #[test]
    fn unpaired_item_diffs() {
        let s = session(vec![Component::new("g1", "Old")], vec![Component::new("g2", "New")]);
        let existing = s.item_diff(ItemId(0), &line_serializer).unwrap().unwrap();
        assert!(existing.is_unchanged());
        let incoming = s.item_diff(ItemId(1), &line_serializer).unwrap().unwrap();
        assert_eq!(incoming.additions(), 3);
        assert!(s.item_diff(ItemId(7), &line_serializer).unwrap().is_none());
    }

    #[test]
    fn catalog_diff_appends_new_component() {
        let s = session(
            vec![Component::new("g1", "A")],
            vec![Component::new("g1", "A"), Component::new("g2", "B")],
        );
        let diff = s.catalog_diff(&line_serializer).unwrap();
        assert_eq!(diff.removals(), 0);
        assert_eq!(diff.additions(), 3);
    }

    #[test]
    fn serializer_failure_is_surfaced() {
        let s = session(vec![Component::new("g1", "Bad")], vec![]);
        let err = s.recompute(&failing_serializer).unwrap_err();
        let SessionError::Serialize { guid, name, .. } = err;
        assert_eq!(guid.as_str(), "g1");
        assert_eq!(name, "Bad");
    }

    #[test]
    fn provisional_until_guid_chosen() {
        let scorer = FnScorer::new(
            |_: &Component, _: &Component| true,
            |_: &Component, _: &Component| 1.0,
        );
        let mut s = MergeSession::new(
            vec![Component::new("g1", "Foo")],
            vec![Component::new("g2", "Bar")],
            &scorer,
            IdentityGuidResolver,
            SessionConfig::default(),
        );
        let derived = s.recompute(&line_serializer).unwrap();
        assert!(derived.is_provisional());
        assert_eq!(derived.merged[0].guid.as_str(), "g1");

        assert!(s.choose_guid(ItemId(1)));
        let derived = s.recompute(&line_serializer).unwrap();
        assert!(!derived.is_provisional());
        assert_eq!(derived.merged[0].guid.as_str(), "g2");
    }
}
