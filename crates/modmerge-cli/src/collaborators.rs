//! Built-in collaborators: match scoring and canonical text rendering.

use std::collections::HashSet;

use modmerge_types::{Component, ComponentSerializer, MatchScorer, SerializeError};

/// Token-overlap scorer over names and authors.
///
/// Two components are candidates when they share a non-nil GUID, when their
/// normalized names are equal, or when their name tokens overlap by at
/// least `min_name_overlap` (Jaccard).
pub struct NameAuthorScorer {
    pub min_name_overlap: f64,
}

impl Default for NameAuthorScorer {
    fn default() -> Self {
        Self {
            min_name_overlap: 0.5,
        }
    }
}

impl MatchScorer for NameAuthorScorer {
    fn is_candidate(&self, existing: &Component, incoming: &Component) -> bool {
        same_guid(existing, incoming)
            || normalize(&existing.name) == normalize(&incoming.name)
            || jaccard(&existing.name, &incoming.name) >= self.min_name_overlap
    }

    fn score(&self, existing: &Component, incoming: &Component) -> f64 {
        let guid = if same_guid(existing, incoming) { 1.0 } else { 0.0 };
        guid + 0.7 * jaccard(&existing.name, &incoming.name)
            + 0.3 * jaccard(&existing.author, &incoming.author)
    }
}

fn same_guid(a: &Component, b: &Component) -> bool {
    !a.guid.is_nil() && a.guid == b.guid
}

fn normalize(s: &str) -> String {
    tokens(s).into_iter().collect::<Vec<_>>().join(" ")
}

fn tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard similarity of the token sets; two empty strings score 0.
fn jaccard(a: &str, b: &str) -> f64 {
    let a: HashSet<String> = tokens(a).into_iter().collect();
    let b: HashSet<String> = tokens(b).into_iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Renders components as TOML, one document per component.
pub struct TomlSerializer;

impl ComponentSerializer for TomlSerializer {
    fn serialize(&self, component: &Component) -> Result<String, SerializeError> {
        Ok(toml::to_string(component)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmerge_types::{Guid, Instruction};

    #[test]
    fn guid_match_beats_name_similarity() {
        let scorer = NameAuthorScorer::default();
        let a = Component::new("g1", "Texture Pack");
        let same_guid = Component::new("g1", "Something Else");
        let similar = Component::new("g2", "Texture Pack HD");
        assert!(scorer.is_candidate(&a, &same_guid));
        assert!(scorer.is_candidate(&a, &similar));
        assert!(scorer.score(&a, &same_guid) > scorer.score(&a, &similar));
    }

    #[test]
    fn nil_guids_do_not_match() {
        let scorer = NameAuthorScorer::default();
        let a = Component::new(Guid::nil(), "Alpha");
        let b = Component::new(Guid::nil(), "Beta");
        assert!(!scorer.is_candidate(&a, &b));
    }

    #[test]
    fn normalized_names_match() {
        let scorer = NameAuthorScorer::default();
        let a = Component::new("g1", "Better-Combat  Mod");
        let b = Component::new("g2", "better combat mod");
        assert!(scorer.is_candidate(&a, &b));
        assert!((scorer.score(&a, &b) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn author_breaks_ties() {
        let scorer = NameAuthorScorer::default();
        let mut a = Component::new("g1", "Foo");
        a.author = "Alice".into();
        let mut b = Component::new("g2", "Foo");
        b.author = "Alice".into();
        let c = Component::new("g3", "Foo");
        assert!(scorer.score(&a, &b) > scorer.score(&a, &c));
    }

    #[test]
    fn toml_rendering_is_line_oriented() {
        let mut c = Component::new("g1", "Foo");
        c.dependencies = vec![Guid::new("d1")];
        c.instructions = vec![Instruction {
            action: "extract".into(),
            ..Default::default()
        }];
        let text = TomlSerializer.serialize(&c).unwrap();
        assert!(text.contains("name = \"Foo\""));
        assert!(text.contains("[[instructions]]"));
        assert!(text.lines().count() > 5);
    }
}
