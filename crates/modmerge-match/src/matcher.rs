//! Pairing of existing and incoming components.
//!
//! [`GreedyMatcher`] is a greedy approximation of maximum-weight bipartite
//! matching: candidate pairs are accepted in descending score order as long
//! as neither side is already taken. It does not perform augmenting-path
//! exchanges, so the aggregate score can be lower than an optimal
//! assignment when a high-scoring pair blocks two slightly weaker ones.
//! Swapping in an optimal algorithm only requires another
//! [`PairingStrategy`] implementation.

use modmerge_types::{Component, MatchScorer};
use tracing::debug;

/// Result of pairing two component lists, by index into the inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchOutcome {
    /// Matched `(existing, incoming)` index pairs, ordered by existing index.
    pub pairs: Vec<MatchedIndices>,
    /// Unmatched existing indices in original order.
    pub existing_only: Vec<usize>,
    /// Unmatched incoming indices in original order.
    pub incoming_only: Vec<usize>,
}

/// One accepted pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchedIndices {
    pub existing: usize,
    pub incoming: usize,
    pub score: f64,
}

/// A strategy that turns two component lists into a one-to-one pairing.
pub trait PairingStrategy {
    fn pair(
        &self,
        existing: &[Component],
        incoming: &[Component],
        scorer: &dyn MatchScorer,
    ) -> MatchOutcome;
}

/// Greedy score-descending assignment.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyMatcher;

struct Candidate {
    existing: usize,
    incoming: usize,
    score: f64,
}

impl PairingStrategy for GreedyMatcher {
    fn pair(
        &self,
        existing: &[Component],
        incoming: &[Component],
        scorer: &dyn MatchScorer,
    ) -> MatchOutcome {
        let mut candidates = Vec::new();
        for (ei, e) in existing.iter().enumerate() {
            for (ii, i) in incoming.iter().enumerate() {
                if scorer.is_candidate(e, i) {
                    let score = scorer.score(e, i);
                    // NaN never outranks a real score.
                    let score = if score.is_nan() { f64::NEG_INFINITY } else { score };
                    candidates.push(Candidate {
                        existing: ei,
                        incoming: ii,
                        score,
                    });
                }
            }
        }

        // Stable: equal scores keep enumeration order.
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut existing_used = vec![false; existing.len()];
        let mut incoming_used = vec![false; incoming.len()];
        let mut pairs = Vec::new();

        for c in &candidates {
            if existing_used[c.existing] || incoming_used[c.incoming] {
                continue;
            }
            existing_used[c.existing] = true;
            incoming_used[c.incoming] = true;
            pairs.push(MatchedIndices {
                existing: c.existing,
                incoming: c.incoming,
                score: c.score,
            });
        }

        pairs.sort_by_key(|p| p.existing);

        let existing_only: Vec<usize> = (0..existing.len())
            .filter(|i| !existing_used[*i])
            .collect();
        let incoming_only: Vec<usize> = (0..incoming.len())
            .filter(|i| !incoming_used[*i])
            .collect();

        debug!(
            candidates = candidates.len(),
            pairs = pairs.len(),
            existing_only = existing_only.len(),
            incoming_only = incoming_only.len(),
            "matched component lists"
        );

        MatchOutcome {
            pairs,
            existing_only,
            incoming_only,
        }
    }
}

/// Pair two lists with the default [`GreedyMatcher`].
pub fn match_components(
    existing: &[Component],
    incoming: &[Component],
    scorer: &dyn MatchScorer,
) -> MatchOutcome {
    GreedyMatcher.pair(existing, incoming, scorer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmerge_types::FnScorer;
    use proptest::prelude::*;

    fn comp(guid: &str, name: &str) -> Component {
        Component::new(guid, name)
    }

    fn pairs_of(out: &MatchOutcome) -> Vec<(usize, usize)> {
        out.pairs.iter().map(|p| (p.existing, p.incoming)).collect()
    }

    fn same_name() -> impl MatchScorer {
        FnScorer::new(
            |a: &Component, b: &Component| a.name == b.name,
            |_: &Component, _: &Component| 1.0,
        )
    }

    #[test]
    fn single_pair() {
        let existing = vec![comp("g1", "Foo")];
        let incoming = vec![comp("g2", "Foo")];
        let out = match_components(&existing, &incoming, &same_name());
        assert_eq!(out.pairs.len(), 1);
        assert_eq!((out.pairs[0].existing, out.pairs[0].incoming), (0, 0));
        assert!(out.existing_only.is_empty());
        assert!(out.incoming_only.is_empty());
    }

    #[test]
    fn empty_inputs() {
        let out = match_components(&[], &[comp("g", "x")], &same_name());
        assert!(out.pairs.is_empty());
        assert_eq!(out.incoming_only, vec![0]);
    }

    #[test]
    fn highest_score_wins() {
        let existing = vec![comp("e1", "A"), comp("e2", "A")];
        let incoming = vec![comp("i1", "A")];
        // e2 scores higher, so it takes the only incoming item.
        let scorer = FnScorer::new(
            |_: &Component, _: &Component| true,
            |e: &Component, _: &Component| if e.guid.as_str() == "e2" { 0.9 } else { 0.5 },
        );
        let out = match_components(&existing, &incoming, &scorer);
        assert_eq!(pairs_of(&out), vec![(1, 0)]);
        assert_eq!(out.existing_only, vec![0]);
    }

    #[test]
    fn ties_use_enumeration_order() {
        let existing = vec![comp("e1", "A"), comp("e2", "A")];
        let incoming = vec![comp("i1", "A"), comp("i2", "A")];
        let out = match_components(&existing, &incoming, &same_name());
        assert_eq!(pairs_of(&out), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn greedy_is_not_optimal() {
        // e0-i0 = 0.9 blocks e0-i1 = 0.8 + e1-i0 = 0.8 (total 1.6 > 0.9).
        let existing = vec![comp("e0", ""), comp("e1", "")];
        let incoming = vec![comp("i0", ""), comp("i1", "")];
        let scorer = FnScorer::new(
            |e: &Component, i: &Component| !(e.guid.as_str() == "e1" && i.guid.as_str() == "i1"),
            |e: &Component, i: &Component| match (e.guid.as_str(), i.guid.as_str()) {
                ("e0", "i0") => 0.9,
                _ => 0.8,
            },
        );
        let out = match_components(&existing, &incoming, &scorer);
        assert_eq!(pairs_of(&out), vec![(0, 0)]);
        assert_eq!(out.existing_only, vec![1]);
        assert_eq!(out.incoming_only, vec![1]);
    }

    #[test]
    fn nan_scores_rank_last() {
        let existing = vec![comp("e1", "A"), comp("e2", "A")];
        let incoming = vec![comp("i1", "A")];
        let scorer = FnScorer::new(
            |_: &Component, _: &Component| true,
            |e: &Component, _: &Component| if e.guid.as_str() == "e1" { f64::NAN } else { 0.1 },
        );
        let out = match_components(&existing, &incoming, &scorer);
        assert_eq!(pairs_of(&out), vec![(1, 0)]);
    }

    #[test]
    fn pairs_iterate_in_existing_order() {
        let existing = vec![comp("e1", "B"), comp("e2", "A")];
        let incoming = vec![comp("i1", "A"), comp("i2", "B")];
        let scorer = FnScorer::new(
            |a: &Component, b: &Component| a.name == b.name,
            |a: &Component, _: &Component| if a.name == "A" { 1.0 } else { 0.5 },
        );
        let out = match_components(&existing, &incoming, &scorer);
        assert_eq!(pairs_of(&out), vec![(0, 1), (1, 0)]);
        assert_eq!(incoming[out.pairs[0].incoming].guid.as_str(), "i2");
    }

    proptest! {
        #[test]
        fn pairing_is_one_to_one_and_deterministic(
            names_e in prop::collection::vec(0u8..4, 0..8),
            names_i in prop::collection::vec(0u8..4, 0..8),
        ) {
            let existing: Vec<Component> = names_e.iter().enumerate()
                .map(|(i, n)| comp(&format!("e{i}"), &n.to_string())).collect();
            let incoming: Vec<Component> = names_i.iter().enumerate()
                .map(|(i, n)| comp(&format!("i{i}"), &n.to_string())).collect();
            let scorer = FnScorer::new(
                |a: &Component, b: &Component| a.name == b.name,
                |a: &Component, b: &Component| {
                    (a.guid.as_str().len() + b.guid.as_str().len()) as f64
                },
            );

            let first = match_components(&existing, &incoming, &scorer);
            let second = match_components(&existing, &incoming, &scorer);
            prop_assert_eq!(&first, &second);

            let mut seen_e = vec![0usize; existing.len()];
            let mut seen_i = vec![0usize; incoming.len()];
            for p in &first.pairs {
                seen_e[p.existing] += 1;
                seen_i[p.incoming] += 1;
            }
            for i in &first.existing_only { seen_e[*i] += 1; }
            for i in &first.incoming_only { seen_i[*i] += 1; }
            prop_assert!(seen_e.iter().all(|c| *c == 1));
            prop_assert!(seen_i.iter().all(|c| *c == 1));
        }
    }
}
