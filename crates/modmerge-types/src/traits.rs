//! Seams for the external collaborators the merge engine consumes.
//!
//! The engine never decides on its own whether two components are the same
//! mod, nor how a component is rendered as text. Callers plug those
//! decisions in through these traits.

use crate::component::Component;

/// Error type returned by a [`ComponentSerializer`].
pub type SerializeError = Box<dyn std::error::Error + Send + Sync>;

/// Fuzzy identity scoring between an existing and an incoming component.
///
/// Both methods must be total and side-effect free. Higher scores mean a
/// better match; the scale is up to the implementation.
pub trait MatchScorer {
    /// Whether the pair may be matched at all.
    fn is_candidate(&self, existing: &Component, incoming: &Component) -> bool;

    /// Strength of the match for a candidate pair.
    fn score(&self, existing: &Component, incoming: &Component) -> f64;
}

/// A [`MatchScorer`] assembled from two closures.
pub struct FnScorer<C, S> {
    candidate: C,
    score: S,
}

impl<C, S> FnScorer<C, S>
where
    C: Fn(&Component, &Component) -> bool,
    S: Fn(&Component, &Component) -> f64,
{
    pub fn new(candidate: C, score: S) -> Self {
        Self { candidate, score }
    }
}

impl<C, S> MatchScorer for FnScorer<C, S>
where
    C: Fn(&Component, &Component) -> bool,
    S: Fn(&Component, &Component) -> f64,
{
    fn is_candidate(&self, existing: &Component, incoming: &Component) -> bool {
        (self.candidate)(existing, incoming)
    }

    fn score(&self, existing: &Component, incoming: &Component) -> f64 {
        (self.score)(existing, incoming)
    }
}

/// Canonical text rendering of a component, used only as diff input.
pub trait ComponentSerializer {
    fn serialize(&self, component: &Component) -> Result<String, SerializeError>;
}

impl<F> ComponentSerializer for F
where
    F: Fn(&Component) -> Result<String, SerializeError>,
{
    fn serialize(&self, component: &Component) -> Result<String, SerializeError> {
        self(component)
    }
}
