//! The component record: one mod descriptor in a catalog.

use serde::{Deserialize, Serialize};

use crate::field::MergeField;
use crate::guid::Guid;

/// Installation progress of a component on the local machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    Blocked,
}

/// A single installation step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instruction {
    pub action: String,
    pub source: Vec<String>,
    pub destination: String,
    pub arguments: String,
}

/// A selectable sub-choice of a component.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentOption {
    pub guid: Guid,
    pub name: String,
    pub description: String,
}

/// A mod descriptor.
///
/// Scalar fields use the empty string for "no value". List fields keep
/// their order. The reference lists `dependencies`, `restrictions`,
/// `install_before` and `install_after` hold [`Guid`]s of other components
/// and take part in cross-reference rewriting.
///
/// Field order matters for text serialization: plain values come first so
/// table-shaped values (`instructions`, `options`) can follow them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Component {
    pub guid: Guid,
    pub name: String,
    pub author: String,
    pub description: String,
    pub directions: String,
    pub tier: String,
    pub installation_method: String,
    pub category: Vec<String>,
    pub language: Vec<String>,
    pub dependencies: Vec<Guid>,
    pub restrictions: Vec<Guid>,
    pub install_before: Vec<Guid>,
    pub install_after: Vec<Guid>,
    pub links: Vec<String>,
    pub is_selected: bool,
    pub install_state: InstallState,
    pub is_downloaded: bool,
    pub instructions: Vec<Instruction>,
    pub options: Vec<ComponentOption>,
}

impl Component {
    /// Create a component with a GUID and name; everything else empty.
    pub fn new(guid: impl Into<Guid>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name for display, falling back to the GUID.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.guid.as_str()
        } else {
            &self.name
        }
    }

    /// Returns `true` if the field carries data.
    ///
    /// Whitespace-only scalars count as empty.
    pub fn has_value(&self, field: MergeField) -> bool {
        match field {
            MergeField::Name => !self.name.trim().is_empty(),
            MergeField::Author => !self.author.trim().is_empty(),
            MergeField::Description => !self.description.trim().is_empty(),
            MergeField::Directions => !self.directions.trim().is_empty(),
            MergeField::Tier => !self.tier.trim().is_empty(),
            MergeField::InstallationMethod => !self.installation_method.trim().is_empty(),
            MergeField::Category => !self.category.is_empty(),
            MergeField::Instructions => !self.instructions.is_empty(),
            MergeField::Options => !self.options.is_empty(),
            MergeField::Language => !self.language.is_empty(),
            MergeField::Dependencies => !self.dependencies.is_empty(),
            MergeField::Restrictions => !self.restrictions.is_empty(),
            MergeField::InstallBefore => !self.install_before.is_empty(),
            MergeField::InstallAfter => !self.install_after.is_empty(),
            MergeField::Links => !self.links.is_empty(),
        }
    }

    /// Returns `true` if both components hold the same value for `field`.
    pub fn same_value(&self, other: &Component, field: MergeField) -> bool {
        match field {
            MergeField::Name => self.name == other.name,
            MergeField::Author => self.author == other.author,
            MergeField::Description => self.description == other.description,
            MergeField::Directions => self.directions == other.directions,
            MergeField::Tier => self.tier == other.tier,
            MergeField::InstallationMethod => {
                self.installation_method == other.installation_method
            }
            MergeField::Category => self.category == other.category,
            MergeField::Instructions => self.instructions == other.instructions,
            MergeField::Options => self.options == other.options,
            MergeField::Language => self.language == other.language,
            MergeField::Dependencies => self.dependencies == other.dependencies,
            MergeField::Restrictions => self.restrictions == other.restrictions,
            MergeField::InstallBefore => self.install_before == other.install_before,
            MergeField::InstallAfter => self.install_after == other.install_after,
            MergeField::Links => self.links == other.links,
        }
    }

    /// Fields where the two components disagree.
    pub fn differing_fields(&self, other: &Component) -> Vec<MergeField> {
        MergeField::ALL
            .into_iter()
            .filter(|field| !self.same_value(other, *field))
            .collect()
    }

    /// Replace this component's value for `field` with `source`'s.
    pub fn take_field(&mut self, source: &Component, field: MergeField) {
        match field {
            MergeField::Name => self.name = source.name.clone(),
            MergeField::Author => self.author = source.author.clone(),
            MergeField::Description => self.description = source.description.clone(),
            MergeField::Directions => self.directions = source.directions.clone(),
            MergeField::Tier => self.tier = source.tier.clone(),
            MergeField::InstallationMethod => {
                self.installation_method = source.installation_method.clone()
            }
            MergeField::Category => self.category = source.category.clone(),
            MergeField::Instructions => self.instructions = source.instructions.clone(),
            MergeField::Options => self.options = source.options.clone(),
            MergeField::Language => self.language = source.language.clone(),
            MergeField::Dependencies => self.dependencies = source.dependencies.clone(),
            MergeField::Restrictions => self.restrictions = source.restrictions.clone(),
            MergeField::InstallBefore => self.install_before = source.install_before.clone(),
            MergeField::InstallAfter => self.install_after = source.install_after.clone(),
            MergeField::Links => self.links = source.links.clone(),
        }
    }

    /// Mutable access to every GUID reference list.
    pub fn guid_lists_mut(&mut self) -> [&mut Vec<Guid>; 4] {
        [
            &mut self.dependencies,
            &mut self.restrictions,
            &mut self.install_before,
            &mut self.install_after,
        ]
    }

    /// Iterate every GUID this component references.
    pub fn referenced_guids(&self) -> impl Iterator<Item = &Guid> {
        self.dependencies
            .iter()
            .chain(&self.restrictions)
            .chain(&self.install_before)
            .chain(&self.install_after)
    }
}
