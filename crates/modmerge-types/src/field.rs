//! Mergeable field catalogue and the two sides of a merge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Which input list a component came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Existing,
    Incoming,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing => f.write_str("existing"),
            Self::Incoming => f.write_str("incoming"),
        }
    }
}

/// How a field's value combines across a matched pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Single string value; one side wins.
    Scalar,
    /// Ordered list replaced as a whole; one side wins.
    OverrideList,
    /// List of references or tags; may be concatenated with dedup.
    ReferenceList,
}

/// Every field whose value is decided by a merge preference.
///
/// Installation-state fields (`is_selected`, `install_state`,
/// `is_downloaded`) are deliberately absent: they always come from the
/// existing side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MergeField {
    Name,
    Author,
    Description,
    Directions,
    Tier,
    InstallationMethod,
    Category,
    Instructions,
    Options,
    Language,
    Dependencies,
    Restrictions,
    InstallBefore,
    InstallAfter,
    Links,
}

impl MergeField {
    /// All mergeable fields in display order.
    pub const ALL: [MergeField; 15] = [
        Self::Name,
        Self::Author,
        Self::Description,
        Self::Directions,
        Self::Tier,
        Self::InstallationMethod,
        Self::Category,
        Self::Instructions,
        Self::Options,
        Self::Language,
        Self::Dependencies,
        Self::Restrictions,
        Self::InstallBefore,
        Self::InstallAfter,
        Self::Links,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Self::Name
            | Self::Author
            | Self::Description
            | Self::Directions
            | Self::Tier
            | Self::InstallationMethod => FieldKind::Scalar,
            Self::Category | Self::Instructions | Self::Options => FieldKind::OverrideList,
            Self::Language
            | Self::Dependencies
            | Self::Restrictions
            | Self::InstallBefore
            | Self::InstallAfter
            | Self::Links => FieldKind::ReferenceList,
        }
    }

    /// Returns `true` if the field holds GUIDs subject to cross-reference rewriting.
    pub fn holds_guids(self) -> bool {
        matches!(
            self,
            Self::Dependencies | Self::Restrictions | Self::InstallBefore | Self::InstallAfter
        )
    }

    /// Snake-case name used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Author => "author",
            Self::Description => "description",
            Self::Directions => "directions",
            Self::Tier => "tier",
            Self::InstallationMethod => "installation_method",
            Self::Category => "category",
            Self::Instructions => "instructions",
            Self::Options => "options",
            Self::Language => "language",
            Self::Dependencies => "dependencies",
            Self::Restrictions => "restrictions",
            Self::InstallBefore => "install_before",
            Self::InstallAfter => "install_after",
            Self::Links => "links",
        }
    }
}

impl fmt::Display for MergeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeField {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| TypeError::UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_partition_fields() {
        let scalars = MergeField::ALL
            .iter()
            .filter(|f| f.kind() == FieldKind::Scalar)
            .count();
        let overrides = MergeField::ALL
            .iter()
            .filter(|f| f.kind() == FieldKind::OverrideList)
            .count();
        let refs = MergeField::ALL
            .iter()
            .filter(|f| f.kind() == FieldKind::ReferenceList)
            .count();
        assert_eq!((scalars, overrides, refs), (6, 3, 6));
    }

    #[test]
    fn guid_fields_are_reference_lists() {
        for field in MergeField::ALL.iter().filter(|f| f.holds_guids()) {
            assert_eq!(field.kind(), FieldKind::ReferenceList);
        }
        assert!(!MergeField::Links.holds_guids());
        assert!(!MergeField::Language.holds_guids());
    }

    #[test]
    fn parse_accepts_dashes_and_case() {
        assert_eq!("Install-After".parse::<MergeField>(), Ok(MergeField::InstallAfter));
        assert_eq!("name".parse::<MergeField>(), Ok(MergeField::Name));
    }

    #[test]
    fn parse_unknown_field() {
        assert_eq!(
            "colour".parse::<MergeField>(),
            Err(TypeError::UnknownField("colour".into()))
        );
    }

    #[test]
    fn name_roundtrip() {
        for field in MergeField::ALL {
            assert_eq!(field.as_str().parse::<MergeField>(), Ok(field));
        }
    }
}
