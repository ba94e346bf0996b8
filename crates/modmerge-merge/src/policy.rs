//! Per-field merge preferences for a matched pair.
//!
//! Defaults follow a "non-empty side wins" rule: if exactly one side has
//! data for a field, that side is preferred. When both or neither side has
//! data, scalar and override-list fields fall back to a tiebreak side
//! (incoming unless a bulk action says otherwise), and reference lists with
//! data on both sides default to [`FieldPreference::Merge`].

use serde::{Deserialize, Serialize};

use modmerge_types::{Component, FieldKind, MergeField, Side};

/// Which side supplies a field's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPreference {
    UseExisting,
    UseIncoming,
    /// Concatenate existing, then novel incoming entries. Reference lists only.
    Merge,
}

impl FieldPreference {
    /// The preference that picks `side`.
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Existing => Self::UseExisting,
            Side::Incoming => Self::UseIncoming,
        }
    }
}

/// One preference per [`MergeField`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMergePreferences {
    values: [FieldPreference; MergeField::ALL.len()],
}

impl FieldMergePreferences {
    /// Every field set to the same preference.
    ///
    /// `Merge` is only applied to reference-list fields; the rest get
    /// `UseExisting`.
    pub fn uniform(preference: FieldPreference) -> Self {
        let mut values = [preference; MergeField::ALL.len()];
        for field in MergeField::ALL {
            if preference == FieldPreference::Merge && field.kind() != FieldKind::ReferenceList {
                values[field as usize] = FieldPreference::UseExisting;
            }
        }
        Self { values }
    }

    /// Data-driven defaults with incoming as the tiebreak side.
    pub fn defaults_for(existing: &Component, incoming: &Component) -> Self {
        Self::biased_toward(existing, incoming, Side::Incoming)
    }

    /// Data-driven defaults with `primary` as the tiebreak side.
    ///
    /// Non-empty data still wins over the bias: a primary side without a
    /// value never beats a populated other side.
    pub fn biased_toward(existing: &Component, incoming: &Component, primary: Side) -> Self {
        let mut values = [FieldPreference::for_side(primary); MergeField::ALL.len()];
        for field in MergeField::ALL {
            values[field as usize] = default_preference(field, existing, incoming, primary);
        }
        Self { values }
    }

    pub fn get(&self, field: MergeField) -> FieldPreference {
        self.values[field as usize]
    }

    /// Override one field.
    ///
    /// Returns `false` and leaves the value untouched when `Merge` is
    /// requested for a field that is not a reference list.
    pub fn set(&mut self, field: MergeField, preference: FieldPreference) -> bool {
        if preference == FieldPreference::Merge && field.kind() != FieldKind::ReferenceList {
            return false;
        }
        self.values[field as usize] = preference;
        true
    }

    /// Iterate `(field, preference)` in field order.
    pub fn iter(&self) -> impl Iterator<Item = (MergeField, FieldPreference)> + '_ {
        MergeField::ALL.into_iter().map(|f| (f, self.get(f)))
    }
}

fn default_preference(
    field: MergeField,
    existing: &Component,
    incoming: &Component,
    primary: Side,
) -> FieldPreference {
    let existing_has = existing.has_value(field);
    let incoming_has = incoming.has_value(field);
    match (existing_has, incoming_has) {
        (true, true) if field.kind() == FieldKind::ReferenceList => FieldPreference::Merge,
        (true, false) => FieldPreference::UseExisting,
        (false, true) => FieldPreference::UseIncoming,
        _ => FieldPreference::for_side(primary),
    }
}
