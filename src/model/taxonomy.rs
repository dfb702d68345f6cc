//! Semantic field hierarchy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use super::{SemfieldId, SubfieldId};

/// A top-level semantic field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Semfield {
    pub id: SemfieldId,
    pub name: String,
    pub keyword: String,
    /// Sub-fields owned by this field.
    pub subfields: BTreeSet<SubfieldId>,
}

/// A sub-field. Owned by exactly one [`Semfield`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subfield {
    pub id: SubfieldId,
    pub name: String,
    pub keyword: String,
    pub semfield: SemfieldId,
}

/// Result of a keyword lookup across both levels of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyEntry {
    Semfield(SemfieldId),
    Subfield(SubfieldId),
}
