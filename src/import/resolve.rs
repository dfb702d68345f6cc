//! Matching secondary rows to primary units.
//!
//! ```text
//! lexical (linker == text)
//!   └─► semantic field (unit.semfield == field)
//!         └─► sub-fields, one at a time, until a single candidate is left
//! ```
//!
//! Candidate lists are id-ordered, so the outcome only depends on the graph
//! and the row.

use crate::model::*;
use crate::storage::GraphRead;
use crate::{Error, Result};

/// Where the cascade ran out of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexical,
    Semfield,
    Subfield,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unique(UnitId),
    Missing(Stage),
    Ambiguous(Vec<UnitId>),
}

impl Resolution {
    fn from_candidates(candidates: Vec<UnitId>, stage: Stage) -> Self {
        match candidates.as_slice() {
            [] => Resolution::Missing(stage),
            [one] => Resolution::Unique(*one),
            _ => Resolution::Ambiguous(candidates),
        }
    }

    /// The unit, or the row-scoped error describing why there is none.
    pub fn into_result(self, text: &str) -> Result<UnitId> {
        match self {
            Resolution::Unique(id) => Ok(id),
            Resolution::Missing(stage) => Err(Error::ReferenceMissing {
                kind: match stage {
                    Stage::Lexical => "unit",
                    Stage::Semfield => "unit in this semantic field",
                    Stage::Subfield => "unit in these sub-fields",
                },
                keyword: text.to_string(),
            }),
            Resolution::Ambiguous(candidates) => Err(Error::AmbiguousMatch {
                linker: text.to_string(),
                candidates: candidates.len(),
            }),
        }
    }
}

/// Resolve the unit a secondary row describes.
///
/// `subfields` are the row's resolved sub-fields in cell order; unknown ones
/// must already be filtered out.
pub fn resolve_unit<G: GraphRead + ?Sized>(
    graph: &G,
    text: &str,
    semfield: SemfieldId,
    subfields: &[SubfieldId],
) -> Resolution {
    let lexical = graph.find_units_by_linker(text);
    if lexical.is_empty() {
        return Resolution::Missing(Stage::Lexical);
    }

    let mut candidates = in_semfield(graph, lexical, semfield);
    if candidates.is_empty() {
        return Resolution::Missing(Stage::Semfield);
    }

    if candidates.len() > 1 {
        for subfield in subfields {
            candidates.retain(|id| graph.unit(*id).is_some_and(|u| u.has_subfield(*subfield)));
            if candidates.len() == 1 {
                break;
            }
        }
    }
    Resolution::from_candidates(candidates, Stage::Subfield)
}

/// Resolve a cross-reference target. A single lexical match is taken as is;
/// several are narrowed by the referring row's semantic field.
pub fn resolve_link_target<G: GraphRead + ?Sized>(
    graph: &G,
    text: &str,
    semfield: SemfieldId,
) -> Resolution {
    let lexical = graph.find_units_by_linker(text);
    match lexical.len() {
        0 => Resolution::Missing(Stage::Lexical),
        1 => Resolution::Unique(lexical[0]),
        _ => Resolution::from_candidates(in_semfield(graph, lexical, semfield), Stage::Semfield),
    }
}

fn in_semfield<G: GraphRead + ?Sized>(graph: &G, mut units: Vec<UnitId>, semfield: SemfieldId) -> Vec<UnitId> {
    units.retain(|id| graph.unit(*id).is_some_and(|u| u.semfield == Some(semfield)));
    units
}
