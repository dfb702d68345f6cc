//! # Entity Graph Storage
//!
//! `GraphRead` is the contract between the resolution/constraint logic and
//! whatever holds the tables. Every query the merge engine and the
//! constraint engine issue is defined here.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryGraph` | `memory` | In-memory tables with keyword indexes |
//!
//! Set-valued queries return id-ordered `Vec`s. Callers may rely on that
//! order for deterministic tie-breaking.

pub mod memory;

use serde::{Deserialize, Serialize};
use crate::model::*;

pub use memory::MemoryGraph;

// ============================================================================
// Statistics
// ============================================================================

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub semfields: usize,
    pub subfields: usize,
    pub sources: usize,
    pub parameters: usize,
    pub values: usize,
    pub text_parameters: usize,
    pub form_types: usize,
    pub link_types: usize,
    pub units: usize,
    pub forms: usize,
    pub meanings: usize,
    pub examples: usize,
    pub comments: usize,
    pub links: usize,
}

// ============================================================================
// GraphRead Trait
// ============================================================================

/// Read-side queries over the entity graph.
pub trait GraphRead {
    // ========================================================================
    // Point lookups
    // ========================================================================

    fn unit(&self, id: UnitId) -> Option<&Unit>;
    fn form(&self, id: FormId) -> Option<&Form>;
    fn form_type(&self, id: FormTypeId) -> Option<&FormType>;
    fn parameter(&self, id: ParameterId) -> Option<&Parameter>;
    fn value(&self, id: ValueId) -> Option<&ParameterValue>;
    fn text_parameter(&self, id: TextParameterId) -> Option<&TextParameter>;
    fn link_type(&self, id: LinkTypeId) -> Option<&UnitLinkType>;
    fn semfield(&self, id: SemfieldId) -> Option<&Semfield>;
    fn subfield(&self, id: SubfieldId) -> Option<&Subfield>;

    // ========================================================================
    // Keyword lookups (unique constraints)
    // ========================================================================

    fn semfield_by_keyword(&self, keyword: &str) -> Option<SemfieldId>;
    fn subfield_by_keyword(&self, keyword: &str) -> Option<SubfieldId>;
    fn source_by_keyword(&self, keyword: &str) -> Option<SourceId>;
    fn parameter_by_keyword(&self, keyword: &str) -> Option<ParameterId>;
    fn value_by_keyword(&self, parameter: ParameterId, keyword: &str) -> Option<ValueId>;
    fn text_parameter_by_keyword(&self, keyword: &str) -> Option<TextParameterId>;
    fn form_type_by_keyword(&self, keyword: &str) -> Option<FormTypeId>;
    fn link_type_by_keyword(&self, keyword: &str) -> Option<LinkTypeId>;

    // ========================================================================
    // Merge-engine queries
    // ========================================================================

    /// Units whose head word equals `text` exactly.
    fn find_units_by_linker(&self, text: &str) -> Vec<UnitId>;

    /// Units whose primary semantic field is `semfield`.
    fn find_units_by_semfield(&self, semfield: SemfieldId) -> Vec<UnitId>;

    /// Units classified under `subfield`.
    fn find_units_by_subfield(&self, subfield: SubfieldId) -> Vec<UnitId>;

    /// First example created with exactly this text.
    fn find_example_by_text(&self, text: &str) -> Option<ExampleId>;

    /// First comment created with exactly this text.
    fn find_comment_by_text(&self, text: &str) -> Option<CommentId>;

    /// Whether any edge `source → target` exists, whatever its type.
    fn has_link(&self, source: UnitId, target: UnitId) -> bool;

    /// Whether the exact edge exists.
    fn has_typed_link(&self, link: &UnitLink) -> bool;

    // ========================================================================
    // Provided accessors
    // ========================================================================

    /// Assignments owned by a unit or form.
    fn assignments(&self, holder: Holder) -> Option<&Assignments> {
        match holder {
            Holder::Unit(id) => self.unit(id).map(|u| &u.assignments),
            Holder::Form(id) => self.form(id).map(|f| &f.assignments),
        }
    }

    /// Values of `parameter` held by `holder`, in assignment order.
    fn values_for(&self, holder: Holder, parameter: ParameterId) -> Vec<ValueId> {
        self.assignments(holder)
            .map(|a| {
                a.value_ids()
                    .filter(|v| self.value(*v).is_some_and(|pv| pv.parameter == parameter))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Texts of this unit's forms of the given type.
    fn form_texts(&self, unit: UnitId, form_type: FormTypeId) -> Vec<&str> {
        let Some(u) = self.unit(unit) else { return Vec::new() };
        u.forms.iter()
            .filter_map(|f| self.form(*f))
            .filter(|f| f.form_type == form_type)
            .map(|f| f.text.as_str())
            .collect()
    }
}
