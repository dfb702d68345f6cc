//! Opaque identifiers for every table in the knowledge base.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            pub struct $name(pub u64);

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

define_id! {
    /// Semantic field identifier.
    SemfieldId,
    /// Semantic sub-field identifier.
    SubfieldId,
    /// Bibliographic source identifier.
    SourceId,
    /// Controlled-vocabulary parameter identifier.
    ParameterId,
    /// Parameter value identifier.
    ValueId,
    /// Free-text parameter identifier.
    TextParameterId,
    FormTypeId,
    LinkTypeId,
    /// Unit (lexical entry) identifier.
    UnitId,
    FormId,
    MeaningId,
    ExampleId,
    CommentId,
}

/// Per-table id allocator. Ids start at 1 and only grow, so id order is
/// creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sequence(u64);

impl Sequence {
    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Make sure future ids are strictly greater than `seen`.
    pub fn observe(&mut self, seen: u64) {
        self.0 = self.0.max(seen);
    }
}
