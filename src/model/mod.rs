//! # Knowledge Base Model
//!
//! Plain records for every table of the knowledge base. These types cross
//! every boundary: storage ↔ constraint engine ↔ import ↔ snapshot.
//!
//! Design rule: no I/O, no state, no validation here. Relations are held as
//! ordered id sets so that every traversal is deterministic.

pub mod ids;
pub mod taxonomy;
pub mod schema;
pub mod entity;

pub use ids::{
    SemfieldId, SubfieldId, SourceId, ParameterId, ValueId, TextParameterId,
    FormTypeId, LinkTypeId, UnitId, FormId, MeaningId, ExampleId, CommentId,
    Sequence,
};
pub use taxonomy::{Semfield, Subfield, TaxonomyEntry};
pub use schema::{
    Target, Parameter, ParameterValue, TextParameter, FormType, UnitLinkType,
    DEFAULT_DESCRIPTION,
};
pub use entity::{
    Source, Example, Comment, Unit, Form, Meaning, Sense, UnitLink,
    ValueAssignment, TextAssignment, Assignments, Holder,
};
