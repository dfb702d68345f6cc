//! Entity graph records: units, forms, meanings and what hangs off them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use super::*;

/// Bibliographic record cited by units and meanings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub biblio: String,
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub id: ExampleId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    /// Internal note, not shown to dictionary users.
    pub hidden: bool,
}

/// A controlled value held by a unit or form, with its illustrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueAssignment {
    pub value: ValueId,
    pub examples: BTreeSet<ExampleId>,
    pub comments: BTreeSet<CommentId>,
}

impl ValueAssignment {
    pub fn new(value: ValueId) -> Self {
        Self { value, examples: BTreeSet::new(), comments: BTreeSet::new() }
    }
}

/// A free-text value held by a unit or form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAssignment {
    pub parameter: TextParameterId,
    pub value: String,
    pub examples: BTreeSet<ExampleId>,
    pub comments: BTreeSet<CommentId>,
}

/// The attribute assignments owned by one entity.
///
/// At most one assignment per value and one per text parameter; the
/// remaining rules live in [`crate::constraint`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignments {
    pub values: Vec<ValueAssignment>,
    pub texts: Vec<TextAssignment>,
}

impl Assignments {
    pub fn value(&self, value: ValueId) -> Option<&ValueAssignment> {
        self.values.iter().find(|a| a.value == value)
    }

    pub fn value_mut(&mut self, value: ValueId) -> Option<&mut ValueAssignment> {
        self.values.iter_mut().find(|a| a.value == value)
    }

    pub fn holds(&self, value: ValueId) -> bool {
        self.value(value).is_some()
    }

    pub fn text(&self, parameter: TextParameterId) -> Option<&TextAssignment> {
        self.texts.iter().find(|a| a.parameter == parameter)
    }

    pub fn text_mut(&mut self, parameter: TextParameterId) -> Option<&mut TextAssignment> {
        self.texts.iter_mut().find(|a| a.parameter == parameter)
    }

    pub fn value_ids(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.values.iter().map(|a| a.value)
    }

    /// Every comment referenced by any assignment.
    pub fn comment_ids(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.values.iter().flat_map(|a| a.comments.iter().copied())
            .chain(self.texts.iter().flat_map(|a| a.comments.iter().copied()))
    }
}

/// A catalogued connective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Head word. Not stored as a [`Form`].
    pub linker: String,
    /// Shown in dictionary search.
    pub status: bool,
    pub style: Option<String>,
    pub sem_comment: Option<String>,
    pub semfield: Option<SemfieldId>,
    pub extra_semfields: BTreeSet<SemfieldId>,
    pub subfields: BTreeSet<SubfieldId>,
    pub sources: BTreeSet<SourceId>,
    pub examples: BTreeSet<ExampleId>,
    pub comments: BTreeSet<CommentId>,
    pub forms: BTreeSet<FormId>,
    pub meanings: BTreeSet<MeaningId>,
    pub assignments: Assignments,
}

impl Unit {
    pub fn new(id: UnitId, linker: impl Into<String>) -> Self {
        Self {
            id,
            linker: linker.into(),
            status: true,
            style: None,
            sem_comment: None,
            semfield: None,
            extra_semfields: BTreeSet::new(),
            subfields: BTreeSet::new(),
            sources: BTreeSet::new(),
            examples: BTreeSet::new(),
            comments: BTreeSet::new(),
            forms: BTreeSet::new(),
            meanings: BTreeSet::new(),
            assignments: Assignments::default(),
        }
    }

    pub fn has_subfield(&self, subfield: SubfieldId) -> bool {
        self.subfields.contains(&subfield)
    }
}

/// A textual variant of a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub unit: UnitId,
    pub form_type: FormTypeId,
    pub text: String,
    pub examples: BTreeSet<ExampleId>,
    pub assignments: Assignments,
}

/// Field values of a dictionary sense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    pub meaning: String,
    pub pos: String,
    pub pos_type: String,
    pub other_senses: String,
    pub other_pos: String,
}

/// One dictionary sense of a unit, attributed to a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meaning {
    pub id: MeaningId,
    pub unit: UnitId,
    pub source: SourceId,
    pub sense: Sense,
}

/// Directed typed edge between two units.
///
/// Field order gives the `(source, target, link_type)` ordering used by
/// range scans in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitLink {
    pub source: UnitId,
    pub target: UnitId,
    pub link_type: LinkTypeId,
}

/// An entity that can carry attribute assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Holder {
    Unit(UnitId),
    Form(FormId),
}

impl Holder {
    pub fn kind(&self) -> Target {
        match self {
            Holder::Unit(_) => Target::Unit,
            Holder::Form(_) => Target::Form,
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Unit(id) => write!(f, "unit {id}"),
            Holder::Form(id) => write!(f, "form {id}"),
        }
    }
}
