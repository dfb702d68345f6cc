//! In-memory storage for the knowledge base.
//!
//! This is the reference implementation of `GraphRead` and the only place
//! that mutates tables. Every table is an id-ordered `BTreeMap`; uniqueness
//! constraints are backed by keyword indexes kept next to the tables.
//!
//! ## Mutation rules
//!
//! - Attribute assignments and links go through [`constraint::validate`]
//!   before any state is touched. A rejected mutation leaves the graph as it
//!   was.
//! - Attach operations are set insertions and report whether anything
//!   changed.
//! - No transactions here: isolation is provided by `KnowledgeBase`, which
//!   hands out working copies of a `MemoryGraph`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use hashbrown::HashMap;
use tracing::debug;

use crate::constraint::{self, Mutation};
use crate::model::*;
use crate::{Error, Result};
use super::{GraphRead, GraphStats};

// ============================================================================
// Assignment addressing
// ============================================================================

/// Addresses one assignment: the holder plus the value or text parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentRef {
    Value(Holder, ValueId),
    Text(Holder, TextParameterId),
}

impl AssignmentRef {
    pub fn holder(&self) -> Holder {
        match self {
            AssignmentRef::Value(h, _) | AssignmentRef::Text(h, _) => *h,
        }
    }
}

impl fmt::Display for AssignmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentRef::Value(h, v) => write!(f, "assignment of value {v} to {h}"),
            AssignmentRef::Text(h, p) => write!(f, "assignment of text parameter {p} to {h}"),
        }
    }
}

// ============================================================================
// MemoryGraph
// ============================================================================

#[derive(Debug, Clone, Default)]
pub(crate) struct Sequences {
    pub semfield: Sequence,
    pub subfield: Sequence,
    pub source: Sequence,
    pub parameter: Sequence,
    pub value: Sequence,
    pub text_parameter: Sequence,
    pub form_type: Sequence,
    pub link_type: Sequence,
    pub unit: Sequence,
    pub form: Sequence,
    pub meaning: Sequence,
    pub example: Sequence,
    pub comment: Sequence,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Indexes {
    pub semfield: HashMap<String, SemfieldId>,
    pub subfield: HashMap<String, SubfieldId>,
    pub source: HashMap<String, SourceId>,
    pub parameter: HashMap<String, ParameterId>,
    /// parameter → value keyword → value
    pub value: HashMap<ParameterId, HashMap<String, ValueId>>,
    pub text_parameter: HashMap<String, TextParameterId>,
    pub form_type: HashMap<String, FormTypeId>,
    pub link_type: HashMap<String, LinkTypeId>,
    /// linker text → units (poor man's head-word index)
    pub linker: HashMap<String, BTreeSet<UnitId>>,
    /// text → oldest example with that text
    pub example_text: HashMap<String, ExampleId>,
    /// text → oldest comment with that text
    pub comment_text: HashMap<String, CommentId>,
}

/// In-memory knowledge base tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    pub(crate) semfields: BTreeMap<SemfieldId, Semfield>,
    pub(crate) subfields: BTreeMap<SubfieldId, Subfield>,
    pub(crate) sources: BTreeMap<SourceId, Source>,
    pub(crate) parameters: BTreeMap<ParameterId, Parameter>,
    pub(crate) values: BTreeMap<ValueId, ParameterValue>,
    pub(crate) text_parameters: BTreeMap<TextParameterId, TextParameter>,
    pub(crate) form_types: BTreeMap<FormTypeId, FormType>,
    pub(crate) link_types: BTreeMap<LinkTypeId, UnitLinkType>,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) forms: BTreeMap<FormId, Form>,
    pub(crate) meanings: BTreeMap<MeaningId, Meaning>,
    pub(crate) examples: BTreeMap<ExampleId, Example>,
    pub(crate) comments: BTreeMap<CommentId, Comment>,
    pub(crate) links: BTreeSet<UnitLink>,
    /// Set once bootstrap has declared every parameter.
    pub(crate) schema_sealed: bool,
    pub(crate) seq: Sequences,
    pub(crate) index: Indexes,
}

/// Fail if `keyword` is already taken in `index`.
pub(crate) fn ensure_free<K>(
    index: &HashMap<String, K>,
    kind: &'static str,
    keyword: &str,
) -> Result<()> {
    if index.contains_key(keyword) {
        return Err(Error::DuplicateKeyword { kind, keyword: keyword.to_string() });
    }
    Ok(())
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            semfields: self.semfields.len(),
            subfields: self.subfields.len(),
            sources: self.sources.len(),
            parameters: self.parameters.len(),
            values: self.values.len(),
            text_parameters: self.text_parameters.len(),
            form_types: self.form_types.len(),
            link_types: self.link_types.len(),
            units: self.units.len(),
            forms: self.forms.len(),
            meanings: self.meanings.len(),
            examples: self.examples.len(),
            comments: self.comments.len(),
            links: self.links.len(),
        }
    }

    // ========================================================================
    // Table iteration
    // ========================================================================

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn forms(&self) -> impl Iterator<Item = &Form> {
        self.forms.values()
    }

    pub fn meanings(&self) -> impl Iterator<Item = &Meaning> {
        self.meanings.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &UnitLink> {
        self.links.iter()
    }

    pub fn example(&self, id: ExampleId) -> Option<&Example> {
        self.examples.get(&id)
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.get(&id)
    }

    pub fn source(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(&id)
    }

    pub fn meaning(&self, id: MeaningId) -> Option<&Meaning> {
        self.meanings.get(&id)
    }

    // ========================================================================
    // Existence checks
    // ========================================================================

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Unit {id}")))
    }

    fn form_mut(&mut self, id: FormId) -> Result<&mut Form> {
        self.forms.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Form {id}")))
    }

    pub(crate) fn require<K: Ord, V>(table: &BTreeMap<K, V>, id: K, what: impl FnOnce() -> String) -> Result<()> {
        if table.contains_key(&id) { Ok(()) } else { Err(Error::NotFound(what())) }
    }

    fn assignments_mut(&mut self, holder: Holder) -> Result<&mut Assignments> {
        match holder {
            Holder::Unit(id) => Ok(&mut self.unit_mut(id)?.assignments),
            Holder::Form(id) => Ok(&mut self.form_mut(id)?.assignments),
        }
    }

    // ========================================================================
    // Sources, examples, comments
    // ========================================================================

    /// Create a source. Keywords are unique.
    pub fn create_source(&mut self, keyword: &str, biblio: &str) -> Result<SourceId> {
        ensure_free(&self.index.source, "source", keyword)?;
        let id = SourceId(self.seq.source.next());
        self.sources.insert(id, Source { id, biblio: biblio.to_string(), keyword: keyword.to_string() });
        self.index.source.insert(keyword.to_string(), id);
        Ok(id)
    }

    /// Always creates a new example, even if the text is already known.
    pub fn create_example(&mut self, text: impl Into<String>) -> ExampleId {
        let id = ExampleId(self.seq.example.next());
        let text = text.into();
        self.index.example_text.entry(text.clone()).or_insert(id);
        self.examples.insert(id, Example { id, text });
        id
    }

    /// Reuse the example with identical text, or create one.
    pub fn find_or_create_example(&mut self, text: &str) -> ExampleId {
        match self.find_example_by_text(text) {
            Some(id) => id,
            None => self.create_example(text),
        }
    }

    pub fn create_comment(&mut self, text: impl Into<String>, hidden: bool) -> CommentId {
        let id = CommentId(self.seq.comment.next());
        let text = text.into();
        self.index.comment_text.entry(text.clone()).or_insert(id);
        self.comments.insert(id, Comment { id, text, hidden });
        id
    }

    /// Reuse the comment with identical text (whatever its visibility), or
    /// create one with the given visibility.
    pub fn find_or_create_comment(&mut self, text: &str, hidden: bool) -> CommentId {
        match self.find_comment_by_text(text) {
            Some(id) => id,
            None => self.create_comment(text, hidden),
        }
    }

    // ========================================================================
    // Units
    // ========================================================================

    pub fn create_unit(&mut self, linker: impl Into<String>) -> UnitId {
        let id = UnitId(self.seq.unit.next());
        let unit = Unit::new(id, linker);
        self.index.linker.entry(unit.linker.clone()).or_default().insert(id);
        self.units.insert(id, unit);
        id
    }

    pub fn set_unit_semfield(&mut self, unit: UnitId, semfield: SemfieldId) -> Result<()> {
        Self::require(&self.semfields, semfield, || format!("Semfield {semfield}"))?;
        self.unit_mut(unit)?.semfield = Some(semfield);
        Ok(())
    }

    pub fn add_unit_extra_semfield(&mut self, unit: UnitId, semfield: SemfieldId) -> Result<bool> {
        Self::require(&self.semfields, semfield, || format!("Semfield {semfield}"))?;
        Ok(self.unit_mut(unit)?.extra_semfields.insert(semfield))
    }

    pub fn add_unit_subfield(&mut self, unit: UnitId, subfield: SubfieldId) -> Result<bool> {
        Self::require(&self.subfields, subfield, || format!("Subfield {subfield}"))?;
        Ok(self.unit_mut(unit)?.subfields.insert(subfield))
    }

    pub fn add_unit_source(&mut self, unit: UnitId, source: SourceId) -> Result<bool> {
        Self::require(&self.sources, source, || format!("Source {source}"))?;
        Ok(self.unit_mut(unit)?.sources.insert(source))
    }

    pub fn add_unit_example(&mut self, unit: UnitId, example: ExampleId) -> Result<bool> {
        Self::require(&self.examples, example, || format!("Example {example}"))?;
        Ok(self.unit_mut(unit)?.examples.insert(example))
    }

    pub fn add_unit_comment(&mut self, unit: UnitId, comment: CommentId) -> Result<bool> {
        Self::require(&self.comments, comment, || format!("Comment {comment}"))?;
        Ok(self.unit_mut(unit)?.comments.insert(comment))
    }

    /// Unconditional overwrite.
    pub fn set_sem_comment(&mut self, unit: UnitId, text: impl Into<String>) -> Result<()> {
        self.unit_mut(unit)?.sem_comment = Some(text.into());
        Ok(())
    }

    /// Unconditional overwrite.
    pub fn set_style(&mut self, unit: UnitId, text: impl Into<String>) -> Result<()> {
        self.unit_mut(unit)?.style = Some(text.into());
        Ok(())
    }

    /// Delete a unit together with everything it owns.
    ///
    /// Removes its forms, meanings, assignments, every link touching it, and
    /// comments that were only referenced from the removed assignments.
    /// Examples, sources and unit-level comments are shared and survive.
    pub fn delete_unit(&mut self, id: UnitId) -> Result<bool> {
        let Some(unit) = self.units.remove(&id) else { return Ok(false) };

        if let Some(set) = self.index.linker.get_mut(&unit.linker) {
            set.remove(&id);
            if set.is_empty() {
                self.index.linker.remove(&unit.linker);
            }
        }

        let mut orphans: BTreeSet<CommentId> = unit.assignments.comment_ids().collect();
        for form_id in &unit.forms {
            if let Some(form) = self.forms.remove(form_id) {
                orphans.extend(form.assignments.comment_ids());
            }
        }
        for meaning_id in &unit.meanings {
            self.meanings.remove(meaning_id);
        }
        self.links.retain(|l| l.source != id && l.target != id);

        if !orphans.is_empty() {
            let referenced = self.referenced_comments();
            for comment_id in orphans.difference(&referenced) {
                self.drop_comment(*comment_id);
            }
        }

        debug!(unit = %id, linker = %unit.linker, forms = unit.forms.len(), "deleted unit");
        Ok(true)
    }

    fn referenced_comments(&self) -> BTreeSet<CommentId> {
        let mut out = BTreeSet::new();
        for unit in self.units.values() {
            out.extend(unit.comments.iter().copied());
            out.extend(unit.assignments.comment_ids());
        }
        for form in self.forms.values() {
            out.extend(form.assignments.comment_ids());
        }
        out
    }

    fn drop_comment(&mut self, id: CommentId) {
        let Some(comment) = self.comments.remove(&id) else { return };
        if self.index.comment_text.get(&comment.text) == Some(&id) {
            self.index.comment_text.remove(&comment.text);
            if let Some(other) = self.comments.values().find(|c| c.text == comment.text) {
                self.index.comment_text.insert(comment.text, other.id);
            }
        }
    }

    // ========================================================================
    // Forms and meanings
    // ========================================================================

    pub fn create_form(
        &mut self,
        unit: UnitId,
        form_type: FormTypeId,
        text: impl Into<String>,
    ) -> Result<FormId> {
        Self::require(&self.form_types, form_type, || format!("FormType {form_type}"))?;
        Self::require(&self.units, unit, || format!("Unit {unit}"))?;

        let id = FormId(self.seq.form.next());
        self.forms.insert(id, Form {
            id,
            unit,
            form_type,
            text: text.into(),
            examples: BTreeSet::new(),
            assignments: Assignments::default(),
        });
        self.unit_mut(unit)?.forms.insert(id);
        Ok(id)
    }

    pub fn add_form_example(&mut self, form: FormId, example: ExampleId) -> Result<bool> {
        Self::require(&self.examples, example, || format!("Example {example}"))?;
        Ok(self.form_mut(form)?.examples.insert(example))
    }

    pub fn create_meaning(&mut self, unit: UnitId, source: SourceId, sense: Sense) -> Result<MeaningId> {
        Self::require(&self.sources, source, || format!("Source {source}"))?;
        Self::require(&self.units, unit, || format!("Unit {unit}"))?;

        let id = MeaningId(self.seq.meaning.next());
        self.meanings.insert(id, Meaning { id, unit, source, sense });
        self.unit_mut(unit)?.meanings.insert(id);
        Ok(id)
    }

    // ========================================================================
    // Attribute assignments (validated)
    // ========================================================================

    /// Assign a controlled value to a unit or form.
    pub fn assign_value(&mut self, holder: Holder, value: ValueId) -> Result<()> {
        constraint::validate(&*self, &Mutation::Value { holder, value, replacing: None })?;
        self.assignments_mut(holder)?.values.push(ValueAssignment::new(value));
        Ok(())
    }

    pub fn assign_unit_value(&mut self, unit: UnitId, value: ValueId) -> Result<()> {
        self.assign_value(Holder::Unit(unit), value)
    }

    pub fn assign_form_value(&mut self, form: FormId, value: ValueId) -> Result<()> {
        self.assign_value(Holder::Form(form), value)
    }

    /// Swap the value of an existing assignment, keeping its examples and
    /// comments. Validated as if `old` were already gone.
    pub fn reassign_value(&mut self, holder: Holder, old: ValueId, new: ValueId) -> Result<()> {
        constraint::validate(&*self, &Mutation::Value { holder, value: new, replacing: Some(old) })?;
        let assignment = self.assignments_mut(holder)?
            .value_mut(old)
            .ok_or_else(|| Error::NotFound(AssignmentRef::Value(holder, old).to_string()))?;
        assignment.value = new;
        Ok(())
    }

    /// Assign a free-text value.
    pub fn assign_text(
        &mut self,
        holder: Holder,
        parameter: TextParameterId,
        value: impl Into<String>,
    ) -> Result<()> {
        constraint::validate(&*self, &Mutation::Text { holder, parameter })?;
        self.assignments_mut(holder)?.texts.push(TextAssignment {
            parameter,
            value: value.into(),
            examples: BTreeSet::new(),
            comments: BTreeSet::new(),
        });
        Ok(())
    }

    fn assignment_sets(
        &mut self,
        target: AssignmentRef,
    ) -> Result<(&mut BTreeSet<ExampleId>, &mut BTreeSet<CommentId>)> {
        let assignments = self.assignments_mut(target.holder())?;
        let sets = match target {
            AssignmentRef::Value(_, v) => assignments.value_mut(v).map(|a| (&mut a.examples, &mut a.comments)),
            AssignmentRef::Text(_, p) => assignments.text_mut(p).map(|a| (&mut a.examples, &mut a.comments)),
        };
        sets.ok_or_else(|| Error::NotFound(target.to_string()))
    }

    /// Illustrate an existing assignment with an example.
    pub fn attach_example(&mut self, target: AssignmentRef, example: ExampleId) -> Result<bool> {
        Self::require(&self.examples, example, || format!("Example {example}"))?;
        let (examples, _) = self.assignment_sets(target)?;
        Ok(examples.insert(example))
    }

    /// Annotate an existing assignment with a comment.
    pub fn attach_comment(&mut self, target: AssignmentRef, comment: CommentId) -> Result<bool> {
        Self::require(&self.comments, comment, || format!("Comment {comment}"))?;
        let (_, comments) = self.assignment_sets(target)?;
        Ok(comments.insert(comment))
    }

    // ========================================================================
    // Links (validated)
    // ========================================================================

    pub fn add_unit_link(&mut self, source: UnitId, target: UnitId, link_type: LinkTypeId) -> Result<()> {
        let link = UnitLink { source, target, link_type };
        constraint::validate(&*self, &Mutation::Link(link))?;
        self.links.insert(link);
        Ok(())
    }

    /// Outgoing links of a unit, ordered by target.
    pub fn links_from(&self, source: UnitId) -> Vec<UnitLink> {
        let lo = UnitLink { source, target: UnitId(0), link_type: LinkTypeId(0) };
        self.links.range(lo..).take_while(|l| l.source == source).copied().collect()
    }

    // ========================================================================
    // Index maintenance
    // ========================================================================

    /// Rebuild every index from the tables, enforcing the uniqueness
    /// constraints and advancing id sequences past existing rows.
    pub(crate) fn rebuild_indexes(&mut self) -> Result<()> {
        let mut index = Indexes::default();

        for s in self.semfields.values() {
            ensure_free(&index.semfield, "semfield", &s.keyword)?;
            index.semfield.insert(s.keyword.clone(), s.id);
            self.seq.semfield.observe(s.id.0);
        }
        for s in self.subfields.values() {
            ensure_free(&index.subfield, "subfield", &s.keyword)?;
            index.subfield.insert(s.keyword.clone(), s.id);
            self.seq.subfield.observe(s.id.0);
        }
        for s in self.sources.values() {
            ensure_free(&index.source, "source", &s.keyword)?;
            index.source.insert(s.keyword.clone(), s.id);
            self.seq.source.observe(s.id.0);
        }
        for p in self.parameters.values() {
            ensure_free(&index.parameter, "parameter", &p.keyword)?;
            index.parameter.insert(p.keyword.clone(), p.id);
            self.seq.parameter.observe(p.id.0);
        }
        for v in self.values.values() {
            let scoped = index.value.entry(v.parameter).or_default();
            if scoped.contains_key(&v.keyword) {
                let parameter = self.parameters.get(&v.parameter)
                    .map(|p| p.keyword.clone())
                    .unwrap_or_else(|| v.parameter.to_string());
                return Err(Error::DuplicateValueKeyword { parameter, keyword: v.keyword.clone() });
            }
            scoped.insert(v.keyword.clone(), v.id);
            self.seq.value.observe(v.id.0);
        }
        for t in self.text_parameters.values() {
            ensure_free(&index.text_parameter, "text parameter", &t.keyword)?;
            index.text_parameter.insert(t.keyword.clone(), t.id);
            self.seq.text_parameter.observe(t.id.0);
        }
        for t in self.form_types.values() {
            ensure_free(&index.form_type, "form type", &t.keyword)?;
            index.form_type.insert(t.keyword.clone(), t.id);
            self.seq.form_type.observe(t.id.0);
        }
        for t in self.link_types.values() {
            ensure_free(&index.link_type, "link type", &t.keyword)?;
            index.link_type.insert(t.keyword.clone(), t.id);
            self.seq.link_type.observe(t.id.0);
        }
        for u in self.units.values() {
            index.linker.entry(u.linker.clone()).or_default().insert(u.id);
            self.seq.unit.observe(u.id.0);
        }
        for e in self.examples.values() {
            index.example_text.entry(e.text.clone()).or_insert(e.id);
            self.seq.example.observe(e.id.0);
        }
        for c in self.comments.values() {
            index.comment_text.entry(c.text.clone()).or_insert(c.id);
            self.seq.comment.observe(c.id.0);
        }
        if let Some(id) = self.forms.keys().next_back() {
            self.seq.form.observe(id.0);
        }
        if let Some(id) = self.meanings.keys().next_back() {
            self.seq.meaning.observe(id.0);
        }

        self.index = index;
        Ok(())
    }

    /// Re-insert every assignment and link through the validated entry
    /// points, in stored order. For tables loaded without going through
    /// them; the first rejected mutation is returned.
    pub(crate) fn revalidate(&mut self) -> Result<()> {
        let mut pending: Vec<(Holder, Assignments)> = Vec::new();
        for unit in self.units.values_mut() {
            pending.push((Holder::Unit(unit.id), std::mem::take(&mut unit.assignments)));
        }
        for form in self.forms.values_mut() {
            pending.push((Holder::Form(form.id), std::mem::take(&mut form.assignments)));
        }
        let links = std::mem::take(&mut self.links);

        for (holder, assignments) in pending {
            for assignment in assignments.values {
                self.assign_value(holder, assignment.value)?;
                let target = AssignmentRef::Value(holder, assignment.value);
                for example in assignment.examples {
                    self.attach_example(target, example)?;
                }
                for comment in assignment.comments {
                    self.attach_comment(target, comment)?;
                }
            }
            for assignment in assignments.texts {
                self.assign_text(holder, assignment.parameter, assignment.value)?;
                let target = AssignmentRef::Text(holder, assignment.parameter);
                for example in assignment.examples {
                    self.attach_example(target, example)?;
                }
                for comment in assignment.comments {
                    self.attach_comment(target, comment)?;
                }
            }
        }
        for link in links {
            self.add_unit_link(link.source, link.target, link.link_type)?;
        }
        Ok(())
    }
}

// ============================================================================
// GraphRead impl
// ============================================================================

impl GraphRead for MemoryGraph {
    fn unit(&self, id: UnitId) -> Option<&Unit> { self.units.get(&id) }
    fn form(&self, id: FormId) -> Option<&Form> { self.forms.get(&id) }
    fn form_type(&self, id: FormTypeId) -> Option<&FormType> { self.form_types.get(&id) }
    fn parameter(&self, id: ParameterId) -> Option<&Parameter> { self.parameters.get(&id) }
    fn value(&self, id: ValueId) -> Option<&ParameterValue> { self.values.get(&id) }
    fn text_parameter(&self, id: TextParameterId) -> Option<&TextParameter> { self.text_parameters.get(&id) }
    fn link_type(&self, id: LinkTypeId) -> Option<&UnitLinkType> { self.link_types.get(&id) }
    fn semfield(&self, id: SemfieldId) -> Option<&Semfield> { self.semfields.get(&id) }
    fn subfield(&self, id: SubfieldId) -> Option<&Subfield> { self.subfields.get(&id) }

    fn semfield_by_keyword(&self, keyword: &str) -> Option<SemfieldId> {
        self.index.semfield.get(keyword).copied()
    }

    fn subfield_by_keyword(&self, keyword: &str) -> Option<SubfieldId> {
        self.index.subfield.get(keyword).copied()
    }

    fn source_by_keyword(&self, keyword: &str) -> Option<SourceId> {
        self.index.source.get(keyword).copied()
    }

    fn parameter_by_keyword(&self, keyword: &str) -> Option<ParameterId> {
        self.index.parameter.get(keyword).copied()
    }

    fn value_by_keyword(&self, parameter: ParameterId, keyword: &str) -> Option<ValueId> {
        self.index.value.get(&parameter).and_then(|m| m.get(keyword)).copied()
    }

    fn text_parameter_by_keyword(&self, keyword: &str) -> Option<TextParameterId> {
        self.index.text_parameter.get(keyword).copied()
    }

    fn form_type_by_keyword(&self, keyword: &str) -> Option<FormTypeId> {
        self.index.form_type.get(keyword).copied()
    }

    fn link_type_by_keyword(&self, keyword: &str) -> Option<LinkTypeId> {
        self.index.link_type.get(keyword).copied()
    }

    fn find_units_by_linker(&self, text: &str) -> Vec<UnitId> {
        self.index.linker.get(text)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    fn find_units_by_semfield(&self, semfield: SemfieldId) -> Vec<UnitId> {
        // Full scan: no semfield index is maintained.
        self.units.values()
            .filter(|u| u.semfield == Some(semfield))
            .map(|u| u.id)
            .collect()
    }

    fn find_units_by_subfield(&self, subfield: SubfieldId) -> Vec<UnitId> {
        self.units.values()
            .filter(|u| u.has_subfield(subfield))
            .map(|u| u.id)
            .collect()
    }

    fn find_example_by_text(&self, text: &str) -> Option<ExampleId> {
        self.index.example_text.get(text).copied()
    }

    fn find_comment_by_text(&self, text: &str) -> Option<CommentId> {
        self.index.comment_text.get(text).copied()
    }

    fn has_link(&self, source: UnitId, target: UnitId) -> bool {
        let lo = UnitLink { source, target, link_type: LinkTypeId(0) };
        let hi = UnitLink { source, target, link_type: LinkTypeId(u64::MAX) };
        self.links.range(lo..=hi).next().is_some()
    }

    fn has_typed_link(&self, link: &UnitLink) -> bool {
        self.links.contains(link)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParameterSpec;

    fn graph_with_types() -> (MemoryGraph, FormTypeId, LinkTypeId) {
        let mut g = MemoryGraph::new();
        let correl = g.declare_form_type("correl", "коррелят").unwrap();
        let hyperlink = g.declare_link_type("hyperlink", "перекрёстная ссылка").unwrap();
        (g, correl, hyperlink)
    }

    #[test]
    fn test_create_and_find_unit_by_linker() {
        let mut g = MemoryGraph::new();
        let a = g.create_unit("а");
        let b = g.create_unit("но");
        let a2 = g.create_unit("а");

        assert_eq!(g.find_units_by_linker("а"), vec![a, a2]);
        assert_eq!(g.find_units_by_linker("но"), vec![b]);
        assert!(g.find_units_by_linker("или").is_empty());
        assert!(g.unit(a).unwrap().status);
    }

    #[test]
    fn test_find_units_by_semfield_and_subfield() {
        let mut g = MemoryGraph::new();
        let contrast = g.get_or_create_semfield("contrast");
        let cause = g.get_or_create_semfield("cause");
        let sub = g.get_or_create_subfield("concession", contrast).unwrap();

        let a = g.create_unit("а");
        let b = g.create_unit("хотя");
        let c = g.create_unit("потому что");
        g.set_unit_semfield(a, contrast).unwrap();
        g.set_unit_semfield(b, contrast).unwrap();
        g.set_unit_semfield(c, cause).unwrap();
        g.add_unit_subfield(b, sub).unwrap();

        assert_eq!(g.find_units_by_semfield(contrast), vec![a, b]);
        assert_eq!(g.find_units_by_subfield(sub), vec![b]);
    }

    #[test]
    fn test_example_reuse_by_text() {
        let mut g = MemoryGraph::new();
        let first = g.create_example("Он пришёл, а она ушла.");
        let second = g.create_example("Он пришёл, а она ушла.");
        assert_ne!(first, second);

        assert_eq!(g.find_example_by_text("Он пришёл, а она ушла."), Some(first));
        assert_eq!(g.find_or_create_example("Он пришёл, а она ушла."), first);

        let fresh = g.find_or_create_example("Другой пример.");
        assert_eq!(g.example(fresh).unwrap().text, "Другой пример.");
        assert_eq!(g.stats().examples, 3);
    }

    #[test]
    fn test_comment_reuse_keeps_original_visibility() {
        let mut g = MemoryGraph::new();
        let hidden = g.create_comment("уточнить", true);
        let reused = g.find_or_create_comment("уточнить", false);
        assert_eq!(hidden, reused);
        assert!(g.comment(reused).unwrap().hidden);
    }

    #[test]
    fn test_form_requires_unit_and_type() {
        let (mut g, correl, _) = graph_with_types();
        let unit = g.create_unit("если");

        assert!(matches!(g.create_form(UnitId(99), correl, "то"), Err(Error::NotFound(_))));
        assert!(matches!(g.create_form(unit, FormTypeId(99), "то"), Err(Error::NotFound(_))));

        let form = g.create_form(unit, correl, "то").unwrap();
        assert_eq!(g.form_texts(unit, correl), vec!["то"]);
        assert_eq!(g.form(form).unwrap().unit, unit);
    }

    #[test]
    fn test_duplicate_source_keyword() {
        let mut g = MemoryGraph::new();
        g.create_source("ИМК", "ИМК").unwrap();
        let err = g.create_source("ИМК", "другой").unwrap_err();
        assert!(matches!(err, Error::DuplicateKeyword { kind: "source", .. }));
    }

    #[test]
    fn test_has_link_ignores_type() {
        let (mut g, _, hyperlink) = graph_with_types();
        let see_also = g.declare_link_type("see_also", "см. также").unwrap();
        let a = g.create_unit("а");
        let b = g.create_unit("но");

        assert!(!g.has_link(a, b));
        g.add_unit_link(a, b, hyperlink).unwrap();
        assert!(g.has_link(a, b));
        assert!(!g.has_link(b, a));
        assert!(!g.has_typed_link(&UnitLink { source: a, target: b, link_type: see_also }));
        assert_eq!(g.links_from(a).len(), 1);
    }

    #[test]
    fn test_delete_unit_cascades() {
        let (mut g, correl, hyperlink) = graph_with_types();
        let position = g.declare_parameter(ParameterSpec::form("correl.position", "позиция коррелята")).unwrap();
        let initial = g.declare_value(position, "initial", "initial").unwrap();
        g.restrict_to_form_type(position, correl).unwrap();
        let source = g.create_source("ИМК", "ИМК").unwrap();

        let unit = g.create_unit("если");
        let other = g.create_unit("когда");
        let form = g.create_form(unit, correl, "то").unwrap();
        g.assign_form_value(form, initial).unwrap();
        let note = g.create_comment("позиция спорная", true);
        g.attach_comment(AssignmentRef::Value(Holder::Form(form), initial), note).unwrap();
        let shared = g.create_example("Если придёшь, то увидишь.");
        g.add_unit_example(unit, shared).unwrap();
        g.create_meaning(unit, source, Sense::default()).unwrap();
        g.add_unit_link(other, unit, hyperlink).unwrap();

        assert!(g.delete_unit(unit).unwrap());
        assert!(!g.delete_unit(unit).unwrap());

        let stats = g.stats();
        assert_eq!(stats.units, 1);
        assert_eq!(stats.forms, 0);
        assert_eq!(stats.meanings, 0);
        assert_eq!(stats.links, 0);
        assert_eq!(stats.comments, 0, "assignment-only comment is dropped");
        assert_eq!(stats.examples, 1, "shared example survives");
        assert_eq!(stats.sources, 1);
        assert!(g.find_units_by_linker("если").is_empty());
        assert_eq!(g.find_comment_by_text("позиция спорная"), None);
    }

    #[test]
    fn test_rebuild_indexes_rejects_duplicate_keywords() {
        let mut g = MemoryGraph::new();
        let id = g.get_or_create_semfield("contrast");
        let mut clone = g.semfields[&id].clone();
        clone.id = SemfieldId(42);
        g.semfields.insert(clone.id, clone);

        let err = g.rebuild_indexes().unwrap_err();
        assert!(matches!(err, Error::DuplicateKeyword { kind: "semfield", .. }));
    }

    #[test]
    fn test_rebuild_indexes_advances_sequences() {
        let mut g = MemoryGraph::new();
        g.units.insert(UnitId(10), Unit::new(UnitId(10), "а"));
        g.rebuild_indexes().unwrap();

        assert_eq!(g.find_units_by_linker("а"), vec![UnitId(10)]);
        assert_eq!(g.create_unit("но"), UnitId(11));
    }
}
