//! # Constraint Engine
//!
//! Validates a prospective attribute assignment or link insertion against the
//! schema before it becomes visible. Storage calls [`validate`] from every
//! mutating entry point; nothing is deferred to commit time.
//!
//! Rules checked for a value assignment, in order:
//!
//! 1. the holder and the value (and its parameter) exist;
//! 2. the `(holder, value)` pair is not already assigned;
//! 3. the parameter's target matches the holder kind;
//! 4. a single-valued parameter has no other value on the holder;
//! 5. a form holder's form type declares the parameter.
//!
//! Keyword uniqueness of parameters and values is enforced at declaration
//! time by [`crate::schema`].

use thiserror::Error;

use crate::model::*;
use crate::storage::GraphRead;

// ============================================================================
// Mutations
// ============================================================================

/// A mutation the engine can judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Assign `value` to `holder`. With `replacing`, the existing assignment
    /// of that value is swapped for `value` (update path).
    Value { holder: Holder, value: ValueId, replacing: Option<ValueId> },
    /// Assign a free-text value of `parameter` to `holder`.
    Text { holder: Holder, parameter: TextParameterId },
    /// Insert a typed unit-to-unit edge.
    Link(UnitLink),
}

// ============================================================================
// Violations
// ============================================================================

/// Why a mutation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{0} does not exist")]
    MissingEntity(String),

    #[error("parameter '{parameter}' classifies {expected}s, not {found}s")]
    TargetMismatch { parameter: String, expected: Target, found: Target },

    #[error("{holder} already holds value '{existing}' of single-valued parameter '{parameter}'; cannot add '{attempted}'")]
    SingleValueExceeded {
        holder: Holder,
        parameter: String,
        existing: String,
        attempted: String,
    },

    #[error("form type '{form_type}' does not accept parameter '{parameter}'")]
    FormTypeNotPermitted { parameter: String, form_type: String },

    #[error("{holder} already holds '{what}'")]
    DuplicateAssignment { holder: Holder, what: String },

    #[error("link {from} -> {to} of type '{link_type}' already exists")]
    DuplicateLink { from: UnitId, to: UnitId, link_type: String },
}

/// A rejected mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ConstraintViolation {
    pub reason: Violation,
}

impl From<Violation> for ConstraintViolation {
    fn from(reason: Violation) -> Self {
        Self { reason }
    }
}

type Check = std::result::Result<(), ConstraintViolation>;

// ============================================================================
// Entry point
// ============================================================================

/// Validate `mutation` against the current state of `graph`.
pub fn validate<G: GraphRead + ?Sized>(graph: &G, mutation: &Mutation) -> Check {
    match *mutation {
        Mutation::Value { holder, value, replacing } => check_value(graph, holder, value, replacing),
        Mutation::Text { holder, parameter } => check_text(graph, holder, parameter),
        Mutation::Link(link) => check_link(graph, &link),
    }
}

// ============================================================================
// Value assignments
// ============================================================================

fn check_value<G: GraphRead + ?Sized>(
    graph: &G,
    holder: Holder,
    value: ValueId,
    replacing: Option<ValueId>,
) -> Check {
    let pv = graph.value(value)
        .ok_or_else(|| Violation::MissingEntity(format!("value {value}")))?;
    let parameter = graph.parameter(pv.parameter)
        .ok_or_else(|| Violation::MissingEntity(format!("parameter {}", pv.parameter)))?;
    let assignments = graph.assignments(holder)
        .ok_or_else(|| Violation::MissingEntity(holder.to_string()))?;

    if let Some(old) = replacing {
        if !assignments.holds(old) {
            return Err(Violation::MissingEntity(format!("assignment of value {old} to {holder}")).into());
        }
    }
    if assignments.holds(value) && replacing != Some(value) {
        return Err(Violation::DuplicateAssignment {
            holder,
            what: format!("{}={}", parameter.keyword, pv.keyword),
        }.into());
    }

    check_target(&parameter.keyword, parameter.target, holder)?;

    if parameter.singleval {
        check_single_value(graph, holder, assignments, parameter, pv, replacing)?;
    }

    if let Holder::Form(form_id) = holder {
        check_form_type(graph, form_id, parameter)?;
    }
    Ok(())
}

/// Invariant: the parameter's target is the holder's kind.
pub fn check_target(parameter: &str, target: Target, holder: Holder) -> Check {
    if target != holder.kind() {
        return Err(Violation::TargetMismatch {
            parameter: parameter.to_string(),
            expected: target,
            found: holder.kind(),
        }.into());
    }
    Ok(())
}

/// Invariant: at most one value of a single-valued parameter per holder.
fn check_single_value<G: GraphRead + ?Sized>(
    graph: &G,
    holder: Holder,
    assignments: &Assignments,
    parameter: &Parameter,
    attempted: &ParameterValue,
    replacing: Option<ValueId>,
) -> Check {
    let clash = assignments.value_ids()
        .filter(|v| Some(*v) != replacing && *v != attempted.id)
        .filter_map(|v| graph.value(v))
        .find(|v| v.parameter == parameter.id);

    match clash {
        Some(existing) => Err(Violation::SingleValueExceeded {
            holder,
            parameter: parameter.keyword.clone(),
            existing: existing.keyword.clone(),
            attempted: attempted.keyword.clone(),
        }.into()),
        None => Ok(()),
    }
}

/// Invariant: a form value's parameter is declared by the form's type.
fn check_form_type<G: GraphRead + ?Sized>(graph: &G, form: FormId, parameter: &Parameter) -> Check {
    let form = graph.form(form)
        .ok_or_else(|| Violation::MissingEntity(format!("form {form}")))?;
    let form_type = graph.form_type(form.form_type)
        .ok_or_else(|| Violation::MissingEntity(format!("form type {}", form.form_type)))?;

    if !form_type.permits(parameter.id) {
        return Err(Violation::FormTypeNotPermitted {
            parameter: parameter.keyword.clone(),
            form_type: form_type.keyword.clone(),
        }.into());
    }
    Ok(())
}

// ============================================================================
// Text assignments
// ============================================================================

fn check_text<G: GraphRead + ?Sized>(graph: &G, holder: Holder, parameter: TextParameterId) -> Check {
    let tp = graph.text_parameter(parameter)
        .ok_or_else(|| Violation::MissingEntity(format!("text parameter {parameter}")))?;
    let assignments = graph.assignments(holder)
        .ok_or_else(|| Violation::MissingEntity(holder.to_string()))?;

    if assignments.text(parameter).is_some() {
        return Err(Violation::DuplicateAssignment { holder, what: tp.keyword.clone() }.into());
    }
    check_target(&tp.keyword, tp.target, holder)
}

// ============================================================================
// Links
// ============================================================================

fn check_link<G: GraphRead + ?Sized>(graph: &G, link: &UnitLink) -> Check {
    for unit in [link.source, link.target] {
        if graph.unit(unit).is_none() {
            return Err(Violation::MissingEntity(format!("unit {unit}")).into());
        }
    }
    let link_type = graph.link_type(link.link_type)
        .ok_or_else(|| Violation::MissingEntity(format!("link type {}", link.link_type)))?;

    if graph.has_typed_link(link) {
        return Err(Violation::DuplicateLink {
            from: link.source,
            to: link.target,
            link_type: link_type.keyword.clone(),
        }.into());
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
