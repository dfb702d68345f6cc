//! Secondary ("data") dataset: enrich the matched primary units.
//!
//! Each row is handled in two steps. [`plan_row`] does every lookup and
//! every check that can fail and produces a [`MergePlan`]; [`apply_plan`]
//! then performs the mutations. A row that fails planning leaves the graph
//! untouched. A plan that fails to apply means the graph changed under it
//! and aborts the phase.

use smallvec::SmallVec;
use tracing::{debug, info};

use crate::config::ImportConfig;
use crate::model::*;
use crate::storage::{GraphRead, MemoryGraph};
use crate::table::{present, Record, Table};
use crate::{Error, Result};
use super::catalog::{ImportContext, LINK_HYPERLINK};
use super::resolve::{resolve_link_target, resolve_unit, Resolution};
use super::{columns, DiagnosticKind, ImportReport, Phase};

// ============================================================================
// Plan
// ============================================================================

/// Everything one secondary row will do to the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub unit: UnitId,
    /// The row's primary semantic field.
    pub field: SemfieldId,
    /// Phonetic variants to add, already deduplicated.
    pub phonvars: Vec<String>,
    pub link: Option<UnitLink>,
    pub sem_comment: Option<String>,
    pub style: Option<String>,
    pub example: Option<String>,
    pub extra_semfield: Option<String>,
    /// Owned by `extra_semfield` if set, else by `field`.
    pub extra_subfields: Vec<String>,
    pub inside_info: Option<String>,
    pub source: SourceId,
    pub sense: Sense,
}

/// A row that could not be planned, and the column to blame.
#[derive(Debug)]
pub struct Rejected {
    pub field: &'static str,
    pub error: Error,
}

fn reject(field: &'static str, error: Error) -> Rejected {
    Rejected { field, error }
}

/// Rows pass when `Non-connector` is absent or carries the merge marker.
pub fn passes_filter(row: &Record, marker: &str) -> bool {
    row.present(columns::NON_CONNECTOR).is_none_or(|v| v == marker)
}

/// The text a row is matched on: `edit form`, else `form`.
pub fn search_text(row: &Record) -> Option<&str> {
    row.present(columns::EDIT_FORM).or_else(|| row.present(columns::FORM))
}

/// Secondary sub-field cell: split on `,` or `;`.
fn split_subfields(cell: &str) -> SmallVec<[&str; 4]> {
    cell.split([',', ';']).filter_map(present).collect()
}

/// Resolve the row's unit and plan its enrichment.
///
/// Non-fatal data problems (an unresolvable cross-reference) are reported
/// and left out of the plan.
pub fn plan_row(
    graph: &MemoryGraph,
    ctx: &ImportContext,
    hyperlink: LinkTypeId,
    row: &Record,
    report: &mut ImportReport,
) -> std::result::Result<MergePlan, Rejected> {
    let field_keyword = row.get(columns::SEMFIELD).trim();
    let field = present(field_keyword)
        .and_then(|keyword| graph.semfield_by_keyword(keyword))
        .ok_or_else(|| reject(columns::SEMFIELD, Error::ReferenceMissing {
            kind: "semfield",
            keyword: field_keyword.to_string(),
        }))?;

    let mut subfields: Vec<SubfieldId> = Vec::new();
    for keyword in row.tokens(columns::SUBFIELD) {
        if let Some(id) = graph.subfield_by_keyword(keyword) {
            if !subfields.contains(&id) {
                subfields.push(id);
            }
        }
    }

    let text = search_text(row).ok_or_else(|| reject(columns::FORM, Error::ReferenceMissing {
        kind: "unit",
        keyword: String::new(),
    }))?;
    let unit = resolve_unit(graph, text, field, &subfields)
        .into_result(text)
        .map_err(|e| reject(columns::FORM, e))?;

    let source = match row.present(columns::DICT) {
        Some(keyword) => graph.source_by_keyword(keyword)
            .ok_or_else(|| reject(columns::DICT, Error::ReferenceMissing {
                kind: "source",
                keyword: keyword.to_string(),
            }))?,
        None => ctx.fallback_source,
    };

    let mut phonvars: Vec<String> = Vec::new();
    let existing = graph.form_texts(unit, ctx.phonvar);
    let mut add_phonvar = |candidate: &str| {
        if !existing.iter().any(|e| *e == candidate) && !phonvars.iter().any(|p| p == candidate) {
            phonvars.push(candidate.to_string());
        }
    };
    if row.present(columns::EDIT_FORM).is_some() {
        if let Some(raw) = row.present(columns::FORM) {
            add_phonvar(raw);
        }
    }
    if let Some(variant) = row.present(columns::PHONVAR) {
        add_phonvar(variant);
    }

    let link = plan_link(graph, unit, field, hyperlink, row, text, report);

    let owned = |column: &str| row.present(column).map(str::to_string);
    Ok(MergePlan {
        unit,
        field,
        phonvars,
        link,
        sem_comment: owned(columns::SEM_COMMENT),
        style: owned(columns::STYLE),
        example: owned(columns::EXAMPLE),
        extra_semfield: owned(columns::SEMFIELD2),
        extra_subfields: split_subfields(row.get(columns::SUBFIELD2)).into_iter().map(str::to_string).collect(),
        inside_info: owned(columns::INSIDE_INFO),
        source,
        sense: Sense {
            meaning: owned(columns::MEANING).unwrap_or_default(),
            pos: owned(columns::POS).unwrap_or_default(),
            pos_type: owned(columns::POS_TYPE).unwrap_or_default(),
            other_senses: owned(columns::OTHER_SENSES).unwrap_or_default(),
            other_pos: owned(columns::OTHER_POS).unwrap_or_default(),
        },
    })
}

/// The cross-reference edge, if the target resolves and the unit has no
/// edge to it yet.
fn plan_link(
    graph: &MemoryGraph,
    unit: UnitId,
    field: SemfieldId,
    hyperlink: LinkTypeId,
    row: &Record,
    linker: &str,
    report: &mut ImportReport,
) -> Option<UnitLink> {
    let reference = row.present(columns::HYPERLINK)?;
    let (kind, message) = match resolve_link_target(graph, reference, field) {
        Resolution::Unique(target) => {
            if graph.has_link(unit, target) {
                debug!(row = row.line(), %unit, %target, "link already present");
                return None;
            }
            return Some(UnitLink { source: unit, target, link_type: hyperlink });
        }
        Resolution::Missing(_) => (
            DiagnosticKind::ReferenceMissing,
            format!("referenced unit '{reference}' not found"),
        ),
        Resolution::Ambiguous(candidates) => (
            DiagnosticKind::AmbiguousMatch,
            format!("referenced unit '{reference}' matches {} units", candidates.len()),
        ),
    };
    report.warn(Phase::Secondary, row.line(), linker, columns::HYPERLINK, kind, message);
    None
}

// ============================================================================
// Apply
// ============================================================================

/// Perform a plan. Every lookup it needs was done by [`plan_row`].
///
/// A plan from [`plan_row`] against the same graph cannot be rejected by
/// the constraint engine: the only validated mutation here is the link, and
/// it is planned only when no edge between the two units exists. Any error
/// is therefore not row-scoped and aborts the phase.
pub fn apply_plan(graph: &mut MemoryGraph, ctx: &ImportContext, plan: MergePlan) -> Result<()> {
    let unit = plan.unit;

    for text in plan.phonvars {
        graph.create_form(unit, ctx.phonvar, text)?;
    }
    if let Some(link) = plan.link {
        graph.add_unit_link(link.source, link.target, link.link_type)?;
    }

    if let Some(text) = &plan.sem_comment {
        graph.set_sem_comment(unit, text.as_str())?;
    }
    if let Some(text) = plan.style {
        graph.set_style(unit, text)?;
    }
    if let Some(text) = &plan.example {
        let example = graph.find_or_create_example(text);
        graph.add_unit_example(unit, example)?;
    }

    let mut owner = plan.field;
    if let Some(keyword) = &plan.extra_semfield {
        owner = graph.get_or_create_semfield(keyword);
        graph.add_unit_extra_semfield(unit, owner)?;
    }
    for keyword in &plan.extra_subfields {
        let subfield = graph.get_or_create_subfield(keyword, owner)?;
        graph.add_unit_subfield(unit, subfield)?;
    }

    if let Some(text) = &plan.sem_comment {
        let comment = graph.find_or_create_comment(text, false);
        graph.add_unit_comment(unit, comment)?;
    }
    if let Some(text) = &plan.inside_info {
        let comment = graph.find_or_create_comment(text, true);
        graph.add_unit_comment(unit, comment)?;
    }

    graph.create_meaning(unit, plan.source, plan.sense)?;
    Ok(())
}

// ============================================================================
// Driver
// ============================================================================

/// Merge every secondary row. Row-scoped errors skip the row.
pub fn import_rows(
    graph: &mut MemoryGraph,
    ctx: &ImportContext,
    data: &Table,
    config: &ImportConfig,
    report: &mut ImportReport,
) -> Result<()> {
    let hyperlink = graph.ensure_link_type(LINK_HYPERLINK.0, LINK_HYPERLINK.1)?;

    for row in data.rows() {
        let linker = search_text(row).unwrap_or_default();
        if !passes_filter(row, &config.merge_marker) {
            debug!(row = row.line(), linker, "filtered out by Non-connector");
            report.rows_filtered += 1;
            continue;
        }

        match plan_row(graph, ctx, hyperlink, row, report) {
            Ok(plan) => {
                let linked = plan.link.is_some();
                apply_plan(graph, ctx, plan)?;
                report.rows_merged += 1;
                if linked {
                    report.links_created += 1;
                }
            }
            Err(rejected) if rejected.error.is_row_scoped() => {
                report.rows_skipped += 1;
                report.reject(Phase::Secondary, row.line(), linker, rejected.field, &rejected.error);
            }
            Err(rejected) => return Err(rejected.error),
        }
    }

    info!(rows = data.len(), merged = report.rows_merged, "secondary rows merged");
    Ok(())
}
