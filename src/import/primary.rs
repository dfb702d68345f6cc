//! Primary ("syntax") dataset: one unit per row.
//!
//! Runs inside the phase-1 transaction after [`super::catalog::bootstrap`].
//! Missing references are reported and skipped; anything the constraint
//! engine rejects is returned and aborts the phase.

use smallvec::SmallVec;
use tracing::{debug, info};

use crate::model::*;
use crate::storage::memory::AssignmentRef;
use crate::storage::{GraphRead, MemoryGraph};
use crate::table::{present, Record, Table, LIST_SEPARATOR};
use crate::{Error, Result};
use super::catalog::{ImportContext, SyntacticParameter};
use super::{columns, DiagnosticKind, ImportReport, Phase};

/// Import every primary row.
pub fn import_rows(
    graph: &mut MemoryGraph,
    ctx: &ImportContext,
    syntax: &Table,
    report: &mut ImportReport,
) -> Result<()> {
    for row in syntax.rows() {
        import_row(graph, ctx, row, report)?;
        report.units_created += 1;
    }
    info!(rows = syntax.len(), "primary rows imported");
    Ok(())
}

/// Import one primary row as a new unit.
pub fn import_row(
    graph: &mut MemoryGraph,
    ctx: &ImportContext,
    record: &Record,
    report: &mut ImportReport,
) -> Result<UnitId> {
    let linker = record.get(columns::LINKER).trim();
    let unit = graph.create_unit(linker);
    let mut row = PrimaryRow { graph, ctx, row: record, report, unit };

    row.classify()?;
    row.cite_sources()?;
    for parameter in &ctx.syntactic {
        row.assign_syntactic(parameter)?;
    }
    row.assign_semantic()?;
    row.assign_texts()?;
    row.add_mainpart()?;
    row.add_correlative()?;
    row.add_comments()?;

    debug!(row = record.line(), %unit, linker, "imported unit");
    Ok(unit)
}

/// Per-row state, so the steps below share one set of borrows.
struct PrimaryRow<'a> {
    graph: &'a mut MemoryGraph,
    ctx: &'a ImportContext,
    row: &'a Record,
    report: &'a mut ImportReport,
    unit: UnitId,
}

impl<'a> PrimaryRow<'a> {
    fn holder(&self) -> Holder {
        Holder::Unit(self.unit)
    }

    fn warn(&mut self, field: &str, kind: DiagnosticKind, message: String) {
        let row: &'a Record = self.row;
        let linker = row.get(columns::LINKER).trim();
        self.report.warn(Phase::Primary, row.line(), linker, field, kind, message);
    }

    /// Tokens of a multi-valued cell in first-seen order. Repeats are
    /// dropped with a notice.
    fn distinct_tokens(&mut self, column: &str) -> SmallVec<[&'a str; 4]> {
        let row: &'a Record = self.row;
        let mut distinct: SmallVec<[&'a str; 4]> = SmallVec::new();
        for token in row.tokens(column) {
            if distinct.contains(&token) {
                self.warn(column, DiagnosticKind::Notice, format!("'{token}' listed more than once"));
            } else {
                distinct.push(token);
            }
        }
        distinct
    }

    fn classify(&mut self) -> Result<()> {
        let row: &'a Record = self.row;
        match row.present(columns::SEMFIELD) {
            Some(keyword) => match self.graph.semfield_by_keyword(keyword) {
                Some(id) => self.graph.set_unit_semfield(self.unit, id)?,
                None => self.warn(
                    columns::SEMFIELD,
                    DiagnosticKind::ReferenceMissing,
                    format!("unknown semantic field '{keyword}'"),
                ),
            },
            None => self.warn(
                columns::SEMFIELD,
                DiagnosticKind::ReferenceMissing,
                "unit has no semantic field".to_string(),
            ),
        }

        for keyword in row.tokens(columns::SUBFIELD) {
            match self.graph.subfield_by_keyword(keyword) {
                Some(id) => {
                    self.graph.add_unit_subfield(self.unit, id)?;
                }
                None => self.warn(
                    columns::SUBFIELD,
                    DiagnosticKind::ReferenceMissing,
                    format!("unknown sub-field '{keyword}'"),
                ),
            }
        }
        Ok(())
    }

    fn cite_sources(&mut self) -> Result<()> {
        let row: &'a Record = self.row;
        let keywords = row.tokens(columns::SOURCE);
        if keywords.is_empty() {
            self.warn(columns::SOURCE, DiagnosticKind::ReferenceMissing, "unit has no source".to_string());
        }
        for keyword in keywords {
            match self.graph.source_by_keyword(keyword) {
                Some(id) => {
                    self.graph.add_unit_source(self.unit, id)?;
                }
                None => self.warn(
                    columns::SOURCE,
                    DiagnosticKind::ReferenceMissing,
                    format!("unknown source '{keyword}'"),
                ),
            }
        }
        Ok(())
    }

    /// One assignment per token, then the parameter's example and comment
    /// on every assignment of that parameter.
    fn assign_syntactic(&mut self, parameter: &SyntacticParameter) -> Result<()> {
        let row: &'a Record = self.row;
        let holder = self.holder();
        let keyword = parameter.column.keyword;
        for token in self.distinct_tokens(keyword) {
            let value = self.graph.value_by_keyword(parameter.id, token)
                .ok_or_else(|| Error::NotFound(format!("value '{token}' of parameter '{keyword}'")))?;
            self.graph.assign_value(holder, value)?;
        }

        let example = parameter.column.example.and_then(|c| row.present(c).map(|t| (c, t)));
        let comment = parameter.column.comment.and_then(|c| row.present(c).map(|t| (c, t)));
        if example.is_none() && comment.is_none() {
            return Ok(());
        }

        let assigned = self.graph.values_for(holder, parameter.id);
        for (column, text) in [example, comment].into_iter().flatten() {
            if assigned.is_empty() {
                self.warn(
                    column,
                    DiagnosticKind::ReferenceMissing,
                    format!("'{text}' given for parameter '{keyword}' but the unit has no value of it"),
                );
            } else if assigned.len() > 1 {
                self.warn(
                    column,
                    DiagnosticKind::Notice,
                    format!("'{text}' attached to {} values of parameter '{keyword}'", assigned.len()),
                );
            }
        }
        if assigned.is_empty() {
            return Ok(());
        }

        if let Some((_, text)) = example {
            let example = self.graph.create_example(text);
            for value in &assigned {
                self.graph.attach_example(AssignmentRef::Value(holder, *value), example)?;
            }
        }
        if let Some((_, text)) = comment {
            let comment = self.graph.create_comment(text, true);
            for value in &assigned {
                self.graph.attach_comment(AssignmentRef::Value(holder, *value), comment)?;
            }
        }
        Ok(())
    }

    /// `yes` with the example when the example column is filled, else `no`.
    fn assign_semantic(&mut self) -> Result<()> {
        let holder = self.holder();
        for parameter in &self.ctx.semantic {
            match self.row.present(parameter.column.example) {
                Some(text) => {
                    self.graph.assign_value(holder, parameter.yes)?;
                    let example = self.graph.create_example(text);
                    self.graph.attach_example(AssignmentRef::Value(holder, parameter.yes), example)?;
                }
                None => self.graph.assign_value(holder, parameter.no)?,
            }
        }
        Ok(())
    }

    fn assign_texts(&mut self) -> Result<()> {
        let holder = self.holder();
        for parameter in &self.ctx.text {
            if let Some(text) = self.row.present(parameter.column.keyword) {
                self.graph.assign_text(holder, parameter.id, text)?;
            }
        }
        Ok(())
    }

    /// Only the first listed main part becomes a form.
    fn add_mainpart(&mut self) -> Result<()> {
        let first = self.row.get(columns::MAINPART).split(LIST_SEPARATOR).next().and_then(present);
        if let Some(text) = first {
            self.graph.create_form(self.unit, self.ctx.mainpart, text)?;
        }
        Ok(())
    }

    /// Correlative form with its mandatory obligatoriness text, example and
    /// positions.
    fn add_correlative(&mut self) -> Result<()> {
        let row: &'a Record = self.row;
        let Some(text) = row.present(columns::CORREL) else { return Ok(()) };
        let form = self.graph.create_form(self.unit, self.ctx.correl, text)?;
        let holder = Holder::Form(form);

        let oblig = row.get(columns::CORREL_OBLIG).trim();
        self.graph.assign_text(holder, self.ctx.correl_oblig, oblig)?;

        if let Some(text) = row.present(columns::CORREL_OBLIG_EXAMPLE) {
            let example = self.graph.create_example(text);
            self.graph.add_form_example(form, example)?;
        }

        let position_example = row.present(columns::CORREL_POSITION_EXAMPLE);
        for token in self.distinct_tokens(columns::CORREL_POSITION) {
            let value = self.graph.value_by_keyword(self.ctx.correl_position, token)
                .ok_or_else(|| Error::NotFound(format!("value '{token}' of parameter '{}'", columns::CORREL_POSITION)))?;
            self.graph.assign_value(holder, value)?;
            if let Some(text) = position_example {
                let example = self.graph.create_example(text);
                self.graph.attach_example(AssignmentRef::Value(holder, value), example)?;
            }
        }
        Ok(())
    }

    /// Row comments are internal notes.
    fn add_comments(&mut self) -> Result<()> {
        for text in self.row.tokens(columns::COMMENT) {
            let comment = self.graph.create_comment(text, true);
            self.graph.add_unit_comment(self.unit, comment)?;
        }
        Ok(())
    }
}
