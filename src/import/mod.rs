//! # Two-Phase Import
//!
//! ```text
//! syntax.csv ─► catalog::bootstrap ─► primary::import_rows ─► commit 1
//! data.csv   ─► resolve + merge (row by row)               ─► commit 2
//! ```
//!
//! The primary phase is all-or-nothing: any error rolls back the whole
//! transaction. In the secondary phase a row-scoped error
//! ([`Error::is_row_scoped`]) skips that row only; everything else aborts the
//! phase and leaves checkpoint 1 in place.
//!
//! Every skipped row and every data problem that does not stop a row is
//! logged with `tracing::warn!` and collected in the [`ImportReport`].

pub mod catalog;
pub mod primary;
pub mod resolve;
pub mod merge;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::table::Table;
use crate::tx::TxMode;
use crate::{Error, KnowledgeBase, Result};

pub use catalog::ImportContext;

// ============================================================================
// Column names
// ============================================================================

/// Column headers of both datasets.
pub mod columns {
    pub const LINKER: &str = "linker";
    pub const SEMFIELD: &str = "semfield1_ed";
    pub const SUBFIELD: &str = "subfield1_ed";
    pub const SOURCE: &str = "source";
    pub const MAINPART: &str = "mainpart";
    pub const CORREL: &str = "correl";
    pub const CORREL_OBLIG: &str = "correl.oblig";
    pub const CORREL_OBLIG_EXAMPLE: &str = "correl.oblig.example";
    pub const CORREL_POSITION: &str = "correl.position";
    pub const CORREL_POSITION_EXAMPLE: &str = "correl.position.example";
    pub const COMMENT: &str = "comment";

    pub const NON_CONNECTOR: &str = "Non-connector";
    pub const FORM: &str = "form";
    pub const EDIT_FORM: &str = "edit form";
    pub const HYPERLINK: &str = "hyperlink";
    pub const SEM_COMMENT: &str = "sem_comment";
    pub const STYLE: &str = "Стилистич. ограничения";
    pub const EXAMPLE: &str = "Example";
    pub const SEMFIELD2: &str = "semfield2_ed";
    pub const SUBFIELD2: &str = "subfield2_ed";
    pub const INSIDE_INFO: &str = "inside_info";
    pub const PHONVAR: &str = "phonvar";
    pub const DICT: &str = "dict";
    pub const MEANING: &str = "meaning";
    pub const POS: &str = "pos";
    pub const POS_TYPE: &str = "type of pos";
    pub const OTHER_SENSES: &str = "other_senses";
    pub const OTHER_POS: &str = "other_pos";
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A keyword or unit the row refers to does not exist.
    ReferenceMissing,
    /// More than one unit survived disambiguation.
    AmbiguousMatch,
    /// A mutation was rejected by the constraint engine.
    ConstraintViolation,
    /// Suspicious but processed data.
    Notice,
}

/// One data problem, located by phase, row and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub phase: Phase,
    /// Line in the source file; the header is line 1.
    pub row: usize,
    pub linker: String,
    pub field: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub units_created: usize,
    pub rows_merged: usize,
    /// Secondary rows dropped by the `Non-connector` filter.
    pub rows_filtered: usize,
    /// Secondary rows skipped because of a row-scoped error.
    pub rows_skipped: usize,
    pub links_created: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportReport {
    /// Record a diagnostic and emit it as a warning.
    pub(crate) fn warn(
        &mut self,
        phase: Phase,
        row: usize,
        linker: &str,
        field: &str,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) {
        let message = message.into();
        warn!(?phase, row, linker, field, ?kind, "{message}");
        self.diagnostics.push(Diagnostic {
            phase,
            row,
            linker: linker.to_string(),
            field: field.to_string(),
            kind,
            message,
        });
    }

    /// Record a row-scoped error.
    pub(crate) fn reject(&mut self, phase: Phase, row: usize, linker: &str, field: &str, err: &Error) {
        let kind = match err {
            Error::AmbiguousMatch { .. } => DiagnosticKind::AmbiguousMatch,
            Error::ConstraintViolation(_) => DiagnosticKind::ConstraintViolation,
            _ => DiagnosticKind::ReferenceMissing,
        };
        self.warn(phase, row, linker, field, kind, err.to_string());
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// Diagnostics of one row.
    pub fn for_row(&self, phase: Phase, row: usize) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.phase == phase && d.row == row)
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Run both phases against `kb`. The populated graph is left committed in
/// `kb`; the report describes what happened on the way.
pub fn run(kb: &KnowledgeBase, syntax: &Table, data: &Table, config: &ImportConfig) -> Result<ImportReport> {
    config.validate()?;
    let mut report = ImportReport::default();

    // Phase 1: bootstrap + primary rows, all-or-nothing.
    let mut tx = kb.begin(TxMode::ReadWrite);
    let primary = tx.graph_mut().and_then(|graph| {
        let ctx = catalog::bootstrap(graph, syntax, data, config)?;
        primary::import_rows(graph, &ctx, syntax, &mut report)?;
        Ok(ctx)
    });
    let ctx = match primary {
        Ok(ctx) => ctx,
        Err(err) => {
            kb.rollback(tx);
            return Err(err);
        }
    };
    kb.commit(tx)?;
    info!(units = report.units_created, "primary phase committed");

    // Phase 2: secondary rows, per-row skip.
    let mut tx = kb.begin(TxMode::ReadWrite);
    let secondary = tx.graph_mut()
        .and_then(|graph| merge::import_rows(graph, &ctx, data, config, &mut report));
    if let Err(err) = secondary {
        kb.rollback(tx);
        return Err(err);
    }
    kb.commit(tx)?;
    info!(
        merged = report.rows_merged,
        skipped = report.rows_skipped,
        filtered = report.rows_filtered,
        links = report.links_created,
        diagnostics = report.diagnostics.len(),
        "secondary phase committed"
    );

    Ok(report)
}
