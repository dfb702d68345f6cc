//! # ruslinkers: Knowledge Base of Russian Connectives
//!
//! Builds a normalized knowledge base of connective expressions ("units"),
//! their variants ("forms"), dictionary senses ("meanings") and a controlled
//! set of descriptive attributes, from two independently coded tables.
//!
//! ## Design Principles
//!
//! 1. **Trait-first reads**: `GraphRead` is the contract between the
//!    resolution/constraint logic and the tables
//! 2. **Clean DTOs**: `Unit`, `Form`, `Parameter` cross all boundaries
//! 3. **Validate before mutate**: every assignment and link goes through the
//!    constraint engine first; a rejected mutation changes nothing
//! 4. **Deterministic**: every set is id-ordered, so every tie-break is
//!    reproducible
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ruslinkers::{ImportConfig, KnowledgeBase, Table};
//!
//! # fn example() -> ruslinkers::Result<()> {
//! let config = ImportConfig::default();
//! let syntax = Table::from_path("syntax.csv".as_ref(), config.delimiter_byte()?)?;
//! let data = Table::from_path("data.csv".as_ref(), config.delimiter_byte()?)?;
//!
//! let kb = KnowledgeBase::open_memory();
//! let report = kb.import(&syntax, &data, &config)?;
//! println!("{} units, {} diagnostics", report.units_created, report.diagnostics.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Phases
//!
//! | Phase | Module | Commit |
//! |-------|--------|--------|
//! | Bootstrap + primary rows | `import::catalog`, `import::primary` | checkpoint 1, all-or-nothing |
//! | Secondary rows | `import::resolve`, `import::merge` | checkpoint 2, per-row skip |

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod tx;
pub mod taxonomy;
pub mod schema;
pub mod constraint;
pub mod table;
pub mod import;
pub mod config;
pub mod export;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Unit, Form, Meaning, Sense, Source, Example, Comment, UnitLink, Holder,
    Parameter, ParameterValue, TextParameter, FormType, UnitLinkType, Target,
    Semfield, Subfield, TaxonomyEntry,
    UnitId, FormId, ParameterId, ValueId, TextParameterId, SemfieldId, SubfieldId,
};

// ============================================================================
// Re-exports: Storage, schema, constraints
// ============================================================================

pub use storage::{GraphRead, GraphStats, MemoryGraph};
pub use storage::memory::AssignmentRef;
pub use schema::{ParameterSpec, TextParameterSpec};
pub use constraint::{ConstraintViolation, Mutation, Violation};

// ============================================================================
// Re-exports: Transactions, import
// ============================================================================

pub use tx::{GraphTx, Transaction, TxId, TxMode};
pub use table::Table;
pub use import::{Diagnostic, DiagnosticKind, ImportReport, Phase};
pub use config::ImportConfig;

// ============================================================================
// Top-level KnowledgeBase handle
// ============================================================================

/// The primary entry point. Holds the committed graph and hands out
/// transactions over working copies of it.
pub struct KnowledgeBase {
    committed: RwLock<MemoryGraph>,
    /// Bumped on every successful write commit.
    version: AtomicU64,
    next_tx: AtomicU64,
}

impl KnowledgeBase {
    /// Wrap an existing graph (e.g. one loaded from a snapshot).
    pub fn with_graph(graph: MemoryGraph) -> Self {
        Self {
            committed: RwLock::new(graph),
            version: AtomicU64::new(0),
            next_tx: AtomicU64::new(1),
        }
    }

    /// Empty in-memory knowledge base.
    pub fn open_memory() -> Self {
        Self::with_graph(MemoryGraph::new())
    }

    /// Begin a transaction over a working copy of the committed graph.
    pub fn begin(&self, mode: TxMode) -> GraphTx {
        let id = TxId(self.next_tx.fetch_add(1, Ordering::Relaxed));
        let committed = self.committed.read();
        let base = self.version.load(Ordering::Acquire);
        debug!(tx = id.0, ?mode, base, "begin transaction");
        GraphTx::new(id, mode, base, committed.clone())
    }

    /// Make the transaction's working copy the committed graph.
    ///
    /// Fails with [`Error::TxError`] if another write transaction committed
    /// since this one began. Read-only transactions commit trivially.
    pub fn commit(&self, tx: GraphTx) -> Result<()> {
        if tx.mode() == TxMode::ReadOnly {
            return Ok(());
        }
        let mut committed = self.committed.write();
        let current = self.version.load(Ordering::Acquire);
        if current != tx.base_version() {
            return Err(Error::TxError(format!(
                "transaction {} began at version {} but the graph is at version {current}",
                tx.id().0,
                tx.base_version(),
            )));
        }
        let id = tx.id();
        *committed = tx.into_graph();
        self.version.store(current + 1, Ordering::Release);
        info!(tx = id.0, version = current + 1, stats = ?committed.stats(), "committed");
        Ok(())
    }

    /// Discard the transaction's working copy.
    pub fn rollback(&self, tx: GraphTx) {
        debug!(tx = tx.id().0, "rolled back");
    }

    /// Read access to the committed graph.
    pub fn read(&self) -> RwLockReadGuard<'_, MemoryGraph> {
        self.committed.read()
    }

    /// Owned copy of the committed graph.
    pub fn snapshot(&self) -> MemoryGraph {
        self.committed.read().clone()
    }

    /// Number of write commits so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Run both import phases. See [`import::run`].
    pub fn import(&self, syntax: &Table, data: &Table, config: &ImportConfig) -> Result<ImportReport> {
        import::run(self, syntax, data, config)
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::open_memory()
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Reference missing: no {kind} '{keyword}'")]
    ReferenceMissing { kind: &'static str, keyword: String },

    #[error("Ambiguous match: {candidates} units match '{linker}'")]
    AmbiguousMatch { linker: String, candidates: usize },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(#[from] ConstraintViolation),

    #[error("Duplicate {kind} keyword '{keyword}'")]
    DuplicateKeyword { kind: &'static str, keyword: String },

    #[error("Duplicate value keyword '{keyword}' for parameter '{parameter}'")]
    DuplicateValueKeyword { parameter: String, keyword: String },

    #[error("Schema is sealed: cannot declare '{keyword}'")]
    SchemaSealed { keyword: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors that skip one secondary row instead of aborting the phase.
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            Error::ReferenceMissing { .. } | Error::AmbiguousMatch { .. } | Error::ConstraintViolation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Tests
// ============================================================================
