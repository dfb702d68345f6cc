//! Transaction management.
//!
//! A transaction owns a private working copy of the committed graph. All
//! mutations happen on the copy; [`crate::KnowledgeBase::commit`] publishes it
//! and dropping the transaction discards it.

use serde::{Deserialize, Serialize};

use crate::storage::MemoryGraph;
use crate::{Error, Result};

/// Transaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

/// Common transaction surface.
pub trait Transaction: Send + Sync {
    fn mode(&self) -> TxMode;
    fn id(&self) -> TxId;
}

/// A transaction over a working copy of the graph.
#[derive(Debug)]
pub struct GraphTx {
    id: TxId,
    mode: TxMode,
    base_version: u64,
    working: MemoryGraph,
}

impl GraphTx {
    pub(crate) fn new(id: TxId, mode: TxMode, base_version: u64, working: MemoryGraph) -> Self {
        Self { id, mode, base_version, working }
    }

    pub fn graph(&self) -> &MemoryGraph {
        &self.working
    }

    /// Mutable access to the working copy. Refused in read-only mode.
    pub fn graph_mut(&mut self) -> Result<&mut MemoryGraph> {
        match self.mode {
            TxMode::ReadWrite => Ok(&mut self.working),
            TxMode::ReadOnly => Err(Error::TxError(format!(
                "transaction {} is read-only",
                self.id.0
            ))),
        }
    }

    pub(crate) fn base_version(&self) -> u64 {
        self.base_version
    }

    pub(crate) fn into_graph(self) -> MemoryGraph {
        self.working
    }
}

impl Transaction for GraphTx {
    fn mode(&self) -> TxMode {
        self.mode
    }

    fn id(&self) -> TxId {
        self.id
    }
}
