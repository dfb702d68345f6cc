//! JSON snapshot export: serialize the knowledge base table by table.
//!
//! ```text
//! MemoryGraph → write_snapshot() → { header, semfields: [...], units: [...], ... }
//!   → read_snapshot() → MemoryGraph (indexes rebuilt, keywords and constraints re-checked)
//! ```
//!
//! Tables are written as arrays in id order, so two snapshots of the same
//! graph differ only in `exported_at`.

use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::*;
use crate::storage::{GraphStats, MemoryGraph};
use crate::{Error, Result};

/// Format tag written into every snapshot.
pub const SNAPSHOT_FORMAT: &str = "ruslinkers-snapshot/1";

/// The serialized form of a [`MemoryGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: String,
    pub exported_at: DateTime<Utc>,
    pub stats: GraphStats,
    #[serde(default)]
    pub schema_sealed: bool,
    pub semfields: Vec<Semfield>,
    pub subfields: Vec<Subfield>,
    pub sources: Vec<Source>,
    pub parameters: Vec<Parameter>,
    pub values: Vec<ParameterValue>,
    pub text_parameters: Vec<TextParameter>,
    pub form_types: Vec<FormType>,
    pub link_types: Vec<UnitLinkType>,
    pub units: Vec<Unit>,
    pub forms: Vec<Form>,
    pub meanings: Vec<Meaning>,
    pub examples: Vec<Example>,
    pub comments: Vec<Comment>,
    pub links: Vec<UnitLink>,
}

impl Snapshot {
    /// Capture every table of `graph`.
    pub fn capture(graph: &MemoryGraph) -> Self {
        Self {
            format: SNAPSHOT_FORMAT.to_string(),
            exported_at: Utc::now(),
            stats: graph.stats(),
            schema_sealed: graph.schema_sealed,
            semfields: graph.semfields.values().cloned().collect(),
            subfields: graph.subfields.values().cloned().collect(),
            sources: graph.sources.values().cloned().collect(),
            parameters: graph.parameters.values().cloned().collect(),
            values: graph.values.values().cloned().collect(),
            text_parameters: graph.text_parameters.values().cloned().collect(),
            form_types: graph.form_types.values().cloned().collect(),
            link_types: graph.link_types.values().cloned().collect(),
            units: graph.units.values().cloned().collect(),
            forms: graph.forms.values().cloned().collect(),
            meanings: graph.meanings.values().cloned().collect(),
            examples: graph.examples.values().cloned().collect(),
            comments: graph.comments.values().cloned().collect(),
            links: graph.links.iter().copied().collect(),
        }
    }

    /// Rebuild a graph. Keyword uniqueness is re-checked, and every
    /// assignment and link is replayed through the constraint engine.
    pub fn restore(self) -> Result<MemoryGraph> {
        if self.format != SNAPSHOT_FORMAT {
            return Err(Error::Config(format!(
                "unsupported snapshot format '{}', expected '{SNAPSHOT_FORMAT}'",
                self.format
            )));
        }

        let mut graph = MemoryGraph::new();
        graph.semfields = self.semfields.into_iter().map(|r| (r.id, r)).collect();
        graph.subfields = self.subfields.into_iter().map(|r| (r.id, r)).collect();
        graph.sources = self.sources.into_iter().map(|r| (r.id, r)).collect();
        graph.parameters = self.parameters.into_iter().map(|r| (r.id, r)).collect();
        graph.values = self.values.into_iter().map(|r| (r.id, r)).collect();
        graph.text_parameters = self.text_parameters.into_iter().map(|r| (r.id, r)).collect();
        graph.form_types = self.form_types.into_iter().map(|r| (r.id, r)).collect();
        graph.link_types = self.link_types.into_iter().map(|r| (r.id, r)).collect();
        graph.units = self.units.into_iter().map(|r| (r.id, r)).collect();
        graph.forms = self.forms.into_iter().map(|r| (r.id, r)).collect();
        graph.meanings = self.meanings.into_iter().map(|r| (r.id, r)).collect();
        graph.examples = self.examples.into_iter().map(|r| (r.id, r)).collect();
        graph.comments = self.comments.into_iter().map(|r| (r.id, r)).collect();
        graph.links = self.links.into_iter().collect();
        graph.schema_sealed = self.schema_sealed;
        graph.rebuild_indexes()?;
        graph.revalidate()?;
        Ok(graph)
    }
}

/// Write `graph` as pretty-printed JSON.
pub fn write_snapshot<W: Write>(graph: &MemoryGraph, writer: W) -> Result<()> {
    let snapshot = Snapshot::capture(graph);
    serde_json::to_writer_pretty(writer, &snapshot)?;
    Ok(())
}

/// Load a graph written by [`write_snapshot`].
pub fn read_snapshot<R: Read>(reader: R) -> Result<MemoryGraph> {
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    snapshot.restore()
}

/// Write a snapshot file.
pub fn save(graph: &MemoryGraph, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_snapshot(graph, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), stats = ?graph.stats(), "snapshot written");
    Ok(())
}

/// Read a snapshot file.
pub fn load(path: &Path) -> Result<MemoryGraph> {
    let file = std::fs::File::open(path)?;
    read_snapshot(std::io::BufReader::new(file))
}
