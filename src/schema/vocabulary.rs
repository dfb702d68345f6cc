//! Controlled vocabularies derived from a dataset column.

use hashbrown::HashSet;
use tracing::debug;

use crate::model::ParameterId;
use crate::storage::MemoryGraph;
use crate::table::Table;
use crate::Result;
use super::ParameterSpec;

/// Distinct non-absent tokens of `column`, in first-seen order.
pub fn derive_controlled_vocabulary(table: &Table, column: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in table.rows() {
        for token in row.tokens(column) {
            if seen.insert(token) {
                out.push(token.to_string());
            }
        }
    }
    out
}

/// Declare `spec` with one value per token of the column named by its
/// keyword. Value name and keyword are both the token.
pub fn declare_vocabulary(graph: &mut MemoryGraph, spec: ParameterSpec, table: &Table) -> Result<ParameterId> {
    let vocabulary = derive_controlled_vocabulary(table, &spec.keyword);
    let keyword = spec.keyword.clone();
    let parameter = graph.declare_parameter(spec)?;
    for token in &vocabulary {
        graph.declare_value(parameter, token, token)?;
    }
    debug!(parameter = %keyword, values = vocabulary.len(), "declared vocabulary");
    Ok(parameter)
}
