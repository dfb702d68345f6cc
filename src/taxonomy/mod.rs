//! # Taxonomy Registry
//!
//! Two-level semantic classification: semantic fields own sub-fields.
//! Entries are created on first mention and never removed; names default to
//! the keyword.

use std::collections::BTreeSet;

use tracing::debug;

use crate::model::*;
use crate::storage::{GraphRead, MemoryGraph};
use crate::Result;

impl MemoryGraph {
    /// Return the semantic field with this keyword, creating it if needed.
    pub fn get_or_create_semfield(&mut self, keyword: &str) -> SemfieldId {
        if let Some(id) = self.semfield_by_keyword(keyword) {
            return id;
        }
        let id = SemfieldId(self.seq.semfield.next());
        self.index.semfield.insert(keyword.to_string(), id);
        self.semfields.insert(id, Semfield {
            id,
            name: keyword.to_string(),
            keyword: keyword.to_string(),
            subfields: BTreeSet::new(),
        });
        id
    }

    /// Return the sub-field with this keyword, creating it under `owner` if
    /// needed. The first owner of a keyword is permanent: a later request
    /// under another field returns the existing sub-field untouched.
    pub fn get_or_create_subfield(&mut self, keyword: &str, owner: SemfieldId) -> Result<SubfieldId> {
        Self::require(&self.semfields, owner, || format!("Semfield {owner}"))?;
        if let Some(id) = self.subfield_by_keyword(keyword) {
            if let Some(existing) = self.subfields.get(&id) {
                if existing.semfield != owner {
                    debug!(
                        subfield = keyword,
                        owner = %existing.semfield,
                        requested = %owner,
                        "subfield already owned by another semfield"
                    );
                }
            }
            return Ok(id);
        }

        let id = SubfieldId(self.seq.subfield.next());
        self.index.subfield.insert(keyword.to_string(), id);
        self.subfields.insert(id, Subfield {
            id,
            name: keyword.to_string(),
            keyword: keyword.to_string(),
            semfield: owner,
        });
        if let Some(semfield) = self.semfields.get_mut(&owner) {
            semfield.subfields.insert(id);
        }
        Ok(id)
    }

    /// Find a keyword at either level. Semantic fields shadow sub-fields.
    pub fn lookup_taxonomy(&self, keyword: &str) -> Option<TaxonomyEntry> {
        self.semfield_by_keyword(keyword)
            .map(TaxonomyEntry::Semfield)
            .or_else(|| self.subfield_by_keyword(keyword).map(TaxonomyEntry::Subfield))
    }
}
