//! # Attribute Schema
//!
//! Declares the descriptive categories units and forms can carry:
//! controlled-vocabulary [`Parameter`]s with their values, free-text
//! [`TextParameter`]s, form types and link types.
//!
//! Declaration is the first of two phases. Once [`MemoryGraph::seal_schema`]
//! has been called, parameter, value, text parameter and form type
//! declarations fail with [`Error::SchemaSealed`]; only assignments follow.
//! Link types stay open because the merge phase declares its own.

pub mod vocabulary;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constraint::{check_target, ConstraintViolation};
use crate::model::*;
use crate::storage::memory::ensure_free;
use crate::storage::MemoryGraph;
use crate::{Error, Result};

pub use vocabulary::{declare_vocabulary, derive_controlled_vocabulary};

// ============================================================================
// Declaration specs
// ============================================================================

/// Everything needed to declare a [`Parameter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub keyword: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Target,
    #[serde(default = "yes")]
    pub singleval: bool,
    #[serde(default)]
    pub semantic: bool,
    #[serde(default)]
    pub hidden: bool,
}

fn yes() -> bool {
    true
}

impl ParameterSpec {
    /// Single-valued, syntactic, visible unit parameter.
    pub fn unit(keyword: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            name: name.into(),
            description: None,
            target: Target::Unit,
            singleval: true,
            semantic: false,
            hidden: false,
        }
    }

    /// Single-valued, syntactic, visible form parameter.
    pub fn form(keyword: impl Into<String>, name: impl Into<String>) -> Self {
        Self { target: Target::Form, ..Self::unit(keyword, name) }
    }

    pub fn multi(mut self) -> Self {
        self.singleval = false;
        self
    }

    pub fn semantic(mut self) -> Self {
        self.semantic = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Everything needed to declare a [`TextParameter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextParameterSpec {
    pub keyword: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub hidden: bool,
}

impl TextParameterSpec {
    pub fn unit(keyword: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            name: name.into(),
            description: None,
            target: Target::Unit,
            hidden: false,
        }
    }

    pub fn form(keyword: impl Into<String>, name: impl Into<String>) -> Self {
        Self { target: Target::Form, ..Self::unit(keyword, name) }
    }
}

// ============================================================================
// Declarations
// ============================================================================

impl MemoryGraph {
    fn ensure_schema_open(&self, keyword: &str) -> Result<()> {
        if self.schema_sealed {
            return Err(Error::SchemaSealed { keyword: keyword.to_string() });
        }
        Ok(())
    }

    /// End the declaration phase.
    pub fn seal_schema(&mut self) {
        self.schema_sealed = true;
    }

    pub fn is_schema_sealed(&self) -> bool {
        self.schema_sealed
    }

    pub fn declare_parameter(&mut self, spec: ParameterSpec) -> Result<ParameterId> {
        self.ensure_schema_open(&spec.keyword)?;
        ensure_free(&self.index.parameter, "parameter", &spec.keyword)?;

        let id = ParameterId(self.seq.parameter.next());
        self.index.parameter.insert(spec.keyword.clone(), id);
        self.parameters.insert(id, Parameter {
            id,
            name: spec.name,
            keyword: spec.keyword,
            description: spec.description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            hidden: spec.hidden,
            singleval: spec.singleval,
            semantic: spec.semantic,
            target: spec.target,
            values: Vec::new(),
        });
        Ok(id)
    }

    /// Declare a value of `parameter`. Value keywords are scoped to their
    /// parameter.
    pub fn declare_value(&mut self, parameter: ParameterId, keyword: &str, name: &str) -> Result<ValueId> {
        self.ensure_schema_open(keyword)?;
        let owner = self.parameters.get(&parameter)
            .ok_or_else(|| Error::NotFound(format!("Parameter {parameter}")))?;

        let scoped = self.index.value.entry(parameter).or_default();
        if scoped.contains_key(keyword) {
            return Err(Error::DuplicateValueKeyword {
                parameter: owner.keyword.clone(),
                keyword: keyword.to_string(),
            });
        }

        let id = ValueId(self.seq.value.next());
        scoped.insert(keyword.to_string(), id);
        self.values.insert(id, ParameterValue {
            id,
            name: name.to_string(),
            keyword: keyword.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            parameter,
        });
        if let Some(p) = self.parameters.get_mut(&parameter) {
            p.values.push(id);
        }
        Ok(id)
    }

    pub fn declare_text_parameter(&mut self, spec: TextParameterSpec) -> Result<TextParameterId> {
        self.ensure_schema_open(&spec.keyword)?;
        ensure_free(&self.index.text_parameter, "text parameter", &spec.keyword)?;

        let id = TextParameterId(self.seq.text_parameter.next());
        self.index.text_parameter.insert(spec.keyword.clone(), id);
        self.text_parameters.insert(id, TextParameter {
            id,
            name: spec.name,
            keyword: spec.keyword,
            description: spec.description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            hidden: spec.hidden,
            target: spec.target,
        });
        Ok(id)
    }

    pub fn declare_form_type(&mut self, keyword: &str, name: &str) -> Result<FormTypeId> {
        self.ensure_schema_open(keyword)?;
        ensure_free(&self.index.form_type, "form type", keyword)?;

        let id = FormTypeId(self.seq.form_type.next());
        self.index.form_type.insert(keyword.to_string(), id);
        self.form_types.insert(id, FormType {
            id,
            name: name.to_string(),
            keyword: keyword.to_string(),
            parameters: Default::default(),
        });
        Ok(id)
    }

    pub fn declare_link_type(&mut self, keyword: &str, name: &str) -> Result<LinkTypeId> {
        ensure_free(&self.index.link_type, "link type", keyword)?;

        let id = LinkTypeId(self.seq.link_type.next());
        self.index.link_type.insert(keyword.to_string(), id);
        self.link_types.insert(id, UnitLinkType {
            id,
            name: name.to_string(),
            keyword: keyword.to_string(),
        });
        Ok(id)
    }

    /// Return the link type with this keyword, declaring it if needed.
    pub fn ensure_link_type(&mut self, keyword: &str, name: &str) -> Result<LinkTypeId> {
        match self.index.link_type.get(keyword) {
            Some(id) => Ok(*id),
            None => self.declare_link_type(keyword, name),
        }
    }

    /// Allow values of `parameter` on forms of `form_type`. Only
    /// form-targeted parameters can be restricted.
    pub fn restrict_to_form_type(&mut self, parameter: ParameterId, form_type: FormTypeId) -> Result<()> {
        let p = self.parameters.get(&parameter)
            .ok_or_else(|| Error::NotFound(format!("Parameter {parameter}")))?;
        self.ensure_schema_open(&p.keyword)?;
        check_target(&p.keyword, p.target, Holder::Form(FormId(0)))
            .map_err(|v: ConstraintViolation| Error::ConstraintViolation(v))?;

        let keyword = p.keyword.clone();
        let ft = self.form_types.get_mut(&form_type)
            .ok_or_else(|| Error::NotFound(format!("FormType {form_type}")))?;
        ft.parameters.insert(parameter);
        debug!(parameter = %keyword, form_type = %ft.keyword, "restricted parameter to form type");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::GraphRead;

    #[test]
    fn test_declare_parameter_defaults() {
        let mut g = MemoryGraph::new();
        let id = g.declare_parameter(ParameterSpec::unit("parts.num", "количество компонентов")).unwrap();
        let p = g.parameter(id).unwrap();

        assert!(p.singleval);
        assert!(!p.semantic);
        assert!(!p.hidden);
        assert_eq!(p.target, Target::Unit);
        assert_eq!(p.description, DEFAULT_DESCRIPTION);
        assert_eq!(g.parameter_by_keyword("parts.num"), Some(id));
    }

    #[test]
    fn test_declare_hidden_described_parameter() {
        let mut g = MemoryGraph::new();
        let spec = ParameterSpec::unit("linker_position_exclusivity", "единственность позиции")
            .hidden()
            .describe("служебный параметр");
        let id = g.declare_parameter(spec).unwrap();
        let p = g.parameter(id).unwrap();

        assert!(p.hidden);
        assert_eq!(p.description, "служебный параметр");
    }

    #[test]
    fn test_parameter_keyword_is_global() {
        let mut g = MemoryGraph::new();
        g.declare_parameter(ParameterSpec::unit("parts.num", "a")).unwrap();
        let err = g.declare_parameter(ParameterSpec::form("parts.num", "b")).unwrap_err();
        assert!(matches!(err, Error::DuplicateKeyword { kind: "parameter", .. }));
    }

    #[test]
    fn test_value_keyword_scoped_to_parameter() {
        let mut g = MemoryGraph::new();
        let inferential = g.declare_parameter(ParameterSpec::unit("inferential", "инферентивное прочтение").semantic()).unwrap();
        let illocutionary = g.declare_parameter(ParameterSpec::unit("illocutionary", "иллокутивное прочтение").semantic()).unwrap();

        let a = g.declare_value(inferential, "yes", "возможно").unwrap();
        let b = g.declare_value(illocutionary, "yes", "возможно").unwrap();
        assert_ne!(a, b);
        assert_eq!(g.value_by_keyword(inferential, "yes"), Some(a));
        assert_eq!(g.value_by_keyword(illocutionary, "yes"), Some(b));

        let err = g.declare_value(inferential, "yes", "again").unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateValueKeyword { ref parameter, ref keyword } if parameter == "inferential" && keyword == "yes"
        ));
        assert_eq!(g.parameter(inferential).unwrap().values, vec![a]);
    }

    #[test]
    fn test_declare_value_for_unknown_parameter() {
        let mut g = MemoryGraph::new();
        assert!(matches!(g.declare_value(ParameterId(9), "x", "x"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_restrict_requires_form_target() {
        let mut g = MemoryGraph::new();
        let unit_param = g.declare_parameter(ParameterSpec::unit("parts.num", "n")).unwrap();
        let form_param = g.declare_parameter(ParameterSpec::form("correl.position", "p").multi()).unwrap();
        let correl = g.declare_form_type("correl", "коррелят").unwrap();

        assert!(matches!(g.restrict_to_form_type(unit_param, correl), Err(Error::ConstraintViolation(_))));
        g.restrict_to_form_type(form_param, correl).unwrap();
        assert!(g.form_type(correl).unwrap().permits(form_param));
    }

    #[test]
    fn test_sealed_schema_rejects_declarations() {
        let mut g = MemoryGraph::new();
        let p = g.declare_parameter(ParameterSpec::unit("parts.num", "n")).unwrap();
        g.seal_schema();

        assert!(matches!(g.declare_value(p, "mono", "mono"), Err(Error::SchemaSealed { .. })));
        assert!(matches!(
            g.declare_parameter(ParameterSpec::unit("parts.order", "o")),
            Err(Error::SchemaSealed { .. })
        ));
        assert!(matches!(
            g.declare_text_parameter(TextParameterSpec::unit("expansion", "e")),
            Err(Error::SchemaSealed { .. })
        ));
        // Link types remain open.
        let first = g.ensure_link_type("hyperlink", "перекрёстная ссылка").unwrap();
        assert_eq!(g.ensure_link_type("hyperlink", "перекрёстная ссылка").unwrap(), first);
    }

    #[test]
    fn test_parameter_spec_from_json_defaults() {
        let spec: ParameterSpec = serde_json::from_str(r#"{"keyword": "clause.order", "name": "порядок клауз"}"#).unwrap();
        assert_eq!(spec, ParameterSpec::unit("clause.order", "порядок клауз"));
    }
}
