//! Attribute schema records: parameters, their values, and form types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use super::{FormTypeId, LinkTypeId, ParameterId, TextParameterId, ValueId};

/// Placeholder description carried by freshly declared schema entries.
pub const DEFAULT_DESCRIPTION: &str = "INSERT TEXT HERE";

/// The entity kind a parameter classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Target {
    #[default]
    Unit,
    Form,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Unit => f.write_str("Unit"),
            Target::Form => f.write_str("Form"),
        }
    }
}

/// A controlled-vocabulary attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: ParameterId,
    pub name: String,
    pub keyword: String,
    pub description: String,
    pub hidden: bool,
    /// At most one value per entity.
    pub singleval: bool,
    /// Semantic (as opposed to syntactic) parameter.
    pub semantic: bool,
    pub target: Target,
    /// Values in declaration order.
    pub values: Vec<ValueId>,
}

/// One allowed value of a [`Parameter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub id: ValueId,
    pub name: String,
    /// Unique within `parameter` only.
    pub keyword: String,
    pub description: String,
    pub parameter: ParameterId,
}

/// A free-text attribute. Assignments carry arbitrary strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextParameter {
    pub id: TextParameterId,
    pub name: String,
    pub keyword: String,
    pub description: String,
    pub hidden: bool,
    pub target: Target,
}

/// Kind of [`Form`](super::Form): main part, correlative, phonetic variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormType {
    pub id: FormTypeId,
    pub name: String,
    pub keyword: String,
    /// Form-targeted parameters valid for forms of this type.
    pub parameters: BTreeSet<ParameterId>,
}

impl FormType {
    pub fn permits(&self, parameter: ParameterId) -> bool {
        self.parameters.contains(&parameter)
    }
}

/// Controlled vocabulary of unit-to-unit link kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitLinkType {
    pub id: LinkTypeId,
    pub name: String,
    pub keyword: String,
}
