use serde::{Deserialize, Serialize};

use super::node::Scalar;
use super::slot::ValueSlot;
use crate::bytecode::op::OpArray;

/// Runtime value stored in a [`ValueSlot`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),

    /// Composite value: argument lists, parameter lists.
    Array(Vec<Value>),

    /// Another slot, shared rather than copied.
    Slot(ValueSlot),

    /// A declared function parameter.
    Param(ParamRecord),
}

impl Value {
    /// Tag inferred from the value's shape.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Long(_) => TypeTag::Long,
            Value::Double(_) => TypeTag::Double,
            Value::String(_) => TypeTag::String,
            Value::Array(_) | Value::Param(_) => TypeTag::Array,
            Value::Slot(_) => TypeTag::Ref,
        }
    }
}

impl From<&Scalar> for Value {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Long(n) => Value::Long(*n),
            Scalar::Double(n) => Value::Double(*n),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

/// Type tag carried next to a slot's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TypeTag {
    #[default]
    Null,
    Bool,
    Long,
    Double,
    String,
    Array,
    Ref,
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Long => "long",
            TypeTag::Double => "double",
            TypeTag::String => "string",
            TypeTag::Array => "array",
            TypeTag::Ref => "ref",
        };
        f.pad(name)
    }
}

/// Compiled description of one function parameter.
///
/// `default` receives the default value, `ops` are the op-lines that must run
/// to compute it (empty for literal defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRecord {
    pub name: String,
    pub default: ValueSlot,
    pub ops: OpArray,
    pub by_ref: bool,
    pub type_hint: Option<String>,
}
