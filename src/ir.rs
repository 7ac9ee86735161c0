// Resolved type descriptors. These drive the loader; the dumper only needs record names.
use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Str,
    Any,                     // untyped leaf, passes anything through
    Custom(String),          // leaf type that only makes sense with a converter
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Scalar(ScalarKind),
    ListOf(Box<Ty>),
    MappingOf(Box<Ty>, Box<Ty>),
    RecordRef(String),       // name of a record type in the same registry
    ForwardRef(String),      // only exists between declare and build
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub default: Option<Value>,  // raw value, loaded like input when the key is missing
}

/// Schema of one record type: fields in declaration order, names unique.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ScalarKind {
    /// Builtin leaf names, with the common Rust/JSON-schema spellings as aliases.
    pub fn builtin(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" | "boolean" => ScalarKind::Bool,
            "int" | "integer" | "i64" | "i32" | "u64" | "u32" | "usize" => ScalarKind::Int,
            "float" | "number" | "f64" | "f32" => ScalarKind::Float,
            "str" | "string" | "String" => ScalarKind::Str,
            "any" | "Any" | "Value" => ScalarKind::Any,
            _ => return None,
        };
        Some(kind)
    }

    /// Kind of a raw leaf. `null` and containers have none.
    pub fn of(v: &Value) -> Option<Self> {
        match v {
            Value::Bool(_) => Some(ScalarKind::Bool),
            Value::Number(n) if n.is_f64() => Some(ScalarKind::Float),
            Value::Number(_) => Some(ScalarKind::Int),
            Value::String(_) => Some(ScalarKind::Str),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// What a missing or falsy field of this kind becomes.
    pub fn zero(&self) -> Value {
        match self {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Int => Value::from(0),
            ScalarKind::Float => Value::from(0.0),
            ScalarKind::Str => Value::String(String::new()),
            ScalarKind::Any | ScalarKind::Custom(_) => Value::Null,
        }
    }
}

impl Ty {
    /// True once no `ForwardRef` remains anywhere in the tree.
    pub fn is_resolved(&self) -> bool {
        match self {
            Ty::Scalar(_) | Ty::RecordRef(_) => true,
            Ty::ForwardRef(_) => false,
            Ty::ListOf(item) => item.is_resolved(),
            Ty::MappingOf(k, v) => k.is_resolved() && v.is_resolved(),
        }
    }

    /// Rendered declaration, also used as the converter key for this descriptor.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Bool => f.write_str("bool"),
            ScalarKind::Int => f.write_str("int"),
            ScalarKind::Float => f.write_str("float"),
            ScalarKind::Str => f.write_str("str"),
            ScalarKind::Any => f.write_str("any"),
            ScalarKind::Custom(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Scalar(kind) => write!(f, "{kind}"),
            Ty::ListOf(item) => write!(f, "list[{item}]"),
            Ty::MappingOf(k, v) => write!(f, "dict[{k}, {v}]"),
            Ty::RecordRef(name) => f.write_str(name),
            Ty::ForwardRef(name) => write!(f, "'{name}'"),
        }
    }
}
