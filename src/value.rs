//! The two sides of the load/dump boundary.
//!
//! - [`Value`]: untyped JSON-compatible data (re-exported from `serde_json`, with
//!   `preserve_order` so objects keep insertion order).
//! - [`Instance`]: a loaded, schema-shaped tree whose records carry their type name.
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

pub use serde_json::{Map, Value};

use crate::ir::ScalarKind;

/// Configuration bag forwarded verbatim to every converter call. The engine never reads it.
pub type Options = Map<String, Value>;

/// Python-style truthiness: `null`, `false`, zero, and empty strings/arrays/objects.
///
/// The loader treats a falsy raw value exactly like a missing key.
pub fn is_falsy(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(xs) => xs.is_empty(),
        Value::Object(m) => m.is_empty(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INSTANCE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum Instance {
    /// Leaf passed through untouched (no coercion against the declared kind).
    Scalar(Value),
    List(Vec<Instance>),
    Map(IndexMap<String, Instance>),
    Record(Record),
    /// Custom leaf built by a converter.
    Opaque(Opaque),
}

impl Instance {
    pub fn null() -> Self {
        Instance::Scalar(Value::Null)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Instance::Scalar(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }
    pub fn as_list(&self) -> Option<&[Instance]> {
        match self {
            Instance::List(xs) => Some(xs),
            _ => None,
        }
    }
    pub fn as_map(&self) -> Option<&IndexMap<String, Instance>> {
        match self {
            Instance::Map(m) => Some(m),
            _ => None,
        }
    }
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Instance::Record(r) => Some(r),
            _ => None,
        }
    }
    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Instance::Opaque(o) => Some(o),
            _ => None,
        }
    }
    /// Shortcut for `as_opaque()` + `downcast_ref()`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_opaque().and_then(|o| o.downcast_ref::<T>())
    }

    /// Key used to find a dump converter for this member.
    ///
    /// Records and opaque leaves answer with their type name, scalars with the
    /// kind of the value they hold. Containers and `null` have no key.
    pub fn runtime_key(&self) -> Option<Cow<'_, str>> {
        match self {
            Instance::Record(r) => Some(Cow::Borrowed(r.type_name())),
            Instance::Opaque(o) => Some(Cow::Borrowed(o.type_name())),
            Instance::Scalar(v) => ScalarKind::of(v).map(|k| Cow::Owned(k.to_string())),
            Instance::List(_) | Instance::Map(_) => None,
        }
    }
}

impl From<Value> for Instance {
    fn from(v: Value) -> Self {
        Instance::Scalar(v)
    }
}
impl From<Record> for Instance {
    fn from(r: Record) -> Self {
        Instance::Record(r)
    }
}
impl From<Opaque> for Instance {
    fn from(o: Opaque) -> Self {
        Instance::Opaque(o)
    }
}
impl From<Vec<Instance>> for Instance {
    fn from(xs: Vec<Instance>) -> Self {
        Instance::List(xs)
    }
}
impl From<IndexMap<String, Instance>> for Instance {
    fn from(m: IndexMap<String, Instance>) -> Self {
        Instance::Map(m)
    }
}
impl From<bool> for Instance {
    fn from(b: bool) -> Self {
        Instance::Scalar(Value::Bool(b))
    }
}
impl From<i64> for Instance {
    fn from(n: i64) -> Self {
        Instance::Scalar(Value::from(n))
    }
}
impl From<f64> for Instance {
    fn from(n: f64) -> Self {
        Instance::Scalar(Value::from(n))
    }
}
impl From<&str> for Instance {
    fn from(s: &str) -> Self {
        Instance::Scalar(Value::from(s))
    }
}
impl From<String> for Instance {
    fn from(s: String) -> Self {
        Instance::Scalar(Value::String(s))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RECORD
// ————————————————————————————————————————————————————————————————————————————

/// A loaded record: its type name plus an ordered member table.
///
/// Members are the declared fields, but callers may attach extra ones. Names
/// starting with `__` are bookkeeping and never dumped.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    members: IndexMap<String, Instance>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), members: IndexMap::new() }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.members.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Instance> {
        self.members.get_mut(name)
    }

    /// Insert or replace a member, keeping its original position when replacing.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Instance>) -> Option<Instance> {
        self.members.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Instance> {
        self.members.shift_remove(name)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// OPAQUE
// ————————————————————————————————————————————————————————————————————————————

type EncodeFn = fn(&(dyn Any + Send + Sync)) -> Option<Value>;

/// A custom leaf value, typically produced by a load converter (`Money`, `Uuid`, …).
///
/// Without an encoder the dumper cannot represent it and emits `null` unless a
/// dump converter is registered for `type_name`.
#[derive(Clone)]
pub struct Opaque {
    type_name: String,
    payload: Arc<dyn Any + Send + Sync>,
    encode: Option<EncodeFn>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self { type_name: type_name.into(), payload: Arc::new(value), encode: None }
    }

    /// Like [`Opaque::new`], but the payload can be encoded through its `Serialize` impl.
    pub fn encodable<T>(type_name: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync + Serialize,
    {
        Self {
            type_name: type_name.into(),
            payload: Arc::new(value),
            encode: Some(encode_as::<T>),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// `None` when the payload has no JSON representation.
    pub fn to_value(&self) -> Option<Value> {
        self.encode.and_then(|f| f(self.payload.as_ref()))
    }
}

fn encode_as<T: Serialize + 'static>(payload: &(dyn Any + Send + Sync)) -> Option<Value> {
    payload.downcast_ref::<T>().and_then(|v| serde_json::to_value(v).ok())
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .field("encodable", &self.encode.is_some())
            .finish_non_exhaustive()
    }
}

/// Identity comparison: two opaque leaves are equal only if they share a payload.
impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOADER INPUT
// ————————————————————————————————————————————————————————————————————————————

/// What the loader accepts: raw data, or something already loaded.
#[derive(Debug, Clone)]
pub enum Input {
    Value(Value),
    Instance(Instance),
}

impl From<Value> for Input {
    fn from(v: Value) -> Self {
        Input::Value(v)
    }
}
impl From<&Value> for Input {
    fn from(v: &Value) -> Self {
        Input::Value(v.clone())
    }
}
impl From<Instance> for Input {
    fn from(i: Instance) -> Self {
        Input::Instance(i)
    }
}
impl From<Record> for Input {
    fn from(r: Record) -> Self {
        Input::Instance(Instance::Record(r))
    }
}
