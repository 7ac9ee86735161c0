//! Flattening loaded records back into raw values.
//!
//! Dumping is total: members that cannot be represented become `null`, and
//! members named with the reserved `__` prefix are left out.
use std::fmt;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};

use crate::converters::Converters;
use crate::error::Result;
use crate::value::{Instance, Options, Record};

/// Members and mapping keys starting with this are internal bookkeeping.
pub const RESERVED_PREFIX: &str = "__";

pub struct Dumper<'a> {
    converters: &'a Converters,
    options: &'a Options,
}

impl<'a> Dumper<'a> {
    pub fn new(converters: &'a Converters, options: &'a Options) -> Self {
        Self { converters, options }
    }

    /// Always an `Object`, one entry per public member in member order.
    pub fn dump(&self, record: &Record) -> Value {
        let owner = record.type_name();
        let mut out = Map::new();
        for (name, member) in record.members() {
            if name.starts_with(RESERVED_PREFIX) {
                continue;
            }
            out.insert(name.to_string(), self.dump_instance(owner, member));
        }
        Value::Object(out)
    }

    /// Dump a member of a record of type `owner`. Converters registered under
    /// `owner` for the member's runtime type win over the default handling.
    pub fn dump_instance(&self, owner: &str, instance: &Instance) -> Value {
        if let Some(key) = instance.runtime_key() {
            if let Some(custom) = self.converters.dump_with(owner, &key, instance, self.options) {
                return custom;
            }
        }

        match instance {
            Instance::Scalar(Value::Array(xs)) => Value::Array(xs.iter().map(|x| self.dump_raw(owner, x)).collect()),
            Instance::Scalar(Value::Object(m)) => Value::Object(
                m.iter()
                    .filter(|(k, _)| !k.starts_with(RESERVED_PREFIX))
                    .map(|(k, v)| (k.clone(), self.dump_raw(owner, v)))
                    .collect(),
            ),
            Instance::Scalar(v) => v.clone(),
            Instance::List(xs) => Value::Array(xs.iter().map(|x| self.dump_instance(owner, x)).collect()),
            Instance::Map(m) => Value::Object(
                m.iter()
                    .filter(|(k, _)| !k.starts_with(RESERVED_PREFIX))
                    .map(|(k, v)| (k.clone(), self.dump_instance(owner, v)))
                    .collect(),
            ),
            Instance::Record(r) => self.dump(r),
            Instance::Opaque(o) => o.to_value().unwrap_or_else(|| {
                tracing::debug!(%owner, type_name = o.type_name(), "value has no JSON form, dumping null");
                Value::Null
            }),
        }
    }

    // Raw containers held in a leaf slot get the same filtering and converter
    // lookup as loaded lists and maps.
    fn dump_raw(&self, owner: &str, v: &Value) -> Value {
        self.dump_instance(owner, &Instance::Scalar(v.clone()))
    }
}

/// One-shot dump.
pub fn dump(record: &Record, converters: &Converters, options: &Options) -> Value {
    Dumper::new(converters, options).dump(record)
}

/// Compact JSON, or pretty with four-space indentation.
pub fn to_json_string(value: &Value, pretty: bool) -> Result<String> {
    if !pretty {
        return Ok(serde_json::to_string(value)?);
    }
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    // serde_json only ever writes UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Pretty JSON using the global converters.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = dump(self, Converters::global(), &Options::new());
        let text = to_json_string(&value, true).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
