//! Boundary operations: values, JSON text, files, and typed views.
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::converters::Converters;
use crate::dump::{self, Dumper};
use crate::error::{Error, Result};
use crate::load::Loader;
use crate::path_de;
use crate::registry::TypeRegistry;
use crate::value::{Input, Options, Record};

/// A resolved registry paired with the converter table its loads and dumps consult.
#[derive(Debug, Clone)]
pub struct Model<'c> {
    registry: TypeRegistry,
    converters: &'c Converters,
}

impl Model<'static> {
    /// Uses the process-wide converters.
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry, converters: Converters::global() }
    }
}

impl<'c> Model<'c> {
    pub fn with_converters(registry: TypeRegistry, converters: &'c Converters) -> Self {
        Self { registry, converters }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn converters(&self) -> &'c Converters {
        self.converters
    }

    // ————————————————————————————————————————————————————————————————————————
    // LOAD
    // ————————————————————————————————————————————————————————————————————————

    pub fn load_from_value(&self, type_name: &str, input: impl Into<Input>, options: &Options) -> Result<Record> {
        Loader::new(&self.registry, self.converters, options).load(type_name, input)
    }

    pub fn load_from_str(&self, type_name: &str, text: &str, options: &Options) -> Result<Record> {
        // unknown types fail before any decoding work
        self.registry.record(type_name)?;
        let value: Value = path_de::from_str_with_path(text)?;
        self.load_from_value(type_name, value, options)
    }

    pub fn load_from_slice(&self, type_name: &str, bytes: &[u8], options: &Options) -> Result<Record> {
        self.registry.record(type_name)?;
        let value: Value = path_de::from_slice_with_path(bytes)?;
        self.load_from_value(type_name, value, options)
    }

    pub fn load_from_file(&self, type_name: &str, path: impl AsRef<Path>, options: &Options) -> Result<Record> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        self.load_from_slice(type_name, &bytes, options)
    }

    // ————————————————————————————————————————————————————————————————————————
    // DUMP
    // ————————————————————————————————————————————————————————————————————————

    pub fn dump_to_value(&self, record: &Record, options: &Options) -> Value {
        Dumper::new(self.converters, options).dump(record)
    }

    pub fn dump_to_string(&self, record: &Record, options: &Options, pretty: bool) -> Result<String> {
        dump::to_json_string(&self.dump_to_value(record, options), pretty)
    }

    pub fn dump_to_file(
        &self,
        record: &Record,
        path: impl AsRef<Path>,
        options: &Options,
        pretty: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        let text = self.dump_to_string(record, options, pretty)?;
        fs::write(path, text).map_err(|source| Error::Io { path: path.to_path_buf(), source })
    }

    /// Typed view: dump `record`, then deserialize the result into `T`.
    pub fn decode<T: DeserializeOwned>(&self, record: &Record, options: &Options) -> Result<T> {
        path_de::from_value_with_path(self.dump_to_value(record, options))
    }
}
