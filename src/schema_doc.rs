//! Record types declared from a JSON document.
//!
//! ```json
//! {
//!     "Point":   { "x": "int", "y": { "type": "int", "default": 5 } },
//!     "Polygon": { "vertices": "list['Point']", "tags": "dict[str, str]" }
//! }
//! ```
//!
//! Records and fields are declared in document order. Bare and quoted names
//! may both refer to records that appear later in the document.
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::path_de;
use crate::registry::{RecordDecl, RegistryBuilder, TypeRegistry};

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct SchemaDoc {
    records: IndexMap<String, IndexMap<String, FieldSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Short(String),
    Full {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        default: Option<Value>,
    },
}

impl SchemaDoc {
    pub fn parse(text: &str) -> Result<Self> {
        path_de::from_str_with_path(text)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Phase 1 only; more records may still be declared on `builder`.
    pub fn declare_into(&self, builder: &mut RegistryBuilder) -> Result<()> {
        for (name, fields) in &self.records {
            let mut decl = RecordDecl::new(name);
            for (field, spec) in fields {
                decl = match spec {
                    FieldSpec::Short(ty) => decl.field(field, ty),
                    FieldSpec::Full { ty, default: Some(d) } => decl.field_default(field, ty, d.clone()),
                    FieldSpec::Full { ty, default: None } => decl.field(field, ty),
                };
            }
            builder.declare(decl)?;
        }
        Ok(())
    }

    /// Declare everything and resolve.
    pub fn build(&self) -> Result<TypeRegistry> {
        let mut builder = RegistryBuilder::new();
        self.declare_into(&mut builder)?;
        builder.build()
    }
}
