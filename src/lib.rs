//! Bidirectional mapping between JSON values and declared record types.
//!
//! Record types are declared as ordered `(field, type)` lists in a two-phase
//! [`RegistryBuilder`]. The loader walks a type's fields to build a [`Record`]
//! from a [`Value`]; the dumper flattens a record back into a `Value`.
//!
//! ```
//! use ldmodel::{Converters, Model, Options, RecordDecl, RegistryBuilder};
//! use serde_json::json;
//!
//! let mut builder = RegistryBuilder::new();
//! builder.declare(RecordDecl::new("Polygon").field("vertices", "list['Point']"))?;
//! builder.declare(RecordDecl::new("Point").field("x", "int").field("y", "int"))?;
//!
//! let converters = Converters::new();
//! let model = Model::with_converters(builder.build()?, &converters);
//! let options = Options::new();
//!
//! let poly = model.load_from_value("Polygon", json!({"vertices": [{"x": 1, "y": 2}]}), &options)?;
//! assert_eq!(model.dump_to_value(&poly, &options), json!({"vertices": [{"x": 1, "y": 2}]}));
//! # Ok::<(), ldmodel::Error>(())
//! ```
pub mod cli;
pub mod converters;
pub mod dump;
pub mod error;
pub mod ir;
pub mod load;
pub mod model;
pub mod naming;
pub mod path_de;
pub mod registry;
pub mod schema_doc;
pub mod type_expr;
pub mod value;

pub use converters::{Converter, Converters};
pub use dump::{Dumper, RESERVED_PREFIX};
pub use error::{Error, Result};
pub use ir::{Field, RecordType, ScalarKind, Ty};
pub use load::Loader;
pub use model::Model;
pub use registry::{RecordDecl, RegistryBuilder, TypeRegistry};
pub use schema_doc::SchemaDoc;
pub use type_expr::TypeExpr;
pub use value::{Input, Instance, Opaque, Options, Record, Value, is_falsy};
