//! Two-phase record type registry.
//!
//! 1. [`RegistryBuilder::declare`] records each type's fields and classifies
//!    their declared types. Quoted names stay as [`Ty::ForwardRef`].
//! 2. [`RegistryBuilder::build`] resolves every forward reference against all
//!    declared types and freezes the result into a [`TypeRegistry`].
//!
//! Nothing is looked up in an ambient scope: a name is visible only to the
//! registry that declared it.
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::ir::{Field, RecordType, ScalarKind, Ty};
use crate::type_expr::{Origin, TypeExpr};

// ————————————————————————————————————————————————————————————————————————————
// DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub default: Option<Value>,
}

/// Builder for one record type. Type-expression parse errors are kept and
/// reported by [`RegistryBuilder::declare`].
#[derive(Debug)]
pub struct RecordDecl {
    name: String,
    fields: Vec<FieldDecl>,
    error: Option<Error>,
}

impl RecordDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new(), error: None }
    }

    /// Add a field whose type is written in type-expression syntax (`list['Point']`).
    pub fn field(self, name: impl Into<String>, ty: &str) -> Self {
        self.push(name.into(), TypeExpr::parse(ty), None)
    }

    /// Same as [`RecordDecl::field`] with a default used when the input has no usable value.
    pub fn field_default(self, name: impl Into<String>, ty: &str, default: impl Into<Value>) -> Self {
        self.push(name.into(), TypeExpr::parse(ty), Some(default.into()))
    }

    pub fn field_expr(self, name: impl Into<String>, ty: TypeExpr, default: Option<Value>) -> Self {
        self.push(name.into(), Ok(ty), default)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn push(mut self, name: String, ty: Result<TypeExpr>, default: Option<Value>) -> Self {
        match ty {
            Ok(ty) => self.fields.push(FieldDecl { name, ty, default }),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDER (phase 1)
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    records: IndexMap<String, RecordType>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a record type.
    ///
    /// A bare name refers to a builtin leaf, to this record itself, or to a record
    /// declared earlier. Other bare names stay custom leaves until [`build`], which
    /// promotes the ones naming a declared record. A quoted name must name a record.
    ///
    /// [`build`]: RegistryBuilder::build
    pub fn declare(&mut self, decl: RecordDecl) -> Result<&mut Self> {
        let RecordDecl { name, fields, error } = decl;
        if let Some(e) = error {
            return Err(e);
        }
        if self.records.contains_key(&name) {
            return Err(Error::DuplicateRecordType(name));
        }

        let mut out: Vec<Field> = Vec::with_capacity(fields.len());
        for f in fields {
            if out.iter().any(|g| g.name == f.name) {
                return Err(Error::DuplicateField { owner: name, field: f.name });
            }
            let ty = self.describe(&name, &f.name, &f.ty)?;
            out.push(Field { name: f.name, ty, default: f.default });
        }

        tracing::trace!(record = %name, fields = out.len(), "declared record type");
        self.records.insert(name.clone(), RecordType { name, fields: out });
        Ok(self)
    }

    fn describe(&self, owner: &str, field: &str, expr: &TypeExpr) -> Result<Ty> {
        match expr {
            TypeExpr::Named(n) => Ok(if let Some(kind) = ScalarKind::builtin(n) {
                Ty::Scalar(kind)
            } else if n == owner || self.records.contains_key(n) {
                Ty::RecordRef(n.clone())
            } else {
                Ty::Scalar(ScalarKind::Custom(n.clone()))
            }),
            TypeExpr::Forward(n) => Ok(Ty::ForwardRef(n.clone())),
            TypeExpr::Generic { origin, args } => match (Origin::classify(origin), args.as_slice()) {
                (Origin::List, [item]) => {
                    Ok(Ty::ListOf(Box::new(self.describe(owner, field, item)?)))
                }
                (Origin::Mapping, [k, v]) => Ok(Ty::MappingOf(
                    Box::new(self.describe(owner, field, k)?),
                    Box::new(self.describe(owner, field, v)?),
                )),
                _ => Err(Error::UnsupportedGenericShape {
                    owner: owner.to_string(),
                    field: field.to_string(),
                    origin: origin.clone(),
                    arity: args.len(),
                }),
            },
        }
    }

    /// Phase 2: resolve forward references and freeze.
    pub fn build(self) -> Result<TypeRegistry> {
        let names: Vec<String> = self.records.keys().cloned().collect();
        let mut records = IndexMap::with_capacity(self.records.len());

        for (name, mut record) in self.records {
            for field in &mut record.fields {
                resolve(&mut field.ty, &names, &name, &field.name)?;
            }
            records.insert(name, Arc::new(record));
        }

        tracing::debug!(records = records.len(), "type registry built");
        Ok(TypeRegistry { records: Arc::new(records) })
    }
}

fn resolve(ty: &mut Ty, names: &[String], owner: &str, field: &str) -> Result<()> {
    match ty {
        Ty::ForwardRef(n) => {
            if !names.iter().any(|x| *x == *n) {
                return Err(Error::UnresolvedForwardReference {
                    owner: owner.to_string(),
                    field: field.to_string(),
                    name: n.clone(),
                });
            }
            *ty = Ty::RecordRef(std::mem::take(n));
            Ok(())
        }
        Ty::Scalar(ScalarKind::Custom(n)) => {
            if names.iter().any(|x| *x == *n) {
                *ty = Ty::RecordRef(std::mem::take(n));
            }
            Ok(())
        }
        Ty::ListOf(item) => resolve(item, names, owner, field),
        Ty::MappingOf(k, v) => {
            resolve(k, names, owner, field)?;
            resolve(v, names, owner, field)
        }
        Ty::Scalar(_) | Ty::RecordRef(_) => Ok(()),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REGISTRY (phase 2, immutable)
// ————————————————————————————————————————————————————————————————————————————

/// Resolved, read-only schemas. Cloning shares the underlying table.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    records: Arc<IndexMap<String, Arc<RecordType>>>,
}

impl TypeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RecordType>> {
        self.records.get(name)
    }

    pub fn record(&self, name: &str) -> Result<&Arc<RecordType>> {
        self.get(name).ok_or_else(|| Error::UnknownRecordType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Record types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RecordType>> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
