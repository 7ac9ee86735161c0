//! User-supplied load/dump overrides, keyed by `(owner record, target type)`.
//!
//! The target key on load is the declared descriptor as rendered by
//! [`Ty::key`](crate::ir::Ty::key) (`Money`, `Point`, `list[Point]`); on dump it is
//! the member's [`Instance::runtime_key`].
//!
//! Registration is meant to happen once, before any load/dump runs. The table is
//! behind a lock, so late registration is memory-safe, but which calls observe it
//! is up to the caller.
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::value::{Instance, Options, Value};

pub type LoadFn = Arc<dyn Fn(&Value, &Options) -> Instance + Send + Sync>;
pub type DumpFn = Arc<dyn Fn(&Instance, &Options) -> Value + Send + Sync>;

/// A load/dump pair. Either half may be missing; the default path then applies.
#[derive(Clone, Default)]
pub struct Converter {
    load: Option<LoadFn>,
    dump: Option<DumpFn>,
}

impl Converter {
    pub fn new<L, D>(load: L, dump: D) -> Self
    where
        L: Fn(&Value, &Options) -> Instance + Send + Sync + 'static,
        D: Fn(&Instance, &Options) -> Value + Send + Sync + 'static,
    {
        Self { load: Some(Arc::new(load)), dump: Some(Arc::new(dump)) }
    }

    pub fn loader<L>(load: L) -> Self
    where
        L: Fn(&Value, &Options) -> Instance + Send + Sync + 'static,
    {
        Self { load: Some(Arc::new(load)), dump: None }
    }

    pub fn dumper<D>(dump: D) -> Self
    where
        D: Fn(&Instance, &Options) -> Value + Send + Sync + 'static,
    {
        Self { load: None, dump: Some(Arc::new(dump)) }
    }

    pub fn load(&self, raw: &Value, options: &Options) -> Option<Instance> {
        self.load.as_ref().map(|f| f(raw, options))
    }

    pub fn dump(&self, instance: &Instance, options: &Options) -> Option<Value> {
        self.dump.as_ref().map(|f| f(instance, options))
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("load", &self.load.is_some())
            .field("dump", &self.dump.is_some())
            .finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TABLE
// ————————————————————————————————————————————————————————————————————————————

/// owner record → target type → converter
#[derive(Debug, Default)]
pub struct Converters {
    table: RwLock<HashMap<String, HashMap<String, Converter>>>,
}

static GLOBAL: Lazy<Converters> = Lazy::new(Converters::new);

impl Converters {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table used by [`Model::new`](crate::model::Model::new).
    pub fn global() -> &'static Converters {
        &GLOBAL
    }

    /// Register `converter` for fields/members of type `target` inside records of type `owner`.
    /// A second registration for the same pair replaces the first.
    pub fn register(&self, owner: impl Into<String>, target: impl Into<String>, converter: Converter) {
        let (owner, target) = (owner.into(), target.into());
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(%owner, %target, ?converter, "registering converter");
        if table.entry(owner.clone()).or_default().insert(target.clone(), converter).is_some() {
            tracing::warn!(%owner, %target, "converter replaced");
        }
    }

    pub fn get(&self, owner: &str, target: &str) -> Option<Converter> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.get(owner)?.get(target).cloned()
    }

    /// Run the load half registered for `(owner, target)`, if any.
    pub fn load_with(&self, owner: &str, target: &str, raw: &Value, options: &Options) -> Option<Instance> {
        self.get(owner, target)?.load(raw, options)
    }

    /// Run the dump half registered for `(owner, target)`, if any.
    pub fn dump_with(&self, owner: &str, target: &str, instance: &Instance, options: &Options) -> Option<Value> {
        self.get(owner, target)?.dump(instance, options)
    }

    pub fn len(&self) -> usize {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
