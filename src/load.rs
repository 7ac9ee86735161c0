//! Type-directed construction of records from raw values.
//!
//! The loader never rejects data. Missing, falsy, or mis-shaped input degrades to
//! the field's default or zero value. The only errors are configuration errors
//! from the registry.
use std::cell::RefCell;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::converters::Converters;
use crate::dump::Dumper;
use crate::error::{Error, Result};
use crate::ir::{RecordType, Ty};
use crate::naming;
use crate::registry::TypeRegistry;
use crate::value::{Input, Instance, Options, Record};

pub struct Loader<'a> {
    registry: &'a TypeRegistry,
    converters: &'a Converters,
    options: &'a Options,
    // record types currently being built from nothing; breaks `a: A` cycles
    defaulting: RefCell<Vec<String>>,
}

impl<'a> Loader<'a> {
    pub fn new(registry: &'a TypeRegistry, converters: &'a Converters, options: &'a Options) -> Self {
        Self { registry, converters, options, defaulting: RefCell::new(Vec::new()) }
    }

    /// Load `input` as a `type_name` record.
    ///
    /// A record that already has type `type_name` is returned unchanged. Any other
    /// instance is dumped first and loaded from the resulting value.
    pub fn load(&self, type_name: &str, input: impl Into<Input>) -> Result<Record> {
        let record_type = self.registry.record(type_name)?;
        match input.into() {
            Input::Instance(Instance::Record(r)) if r.type_name() == type_name => Ok(r),
            Input::Instance(other) => {
                let owner = other.as_record().map_or(type_name, Record::type_name);
                let raw = Dumper::new(self.converters, self.options).dump_instance(owner, &other);
                self.load_record(record_type, &raw)
            }
            Input::Value(raw) => self.load_record(record_type, &raw),
        }
    }

    fn load_record(&self, record_type: &RecordType, raw: &Value) -> Result<Record> {
        let empty = Map::new();
        let obj = raw.as_object().unwrap_or(&empty);
        let mut record = Record::new(&record_type.name);

        for field in &record_type.fields {
            let v = naming::lookup(obj, &field.name).or_else(|| {
                tracing::trace!(record = %record_type.name, field = %field.name, "no usable value, using default");
                field.default.as_ref().filter(|d| !d.is_null())
            });
            let path = format!("{}.{}", record_type.name, field.name);
            let loaded = self.load_value(&record_type.name, &path, &field.ty, v)?;
            record.set(field.name.clone(), loaded);
        }

        Ok(record)
    }

    /// `v == None` means absent: the zero value of `ty` is produced.
    fn load_value(&self, owner: &str, path: &str, ty: &Ty, v: Option<&Value>) -> Result<Instance> {
        if let Some(raw) = v {
            if let Some(custom) = self.converters.load_with(owner, &ty.key(), raw, self.options) {
                return Ok(custom);
            }
        }

        match ty {
            Ty::Scalar(kind) => Ok(Instance::Scalar(v.cloned().unwrap_or_else(|| kind.zero()))),

            Ty::ListOf(item) => {
                let Some(Value::Array(xs)) = v else {
                    return Ok(Instance::List(Vec::new()));
                };
                xs.iter()
                    .enumerate()
                    .map(|(i, x)| self.load_value(owner, &format!("{path}.{i}"), item, present(x)))
                    .collect::<Result<Vec<_>>>()
                    .map(Instance::List)
            }

            Ty::MappingOf(_, value_ty) => {
                let Some(Value::Object(m)) = v else {
                    return Ok(Instance::Map(IndexMap::new()));
                };
                let mut out = IndexMap::with_capacity(m.len());
                for (k, x) in m {
                    let loaded = self.load_value(owner, &format!("{path}.{k}"), value_ty, present(x))?;
                    out.insert(k.clone(), loaded);
                }
                Ok(Instance::Map(out))
            }

            Ty::RecordRef(name) => {
                let nested = self.registry.record(name)?;
                match v {
                    Some(raw) => self.load_record(nested, raw).map(Instance::Record),
                    None => self.default_record(nested).map(Instance::Record),
                }
            }

            Ty::ForwardRef(name) => Err(Error::UnresolvedForwardReference {
                owner: owner.to_string(),
                field: path.to_string(),
                name: name.clone(),
            }),
        }
    }

    /// Every field at its default. A type that is already being defaulted higher
    /// up comes back bare (no members), otherwise `next: Node` would never end.
    fn default_record(&self, record_type: &RecordType) -> Result<Record> {
        if self.defaulting.borrow().iter().any(|n| *n == record_type.name) {
            tracing::trace!(record = %record_type.name, "recursive default, leaving record bare");
            return Ok(Record::new(&record_type.name));
        }
        self.defaulting.borrow_mut().push(record_type.name.clone());
        let out = self.load_record(record_type, &Value::Object(Map::new()));
        self.defaulting.borrow_mut().pop();
        out
    }
}

// Elements of lists and maps only fall back on `null`, not on other falsy values.
fn present(v: &Value) -> Option<&Value> {
    (!v.is_null()).then_some(v)
}

/// One-shot load.
pub fn load(
    registry: &TypeRegistry,
    converters: &Converters,
    type_name: &str,
    input: impl Into<Input>,
    options: &Options,
) -> Result<Record> {
    Loader::new(registry, converters, options).load(type_name, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::Converter;
    use crate::registry::{RecordDecl, RegistryBuilder};
    use crate::value::Opaque;
    use serde_json::json;

    fn registry() -> TypeRegistry {
        let mut b = RegistryBuilder::new();
        b.declare(
            RecordDecl::new("Point")
                .field("x", "int")
                .field_default("y", "int", 5)
                .field("label", "str"),
        )
        .unwrap();
        b.declare(
            RecordDecl::new("Polygon")
                .field("vertices", "list[Point]")
                .field("origin", "Point")
                .field("tags", "dict[str, int]")
                .field("fill_color", "str")
                .field("outline", "'Outline'"),
        )
        .unwrap();
        b.declare(RecordDecl::new("Outline").field("width", "float").field("dashed", "bool")).unwrap();
        b.declare(RecordDecl::new("Node").field("value", "int").field("next", "Node").field("kids", "list[Node]"))
            .unwrap();
        b.build().unwrap()
    }

    fn load_value(type_name: &str, raw: Value) -> Record {
        let reg = registry();
        load(&reg, &Converters::new(), type_name, raw, &Options::new()).unwrap()
    }

    fn int(r: &Record, field: &str) -> Option<i64> {
        r.get(field).and_then(Instance::as_i64)
    }

    #[test]
    fn scalars_pass_through_without_coercion() {
        let p = load_value("Point", json!({"x": 3, "y": 4, "label": 12}));
        assert_eq!(int(&p, "x"), Some(3));
        assert_eq!(int(&p, "y"), Some(4));
        // declared `str`, loaded as is
        assert_eq!(p.get("label"), Some(&Instance::from(12i64)));
    }

    #[test]
    fn falsy_values_use_the_default() {
        let p = load_value("Point", json!({"x": 0, "y": 0, "label": ""}));
        assert_eq!(int(&p, "x"), Some(0));
        assert_eq!(int(&p, "y"), Some(5));
        assert_eq!(p.get("label").and_then(Instance::as_str), Some(""));
    }

    #[test]
    fn missing_fields_get_zero_values_in_declaration_order() {
        let p = load_value("Outline", json!({}));
        let names: Vec<_> = p.members().map(|(k, _)| k).collect();
        assert_eq!(names, ["width", "dashed"]);
        assert_eq!(p.get("width").and_then(Instance::as_f64), Some(0.0));
        assert_eq!(p.get("dashed").and_then(Instance::as_bool), Some(false));
    }

    #[test]
    fn nested_lists_of_records() {
        let poly = load_value("Polygon", json!({"vertices": [{"x": 1, "y": 2}, null]}));
        let vs = poly.get("vertices").and_then(Instance::as_list).unwrap();
        assert_eq!(vs.len(), 2);
        let first = vs[0].as_record().unwrap();
        assert_eq!((int(first, "x"), int(first, "y")), (Some(1), Some(2)));
        // null element → default-constructed record
        let second = vs[1].as_record().unwrap();
        assert_eq!((int(second, "x"), int(second, "y")), (Some(0), Some(5)));
    }

    #[test]
    fn absent_nested_record_is_default_constructed() {
        let poly = load_value("Polygon", json!({}));
        let origin = poly.get("origin").and_then(Instance::as_record).unwrap();
        assert_eq!(origin.type_name(), "Point");
        assert_eq!(int(origin, "y"), Some(5));
        let outline = poly.get("outline").and_then(Instance::as_record).unwrap();
        assert_eq!(outline.type_name(), "Outline");
        assert_eq!(poly.get("vertices").and_then(Instance::as_list).map(<[_]>::len), Some(0));
        assert_eq!(poly.get("tags").and_then(Instance::as_map).map(IndexMap::len), Some(0));
    }

    #[test]
    fn camel_case_keys_and_unknown_keys() {
        let poly = load_value("Polygon", json!({"fillColor": "red", "junk": [1, 2, 3]}));
        assert_eq!(poly.get("fill_color").and_then(Instance::as_str), Some("red"));
        assert!(poly.get("junk").is_none());
    }

    #[test]
    fn mappings_keep_keys_and_recurse() {
        let poly = load_value("Polygon", json!({"tags": {"a": 1, "b": null}}));
        let tags = poly.get("tags").and_then(Instance::as_map).unwrap();
        assert_eq!(tags.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(tags["a"].as_i64(), Some(1));
        assert_eq!(tags["b"].as_i64(), Some(0));
    }

    #[test]
    fn mis_shaped_containers_degrade() {
        let poly = load_value("Polygon", json!({"vertices": {"x": 1}, "tags": [1], "origin": 7}));
        assert_eq!(poly.get("vertices").and_then(Instance::as_list).map(<[_]>::len), Some(0));
        assert_eq!(poly.get("tags").and_then(Instance::as_map).map(IndexMap::len), Some(0));
        let origin = poly.get("origin").and_then(Instance::as_record).unwrap();
        assert_eq!(int(origin, "x"), Some(0));
    }

    #[test]
    fn recursive_defaults_terminate() {
        let node = load_value("Node", json!({"value": 1, "kids": [{"value": 2}]}));
        let next = node.get("next").and_then(Instance::as_record).unwrap();
        assert_eq!(int(next, "value"), Some(0));
        // the default of a default is left bare
        assert!(next.get("next").and_then(Instance::as_record).unwrap().is_empty());
        let kid = &node.get("kids").and_then(Instance::as_list).unwrap()[0];
        assert_eq!(kid.as_record().and_then(|r| int(r, "value")), Some(2));
    }

    #[test]
    fn loading_a_loaded_record_is_identity() {
        let reg = registry();
        let convs = Converters::new();
        let opts = Options::new();
        let mut p = load(&reg, &convs, "Point", json!({"x": 1}), &opts).unwrap();
        p.set("__cache", Opaque::new("Cache", 42u8));
        let again = load(&reg, &convs, "Point", p.clone(), &opts).unwrap();
        assert_eq!(again, p);
    }

    #[test]
    fn foreign_instances_are_reloaded_through_their_dump() {
        let reg = registry();
        let mut other = Record::new("Elsewhere");
        other.set("x", 9i64);
        let p = load(&reg, &Converters::new(), "Point", other, &Options::new()).unwrap();
        assert_eq!(p.type_name(), "Point");
        assert_eq!(int(&p, "x"), Some(9));
    }

    #[test]
    fn foreign_records_dump_with_their_own_converters() {
        let reg = registry();
        let convs = Converters::new();
        convs.register("Elsewhere", "int", Converter::dumper(|i, _| json!(i.as_i64().unwrap_or(0) * 10)));
        convs.register("Point", "int", Converter::dumper(|_, _| json!(-1)));
        let mut other = Record::new("Elsewhere");
        other.set("x", 4i64);
        let p = load(&reg, &convs, "Point", other, &Options::new()).unwrap();
        assert_eq!(int(&p, "x"), Some(40));
    }

    #[test]
    fn converters_override_scalars_and_records() {
        let reg = registry();
        let convs = Converters::new();
        convs.register("Polygon", "str", Converter::loader(|v, _| Instance::from(format!("<{}>", v.as_str().unwrap_or("")))));
        convs.register("Polygon", "Point", Converter::loader(|_, _| Instance::from("point!")));
        let poly = load(&reg, &convs, "Polygon", json!({"fill_color": "red", "origin": {"x": 1}}), &Options::new())
            .unwrap();
        assert_eq!(poly.get("fill_color").and_then(Instance::as_str), Some("<red>"));
        assert_eq!(poly.get("origin").and_then(Instance::as_str), Some("point!"));
        // absent values never reach a converter
        let empty = load(&reg, &convs, "Polygon", json!({}), &Options::new()).unwrap();
        assert_eq!(empty.get("fill_color").and_then(Instance::as_str), Some(""));
        // owner scoping: Point's own fields are untouched
        let p = load(&reg, &convs, "Point", json!({"label": "a"}), &Options::new()).unwrap();
        assert_eq!(p.get("label").and_then(Instance::as_str), Some("a"));
    }

    #[test]
    fn unknown_root_type() {
        let reg = registry();
        let err = load(&reg, &Converters::new(), "Nope", json!({}), &Options::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownRecordType(_)));
    }
}
