//! Load/dump behavior through the public boundary.
use ldmodel::{Converter, Converters, Instance, Model, Opaque, Options, Record, RecordDecl, RegistryBuilder, Value};
use serde_json::json;

fn shapes() -> ldmodel::TypeRegistry {
    let mut b = RegistryBuilder::new();
    b.declare(RecordDecl::new("Polygon").field("vertices", "list['Point']").field("name", "str"))
        .unwrap();
    b.declare(
        RecordDecl::new("Point")
            .field("x", "int")
            .field_default("y", "int", 5)
            .field("user_name", "str")
            .field("createdAt", "str"),
    )
    .unwrap();
    b.declare(RecordDecl::new("Scene").field("main", "Polygon").field("layers", "dict[str, Polygon]"))
        .unwrap();
    b.build().unwrap()
}

#[test]
fn scalar_round_trip_under_either_spelling() {
    let convs = Converters::new();
    let model = Model::with_converters(shapes(), &convs);
    let opts = Options::new();

    let raw = json!({"x": 3, "y": 4, "userName": "ada", "created_at": "today", "extra": 1});
    let dumped = model.dump_to_value(&model.load_from_value("Point", raw, &opts).unwrap(), &opts);
    assert_eq!(dumped, json!({"x": 3, "y": 4, "user_name": "ada", "createdAt": "today"}));
}

#[test]
fn falsy_input_yields_the_default() {
    let convs = Converters::new();
    let model = Model::with_converters(shapes(), &convs);
    let p = model.load_from_value("Point", json!({"y": 0}), &Options::new()).unwrap();
    assert_eq!(p.get("y").and_then(Instance::as_i64), Some(5));
}

#[test]
fn nested_round_trip() {
    let convs = Converters::new();
    let model = Model::with_converters(shapes(), &convs);
    let opts = Options::new();

    let poly = model.load_from_value("Polygon", json!({"vertices": [{"x": 1, "y": 2}]}), &opts).unwrap();
    let vertices = poly.get("vertices").and_then(Instance::as_list).unwrap();
    assert_eq!(vertices.len(), 1);
    let v = vertices[0].as_record().unwrap();
    assert_eq!((v.get("x").and_then(Instance::as_i64), v.get("y").and_then(Instance::as_i64)), (Some(1), Some(2)));

    let dumped = model.dump_to_value(&poly, &opts);
    assert_eq!(dumped["vertices"][0]["x"], json!(1));
    assert_eq!(dumped["vertices"][0]["y"], json!(2));
    assert_eq!(dumped["name"], json!(""));

    // loading the dump again gives an equal record
    let again = model.load_from_value("Polygon", dumped, &opts).unwrap();
    assert_eq!(again, poly);
}

#[test]
fn absent_nested_record_is_never_null() {
    let convs = Converters::new();
    let model = Model::with_converters(shapes(), &convs);
    let opts = Options::new();
    let scene = model.load_from_value("Scene", json!({"layers": {"bg": {}}}), &opts).unwrap();
    let main = scene.get("main").and_then(Instance::as_record).unwrap();
    assert_eq!(main.type_name(), "Polygon");
    assert_eq!(
        model.dump_to_value(&scene, &opts),
        json!({"main": {"vertices": [], "name": ""}, "layers": {"bg": {"vertices": [], "name": ""}}})
    );
}

#[test]
fn identity_on_loaded_instances() {
    let convs = Converters::new();
    let model = Model::with_converters(shapes(), &convs);
    let opts = Options::new();
    let poly = model.load_from_value("Polygon", json!({"name": "tri"}), &opts).unwrap();
    let same = model.load_from_value("Polygon", poly.clone(), &opts).unwrap();
    assert_eq!(same, poly);
}

#[test]
fn reserved_members_never_dump() {
    let convs = Converters::new();
    let model = Model::with_converters(shapes(), &convs);
    let opts = Options::new();
    let mut p = model.load_from_value("Point", json!({"x": 1}), &opts).unwrap();
    p.set("__seen", true);
    p.set("note", "kept");
    let dumped = model.dump_to_value(&p, &opts);
    assert!(dumped.get("__seen").is_none());
    assert_eq!(dumped["note"], json!("kept"));
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERTERS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, PartialEq)]
struct Money {
    currency: String,
    cents: i64,
}

fn parse_money(raw: &Value, _: &Options) -> Instance {
    let text = raw.as_str().unwrap_or_default();
    let (currency, amount) = text.split_once(' ').unwrap_or(("", text));
    let cents = amount.parse::<f64>().map(|a| (a * 100.0).round() as i64).unwrap_or(0);
    Opaque::new("Money", Money { currency: currency.to_string(), cents }).into()
}

fn format_money(i: &Instance, opts: &Options) -> Value {
    let Some(m) = i.downcast_ref::<Money>() else { return Value::Null };
    let sep = opts.get("sep").and_then(Value::as_str).unwrap_or(" ");
    json!(format!("{}{sep}{}.{:02}", m.currency, m.cents / 100, m.cents % 100))
}

#[test]
fn global_money_converter_overrides_pass_through() {
    let mut b = RegistryBuilder::new();
    b.declare(RecordDecl::new("Invoice").field("amount", "Money").field("memo", "str")).unwrap();
    Converters::global().register("Invoice", "Money", Converter::new(parse_money, format_money));
    let model = Model::new(b.build().unwrap());
    let opts = Options::new();

    let inv = model.load_from_str("Invoice", r#"{"amount": "USD 10.00"}"#, &opts).unwrap();
    assert_eq!(
        inv.get("amount").and_then(|a| a.downcast_ref::<Money>()),
        Some(&Money { currency: "USD".into(), cents: 1000 })
    );
    assert_eq!(model.dump_to_value(&inv, &opts), json!({"amount": "USD 10.00", "memo": ""}));

    let mut opts = Options::new();
    opts.insert("sep".into(), json!("/"));
    assert_eq!(model.dump_to_value(&inv, &opts)["amount"], json!("USD/10.00"));

    // Display goes through the global table too
    assert!(inv.to_string().contains("\"amount\": \"USD 10.00\""));
}

#[test]
fn unconverted_custom_leaf_passes_through_then_dumps_verbatim() {
    let mut b = RegistryBuilder::new();
    b.declare(RecordDecl::new("Order").field("amount", "Money")).unwrap();
    let convs = Converters::new();
    let model = Model::with_converters(b.build().unwrap(), &convs);
    let opts = Options::new();
    let order = model.load_from_value("Order", json!({"amount": "USD 1"}), &opts).unwrap();
    assert_eq!(order.get("amount").and_then(Instance::as_str), Some("USD 1"));
    assert_eq!(model.dump_to_value(&order, &opts), json!({"amount": "USD 1"}));
}

#[test]
fn non_encodable_members_dump_as_null() {
    let convs = Converters::new();
    let model = Model::with_converters(shapes(), &convs);
    let mut r = Record::new("Point");
    r.set("lock", Opaque::new("Lock", std::sync::Mutex::new(0u8)));
    assert_eq!(model.dump_to_value(&r, &Options::new()), json!({"lock": null}));
}
