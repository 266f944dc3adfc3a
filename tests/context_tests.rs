// tests/context_tests.rs

use std::collections::BTreeMap;

use sqlmold::{Context, Field, Kind, Record, RecordType, ResolveError, Value};

fn map(pairs: Vec<(&str, Value)>) -> Value {
    pairs.into_iter().collect()
}

// ============================================================================
// Generic context
// ============================================================================

#[test]
fn test_dotted_map_path() {
    let params = map(vec![(
        "user",
        map(vec![("address", map(vec![("city", Value::from("Oslo"))]))]),
    )]);
    let ctx = Context::generic(&params, "param");
    assert_eq!(ctx.get("user.address.city"), Some(Value::from("Oslo")));
    assert_eq!(ctx.get("user.address.zip"), None);
    assert_eq!(ctx.get("user.address.city.more"), None);
}

#[test]
fn test_list_index_segments() {
    let params = map(vec![("ids", Value::from(vec![10, 20]))]);
    let ctx = Context::generic(&params, "param");
    assert_eq!(ctx.get("ids.1"), Some(Value::Int(20)));
    assert_eq!(ctx.get("ids.2"), None);
    assert_eq!(ctx.get("ids.x"), None);
}

#[test]
fn test_list_root() {
    let params = Value::from(vec!["a", "b"]);
    let ctx = Context::generic(&params, "param");
    assert_eq!(ctx.get("0"), Some(Value::from("a")));
    assert_eq!(ctx.get("param"), None);
}

#[test]
fn test_scalar_root_uses_param_key() {
    let params = Value::Int(42);
    let ctx = Context::generic(&params, "value");
    assert_eq!(ctx.get("value"), Some(Value::Int(42)));
    assert_eq!(ctx.get("param"), None);
    assert_eq!(ctx.get("value.inner"), None);
}

#[test]
fn test_null_value_is_found() {
    let params = map(vec![("name", Value::Null)]);
    let ctx = Context::generic(&params, "param");
    assert_eq!(ctx.get("name"), Some(Value::Null));
    assert!(ctx.contains("name"));
    assert!(!ctx.contains("other"));
}

#[test]
fn test_require_reports_missing_name() {
    let params = map(vec![]);
    let ctx = Context::generic(&params, "param");
    assert_eq!(
        ctx.require("user.id"),
        Err(ResolveError::NotFound("user.id".to_string()))
    );
}

// ============================================================================
// Records
// ============================================================================

fn order_type() -> std::sync::Arc<RecordType> {
    RecordType::builder("Order")
        .field(Field::new("ID", Kind::Int).param("order_id"))
        .field(Field::new("Total", Kind::Float))
        .field(Field::new("note", Kind::String).param("memo"))
        .build()
}

#[test]
fn test_record_public_and_private_names() {
    let order = Record::new(&order_type())
        .with("ID", 9)
        .with("Total", 2.5)
        .with("note", "rush");
    let ctx = Context::Record(&order);

    // Public members resolve by name and by tag
    assert_eq!(ctx.get("ID"), Some(Value::Int(9)));
    assert_eq!(ctx.get("order_id"), Some(Value::Int(9)));
    assert_eq!(ctx.get("Total"), Some(Value::Float(2.5)));

    // Private members resolve only by tag
    assert_eq!(ctx.get("memo"), Some(Value::from("rush")));
    assert_eq!(ctx.get("note"), None);
}

#[test]
fn test_record_nested_in_map() {
    let order = Record::new(&order_type()).with("ID", 3);
    let params = map(vec![("order", Value::Record(order))]);
    let ctx = Context::generic(&params, "param");
    assert_eq!(ctx.get("order.order_id"), Some(Value::Int(3)));
    assert_eq!(ctx.get("order.missing"), None);
}

#[test]
fn test_unset_record_member_has_zero_value() {
    let order = Record::new(&order_type());
    let ctx = Context::Record(&order);
    assert_eq!(ctx.get("ID"), Some(Value::Int(0)));
}

// ============================================================================
// Layering
// ============================================================================

#[test]
fn test_group_first_layer_wins() {
    let mut inner = BTreeMap::new();
    inner.insert("id".to_string(), Value::Int(1));
    let outer_params = map(vec![("id", Value::Int(2)), ("name", Value::from("x"))]);

    let local = Context::Map(&inner);
    let outer = Context::generic(&outer_params, "param");
    let ctx = Context::Group(vec![&local, &outer]);

    assert_eq!(ctx.get("id"), Some(Value::Int(1)));
    assert_eq!(ctx.get("name"), Some(Value::from("x")));
    assert_eq!(ctx.get("other"), None);
}

#[test]
fn test_sequence_context() {
    let items = vec![Value::from("a"), map(vec![("k", Value::Int(1))])];
    let ctx = Context::Sequence(&items);
    assert_eq!(ctx.get("0"), Some(Value::from("a")));
    assert_eq!(ctx.get("1.k"), Some(Value::Int(1)));
    assert_eq!(ctx.get("2"), None);
}
