// tests/binder_tests.rs

use std::sync::Arc;

use sqlmold::{
    BindError, BoxError, Field, Kind, MemoryRows, Record, RecordType, ResultMap, Rows, Value,
    bind, bind_list, bind_one,
};

fn order_type() -> Arc<RecordType> {
    RecordType::builder("Order")
        .field(Field::new("ID", Kind::Int).column("order_id"))
        .field(Field::new("Total", Kind::Float).column("total"))
        .build()
}

fn user_type() -> Arc<RecordType> {
    RecordType::builder("User")
        .field(Field::new("ID", Kind::Int).column("id"))
        .field(Field::new("Name", Kind::String).column("user_name"))
        .field(Field::new(
            "Orders",
            Kind::List(Box::new(Kind::Record(order_type()))),
        ))
        .build()
}

fn user_map() -> ResultMap {
    ResultMap::new()
        .id("user_id", "ID")
        .result("user_name", "Name")
        .collection(
            "Orders",
            ResultMap::new().id("order_id", "ID").result("total", "Total"),
        )
}

fn joined_rows(rows: Vec<Vec<Value>>) -> MemoryRows {
    MemoryRows::new(["user_id", "user_name", "order_id", "total"], rows)
}

fn row(user: i64, name: &str, order: Option<i64>, total: Option<f64>) -> Vec<Value> {
    vec![
        Value::Int(user),
        Value::from(name),
        Value::from(order),
        Value::from(total),
    ]
}

fn orders(user: &Record) -> Vec<Record> {
    match user.get("Orders") {
        Some(Value::List(items)) => items
            .iter()
            .map(|item| item.as_record().unwrap().clone())
            .collect(),
        other => panic!("expected order list, got {:?}", other),
    }
}

fn records(items: Vec<Value>) -> Vec<Record> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Record(record) => record,
            other => panic!("expected record, got {:?}", other),
        })
        .collect()
}

// ============================================================================
// Flat binding
// ============================================================================

#[test]
fn test_flat_record_by_column_tag_then_member_name() {
    let ty = user_type();
    let mut rows = MemoryRows::new(
        ["id", "user_name", "unmapped"],
        vec![vec![Value::Int(1), Value::from("ann"), Value::Int(99)]],
    );
    let user = bind_one(&mut rows, &ty, None).unwrap();
    assert_eq!(user.get("ID"), Some(&Value::Int(1)));
    assert_eq!(user.get("Name"), Some(&Value::from("ann")));

    let mut rows = MemoryRows::new(["Name"], vec![vec![Value::from("bob")]]);
    let user = bind_one(&mut rows, &ty, None).unwrap();
    assert_eq!(user.get("Name"), Some(&Value::from("bob")));
}

#[test]
fn test_flat_list_of_records() {
    let ty = order_type();
    let mut rows = MemoryRows::new(
        ["order_id", "total"],
        vec![
            vec![Value::Int(1), Value::Float(1.5)],
            vec![Value::Int(2), Value::Null],
        ],
    );
    let items = records(bind_list(&mut rows, &Kind::Record(ty), None).unwrap());
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].get("ID"), Some(&Value::Int(2)));
    // SQL NULL stays null
    assert_eq!(items[1].get("Total"), Some(&Value::Null));
}

#[test]
fn test_scalar_target() {
    let mut rows = MemoryRows::new(["count"], vec![vec![Value::from("42")]]);
    let mut dest = Value::Null;
    bind(&mut rows, &Kind::Int, None, &mut dest).unwrap();
    assert_eq!(dest, Value::Int(42));
}

#[test]
fn test_scalar_needs_exactly_one_column() {
    let mut rows = MemoryRows::new(["a", "b"], vec![vec![Value::Int(1), Value::Int(2)]]);
    let mut dest = Value::Null;
    assert!(matches!(
        bind(&mut rows, &Kind::Int, None, &mut dest),
        Err(BindError::ColumnCount { got: 2, .. })
    ));
}

#[test]
fn test_list_of_scalars() {
    let mut rows = MemoryRows::new(
        ["id"],
        vec![vec![Value::Int(3)], vec![Value::Int(4)]],
    );
    let items = bind_list(&mut rows, &Kind::Int, None).unwrap();
    assert_eq!(items, vec![Value::Int(3), Value::Int(4)]);
}

#[test]
fn test_map_target() {
    let mut rows = MemoryRows::new(["a", "b"], vec![vec![Value::Int(1), Value::from("x")]]);
    let mut dest = Value::Null;
    bind(&mut rows, &Kind::Map, None, &mut dest).unwrap();
    let expected: Value = [("a", Value::Int(1)), ("b", Value::from("x"))]
        .into_iter()
        .collect();
    assert_eq!(dest, expected);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_no_rows_leaves_destination_unchanged() {
    let mut rows = MemoryRows::new(["id"], vec![]);
    let mut dest = Value::from("untouched");
    let err = bind(&mut rows, &Kind::Record(user_type()), None, &mut dest).unwrap_err();
    assert!(matches!(err, BindError::NoRows));
    assert_eq!(dest, Value::from("untouched"));
}

#[test]
fn test_second_row_without_collection() {
    let mut rows = MemoryRows::new(["id"], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
    let mut dest = Value::Null;
    assert!(matches!(
        bind(&mut rows, &Kind::Record(user_type()), None, &mut dest),
        Err(BindError::TooManyRows)
    ));
    assert_eq!(dest, Value::Null);
}

#[test]
fn test_raw_bytes_destination_rejected() {
    let ty = RecordType::builder("Blob")
        .field(Field::new("Data", Kind::RawBytes))
        .build();
    let mut rows = MemoryRows::new(["Data"], vec![vec![Value::Bytes(vec![1])]]);
    assert!(matches!(
        bind_one(&mut rows, &ty, None),
        Err(BindError::RawBytes)
    ));
}

#[test]
fn test_conversion_failure() {
    let mut rows = MemoryRows::new(["id"], vec![vec![Value::from("abc")]]);
    match bind_one(&mut rows, &user_type(), None) {
        Err(BindError::Convert { column, from, .. }) => {
            assert_eq!(column, "ID");
            assert_eq!(from, "string");
        }
        other => panic!("expected conversion error, got {:?}", other),
    }
}

#[test]
fn test_row_width_mismatch() {
    let mut rows = MemoryRows::new(["id", "user_name"], vec![vec![Value::Int(1)]]);
    assert!(matches!(
        bind_one(&mut rows, &user_type(), None),
        Err(BindError::RowWidth { expected: 2, got: 1 })
    ));
}

#[test]
fn test_result_map_needs_record_target() {
    let mut rows = joined_rows(vec![]);
    let mut dest = Value::Null;
    assert!(matches!(
        bind(&mut rows, &Kind::Int, Some(&user_map()), &mut dest),
        Err(BindError::NotRecord(_))
    ));
}

#[test]
fn test_result_map_unknown_member() {
    let map = ResultMap::new().result("user_name", "Nickname");
    let mut rows = joined_rows(vec![row(1, "ann", None, None)]);
    assert!(matches!(
        bind_one(&mut rows, &user_type(), Some(&map)),
        Err(BindError::UnknownMember { member, .. }) if member == "Nickname"
    ));
}

#[test]
fn test_association_member_must_be_record() {
    let map = ResultMap::new().association("Name", ResultMap::new());
    let mut rows = joined_rows(vec![row(1, "ann", None, None)]);
    assert!(matches!(
        bind_one(&mut rows, &user_type(), Some(&map)),
        Err(BindError::AssociationNotRecord { .. })
    ));
}

struct FailingRows {
    columns: Vec<String>,
}

impl Rows for FailingRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>, BoxError> {
        Err("connection reset".into())
    }
}

#[test]
fn test_row_source_error() {
    let mut rows = FailingRows {
        columns: vec!["id".to_string()],
    };
    let err = bind_one(&mut rows, &user_type(), None).unwrap_err();
    assert!(matches!(err, BindError::Rows(_)));
    assert!(err.to_string().contains("connection reset"));
}

// ============================================================================
// Result maps
// ============================================================================

#[test]
fn test_rows_with_same_key_merge_into_one_parent() {
    let mut rows = joined_rows(vec![
        row(1, "ann", Some(10), Some(1.5)),
        row(1, "ann", Some(11), Some(2.5)),
    ]);
    let user = bind_one(&mut rows, &user_type(), Some(&user_map())).unwrap();
    assert_eq!(user.get("ID"), Some(&Value::Int(1)));

    let items = orders(&user);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get("ID"), Some(&Value::Int(10)));
    assert_eq!(items[1].get("ID"), Some(&Value::Int(11)));
    assert_eq!(items[1].get("Total"), Some(&Value::Float(2.5)));
}

#[test]
fn test_single_target_with_different_keys_is_error() {
    let mut rows = joined_rows(vec![
        row(1, "ann", Some(10), Some(1.5)),
        row(2, "bob", Some(11), Some(2.5)),
    ]);
    assert!(matches!(
        bind_one(&mut rows, &user_type(), Some(&user_map())),
        Err(BindError::TooManyRows)
    ));
}

#[test]
fn test_list_groups_parents_in_first_seen_order() {
    let mut rows = joined_rows(vec![
        row(2, "bob", Some(20), Some(1.0)),
        row(1, "ann", Some(10), Some(2.0)),
        row(2, "bob", Some(21), Some(3.0)),
        row(3, "cid", None, None),
    ]);
    let items = records(
        bind_list(&mut rows, &Kind::Record(user_type()), Some(&user_map())).unwrap(),
    );

    let ids: Vec<&Value> = items.iter().filter_map(|u| u.get("ID")).collect();
    assert_eq!(ids, vec![&Value::Int(2), &Value::Int(1), &Value::Int(3)]);

    assert_eq!(orders(&items[0]).len(), 2);
    assert_eq!(orders(&items[0])[1].get("ID"), Some(&Value::Int(21)));
    assert_eq!(orders(&items[1]).len(), 1);

    // Outer-join row without a child yields an empty collection
    assert_eq!(items[2].get("Orders"), Some(&Value::List(vec![])));
}

#[test]
fn test_repeated_child_rows_are_deduplicated() {
    let mut rows = joined_rows(vec![
        row(1, "ann", Some(10), Some(1.5)),
        row(1, "ann", Some(10), Some(1.5)),
    ]);
    let user = bind_one(&mut rows, &user_type(), Some(&user_map())).unwrap();
    assert_eq!(orders(&user).len(), 1);
}

#[test]
fn test_association() {
    let customer = RecordType::builder("Customer")
        .field(Field::new("ID", Kind::Int))
        .field(Field::new("Name", Kind::String))
        .build();
    let invoice = RecordType::builder("Invoice")
        .field(Field::new("ID", Kind::Int))
        .field(Field::new("Customer", Kind::Record(Arc::clone(&customer))))
        .build();
    let map = ResultMap::new().id("invoice_id", "ID").association(
        "Customer",
        ResultMap::new()
            .id("customer_id", "ID")
            .result("customer_name", "Name"),
    );

    let mut rows = MemoryRows::new(
        ["invoice_id", "customer_id", "customer_name"],
        vec![
            vec![Value::Int(100), Value::Int(7), Value::from("acme")],
            vec![Value::Int(101), Value::Int(8), Value::from("initech")],
        ],
    );
    let items = records(bind_list(&mut rows, &Kind::Record(invoice), Some(&map)).unwrap());
    assert_eq!(items.len(), 2);

    let Some(Value::Record(first)) = items[0].get("Customer") else {
        panic!("expected nested customer record");
    };
    assert_eq!(first.get("Name"), Some(&Value::from("acme")));
    assert_eq!(first.record_type().name(), "Customer");
}

#[test]
fn test_map_bindings_for_missing_columns_are_skipped() {
    let mut rows = MemoryRows::new(["user_id"], vec![vec![Value::Int(5)]]);
    let map = ResultMap::new().id("user_id", "ID").result("user_name", "Name");
    let user = bind_one(&mut rows, &user_type(), Some(&map)).unwrap();
    assert_eq!(user.get("ID"), Some(&Value::Int(5)));
    assert_eq!(user.get("Name"), Some(&Value::from("")));
}

#[test]
fn test_missing_id_column_is_error() {
    let mut rows = MemoryRows::new(
        ["user_name", "order_id"],
        vec![
            vec![Value::from("alice"), Value::Int(1)],
            vec![Value::from("bob"), Value::Int(2)],
        ],
    );
    let map = ResultMap::new()
        .id("user_id", "ID")
        .result("user_name", "Name")
        .collection("Orders", ResultMap::new().id("order_id", "ID"));

    // Without the key every row would look like the same parent
    assert!(matches!(
        bind_list(&mut rows, &Kind::Record(user_type()), Some(&map)),
        Err(BindError::MissingIdColumn { column, .. }) if column == "user_id"
    ));
}

#[test]
fn test_missing_collection_id_column_is_error() {
    let mut rows = MemoryRows::new(
        ["user_id", "total"],
        vec![vec![Value::Int(1), Value::Float(2.0)]],
    );
    let map = user_map();
    assert!(matches!(
        bind_one(&mut rows, &user_type(), Some(&map)),
        Err(BindError::MissingIdColumn { record, column })
            if record == "Order" && column == "order_id"
    ));
}

#[test]
fn test_result_map_is_reusable_across_calls() {
    let map = user_map();
    let ty = user_type();
    for n in 1..=3 {
        let mut rows = joined_rows(vec![row(n, "x", Some(n * 10), Some(1.0))]);
        let user = bind_one(&mut rows, &ty, Some(&map)).unwrap();
        assert_eq!(user.get("ID"), Some(&Value::Int(n)));
        assert_eq!(orders(&user).len(), 1);
    }
}
