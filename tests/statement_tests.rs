// tests/statement_tests.rs

use std::{str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use sqlmold::{
    Action, Arity, Catalog, Config, ConfigError, Dialect, Field, ForeachNode, FunctionRegistry,
    Kind, MemoryRows, Node, RecordType, RenderError, ResultMap, Statement, StatementError, Value,
    json,
};

fn when(test: &str, sql: &str) -> Node {
    Node::condition(test, vec![Node::text(sql)]).unwrap()
}

fn params(pairs: Vec<(&str, Value)>) -> Value {
    pairs.into_iter().collect()
}

fn user_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_fragment("user", "columns", Node::text("id, name"));
    catalog.add_fragment("common", "tenant", Node::text("AND tenant_id = #{tenant}"));

    let search = Node::group(vec![
        Node::text("SELECT"),
        catalog.include("user", "columns"),
        Node::text("FROM users"),
        Node::where_clause(vec![
            catalog.include("user", "common.tenant"),
            when("name != nil", "AND name = #{name}"),
            Node::Foreach(
                ForeachNode::new("ids", "id", vec![Node::text("#{id}")])
                    .open("AND id IN (")
                    .close(")")
                    .separator(", "),
            ),
        ]),
    ]);
    catalog
        .add_statement("user", Statement::new("search", Action::Select, search))
        .unwrap();

    let remove = Node::text("DELETE FROM users WHERE id = #{param}");
    catalog
        .add_statement("user", Statement::new("remove", Action::Delete, remove))
        .unwrap();
    catalog
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn test_build_with_fragments_and_dialect() {
    let catalog = user_catalog();
    let config = Config::new().with_dialect(Dialect::Postgres);
    let p = params(vec![
        ("tenant", Value::Int(9)),
        ("name", Value::Null),
        ("ids", Value::from(vec![1, 2])),
    ]);

    let (sql, args) = catalog.build("user.search", &config, &p).unwrap();
    assert_eq!(
        sql,
        "SELECT id, name FROM users WHERE tenant_id = $1 AND id IN ($2, $3)"
    );
    assert_eq!(args, vec![Value::Int(9), Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_scalar_parameter_statement() {
    let catalog = user_catalog();
    let (sql, args) = catalog
        .build("user.remove", &Config::new(), &Value::Int(4))
        .unwrap();
    assert_eq!(sql, "DELETE FROM users WHERE id = ?");
    assert_eq!(args, vec![Value::Int(4)]);
}

#[test]
fn test_custom_param_key() {
    let mut catalog = Catalog::new();
    catalog
        .add_statement(
            "t",
            Statement::new("get", Action::Select, Node::text("SELECT #{value}")),
        )
        .unwrap();
    let config = Config::new().with_param_key("value");
    let (_, args) = catalog.build("t.get", &config, &Value::from("x")).unwrap();
    assert_eq!(args, vec![Value::from("x")]);
}

#[test]
fn test_duplicate_statement() {
    let mut catalog = user_catalog();
    let err = catalog
        .add_statement(
            "user",
            Statement::new("remove", Action::Delete, Node::text("DELETE")),
        )
        .unwrap_err();
    assert!(matches!(err, StatementError::Duplicate(id) if id == "user.remove"));
}

#[test]
fn test_same_id_in_other_namespace_is_allowed() {
    let mut catalog = user_catalog();
    catalog
        .add_statement(
            "order",
            Statement::new("remove", Action::Delete, Node::text("DELETE FROM orders")),
        )
        .unwrap();
    assert_eq!(catalog.group("user").map(|g| g.len()), Some(2));
    assert_eq!(catalog.group("order").map(|g| g.len()), Some(1));
}

#[test]
fn test_statement_not_found() {
    let catalog = user_catalog();
    assert!(matches!(
        catalog.statement("user.nope"),
        Err(StatementError::NotFound(_))
    ));
    assert!(matches!(
        catalog.build("nope", &Config::new(), &Value::Null),
        Err(StatementError::NotFound(_))
    ));
}

#[test]
fn test_render_error_names_statement() {
    let catalog = user_catalog();
    let err = catalog
        .build("user.search", &Config::new(), &params(vec![]))
        .unwrap_err();
    match err {
        StatementError::Render { id, source } => {
            assert_eq!(id, "user.search");
            assert!(matches!(source, RenderError::Resolve(_)));
        }
        other => panic!("expected render error, got {:?}", other),
    }
}

#[test]
fn test_missing_fragment_surfaces_on_build() {
    let mut catalog = Catalog::new();
    let root = catalog.include("user", "gone");
    catalog
        .add_statement("user", Statement::new("q", Action::Select, root))
        .unwrap();
    let err = catalog
        .build("user.q", &Config::new(), &Value::Null)
        .unwrap_err();
    assert!(matches!(
        err,
        StatementError::Render {
            source: RenderError::FragmentNotFound(_),
            ..
        }
    ));
}

#[test]
fn test_config_functions_reach_conditions() {
    let mut catalog = Catalog::new();
    let root = Node::group(vec![
        Node::text("SELECT * FROM users"),
        Node::where_clause(vec![when("wanted(name)", "AND name = #{name}")]),
    ]);
    catalog
        .add_statement("user", Statement::new("find", Action::Select, root))
        .unwrap();
    let p = params(vec![("name", Value::from("ann"))]);

    // The builtin registry has no `wanted`
    let err = catalog.build("user.find", &Config::new(), &p).unwrap_err();
    assert!(matches!(
        err,
        StatementError::Render {
            source: RenderError::Condition { .. },
            ..
        }
    ));

    let mut functions = FunctionRegistry::builtin();
    functions.register("wanted", Arity::Exact(1), |args| {
        Ok(Value::Bool(args[0] == Value::from("ann")))
    });
    let config = Config::new().with_functions(Arc::new(functions));
    let (sql, args) = catalog.build("user.find", &config, &p).unwrap();
    assert_eq!(sql, "SELECT * FROM users WHERE name = ?");
    assert_eq!(args, vec![Value::from("ann")]);
}

#[test]
fn test_config_can_replace_builtins() {
    let mut catalog = Catalog::new();
    let root = Node::where_clause(vec![when("len(ids) > 0", "AND id IN (1)")]);
    catalog
        .add_statement("t", Statement::new("q", Action::Select, root))
        .unwrap();
    let p = params(vec![("ids", Value::from(vec![1]))]);

    let mut functions = FunctionRegistry::builtin();
    functions.register("len", Arity::Exact(1), |_| Ok(Value::Int(0)));
    let config = Config::new().with_functions(Arc::new(functions));

    assert_eq!(catalog.build("t.q", &Config::new(), &p).unwrap().0, "WHERE id IN (1)");
    assert_eq!(catalog.build("t.q", &config, &p).unwrap().0, "");
}

#[test]
fn test_action_parsing() {
    assert_eq!(Action::from_str("SELECT").unwrap(), Action::Select);
    assert_eq!("delete".parse::<Action>().unwrap(), Action::Delete);
    assert!(Action::Select.returns_rows());
    assert!(!Action::Update.returns_rows());
    assert!(matches!(
        Action::from_str("merge"),
        Err(StatementError::UnknownAction(_))
    ));
}

// ============================================================================
// Binding through statements
// ============================================================================

#[derive(Debug, Deserialize, PartialEq)]
struct Order {
    #[serde(rename = "ID")]
    id: i64,
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Orders")]
    orders: Vec<Order>,
}

#[test]
fn test_bind_and_decode() {
    let order = RecordType::builder("Order")
        .field(Field::new("ID", Kind::Int))
        .build();
    let user = RecordType::builder("User")
        .field(Field::new("ID", Kind::Int))
        .field(Field::new("Name", Kind::String))
        .field(Field::new("Orders", Kind::List(Box::new(Kind::Record(order)))))
        .build();
    let map = ResultMap::new()
        .id("user_id", "ID")
        .result("name", "Name")
        .collection("Orders", ResultMap::new().id("order_id", "ID"));

    let statement = Statement::new(
        "with_orders",
        Action::Select,
        Node::text(
            "SELECT u.id AS user_id, u.name, o.id AS order_id \
             FROM users u LEFT JOIN orders o ON o.user_id = u.id",
        ),
    )
    .with_result_map(Arc::new(map));

    let mut rows = MemoryRows::new(
        ["user_id", "name", "order_id"],
        vec![
            vec![Value::Int(1), Value::from("ann"), Value::Int(10)],
            vec![Value::Int(1), Value::from("ann"), Value::Int(11)],
            vec![Value::Int(2), Value::from("bob"), Value::Null],
        ],
    );
    let mut dest = Value::Null;
    statement
        .bind(&mut rows, &Kind::List(Box::new(Kind::Record(user))), &mut dest)
        .unwrap();

    let users: Vec<User> = json::decode(&dest).unwrap();
    assert_eq!(
        users,
        vec![
            User {
                id: 1,
                name: "ann".to_string(),
                orders: vec![Order { id: 10 }, Order { id: 11 }],
            },
            User {
                id: 2,
                name: "bob".to_string(),
                orders: vec![],
            },
        ]
    );
}

#[derive(Serialize)]
struct Filter {
    tenant: i64,
    name: Option<String>,
    ids: Vec<i64>,
}

#[test]
fn test_encoded_struct_as_parameter() {
    let catalog = user_catalog();
    let filter = Filter {
        tenant: 1,
        name: Some("ann".to_string()),
        ids: vec![],
    };
    let p = json::encode(&filter).unwrap();
    let (sql, args) = catalog.build("user.search", &Config::new(), &p).unwrap();
    assert_eq!(
        sql,
        "SELECT id, name FROM users WHERE tenant_id = ? AND name = ?"
    );
    assert_eq!(args, vec![Value::Int(1), Value::from("ann")]);
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_from_lookup() {
    let config = Config::from_lookup(|key: &str| match key {
        "SQLMOLD_DIALECT" => Some("postgresql".to_string()),
        "SQLMOLD_PARAM_KEY" => Some("arg".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.dialect(), Dialect::Postgres);
    assert_eq!(config.param_key(), "arg");
}

#[test]
fn test_config_defaults() {
    let config = Config::from_lookup(|_: &str| None).unwrap();
    assert_eq!(config.dialect(), Dialect::Mysql);
    assert_eq!(config.param_key(), "param");
}

#[test]
fn test_config_rejects_unknown_dialect() {
    let err = Config::from_lookup(|key: &str| {
        (key == "SQLMOLD_DIALECT").then(|| "db2".to_string())
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::Dialect(_)));
}
