use std::net::SocketAddr;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use sysprop_client::{CallOutput, Client, ClientError, TypedKey};

/// Serve `app` on an ephemeral port from a background thread; the client is
/// blocking, so the server needs its own runtime.
fn serve(app: Router) -> String {
    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    format!("http://{}/", rx.recv().unwrap())
}

fn mock() -> Router {
    let op = |name: &str, params: &[&str]| {
        json!({"url": format!("/api/{name}"), "params": params, "doc": name})
    };
    let schema = json!({
        "add": {"url": "/api/add", "params": ["a", "b"], "doc": "adds"},
        "echo": op("echo", &["x"]),
        "accept": op("accept", &[]),
        "fail": op("fail", &[]),
        "missing": op("missing", &[]),
        "odd": op("odd", &[]),
        "crash": op("crash", &[]),
        "grid": op("grid", &[]),
    });

    Router::new()
        .route("/api", get(move || async move { Json(schema) }))
        .route(
            "/broken/api",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
        )
        .route(
            "/api/add",
            post(|Json(args): Json<Value>| async move {
                let sum = args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0);
                Json(json!({"result": sum}))
            }),
        )
        .route(
            "/api/echo",
            post(|Json(args): Json<Value>| async move { Json(json!({"result": args})) }),
        )
        .route(
            "/api/accept",
            post(|headers: HeaderMap| async move {
                let accept = headers
                    .get(header::ACCEPT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"result": accept}))
            }),
        )
        .route(
            "/api/fail",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"exc_type": "ValueError", "exc_value": "bad input"})),
                )
            }),
        )
        .route(
            "/api/missing",
            post(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"exc_type": "KeyError", "exc_value": ["a", "b"]})),
                )
            }),
        )
        .route(
            "/api/odd",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"exc_type": "SystemExit", "exc_value": 1})),
                )
            }),
        )
        .route(
            "/api/crash",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/api/grid",
            post(|| async {
                Json(json!({
                    "order": ["grid"],
                    "tables": {"grid": {
                        "title": "Grid", "rows_title": "n", "cols_title": "label",
                        "rows_type": "int", "cols_type": "str",
                        "rows": ["1", "2"], "cols": ["x"],
                    }},
                    "data": {"grid": {"x": {"1": 10, "2": 20}}},
                }))
            }),
        )
}

fn named(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[test]
fn positional_call_posts_named_arguments() {
    let client = Client::connect(&serve(mock())).unwrap();
    assert_eq!(client.operations()["add"].params, vec!["a", "b"]);
    assert_eq!(client.operations()["add"].doc, "adds");

    let output = client.call_positional("add", vec![json!(2), json!(3)]).unwrap();
    assert_eq!(output, CallOutput::Value(json!(5)));

    let output = client.call("echo", named(json!({"x": [1, "two"]}))).unwrap();
    assert_eq!(output.as_value(), Some(&json!({"x": [1, "two"]})));
}

#[test]
fn calls_ask_for_json() {
    let client = Client::connect(&serve(mock())).unwrap();
    let output = client.call("accept", Map::new()).unwrap();
    assert_eq!(output, CallOutput::Value(json!("application/json")));
}

#[test]
fn base_url_without_trailing_slash_works() {
    let base = serve(mock());
    let client = Client::connect(base.trim_end_matches('/')).unwrap();
    assert_eq!(
        client.call("add", named(json!({"a": 1, "b": 1}))).unwrap(),
        CallOutput::Value(json!(2))
    );
}

#[test]
fn arguments_must_match_the_schema() {
    let client = Client::connect(&serve(mock())).unwrap();
    let err = client.call("add", named(json!({"a": 1}))).unwrap_err();
    assert!(matches!(err, ClientError::Signature { .. }));
    let err = client.call_positional("add", vec![json!(1)]).unwrap_err();
    assert!(matches!(err, ClientError::Signature { .. }));
    let err = client.call("subtract", Map::new()).unwrap_err();
    assert!(matches!(err, ClientError::UnknownOperation { .. }));
}

#[test]
fn value_errors_are_reconstructed() {
    let client = Client::connect(&serve(mock())).unwrap();
    match client.call("fail", Map::new()).unwrap_err() {
        ClientError::Value { value, fields } => {
            assert_eq!(value, json!("bad input"));
            assert!(fields.is_empty());
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn key_errors_keep_every_value() {
    let client = Client::connect(&serve(mock())).unwrap();
    let err = client.call("missing", Map::new()).unwrap_err();
    assert_eq!(err.to_string(), "KeyError: [\"a\",\"b\"]");
    assert!(matches!(err, ClientError::Key { .. }));
}

#[test]
fn unknown_error_types_are_protocol_errors() {
    let client = Client::connect(&serve(mock())).unwrap();
    let err = client.call("odd", Map::new()).unwrap_err();
    assert!(matches!(err, ClientError::Protocol { .. }));
}

#[test]
fn server_errors_carry_the_raw_body() {
    let client = Client::connect(&serve(mock())).unwrap();
    match client.call("crash", Map::new()).unwrap_err() {
        ClientError::Server { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn table_keys_are_restored_to_their_declared_type() {
    let client = Client::connect(&serve(mock())).unwrap();
    let output = client.call("grid", Map::new()).unwrap();
    let grid = output.as_tables().unwrap().get("grid").unwrap();
    assert_eq!(grid.rows, vec![TypedKey::Int(1), TypedKey::Int(2)]);
    assert_eq!(grid.get("x", 1), Some(&json!(10)));
    assert_eq!(grid.get("x", 2), Some(&json!(20)));
}

#[test]
fn failed_discovery_produces_no_client() {
    let base = format!("{}broken/", serve(mock()));
    match Client::connect(&base).unwrap_err() {
        ClientError::Status { status, .. } => assert_eq!(status, 500),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let err = Client::connect("http://127.0.0.1:1/").unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[test]
fn calls_the_bundled_demo_tool() {
    let state = sysprop_server::AppState::new(sysprop_server::ServerConfig::default()).unwrap();
    let client = Client::connect(&serve(sysprop_server::router(state))).unwrap();
    assert_eq!(
        client.operations()["demo"].params,
        vec!["temperatures", "scale1", "scale2", "compounds"]
    );

    let output = client
        .call_positional(
            "demo",
            vec![
                json!({"start": 10, "stop": 30, "count": 3}),
                json!(2),
                json!(3),
                json!(["CCO", "O"]),
            ],
        )
        .unwrap();
    let result = output.as_tables().unwrap();
    assert_eq!(
        result.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        vec!["temps", "compounds"]
    );

    let temps = result.get("temps").unwrap();
    assert_eq!(temps.rows[0], TypedKey::Float(10.0));
    assert_eq!(temps.get(3, 30.0).and_then(Value::as_f64), Some(90.0));

    let compounds = result.get("compounds").unwrap();
    assert_eq!(compounds.get("Length", "CCO"), Some(&json!(3)));

    match client
        .call_positional("demo", vec![json!(500), json!(2), json!(3), json!("O")])
        .unwrap_err()
    {
        ClientError::Value { fields, .. } => assert_eq!(fields[0].field, "temperatures"),
        other => panic!("unexpected: {other:?}"),
    }
}
