use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sysprop_server::{AppState, ServerConfig, router};
use tower::ServiceExt;

fn app_with(config: ServerConfig) -> Router {
    router(AppState::new(config).unwrap())
}

fn app() -> Router {
    app_with(ServerConfig::default())
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn get(uri: &str, accept: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::ACCEPT, accept)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str, accept: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::ACCEPT, accept)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn demo_args() -> Value {
    json!({
        "temperatures": {"start": 10, "stop": 30, "count": 3},
        "scale1": 2,
        "scale2": 3,
        "compounds": ["CCO", "O"],
    })
}

const DEMO_FORM: &str = "temperatures-start=10&temperatures-stop=30&temperatures-count=3\
    &scale1=2&scale2=3&compounds-multi=CCO%0AO";

#[tokio::test]
async fn health_reports_ok() {
    let response = send(app(), get("/health", "application/json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn discovery_lists_tools_as_json() {
    let response = send(app(), get("/api", "application/json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["demo"]["url"], "/api/demo");
    assert_eq!(
        body["demo"]["params"],
        json!(["temperatures", "scale1", "scale2", "compounds"])
    );
}

#[tokio::test]
async fn discovery_serves_html_to_browsers() {
    let response = send(app(), get("/api", "text/html,application/xhtml+xml;q=0.9")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(page.contains("demo(temperatures, scale1, scale2, compounds)"));
}

#[tokio::test]
async fn discovery_rejects_unsupported_accept() {
    let response = send(app(), get("/api", "text/plain")).await;
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body_json(response).await["exc_type"], "KeyError");
}

#[tokio::test]
async fn rpc_call_returns_tables() {
    let response = send(app(), post_json("/api/demo", &demo_args())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["order"], json!(["temps", "compounds"]));
    let temps = &body["tables"]["temps"];
    assert_eq!(temps["title"], "Demo 1");
    assert_eq!(temps["rows_type"], "float");
    assert_eq!(temps["cols_type"], "int");
    assert_eq!(temps["rows"], json!(["10", "20", "30"]));
    assert_eq!(temps["cols"], json!(["2", "3"]));
    assert_eq!(body["data"]["temps"]["3"]["30"].as_f64(), Some(90.0));
    assert_eq!(body["data"]["compounds"]["Length"]["CCO"], 3);
    assert_eq!(body["tables"]["compounds"]["rows_type"], "str");
}

#[tokio::test]
async fn rpc_validation_failure_is_a_value_error() {
    let mut args = demo_args();
    args["scale1"] = json!("two");
    let response = send(app(), post_json("/api/demo", &args)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["exc_type"], "ValueError");
    assert_eq!(body["fields"][0]["field"], "scale1");
}

#[tokio::test]
async fn rpc_unknown_tool_is_a_name_error() {
    let response = send(app(), post_json("/api/nosuch", &json!({}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["exc_type"], "NameError");
}

#[tokio::test]
async fn rpc_malformed_json_is_a_bad_request() {
    let request = Request::post("/api/demo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["exc_type"], "ValueError");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = ServerConfig {
        max_body_bytes: 16,
        ..ServerConfig::default()
    };
    let response = send(app_with(config), post_json("/api/demo", &demo_args())).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn form_schema_lists_fields_and_formats() {
    let response = send(app(), get("/tool/demo", "application/json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Demo function");
    assert_eq!(body["fields"][0]["kind"], "float_range");
    assert_eq!(body["formats"][0]["mimetype"], "application/json");
    assert_eq!(body["formats"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn form_output_format_field_selects_a_download() {
    let body = format!("{DEMO_FORM}&output_format=application%2Fxml");
    let response = send(app(), post_form("/tool/demo", &body, "text/html")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/xml"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=sysprop.xml"
    );
    let xml = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(xml.contains("Demo 1"));
}

#[tokio::test]
async fn form_falls_back_to_accept_negotiation() {
    let response = send(app(), post_form("/tool/demo", DEMO_FORM, "text/html")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<title>Demo function</title>"));
    assert!(page.contains("<caption>Demo 1</caption>"));
}

#[tokio::test]
async fn form_with_unknown_output_format_is_not_acceptable() {
    let body = format!("{DEMO_FORM}&output_format=text%2Fplain");
    let response = send(app(), post_form("/tool/demo", &body, "")).await;
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body_json(response).await["exc_type"], "KeyError");
}

#[tokio::test]
async fn form_missing_fields_report_each_field() {
    let response = send(app(), post_form("/tool/demo", "scale1=2", "text/html")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["temperatures", "scale2", "compounds"]);
}
