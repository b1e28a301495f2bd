//! JSON RPC endpoints: discovery and calls

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use quick_xml::escape::escape;
use serde_json::Value;
use sysprop_api::{ApiError, ApiSchema, OperationInfo, ResultPayload};
use sysprop_core::format::{self, best_match};
use sysprop_core::render::html::wrap_document;
use tracing::{debug, warn};

use super::{accept_header, reject, run_blocking};
use crate::state::AppState;

const DISCOVERY_FORMATS: [&str; 2] = [format::JSON, format::HTML];

/// Discovery document for every registered tool
pub fn schema(state: &AppState) -> ApiSchema {
    state
        .tools
        .iter()
        .map(|tool| {
            let name = tool.name().to_string();
            let info = OperationInfo::for_tool(tool.as_ref(), format!("/api/{name}"));
            (name, info)
        })
        .collect()
}

fn docs_page(schema: &ApiSchema) -> String {
    let mut body = String::from("<dl class=\"operations\">");
    for (name, info) in schema {
        body.push_str(&format!(
            "<dt><code>{}({})</code></dt><dd><p>{}</p><p>{}</p><p>POST <code>{}</code></p></dd>",
            escape(name.as_str()),
            escape(info.params.join(", ").as_str()),
            escape(info.title.as_str()),
            escape(info.doc.as_str()),
            escape(info.url.as_str()),
        ));
    }
    body.push_str("</dl>");
    wrap_document("API", &body)
}

/// `GET /api`: JSON for programs, a plain listing for browsers
pub async fn discovery(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let accept = accept_header(&headers);
    let schema = schema(&state);
    match best_match(accept, &DISCOVERY_FORMATS) {
        Some(format::JSON) => Ok(Json(schema).into_response()),
        Some(_) => Ok(Html(docs_page(&schema)).into_response()),
        None => {
            warn!(accept, "no acceptable discovery format");
            Err(ApiError::not_acceptable(
                accept,
                DISCOVERY_FORMATS.iter().map(|m| m.to_string()).collect(),
            ))
        }
    }
}

fn json_rejection(rejection: JsonRejection, limit: usize) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::Json {
            message: rejection.body_text(),
        }
    }
}

/// `POST /api/{name}`: run a tool on JSON arguments and return every table
pub async fn call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ResultPayload>, ApiError> {
    let tool = state
        .tools
        .require(&name)
        .map_err(|e| reject(&name, e))?
        .clone();
    let Json(arguments) = payload.map_err(|rejection| {
        warn!(tool = %name, %rejection, "rejected request body");
        json_rejection(rejection, state.config.max_body_bytes)
    })?;
    let args = tool.parse_json(&arguments).map_err(|e| reject(&name, e))?;

    debug!(tool = %name, ?args, "rpc call");
    let payload = run_blocking(&name, move || {
        let result = tool.run(&args)?;
        ResultPayload::from_result(&result)
    })
    .await?;
    Ok(Json(payload))
}
