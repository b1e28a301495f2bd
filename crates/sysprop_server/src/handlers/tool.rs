//! Form endpoints: field schema and rendered submissions

use axum::{
    Form, Json,
    body::Body,
    extract::{Path, State, rejection::FormRejection},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use sysprop_api::{ApiError, FormatOption, ToolForm};
use sysprop_core::format::{self, FormatRegistry, Rendered};
use sysprop_core::render::html::wrap_document;
use tracing::{debug, warn};

use super::{accept_header, reject, run_blocking};
use crate::state::AppState;

/// Form field naming the desired output MIME type
pub const OUTPUT_FORMAT_FIELD: &str = "output_format";

/// `GET /tool/{name}`
pub async fn form_schema(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ToolForm>, ApiError> {
    let tool = state.tools.require(&name).map_err(|e| reject(&name, e))?;
    Ok(Json(ToolForm {
        name: tool.name().to_string(),
        title: tool.title().to_string(),
        doc: tool.doc().to_string(),
        fields: tool.params().to_vec(),
        formats: state
            .formats
            .list_formats()
            .into_iter()
            .map(|(mimetype, label)| FormatOption {
                mimetype: mimetype.to_string(),
                label: label.to_string(),
            })
            .collect(),
    }))
}

/// The explicit `output_format` field wins over the `Accept` header
fn choose_format(
    formats: &FormatRegistry,
    fields: &[(String, String)],
    accept: &str,
) -> Result<String, ApiError> {
    let available = || {
        formats
            .list_formats()
            .into_iter()
            .map(|(mimetype, _)| mimetype.to_string())
            .collect::<Vec<_>>()
    };
    let requested = fields
        .iter()
        .find(|(key, _)| key == OUTPUT_FORMAT_FIELD)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty());

    let entry = match requested {
        Some(mimetype) => formats
            .get(mimetype)
            .ok_or_else(|| ApiError::not_acceptable(mimetype, available()))?,
        None => formats
            .negotiate(accept)
            .ok_or_else(|| ApiError::not_acceptable(accept, available()))?,
    };
    Ok(entry.mimetype.clone())
}

fn form_rejection(rejection: FormRejection, limit: usize) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::form(rejection.body_text())
    }
}

fn into_response(rendered: Rendered) -> Result<Response, ApiError> {
    let header_error = |e: &dyn std::fmt::Display| ApiError::Core {
        message: format!("invalid response header: {e}"),
        json: String::new(),
    };

    let mut response = Response::new(Body::from(rendered.body));
    for (name, value) in &rendered.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| header_error(&e))?;
        let value = HeaderValue::from_str(value).map_err(|e| header_error(&e))?;
        response.headers_mut().insert(name, value);
    }
    Ok(response)
}

/// `POST /tool/{name}`: run a tool on form fields and render the result in
/// the chosen format
pub async fn submit(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Response, ApiError> {
    let tool = state
        .tools
        .require(&name)
        .map_err(|e| reject(&name, e))?
        .clone();
    let Form(fields) = form.map_err(|rejection| {
        warn!(tool = %name, %rejection, "rejected form body");
        form_rejection(rejection, state.config.max_body_bytes)
    })?;

    let mimetype = choose_format(&state.formats, &fields, accept_header(&headers))?;
    let args = tool.parse_form(&fields).map_err(|e| reject(&name, e))?;

    debug!(tool = %name, %mimetype, ?args, "form submission");
    let formats = state.formats.clone();
    let rendered = run_blocking(&name, move || {
        let result = tool.run(&args)?;
        let mut rendered = formats.render(&mimetype, &result)?;
        if mimetype == format::HTML {
            let fragment = String::from_utf8_lossy(&rendered.body);
            rendered.body = wrap_document(tool.title(), &fragment).into_bytes();
        }
        Ok(rendered)
    })
    .await?;

    into_response(rendered)
}
