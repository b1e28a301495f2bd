//! Dynamic RPC client
//!
//! [`Client::connect`] fetches the server's discovery document once. Every
//! operation it lists can then be invoked through [`Client::call`] with
//! exactly the named parameters the document declares.

use std::collections::BTreeMap;

use reqwest::Url;
use reqwest::blocking::Response;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use sysprop_api::{ApiSchema, DISCOVERY_PATH, ErrorBody, ExcType, OperationInfo};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::result::CallOutput;

/// Where `sysprop-server` listens by default
pub const DEFAULT_URL: &str = "http://127.0.0.1:5000/";

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::blocking::Client,
    base: Url,
    operations: BTreeMap<String, OperationInfo>,
}

impl Client {
    /// Fetch the discovery document from `base`. Fails if the server cannot
    /// be reached or does not answer with a schema.
    pub fn connect(base: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("sysprop-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http(http, base)
    }

    pub fn with_http(http: reqwest::blocking::Client, base: &str) -> Result<Self> {
        // Without a trailing slash `join` would replace the last segment
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|e| ClientError::InvalidUrl {
            url: base.to_string(),
            message: e.to_string(),
        })?;
        let url = join(&base, DISCOVERY_PATH)?;

        let response = http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: response.text()?,
            });
        }
        let operations: ApiSchema = response
            .json()
            .map_err(|e| ClientError::protocol(format!("malformed discovery document: {e}")))?;

        info!(%url, operations = operations.len(), "fetched schema");
        Ok(Self {
            http,
            base,
            operations,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Every operation the server offers, by name
    pub fn operations(&self) -> &BTreeMap<String, OperationInfo> {
        &self.operations
    }

    pub fn operation(&self, name: &str) -> Result<&OperationInfo> {
        self.operations
            .get(name)
            .ok_or_else(|| ClientError::UnknownOperation {
                name: name.to_string(),
                available: self.operations.keys().cloned().collect(),
            })
    }

    /// Invoke `name` with named arguments. The argument names must match the
    /// operation's parameters exactly.
    pub fn call(&self, name: &str, args: Map<String, Value>) -> Result<CallOutput> {
        let operation = self.operation(name)?;
        check_signature(name, operation, &args)?;

        let url = join(&self.base, &operation.url)?;
        debug!(operation = name, %url, "calling");
        let response = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&args)
            .send()?;
        decode_response(name, response)
    }

    /// Invoke `name` with arguments in parameter order
    pub fn call_positional(&self, name: &str, args: Vec<Value>) -> Result<CallOutput> {
        let operation = self.operation(name)?;
        if args.len() != operation.params.len() {
            return Err(ClientError::Signature {
                operation: name.to_string(),
                message: format!(
                    "expected {} positional arguments, got {}",
                    operation.params.len(),
                    args.len()
                ),
                params: operation.params.clone(),
            });
        }
        let named = operation.params.iter().cloned().zip(args).collect();
        self.call(name, named)
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|e| ClientError::InvalidUrl {
        url: path.to_string(),
        message: e.to_string(),
    })
}

fn check_signature(name: &str, operation: &OperationInfo, args: &Map<String, Value>) -> Result<()> {
    let missing: Vec<&str> = operation
        .params
        .iter()
        .filter(|p| !args.contains_key(p.as_str()))
        .map(String::as_str)
        .collect();
    let unexpected: Vec<&str> = args
        .keys()
        .filter(|k| !operation.params.contains(k))
        .map(String::as_str)
        .collect();

    let message = match (missing.is_empty(), unexpected.is_empty()) {
        (true, true) => return Ok(()),
        (false, true) => format!("missing {}", missing.join(", ")),
        (true, false) => format!("unexpected {}", unexpected.join(", ")),
        (false, false) => format!(
            "missing {}; unexpected {}",
            missing.join(", "),
            unexpected.join(", ")
        ),
    };
    Err(ClientError::Signature {
        operation: name.to_string(),
        message,
        params: operation.params.clone(),
    })
}

fn decode_response(name: &str, response: Response) -> Result<CallOutput> {
    let status = response.status();
    let text = response.text()?;

    if status.is_client_error() {
        let body: ErrorBody = serde_json::from_str(&text).map_err(|_| {
            ClientError::protocol(format!("HTTP {status} without an error body: {text}"))
        })?;
        warn!(operation = name, exc_type = %body.exc_type, "call rejected");
        return Err(match ExcType::parse(&body.exc_type) {
            Some(ExcType::ValueError) => ClientError::Value {
                value: body.exc_value,
                fields: body.fields,
            },
            Some(ExcType::NameError) => ClientError::Name {
                value: body.exc_value,
            },
            Some(ExcType::KeyError) => ClientError::Key {
                value: body.exc_value,
            },
            None => {
                ClientError::protocol(format!("unsupported error type '{}'", body.exc_type))
            }
        });
    }
    if status.is_server_error() {
        warn!(operation = name, %status, "server error");
        return Err(ClientError::Server {
            status: status.as_u16(),
            body: text,
        });
    }
    if !status.is_success() {
        return Err(ClientError::protocol(format!("unexpected HTTP {status}")));
    }

    let body: Value = serde_json::from_str(&text)
        .map_err(|e| ClientError::protocol(format!("response is not JSON: {e}")))?;
    CallOutput::decode(body)
}
