//! Firestore backend over the REST API.
//!
//! Batches go through `documents:commit`, which applies every write in the request
//! atomically. Each write replaces the whole document; [`FieldValue::ServerTimestamp`]
//! fields are sent as `REQUEST_TIME` transforms instead of values.

use crate::store::credentials::{ServiceAccountKey, TokenProvider};
use crate::store::traits::{
    CloudIOError, CloudResult, Document, DocumentStore, ErrorKind, FieldValue, Fields, WriteBatch,
    WriteOp,
};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;

pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

// Accepted by the emulator in place of a real token.
const EMULATOR_TOKEN: &str = "owner";

/// Connection settings for [`FirestoreStore`].
#[derive(Debug, Clone)]
pub struct FirestoreOptions {
    /// Overrides the key's `project_id` when set.
    pub project_id: Option<String>,
    /// `host:port` of a local emulator; disables the token exchange.
    pub emulator_host: Option<String>,
    /// Upper bound on every HTTP request, token exchange included. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for FirestoreOptions {
    fn default() -> Self {
        Self {
            project_id: None,
            emulator_host: None,
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

enum Auth {
    ServiceAccount(TokenProvider),
    Emulator,
}

pub struct FirestoreStore {
    http: Client,
    auth: Auth,
    base_url: String,
    documents_path: String,
}

impl FirestoreStore {
    /// Build a store for the key's project. No request is made until the first write.
    ///
    /// # Errors
    ///
    /// Returns `InternalError` if the HTTP client cannot be constructed
    pub fn new(key: ServiceAccountKey, options: &FirestoreOptions) -> CloudResult<Self> {
        let http = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| {
                CloudIOError::new(ErrorKind::InternalError, "failed to build HTTP client")
                    .with_source(e.to_string())
            })?;

        let project_id = options
            .project_id
            .clone()
            .unwrap_or_else(|| key.project_id.clone());
        let documents_path = format!("projects/{project_id}/databases/(default)/documents");

        let (base_url, auth) = match &options.emulator_host {
            Some(host) => (format!("http://{host}/v1"), Auth::Emulator),
            None => (
                FIRESTORE_ENDPOINT.to_string(),
                Auth::ServiceAccount(TokenProvider::new(key, http.clone())),
            ),
        };

        Ok(Self {
            http,
            auth,
            base_url,
            documents_path,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> CloudResult<RequestBuilder> {
        let token = match &self.auth {
            Auth::ServiceAccount(provider) => provider.token()?,
            Auth::Emulator => EMULATOR_TOKEN.to_string(),
        };
        Ok(request.bearer_auth(token))
    }

    fn document_name(&self, collection: &str, id: &str) -> CloudResult<String> {
        if collection.is_empty() || id.is_empty() || collection.contains('/') || id.contains('/') {
            return Err(CloudIOError::new(
                ErrorKind::InvalidInput,
                format!("invalid document path {collection}/{id}"),
            ));
        }
        Ok(format!("{}/{collection}/{id}", self.documents_path))
    }

    fn encode_write(&self, op: &WriteOp) -> CloudResult<Value> {
        let name = self.document_name(&op.collection, &op.id)?;
        let (fields, transforms) = encode_fields(&op.fields)?;
        let mut write = json!({
            "update": { "name": name, "fields": fields },
        });
        if !transforms.is_empty() {
            write["updateTransforms"] = Value::Array(transforms);
        }
        Ok(write)
    }

    fn commit_writes(&self, writes: &[WriteOp]) -> CloudResult<()> {
        let encoded = writes
            .iter()
            .map(|op| self.encode_write(op))
            .collect::<CloudResult<Vec<_>>>()?;
        let url = format!("{}/{}:commit", self.base_url, self.documents_path);
        debug!(url = %url, writes = encoded.len(), "committing writes");

        let request = self.http.post(&url).json(&json!({ "writes": encoded }));
        let response = self.authorize(request)?.send().map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, "commit rejected", body));
        }
        Ok(())
    }
}

impl DocumentStore for FirestoreStore {
    fn commit(&self, batch: WriteBatch) -> CloudResult<()> {
        self.commit_writes(batch.writes())
    }

    fn set_document(&self, collection: &str, id: &str, fields: Fields) -> CloudResult<()> {
        let op = WriteOp {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        };
        self.commit_writes(std::slice::from_ref(&op))
    }

    fn get(&self, collection: &str, id: &str) -> CloudResult<Option<Document>> {
        let url = format!("{}/{}", self.base_url, self.document_name(collection, id)?);
        debug!(url = %url, "fetching document");

        let response = self
            .authorize(self.http.get(&url))?
            .send()
            .map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, "get rejected", body));
        }

        let body: Value = response.json().map_err(|e| {
            CloudIOError::new(ErrorKind::InternalError, "malformed document response")
                .with_source(e.to_string())
        })?;
        let fields = match body.get("fields").and_then(Value::as_object) {
            Some(map) => decode_fields(map)?,
            None => Fields::new(),
        };
        Ok(Some(Document {
            id: id.to_string(),
            fields,
        }))
    }
}

// ============================================================================
// Error mapping
// ============================================================================

pub(crate) fn transport_error(err: reqwest::Error) -> CloudIOError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() || err.is_request() {
        ErrorKind::Network
    } else {
        ErrorKind::Other
    };
    CloudIOError::new(kind, "request to store failed").with_source(err.to_string())
}

pub(crate) fn status_error(status: StatusCode, context: &str, body: String) -> CloudIOError {
    let kind = match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Authorization,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::BAD_REQUEST => ErrorKind::InvalidInput,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        StatusCode::SERVICE_UNAVAILABLE => ErrorKind::ServiceUnavailable,
        s if s.is_server_error() => ErrorKind::InternalError,
        _ => ErrorKind::Other,
    };
    let err = CloudIOError::new(kind, format!("{context}: HTTP {status}"));
    if body.is_empty() {
        err
    } else {
        err.with_source(body)
    }
}

// ============================================================================
// Value encoding
// ============================================================================

fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn encode_fields(fields: &Fields) -> CloudResult<(Map<String, Value>, Vec<Value>)> {
    let mut encoded = Map::new();
    let mut transforms = Vec::new();
    for (name, value) in fields {
        if *value == FieldValue::ServerTimestamp {
            transforms.push(json!({
                "fieldPath": field_path(name),
                "setToServerValue": "REQUEST_TIME",
            }));
        } else {
            encoded.insert(name.clone(), encode_value(value)?);
        }
    }
    Ok((encoded, transforms))
}

fn encode_value(value: &FieldValue) -> CloudResult<Value> {
    Ok(match value {
        FieldValue::Integer(v) => json!({ "integerValue": v.to_string() }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Array(values) => {
            let values = values.iter().map(encode_value).collect::<CloudResult<Vec<_>>>()?;
            json!({ "arrayValue": { "values": values } })
        }
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::AutoSi, true) })
        }
        FieldValue::ServerTimestamp => {
            return Err(CloudIOError::new(
                ErrorKind::InvalidInput,
                "server timestamps are only supported as top-level fields",
            ));
        }
    })
}

fn decode_fields(map: &Map<String, Value>) -> CloudResult<Fields> {
    map.iter()
        .map(|(name, value)| -> CloudResult<(String, FieldValue)> {
            Ok((name.clone(), decode_value(value)?))
        })
        .collect()
}

fn decode_value(value: &Value) -> CloudResult<FieldValue> {
    let unsupported = || {
        CloudIOError::new(ErrorKind::InternalError, "unsupported field value")
            .with_source(value.to_string())
    };

    if let Some(raw) = value.get("integerValue") {
        let parsed = match raw {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        return parsed.map(FieldValue::Integer).ok_or_else(unsupported);
    }
    if let Some(s) = value.get("stringValue").and_then(Value::as_str) {
        return Ok(FieldValue::String(s.to_string()));
    }
    if let Some(array) = value.get("arrayValue") {
        let values = match array.get("values").and_then(Value::as_array) {
            Some(values) => values
                .iter()
                .map(decode_value)
                .collect::<CloudResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        return Ok(FieldValue::Array(values));
    }
    if let Some(s) = value.get("timestampValue").and_then(Value::as_str) {
        let ts = DateTime::parse_from_rfc3339(s).map_err(|_| unsupported())?;
        return Ok(FieldValue::Timestamp(ts.with_timezone(&Utc)));
    }
    Err(unsupported())
}
