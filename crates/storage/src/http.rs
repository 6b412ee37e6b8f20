//! REST backend over blocking `ureq`.
//!
//! Every call runs inside `tokio::task::spawn_blocking` so the async runtime
//! is never blocked. Endpoints:
//!
//! - `GET/POST /api/{endpoint}/`, `PUT/DELETE /api/{endpoint}/{id}/`
//! - `GET /api/{endpoint}/export/?search=&date_from=&date_to=&facet=`
//! - `GET /api/catalog/{animals|employees}/`
//! - `POST /api/users/`
//!
//! Status classification lives in [`classify`] so it can be tested without a
//! server.

use std::marker::PhantomData;

use async_trait::async_trait;
use dairyops_core::{Credential, Entity, FilterCriteria, Record, RecordKind, RecordSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::BearerToken;
use crate::error::{FieldErrors, StoreError};
use crate::traits::{
    Account, AccountStore, CatalogKind, EntityCatalog, ExportFile, ExportService, ListHints,
    RecordStore,
};

/// Connection details shared by every HTTP store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBackend {
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpBackend {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The record store for kind `S` on this backend.
    pub fn records<S: RecordSchema>(&self) -> HttpRecordStore<S> {
        HttpRecordStore {
            backend: self.clone(),
            _kind: PhantomData,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

/// [`RecordStore`] for one record kind, talking to [`HttpBackend`].
pub struct HttpRecordStore<S: RecordSchema> {
    backend: HttpBackend,
    _kind: PhantomData<fn() -> S>,
}

// ──────────────────────────────────────────────
// Transport
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

struct RawResponse {
    status: u16,
    content_type: Option<String>,
    disposition: Option<String>,
    body: Vec<u8>,
}

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

fn send(
    method: Method,
    url: &str,
    auth: &BearerToken,
    body: Option<&Value>,
) -> Result<RawResponse, StoreError> {
    let agent = agent();
    let header = auth.header_value();
    let result = match method {
        Method::Get => agent.get(url).header("Authorization", &header).call(),
        Method::Delete => agent.delete(url).header("Authorization", &header).call(),
        Method::Post => agent
            .post(url)
            .header("Authorization", &header)
            .send_json(body.unwrap_or(&Value::Null)),
        Method::Put => agent
            .put(url)
            .header("Authorization", &header)
            .send_json(body.unwrap_or(&Value::Null)),
    };
    let response = result.map_err(|e| StoreError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    let header_text = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let content_type = header_text("content-type");
    let disposition = header_text("content-disposition");
    let body = response
        .into_body()
        .read_to_vec()
        .map_err(|e| StoreError::Network(format!("error reading response body: {}", e)))?;

    tracing::debug!(?method, url, status, "backend responded");
    Ok(RawResponse {
        status,
        content_type,
        disposition,
        body,
    })
}

async fn call(
    method: Method,
    url: String,
    auth: &BearerToken,
    body: Option<Value>,
) -> Result<RawResponse, StoreError> {
    let auth = auth.clone();
    tokio::task::spawn_blocking(move || send(method, &url, &auth, body.as_ref()))
        .await
        .map_err(|e| StoreError::Network(format!("task join error: {}", e)))?
}

/// Map a non-success status and its body onto the error taxonomy.
///
/// 401 and 403 both mean the session is no longer usable; 404 is a vanished
/// record; 400 with a JSON object body is a field-keyed rejection. Anything
/// else, including a 400 with an unreadable body, is unexpected.
pub fn classify(status: u16, body: &[u8]) -> StoreError {
    let text = String::from_utf8_lossy(body).trim().to_string();
    match status {
        401 | 403 => StoreError::Unauthenticated(if text.is_empty() {
            format!("backend returned {}", status)
        } else {
            text
        }),
        404 => StoreError::NotFound {
            kind: String::new(),
            id: String::new(),
        },
        400 => serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| FieldErrors::from_json(&v))
            .map(StoreError::Rejected)
            .unwrap_or(StoreError::Unexpected {
                status,
                message: text,
            }),
        _ => StoreError::Unexpected {
            status,
            message: text,
        },
    }
}

fn expect_success(response: &RawResponse) -> Result<(), StoreError> {
    if (200..300).contains(&response.status) {
        Ok(())
    } else {
        Err(classify(response.status, &response.body))
    }
}

fn decode<T: DeserializeOwned>(response: &RawResponse) -> Result<T, StoreError> {
    let mut value: Value =
        serde_json::from_slice(&response.body).map_err(|e| StoreError::Unexpected {
            status: response.status,
            message: format!("response is not JSON: {}", e),
        })?;
    stringify_ids(&mut value);
    serde_json::from_value(value).map_err(|e| StoreError::Unexpected {
        status: response.status,
        message: format!("could not parse response: {}", e),
    })
}

/// The backend sends numeric primary keys; records carry ids as text.
fn stringify_ids(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(stringify_ids),
        Value::Object(map) => {
            for key in ["id", "owner_ref"] {
                if let Some(Value::Number(n)) = map.get(key) {
                    let text = n.to_string();
                    map.insert(key.to_string(), Value::String(text));
                }
            }
        }
        _ => {}
    }
}

fn encode<T: serde::Serialize>(payload: &T) -> Result<Value, StoreError> {
    serde_json::to_value(payload).map_err(|e| StoreError::Unexpected {
        status: 0,
        message: format!("could not encode payload: {}", e),
    })
}

/// Percent-encode a query string value.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(ch),
            ' ' => out.push_str("%20"),
            _ => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).as_bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    out
}

fn query(pairs: &[(&str, String)]) -> String {
    let parts: Vec<String> = pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, urlencoded(v)))
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

fn date_param(date: Option<time::Date>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

/// Query string forwarded to the export endpoint.
pub fn export_query(criteria: &FilterCriteria) -> String {
    query(&[
        ("search", criteria.free_text.trim().to_string()),
        ("date_from", date_param(criteria.date_from)),
        ("date_to", date_param(criteria.date_to)),
        ("facet", criteria.active_facet().unwrap_or_default().to_string()),
    ])
}

/// `attachment; filename="x.xlsx"` -> `x.xlsx`
fn attachment_name(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

// ──────────────────────────────────────────────
// Trait implementations
// ──────────────────────────────────────────────

#[async_trait]
impl<S: RecordSchema> RecordStore<S> for HttpRecordStore<S> {
    async fn list(
        &self,
        auth: &BearerToken,
        hints: &ListHints,
    ) -> Result<Vec<Record<S>>, StoreError> {
        let url = format!(
            "{}{}",
            self.backend.url(&format!("{}/", S::KIND.endpoint())),
            query(&[
                ("date_from", date_param(hints.date_from)),
                ("date_to", date_param(hints.date_to)),
            ])
        );
        let response = call(Method::Get, url, auth, None).await?;
        expect_success(&response)?;
        decode(&response)
    }

    async fn create(
        &self,
        auth: &BearerToken,
        payload: &Record<S>,
    ) -> Result<Record<S>, StoreError> {
        let url = self.backend.url(&format!("{}/", S::KIND.endpoint()));
        let response = call(Method::Post, url, auth, Some(encode(payload)?)).await?;
        expect_success(&response)?;
        decode(&response)
    }

    async fn update(
        &self,
        auth: &BearerToken,
        id: &str,
        payload: &Record<S>,
    ) -> Result<Record<S>, StoreError> {
        let url = self
            .backend
            .url(&format!("{}/{}/", S::KIND.endpoint(), urlencoded(id)));
        let response = call(Method::Put, url, auth, Some(encode(payload)?)).await?;
        expect_success(&response).map_err(|e| with_target(e, S::KIND, id))?;
        decode(&response)
    }

    async fn delete(&self, auth: &BearerToken, id: &str) -> Result<(), StoreError> {
        let url = self
            .backend
            .url(&format!("{}/{}/", S::KIND.endpoint(), urlencoded(id)));
        let response = call(Method::Delete, url, auth, None).await?;
        expect_success(&response).map_err(|e| with_target(e, S::KIND, id))
    }
}

fn with_target(error: StoreError, kind: RecordKind, id: &str) -> StoreError {
    match error {
        StoreError::NotFound { .. } => StoreError::NotFound {
            kind: kind.endpoint().to_string(),
            id: id.to_string(),
        },
        other => other,
    }
}

#[async_trait]
impl EntityCatalog for HttpBackend {
    async fn list(
        &self,
        auth: &BearerToken,
        kind: CatalogKind,
    ) -> Result<Vec<Entity>, StoreError> {
        let url = self.url(&format!("catalog/{}/", kind.endpoint()));
        let response = call(Method::Get, url, auth, None).await?;
        expect_success(&response)?;
        decode(&response)
    }
}

#[async_trait]
impl ExportService for HttpBackend {
    async fn export(
        &self,
        auth: &BearerToken,
        kind: RecordKind,
        criteria: &FilterCriteria,
    ) -> Result<ExportFile, StoreError> {
        let url = format!(
            "{}{}",
            self.url(&format!("{}/export/", kind.endpoint())),
            export_query(criteria)
        );
        let response = call(Method::Get, url, auth, None).await?;
        expect_success(&response)?;
        let file_name = response
            .disposition
            .as_deref()
            .and_then(attachment_name)
            .unwrap_or_else(|| format!("{}_export.xlsx", kind.endpoint()));
        Ok(ExportFile {
            file_name,
            content_type: response
                .content_type
                .unwrap_or_else(|| crate::memory::XLSX_CONTENT_TYPE.to_string()),
            bytes: response.body,
        })
    }
}

#[async_trait]
impl AccountStore for HttpBackend {
    async fn create_account(
        &self,
        auth: &BearerToken,
        credential: &Credential,
    ) -> Result<Account, StoreError> {
        let url = self.url("users/");
        let response = call(Method::Post, url, auth, Some(encode(credential)?)).await?;
        if response.status == 403 {
            return Err(StoreError::Forbidden(
                String::from_utf8_lossy(&response.body).trim().to_string(),
            ));
        }
        expect_success(&response)?;
        decode(&response)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
