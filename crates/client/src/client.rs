//! Remote store HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). One request per
//! operation, bearer token on every authenticated call.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::auth::Credentials;
use crate::error::StoreError;
use crate::records::{
    selector_value, EntityRecord, EntityTypeRecord, NewRelation, NewRelationType, Properties,
    RelationRecord, RelationTypeRecord,
};
use crate::store::RemoteStore;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Remote store client (blocking).
#[derive(Clone)]
pub struct HttpStore {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

impl HttpStore {
    /// Log in with `creds` and return a client carrying the issued token.
    pub fn connect(api_base: &str, creds: &Credentials, timeout: Duration) -> Result<Self, StoreError> {
        let http = build_http(timeout)?;
        let api_base = normalize_base(api_base);
        let token = authenticate(&http, &api_base, creds)?;
        log::info!("authenticated to {} as {}", api_base, creds.user);
        Ok(Self { http, api_base, token })
    }

    /// Client for an already-issued bearer token.
    pub fn with_token(api_base: &str, token: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            http: build_http(timeout)?,
            api_base: normalize_base(api_base),
            token: token.into(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, StoreError> {
        let request = self.http.get(self.url(path)).bearer_auth(&self.token).query(query);
        execute(request)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        let request = self.http.post(self.url(path)).bearer_auth(&self.token).json(body);
        execute(request)
    }
}

impl RemoteStore for HttpStore {
    fn active_entity_types(&self) -> Result<Vec<EntityTypeRecord>, StoreError> {
        let query = vec![
            ("collectionName".to_string(), "types".to_string()),
            ("active".to_string(), "true".to_string()),
        ];
        let json = self.get("entity/get", &query)?;
        decode(result_array(&json)?, &json)
    }

    fn query_entity(
        &self,
        collection: &str,
        selector: &Properties,
    ) -> Result<Option<EntityRecord>, StoreError> {
        let mut query = vec![("collectionName".to_string(), collection.to_string())];
        query.extend(selector.iter().map(|(field, value)| (field.clone(), selector_value(value))));

        let json = self.get("entity/get", &query)?;
        let Some(first) = result_array(&json)?.first() else {
            return Ok(None);
        };
        let id = json_id(first, "_id").ok_or_else(|| {
            StoreError::protocol(format!("entity in '{collection}' has no _id"), json.to_string())
        })?;
        let fields = first.as_object().cloned().unwrap_or_default();
        Ok(Some(EntityRecord { id, fields }))
    }

    fn create_entity(&self, collection: &str, properties: &Properties) -> Result<String, StoreError> {
        let body = json!({ "collectionName": collection, "value": properties });
        let json = self.post_json("entity/create", &body)?;
        json_id(&json, "_id")
            .ok_or_else(|| StoreError::protocol("missing _id in entity/create response", json.to_string()))
    }

    fn update_entity(
        &self,
        collection: &str,
        id: &str,
        properties: &Properties,
    ) -> Result<Value, StoreError> {
        let body = json!({ "collectionName": collection, "id": id, "value": properties });
        self.post_json("entity/update", &body)
    }

    fn active_relation_types(&self) -> Result<Vec<RelationTypeRecord>, StoreError> {
        let json = self.get("relation/getActiveRelationTypes", &[])?;
        decode(result_array(&json)?, &json)
    }

    fn relations(&self) -> Result<Vec<RelationRecord>, StoreError> {
        let json = self.get("relation/get", &[])?;
        let items = result_array(&json)?;
        let records: Vec<RelationRecord> =
            items.iter().filter_map(|item| serde_json::from_value(item.clone()).ok()).collect();
        if records.len() < items.len() {
            log::debug!("dropped {} undecodable relation entries", items.len() - records.len());
        }
        Ok(records)
    }

    fn create_relation_type(&self, relation_type: &NewRelationType) -> Result<String, StoreError> {
        let json = self.post_json("relation/createRelationType", &json!({ "value": relation_type }))?;
        json_id(&json, "_id").ok_or_else(|| {
            StoreError::protocol("missing _id in relation/createRelationType response", json.to_string())
        })
    }

    fn create_relation(&self, relation: &NewRelation) -> Result<String, StoreError> {
        let json = self.post_json("relation/create", &json!({ "value": relation }))?;
        json_id(&json, "_id")
            .ok_or_else(|| StoreError::protocol("missing _id in relation/create response", json.to_string()))
    }
}

// ── Free functions ──────────────────────────────────────────────────

fn build_http(timeout: Duration) -> Result<reqwest::blocking::Client, StoreError> {
    reqwest::blocking::Client::builder()
        .user_agent(format!("mango/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| StoreError::Config(format!("failed to create HTTP client: {e}")))
}

fn normalize_base(api_base: &str) -> String {
    api_base.trim_end_matches('/').to_string()
}

/// `POST users/authenticate` → `jwtToken`.
fn authenticate(
    http: &reqwest::blocking::Client,
    api_base: &str,
    creds: &Credentials,
) -> Result<String, StoreError> {
    let request = http.post(format!("{api_base}/users/authenticate")).json(creds);
    let json = match execute(request) {
        // Login endpoints commonly answer bad credentials with 400
        Err(StoreError::Rejected { status: 400, body }) => {
            return Err(StoreError::Auth(format!(
                "login for '{}' refused (HTTP 400): {body}",
                creds.user
            )));
        }
        other => other?,
    };

    json["jwtToken"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| StoreError::protocol("missing jwtToken in authenticate response", json.to_string()))
}

/// Send a request and classify the outcome.
fn execute(request: reqwest::blocking::RequestBuilder) -> Result<Value, StoreError> {
    let response = request.send().map_err(|e| StoreError::Remote(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response.text().map_err(|e| StoreError::Remote(e.to_string()))?;

    match status {
        200..=299 => {}
        401 | 403 => return Err(StoreError::Auth(format!("credential rejected (HTTP {status}): {body}"))),
        500..=599 => return Err(StoreError::Remote(format!("HTTP {status}: {body}"))),
        _ => return Err(StoreError::Rejected { status, body }),
    }

    serde_json::from_str(&body).map_err(|e| StoreError::protocol(format!("response is not JSON: {e}"), body))
}

fn result_array(json: &Value) -> Result<&Vec<Value>, StoreError> {
    json.get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::protocol("missing result array in response", json.to_string()))
}

fn decode<T: DeserializeOwned>(items: &[Value], raw: &Value) -> Result<Vec<T>, StoreError> {
    items
        .iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| {
                StoreError::protocol(format!("unexpected record shape: {e}"), raw.to_string())
            })
        })
        .collect()
}

/// Identifiers may arrive as strings or numbers.
fn json_id(json: &Value, key: &str) -> Option<String> {
    json[key]
        .as_str()
        .map(String::from)
        .or_else(|| json[key].as_i64().map(|n| n.to_string()))
}
