// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Blocking HTTP/JSON implementation of [`CatalogStore`].

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{CatalogStore, FieldValue, Filter, Record, RecordId, StoreError, StoreResult};

/// Client for the catalog's HTTP resource API.
///
/// A collection lives at `{base}/{collection}`, a single record at
/// `{base}/{collection}/{id}`. Fetch is a GET with the filter terms as
/// query parameters and returns a JSON array of flat objects; create is a
/// POST returning `{"id": n}`; update is a PUT against the record URL.
pub struct HttpStore {
    http: reqwest::blocking::Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Deserialize)]
struct Created {
    id: RecordId,
}

impl HttpStore {
    /// Builds a client against `base_url`, optionally authenticating every
    /// request with `api_token` as a bearer token.
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    fn record_url(&self, collection: &str, id: RecordId) -> String {
        format!("{}/{}/{}", self.base_url, collection, id)
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check(
        collection: &str,
        response: reqwest::blocking::Response,
    ) -> StoreResult<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(StoreError::Status {
            collection: collection.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

impl CatalogStore for HttpStore {
    fn fetch(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        let request = self
            .http
            .get(self.collection_url(collection))
            .query(filter.terms());
        let response = Self::check(collection, self.authorize(request).send()?)?;
        let rows: Vec<Value> = response.json()?;
        debug!("Fetched {} {} record(s)", rows.len(), collection);
        rows.into_iter()
            .map(|row| decode_record(collection, row))
            .collect()
    }

    fn create(&self, collection: &str, values: &[(String, FieldValue)]) -> StoreResult<RecordId> {
        let request = self
            .http
            .post(self.collection_url(collection))
            .json(&encode(values));
        let response = Self::check(collection, self.authorize(request).send()?)?;
        let created: Created = response.json()?;
        debug!("Created {} record {}", collection, created.id);
        Ok(created.id)
    }

    fn update(
        &self,
        collection: &str,
        id: RecordId,
        values: &[(String, FieldValue)],
    ) -> StoreResult<()> {
        let request = self
            .http
            .put(self.record_url(collection, id))
            .json(&encode(values));
        Self::check(collection, self.authorize(request).send()?)?;
        debug!("Updated {} record {}", collection, id);
        Ok(())
    }
}

fn encode(values: &[(String, FieldValue)]) -> Map<String, Value> {
    let mut body = Map::new();
    for (column, value) in values {
        let value = match value {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Number(number) => Value::Number((*number).into()),
            FieldValue::Null => Value::Null,
        };
        body.insert(column.clone(), value);
    }
    body
}

fn decode_record(collection: &str, row: Value) -> StoreResult<Record> {
    let Value::Object(object) = row else {
        return Err(StoreError::Decode {
            collection: collection.to_string(),
            reason: "expected one JSON object per record".to_string(),
        });
    };
    let mut id = None;
    let mut fields = BTreeMap::new();
    for (column, value) in object {
        if column == "id" {
            id = value.as_u64().filter(|n| *n > 0);
            continue;
        }
        let field = match value {
            Value::Null => FieldValue::Null,
            Value::String(text) => FieldValue::Text(text),
            Value::Bool(flag) => FieldValue::Number(i64::from(flag)),
            Value::Number(number) => match number.as_i64() {
                Some(number) => FieldValue::Number(number),
                None => {
                    return Err(StoreError::Decode {
                        collection: collection.to_string(),
                        reason: format!("column '{column}' holds a non-integer number"),
                    })
                }
            },
            Value::Array(_) | Value::Object(_) => {
                return Err(StoreError::Decode {
                    collection: collection.to_string(),
                    reason: format!("column '{column}' is not a flat value"),
                })
            }
        };
        fields.insert(column, field);
    }
    match id {
        Some(id) => Ok(Record { id, fields }),
        None => Err(StoreError::MissingId {
            collection: collection.to_string(),
        }),
    }
}
