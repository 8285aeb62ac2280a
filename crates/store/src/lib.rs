// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Flat-record resource store for the device catalog.
//!
//! Catalog collections (`vendor`, `microcontroller`, `peripheral`, ...) hold
//! flat records: an integer id plus named columns of text or numbers. The
//! [`CatalogStore`] trait is the seam between the reconciliation engine and
//! the wire; [`http::HttpStore`] talks to the real service and
//! [`memory::MemoryStore`] backs tests.

use std::collections::BTreeMap;

use thiserror::Error;

pub mod http;
pub mod memory;

/// Store interaction error.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure: connection, timeout, malformed HTTP.
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("store rejected {collection} request with status {status}: {body}")]
    Status {
        /// Collection the request addressed.
        collection: String,
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },
    /// The response decoded, but not into the shape records must have.
    #[error("malformed {collection} response: {reason}")]
    Decode {
        /// Collection the request addressed.
        collection: String,
        /// What was wrong with the payload.
        reason: String,
    },
    /// A fetched record came back without a usable id.
    #[error("{collection} record is missing a valid id")]
    MissingId {
        /// Collection the record belongs to.
        collection: String,
    },
    /// An update addressed a record that does not exist.
    #[error("{collection} record {id} does not exist")]
    NotFound {
        /// Collection the request addressed.
        collection: String,
        /// Id that was not found.
        id: RecordId,
    },
}

/// Convenience alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Identifier assigned by the store to a record. Always positive.
pub type RecordId = u64;

/// One column value as it travels over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text column. Numeric columns in canonical hex form also travel as
    /// text.
    Text(String),
    /// Integer column.
    Number(i64),
    /// Explicitly empty column.
    Null,
}

/// One stored record: its id plus flat named columns.
#[derive(Debug, Clone)]
pub struct Record {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// Column values keyed by column name.
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Column lookup; `None` covers both absent and explicitly-null columns.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        match self.fields.get(column) {
            Some(FieldValue::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    /// Text content of a column, when the column holds text.
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(FieldValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Conjunction of `column = value` terms passed to [`CatalogStore::fetch`].
#[derive(Debug, Clone, Default)]
pub struct Filter {
    terms: Vec<(String, String)>,
}

impl Filter {
    /// An empty filter matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `column = value` term.
    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.terms.push((column.to_string(), value.into()));
        self
    }

    /// The terms, in the order they were added. Used as query parameters.
    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    /// Whether a record satisfies every term. Text columns compare exactly,
    /// numeric columns through their decimal spelling; a null or absent
    /// column never matches.
    pub fn matches(&self, record: &Record) -> bool {
        self.terms.iter().all(|(column, want)| match record.get(column) {
            Some(FieldValue::Text(text)) => text == want,
            Some(FieldValue::Number(number)) => want.parse::<i64>() == Ok(*number),
            _ => false,
        })
    }
}

/// Catalog resource store: flat collections of records with integer ids.
///
/// The engine only ever fetches, creates, and updates. Nothing is deleted.
pub trait CatalogStore {
    /// All records of `collection` matching `filter`.
    fn fetch(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Record>>;

    /// Creates a record from the given columns and returns its id.
    fn create(&self, collection: &str, values: &[(String, FieldValue)]) -> StoreResult<RecordId>;

    /// Overwrites the named columns of an existing record. Columns not
    /// named keep their stored value.
    fn update(
        &self,
        collection: &str,
        id: RecordId,
        values: &[(String, FieldValue)],
    ) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entries: &[(&str, FieldValue)]) -> Record {
        Record {
            id: 1,
            fields: entries
                .iter()
                .map(|(column, value)| (column.to_string(), value.clone()))
                .collect(),
        }
    }

    #[test]
    fn filter_matches_text_and_number_columns() {
        let filter = Filter::new().eq("name", "UART0").eq("mcu_id", "9");
        let fits = record(&[
            ("name", FieldValue::Text("UART0".to_string())),
            ("mcu_id", FieldValue::Number(9)),
        ]);
        assert!(filter.matches(&fits));

        let wrong_parent = record(&[
            ("name", FieldValue::Text("UART0".to_string())),
            ("mcu_id", FieldValue::Number(10)),
        ]);
        assert!(!filter.matches(&wrong_parent));
    }

    #[test]
    fn null_and_absent_columns_never_match() {
        let filter = Filter::new().eq("name", "UART0");
        assert!(!filter.matches(&record(&[])));
        assert!(!filter.matches(&record(&[("name", FieldValue::Null)])));
    }

    #[test]
    fn record_get_hides_nulls() {
        let row = record(&[("protection", FieldValue::Null)]);
        assert!(row.get("protection").is_none());
        assert!(row.text("protection").is_none());
    }
}
