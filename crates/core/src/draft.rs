// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Column drafts: the locally-known value set for one record instance.
//!
//! A draft is built fresh per instance from the document, compared against
//! the matched remote record, and submitted whole on create or update.
//! Columns the document says nothing about are never drafted, so their
//! stored values are never overwritten.

use catalog_store::{FieldValue, Record, RecordId};

use crate::hexval::HexValue;

#[derive(Debug, Clone)]
pub(crate) enum DraftValue {
    Text(String),
    Hex(HexValue),
    Int(i64),
    Id(RecordId),
}

/// Ordered set of drafted columns for one record.
#[derive(Debug, Clone, Default)]
pub(crate) struct Draft {
    columns: Vec<(&'static str, DraftValue)>,
}

impl Draft {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_text(&mut self, column: &'static str, value: &str) {
        self.columns
            .push((column, DraftValue::Text(value.trim().to_string())));
    }

    /// Drafts text only when present and non-empty.
    pub(crate) fn push_opt_text(&mut self, column: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            let value = value.trim();
            if !value.is_empty() {
                self.push_text(column, value);
            }
        }
    }

    /// Drafts a numeric column only when the value parsed.
    pub(crate) fn push_hex(&mut self, column: &'static str, value: &HexValue) {
        if value.is_some() {
            self.columns.push((column, DraftValue::Hex(value.clone())));
        }
    }

    pub(crate) fn push_int(&mut self, column: &'static str, value: i64) {
        self.columns.push((column, DraftValue::Int(value)));
    }

    pub(crate) fn push_id(&mut self, column: &'static str, id: RecordId) {
        self.columns.push((column, DraftValue::Id(id)));
    }

    /// Whether any drafted column disagrees with the record. A null or
    /// absent remote column always disagrees with a drafted value.
    pub(crate) fn differs_from(&self, record: &Record) -> bool {
        self.columns
            .iter()
            .any(|(column, value)| match record.get(column) {
                None => true,
                Some(remote) => !value_matches(value, remote),
            })
    }

    /// Wire form of the draft.
    pub(crate) fn to_row(&self) -> Vec<(String, FieldValue)> {
        self.columns
            .iter()
            .map(|(column, value)| {
                let wire = match value {
                    DraftValue::Text(text) => FieldValue::Text(text.clone()),
                    DraftValue::Hex(value) => match value.canonical() {
                        Some(canonical) => FieldValue::Text(canonical),
                        None => FieldValue::Null,
                    },
                    DraftValue::Int(number) => FieldValue::Number(*number),
                    DraftValue::Id(id) => FieldValue::Number(*id as i64),
                };
                (column.to_string(), wire)
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn value_matches(draft: &DraftValue, remote: &FieldValue) -> bool {
    match (draft, remote) {
        (DraftValue::Text(want), FieldValue::Text(have)) => want == have.trim(),
        (DraftValue::Hex(want), FieldValue::Text(have)) => *want == have.as_str(),
        (DraftValue::Hex(want), FieldValue::Number(have)) => *have >= 0 && *want == *have as u64,
        (DraftValue::Int(want), FieldValue::Number(have)) => want == have,
        // Sizes and bit positions may come back hex-spelled; negative values cannot.
        (DraftValue::Int(want), FieldValue::Text(have)) => {
            if *want >= 0 {
                HexValue::parse(have) == *want as u64
            } else {
                have.trim().parse::<i64>() == Ok(*want)
            }
        }
        (DraftValue::Id(want), FieldValue::Number(have)) => *have >= 0 && *have as u64 == *want,
        (DraftValue::Id(want), FieldValue::Text(have)) => have.trim().parse::<u64>() == Ok(*want),
        _ => false,
    }
}
