// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Per-kind reconcilers and the shared fetch/match/diff/write step.
//!
//! Every kind follows the same sequence: fetch the parent-scoped records,
//! match by identity, draft the locally-known columns, then create or
//! overwrite only when the content actually differs. The walk carries
//! store-assigned parent ids downward; nothing here deletes.

mod device;
mod field;
mod peripheral;
mod register;

use catalog_store::{CatalogStore, FieldValue, Record, RecordId};
use tracing::{debug, info};

use crate::doc::Element;
use crate::draft::Draft;
use crate::hexval::HexValue;
use crate::{Outcome, RunSummary, SyncError, SyncOptions, SyncResult};

pub(crate) struct Reconciler<'a> {
    store: &'a dyn CatalogStore,
    options: &'a SyncOptions,
    summary: RunSummary,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(store: &'a dyn CatalogStore, options: &'a SyncOptions) -> Self {
        Self {
            store,
            options,
            summary: RunSummary::default(),
        }
    }

    pub(crate) fn run(mut self, root: Element) -> SyncResult<RunSummary> {
        self.sync_device(root)?;
        Ok(self.summary)
    }

    /// Applies one draft: overwrite the matched record when its content
    /// differs, create when nothing matched, touch nothing otherwise.
    /// Returns the id child records hang off.
    fn sync_record(
        &mut self,
        collection: &'static str,
        name: &str,
        existing: Option<&Record>,
        draft: &Draft,
    ) -> SyncResult<RecordId> {
        match existing {
            Some(record) => {
                if draft.differs_from(record) {
                    self.store.update(collection, record.id, &draft.to_row())?;
                    info!("Updated {} '{}' (id={})", collection, name, record.id);
                    self.summary.record(collection, Outcome::Updated);
                } else {
                    debug!("{} '{}' is up to date (id={})", collection, name, record.id);
                    self.summary.record(collection, Outcome::Unchanged);
                }
                Ok(record.id)
            }
            None => {
                let id = self.store.create(collection, &draft.to_row())?;
                if id == 0 {
                    return Err(SyncError::CreateRejected {
                        collection,
                        name: name.to_string(),
                    });
                }
                info!("Created {} '{}' (id={})", collection, name, id);
                self.summary.record(collection, Outcome::Created);
                Ok(id)
            }
        }
    }
}

/// Finds the record whose `name` column equals `name`. Any fetched record
/// without a readable name makes the whole scope unmatchable and fails
/// the run.
fn match_by_name<'r>(
    collection: &'static str,
    records: &'r [Record],
    name: &str,
) -> SyncResult<Option<&'r Record>> {
    for record in records {
        if record.text("name").is_none() {
            return Err(SyncError::Integrity(format!(
                "{} record {} has no name",
                collection, record.id
            )));
        }
    }
    Ok(records
        .iter()
        .find(|record| record.text("name").map(str::trim) == Some(name)))
}

/// Finds the record whose `offset` column equals the given value,
/// whichever spelling the store kept it in. Any fetched record without an
/// offset fails the run.
fn match_by_offset<'r>(
    collection: &'static str,
    records: &'r [Record],
    offset: &HexValue,
) -> SyncResult<Option<&'r Record>> {
    for record in records {
        if record.get("offset").is_none() {
            return Err(SyncError::Integrity(format!(
                "{} record {} has no offset",
                collection, record.id
            )));
        }
    }
    Ok(records.iter().find(|record| match record.get("offset") {
        Some(FieldValue::Text(text)) => *offset == text.as_str(),
        Some(FieldValue::Number(number)) => *number >= 0 && *offset == *number as u64,
        _ => false,
    }))
}

/// Numeric text of a child tag; an absent tag is the absent value.
fn hex_child(element: &Element, tag: &str) -> HexValue {
    element
        .child_text(tag)
        .map(HexValue::parse)
        .unwrap_or_else(HexValue::none)
}

/// Numeric text of a scalar tag resolved along a derivation chain.
fn chain_hex(chain: &[Element], tag: &str) -> HexValue {
    crate::doc::chain_text(chain, tag)
        .map(HexValue::parse)
        .unwrap_or_else(HexValue::none)
}

/// A required, non-empty `<name>` child.
fn require_name<'a>(element: &Element<'a, '_>, what: &str) -> SyncResult<&'a str> {
    element
        .child_text("name")
        .ok_or_else(|| SyncError::MalformedDocument(format!("{what} without a name")))
}
