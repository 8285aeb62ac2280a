// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Reconciliation engine between CMSIS-SVD peripheral maps and the device
//! catalog store.
//!
//! [`sync_document`] walks a parsed SVD document top-down (vendor, device,
//! peripherals, address blocks, interrupts, registers, clusters, fields,
//! enumerations) and brings the store in line with it: records are created
//! where missing and overwritten where their content differs. Records the
//! document does not mention are left untouched, and nothing is ever
//! deleted. The walk is strictly sequential; the first failure aborts the
//! run and writes already applied stay.

#![deny(missing_docs)]

use catalog_store::{CatalogStore, StoreError};
use thiserror::Error;

pub mod dim;
pub mod hexval;

mod doc;
mod draft;
mod reconcile;

/// Error cases that abort a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The document is not XML at all.
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// The document is XML but violates the peripheral-map shape.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    /// The document uses a construct the engine deliberately rejects.
    #[error("unsupported construct: {0}")]
    Unsupported(String),
    /// Remote data contradicts the model, such as duplicate or
    /// identity-less rows.
    #[error("store integrity: {0}")]
    Integrity(String),
    /// The store acknowledged a create without a usable id.
    #[error("store rejected creation of {collection} '{name}'")]
    CreateRejected {
        /// Collection the create addressed.
        collection: &'static str,
        /// Identity of the rejected record.
        name: String,
    },
    /// The store transport failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Per-run knobs that do not come from the document.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Vendor name used when the document omits `<vendor>`.
    pub fallback_vendor: Option<String>,
    /// Protection written to address blocks whose stored value is empty
    /// and whose document entry says nothing. `None` disables the
    /// backfill.
    pub default_protection: Option<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            fallback_vendor: None,
            default_protection: Some("n".to_string()),
        }
    }
}

/// How one declared entity ended up relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Matched an existing record with identical content.
    Unchanged,
    /// No record matched; one was created.
    Created,
    /// A record matched but its content differed; it was overwritten.
    Updated,
}

/// Outcome counters for one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Records created.
    pub created: u64,
    /// Records overwritten.
    pub updated: u64,
    /// Records left as they were.
    pub unchanged: u64,
}

impl Counts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Whether the run wrote to the store for this collection.
    pub fn wrote(&self) -> bool {
        self.created > 0 || self.updated > 0
    }
}

/// Aggregated outcomes of a whole run, keyed by collection.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    counts: std::collections::BTreeMap<&'static str, Counts>,
}

impl RunSummary {
    pub(crate) fn record(&mut self, collection: &'static str, outcome: Outcome) {
        self.counts.entry(collection).or_default().record(outcome);
    }

    /// Counters for one collection; all zero when the run never visited it.
    pub fn counts(&self, collection: &str) -> Counts {
        self.counts.get(collection).copied().unwrap_or_default()
    }

    /// Collections the run visited, in name order.
    pub fn collections(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.counts.keys().copied()
    }

    /// Whether the run changed anything at all.
    pub fn wrote(&self) -> bool {
        self.counts.values().any(Counts::wrote)
    }
}

/// Reconciles one SVD document against the store.
///
/// Returns the per-collection outcome counters. The first error aborts
/// the walk; writes already applied are kept, there is no rollback.
pub fn sync_document(
    xml: &str,
    store: &dyn CatalogStore,
    options: &SyncOptions,
) -> SyncResult<RunSummary> {
    let document = roxmltree::Document::parse(xml)?;
    let root = doc::Element::root(&document);
    reconcile::Reconciler::new(store, options).run(root)
}
