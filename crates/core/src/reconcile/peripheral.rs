// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Peripheral reconciliation: the peripheral record itself, its address
//! blocks and interrupts, and the dispatch into its register tree.

use catalog_store::{Filter, RecordId};
use tracing::warn;

use crate::doc::{chain_child, chain_text, derivation_chain, Element};
use crate::draft::Draft;
use crate::{SyncError, SyncResult};

use super::register::Scope;
use super::{chain_hex, hex_child, match_by_name, match_by_offset, require_name, Reconciler};

impl Reconciler<'_> {
    /// One `<peripheral>`. Scalar values and the register subtree resolve
    /// through the `derivedFrom` chain; address blocks and interrupts are
    /// per-instance facts and are always the element's own.
    pub(crate) fn sync_peripheral(
        &mut self,
        node: Element,
        container: Element,
        device_id: RecordId,
    ) -> SyncResult<()> {
        let name = require_name(&node, "peripheral")?;
        let chain = derivation_chain(node, container, "peripheral", "peripheral")?;
        if chain_text(&chain, "dim").is_some() {
            return Err(SyncError::Unsupported(format!(
                "peripheral '{name}' declares a repetition group"
            )));
        }

        let records = self
            .store
            .fetch("peripheral", &Filter::new().eq("mcu_id", device_id.to_string()))?;
        let existing = match_by_name("peripheral", &records, name)?;

        let mut draft = Draft::new();
        draft.push_text("name", name);
        draft.push_hex("base_address", &chain_hex(&chain, "baseAddress"));
        draft.push_id("mcu_id", device_id);
        let peripheral_id = self.sync_record("peripheral", name, existing, &draft)?;

        for block in node.children().filter(|child| child.tag() == "addressBlock") {
            self.sync_address_block(block, peripheral_id)?;
        }
        for interrupt in node.children().filter(|child| child.tag() == "interrupt") {
            self.sync_interrupt(interrupt, peripheral_id)?;
        }

        if let Some(registers) = chain_child(&chain, "registers") {
            self.sync_register_set(registers, Scope::Peripheral(peripheral_id), &[])?;
        }
        Ok(())
    }

    /// One `<addressBlock>`, identified within its peripheral by offset.
    ///
    /// Protection is special-cased: a value the document states is written
    /// like any other column, but when the document is silent the
    /// configured default is written only where the stored value is empty.
    /// A stored non-empty protection is never touched by a silent
    /// document.
    fn sync_address_block(&mut self, node: Element, peripheral_id: RecordId) -> SyncResult<()> {
        let offset = hex_child(&node, "offset");
        let Some(label) = offset.canonical() else {
            return Err(SyncError::MalformedDocument(
                "addressBlock without a usable offset".to_string(),
            ));
        };

        let records = self.store.fetch(
            "address_block",
            &Filter::new().eq("per_id", peripheral_id.to_string()),
        )?;
        let existing = match_by_offset("address_block", &records, &offset)?;

        let mut draft = Draft::new();
        draft.push_hex("offset", &offset);
        draft.push_hex("size", &hex_child(&node, "size"));
        draft.push_opt_text("usage", node.child_text("usage"));
        match node.child_text("protection") {
            Some(protection) => draft.push_text("protection", protection),
            None => {
                let stored = existing.and_then(|record| record.get("protection"));
                if stored.is_none() {
                    if let Some(default) = self.options.default_protection.clone() {
                        if existing.is_some() {
                            warn!(
                                "address_block {} of peripheral {} has no protection; defaulting to '{}'",
                                label, peripheral_id, default
                            );
                        }
                        draft.push_text("protection", &default);
                    }
                }
            }
        }
        draft.push_id("per_id", peripheral_id);
        self.sync_record("address_block", &label, existing, &draft)?;
        Ok(())
    }

    /// One `<interrupt>`, identified within its peripheral by name.
    fn sync_interrupt(&mut self, node: Element, peripheral_id: RecordId) -> SyncResult<()> {
        let name = require_name(&node, "interrupt")?;
        let value = hex_child(&node, "value")
            .to_u64()
            .and_then(|value| i64::try_from(value).ok());
        let Some(value) = value else {
            return Err(SyncError::MalformedDocument(format!(
                "interrupt '{name}' without a usable value"
            )));
        };

        let records = self.store.fetch(
            "interrupt",
            &Filter::new().eq("per_id", peripheral_id.to_string()),
        )?;
        let existing = match_by_name("interrupt", &records, name)?;

        let mut draft = Draft::new();
        draft.push_text("name", name);
        draft.push_opt_text("description", node.child_text("description"));
        draft.push_int("value", value);
        draft.push_id("per_id", peripheral_id);
        self.sync_record("interrupt", name, existing, &draft)?;
        Ok(())
    }
}
