// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Vendor and microcontroller reconciliation, and the document root walk.

use catalog_store::{Filter, RecordId};

use crate::doc::Element;
use crate::draft::Draft;
use crate::{SyncError, SyncResult};

use super::{hex_child, match_by_name, require_name, Reconciler};

impl Reconciler<'_> {
    pub(crate) fn sync_device(&mut self, root: Element) -> SyncResult<()> {
        if root.tag() != "device" {
            return Err(SyncError::MalformedDocument(format!(
                "expected a <device> root, found <{}>",
                root.tag()
            )));
        }

        let vendor_id = self.sync_vendor(root)?;
        let device_id = self.sync_microcontroller(root, vendor_id)?;

        let Some(peripherals) = root.child("peripherals") else {
            return Err(SyncError::MalformedDocument(
                "device declares no <peripherals> section".to_string(),
            ));
        };
        for child in peripherals.children() {
            if child.tag() != "peripheral" {
                return Err(SyncError::MalformedDocument(format!(
                    "unexpected <{}> in <peripherals>",
                    child.tag()
                )));
            }
            self.sync_peripheral(child, peripherals, device_id)?;
        }
        Ok(())
    }

    fn sync_vendor(&mut self, root: Element) -> SyncResult<RecordId> {
        let vendor_name = root
            .child_text("vendor")
            .or(self.options.fallback_vendor.as_deref())
            .ok_or_else(|| {
                SyncError::MalformedDocument(
                    "document names no vendor and no fallback vendor is configured".to_string(),
                )
            })?;
        let vendor_name = vendor_name.to_string();

        let records = self
            .store
            .fetch("vendor", &Filter::new().eq("name", vendor_name.as_str()))?;
        let existing = match_by_name("vendor", &records, &vendor_name)?;

        let mut draft = Draft::new();
        draft.push_text("name", &vendor_name);
        self.sync_record("vendor", &vendor_name, existing, &draft)
    }

    fn sync_microcontroller(&mut self, root: Element, vendor_id: RecordId) -> SyncResult<RecordId> {
        let device_name = require_name(&root, "device")?;

        let filter = Filter::new()
            .eq("vendor_id", vendor_id.to_string())
            .eq("name", device_name);
        let records = self.store.fetch("microcontroller", &filter)?;
        let existing = match_by_name("microcontroller", &records, device_name)?;

        let mut draft = Draft::new();
        draft.push_text("name", device_name);
        draft.push_id("vendor_id", vendor_id);
        if let Some(cpu) = root.child("cpu") {
            draft.push_opt_text("core", cpu.child_text("name"));
        }
        draft.push_hex("ram_start", &hex_child(&root, "ramStart"));
        draft.push_hex("ram_size", &hex_child(&root, "ramSize"));
        self.sync_record("microcontroller", device_name, existing, &draft)
    }
}
