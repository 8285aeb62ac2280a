// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Field, enumeration, and enumeration-element reconciliation.

use catalog_store::{Filter, RecordId};

use crate::dim::{self, DimGroup};
use crate::doc::Element;
use crate::draft::Draft;
use crate::{SyncError, SyncResult};

use super::{hex_child, match_by_name, require_name, Reconciler};

/// Bit range of a field, whichever of the three SVD spellings declared it.
struct BitRange {
    offset: i64,
    width: i64,
}

impl BitRange {
    /// `bitOffset`+`bitWidth`, `lsb`+`msb`, or `bitRange` as `[msb:lsb]`.
    /// A missing `bitWidth` next to a `bitOffset` means one bit.
    fn from_element(node: &Element) -> Option<BitRange> {
        if let Some(offset) = hex_child(node, "bitOffset").to_u64() {
            let width = hex_child(node, "bitWidth").to_u64().unwrap_or(1);
            return Self::build(offset, width);
        }
        if let (Some(lsb), Some(msb)) = (
            hex_child(node, "lsb").to_u64(),
            hex_child(node, "msb").to_u64(),
        ) {
            if msb >= lsb {
                return Self::build(lsb, msb - lsb + 1);
            }
            return None;
        }
        let text = node.child_text("bitRange")?;
        let inner = text.strip_prefix('[')?.strip_suffix(']')?;
        let (msb, lsb) = inner.split_once(':')?;
        let msb = msb.trim().parse::<u64>().ok()?;
        let lsb = lsb.trim().parse::<u64>().ok()?;
        if msb >= lsb {
            return Self::build(lsb, msb - lsb + 1);
        }
        None
    }

    fn build(offset: u64, width: u64) -> Option<BitRange> {
        Some(BitRange {
            offset: i64::try_from(offset).ok()?,
            width: i64::try_from(width).ok()?,
        })
    }
}

impl Reconciler<'_> {
    /// Walks a `<fields>` section. Only `<field>` children are legal.
    pub(crate) fn sync_fields(&mut self, container: Element, register_id: RecordId) -> SyncResult<()> {
        for child in container.children() {
            if child.tag() != "field" {
                return Err(SyncError::MalformedDocument(format!(
                    "unexpected <{}> in <fields>",
                    child.tag()
                )));
            }
            self.sync_field_decl(child, register_id)?;
        }
        Ok(())
    }

    /// One `<field>` declaration, expanded when it carries a valid
    /// repetition group. The repetition stride is in bits.
    fn sync_field_decl(&mut self, node: Element, register_id: RecordId) -> SyncResult<()> {
        let template = require_name(&node, "field")?;
        if node.attribute("derivedFrom").is_some() {
            return Err(SyncError::Unsupported(format!(
                "field '{template}' uses derivedFrom"
            )));
        }
        let Some(range) = BitRange::from_element(&node) else {
            return Err(SyncError::MalformedDocument(format!(
                "field '{template}' without a usable bit range"
            )));
        };

        let Some(group) = DimGroup::from_chain(&[node]) else {
            return self.sync_field_instance(
                node,
                template.to_string(),
                range.offset,
                range.width,
                register_id,
            );
        };
        if !group.is_valid() {
            return Err(SyncError::MalformedDocument(format!(
                "field '{template}' declares an invalid repetition group"
            )));
        }
        let stride = group
            .increment()
            .to_u64()
            .and_then(|stride| i64::try_from(stride).ok());
        let Some(stride) = stride else {
            return Err(SyncError::MalformedDocument(format!(
                "field '{template}' repetition stride does not fit a bit offset"
            )));
        };
        for (index, token) in group.index_tokens().iter().enumerate() {
            let offset = (index as i64)
                .checked_mul(stride)
                .and_then(|delta| range.offset.checked_add(delta));
            let Some(offset) = offset else {
                return Err(SyncError::MalformedDocument(format!(
                    "field '{template}' repetition overflows its bit offset"
                )));
            };
            let name = dim::apply_index(template, token);
            self.sync_field_instance(node, name, offset, range.width, register_id)?;
        }
        Ok(())
    }

    fn sync_field_instance(
        &mut self,
        node: Element,
        name: String,
        bit_offset: i64,
        bit_width: i64,
        register_id: RecordId,
    ) -> SyncResult<()> {
        let records = self
            .store
            .fetch("field", &Filter::new().eq("reg_id", register_id.to_string()))?;
        let existing = match_by_name("field", &records, &name)?;

        let is_enumerated = node
            .children()
            .any(|child| child.tag() == "enumeratedValues");

        let mut draft = Draft::new();
        draft.push_text("name", &name);
        draft.push_opt_text("description", node.child_text("description"));
        draft.push_int("bit_offset", bit_offset);
        draft.push_int("size_bit", bit_width);
        draft.push_opt_text("access", node.child_text("access"));
        draft.push_opt_text(
            "modified_write_values",
            node.child_text("modifiedWriteValues"),
        );
        draft.push_opt_text("read_action", node.child_text("readAction"));
        draft.push_int("is_enumerated", i64::from(is_enumerated));
        draft.push_id("reg_id", register_id);
        let field_id = self.sync_record("field", &name, existing, &draft)?;

        for enumeration in node
            .children()
            .filter(|child| child.tag() == "enumeratedValues")
        {
            self.sync_enumeration(enumeration, &name, field_id)?;
        }
        Ok(())
    }

    /// The single enumeration a field may carry. Two or more stored
    /// enumerations for one field contradict the model.
    fn sync_enumeration(
        &mut self,
        node: Element,
        field_name: &str,
        field_id: RecordId,
    ) -> SyncResult<()> {
        if node.attribute("derivedFrom").is_some() {
            return Err(SyncError::Unsupported(format!(
                "enumeration of field '{field_name}' uses derivedFrom"
            )));
        }

        let records = self.store.fetch(
            "enumeration",
            &Filter::new().eq("field_id", field_id.to_string()),
        )?;
        if records.len() > 1 {
            return Err(SyncError::Integrity(format!(
                "field '{}' has {} stored enumerations where at most one is allowed",
                field_name,
                records.len()
            )));
        }
        let existing = records.first();

        let mut draft = Draft::new();
        draft.push_opt_text("name", node.child_text("name"));
        draft.push_opt_text("usage", node.child_text("usage"));
        draft.push_id("field_id", field_id);
        let label = node.child_text("name").unwrap_or(field_name);
        let enumeration_id = self.sync_record("enumeration", label, existing, &draft)?;

        for child in node.children() {
            match child.tag() {
                "enumeratedValue" => self.sync_enumeration_element(child, enumeration_id)?,
                "name" | "usage" | "headerEnumName" => {}
                tag => {
                    return Err(SyncError::MalformedDocument(format!(
                        "unexpected <{tag}> in <enumeratedValues>"
                    )))
                }
            }
        }
        Ok(())
    }

    /// One `<enumeratedValue>`, identified within its enumeration by name.
    fn sync_enumeration_element(
        &mut self,
        node: Element,
        enumeration_id: RecordId,
    ) -> SyncResult<()> {
        let name = require_name(&node, "enumeratedValue")?;
        let records = self.store.fetch(
            "enumeration_element",
            &Filter::new().eq("enumeration_id", enumeration_id.to_string()),
        )?;
        let existing = match_by_name("enumeration_element", &records, name)?;

        let is_default = node
            .child_text("isDefault")
            .map(|text| text.eq_ignore_ascii_case("true") || text == "1")
            .unwrap_or(false);

        let mut draft = Draft::new();
        draft.push_text("name", name);
        draft.push_opt_text("description", node.child_text("description"));
        draft.push_hex("value", &hex_child(&node, "value"));
        draft.push_int("is_default", i64::from(is_default));
        draft.push_id("enumeration_id", enumeration_id);
        self.sync_record("enumeration_element", name, existing, &draft)?;
        Ok(())
    }
}
