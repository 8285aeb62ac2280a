// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! End-to-end reconciliation scenarios against the in-memory store.

use catalog_core::{sync_document, Counts, RunSummary, SyncOptions};
use catalog_store::memory::MemoryStore;
use catalog_store::{FieldValue, Record};

const ACME_ACM32: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/fixtures/acme_acm32.svd"));

fn sync_ok(xml: &str, store: &MemoryStore) -> RunSummary {
    sync_document(xml, store, &SyncOptions::default()).expect("sync failed")
}

fn device_doc(peripherals: &str) -> String {
    format!(
        "<device><vendor>Acme</vendor><name>ACM32</name>\
         <peripherals>{peripherals}</peripherals></device>"
    )
}

fn by_name<'r>(records: &'r [Record], name: &str) -> &'r Record {
    records
        .iter()
        .find(|record| record.text("name") == Some(name))
        .unwrap_or_else(|| panic!("no record named '{name}'"))
}

fn text<'r>(record: &'r Record, column: &str) -> &'r str {
    match record.fields.get(column) {
        Some(FieldValue::Text(text)) => text,
        other => panic!("column '{column}' is {other:?}"),
    }
}

fn number(record: &Record, column: &str) -> i64 {
    match record.fields.get(column) {
        Some(FieldValue::Number(number)) => *number,
        other => panic!("column '{column}' is {other:?}"),
    }
}

#[test]
fn empty_store_gets_one_create_per_kind() {
    let store = MemoryStore::new();
    let summary = sync_ok(ACME_ACM32, &store);

    for collection in [
        "vendor",
        "microcontroller",
        "peripheral",
        "address_block",
        "interrupt",
        "register",
        "field",
        "enumeration",
    ] {
        assert_eq!(
            summary.counts(collection),
            Counts { created: 1, updated: 0, unchanged: 0 },
            "{collection}"
        );
    }
    assert_eq!(summary.counts("enumeration_element").created, 2);

    let vendors = store.records("vendor");
    let vendor = &vendors[0];
    assert_eq!(text(vendor, "name"), "Acme");

    let mcus = store.records("microcontroller");
    let mcu = &mcus[0];
    assert_eq!(text(mcu, "name"), "ACM32");
    assert_eq!(number(mcu, "vendor_id"), vendor.id as i64);
    assert_eq!(text(mcu, "core"), "CM4");
    assert_eq!(text(mcu, "ram_start"), "0x20000000");
    assert_eq!(text(mcu, "ram_size"), "0x10000");

    let peripherals = store.records("peripheral");
    let uart = &peripherals[0];
    assert_eq!(text(uart, "name"), "UART0");
    assert_eq!(text(uart, "base_address"), "0x40010000");
    assert_eq!(number(uart, "mcu_id"), mcu.id as i64);

    let blocks = store.records("address_block");
    let block = &blocks[0];
    assert_eq!(text(block, "offset"), "0x0");
    assert_eq!(text(block, "size"), "0x400");
    assert_eq!(text(block, "usage"), "registers");
    assert_eq!(number(block, "per_id"), uart.id as i64);

    let interrupts = store.records("interrupt");
    let irq = &interrupts[0];
    assert_eq!(text(irq, "name"), "UART0_IRQ");
    assert_eq!(number(irq, "value"), 17);

    let registers = store.records("register");
    let ctrl = &registers[0];
    assert_eq!(text(ctrl, "name"), "CTRL");
    assert_eq!(text(ctrl, "address_offset"), "0x10");
    assert_eq!(number(ctrl, "size"), 32);
    assert_eq!(text(ctrl, "access"), "read-write");
    assert_eq!(text(ctrl, "reset_value"), "0x0");
    assert_eq!(number(ctrl, "per_id"), uart.id as i64);

    let fields = store.records("field");
    let en = &fields[0];
    assert_eq!(text(en, "name"), "EN");
    assert_eq!(number(en, "bit_offset"), 0);
    assert_eq!(number(en, "size_bit"), 1);
    assert_eq!(number(en, "is_enumerated"), 1);
    assert_eq!(number(en, "reg_id"), ctrl.id as i64);

    let enumerations = store.records("enumeration");
    let enumeration = &enumerations[0];
    assert_eq!(text(enumeration, "name"), "EN_VALS");
    assert_eq!(text(enumeration, "usage"), "read-write");
    assert_eq!(number(enumeration, "field_id"), en.id as i64);

    let elements = store.records("enumeration_element");
    let disabled = by_name(&elements, "DISABLED");
    assert_eq!(text(disabled, "value"), "0x0");
    assert_eq!(number(disabled, "is_default"), 0);
    let enabled = by_name(&elements, "ENABLED");
    assert_eq!(text(enabled, "value"), "0x1");
}

#[test]
fn a_second_run_changes_nothing() {
    let store = MemoryStore::new();
    sync_ok(ACME_ACM32, &store);
    let summary = sync_ok(ACME_ACM32, &store);

    assert!(!summary.wrote());
    for collection in summary.collections() {
        let counts = summary.counts(collection);
        assert_eq!(counts.created, 0, "{collection}");
        assert_eq!(counts.updated, 0, "{collection}");
        assert!(counts.unchanged > 0, "{collection}");
    }
    assert_eq!(store.count("register"), 1);
    assert_eq!(store.count("enumeration_element"), 2);
}

#[test]
fn size_change_updates_exactly_one_record() {
    let store = MemoryStore::new();
    sync_ok(ACME_ACM32, &store);

    let resized = ACME_ACM32.replace("<size>32</size>", "<size>64</size>");
    let summary = sync_ok(&resized, &store);

    assert_eq!(
        summary.counts("register"),
        Counts { created: 0, updated: 1, unchanged: 0 }
    );
    assert_eq!(summary.counts("field").created, 0);
    assert_eq!(summary.counts("field").updated, 0);
    assert_eq!(number(&store.records("register")[0], "size"), 64);

    let summary = sync_ok(&resized, &store);
    assert!(!summary.wrote());
}

#[test]
fn omitted_attributes_are_never_erased() {
    let store = MemoryStore::new();
    sync_ok(ACME_ACM32, &store);

    // Drop the register description and force an update through the size.
    let stripped = ACME_ACM32
        .replace("<description>Control register</description>", "")
        .replace("<size>32</size>", "<size>64</size>");
    let summary = sync_ok(&stripped, &store);

    assert_eq!(summary.counts("register").updated, 1);
    let registers = store.records("register");
    assert_eq!(number(&registers[0], "size"), 64);
    assert_eq!(text(&registers[0], "description"), "Control register");
}

#[test]
fn register_expansion_covers_the_range() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>TMR</name><baseAddress>0x40020000</baseAddress><registers>\
         <register><name>TIMER%s</name><addressOffset>0x0</addressOffset>\
         <dim>4</dim><dimIncrement>0x4</dimIncrement><dimIndex>3-6</dimIndex>\
         </register></registers></peripheral>",
    );
    let summary = sync_ok(&doc, &store);

    assert_eq!(summary.counts("register").created, 4);
    let registers = store.records("register");
    assert_eq!(registers.len(), 4);
    for (name, offset) in [
        ("TIMER3", "0x0"),
        ("TIMER4", "0x4"),
        ("TIMER5", "0x8"),
        ("TIMER6", "0xC"),
    ] {
        assert_eq!(text(by_name(&registers, name), "address_offset"), offset);
    }
}

#[test]
fn placeholderless_template_overwrites_one_record() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>TMR</name><baseAddress>0x40020000</baseAddress><registers>\
         <register><name>STATUS</name><addressOffset>0x0</addressOffset>\
         <dim>2</dim><dimIncrement>0x4</dimIncrement>\
         </register></registers></peripheral>",
    );
    let summary = sync_ok(&doc, &store);

    // Every expanded instance resolves to the same name, so the later one
    // overwrites the earlier one's record.
    assert_eq!(
        summary.counts("register"),
        Counts { created: 1, updated: 1, unchanged: 0 }
    );
    let registers = store.records("register");
    assert_eq!(registers.len(), 1);
    assert_eq!(text(&registers[0], "address_offset"), "0x4");
}

#[test]
fn repeated_clusters_get_their_own_rows_and_children() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>DMA</name><baseAddress>0x40030000</baseAddress><registers>\
         <cluster><name>CH%s</name><addressOffset>0x100</addressOffset>\
         <dim>2</dim><dimIncrement>0x20</dimIncrement>\
         <register><name>CFG</name><addressOffset>0x0</addressOffset></register>\
         </cluster></registers></peripheral>",
    );
    let summary = sync_ok(&doc, &store);

    assert_eq!(summary.counts("cluster").created, 2);
    assert_eq!(summary.counts("register").created, 2);

    let peripheral_id = store.records("peripheral")[0].id as i64;
    let clusters = store.records("cluster");
    let ch0 = by_name(&clusters, "CH0");
    let ch1 = by_name(&clusters, "CH1");
    assert_eq!(text(ch0, "address_offset"), "0x100");
    assert_eq!(text(ch1, "address_offset"), "0x120");
    assert_eq!(number(ch0, "per_id"), peripheral_id);
    assert_eq!(number(ch1, "per_id"), peripheral_id);

    // One CFG row per cluster instance, scoped to its own cluster.
    let registers = store.records("register");
    let parents: Vec<i64> = registers
        .iter()
        .map(|register| number(register, "cluster_id"))
        .collect();
    assert!(parents.contains(&(ch0.id as i64)));
    assert!(parents.contains(&(ch1.id as i64)));
    for register in &registers {
        assert_eq!(text(register, "name"), "CFG");
        assert_eq!(text(register, "address_offset"), "0x0");
    }
}

#[test]
fn nested_clusters_recurse() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>DMA</name><baseAddress>0x40030000</baseAddress><registers>\
         <cluster><name>OUTER</name><addressOffset>0x0</addressOffset>\
         <cluster><name>INNER</name><addressOffset>0x10</addressOffset>\
         <register><name>R</name><addressOffset>0x4</addressOffset></register>\
         </cluster></cluster></registers></peripheral>",
    );
    sync_ok(&doc, &store);

    let clusters = store.records("cluster");
    let outer = by_name(&clusters, "OUTER");
    let inner = by_name(&clusters, "INNER");
    assert_eq!(number(inner, "cluster_id"), outer.id as i64);

    let registers = store.records("register");
    assert_eq!(number(&registers[0], "cluster_id"), inner.id as i64);
}

#[test]
fn derived_peripheral_reuses_the_source_register_map() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>UART0</name><baseAddress>0x40010000</baseAddress><registers>\
         <register><name>CTRL</name><addressOffset>0x10</addressOffset><size>32</size>\
         <fields><field><name>EN</name><bitOffset>0</bitOffset><bitWidth>1</bitWidth>\
         </field></fields></register></registers></peripheral>\
         <peripheral derivedFrom=\"UART0\"><name>UART1</name>\
         <baseAddress>0x40011000</baseAddress></peripheral>",
    );
    let summary = sync_ok(&doc, &store);

    assert_eq!(summary.counts("peripheral").created, 2);
    assert_eq!(summary.counts("register").created, 2);
    assert_eq!(summary.counts("field").created, 2);

    let peripherals = store.records("peripheral");
    let uart1 = by_name(&peripherals, "UART1");
    assert_eq!(text(uart1, "base_address"), "0x40011000");

    let registers = store.records("register");
    let derived_ctrl = registers
        .iter()
        .find(|register| number(register, "per_id") == uart1.id as i64)
        .expect("UART1 should get its own CTRL row");
    assert_eq!(text(derived_ctrl, "name"), "CTRL");
    assert_eq!(number(derived_ctrl, "size"), 32);
}

#[test]
fn derived_register_inherits_scalars_with_local_overrides() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>UART0</name><baseAddress>0x40010000</baseAddress><registers>\
         <register><name>CTRL</name><addressOffset>0x0</addressOffset>\
         <size>32</size><access>read-write</access></register>\
         <register derivedFrom=\"CTRL\"><name>CTRL2</name>\
         <addressOffset>0x14</addressOffset></register>\
         </registers></peripheral>",
    );
    sync_ok(&doc, &store);

    let registers = store.records("register");
    let ctrl2 = by_name(&registers, "CTRL2");
    assert_eq!(text(ctrl2, "address_offset"), "0x14");
    assert_eq!(number(ctrl2, "size"), 32);
    assert_eq!(text(ctrl2, "access"), "read-write");
}

#[test]
fn seeded_device_is_matched_not_duplicated() {
    let store = MemoryStore::new();
    // The vendor created first will take id 8, one past the seeded row.
    store.seed(
        "microcontroller",
        7,
        &[
            ("name", FieldValue::Text("ACM32".to_string())),
            ("vendor_id", FieldValue::Number(8)),
        ],
    );

    let doc = device_doc(
        "<peripheral><name>SYS</name><baseAddress>0x50000000</baseAddress></peripheral>",
    );
    let summary = sync_ok(&doc, &store);

    assert_eq!(summary.counts("vendor").created, 1);
    assert_eq!(store.records("vendor")[0].id, 8);
    assert_eq!(
        summary.counts("microcontroller"),
        Counts { created: 0, updated: 0, unchanged: 1 }
    );
    assert_eq!(store.count("microcontroller"), 1);
    assert_eq!(summary.counts("peripheral").created, 1);
}

#[test]
fn protection_is_backfilled_only_over_emptiness() {
    let store = MemoryStore::new();
    let silent = device_doc(
        "<peripheral><name>SYS</name><baseAddress>0x50000000</baseAddress>\
         <addressBlock><offset>0x0</offset><size>0x400</size><usage>registers</usage>\
         </addressBlock></peripheral>",
    );
    let stated = silent.replace(
        "<usage>registers</usage>",
        "<usage>registers</usage><protection>s</protection>",
    );

    let no_default = SyncOptions {
        fallback_vendor: None,
        default_protection: None,
    };
    sync_document(&silent, &store, &no_default).expect("sync failed");
    assert!(store.records("address_block")[0].get("protection").is_none());

    // Default fills the empty stored value when the document is silent.
    let summary = sync_ok(&silent, &store);
    assert_eq!(summary.counts("address_block").updated, 1);
    assert_eq!(text(&store.records("address_block")[0], "protection"), "n");

    // A stated value wins over the default.
    sync_ok(&stated, &store);
    assert_eq!(text(&store.records("address_block")[0], "protection"), "s");

    // A silent document leaves a non-empty stored value alone.
    let summary = sync_ok(&silent, &store);
    assert_eq!(summary.counts("address_block").updated, 0);
    assert_eq!(text(&store.records("address_block")[0], "protection"), "s");
}

#[test]
fn fallback_vendor_covers_a_silent_document() {
    let store = MemoryStore::new();
    let doc = "<device><name>ACM32</name><peripherals>\
               <peripheral><name>SYS</name><baseAddress>0x50000000</baseAddress>\
               </peripheral></peripherals></device>";
    let options = SyncOptions {
        fallback_vendor: Some("Acme".to_string()),
        default_protection: Some("n".to_string()),
    };
    sync_document(doc, &store, &options).expect("sync failed");
    assert_eq!(text(&store.records("vendor")[0], "name"), "Acme");
}

#[test]
fn bit_ranges_come_in_three_spellings() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>SYS</name><baseAddress>0x50000000</baseAddress><registers>\
         <register><name>CFG</name><addressOffset>0x0</addressOffset><fields>\
         <field><name>A</name><bitOffset>4</bitOffset><bitWidth>2</bitWidth></field>\
         <field><name>B</name><lsb>8</lsb><msb>11</msb></field>\
         <field><name>C</name><bitRange>[3:1]</bitRange></field>\
         </fields></register></registers></peripheral>",
    );
    sync_ok(&doc, &store);

    let fields = store.records("field");
    for (name, offset, width) in [("A", 4, 2), ("B", 8, 4), ("C", 1, 3)] {
        let field = by_name(&fields, name);
        assert_eq!(number(field, "bit_offset"), offset, "{name}");
        assert_eq!(number(field, "size_bit"), width, "{name}");
        assert_eq!(number(field, "is_enumerated"), 0, "{name}");
    }
}

#[test]
fn repeated_fields_stride_in_bits() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>SYS</name><baseAddress>0x50000000</baseAddress><registers>\
         <register><name>CFG</name><addressOffset>0x0</addressOffset><fields>\
         <field><name>CH%s_EN</name><bitOffset>16</bitOffset><bitWidth>1</bitWidth>\
         <dim>2</dim><dimIncrement>1</dimIncrement></field>\
         </fields></register></registers></peripheral>",
    );
    sync_ok(&doc, &store);

    let fields = store.records("field");
    assert_eq!(number(by_name(&fields, "CH0_EN"), "bit_offset"), 16);
    assert_eq!(number(by_name(&fields, "CH1_EN"), "bit_offset"), 17);
}

#[test]
fn default_enumeration_elements_need_no_value() {
    let store = MemoryStore::new();
    let doc = device_doc(
        "<peripheral><name>SYS</name><baseAddress>0x50000000</baseAddress><registers>\
         <register><name>CFG</name><addressOffset>0x0</addressOffset><fields>\
         <field><name>MODE</name><bitOffset>0</bitOffset><bitWidth>2</bitWidth>\
         <enumeratedValues>\
         <enumeratedValue><name>A</name><value>0b00</value></enumeratedValue>\
         <enumeratedValue><name>OTHER</name><isDefault>true</isDefault></enumeratedValue>\
         </enumeratedValues></field>\
         </fields></register></registers></peripheral>",
    );
    sync_ok(&doc, &store);

    let elements = store.records("enumeration_element");
    let a = by_name(&elements, "A");
    assert_eq!(text(a, "value"), "0x0");
    assert_eq!(number(a, "is_default"), 0);

    let other = by_name(&elements, "OTHER");
    assert!(other.get("value").is_none());
    assert_eq!(number(other, "is_default"), 1);
}
