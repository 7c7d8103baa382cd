//! Fuzz target for reading and threshold-filtering arbitrary tables.
//!
//! Checks that:
//! 1. Reading and filtering never panic
//! 2. Kept records always carry a productive key
//! 3. Filtering the output again with the same threshold is a no-op

#![no_main]

use clonotrack::filter::filter_table;
use clonotrack::record::is_productive;
use clonotrack::table::Table;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: (u8, u8, &[u8])| {
    let (column, threshold, bytes) = data;
    let column = usize::from(column % 4);
    let threshold = u32::from(threshold % 4);

    let Ok(table) = Table::from_reader(Cursor::new(bytes), "fuzz.tsv") else {
        return;
    };
    let Ok(filtered) = filter_table(&table, column, threshold) else {
        return;
    };

    let mut once = filtered.header.to_string();
    for record in &filtered.records {
        assert!(is_productive(record.field(column).unwrap()));
        once.push_str(record.raw());
    }

    let again = Table::from_reader(Cursor::new(once.as_bytes()), "again.tsv").unwrap();
    let refiltered = filter_table(&again, column, threshold).unwrap();
    assert_eq!(refiltered.records.len(), filtered.records.len());
});
