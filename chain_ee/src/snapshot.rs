//!
//! Snapshot section traits.
//!
//! Each state manager contributes named sections to a chain snapshot, one
//! per index, rows emitted in index order. The on-disk container format is
//! external; the core only defines the section protocol and ships an
//! in-memory implementation for tests.
//!

use crate::codec::{CodecError, Pack, Unpack};
use std::collections::BTreeMap;

pub trait SnapshotWriter {
    /// Opens a named section and streams rows into it through the closure.
    fn write_section(
        &mut self,
        name: &str,
        write_rows: &mut dyn FnMut(&mut dyn FnMut(Vec<u8>)),
    );
}

pub trait SnapshotReader {
    /// Reads back a named section's rows in the order they were written.
    /// Missing sections read as empty.
    fn read_section(&self, name: &str, read_row: &mut dyn FnMut(&[u8]) -> Result<(), CodecError>)
        -> Result<(), CodecError>;
}

/// Convenience for writing one packed value per row.
pub fn write_packed_rows<T: Pack>(
    writer: &mut dyn SnapshotWriter,
    name: &str,
    rows: impl Iterator<Item = T>,
) {
    let mut rows = rows;
    writer.write_section(name, &mut |emit| {
        for row in rows.by_ref() {
            emit(row.packed());
        }
    });
}

/// Convenience for reading one packed value per row.
pub fn read_packed_rows<T: Unpack>(
    reader: &dyn SnapshotReader,
    name: &str,
) -> Result<Vec<T>, CodecError> {
    let mut rows = Vec::new();
    reader.read_section(name, &mut |bytes| {
        rows.push(T::unpack_all(bytes)?);
        Ok(())
    })?;
    Ok(rows)
}

#[derive(Default, Debug, Clone)]
pub struct InMemorySnapshot {
    sections: BTreeMap<String, Vec<Vec<u8>>>,
}

impl InMemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(|s| s.as_str())
    }
}

impl SnapshotWriter for InMemorySnapshot {
    fn write_section(
        &mut self,
        name: &str,
        write_rows: &mut dyn FnMut(&mut dyn FnMut(Vec<u8>)),
    ) {
        let rows = self.sections.entry(name.to_owned()).or_default();
        write_rows(&mut |row| rows.push(row));
    }
}

impl SnapshotReader for InMemorySnapshot {
    fn read_section(
        &self,
        name: &str,
        read_row: &mut dyn FnMut(&[u8]) -> Result<(), CodecError>,
    ) -> Result<(), CodecError> {
        if let Some(rows) = self.sections.get(name) {
            for row in rows {
                read_row(row)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_roundtrip_in_order() {
        let mut snapshot = InMemorySnapshot::new();
        write_packed_rows(&mut snapshot, "numbers", [3u64, 1, 2].into_iter());
        let rows: Vec<u64> = read_packed_rows(&snapshot, "numbers").unwrap();
        assert_eq!(rows, vec![3, 1, 2]);
    }

    #[test]
    fn missing_section_reads_empty() {
        let snapshot = InMemorySnapshot::new();
        let rows: Vec<u64> = read_packed_rows(&snapshot, "absent").unwrap();
        assert!(rows.is_empty());
    }
}
