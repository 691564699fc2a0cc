//! Key lookup and key-range enumeration over the on-disk B-tree.

use tracing::trace;

use crate::error::{PortalError, Result};
use crate::index::node::{DirectoryNode, MAX_DEPTH};
use crate::sector::SectorReader;
use crate::types::{Key, RecordLocator};

/// Answers `locate` and `enumerate` queries over the B-tree rooted at a
/// caller-supplied root sector offset.
///
/// The index holds no state of its own between calls: each lookup or
/// traversal re-reads whatever nodes it needs from the
/// [`SectorReader`] it's given.
pub struct DirectoryIndex<'a> {
    sectors: &'a mut SectorReader,
    root: u64,
}

impl<'a> DirectoryIndex<'a> {
    /// Opens the index rooted at sector `root` of the given reader.
    pub fn new(sectors: &'a mut SectorReader, root: u64) -> Self {
        Self { sectors, root }
    }

    /// Finds the `(offset, length)` locator for `key`, or `NotFound` if it is
    /// not present anywhere in the tree.
    pub fn locate(&mut self, key: Key) -> Result<RecordLocator> {
        self.locate_at(self.root, key, 0)
    }

    fn locate_at(&mut self, node_offset: u64, key: Key, depth: u32) -> Result<RecordLocator> {
        if depth > MAX_DEPTH {
            return Err(PortalError::CorruptDirectory(format!(
                "tree depth exceeded {MAX_DEPTH} while looking up {key}"
            )));
        }

        let node = DirectoryNode::read(self.sectors, node_offset)?;
        let n = node.entry_count();
        let search = key.value();

        // Smallest index i in [0, N) with entry_key[i] >= search_key.
        let mut i = 0;
        while i < n && node.entry(i).0 < search {
            i += 1;
        }

        if i < n && node.entry(i).0 == search {
            let (_, offset, length) = node.entry(i);
            return Ok(RecordLocator::new(offset, length));
        }

        match node.child_offset(i) {
            Some(child) => self.locate_at(child, key, depth + 1),
            None => Err(PortalError::NotFound(key)),
        }
    }

    /// In-order traversal of the whole tree, calling `emit` with every
    /// `(key, locator)` pair for which `predicate(key)` is true.
    ///
    /// Traversal order is child[0], entry[0], child[1], entry[1], …,
    /// child[N], so that results come back in
    /// ascending key order.
    pub fn enumerate(
        &mut self,
        mut predicate: impl FnMut(Key) -> bool,
        mut emit: impl FnMut(Key, RecordLocator),
    ) -> Result<()> {
        self.enumerate_at(self.root, 0, &mut predicate, &mut emit)
    }

    fn enumerate_at(
        &mut self,
        node_offset: u64,
        depth: u32,
        predicate: &mut impl FnMut(Key) -> bool,
        emit: &mut impl FnMut(Key, RecordLocator),
    ) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(PortalError::CorruptDirectory(format!(
                "tree depth exceeded {MAX_DEPTH} during enumeration"
            )));
        }

        let node = DirectoryNode::read(self.sectors, node_offset)?;
        let n = node.entry_count();

        for i in 0..n {
            if let Some(child) = node.child_offset(i) {
                self.enumerate_at(child, depth + 1, predicate, emit)?;
            }

            let (key, offset, length) = node.entry(i);
            let key = Key::new(key);
            if predicate(key) {
                emit(key, RecordLocator::new(offset, length));
            }
        }

        if let Some(child) = node.child_offset(n) {
            self.enumerate_at(child, depth + 1, predicate, emit)?;
        }

        Ok(())
    }

    /// All keys whose top byte equals `type_prefix`, in ascending key order.
    pub fn enumerate_prefix(&mut self, type_prefix: u8) -> Result<Vec<(Key, RecordLocator)>> {
        let mut out = Vec::new();
        self.enumerate(
            |key| key.type_prefix() == type_prefix,
            |key, locator| out.push((key, locator)),
        )?;
        trace!(type_prefix, hits = out.len(), "enumerated prefix");
        Ok(out)
    }

    /// All keys whose low 16 bits equal `value`, in ascending key order. Used
    /// by the landblock aggregator's `0xFFFF` terrain-marker filter.
    pub fn enumerate_suffix_mask(&mut self, value: u16) -> Result<Vec<(Key, RecordLocator)>> {
        let mut out = Vec::new();
        self.enumerate(
            |key| key.low_word() == value,
            |key, locator| out.push((key, locator)),
        )?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArchiveDialect;
    use std::collections::BTreeMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// A tiny in-memory B-tree builder for dialect-P (one sector per node),
    /// used to exercise lookup/enumeration without hand-encoding bytes.
    struct TreeBuilder {
        sector_size: usize,
        sectors: Vec<[u8; 1024]>,
    }

    impl TreeBuilder {
        /// Offset 0 is the reserved archive header and also the protocol's
        /// null-pointer sentinel; a real node is never placed there, so the
        /// builder reserves sector 0 up front and starts allocating at
        /// `sector_size`.
        fn new() -> Self {
            Self {
                sector_size: ArchiveDialect::Portal.sector_size(),
                sectors: vec![[0u8; 1024]],
            }
        }

        /// Appends a leaf node with the given sorted entries and returns its
        /// sector offset.
        fn leaf(&mut self, entries: &[(u32, u64, u32)]) -> u64 {
            self.node(0, entries, &[])
        }

        /// Appends an internal node. `children` must have `entries.len() + 1`
        /// offsets.
        fn internal(&mut self, entries: &[(u32, u64, u32)], children: &[u64]) -> u64 {
            assert_eq!(children.len(), entries.len() + 1);
            self.node(children[0], entries, &children[1..])
        }

        fn node(&mut self, first_child: u64, entries: &[(u32, u64, u32)], rest_children: &[u64]) -> u64 {
            let mut words = [0u32; 256];
            words[0] = first_child as u32;
            for (i, child) in rest_children.iter().enumerate() {
                words[1 + i] = *child as u32;
            }
            words[0x3F] = entries.len() as u32;
            for (i, (key, offset, length)) in entries.iter().enumerate() {
                words[0x40 + i * 3] = *key;
                words[0x40 + i * 3 + 1] = *offset as u32;
                words[0x40 + i * 3 + 2] = *length;
            }

            let mut sector = [0u8; 1024];
            for (i, w) in words.iter().enumerate() {
                sector[i * 4..i * 4 + 4].copy_from_slice(&w.to_le_bytes());
            }
            let offset = (self.sectors.len() * self.sector_size) as u64;
            self.sectors.push(sector);
            offset
        }

        fn into_file(self) -> NamedTempFile {
            let mut file = NamedTempFile::new().unwrap();
            for sector in &self.sectors {
                file.write_all(sector).unwrap();
            }
            file.flush().unwrap();
            file
        }
    }

    fn sample_tree() -> (NamedTempFile, u64, BTreeMap<u32, (u64, u32)>) {
        let mut builder = TreeBuilder::new();
        let left = builder.leaf(&[(10, 100, 1), (20, 200, 2)]);
        let right = builder.leaf(&[(40, 400, 4), (50, 500, 5)]);
        let root = builder.internal(&[(30, 300, 3)], &[left, right]);

        let mut expected = BTreeMap::new();
        for (k, o, l) in [(10, 100, 1), (20, 200, 2), (30, 300, 3), (40, 400, 4), (50, 500, 5)] {
            expected.insert(k, (o, l));
        }

        let file = builder.into_file();
        (file, root, expected)
    }

    #[test]
    fn locate_finds_every_inserted_key_and_nothing_else() {
        let (file, root, expected) = sample_tree();
        let mut sectors = SectorReader::open(file.path(), ArchiveDialect::Portal).unwrap();
        let mut index = DirectoryIndex::new(&mut sectors, root);

        for (&key, &(offset, length)) in &expected {
            let locator = index.locate(Key::new(key)).unwrap();
            assert_eq!(locator.offset, offset);
            assert_eq!(locator.length, length);
        }

        for missing in [0u32, 5, 15, 25, 35, 45, 60] {
            assert!(matches!(index.locate(Key::new(missing)), Err(PortalError::NotFound(_))));
        }
    }

    #[test]
    fn enumerate_visits_keys_in_ascending_order() {
        let (file, root, expected) = sample_tree();
        let mut sectors = SectorReader::open(file.path(), ArchiveDialect::Portal).unwrap();
        let mut index = DirectoryIndex::new(&mut sectors, root);

        let mut seen = Vec::new();
        index.enumerate(|_| true, |key, _| seen.push(key.value())).unwrap();

        let expected_keys: Vec<u32> = expected.keys().copied().collect();
        assert_eq!(seen, expected_keys);
    }

    #[test]
    fn enumerate_matches_exhaustive_probing_for_a_predicate() {
        let (file, root, expected) = sample_tree();
        let mut sectors = SectorReader::open(file.path(), ArchiveDialect::Portal).unwrap();
        let mut index = DirectoryIndex::new(&mut sectors, root);

        let predicate = |key: Key| key.value() % 20 == 0;

        let mut via_traversal = Vec::new();
        index
            .enumerate(predicate, |key, locator| via_traversal.push((key.value(), locator.offset, locator.length)))
            .unwrap();

        let via_probing: Vec<(u32, u64, u32)> = expected
            .iter()
            .filter(|(&k, _)| predicate(Key::new(k)))
            .map(|(&k, &(o, l))| (k, o, l))
            .collect();

        assert_eq!(via_traversal, via_probing);
    }

    #[test]
    fn depth_bound_catches_cyclic_pointers() {
        // A node whose single child points back at itself.
        let mut builder = TreeBuilder::new();
        let offset = (builder.sectors.len() * builder.sector_size) as u64;
        let cyclic = builder.internal(&[(1, 0, 0)], &[offset, offset]);
        assert_eq!(cyclic, offset);

        let file = builder.into_file();
        let mut sectors = SectorReader::open(file.path(), ArchiveDialect::Portal).unwrap();
        let mut index = DirectoryIndex::new(&mut sectors, cyclic);
        let err = index.locate(Key::new(999)).unwrap_err();
        assert!(matches!(err, PortalError::CorruptDirectory(_)));
    }
}
