//! In-memory tree produced by decoding a container or parsing XML.

use std::collections::HashMap;

/// Insertion-ordered property pairs with keyed overwrite.
///
/// A duplicate name replaces the stored value but keeps its original
/// position. Files with repeated property names inside one entry resolve
/// to the last occurrence; that behavior is preserved rather than
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    pairs: Vec<(String, String)>,
}

impl Properties {
    /// Create an empty property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, overwriting the value of an existing name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pairs are stored.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One node of the hierarchy: a name, ordered properties, and non-owning
/// index links into the owning tree's entry store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    /// Element name.
    pub name: String,
    /// Properties in first-seen order.
    pub properties: Properties,
    /// Indices of direct children, in first-seen order.
    pub children: Vec<usize>,
    /// Index of the parent entry; `None` for roots.
    pub parent: Option<usize>,
}

/// The decoded forest plus the optional node-ID lookup table.
///
/// Entries live in one arena in table order; parent and child links are
/// plain indices into it. The arena order is authoritative: both child
/// linking and re-encoding walk it as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmbTree {
    /// All entries in table order.
    pub entries: Vec<Entry>,
    /// Indices of entries without a parent, in table order.
    pub roots: Vec<usize>,
    /// Node-ID to entry-index lookup, populated only by revisions that
    /// carry it. Dropped again on the write path.
    pub node_map: HashMap<String, u32>,
}

impl XmbTree {
    /// Look up an entry by index.
    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Number of entries in the arena.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of properties across all entries.
    pub fn property_count(&self) -> usize {
        self.entries.iter().map(|e| e.properties.len()).sum()
    }

    /// Append an entry, linking it under `parent` when given.
    ///
    /// Returns the new entry's index. Appending in document order keeps
    /// the arena in the same order a decoded table would produce.
    pub fn push_entry(&mut self, name: impl Into<String>, parent: Option<usize>) -> usize {
        let index = self.entries.len();
        self.entries.push(Entry {
            name: name.into(),
            properties: Properties::new(),
            children: Vec::new(),
            parent,
        });
        match parent {
            Some(p) => self.entries[p].children.push(index),
            None => self.roots.push(index),
        }
        index
    }
}
