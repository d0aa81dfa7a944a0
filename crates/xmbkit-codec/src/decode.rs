//! Binary container decoding.

use std::collections::HashMap;

use xmbkit_common::{ByteCursor, Error as CommonError};

use crate::entry::EntryRecord;
use crate::header::XmbHeader;
use crate::profile::{ChildLinking, FormatProfile};
use crate::tree::{Entry, Properties, XmbTree};
use crate::{Error, Result};

impl XmbTree {
    /// Decode a complete container into a tree.
    ///
    /// Walks the entry table in order, resolves every name and property
    /// through the string blobs, reads the node map when the revision
    /// carries one, and links entries with the revision's child-linking
    /// convention. Fails on the first truncated or out-of-bounds read;
    /// no partial tree is returned.
    pub fn decode(data: &[u8], profile: &FormatProfile) -> Result<Self> {
        let mut cursor = ByteCursor::new(data, profile.endian);
        let header = XmbHeader::decode(&mut cursor, profile.header)?;

        let mut entries = Vec::with_capacity(header.num_entries as usize);
        let mut records = Vec::with_capacity(header.num_entries as usize);
        for index in 0..header.num_entries as usize {
            cursor.seek(header.entries_pos as usize + index * EntryRecord::SIZE);
            let record = EntryRecord::decode(&mut cursor)?;

            cursor.seek(header.names_pos as usize + record.name_offset as usize);
            let name = cursor.read_cstring()?.to_owned();

            let properties = decode_properties(&mut cursor, &header, &record)?;

            entries.push(Entry {
                name,
                properties,
                children: Vec::new(),
                parent: None,
            });
            records.push(record);
        }

        let node_map = if profile.node_map {
            decode_node_map(&mut cursor, &header)?
        } else {
            HashMap::new()
        };

        let roots = match profile.linking {
            ChildLinking::ParentIndex => link_parent_index(&mut entries, &records)?,
            ChildLinking::SiblingRange => link_sibling_range(&mut entries, &records)?,
        };

        Ok(Self {
            entries,
            roots,
            node_map,
        })
    }
}

/// Resolve one entry's properties from the property table.
///
/// Property keys dereference into the name blob, values into the value
/// blob. A key repeating within one entry resolves to its last value.
fn decode_properties(
    cursor: &mut ByteCursor<'_>,
    header: &XmbHeader,
    record: &EntryRecord,
) -> Result<Properties> {
    let mut properties = Properties::new();
    for slot in 0..record.num_props {
        let prop_index = i64::from(record.first_prop) + i64::from(slot);
        let pos = i64::from(header.properties_pos) + prop_index * 8;
        let pos = usize::try_from(pos).map_err(|_| {
            Error::Common(CommonError::UnexpectedEof {
                needed: 8,
                available: 0,
            })
        })?;
        cursor.seek(pos);
        let key_offset = cursor.read_u32()?;
        let value_offset = cursor.read_u32()?;

        cursor.seek(header.names_pos as usize + key_offset as usize);
        let key = cursor.read_cstring()?.to_owned();
        cursor.seek(header.values_pos as usize + value_offset as usize);
        let value = cursor.read_cstring()?.to_owned();
        properties.insert(key, value);
    }
    Ok(properties)
}

/// Read the node-ID lookup table.
///
/// Keys resolve through the value blob. Uniqueness is not checked; a
/// repeated key keeps the last record's entry index.
fn decode_node_map(
    cursor: &mut ByteCursor<'_>,
    header: &XmbHeader,
) -> Result<HashMap<String, u32>> {
    let mut map = HashMap::with_capacity(header.num_mapped as usize);
    for index in 0..header.num_mapped as usize {
        cursor.seek(header.node_map_pos as usize + index * 8);
        let key_offset = cursor.read_u32()?;
        let entry_index = cursor.read_u32()?;

        cursor.seek(header.values_pos as usize + key_offset as usize);
        let key = cursor.read_cstring()?.to_owned();
        map.insert(key, entry_index);
    }
    Ok(map)
}

/// Link entries through explicit parent back-references.
fn link_parent_index(entries: &mut [Entry], records: &[EntryRecord]) -> Result<Vec<usize>> {
    let mut roots = Vec::new();
    for index in 0..entries.len() {
        let parent = i32::from(records[index].parent_index);
        if parent == -1 {
            roots.push(index);
            continue;
        }
        let count = entries.len();
        if parent < 0 || parent as usize >= count {
            return Err(Error::EntryIndexOutOfBounds {
                index: parent,
                count,
            });
        }
        entries[parent as usize].children.push(index);
        entries[index].parent = Some(parent as usize);
    }
    Ok(roots)
}

/// Link entries through contiguous sibling runs.
///
/// The parent field names the first slot of a candidate run. The run is
/// walked with the bound `counter < records[base + counter].num_children`,
/// and each slot whose children list has not yet reached its declared
/// count receives the entry. The scheme only works on tables laid out
/// contiguously by the original encoder; that assumption is not validated
/// here, matching the files this revision ships in.
fn link_sibling_range(entries: &mut [Entry], records: &[EntryRecord]) -> Result<Vec<usize>> {
    let mut roots = Vec::new();
    for index in 0..entries.len() {
        let parent = i32::from(records[index].parent_index);
        if parent == -1 {
            roots.push(index);
            continue;
        }
        if parent < 0 {
            return Err(Error::EntryIndexOutOfBounds {
                index: parent,
                count: entries.len(),
            });
        }
        let base = parent as usize;
        let mut counter = 0usize;
        loop {
            let slot = base + counter;
            let record = records.get(slot).ok_or_else(|| Error::EntryIndexOutOfBounds {
                index: slot as i32,
                count: entries.len(),
            })?;
            let declared = record.num_children.max(0) as usize;
            if counter >= declared {
                break;
            }
            if entries[slot].children.len() < declared {
                entries[slot].children.push(index);
                entries[index].parent = Some(slot);
            }
            counter += 1;
        }
    }
    Ok(roots)
}

/// Header and raw entry summary of a container, without building a tree.
#[derive(Debug, Clone)]
pub struct XmbInfo {
    /// The decoded header.
    pub header: XmbHeader,
    /// Resolved name and raw record of each entry, in table order.
    pub entries: Vec<(String, EntryRecord)>,
}

/// Read the header and entry records, resolving names only.
///
/// Backs the CLI's info listing; properties and links are skipped so a
/// partially damaged file can still be summarized up to the first bad
/// name offset.
pub fn inspect(data: &[u8], profile: &FormatProfile) -> Result<XmbInfo> {
    let mut cursor = ByteCursor::new(data, profile.endian);
    let header = XmbHeader::decode(&mut cursor, profile.header)?;

    let mut entries = Vec::with_capacity(header.num_entries as usize);
    for index in 0..header.num_entries as usize {
        cursor.seek(header.entries_pos as usize + index * EntryRecord::SIZE);
        let record = EntryRecord::decode(&mut cursor)?;

        cursor.seek(header.names_pos as usize + record.name_offset as usize);
        let name = cursor.read_cstring()?.to_owned();
        entries.push((name, record));
    }

    Ok(XmbInfo { header, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::HeaderLayout;
    use xmbkit_common::{ByteWriter, Endian};

    /// Assemble a minimal tagged-layout file by hand: every entry is
    /// named "n" (name blob offset 0) and carries no properties.
    fn tagged_fixture(endian: Endian, records: &[(i16, i16)], mapped: &[(&str, u32)]) -> Vec<u8> {
        let num_entries = records.len() as u32;
        let entries_pos = XmbHeader::SIZE as u32;
        let node_map_pos = entries_pos + EntryRecord::SIZE as u32 * num_entries;
        let names_pos = node_map_pos + 8 * mapped.len() as u32;
        let values_pos = names_pos + 4;

        let mut w = ByteWriter::new(endian);
        let header = XmbHeader {
            num_entries,
            num_values: mapped.len() as u32,
            num_names: 1,
            num_mapped: mapped.len() as u32,
            str_offsets_pos: 0,
            entries_pos,
            properties_pos: 0,
            node_map_pos,
            names_pos,
            values_pos,
        };
        header.encode(&mut w, HeaderLayout::Tagged);

        for &(parent_index, num_children) in records {
            EntryRecord {
                name_offset: 0,
                num_props: 0,
                num_children,
                first_prop: 0,
                unk1: -1,
                parent_index,
                unk2: -1,
            }
            .encode(&mut w);
        }

        // Node-map records point into the value blob.
        let mut value_blob = ByteWriter::new(endian);
        for &(key, entry_index) in mapped {
            w.write_u32(value_blob.len() as u32);
            w.write_u32(entry_index);
            value_blob.write_cstr(key);
        }

        w.write_bytes(b"n\0\0\0");
        w.write_bytes(&value_blob.into_vec());
        w.into_vec()
    }

    /// Assemble a minimal legacy-layout file by hand, with the reordered
    /// header fields and no node map.
    fn legacy_fixture(records: &[(i16, i16)]) -> Vec<u8> {
        let num_entries = records.len() as u32;
        let entries_pos = XmbHeader::SIZE as u32;
        let names_pos = entries_pos + EntryRecord::SIZE as u32 * num_entries;
        let values_pos = names_pos + 4;

        let mut w = ByteWriter::new(Endian::Little);
        let header = XmbHeader {
            num_entries,
            num_values: 0,
            num_names: 1,
            num_mapped: 0,
            str_offsets_pos: 0,
            entries_pos,
            properties_pos: 0,
            node_map_pos: 0,
            names_pos,
            values_pos,
        };
        header.encode(&mut w, HeaderLayout::Legacy);

        for &(parent_index, num_children) in records {
            EntryRecord {
                name_offset: 0,
                num_props: 0,
                num_children,
                first_prop: 0,
                unk1: -1,
                parent_index,
                unk2: -1,
            }
            .encode(&mut w);
        }
        w.write_bytes(b"n\0\0\0");
        w.into_vec()
    }

    #[test]
    fn parent_index_linking_builds_forest() {
        let data = tagged_fixture(Endian::Little, &[(-1, 2), (0, 0), (0, 0), (-1, 0)], &[]);
        let tree = XmbTree::decode(&data, &FormatProfile::TAGGED).unwrap();

        assert_eq!(tree.roots, [0, 3]);
        assert_eq!(tree.entries[0].children, [1, 2]);
        assert_eq!(tree.entries[1].parent, Some(0));
        assert_eq!(tree.entries[3].children.len(), 0);
    }

    #[test]
    fn forest_roots_are_exactly_the_unparented_entries() {
        let data = tagged_fixture(Endian::Little, &[(-1, 1), (0, 1), (1, 0), (-1, 0)], &[]);
        let tree = XmbTree::decode(&data, &FormatProfile::TAGGED).unwrap();

        let mut linked: Vec<usize> = tree
            .entries
            .iter()
            .flat_map(|e| e.children.iter().copied())
            .collect();
        linked.sort_unstable();

        assert!(!tree.roots.is_empty());
        let unlinked: Vec<usize> =
            (0..tree.len()).filter(|i| !linked.contains(i)).collect();
        assert_eq!(tree.roots, unlinked);
    }

    #[test]
    fn parent_index_out_of_bounds_is_an_error() {
        let data = tagged_fixture(Endian::Little, &[(-1, 0), (7, 0)], &[]);
        let result = XmbTree::decode(&data, &FormatProfile::TAGGED);
        assert!(matches!(
            result,
            Err(Error::EntryIndexOutOfBounds { index: 7, count: 2 })
        ));
    }

    #[test]
    fn big_endian_fixture_decodes() {
        let data = tagged_fixture(Endian::Big, &[(-1, 1), (0, 0)], &[]);
        let profile = FormatProfile::TAGGED.with_endian(Endian::Big);
        let tree = XmbTree::decode(&data, &profile).unwrap();

        assert_eq!(tree.roots, [0]);
        assert_eq!(tree.entries[0].name, "n");
        assert_eq!(tree.entries[0].children, [1]);
    }

    #[test]
    fn node_map_decodes_with_last_record_winning() {
        let data = tagged_fixture(
            Endian::Little,
            &[(-1, 0)],
            &[("first", 0), ("dup", 3), ("dup", 9)],
        );
        let tree = XmbTree::decode(&data, &FormatProfile::TAGGED).unwrap();

        assert_eq!(tree.node_map.len(), 2);
        assert_eq!(tree.node_map.get("first"), Some(&0));
        assert_eq!(tree.node_map.get("dup"), Some(&9));
    }

    #[test]
    fn node_map_is_skipped_when_the_revision_lacks_it() {
        // Same bytes, but decoded through a profile without a node map:
        // the counter slot is treated as reserved.
        let data = tagged_fixture(Endian::Little, &[(-1, 0)], &[("key", 0)]);
        let mut profile = FormatProfile::TAGGED;
        profile.node_map = false;
        let tree = XmbTree::decode(&data, &profile).unwrap();
        assert!(tree.node_map.is_empty());
    }

    #[test]
    fn sibling_range_links_declared_run() {
        let data = legacy_fixture(&[(-1, 2), (0, 0), (0, 0)]);
        let tree = XmbTree::decode(&data, &FormatProfile::LEGACY).unwrap();

        assert_eq!(tree.roots, [0]);
        assert_eq!(tree.entries[0].children, [1, 2]);
        assert_eq!(tree.entries[1].parent, Some(0));
        assert_eq!(tree.entries[2].parent, Some(0));
    }

    #[test]
    fn sibling_range_ignores_entries_beyond_the_declared_run() {
        // A fourth entry also claims parent 0, but the root only declares
        // two children and the run bound stops at slot 1's zero count.
        let data = legacy_fixture(&[(-1, 2), (0, 0), (0, 0), (0, 0)]);
        let tree = XmbTree::decode(&data, &FormatProfile::LEGACY).unwrap();

        assert_eq!(tree.entries[0].children, [1, 2]);
        assert_eq!(tree.entries[3].parent, None);
        assert!(tree.entries.iter().all(|e| !e.children.contains(&3)));
    }

    #[test]
    fn sibling_range_nested_runs() {
        // Root declares one child; that child declares one of its own in
        // the slot right after it.
        let data = legacy_fixture(&[(-1, 1), (0, 1), (1, 0)]);
        let tree = XmbTree::decode(&data, &FormatProfile::LEGACY).unwrap();

        assert_eq!(tree.roots, [0]);
        assert_eq!(tree.entries[0].children, [1]);
        assert_eq!(tree.entries[1].children, [2]);
    }

    #[test]
    fn truncated_entry_table_fails() {
        let mut data = tagged_fixture(Endian::Little, &[(-1, 0), (0, 0)], &[]);
        data.truncate(XmbHeader::SIZE + EntryRecord::SIZE / 2);
        let result = XmbTree::decode(&data, &FormatProfile::TAGGED);
        assert!(matches!(result, Err(Error::Common(_))));
    }

    #[test]
    fn wrong_magic_fails_regardless_of_content() {
        let mut data = tagged_fixture(Endian::Little, &[(-1, 0)], &[]);
        data[..4].copy_from_slice(b"XML ");
        let result = XmbTree::decode(&data, &FormatProfile::TAGGED);
        assert!(matches!(
            result,
            Err(Error::Common(xmbkit_common::Error::InvalidMagic { .. }))
        ));
    }

    #[test]
    fn inspect_reports_header_and_raw_records() {
        let data = tagged_fixture(Endian::Little, &[(-1, 1), (0, 0)], &[]);
        let info = inspect(&data, &FormatProfile::TAGGED).unwrap();

        assert_eq!(info.header.num_entries, 2);
        assert_eq!(info.entries.len(), 2);
        assert_eq!(info.entries[0].0, "n");
        assert_eq!(info.entries[0].1.num_children, 1);
        assert_eq!(info.entries[1].1.parent_index, 0);
    }
}
