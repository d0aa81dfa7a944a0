//! Tree to binary encoding.

use std::collections::HashMap;

use xmbkit_common::ByteWriter;

use crate::entry::EntryRecord;
use crate::header::XmbHeader;
use crate::profile::{ChildLinking, FormatProfile, HeaderLayout};
use crate::tree::XmbTree;
use crate::{Error, Result};

/// Byte offset of the first table region; the gap after the header is
/// zero-filled.
const TABLE_BASE: u32 = 0x40;

/// Deduplicating blob of NUL-terminated strings.
///
/// Each distinct string is stored once at the offset recorded on first
/// insertion. Names and values live in separate blobs, so a string used
/// as both is stored once in each.
#[derive(Debug, Default)]
struct StringBlob {
    strings: Vec<String>,
    offsets: HashMap<String, u32>,
    cursor: u32,
}

impl StringBlob {
    /// Add a string if not already present; returns its blob offset.
    fn add(&mut self, s: &str) -> u32 {
        if let Some(&offset) = self.offsets.get(s) {
            return offset;
        }
        let offset = self.cursor;
        self.offsets.insert(s.to_owned(), offset);
        self.strings.push(s.to_owned());
        self.cursor += s.len() as u32 + 1;
        offset
    }

    /// Number of distinct strings.
    fn count(&self) -> usize {
        self.strings.len()
    }

    /// Unpadded byte length of the blob.
    fn byte_len(&self) -> u32 {
        self.cursor
    }

    /// Every string's offset, ordered by string value. External tools use
    /// the sorted index for lookups; the decoder itself never reads it.
    fn sorted_offsets(&self) -> Vec<u32> {
        let mut pairs: Vec<(&String, &u32)> = self.offsets.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs.into_iter().map(|(_, &offset)| offset).collect()
    }

    /// Write the strings in first-insertion order and pad to a 4-byte
    /// boundary.
    fn write_into(&self, writer: &mut ByteWriter) {
        for s in &self.strings {
            writer.write_cstr(s);
        }
        writer.align_to(4);
    }
}

/// Blob offsets resolved for one entry during string collection.
struct EntryStrings {
    name_offset: u32,
    props: Vec<(u32, u32)>,
}

impl XmbTree {
    /// Encode the tree into the tagged binary layout.
    ///
    /// Only the tagged parent-index revision can be written; the node map
    /// is always written as absent (count zero, offset at the name blob),
    /// so a tree decoded from a file that carried one loses it here.
    pub fn encode(&self, profile: &FormatProfile) -> Result<Vec<u8>> {
        if profile.header != HeaderLayout::Tagged || profile.linking != ChildLinking::ParentIndex {
            return Err(Error::Unsupported(
                "only the tagged parent-index revision can be written".into(),
            ));
        }

        let mut names = StringBlob::default();
        let mut values = StringBlob::default();
        let mut layouts = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let name_offset = names.add(&entry.name);
            let props = entry
                .properties
                .iter()
                .map(|(key, value)| (names.add(key), values.add(value)))
                .collect();
            layouts.push(EntryStrings { name_offset, props });
        }

        let num_entries = self.entries.len() as u32;
        let total_props = self.property_count() as u32;

        let str_offsets_pos = TABLE_BASE;
        let entries_pos = str_offsets_pos + 4 * names.count() as u32;
        let properties_pos = entries_pos + EntryRecord::SIZE as u32 * num_entries;
        let names_pos = properties_pos + 8 * total_props;
        let values_pos = names_pos + padded4(names.byte_len());
        let file_len = values_pos + padded4(values.byte_len());

        let header = XmbHeader {
            num_entries,
            num_values: values.count() as u32,
            num_names: names.count() as u32,
            num_mapped: 0,
            str_offsets_pos,
            entries_pos,
            properties_pos,
            node_map_pos: names_pos,
            names_pos,
            values_pos,
        };

        let mut writer = ByteWriter::with_capacity(profile.endian, file_len as usize);
        header.encode(&mut writer, profile.header);
        writer.pad_to(TABLE_BASE as usize);

        for offset in names.sorted_offsets() {
            writer.write_u32(offset);
        }
        debug_assert_eq!(writer.len(), entries_pos as usize);

        // Entry records and the property table are built in one walk so
        // each entry's properties land contiguously at the running cursor.
        let mut prop_writer = ByteWriter::with_capacity(profile.endian, 8 * total_props as usize);
        let mut prop_cursor: i16 = 0;
        for (entry, strings) in self.entries.iter().zip(&layouts) {
            let record = EntryRecord {
                name_offset: strings.name_offset,
                num_props: entry.properties.len() as i16,
                num_children: entry.children.len() as i16,
                first_prop: prop_cursor,
                unk1: entry.children.first().map_or(-1, |&child| child as i16),
                parent_index: entry.parent.map_or(-1, |parent| parent as i16),
                unk2: -1,
            };
            record.encode(&mut writer);
            prop_cursor += entry.properties.len() as i16;

            for &(key_offset, value_offset) in &strings.props {
                prop_writer.write_u32(key_offset);
                prop_writer.write_u32(value_offset);
            }
        }
        writer.write_bytes(&prop_writer.into_vec());
        debug_assert_eq!(writer.len(), names_pos as usize);

        names.write_into(&mut writer);
        debug_assert_eq!(writer.len(), values_pos as usize);
        values.write_into(&mut writer);

        Ok(writer.into_vec())
    }
}

/// Round up to the next multiple of four.
fn padded4(len: u32) -> u32 {
    (len + 3) & !3
}
