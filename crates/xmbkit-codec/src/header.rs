//! Container header.

use xmbkit_common::{ByteCursor, ByteWriter};

use crate::profile::HeaderLayout;
use crate::Result;

/// Fixed-size record at offset 0 describing table locations and counts.
///
/// Both header layouts carry the same ten 32-bit fields after the magic
/// tag and total [`Self::SIZE`] bytes; they differ only in field order.
/// In the legacy layout the node-map slots are reserved and preserved
/// verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XmbHeader {
    /// Number of 16-byte records in the entry table.
    pub num_entries: u32,
    /// Number of distinct strings in the value blob.
    pub num_values: u32,
    /// Number of distinct strings in the name blob (also the length of
    /// the string-offset index).
    pub num_names: u32,
    /// Number of node-map records (reserved counter in the legacy layout).
    pub num_mapped: u32,
    /// Offset of the string-offset index.
    pub str_offsets_pos: u32,
    /// Offset of the entry table.
    pub entries_pos: u32,
    /// Offset of the property table.
    pub properties_pos: u32,
    /// Offset of the node-map table (reserved in the legacy layout).
    pub node_map_pos: u32,
    /// Offset of the name-string blob.
    pub names_pos: u32,
    /// Offset of the value-string blob.
    pub values_pos: u32,
}

impl XmbHeader {
    /// Magic tag at the start of every file, trailing space included.
    pub const MAGIC: &'static [u8; 4] = b"XMB ";

    /// Total header size in bytes, magic included.
    pub const SIZE: usize = 0x2C;

    /// Check whether a buffer starts with the container magic.
    pub fn is_xmb(data: &[u8]) -> bool {
        data.len() >= Self::MAGIC.len() && &data[..Self::MAGIC.len()] == Self::MAGIC
    }

    /// Decode the header from the start of the buffer.
    ///
    /// Only the magic tag is validated. Offsets and counts are returned
    /// verbatim; out-of-range values surface later as out-of-bounds read
    /// errors when the tables are walked.
    pub fn decode(cursor: &mut ByteCursor<'_>, layout: HeaderLayout) -> Result<Self> {
        cursor.seek(0);
        cursor.expect_magic(Self::MAGIC)?;

        let mut header = Self::default();
        match layout {
            HeaderLayout::Tagged => {
                header.num_entries = cursor.read_u32()?;
                header.num_values = cursor.read_u32()?;
                header.num_names = cursor.read_u32()?;
                header.num_mapped = cursor.read_u32()?;
                header.str_offsets_pos = cursor.read_u32()?;
                header.entries_pos = cursor.read_u32()?;
                header.properties_pos = cursor.read_u32()?;
                header.node_map_pos = cursor.read_u32()?;
                header.names_pos = cursor.read_u32()?;
                header.values_pos = cursor.read_u32()?;
            }
            HeaderLayout::Legacy => {
                header.num_entries = cursor.read_u32()?;
                header.num_values = cursor.read_u32()?;
                header.num_names = cursor.read_u32()?;
                header.num_mapped = cursor.read_u32()?;
                header.entries_pos = cursor.read_u32()?;
                header.properties_pos = cursor.read_u32()?;
                header.str_offsets_pos = cursor.read_u32()?;
                header.node_map_pos = cursor.read_u32()?;
                header.names_pos = cursor.read_u32()?;
                header.values_pos = cursor.read_u32()?;
            }
        }
        Ok(header)
    }

    /// Write the header in the given layout's field order.
    pub fn encode(&self, writer: &mut ByteWriter, layout: HeaderLayout) {
        writer.write_bytes(Self::MAGIC);
        match layout {
            HeaderLayout::Tagged => {
                writer.write_u32(self.num_entries);
                writer.write_u32(self.num_values);
                writer.write_u32(self.num_names);
                writer.write_u32(self.num_mapped);
                writer.write_u32(self.str_offsets_pos);
                writer.write_u32(self.entries_pos);
                writer.write_u32(self.properties_pos);
                writer.write_u32(self.node_map_pos);
                writer.write_u32(self.names_pos);
                writer.write_u32(self.values_pos);
            }
            HeaderLayout::Legacy => {
                writer.write_u32(self.num_entries);
                writer.write_u32(self.num_values);
                writer.write_u32(self.num_names);
                writer.write_u32(self.num_mapped);
                writer.write_u32(self.entries_pos);
                writer.write_u32(self.properties_pos);
                writer.write_u32(self.str_offsets_pos);
                writer.write_u32(self.node_map_pos);
                writer.write_u32(self.names_pos);
                writer.write_u32(self.values_pos);
            }
        }
    }
}
