//! Fixed-width entry records.

use xmbkit_common::{ByteCursor, ByteWriter};

use crate::Result;

/// One 16-byte record of the entry table, as stored on disk.
///
/// `unk1` and `unk2` vary across revisions and are not interpreted when
/// reading; the write path fills `unk1` with the first-child table index
/// (or -1) and `unk2` with -1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryRecord {
    /// Byte offset of the entry's name within the name blob.
    pub name_offset: u32,
    /// Number of properties belonging to this entry.
    pub num_props: i16,
    /// Number of direct children.
    pub num_children: i16,
    /// Index of the entry's first property in the property table.
    pub first_prop: i16,
    /// Revision-specific field, preserved verbatim.
    pub unk1: i16,
    /// Index of the parent entry; -1 marks a root.
    pub parent_index: i16,
    /// Revision-specific field, preserved verbatim.
    pub unk2: i16,
}

impl EntryRecord {
    /// Size of one record in the entry table.
    pub const SIZE: usize = 0x10;

    /// Read a record at the cursor's current position.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            name_offset: cursor.read_u32()?,
            num_props: cursor.read_i16()?,
            num_children: cursor.read_i16()?,
            first_prop: cursor.read_i16()?,
            unk1: cursor.read_i16()?,
            parent_index: cursor.read_i16()?,
            unk2: cursor.read_i16()?,
        })
    }

    /// Append the record to the writer.
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.name_offset);
        writer.write_i16(self.num_props);
        writer.write_i16(self.num_children);
        writer.write_i16(self.first_prop);
        writer.write_i16(self.unk1);
        writer.write_i16(self.parent_index);
        writer.write_i16(self.unk2);
    }
}
