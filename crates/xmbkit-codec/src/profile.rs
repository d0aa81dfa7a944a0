//! Format revision configuration.
//!
//! The container went through several revisions that reorder header
//! fields, link children differently, and map properties onto XML in two
//! ways. The differences are small enough that one codec handles all of
//! them; a [`FormatProfile`] selects the behavior before a decode or
//! encode call instead of duplicating the codec per revision.

use xmbkit_common::Endian;

/// Header field ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Current ordering with the node-map count and offset in use.
    Tagged,
    /// Older ordering; the node-map slots exist but are reserved.
    Legacy,
}

/// How entries are linked to their parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildLinking {
    /// Each entry carries an explicit parent back-reference.
    ParentIndex,
    /// Children occupy contiguous runs of table slots; linking walks the
    /// run named by the parent field until declared counts are used up.
    SiblingRange,
}

/// How properties map onto XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyStyle {
    /// Properties become XML attributes.
    Attributes,
    /// Properties become child elements carrying the value as text,
    /// used by the revision that predates attributes.
    ChildElements,
}

/// Declarative description of one format revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatProfile {
    /// Header field ordering.
    pub header: HeaderLayout,
    /// Child-linking convention.
    pub linking: ChildLinking,
    /// Property serialization convention for the XML bridge.
    pub properties: PropertyStyle,
    /// Whether files of this revision carry the node-ID lookup table.
    pub node_map: bool,
    /// Byte order for files of this revision.
    pub endian: Endian,
}

impl FormatProfile {
    /// The richest revision: explicit parent back-references, a node-ID
    /// map, and attribute-style properties. The only writable revision.
    pub const TAGGED: Self = Self {
        header: HeaderLayout::Tagged,
        linking: ChildLinking::ParentIndex,
        properties: PropertyStyle::Attributes,
        node_map: true,
        endian: Endian::Little,
    };

    /// The flat legacy revision: reordered header, contiguous sibling-run
    /// child linking, no attribute concept, no node map.
    pub const LEGACY: Self = Self {
        header: HeaderLayout::Legacy,
        linking: ChildLinking::SiblingRange,
        properties: PropertyStyle::ChildElements,
        node_map: false,
        endian: Endian::Little,
    };

    /// Same profile with a different byte order.
    #[must_use]
    pub const fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }
}

impl Default for FormatProfile {
    fn default() -> Self {
        Self::TAGGED
    }
}
