//! XMB binary container codec.
//!
//! XMB files store a complete XML-like document as flat tables: a header
//! naming five regions, a table of fixed 16-byte entry records, a table of
//! 8-byte property records, and two blobs of NUL-terminated strings (one
//! for names, one for values). Several historical revisions of the layout
//! exist; all of them decode through one codec parameterized by a
//! [`FormatProfile`], and the primary tagged revision can be written back
//! out byte-exactly reparseable.
//!
//! # Example
//!
//! ```no_run
//! use xmbkit_codec::{FormatProfile, XmbTree};
//!
//! let data = std::fs::read("menu.xmb")?;
//! let profile = FormatProfile::TAGGED;
//!
//! let tree = XmbTree::decode(&data, &profile)?;
//! let xml = tree.to_xml_string(profile.properties)?;
//! println!("{}", xml);
//!
//! let rebuilt = tree.encode(&profile)?;
//! std::fs::write("menu.out.xmb", rebuilt)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decode;
mod encode;
mod entry;
mod error;
mod header;
mod profile;
mod tree;
mod xml;

pub use decode::{inspect, XmbInfo};
pub use entry::EntryRecord;
pub use error::{Error, Result};
pub use header::XmbHeader;
pub use profile::{ChildLinking, FormatProfile, HeaderLayout, PropertyStyle};
pub use tree::{Entry, Properties, XmbTree};
