//! Tree to XML and XML to tree mapping.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::profile::PropertyStyle;
use crate::tree::XmbTree;
use crate::{Error, Result};

impl XmbTree {
    /// Render the forest as indented XML text.
    ///
    /// With [`PropertyStyle::Attributes`] properties become attributes on
    /// the element; with [`PropertyStyle::ChildElements`] each property
    /// becomes a child element named after the key with the value as
    /// text, placed before the entry's real children.
    pub fn to_xml_string(&self, style: PropertyStyle) -> Result<String> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new_with_indent(&mut buffer, b' ', 4);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| Error::Xml(e.to_string()))?;

        for &root in &self.roots {
            self.write_element(&mut writer, root, style)?;
        }

        String::from_utf8(buffer).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Write one entry and its subtree.
    fn write_element<W: Write>(
        &self,
        writer: &mut Writer<W>,
        index: usize,
        style: PropertyStyle,
    ) -> Result<()> {
        let entry = self.entry(index).ok_or_else(|| Error::EntryIndexOutOfBounds {
            index: index as i32,
            count: self.entries.len(),
        })?;

        let mut elem = BytesStart::new(entry.name.as_str());
        let has_body = match style {
            PropertyStyle::Attributes => {
                for (key, value) in entry.properties.iter() {
                    elem.push_attribute((key, value));
                }
                !entry.children.is_empty()
            }
            PropertyStyle::ChildElements => {
                !entry.children.is_empty() || !entry.properties.is_empty()
            }
        };

        if !has_body {
            writer
                .write_event(Event::Empty(elem))
                .map_err(|e| Error::Xml(e.to_string()))?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(elem))
            .map_err(|e| Error::Xml(e.to_string()))?;

        if style == PropertyStyle::ChildElements {
            for (key, value) in entry.properties.iter() {
                writer
                    .write_event(Event::Start(BytesStart::new(key)))
                    .map_err(|e| Error::Xml(e.to_string()))?;
                writer
                    .write_event(Event::Text(BytesText::new(value)))
                    .map_err(|e| Error::Xml(e.to_string()))?;
                writer
                    .write_event(Event::End(BytesEnd::new(key)))
                    .map_err(|e| Error::Xml(e.to_string()))?;
            }
        }

        for &child in &entry.children {
            self.write_element(writer, child, style)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(entry.name.as_str())))
            .map_err(|e| Error::Xml(e.to_string()))?;
        Ok(())
    }

    /// Parse XML text into a tree; the structural inverse of the
    /// attribute property style.
    ///
    /// Each element becomes an entry with its index assigned in document
    /// order, attributes become properties, and parent links derive from
    /// the element nesting. Text content and other events are ignored.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut tree = Self::default();
        let mut stack: Vec<usize> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let index = open_element(&mut tree, &stack, &e)?;
                    stack.push(index);
                }
                Ok(Event::Empty(e)) => {
                    open_element(&mut tree, &stack, &e)?;
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // text, comments, declarations
                Err(e) => return Err(Error::Xml(format!("XML parse error: {}", e))),
            }
        }

        if tree.is_empty() {
            return Err(Error::Xml("no root element found".into()));
        }
        Ok(tree)
    }
}

/// Append an element as a new entry under the innermost open element.
fn open_element(tree: &mut XmbTree, stack: &[usize], e: &BytesStart<'_>) -> Result<usize> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let index = tree.push_entry(name, stack.last().copied());

    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        tree.entries[index].properties.insert(key, value);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FormatProfile;

    fn two_node_tree() -> XmbTree {
        let mut tree = XmbTree::default();
        let root = tree.push_entry("A", None);
        tree.entries[root].properties.insert("id", "1");
        let child = tree.push_entry("B", Some(root));
        tree.entries[child].properties.insert("name", "x");
        tree
    }

    #[test]
    fn attribute_style_renders_properties_as_attributes() {
        let xml = two_node_tree()
            .to_xml_string(PropertyStyle::Attributes)
            .unwrap();

        assert!(xml.contains(r#"<A id="1">"#));
        assert!(xml.contains(r#"<B name="x"/>"#));
        assert!(xml.contains("</A>"));
    }

    #[test]
    fn child_element_style_renders_properties_as_elements() {
        let xml = two_node_tree()
            .to_xml_string(PropertyStyle::ChildElements)
            .unwrap();

        assert!(xml.contains("<id>1</id>"));
        assert!(xml.contains("<name>x</name>"));
        assert!(!xml.contains(r#"id="1""#));
    }

    #[test]
    fn indentation_is_four_spaces_per_level() {
        let xml = two_node_tree()
            .to_xml_string(PropertyStyle::Attributes)
            .unwrap();
        assert!(xml.contains("\n    <B"));
    }

    #[test]
    fn from_xml_assigns_indices_in_document_order() {
        let xml = r#"<A>
            <B attr="1">
                <C/>
            </B>
            <D/>
        </A>"#;
        let tree = XmbTree::from_xml(xml).unwrap();

        let names: Vec<&str> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
        assert_eq!(tree.roots, [0]);
        assert_eq!(tree.entries[0].children, [1, 3]);
        assert_eq!(tree.entries[1].children, [2]);
        assert_eq!(tree.entries[1].properties.get("attr"), Some("1"));
        assert_eq!(tree.entries[3].parent, Some(0));
    }

    #[test]
    fn from_xml_rejects_empty_input() {
        assert!(matches!(XmbTree::from_xml(""), Err(Error::Xml(_))));
    }

    #[test]
    fn xml_round_trip_preserves_structure() {
        let original = two_node_tree();
        let xml = original.to_xml_string(PropertyStyle::Attributes).unwrap();
        let reparsed = XmbTree::from_xml(&xml).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn full_pipeline_from_xml_through_binary_and_back() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<Catalog region="EU">
    <Item sku="ab-1" price="10"/>
    <Item sku="ab-2" price="10"/>
</Catalog>"#;

        let profile = FormatProfile::TAGGED;
        let tree = XmbTree::from_xml(xml).unwrap();
        let bytes = tree.encode(&profile).unwrap();
        let decoded = XmbTree::decode(&bytes, &profile).unwrap();
        assert_eq!(decoded, tree);

        let rendered = decoded.to_xml_string(profile.properties).unwrap();
        let reparsed = XmbTree::from_xml(&rendered).unwrap();
        assert_eq!(reparsed, tree);
    }
}
