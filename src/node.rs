//! Owned attribute tree used by both declarative formats.
//!
//! Report objects and sections are read from and written to `Node`s; the XML
//! text itself is only touched by [`Node::parse_xml`] (roxmltree) and
//! [`Node::to_xml`] (quick-xml).

use std::collections::BTreeMap;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Error, xml_write_err};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub tag: String,
    attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn with_text(tag: &str, text: impl Into<String>) -> Self {
        Self {
            tag: tag.to_string(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        self.attrs.remove(key)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Text content of the first child element called `tag`.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag).and_then(|c| c.text.as_deref())
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn from_roxml(node: roxmltree::Node) -> Self {
        let mut out = Node::new(node.tag_name().name());
        for attr in node.attributes() {
            out.attrs
                .insert(attr.name().to_string(), attr.value().to_string());
        }
        let mut text = String::new();
        let mut has_text = false;
        for child in node.children() {
            if child.is_element() {
                out.children.push(Node::from_roxml(child));
            } else if child.is_text()
                && let Some(t) = child.text()
            {
                text.push_str(t);
                has_text = true;
            }
        }
        if has_text && out.children.is_empty() {
            out.text = Some(text);
        }
        out
    }

    /// Parse an XML document into its root element.
    pub fn parse_xml(xml: &str) -> Result<Node, Error> {
        let doc = roxmltree::Document::parse(xml)?;
        Ok(Node::from_roxml(doc.root_element()))
    }

    pub fn to_xml(&self) -> Result<String, Error> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_write_err)?;
        self.write(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(xml_write_err)
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), Error> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (k, v) in &self.attrs {
            start.push_attribute((k.as_str(), v.as_str()));
        }
        let text = self.text.as_deref().filter(|t| !t.is_empty());
        if text.is_none() && self.children.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(xml_write_err);
        }
        writer.write_event(Event::Start(start)).map_err(xml_write_err)?;
        if let Some(t) = text {
            writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(xml_write_err)?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.tag.as_str())))
            .map_err(xml_write_err)
    }
}
