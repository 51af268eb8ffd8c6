//! The paginated, fully resolved output of the pagination engine.
//!
//! Every object node carries absolute coordinates (section offset and page
//! margin already applied), no `name` and, for text, the literal content in
//! place of the `source` template.

use std::path::Path;

use crate::common::{Margin, Size};
use crate::error::Error;
use crate::node::Node;
use crate::object::{OBJECT_TAGS, ReportObject};
use crate::report::{PageSetup, Properties};

pub(crate) const ROOT_TAG: &str = "reptool_report";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixedPage {
    pub size: Size,
    pub margin: Margin,
    pub nodes: Vec<Node>,
}

impl FixedPage {
    pub fn new(setup: &PageSetup) -> Self {
        FixedPage {
            size: setup.size,
            margin: setup.margin,
            nodes: Vec::new(),
        }
    }

    /// Typed view of the page's drawables, in paint order.
    pub fn objects(&self) -> impl Iterator<Item = ReportObject> + '_ {
        self.nodes.iter().filter_map(ReportObject::from_fixed_node)
    }

    fn to_node(&self) -> Node {
        let mut node = PageSetup {
            size: self.size,
            margin: self.margin,
        }
        .to_node();
        node.children = self.nodes.clone();
        node
    }

    fn from_node(node: &Node) -> Result<FixedPage, Error> {
        let setup = PageSetup::from_node(node)?;
        let mut page = FixedPage::new(&setup);
        for child in &node.children {
            if OBJECT_TAGS.contains(&child.tag.as_str()) {
                page.nodes.push(child.clone());
            } else {
                log::warn!("Unknown element <{}> on fixed page ignored", child.tag);
            }
        }
        Ok(page)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixedDocument {
    pub properties: Properties,
    pub pages: Vec<FixedPage>,
}

impl FixedDocument {
    pub fn new(properties: Properties) -> Self {
        FixedDocument {
            properties,
            pages: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Replace `marker` in the content of every text node. Returns the number
    /// of nodes changed.
    pub fn replace_text(&mut self, marker: &str, replacement: &str) -> usize {
        let mut changed = 0;
        for node in self.pages.iter_mut().flat_map(|p| p.nodes.iter_mut()) {
            if node.tag != "text" {
                continue;
            }
            if let Some(text) = &mut node.text
                && text.contains(marker)
            {
                *text = text.replace(marker, replacement);
                changed += 1;
            }
        }
        changed
    }

    pub fn to_node(&self) -> Node {
        let mut root = Node::new(ROOT_TAG);
        root.push(self.properties.to_node());
        for page in &self.pages {
            root.push(page.to_node());
        }
        root
    }

    pub fn to_xml(&self) -> Result<String, Error> {
        self.to_node().to_xml()
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        std::fs::write(path, self.to_xml()?).map_err(Error::Io)
    }

    pub fn from_xml(xml: &str) -> Result<FixedDocument, Error> {
        let root = Node::parse_xml(xml)?;
        FixedDocument::from_node(&root)
    }

    pub fn from_node(root: &Node) -> Result<FixedDocument, Error> {
        if root.tag != ROOT_TAG {
            return Err(Error::InvalidReport(format!(
                "root element is <{}>, not <{ROOT_TAG}>",
                root.tag
            )));
        }
        let properties = root
            .child("properties")
            .map(Properties::from_node)
            .unwrap_or_default();
        let pages = root
            .children_named("page")
            .map(FixedPage::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FixedDocument { properties, pages })
    }

    pub fn from_file(path: &Path) -> Result<FixedDocument, Error> {
        let xml = std::fs::read_to_string(path)?;
        FixedDocument::from_xml(&xml)
    }
}
