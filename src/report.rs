//! The report template: page geometry, output properties, an optional data
//! binding and five sections of positioned objects.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::common::{Margin, Size, Unit, bool_attr, bool_str, fmt_num, parse_f64};
use crate::data::{DataSource, SqlSource, TableModel, TreeModel, TreeSource};
use crate::error::Error;
use crate::node::Node;
use crate::object::{OBJECT_TAGS, ReportObject};

pub(crate) const ROOT_TAG: &str = "reptool";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputType {
    Png,
    #[default]
    Pdf,
    Ps,
    Svg,
    /// Interactive print dialog.
    Gtk,
    /// Print straight to the default printer.
    GtkDefault,
}

impl OutputType {
    pub fn parse(tag: &str) -> Option<OutputType> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "png" => Some(OutputType::Png),
            "pdf" => Some(OutputType::Pdf),
            "ps" => Some(OutputType::Ps),
            "svg" => Some(OutputType::Svg),
            "gtk" => Some(OutputType::Gtk),
            "gtk-default" => Some(OutputType::GtkDefault),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            OutputType::Png => "png",
            OutputType::Pdf => "pdf",
            OutputType::Ps => "ps",
            OutputType::Svg => "svg",
            OutputType::Gtk => "gtk",
            OutputType::GtkDefault => "gtk-default",
        }
    }

    /// Formats that produce one file per page.
    pub fn one_file_per_page(self) -> bool {
        matches!(self, OutputType::Png | OutputType::Svg)
    }

    pub fn default_filename(self) -> &'static str {
        match self {
            OutputType::Png => "reptool.png",
            OutputType::Pdf | OutputType::Gtk | OutputType::GtkDefault => "reptool.pdf",
            OutputType::Ps => "reptool.ps",
            OutputType::Svg => "reptool.svg",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Properties {
    pub unit: Unit,
    pub output_type: OutputType,
    pub output_filename: Option<String>,
    pub copies: u32,
}

impl Default for Properties {
    fn default() -> Self {
        Properties {
            unit: Unit::Points,
            output_type: OutputType::Pdf,
            output_filename: None,
            copies: 1,
        }
    }
}

impl Properties {
    pub(crate) fn from_node(node: &Node) -> Properties {
        let output_type = node
            .child_text("output-type")
            .map(|t| {
                OutputType::parse(t).unwrap_or_else(|| {
                    log::warn!("Unknown output type \"{t}\"; using pdf");
                    OutputType::Pdf
                })
            })
            .unwrap_or_default();
        let copies = node
            .child_text("copies")
            .and_then(|c| c.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);
        Properties {
            unit: node
                .child_text("unit-length")
                .map(Unit::from_tag)
                .unwrap_or_default(),
            output_type,
            output_filename: node
                .child_text("output-filename")
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
            copies,
        }
    }

    pub(crate) fn to_node(&self) -> Node {
        let mut node = Node::new("properties");
        node.push(Node::with_text("unit-length", self.unit.as_tag()));
        node.push(Node::with_text("output-type", self.output_type.as_tag()));
        if let Some(filename) = &self.output_filename {
            node.push(Node::with_text("output-filename", filename.clone()));
        }
        node.push(Node::with_text("copies", self.copies.to_string()));
        node
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    ReportHeader,
    ReportFooter,
    PageHeader,
    PageFooter,
    Body,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::ReportHeader,
        SectionKind::ReportFooter,
        SectionKind::PageHeader,
        SectionKind::PageFooter,
        SectionKind::Body,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            SectionKind::ReportHeader => "report-header",
            SectionKind::ReportFooter => "report-footer",
            SectionKind::PageHeader => "page-header",
            SectionKind::PageFooter => "page-footer",
            SectionKind::Body => "body",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn has_page_flags(self) -> bool {
        matches!(self, SectionKind::PageHeader | SectionKind::PageFooter)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub height: f64,
    objects: Vec<ReportObject>,
    pub new_page_before: bool,
    pub new_page_after: bool,
    /// Page header/footer: print on the first page.
    pub first_page: bool,
    /// Page header/footer: print on the last page.
    pub last_page: bool,
}

impl Default for Section {
    fn default() -> Self {
        Section {
            height: 0.0,
            objects: Vec::new(),
            new_page_before: false,
            new_page_after: false,
            first_page: true,
            last_page: true,
        }
    }
}

impl Section {
    pub fn objects(&self) -> &[ReportObject] {
        &self.objects
    }

    fn read_flags(&mut self, node: &Node) {
        self.height = parse_f64(node, "height").unwrap_or(0.0).max(0.0);
        self.new_page_before = bool_attr(node, "new-page-before").unwrap_or(false);
        self.new_page_after = bool_attr(node, "new-page-after").unwrap_or(false);
        self.first_page = bool_attr(node, "first-page").unwrap_or(true);
        self.last_page = bool_attr(node, "last-page").unwrap_or(true);
    }

    fn to_node(&self, kind: SectionKind) -> Node {
        let mut node = Node::new(kind.tag());
        node.set_attr("height", fmt_num(self.height));
        if self.new_page_before {
            node.set_attr("new-page-before", bool_str(true));
        }
        if self.new_page_after {
            node.set_attr("new-page-after", bool_str(true));
        }
        if kind.has_page_flags() {
            node.set_attr("first-page", bool_str(self.first_page));
            node.set_attr("last-page", bool_str(self.last_page));
        }
        for object in &self.objects {
            node.push(object.to_node());
        }
        node
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageSetup {
    pub size: Size,
    pub margin: Margin,
}

impl PageSetup {
    pub(crate) fn from_node(node: &Node) -> Result<PageSetup, Error> {
        let size = Size::from_node(node)
            .ok_or_else(|| Error::InvalidReport("<page> has no width/height".into()))?;
        Ok(PageSetup {
            size,
            margin: Margin::from_node(node, "margin"),
        })
    }

    pub(crate) fn to_node(&self) -> Node {
        let mut node = Node::new("page");
        self.size.write_to(&mut node);
        self.margin.write_to(&mut node, "margin");
        node
    }
}

#[derive(Clone, Debug)]
pub struct Report {
    pub properties: Properties,
    data_source: Option<DataSource>,
    pub page: PageSetup,
    sections: [Option<Section>; 5],
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Report {
    pub fn new() -> Self {
        let mut sections: [Option<Section>; 5] = Default::default();
        sections[SectionKind::Body.index()] = Some(Section::default());
        Report {
            properties: Properties::default(),
            data_source: None,
            page: PageSetup::default(),
            sections,
        }
    }

    pub fn from_file(path: &Path) -> Result<Report, Error> {
        let xml = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        Report::from_xml(&xml)
    }

    pub fn from_xml(xml: &str) -> Result<Report, Error> {
        let root = Node::parse_xml(xml)?;
        Report::from_node(&root)
    }

    pub fn from_node(root: &Node) -> Result<Report, Error> {
        if root.tag != ROOT_TAG {
            return Err(Error::InvalidReport(format!(
                "root element is <{}>, not <{ROOT_TAG}>",
                root.tag
            )));
        }

        let mut report = Report::new();
        if let Some(props) = root.child("properties") {
            report.properties = Properties::from_node(props);
        }
        if let Some(db) = root.child("database") {
            report.data_source = Some(DataSource::Sql(SqlSource {
                provider: db.child_text("provider").unwrap_or("").trim().to_string(),
                connection_string: db
                    .child_text("connection-string")
                    .unwrap_or("")
                    .trim()
                    .to_string(),
                sql: db.child_text("sql").unwrap_or("").trim().to_string(),
            }));
        }

        let page = single_child(root, "page")?;
        report.page = PageSetup::from_node(page)?;

        let body_node = single_child(root, "report")?;
        for kind in SectionKind::ALL {
            let mut nodes = body_node.children_named(kind.tag());
            let Some(section_node) = nodes.next() else {
                if kind == SectionKind::Body {
                    log::warn!("<report> has no <body>; using an empty one");
                }
                continue;
            };
            if nodes.next().is_some() {
                log::warn!("More than one <{}>; using the first", kind.tag());
            }
            report.section_mut(kind).read_flags(section_node);
            for child in &section_node.children {
                if !OBJECT_TAGS.contains(&child.tag.as_str()) {
                    log::warn!("Unknown element <{}> in <{}> ignored", child.tag, kind.tag());
                    continue;
                }
                if let Some(object) = ReportObject::from_node(child) {
                    report.add_object(kind, object);
                }
            }
        }

        Ok(report)
    }

    pub fn to_node(&self) -> Node {
        let mut root = Node::new(ROOT_TAG);
        root.push(self.properties.to_node());
        if let Some(DataSource::Sql(sql)) = &self.data_source {
            let mut db = Node::new("database");
            db.push(Node::with_text("provider", sql.provider.clone()));
            db.push(Node::with_text(
                "connection-string",
                sql.connection_string.clone(),
            ));
            db.push(Node::with_text("sql", sql.sql.clone()));
            root.push(db);
        }
        root.push(self.page.to_node());
        let mut report = Node::new("report");
        for kind in SectionKind::ALL {
            if let Some(section) = self.section(kind) {
                report.push(section.to_node(kind));
            }
        }
        root.push(report);
        root
    }

    pub fn to_xml(&self) -> Result<String, Error> {
        self.to_node().to_xml()
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        std::fs::write(path, self.to_xml()?).map_err(Error::Io)
    }

    pub fn unit(&self) -> Unit {
        self.properties.unit
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.properties.unit = unit;
    }

    pub fn set_output_type(&mut self, output_type: OutputType) {
        self.properties.output_type = output_type;
    }

    pub fn set_output_filename(&mut self, filename: &str) {
        let filename = filename.trim();
        self.properties.output_filename = (!filename.is_empty()).then(|| filename.to_string());
    }

    pub fn set_copies(&mut self, copies: u32) {
        self.properties.copies = copies.max(1);
    }

    pub fn set_page_size(&mut self, size: Size) {
        self.page.size = size;
    }

    pub fn set_page_margin(&mut self, margin: Margin) {
        self.page.margin = margin;
    }

    pub fn data_source(&self) -> Option<&DataSource> {
        self.data_source.as_ref()
    }

    pub fn has_database(&self) -> bool {
        self.data_source.is_some()
    }

    pub fn set_database(&mut self, provider: &str, connection_string: &str, sql: &str) {
        self.data_source = Some(DataSource::Sql(SqlSource {
            provider: provider.to_string(),
            connection_string: connection_string.to_string(),
            sql: sql.to_string(),
        }));
    }

    pub fn set_table_model(&mut self, model: TableModel) {
        self.data_source = Some(DataSource::Table(model));
    }

    pub fn set_tree_model(&mut self, model: Arc<dyn TreeModel>, columns: HashMap<String, usize>) {
        self.data_source = Some(DataSource::Tree(TreeSource { model, columns }));
    }

    pub fn clear_data_source(&mut self) {
        self.data_source = None;
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections[kind.index()].as_ref()
    }

    /// The section, created with defaults on first use.
    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        self.sections[kind.index()].get_or_insert_with(Section::default)
    }

    pub fn body(&self) -> &Section {
        // Body is created in `new` and can never be removed.
        self.sections[SectionKind::Body.index()]
            .as_ref()
            .unwrap_or(&EMPTY_BODY)
    }

    pub fn set_section_height(&mut self, kind: SectionKind, height: f64) {
        self.section_mut(kind).height = height.max(0.0);
    }

    /// Drop a section with its objects and flags. Body cannot be removed.
    pub fn remove_section(&mut self, kind: SectionKind) -> bool {
        if kind == SectionKind::Body {
            log::warn!("The body section cannot be removed");
            return false;
        }
        self.sections[kind.index()].take().is_some()
    }

    /// Add an object; refused when another object already has its name.
    pub fn add_object(&mut self, kind: SectionKind, object: ReportObject) -> bool {
        if self.object_by_name(object.name()).is_some() {
            log::warn!("An object named \"{}\" already exists; skipped", object.name());
            return false;
        }
        self.section_mut(kind).objects.push(object);
        true
    }

    pub fn object_by_name(&self, name: &str) -> Option<&ReportObject> {
        self.sections
            .iter()
            .flatten()
            .flat_map(|s| s.objects.iter())
            .find(|o| o.name() == name)
    }

    pub fn object_by_name_mut(&mut self, name: &str) -> Option<&mut ReportObject> {
        self.sections
            .iter_mut()
            .flatten()
            .flat_map(|s| s.objects.iter_mut())
            .find(|o| o.name() == name)
    }

    pub fn remove_object(&mut self, name: &str) -> Option<ReportObject> {
        for section in self.sections.iter_mut().flatten() {
            if let Some(i) = section.objects.iter().position(|o| o.name() == name) {
                return Some(section.objects.remove(i));
            }
        }
        None
    }
}

static EMPTY_BODY: Section = Section {
    height: 0.0,
    objects: Vec::new(),
    new_page_before: false,
    new_page_after: false,
    first_page: true,
    last_page: true,
};

fn single_child<'a>(root: &'a Node, tag: &'a str) -> Result<&'a Node, Error> {
    let mut nodes = root.children_named(tag);
    let first = nodes
        .next()
        .ok_or_else(|| Error::InvalidReport(format!("missing <{tag}>")))?;
    if nodes.next().is_some() {
        return Err(Error::InvalidReport(format!("more than one <{tag}>")));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point;
    use crate::object::{LineObject, TextObject};

    const MINIMAL: &str = r#"<?xml version="1.0"?>
<reptool>
  <properties>
    <unit-length>mm</unit-length>
    <output-type>svg</output-type>
    <output-filename>out.svg</output-filename>
    <copies>2</copies>
  </properties>
  <database>
    <provider>sqlite</provider>
    <connection-string>db.sqlite</connection-string>
    <sql>SELECT * FROM t</sql>
  </database>
  <page width="210" height="297" margin-top="10" margin-left="15"/>
  <report>
    <page-header height="20" first-page="n">
      <text name="title" x="0" y="0" width="100" height="10" source="&quot;Title&quot;"/>
    </page-header>
    <body height="10" new-page-after="y">
      <text name="row" x="0" y="0" width="100" height="10" source="name"/>
      <text name="row" x="0" y="0" width="100" height="10" source="dup"/>
      <line name="nopos"/>
    </body>
  </report>
</reptool>"#;

    #[test]
    fn loads_properties_page_sections() {
        let report = Report::from_xml(MINIMAL).unwrap();
        assert_eq!(report.unit(), Unit::Millimetres);
        assert_eq!(report.properties.output_type, OutputType::Svg);
        assert_eq!(report.properties.output_filename.as_deref(), Some("out.svg"));
        assert_eq!(report.properties.copies, 2);
        assert!(report.has_database());
        assert_eq!(report.page.size, Size::new(210.0, 297.0));
        assert_eq!(report.page.margin, Margin::new(10.0, 0.0, 0.0, 15.0));

        let header = report.section(SectionKind::PageHeader).unwrap();
        assert!(!header.first_page);
        assert!(header.last_page);
        assert_eq!(header.height, 20.0);
        assert!(report.section(SectionKind::ReportHeader).is_none());

        // duplicate name and missing position are skipped
        assert_eq!(report.body().objects().len(), 1);
        assert!(report.body().new_page_after);
    }

    #[test]
    fn structural_errors_are_fatal() {
        for xml in [
            "<other/>",
            "<reptool><report><body/></report></reptool>",
            r#"<reptool><page width="1" height="1"/></reptool>"#,
            r#"<reptool><page width="1" height="1"/><report/><report/></reptool>"#,
            r#"<reptool><page width="1" height="1"/><page width="1" height="1"/><report/></reptool>"#,
        ] {
            assert!(
                matches!(Report::from_xml(xml), Err(Error::InvalidReport(_))),
                "{xml}"
            );
        }
        assert!(matches!(Report::from_xml("<reptool"), Err(Error::Xml(_))));
    }

    #[test]
    fn missing_body_is_materialised() {
        let report =
            Report::from_xml(r#"<reptool><page width="1" height="1"/><report/></reptool>"#)
                .unwrap();
        assert!(report.section(SectionKind::Body).is_some());
    }

    #[test]
    fn sections_are_lazy_and_body_is_permanent() {
        let mut report = Report::new();
        assert!(report.section(SectionKind::PageFooter).is_none());
        report.set_section_height(SectionKind::PageFooter, 12.0);
        assert_eq!(report.section(SectionKind::PageFooter).unwrap().height, 12.0);
        assert!(report.remove_section(SectionKind::PageFooter));
        assert!(report.section(SectionKind::PageFooter).is_none());
        assert!(!report.remove_section(SectionKind::Body));
        assert!(report.section(SectionKind::Body).is_some());
    }

    #[test]
    fn names_are_unique_across_sections() {
        let mut report = Report::new();
        let text = TextObject::new("a", Point::default()).unwrap();
        let line = LineObject::new("a", Point::default()).unwrap();
        assert!(report.add_object(SectionKind::PageHeader, ReportObject::Text(text)));
        assert!(!report.add_object(SectionKind::Body, ReportObject::Line(line)));
        assert_eq!(report.object_by_name("a").unwrap().tag(), "text");
        assert!(report.remove_object("a").is_some());
        assert!(report.object_by_name("a").is_none());
    }

    #[test]
    fn save_and_reload_preserves_model() {
        let report = Report::from_xml(MINIMAL).unwrap();
        let xml = report.to_xml().unwrap();
        let again = Report::from_xml(&xml).unwrap();
        assert_eq!(again.properties, report.properties);
        assert_eq!(again.page, report.page);
        for kind in SectionKind::ALL {
            assert_eq!(again.section(kind), report.section(kind), "{kind:?}");
        }
    }
}
