pub mod common;
pub mod data;
mod error;
pub mod fixed;
pub mod node;
pub mod object;
pub mod paginate;
pub mod render;
pub mod report;
pub mod template;

pub use common::{Color, Margin, Point, Size, Unit};
pub use data::{DataContext, DataSource, SqlProvider, TableModel, TreeModel};
pub use error::Error;
pub use fixed::{FixedDocument, FixedPage};
pub use object::ReportObject;
pub use paginate::Paginator;
pub use render::{OutputConfig, PageRenderer};
pub use report::{OutputType, Report, SectionKind};

use std::path::{Path, PathBuf};
use std::time::Instant;

use node::Node;

/// Either kind of declarative file, told apart by its root element.
#[derive(Debug)]
pub enum InputDocument {
    Report(Report),
    Fixed(FixedDocument),
}

impl InputDocument {
    pub fn from_file(path: &Path) -> Result<InputDocument, Error> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    pub fn from_xml(xml: &str) -> Result<InputDocument, Error> {
        let root = Node::parse_xml(xml)?;
        if root.tag == fixed::ROOT_TAG {
            FixedDocument::from_node(&root).map(InputDocument::Fixed)
        } else {
            Report::from_node(&root).map(InputDocument::Report)
        }
    }

    /// Paginate a report; a fixed-layout document is returned as is.
    pub fn into_fixed(self) -> Result<FixedDocument, Error> {
        match self {
            InputDocument::Report(report) => report.paginate(),
            InputDocument::Fixed(doc) => Ok(doc),
        }
    }
}

/// Render `input` with the output settings stored in it.
pub fn render_file(input: &Path) -> Result<Vec<PathBuf>, Error> {
    render_file_with(input, |config| config)
}

/// Like [`render_file`], letting the caller adjust the output settings.
/// Relative image paths resolve against the input file's directory.
pub fn render_file_with(
    input: &Path,
    configure: impl FnOnce(OutputConfig) -> OutputConfig,
) -> Result<Vec<PathBuf>, Error> {
    let t0 = Instant::now();

    let doc = InputDocument::from_file(input)?.into_fixed()?;
    let t_layout = t0.elapsed();

    let mut config = configure(OutputConfig::from_properties(&doc.properties));
    if config.resource_dir.is_none()
        && let Some(dir) = input.parent()
    {
        config.resource_dir = Some(dir.to_path_buf());
    }
    let written = render::render(&doc, &config)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: layout={:.1}ms, render={:.1}ms, total={:.1}ms ({} page(s), {} file(s))",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        doc.page_count(),
        written.len(),
    );

    Ok(written)
}
