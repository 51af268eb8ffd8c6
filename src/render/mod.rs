//! Fixed-layout renderers.
//!
//! A [`PageRenderer`] turns a [`FixedDocument`] into output files. The PDF
//! and SVG backends share the object walk in `draw`, which converts the
//! document unit to points and paints through the [`Surface`] primitives;
//! each backend only knows how to emit those primitives.

mod draw;
mod fonts;
mod pdf;
mod svg;
mod text;

pub use pdf::PdfRenderer;
pub use svg::SvgRenderer;

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::common::Color;
use crate::error::Error;
use crate::fixed::FixedDocument;
use crate::report::{OutputType, Properties};

use text::TextStyle;

/// Where and how a fixed-layout document is written.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputConfig {
    pub output_type: OutputType,
    pub filename: PathBuf,
    pub copies: u32,
    /// Base directory for relative image paths.
    pub resource_dir: Option<PathBuf>,
}

impl OutputConfig {
    pub fn from_properties(properties: &Properties) -> Self {
        let filename = properties
            .output_filename
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(properties.output_type.default_filename());
        OutputConfig {
            output_type: properties.output_type,
            filename: PathBuf::from(filename),
            copies: properties.copies.max(1),
            resource_dir: None,
        }
    }

    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        if self.output_type != output_type
            && self.filename == Path::new(self.output_type.default_filename())
        {
            self.filename = PathBuf::from(output_type.default_filename());
        }
        self.output_type = output_type;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies.max(1);
        self
    }

    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = Some(dir.into());
        self
    }
}

/// Insert `page` before the extension: `report.png` becomes `report2.png`.
pub fn numbered_filename(path: &Path, page: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{page}.{}", ext.to_string_lossy()),
        None => format!("{stem}{page}"),
    };
    path.with_file_name(name)
}

pub trait PageRenderer {
    /// Render every page and return the files written. Nothing is written
    /// unless the whole document rendered.
    fn render(&self, doc: &FixedDocument, config: &OutputConfig) -> Result<Vec<PathBuf>, Error>;
}

pub fn renderer_for(output_type: OutputType) -> Result<Box<dyn PageRenderer>, Error> {
    match output_type {
        OutputType::Pdf => Ok(Box::new(PdfRenderer)),
        OutputType::Svg => Ok(Box::new(SvgRenderer)),
        other => Err(Error::UnsupportedOutput(other.as_tag().to_string())),
    }
}

pub fn render(doc: &FixedDocument, config: &OutputConfig) -> Result<Vec<PathBuf>, Error> {
    renderer_for(config.output_type)?.render(doc, config)
}

/// Axis-aligned box in points, y downwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl Bounds {
    pub(crate) fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Pen {
    pub(crate) width: f64,
    pub(crate) color: Color,
    pub(crate) dash: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Shape {
    Rect(Bounds),
    Ellipse(Bounds),
    Polyline(Vec<(f64, f64)>),
}

/// Drawing primitives in points with the origin at the page's top-left.
pub(crate) trait Surface {
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), Error>;
    fn end_page(&mut self) -> Result<(), Error>;
    fn save(&mut self) -> Result<(), Error>;
    fn restore(&mut self) -> Result<(), Error>;
    fn clip(&mut self, bounds: Bounds) -> Result<(), Error>;
    /// Rotate subsequent drawing clockwise by `degrees` about `(cx, cy)`.
    fn rotate(&mut self, degrees: f64, cx: f64, cy: f64) -> Result<(), Error>;
    fn shape(&mut self, shape: &Shape, fill: Option<Color>, pen: Option<&Pen>)
    -> Result<(), Error>;
    fn image(&mut self, image: &LoadedImage, bounds: Bounds) -> Result<(), Error>;
    fn text(
        &mut self,
        x: f64,
        baseline: f64,
        text: &str,
        style: &TextStyle,
        color: Color,
    ) -> Result<(), Error>;
}

/// An image file read once per render call.
#[derive(Debug)]
pub(crate) struct LoadedImage {
    pub(crate) path: PathBuf,
    pub(crate) bytes: Vec<u8>,
    pub(crate) format: image::ImageFormat,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl LoadedImage {
    fn load(path: &Path) -> Result<LoadedImage, Error> {
        let image_err = |e: &dyn std::fmt::Display| Error::Image(format!("{}: {e}", path.display()));
        let bytes = std::fs::read(path).map_err(|e| image_err(&e))?;
        let format = image::guess_format(&bytes).map_err(|e| image_err(&e))?;
        let (width, height) = image::ImageReader::with_format(Cursor::new(&bytes), format)
            .into_dimensions()
            .map_err(|e| image_err(&e))?;
        Ok(LoadedImage {
            path: path.to_path_buf(),
            bytes,
            format,
            width,
            height,
        })
    }

    pub(crate) fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

pub(crate) struct ImageCache {
    root: Option<PathBuf>,
    loaded: HashMap<PathBuf, Rc<LoadedImage>>,
}

impl ImageCache {
    pub(crate) fn new(root: Option<&Path>) -> Self {
        ImageCache {
            root: root.map(Path::to_path_buf),
            loaded: HashMap::new(),
        }
    }

    pub(crate) fn get(&mut self, source: &str) -> Result<Rc<LoadedImage>, Error> {
        let path = match &self.root {
            Some(root) if Path::new(source).is_relative() => root.join(source),
            _ => PathBuf::from(source),
        };
        if let Some(image) = self.loaded.get(&path) {
            return Ok(Rc::clone(image));
        }
        let image = Rc::new(LoadedImage::load(&path)?);
        log::debug!(
            "Loaded image {} ({}x{})",
            path.display(),
            image.width,
            image.height
        );
        self.loaded.insert(path, Rc::clone(&image));
        Ok(image)
    }
}

/// Write all outputs only after every one of them was produced.
fn write_all(outputs: Vec<(PathBuf, Vec<u8>)>) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::with_capacity(outputs.len());
    for (path, bytes) in outputs {
        std::fs::write(&path, &bytes).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_names() {
        assert_eq!(
            numbered_filename(Path::new("report.png"), 2),
            PathBuf::from("report2.png")
        );
        assert_eq!(
            numbered_filename(Path::new("out/page.svg"), 10),
            PathBuf::from("out/page10.svg")
        );
        assert_eq!(numbered_filename(Path::new("plain"), 1), PathBuf::from("plain1"));
    }

    #[test]
    fn config_defaults_per_type() {
        let mut props = Properties::default();
        let config = OutputConfig::from_properties(&props);
        assert_eq!(config.filename, PathBuf::from("reptool.pdf"));
        assert_eq!(config.copies, 1);

        props.output_type = OutputType::Svg;
        props.output_filename = Some("  ".into());
        assert_eq!(
            OutputConfig::from_properties(&props).filename,
            PathBuf::from("reptool.svg")
        );

        let switched = OutputConfig::from_properties(&Properties::default())
            .with_output_type(OutputType::Svg);
        assert_eq!(switched.filename, PathBuf::from("reptool.svg"));
        let kept = OutputConfig::from_properties(&Properties::default())
            .with_filename("mine.pdf")
            .with_output_type(OutputType::Svg);
        assert_eq!(kept.filename, PathBuf::from("mine.pdf"));
    }

    #[test]
    fn unsupported_outputs() {
        for output_type in [
            OutputType::Png,
            OutputType::Ps,
            OutputType::Gtk,
            OutputType::GtkDefault,
        ] {
            assert!(matches!(
                renderer_for(output_type),
                Err(Error::UnsupportedOutput(_))
            ));
        }
        assert!(renderer_for(OutputType::Pdf).is_ok());
    }

    #[test]
    fn missing_image_is_an_error() {
        let mut cache = ImageCache::new(None);
        assert!(matches!(
            cache.get("/nonexistent/logo.png"),
            Err(Error::Image(_))
        ));
    }
}
