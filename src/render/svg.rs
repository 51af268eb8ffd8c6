use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::common::Color;
use crate::error::Error;
use crate::fixed::FixedDocument;
use crate::node::Node;

use super::draw::draw_document;
use super::fonts::Family;
use super::text::TextStyle;
use super::{
    Bounds, ImageCache, LoadedImage, OutputConfig, PageRenderer, Pen, Shape, Surface,
    numbered_filename, write_all,
};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// One SVG file per page: `report.svg` becomes `report1.svg`, `report2.svg`...
#[derive(Clone, Copy, Debug, Default)]
pub struct SvgRenderer;

impl PageRenderer for SvgRenderer {
    fn render(&self, doc: &FixedDocument, config: &OutputConfig) -> Result<Vec<PathBuf>, Error> {
        let t0 = std::time::Instant::now();
        if config.copies > 1 {
            log::debug!("SVG output ignores copies={}", config.copies);
        }
        let mut images = ImageCache::new(config.resource_dir.as_deref());
        let pages = render_svg(doc, &mut images)?;
        let outputs = pages
            .into_iter()
            .enumerate()
            .map(|(i, svg)| (numbered_filename(&config.filename, i + 1), svg.into_bytes()))
            .collect();
        log::info!(
            "SVG: {} page(s) in {:.1}ms",
            doc.page_count(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        write_all(outputs)
    }
}

pub(crate) fn render_svg(doc: &FixedDocument, images: &mut ImageCache) -> Result<Vec<String>, Error> {
    let mut surface = SvgSurface::default();
    draw_document(doc, &mut surface, images, 1)?;
    if !surface.stack.is_empty() {
        return Err(Error::Render("unterminated page".into()));
    }
    surface.pages.iter().map(Node::to_xml).collect()
}

/// Fixed precision, trailing zeros dropped.
fn num(value: f64) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn rgb(color: Color) -> String {
    let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", byte(color.r), byte(color.g), byte(color.b))
}

fn set_fill(node: &mut Node, fill: Option<Color>) {
    match fill {
        Some(color) => {
            node.set_attr("fill", rgb(color));
            if color.a < 1.0 {
                node.set_attr("fill-opacity", num(color.a));
            }
        }
        None => node.set_attr("fill", "none"),
    }
}

fn set_pen(node: &mut Node, pen: &Pen) {
    node.set_attr("stroke", rgb(pen.color));
    node.set_attr("stroke-width", num(pen.width));
    if pen.color.a < 1.0 {
        node.set_attr("stroke-opacity", num(pen.color.a));
    }
    if !pen.dash.is_empty() {
        let dash: Vec<String> = pen.dash.iter().map(|d| num(*d)).collect();
        node.set_attr("stroke-dasharray", dash.join(" "));
    }
}

struct Frame {
    group: Node,
    /// Opened by `save`; clip and rotate open implicit frames that close
    /// with the enclosing explicit one.
    explicit: bool,
}

#[derive(Default)]
struct SvgSurface {
    pages: Vec<Node>,
    stack: Vec<Frame>,
    defs: Node,
    next_clip: usize,
}

impl SvgSurface {
    fn top(&mut self) -> Result<&mut Node, Error> {
        self.stack
            .last_mut()
            .map(|frame| &mut frame.group)
            .ok_or_else(|| Error::Render("drawing outside of a page".into()))
    }

    fn push_frame(&mut self, group: Node, explicit: bool) -> Result<(), Error> {
        if self.stack.is_empty() {
            return Err(Error::Render("drawing outside of a page".into()));
        }
        self.stack.push(Frame { group, explicit });
        Ok(())
    }

    /// Close the top frame into its parent; true if it was opened by `save`.
    fn pop_frame(&mut self) -> Result<bool, Error> {
        if self.stack.len() < 2 {
            return Err(Error::Render("unbalanced restore".into()));
        }
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::Render("unbalanced restore".into()))?;
        self.top()?.push(frame.group);
        Ok(frame.explicit)
    }
}

impl Surface for SvgSurface {
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), Error> {
        if !self.stack.is_empty() {
            return Err(Error::Render("page started twice".into()));
        }
        let mut root = Node::new("svg");
        root.set_attr("xmlns", SVG_NS);
        root.set_attr("version", "1.1");
        root.set_attr("width", format!("{}pt", num(width)));
        root.set_attr("height", format!("{}pt", num(height)));
        root.set_attr("viewBox", format!("0 0 {} {}", num(width), num(height)));
        self.defs = Node::new("defs");
        self.stack.push(Frame {
            group: root,
            explicit: true,
        });
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), Error> {
        while self.stack.len() > 1 {
            self.pop_frame()?;
        }
        let Some(Frame { group: mut root, .. }) = self.stack.pop() else {
            return Err(Error::Render("no page to end".into()));
        };
        let defs = std::mem::take(&mut self.defs);
        if !defs.children.is_empty() {
            root.children.insert(0, defs);
        }
        self.pages.push(root);
        Ok(())
    }

    fn save(&mut self) -> Result<(), Error> {
        self.push_frame(Node::new("g"), true)
    }

    fn restore(&mut self) -> Result<(), Error> {
        while !self.pop_frame()? {}
        Ok(())
    }

    fn clip(&mut self, b: Bounds) -> Result<(), Error> {
        self.next_clip += 1;
        let id = format!("clip{}", self.next_clip);
        let mut rect = Node::new("rect");
        rect.set_attr("x", num(b.x));
        rect.set_attr("y", num(b.y));
        rect.set_attr("width", num(b.width));
        rect.set_attr("height", num(b.height));
        let mut clip_path = Node::new("clipPath");
        clip_path.set_attr("id", id.clone());
        clip_path.push(rect);
        self.defs.push(clip_path);

        let mut group = Node::new("g");
        group.set_attr("clip-path", format!("url(#{id})"));
        self.push_frame(group, false)
    }

    fn rotate(&mut self, degrees: f64, cx: f64, cy: f64) -> Result<(), Error> {
        let mut group = Node::new("g");
        group.set_attr(
            "transform",
            format!("rotate({} {} {})", num(degrees), num(cx), num(cy)),
        );
        self.push_frame(group, false)
    }

    fn shape(&mut self, shape: &Shape, fill: Option<Color>, pen: Option<&Pen>) -> Result<(), Error> {
        let mut node = match shape {
            Shape::Rect(b) => {
                let mut n = Node::new("rect");
                n.set_attr("x", num(b.x));
                n.set_attr("y", num(b.y));
                n.set_attr("width", num(b.width));
                n.set_attr("height", num(b.height));
                set_fill(&mut n, fill);
                n
            }
            Shape::Ellipse(b) => {
                let (cx, cy) = b.center();
                let mut n = Node::new("ellipse");
                n.set_attr("cx", num(cx));
                n.set_attr("cy", num(cy));
                n.set_attr("rx", num(b.width / 2.0));
                n.set_attr("ry", num(b.height / 2.0));
                set_fill(&mut n, fill);
                n
            }
            Shape::Polyline(points) => {
                let mut n = Node::new("polyline");
                let points: Vec<String> = points
                    .iter()
                    .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
                    .collect();
                n.set_attr("points", points.join(" "));
                n.set_attr("fill", "none");
                n
            }
        };
        if let Some(pen) = pen {
            set_pen(&mut node, pen);
        }
        self.top()?.push(node);
        Ok(())
    }

    fn image(&mut self, image: &LoadedImage, b: Bounds) -> Result<(), Error> {
        let mut node = Node::new("image");
        node.set_attr("x", num(b.x));
        node.set_attr("y", num(b.y));
        node.set_attr("width", num(b.width));
        node.set_attr("height", num(b.height));
        node.set_attr("preserveAspectRatio", "none");
        node.set_attr(
            "href",
            format!("data:{};base64,{}", image.mime_type(), STANDARD.encode(&image.bytes)),
        );
        self.top()?.push(node);
        Ok(())
    }

    fn text(
        &mut self,
        x: f64,
        baseline: f64,
        text: &str,
        style: &TextStyle,
        color: Color,
    ) -> Result<(), Error> {
        let mut node = Node::with_text("text", text);
        node.set_attr("x", num(x));
        node.set_attr("y", num(baseline));
        node.set_attr("font-family", style.face.css_family());
        node.set_attr("font-size", num(style.size));
        if style.face.bold {
            node.set_attr("font-weight", "bold");
        }
        if style.face.italic {
            let slant = if style.face.family == Family::Times { "italic" } else { "oblique" };
            node.set_attr("font-style", slant);
        }
        if style.spacing != 0.0 {
            node.set_attr("letter-spacing", num(style.spacing));
        }
        node.set_attr("xml:space", "preserve");
        set_fill(&mut node, Some(color));
        self.top()?.push(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Margin, Size};
    use crate::fixed::FixedPage;
    use crate::report::{OutputType, PageSetup, Properties};

    fn doc(pages: &[&[&str]]) -> FixedDocument {
        let mut doc = FixedDocument::new(Properties::default());
        for objects in pages {
            let mut page = FixedPage::new(&PageSetup {
                size: Size::new(200.0, 100.0),
                margin: Margin::new(10.0, 10.0, 10.0, 10.0),
            });
            for xml in *objects {
                page.nodes.push(Node::parse_xml(xml).unwrap());
            }
            doc.pages.push(page);
        }
        doc
    }

    #[test]
    fn number_format() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(0.1 + 0.2), "0.3");
        assert_eq!(num(1.23456), "1.235");
        assert_eq!(num(-0.0001), "0");
    }

    #[test]
    fn page_structure_and_escaping() {
        let d = doc(&[&[
            r#"<text x="10" y="10" width="100" height="20" font-bold="y">a &amp; b</text>"#,
            r##"<ellipse x="10" y="30" width="20" height="10" fill-color="#ff000080"/>"##,
        ]]);
        let pages = render_svg(&d, &mut ImageCache::new(None)).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains(">&amp;</text>"));
        assert!(!pages[0].contains("&amp;amp;"));

        let parsed = roxmltree::Document::parse(&pages[0]).unwrap();
        let root = parsed.root_element();
        assert_eq!(root.tag_name().name(), "svg");
        assert_eq!(root.attribute("viewBox"), Some("0 0 200 100"));
        assert!(parsed.descendants().any(|n| n.has_tag_name("clipPath")));

        let words: Vec<_> = parsed
            .descendants()
            .filter(|n| n.has_tag_name("text"))
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(words, ["a", "&", "b"]);

        let text = parsed.descendants().find(|n| n.has_tag_name("text")).unwrap();
        assert_eq!(text.attribute("font-weight"), Some("bold"));
        assert_eq!(text.attribute("x"), Some("10"));

        let ellipse = parsed.descendants().find(|n| n.has_tag_name("ellipse")).unwrap();
        assert_eq!(ellipse.attribute("fill"), Some("#ff0000"));
        assert_eq!(ellipse.attribute("fill-opacity"), Some("0.502"));
        assert_eq!(ellipse.attribute("cx"), Some("20"));
    }

    #[test]
    fn writes_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut img = image::RgbImage::new(2, 2);
        img.put_pixel(1, 1, image::Rgb([0, 0, 255]));
        img.save(dir.path().join("dot.png")).unwrap();

        let d = doc(&[
            &[r#"<image x="10" y="10" width="5" height="5" source="dot.png" adapt="to-box" rotation="90"/>"#],
            &[],
        ]);
        let config = OutputConfig {
            output_type: OutputType::Svg,
            filename: dir.path().join("report.svg"),
            copies: 3,
            resource_dir: Some(dir.path().to_path_buf()),
        };
        let written = SvgRenderer.render(&d, &config).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("report1.svg"), dir.path().join("report2.svg")]
        );
        let first = std::fs::read_to_string(&written[0]).unwrap();
        assert!(first.contains("href=\"data:image/png;base64,"));
        assert!(first.contains("rotate(90 12.5 12.5)"));
    }
}
