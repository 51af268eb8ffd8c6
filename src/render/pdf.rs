use std::collections::HashMap;
use std::path::PathBuf;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::common::Color;
use crate::error::Error;
use crate::fixed::FixedDocument;

use super::draw::draw_document;
use super::fonts::{Face, to_winansi_bytes};
use super::text::TextStyle;
use super::{Bounds, ImageCache, LoadedImage, OutputConfig, PageRenderer, Pen, Shape, Surface, write_all};

/// Bézier control distance for a quarter circle.
const KAPPA: f64 = 0.552_284_749_8;

/// Writes the whole document, copies collated, into one PDF file.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfRenderer;

impl PageRenderer for PdfRenderer {
    fn render(&self, doc: &FixedDocument, config: &OutputConfig) -> Result<Vec<PathBuf>, Error> {
        let t0 = std::time::Instant::now();
        let mut images = ImageCache::new(config.resource_dir.as_deref());
        let bytes = render_pdf(doc, &mut images, config.copies)?;
        log::info!(
            "PDF: {} page(s) x {} cop(ies) in {:.1}ms",
            doc.page_count(),
            config.copies,
            t0.elapsed().as_secs_f64() * 1000.0
        );
        write_all(vec![(config.filename.clone(), bytes)])
    }
}

pub(crate) fn render_pdf(
    doc: &FixedDocument,
    images: &mut ImageCache,
    copies: u32,
) -> Result<Vec<u8>, Error> {
    let mut surface = PdfSurface::new();
    draw_document(doc, &mut surface, images, copies)?;
    surface.finish()
}

struct PdfPage {
    width: f64,
    height: f64,
    content: Content,
}

struct PdfSurface {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    pages: Vec<PdfPage>,
    current: Option<PdfPage>,
    fonts: HashMap<Face, (String, Ref)>,
    font_order: Vec<Face>,
    /// Keyed by source path so every page shares one XObject per file.
    images: HashMap<PathBuf, (String, Ref)>,
    image_order: Vec<PathBuf>,
}

impl PdfSurface {
    fn new() -> Self {
        let mut surface = PdfSurface {
            pdf: Pdf::new(),
            next_id: 1,
            catalog_id: Ref::new(1),
            pages_id: Ref::new(1),
            pages: Vec::new(),
            current: None,
            fonts: HashMap::new(),
            font_order: Vec::new(),
            images: HashMap::new(),
            image_order: Vec::new(),
        };
        surface.catalog_id = surface.alloc();
        surface.pages_id = surface.alloc();
        surface
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    fn content(&mut self) -> Result<&mut Content, Error> {
        self.current
            .as_mut()
            .map(|page| &mut page.content)
            .ok_or_else(|| Error::Render("drawing outside of a page".into()))
    }

    fn font(&mut self, face: Face) -> String {
        if let Some((name, _)) = self.fonts.get(&face) {
            return name.clone();
        }
        let font_ref = self.alloc();
        let name = format!("F{}", self.font_order.len() + 1);
        self.pdf
            .type1_font(font_ref)
            .base_font(Name(face.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        log::debug!("Registered font {name} = {}", face.base_font());
        self.fonts.insert(face, (name.clone(), font_ref));
        self.font_order.push(face);
        name
    }

    fn embed_image(&mut self, image: &LoadedImage) -> Result<String, Error> {
        if let Some((name, _)) = self.images.get(&image.path) {
            return Ok(name.clone());
        }
        let image_err = |e: image::ImageError| Error::Image(format!("{}: {e}", image.path.display()));
        let decoded = image::load_from_memory_with_format(&image.bytes, image.format)
            .map_err(image_err)?;
        let xobj_ref = self.alloc();
        let name = format!("Im{}", self.image_order.len() + 1);

        if image.format == image::ImageFormat::Jpeg && decoded.color() == image::ColorType::Rgb8 {
            let mut xobj = self.pdf.image_xobject(xobj_ref, &image.bytes);
            xobj.filter(Filter::DctDecode);
            xobj.width(image.width as i32);
            xobj.height(image.height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        } else {
            let rgba = decoded.to_rgba8();
            let (w, h) = (rgba.width() as i32, rgba.height() as i32);
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let rgb: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb, 6);

            let smask_ref = if has_alpha {
                let alpha: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6);
                let mask_ref = self.alloc();
                let mut mask = self.pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = self.pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }

        self.images
            .insert(image.path.clone(), (name.clone(), xobj_ref));
        self.image_order.push(image.path.clone());
        Ok(name)
    }

    fn finish(mut self) -> Result<Vec<u8>, Error> {
        if self.current.is_some() {
            return Err(Error::Render("unterminated page".into()));
        }
        let pages = std::mem::take(&mut self.pages);
        let mut page_ids = Vec::with_capacity(pages.len());
        let mut content_ids = Vec::with_capacity(pages.len());
        for _ in &pages {
            page_ids.push(self.alloc());
            content_ids.push(self.alloc());
        }

        let font_pairs: Vec<(String, Ref)> = self
            .font_order
            .iter()
            .map(|face| self.fonts[face].clone())
            .collect();
        let image_pairs: Vec<(String, Ref)> = self
            .image_order
            .iter()
            .map(|path| self.images[path].clone())
            .collect();

        let mut pdf = self.pdf;
        pdf.catalog(self.catalog_id).pages(self.pages_id);
        pdf.pages(self.pages_id)
            .kids(page_ids.iter().copied())
            .count(pages.len() as i32);

        for (i, page) in pages.into_iter().enumerate() {
            let raw = page.content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);

            let mut pdf_page = pdf.page(page_ids[i]);
            pdf_page
                .media_box(Rect::new(0.0, 0.0, page.width as f32, page.height as f32))
                .parent(self.pages_id)
                .contents(content_ids[i]);
            let mut resources = pdf_page.resources();
            {
                let mut fonts = resources.fonts();
                for (name, font_ref) in &font_pairs {
                    fonts.pair(Name(name.as_bytes()), *font_ref);
                }
            }
            if !image_pairs.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &image_pairs {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }
        Ok(pdf.finish())
    }
}

fn set_fill(content: &mut Content, color: Color) {
    content.set_fill_rgb(color.r as f32, color.g as f32, color.b as f32);
}

fn set_pen(content: &mut Content, pen: &Pen) {
    content.set_line_width(pen.width as f32);
    content.set_stroke_rgb(pen.color.r as f32, pen.color.g as f32, pen.color.b as f32);
    if !pen.dash.is_empty() {
        content.set_dash_pattern(pen.dash.iter().map(|d| *d as f32), 0.0);
    }
}

fn ellipse_path(content: &mut Content, b: Bounds) {
    let (cx, cy) = b.center();
    let (rx, ry) = (b.width / 2.0, b.height / 2.0);
    let (ox, oy) = (rx * KAPPA, ry * KAPPA);
    let p = |v: f64| v as f32;
    content.move_to(p(cx + rx), p(cy));
    content.cubic_to(p(cx + rx), p(cy + oy), p(cx + ox), p(cy + ry), p(cx), p(cy + ry));
    content.cubic_to(p(cx - ox), p(cy + ry), p(cx - rx), p(cy + oy), p(cx - rx), p(cy));
    content.cubic_to(p(cx - rx), p(cy - oy), p(cx - ox), p(cy - ry), p(cx), p(cy - ry));
    content.cubic_to(p(cx + ox), p(cy - ry), p(cx + rx), p(cy - oy), p(cx + rx), p(cy));
    content.close_path();
}

impl Surface for PdfSurface {
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), Error> {
        if self.current.is_some() {
            return Err(Error::Render("page started twice".into()));
        }
        let mut content = Content::new();
        // y grows downwards from the top-left corner
        content.transform([1.0, 0.0, 0.0, -1.0, 0.0, height as f32]);
        self.current = Some(PdfPage {
            width,
            height,
            content,
        });
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), Error> {
        let page = self
            .current
            .take()
            .ok_or_else(|| Error::Render("no page to end".into()))?;
        self.pages.push(page);
        Ok(())
    }

    fn save(&mut self) -> Result<(), Error> {
        self.content()?.save_state();
        Ok(())
    }

    fn restore(&mut self) -> Result<(), Error> {
        self.content()?.restore_state();
        Ok(())
    }

    fn clip(&mut self, b: Bounds) -> Result<(), Error> {
        let content = self.content()?;
        content.rect(b.x as f32, b.y as f32, b.width as f32, b.height as f32);
        content.clip_nonzero();
        content.end_path();
        Ok(())
    }

    fn rotate(&mut self, degrees: f64, cx: f64, cy: f64) -> Result<(), Error> {
        let (s, c) = degrees.to_radians().sin_cos();
        self.content()?.transform([
            c as f32,
            s as f32,
            -s as f32,
            c as f32,
            (cx - c * cx + s * cy) as f32,
            (cy - s * cx - c * cy) as f32,
        ]);
        Ok(())
    }

    fn shape(&mut self, shape: &Shape, fill: Option<Color>, pen: Option<&Pen>) -> Result<(), Error> {
        let content = self.content()?;
        content.save_state();
        let fill = match shape {
            Shape::Polyline(_) => None,
            _ => fill,
        };
        if let Some(color) = fill {
            set_fill(content, color);
        }
        if let Some(pen) = pen {
            set_pen(content, pen);
        }
        match shape {
            Shape::Rect(b) => {
                content.rect(b.x as f32, b.y as f32, b.width as f32, b.height as f32);
            }
            Shape::Ellipse(b) => ellipse_path(content, *b),
            Shape::Polyline(points) => {
                let mut iter = points.iter();
                if let Some((x, y)) = iter.next() {
                    content.move_to(*x as f32, *y as f32);
                }
                for (x, y) in iter {
                    content.line_to(*x as f32, *y as f32);
                }
            }
        }
        match (fill.is_some(), pen.is_some()) {
            (true, true) => content.fill_nonzero_and_stroke(),
            (true, false) => content.fill_nonzero(),
            (false, true) => content.stroke(),
            (false, false) => content.end_path(),
        };
        content.restore_state();
        Ok(())
    }

    fn image(&mut self, image: &LoadedImage, b: Bounds) -> Result<(), Error> {
        let name = self.embed_image(image)?;
        let content = self.content()?;
        content.save_state();
        content.transform([
            b.width as f32,
            0.0,
            0.0,
            -b.height as f32,
            b.x as f32,
            (b.y + b.height) as f32,
        ]);
        content.x_object(Name(name.as_bytes()));
        content.restore_state();
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
        let font = self.font(style.face);
        let bytes = to_winansi_bytes(text);
        let content = self.content()?;
        content.save_state();
        set_fill(content, color);
        content
            .begin_text()
            .set_font(Name(font.as_bytes()), style.size as f32);
        if style.spacing != 0.0 {
            content.set_char_spacing(style.spacing as f32);
        }
        content
            .set_text_matrix([1.0, 0.0, 0.0, -1.0, x as f32, baseline as f32])
            .show(Str(&bytes))
            .end_text();
        content.restore_state();
        Ok(())
    }
}
