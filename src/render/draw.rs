use crate::common::{Border, BorderEdge, Color, Font, Rotation, Stroke, Underline, Unit};
use crate::error::Error;
use crate::fixed::{FixedDocument, FixedPage};
use crate::object::{
    Adapt, EllipseObject, ImageObject, LineObject, RectObject, ReportObject, TextObject,
};

use super::fonts::Face;
use super::text::{self, TextBlock, TextStyle};
use super::{Bounds, ImageCache, Pen, Shape, Surface};

/// Paint every page of `doc`, `copies` times over, collated.
pub(crate) fn draw_document(
    doc: &FixedDocument,
    surface: &mut dyn Surface,
    images: &mut ImageCache,
    copies: u32,
) -> Result<(), Error> {
    let mut painter = Painter {
        unit: doc.properties.unit,
        surface,
        images,
    };
    for _ in 0..copies.max(1) {
        for page in &doc.pages {
            painter.page(page)?;
        }
    }
    Ok(())
}

struct Painter<'a> {
    unit: Unit,
    surface: &'a mut dyn Surface,
    images: &'a mut ImageCache,
}

impl Painter<'_> {
    fn pt(&self, value: f64) -> f64 {
        self.unit.to_points(value)
    }

    fn bounds(&self, x: f64, y: f64, width: f64, height: f64) -> Bounds {
        Bounds {
            x: self.pt(x),
            y: self.pt(y),
            width: self.pt(width),
            height: self.pt(height),
        }
    }

    fn page(&mut self, page: &FixedPage) -> Result<(), Error> {
        let width = self.pt(page.size.width);
        let height = self.pt(page.size.height);
        self.surface.begin_page(width, height)?;

        let m = page.margin;
        self.surface.save()?;
        self.surface.clip(self.bounds(
            m.left,
            m.top,
            page.size.width - m.left - m.right,
            page.size.height - m.top - m.bottom,
        ))?;
        for object in page.objects() {
            if !object.is_visible() {
                continue;
            }
            match &object {
                ReportObject::Text(t) => self.text(t)?,
                ReportObject::Line(l) => self.line(l)?,
                ReportObject::Rect(r) => self.rect(r, false)?,
                ReportObject::Ellipse(EllipseObject { rect }) => self.rect(rect, true)?,
                ReportObject::Image(i) => self.image(i)?,
            }
        }
        self.surface.restore()?;
        self.surface.end_page()
    }

    fn pen(&self, stroke: &Stroke) -> Pen {
        Pen {
            width: self.pt(stroke.width),
            color: stroke.color.unwrap_or(Color::BLACK),
            dash: stroke
                .dash
                .iter()
                .flatten()
                .map(|d| self.pt(*d))
                .collect(),
        }
    }

    fn rotated<F>(&mut self, rotation: Option<Rotation>, center: (f64, f64), draw: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        match rotation.filter(|r| r.angle != 0.0) {
            Some(rotation) => {
                self.surface.save()?;
                self.surface.rotate(rotation.angle, center.0, center.1)?;
                draw(self)?;
                self.surface.restore()
            }
            None => draw(self),
        }
    }

    /// A segment from the position to position + size. Odd integer widths
    /// are shifted half a point so they land on whole device pixels.
    fn line(&mut self, line: &LineObject) -> Result<(), Error> {
        let Some(size) = line.size else {
            return Ok(());
        };
        let pen = self.pen(&line.stroke.clone().unwrap_or_default());
        let offset = if (pen.width as i64) % 2 != 0 { 0.5 } else { 0.0 };
        let b = self.bounds(line.base.position.x, line.base.position.y, size.width, size.height);
        let from = (b.x + offset, b.y + offset);
        let to = (b.x + b.width + offset, b.y + b.height + offset);
        self.rotated(line.rotation, b.center(), |p| {
            p.surface
                .shape(&Shape::Polyline(vec![from, to]), None, Some(&pen))
        })
    }

    fn rect(&mut self, rect: &RectObject, ellipse: bool) -> Result<(), Error> {
        let line = &rect.line;
        let Some(size) = line.size else {
            return Ok(());
        };
        let b = self.bounds(line.base.position.x, line.base.position.y, size.width, size.height);
        let pen = line.stroke.as_ref().map(|s| self.pen(s));
        if rect.fill_color.is_none() && pen.is_none() {
            return Ok(());
        }
        let shape = if ellipse {
            Shape::Ellipse(b)
        } else {
            Shape::Rect(b)
        };
        self.rotated(line.rotation, b.center(), |p| {
            p.surface.shape(&shape, rect.fill_color, pen.as_ref())
        })
    }

    fn image(&mut self, image: &ImageObject) -> Result<(), Error> {
        let Some(source) = image.source.as_deref() else {
            log::warn!("Image without a source skipped");
            return Ok(());
        };
        let loaded = self.images.get(source)?;
        let position = image.base.position;
        let declared = image.size.unwrap_or_default();
        let b = match image.adapt {
            Adapt::ToBox => self.bounds(position.x, position.y, declared.width, declared.height),
            // pixel size at 72 dpi
            Adapt::ToImage | Adapt::None => Bounds {
                x: self.pt(position.x),
                y: self.pt(position.y),
                width: loaded.width as f64,
                height: loaded.height as f64,
            },
        };
        self.rotated(image.rotation, b.center(), |p| {
            if image.adapt == Adapt::None {
                // unscaled, cut to the declared box
                p.surface.save()?;
                p.surface.clip(p.bounds(position.x, position.y, declared.width, declared.height))?;
                p.surface.image(&loaded, b)?;
                p.surface.restore()
            } else {
                p.surface.image(&loaded, b)
            }
        })?;
        if let Some(border) = &image.border {
            self.border(border, b)?;
        }
        Ok(())
    }

    fn text(&mut self, text: &TextObject) -> Result<(), Error> {
        let Some(size) = text.size else {
            return Ok(());
        };
        let position = text.base.position;
        let b = self.bounds(position.x, position.y, size.width, size.height);
        let font = text.font.clone().unwrap_or_default();
        let style = TextStyle {
            face: Face::for_font(&font),
            size: self.pt(font.size),
            spacing: self.pt(text.letter_spacing.unwrap_or(0.0)),
        };
        let color = font.color.unwrap_or(Color::BLACK);
        let padding = text.padding.unwrap_or_default();
        let inner = Bounds {
            x: b.x + self.pt(padding.left),
            y: b.y + self.pt(padding.top),
            width: b.width - self.pt(padding.left + padding.right),
            height: b.height - self.pt(padding.top + padding.bottom),
        };

        self.surface.save()?;
        if let Some(background) = text.background {
            self.surface.shape(&Shape::Rect(b), Some(background), None)?;
        }
        self.surface.clip(b)?;
        let content = text.text.as_deref().unwrap_or("");
        let lines = text::layout(
            &style,
            &TextBlock {
                text: content,
                width: inner.width,
                height: inner.height,
                align: text.align.unwrap_or_default(),
                ellipsize: text.ellipsize,
                fill_with: text.fill_with.as_deref(),
            },
        );
        for line in &lines {
            let baseline = inner.y + line.baseline;
            for chunk in &line.chunks {
                let x = inner.x + chunk.x;
                self.surface.text(x, baseline, &chunk.text, &style, color)?;
                self.decorate(x, baseline, chunk.width, &font, style.size, color)?;
            }
        }
        self.surface.restore()?;

        if let Some(border) = &text.border {
            self.border(border, b)?;
        }
        Ok(())
    }

    fn decorate(
        &mut self,
        x: f64,
        baseline: f64,
        width: f64,
        font: &Font,
        size: f64,
        color: Color,
    ) -> Result<(), Error> {
        let thick = (size * 0.05).max(0.5);
        let bar = |y: f64| Shape::Rect(Bounds {
            x,
            y,
            width,
            height: thick,
        });
        match font.underline {
            Underline::None => {}
            Underline::Single => self.surface.shape(&bar(baseline + size * 0.12), Some(color), None)?,
            Underline::Double => {
                self.surface.shape(&bar(baseline + size * 0.08), Some(color), None)?;
                self.surface
                    .shape(&bar(baseline + size * 0.08 + thick * 2.0), Some(color), None)?;
            }
            Underline::Low => self.surface.shape(&bar(baseline + size * 0.22), Some(color), None)?,
            Underline::Error => {
                let y = baseline + size * 0.15;
                let step = (size * 0.15).max(1.0);
                let mut points = Vec::new();
                let mut px = x;
                let mut up = true;
                while px <= x + width {
                    points.push((px, if up { y } else { y + step }));
                    px += step;
                    up = !up;
                }
                let pen = Pen {
                    width: thick,
                    color,
                    dash: Vec::new(),
                };
                self.surface.shape(&Shape::Polyline(points), None, Some(&pen))?;
            }
        }
        if font.strike {
            self.surface.shape(&bar(baseline - size * 0.3), Some(color), None)?;
        }
        Ok(())
    }

    fn border(&mut self, border: &Border, b: Bounds) -> Result<(), Error> {
        let (left, top) = (b.x, b.y);
        let (right, bottom) = (b.x + b.width, b.y + b.height);
        let edges: [(&BorderEdge, (f64, f64), (f64, f64)); 4] = [
            (&border.top, (left, top), (right, top)),
            (&border.right, (right, top), (right, bottom)),
            (&border.bottom, (left, bottom), (right, bottom)),
            (&border.left, (left, top), (left, bottom)),
        ];
        for (edge, from, to) in edges {
            if !edge.is_drawn() {
                continue;
            }
            let pen = Pen {
                width: self.pt(edge.width),
                color: edge.color.unwrap_or(Color::BLACK),
                dash: edge.dash.iter().flatten().map(|d| self.pt(*d)).collect(),
            };
            self.surface
                .shape(&Shape::Polyline(vec![from, to]), None, Some(&pen))?;
        }
        Ok(())
    }
}
