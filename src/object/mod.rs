//! Drawable report objects.
//!
//! A closed set of variants sharing an [`ObjectBase`]. `Rect` embeds the
//! `Line` attribute set and `Ellipse` embeds `Rect`, so an ellipse writes the
//! same attributes as a rectangle under a different tag.

mod image;
mod shape;
mod text;

pub use image::{Adapt, ImageObject};
pub use shape::{EllipseObject, LineObject, RectObject};
pub use text::{Ellipsize, TextObject};

use crate::common::{Point, Size, bool_attr, bool_str};
use crate::node::Node;

/// Attributes every object carries. The name is fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectBase {
    name: String,
    pub position: Point,
    pub visible: bool,
}

impl ObjectBase {
    pub fn new(name: &str, position: Point) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            log::warn!("Refusing to create an object with an empty name");
            return None;
        }
        Some(ObjectBase {
            name: name.to_string(),
            position,
            visible: true,
        })
    }

    fn from_node(node: &Node, require_name: bool) -> Option<Self> {
        let name = node.attr("name").map(str::trim).unwrap_or("");
        if require_name && name.is_empty() {
            log::warn!("<{}> without a name skipped", node.tag);
            return None;
        }
        let Some(position) = Point::from_node(node) else {
            log::warn!("<{}> \"{name}\" has no position; skipped", node.tag);
            return None;
        };
        Some(ObjectBase {
            name: name.to_string(),
            position,
            visible: bool_attr(node, "visible").unwrap_or(true),
        })
    }

    fn write_to(&self, node: &mut Node) {
        if !self.name.is_empty() {
            node.set_attr("name", self.name.clone());
        }
        self.position.write_to(node);
        node.set_attr("visible", bool_str(self.visible));
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReportObject {
    Text(TextObject),
    Line(LineObject),
    Rect(RectObject),
    Ellipse(EllipseObject),
    Image(ImageObject),
}

pub const OBJECT_TAGS: [&str; 5] = ["text", "line", "rect", "ellipse", "image"];

impl ReportObject {
    /// Read an authored object; `name` and a position are mandatory.
    pub fn from_node(node: &Node) -> Option<ReportObject> {
        Self::read(node, true)
    }

    /// Read an object from a fixed-layout page, where names are stripped.
    pub fn from_fixed_node(node: &Node) -> Option<ReportObject> {
        Self::read(node, false)
    }

    fn read(node: &Node, require_name: bool) -> Option<ReportObject> {
        let base = ObjectBase::from_node(node, require_name)?;
        let object = match node.tag.as_str() {
            "text" => ReportObject::Text(TextObject::read(base, node)),
            "line" => ReportObject::Line(LineObject::read(base, node)),
            "rect" => ReportObject::Rect(RectObject::read(base, node)),
            "ellipse" => ReportObject::Ellipse(EllipseObject::read(base, node)),
            "image" => ReportObject::Image(ImageObject::read(base, node)),
            other => {
                log::warn!("Unknown object type <{other}> skipped");
                return None;
            }
        };
        Some(object)
    }

    pub fn to_node(&self) -> Node {
        match self {
            ReportObject::Text(o) => o.to_node(),
            ReportObject::Line(o) => o.to_node(),
            ReportObject::Rect(o) => o.to_node(),
            ReportObject::Ellipse(o) => o.to_node(),
            ReportObject::Image(o) => o.to_node(),
        }
    }

    pub fn base(&self) -> &ObjectBase {
        match self {
            ReportObject::Text(o) => &o.base,
            ReportObject::Line(o) => &o.base,
            ReportObject::Rect(o) => &o.line.base,
            ReportObject::Ellipse(o) => &o.rect.line.base,
            ReportObject::Image(o) => &o.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        match self {
            ReportObject::Text(o) => &mut o.base,
            ReportObject::Line(o) => &mut o.base,
            ReportObject::Rect(o) => &mut o.line.base,
            ReportObject::Ellipse(o) => &mut o.rect.line.base,
            ReportObject::Image(o) => &mut o.base,
        }
    }

    pub fn name(&self) -> &str {
        self.base().name()
    }

    pub fn position(&self) -> Point {
        self.base().position
    }

    pub fn is_visible(&self) -> bool {
        self.base().visible
    }

    pub fn size(&self) -> Option<Size> {
        match self {
            ReportObject::Text(o) => o.size,
            ReportObject::Line(o) => o.size,
            ReportObject::Rect(o) => o.line.size,
            ReportObject::Ellipse(o) => o.rect.line.size,
            ReportObject::Image(o) => o.size,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ReportObject::Text(_) => "text",
            ReportObject::Line(_) => "line",
            ReportObject::Rect(_) => "rect",
            ReportObject::Ellipse(_) => "ellipse",
            ReportObject::Image(_) => "image",
        }
    }
}
