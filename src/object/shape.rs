use crate::common::{Color, Point, Rotation, Size, Stroke};
use crate::node::Node;

use super::ObjectBase;

/// A straight segment from `position` to `position + size`.
#[derive(Clone, Debug, PartialEq)]
pub struct LineObject {
    pub base: ObjectBase,
    pub size: Option<Size>,
    pub rotation: Option<Rotation>,
    pub stroke: Option<Stroke>,
}

impl LineObject {
    pub fn new(name: &str, position: Point) -> Option<Self> {
        ObjectBase::new(name, position).map(|base| LineObject {
            base,
            size: None,
            rotation: None,
            stroke: None,
        })
    }

    pub(super) fn read(base: ObjectBase, node: &Node) -> Self {
        LineObject {
            base,
            size: Size::from_node(node),
            rotation: Rotation::from_node(node),
            stroke: Stroke::from_node(node),
        }
    }

    fn write_to(&self, node: &mut Node) {
        self.base.write_to(node);
        if let Some(size) = &self.size {
            size.write_to(node);
        }
        if let Some(rotation) = &self.rotation {
            rotation.write_to(node);
        }
        if let Some(stroke) = &self.stroke {
            stroke.write_to(node);
        }
    }

    pub fn to_node(&self) -> Node {
        let mut node = Node::new("line");
        self.write_to(&mut node);
        node
    }
}

/// A box: the line attributes describe its outline, plus an optional fill.
#[derive(Clone, Debug, PartialEq)]
pub struct RectObject {
    pub line: LineObject,
    pub fill_color: Option<Color>,
}

impl RectObject {
    pub fn new(name: &str, position: Point) -> Option<Self> {
        LineObject::new(name, position).map(|line| RectObject {
            line,
            fill_color: None,
        })
    }

    pub(super) fn read(base: ObjectBase, node: &Node) -> Self {
        RectObject {
            line: LineObject::read(base, node),
            fill_color: Color::from_attr(node, "fill-color"),
        }
    }

    pub fn to_node(&self) -> Node {
        let mut node = Node::new("rect");
        self.line.write_to(&mut node);
        if let Some(fill) = &self.fill_color {
            node.set_attr("fill-color", fill.to_hex());
        }
        node
    }
}

/// An ellipse inscribed in the rectangle it embeds.
#[derive(Clone, Debug, PartialEq)]
pub struct EllipseObject {
    pub rect: RectObject,
}

impl EllipseObject {
    pub fn new(name: &str, position: Point) -> Option<Self> {
        RectObject::new(name, position).map(|rect| EllipseObject { rect })
    }

    pub(super) fn read(base: ObjectBase, node: &Node) -> Self {
        EllipseObject {
            rect: RectObject::read(base, node),
        }
    }

    pub fn to_node(&self) -> Node {
        let mut node = self.rect.to_node();
        node.tag = "ellipse".to_string();
        node
    }
}
