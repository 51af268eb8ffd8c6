use crate::common::{Border, Point, Rotation, Size};
use crate::node::Node;

use super::ObjectBase;

/// How an image and its declared box are reconciled at render time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Adapt {
    #[default]
    None,
    /// Scale the image to the declared size, ignoring aspect ratio.
    ToBox,
    /// Replace the declared size with the image's pixel size.
    ToImage,
}

impl Adapt {
    fn parse(value: &str) -> Adapt {
        match value.trim().to_ascii_lowercase().as_str() {
            "to-box" | "box" => Adapt::ToBox,
            "to-image" | "image" => Adapt::ToImage,
            "none" => Adapt::None,
            other => {
                log::warn!("Unknown image adapt mode \"{other}\"; using none");
                Adapt::None
            }
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Adapt::None => "none",
            Adapt::ToBox => "to-box",
            Adapt::ToImage => "to-image",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageObject {
    pub base: ObjectBase,
    pub size: Option<Size>,
    pub rotation: Option<Rotation>,
    pub border: Option<Border>,
    pub source: Option<String>,
    pub adapt: Adapt,
}

impl ImageObject {
    pub fn new(name: &str, position: Point) -> Option<Self> {
        ObjectBase::new(name, position).map(|base| ImageObject {
            base,
            size: None,
            rotation: None,
            border: None,
            source: None,
            adapt: Adapt::None,
        })
    }

    pub(super) fn read(base: ObjectBase, node: &Node) -> Self {
        ImageObject {
            base,
            size: Size::from_node(node),
            rotation: Rotation::from_node(node),
            border: Border::from_node(node),
            source: node
                .attr("source")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            adapt: node.attr("adapt").map(Adapt::parse).unwrap_or_default(),
        }
    }

    pub fn to_node(&self) -> Node {
        let mut node = Node::new("image");
        self.base.write_to(&mut node);
        if let Some(size) = &self.size {
            size.write_to(&mut node);
        }
        if let Some(rotation) = &self.rotation {
            rotation.write_to(&mut node);
        }
        if let Some(border) = &self.border {
            border.write_to(&mut node);
        }
        if let Some(source) = &self.source {
            node.set_attr("source", source.clone());
        }
        if self.adapt != Adapt::None {
            node.set_attr("adapt", self.adapt.as_str());
        }
        node
    }
}
