use crate::common::{Align, Border, Color, Font, Margin, Point, Size, fmt_num, parse_f64};
use crate::node::Node;

use super::ObjectBase;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ellipsize {
    #[default]
    None,
    Start,
    Middle,
    End,
}

impl Ellipsize {
    fn parse(value: &str) -> Ellipsize {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Ellipsize::Start,
            "middle" => Ellipsize::Middle,
            "end" => Ellipsize::End,
            _ => Ellipsize::None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Ellipsize::None => "none",
            Ellipsize::Start => "start",
            Ellipsize::Middle => "middle",
            Ellipsize::End => "end",
        }
    }
}

/// A text box. Authored objects carry a `source` template; objects on a
/// fixed-layout page carry the resolved `text` instead.
#[derive(Clone, Debug, PartialEq)]
pub struct TextObject {
    pub base: ObjectBase,
    pub size: Option<Size>,
    pub source: Option<String>,
    pub text: Option<String>,
    pub font: Option<Font>,
    pub align: Option<Align>,
    pub border: Option<Border>,
    pub background: Option<Color>,
    pub padding: Option<Margin>,
    pub letter_spacing: Option<f64>,
    pub ellipsize: Ellipsize,
    pub fill_with: Option<String>,
}

impl TextObject {
    pub fn new(name: &str, position: Point) -> Option<Self> {
        ObjectBase::new(name, position).map(Self::empty)
    }

    fn empty(base: ObjectBase) -> Self {
        TextObject {
            base,
            size: None,
            source: None,
            text: None,
            font: None,
            align: None,
            border: None,
            background: None,
            padding: None,
            letter_spacing: None,
            ellipsize: Ellipsize::None,
            fill_with: None,
        }
    }

    pub(super) fn read(base: ObjectBase, node: &Node) -> Self {
        TextObject {
            size: Size::from_node(node),
            source: node.attr("source").map(str::to_string),
            text: node.text.clone(),
            font: Font::from_node(node),
            align: Align::from_node(node),
            border: Border::from_node(node),
            background: Color::from_attr(node, "background-color"),
            padding: Margin::from_node_opt(node, "padding"),
            letter_spacing: parse_f64(node, "letter-spacing"),
            ellipsize: node
                .attr("ellipsize")
                .map(Ellipsize::parse)
                .unwrap_or_default(),
            fill_with: node
                .attr("fill-with")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ..Self::empty(base)
        }
    }

    pub fn to_node(&self) -> Node {
        let mut node = Node::new("text");
        self.base.write_to(&mut node);
        if let Some(size) = &self.size {
            size.write_to(&mut node);
        }
        if let Some(source) = &self.source {
            node.set_attr("source", source.clone());
        }
        if let Some(font) = &self.font {
            font.write_to(&mut node);
        }
        if let Some(align) = &self.align {
            align.write_to(&mut node);
        }
        if let Some(border) = &self.border {
            border.write_to(&mut node);
        }
        if let Some(bg) = &self.background {
            node.set_attr("background-color", bg.to_hex());
        }
        if let Some(padding) = &self.padding {
            padding.write_to(&mut node, "padding");
        }
        if let Some(spacing) = self.letter_spacing {
            node.set_attr("letter-spacing", fmt_num(spacing));
        }
        if self.ellipsize != Ellipsize::None {
            node.set_attr("ellipsize", self.ellipsize.as_str());
        }
        if let Some(fill) = &self.fill_with {
            node.set_attr("fill-with", fill.clone());
        }
        node.text = self.text.clone();
        node
    }
}
