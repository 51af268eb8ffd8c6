//! Geometry and style value types shared by the report model, the
//! pagination engine and the renderers.
//!
//! Every type reads itself from an attribute bag (`from_node`) and writes
//! itself back (`write_to`). Parsing is total: malformed numbers count as
//! absent and fall back to the type default.

use crate::node::Node;

const PT_PER_IN: f64 = 72.0;
const PT_PER_CM: f64 = 72.0 / 2.54;
const PT_PER_MM: f64 = 72.0 / 25.4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    Points,
    Inches,
    Centimetres,
    Millimetres,
}

impl Unit {
    pub fn parse(tag: &str) -> Option<Unit> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pt" => Some(Unit::Points),
            "in" => Some(Unit::Inches),
            "cm" => Some(Unit::Centimetres),
            "mm" => Some(Unit::Millimetres),
            _ => None,
        }
    }

    /// Like [`Unit::parse`] but falls back to points on an unknown tag.
    pub fn from_tag(tag: &str) -> Unit {
        Unit::parse(tag).unwrap_or_else(|| {
            log::warn!("Unknown unit of length \"{tag}\"; using points");
            Unit::Points
        })
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Unit::Points => "pt",
            Unit::Inches => "in",
            Unit::Centimetres => "cm",
            Unit::Millimetres => "mm",
        }
    }

    fn points_per_unit(self) -> f64 {
        match self {
            Unit::Points => 1.0,
            Unit::Inches => PT_PER_IN,
            Unit::Centimetres => PT_PER_CM,
            Unit::Millimetres => PT_PER_MM,
        }
    }

    pub fn to_points(self, value: f64) -> f64 {
        value * self.points_per_unit()
    }

    pub fn from_points(self, value: f64) -> f64 {
        value / self.points_per_unit()
    }
}

pub fn to_points(unit: Unit, value: f64) -> f64 {
    unit.to_points(value)
}

pub fn from_points(unit: Unit, value: f64) -> f64 {
    unit.from_points(value)
}

pub(crate) fn parse_f64(node: &Node, key: &str) -> Option<f64> {
    node.attr(key)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn bool_attr(node: &Node, key: &str) -> Option<bool> {
    node.attr(key).and_then(parse_bool)
}

pub(crate) fn bool_str(value: bool) -> &'static str {
    if value { "y" } else { "n" }
}

/// Shortest decimal form: `50.0` is written as `50`.
pub(crate) fn fmt_num(value: f64) -> String {
    format!("{value}")
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    /// Strict `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` parsing.
    pub fn from_hex(value: &str) -> Option<Color> {
        let hex = value.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| -> Option<f64> {
            u8::from_str_radix(&expanded[i * 2..i * 2 + 2], 16)
                .ok()
                .map(|b| b as f64 / 255.0)
        };
        Some(Color {
            r: channel(0)?,
            g: channel(1)?,
            b: channel(2)?,
            a: if expanded.len() == 8 { channel(3)? } else { 1.0 },
        })
    }

    /// Total parse: anything unreadable becomes opaque black.
    pub fn parse(value: &str) -> Color {
        Color::from_hex(value).unwrap_or_else(|| {
            log::warn!("Unreadable color \"{value}\"; using black");
            Color::BLACK
        })
    }

    pub(crate) fn from_attr(node: &Node, key: &str) -> Option<Color> {
        node.attr(key).map(Color::parse)
    }

    pub fn to_hex(&self) -> String {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// `None` when neither `x` nor `y` is present; a missing half is zero.
    pub fn from_node(node: &Node) -> Option<Point> {
        let x = parse_f64(node, "x");
        let y = parse_f64(node, "y");
        if x.is_none() && y.is_none() {
            return None;
        }
        Some(Point {
            x: x.unwrap_or(0.0),
            y: y.unwrap_or(0.0),
        })
    }

    pub fn write_to(&self, node: &mut Node) {
        node.set_attr("x", fmt_num(self.x));
        node.set_attr("y", fmt_num(self.y));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }

    pub fn from_node(node: &Node) -> Option<Size> {
        let width = parse_f64(node, "width");
        let height = parse_f64(node, "height");
        if width.is_none() && height.is_none() {
            return None;
        }
        Some(Size {
            width: width.unwrap_or(0.0),
            height: height.unwrap_or(0.0),
        })
    }

    pub fn write_to(&self, node: &mut Node) {
        node.set_attr("width", fmt_num(self.width));
        node.set_attr("height", fmt_num(self.height));
    }
}

/// Rotation angle in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotation {
    pub angle: f64,
}

impl Rotation {
    pub fn from_node(node: &Node) -> Option<Rotation> {
        parse_f64(node, "rotation").map(|angle| Rotation { angle })
    }

    pub fn write_to(&self, node: &mut Node) {
        node.set_attr("rotation", fmt_num(self.angle));
    }
}

/// Four-sided offsets; used for page margins and text padding.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Margin {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }

    /// Reads `{prefix}-top` etc. Always materialised; absent sides are zero.
    pub fn from_node(node: &Node, prefix: &str) -> Margin {
        let side = |s: &str| parse_f64(node, &format!("{prefix}-{s}")).unwrap_or(0.0);
        Margin {
            top: side("top"),
            right: side("right"),
            bottom: side("bottom"),
            left: side("left"),
        }
    }

    /// `None` when none of the four sides is present.
    pub fn from_node_opt(node: &Node, prefix: &str) -> Option<Margin> {
        ["top", "right", "bottom", "left"]
            .iter()
            .any(|s| node.has_attr(&format!("{prefix}-{s}")))
            .then(|| Margin::from_node(node, prefix))
    }

    pub fn write_to(&self, node: &mut Node, prefix: &str) {
        node.set_attr(&format!("{prefix}-top"), fmt_num(self.top));
        node.set_attr(&format!("{prefix}-right"), fmt_num(self.right));
        node.set_attr(&format!("{prefix}-bottom"), fmt_num(self.bottom));
        node.set_attr(&format!("{prefix}-left"), fmt_num(self.left));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    Low,
    Error,
}

impl Underline {
    pub fn parse(value: &str) -> Underline {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Underline::Single,
            "double" => Underline::Double,
            "low" => Underline::Low,
            "error" => Underline::Error,
            "none" => Underline::None,
            other => {
                log::warn!("Unknown underline \"{other}\"; using none");
                Underline::None
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Underline::None => "none",
            Underline::Single => "single",
            Underline::Double => "double",
            Underline::Low => "low",
            Underline::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub name: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strike: bool,
    pub color: Option<Color>,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            name: "Sans".to_string(),
            size: 12.0,
            bold: false,
            italic: false,
            underline: Underline::None,
            strike: false,
            color: None,
        }
    }
}

const FONT_KEYS: [&str; 7] = [
    "font-name",
    "font-size",
    "font-bold",
    "font-italic",
    "font-underline",
    "font-strike",
    "font-color",
];

impl Font {
    /// `None` when no `font-*` attribute is present at all.
    pub fn from_node(node: &Node) -> Option<Font> {
        if !FONT_KEYS.iter().any(|k| node.has_attr(k)) {
            return None;
        }
        let defaults = Font::default();
        Some(Font {
            name: node
                .attr("font-name")
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.name),
            size: parse_f64(node, "font-size")
                .filter(|s| *s > 0.0)
                .unwrap_or(defaults.size),
            bold: bool_attr(node, "font-bold").unwrap_or(false),
            italic: bool_attr(node, "font-italic").unwrap_or(false),
            underline: node
                .attr("font-underline")
                .map(Underline::parse)
                .unwrap_or_default(),
            strike: bool_attr(node, "font-strike").unwrap_or(false),
            color: Color::from_attr(node, "font-color"),
        })
    }

    pub fn write_to(&self, node: &mut Node) {
        node.set_attr("font-name", self.name.clone());
        node.set_attr("font-size", fmt_num(self.size));
        node.set_attr("font-bold", bool_str(self.bold));
        node.set_attr("font-italic", bool_str(self.italic));
        node.set_attr("font-underline", self.underline.as_str());
        node.set_attr("font-strike", bool_str(self.strike));
        if let Some(color) = &self.color {
            node.set_attr("font-color", color.to_hex());
        }
    }
}

/// `;`-separated on/off lengths. Non-positive entries are dropped; an empty
/// result means a solid line.
pub fn parse_dash(value: &str) -> Option<Vec<f64>> {
    let dashes: Vec<f64> = value
        .split(';')
        .filter_map(|part| part.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    (!dashes.is_empty()).then_some(dashes)
}

pub fn format_dash(dashes: &[f64]) -> String {
    dashes.iter().map(|d| fmt_num(*d)).collect::<Vec<_>>().join(";")
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Option<Color>,
    pub dash: Option<Vec<f64>>,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            width: 1.0,
            color: None,
            dash: None,
        }
    }
}

impl Stroke {
    pub fn from_node(node: &Node) -> Option<Stroke> {
        if !["stroke-width", "stroke-color", "stroke-style"]
            .iter()
            .any(|k| node.has_attr(k))
        {
            return None;
        }
        Some(Stroke {
            width: parse_f64(node, "stroke-width")
                .filter(|w| *w >= 0.0)
                .unwrap_or(1.0),
            color: Color::from_attr(node, "stroke-color"),
            dash: node.attr("stroke-style").and_then(parse_dash),
        })
    }

    pub fn write_to(&self, node: &mut Node) {
        node.set_attr("stroke-width", fmt_num(self.width));
        if let Some(color) = &self.color {
            node.set_attr("stroke-color", color.to_hex());
        }
        if let Some(dash) = &self.dash {
            node.set_attr("stroke-style", format_dash(dash));
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BorderEdge {
    pub width: f64,
    pub color: Option<Color>,
    pub dash: Option<Vec<f64>>,
}

impl BorderEdge {
    /// A zero-width edge is never drawn, whatever its color.
    pub fn is_drawn(&self) -> bool {
        self.width != 0.0 && self.color.is_some()
    }

    fn from_node(node: &Node, side: &str) -> BorderEdge {
        BorderEdge {
            width: parse_f64(node, &format!("border-{side}-width"))
                .filter(|w| *w >= 0.0)
                .unwrap_or(0.0),
            color: Color::from_attr(node, &format!("border-{side}-color")),
            dash: node
                .attr(&format!("border-{side}-style"))
                .and_then(parse_dash),
        }
    }

    fn write_to(&self, node: &mut Node, side: &str) {
        node.set_attr(&format!("border-{side}-width"), fmt_num(self.width));
        if let Some(color) = &self.color {
            node.set_attr(&format!("border-{side}-color"), color.to_hex());
        }
        if let Some(dash) = &self.dash {
            node.set_attr(&format!("border-{side}-style"), format_dash(dash));
        }
    }
}

const BORDER_SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Border {
    pub top: BorderEdge,
    pub right: BorderEdge,
    pub bottom: BorderEdge,
    pub left: BorderEdge,
}

impl Border {
    pub fn uniform(width: f64, color: Color) -> Self {
        let edge = BorderEdge {
            width,
            color: Some(color),
            dash: None,
        };
        Border {
            top: edge.clone(),
            right: edge.clone(),
            bottom: edge.clone(),
            left: edge,
        }
    }

    pub fn from_node(node: &Node) -> Option<Border> {
        let present = node.attrs().any(|(k, _)| k.starts_with("border-"));
        present.then(|| Border {
            top: BorderEdge::from_node(node, "top"),
            right: BorderEdge::from_node(node, "right"),
            bottom: BorderEdge::from_node(node, "bottom"),
            left: BorderEdge::from_node(node, "left"),
        })
    }

    pub fn write_to(&self, node: &mut Node) {
        for (side, edge) in BORDER_SIDES.iter().zip(self.edges()) {
            edge.write_to(node, side);
        }
    }

    pub fn edges(&self) -> [&BorderEdge; 4] {
        [&self.top, &self.right, &self.bottom, &self.left]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Align {
    pub h: HAlign,
    pub v: VAlign,
}

impl Align {
    pub fn from_node(node: &Node) -> Option<Align> {
        let h = node.attr("horizontal-align");
        let v = node.attr("vertical-align");
        if h.is_none() && v.is_none() {
            return None;
        }
        let h = match h.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("center") => HAlign::Center,
            Some("right") => HAlign::Right,
            Some("justified") => HAlign::Justified,
            _ => HAlign::Left,
        };
        let v = match v.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("center") => VAlign::Center,
            Some("bottom") => VAlign::Bottom,
            _ => VAlign::Top,
        };
        Some(Align { h, v })
    }

    pub fn write_to(&self, node: &mut Node) {
        let h = match self.h {
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
            HAlign::Justified => "justified",
        };
        let v = match self.v {
            VAlign::Top => "top",
            VAlign::Center => "center",
            VAlign::Bottom => "bottom",
        };
        node.set_attr("horizontal-align", h);
        node.set_attr("vertical-align", v);
    }
}
