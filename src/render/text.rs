//! Backend-independent text box layout: wrapping, alignment, ellipsis and
//! fill-with padding. All lengths are points, y grows downwards from the top
//! of the box's content area.

use crate::common::{Align, HAlign, VAlign};
use crate::object::Ellipsize;

use super::fonts::Face;

/// Line pitch as a multiple of the font size.
pub(crate) const LINE_HEIGHT: f64 = 1.2;
/// Baseline position below the line top, as a multiple of the font size.
pub(crate) const ASCENT: f64 = 0.75;

const ELLIPSIS: &str = "\u{2026}";

#[derive(Clone, Copy, Debug)]
pub(crate) struct TextStyle {
    pub(crate) face: Face,
    pub(crate) size: f64,
    pub(crate) spacing: f64,
}

impl TextStyle {
    pub(crate) fn width(&self, text: &str) -> f64 {
        self.face.text_width(text, self.size, self.spacing)
    }

    fn space_width(&self) -> f64 {
        self.width(" ")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Chunk {
    pub(crate) text: String,
    pub(crate) x: f64,
    pub(crate) width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextLine {
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) baseline: f64,
}

#[cfg(test)]
impl TextLine {
    fn text(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub(crate) struct TextBlock<'a> {
    pub(crate) text: &'a str,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) align: Align,
    pub(crate) ellipsize: Ellipsize,
    pub(crate) fill_with: Option<&'a str>,
}

struct RawLine {
    chunks: Vec<Chunk>,
    total_width: f64,
    /// Last line of a paragraph; never justified.
    paragraph_end: bool,
}

fn finish_line(chunks: &mut Vec<Chunk>, paragraph_end: bool) -> RawLine {
    let total_width = chunks.last().map_or(0.0, |c| c.x + c.width);
    RawLine {
        chunks: std::mem::take(chunks),
        total_width,
        paragraph_end,
    }
}

/// Greedy word wrap. A word wider than the box gets a line of its own.
fn wrap(style: &TextStyle, text: &str, max_width: f64) -> Vec<RawLine> {
    let space_w = style.space_width();
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current_x = 0.0;
        for word in paragraph.split_whitespace() {
            let ww = style.width(word);
            let proposed_x = if chunks.is_empty() {
                current_x
            } else {
                current_x + space_w
            };
            if !chunks.is_empty() && proposed_x + ww > max_width {
                lines.push(finish_line(&mut chunks, false));
                current_x = 0.0;
            } else {
                current_x = proposed_x;
            }
            chunks.push(Chunk {
                text: word.to_string(),
                x: current_x,
                width: ww,
            });
            current_x += ww;
        }
        lines.push(finish_line(&mut chunks, true));
    }
    lines
}

/// Shorten `text` with an ellipsis until it fits `max_width`.
pub(crate) fn ellipsize(style: &TextStyle, text: &str, max_width: f64, mode: Ellipsize) -> String {
    if mode == Ellipsize::None || style.width(text) <= max_width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    for keep in (0..chars.len()).rev() {
        let candidate: String = match mode {
            Ellipsize::End => chars[..keep].iter().collect::<String>() + ELLIPSIS,
            Ellipsize::Start => {
                String::from(ELLIPSIS) + &chars[chars.len() - keep..].iter().collect::<String>()
            }
            Ellipsize::Middle | Ellipsize::None => {
                let head = keep.div_ceil(2);
                let tail = keep / 2;
                chars[..head].iter().collect::<String>()
                    + ELLIPSIS
                    + &chars[chars.len() - tail..].iter().collect::<String>()
            }
        };
        if style.width(&candidate) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
}

/// Lay out a text box into positioned lines.
pub(crate) fn layout(style: &TextStyle, block: &TextBlock) -> Vec<TextLine> {
    let mut lines = if block.ellipsize != Ellipsize::None {
        let flat = block.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let shown = ellipsize(style, &flat, block.width, block.ellipsize);
        let width = style.width(&shown);
        vec![RawLine {
            chunks: vec![Chunk {
                text: shown,
                x: 0.0,
                width,
            }],
            total_width: width,
            paragraph_end: true,
        }]
    } else {
        wrap(style, block.text, block.width)
    };

    if let Some(pattern) = block.fill_with
        && let Some(last) = lines.last_mut()
    {
        pad_with(style, last, pattern, block.width);
    }

    let pitch = style.size * LINE_HEIGHT;
    let total_height = pitch * lines.len() as f64;
    let top = match block.align.v {
        VAlign::Top => 0.0,
        VAlign::Center => (block.height - total_height) / 2.0,
        VAlign::Bottom => block.height - total_height,
    };

    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let justify = block.align.h == HAlign::Justified
                && !line.paragraph_end
                && line.chunks.len() > 1;
            let start = match block.align.h {
                HAlign::Center => (block.width - line.total_width) / 2.0,
                HAlign::Right => block.width - line.total_width,
                HAlign::Left | HAlign::Justified => 0.0,
            };
            let extra_per_gap = if justify {
                (block.width - line.total_width) / (line.chunks.len() - 1) as f64
            } else {
                0.0
            };
            let chunks = line
                .chunks
                .into_iter()
                .enumerate()
                .map(|(n, c)| Chunk {
                    x: start + c.x + n as f64 * extra_per_gap,
                    ..c
                })
                .collect();
            TextLine {
                chunks,
                baseline: top + i as f64 * pitch + style.size * ASCENT,
            }
        })
        .collect()
}

/// Repeat `pattern` after the line's text as far as the box width allows.
fn pad_with(style: &TextStyle, line: &mut RawLine, pattern: &str, max_width: f64) {
    let pattern_w = style.width(pattern);
    if pattern_w <= 0.0 {
        return;
    }
    let gap = if line.chunks.is_empty() {
        0.0
    } else {
        style.space_width()
    };
    let room = max_width - line.total_width - gap;
    // near-zero pattern widths (negative letter-spacing) must not explode
    let limit = (max_width / style.size.max(1.0)).ceil() * 4.0;
    let count = (room / pattern_w).floor().min(limit);
    if count < 1.0 {
        return;
    }
    let x = line.total_width + gap;
    let width = count * pattern_w;
    line.chunks.push(Chunk {
        text: pattern.repeat(count as usize),
        x,
        width,
    });
    line.total_width = x + width;
    line.paragraph_end = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Font;

    fn mono(size: f64) -> TextStyle {
        TextStyle {
            face: Face::for_font(&Font {
                name: "Mono".into(),
                ..Font::default()
            }),
            size,
            spacing: 0.0,
        }
    }

    // Courier at size 10: every char is 6pt wide.
    fn block(text: &str, width: f64) -> TextBlock<'_> {
        TextBlock {
            text,
            width,
            height: 100.0,
            align: Align::default(),
            ellipsize: Ellipsize::None,
            fill_with: None,
        }
    }

    fn texts(lines: &[TextLine]) -> Vec<String> {
        lines.iter().map(TextLine::text).collect()
    }

    #[test]
    fn wraps_words_and_keeps_newlines() {
        let lines = layout(&mono(10.0), &block("aaa bbb ccc\nd", 45.0));
        assert_eq!(texts(&lines), ["aaa bbb", "ccc", "d"]);
        assert_eq!(lines[0].baseline, 7.5);
        assert_eq!(lines[1].baseline, 19.5);
    }

    #[test]
    fn long_word_stays_on_its_own_line() {
        let lines = layout(&mono(10.0), &block("a verylongword b", 30.0));
        assert_eq!(texts(&lines), ["a", "verylongword", "b"]);
    }

    #[test]
    fn alignment_offsets() {
        let mut b = block("ab", 60.0);
        b.align.h = HAlign::Right;
        assert_eq!(layout(&mono(10.0), &b)[0].chunks[0].x, 48.0);
        b.align.h = HAlign::Center;
        assert_eq!(layout(&mono(10.0), &b)[0].chunks[0].x, 24.0);
        b.align.v = VAlign::Bottom;
        assert_eq!(layout(&mono(10.0), &b)[0].baseline, 100.0 - 12.0 + 7.5);
    }

    #[test]
    fn justify_spreads_all_but_the_last_line() {
        let mut b = block("aa bb cc dd", 54.0);
        b.align.h = HAlign::Justified;
        let lines = layout(&mono(10.0), &b);
        assert_eq!(texts(&lines), ["aa bb cc", "dd"]);
        let last = lines[0].chunks.last().unwrap();
        assert!((last.x + last.width - 54.0).abs() < 1e-9);
        assert_eq!(lines[1].chunks[0].x, 0.0);
    }

    #[test]
    fn ellipsize_modes() {
        let style = mono(10.0);
        // 5 chars fit in 30pt, the ellipsis is one of them
        assert_eq!(ellipsize(&style, "abcdefgh", 30.0, Ellipsize::End), "abcd\u{2026}");
        assert_eq!(ellipsize(&style, "abcdefgh", 30.0, Ellipsize::Start), "\u{2026}efgh");
        assert_eq!(ellipsize(&style, "abcdefgh", 30.0, Ellipsize::Middle), "ab\u{2026}gh");
        assert_eq!(ellipsize(&style, "abc", 30.0, Ellipsize::End), "abc");
        assert_eq!(ellipsize(&style, "abcdefgh", 1.0, Ellipsize::End), "\u{2026}");
    }

    #[test]
    fn ellipsized_text_is_a_single_line() {
        let mut b = block("one two\nthree four", 30.0);
        b.ellipsize = Ellipsize::End;
        let lines = layout(&mono(10.0), &b);
        assert_eq!(texts(&lines), ["one \u{2026}"]);
    }

    #[test]
    fn fill_with_pads_last_line() {
        let mut b = block("Total", 60.0);
        b.fill_with = Some(".");
        let lines = layout(&mono(10.0), &b);
        // 5 chars + space leave 24pt: four dots
        assert_eq!(lines[0].chunks[1].text, "....");
        assert_eq!(lines[0].chunks[1].x, 36.0);
    }

    #[test]
    fn fill_with_repeats_are_bounded() {
        let mut style = mono(10.0);
        style.spacing = -5.9999;
        let mut b = block("", 60.0);
        b.fill_with = Some(".");
        let lines = layout(&style, &b);
        let fill = &lines[0].chunks.last().unwrap().text;
        assert_eq!(fill.len(), 24);
    }
}
