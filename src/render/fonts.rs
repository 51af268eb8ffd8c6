use crate::common::Font;

/// The three standard PDF families every viewer ships.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Family {
    Helvetica,
    Times,
    Courier,
}

/// A concrete base-14 face picked for a report font.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Face {
    pub(crate) family: Family,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
}

impl Face {
    pub(crate) fn for_font(font: &Font) -> Face {
        Face {
            family: family_for(&font.name),
            bold: font.bold,
            italic: font.italic,
        }
    }

    pub(crate) fn base_font(&self) -> &'static str {
        match (self.family, self.bold, self.italic) {
            (Family::Helvetica, false, false) => "Helvetica",
            (Family::Helvetica, true, false) => "Helvetica-Bold",
            (Family::Helvetica, false, true) => "Helvetica-Oblique",
            (Family::Helvetica, true, true) => "Helvetica-BoldOblique",
            (Family::Times, false, false) => "Times-Roman",
            (Family::Times, true, false) => "Times-Bold",
            (Family::Times, false, true) => "Times-Italic",
            (Family::Times, true, true) => "Times-BoldItalic",
            (Family::Courier, false, false) => "Courier",
            (Family::Courier, true, false) => "Courier-Bold",
            (Family::Courier, false, true) => "Courier-Oblique",
            (Family::Courier, true, true) => "Courier-BoldOblique",
        }
    }

    /// CSS font stack for the SVG backend.
    pub(crate) fn css_family(&self) -> &'static str {
        match self.family {
            Family::Helvetica => "Helvetica, Arial, sans-serif",
            Family::Times => "'Times New Roman', Times, serif",
            Family::Courier => "'Courier New', Courier, monospace",
        }
    }

    /// Advance of `ch` in 1000-units.
    pub(crate) fn char_width_1000(&self, ch: char) -> f64 {
        if ch.is_control() {
            return 0.0;
        }
        // unmappable characters are written as '?'
        let byte = match char_to_winansi(ch) {
            0 => b'?',
            b => b,
        };
        let base = match self.family {
            Family::Courier => return 600.0,
            Family::Helvetica => helvetica_width(byte),
            Family::Times => times_width(byte),
        };
        if self.bold { base * 1.06 } else { base }
    }

    /// Width of `text` at `size`, with `spacing` added after every character.
    pub(crate) fn text_width(&self, text: &str, size: f64, spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * size / 1000.0 + spacing)
            .sum()
    }
}

fn family_for(name: &str) -> Family {
    let lower = name.to_ascii_lowercase();
    if lower.contains("mono") || lower.contains("courier") || lower.contains("fixed") {
        Family::Courier
    } else if lower.contains("sans") || lower.contains("helvetica") || lower.contains("arial") {
        Family::Helvetica
    } else if lower.contains("serif") || lower.contains("times") || lower.contains("roman") {
        Family::Times
    } else {
        log::debug!("No standard face for font \"{name}\"; using Helvetica");
        Family::Helvetica
    }
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi bytes.
fn helvetica_width(b: u8) -> f64 {
    match b {
        32 => 278.0,                          // space
        33..=47 => 333.0,                     // punctuation
        48..=57 => 556.0,                     // digits
        58..=64 => 333.0,                     // more punctuation
        73 | 74 => 278.0,                     // I J
        77 => 833.0,                          // M
        65..=90 => 667.0,                     // uppercase average
        91..=96 => 333.0,                     // brackets etc.
        102 | 105 | 106 | 108 | 116 => 278.0, // f i j l t
        109 | 119 => 833.0,                   // m w
        97..=122 => 556.0,                    // lowercase average
        _ => 556.0,
    }
}

/// Approximate Times-Roman widths.
fn times_width(b: u8) -> f64 {
    match b {
        32 => 250.0,
        33..=47 => 333.0,
        48..=57 => 500.0,
        58..=64 => 278.0,
        73 | 74 => 333.0,
        77 => 889.0,
        87 => 944.0,
        65..=90 => 667.0,
        91..=96 => 333.0,
        102 | 105 | 106 | 108 | 116 => 278.0,
        109 => 778.0,
        119 => 722.0,
        97..=122 => 472.0,
        _ => 500.0,
    }
}

/// Map a char to its WinAnsi (Windows-1252) byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Encode text for a WinAnsi-encoded base-14 font. Unmappable chars
/// become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter(|c| !c.is_control())
        .map(|c| match char_to_winansi(c) {
            0 => b'?',
            b => b,
        })
        .collect()
}
