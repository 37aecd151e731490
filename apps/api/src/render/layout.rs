//! Card geometry.
//!
//! All constants are logical pixels on the 400 × 600 card; the renderer
//! multiplies them by the export scale.

use serde::Serialize;

use crate::render::font::{chars_per_line, TextStyle};

pub const CARD_WIDTH: f32 = 400.0;
pub const CARD_HEIGHT: f32 = 600.0;
/// Share of the card height given to the photo frame.
pub const PHOTO_FRACTION: f32 = 0.75;

pub const PANEL_PADDING: f32 = 24.0;
pub const RULE_HEIGHT: f32 = 4.0;

pub const NAME_SIZE: f32 = 24.0;
pub const NAME_LETTER_SPACING_EM: f32 = 0.2;
pub const NAME_MIN_SIZE: f32 = 12.0;
pub const NAME_GAP: f32 = 8.0;

pub const TAGLINE_SIZE: f32 = 14.0;
pub const TAGLINE_MIN_SIZE: f32 = 9.0;
pub const TAGLINE_LINE_HEIGHT: f32 = 1.5;
pub const TAGLINE_SIDE_PADDING: f32 = 16.0;

pub const FOOTER_SIZE: f32 = 10.0;
pub const FOOTER_TOP_PADDING: f32 = 12.0;
pub const FOOTER_MARK: &str = "COZYCARD";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn scaled(&self, factor: f32) -> Rect {
        Rect::new(self.x * factor, self.y * factor, self.width * factor, self.height * factor)
    }
}

pub fn photo_frame() -> Rect {
    Rect::new(0.0, 0.0, CARD_WIDTH, CARD_HEIGHT * PHOTO_FRACTION)
}

pub fn info_panel() -> Rect {
    let top = CARD_HEIGHT * PHOTO_FRACTION;
    Rect::new(0.0, top, CARD_WIDTH, CARD_HEIGHT - top)
}

/// Fits an image of `src_w × src_h` inside `frame` without cropping.
/// Horizontally centred; vertically at `position` percent of the slack
/// (0 = top, 50 = centre, 100 = bottom).
pub fn fit_photo(src_w: u32, src_h: u32, frame: Rect, position: u8) -> Rect {
    if src_w == 0 || src_h == 0 {
        return Rect::new(frame.x, frame.y, 0.0, 0.0);
    }
    let scale = (frame.width / src_w as f32).min(frame.height / src_h as f32);
    let width = src_w as f32 * scale;
    let height = src_h as f32 * scale;
    let offset = position.min(100) as f32 / 100.0;
    Rect::new(
        frame.x + (frame.width - width) / 2.0,
        frame.y + (frame.height - height) * offset,
        width,
        height,
    )
}

/// Greedy word wrap to at most `max_chars` per line. Words longer than a
/// line are split.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Text placement inside the info panel, in logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelText {
    pub name: String,
    pub name_style: TextStyle,
    pub name_top: f32,
    pub tagline_lines: Vec<String>,
    pub tagline_style: TextStyle,
    pub tagline_top: f32,
    pub tagline_line_height: f32,
    pub footer_top: f32,
    pub footer_rule_y: f32,
}

/// Lays out name, tagline and footer. The name is upper-cased and shrunk
/// until it fits on one line; the tagline shrinks until its wrapped lines
/// fit the space above the footer.
pub fn layout_panel(name: &str, tagline: Option<&str>) -> PanelText {
    let panel = info_panel();
    let inner_width = panel.width - 2.0 * PANEL_PADDING;
    let content_top = panel.y + RULE_HEIGHT + PANEL_PADDING;

    let footer_height = FOOTER_SIZE * TAGLINE_LINE_HEIGHT;
    let footer_top = panel.bottom() - PANEL_PADDING - footer_height;
    let footer_rule_y = footer_top - FOOTER_TOP_PADDING;

    let name = name.trim().to_uppercase();
    let name_chars = name.chars().count();
    let mut name_size = NAME_SIZE;
    let mut name_style = TextStyle::new(name_size).with_letter_spacing(NAME_LETTER_SPACING_EM);
    while name_size > NAME_MIN_SIZE && chars_per_line(inner_width, name_style) < name_chars {
        name_size -= 1.0;
        name_style = TextStyle::new(name_size).with_letter_spacing(NAME_LETTER_SPACING_EM);
    }

    let available = (footer_rule_y - content_top).max(0.0);
    let tagline_width = inner_width - 2.0 * TAGLINE_SIDE_PADDING;
    let mut tagline_size = TAGLINE_SIZE;
    let (tagline_lines, tagline_style) = loop {
        let style = TextStyle::new(tagline_size);
        let lines = match tagline {
            Some(text) => wrap_words(text, chars_per_line(tagline_width, style)),
            None => Vec::new(),
        };
        let height = name_size + NAME_GAP + lines.len() as f32 * tagline_size * TAGLINE_LINE_HEIGHT;
        if height <= available || tagline_size <= TAGLINE_MIN_SIZE {
            break (lines, style);
        }
        tagline_size -= 1.0;
    };

    let tagline_line_height = tagline_style.size_px * TAGLINE_LINE_HEIGHT;
    let block_height = if tagline_lines.is_empty() {
        name_size
    } else {
        name_size + NAME_GAP + tagline_lines.len() as f32 * tagline_line_height
    };
    let name_top = content_top + ((available - block_height) / 2.0).max(0.0);
    let tagline_top = name_top + name_size + NAME_GAP;

    PanelText {
        name,
        name_style,
        name_top,
        tagline_lines,
        tagline_style,
        tagline_top,
        tagline_line_height,
        footer_top,
        footer_rule_y,
    }
}
