// Card renderer: composes photo, gradient panel and text, then rasterizes
// the card to PNG at a fixed upscaling factor.

pub mod canvas;
pub mod font;
pub mod layout;

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;
use tracing::debug;

use crate::render::canvas::{blend_rect, draw_photo, fill_gradient, fill_rect};
use crate::render::font::{draw_text, measure, TextStyle};
use crate::render::layout::{
    fit_photo, info_panel, layout_panel, photo_frame, Rect, CARD_HEIGHT, CARD_WIDTH,
    FOOTER_MARK, FOOTER_SIZE, NAME_LETTER_SPACING_EM, RULE_HEIGHT,
};
use crate::wizard::gradients::GradientTheme;

pub const DEFAULT_EXPORT_SCALE: u32 = 3;
pub const MAX_EXPORT_SCALE: u32 = 4;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 77]);
const FOOTER_INK: Rgba<u8> = Rgba([255, 255, 255, 179]);
const FOOTER_LINE: Rgba<u8> = Rgba([255, 255, 255, 77]);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("export scale must be between 1 and 4, got {0}")]
    InvalidScale(u32),

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Everything the card shows. Owned so it can move onto a blocking task.
#[derive(Debug, Clone)]
pub struct CardContent {
    pub name: String,
    pub tagline: Option<String>,
    pub photo: Option<Arc<DynamicImage>>,
    pub image_position: u8,
    pub gradient: &'static GradientTheme,
}

/// A finished PNG ready for download. The buffer is released when the value
/// is dropped, which happens once the response body has been sent.
#[derive(Debug, Clone)]
pub struct CardExport {
    pub filename: String,
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CardRenderer {
    scale: u32,
}

impl CardRenderer {
    pub fn new(scale: u32) -> Result<Self, RenderError> {
        if !(1..=MAX_EXPORT_SCALE).contains(&scale) {
            return Err(RenderError::InvalidScale(scale));
        }
        Ok(CardRenderer { scale })
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Pixel size of the rasterized card.
    pub fn dimensions(&self) -> (u32, u32) {
        (
            CARD_WIDTH as u32 * self.scale,
            CARD_HEIGHT as u32 * self.scale,
        )
    }

    /// Composes the card into a bitmap. Black background, photo in the top
    /// frame, gradient panel with text below.
    pub fn render(&self, content: &CardContent) -> RgbaImage {
        let s = self.scale as f32;
        let (width, height) = self.dimensions();
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));

        let frame = photo_frame();
        if let Some(photo) = &content.photo {
            let placed = fit_photo(photo.width(), photo.height(), frame, content.image_position);
            draw_photo(&mut canvas, photo, placed.scaled(s), frame.scaled(s));
        }

        let panel = info_panel();
        fill_gradient(&mut canvas, panel.scaled(s), content.gradient);
        fill_rect(
            &mut canvas,
            Rect::new(panel.x, panel.y, panel.width, RULE_HEIGHT).scaled(s),
            WHITE,
        );

        let text = layout_panel(&content.name, content.tagline.as_deref());

        let name_style = scale_style(text.name_style, s);
        draw_centered(&mut canvas, &text.name, text.name_top * s, name_style, s);

        let tagline_style = scale_style(text.tagline_style, s);
        for (i, line) in text.tagline_lines.iter().enumerate() {
            let top = (text.tagline_top + i as f32 * text.tagline_line_height) * s;
            draw_centered(&mut canvas, line, top, tagline_style, s);
        }

        // Footer: thin rule, then the mark flanked by two short lines.
        let inset = panel.x + layout::PANEL_PADDING;
        blend_rect(
            &mut canvas,
            inset * s,
            text.footer_rule_y * s,
            (panel.right() - layout::PANEL_PADDING) * s,
            (text.footer_rule_y + 1.0) * s,
            FOOTER_LINE,
        );
        let footer_style =
            TextStyle::new(FOOTER_SIZE * s).with_letter_spacing(NAME_LETTER_SPACING_EM);
        let mark_width = measure(FOOTER_MARK, footer_style);
        let mark_left = (width as f32 - mark_width) / 2.0;
        let mark_top = text.footer_top * s;
        draw_text(&mut canvas, FOOTER_MARK, mark_left, mark_top, footer_style, FOOTER_INK);
        let flank_y = mark_top + footer_style.size_px / 2.0;
        let gap = 8.0 * s;
        let flank = 32.0 * s;
        blend_rect(&mut canvas, mark_left - gap - flank, flank_y, mark_left - gap, flank_y + s, FOOTER_LINE);
        let mark_right = mark_left + mark_width;
        blend_rect(&mut canvas, mark_right + gap, flank_y, mark_right + gap + flank, flank_y + s, FOOTER_LINE);

        canvas
    }

    /// Renders and encodes the card as PNG. CPU bound; run on a blocking task.
    pub fn export_png(&self, content: &CardContent) -> Result<CardExport, RenderError> {
        let canvas = self.render(content);
        let (width, height) = canvas.dimensions();

        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        debug!(width, height, bytes = buffer.len(), "card rasterized");

        Ok(CardExport {
            filename: export_filename(&content.name),
            bytes: Bytes::from(buffer),
            width,
            height,
        })
    }
}

impl Default for CardRenderer {
    fn default() -> Self {
        CardRenderer {
            scale: DEFAULT_EXPORT_SCALE,
        }
    }
}

fn scale_style(style: TextStyle, factor: f32) -> TextStyle {
    TextStyle {
        size_px: style.size_px * factor,
        letter_spacing_px: style.letter_spacing_px * factor,
    }
}

/// Draws a horizontally centred line with a soft drop shadow.
fn draw_centered(canvas: &mut RgbaImage, text: &str, top: f32, style: TextStyle, scale: f32) {
    let left = (canvas.width() as f32 - measure(text, style)) / 2.0;
    draw_text(canvas, text, left, top + 2.0 * scale, style, SHADOW);
    draw_text(canvas, text, left, top, style, WHITE);
}

/// Download name: lower-cased, whitespace runs replaced by '-'. Only
/// `[a-z0-9-]` survives, so the result is always a valid quoted header
/// parameter. Falls back to `card.png` when nothing is left.
pub fn export_filename(name: &str) -> String {
    let slug = name
        .split_whitespace()
        .map(|part| {
            part.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .map(|c| c.to_ascii_lowercase())
                .collect::<String>()
        })
        .filter(|part| !part.trim_matches('-').is_empty())
        .map(|part| part.trim_matches('-').to_string())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "card.png".to_string()
    } else {
        format!("{slug}.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::gradients::{find_gradient, GRADIENTS};

    fn content(photo: Option<DynamicImage>) -> CardContent {
        CardContent {
            name: "Alex".into(),
            tagline: Some("I choose calm over chaos".into()),
            photo: photo.map(Arc::new),
            image_position: 50,
            gradient: &GRADIENTS[0],
        }
    }

    fn is_red(p: &Rgba<u8>) -> bool {
        p.0[0] > 245 && p.0[1] < 10 && p.0[2] < 10
    }

    #[test]
    fn test_scale_bounds() {
        assert!(CardRenderer::new(0).is_err());
        assert!(CardRenderer::new(5).is_err());
        assert_eq!(CardRenderer::new(3).unwrap().dimensions(), (1200, 1800));
        assert_eq!(CardRenderer::default().scale(), DEFAULT_EXPORT_SCALE);
    }

    #[test]
    fn test_render_dimensions_keep_two_by_three() {
        let renderer = CardRenderer::new(1).unwrap();
        let canvas = renderer.render(&content(None));
        assert_eq!(canvas.dimensions(), (400, 600));
    }

    #[test]
    fn test_photo_area_without_photo_is_black() {
        let renderer = CardRenderer::new(1).unwrap();
        let canvas = renderer.render(&content(None));
        assert_eq!(canvas.get_pixel(200, 200).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_photo_is_letterboxed_in_frame() {
        let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(80, 40, Rgba([255, 0, 0, 255])));
        let renderer = CardRenderer::new(1).unwrap();
        let canvas = renderer.render(&content(Some(red)));
        // 80x40 fills the 400 px width at 200 px tall, centred: rows 125..325.
        assert!(is_red(canvas.get_pixel(200, 225)));
        assert_eq!(canvas.get_pixel(200, 50).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(200, 400).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_image_position_moves_photo() {
        let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(80, 40, Rgba([255, 0, 0, 255])));
        let renderer = CardRenderer::new(1).unwrap();
        let mut top = content(Some(red));
        top.image_position = 0;
        let canvas = renderer.render(&top);
        assert!(is_red(canvas.get_pixel(200, 10)));
        assert_eq!(canvas.get_pixel(200, 300).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_panel_has_rule_and_gradient() {
        let renderer = CardRenderer::new(1).unwrap();
        let mut card = content(None);
        card.gradient = find_gradient("sunset_amber").unwrap();
        let canvas = renderer.render(&card);
        assert_eq!(canvas.get_pixel(10, 451).0, [255, 255, 255, 255]);
        let corner = canvas.get_pixel(2, 456).0;
        assert!(corner[0] > corner[2], "sunset panel should be warm: {corner:?}");
    }

    #[test]
    fn test_export_png_signature_and_name() {
        let renderer = CardRenderer::new(1).unwrap();
        let mut card = content(None);
        card.name = "Mary  Jane Watson".into();
        let export = renderer.export_png(&card).unwrap();
        assert_eq!(&export.bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(export.filename, "mary-jane-watson.png");
        assert_eq!((export.width, export.height), (400, 600));
    }

    #[test]
    fn test_export_filename_fallback() {
        assert_eq!(export_filename("   "), "card.png");
        assert_eq!(export_filename("Alex"), "alex.png");
        assert_eq!(export_filename("\"; --"), "card.png");
    }

    #[test]
    fn test_export_filename_strips_header_syntax() {
        assert_eq!(
            export_filename("O\"Brien; filename=evil.exe"),
            "obrien-filenameevilexe.png"
        );
        assert_eq!(export_filename("Al\u{1}ex"), "alex.png");
        assert_eq!(export_filename("Anne-Marie  Dupont"), "anne-marie-dupont.png");
    }
}
