//! Pixel primitives over `image::RgbaImage`. Coordinates are device pixels
//! as `f32`; rectangles cover the pixels whose centres fall inside them.

use image::{imageops, DynamicImage, Rgba, RgbaImage};

use crate::render::layout::Rect;
use crate::wizard::gradients::GradientTheme;

fn pixel_span(start: f32, end: f32, limit: u32) -> std::ops::Range<u32> {
    let from = start.round().max(0.0) as u32;
    let to = (end.round().max(0.0) as u32).min(limit);
    from.min(to)..to
}

/// Source-over blend of `color` into every pixel of the rectangle.
pub fn blend_rect(canvas: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba<u8>) {
    let alpha = color.0[3] as u32;
    if alpha == 0 {
        return;
    }
    let (width, height) = canvas.dimensions();
    for y in pixel_span(y0, y1, height) {
        for x in pixel_span(x0, x1, width) {
            let dst = canvas.get_pixel_mut(x, y);
            if alpha == 255 {
                *dst = color;
                continue;
            }
            for channel in 0..3 {
                let src = color.0[channel] as u32;
                let old = dst.0[channel] as u32;
                dst.0[channel] = ((src * alpha + old * (255 - alpha)) / 255) as u8;
            }
            dst.0[3] = 255;
        }
    }
}

pub fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    blend_rect(canvas, rect.x, rect.y, rect.right(), rect.bottom(), color);
}

/// Fills `rect` with a top-left → bottom-right gradient. Isolines run
/// parallel to the other diagonal, so both off-diagonal corners sit at 50 %.
pub fn fill_gradient(canvas: &mut RgbaImage, rect: Rect, theme: &GradientTheme) {
    let (width, height) = canvas.dimensions();
    let w = rect.width.max(1.0);
    let h = rect.height.max(1.0);
    for y in pixel_span(rect.y, rect.bottom(), height) {
        for x in pixel_span(rect.x, rect.right(), width) {
            let u = (x as f32 + 0.5 - rect.x) / w;
            let v = (y as f32 + 0.5 - rect.y) / h;
            let c = theme.color_at((u + v) / 2.0);
            canvas.put_pixel(x, y, Rgba([c.0, c.1, c.2, 255]));
        }
    }
}

/// Scales `photo` to `placement` and copies the part inside `clip` onto the
/// canvas.
pub fn draw_photo(canvas: &mut RgbaImage, photo: &DynamicImage, placement: Rect, clip: Rect) {
    let target_w = placement.width.round().max(1.0) as u32;
    let target_h = placement.height.round().max(1.0) as u32;
    let scaled = photo
        .resize_exact(target_w, target_h, imageops::FilterType::Triangle)
        .to_rgba8();

    let (width, height) = canvas.dimensions();
    let origin_x = placement.x.round() as i64;
    let origin_y = placement.y.round() as i64;
    let ys = pixel_span(clip.y.max(placement.y), clip.bottom().min(placement.bottom()), height);
    let xs = pixel_span(clip.x.max(placement.x), clip.right().min(placement.right()), width);

    for y in ys {
        let sy = y as i64 - origin_y;
        if sy < 0 || sy >= target_h as i64 {
            continue;
        }
        for x in xs.clone() {
            let sx = x as i64 - origin_x;
            if sx < 0 || sx >= target_w as i64 {
                continue;
            }
            let src = *scaled.get_pixel(sx as u32, sy as u32);
            blend_rect(canvas, x as f32, y as f32, x as f32 + 1.0, y as f32 + 1.0, src);
        }
    }
}
