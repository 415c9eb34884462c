use ab_glyph::{point, Font, FontVec, Glyph, GlyphId, OutlinedGlyph, Point, PxScale, ScaleFont};
use image::{GrayImage, Luma, Rgba, RgbaImage};

//把文本转换为字形，再画成一张灰度图
/// Rasterizes `text` into a tightly cropped coverage mask (0 = empty).
/// `None` when no glyph has an outline.
pub fn rasterize_word(text: &str, font: &FontVec, scale: PxScale) -> Option<GrayImage> {
    let scaled_font = font.as_scaled(scale);

    let mut glyphs: Vec<Glyph> = vec![];
    layout_paragraph(scaled_font, point(0.0, 0.0), text, &mut glyphs);

    let outlined: Vec<OutlinedGlyph> = glyphs
        .into_iter()
        .filter_map(|glyph| font.outline_glyph(glyph))
        .collect();

    let (min, max) = outlined.iter().map(|glyph| glyph.px_bounds()).fold(
        None,
        |acc: Option<(Point, Point)>, bounds| match acc {
            None => Some((bounds.min, bounds.max)),
            Some((min, max)) => Some((
                point(min.x.min(bounds.min.x), min.y.min(bounds.min.y)),
                point(max.x.max(bounds.max.x), max.y.max(bounds.max.y)),
            )),
        },
    )?;

    let width = (max.x - min.x).ceil() as u32;
    let height = (max.y - min.y).ceil() as u32;
    if width == 0 || height == 0 {
        return None;
    }

    let mut mask = GrayImage::new(width, height);
    for glyph in outlined {
        let bounds = glyph.px_bounds();
        let (offset_x, offset_y) = (
            (bounds.min.x - min.x) as u32,
            (bounds.min.y - min.y) as u32,
        );

        glyph.draw(|x, y, v| {
            let (final_x, final_y) = (offset_x + x, offset_y + y);
            if final_x < width && final_y < height {
                let coverage = (v.clamp(0.0, 1.0) * 255.0) as u8;
                let px = mask.get_pixel_mut(final_x, final_y);
                px.0[0] = px.0[0].max(coverage);
            }
        });
    }

    Some(mask)
}

/// Marks every covered pixel of `mask`, placed at (`x`, `y`), as taken.
pub fn mark_occupied(occupancy: &mut GrayImage, mask: &GrayImage, x: u32, y: u32) {
    for (mx, my, px) in mask.enumerate_pixels() {
        if px.0[0] == 0 {
            continue;
        }
        let (final_x, final_y) = (x + mx, y + my);
        if final_x < occupancy.width() && final_y < occupancy.height() {
            occupancy.put_pixel(final_x, final_y, Luma([1]));
        }
    }
}

/// Blends `color` over `buffer` weighted by the mask coverage.
pub fn draw_mask_to_rgba_buffer(
    buffer: &mut RgbaImage,
    mask: &GrayImage,
    x: u32,
    y: u32,
    color: Rgba<u8>,
) {
    for (mx, my, px) in mask.enumerate_pixels() {
        let v = px.0[0] as f32 / 255.0;
        if v == 0.0 {
            continue;
        }
        let (final_x, final_y) = (x + mx, y + my);
        if final_x >= buffer.width() || final_y >= buffer.height() {
            continue;
        }

        let target = buffer.get_pixel_mut(final_x, final_y);
        for channel in 0..3 {
            let (old, new) = (target.0[channel] as f32, color.0[channel] as f32);
            target.0[channel] = ((v * new) + (1.0 - v) * old).round() as u8;
        }
        target.0[3] = 0xFF;
    }
}

pub fn layout_paragraph<F, SF>(font: SF, position: Point, text: &str, target: &mut Vec<Glyph>)
where
    F: Font,
    SF: ScaleFont<F>,
{
    let v_advance = font.height() + font.line_gap();
    let mut caret = position + point(0.0, font.ascent());
    let mut last_glyph: Option<GlyphId> = None;
    for c in text.chars() {
        if c.is_control() {
            if c == '\n' {
                //进行换行
                caret = point(position.x, caret.y + v_advance);
            }
            continue;
        }

        let mut glyph = font.scaled_glyph(c);
        if let Some(previous) = last_glyph.take() {
            caret.x += font.kern(previous, glyph.id);
        }
        glyph.position = caret;
        last_glyph = Some(glyph.id);
        caret.x += font.h_advance(glyph.id);

        target.push(glyph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_follows_mask_coverage() {
        let mut mask = GrayImage::new(2, 2);
        mask.put_pixel(1, 0, Luma([200]));
        let mut occupancy = GrayImage::new(4, 4);

        mark_occupied(&mut occupancy, &mask, 2, 3);

        assert_eq!(occupancy.get_pixel(3, 3).0[0], 1);
        assert_eq!(occupancy.pixels().filter(|p| p.0[0] != 0).count(), 1);
    }

    #[test]
    fn blending_uses_coverage() {
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([255]));
        mask.put_pixel(1, 0, Luma([0]));
        let mut buffer = RgbaImage::from_pixel(2, 1, Rgba([255, 255, 255, 255]));

        draw_mask_to_rgba_buffer(&mut buffer, &mask, 0, 0, Rgba([68, 1, 84, 255]));

        assert_eq!(buffer.get_pixel(0, 0), &Rgba([68, 1, 84, 255]));
        assert_eq!(buffer.get_pixel(1, 0), &Rgba([255, 255, 255, 255]));
    }
}
