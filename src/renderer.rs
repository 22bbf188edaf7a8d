//! Draws the date and menu entries onto a copy of the template background.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use rusttype::{point, Font, Scale};

use crate::layout::{DATE_ANCHOR, PRICE_X, PRODUCT_X, ROW_OFFSET, TEXT_COLOR};
use crate::template::{Face, FontWarning, Template};
use crate::types::MenuRequest;

const BUILTIN_CELL: u32 = 8;

/// A composed board plus anything that went wrong without aborting the render.
#[derive(Debug, Clone)]
pub struct RenderedMenu {
    pub image: RgbImage,
    pub warnings: Vec<FontWarning>,
}

pub fn render_menu(template: &Template, request: &MenuRequest) -> RgbImage {
    let mut img = template.background.clone();
    let fonts = &template.fonts;

    if !request.date.is_empty() {
        let (x, y) = DATE_ANCHOR;
        draw_text(&mut img, &fonts.date, x, y, TEXT_COLOR, &request.date);
    }

    let mut drawn = 0usize;
    for section in &request.sections {
        for entry in &section.entries {
            if entry.product.is_empty() {
                continue;
            }
            let y = entry.y as i32 + ROW_OFFSET;
            draw_text(&mut img, &fonts.product, PRODUCT_X, y, TEXT_COLOR, &entry.product);
            if !entry.price.is_empty() {
                draw_text(&mut img, &fonts.price, PRICE_X, y, TEXT_COLOR, &entry.price);
            }
            drawn += 1;
        }
    }

    log::debug!("Rendered menu with {} entries, date: {:?}", drawn, request.date);
    img
}

/// Draws `text` with its top-left (ascender line for outline fonts) at `x, y`.
pub fn draw_text(img: &mut RgbImage, face: &Face, x: i32, y: i32, color: Rgb<u8>, text: &str) {
    match face {
        Face::Outline { font, px } => draw_outline(img, font, *px, x, y, color, text),
        Face::Builtin { scale } => draw_builtin(img, *scale, x, y, color, text),
    }
}

fn draw_outline(
    img: &mut RgbImage,
    font: &Font<'static>,
    px: f32,
    x: i32,
    y: i32,
    color: Rgb<u8>,
    text: &str,
) {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let origin = point(x as f32, y as f32 + v_metrics.ascent);

    for glyph in font.layout(text, scale, origin) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                blend(img, gx as i32 + bb.min.x, gy as i32 + bb.min.y, color, v);
            });
        }
    }
}

fn draw_builtin(img: &mut RgbImage, scale: u32, x: i32, y: i32, color: Rgb<u8>, text: &str) {
    let scale = scale.max(1) as i32;
    let advance = BUILTIN_CELL as i32 * scale;

    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = builtin_glyph(ch) else {
            continue;
        };
        let cell_x = x + i as i32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..BUILTIN_CELL {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = cell_x + col as i32 * scale;
                let py = y + row as i32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        blend(img, px + dx, py + dy, color, 1.0);
                    }
                }
            }
        }
    }
}

fn builtin_glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

fn blend(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || coverage <= 0.0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= img.width() || y >= img.height() {
        return;
    }
    let a = coverage.min(1.0);
    let inv = 1.0 - a;
    let dst = img.get_pixel_mut(x, y);
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * a + dst.0[c] as f32 * inv).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FontSet;
    use crate::types::{MenuEntry, MenuSection};

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn blank_template() -> Template {
        Template::from_parts(RgbImage::from_pixel(800, 1600, WHITE), FontSet::builtin())
    }

    /// Bounding box of pixels that differ from white inside the given region.
    fn ink_bounds(img: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in y0..y1.min(img.height()) {
            for x in x0..x1.min(img.width()) {
                if *img.get_pixel(x, y) != WHITE {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x), d.max(y)),
                    });
                }
            }
        }
        bounds
    }

    fn request(date: &str, entries: Vec<MenuEntry>) -> MenuRequest {
        MenuRequest {
            date: date.to_string(),
            sections: vec![MenuSection {
                name: "Pães Doces e Macios".to_string(),
                entries,
            }],
        }
    }

    #[test]
    fn empty_request_leaves_background_untouched() {
        let template = blank_template();
        let img = render_menu(&template, &MenuRequest::default());
        assert_eq!(img, template.background);
    }

    #[test]
    fn builtin_text_starts_at_anchor() {
        let mut img = RgbImage::from_pixel(64, 32, WHITE);
        draw_text(&mut img, &Face::Builtin { scale: 1 }, 3, 5, TEXT_COLOR, "P");
        let (x0, y0, _, y1) = ink_bounds(&img, 0, 0, 64, 32).unwrap();
        assert_eq!((x0, y0), (3, 5));
        assert!(y1 < 5 + 8);
        assert_eq!(*img.get_pixel(3, 5), TEXT_COLOR);
    }

    #[test]
    fn text_is_clipped_at_edges() {
        let mut img = RgbImage::from_pixel(10, 10, WHITE);
        draw_text(&mut img, &Face::Builtin { scale: 2 }, -4, 6, TEXT_COLOR, "WWW");
        assert!(ink_bounds(&img, 0, 0, 10, 10).is_some());
    }

    #[test]
    fn accented_characters_have_glyphs() {
        assert!(builtin_glyph('ã').is_some());
        assert_ne!(builtin_glyph('é'), builtin_glyph('?'));
    }

    #[test]
    fn empty_price_draws_product_only() {
        let template = blank_template();
        let img = render_menu(
            &template,
            &request(
                "",
                vec![MenuEntry {
                    product: "Sonho".to_string(),
                    price: String::new(),
                    y: 892,
                }],
            ),
        );
        assert!(ink_bounds(&img, PRODUCT_X as u32, 892, PRICE_X as u32, 930).is_some());
        assert!(ink_bounds(&img, PRICE_X as u32, 0, 800, 1600).is_none());
    }

    #[test]
    fn empty_product_is_never_drawn() {
        let template = blank_template();
        let img = render_menu(
            &template,
            &request(
                "",
                vec![MenuEntry {
                    product: String::new(),
                    price: "R$2".to_string(),
                    y: 927,
                }],
            ),
        );
        assert_eq!(img, template.background);
    }

    #[test]
    fn overlapping_entries_are_accepted() {
        let template = blank_template();
        let entry = |p: &str| MenuEntry {
            product: p.to_string(),
            price: String::new(),
            y: 855,
        };
        let img = render_menu(&template, &request("", vec![entry("AAA"), entry("BBB")]));
        assert!(ink_bounds(&img, 0, 855, 800, 900).is_some());
    }
}
