//! Drop-shadow atlas derivation
//!
//! Builds a second atlas from an already-packed glyph set: repacked with
//! extra margin for blur spread, blackened, alpha-blurred, regrown and
//! validated. The result is independent of the source atlas; the source
//! pages are only read.

use log::info;

use crate::atlas::AtlasData;
use crate::bitmap::PageBitmap;
use crate::config::ShadowConfig;
use crate::error::AtlasError;
use crate::glyph::Glyph;
use crate::pack;
use crate::retarget;
use crate::scale;

/// Margin multiplier leaving room for the blur to spread: a box blur of
/// radius r moves alpha up to 3r out over typical pass counts.
const BLUR_MARGIN_FACTOR: u32 = 3;

/// Derive a drop-shadow atlas from a packed glyph set.
///
/// `source_glyphs` must be in canonical character order; the shadow atlas
/// inherits that order. Glyph records are copied, never shared, so the
/// primary atlas is unaffected.
pub fn build_drop_shadow(
    source_pages: &[PageBitmap],
    source_glyphs: &[Glyph],
    config: &ShadowConfig,
    tolerance: u8,
) -> Result<AtlasData, AtlasError> {
    let margin = config.glyph_margin + BLUR_MARGIN_FACTOR * config.blur_radius;
    let (mut pages, mut glyphs) = pack::repack(
        source_glyphs,
        source_pages,
        config.page_width,
        config.page_height,
        margin,
        config.force_power_of_two,
    )?;

    // Bigger or smaller shadows: scale before the blur, regrow after it.
    if config.scale != 1.0 {
        scale::scale_raw(&mut pages, &mut glyphs, config.scale);
    }

    for page in &mut pages {
        page.colour(0, 0, 0);
        page.blur_alpha(config.blur_radius, config.blur_passes);
    }

    // Blur always expands the visible footprint.
    retarget::retarget_all(&pages, &mut glyphs, tolerance);

    let data = AtlasData::from_parts(glyphs, pages, false);
    data.validate()?;
    info!(
        "drop shadow built: {} page(s), blur radius {} x{} passes",
        data.page_count(),
        config.blur_radius,
        config.blur_passes
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;

    fn packed_source() -> (Vec<PageBitmap>, Vec<Glyph>) {
        let mut strip = PageBitmap::new_rgb(40, 12);
        for (x0, w) in [(0, 8), (12, 6), (24, 8)] {
            for y in 2..10 {
                for x in x0..x0 + w {
                    strip.put_rgb(x, y, 255, 255, 255);
                }
            }
        }
        let glyphs = vec![
            Glyph::new('a', 0, Rect::new(0, 2, 8, 8), 1),
            Glyph::new('b', 0, Rect::new(12, 2, 6, 8), 1),
            Glyph::new('c', 0, Rect::new(24, 2, 8, 8), 1),
        ];
        pack::repack(&glyphs, &[strip], 128, 128, 2, false).unwrap()
    }

    #[test]
    fn test_shadow_is_black_and_blurred() {
        let (pages, glyphs) = packed_source();
        let config = ShadowConfig::default();
        let shadow = build_drop_shadow(&pages, &glyphs, &config, 10).unwrap();

        shadow.validate().unwrap();
        assert_eq!(shadow.char_set(), &['a', 'b', 'c']);
        assert!(shadow.drop_shadow().is_none());

        // Every non-transparent pixel is black.
        for page in shadow.pages() {
            for px in page.data().chunks_exact(4) {
                if px[3] > 0 {
                    assert_eq!(&px[0..3], &[0, 0, 0]);
                }
            }
        }
    }

    #[test]
    fn test_shadow_rects_grow_past_source() {
        let (pages, glyphs) = packed_source();
        let config = ShadowConfig::default();
        let shadow = build_drop_shadow(&pages, &glyphs, &config, 10).unwrap();

        // Blur spreads the footprint, so shadow rects are larger than the
        // sharp source rects.
        for (src, ch) in glyphs.iter().zip(['a', 'b', 'c']) {
            let sh = shadow.glyph(ch).unwrap();
            assert!(sh.rect.w > src.rect.w, "{}: {:?} vs {:?}", ch, sh.rect, src.rect);
            assert!(sh.rect.h > src.rect.h);
        }
    }

    #[test]
    fn test_shadow_preserves_y_offset() {
        let (pages, glyphs) = packed_source();
        let shadow = build_drop_shadow(&pages, &glyphs, &ShadowConfig::default(), 10).unwrap();
        assert_eq!(shadow.glyph('a').unwrap().y_offset, 1);
    }
}
