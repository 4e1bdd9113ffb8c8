//! Atlas data model and build pipeline
//!
//! `AtlasData` is the finished product: packed pages, the character to
//! glyph mapping in canonical order, derived stats, the kerning table and
//! an optional nested drop-shadow atlas. `build_atlas` runs the whole
//! pipeline from a rasterized strip to a validated atlas.

use std::collections::HashMap;

use log::{debug, info};

use crate::bitmap::PageBitmap;
use crate::config::BuilderConfig;
use crate::error::AtlasError;
use crate::geom::{next_power_of_two, Rect};
use crate::glyph::Glyph;
use crate::pack;
use crate::retarget;
use crate::scale;
use crate::shadow;
use crate::validate;

/// Ordered character pair used as the kerning table key.
///
/// Structured rather than a two-char string so the at-most-one-entry
/// invariant falls out of the map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KerningPair {
    pub left: char,
    pub right: char,
}

/// One glyph entry handed over by the rasterizer: a character, its
/// approximate rect within the strip, and whether recoloring is forbidden.
#[derive(Debug, Clone, Copy)]
pub struct StripGlyph {
    pub character: char,
    pub rect: Rect,
    pub suppress_colouring: bool,
}

impl StripGlyph {
    pub fn new(character: char, rect: Rect) -> Self {
        Self {
            character,
            rect,
            suppress_colouring: false,
        }
    }
}

/// Rasterizer handoff: one opaque strip bitmap with all glyphs laid out
/// left-to-right in character-set order, plus their approximate rects.
#[derive(Debug)]
pub struct RasterStrip {
    pub bitmap: PageBitmap,
    pub glyphs: Vec<StripGlyph>,
}

/// A packed glyph atlas: pages, mapping, stats, kerning and shadow.
#[derive(Debug)]
pub struct AtlasData {
    /// Canonical character order for iteration and serialization.
    char_set: Vec<char>,
    glyphs: HashMap<char, Glyph>,
    pages: Vec<PageBitmap>,
    mean_glyph_width: f32,
    max_glyph_height: i32,
    naturally_monospaced: bool,
    kerning: HashMap<KerningPair, i32>,
    shadow: Option<Box<AtlasData>>,
}

impl AtlasData {
    /// Assemble an atlas from packed parts. The glyph order defines the
    /// canonical character sequence; stats are computed here.
    pub(crate) fn from_parts(
        glyphs: Vec<Glyph>,
        pages: Vec<PageBitmap>,
        naturally_monospaced: bool,
    ) -> Self {
        let char_set: Vec<char> = glyphs.iter().map(|g| g.character).collect();
        let map: HashMap<char, Glyph> = glyphs.into_iter().map(|g| (g.character, g)).collect();
        let mut data = Self {
            char_set,
            glyphs: map,
            pages,
            mean_glyph_width: 0.0,
            max_glyph_height: 0,
            naturally_monospaced,
            kerning: HashMap::new(),
            shadow: None,
        };
        data.recompute_stats();
        data
    }

    pub fn char_set(&self) -> &[char] {
        &self.char_set
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Glyph records in canonical character order.
    pub fn glyphs_ordered(&self) -> Vec<Glyph> {
        self.char_set
            .iter()
            .filter_map(|c| self.glyphs.get(c).copied())
            .collect()
    }

    pub fn pages(&self) -> &[PageBitmap] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn mean_glyph_width(&self) -> f32 {
        self.mean_glyph_width
    }

    pub fn max_glyph_height(&self) -> i32 {
        self.max_glyph_height
    }

    /// Whether the source glyph set was detected as monospaced
    /// (pre-crop widths within 5% of the widest).
    pub fn naturally_monospaced(&self) -> bool {
        self.naturally_monospaced
    }

    pub fn drop_shadow(&self) -> Option<&AtlasData> {
        self.shadow.as_deref()
    }

    pub(crate) fn set_drop_shadow(&mut self, shadow: AtlasData) {
        self.shadow = Some(Box::new(shadow));
    }

    /// Replace the kerning table. At most one entry per ordered pair; a
    /// later entry for the same pair wins.
    pub fn set_kerning_pairs(&mut self, pairs: impl IntoIterator<Item = (KerningPair, i32)>) {
        self.kerning = pairs.into_iter().collect();
    }

    /// Horizontal adjustment for an ordered character pair, 0 when absent.
    pub fn kerning_adjustment(&self, left: char, right: char) -> i32 {
        self.kerning
            .get(&KerningPair { left, right })
            .copied()
            .unwrap_or(0)
    }

    /// UV rectangle of a glyph as `(pos, size)` in `[0,1]` texture space.
    ///
    /// Containment validation guarantees the result never leaves `[0,1]`.
    pub fn uv(&self, ch: char) -> Option<([f32; 2], [f32; 2])> {
        let glyph = self.glyphs.get(&ch)?;
        let page = &self.pages[glyph.page];
        let pw = page.width() as f32;
        let ph = page.height() as f32;
        Some((
            [glyph.rect.x as f32 / pw, glyph.rect.y as f32 / ph],
            [glyph.rect.w as f32 / pw, glyph.rect.h as f32 / ph],
        ))
    }

    /// Recompute mean glyph width and max glyph height from the mapping.
    fn recompute_stats(&mut self) {
        let count = self.glyphs.len().max(1);
        self.mean_glyph_width =
            self.glyphs.values().map(|g| g.rect.w).sum::<i32>() as f32 / count as f32;
        self.max_glyph_height = self.glyphs.values().map(|g| g.rect.h).max().unwrap_or(0);
    }

    /// Check non-overlap and containment over the whole glyph set, in
    /// canonical order so the first offending pair is deterministic.
    pub fn validate(&self) -> Result<(), AtlasError> {
        validate::validate_glyphs(&self.glyphs_ordered(), &self.pages)
    }
}

/// All glyph widths within 5% of the widest, measured on the approximate
/// pre-crop sizes. Downstream rendering depends on this exact heuristic.
fn is_monospaced(strip_glyphs: &[StripGlyph]) -> bool {
    let max_w = strip_glyphs.iter().map(|g| g.rect.w).max().unwrap_or(0);
    let min_w = strip_glyphs.iter().map(|g| g.rect.w).min().unwrap_or(0);
    ((max_w - min_w) as f32) < max_w as f32 * 0.05
}

/// Build a packed, validated atlas from a rasterized glyph strip.
///
/// Pipeline: config validation, tight inward crop with baseline capture,
/// two-pass repack, supersample downscale, stats, optional drop shadow,
/// final overlap/containment validation. The kerning table is attached
/// afterwards by the caller via [`AtlasData::set_kerning_pairs`].
pub fn build_atlas(strip: &RasterStrip, config: &BuilderConfig) -> Result<AtlasData, AtlasError> {
    let levels = config.super_sample_levels;
    if config.force_power_of_two && levels != next_power_of_two(levels) {
        return Err(AtlasError::SuperSampleNotPowerOfTwo(levels));
    }
    if levels < 1 || levels > 8 {
        return Err(AtlasError::SuperSampleRange(levels));
    }

    // The strip was rasterized at the supersampled size, so page capacity
    // and margin scale with it.
    let page_width = config.page_width * levels;
    let page_height = config.page_height * levels;
    let glyph_margin = config.glyph_margin * levels;
    let tolerance = config.alpha_tolerance;

    info!(
        "building atlas: {} glyphs, page {}x{}, margin {}, supersample {}",
        strip.glyphs.len(),
        page_width,
        page_height,
        glyph_margin,
        levels
    );

    let monospaced = is_monospaced(&strip.glyphs);

    // Tight crop against the strip; the first pass also fixes the baseline
    // by recording each glyph's top Y.
    let mut initial: Vec<Glyph> = strip
        .glyphs
        .iter()
        .map(|sg| {
            let rect = retarget::crop_inward(&strip.bitmap, sg.rect, tolerance);
            Glyph {
                character: sg.character,
                page: 0,
                rect,
                y_offset: rect.y,
                suppress_colouring: sg.suppress_colouring,
            }
        })
        .collect();

    // Normalize offsets so the tallest glyph sits at one pixel of
    // breathing room.
    let min_y_offset = initial.iter().map(|g| g.y_offset).min().unwrap_or(0) - 1;
    for g in &mut initial {
        g.y_offset -= min_y_offset;
    }

    let strip_pages = std::slice::from_ref(&strip.bitmap);
    let (mut pages, mut glyphs) = pack::repack(
        &initial,
        strip_pages,
        page_width,
        page_height,
        glyph_margin,
        config.force_power_of_two,
    )?;

    if levels != 1 {
        scale::scale_pages(&mut pages, &mut glyphs, 1.0 / levels as f32, tolerance);
    }

    let mut data = AtlasData::from_parts(glyphs, pages, monospaced);

    if let Some(shadow_config) = &config.shadow {
        debug!("deriving drop-shadow atlas");
        let shadow = shadow::build_drop_shadow(
            data.pages(),
            &data.glyphs_ordered(),
            shadow_config,
            tolerance,
        )?;
        data.set_drop_shadow(shadow);
    }

    data.validate()?;
    info!(
        "atlas built: {} page(s), mean width {:.1}, max height {}",
        data.page_count(),
        data.mean_glyph_width(),
        data.max_glyph_height()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_strip() -> RasterStrip {
        // Four glyph cells of 12x16 in a 48x16 strip; 'c' is blank like a
        // space character.
        let mut bitmap = PageBitmap::new_rgb(48, 16);
        let cells = [
            ('a', 0, 2, 10),
            ('b', 12, 4, 8),
            ('c', 24, 0, 0),
            ('d', 36, 1, 12),
        ];
        for &(_, x0, top, h) in &cells {
            for y in top..top + h {
                for x in x0 + 1..x0 + 11 {
                    bitmap.put_rgb(x, y, 255, 255, 255);
                }
            }
        }
        RasterStrip {
            bitmap,
            glyphs: cells
                .iter()
                .map(|&(c, x0, _, _)| StripGlyph::new(c, Rect::new(x0, 0, 12, 16)))
                .collect(),
        }
    }

    #[test]
    fn test_build_single_page() {
        let data = build_atlas(&test_strip(), &BuilderConfig::default()).unwrap();
        assert_eq!(data.page_count(), 1);
        assert_eq!(data.char_set(), &['a', 'b', 'c', 'd']);
        data.validate().unwrap();
        // Blank glyph keeps a minimal rect.
        let c = data.glyph('c').unwrap();
        assert!(c.rect.w >= 1 && c.rect.h >= 1);
    }

    #[test]
    fn test_baseline_normalization() {
        let data = build_atlas(&test_strip(), &BuilderConfig::default()).unwrap();
        // The blank 'c' collapses to the strip top (y 0), so after the
        // min-minus-one shift the smallest offset is exactly 1.
        let min = data
            .glyphs_ordered()
            .iter()
            .map(|g| g.y_offset)
            .min()
            .unwrap();
        assert_eq!(min, 1);
    }

    #[test]
    fn test_supersample_out_of_range_rejected() {
        let config = BuilderConfig {
            super_sample_levels: 9,
            ..Default::default()
        };
        assert!(matches!(
            build_atlas(&test_strip(), &config),
            Err(AtlasError::SuperSampleRange(9))
        ));
    }

    #[test]
    fn test_supersample_three_with_pot_rejected() {
        let config = BuilderConfig {
            super_sample_levels: 3,
            force_power_of_two: true,
            ..Default::default()
        };
        assert!(matches!(
            build_atlas(&test_strip(), &config),
            Err(AtlasError::SuperSampleNotPowerOfTwo(3))
        ));
    }

    #[test]
    fn test_uv_within_unit_square() {
        let data = build_atlas(&test_strip(), &BuilderConfig::default()).unwrap();
        for &ch in data.char_set() {
            let (pos, size) = data.uv(ch).unwrap();
            assert!(pos[0] >= 0.0 && pos[1] >= 0.0);
            assert!(pos[0] + size[0] <= 1.0 && pos[1] + size[1] <= 1.0);
        }
    }

    #[test]
    fn test_monospace_heuristic() {
        // Equal pre-crop cell widths: monospaced even though inked widths
        // differ.
        let data = build_atlas(&test_strip(), &BuilderConfig::default()).unwrap();
        assert!(data.naturally_monospaced());

        let strip = test_strip();
        let mut glyphs = strip.glyphs.clone();
        glyphs[0].rect.w = 20; // one wide cell breaks the 5% band
        let strip = RasterStrip {
            bitmap: strip.bitmap,
            glyphs,
        };
        let data = build_atlas(&strip, &BuilderConfig::default()).unwrap();
        assert!(!data.naturally_monospaced());
    }

    #[test]
    fn test_kerning_lookup_defaults_to_zero() {
        let mut data = build_atlas(&test_strip(), &BuilderConfig::default()).unwrap();
        data.set_kerning_pairs([(KerningPair { left: 'a', right: 'b' }, -2)]);
        assert_eq!(data.kerning_adjustment('a', 'b'), -2);
        assert_eq!(data.kerning_adjustment('b', 'a'), 0);
        assert_eq!(data.kerning_adjustment('x', 'y'), 0);
    }
}
