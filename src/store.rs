//! Atlas persistence
//!
//! One text layout file plus one PNG per page: `<base>.png` for a
//! single-page atlas, `<base>_sheet_<i>.png` otherwise. Loading re-runs
//! the geometry passes (outward regrow, optional rescale, validation);
//! any failure aborts the whole load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use crate::atlas::AtlasData;
use crate::bitmap::PageBitmap;
use crate::config::LoaderConfig;
use crate::layout;
use crate::retarget;
use crate::scale;
use crate::shadow;
use crate::validate;

/// Extension of the text layout file.
const LAYOUT_EXT: &str = ".atlas";

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

fn page_path(base: &Path, index: usize, page_count: usize) -> PathBuf {
    if page_count == 1 {
        with_suffix(base, ".png")
    } else {
        with_suffix(base, &format!("_sheet_{}.png", index))
    }
}

/// Write the layout file and page images next to `base`.
pub fn save_atlas(atlas: &AtlasData, base: impl AsRef<Path>) -> Result<()> {
    let base = base.as_ref();

    let layout_path = with_suffix(base, LAYOUT_EXT);
    let text = layout::serialize(atlas.page_count(), &atlas.glyphs_ordered());
    std::fs::write(&layout_path, text)
        .with_context(|| format!("Failed to write layout: {}", layout_path.display()))?;

    for (i, page) in atlas.pages().iter().enumerate() {
        let path = page_path(base, i, atlas.page_count());
        page.to_rgba_image()
            .save(&path)
            .with_context(|| format!("Failed to write page: {}", path.display()))?;
    }

    info!(
        "atlas saved: {} ({} page(s))",
        layout_path.display(),
        atlas.page_count()
    );
    Ok(())
}

fn load_pages(base: &Path, page_count: usize) -> Result<Vec<PageBitmap>> {
    let mut pages = Vec::with_capacity(page_count);
    for i in 0..page_count {
        let path = page_path(base, i, page_count);
        let img = image::open(&path)
            .with_context(|| format!("Failed to read page: {}", path.display()))?;
        pages.push(PageBitmap::from_rgba_image(img.to_rgba8()));
    }
    Ok(pages)
}

/// Load an atlas saved by [`save_atlas`].
///
/// Glyph rects are regrown against the loaded pages (texture edits may
/// have spread them), then validated. A `downsample_factor` above one
/// rescales the whole atlas up; below one it takes the isolated per-glyph
/// shrink path so neighbouring glyphs cannot bleed into each other.
pub fn load_atlas(base: impl AsRef<Path>, config: &LoaderConfig) -> Result<AtlasData> {
    let base = base.as_ref();
    let tolerance = config.alpha_tolerance;

    let layout_path = with_suffix(base, LAYOUT_EXT);
    let text = std::fs::read_to_string(&layout_path)
        .with_context(|| format!("Failed to read layout: {}", layout_path.display()))?;
    let parsed = layout::deserialize(&text)
        .with_context(|| format!("Failed to parse layout: {}", layout_path.display()))?;

    let mut glyphs = parsed.glyphs;
    let mut pages = load_pages(base, parsed.page_count)?;

    // A hand-edited layout can name a page that does not exist; reject it
    // before the regrow pass indexes into the page list.
    validate::validate_glyphs(&glyphs, &pages)?;
    retarget::retarget_all(&pages, &mut glyphs, tolerance);
    validate::validate_glyphs(&glyphs, &pages)?;

    let factor = config.downsample_factor;
    if factor <= 0.0 {
        bail!("downsample factor must be positive, got {}", factor);
    }
    if factor > 1.0 {
        scale::scale_pages(&mut pages, &mut glyphs, factor, tolerance);
        validate::validate_glyphs(&glyphs, &pages)?;
    } else if factor < 1.0 {
        let (shrunk_pages, shrunk_glyphs) =
            scale::shrink_isolated(&glyphs, &pages, factor, tolerance)?;
        pages = shrunk_pages;
        glyphs = shrunk_glyphs;
    }

    // The monospace flag is not part of the layout format; loaded atlases
    // report false, as the original data is gone.
    let mut data = AtlasData::from_parts(glyphs, pages, false);

    if let Some(shadow_config) = &config.shadow {
        let shadow = shadow::build_drop_shadow(
            data.pages(),
            &data.glyphs_ordered(),
            shadow_config,
            tolerance,
        )?;
        data.set_drop_shadow(shadow);
    }

    info!(
        "atlas loaded: {} ({} glyphs, {} page(s))",
        layout_path.display(),
        data.char_set().len(),
        data.page_count()
    );
    Ok(data)
}
