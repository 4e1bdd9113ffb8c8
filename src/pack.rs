//! Two-pass shelf packer
//!
//! Places glyph rects into fixed-capacity RGBA pages in input order with a
//! left-to-right shelf cursor. The placement loop runs twice with identical
//! decisions: a measurement pass (no blits) determines the minimal extent
//! the final page needs, then the commit pass allocates pages and performs
//! the real blits, sizing the last page at `min(requested, measured)`.

use log::{debug, warn};

use crate::bitmap::{PageBitmap, PixelFormat};
use crate::error::AtlasError;
use crate::geom::{next_power_of_two, Rect};
use crate::glyph::Glyph;

/// Repack glyphs into fresh pages.
///
/// Source glyphs are tagged with the index of their source page; the blit
/// rule follows the source format (RGBA copies color+alpha, opaque RGB is
/// treated as a luminance mask). Returns the page sequence and rewritten
/// glyph records in input order.
///
/// Fails with [`AtlasError::PackingOverflow`] once placement attempts
/// exceed ten times the glyph count: a glyph that cannot fit even on an
/// empty page is a configuration error, not something to retry.
pub fn repack(
    source_glyphs: &[Glyph],
    source_pages: &[PageBitmap],
    page_width: u32,
    page_height: u32,
    margin: u32,
    power_of_two: bool,
) -> Result<(Vec<PageBitmap>, Vec<Glyph>), AtlasError> {
    let m = margin as i32;
    let sheet_w = page_width as i32;
    let sheet_h = page_height as i32;

    let max_glyph_h = source_glyphs.iter().map(|g| g.rect.h).max().unwrap_or(0);

    let mut pages: Vec<PageBitmap> = Vec::new();
    let mut dest: Vec<Glyph> = Vec::with_capacity(source_glyphs.len());

    // Extent the final page needs, recorded by the measurement pass.
    let mut final_page_index = 0usize;
    let mut final_required_w = 0i32;
    let mut final_required_h = 0i32;

    for pass in 0..2 {
        let measure = pass == 0;

        let mut x = 0i32;
        let mut y = 0i32;
        let mut row_h = 0i32;
        let mut total_tries = 0usize;
        let mut current_page: Option<usize> = None;

        let mut i = 0;
        while i < source_glyphs.len() {
            if !measure && current_page.is_none() {
                let (w, h) = if pages.len() == final_page_index {
                    // Last page: crop to the measured extent in advance.
                    let mut w = final_required_w.max(1) as u32;
                    let mut h = final_required_h.max(1) as u32;
                    if power_of_two {
                        w = next_power_of_two(w);
                        h = next_power_of_two(h);
                    }
                    (w.min(page_width), h.min(page_height))
                } else {
                    (page_width, page_height)
                };
                debug!("opening page {} ({}x{})", pages.len(), w, h);
                pages.push(PageBitmap::new_rgba(w, h));
                current_page = Some(pages.len() - 1);
            }

            total_tries += 1;
            if total_tries > 10 * source_glyphs.len() {
                warn!(
                    "placement budget exhausted at glyph '{}' ({} tries)",
                    source_glyphs[i].character, total_tries
                );
                return Err(AtlasError::PackingOverflow);
            }

            let src = source_glyphs[i];
            let rect = src.rect;

            if x + rect.w + 2 * m <= sheet_w && y + rect.h + 2 * m <= sheet_h {
                if measure {
                    final_required_w = final_required_w.max(x + rect.w + 2 * m);
                    final_required_h = final_required_h.max(y + rect.h + 2 * m);
                } else {
                    let page_idx = current_page.expect("page opened above");
                    let source = &source_pages[src.page];
                    match source.format() {
                        PixelFormat::Rgba => pages[page_idx].blit(source, rect, x + m, y + m),
                        PixelFormat::Rgb => pages[page_idx].blit_mask(source, rect, x + m, y + m),
                    }
                    dest.push(Glyph {
                        character: src.character,
                        page: page_idx,
                        rect: Rect::new(x + m, y + m, rect.w, rect.h),
                        y_offset: src.y_offset,
                        suppress_colouring: src.suppress_colouring,
                    });
                }

                x += rect.w + 2 * m;
                row_h = row_h.max(rect.h);
                i += 1;
                continue;
            }

            // No room at the cursor: wrap to a new shelf and retry the same
            // glyph. The new-page test uses the tallest glyph in the whole
            // set so a row is never opened that it could not share.
            y += row_h + 2 * m;
            x = 0;
            row_h = 0;

            if y + max_glyph_h + 2 * m > sheet_h {
                y = 0;
                if measure {
                    final_required_w = 0;
                    final_required_h = 0;
                    final_page_index += 1;
                } else {
                    current_page = None;
                }
            }
        }
    }

    debug!(
        "packed {} glyphs into {} page(s)",
        source_glyphs.len(),
        pages.len()
    );
    Ok((pages, dest))
}
