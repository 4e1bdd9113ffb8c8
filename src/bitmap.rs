//! Owned pixel buffers for atlas pages
//!
//! Every scanning algorithm in the pipeline operates on these explicitly
//! owned buffers with a known stride and format. Foreign surface memory
//! (rasterizer output, GPU staging) must be copied in first, never aliased.

use image::{ImageBuffer, Rgba};
use log::warn;

/// Pixel layout of a page buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 24-bit opaque RGB. Used by the rasterizer strip: white glyphs on a
    /// black background, where an empty pixel is an exact background match.
    Rgb,
    /// 32-bit RGBA. Used by packed pages: an empty pixel is one whose alpha
    /// does not exceed the tolerance.
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// An owned page bitmap: width, height, format and raw bytes.
#[derive(Debug, Clone)]
pub struct PageBitmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PageBitmap {
    /// Opaque RGB buffer cleared to black (all-empty background).
    pub fn new_rgb(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            format: PixelFormat::Rgb,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    /// RGBA page cleared to white but fully transparent, so later
    /// recoloring multiplies against a neutral base.
    pub fn new_rgba(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let mut data = vec![255u8; width as usize * height as usize * 4];
        for px in data.chunks_exact_mut(4) {
            px[3] = 0;
        }
        Self {
            width,
            height,
            format: PixelFormat::Rgba,
            data,
        }
    }

    /// Wrap raw bytes copied out of a foreign surface.
    ///
    /// Returns None if the byte count does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * format.bytes_per_pixel() {
            warn!(
                "PageBitmap::from_raw: {} bytes for {}x{} {:?}",
                data.len(),
                width,
                height,
                format
            );
            return None;
        }
        Some(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw bytes, row-major, `stride()` bytes per row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.stride() + x as usize * self.format.bytes_per_pixel()
    }

    /// Empty-pixel predicate used by all retargeting scans.
    ///
    /// Out-of-bounds coordinates count as empty so edge scans terminate at
    /// the buffer boundary. RGB buffers match the black background exactly;
    /// RGBA buffers compare alpha against `tolerance`.
    pub fn is_empty_pixel(&self, x: i32, y: i32, tolerance: u8) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return true;
        }
        let i = self.offset(x, y);
        match self.format {
            PixelFormat::Rgb => self.data[i] == 0 && self.data[i + 1] == 0 && self.data[i + 2] == 0,
            PixelFormat::Rgba => self.data[i + 3] <= tolerance,
        }
    }

    /// Copy an RGBA region from `src` into this RGBA buffer at (dx, dy).
    ///
    /// Color and alpha are copied verbatim. Rows and columns falling
    /// outside either buffer are skipped.
    pub fn blit(&mut self, src: &PageBitmap, src_rect: crate::geom::Rect, dx: i32, dy: i32) {
        debug_assert_eq!(src.format, PixelFormat::Rgba);
        debug_assert_eq!(self.format, PixelFormat::Rgba);

        for row in 0..src_rect.h {
            let sy = src_rect.y + row;
            let ty = dy + row;
            if sy < 0 || ty < 0 || sy >= src.height as i32 || ty >= self.height as i32 {
                continue;
            }
            for col in 0..src_rect.w {
                let sx = src_rect.x + col;
                let tx = dx + col;
                if sx < 0 || tx < 0 || sx >= src.width as i32 || tx >= self.width as i32 {
                    continue;
                }
                let si = src.offset(sx, sy);
                let ti = self.offset(tx, ty);
                self.data[ti..ti + 4].copy_from_slice(&src.data[si..si + 4]);
            }
        }
    }

    /// Copy an opaque RGB region into this RGBA buffer as a luminance mask.
    ///
    /// Alpha is synthesized from the source intensity and color is written
    /// as opaque white, so the glyph can be recolored at draw time.
    pub fn blit_mask(&mut self, src: &PageBitmap, src_rect: crate::geom::Rect, dx: i32, dy: i32) {
        debug_assert_eq!(src.format, PixelFormat::Rgb);
        debug_assert_eq!(self.format, PixelFormat::Rgba);

        for row in 0..src_rect.h {
            let sy = src_rect.y + row;
            let ty = dy + row;
            if sy < 0 || ty < 0 || sy >= src.height as i32 || ty >= self.height as i32 {
                continue;
            }
            for col in 0..src_rect.w {
                let sx = src_rect.x + col;
                let tx = dx + col;
                if sx < 0 || tx < 0 || sx >= src.width as i32 || tx >= self.width as i32 {
                    continue;
                }
                let si = src.offset(sx, sy);
                let ti = self.offset(tx, ty);
                let lum = (src.data[si] as u32 + src.data[si + 1] as u32 + src.data[si + 2] as u32)
                    / 3;
                self.data[ti] = 255;
                self.data[ti + 1] = 255;
                self.data[ti + 2] = 255;
                self.data[ti + 3] = lum as u8;
            }
        }
    }

    /// Rewrite the RGB channels of every pixel, preserving alpha.
    ///
    /// The shadow pipeline uses this to blacken a page before blurring.
    pub fn colour(&mut self, r: u8, g: u8, b: u8) {
        debug_assert_eq!(self.format, PixelFormat::Rgba);
        for px in self.data.chunks_exact_mut(4) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }

    /// Box-blur the alpha channel, leaving color untouched.
    ///
    /// Each pass runs a horizontal then a vertical moving average with a
    /// `2 * radius + 1` window, clamped at the buffer edges.
    pub fn blur_alpha(&mut self, radius: u32, passes: u32) {
        debug_assert_eq!(self.format, PixelFormat::Rgba);
        if radius == 0 || passes == 0 {
            return;
        }

        let w = self.width as i32;
        let h = self.height as i32;
        let r = radius as i32;
        let window = (2 * r + 1) as u32;
        let mut scratch = vec![0u8; w as usize * h as usize];

        for _ in 0..passes {
            // Horizontal.
            for y in 0..h {
                for x in 0..w {
                    let mut sum = 0u32;
                    for dx in -r..=r {
                        let sx = (x + dx).clamp(0, w - 1);
                        sum += self.data[self.offset(sx, y) + 3] as u32;
                    }
                    scratch[(y * w + x) as usize] = (sum / window) as u8;
                }
            }
            for y in 0..h {
                for x in 0..w {
                    let i = self.offset(x, y);
                    self.data[i + 3] = scratch[(y * w + x) as usize];
                }
            }

            // Vertical.
            for y in 0..h {
                for x in 0..w {
                    let mut sum = 0u32;
                    for dy in -r..=r {
                        let sy = (y + dy).clamp(0, h - 1);
                        sum += self.data[self.offset(x, sy) + 3] as u32;
                    }
                    scratch[(y * w + x) as usize] = (sum / window) as u8;
                }
            }
            for y in 0..h {
                for x in 0..w {
                    let i = self.offset(x, y);
                    self.data[i + 3] = scratch[(y * w + x) as usize];
                }
            }
        }
    }

    /// Resample this buffer to `new_width` x `new_height`.
    ///
    /// Lanczos3 resize; dimensions are clamped to at least one pixel.
    pub fn resample(&mut self, new_width: u32, new_height: u32) {
        let new_width = new_width.max(1);
        let new_height = new_height.max(1);
        if new_width == self.width && new_height == self.height {
            return;
        }

        match self.format {
            PixelFormat::Rgba => {
                let src: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(self.width, self.height, std::mem::take(&mut self.data))
                        .expect("buffer length matches dimensions");
                let resized = image::imageops::resize(
                    &src,
                    new_width,
                    new_height,
                    image::imageops::FilterType::Lanczos3,
                );
                self.data = resized.into_raw();
            }
            PixelFormat::Rgb => {
                let src: ImageBuffer<image::Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(self.width, self.height, std::mem::take(&mut self.data))
                        .expect("buffer length matches dimensions");
                let resized = image::imageops::resize(
                    &src,
                    new_width,
                    new_height,
                    image::imageops::FilterType::Lanczos3,
                );
                self.data = resized.into_raw();
            }
        }
        self.width = new_width;
        self.height = new_height;
    }

    /// Convert to an owned `image::RgbaImage` for PNG output.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        match self.format {
            PixelFormat::Rgba => {
                ImageBuffer::from_raw(self.width, self.height, self.data.clone())
                    .expect("buffer length matches dimensions")
            }
            PixelFormat::Rgb => {
                let mut out = image::RgbaImage::new(self.width, self.height);
                for (x, y, px) in out.enumerate_pixels_mut() {
                    let i = y as usize * self.stride() + x as usize * 3;
                    *px = Rgba([self.data[i], self.data[i + 1], self.data[i + 2], 255]);
                }
                out
            }
        }
    }

    /// Wrap a decoded RGBA image as a page buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Rgba,
            data: img.into_raw(),
        }
    }

    /// Write an opaque RGB pixel. Test and rasterizer-shim helper.
    pub fn put_rgb(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) {
        debug_assert_eq!(self.format, PixelFormat::Rgb);
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = self.offset(x, y);
        self.data[i] = r;
        self.data[i + 1] = g;
        self.data[i + 2] = b;
    }

    /// Read the alpha channel of an RGBA pixel (0 outside the buffer).
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        debug_assert_eq!(self.format, PixelFormat::Rgba);
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[self.offset(x, y) + 3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;

    #[test]
    fn test_new_rgba_is_transparent_white() {
        let page = PageBitmap::new_rgba(4, 4);
        assert_eq!(&page.data()[0..4], &[255, 255, 255, 0]);
        assert!(page.is_empty_pixel(0, 0, 0));
    }

    #[test]
    fn test_empty_pixel_out_of_bounds() {
        let page = PageBitmap::new_rgb(4, 4);
        assert!(page.is_empty_pixel(-1, 0, 0));
        assert!(page.is_empty_pixel(4, 0, 0));
        assert!(page.is_empty_pixel(0, 4, 0));
    }

    #[test]
    fn test_blit_mask_synthesizes_white_and_alpha() {
        let mut strip = PageBitmap::new_rgb(4, 4);
        strip.put_rgb(1, 1, 120, 120, 120);
        let mut page = PageBitmap::new_rgba(4, 4);
        page.blit_mask(&strip, Rect::new(0, 0, 4, 4), 0, 0);

        let i = page.offset(1, 1);
        assert_eq!(&page.data()[i..i + 4], &[255, 255, 255, 120]);
        // Background stays transparent.
        assert_eq!(page.alpha_at(0, 0), 0);
    }

    #[test]
    fn test_colour_preserves_alpha() {
        let mut strip = PageBitmap::new_rgb(2, 2);
        strip.put_rgb(0, 0, 200, 200, 200);
        let mut page = PageBitmap::new_rgba(2, 2);
        page.blit_mask(&strip, Rect::new(0, 0, 2, 2), 0, 0);
        page.colour(0, 0, 0);

        let i = page.offset(0, 0);
        assert_eq!(&page.data()[i..i + 4], &[0, 0, 0, 200]);
    }

    #[test]
    fn test_blur_alpha_spreads_footprint() {
        let mut page = PageBitmap::new_rgba(9, 9);
        let i = page.offset(4, 4);
        page.data[i + 3] = 255;
        page.blur_alpha(2, 1);

        assert!(page.alpha_at(4, 4) > 0);
        assert!(page.alpha_at(2, 4) > 0, "blur must spread sideways");
        assert!(page.alpha_at(4, 6) > 0, "blur must spread vertically");
        assert_eq!(page.alpha_at(8, 8), 0);
    }

    #[test]
    fn test_resample_clamps_to_one_pixel() {
        let mut page = PageBitmap::new_rgba(8, 8);
        page.resample(0, 0);
        assert_eq!((page.width(), page.height()), (1, 1));
    }
}
