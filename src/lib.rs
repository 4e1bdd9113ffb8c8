//! glyphpack - offline glyph texture atlas builder
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  Raster strip (external rasterizer)             │
//! │        ↓                                        │
//! │  Retarget (tight inward crop, baseline)         │
//! │        ↓                                        │
//! │  Shelf pack (measure, then commit)              │
//! │        ↓                                        │
//! │  Rescale (supersample downscale)  [optional]    │
//! │        ↓                                        │
//! │  Validate (overlap + containment)               │
//! │        ↓                                        │
//! │  Drop shadow (repack, blur, regrow) [optional]  │
//! │        ↓                                        │
//! │  Layout file + page PNGs                        │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous and CPU-bound. All failures are fatal and
//! non-retried: fix the configuration or input and rebuild.

pub mod atlas;
pub mod bitmap;
pub mod config;
pub mod error;
pub mod geom;
pub mod glyph;
pub mod layout;
pub mod pack;
pub mod retarget;
pub mod scale;
pub mod shadow;
pub mod store;
pub mod validate;

pub use atlas::{build_atlas, AtlasData, KerningPair, RasterStrip, StripGlyph};
pub use bitmap::{PageBitmap, PixelFormat};
pub use config::{BuilderConfig, LoaderConfig, ShadowConfig};
pub use error::AtlasError;
pub use geom::Rect;
pub use glyph::Glyph;
pub use store::{load_atlas, save_atlas};
