//! glyphrun — word-caching, bidi-aware glyph layout
//!
//! This crate turns a UTF-16 buffer range, a font fallback chain, and
//! style/paint attributes into positioned glyphs, per-code-unit advances,
//! and an aggregate bounding box. Shaping itself (performed by a
//! [`Shaper`] collaborator, `rustybuzz` by default) is memoized at word
//! granularity, so re-measuring and re-laying-out edited text is cheap.
//!
//! # Example
//!
//! ```rust,ignore
//! use glyphrun::{BidiFlags, FontStyle, Layout, LayoutEngine, Paint};
//!
//! let engine = LayoutEngine::shared();
//! let buf: Vec<u16> = "Hello שלום".encode_utf16().collect();
//!
//! let mut layout = Layout::new();
//! engine.layout(
//!     &mut layout,
//!     &buf,
//!     0,
//!     buf.len(),
//!     BidiFlags::DefaultLtr,
//!     FontStyle::default(),
//!     &Paint::new(14.0),
//!     &collection,
//! )?;
//!
//! println!("{} glyphs, {}px", layout.glyph_count(), layout.advance());
//! ```

pub mod bidi;
pub mod bitmap;
pub mod cache;
pub mod codebook;
pub mod error;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod shape;
pub mod style;

pub use bidi::BidiFlags;
pub use bitmap::{Bitmap, GlyphBitmap};
pub use cache::{LayoutCache, LayoutCacheKey, WORD_CACHE_SIZE};
pub use codebook::{Codebook, CODEBOOK_LEN, PRINTABLE_ASCII};
pub use error::{Error, Result};
pub use font::{next_font_id, FakedFont, Font, FontCollection, FontFamily, FontRun, TtfFont};
pub use geometry::Rect;
pub use layout::{purge_caches, Layout, LayoutEngine, LayoutGlyph};
pub use shape::{HbShaper, ShapedGlyph, ShapedWord, Shaper};
pub use style::{FontFakery, FontStyle, FontWeight, Paint};

#[allow(deprecated)]
pub use layout::init;
