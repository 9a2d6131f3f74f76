//! Font handles, fallback chains, and itemization
//!
//! The font *provider* is an external collaborator: it hands the engine an
//! ordered fallback chain ([`FontCollection`]) of concrete face handles
//! implementing [`Font`]. This module owns the character → face decision:
//! walking the chain, recording synthetic-style shortfalls, and grouping a
//! word's characters into same-face runs for the shaper.
//!
//! A [`TtfFont`] backed by `ttf-parser` is provided for the common case of
//! raw TrueType/OpenType bytes; test code and exotic providers can supply
//! their own [`Font`] implementations.

use crate::error::{Error, Result};
use crate::style::{FontFakery, FontStyle};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A concrete font face handle supplied by the font provider.
///
/// Implementations must be cheap to query: `covers` is consulted once per
/// character during fallback resolution.
pub trait Font: Send + Sync {
    /// Process-unique identity, stable for the lifetime of the handle.
    ///
    /// Used for face-table deduplication; obtain values from
    /// [`next_font_id`] so independently constructed handles never collide.
    fn unique_id(&self) -> u32;

    /// Returns true if the face has a glyph for the code point.
    fn covers(&self, ch: char) -> bool;

    /// Raw font file bytes, handed to the shaping collaborator.
    fn data(&self) -> &[u8];

    /// Face index within the font file (for TrueType collections).
    fn index(&self) -> u32;
}

static NEXT_FONT_ID: AtomicU32 = AtomicU32::new(1);

/// Allocates a process-unique font identity.
pub fn next_font_id() -> u32 {
    NEXT_FONT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A [`Font`] backed by parsed TrueType/OpenType data.
pub struct TtfFont {
    data: Arc<Vec<u8>>,
    index: u32,
    id: u32,
    face: ttf_parser::Face<'static>,
}

impl TtfFont {
    /// Parses a face from shared font bytes.
    pub fn from_data(data: Arc<Vec<u8>>, index: u32) -> Result<Self> {
        // SAFETY: the Arc keeps the font bytes alive for the lifetime of the
        // parsed face, which is owned alongside it.
        let static_data: &'static [u8] =
            unsafe { std::mem::transmute::<&[u8], &'static [u8]>(&*data) };
        let face = ttf_parser::Face::parse(static_data, index).map_err(|e| Error::FaceParsing {
            reason: e.to_string(),
        })?;
        Ok(Self {
            data,
            index,
            id: next_font_id(),
            face,
        })
    }

    /// The parsed face, for metrics queries.
    #[inline]
    pub fn face(&self) -> &ttf_parser::Face<'static> {
        &self.face
    }
}

impl Font for TtfFont {
    fn unique_id(&self) -> u32 {
        self.id
    }

    fn covers(&self, ch: char) -> bool {
        self.face.glyph_index(ch).is_some()
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Debug for TtfFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtfFont")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A resolved face together with the synthetic-style flags it needs.
///
/// This is the unit stored in a layout's face table; two entries are the
/// same face only if both the font identity and the fakery match.
#[derive(Clone)]
pub struct FakedFont {
    /// The concrete face.
    pub font: Arc<dyn Font>,
    /// Synthetic style the rendering path must apply.
    pub fakery: FontFakery,
}

impl FakedFont {
    /// Identity comparison used for face-table deduplication.
    #[inline]
    pub fn same_face(&self, other: &FakedFont) -> bool {
        self.font.unique_id() == other.font.unique_id() && self.fakery == other.fakery
    }
}

impl fmt::Debug for FakedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakedFont")
            .field("font", &self.font.unique_id())
            .field("fakery", &self.fakery)
            .finish()
    }
}

/// A group of style variants of one typeface.
#[derive(Default)]
pub struct FontFamily {
    fonts: Vec<(Arc<dyn Font>, FontStyle)>,
}

impl FontFamily {
    /// Creates an empty family.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a style variant to the family.
    pub fn add_font(&mut self, font: Arc<dyn Font>, style: FontStyle) {
        self.fonts.push((font, style));
    }

    /// Returns true if the family has no variants.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Returns true if any variant has a glyph for the code point.
    pub fn covers(&self, ch: char) -> bool {
        self.fonts.iter().any(|(font, _)| font.covers(ch))
    }

    /// Picks the variant closest to the requested style and records the
    /// remaining shortfall as fakery.
    pub fn closest_match(&self, style: FontStyle) -> FakedFont {
        let (font, actual) = self
            .fonts
            .iter()
            .min_by_key(|(_, candidate)| style_distance(style, *candidate))
            .expect("font family is never empty");
        FakedFont {
            font: Arc::clone(font),
            fakery: FontFakery::compute(style, *actual),
        }
    }
}

impl fmt::Debug for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFamily")
            .field("variants", &self.fonts.len())
            .finish()
    }
}

/// Distance between a requested style and a candidate variant.
///
/// Weight distance in steps of 100, with a slant mismatch weighing as two
/// steps, so an exact-slant variant two weights away still wins over a
/// wrong-slant exact weight.
fn style_distance(wanted: FontStyle, actual: FontStyle) -> u32 {
    let weight_gap =
        (i32::from(wanted.weight().value()) - i32::from(actual.weight().value())).unsigned_abs() / 100;
    let slant_gap = if wanted.italic() != actual.italic() { 2 } else { 0 };
    weight_gap + slant_gap
}

/// A maximal group of consecutive characters resolving to one faked face.
///
/// Offsets are byte positions into the itemized string.
#[derive(Debug, Clone)]
pub struct FontRun {
    /// The resolved face for this run.
    pub faked_font: FakedFont,
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

static NEXT_COLLECTION_ID: AtomicU32 = AtomicU32::new(1);

/// An ordered fallback chain of font families.
///
/// Shared between threads via `Arc`; every layout call borrows it for the
/// duration of the call. The collection id participates in word cache keys,
/// so results from different collections never alias.
pub struct FontCollection {
    id: u32,
    families: Vec<FontFamily>,
}

impl FontCollection {
    /// Builds a collection from an ordered family chain.
    ///
    /// The first family is the designated default: characters no family
    /// covers resolve to it (typically rendering a missing-glyph marker).
    pub fn new(families: Vec<FontFamily>) -> Result<Self> {
        if families.is_empty() || families.iter().any(FontFamily::is_empty) {
            return Err(Error::EmptyCollection);
        }
        let id = NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed);
        log::trace!("font collection {} created with {} families", id, families.len());
        Ok(Self { id, families })
    }

    /// Process-unique collection id, suitable as a cache key component.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Resolves one character to a concrete face.
    ///
    /// Walks the chain in order and returns the first family reporting
    /// coverage; falls back to the default family so every character maps
    /// to *some* face.
    pub fn resolve(&self, ch: char, style: FontStyle) -> FakedFont {
        for family in &self.families {
            if family.covers(ch) {
                return family.closest_match(style);
            }
        }
        log::trace!(
            "no family covers U+{:04X}, using collection default",
            ch as u32
        );
        self.families[0].closest_match(style)
    }

    /// The default family's closest match, for font-wide metrics.
    pub fn base_font_faked(&self, style: FontStyle) -> FakedFont {
        self.families[0].closest_match(style)
    }

    /// The default family's closest matching font.
    pub fn base_font(&self, style: FontStyle) -> Arc<dyn Font> {
        self.base_font_faked(style).font
    }

    /// Splits a string into maximal same-face runs.
    ///
    /// Whitespace inherits the preceding character's face so that spaces
    /// never split a run on their own.
    pub fn itemize(&self, text: &str, style: FontStyle) -> Vec<FontRun> {
        let mut runs: Vec<FontRun> = Vec::new();
        for (pos, ch) in text.char_indices() {
            let end = pos + ch.len_utf8();
            if ch.is_whitespace() && !runs.is_empty() {
                if let Some(last) = runs.last_mut() {
                    last.end = end;
                }
                continue;
            }
            let face = self.resolve(ch, style);
            let extends = runs
                .last()
                .is_some_and(|last| last.faked_font.same_face(&face));
            if extends {
                if let Some(last) = runs.last_mut() {
                    last.end = end;
                }
            } else {
                runs.push(FontRun {
                    faked_font: face,
                    start: pos,
                    end,
                });
            }
        }
        runs
    }
}

impl fmt::Debug for FontCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontCollection")
            .field("id", &self.id)
            .field("families", &self.families.len())
            .finish()
    }
}
