//! Layout engine: run segmentation, word caching, glyph accumulation
//!
//! The entry points live on [`LayoutEngine`]. A call resolves the range's
//! directional runs, splits each run into cache units, resolves faces per
//! character, and merges memoized or freshly shaped word fragments into the
//! destination [`Layout`] — cache hits and misses converge in
//! [`Layout::append`] and are indistinguishable in the output.
//!
//! Input is UTF-16 code units; advances are indexed by code unit, in
//! logical (buffer) order, while glyph positions accumulate in visual
//! order.

use crate::bidi::{visual_runs, BidiFlags};
use crate::cache::{LayoutCache, LayoutCacheKey};
use crate::codebook::Codebook;
use crate::error::{Error, Result};
use crate::font::{FakedFont, Font, FontCollection};
use crate::geometry::Rect;
use crate::shape::{HbShaper, Shaper};
use crate::style::{FontFakery, FontStyle, Paint};
use std::ops::Range;
use std::sync::{Arc, OnceLock};

/// One positioned glyph.
///
/// `font_ix` indexes the owning layout's face table rather than holding a
/// font handle, keeping glyph records small; the table is deduplicated per
/// layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutGlyph {
    /// Index into the owning layout's face table.
    pub font_ix: usize,
    /// Glyph id within that face.
    pub glyph_id: u32,
    /// X position in pixels.
    pub x: f32,
    /// Y position in pixels, positive below the baseline.
    pub y: f32,
}

/// The result of laying out one buffer range.
///
/// Owned by a single thread at a time; reuse between calls with
/// [`Layout::reset`], which keeps backing storage. Glyphs are stored in
/// visual order, advances in logical order.
#[derive(Debug, Default)]
pub struct Layout {
    glyphs: Vec<LayoutGlyph>,
    advances: Vec<f32>,
    faces: Vec<FakedFont>,
    advance: f32,
    bounds: Rect,
    codebook: Option<&'static Codebook>,
}

impl Layout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the layout for reuse without releasing backing storage.
    pub fn reset(&mut self) {
        self.glyphs.clear();
        self.advances.clear();
        self.faces.clear();
        self.advance = 0.0;
        self.bounds = Rect::EMPTY;
        self.codebook = None;
    }

    /// Number of positioned glyphs.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// The positioned glyphs, in visual order.
    pub fn glyphs(&self) -> &[LayoutGlyph] {
        &self.glyphs
    }

    /// The font of glyph `i`.
    pub fn font(&self, i: usize) -> &Arc<dyn Font> {
        &self.faces[self.glyphs[i].font_ix].font
    }

    /// The synthetic-style flags of glyph `i`.
    pub fn fakery(&self, i: usize) -> FontFakery {
        self.faces[self.glyphs[i].font_ix].fakery
    }

    /// The glyph id of glyph `i`.
    pub fn glyph_id(&self, i: usize) -> u32 {
        self.glyphs[i].glyph_id
    }

    /// The x position of glyph `i`.
    pub fn x(&self, i: usize) -> f32 {
        self.glyphs[i].x
    }

    /// The y position of glyph `i`.
    pub fn y(&self, i: usize) -> f32 {
        self.glyphs[i].y
    }

    /// The deduplicated face table.
    pub fn faces(&self) -> &[FakedFont] {
        &self.faces
    }

    /// Aggregate advance of the laid-out range.
    pub fn advance(&self) -> f32 {
        self.advance
    }

    /// Per-code-unit advances in logical order; length equals the `count`
    /// of the call that produced this layout.
    pub fn advances(&self) -> &[f32] {
        &self.advances
    }

    /// Copies the per-code-unit advances into a caller buffer, which must
    /// match the laid-out count exactly.
    pub fn get_advances(&self, out: &mut [f32]) -> Result<()> {
        if out.len() != self.advances.len() {
            return Err(Error::AdvanceBufferMismatch {
                expected: self.advances.len(),
                actual: out.len(),
            });
        }
        out.copy_from_slice(&self.advances);
        Ok(())
    }

    /// The advance of code unit `i`, relative to the range start.
    pub fn char_advance(&self, i: usize) -> f32 {
        self.advances[i]
    }

    /// Union of all glyph bounds; empty for an empty layout.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The codebook the encoded entry point translated through, if any.
    pub fn codebook(&self) -> Option<&'static Codebook> {
        self.codebook
    }

    /// Finds `face` in the face table, inserting it if new.
    fn find_face(&mut self, face: &FakedFont) -> usize {
        match self.faces.iter().position(|f| f.same_face(face)) {
            Some(ix) => ix,
            None => {
                self.faces.push(face.clone());
                self.faces.len() - 1
            }
        }
    }

    /// Merges a fully-computed fragment (for example, a cached word) into
    /// this layout at logical code-unit offset `dst_offset`.
    ///
    /// Face indices are remapped through this layout's table, positions
    /// shift by the running advance, and bounds accumulate. This is the
    /// single point where cache hits and misses converge.
    fn append(&mut self, src: &Layout, dst_offset: usize) {
        for glyph in &src.glyphs {
            let font_ix = self.find_face(&src.faces[glyph.font_ix]);
            self.glyphs.push(LayoutGlyph {
                font_ix,
                glyph_id: glyph.glyph_id,
                x: glyph.x + self.advance,
                y: glyph.y,
            });
        }
        for (i, advance) in src.advances.iter().enumerate() {
            self.advances[dst_offset + i] += advance;
        }
        self.bounds.union(&src.bounds.offset(self.advance, 0.0));
        self.advance += src.advance;
    }
}

/// Byte offset → code-unit offset correspondence for one decoded range.
struct CharPos {
    byte: usize,
    unit: usize,
}

/// Decodes UTF-16 code units, building the byte/unit offset map.
///
/// Unpaired surrogates decode to U+FFFD, which occupies one code unit
/// either way, so the map stays aligned with the raw buffer.
fn decode_units(units: &[u16]) -> (String, Vec<CharPos>) {
    let mut text = String::with_capacity(units.len());
    let mut map = Vec::with_capacity(units.len() + 1);
    let mut unit = 0usize;
    for decoded in char::decode_utf16(units.iter().copied()) {
        let (ch, len) = match decoded {
            Ok(ch) => (ch, ch.len_utf16()),
            Err(_) => (char::REPLACEMENT_CHARACTER, 1),
        };
        map.push(CharPos {
            byte: text.len(),
            unit,
        });
        unit += len;
        text.push(ch);
    }
    map.push(CharPos {
        byte: text.len(),
        unit,
    });
    (text, map)
}

/// Code-unit offset of a byte position that falls on a char boundary.
fn unit_at(map: &[CharPos], byte: usize) -> usize {
    match map.binary_search_by_key(&byte, |pos| pos.byte) {
        Ok(i) => map[i].unit,
        Err(i) => map[i.saturating_sub(1)].unit,
    }
}

/// Splits a run into cache units: each maximal whitespace span and each
/// maximal non-whitespace span is one unit, so repeated words hit the same
/// cache entries regardless of the spacing around them.
fn split_words(text: &str) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut start = 0usize;
    let mut in_whitespace: Option<bool> = None;
    for (pos, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        match in_whitespace {
            Some(prev) if prev != ws => {
                words.push(start..pos);
                start = pos;
                in_whitespace = Some(ws);
            }
            Some(_) => {}
            None => in_whitespace = Some(ws),
        }
    }
    if !text.is_empty() {
        words.push(start..text.len());
    }
    words
}

/// Shapes one cache unit from scratch.
///
/// The word is itemized into same-face sub-runs; for RTL the sub-runs are
/// visited in reverse so the pen travels visually while cluster advances
/// land at their logical code units.
fn shape_word(
    text: &str,
    unit_len: usize,
    rtl: bool,
    style: FontStyle,
    paint: &Paint,
    collection: &FontCollection,
    shaper: &dyn Shaper,
) -> Result<Layout> {
    let mut word = Layout::new();
    word.advances.resize(unit_len, 0.0);
    if text.is_empty() {
        return Ok(word);
    }

    let mut unit_starts: Vec<CharPos> = Vec::with_capacity(text.len() + 1);
    let mut unit = 0usize;
    for (byte, ch) in text.char_indices() {
        unit_starts.push(CharPos { byte, unit });
        unit += ch.len_utf16();
    }
    unit_starts.push(CharPos {
        byte: text.len(),
        unit,
    });

    let mut font_runs = collection.itemize(text, style);
    if rtl {
        font_runs.reverse();
    }

    let mut pen_x = 0.0f32;
    for font_run in &font_runs {
        let shaped = shaper.shape(
            &text[font_run.start..font_run.end],
            &font_run.faked_font,
            rtl,
            paint,
        )?;
        let font_ix = word.find_face(&font_run.faked_font);
        for glyph in &shaped.glyphs {
            let x = pen_x + glyph.x_offset;
            let y = glyph.y_offset;
            word.glyphs.push(LayoutGlyph {
                font_ix,
                glyph_id: glyph.glyph_id,
                x,
                y,
            });
            word.bounds.union(&glyph.bounds.offset(x, y));
            let cluster_unit = unit_at(&unit_starts, font_run.start + glyph.cluster as usize);
            if let Some(slot) = word.advances.get_mut(cluster_unit) {
                *slot += glyph.x_advance;
            }
            pen_x += glyph.x_advance;
        }
    }
    word.advance = pen_x;
    Ok(word)
}

fn check_range(start: usize, count: usize, buf_size: usize) -> Result<()> {
    if start.checked_add(count).map_or(true, |end| end > buf_size) {
        return Err(Error::InvalidRange {
            start,
            count,
            buf_size,
        });
    }
    Ok(())
}

/// The layout engine: a word cache plus a shaping collaborator.
///
/// Engines are cheap to construct with isolated caches (useful in tests);
/// [`LayoutEngine::shared`] provides the classic process-wide instance.
pub struct LayoutEngine {
    cache: Arc<LayoutCache>,
    shaper: Arc<dyn Shaper>,
}

impl LayoutEngine {
    /// Creates an engine with a fresh default-capacity cache and the
    /// rustybuzz shaping collaborator.
    pub fn new() -> Self {
        Self::with_parts(Arc::new(LayoutCache::default()), Arc::new(HbShaper::new()))
    }

    /// Creates an engine from an explicit cache and shaper.
    pub fn with_parts(cache: Arc<LayoutCache>, shaper: Arc<dyn Shaper>) -> Self {
        Self { cache, shaper }
    }

    /// The process-wide shared engine.
    pub fn shared() -> &'static LayoutEngine {
        static SHARED: OnceLock<LayoutEngine> = OnceLock::new();
        SHARED.get_or_init(LayoutEngine::new)
    }

    /// The engine's word cache.
    pub fn cache(&self) -> &Arc<LayoutCache> {
        &self.cache
    }

    /// Lays out `buf[start..start + count]` into `layout`.
    ///
    /// The layout is reset first; on success it holds the positioned
    /// glyphs, `count` per-code-unit advances, the aggregate advance and
    /// the bounds union. An empty range produces an empty layout.
    #[allow(clippy::too_many_arguments)]
    pub fn layout(
        &self,
        layout: &mut Layout,
        buf: &[u16],
        start: usize,
        count: usize,
        flags: BidiFlags,
        style: FontStyle,
        paint: &Paint,
        collection: &FontCollection,
    ) -> Result<()> {
        check_range(start, count, buf.len())?;
        layout.reset();
        layout.advances.resize(count, 0.0);
        if count == 0 {
            return Ok(());
        }
        self.run_pipeline(
            buf,
            start,
            count,
            flags,
            style,
            paint,
            collection,
            Some(layout),
            None,
        )?;
        Ok(())
    }

    /// Measures `buf[start..start + count]` without producing glyphs.
    ///
    /// Returns the aggregate advance; when `advances` is provided it must
    /// hold exactly `count` slots and receives the per-code-unit advances.
    /// Shares the word cache with [`LayoutEngine::layout`].
    #[allow(clippy::too_many_arguments)]
    pub fn measure(
        &self,
        buf: &[u16],
        start: usize,
        count: usize,
        flags: BidiFlags,
        style: FontStyle,
        paint: &Paint,
        collection: &FontCollection,
        mut advances: Option<&mut [f32]>,
    ) -> Result<f32> {
        check_range(start, count, buf.len())?;
        if let Some(out) = advances.as_deref_mut() {
            if out.len() != count {
                return Err(Error::AdvanceBufferMismatch {
                    expected: count,
                    actual: out.len(),
                });
            }
            out.fill(0.0);
        }
        if count == 0 {
            return Ok(0.0);
        }
        self.run_pipeline(
            buf, start, count, flags, style, paint, collection, None, advances,
        )
    }

    /// Encoded-text variant of [`LayoutEngine::layout`].
    ///
    /// Each symbol id is translated through `codebook` before entering the
    /// identical pipeline, so equivalent inputs produce bit-identical
    /// output on both paths. The layout records the codebook used.
    #[allow(clippy::too_many_arguments)]
    pub fn layout_encoded(
        &self,
        layout: &mut Layout,
        symbols: &[u8],
        start: usize,
        count: usize,
        flags: BidiFlags,
        style: FontStyle,
        paint: &Paint,
        collection: &FontCollection,
        codebook: &'static Codebook,
    ) -> Result<()> {
        check_range(start, count, symbols.len())?;
        let units = decode_symbols(symbols, codebook)?;
        self.layout(layout, &units, start, count, flags, style, paint, collection)?;
        layout.codebook = Some(codebook);
        Ok(())
    }

    /// Encoded-text variant of [`LayoutEngine::measure`].
    #[allow(clippy::too_many_arguments)]
    pub fn measure_encoded(
        &self,
        symbols: &[u8],
        start: usize,
        count: usize,
        flags: BidiFlags,
        style: FontStyle,
        paint: &Paint,
        collection: &FontCollection,
        codebook: &Codebook,
        advances: Option<&mut [f32]>,
    ) -> Result<f32> {
        check_range(start, count, symbols.len())?;
        let units = decode_symbols(symbols, codebook)?;
        self.measure(
            &units, start, count, flags, style, paint, collection, advances,
        )
    }

    /// Drops all cached word layouts. Safe to call at any time; layouts
    /// already produced are unaffected.
    pub fn purge_caches(&self) {
        log::debug!("purging word layout cache ({} entries)", self.cache.len());
        self.cache.purge();
    }

    /// Resolves runs and words and merges per-word results into the given
    /// destinations. `layout` receives glyphs/bounds, `advances` receives
    /// logically-indexed per-unit advances; either may be absent.
    #[allow(clippy::too_many_arguments)]
    fn run_pipeline(
        &self,
        buf: &[u16],
        start: usize,
        count: usize,
        flags: BidiFlags,
        style: FontStyle,
        paint: &Paint,
        collection: &FontCollection,
        mut layout: Option<&mut Layout>,
        mut advances: Option<&mut [f32]>,
    ) -> Result<f32> {
        let range = &buf[start..start + count];
        let (text, char_map) = decode_units(range);
        let shaper = self.shaper.as_ref();

        let mut total = 0.0f32;
        for run in visual_runs(&text, flags) {
            let mut words = split_words(&text[run.range.clone()]);
            // Words advance visually: logically-last first within RTL runs.
            if run.rtl {
                words.reverse();
            }
            for word in words {
                let word_start = run.range.start + word.start;
                let word_end = run.range.start + word.end;
                let unit_start = unit_at(&char_map, word_start);
                let unit_end = unit_at(&char_map, word_end);
                let word_text = &text[word_start..word_end];

                let key = LayoutCacheKey::new(
                    &range[unit_start..unit_end],
                    collection.id(),
                    style,
                    paint,
                    run.rtl,
                );
                let word_layout = self.cache.get_or_compute(key, || {
                    shape_word(
                        word_text,
                        unit_end - unit_start,
                        run.rtl,
                        style,
                        paint,
                        collection,
                        shaper,
                    )
                })?;

                if let Some(dest) = layout.as_deref_mut() {
                    dest.append(&word_layout, unit_start);
                }
                if let Some(out) = advances.as_deref_mut() {
                    for (i, advance) in word_layout.advances.iter().enumerate() {
                        out[unit_start + i] += advance;
                    }
                }
                total += word_layout.advance;
            }
        }
        Ok(total)
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_symbols(symbols: &[u8], codebook: &Codebook) -> Result<Vec<u16>> {
    symbols
        .iter()
        .map(|&symbol| codebook.decode(symbol).map(|ch| ch as u16))
        .collect()
}

/// Purges the shared engine's caches; useful under memory pressure.
pub fn purge_caches() {
    LayoutEngine::shared().purge_caches();
}

/// Deprecated: initialization is no longer required. Retained so existing
/// callers keep compiling.
#[deprecated(note = "initialization is no longer required")]
pub fn init() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::next_font_id;

    struct TestFont(u32);

    impl Font for TestFont {
        fn unique_id(&self) -> u32 {
            self.0
        }

        fn covers(&self, _ch: char) -> bool {
            true
        }

        fn data(&self) -> &[u8] {
            &[]
        }

        fn index(&self) -> u32 {
            0
        }
    }

    fn faked(font: &Arc<dyn Font>) -> FakedFont {
        FakedFont {
            font: Arc::clone(font),
            fakery: FontFakery::default(),
        }
    }

    fn fragment(face: &FakedFont, glyph_ids: &[u32], advance_each: f32) -> Layout {
        let mut layout = Layout::new();
        let font_ix = layout.find_face(face);
        let mut x = 0.0;
        for &glyph_id in glyph_ids {
            layout.glyphs.push(LayoutGlyph {
                font_ix,
                glyph_id,
                x,
                y: 0.0,
            });
            layout
                .bounds
                .union(&Rect::new(0.0, -8.0, advance_each, 0.0).offset(x, 0.0));
            layout.advances.push(advance_each);
            x += advance_each;
        }
        layout.advance = x;
        layout
    }

    #[test]
    fn test_append_shifts_positions_and_accumulates() {
        let font: Arc<dyn Font> = Arc::new(TestFont(next_font_id()));
        let face = faked(&font);
        let word = fragment(&face, &[1, 2], 10.0);

        let mut dest = Layout::new();
        dest.advances.resize(4, 0.0);
        dest.append(&word, 0);
        dest.append(&word, 2);

        assert_eq!(dest.glyph_count(), 4);
        assert_eq!(dest.x(0), 0.0);
        assert_eq!(dest.x(1), 10.0);
        assert_eq!(dest.x(2), 20.0);
        assert_eq!(dest.x(3), 30.0);
        assert_eq!(dest.advance(), 40.0);
        assert_eq!(dest.advances(), &[10.0, 10.0, 10.0, 10.0]);
        assert_eq!(dest.bounds(), Rect::new(0.0, -8.0, 40.0, 0.0));
    }

    #[test]
    fn test_append_dedupes_faces() {
        let font: Arc<dyn Font> = Arc::new(TestFont(next_font_id()));
        let face = faked(&font);
        let word = fragment(&face, &[7], 5.0);

        let mut dest = Layout::new();
        dest.advances.resize(2, 0.0);
        dest.append(&word, 0);
        dest.append(&word, 1);

        assert_eq!(dest.faces().len(), 1);
        assert_eq!(dest.glyphs()[1].font_ix, 0);
    }

    #[test]
    fn test_append_keeps_distinct_faces() {
        let font_a: Arc<dyn Font> = Arc::new(TestFont(next_font_id()));
        let font_b: Arc<dyn Font> = Arc::new(TestFont(next_font_id()));
        let word_a = fragment(&faked(&font_a), &[1], 5.0);
        let word_b = fragment(&faked(&font_b), &[2], 5.0);

        let mut dest = Layout::new();
        dest.advances.resize(2, 0.0);
        dest.append(&word_a, 0);
        dest.append(&word_b, 1);

        assert_eq!(dest.faces().len(), 2);
        assert_eq!(dest.glyphs()[0].font_ix, 0);
        assert_eq!(dest.glyphs()[1].font_ix, 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let font: Arc<dyn Font> = Arc::new(TestFont(next_font_id()));
        let mut layout = fragment(&faked(&font), &[1, 2, 3], 4.0);
        layout.codebook = Some(&crate::codebook::PRINTABLE_ASCII);

        layout.reset();
        assert_eq!(layout.glyph_count(), 0);
        assert!(layout.advances().is_empty());
        assert!(layout.faces().is_empty());
        assert_eq!(layout.advance(), 0.0);
        assert!(layout.bounds().is_empty());
        assert!(layout.codebook().is_none());
    }

    #[test]
    fn test_get_advances_checks_length() {
        let font: Arc<dyn Font> = Arc::new(TestFont(next_font_id()));
        let layout = fragment(&faked(&font), &[1, 2], 3.0);

        let mut too_small = [0.0f32; 1];
        assert!(matches!(
            layout.get_advances(&mut too_small),
            Err(Error::AdvanceBufferMismatch {
                expected: 2,
                actual: 1
            })
        ));

        let mut exact = [0.0f32; 2];
        layout.get_advances(&mut exact).unwrap();
        assert_eq!(exact, [3.0, 3.0]);
    }

    #[test]
    fn test_split_words_alternates_spans() {
        assert_eq!(
            split_words("ab  cd"),
            vec![0..2usize, 2..4, 4..6]
        );
        assert_eq!(split_words("  "), vec![0..2usize]);
        assert_eq!(split_words("abc"), vec![0..3usize]);
        assert!(split_words("").is_empty());
    }

    #[test]
    fn test_decode_units_maps_surrogate_pairs() {
        // "a𝄞b" — U+1D11E is one char, two code units.
        let units: Vec<u16> = "a𝄞b".encode_utf16().collect();
        assert_eq!(units.len(), 4);
        let (text, map) = decode_units(&units);
        assert_eq!(text, "a𝄞b");
        assert_eq!(unit_at(&map, 0), 0);
        assert_eq!(unit_at(&map, 1), 1); // 𝄞 starts at byte 1, unit 1
        assert_eq!(unit_at(&map, 5), 3); // b starts after 4 bytes of 𝄞
        assert_eq!(unit_at(&map, text.len()), 4);
    }

    #[test]
    fn test_decode_units_replaces_lone_surrogate() {
        let units = [0x41u16, 0xD800, 0x42];
        let (text, map) = decode_units(&units);
        assert_eq!(text, "A\u{FFFD}B");
        assert_eq!(unit_at(&map, text.len()), 3);
    }

    #[test]
    fn test_check_range_rejects_overflow() {
        assert!(check_range(0, 3, 3).is_ok());
        assert!(check_range(3, 0, 3).is_ok());
        assert!(check_range(1, 3, 3).is_err());
        assert!(check_range(usize::MAX, 2, 3).is_err());
    }
}
