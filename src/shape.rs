//! The shaping collaborator
//!
//! Shaping — contextual substitution, kerning, complex-script positioning —
//! is outside this crate's core. The [`Shaper`] trait is the seam: the
//! engine decides *what* to shape and *with which face*, the collaborator
//! turns one same-face piece of a word into glyphs. [`HbShaper`] is the
//! default implementation on top of `rustybuzz`.

use crate::error::{Error, Result};
use crate::font::FakedFont;
use crate::geometry::Rect;
use crate::style::Paint;
use rustybuzz::ttf_parser::GlyphId;
use rustybuzz::{Direction, Face, UnicodeBuffer};

/// One glyph produced by the shaping collaborator.
///
/// Offsets and advances are in pixels, unaccumulated: the word builder
/// advances the pen by `x_advance` after placing each glyph. `bounds` is
/// relative to the glyph origin on the baseline.
#[derive(Debug, Clone, Copy)]
pub struct ShapedGlyph {
    /// Glyph id in the shaped face.
    pub glyph_id: u32,
    /// Byte offset of the source cluster within the shaped text.
    pub cluster: u32,
    /// Horizontal offset from the pen position.
    pub x_offset: f32,
    /// Vertical offset from the baseline, positive downward.
    pub y_offset: f32,
    /// Pen advance contributed by this glyph.
    pub x_advance: f32,
    /// Ink bounds relative to the glyph origin.
    pub bounds: Rect,
}

/// The result of shaping one same-face piece of text.
#[derive(Debug, Clone, Default)]
pub struct ShapedWord {
    /// Glyphs in visual order (right-to-left input arrives leftmost-first).
    pub glyphs: Vec<ShapedGlyph>,
}

/// External shaping collaborator.
///
/// Implementations must be deterministic and side-effect-free: the engine
/// memoizes results by input identity and never retries.
pub trait Shaper: Send + Sync {
    /// Shapes `text` with a single resolved face.
    fn shape(&self, text: &str, font: &FakedFont, is_rtl: bool, paint: &Paint)
        -> Result<ShapedWord>;
}

/// HarfBuzz-based shaper (via `rustybuzz`).
#[derive(Debug, Clone, Copy, Default)]
pub struct HbShaper;

impl HbShaper {
    /// Creates the default shaper.
    pub fn new() -> Self {
        Self
    }
}

impl Shaper for HbShaper {
    fn shape(
        &self,
        text: &str,
        font: &FakedFont,
        is_rtl: bool,
        paint: &Paint,
    ) -> Result<ShapedWord> {
        let face = Face::from_slice(font.font.data(), font.font.index()).ok_or_else(|| {
            Error::Shaping {
                reason: "failed to create shaping face".to_string(),
            }
        })?;

        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.set_direction(if is_rtl {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        });

        let output = rustybuzz::shape(&face, &[], buffer);

        let scale = paint.size / face.units_per_em() as f32;
        let letter_spacing = paint.letter_spacing * paint.size;
        let infos = output.glyph_infos();
        let positions = output.glyph_positions();

        let mut glyphs = Vec::with_capacity(infos.len());
        let mut prev_cluster = u32::MAX;
        for (info, pos) in infos.iter().zip(positions.iter()) {
            let mut x_advance = pos.x_advance as f32 * scale * paint.scale_x;
            // Letter spacing applies once per cluster, at its first glyph.
            if info.cluster != prev_cluster {
                x_advance += letter_spacing;
                prev_cluster = info.cluster;
            }

            let glyph_id = GlyphId(info.glyph_id as u16);
            let bounds = face
                .glyph_bounding_box(glyph_id)
                .map(|b| {
                    Rect::new(
                        b.x_min as f32 * scale,
                        -(b.y_max as f32) * scale,
                        b.x_max as f32 * scale,
                        -(b.y_min as f32) * scale,
                    )
                })
                .unwrap_or(Rect::EMPTY);

            glyphs.push(ShapedGlyph {
                glyph_id: info.glyph_id,
                cluster: info.cluster,
                x_offset: pos.x_offset as f32 * scale * paint.scale_x,
                y_offset: -(pos.y_offset as f32) * scale,
                x_advance,
                bounds,
            });
        }

        Ok(ShapedWord { glyphs })
    }
}
