//! Font style and paint attributes
//!
//! [`FontStyle`] is the *requested* style a caller asks the fallback
//! resolver for; [`FontFakery`] records how far a concrete face falls short
//! of that request and must be compensated by the rendering path. [`Paint`]
//! carries the scalar rendering attributes that participate in shaping and
//! in cache keys.

/// Font weight (100-900)
///
/// Common keywords map to specific values: normal is 400, bold is 700.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// Thin (100)
    pub const THIN: Self = Self(100);
    /// Light (300)
    pub const LIGHT: Self = Self(300);
    /// Normal/Regular (400)
    pub const NORMAL: Self = Self(400);
    /// Medium (500)
    pub const MEDIUM: Self = Self(500);
    /// Semi Bold (600)
    pub const SEMI_BOLD: Self = Self(600);
    /// Bold (700)
    pub const BOLD: Self = Self(700);
    /// Black (900)
    pub const BLACK: Self = Self(900);

    /// Creates a new font weight, clamping to the valid range [100, 900].
    #[inline]
    pub fn new(weight: u16) -> Self {
        Self(weight.clamp(100, 900))
    }

    /// Returns the numeric weight value.
    #[inline]
    pub fn value(self) -> u16 {
        self.0
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<u16> for FontWeight {
    fn from(weight: u16) -> Self {
        Self::new(weight)
    }
}

/// The style a caller requests from the fallback resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontStyle {
    weight: FontWeight,
    italic: bool,
}

impl FontStyle {
    /// Creates a style with the given weight and slant.
    pub const fn new(weight: FontWeight, italic: bool) -> Self {
        Self { weight, italic }
    }

    /// Requested weight.
    #[inline]
    pub fn weight(self) -> FontWeight {
        self.weight
    }

    /// Requested slant.
    #[inline]
    pub fn italic(self) -> bool {
        self.italic
    }
}

/// Synthetic style flags recorded when a face cannot natively satisfy the
/// requested style.
///
/// The resolver only *records* the shortfall; applying a synthetic stroke or
/// shear is the rendering path's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontFakery {
    fake_bold: bool,
    fake_italic: bool,
}

impl FontFakery {
    /// Creates fakery flags directly.
    pub const fn new(fake_bold: bool, fake_italic: bool) -> Self {
        Self {
            fake_bold,
            fake_italic,
        }
    }

    /// Compares a requested style against the style a face actually has.
    pub fn compute(wanted: FontStyle, actual: FontStyle) -> Self {
        Self {
            fake_bold: wanted.weight() >= FontWeight::BOLD && actual.weight() < FontWeight::BOLD,
            fake_italic: wanted.italic() && !actual.italic(),
        }
    }

    /// True when the rendering path must embolden synthetically.
    #[inline]
    pub fn fake_bold(self) -> bool {
        self.fake_bold
    }

    /// True when the rendering path must shear synthetically.
    #[inline]
    pub fn fake_italic(self) -> bool {
        self.fake_italic
    }
}

/// Scalar rendering attributes that affect shaping output.
///
/// Every field participates in the word cache key, so two layouts with
/// different paints never share cached results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// Font size in pixels per em.
    pub size: f32,
    /// Horizontal scale applied to advances and offsets.
    pub scale_x: f32,
    /// Horizontal shear for synthetic oblique rendering; does not move
    /// glyph origins.
    pub skew_x: f32,
    /// Additional spacing per cluster, in ems.
    pub letter_spacing: f32,
    /// Opaque rendering flags carried through to the cache key.
    pub flags: u32,
}

impl Paint {
    /// Creates a paint with the given size and neutral attributes.
    pub fn new(size: f32) -> Self {
        Self {
            size,
            scale_x: 1.0,
            skew_x: 0.0,
            letter_spacing: 0.0,
            flags: 0,
        }
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::new(16.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_clamps() {
        assert_eq!(FontWeight::new(50).value(), 100);
        assert_eq!(FontWeight::new(950).value(), 900);
        assert_eq!(FontWeight::new(450).value(), 450);
    }

    #[test]
    fn test_fakery_records_missing_bold() {
        let wanted = FontStyle::new(FontWeight::BOLD, false);
        let actual = FontStyle::new(FontWeight::NORMAL, false);
        let fakery = FontFakery::compute(wanted, actual);
        assert!(fakery.fake_bold());
        assert!(!fakery.fake_italic());
    }

    #[test]
    fn test_fakery_records_missing_italic() {
        let wanted = FontStyle::new(FontWeight::NORMAL, true);
        let actual = FontStyle::new(FontWeight::NORMAL, false);
        let fakery = FontFakery::compute(wanted, actual);
        assert!(!fakery.fake_bold());
        assert!(fakery.fake_italic());
    }

    #[test]
    fn test_native_match_needs_no_fakery() {
        let style = FontStyle::new(FontWeight::BOLD, true);
        assert_eq!(FontFakery::compute(style, style), FontFakery::default());
    }

    #[test]
    fn test_paint_default_is_neutral() {
        let paint = Paint::default();
        assert_eq!(paint.scale_x, 1.0);
        assert_eq!(paint.skew_x, 0.0);
        assert_eq!(paint.letter_spacing, 0.0);
        assert_eq!(paint.flags, 0);
    }
}
