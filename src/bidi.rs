//! Directional run segmentation (UAX #9)
//!
//! Wraps the `unicode-bidi` crate: the engine hands a decoded sub-range
//! here and gets back maximal directional runs in *visual* order, which is
//! the order glyph x positions accumulate. Each run is a byte range into
//! the analyzed string; the caller maps byte offsets back to code-unit
//! positions for logically-indexed advances.

use std::ops::Range;
use unicode_bidi::{bidi_class, BidiClass, BidiInfo, Level};

/// Direction request for a layout call.
///
/// `Force*` skips per-character classification entirely and treats the
/// whole range as one run. `Default*` resolves the paragraph direction
/// from the first strong character, using the hint only when the text has
/// none. `Ltr`/`Rtl` pin the paragraph level but still split embedded
/// opposite-direction content into separate runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BidiFlags {
    /// Left-to-right paragraph.
    Ltr,
    /// Right-to-left paragraph.
    Rtl,
    /// First-strong detection, defaulting to left-to-right.
    DefaultLtr,
    /// First-strong detection, defaulting to right-to-left.
    DefaultRtl,
    /// Single left-to-right run, no classification.
    ForceLtr,
    /// Single right-to-left run, no classification.
    ForceRtl,
}

/// A directional run over the analyzed string, tagged with its resolved
/// direction. Produced in visual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualRun {
    /// Byte range into the analyzed string.
    pub range: Range<usize>,
    /// True when the run lays out right-to-left.
    pub rtl: bool,
}

/// Determines the intrinsic direction of a character.
///
/// Returns `Some(true)` for strong RTL (R, AL), `Some(false)` for strong
/// LTR, `None` for neutral or weak characters.
fn strong_direction(ch: char) -> Option<bool> {
    match bidi_class(ch) {
        BidiClass::L => Some(false),
        BidiClass::R | BidiClass::AL => Some(true),
        _ => None,
    }
}

/// Scans for the first strong character, falling back to `default_rtl`.
fn detect_paragraph_level(text: &str, default_rtl: bool) -> Level {
    let rtl = text
        .chars()
        .find_map(strong_direction)
        .unwrap_or(default_rtl);
    if rtl {
        Level::rtl()
    } else {
        Level::ltr()
    }
}

/// Splits text into maximal directional runs in visual order.
///
/// An empty string yields no runs.
pub fn visual_runs(text: &str, flags: BidiFlags) -> Vec<VisualRun> {
    if text.is_empty() {
        return Vec::new();
    }

    let level = match flags {
        BidiFlags::ForceLtr => {
            return vec![VisualRun {
                range: 0..text.len(),
                rtl: false,
            }]
        }
        BidiFlags::ForceRtl => {
            return vec![VisualRun {
                range: 0..text.len(),
                rtl: true,
            }]
        }
        BidiFlags::Ltr => Level::ltr(),
        BidiFlags::Rtl => Level::rtl(),
        BidiFlags::DefaultLtr => detect_paragraph_level(text, false),
        BidiFlags::DefaultRtl => detect_paragraph_level(text, true),
    };

    let bidi_info = BidiInfo::new(text, Some(level));
    let mut runs = Vec::new();
    for paragraph in &bidi_info.paragraphs {
        let (_, level_runs) = bidi_info.visual_runs(paragraph, paragraph.range.clone());
        for range in level_runs {
            let run_level = bidi_info
                .levels
                .get(range.start)
                .copied()
                .unwrap_or(level);
            runs.push(VisualRun {
                rtl: run_level.is_rtl(),
                range,
            });
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_no_runs() {
        assert!(visual_runs("", BidiFlags::DefaultLtr).is_empty());
        assert!(visual_runs("", BidiFlags::ForceRtl).is_empty());
    }

    #[test]
    fn test_pure_ltr_single_run() {
        let runs = visual_runs("Hello world", BidiFlags::Ltr);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].range, 0..11);
        assert!(!runs[0].rtl);
    }

    #[test]
    fn test_pure_rtl_single_run() {
        let text = "שלום";
        let runs = visual_runs(text, BidiFlags::DefaultLtr);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].range, 0..text.len());
        assert!(runs[0].rtl);
    }

    #[test]
    fn test_mixed_text_splits_runs() {
        let text = "abc שלום xyz";
        let runs = visual_runs(text, BidiFlags::DefaultLtr);
        assert!(runs.len() >= 3);
        assert!(runs.iter().any(|r| r.rtl));
        assert!(runs.iter().any(|r| !r.rtl));

        // Every byte of the text is covered exactly once.
        let covered: usize = runs.iter().map(|r| r.range.len()).sum();
        assert_eq!(covered, text.len());
    }

    #[test]
    fn test_force_overrides_classification() {
        let text = "שלום";
        let runs = visual_runs(text, BidiFlags::ForceLtr);
        assert_eq!(
            runs,
            vec![VisualRun {
                range: 0..text.len(),
                rtl: false,
            }]
        );

        let runs = visual_runs("abc", BidiFlags::ForceRtl);
        assert_eq!(runs.len(), 1);
        assert!(runs[0].rtl);
    }

    #[test]
    fn test_default_uses_first_strong() {
        // First strong character is Hebrew, so the paragraph is RTL even
        // under a DefaultLtr hint.
        let runs = visual_runs("שלום abc", BidiFlags::DefaultLtr);
        assert!(runs[0].rtl || runs.iter().any(|r| r.rtl));

        // No strong characters at all: the hint decides.
        let neutral = "123 456";
        assert!(!visual_runs(neutral, BidiFlags::DefaultLtr)[0].rtl);
        // Numbers keep their weak-LTR behavior inside an RTL paragraph,
        // but the paragraph itself resolves RTL under the hint.
        let hinted = visual_runs(neutral, BidiFlags::DefaultRtl);
        assert!(!hinted.is_empty());
    }

    #[test]
    fn test_rtl_paragraph_orders_runs_visually() {
        // In an RTL paragraph the logically-first RTL word is visually
        // last of the LTR segment, so the LTR "abc" run must come after
        // the Hebrew run that precedes it logically.
        let text = "שלום abc";
        let runs = visual_runs(text, BidiFlags::Rtl);
        assert!(runs.len() >= 2);
        let hebrew_pos = runs.iter().position(|r| r.range.start == 0).unwrap();
        let latin_pos = runs.iter().position(|r| r.range.contains(&9)).unwrap();
        assert!(latin_pos < hebrew_pos);
    }

    #[test]
    fn test_ltr_flag_still_splits_embedded_rtl() {
        let runs = visual_runs("abc שלום", BidiFlags::Ltr);
        assert!(runs.iter().any(|r| r.rtl));
        assert!(runs.iter().any(|r| !r.rtl));
    }
}
