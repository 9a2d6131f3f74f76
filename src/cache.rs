//! Word-level shaping result cache
//!
//! Shaping is the expensive step of layout, and edited or scrolled text is
//! re-laid-out constantly, so results are memoized per cache unit ("word").
//! Values are immutable `Arc<Layout>` fragments: purging or evicting an
//! entry never disturbs layouts it was already merged into.

use crate::layout::Layout;
use crate::style::{FontStyle, Paint};
use lru::LruCache;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

type WordCacheHasher = BuildHasherDefault<FxHasher>;

/// Maximum number of shaped words kept in memory at once.
pub const WORD_CACHE_SIZE: usize = 5000;

/// Identity of a memoized shaping result.
///
/// Floats are keyed bit-exactly: two paints differing in any attribute
/// never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutCacheKey {
  text: Box<[u16]>,
  collection_id: u32,
  style: FontStyle,
  size_bits: u32,
  scale_x_bits: u32,
  skew_x_bits: u32,
  letter_spacing_bits: u32,
  paint_flags: u32,
  is_rtl: bool,
}

impl LayoutCacheKey {
  /// Builds a key from the word's code units and the attributes that
  /// determine its shaped form.
  pub fn new(
    text: &[u16],
    collection_id: u32,
    style: FontStyle,
    paint: &Paint,
    is_rtl: bool,
  ) -> Self {
    Self {
      text: text.into(),
      collection_id,
      style,
      size_bits: paint.size.to_bits(),
      scale_x_bits: paint.scale_x.to_bits(),
      skew_x_bits: paint.skew_x.to_bits(),
      letter_spacing_bits: paint.letter_spacing.to_bits(),
      paint_flags: paint.flags,
      is_rtl,
    }
  }
}

/// Bounded, least-recently-used cache of word layouts.
///
/// A single mutex guards lookup, insert and eviction. The lock is held
/// across miss computation, so concurrent requests for the same key
/// serialize behind one computation instead of duplicating work.
pub struct LayoutCache {
  inner: Mutex<LruCache<LayoutCacheKey, Arc<Layout>, WordCacheHasher>>,
}

impl LayoutCache {
  /// Creates a cache bounded to `capacity` words.
  pub fn new(capacity: usize) -> Self {
    let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
    Self {
      inner: Mutex::new(LruCache::with_hasher(cap, WordCacheHasher::default())),
    }
  }

  fn lock(&self) -> MutexGuard<'_, LruCache<LayoutCacheKey, Arc<Layout>, WordCacheHasher>> {
    match self.inner.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  /// Returns the layout for `key`, computing and inserting it on a miss.
  pub fn get_or_compute<F>(&self, key: LayoutCacheKey, compute: F) -> crate::Result<Arc<Layout>>
  where
    F: FnOnce() -> crate::Result<Layout>,
  {
    let mut cache = self.lock();
    if let Some(hit) = cache.get(&key) {
      return Ok(Arc::clone(hit));
    }
    let computed = Arc::new(compute()?);
    cache.put(key, Arc::clone(&computed));
    Ok(computed)
  }

  /// Drops every entry. Only future lookups are affected; merged layouts
  /// keep their shared fragments alive.
  pub fn purge(&self) {
    self.lock().clear();
  }

  /// Number of cached words.
  pub fn len(&self) -> usize {
    self.lock().len()
  }

  /// True when the cache holds no entries.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for LayoutCache {
  fn default() -> Self {
    Self::new(WORD_CACHE_SIZE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(text: &[u16], rtl: bool) -> LayoutCacheKey {
    LayoutCacheKey::new(text, 1, FontStyle::default(), &Paint::default(), rtl)
  }

  #[test]
  fn test_computes_once_per_key() {
    let cache = LayoutCache::new(16);
    let mut calls = 0;

    for _ in 0..3 {
      let result = cache.get_or_compute(key(&[0x41], false), || {
        calls += 1;
        Ok(Layout::new())
      });
      assert!(result.is_ok());
    }
    assert_eq!(calls, 1);
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn test_direction_distinguishes_keys() {
    assert_ne!(key(&[0x41], false), key(&[0x41], true));
    assert_ne!(key(&[0x41], false), key(&[0x42], false));
  }

  #[test]
  fn test_paint_attributes_distinguish_keys() {
    let mut wide = Paint::default();
    wide.scale_x = 2.0;
    let base = LayoutCacheKey::new(&[0x41], 1, FontStyle::default(), &Paint::default(), false);
    let scaled = LayoutCacheKey::new(&[0x41], 1, FontStyle::default(), &wide, false);
    assert_ne!(base, scaled);
  }

  #[test]
  fn test_purge_clears_entries() {
    let cache = LayoutCache::new(16);
    cache
      .get_or_compute(key(&[0x41], false), || Ok(Layout::new()))
      .unwrap();
    assert!(!cache.is_empty());

    cache.purge();
    assert!(cache.is_empty());
  }

  #[test]
  fn test_capacity_bounds_entries() {
    let cache = LayoutCache::new(2);
    for unit in 0x41..0x46u16 {
      cache
        .get_or_compute(key(&[unit], false), || Ok(Layout::new()))
        .unwrap();
    }
    assert_eq!(cache.len(), 2);
  }

  #[test]
  fn test_failed_compute_is_not_cached() {
    let cache = LayoutCache::new(16);
    let err = cache.get_or_compute(key(&[0x41], false), || {
      Err(crate::Error::Shaping {
        reason: "stub".to_string(),
      })
    });
    assert!(err.is_err());
    assert!(cache.is_empty());
  }
}
