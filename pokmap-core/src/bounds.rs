//! Reference-map bounds and their per-path cache.

use crate::error::Result;
use crate::file_utils::MapSource;
use crate::models::Bounds;
use crate::parsers::parse_numbers;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Bounds of the `L` records in `text`. Points never contribute.
pub fn compute_bounds(text: &str) -> Bounds {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for raw in text.lines() {
        let line = raw.trim();
        if !line.starts_with('L') {
            continue;
        }
        let nums = parse_numbers(line);
        if nums.len() < 6 {
            continue;
        }
        let (x1, y1, x2, y2) = (nums[0], nums[1], nums[3], nums[4]);
        min_x = min_x.min(x1).min(x2);
        max_x = max_x.max(x1).max(x2);
        min_y = min_y.min(y1).min(y2);
        max_y = max_y.max(y1).max(y2);
    }

    if min_x == f64::INFINITY {
        return Bounds::UNIT;
    }
    Bounds::new(min_x, max_x, min_y, max_y)
}

/// Bounds memoized per reference path for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct BoundsCache {
    entries: Mutex<HashMap<PathBuf, Bounds>>,
}

impl BoundsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached bounds for `path`, reading it through `source` on first use.
    ///
    /// The lock is held across lookup and populate, so concurrent first calls
    /// for the same path read the file once.
    pub fn get_or_load(&self, path: &Path, source: &dyn MapSource) -> Result<Bounds> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bounds) = entries.get(path) {
            return Ok(*bounds);
        }

        let bounds = compute_bounds(&source.read_map(path)?);
        debug!(
            "Cached bounds for {:?}: x[{:.2},{:.2}] y[{:.2},{:.2}]",
            path, bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
        );
        entries.insert(path.to_path_buf(), bounds);
        Ok(bounds)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every cached entry, e.g. after reference maps were replaced.
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        text: String,
        reads: AtomicUsize,
    }

    impl CountingSource {
        fn new(text: &str) -> Self {
            Self { text: text.to_string(), reads: AtomicUsize::new(0) }
        }
    }

    impl MapSource for CountingSource {
        fn read_map(&self, _path: &Path) -> Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    struct FailingSource;

    impl MapSource for FailingSource {
        fn read_map(&self, path: &Path) -> Result<String> {
            Err(MapError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("missing: {}", path.display()),
            )))
        }
    }

    #[test]
    fn test_compute_bounds_uses_segments_only() {
        let text = "\
L -10, 5, 0, 20, -15, 0, 0, 0, 0
P 500, 500, 0, 0, 0, 0, 1, Far_Away
L 3, 40, 1, 4, 2, 1, 0, 0, 0
";
        let b = compute_bounds(text);
        assert_eq!(b.as_tuple(), (-10.0, 20.0, -15.0, 40.0));
    }

    #[test]
    fn test_compute_bounds_without_segments_is_unit() {
        let b = compute_bounds("P 5,5,0,0,0,0,1,Lonely\n# nothing else\n");
        assert_eq!(b.as_tuple(), (0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_compute_bounds_accepts_short_segment_lines() {
        // Six numbers are enough to contribute to bounds
        let b = compute_bounds("L 1,2,0,3,4,0");
        assert_eq!(b.as_tuple(), (1.0, 3.0, 2.0, 4.0));
    }

    #[test]
    fn test_get_or_load_is_idempotent_and_reads_once() {
        let cache = BoundsCache::new();
        let source = CountingSource::new("L 0,0,0,100,100,0,0,0,0\n");
        let path = Path::new("zones/qeynos.txt");

        let first = cache.get_or_load(path, &source).unwrap();
        let second = cache.get_or_load(path, &source).unwrap();

        assert_eq!(first.as_tuple(), second.as_tuple());
        assert_eq!(first.min_x.to_bits(), second.min_x.to_bits());
        assert_eq!(first.max_y.to_bits(), second.max_y.to_bits());
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_paths_are_cached_separately() {
        let cache = BoundsCache::new();
        let source = CountingSource::new("L 0,0,0,1,1,0,0,0,0\n");
        cache.get_or_load(Path::new("a.txt"), &source).unwrap();
        cache.get_or_load(Path::new("b.txt"), &source).unwrap();
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);

        cache.clear();
        assert!(cache.is_empty());
        cache.get_or_load(Path::new("a.txt"), &source).unwrap();
        assert_eq!(source.reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_read_failure_propagates_and_is_not_cached() {
        let cache = BoundsCache::new();
        let result = cache.get_or_load(Path::new("missing.txt"), &FailingSource);
        assert!(matches!(result, Err(MapError::Io(_))));
        assert!(cache.is_empty());
    }
}
