//! Kernel row cache
//!
//! Keeps the most recently used rows of `Q`, keyed by the solver's working
//! position. Rows are prefixes of variable length: a request for a longer
//! prefix extends the cached row in place.

use lru::LruCache;
use std::num::NonZeroUsize;

/// LRU cache of `Q` row prefixes
pub struct RowCache {
    rows: LruCache<usize, Vec<f64>>,
    hits: u64,
    misses: u64,
}

impl RowCache {
    /// Create a cache holding at most `capacity` rows
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(2)).unwrap_or(NonZeroUsize::MIN);
        Self {
            rows: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache sized from a byte budget for rows of length `l`
    ///
    /// Never holds more than `l` rows.
    pub fn with_memory_limit(memory_bytes: usize, l: usize) -> Self {
        let row_bytes = l.max(1) * std::mem::size_of::<f64>();
        Self::new((memory_bytes / row_bytes).min(l))
    }

    /// Return row `i` with at least `len` entries, computing missing entries
    /// with `compute(j)`
    pub fn get_or_fill<F>(&mut self, i: usize, len: usize, compute: F) -> &[f64]
    where
        F: FnMut(usize) -> f64,
    {
        let row = self.rows.get_or_insert_mut(i, Vec::new);
        if row.len() >= len {
            self.hits += 1;
        } else {
            self.misses += 1;
            let start = row.len();
            row.extend((start..len).map(compute));
        }
        &row[..len]
    }

    /// Exchange positions `i` and `j` in every cached row
    ///
    /// Rows long enough to contain `i` but not `j` cannot be permuted and are
    /// dropped.
    pub fn swap_index(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        let (i, j) = if i < j { (i, j) } else { (j, i) };

        let row_i = self.rows.pop(&i);
        let row_j = self.rows.pop(&j);
        if let Some(row) = row_i {
            self.rows.put(j, row);
        }
        if let Some(row) = row_j {
            self.rows.put(i, row);
        }

        let mut stale = Vec::new();
        for (&key, row) in self.rows.iter_mut() {
            if row.len() > i {
                if row.len() > j {
                    row.swap(i, j);
                } else {
                    stale.push(key);
                }
            }
        }
        for key in stale {
            self.rows.pop(&key);
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.rows.cap().get(),
            size: self.rows.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

impl CacheStats {
    /// Fraction of row requests served without computing entries
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
