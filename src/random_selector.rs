use std::fmt;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::Rng;

use crate::model::Album;

/// Source of uniform integers.
pub trait RandomSource: Send + Sync {
    /// Uniform draw from `[0, bound)`; returns 0 when `bound` is 0.
    fn below(&self, bound: u64) -> u64;
}

/// OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn below(&self, bound: u64) -> u64 {
        if bound == 0 {
            0
        } else {
            OsRng.gen_range(0..bound)
        }
    }
}

/// Maps an album's declared photo count to its selection weight.
pub type WeightFn = fn(usize) -> u64;

/// `floor(100 * log10(1 + n / 50))`: doubling an album adds a roughly constant
/// amount of weight instead of doubling it.
pub fn log_weight(photos: usize) -> u64 {
    (100.0 * (1.0 + photos as f64 / 50.0).log10()).floor() as u64
}

#[derive(Clone)]
pub struct RandomSelector {
    source: Arc<dyn RandomSource>,
    weight: WeightFn,
}

impl Default for RandomSelector {
    fn default() -> Self {
        RandomSelector::new(Arc::new(OsRandom), log_weight)
    }
}

impl fmt::Debug for RandomSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSelector").finish_non_exhaustive()
    }
}

impl RandomSelector {
    pub fn new(source: Arc<dyn RandomSource>, weight: WeightFn) -> Self {
        RandomSelector { source, weight }
    }

    /// All-zero weights pick the first album. `None` only for an empty slice.
    pub fn weighted_random_album<'a>(&self, albums: &'a [Album]) -> Option<&'a Album> {
        let first = albums.first()?;

        let total: u64 = albums.iter().map(|a| (self.weight)(a.size)).sum();
        let index = self.source.below(total);

        let mut sum = 0;
        for album in albums {
            sum += (self.weight)(album.size);
            if sum > index {
                return Some(album);
            }
        }
        Some(first)
    }

    /// A contiguous run of at most `size` items starting at a uniformly drawn
    /// index. Shorter near the end of `items`; empty for empty input.
    pub fn pick_window<'a, T>(&self, items: &'a [T], size: usize) -> &'a [T] {
        let start = self.source.below(items.len() as u64) as usize;
        let end = start.saturating_add(size).min(items.len());
        &items[start..end]
    }
}
