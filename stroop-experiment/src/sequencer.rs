use crate::config::IndexPolicy;
use rand::Rng;
use rand::seq::SliceRandom;
use std::ops::Range;
use stroop_core::Catalog;
use tracing::debug;

/// Draws the catalog indices for one run of `n` trials.
pub fn generate_indices<R: Rng + ?Sized>(
    catalog: &Catalog,
    n: usize,
    policy: IndexPolicy,
    rng: &mut R,
) -> Vec<usize> {
    let indices = match policy {
        IndexPolicy::FullyRandom => fully_random(catalog, n, rng),
        IndexPolicy::EquallyDistributed => equally_distributed(catalog, n, rng),
    };
    debug!(?policy, n, ?indices, "generated trial order");
    indices
}

/// `n` uniform draws over the whole catalog, never repeating the previous index.
pub fn fully_random<R: Rng + ?Sized>(catalog: &Catalog, n: usize, rng: &mut R) -> Vec<usize> {
    draw_without_repeat(0..catalog.len(), n, rng)
}

/// Per-group sub-counts for `n` trials over four groups.
///
/// The remainder goes to the last groups first: 1 → group 4, 2 → groups 4 and 3,
/// 3 → groups 4, 3 and 2.
pub fn split_counts(n: usize) -> [usize; 4] {
    let base = n / 4;
    let mut counts = [base; 4];
    for slot in counts.iter_mut().rev().take(n % 4) {
        *slot += 1;
    }
    counts
}

/// Draws each group's share from its own range, then shuffles the whole run.
pub fn equally_distributed<R: Rng + ?Sized>(catalog: &Catalog, n: usize, rng: &mut R) -> Vec<usize> {
    let counts = split_counts(n);
    let mut indices = Vec::with_capacity(n);
    for (range, count) in catalog.group_ranges().into_iter().zip(counts) {
        indices.extend(draw_without_repeat(range, count, rng));
    }
    indices.shuffle(rng);
    indices
}

/// Uniform draws from `range`. A draw equal to the previous one is bumped to the
/// next index, wrapping to the start of the range.
///
/// This only prevents immediate repeats; an index can come back later.
pub fn draw_without_repeat<R: Rng + ?Sized>(
    range: Range<usize>,
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    if range.is_empty() || count == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(count);
    let mut last: Option<usize> = None;
    for _ in 0..count {
        let mut index = rng.random_range(range.clone());
        if last == Some(index) {
            index = if index + 1 < range.end {
                index + 1
            } else {
                range.start
            };
        }
        out.push(index);
        last = Some(index);
    }
    out
}
