//! Allele-frequency binning.
//!
//! Each tracked allele id falls into one of 100 frequency bins according to
//! the fraction of the allele pool carrying it. Bin labels are 1-indexed in
//! the output documents, so bin 5 holds alleles at (4%, 5%] of the pool.

use crate::genome::mutation::{Allele, AlleleCount};
use crate::simulation::parameters::AlleleConfig;
use crate::storage::types::{AlleleBins, NormalizedAlleleBins};
use std::collections::HashMap;

/// Number of frequency bins.
pub const BUCKET_COUNT: usize = 100;

/// Frequencies within this distance of a bin boundary count as exactly on
/// it, so an allele at exactly 5% lands in bin 5 rather than 6.
const BOUNDARY_EPSILON: f64 = 1.0e-12;

/// Bin one class map into `buckets`.
fn fill_buckets(counts: &HashMap<u64, Allele>, pool_size: f64, buckets: &mut [u32]) {
    let bucket_count = buckets.len();
    for allele in counts.values() {
        let fraction = allele.count as f64 / pool_size;
        let floati = fraction * bucket_count as f64;
        // Truncation would put a fraction exactly on a boundary into the
        // bin above; nudge it down so a fixed allele (100%) stays in range
        // and an exact 5% lands in bin 5.
        let trunci = (floati + BOUNDARY_EPSILON).trunc();
        let mut index = if floati > trunci - BOUNDARY_EPSILON && floati < trunci + BOUNDARY_EPSILON
        {
            trunci as i64 - 1
        } else {
            floati as i64
        };
        // Out of range is possible when counting without duplicate
        // dedup; clamp back in.
        if index < 0 {
            index = 0;
        } else if index >= bucket_count as i64 {
            index = bucket_count as i64 - 1;
        }
        buckets[index as usize] += 1;
    }
}

/// Build the absolute allele-frequency histogram for one generation.
///
/// The pool is every chromosome set (2N) when duplicate alleles are
/// counted, or every individual (N) when each count is a carrier
/// indicator. With `omit_first_allele_bin` the rare-allele bin is dropped
/// and labels start at 2.
pub fn bin_allele_frequencies(
    counts: &AlleleCount,
    pop_size: u32,
    cfg: &AlleleConfig,
    generation: u32,
) -> AlleleBins {
    let pool_size = if cfg.count_duplicate_alleles {
        2.0 * pop_size as f64
    } else {
        pop_size as f64
    };

    let mut bins = AlleleBins {
        generation,
        bins: (1..=BUCKET_COUNT as u32).collect(),
        deleterious: vec![0; BUCKET_COUNT],
        neutral: vec![0; BUCKET_COUNT],
        favorable: vec![0; BUCKET_COUNT],
        del_initial_alleles: vec![0; BUCKET_COUNT],
        fav_initial_alleles: vec![0; BUCKET_COUNT],
    };

    fill_buckets(&counts.deleterious_dom, pool_size, &mut bins.deleterious);
    fill_buckets(&counts.deleterious_rec, pool_size, &mut bins.deleterious);
    // Written even when empty; downstream plotting needs the zeros.
    fill_buckets(&counts.neutral, pool_size, &mut bins.neutral);
    fill_buckets(&counts.favorable_dom, pool_size, &mut bins.favorable);
    fill_buckets(&counts.favorable_rec, pool_size, &mut bins.favorable);
    fill_buckets(&counts.del_initial, pool_size, &mut bins.del_initial_alleles);
    fill_buckets(&counts.fav_initial, pool_size, &mut bins.fav_initial_alleles);

    if cfg.omit_first_allele_bin {
        bins.bins.remove(0);
        bins.deleterious.remove(0);
        bins.neutral.remove(0);
        bins.favorable.remove(0);
        bins.del_initial_alleles.remove(0);
        bins.fav_initial_alleles.remove(0);
    }

    bins
}

/// Normalize the minor-allele half of the histogram.
///
/// The first `BUCKET_COUNT / 2` bins (one fewer if the first bin was
/// omitted) are divided by the total count across that range, so the
/// normalized bins sum to one whenever any allele falls in it.
pub fn normalize_bins(bins: &AlleleBins, omit_first_bin: bool) -> NormalizedAlleleBins {
    let mut half = BUCKET_COUNT / 2;
    if omit_first_bin {
        // The source bins are already shifted left, so the half-range
        // shrinks by the dropped bin to cover bins 2..=50.
        half -= 1;
    }

    let mut minor_total = 0u64;
    for i in 0..half {
        minor_total += bins.deleterious[i] as u64
            + bins.neutral[i] as u64
            + bins.favorable[i] as u64
            + bins.del_initial_alleles[i] as u64
            + bins.fav_initial_alleles[i] as u64;
    }

    let normalize = |source: &[u32]| -> Vec<f64> {
        source[..half]
            .iter()
            .map(|&count| {
                if minor_total > 0 {
                    count as f64 / minor_total as f64
                } else {
                    0.0
                }
            })
            .collect()
    };

    NormalizedAlleleBins {
        generation: bins.generation,
        bins: (1..=half as u32).collect(),
        deleterious: normalize(&bins.deleterious),
        neutral: normalize(&bins.neutral),
        favorable: normalize(&bins.favorable),
        del_initial_alleles: normalize(&bins.del_initial_alleles),
        fav_initial_alleles: normalize(&bins.fav_initial_alleles),
    }
}
