//! Distribution-of-fitness binning.
//!
//! Tracked deleterious and favorable alleles are binned by mapping each
//! fitness effect back to the distance variable of the sampling
//! distribution, normalized against the expected per-bin counts in the
//! absence of selection, and smoothed with three-point averaging. The
//! result is one document per generation for each of the two classes.

use crate::genome::mutation::{Allele, AlleleCount};
use crate::simulation::parameters::MutationConfig;
use crate::storage::types::FitnessDistribution;
use std::collections::HashMap;

/// Number of fitness bins. Arrays below carry one extra slot so the bins
/// can be addressed 1-based like the output numbering.
const BINS: usize = 50;

/// Map each allele's fitness effect to its distance-variable bin.
///
/// For deleterious effects (`max_fav_fitness_gain` zero) the distance is
/// `-ln|f|`; for favorable effects it is `-ln(f / max_fav_fitness_gain)`.
fn fill_fitness_bins(
    alleles: &HashMap<u64, Allele>,
    max_fav_fitness_gain: f64,
    bin_width: f64,
    bins: &mut [f64; BINS + 1],
) {
    for allele in alleles.values() {
        let d = if max_fav_fitness_gain <= 0.0 {
            -((allele.effect as f64).abs()).ln()
        } else {
            -((allele.effect as f64) / max_fav_fitness_gain).ln()
        };
        let k = 1 + (d / bin_width) as i64;
        if k > 0 && k <= BINS as i64 {
            // Same id, same fitness, so the whole occurrence count lands
            // in one bin.
            bins[k as usize] += allele.count as f64;
        }
    }
}

/// Three-point smoothing, 1-based over bins 1..=50. Interior bins become
/// `0.5 * (old[k] + 0.5 * (old[k-1] + old[k+1]))`; bin 50 averages with
/// bin 49; bin 1 is left alone.
fn smooth(rec: &mut [f64; BINS + 1], dom: &mut [f64; BINS + 1], passes: usize) {
    let mut rec_work = [0.0f64; BINS + 1];
    let mut dom_work = [0.0f64; BINS + 1];
    for _ in 0..passes {
        let mut rec_prev = rec[1];
        let mut dom_prev = dom[1];
        for k in 2..=BINS - 1 {
            let rec_avg = rec[k] + 0.5 * (rec_prev + rec[k + 1]);
            rec_prev = rec[k];
            rec_work[k] = 0.5 * rec_avg;
            let dom_avg = dom[k] + 0.5 * (dom_prev + dom[k + 1]);
            dom_prev = dom[k];
            dom_work[k] = 0.5 * dom_avg;
        }
        rec[BINS] = 0.5 * (rec[BINS - 1] + rec[BINS]);
        dom[BINS] = 0.5 * (dom[BINS - 1] + dom[BINS]);
        rec[2..BINS].copy_from_slice(&rec_work[2..BINS]);
        dom[2..BINS].copy_from_slice(&dom_work[2..BINS]);
    }
}

/// Compute the deleterious and favorable fitness-distribution documents.
pub fn fitness_distributions(
    counts: &AlleleCount,
    pop_size: u32,
    gen_num: u32,
    mcfg: &MutationConfig,
) -> (FitnessDistribution, FitnessDistribution) {
    // Expected number of mutations in the absence of selection.
    let mutn_sum = pop_size as f64 * gen_num as f64 * mcfg.mutn_rate;
    let frac_fav_mutn = mcfg.frac_fav_mutn;
    let tracking_threshold = (1.0 / mcfg.genome_size).max(mcfg.tracking_threshold);
    let max_fav_fitness_gain = mcfg.max_fav_fitness_gain;
    let alpha_del = mcfg.effective_alpha_del();
    let alpha_fav = mcfg.effective_alpha_fav();
    let gamma_del = mcfg.effective_gamma_del();
    let gamma_fav = mcfg.effective_gamma_fav();

    let del_bin_width = -tracking_threshold.ln() / BINS as f64;
    let fav_bin_width = if max_fav_fitness_gain > 0.0 {
        -(tracking_threshold / max_fav_fitness_gain).ln() / BINS as f64
    } else {
        del_bin_width
    };

    // Expected counts per bin from the sampling distribution, using the
    // bin boundaries x_k = (k * width / alpha)^(1/gamma).
    let mut del_refr = [0.0f64; BINS + 1];
    let mut fav_refr = [0.0f64; BINS + 1];
    let mut x0 = 0.0;
    let mut y0 = 0.0;
    for k in 1..=BINS {
        let x1 = (del_bin_width * k as f64 / alpha_del).powf(1.0 / gamma_del);
        del_refr[k] = (1.0 - frac_fav_mutn) * mutn_sum * (x1 - x0);
        let y1 = (fav_bin_width * k as f64 / alpha_fav).powf(1.0 / gamma_fav);
        fav_refr[k] = frac_fav_mutn * mutn_sum * (y1 - y0);
        x0 = x1;
        y0 = y1;
    }

    // Observed counts, split by dominance.
    let mut del_rec = [0.0f64; BINS + 1];
    let mut del_dom = [0.0f64; BINS + 1];
    let mut fav_rec = [0.0f64; BINS + 1];
    let mut fav_dom = [0.0f64; BINS + 1];
    fill_fitness_bins(&counts.deleterious_rec, 0.0, del_bin_width, &mut del_rec);
    fill_fitness_bins(&counts.deleterious_dom, 0.0, del_bin_width, &mut del_dom);
    fill_fitness_bins(
        &counts.favorable_rec,
        max_fav_fitness_gain,
        fav_bin_width,
        &mut fav_rec,
    );
    fill_fitness_bins(
        &counts.favorable_dom,
        max_fav_fitness_gain,
        fav_bin_width,
        &mut fav_dom,
    );

    // Fitness at each bin boundary and midpoints between them.
    let mut del_midpoint = [0.0f64; BINS + 2];
    let mut fav_midpoint = [0.0f64; BINS + 2];
    let mut del_boundary = [0.0f64; BINS + 2];
    let mut fav_boundary = [0.0f64; BINS + 2];
    for k in 1..=BINS + 1 {
        del_boundary[k] = (-del_bin_width * (k as f64 - 1.0)).exp();
        fav_boundary[k] = max_fav_fitness_gain * (-fav_bin_width * (k as f64 - 1.0)).exp();
        if k > 1 {
            del_midpoint[k - 1] = (del_boundary[k] + del_boundary[k - 1]) / 2.0;
            fav_midpoint[k - 1] = (fav_boundary[k] + fav_boundary[k - 1]) / 2.0;
        }
    }

    // Normalize by the expected counts, the non-neutral fraction, and the
    // dominance-class fraction.
    let mut non_neutral = 1.0 - mcfg.fraction_neutral;
    if non_neutral == 0.0 {
        non_neutral = 1.0;
    }
    let fraction_recessive = mcfg.fraction_recessive;
    for k in 1..=BINS {
        if del_refr[k] > 0.0 && fraction_recessive > 0.0 {
            del_rec[k] = del_rec[k] / (fraction_recessive * del_refr[k]) / non_neutral;
        } else {
            del_rec[k] = 0.0;
        }
        if del_refr[k] > 0.0 && fraction_recessive < 1.0 {
            del_dom[k] = del_dom[k] / ((1.0 - fraction_recessive) * del_refr[k]) / non_neutral;
        } else {
            del_dom[k] = 0.0;
        }

        if fav_refr[k] > 0.0 && fraction_recessive > 0.0 {
            fav_rec[k] = fav_rec[k] / (fraction_recessive * fav_refr[k]) / non_neutral;
        } else {
            fav_rec[k] = 0.0;
        }
        if fav_refr[k] > 0.0 && fraction_recessive < 1.0 {
            fav_dom[k] = fav_dom[k] / ((1.0 - fraction_recessive) * fav_refr[k]) / non_neutral;
        } else {
            fav_dom[k] = 0.0;
        }
    }

    // Deleterious: three smoothing passes. Favorable: cap at 100, then two
    // passes.
    smooth(&mut del_rec, &mut del_dom, 3);
    for k in 1..=BINS {
        fav_rec[k] = fav_rec[k].min(100.0);
        fav_dom[k] = fav_dom[k].min(100.0);
    }
    smooth(&mut fav_rec, &mut fav_dom, 2);

    let deleterious = FitnessDistribution {
        generation: gen_num,
        bin_midpoint_fitness: del_midpoint[1..=BINS].to_vec(),
        recessive: del_rec[1..=BINS].to_vec(),
        dominant: del_dom[1..=BINS].to_vec(),
    };
    let favorable = FitnessDistribution {
        generation: gen_num,
        bin_midpoint_fitness: fav_midpoint[1..=BINS].to_vec(),
        recessive: fav_rec[1..=BINS].to_vec(),
        dominant: fav_dom[1..=BINS].to_vec(),
    };
    (deleterious, favorable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::mutation::{Mutation, MutationKind};

    fn counts_with(entries: &[(u64, u32, f32, MutationKind, bool)]) -> AlleleCount {
        let mut counts = AlleleCount::new();
        for &(id, count, effect, kind, dominant) in entries {
            let m = Mutation::new(id, effect, kind, dominant);
            for _ in 0..count {
                let mut one = AlleleCount::new();
                one.mark(&m);
                counts.absorb(&one);
            }
        }
        counts
    }

    #[test]
    fn test_empty_counts_produce_zero_bins() {
        let cfg = MutationConfig::default();
        let (del, fav) = fitness_distributions(&AlleleCount::new(), 100, 10, &cfg);
        assert_eq!(del.bin_midpoint_fitness.len(), 50);
        assert_eq!(fav.recessive.len(), 50);
        assert!(del.recessive.iter().all(|&v| v == 0.0));
        assert!(del.dominant.iter().all(|&v| v == 0.0));
        assert!(fav.dominant.iter().all(|&v| v == 0.0));
        assert_eq!(del.generation, 10);
    }

    #[test]
    fn test_deleterious_midpoints_decreasing_from_one() {
        let cfg = MutationConfig::default();
        let (del, _) = fitness_distributions(&AlleleCount::new(), 100, 1, &cfg);
        // First boundary fitness is exp(0) = 1, so the first midpoint is
        // just under 1.
        assert!(del.bin_midpoint_fitness[0] < 1.0);
        assert!(del.bin_midpoint_fitness[0] > 0.9);
        for pair in del.bin_midpoint_fitness.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn test_favorable_midpoints_scaled_by_max_gain() {
        let cfg = MutationConfig::default();
        let (_, fav) = fitness_distributions(&AlleleCount::new(), 100, 1, &cfg);
        // Favorable boundaries start at max_fav_fitness_gain.
        assert!(fav.bin_midpoint_fitness[0] < cfg.max_fav_fitness_gain);
        assert!(fav.bin_midpoint_fitness[0] > 0.9 * cfg.max_fav_fitness_gain);
    }

    #[test]
    fn test_unit_effect_lands_in_first_bin() {
        // |f| = 1.0 maps to distance 0, bin 1.
        let counts = counts_with(&[(1, 5, -1.0, MutationKind::Deleterious, false)]);
        let cfg = MutationConfig {
            fraction_recessive: 1.0,
            ..MutationConfig::default()
        };
        let (del, _) = fitness_distributions(&counts, 100, 5, &cfg);
        // With everything recessive, the dominant column is all zeros.
        assert!(del.dominant.iter().all(|&v| v == 0.0));
        // Smoothing spreads bin 1 into its neighbors but the mass stays at
        // the high-fitness end.
        let head: f64 = del.recessive[..5].iter().sum();
        let tail: f64 = del.recessive[5..].iter().sum();
        assert!(head > 0.0);
        assert!(tail.abs() < 1e-9);
    }

    #[test]
    fn test_smooth_preserves_constant() {
        let mut rec = [1.0f64; BINS + 1];
        let mut dom = [1.0f64; BINS + 1];
        rec[0] = 0.0;
        dom[0] = 0.0;
        smooth(&mut rec, &mut dom, 3);
        for k in 1..=BINS {
            assert!((rec[k] - 1.0).abs() < 1e-12, "bin {k}");
            assert!((dom[k] - 1.0).abs() < 1e-12, "bin {k}");
        }
    }

    #[test]
    fn test_smooth_boundary_rule() {
        let mut rec = [0.0f64; BINS + 1];
        let mut dom = [0.0f64; BINS + 1];
        rec[49] = 2.0;
        rec[50] = 4.0;
        smooth(&mut rec, &mut dom, 1);
        // Bin 50 becomes the average of old bins 49 and 50.
        assert!((rec[50] - 3.0).abs() < 1e-12);
    }
}
