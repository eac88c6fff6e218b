//! Crossover models for meiosis.
//!
//! Meiosis here is the construction of a single gamete from one parent's two
//! homologs of the same chromosome number. Which linkage blocks the gamete
//! takes from which homolog is decided by the configured crossover model.

use crate::base::SimRng;
use crate::genome::chromosome::Chromosome;
use crate::genome::linkage::LinkageBlock;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The crossover strategy used to build gametes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossoverModel {
    /// Pick one of the two homologs whole-cloth.
    None,
    /// Pick every linkage block from either homolog independently.
    Full,
    /// The biological model: alternating sections of linkage blocks.
    Partial,
}

impl CrossoverModel {
    /// Build one gamete from a parent's two homologs.
    pub fn meiosis(
        &self,
        dad: &Chromosome,
        mom: &Chromosome,
        mean_num_crossovers: u32,
        rng: &mut SimRng,
    ) -> Chromosome {
        match self {
            Self::None => no_crossover(dad, mom, rng),
            Self::Full => full_crossover(dad, mom, rng),
            Self::Partial => partial_crossover(dad, mom, mean_num_crossovers, rng),
        }
    }
}

/// Copy all linkage blocks from one homolog or the other.
fn no_crossover(dad: &Chromosome, mom: &Chromosome, rng: &mut SimRng) -> Chromosome {
    if rng.random_range(0..2) == 0 {
        dad.duplicate()
    } else {
        mom.duplicate()
    }
}

/// Each linkage block can come from either homolog.
fn full_crossover(dad: &Chromosome, mom: &Chromosome, rng: &mut SimRng) -> Chromosome {
    let lbs = dad.num_linkage_blocks();
    let mut gamete = Chromosome::with_capacity(lbs);
    for lb_index in 0..lbs {
        let parent = if rng.random_range(0..2) == 0 { dad } else { mom };
        gamete.push_inherited(LinkageBlock::new_child(parent.linkage_block(lb_index)));
    }
    gamete
}

/// Build the gamete from alternating sections of linkage blocks.
///
/// `mean_num_crossovers` is the average number of crossovers for the
/// chromosome pair during meiosis I metaphase, so the crossover count for
/// this one chromatid is drawn uniformly from 0..=mean. For k crossovers the
/// chromosome is modeled as 2k alternating sections starting with the
/// primary homolog; keeping the section count even makes the primary and
/// secondary mean section sizes comparable.
fn partial_crossover(
    dad: &Chromosome,
    mom: &Chromosome,
    mean_num_crossovers: u32,
    rng: &mut SimRng,
) -> Chromosome {
    let lbs = dad.num_linkage_blocks();

    let (primary, secondary) = if rng.random_range(0..2) == 0 {
        (dad, mom)
    } else {
        (mom, dad)
    };

    let num_crossovers = rng.random_range(0..=mean_num_crossovers) as usize;
    if num_crossovers == 0 {
        // No crossover: the gamete is a whole-copy of the primary.
        return primary.duplicate();
    }
    let num_sections = 2 * num_crossovers;
    let mean_section_size = (lbs as f64 / num_sections as f64).round() as usize;

    let mut gamete = Chromosome::with_capacity(lbs);
    let mut beg_index = 0usize;
    let max_index = lbs - 1;
    let mut from_primary = true;
    for section in 1..=num_sections {
        if beg_index > max_index {
            break;
        }
        let section_len = if mean_section_size == 0 {
            1
        } else {
            rng.random_range(0..2 * mean_section_size) + 1
        };
        let mut end_index = (beg_index + section_len - 1).min(max_index);
        if section >= num_sections {
            // The last section always reaches the end of the chromosome.
            end_index = max_index;
        }
        let parent = if from_primary { primary } else { secondary };
        for lb_index in beg_index..=end_index {
            gamete.push_inherited(LinkageBlock::new_child(parent.linkage_block(lb_index)));
        }

        beg_index = end_index + 1;
        from_primary = !from_primary;
    }
    gamete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{IdAllocator, IdSource};
    use crate::evolution::mutation::MutationModel;
    use crate::genome::mutation::AlleleCount;
    use crate::simulation::parameters::MutationConfig;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn mutated_chromosome(lbs: usize, mutations: usize, seed: u64) -> Chromosome {
        let model = MutationModel::from_config(&MutationConfig {
            frac_fav_mutn: 0.0,
            fraction_neutral: 0.0,
            ..MutationConfig::default()
        });
        let mut ids = IdSource::new(Arc::new(IdAllocator::new()), 4096);
        let mut rng = SimRng::seed_from_u64(seed);
        let mut chr = Chromosome::new(lbs);
        for i in 0..mutations {
            chr.append_mutation(i % lbs, &model, &mut ids, &mut rng);
        }
        chr
    }

    fn tracked_ids(chr: &Chromosome) -> Vec<u64> {
        let mut count = AlleleCount::new();
        chr.count_alleles(&mut count);
        let mut ids: Vec<u64> = count
            .deleterious_dom
            .keys()
            .chain(count.deleterious_rec.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_no_crossover_copies_one_parent() {
        let dad = mutated_chromosome(10, 7, 1);
        let mom = mutated_chromosome(10, 13, 2);
        let mut rng = SimRng::seed_from_u64(42);

        let gamete = CrossoverModel::None.meiosis(&dad, &mom, 2, &mut rng);
        let ids = tracked_ids(&gamete);
        assert!(ids == tracked_ids(&dad) || ids == tracked_ids(&mom));
        assert!(gamete.num_mutations() == dad.num_mutations()
            || gamete.num_mutations() == mom.num_mutations());
    }

    #[test]
    fn test_full_crossover_mixes_blocks() {
        let dad = mutated_chromosome(64, 64, 3);
        let mom = mutated_chromosome(64, 64, 4);
        let mut rng = SimRng::seed_from_u64(42);

        let gamete = CrossoverModel::Full.meiosis(&dad, &mom, 2, &mut rng);
        assert_eq!(gamete.num_linkage_blocks(), 64);

        // With 64 blocks the odds of taking all blocks from one parent are
        // astronomically small.
        let ids = tracked_ids(&gamete);
        assert_ne!(ids, tracked_ids(&dad));
        assert_ne!(ids, tracked_ids(&mom));

        // Every inherited block's total is accumulated.
        let block_total: u32 = gamete.linkage_blocks().map(|lb| lb.num_mutations()).sum();
        assert_eq!(block_total, gamete.num_mutations());
    }

    #[test]
    fn test_partial_crossover_zero_mean_copies_primary() {
        let dad = mutated_chromosome(10, 5, 5);
        let mom = mutated_chromosome(10, 9, 6);
        let mut rng = SimRng::seed_from_u64(42);

        // mean_num_crossovers == 0 always draws zero crossovers.
        let gamete = CrossoverModel::Partial.meiosis(&dad, &mom, 0, &mut rng);
        let ids = tracked_ids(&gamete);
        assert!(ids == tracked_ids(&dad) || ids == tracked_ids(&mom));
    }

    #[test]
    fn test_partial_crossover_full_length() {
        let dad = mutated_chromosome(40, 30, 7);
        let mom = mutated_chromosome(40, 30, 8);
        for seed in 0..50 {
            let mut rng = SimRng::seed_from_u64(seed);
            let gamete = CrossoverModel::Partial.meiosis(&dad, &mom, 3, &mut rng);
            assert_eq!(gamete.num_linkage_blocks(), 40, "seed {seed}");
            let block_total: u32 = gamete.linkage_blocks().map(|lb| lb.num_mutations()).sum();
            assert_eq!(block_total, gamete.num_mutations(), "seed {seed}");
        }
    }

    #[test]
    fn test_partial_crossover_blocks_come_from_parents() {
        let dad = mutated_chromosome(20, 20, 9);
        let mom = mutated_chromosome(20, 20, 10);
        let dad_ids = tracked_ids(&dad);
        let mom_ids = tracked_ids(&mom);
        let mut rng = SimRng::seed_from_u64(11);

        let gamete = CrossoverModel::Partial.meiosis(&dad, &mom, 2, &mut rng);
        for id in tracked_ids(&gamete) {
            assert!(dad_ids.binary_search(&id).is_ok() || mom_ids.binary_search(&id).is_ok());
        }
    }

    #[test]
    fn test_partial_crossover_single_block_chromosome() {
        let dad = mutated_chromosome(1, 2, 12);
        let mom = mutated_chromosome(1, 3, 13);
        for seed in 0..20 {
            let mut rng = SimRng::seed_from_u64(seed);
            let gamete = CrossoverModel::Partial.meiosis(&dad, &mom, 4, &mut rng);
            assert_eq!(gamete.num_linkage_blocks(), 1);
        }
    }
}
