//! Chromosomes: ordered arrays of linkage blocks.

use crate::base::{IdSource, SimRng};
use crate::evolution::mutation::MutationModel;
use crate::genome::linkage::LinkageBlock;
use crate::genome::mutation::AlleleCount;

/// One chromosome in an individual's genome: a fixed-length run of linkage
/// blocks plus a running total of their mutations (mutations and initial
/// alleles alike).
#[derive(Debug, Clone)]
pub struct Chromosome {
    linkage_blocks: Vec<LinkageBlock>,
    num_mutations: u32,
}

impl Chromosome {
    /// Create a genesis chromosome of `lbs_per_chromosome` empty blocks.
    pub fn new(lbs_per_chromosome: usize) -> Self {
        Self {
            linkage_blocks: (0..lbs_per_chromosome).map(|_| LinkageBlock::new()).collect(),
            num_mutations: 0,
        }
    }

    /// Create an empty chromosome a crossover routine will fill block by
    /// block.
    pub(crate) fn with_capacity(lbs_per_chromosome: usize) -> Self {
        Self {
            linkage_blocks: Vec::with_capacity(lbs_per_chromosome),
            num_mutations: 0,
        }
    }

    /// Number of linkage blocks.
    #[inline]
    pub fn num_linkage_blocks(&self) -> usize {
        self.linkage_blocks.len()
    }

    /// Running total of mutations across all blocks.
    #[inline]
    pub fn num_mutations(&self) -> u32 {
        self.num_mutations
    }

    /// Borrow one linkage block.
    #[inline]
    pub fn linkage_block(&self, index: usize) -> &LinkageBlock {
        &self.linkage_blocks[index]
    }

    /// Iterate the linkage blocks in order.
    pub fn linkage_blocks(&self) -> impl Iterator<Item = &LinkageBlock> {
        self.linkage_blocks.iter()
    }

    /// Append an inherited block, accumulating its mutation total.
    pub(crate) fn push_inherited(&mut self, lb: LinkageBlock) {
        self.num_mutations += lb.num_mutations();
        self.linkage_blocks.push(lb);
    }

    /// Whole-copy inheritance: a new chromosome whose blocks each chain back
    /// to this chromosome's blocks.
    pub fn duplicate(&self) -> Chromosome {
        Chromosome {
            linkage_blocks: self.linkage_blocks.iter().map(LinkageBlock::new_child).collect(),
            num_mutations: self.num_mutations,
        }
    }

    /// Create and add a new mutation to the block at `lb_index`.
    pub fn append_mutation(
        &mut self,
        lb_index: usize,
        model: &MutationModel,
        ids: &mut IdSource,
        rng: &mut SimRng,
    ) {
        self.linkage_blocks[lb_index].append_mutation(model, ids, rng);
        self.num_mutations += 1;
    }

    /// Plant one half of an initial allele pair on the block at `lb_index`.
    pub fn plant_initial_allele(&mut self, lb_index: usize, allele: crate::genome::Mutation) {
        self.linkage_blocks[lb_index].append_initial_allele(allele);
        self.num_mutations += 1;
    }

    /// Combined fitness effect of all blocks (additive).
    pub fn sum_fitness(&self) -> f64 {
        self.linkage_blocks.iter().map(LinkageBlock::sum_fitness).sum()
    }

    /// Number of deleterious, neutral, favorable mutations and the mean
    /// fitness effect of the deleterious and favorable classes, aggregated
    /// over all blocks.
    pub fn mutation_stats(&self) -> (u32, u32, u32, f64, f64) {
        let mut deleterious = 0u32;
        let mut neutral = 0u32;
        let mut favorable = 0u32;
        let mut av_del = 0.0;
        let mut av_fav = 0.0;
        for lb in &self.linkage_blocks {
            let (d, n, f, ad, af) = lb.mutation_stats();
            deleterious += d;
            neutral += n;
            favorable += f;
            av_del += d as f64 * ad;
            av_fav += f as f64 * af;
        }
        if deleterious > 0 {
            av_del /= deleterious as f64;
        }
        if favorable > 0 {
            av_fav /= favorable as f64;
        }
        (deleterious, neutral, favorable, av_del, av_fav)
    }

    /// Initial-allele counts and mean fitness effects, aggregated over all
    /// blocks.
    pub fn initial_allele_stats(&self) -> (u32, u32, f64, f64) {
        let mut deleterious = 0u32;
        let mut favorable = 0u32;
        let mut av_del = 0.0;
        let mut av_fav = 0.0;
        for lb in &self.linkage_blocks {
            let (d, f, ad, af) = lb.initial_allele_stats();
            deleterious += d;
            favorable += f;
            av_del += d as f64 * ad;
            av_fav += f as f64 * af;
        }
        if deleterious > 0 {
            av_del /= deleterious as f64;
        }
        if favorable > 0 {
            av_fav /= favorable as f64;
        }
        (deleterious, favorable, av_del, av_fav)
    }

    /// Add every allele on this chromosome to `target`.
    pub fn count_alleles(&self, target: &mut AlleleCount) {
        for lb in &self.linkage_blocks {
            lb.count_alleles(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{IdAllocator, IdSource};
    use crate::simulation::parameters::MutationConfig;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn deleterious_only_model() -> MutationModel {
        MutationModel::from_config(&MutationConfig {
            frac_fav_mutn: 0.0,
            fraction_neutral: 0.0,
            ..MutationConfig::default()
        })
    }

    #[test]
    fn test_new_chromosome() {
        let chr = Chromosome::new(8);
        assert_eq!(chr.num_linkage_blocks(), 8);
        assert_eq!(chr.num_mutations(), 0);
        assert_eq!(chr.sum_fitness(), 0.0);
    }

    #[test]
    fn test_append_mutation_tracks_total() {
        let model = deleterious_only_model();
        let mut ids = IdSource::new(Arc::new(IdAllocator::new()), 64);
        let mut rng = SimRng::seed_from_u64(42);
        let mut chr = Chromosome::new(4);
        for i in 0..12 {
            chr.append_mutation(i % 4, &model, &mut ids, &mut rng);
        }
        assert_eq!(chr.num_mutations(), 12);

        // The chromosome total equals the sum over its blocks.
        let block_total: u32 = chr.linkage_blocks().map(|lb| lb.num_mutations()).sum();
        assert_eq!(block_total, chr.num_mutations());
    }

    #[test]
    fn test_duplicate_preserves_totals() {
        let model = deleterious_only_model();
        let mut ids = IdSource::new(Arc::new(IdAllocator::new()), 64);
        let mut rng = SimRng::seed_from_u64(9);
        let mut chr = Chromosome::new(4);
        for i in 0..8 {
            chr.append_mutation(i % 4, &model, &mut ids, &mut rng);
        }

        let copy = chr.duplicate();
        assert_eq!(copy.num_mutations(), chr.num_mutations());
        assert_eq!(copy.num_linkage_blocks(), chr.num_linkage_blocks());
        assert!((copy.sum_fitness() - chr.sum_fitness()).abs() < 1e-12);

        let mut original = AlleleCount::new();
        chr.count_alleles(&mut original);
        let mut copied = AlleleCount::new();
        copy.count_alleles(&mut copied);
        assert_eq!(original.total_unique(), copied.total_unique());
    }

    #[test]
    fn test_mutation_stats_aggregate() {
        let model = deleterious_only_model();
        let mut ids = IdSource::new(Arc::new(IdAllocator::new()), 64);
        let mut rng = SimRng::seed_from_u64(4);
        let mut chr = Chromosome::new(2);
        for i in 0..10 {
            chr.append_mutation(i % 2, &model, &mut ids, &mut rng);
        }
        let (d, n, f, av_del, av_fav) = chr.mutation_stats();
        assert_eq!((d, n, f), (10, 0, 0));
        assert!(av_del < 0.0);
        assert_eq!(av_fav, 0.0);
        assert!((chr.sum_fitness() - av_del * 10.0).abs() < 1e-6);
    }
}
