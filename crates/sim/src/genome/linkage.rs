//! Linkage blocks and their ancestral mutation chains.
//!
//! With a typical 10K population (30K during mating) and ~1000 linkage
//! blocks per individual there are a lot of blocks alive at once, so saving
//! space in them matters. A block stores only the mutations introduced in
//! the generation that created it; older mutations are reached through a
//! shared, immutable chain of `MutationList` nodes back through its
//! ancestors. Inheriting a block therefore never copies mutation vectors,
//! and processing a generation touches only that generation's new
//! mutations.

use crate::base::{IdSource, SimRng};
use crate::evolution::mutation::MutationModel;
use crate::genome::mutation::{AlleleCount, Mutation, MutationKind};
use std::sync::Arc;

/// One generation's worth of mutations for one linkage block, plus the link
/// back to the previous generation's node (`None` at the founding block).
#[derive(Debug, Clone, Default)]
pub struct MutationList {
    new: Vec<Mutation>,
    parent: Option<Arc<MutationList>>,
}

/// One linkage block in the genome of one individual.
///
/// Tracks the block's mutations and the cumulative fitness effect they have
/// on the individual. The per-class counters and fitness sums are cumulative
/// over the whole ancestral chain, so the block's totals are available
/// without walking it.
///
/// The fitness sums are `f32` to save space; this changes the population
/// mean fitness only past the eleventh decimal place while saving hundreds
/// of megabytes in large runs.
#[derive(Debug, Clone)]
pub struct LinkageBlock {
    mutations: Arc<MutationList>,

    num_deleterious: u16,
    num_neutral: u16,
    num_favorable: u16,
    num_del_initial: u16,
    num_fav_initial: u16,

    del_effect: f32,
    fav_effect: f32,
    del_initial_effect: f32,
    fav_initial_effect: f32,
}

impl LinkageBlock {
    /// Create an empty block for the genesis generation.
    pub fn new() -> Self {
        Self {
            mutations: Arc::new(MutationList::default()),
            num_deleterious: 0,
            num_neutral: 0,
            num_favorable: 0,
            num_del_initial: 0,
            num_fav_initial: 0,
            del_effect: 0.0,
            fav_effect: 0.0,
            del_initial_effect: 0.0,
            fav_initial_effect: 0.0,
        }
    }

    /// Create the block a child inherits from `parent`.
    ///
    /// The child starts with the parent's cumulative counters and fitness
    /// sums, and its mutation node links back to the parent's node. If the
    /// parent carries no mutations at all there is nothing to point back to,
    /// so the child starts a fresh chain.
    pub fn new_child(parent: &LinkageBlock) -> Self {
        if parent.num_mutations() == 0 {
            return Self::new();
        }
        Self {
            mutations: Arc::new(MutationList {
                new: Vec::new(),
                parent: Some(parent.mutations.clone()),
            }),
            num_deleterious: parent.num_deleterious,
            num_neutral: parent.num_neutral,
            num_favorable: parent.num_favorable,
            num_del_initial: parent.num_del_initial,
            num_fav_initial: parent.num_fav_initial,
            del_effect: parent.del_effect,
            fav_effect: parent.fav_effect,
            del_initial_effect: parent.del_initial_effect,
            fav_initial_effect: parent.fav_initial_effect,
        }
    }

    /// Current total number of mutations and initial alleles on this block,
    /// tracked or not.
    #[inline]
    pub fn num_mutations(&self) -> u32 {
        self.num_deleterious as u32
            + self.num_neutral as u32
            + self.num_favorable as u32
            + self.num_del_initial as u32
            + self.num_fav_initial as u32
    }

    /// Push a mutation value onto this block's own node.
    ///
    /// Copy-on-write: if the node is shared (a sibling inherited it), the
    /// node is cloned first, so sibling blocks can never observe each
    /// other's new mutations.
    fn push_tracked(&mut self, m: Mutation) {
        Arc::make_mut(&mut self.mutations).new.push(m);
    }

    /// Create and add one new mutation to this block.
    ///
    /// The mutation is classified and its fitness effect sampled from the
    /// configured distribution. The counters and fitness sums always absorb
    /// it; the mutation is retained as an identifiable object only when its
    /// absolute effect clears the tracking threshold (neutrals only when
    /// neutral tracking is on).
    pub fn append_mutation(&mut self, model: &MutationModel, ids: &mut IdSource, rng: &mut SimRng) {
        match model.classify(rng) {
            MutationKind::Deleterious => {
                let effect = model.deleterious_effect(rng);
                if model.is_tracked(effect) {
                    let dominant = model.draw_dominance(rng);
                    self.push_tracked(Mutation::new(
                        ids.next_id(),
                        effect,
                        MutationKind::Deleterious,
                        dominant,
                    ));
                }
                self.num_deleterious += 1;
                // Only the additive combination model is supported, so a
                // running sum is the right cache.
                self.del_effect += effect;
            }
            MutationKind::Neutral => {
                if model.track_neutrals() {
                    let dominant = model.draw_dominance(rng);
                    self.push_tracked(Mutation::new(
                        ids.next_id(),
                        0.0,
                        MutationKind::Neutral,
                        dominant,
                    ));
                }
                self.num_neutral += 1;
            }
            MutationKind::Favorable => {
                let effect = model.favorable_effect(rng);
                if model.is_tracked(effect) {
                    let dominant = model.draw_dominance(rng);
                    self.push_tracked(Mutation::new(
                        ids.next_id(),
                        effect,
                        MutationKind::Favorable,
                        dominant,
                    ));
                }
                self.num_favorable += 1;
                self.fav_effect += effect;
            }
            // classify never yields the initial-allele kinds
            kind => debug_assert!(
                false,
                "unexpected mutation classification: {kind:?}"
            ),
        }
    }

    /// Add one half of an initial contrasting allele pair to this block.
    /// Initial alleles are always tracked.
    pub fn append_initial_allele(&mut self, allele: Mutation) {
        match allele.kind() {
            MutationKind::FavorableInitial => {
                self.num_fav_initial += 1;
                self.fav_initial_effect += allele.fitness_effect();
            }
            MutationKind::DeleteriousInitial => {
                self.num_del_initial += 1;
                self.del_initial_effect += allele.fitness_effect();
            }
            kind => {
                debug_assert!(false, "not an initial allele: {kind:?}");
                return;
            }
        }
        self.push_tracked(allele);
    }

    /// Combined fitness effect of everything on this block (additive).
    #[inline]
    pub fn sum_fitness(&self) -> f64 {
        (self.del_effect + self.fav_effect + self.del_initial_effect + self.fav_initial_effect)
            as f64
    }

    /// Number of deleterious, neutral, favorable mutations and the mean
    /// fitness effect of the deleterious and favorable classes.
    pub fn mutation_stats(&self) -> (u32, u32, u32, f64, f64) {
        let deleterious = self.num_deleterious as u32;
        let mut av_del = self.del_effect as f64;
        if deleterious > 0 {
            av_del /= deleterious as f64;
        }
        let favorable = self.num_favorable as u32;
        let mut av_fav = self.fav_effect as f64;
        if favorable > 0 {
            av_fav /= favorable as f64;
        }
        (deleterious, self.num_neutral as u32, favorable, av_del, av_fav)
    }

    /// Number of deleterious and favorable initial alleles and the mean
    /// fitness effect of each class.
    pub fn initial_allele_stats(&self) -> (u32, u32, f64, f64) {
        let deleterious = self.num_del_initial as u32;
        let mut av_del = 0.0;
        if deleterious > 0 {
            av_del = self.del_initial_effect as f64 / deleterious as f64;
        }
        let favorable = self.num_fav_initial as u32;
        let mut av_fav = 0.0;
        if favorable > 0 {
            av_fav = self.fav_initial_effect as f64 / favorable as f64;
        }
        (deleterious, favorable, av_del, av_fav)
    }

    /// Add every tracked allele on this block to `target`, walking the
    /// mutation chain back through all ancestors. A chain is a strict
    /// ancestry, so no mutation is ever visited twice within one block.
    pub fn count_alleles(&self, target: &mut AlleleCount) {
        let mut node: Option<&MutationList> = Some(&self.mutations);
        while let Some(list) = node {
            for m in &list.new {
                target.mark(m);
            }
            node = list.parent.as_deref();
        }
    }
}

impl Default for LinkageBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Add an initial contrasting allele pair to two blocks: the favorable
/// allele to `lb_fav`, the deleterious allele to `lb_del`. The two blocks
/// are the same position on the same chromosome number, one from each
/// parental set.
pub fn append_initial_allele_pair(
    lb_fav: &mut LinkageBlock,
    lb_del: &mut LinkageBlock,
    fav: Mutation,
    del: Mutation,
) {
    lb_fav.append_initial_allele(fav);
    lb_del.append_initial_allele(del);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{IdAllocator, IdSource};
    use crate::evolution::mutation::MutationModel;
    use crate::simulation::parameters::MutationConfig;
    use rand::SeedableRng;
    use std::sync::Arc as StdArc;

    fn test_ids() -> IdSource {
        IdSource::new(StdArc::new(IdAllocator::new()), 1024)
    }

    fn test_rng(seed: u64) -> SimRng {
        SimRng::seed_from_u64(seed)
    }

    fn deleterious_only_model() -> MutationModel {
        let cfg = MutationConfig {
            frac_fav_mutn: 0.0,
            fraction_neutral: 0.0,
            ..MutationConfig::default()
        };
        MutationModel::from_config(&cfg)
    }

    #[test]
    fn test_new_block_is_empty() {
        let lb = LinkageBlock::new();
        assert_eq!(lb.num_mutations(), 0);
        assert_eq!(lb.sum_fitness(), 0.0);
    }

    #[test]
    fn test_append_mutation_updates_counters_and_sum() {
        let model = deleterious_only_model();
        let mut ids = test_ids();
        let mut rng = test_rng(42);
        let mut lb = LinkageBlock::new();
        for _ in 0..10 {
            lb.append_mutation(&model, &mut ids, &mut rng);
        }
        assert_eq!(lb.num_mutations(), 10);
        assert!(lb.sum_fitness() < 0.0);

        let (del, neut, fav, av_del, _) = lb.mutation_stats();
        assert_eq!((del, neut, fav), (10, 0, 0));
        assert!(av_del < 0.0);
    }

    #[test]
    fn test_child_inherits_counters_and_chain() {
        let model = deleterious_only_model();
        let mut ids = test_ids();
        let mut rng = test_rng(7);
        let mut parent = LinkageBlock::new();
        for _ in 0..5 {
            parent.append_mutation(&model, &mut ids, &mut rng);
        }

        let child = LinkageBlock::new_child(&parent);
        assert_eq!(child.num_mutations(), parent.num_mutations());
        assert_eq!(child.sum_fitness(), parent.sum_fitness());

        // Walking the chain reproduces the cached totals.
        let mut count = AlleleCount::new();
        child.count_alleles(&mut count);
        assert_eq!(
            count.deleterious_dom.len() + count.deleterious_rec.len(),
            5
        );
    }

    #[test]
    fn test_child_of_empty_parent_has_no_back_link() {
        let parent = LinkageBlock::new();
        let child = LinkageBlock::new_child(&parent);
        assert!(child.mutations.parent.is_none());
        assert_eq!(child.num_mutations(), 0);
    }

    #[test]
    fn test_sibling_blocks_do_not_share_new_mutations() {
        let model = deleterious_only_model();
        let mut ids = test_ids();
        let mut rng = test_rng(11);
        let mut parent = LinkageBlock::new();
        parent.append_mutation(&model, &mut ids, &mut rng);

        let mut child_a = LinkageBlock::new_child(&parent);
        let child_b = LinkageBlock::new_child(&parent);
        child_a.append_mutation(&model, &mut ids, &mut rng);

        let mut count_a = AlleleCount::new();
        child_a.count_alleles(&mut count_a);
        let mut count_b = AlleleCount::new();
        child_b.count_alleles(&mut count_b);
        assert_eq!(count_a.total_unique(), 2);
        assert_eq!(count_b.total_unique(), 1);
    }

    #[test]
    fn test_chain_totals_match_counters_over_generations() {
        let model = deleterious_only_model();
        let mut ids = test_ids();
        let mut rng = test_rng(3);
        let mut lb = LinkageBlock::new();
        for _ in 0..6 {
            let mut next = LinkageBlock::new_child(&lb);
            next.append_mutation(&model, &mut ids, &mut rng);
            next.append_mutation(&model, &mut ids, &mut rng);
            lb = next;
        }
        assert_eq!(lb.num_mutations(), 12);

        let mut count = AlleleCount::new();
        lb.count_alleles(&mut count);
        assert_eq!(count.total_unique() as u32, lb.num_mutations());

        // The cached sum equals an exact re-summation over the chain
        // (within f32 tolerance).
        let resummed: f64 = count
            .deleterious_dom
            .values()
            .chain(count.deleterious_rec.values())
            .map(|a| a.effect as f64)
            .sum();
        assert!((resummed - lb.sum_fitness()).abs() < 1e-6);
    }

    #[test]
    fn test_tracking_threshold_filters_identity_not_totals() {
        let cfg = MutationConfig {
            frac_fav_mutn: 0.0,
            fraction_neutral: 0.0,
            tracking_threshold: 1.0, // nothing has |effect| > 1.0
            ..MutationConfig::default()
        };
        let model = MutationModel::from_config(&cfg);
        let mut ids = test_ids();
        let mut rng = test_rng(19);
        let mut lb = LinkageBlock::new();
        for _ in 0..4 {
            lb.append_mutation(&model, &mut ids, &mut rng);
        }
        assert_eq!(lb.num_mutations(), 4);
        assert!(lb.sum_fitness() < 0.0);

        let mut count = AlleleCount::new();
        lb.count_alleles(&mut count);
        assert_eq!(count.total_unique(), 0);
    }

    #[test]
    fn test_neutrals_only_tracked_when_enabled() {
        let base = MutationConfig {
            frac_fav_mutn: 0.0,
            fraction_neutral: 1.0,
            ..MutationConfig::default()
        };

        let untracked = MutationModel::from_config(&base);
        let mut ids = test_ids();
        let mut rng = test_rng(5);
        let mut lb = LinkageBlock::new();
        lb.append_mutation(&untracked, &mut ids, &mut rng);
        let mut count = AlleleCount::new();
        lb.count_alleles(&mut count);
        assert_eq!(lb.num_mutations(), 1);
        assert_eq!(count.neutral.len(), 0);

        let tracked = MutationModel::from_config(&MutationConfig {
            track_neutrals: true,
            ..base
        });
        let mut lb = LinkageBlock::new();
        lb.append_mutation(&tracked, &mut ids, &mut rng);
        let mut count = AlleleCount::new();
        lb.count_alleles(&mut count);
        assert_eq!(count.neutral.len(), 1);
    }

    #[test]
    fn test_initial_allele_pair_codominant_halves() {
        let model = MutationModel::from_config(&MutationConfig::default());
        let mut ids = test_ids();
        let mut rng = test_rng(23);
        let (fav, del) = model.initial_allele_pair(&mut ids, &mut rng);
        assert!(fav.fitness_effect() > 0.0);
        assert_eq!(fav.fitness_effect(), -del.fitness_effect());

        let mut lb1 = LinkageBlock::new();
        let mut lb2 = LinkageBlock::new();
        append_initial_allele_pair(&mut lb1, &mut lb2, fav, del);
        assert_eq!(lb1.num_mutations(), 1);
        assert_eq!(lb2.num_mutations(), 1);
        // The two halves cancel across the pair of blocks.
        assert!((lb1.sum_fitness() + lb2.sum_fitness()).abs() < 1e-12);

        let (d, f, av_d, av_f) = lb1.initial_allele_stats();
        assert_eq!((d, f), (0, 1));
        assert_eq!(av_d, 0.0);
        assert!(av_f > 0.0);
    }
}
