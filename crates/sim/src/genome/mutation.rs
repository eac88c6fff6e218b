//! Mutation values and allele occurrence maps.
//!
//! A `Mutation` is immutable after creation and shared read-only by every
//! linkage block that inherits it, so all occurrences of an id carry the
//! same class, dominance, and fitness effect.

use std::collections::HashMap;

/// Classification of a mutation or initial allele.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Deleterious,
    Neutral,
    Favorable,
    /// Deleterious half of a contrasting initial allele pair.
    DeleteriousInitial,
    /// Favorable half of a contrasting initial allele pair.
    FavorableInitial,
}

/// An immutable point mutation (or initial allele).
///
/// The fitness effect is stored as `f32`; the precision loss is below the
/// eleventh decimal of population mean fitness and halves the memory of the
/// dominant data structure in large runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mutation {
    id: u64,
    effect: f32,
    kind: MutationKind,
    dominant: bool,
}

impl Mutation {
    /// Create a mutation value. Deleterious effects are negative, favorable
    /// effects positive, neutral effects zero.
    pub fn new(id: u64, effect: f32, kind: MutationKind, dominant: bool) -> Self {
        Self {
            id,
            effect,
            kind,
            dominant,
        }
    }

    /// Globally unique identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Signed fitness effect.
    #[inline]
    pub fn fitness_effect(&self) -> f32 {
        self.effect
    }

    /// Mutation class.
    #[inline]
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Whether the mutation is dominant (as opposed to recessive).
    #[inline]
    pub fn is_dominant(&self) -> bool {
        self.dominant
    }
}

/// Occurrence record for one allele id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allele {
    /// How many times the id was observed (at most once per individual).
    pub count: u32,
    /// The allele's fitness effect (identical for every occurrence).
    pub effect: f32,
}

/// Per-class allele occurrence maps, keyed by mutation id.
///
/// Deleterious and favorable mutations are split by dominance; neutrals and
/// the two initial-allele classes each keep a single map.
#[derive(Debug, Default)]
pub struct AlleleCount {
    pub deleterious_dom: HashMap<u64, Allele>,
    pub deleterious_rec: HashMap<u64, Allele>,
    pub neutral: HashMap<u64, Allele>,
    pub favorable_dom: HashMap<u64, Allele>,
    pub favorable_rec: HashMap<u64, Allele>,
    pub del_initial: HashMap<u64, Allele>,
    pub fav_initial: HashMap<u64, Allele>,
}

impl AlleleCount {
    pub fn new() -> Self {
        Self::default()
    }

    fn class_map(&mut self, m: &Mutation) -> &mut HashMap<u64, Allele> {
        match (m.kind(), m.is_dominant()) {
            (MutationKind::Deleterious, true) => &mut self.deleterious_dom,
            (MutationKind::Deleterious, false) => &mut self.deleterious_rec,
            (MutationKind::Neutral, _) => &mut self.neutral,
            (MutationKind::Favorable, true) => &mut self.favorable_dom,
            (MutationKind::Favorable, false) => &mut self.favorable_rec,
            (MutationKind::DeleteriousInitial, _) => &mut self.del_initial,
            (MutationKind::FavorableInitial, _) => &mut self.fav_initial,
        }
    }

    /// Mark a mutation as present once. Used while gathering a single
    /// individual, so both homologs together contribute at most one count.
    pub fn mark(&mut self, m: &Mutation) {
        self.class_map(m).insert(
            m.id(),
            Allele {
                count: 1,
                effect: m.fitness_effect(),
            },
        );
    }

    /// Merge another count into this one, summing per-id occurrence counts.
    pub fn absorb(&mut self, other: &AlleleCount) {
        fn merge(into: &mut HashMap<u64, Allele>, from: &HashMap<u64, Allele>) {
            for (&id, allele) in from {
                into.entry(id)
                    .and_modify(|a| a.count += allele.count)
                    .or_insert(*allele);
            }
        }
        merge(&mut self.deleterious_dom, &other.deleterious_dom);
        merge(&mut self.deleterious_rec, &other.deleterious_rec);
        merge(&mut self.neutral, &other.neutral);
        merge(&mut self.favorable_dom, &other.favorable_dom);
        merge(&mut self.favorable_rec, &other.favorable_rec);
        merge(&mut self.del_initial, &other.del_initial);
        merge(&mut self.fav_initial, &other.fav_initial);
    }

    /// Total number of distinct tracked ids across every class.
    pub fn total_unique(&self) -> usize {
        self.deleterious_dom.len()
            + self.deleterious_rec.len()
            + self.neutral.len()
            + self.favorable_dom.len()
            + self.favorable_rec.len()
            + self.del_initial.len()
            + self.fav_initial.len()
    }
}
