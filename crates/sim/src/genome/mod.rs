//! The genome data model: mutation values, linkage blocks with their
//! ancestral mutation chains, chromosomes, and diploid individuals.

pub mod chromosome;
pub mod individual;
pub mod linkage;
pub mod mutation;

pub use chromosome::Chromosome;
pub use individual::Individual;
pub use linkage::{append_initial_allele_pair, LinkageBlock};
pub use mutation::{Allele, AlleleCount, Mutation, MutationKind};
