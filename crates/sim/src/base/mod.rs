//! Foundation utilities shared by the whole engine: the simulation RNG and
//! the global mutation-id allocator.

pub mod id;
pub mod random;

pub use id::{IdAllocator, IdSource};
pub use random::{main_rng, poisson, prob_round, shuffled_indices, RngFactory, SimRng};
