//! Host-side permutations and constant tables.

pub mod challenger;
pub mod goldilocks_constants;
pub mod poseidon_bls12_381;
pub mod poseidon_goldilocks;
