//! In-circuit building blocks of the wrapped verifier.
//!
//! - Goldilocks base and quadratic extension emulation over `Fr`
//! - Poseidon over Goldilocks (challenger) and over `Fr` (Merkle hashing)
//! - Merkle cap openings, the Fiat-Shamir challenger and FRI query rounds

pub mod challenger;
pub mod fri;
pub mod gl;
pub mod gl_ext;
pub mod merkle;
pub mod poseidon_bls;
pub mod poseidon_gl;
