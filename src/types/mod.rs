//! Fixture documents of the wrapped proof system: the circuit descriptor,
//! the proof with its public inputs and the verifier-only data.

pub mod common;
pub mod hash;
pub mod proof;

pub use common::CommonCircuitData;
pub use hash::{HashOut, MerkleCap, MerkleProof};
pub use proof::{ProofWithPublicInputs, VerifierOnlyCircuitData};
