//! plonky2 → Groth16 wrapper
//!
//! Verifies a plonky2 proof (Goldilocks field, FRI, Poseidon over BLS12-381
//! for Merkle hashing) inside an R1CS circuit over the BLS12-381 scalar
//! field, then proves that circuit with Groth16.
//!
//! Layers, bottom up:
//! - [`gl_u64`], [`crypto`]: host Goldilocks arithmetic, both Poseidon
//!   permutations and the Fiat-Shamir challenger.
//! - [`gadgets`]: emulated Goldilocks and extension arithmetic, hashing,
//!   Merkle caps, the challenger and FRI, all as constraints.
//! - [`plonk`]: gate constraints, the vanishing identity and the witness
//!   form of a proof.
//! - [`verifier`]: the whole wrapper circuit; [`public_inputs`] binds its
//!   outer public inputs.
//! - [`outer`], [`keystore`], [`wire`], [`api`]: Groth16, key persistence,
//!   JSON encodings and the boundary functions.

pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gadgets;
pub mod gl_u64;
pub mod keystore;
pub mod outer;
pub mod plonk;
pub mod public_inputs;
pub mod types;
pub mod verifier;
pub mod wire;

/// Native field of the wrapper circuit.
pub type Fr = ark_bls12_381::Fr;

pub use api::{check_proof, generate_proof, verify_proof, wrap, WrappedProof};
pub use config::{LimbBase, PublicInputBinding, WrapperConfig};
pub use error::{ConfigError, Error, Result, WireError};
pub use keystore::KeyStore;
pub use outer::{OuterE, OuterPk, OuterProof, OuterVk};
pub use types::{CommonCircuitData, ProofWithPublicInputs, VerifierOnlyCircuitData};
pub use verifier::WrapperCircuit;
