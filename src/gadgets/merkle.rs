//! Capped Merkle openings with Poseidon-BLS node hashing.

use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use crate::gadgets::gl::GlVar;
use crate::gadgets::poseidon_bls::{hash_or_noop, two_to_one, HashOutVar};
use crate::Fr;

/// Walks `siblings` from the leaf up, ordering each pair by the next index
/// bit (low first), then enforces equality with the cap entry picked by the
/// remaining bits.
pub fn verify_to_cap(
    leaf: &[GlVar],
    index_bits: &[Boolean<Fr>],
    cap: &[HashOutVar],
    siblings: &[HashOutVar],
) -> Result<(), SynthesisError> {
    if index_bits.len() < siblings.len() {
        return Err(SynthesisError::Unsatisfiable);
    }
    let mut node = hash_or_noop(leaf)?;
    for (bit, sibling) in index_bits.iter().zip(siblings) {
        let left = bit.select(sibling, &node)?;
        let right = bit.select(&node, sibling)?;
        node = two_to_one(&left, &right)?;
    }
    let cap_bits: Vec<Boolean<Fr>> = index_bits[siblings.len()..].iter().rev().cloned().collect();
    if cap.len() != 1 << cap_bits.len() {
        return Err(SynthesisError::Unsatisfiable);
    }
    let root = HashOutVar::conditionally_select_power_of_two_vector(&cap_bits, cap)?;
    node.enforce_equal(&root)
}
