//! Groth16 over BLS12-381 for the wrapper circuit.

use ark_bls12_381::Bls12_381;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, SynthesisError};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};
use crate::verifier::WrapperCircuit;
use crate::Fr;

pub type OuterE = Bls12_381;
pub type OuterProof = Proof<OuterE>;
pub type OuterPk = ProvingKey<OuterE>;
pub type OuterVk = VerifyingKey<OuterE>;

/// Circuit-specific keys for the descriptor behind `circuit`.
///
/// Only the shape of `circuit` matters; [`WrapperCircuit::for_setup`] builds
/// a suitable one.
pub fn setup(circuit: WrapperCircuit, rng: &mut (impl RngCore + CryptoRng)) -> Result<(OuterPk, OuterVk)> {
    tracing::info!("running circuit-specific Groth16 setup");
    let (pk, vk) = Groth16::<OuterE>::circuit_specific_setup(circuit, rng)?;
    tracing::info!(public_inputs = vk.gamma_abc_g1.len() - 1, "Groth16 keys generated");
    Ok((pk, vk))
}

/// Synthesizes `circuit` once to check the inner proof, then proves it.
///
/// Returns the proof with the outer public inputs read back from the
/// instance assignment. A witness that fails any check is [`Error::Rejected`].
pub fn prove(
    pk: &OuterPk,
    circuit: WrapperCircuit,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(OuterProof, Vec<Fr>)> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.clone().generate_constraints(cs.clone())?;
    if !cs.is_satisfied()? {
        tracing::warn!(constraint = ?cs.which_is_unsatisfied()?, "inner proof does not verify");
        return Err(Error::Rejected);
    }
    let public_inputs: Vec<Fr> = cs
        .borrow()
        .ok_or(SynthesisError::MissingCS)?
        .instance_assignment
        .iter()
        .skip(1)
        .copied()
        .collect();
    if public_inputs != circuit.public_inputs() {
        return Err(Error::Synthesis(SynthesisError::Unsatisfiable));
    }

    let proof = Groth16::<OuterE>::prove(pk, circuit, rng)?;
    tracing::info!(public_inputs = public_inputs.len(), "Groth16 proof generated");
    Ok((proof, public_inputs))
}

pub fn verify(vk: &OuterVk, public_inputs: &[Fr], proof: &OuterProof) -> Result<bool> {
    let pvk: PreparedVerifyingKey<OuterE> = Groth16::<OuterE>::process_vk(vk)?;
    Ok(Groth16::<OuterE>::verify_with_processed_vk(&pvk, public_inputs, proof)?)
}
