//! Boundary functions: wrap an inner proof, check a wrapped one.
//!
//! Internally everything returns [`Result`]. Only [`verify_proof`] collapses
//! failures into the `"true"`/`"false"` strings external callers expect.

use ark_std::rand::{CryptoRng, RngCore};
use rand_core::OsRng;

use crate::config::WrapperConfig;
use crate::error::{Error, Result};
use crate::keystore::KeyStore;
use crate::outer::{self, OuterProof, OuterVk};
use crate::types::{CommonCircuitData, ProofWithPublicInputs, VerifierOnlyCircuitData};
use crate::verifier::WrapperCircuit;
use crate::wire::{VerboseProof, VerboseVk, WireProof, WireVk};
use crate::Fr;

/// A Groth16 proof over BLS12-381 together with its verifying key.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedProof {
    pub proof: OuterProof,
    pub public_inputs: Vec<Fr>,
    pub vk: OuterVk,
}

impl WrappedProof {
    /// Verbose JSON of the proof and of the verifying key.
    pub fn to_json(&self) -> Result<(String, String)> {
        let proof = VerboseProof::encode(&self.proof, &self.public_inputs)?;
        let vk = VerboseVk::encode(&self.vk)?;
        Ok((
            serde_json::to_string(&proof).map_err(crate::error::WireError::from)?,
            serde_json::to_string(&vk).map_err(crate::error::WireError::from)?,
        ))
    }

    pub fn verify(&self) -> Result<bool> {
        outer::verify(&self.vk, &self.public_inputs, &self.proof)
    }
}

/// Wraps one inner proof, reusing the key store's keys when they match.
pub fn wrap(
    common: &CommonCircuitData,
    verifier_only: &VerifierOnlyCircuitData,
    proof: &ProofWithPublicInputs,
    config: &WrapperConfig,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<WrappedProof> {
    let store = KeyStore::new(&config.keystore_dir);
    let circuit = WrapperCircuit::new(
        common.clone(),
        verifier_only.clone(),
        proof.clone(),
        config.binding.clone(),
    )?;
    let (pk, vk) = store.load_or_setup(common, verifier_only, &config.binding, rng)?;
    let (proof, public_inputs) = outer::prove(&pk, circuit, rng)?;
    store.write_proof(&proof, &public_inputs)?;

    let wrapped = WrappedProof {
        proof,
        public_inputs,
        vk,
    };
    if !wrapped.verify()? {
        return Err(Error::Rejected);
    }
    Ok(wrapped)
}

/// Parses the three fixture documents and wraps the proof; returns the
/// verbose proof and verifying-key JSON.
pub fn generate_proof(
    common_circuit_data: &str,
    proof_with_public_inputs: &str,
    verifier_only_circuit_data: &str,
    config: &WrapperConfig,
) -> Result<(String, String)> {
    let common = CommonCircuitData::from_json(common_circuit_data)?;
    let proof = ProofWithPublicInputs::from_json(proof_with_public_inputs)?;
    let verifier_only = VerifierOnlyCircuitData::from_json(verifier_only_circuit_data)?;
    wrap(&common, &verifier_only, &proof, config, &mut OsRng)?.to_json()
}

/// Verifies a proof against a verifying key, each in either wire variant.
pub fn check_proof(proof_json: &str, vk_json: &str) -> Result<bool> {
    let (proof, public_inputs) = WireProof::from_json(proof_json)?.decode()?;
    let vk = WireVk::from_json(vk_json)?.decode()?;
    if public_inputs.len() + 1 != vk.gamma_abc_g1.len() {
        return Ok(false);
    }
    outer::verify(&vk, &public_inputs, &proof)
}

/// `"true"` when the proof verifies, `"false"` on any failure.
pub fn verify_proof(proof_json: &str, vk_json: &str) -> &'static str {
    match check_proof(proof_json, vk_json) {
        Ok(true) => "true",
        Ok(false) => "false",
        Err(e) => {
            tracing::warn!(error = %e, "wrapped proof could not be checked");
            "false"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_documents_verify_as_false() {
        assert_eq!(verify_proof("not json", "{}"), "false");
        assert!(matches!(check_proof("{}", "{}"), Err(Error::Wire(_))));
    }

    #[test]
    fn malformed_fixtures_are_config_errors() {
        let cfg = WrapperConfig::new(std::env::temp_dir().join("plonky2-groth16-unused"));
        let err = generate_proof("{", "{}", "{}", &cfg).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
