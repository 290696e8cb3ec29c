//! The wrapper circuit: verifies one inner proof over BLS12-381.
//!
//! Topology depends on the [`CommonCircuitData`], the verifier-only data and
//! the public input binding, never on proof values. Every check is an
//! unconditional equality; one failing check makes the system unsatisfiable.

use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::config::PublicInputBinding;
use crate::error::ConfigError;
use crate::gadgets::challenger::ChallengerVar;
use crate::gadgets::fri::{
    verify_fri_proof, FriBatchVar, FriChallengesVar, FriInstanceVar, FriOracleInfo, FriPolynomialInfo,
};
use crate::gadgets::gl::GlVar;
use crate::gadgets::gl_ext::GlExtVar;
use crate::gadgets::poseidon_bls::{constant_hash, HashOutVar};
use crate::gadgets::poseidon_gl;
use crate::gl_u64::primitive_root_of_unity;
use crate::plonk::proof_var::ProofVar;
use crate::plonk::vanishing::{check_quotient, eval_vanishing_poly, VanishingInputs};
use crate::public_inputs::{enforce_binding, outer_public_inputs};
use crate::types::{CommonCircuitData, ProofWithPublicInputs, VerifierOnlyCircuitData};
use crate::Fr;

/// Challenges of one proof, in transcript order.
pub struct ProofChallengesVar {
    pub plonk_betas: Vec<GlVar>,
    pub plonk_gammas: Vec<GlVar>,
    pub plonk_alphas: Vec<GlVar>,
    pub plonk_zeta: GlExtVar,
    pub fri: FriChallengesVar,
}

impl ProofChallengesVar {
    pub fn derive(
        common: &CommonCircuitData,
        circuit_digest: &HashOutVar,
        public_inputs_hash: &[GlVar; 4],
        proof: &ProofVar,
    ) -> Result<Self, SynthesisError> {
        let nc = common.num_challenges();
        let mut challenger = ChallengerVar::new();
        challenger.observe_hash(circuit_digest)?;
        challenger.observe_elements(public_inputs_hash)?;

        challenger.observe_cap(&proof.wires_cap)?;
        let plonk_betas = challenger.get_n_challenges(nc)?;
        let plonk_gammas = challenger.get_n_challenges(nc)?;

        challenger.observe_cap(&proof.plonk_zs_partial_products_cap)?;
        let plonk_alphas = challenger.get_n_challenges(nc)?;

        challenger.observe_cap(&proof.quotient_polys_cap)?;
        let plonk_zeta = challenger.get_extension_challenge()?;

        for batch in proof.openings.to_fri_openings() {
            challenger.observe_extension_elements(&batch)?;
        }
        let fri = FriChallengesVar::derive(&mut challenger, &proof.opening_proof, &common.fri_params)?;
        Ok(Self {
            plonk_betas,
            plonk_gammas,
            plonk_alphas,
            plonk_zeta,
            fri,
        })
    }
}

/// Openings at ζ of all four oracles, then the permutation accumulators at g·ζ.
pub fn fri_instance(common: &CommonCircuitData, zeta: &GlExtVar) -> Result<FriInstanceVar, SynthesisError> {
    let [constants_sigmas, wires, zs_partial_products, quotient] = common.initial_leaf_lens();
    let salt = common.salt_size();
    let oracles = vec![
        FriOracleInfo {
            num_polys: constants_sigmas,
            blinding: false,
        },
        FriOracleInfo {
            num_polys: wires - salt,
            blinding: true,
        },
        FriOracleInfo {
            num_polys: zs_partial_products - salt,
            blinding: true,
        },
        FriOracleInfo {
            num_polys: quotient - salt,
            blinding: true,
        },
    ];
    let zeta_polys = oracles
        .iter()
        .enumerate()
        .flat_map(|(i, o)| FriPolynomialInfo::from_range(i, 0..o.num_polys))
        .collect();
    let g = primitive_root_of_unity(common.degree_bits());
    let zeta_next = zeta.mul_base_const(g)?;
    Ok(FriInstanceVar {
        oracles,
        batches: vec![
            FriBatchVar {
                point: zeta.clone(),
                polynomials: zeta_polys,
            },
            FriBatchVar {
                point: zeta_next,
                polynomials: FriPolynomialInfo::from_range(2, 0..common.num_challenges()),
            },
        ],
    })
}

/// One wrapped proof together with everything needed to check it.
#[derive(Clone, Debug)]
pub struct WrapperCircuit {
    common: CommonCircuitData,
    verifier_only: VerifierOnlyCircuitData,
    proof: ProofWithPublicInputs,
    binding: PublicInputBinding,
}

impl WrapperCircuit {
    /// Validates the shapes of every document before any constraint exists.
    pub fn new(
        common: CommonCircuitData,
        verifier_only: VerifierOnlyCircuitData,
        proof: ProofWithPublicInputs,
        binding: PublicInputBinding,
    ) -> Result<Self, ConfigError> {
        verifier_only.validate(&common)?;
        proof.validate(&common)?;
        binding.validate(common.num_public_inputs)?;
        Ok(Self {
            common,
            verifier_only,
            proof,
            binding,
        })
    }

    /// Circuit for key generation; the proof slot holds a zero proof.
    pub fn for_setup(
        common: CommonCircuitData,
        verifier_only: VerifierOnlyCircuitData,
        binding: PublicInputBinding,
    ) -> Result<Self, ConfigError> {
        let proof = ProofWithPublicInputs::dummy(&common);
        Self::new(common, verifier_only, proof, binding)
    }

    pub fn common(&self) -> &CommonCircuitData {
        &self.common
    }

    /// The outer public inputs a valid assignment exposes.
    pub fn public_inputs(&self) -> Vec<Fr> {
        outer_public_inputs(&self.binding, &self.proof.public_inputs)
    }

    /// Emits the whole verifier; returns the bound outer public inputs.
    pub fn synthesize(&self, cs: ConstraintSystemRef<Fr>) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
        let common = &self.common;
        let span = tracing::info_span!(
            "wrapper",
            degree_bits = common.degree_bits(),
            gates = common.gates.len(),
            queries = common.fri_params.config.num_query_rounds,
        );
        let _guard = span.enter();

        let sigmas_cap: Vec<HashOutVar> = self
            .verifier_only
            .constants_sigmas_cap
            .0
            .iter()
            .map(|h| constant_hash(h.0))
            .collect();
        let circuit_digest = constant_hash(self.verifier_only.circuit_digest.0);

        let proof = ProofVar::new_witness(cs.clone(), &self.proof.proof)?;
        let public_inputs = GlVar::new_witness_vec(cs.clone(), &self.proof.public_inputs)?;
        let outer = enforce_binding(cs.clone(), &self.binding, &public_inputs)?;
        let public_inputs_hash = poseidon_gl::hash_no_pad(&public_inputs)?;
        tracing::debug!(constraints = cs.num_constraints(), "witnesses allocated");

        let challenges = ProofChallengesVar::derive(common, &circuit_digest, &public_inputs_hash, &proof)?;
        tracing::debug!(constraints = cs.num_constraints(), "challenges derived");

        let zeta = &challenges.plonk_zeta;
        let zeta_pow_deg = zeta.exp_power_of_2(common.degree_bits())?;
        let o = &proof.openings;
        let vanishing = eval_vanishing_poly(
            common,
            &VanishingInputs {
                zeta,
                zeta_pow_deg: &zeta_pow_deg,
                local_constants: &o.constants,
                local_wires: &o.wires,
                public_inputs_hash: &public_inputs_hash,
                local_zs: &o.plonk_zs,
                next_zs: &o.plonk_zs_next,
                partial_products: &o.partial_products,
                s_sigmas: &o.plonk_sigmas,
                betas: &challenges.plonk_betas,
                gammas: &challenges.plonk_gammas,
                alphas: &challenges.plonk_alphas,
            },
        )?;
        check_quotient(common, &vanishing, &o.quotient_polys, &zeta_pow_deg)?;
        tracing::debug!(constraints = cs.num_constraints(), "vanishing identity checked");

        let instance = fri_instance(common, zeta)?;
        let caps: [&[HashOutVar]; 4] = [
            &sigmas_cap,
            &proof.wires_cap,
            &proof.plonk_zs_partial_products_cap,
            &proof.quotient_polys_cap,
        ];
        verify_fri_proof(
            &instance,
            &o.to_fri_openings(),
            &challenges.fri,
            &caps,
            &proof.opening_proof,
            &common.fri_params,
        )?;
        tracing::info!(
            constraints = cs.num_constraints(),
            witnesses = cs.num_witness_variables(),
            "wrapper circuit synthesized"
        );
        Ok(outer)
    }
}

impl ConstraintSynthesizer<Fr> for WrapperCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        self.synthesize(cs).map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::hash::{HashOut, MerkleCap};
    use ark_relations::r1cs::{ConstraintSystem, SynthesisMode};

    /// A two-gate descriptor small enough to synthesize in a unit test.
    pub(crate) fn tiny_common() -> CommonCircuitData {
        let fri = serde_json::json!({
            "rate_bits": 1,
            "cap_height": 0,
            "proof_of_work_bits": 2,
            "reduction_strategy": {"ConstantArityBits": [1, 1]},
            "num_query_rounds": 2
        });
        let json = serde_json::json!({
            "config": {
                "num_wires": 4,
                "num_routed_wires": 4,
                "num_constants": 1,
                "security_bits": 100,
                "num_challenges": 1,
                "zero_knowledge": false,
                "max_quotient_degree_factor": 2,
                "fri_config": fri
            },
            "fri_params": {
                "config": fri,
                "hiding": false,
                "degree_bits": 2,
                "reduction_arity_bits": [1]
            },
            "gates": ["NoopGate", "PublicInputGate"],
            "selectors_info": {
                "selector_indices": [0, 0],
                "groups": [{"start": 0, "end": 2}]
            },
            "quotient_degree_factor": 2,
            "num_gate_constraints": 4,
            "num_constants": 1,
            "num_public_inputs": 2,
            "k_is": [1, 7, 49, 343],
            "num_partial_products": 1
        });
        CommonCircuitData::from_json(&json.to_string()).unwrap()
    }

    fn verifier_only(common: &CommonCircuitData) -> VerifierOnlyCircuitData {
        VerifierOnlyCircuitData {
            constants_sigmas_cap: MerkleCap(vec![HashOut(Fr::from(3u64)); 1 << common.cap_height()]),
            circuit_digest: HashOut(Fr::from(11u64)),
        }
    }

    fn binding() -> PublicInputBinding {
        PublicInputBinding {
            groups: vec![0..2],
            base: crate::config::LimbBase::Pow63,
        }
    }

    fn shape(circuit: WrapperCircuit, setup: bool) -> (usize, usize, bool) {
        let cs = ConstraintSystem::<Fr>::new_ref();
        if setup {
            cs.set_mode(SynthesisMode::Setup);
        }
        circuit.generate_constraints(cs.clone()).unwrap();
        let satisfied = !setup && cs.is_satisfied().unwrap();
        (cs.num_constraints(), cs.num_instance_variables(), satisfied)
    }

    #[test]
    fn topology_is_independent_of_proof_values() {
        let common = tiny_common();
        let vo = verifier_only(&common);
        let setup = WrapperCircuit::for_setup(common.clone(), vo.clone(), binding()).unwrap();

        let mut proof = ProofWithPublicInputs::dummy(&common);
        proof.public_inputs = vec![5, 9];
        proof.proof.opening_proof.pow_witness = 12345;
        proof.proof.openings.wires[1] = [77, 3];
        let assigned = WrapperCircuit::new(common, vo, proof, binding()).unwrap();
        assert_eq!(assigned.public_inputs().len(), 1);

        let (setup_constraints, setup_inputs, _) = shape(setup, true);
        let (constraints, inputs, satisfied) = shape(assigned, false);
        assert_eq!(setup_constraints, constraints);
        assert_eq!(setup_inputs, inputs);
        assert_eq!(inputs, 2);
        assert!(!satisfied, "a fabricated proof must not verify");
    }

    #[test]
    fn misshapen_documents_are_config_errors() {
        let common = tiny_common();
        let vo = verifier_only(&common);
        let mut proof = ProofWithPublicInputs::dummy(&common);
        proof.public_inputs.push(1);
        assert!(matches!(
            WrapperCircuit::new(common.clone(), vo.clone(), proof, binding()),
            Err(ConfigError::Length { .. })
        ));
        let wide = PublicInputBinding {
            groups: vec![0..3],
            base: crate::config::LimbBase::Binary,
        };
        assert!(matches!(
            WrapperCircuit::for_setup(common, vo, wide),
            Err(ConfigError::Binding(_))
        ));
    }

    #[test]
    fn zeta_next_batch_opens_only_the_accumulators() {
        let common = tiny_common();
        let zeta = GlExtVar::constant([5, 1]);
        let inst = fri_instance(&common, &zeta).unwrap();
        assert_eq!(inst.oracles.iter().map(|o| o.num_polys).collect::<Vec<_>>(), vec![5, 4, 2, 2]);
        assert_eq!(inst.batches[0].polynomials.len(), 13);
        assert_eq!(inst.batches[1].polynomials.len(), 1);
        assert_eq!(inst.batches[1].polynomials[0].oracle_index, 2);
    }
}
