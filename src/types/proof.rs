//! Inner proof and verifier-only data, with shape validation against a
//! [`CommonCircuitData`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gl_u64::{GlExt, P_GL};
use crate::types::common::CommonCircuitData;
use crate::types::hash::{HashOut, MerkleCap, MerkleProof};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningSet {
    pub constants: Vec<GlExt>,
    pub plonk_sigmas: Vec<GlExt>,
    pub wires: Vec<GlExt>,
    pub plonk_zs: Vec<GlExt>,
    pub plonk_zs_next: Vec<GlExt>,
    pub partial_products: Vec<GlExt>,
    pub quotient_polys: Vec<GlExt>,
    #[serde(default)]
    pub lookup_zs: Vec<GlExt>,
    #[serde(default)]
    pub lookup_zs_next: Vec<GlExt>,
}

impl OpeningSet {
    /// Openings at ζ in oracle order.
    pub fn zeta_batch(&self) -> Vec<GlExt> {
        [
            self.constants.as_slice(),
            &self.plonk_sigmas,
            &self.wires,
            &self.plonk_zs,
            &self.partial_products,
            &self.quotient_polys,
        ]
        .concat()
    }

    /// Openings at g·ζ.
    pub fn zeta_next_batch(&self) -> Vec<GlExt> {
        self.plonk_zs_next.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriInitialTreeProof {
    pub evals_proofs: Vec<(Vec<u64>, MerkleProof)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriQueryStep {
    pub evals: Vec<GlExt>,
    pub merkle_proof: MerkleProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriQueryRound {
    pub initial_trees_proof: FriInitialTreeProof,
    pub steps: Vec<FriQueryStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolynomialCoeffs {
    pub coeffs: Vec<GlExt>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriProof {
    pub commit_phase_merkle_caps: Vec<MerkleCap>,
    pub query_round_proofs: Vec<FriQueryRound>,
    pub final_poly: PolynomialCoeffs,
    pub pow_witness: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub wires_cap: MerkleCap,
    pub plonk_zs_partial_products_cap: MerkleCap,
    pub quotient_polys_cap: MerkleCap,
    pub openings: OpeningSet,
    pub opening_proof: FriProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofWithPublicInputs {
    pub proof: Proof,
    pub public_inputs: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierOnlyCircuitData {
    pub constants_sigmas_cap: MerkleCap,
    pub circuit_digest: HashOut,
}

impl VerifierOnlyCircuitData {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn validate(&self, common: &CommonCircuitData) -> Result<(), ConfigError> {
        check_len("constants_sigmas_cap", 1 << common.cap_height(), self.constants_sigmas_cap.len())
    }
}

fn check_len(what: &str, expected: usize, got: usize) -> Result<(), ConfigError> {
    if expected == got {
        Ok(())
    } else {
        Err(ConfigError::Length {
            what: what.to_string(),
            expected,
            got,
        })
    }
}

fn check_canonical<'a>(what: &str, values: impl IntoIterator<Item = &'a u64>) -> Result<(), ConfigError> {
    match values.into_iter().find(|&&v| v >= P_GL) {
        Some(&value) => Err(ConfigError::NonCanonical {
            what: what.to_string(),
            value,
        }),
        None => Ok(()),
    }
}

fn check_ext(what: &str, expected: usize, values: &[GlExt]) -> Result<(), ConfigError> {
    check_len(what, expected, values.len())?;
    check_canonical(what, values.iter().flatten())
}

impl ProofWithPublicInputs {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// An all-zero proof with the shape `common` implies. Only its shape is
    /// meaningful: it drives key generation, never verifies.
    pub fn dummy(common: &CommonCircuitData) -> Self {
        let zero_hash = HashOut(crate::Fr::from(0u64));
        let cap = || MerkleCap(vec![zero_hash; 1 << common.cap_height()]);
        let path = |len: usize| MerkleProof {
            siblings: vec![zero_hash; len],
        };
        let ext = |n: usize| vec![[0u64; 2]; n];
        let nc = common.num_challenges();
        let arities = &common.fri_params.reduction_arity_bits;

        let query_round = || {
            let initial_path = common.lde_bits() - common.cap_height();
            let evals_proofs = common
                .initial_leaf_lens()
                .iter()
                .map(|&len| (vec![0u64; len], path(initial_path)))
                .collect();
            let mut log_n = common.lde_bits();
            let steps = arities
                .iter()
                .map(|&bits| {
                    log_n -= bits;
                    FriQueryStep {
                        evals: ext(1 << bits),
                        merkle_proof: path(log_n - common.cap_height()),
                    }
                })
                .collect();
            FriQueryRound {
                initial_trees_proof: FriInitialTreeProof { evals_proofs },
                steps,
            }
        };

        Self {
            proof: Proof {
                wires_cap: cap(),
                plonk_zs_partial_products_cap: cap(),
                quotient_polys_cap: cap(),
                openings: OpeningSet {
                    constants: ext(common.num_constants),
                    plonk_sigmas: ext(common.config.num_routed_wires),
                    wires: ext(common.config.num_wires),
                    plonk_zs: ext(nc),
                    plonk_zs_next: ext(nc),
                    partial_products: ext(nc * common.num_partial_products),
                    quotient_polys: ext(common.num_quotient_polys()),
                    lookup_zs: vec![],
                    lookup_zs_next: vec![],
                },
                opening_proof: FriProof {
                    commit_phase_merkle_caps: arities.iter().map(|_| cap()).collect(),
                    query_round_proofs: (0..common.fri_params.config.num_query_rounds)
                        .map(|_| query_round())
                        .collect(),
                    final_poly: PolynomialCoeffs {
                        coeffs: ext(common.final_poly_len()),
                    },
                    pow_witness: 0,
                },
            },
            public_inputs: vec![0; common.num_public_inputs],
        }
    }

    /// Rejects proofs whose shape differs from what `common` implies.
    ///
    /// Runs before any challenge is derived so the circuit topology only
    /// depends on `common`.
    pub fn validate(&self, common: &CommonCircuitData) -> Result<(), ConfigError> {
        let cap_len = 1 << common.cap_height();
        let p = &self.proof;
        check_len("public_inputs", common.num_public_inputs, self.public_inputs.len())?;
        check_canonical("public_inputs", &self.public_inputs)?;
        check_len("wires_cap", cap_len, p.wires_cap.len())?;
        check_len("plonk_zs_partial_products_cap", cap_len, p.plonk_zs_partial_products_cap.len())?;
        check_len("quotient_polys_cap", cap_len, p.quotient_polys_cap.len())?;

        let o = &p.openings;
        let nc = common.num_challenges();
        check_ext("openings.constants", common.num_constants, &o.constants)?;
        check_ext("openings.plonk_sigmas", common.config.num_routed_wires, &o.plonk_sigmas)?;
        check_ext("openings.wires", common.config.num_wires, &o.wires)?;
        check_ext("openings.plonk_zs", nc, &o.plonk_zs)?;
        check_ext("openings.plonk_zs_next", nc, &o.plonk_zs_next)?;
        check_ext(
            "openings.partial_products",
            nc * common.num_partial_products,
            &o.partial_products,
        )?;
        check_ext("openings.quotient_polys", common.num_quotient_polys(), &o.quotient_polys)?;
        if !o.lookup_zs.is_empty() || !o.lookup_zs_next.is_empty() {
            return Err(ConfigError::LookupsUnsupported);
        }

        let fri = &p.opening_proof;
        let arities = &common.fri_params.reduction_arity_bits;
        check_len("commit_phase_merkle_caps", arities.len(), fri.commit_phase_merkle_caps.len())?;
        for cap in &fri.commit_phase_merkle_caps {
            check_len("commit_phase_merkle_cap", cap_len, cap.len())?;
        }
        check_ext("final_poly", common.final_poly_len(), &fri.final_poly.coeffs)?;
        check_canonical("pow_witness", [&fri.pow_witness])?;
        check_len(
            "query_round_proofs",
            common.fri_params.config.num_query_rounds,
            fri.query_round_proofs.len(),
        )?;

        let leaf_lens = common.initial_leaf_lens();
        let initial_path = common.lde_bits() - common.cap_height();
        for round in &fri.query_round_proofs {
            let evals = &round.initial_trees_proof.evals_proofs;
            check_len("initial_trees_proof", leaf_lens.len(), evals.len())?;
            for ((leaf, path), &want) in evals.iter().zip(&leaf_lens) {
                check_len("initial leaf", want, leaf.len())?;
                check_canonical("initial leaf", leaf)?;
                check_len("initial merkle proof", initial_path, path.siblings.len())?;
            }
            check_len("query steps", arities.len(), round.steps.len())?;
            let mut log_n = common.lde_bits();
            for (step, &bits) in round.steps.iter().zip(arities) {
                log_n -= bits;
                check_ext("step evals", 1 << bits, &step.evals)?;
                check_len(
                    "step merkle proof",
                    log_n - common.cap_height(),
                    step.merkle_proof.siblings.len(),
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openings_flatten_in_oracle_order() {
        let o = OpeningSet {
            constants: vec![[1, 0]],
            plonk_sigmas: vec![[2, 0]],
            wires: vec![[3, 0]],
            plonk_zs: vec![[4, 0]],
            plonk_zs_next: vec![[9, 0]],
            partial_products: vec![[5, 0]],
            quotient_polys: vec![[6, 0]],
            lookup_zs: vec![],
            lookup_zs_next: vec![],
        };
        let firsts: Vec<u64> = o.zeta_batch().iter().map(|e| e[0]).collect();
        assert_eq!(firsts, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(o.zeta_next_batch(), vec![[9, 0]]);
    }

    #[test]
    fn dummy_proof_has_the_descriptor_shape() {
        let common = CommonCircuitData::from_json(&crate::types::common::tests::sample_json()).unwrap();
        let dummy = ProofWithPublicInputs::dummy(&common);
        dummy.validate(&common).unwrap();
        assert_eq!(dummy.proof.opening_proof.query_round_proofs.len(), 28);
    }

    #[test]
    fn non_canonical_values_are_reported() {
        let err = check_canonical("x", &[1, P_GL]).unwrap_err();
        assert!(matches!(err, ConfigError::NonCanonical { value, .. } if value == P_GL));
    }
}
