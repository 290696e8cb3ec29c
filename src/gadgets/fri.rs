//! FRI query-round verification over emulated Goldilocks.
//!
//! Replays the low-degree test of the wrapped proof: initial openings are
//! checked against their caps and combined into one quotient per query, each
//! folding step interpolates the committed coset at the round's β, and the
//! last folded value must match the final polynomial.

use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::gadgets::challenger::ChallengerVar;
use crate::gadgets::gl::GlVar;
use crate::gadgets::gl_ext::{eval_poly, reduce_base_with_powers, reduce_with_powers, GlExtVar};
use crate::gadgets::merkle::verify_to_cap;
use crate::gadgets::poseidon_bls::HashOutVar;
use crate::gl_u64::{gl_inv, gl_pow, primitive_root_of_unity, MULTIPLICATIVE_GROUP_GENERATOR};
use crate::types::common::{FriParams, SALT_SIZE};
use crate::types::proof::FriProof;
use crate::Fr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FriOracleInfo {
    pub num_polys: usize,
    pub blinding: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FriPolynomialInfo {
    pub oracle_index: usize,
    pub polynomial_index: usize,
}

impl FriPolynomialInfo {
    pub fn from_range(oracle_index: usize, polys: core::ops::Range<usize>) -> Vec<Self> {
        polys
            .map(|polynomial_index| Self {
                oracle_index,
                polynomial_index,
            })
            .collect()
    }
}

/// Polynomials opened at one point.
#[derive(Clone, Debug)]
pub struct FriBatchVar {
    pub point: GlExtVar,
    pub polynomials: Vec<FriPolynomialInfo>,
}

#[derive(Clone, Debug)]
pub struct FriInstanceVar {
    pub oracles: Vec<FriOracleInfo>,
    pub batches: Vec<FriBatchVar>,
}

#[derive(Clone, Debug)]
pub struct FriQueryStepVar {
    pub evals: Vec<GlExtVar>,
    pub merkle_proof: Vec<HashOutVar>,
}

#[derive(Clone, Debug)]
pub struct FriQueryRoundVar {
    /// Leaf and Merkle path per initial oracle.
    pub initial_trees_proof: Vec<(Vec<GlVar>, Vec<HashOutVar>)>,
    pub steps: Vec<FriQueryStepVar>,
}

#[derive(Clone, Debug)]
pub struct FriProofVar {
    pub commit_phase_merkle_caps: Vec<Vec<HashOutVar>>,
    pub query_round_proofs: Vec<FriQueryRoundVar>,
    pub final_poly: Vec<GlExtVar>,
    pub pow_witness: GlVar,
}

fn alloc_hashes<'a>(
    cs: &ConstraintSystemRef<Fr>,
    hashes: impl IntoIterator<Item = &'a crate::types::HashOut>,
) -> Result<Vec<HashOutVar>, SynthesisError> {
    hashes
        .into_iter()
        .map(|h| HashOutVar::new_witness(cs.clone(), || Ok(h.0)))
        .collect()
}

fn alloc_ext(cs: &ConstraintSystemRef<Fr>, values: &[[u64; 2]]) -> Result<Vec<GlExtVar>, SynthesisError> {
    values.iter().map(|v| GlExtVar::new_witness(cs.clone(), *v)).collect()
}

impl FriProofVar {
    /// Allocates every component as a witness; the shape comes from `proof`.
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, proof: &FriProof) -> Result<Self, SynthesisError> {
        let commit_phase_merkle_caps = proof
            .commit_phase_merkle_caps
            .iter()
            .map(|cap| alloc_hashes(&cs, &cap.0))
            .collect::<Result<_, _>>()?;
        let query_round_proofs = proof
            .query_round_proofs
            .iter()
            .map(|round| {
                let initial_trees_proof = round
                    .initial_trees_proof
                    .evals_proofs
                    .iter()
                    .map(|(leaf, path)| {
                        Ok((
                            GlVar::new_witness_vec(cs.clone(), leaf)?,
                            alloc_hashes(&cs, &path.siblings)?,
                        ))
                    })
                    .collect::<Result<_, SynthesisError>>()?;
                let steps = round
                    .steps
                    .iter()
                    .map(|s| {
                        Ok(FriQueryStepVar {
                            evals: alloc_ext(&cs, &s.evals)?,
                            merkle_proof: alloc_hashes(&cs, &s.merkle_proof.siblings)?,
                        })
                    })
                    .collect::<Result<_, SynthesisError>>()?;
                Ok(FriQueryRoundVar {
                    initial_trees_proof,
                    steps,
                })
            })
            .collect::<Result<_, SynthesisError>>()?;
        Ok(Self {
            commit_phase_merkle_caps,
            query_round_proofs,
            final_poly: alloc_ext(&cs, &proof.final_poly.coeffs)?,
            pow_witness: GlVar::new_witness(cs, || Ok(proof.pow_witness))?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct FriChallengesVar {
    pub fri_alpha: GlExtVar,
    pub fri_betas: Vec<GlExtVar>,
    pub fri_pow_response: GlVar,
    /// Little-endian bits of each query index, `lde_bits` long.
    pub fri_query_indices: Vec<Vec<Boolean<Fr>>>,
}

impl FriChallengesVar {
    /// Continues the transcript after the openings have been observed.
    pub fn derive(
        challenger: &mut ChallengerVar,
        proof: &FriProofVar,
        params: &FriParams,
    ) -> Result<Self, SynthesisError> {
        let fri_alpha = challenger.get_extension_challenge()?;
        let fri_betas = proof
            .commit_phase_merkle_caps
            .iter()
            .map(|cap| {
                challenger.observe_cap(cap)?;
                challenger.get_extension_challenge()
            })
            .collect::<Result<_, _>>()?;
        challenger.observe_extension_elements(&proof.final_poly)?;
        challenger.observe_element(&proof.pow_witness)?;
        let fri_pow_response = challenger.get_challenge()?;

        let lde_bits = params.degree_bits + params.config.rate_bits;
        let fri_query_indices = (0..params.config.num_query_rounds)
            .map(|_| {
                let c = challenger.get_challenge()?;
                Ok(c.to_bits_le()?[..lde_bits].to_vec())
            })
            .collect::<Result<_, SynthesisError>>()?;
        Ok(Self {
            fri_alpha,
            fri_betas,
            fri_pow_response,
            fri_query_indices,
        })
    }
}

/// The top `bits` bits of the response must be zero.
pub fn check_pow(response: &GlVar, bits: u32) -> Result<(), SynthesisError> {
    let low = 64usize
        .checked_sub(bits as usize)
        .ok_or(SynthesisError::Unsatisfiable)?;
    let le = response.to_bits_le()?;
    for b in &le[low..] {
        b.enforce_equal(&Boolean::FALSE)?;
    }
    Ok(())
}

/// `g·ω^{rev(index)}` over the LDE coset, `index` given by little-endian bits.
pub fn query_point(index_bits: &[Boolean<Fr>]) -> Result<GlVar, SynthesisError> {
    let log_n = index_bits.len();
    let omega = primitive_root_of_unity(log_n);
    let mut x = GlVar::constant(MULTIPLICATIVE_GROUP_GENERATOR);
    // Bit k of rev(index) is bit log_n-1-k of index.
    for (k, bit) in index_bits.iter().rev().enumerate() {
        let factor = GlVar::conditionally_select(bit, &GlVar::constant(gl_pow(omega, 1 << k)), &GlVar::one())?;
        x = x.mul(&factor)?;
    }
    Ok(x)
}

/// Interpolates the committed coset through `evals` and evaluates at `beta`.
///
/// `x` is the current query point and `index_bits` the position of `x`
/// inside its coset. With coset start `c = x·g^{-rev(index)}` and
/// `n = 2^arity_bits`, the result is
/// `(β^n - x^n)·c/(n·x^n) · Σ g^i·y_i/(β - c·g^i)` on bit-reversed `evals`.
pub fn compute_evaluation(
    x: &GlVar,
    index_bits: &[Boolean<Fr>],
    arity_bits: usize,
    evals: &[GlExtVar],
    beta: &GlExtVar,
) -> Result<GlExtVar, SynthesisError> {
    let arity = 1usize << arity_bits;
    debug_assert_eq!(evals.len(), arity);
    debug_assert_eq!(index_bits.len(), arity_bits);
    let g = primitive_root_of_unity(arity_bits);
    let g_inv = gl_inv(g);

    let mut coset_start = x.clone();
    for (k, bit) in index_bits.iter().rev().enumerate() {
        let factor = GlVar::conditionally_select(bit, &GlVar::constant(gl_pow(g_inv, 1 << k)), &GlVar::one())?;
        coset_start = coset_start.mul(&factor)?;
    }

    let mut sum = GlExtVar::zero();
    for i in 0..arity {
        let y = &evals[crate::gl_u64::reverse_bits(i, arity_bits)];
        let g_i = gl_pow(g, i as u64);
        let point = GlExtVar::from_base(coset_start.mul_const(g_i)?);
        sum = sum.add(&y.mul_base_const(g_i)?.div(&beta.sub(&point)?)?)?;
    }

    let x_pow = x.exp_power_of_2(arity_bits)?;
    let vanishing = beta.exp_power_of_2(arity_bits)?.sub(&GlExtVar::from_base(x_pow.clone()))?;
    let scale = coset_start.div(&x_pow.mul_const(arity as u64)?)?;
    vanishing.mul(&sum)?.scalar_mul(&scale)
}

/// Per-batch constants shared by every query.
struct PrecomputedReducedOpenings {
    reduced_openings: Vec<GlExtVar>,
    /// `α^{|batch|}` per batch.
    alpha_shifts: Vec<GlExtVar>,
}

impl PrecomputedReducedOpenings {
    fn new(openings: &[Vec<GlExtVar>], alpha: &GlExtVar) -> Result<Self, SynthesisError> {
        let reduced_openings = openings
            .iter()
            .map(|batch| reduce_with_powers(batch, alpha))
            .collect::<Result<_, _>>()?;
        let alpha_shifts = openings
            .iter()
            .map(|batch| alpha.pow_const(batch.len() as u64))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            reduced_openings,
            alpha_shifts,
        })
    }
}

fn combine_initial(
    instance: &FriInstanceVar,
    initial: &[(Vec<GlVar>, Vec<HashOutVar>)],
    alpha: &GlExtVar,
    x: &GlVar,
    precomputed: &PrecomputedReducedOpenings,
    hiding: bool,
) -> Result<GlExtVar, SynthesisError> {
    let x = GlExtVar::from_base(x.clone());
    let mut sum = GlExtVar::zero();
    for (b, batch) in instance.batches.iter().enumerate() {
        let evals: Vec<GlVar> = batch
            .polynomials
            .iter()
            .map(|p| {
                let leaf = &initial[p.oracle_index].0;
                let salted = hiding && instance.oracles[p.oracle_index].blinding;
                let len = leaf.len() - if salted { SALT_SIZE } else { 0 };
                leaf[..len]
                    .get(p.polynomial_index)
                    .cloned()
                    .ok_or(SynthesisError::Unsatisfiable)
            })
            .collect::<Result<_, _>>()?;
        let numerator = reduce_base_with_powers(&evals, alpha)?.sub(&precomputed.reduced_openings[b])?;
        let denominator = x.sub(&batch.point)?;
        sum = sum
            .mul(&precomputed.alpha_shifts[b])?
            .add(&numerator.div(&denominator)?)?;
    }
    Ok(sum)
}

#[allow(clippy::too_many_arguments)]
fn verify_query_round(
    instance: &FriInstanceVar,
    challenges: &FriChallengesVar,
    precomputed: &PrecomputedReducedOpenings,
    initial_caps: &[&[HashOutVar]],
    proof: &FriProofVar,
    index_bits: &[Boolean<Fr>],
    round: &FriQueryRoundVar,
    params: &FriParams,
) -> Result<(), SynthesisError> {
    if round.initial_trees_proof.len() != initial_caps.len() || round.steps.len() != params.reduction_arity_bits.len() {
        return Err(SynthesisError::Unsatisfiable);
    }
    for ((leaf, path), cap) in round.initial_trees_proof.iter().zip(initial_caps) {
        verify_to_cap(leaf, index_bits, cap, path)?;
    }

    let mut x = query_point(index_bits)?;
    let mut old_eval = combine_initial(
        instance,
        &round.initial_trees_proof,
        &challenges.fri_alpha,
        &x,
        precomputed,
        params.hiding,
    )?;

    let mut index_bits = index_bits;
    for (i, &arity_bits) in params.reduction_arity_bits.iter().enumerate() {
        let step = &round.steps[i];
        let (within, coset_index) = index_bits.split_at(arity_bits);
        let position: Vec<Boolean<Fr>> = within.iter().rev().cloned().collect();
        GlExtVar::conditionally_select_power_of_two_vector(&position, &step.evals)?.enforce_equal(&old_eval)?;

        old_eval = compute_evaluation(&x, within, arity_bits, &step.evals, &challenges.fri_betas[i])?;

        let leaf: Vec<GlVar> = step.evals.iter().flat_map(|e| e.0.clone()).collect();
        verify_to_cap(&leaf, coset_index, &proof.commit_phase_merkle_caps[i], &step.merkle_proof)?;

        x = x.exp_power_of_2(arity_bits)?;
        index_bits = coset_index;
    }

    eval_poly(&proof.final_poly, &GlExtVar::from_base(x))?.enforce_equal(&old_eval)
}

/// Verifies every query round of `proof`.
///
/// `openings[b]` are the claimed values of `instance.batches[b]`;
/// `initial_caps` follow the oracle order of `instance`.
pub fn verify_fri_proof(
    instance: &FriInstanceVar,
    openings: &[Vec<GlExtVar>],
    challenges: &FriChallengesVar,
    initial_caps: &[&[HashOutVar]],
    proof: &FriProofVar,
    params: &FriParams,
) -> Result<(), SynthesisError> {
    if proof.query_round_proofs.len() != challenges.fri_query_indices.len()
        || openings.len() != instance.batches.len()
    {
        return Err(SynthesisError::Unsatisfiable);
    }
    check_pow(&challenges.fri_pow_response, params.config.proof_of_work_bits)?;
    let precomputed = PrecomputedReducedOpenings::new(openings, &challenges.fri_alpha)?;
    for (index_bits, round) in challenges.fri_query_indices.iter().zip(&proof.query_round_proofs) {
        verify_query_round(
            instance,
            challenges,
            &precomputed,
            initial_caps,
            proof,
            index_bits,
            round,
            params,
        )?;
    }
    tracing::debug!(
        queries = proof.query_round_proofs.len(),
        folds = params.reduction_arity_bits.len(),
        "FRI query rounds synthesized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl_u64::{
        ext_add, ext_div, ext_from_base, ext_mul, ext_sub, gl_mul, reverse_bits, GlExt, P_GL,
    };
    use ark_relations::r1cs::ConstraintSystem;

    fn witness_bits(cs: &ConstraintSystemRef<Fr>, v: usize, n: usize) -> Vec<Boolean<Fr>> {
        (0..n)
            .map(|i| Boolean::new_witness(cs.clone(), || Ok((v >> i) & 1 == 1)).unwrap())
            .collect()
    }

    /// Lagrange interpolation through `points` evaluated at `z`.
    fn interpolate(points: &[(u64, GlExt)], z: GlExt) -> GlExt {
        let mut acc = [0, 0];
        for (i, &(xi, yi)) in points.iter().enumerate() {
            let mut term = yi;
            for (j, &(xj, _)) in points.iter().enumerate() {
                if i != j {
                    let num = ext_sub(z, ext_from_base(xj));
                    let den = ext_from_base(crate::gl_u64::gl_sub(xi, xj));
                    term = ext_mul(term, ext_div(num, den));
                }
            }
            acc = ext_add(acc, term);
        }
        acc
    }

    #[test]
    fn query_point_matches_host() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let log_n = 7;
        for index in [0usize, 1, 37, 127] {
            let bits = witness_bits(&cs, index, log_n);
            let got = query_point(&bits).unwrap().value().unwrap();
            let omega = primitive_root_of_unity(log_n);
            let expected = gl_mul(
                MULTIPLICATIVE_GROUP_GENERATOR,
                gl_pow(omega, reverse_bits(index, log_n) as u64),
            );
            assert_eq!(got, expected);
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn folding_interpolates_the_coset() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let arity_bits = 3;
        let arity = 1 << arity_bits;
        let g = primitive_root_of_unity(arity_bits);
        let beta: GlExt = [0x1234_5678, 0x9abc_def0];
        for within in [0usize, 3, 7] {
            let coset_start = 0xdead_beef % P_GL;
            // x sits at position `within`, in bit-reversed coset order.
            let x = gl_mul(coset_start, gl_pow(g, reverse_bits(within, arity_bits) as u64));
            let natural: Vec<(u64, GlExt)> = (0..arity)
                .map(|i| (gl_mul(coset_start, gl_pow(g, i as u64)), [i as u64 * 3 + 1, 17 * i as u64]))
                .collect();
            let expected = interpolate(&natural, beta);
            let committed: Vec<GlExt> = (0..arity).map(|i| natural[reverse_bits(i, arity_bits)].1).collect();

            let x_var = GlVar::new_witness(cs.clone(), || Ok(x)).unwrap();
            let bits = witness_bits(&cs, within, arity_bits);
            let evals: Vec<GlExtVar> = committed
                .iter()
                .map(|e| GlExtVar::new_witness(cs.clone(), *e).unwrap())
                .collect();
            let beta_var = GlExtVar::new_witness(cs.clone(), beta).unwrap();
            let got = compute_evaluation(&x_var, &bits, arity_bits, &evals, &beta_var).unwrap();
            assert_eq!(got.value().unwrap(), expected);
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn folding_is_deterministic() {
        let run = || {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let x = GlVar::new_witness(cs.clone(), || Ok(99)).unwrap();
            let bits = witness_bits(&cs, 1, 1);
            let evals = vec![GlExtVar::constant([5, 6]), GlExtVar::constant([7, 8])];
            let beta = GlExtVar::new_witness(cs.clone(), [3, 4]).unwrap();
            compute_evaluation(&x, &bits, 1, &evals, &beta).unwrap().value().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn proof_of_work_bits_are_enforced() {
        for (value, ok) in [(1u64 << 40, true), (1u64 << 50, false)] {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let r = GlVar::new_witness(cs.clone(), || Ok(value)).unwrap();
            check_pow(&r, 16).unwrap();
            assert_eq!(cs.is_satisfied().unwrap(), ok);
        }
    }

    #[test]
    fn proof_of_work_wider_than_a_limb_is_refused() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let r = GlVar::new_witness(cs.clone(), || Ok(0)).unwrap();
        check_pow(&r, 64).unwrap();
        assert!(check_pow(&r, 65).is_err());

        let mut json: serde_json::Value =
            serde_json::from_str(&crate::types::common::tests::sample_json()).unwrap();
        json["fri_params"]["config"]["proof_of_work_bits"] = 65.into();
        assert!(matches!(
            crate::types::CommonCircuitData::from_json(&json.to_string()),
            Err(crate::error::ConfigError::Unsupported(_))
        ));
    }
}
