//! In-circuit Poseidon over the native field (BLS12-381 `Fr`).
//!
//! The hasher behind every Merkle commitment of the wrapped proof. Runs
//! natively on `FpVar<Fr>`: linear layers are free, each S-box costs three
//! products. Goldilocks inputs are packed three limbs per lane, which is
//! injective because every limb is canonical.

use ark_ff::AdditiveGroup;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::crypto::poseidon_bls12_381::{
    BlsState, SparseMatrix, LIMBS_PER_CHUNK, LIMBS_PER_LANE, POSEIDON_BLS_PARAMS, TO_VEC_CHUNK_BITS,
    TO_VEC_LEN, WIDTH,
};
use crate::gadgets::gl::{pack_bits_le, GlVar};
use crate::Fr;

/// Digest of the Merkle hasher.
pub type HashOutVar = FpVar<Fr>;
type StateVar = [FpVar<Fr>; WIDTH];

fn sbox(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    Ok(x4 * x)
}

fn sbox_all(state: &StateVar) -> Result<StateVar, SynthesisError> {
    let out: Vec<FpVar<Fr>> = state.iter().map(sbox).collect::<Result<_, _>>()?;
    Ok(core::array::from_fn(|i| out[i].clone()))
}

fn add_constants(state: &mut StateVar, c: &BlsState) {
    for (s, c) in state.iter_mut().zip(c) {
        *s += *c;
    }
}

fn mat_vec(m: &[[Fr; WIDTH]; WIDTH], state: &StateVar) -> StateVar {
    core::array::from_fn(|r| {
        let mut acc = FpVar::Constant(Fr::ZERO);
        for (c, s) in state.iter().enumerate() {
            acc += s * m[r][c];
        }
        acc
    })
}

fn sparse_apply(m: &SparseMatrix, state: &StateVar) -> StateVar {
    let mut out = state.clone();
    let mut s0 = &state[0] * m.m00;
    for j in 1..WIDTH {
        s0 += &state[j] * m.row[j - 1];
        out[j] = &state[j] + &state[0] * m.col[j - 1];
    }
    out[0] = s0;
    out
}

pub fn permute(state: &StateVar) -> Result<StateVar, SynthesisError> {
    let p = &*POSEIDON_BLS_PARAMS;
    let mut st = state.clone();
    add_constants(&mut st, &p.initial_constants);
    for c in &p.first_half_constants {
        st = sbox_all(&st)?;
        add_constants(&mut st, c);
        st = mat_vec(&p.mds, &st);
    }
    st = sbox_all(&st)?;
    add_constants(&mut st, &p.pre_sparse_constants);
    st = mat_vec(&p.pre_sparse_matrix, &st);

    for (c, m) in p.partial_constants.iter().zip(&p.sparse_matrices) {
        st[0] = sbox(&st[0])? + *c;
        st = sparse_apply(m, &st);
    }

    for c in &p.second_half_constants {
        st = sbox_all(&st)?;
        add_constants(&mut st, c);
        st = mat_vec(&p.mds, &st);
    }
    st = sbox_all(&st)?;
    Ok(mat_vec(&p.mds, &st))
}

/// `Σ limbs[k]·2^(64k)`.
pub fn pack_limbs(limbs: &[GlVar]) -> FpVar<Fr> {
    debug_assert!(limbs.len() <= LIMBS_PER_LANE);
    let shift = Fr::from(1u128 << 64);
    let mut acc = FpVar::Constant(Fr::ZERO);
    for l in limbs.iter().rev() {
        acc = acc * shift + l.native();
    }
    acc
}

pub fn hash_no_pad(inputs: &[GlVar]) -> Result<HashOutVar, SynthesisError> {
    let mut state: StateVar = core::array::from_fn(|_| FpVar::Constant(Fr::ZERO));
    for chunk in inputs.chunks(LIMBS_PER_CHUNK) {
        for (lane, limbs) in chunk.chunks(LIMBS_PER_LANE).enumerate() {
            state[lane + 1] = pack_limbs(limbs);
        }
        state = permute(&state)?;
    }
    Ok(state[0].clone())
}

/// Short inputs are embedded directly instead of hashed.
pub fn hash_or_noop(inputs: &[GlVar]) -> Result<HashOutVar, SynthesisError> {
    if inputs.len() <= LIMBS_PER_LANE {
        Ok(pack_limbs(inputs))
    } else {
        hash_no_pad(inputs)
    }
}

pub fn two_to_one(left: &HashOutVar, right: &HashOutVar) -> Result<HashOutVar, SynthesisError> {
    let zero = FpVar::Constant(Fr::ZERO);
    let out = permute(&[zero.clone(), zero, left.clone(), right.clone()])?;
    Ok(out[0].clone())
}

/// Splits a digest into five Goldilocks elements of at most 56 bits each.
///
/// The 255-bit decomposition is checked against the `Fr` modulus so the
/// chunks are unique.
pub fn to_vec(hash: &HashOutVar) -> Result<Vec<GlVar>, SynthesisError> {
    let bits = hash.to_bits_le()?;
    Ok((0..TO_VEC_LEN)
        .map(|i| {
            let lo = i * TO_VEC_CHUNK_BITS;
            let hi = (lo + TO_VEC_CHUNK_BITS).min(bits.len());
            // At most 56 bits, always below p_GL.
            GlVar::from_canonical_unchecked(pack_bits_le(&bits[lo..hi]))
        })
        .collect())
}

pub fn constant_hash(h: Fr) -> HashOutVar {
    FpVar::Constant(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::poseidon_bls12_381 as host;
    use ark_relations::r1cs::ConstraintSystem;

    fn limbs(cs: &ark_relations::r1cs::ConstraintSystemRef<Fr>, v: &[u64]) -> Vec<GlVar> {
        GlVar::new_witness_vec(cs.clone(), v).unwrap()
    }

    #[test]
    fn sponge_matches_host() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        for n in [1usize, 3, 4, 9, 10, 20] {
            let input: Vec<u64> = (0..n as u64).map(|i| i * 0x1_0000_0001 + 7).collect();
            let got = hash_or_noop(&limbs(&cs, &input)).unwrap();
            assert_eq!(got.value().unwrap(), host::hash_or_noop(&input));
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn compression_matches_host() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let l = FpVar::new_witness(cs.clone(), || Ok(Fr::from(1u64))).unwrap();
        let r = FpVar::new_witness(cs.clone(), || Ok(Fr::from(2u64))).unwrap();
        let got = two_to_one(&l, &r).unwrap();
        assert_eq!(got.value().unwrap(), host::two_to_one(Fr::from(1u64), Fr::from(2u64)));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn to_vec_matches_host() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let h = host::two_to_one(Fr::from(3u64), Fr::from(4u64));
        let v = FpVar::new_witness(cs.clone(), || Ok(h)).unwrap();
        let got: Vec<u64> = to_vec(&v).unwrap().iter().map(|x| x.value().unwrap()).collect();
        assert_eq!(got, host::to_vec(h));
        assert!(cs.is_satisfied().unwrap());
    }
}
