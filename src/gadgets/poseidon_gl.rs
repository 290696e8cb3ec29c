//! In-circuit Poseidon over emulated Goldilocks (width 12).
//!
//! Same round structure as `crypto::poseidon_goldilocks`. The state is kept as
//! unreduced [`GlAcc`]s between linear layers; each S-box input is reduced
//! once and raised to the 7th power with four products.

use ark_relations::r1cs::SynthesisError;

use crate::crypto::goldilocks_constants::*;
use crate::gadgets::gl::{GlAcc, GlVar};

pub type GlStateVar = [GlVar; WIDTH];

fn sbox(x: &GlVar) -> Result<GlVar, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    let x3 = x2.mul(x)?;
    x4.mul(&x3)
}

fn mds_layer(state: &[GlVar; WIDTH]) -> [GlAcc; WIDTH] {
    core::array::from_fn(|r| {
        let mut acc = state[r].acc().mul_const(MDS_DIAG[r]);
        for i in 0..WIDTH {
            acc = acc.add(&state[(i + r) % WIDTH].acc().mul_const(MDS_CIRC[i]));
        }
        acc
    })
}

fn full_round(state: &[GlAcc; WIDTH], round_ctr: usize) -> Result<[GlAcc; WIDTH], SynthesisError> {
    let mut out: Vec<GlVar> = Vec::with_capacity(WIDTH);
    for (i, s) in state.iter().enumerate() {
        let x = s.add(&GlAcc::constant(ROUND_CONSTANTS[i + WIDTH * round_ctr])).reduce()?;
        out.push(sbox(&x)?);
    }
    let arr: [GlVar; WIDTH] = core::array::from_fn(|i| out[i].clone());
    Ok(mds_layer(&arr))
}

fn partial_rounds(state: &[GlAcc; WIDTH]) -> Result<[GlAcc; WIDTH], SynthesisError> {
    let shifted: Vec<GlVar> = state
        .iter()
        .zip(FAST_PARTIAL_FIRST_ROUND_CONSTANT)
        .map(|(s, c)| s.add(&GlAcc::constant(c)).reduce())
        .collect::<Result<_, _>>()?;

    let mut st: [GlAcc; WIDTH] = core::array::from_fn(|_| GlAcc::zero());
    st[0] = shifted[0].acc();
    for c in 1..WIDTH {
        let mut acc = GlAcc::zero();
        for r in 1..WIDTH {
            acc = acc.add(&shifted[r].acc().mul_const(FAST_PARTIAL_ROUND_INITIAL_MATRIX[r - 1][c - 1]));
        }
        st[c] = acc;
    }

    for i in 0..PARTIAL_ROUNDS {
        let mut s0 = sbox(&st[0].reduce()?)?.acc();
        if i < PARTIAL_ROUNDS - 1 {
            s0 = s0.add(&GlAcc::constant(FAST_PARTIAL_ROUND_CONSTANTS[i]));
        }
        let s0 = s0.reduce()?;
        let mut d = s0.acc().mul_const(MDS_CIRC[0] + MDS_DIAG[0]);
        for j in 1..WIDTH {
            let sj = st[j].reduce()?;
            d = d.add(&sj.acc().mul_const(FAST_PARTIAL_ROUND_W_HATS[i][j - 1]));
            st[j] = sj.acc().add(&s0.acc().mul_const(FAST_PARTIAL_ROUND_VS[i][j - 1]));
        }
        st[0] = d;
    }
    Ok(st)
}

/// Poseidon permutation on a width-12 state of canonical elements.
pub fn permute(state: &GlStateVar) -> Result<GlStateVar, SynthesisError> {
    let mut st: [GlAcc; WIDTH] = core::array::from_fn(|i| state[i].acc());
    let mut round_ctr = 0;
    for _ in 0..HALF_FULL_ROUNDS {
        st = full_round(&st, round_ctr)?;
        round_ctr += 1;
    }
    st = partial_rounds(&st)?;
    round_ctr += PARTIAL_ROUNDS;
    for _ in 0..HALF_FULL_ROUNDS {
        st = full_round(&st, round_ctr)?;
        round_ctr += 1;
    }
    let out: Vec<GlVar> = st.iter().map(|a| a.reduce()).collect::<Result<_, _>>()?;
    Ok(core::array::from_fn(|i| out[i].clone()))
}

/// Sponge without padding, four output elements.
pub fn hash_no_pad(inputs: &[GlVar]) -> Result<[GlVar; 4], SynthesisError> {
    let mut state: GlStateVar = core::array::from_fn(|_| GlVar::zero());
    for chunk in inputs.chunks(RATE) {
        for (s, x) in state.iter_mut().zip(chunk) {
            *s = x.clone();
        }
        state = permute(&state)?;
    }
    Ok([state[0].clone(), state[1].clone(), state[2].clone(), state[3].clone()])
}
