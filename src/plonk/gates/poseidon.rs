//! Poseidon permutation gate and the standalone MDS gate (width 12).
//!
//! Wire layout of the permutation gate:
//! - inputs `0..12`, outputs `12..24`, swap flag at 24
//! - `delta_i = swap·(in_{i+4} - in_i)` for `i < 4` at `25..29`
//! - S-box inputs of full rounds 1..4 of the first half at `29..65`
//! - S-box inputs of the 22 partial rounds at `65..87`
//! - S-box inputs of the 4 second-half full rounds at `87..135`

use ark_relations::r1cs::SynthesisError;

use super::{EvaluationVars, D};
use crate::crypto::goldilocks_constants::*;
use crate::gadgets::gl_ext::{linear_combination, GlExtAlgebraVar, GlExtVar};

const WIRE_SWAP: usize = 2 * WIDTH;
const START_DELTA: usize = 2 * WIDTH + 1;
const START_FULL_0: usize = START_DELTA + 4;
const START_PARTIAL: usize = START_FULL_0 + WIDTH * (HALF_FULL_ROUNDS - 1);
const START_FULL_1: usize = START_PARTIAL + PARTIAL_ROUNDS;

pub(super) const NUM_WIRES: usize = START_FULL_1 + WIDTH * HALF_FULL_ROUNDS;
pub(super) const NUM_CONSTRAINTS: usize =
    1 + 4 + WIDTH * (HALF_FULL_ROUNDS - 1) + PARTIAL_ROUNDS + WIDTH * HALF_FULL_ROUNDS + WIDTH;

pub(super) const MDS_NUM_WIRES: usize = 2 * WIDTH * D;
pub(super) const MDS_NUM_CONSTRAINTS: usize = WIDTH * D;

fn wire_full_sbox_0(round: usize, i: usize) -> usize {
    debug_assert!(round != 0);
    START_FULL_0 + WIDTH * (round - 1) + i
}

fn wire_full_sbox_1(round: usize, i: usize) -> usize {
    START_FULL_1 + WIDTH * round + i
}

type ExtState = Vec<GlExtVar>;

fn sbox(x: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    let x3 = x2.mul(x)?;
    x4.mul(&x3)
}

fn constant_layer(state: &mut ExtState, round_ctr: usize) -> Result<(), SynthesisError> {
    for (i, s) in state.iter_mut().enumerate() {
        *s = s.add_const([ROUND_CONSTANTS[i + WIDTH * round_ctr], 0])?;
    }
    Ok(())
}

fn mds_layer(state: &ExtState) -> Result<ExtState, SynthesisError> {
    (0..WIDTH)
        .map(|r| {
            let terms = (0..WIDTH)
                .map(|i| (&state[(i + r) % WIDTH], MDS_CIRC[i]))
                .chain(core::iter::once((&state[r], MDS_DIAG[r])));
            linear_combination(terms, [0, 0])
        })
        .collect()
}

fn mds_partial_layer_init(state: &ExtState) -> Result<ExtState, SynthesisError> {
    let mut out = Vec::with_capacity(WIDTH);
    out.push(state[0].clone());
    for c in 1..WIDTH {
        let terms = (1..WIDTH).map(|r| (&state[r], FAST_PARTIAL_ROUND_INITIAL_MATRIX[r - 1][c - 1]));
        out.push(linear_combination(terms, [0, 0])?);
    }
    Ok(out)
}

fn mds_partial_layer_fast(state: &ExtState, r: usize) -> Result<ExtState, SynthesisError> {
    let d_terms = core::iter::once((&state[0], MDS_CIRC[0] + MDS_DIAG[0]))
        .chain((1..WIDTH).map(|i| (&state[i], FAST_PARTIAL_ROUND_W_HATS[r][i - 1])));
    let mut out = Vec::with_capacity(WIDTH);
    out.push(linear_combination(d_terms, [0, 0])?);
    for i in 1..WIDTH {
        let terms = [(&state[0], FAST_PARTIAL_ROUND_VS[r][i - 1]), (&state[i], 1)];
        out.push(linear_combination(terms, [0, 0])?);
    }
    Ok(out)
}

pub(super) fn eval(vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
    let w = vars.local_wires;
    let mut out = Vec::with_capacity(NUM_CONSTRAINTS);

    let swap = &w[WIRE_SWAP];
    out.push(swap.mul_sub(swap, swap)?);
    for i in 0..4 {
        let diff = w[i + 4].sub(&w[i])?;
        out.push(swap.mul_sub(&diff, &w[START_DELTA + i])?);
    }

    let mut state: ExtState = w[..WIDTH].to_vec();
    for i in 0..4 {
        let delta = &w[START_DELTA + i];
        state[i] = w[i].add(delta)?;
        state[i + 4] = w[i + 4].sub(delta)?;
    }

    let mut round_ctr = 0;
    for r in 0..HALF_FULL_ROUNDS {
        constant_layer(&mut state, round_ctr)?;
        if r != 0 {
            for (i, s) in state.iter_mut().enumerate() {
                let sbox_in = &w[wire_full_sbox_0(r, i)];
                out.push(s.sub(sbox_in)?);
                *s = sbox_in.clone();
            }
        }
        state = state.iter().map(sbox).collect::<Result<_, _>>()?;
        state = mds_layer(&state)?;
        round_ctr += 1;
    }

    for (i, s) in state.iter_mut().enumerate() {
        *s = s.add_const([FAST_PARTIAL_FIRST_ROUND_CONSTANT[i], 0])?;
    }
    state = mds_partial_layer_init(&state)?;
    for r in 0..PARTIAL_ROUNDS {
        let sbox_in = &w[START_PARTIAL + r];
        out.push(state[0].sub(sbox_in)?);
        state[0] = sbox(sbox_in)?;
        if r < PARTIAL_ROUNDS - 1 {
            state[0] = state[0].add_const([FAST_PARTIAL_ROUND_CONSTANTS[r], 0])?;
        }
        state = mds_partial_layer_fast(&state, r)?;
    }
    round_ctr += PARTIAL_ROUNDS;

    for r in 0..HALF_FULL_ROUNDS {
        constant_layer(&mut state, round_ctr)?;
        for (i, s) in state.iter_mut().enumerate() {
            let sbox_in = &w[wire_full_sbox_1(r, i)];
            out.push(s.sub(sbox_in)?);
            *s = sbox_in.clone();
        }
        state = state.iter().map(sbox).collect::<Result<_, _>>()?;
        state = mds_layer(&state)?;
        round_ctr += 1;
    }

    for (i, s) in state.iter().enumerate() {
        out.push(s.sub(&w[WIDTH + i])?);
    }
    Ok(out)
}

/// MDS layer on algebra inputs at wires `D·i`, outputs at `D·(12 + i)`.
pub(super) fn eval_mds(vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
    let w = vars.local_wires;
    let inputs: Vec<GlExtAlgebraVar> = (0..WIDTH)
        .map(|i| GlExtAlgebraVar::from_slice(&w[D * i..]))
        .collect();
    let mut out = Vec::with_capacity(MDS_NUM_CONSTRAINTS);
    for r in 0..WIDTH {
        let mut computed = [GlExtVar::zero(), GlExtVar::zero()];
        for (k, c) in computed.iter_mut().enumerate() {
            let terms = (0..WIDTH)
                .map(|i| (&inputs[(i + r) % WIDTH].0[k], MDS_CIRC[i]))
                .chain(core::iter::once((&inputs[r].0[k], MDS_DIAG[r])));
            *c = linear_combination(terms, [0, 0])?;
        }
        let output = GlExtAlgebraVar::from_slice(&w[D * (WIDTH + r)..]);
        out.extend(output.sub(&GlExtAlgebraVar(computed))?.to_ext_array());
    }
    Ok(out)
}
