//! Host Poseidon permutation over Goldilocks (width 12).
//!
//! Mirrors the in-circuit chip in `gadgets::poseidon_gl` and serves as its
//! oracle in tests; the public-input hash of a fixture is also recomputed here
//! before synthesis.

use super::goldilocks_constants::*;
use crate::gl_u64::{gl_add, gl_mul, gl_pow};

pub type GlState = [u64; WIDTH];

fn sbox(x: u64) -> u64 {
    gl_pow(x, 7)
}

fn mds_row(state: &GlState, r: usize) -> u64 {
    let mut acc: u128 = 0;
    for i in 0..WIDTH {
        acc += state[(i + r) % WIDTH] as u128 * MDS_CIRC[i] as u128;
    }
    acc += state[r] as u128 * MDS_DIAG[r] as u128;
    (acc % crate::gl_u64::P_GL as u128) as u64
}

pub fn mds_layer(state: &GlState) -> GlState {
    core::array::from_fn(|r| mds_row(state, r))
}

fn full_round(state: &mut GlState, round_ctr: usize) {
    for (i, s) in state.iter_mut().enumerate() {
        *s = sbox(gl_add(*s, ROUND_CONSTANTS[i + WIDTH * round_ctr]));
    }
    *state = mds_layer(state);
}

fn partial_rounds(state: &mut GlState) {
    for (s, c) in state.iter_mut().zip(FAST_PARTIAL_FIRST_ROUND_CONSTANT) {
        *s = gl_add(*s, c);
    }
    let mut mixed = [0u64; WIDTH];
    mixed[0] = state[0];
    for r in 1..WIDTH {
        for c in 1..WIDTH {
            mixed[c] = gl_add(mixed[c], gl_mul(state[r], FAST_PARTIAL_ROUND_INITIAL_MATRIX[r - 1][c - 1]));
        }
    }
    *state = mixed;

    for i in 0..PARTIAL_ROUNDS {
        state[0] = sbox(state[0]);
        if i < PARTIAL_ROUNDS - 1 {
            state[0] = gl_add(state[0], FAST_PARTIAL_ROUND_CONSTANTS[i]);
        }
        let s0 = state[0];
        let mut d = gl_mul(s0, MDS_CIRC[0] + MDS_DIAG[0]);
        for j in 1..WIDTH {
            d = gl_add(d, gl_mul(state[j], FAST_PARTIAL_ROUND_W_HATS[i][j - 1]));
        }
        for j in 1..WIDTH {
            state[j] = gl_add(state[j], gl_mul(s0, FAST_PARTIAL_ROUND_VS[i][j - 1]));
        }
        state[0] = d;
    }
}

pub fn permute(mut state: GlState) -> GlState {
    let mut round_ctr = 0;
    for _ in 0..HALF_FULL_ROUNDS {
        full_round(&mut state, round_ctr);
        round_ctr += 1;
    }
    partial_rounds(&mut state);
    round_ctr += PARTIAL_ROUNDS;
    for _ in 0..HALF_FULL_ROUNDS {
        full_round(&mut state, round_ctr);
        round_ctr += 1;
    }
    state
}

/// Textbook partial rounds (full constant layer and dense MDS every round).
pub fn permute_naive(mut state: GlState) -> GlState {
    let mut round_ctr = 0;
    for _ in 0..HALF_FULL_ROUNDS {
        full_round(&mut state, round_ctr);
        round_ctr += 1;
    }
    for _ in 0..PARTIAL_ROUNDS {
        for (i, s) in state.iter_mut().enumerate() {
            *s = gl_add(*s, ROUND_CONSTANTS[i + WIDTH * round_ctr]);
        }
        state[0] = sbox(state[0]);
        state = mds_layer(&state);
        round_ctr += 1;
    }
    for _ in 0..HALF_FULL_ROUNDS {
        full_round(&mut state, round_ctr);
        round_ctr += 1;
    }
    state
}

/// Sponge without padding: overwrite the rate with each chunk, permute,
/// squeeze four elements.
pub fn hash_no_pad(inputs: &[u64]) -> [u64; 4] {
    let mut state = [0u64; WIDTH];
    for chunk in inputs.chunks(RATE) {
        state[..chunk.len()].copy_from_slice(chunk);
        state = permute(state);
    }
    [state[0], state[1], state[2], state[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_inputs_hash_vector() {
        let out = hash_no_pad(&[0, 1, 3736710860384812976]);
        assert_eq!(
            out,
            [
                8416658900775745054,
                12574228347150446423,
                9629056739760131473,
                3119289788404190010
            ]
        );
    }

    #[test]
    fn fast_partial_rounds_match_naive() {
        let mut state = [0u64; WIDTH];
        for (i, s) in state.iter_mut().enumerate() {
            *s = 0x9e37_79b9_7f4a_7c15u64.wrapping_mul(i as u64 + 1) % crate::gl_u64::P_GL;
        }
        assert_eq!(permute(state), permute_naive(state));
    }

    #[test]
    fn empty_input_hashes_to_zero_state() {
        assert_eq!(hash_no_pad(&[]), [0, 0, 0, 0]);
    }
}
