//! Poseidon over the BLS12-381 scalar field, used as the Merkle hasher of the
//! wrapped proofs: t=4, rate 3, alpha=5, RF=8, RP=56.
//!
//! Round constants and the Cauchy MDS matrix come from the Grain LFSR of the
//! Poseidon reference parameter generator. The permutation runs in the
//! optimized form: partial-round constants are moved onto lane 0 and the
//! partial-round MDS multiplications are factored into one dense
//! "pre-sparse" matrix followed by one sparse matrix per round. Both forms are
//! derived at first use and cached in [`POSEIDON_BLS_PARAMS`].
//!
//! Goldilocks inputs are packed three 64-bit limbs per lane; outputs are
//! re-embedded into Goldilocks by [`to_vec`] in 56-bit chunks.

use std::collections::VecDeque;

use ark_ff::{AdditiveGroup, Field, PrimeField, Zero};
use num_bigint::BigUint;
use once_cell::sync::Lazy;

use crate::Fr;

pub const WIDTH: usize = 4;
pub const RATE: usize = 3;
pub const FULL_ROUNDS: usize = 8;
pub const HALF_FULL_ROUNDS: usize = FULL_ROUNDS / 2;
pub const PARTIAL_ROUNDS: usize = 56;
pub const ALPHA: u64 = 5;
/// Goldilocks limbs packed into one lane.
pub const LIMBS_PER_LANE: usize = 3;
/// Goldilocks limbs absorbed per permutation.
pub const LIMBS_PER_CHUNK: usize = RATE * LIMBS_PER_LANE;
pub const TO_VEC_CHUNK_BITS: usize = 56;
pub const FIELD_BITS: usize = 255;
pub const TO_VEC_LEN: usize = FIELD_BITS.div_ceil(TO_VEC_CHUNK_BITS);

pub type BlsState = [Fr; WIDTH];
type Matrix = [[Fr; WIDTH]; WIDTH];

/// `[[m00, row], [col, I]]`, applied after the S-box of one partial round.
#[derive(Clone, Debug)]
pub struct SparseMatrix {
    pub m00: Fr,
    pub row: [Fr; WIDTH - 1],
    pub col: [Fr; WIDTH - 1],
}

impl SparseMatrix {
    pub fn apply(&self, state: &BlsState) -> BlsState {
        let mut out = *state;
        let mut s0 = self.m00 * state[0];
        for j in 1..WIDTH {
            s0 += self.row[j - 1] * state[j];
            out[j] = state[j] + self.col[j - 1] * state[0];
        }
        out[0] = s0;
        out
    }
}

#[derive(Clone, Debug)]
pub struct PoseidonBlsParams {
    /// Textbook constants, one vector per round.
    pub round_constants: Vec<BlsState>,
    pub mds: Matrix,
    pub mds_inverse: Matrix,

    /// Added before the first round.
    pub initial_constants: BlsState,
    /// Added after the S-box of first-half full rounds 0..HALF_FULL_ROUNDS-1.
    pub first_half_constants: Vec<BlsState>,
    /// Added after the S-box of the last first-half full round.
    pub pre_sparse_constants: BlsState,
    pub pre_sparse_matrix: Matrix,
    /// Added to lane 0 after each partial-round S-box.
    pub partial_constants: Vec<Fr>,
    pub sparse_matrices: Vec<SparseMatrix>,
    /// Added after the S-box of second-half full rounds 0..HALF_FULL_ROUNDS-1.
    pub second_half_constants: Vec<BlsState>,
}

pub static POSEIDON_BLS_PARAMS: Lazy<PoseidonBlsParams> = Lazy::new(PoseidonBlsParams::derive);

/// Self-shrinking Grain LFSR from the Poseidon reference generator.
struct Grain {
    bits: VecDeque<bool>,
}

impl Grain {
    fn new(field_bits: usize, width: usize, rf: usize, rp: usize) -> Self {
        let mut bits = VecDeque::with_capacity(80);
        let mut push = |value: usize, len: usize| {
            for i in (0..len).rev() {
                bits.push_back((value >> i) & 1 == 1);
            }
        };
        push(1, 2); // prime field
        push(0, 4); // x^alpha S-box
        push(field_bits, 12);
        push(width, 12);
        push(rf, 10);
        push(rp, 10);
        push((1 << 30) - 1, 30);
        let mut grain = Self { bits };
        for _ in 0..160 {
            grain.clock();
        }
        grain
    }

    fn clock(&mut self) -> bool {
        let b = &self.bits;
        let next = b[62] ^ b[51] ^ b[38] ^ b[23] ^ b[13] ^ b[0];
        self.bits.pop_front();
        self.bits.push_back(next);
        next
    }

    fn next_bit(&mut self) -> bool {
        loop {
            let keep = self.clock();
            let bit = self.clock();
            if keep {
                return bit;
            }
        }
    }

    fn next_uint(&mut self, bits: usize) -> BigUint {
        let mut v = BigUint::zero();
        for _ in 0..bits {
            v <<= 1u32;
            if self.next_bit() {
                v += 1u32;
            }
        }
        v
    }

    /// Uniform field element by rejection sampling.
    fn next_field_element(&mut self) -> Fr {
        let modulus = BigUint::from(Fr::MODULUS);
        loop {
            let v = self.next_uint(FIELD_BITS);
            if v < modulus {
                return Fr::from(v);
            }
        }
    }

    /// Field element reduced modulo p (used for the MDS sampling).
    fn next_field_element_reduced(&mut self) -> Fr {
        Fr::from(self.next_uint(FIELD_BITS))
    }
}

fn mat_vec(m: &Matrix, v: &BlsState) -> BlsState {
    core::array::from_fn(|i| (0..WIDTH).map(|j| m[i][j] * v[j]).sum())
}

fn mat_mul(a: &Matrix, b: &Matrix) -> Matrix {
    core::array::from_fn(|i| core::array::from_fn(|j| (0..WIDTH).map(|k| a[i][k] * b[k][j]).sum()))
}

/// Gauss-Jordan inverse of an n×n matrix; `None` when singular.
fn invert(m: &[Vec<Fr>]) -> Option<Vec<Vec<Fr>>> {
    let n = m.len();
    let mut a: Vec<Vec<Fr>> = m
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.extend((0..n).map(|j| if i == j { Fr::ONE } else { Fr::ZERO }));
            r
        })
        .collect();
    for c in 0..n {
        let pivot = (c..n).find(|&r| !a[r][c].is_zero())?;
        a.swap(c, pivot);
        let inv = a[c][c].inverse()?;
        for x in a[c].iter_mut() {
            *x *= inv;
        }
        for r in 0..n {
            if r != c && !a[r][c].is_zero() {
                let f = a[r][c];
                let pivot_row = a[c].clone();
                for (x, y) in a[r].iter_mut().zip(pivot_row) {
                    *x -= f * y;
                }
            }
        }
    }
    Some(a.into_iter().map(|row| row[n..].to_vec()).collect())
}

fn to_rows(m: &Matrix) -> Vec<Vec<Fr>> {
    m.iter().map(|r| r.to_vec()).collect()
}

fn from_rows(rows: &[Vec<Fr>]) -> Matrix {
    core::array::from_fn(|i| core::array::from_fn(|j| rows[i][j]))
}

impl PoseidonBlsParams {
    fn derive() -> Self {
        let rounds = FULL_ROUNDS + PARTIAL_ROUNDS;
        let mut grain = Grain::new(FIELD_BITS, WIDTH, FULL_ROUNDS, PARTIAL_ROUNDS);
        let round_constants: Vec<BlsState> = (0..rounds)
            .map(|_| core::array::from_fn(|_| grain.next_field_element()))
            .collect();

        let mds = loop {
            let samples: Vec<Fr> = (0..2 * WIDTH).map(|_| grain.next_field_element_reduced()).collect();
            let distinct = (0..samples.len()).all(|i| (i + 1..samples.len()).all(|j| samples[i] != samples[j]));
            if !distinct {
                continue;
            }
            let (xs, ys) = samples.split_at(WIDTH);
            let inverses: Option<Vec<Fr>> = xs
                .iter()
                .flat_map(|x| ys.iter().map(move |y| (*x + y).inverse()))
                .collect();
            if let Some(entries) = inverses {
                break core::array::from_fn(|i| core::array::from_fn(|j| entries[i * WIDTH + j]));
            }
        };
        let mds_inverse = from_rows(&invert(&to_rows(&mds)).unwrap_or_else(|| unreachable!("Cauchy matrices are invertible")));

        // Move partial-round constants backwards: lanes 1.. join the previous
        // round's pre-S-box constants, lane 0 stays as a post-S-box scalar.
        let mut carried = round_constants[HALF_FULL_ROUNDS + PARTIAL_ROUNDS];
        let mut partial_constants = vec![Fr::ZERO; PARTIAL_ROUNDS];
        for i in (0..PARTIAL_ROUNDS).rev() {
            let moved = mat_vec(&mds_inverse, &carried);
            partial_constants[i] = moved[0];
            let mut next = round_constants[HALF_FULL_ROUNDS + i];
            for j in 1..WIDTH {
                next[j] += moved[j];
            }
            carried = next;
        }
        let pre_sparse_constants = mat_vec(&mds_inverse, &carried);

        // Factor M = S·A with A = diag(1, Â) from the last partial round back;
        // each A is pushed through the preceding S-box.
        let mut acc = mds;
        let mut sparse_matrices = vec![
            SparseMatrix {
                m00: Fr::ZERO,
                row: [Fr::ZERO; WIDTH - 1],
                col: [Fr::ZERO; WIDTH - 1],
            };
            PARTIAL_ROUNDS
        ];
        for i in (0..PARTIAL_ROUNDS).rev() {
            let hat: Vec<Vec<Fr>> = (1..WIDTH).map(|r| acc[r][1..].to_vec()).collect();
            let hat_inv = invert(&hat).unwrap_or_else(|| unreachable!("MDS minors are invertible"));
            let row: [Fr; WIDTH - 1] =
                core::array::from_fn(|j| (0..WIDTH - 1).map(|k| hat_inv[k][j] * acc[0][k + 1]).sum());
            let col: [Fr; WIDTH - 1] = core::array::from_fn(|j| acc[j + 1][0]);
            sparse_matrices[i] = SparseMatrix {
                m00: acc[0][0],
                row,
                col,
            };
            let mut a = [[Fr::ZERO; WIDTH]; WIDTH];
            a[0][0] = Fr::ONE;
            for r in 1..WIDTH {
                a[r][1..].copy_from_slice(&hat[r - 1]);
            }
            acc = mat_mul(&a, &mds);
        }

        let first_half_constants = (1..HALF_FULL_ROUNDS)
            .map(|r| mat_vec(&mds_inverse, &round_constants[r]))
            .collect();
        let second_half_constants = (1..HALF_FULL_ROUNDS)
            .map(|r| mat_vec(&mds_inverse, &round_constants[HALF_FULL_ROUNDS + PARTIAL_ROUNDS + r]))
            .collect();

        Self {
            initial_constants: round_constants[0],
            round_constants,
            mds,
            mds_inverse,
            first_half_constants,
            pre_sparse_constants,
            pre_sparse_matrix: acc,
            partial_constants,
            sparse_matrices,
            second_half_constants,
        }
    }
}

fn sbox(x: Fr) -> Fr {
    x.pow([ALPHA])
}

fn add_assign(state: &mut BlsState, c: &BlsState) {
    for (s, c) in state.iter_mut().zip(c) {
        *s += c;
    }
}

pub fn permute(mut state: BlsState) -> BlsState {
    let p = &*POSEIDON_BLS_PARAMS;
    add_assign(&mut state, &p.initial_constants);
    for c in &p.first_half_constants {
        state = state.map(sbox);
        add_assign(&mut state, c);
        state = mat_vec(&p.mds, &state);
    }
    state = state.map(sbox);
    add_assign(&mut state, &p.pre_sparse_constants);
    state = mat_vec(&p.pre_sparse_matrix, &state);

    for (c, m) in p.partial_constants.iter().zip(&p.sparse_matrices) {
        state[0] = sbox(state[0]) + c;
        state = m.apply(&state);
    }

    for c in &p.second_half_constants {
        state = state.map(sbox);
        add_assign(&mut state, c);
        state = mat_vec(&p.mds, &state);
    }
    state = state.map(sbox);
    mat_vec(&p.mds, &state)
}

pub fn permute_naive(mut state: BlsState) -> BlsState {
    let p = &*POSEIDON_BLS_PARAMS;
    for (r, c) in p.round_constants.iter().enumerate() {
        add_assign(&mut state, c);
        if r < HALF_FULL_ROUNDS || r >= HALF_FULL_ROUNDS + PARTIAL_ROUNDS {
            state = state.map(sbox);
        } else {
            state[0] = sbox(state[0]);
        }
        state = mat_vec(&p.mds, &state);
    }
    state
}

/// `Σ limbs[k]·2^(64k)` for at most three limbs.
pub fn pack_limbs(limbs: &[u64]) -> Fr {
    debug_assert!(limbs.len() <= LIMBS_PER_LANE);
    let shift = Fr::from(1u128 << 64);
    limbs.iter().rev().fold(Fr::ZERO, |acc, l| acc * shift + Fr::from(*l))
}

pub fn hash_no_pad(inputs: &[u64]) -> Fr {
    let mut state = [Fr::ZERO; WIDTH];
    for chunk in inputs.chunks(LIMBS_PER_CHUNK) {
        for (lane, limbs) in chunk.chunks(LIMBS_PER_LANE).enumerate() {
            state[lane + 1] = pack_limbs(limbs);
        }
        state = permute(state);
    }
    state[0]
}

pub fn hash_or_noop(inputs: &[u64]) -> Fr {
    if inputs.len() <= LIMBS_PER_LANE {
        pack_limbs(inputs)
    } else {
        hash_no_pad(inputs)
    }
}

pub fn two_to_one(left: Fr, right: Fr) -> Fr {
    permute([Fr::ZERO, Fr::ZERO, left, right])[0]
}

/// Re-embeds a digest into Goldilocks as 56-bit chunks, least significant first.
pub fn to_vec(hash: Fr) -> Vec<u64> {
    let v = BigUint::from(hash.into_bigint());
    let mask = (BigUint::from(1u8) << TO_VEC_CHUNK_BITS) - 1u8;
    (0..TO_VEC_LEN)
        .map(|i| {
            let chunk: BigUint = (&v >> (i * TO_VEC_CHUNK_BITS)) & &mask;
            chunk.iter_u64_digits().next().unwrap_or(0)
        })
        .collect()
}
