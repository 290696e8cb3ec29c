//! Goldilocks field arithmetic over u64
//!
//! Host-side arithmetic used for witness hints, constant folding and test
//! oracles. Values are canonical (`< P_GL`) on input and output.

use ark_ff::{BigInteger, PrimeField};

use crate::Fr;

/// Goldilocks modulus: p = 2^64 - 2^32 + 1
pub const P_GL: u64 = 0xFFFF_FFFF_0000_0001;

pub const TWO_ADICITY: usize = 32;
pub const MULTIPLICATIVE_GROUP_GENERATOR: u64 = 14293326489335486720;
/// Generator of the 2^32 subgroup.
pub const POWER_OF_TWO_GENERATOR: u64 = 7277203076849721926;

/// Quadratic non-residue `W` defining the extension `X^2 = W`.
pub const EXT_W: u64 = 7;

pub type GlExt = [u64; 2];

#[inline]
pub fn gl_reduce(x: u64) -> u64 {
    if x >= P_GL {
        x - P_GL
    } else {
        x
    }
}

#[inline]
pub fn gl_add(a: u64, b: u64) -> u64 {
    let s = a as u128 + b as u128;
    let r = if s >= P_GL as u128 { s - P_GL as u128 } else { s };
    r as u64
}

#[inline]
pub fn gl_sub(a: u64, b: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        (a as u128 + P_GL as u128 - b as u128) as u64
    }
}

#[inline]
pub fn gl_neg(a: u64) -> u64 {
    gl_sub(0, a)
}

#[inline]
pub fn gl_mul(a: u64, b: u64) -> u64 {
    ((a as u128) * (b as u128) % P_GL as u128) as u64
}

pub fn gl_pow(mut base: u64, mut exp: u64) -> u64 {
    let mut acc = 1u64;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = gl_mul(acc, base);
        }
        base = gl_mul(base, base);
        exp >>= 1;
    }
    acc
}

/// Inverse via Fermat. Zero maps to zero; callers constrain the zero case.
pub fn gl_inv(a: u64) -> u64 {
    gl_pow(a, P_GL - 2)
}

/// Generator of the multiplicative subgroup of order `2^bits`.
pub fn primitive_root_of_unity(bits: usize) -> u64 {
    assert!(bits <= TWO_ADICITY, "subgroup of order 2^{bits} does not exist");
    let mut g = POWER_OF_TWO_GENERATOR;
    for _ in bits..TWO_ADICITY {
        g = gl_mul(g, g);
    }
    g
}

#[inline]
pub fn reverse_bits(x: usize, bits: usize) -> usize {
    if bits == 0 {
        return 0;
    }
    x.reverse_bits() >> (usize::BITS as usize - bits)
}

/// Low 64 bits of an outer-field element.
pub fn fr_to_gl_u64(x: Fr) -> u64 {
    let bytes = x.into_bigint().to_bytes_le();
    let mut v = 0u64;
    for (i, b) in bytes.iter().enumerate().take(8) {
        v |= (*b as u64) << (8 * i);
    }
    v
}

#[inline]
pub fn gl_to_fr(x: u64) -> Fr {
    Fr::from(x)
}

// ---------------------------------------------------------------------------
// Quadratic extension F[X]/(X^2 - 7)
// ---------------------------------------------------------------------------

#[inline]
pub fn ext_from_base(a: u64) -> GlExt {
    [a, 0]
}

#[inline]
pub fn ext_add(a: GlExt, b: GlExt) -> GlExt {
    [gl_add(a[0], b[0]), gl_add(a[1], b[1])]
}

#[inline]
pub fn ext_sub(a: GlExt, b: GlExt) -> GlExt {
    [gl_sub(a[0], b[0]), gl_sub(a[1], b[1])]
}

#[inline]
pub fn ext_scalar_mul(a: GlExt, s: u64) -> GlExt {
    [gl_mul(a[0], s), gl_mul(a[1], s)]
}

pub fn ext_mul(a: GlExt, b: GlExt) -> GlExt {
    let c0 = gl_add(gl_mul(a[0], b[0]), gl_mul(EXT_W, gl_mul(a[1], b[1])));
    let c1 = gl_add(gl_mul(a[0], b[1]), gl_mul(a[1], b[0]));
    [c0, c1]
}

pub fn ext_square(a: GlExt) -> GlExt {
    ext_mul(a, a)
}

pub fn ext_pow(mut base: GlExt, mut exp: u64) -> GlExt {
    let mut acc = [1, 0];
    while exp > 0 {
        if exp & 1 == 1 {
            acc = ext_mul(acc, base);
        }
        base = ext_square(base);
        exp >>= 1;
    }
    acc
}

/// `(a0 + a1 X)^-1 = (a0 - a1 X) / (a0^2 - 7 a1^2)`. Zero maps to zero.
pub fn ext_inv(a: GlExt) -> GlExt {
    let norm = gl_sub(gl_mul(a[0], a[0]), gl_mul(EXT_W, gl_mul(a[1], a[1])));
    let n_inv = gl_inv(norm);
    [gl_mul(a[0], n_inv), gl_neg(gl_mul(a[1], n_inv))]
}

pub fn ext_div(a: GlExt, b: GlExt) -> GlExt {
    ext_mul(a, ext_inv(b))
}

/// Evaluates `Σ coeffs[i]·x^i` by Horner's rule.
pub fn ext_eval_poly(coeffs: &[GlExt], x: GlExt) -> GlExt {
    coeffs
        .iter()
        .rev()
        .fold([0, 0], |acc, c| ext_add(ext_mul(acc, x), *c))
}
