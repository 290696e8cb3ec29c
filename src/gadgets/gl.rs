//! Emulated Goldilocks Arithmetic
//!
//! A Goldilocks element lives inside one BLS12-381 scalar (`FpVar<Fr>`).
//!
//! ## Representation
//!
//! - [`GlVar`] is always canonical: `0 <= x < p_GL`, enforced by a 64-bit
//!   decomposition plus a `< p_GL` check when it is allocated or reduced.
//! - [`GlAcc`] is an unreduced integer combination of `GlVar`s with a tracked
//!   bit bound. Additions and multiplications by constants are free linear
//!   combinations; [`GlAcc::reduce`] witnesses `r < p_GL` and `k` with
//!   `acc = r + k·p_GL` as integers.
//!
//! ## Soundness
//!
//! The bound on `acc`, `r` and `k` keeps both sides of the reduction equation
//! far below the outer modulus (`MAX_ACC_BITS < 254`), so equality in `Fr`
//! is equality over the integers.
//!
//! Hints are computed from `value()` only when the constraint system carries
//! an assignment; in setup mode the witness closures are never evaluated and
//! the constraint topology does not depend on proof data.

use ark_ff::{AdditiveGroup, Field, PrimeField};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;

use crate::gl_u64::{self, P_GL};
use crate::Fr;

/// Accumulators whose bound would exceed this are reduced first.
const MAX_ACC_BITS: u32 = 240;

/// Canonical Goldilocks element.
#[derive(Clone, Debug)]
pub struct GlVar(pub FpVar<Fr>);

/// Unreduced non-negative integer combination, `0 <= value < 2^bits`.
#[derive(Clone, Debug)]
pub struct GlAcc {
    lc: FpVar<Fr>,
    bits: u32,
}

fn to_biguint(x: Fr) -> BigUint {
    BigUint::from(x.into_bigint())
}

fn bits_of(c: u64) -> u32 {
    64 - c.leading_zeros()
}

/// Packs little-endian booleans into a linear combination.
pub fn pack_bits_le(bits: &[Boolean<Fr>]) -> FpVar<Fr> {
    let mut acc = FpVar::Constant(Fr::ZERO);
    let mut coeff = Fr::ONE;
    for b in bits {
        acc += FpVar::from(b.clone()) * coeff;
        coeff.double_in_place();
    }
    acc
}

/// Allocates `n` little-endian witness bits of `value`.
pub fn alloc_bits(
    cs: &ConstraintSystemRef<Fr>,
    value: Option<&BigUint>,
    n: usize,
) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    (0..n)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                value
                    .map(|v| v.bit(i as u64))
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect()
}

/// Enforce: u < P_GL for a 64-bit little-endian decomposition.
/// u >= p  <=>  high 32 bits all set and low 32 bits not all zero.
pub fn enforce_lt_p_gl(bits: &[Boolean<Fr>]) -> Result<(), SynthesisError> {
    assert_eq!(bits.len(), 64);
    let hi_all_ones = Boolean::kary_and(&bits[32..])?;
    let lo_nonzero = Boolean::kary_or(&bits[..32])?;
    (hi_all_ones & lo_nonzero).enforce_equal(&Boolean::FALSE)
}

/// Allocates a canonical element from an optional hint, returning its bits too.
fn alloc_canonical(
    cs: &ConstraintSystemRef<Fr>,
    value: Option<u64>,
) -> Result<(GlVar, Vec<Boolean<Fr>>), SynthesisError> {
    let big = value.map(BigUint::from);
    let bits = alloc_bits(cs, big.as_ref(), 64)?;
    enforce_lt_p_gl(&bits)?;
    Ok((GlVar(pack_bits_le(&bits)), bits))
}

impl GlVar {
    pub fn constant(v: u64) -> Self {
        Self(FpVar::Constant(Fr::from(gl_u64::gl_reduce(v))))
    }

    pub fn zero() -> Self {
        Self::constant(0)
    }

    pub fn one() -> Self {
        Self::constant(1)
    }

    /// Allocates a witness with a `< p_GL` range check.
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        f: impl FnOnce() -> Result<u64, SynthesisError>,
    ) -> Result<Self, SynthesisError> {
        let hint = if cs.is_in_setup_mode() { None } else { Some(f()?) };
        if let Some(v) = hint {
            if v >= P_GL {
                return Err(SynthesisError::Unsatisfiable);
            }
        }
        Ok(alloc_canonical(&cs, hint)?.0)
    }

    pub fn new_witness_vec(cs: ConstraintSystemRef<Fr>, values: &[u64]) -> Result<Vec<Self>, SynthesisError> {
        values
            .iter()
            .map(|v| Self::new_witness(cs.clone(), || Ok(*v)))
            .collect()
    }

    /// Reinterprets a native variable known (by construction) to be `< p_GL`.
    pub fn from_canonical_unchecked(v: FpVar<Fr>) -> Self {
        Self(v)
    }

    pub fn is_constant(&self) -> bool {
        self.0.is_constant()
    }

    pub fn value(&self) -> Result<u64, SynthesisError> {
        Ok(gl_u64::fr_to_gl_u64(self.0.value()?))
    }

    pub fn acc(&self) -> GlAcc {
        GlAcc {
            lc: self.0.clone(),
            bits: 64,
        }
    }

    pub fn add(&self, other: &Self) -> Result<Self, SynthesisError> {
        self.acc().add(&other.acc()).reduce()
    }

    pub fn sub(&self, other: &Self) -> Result<Self, SynthesisError> {
        self.acc().sub(&other.acc()).reduce()
    }

    pub fn neg(&self) -> Result<Self, SynthesisError> {
        GlAcc::constant(0).sub(&self.acc()).reduce()
    }

    pub fn mul(&self, other: &Self) -> Result<Self, SynthesisError> {
        self.acc().mul(&other.acc())?.reduce()
    }

    pub fn square(&self) -> Result<Self, SynthesisError> {
        self.mul(self)
    }

    pub fn mul_const(&self, c: u64) -> Result<Self, SynthesisError> {
        self.acc().mul_const(c).reduce()
    }

    pub fn add_const(&self, c: u64) -> Result<Self, SynthesisError> {
        self.acc().add(&GlAcc::constant(c)).reduce()
    }

    /// `self·a + b` with a single reduction.
    pub fn mul_add(&self, a: &Self, b: &Self) -> Result<Self, SynthesisError> {
        self.acc().mul(&a.acc())?.add(&b.acc()).reduce()
    }

    /// `self^e` for a public exponent.
    pub fn pow_const(&self, mut e: u64) -> Result<Self, SynthesisError> {
        let mut base = self.clone();
        let mut acc = Self::one();
        while e > 0 {
            if e & 1 == 1 {
                acc = acc.mul(&base)?;
            }
            e >>= 1;
            if e > 0 {
                base = base.square()?;
            }
        }
        Ok(acc)
    }

    pub fn exp_power_of_2(&self, log: usize) -> Result<Self, SynthesisError> {
        let mut acc = self.clone();
        for _ in 0..log {
            acc = acc.square()?;
        }
        Ok(acc)
    }

    /// Witnesses the inverse and enforces `self·inv = 1`; unsatisfiable at zero.
    pub fn inverse(&self) -> Result<Self, SynthesisError> {
        if let FpVar::Constant(c) = &self.0 {
            let v = gl_u64::fr_to_gl_u64(*c);
            if v == 0 {
                return Err(SynthesisError::DivisionByZero);
            }
            return Ok(Self::constant(gl_u64::gl_inv(v)));
        }
        let cs = self.0.cs();
        let hint = self.0.value().ok().map(|v| gl_u64::gl_inv(gl_u64::fr_to_gl_u64(v)));
        let (inv, _) = alloc_canonical(&cs, hint)?;
        self.mul(&inv)?.0.enforce_equal(&FpVar::Constant(Fr::ONE))?;
        Ok(inv)
    }

    pub fn div(&self, other: &Self) -> Result<Self, SynthesisError> {
        self.mul(&other.inverse()?)
    }

    /// 64 little-endian bits. Canonical representation makes them unique.
    pub fn to_bits_le(&self) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
        if let FpVar::Constant(c) = &self.0 {
            let v = gl_u64::fr_to_gl_u64(*c);
            return Ok((0..64).map(|i| Boolean::constant((v >> i) & 1 == 1)).collect());
        }
        let cs = self.0.cs();
        let hint = self.0.value().ok().map(to_biguint);
        let bits = alloc_bits(&cs, hint.as_ref(), 64)?;
        pack_bits_le(&bits).enforce_equal(&self.0)?;
        Ok(bits)
    }

    /// Low `n` bits of `self`, enforcing that the remaining bits are zero.
    pub fn to_bits_le_bounded(&self, n: usize) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
        let bits = self.to_bits_le()?;
        for b in &bits[n..] {
            b.enforce_equal(&Boolean::FALSE)?;
        }
        Ok(bits[..n].to_vec())
    }

    pub fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        self.0.enforce_equal(&other.0)
    }

    pub fn is_eq(&self, other: &Self) -> Result<Boolean<Fr>, SynthesisError> {
        self.0.is_eq(&other.0)
    }

    /// Public value as an `Fr` constant, or the variable's current value.
    pub fn native(&self) -> &FpVar<Fr> {
        &self.0
    }
}

impl CondSelectGadget<Fr> for GlVar {
    fn conditionally_select(
        cond: &Boolean<Fr>,
        true_value: &Self,
        false_value: &Self,
    ) -> Result<Self, SynthesisError> {
        Ok(Self(FpVar::conditionally_select(cond, &true_value.0, &false_value.0)?))
    }
}

impl GlAcc {
    pub fn constant(v: u64) -> Self {
        let v = gl_u64::gl_reduce(v);
        Self {
            lc: FpVar::Constant(Fr::from(v)),
            bits: bits_of(v).max(1),
        }
    }

    pub fn zero() -> Self {
        Self::constant(0)
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn add(&self, other: &Self) -> Self {
        if self.bits.max(other.bits) + 1 > MAX_ACC_BITS {
            return self.clone().shrink().add(&other.clone().shrink());
        }
        Self {
            lc: &self.lc + &other.lc,
            bits: self.bits.max(other.bits) + 1,
        }
    }

    pub fn add_var(&self, other: &GlVar) -> Self {
        self.add(&other.acc())
    }

    /// `self - other + m·p` with `m·p >= 2^other.bits`, keeping the result non-negative.
    pub fn sub(&self, other: &Self) -> Self {
        let shift = other.bits.saturating_sub(63);
        if self.bits.max(other.bits + 1) + 1 > MAX_ACC_BITS {
            return self.clone().shrink().sub(&other.clone().shrink());
        }
        let offset = BigUint::from(P_GL) << shift;
        Self {
            lc: &self.lc - &other.lc + FpVar::Constant(Fr::from(offset)),
            bits: self.bits.max(other.bits + 1) + 1,
        }
    }

    pub fn mul_const(&self, c: u64) -> Self {
        let c = gl_u64::gl_reduce(c);
        if c == 0 {
            return Self::zero();
        }
        if self.bits + bits_of(c) > MAX_ACC_BITS {
            return self.clone().shrink().mul_const(c);
        }
        Self {
            lc: &self.lc * Fr::from(c),
            bits: self.bits + bits_of(c),
        }
    }

    /// One R1CS multiplication of the two combinations.
    pub fn mul(&self, other: &Self) -> Result<Self, SynthesisError> {
        if self.bits + other.bits > MAX_ACC_BITS {
            let a = GlVar::acc(&self.reduce()?);
            let b = GlVar::acc(&other.reduce()?);
            return a.mul(&b);
        }
        Ok(Self {
            lc: &self.lc * &other.lc,
            bits: self.bits + other.bits,
        })
    }

    fn shrink(self) -> Self {
        match self.reduce() {
            Ok(v) => v.acc(),
            Err(_) => self,
        }
    }

    /// Reduces modulo `p_GL` into a canonical [`GlVar`].
    pub fn reduce(&self) -> Result<GlVar, SynthesisError> {
        if let FpVar::Constant(c) = &self.lc {
            let r = to_biguint(*c) % BigUint::from(P_GL);
            return Ok(GlVar::constant(r.iter_u64_digits().next().unwrap_or(0)));
        }
        if self.bits <= 63 {
            // Already below 2^63 < p_GL.
            return Ok(GlVar(self.lc.clone()));
        }
        let cs = self.lc.cs();
        let p = BigUint::from(P_GL);
        let hint = self.lc.value().ok().map(to_biguint);
        let r_hint = hint.as_ref().map(|v| (v % &p).iter_u64_digits().next().unwrap_or(0));
        let k_hint = hint.as_ref().map(|v| v / &p);

        let (r, _) = alloc_canonical(&cs, r_hint)?;
        let k_bits = alloc_bits(&cs, k_hint.as_ref(), (self.bits - 63) as usize)?;
        let k = pack_bits_le(&k_bits);
        self.lc.enforce_equal(&(&r.0 + k * Fr::from(P_GL)))?;
        Ok(r)
    }
}

/// `Σ terms[i]·base^i`, reduced once per term.
pub fn reduce_with_powers(terms: &[GlVar], base: &GlVar) -> Result<GlVar, SynthesisError> {
    let mut acc = GlVar::zero();
    for t in terms.iter().rev() {
        acc = acc.mul_add(base, t)?;
    }
    Ok(acc)
}
