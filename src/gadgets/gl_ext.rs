//! Quadratic extension `GF(p)[X]/(X^2 - 7)` over emulated Goldilocks.
//!
//! Products are built on [`GlAcc`] so each extension multiplication costs
//! four R1CS products and two reductions.

use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use crate::gadgets::gl::{GlAcc, GlVar};
use crate::gl_u64::{self, GlExt, EXT_W};
use crate::Fr;

#[derive(Clone, Debug)]
pub struct GlExtVar(pub [GlVar; 2]);

impl GlExtVar {
    pub fn constant(v: GlExt) -> Self {
        Self([GlVar::constant(v[0]), GlVar::constant(v[1])])
    }

    pub fn zero() -> Self {
        Self::constant([0, 0])
    }

    pub fn one() -> Self {
        Self::constant([1, 0])
    }

    pub fn from_base(b: GlVar) -> Self {
        Self([b, GlVar::zero()])
    }

    pub fn new_witness(
        cs: ark_relations::r1cs::ConstraintSystemRef<Fr>,
        v: GlExt,
    ) -> Result<Self, SynthesisError> {
        Ok(Self([
            GlVar::new_witness(cs.clone(), || Ok(v[0]))?,
            GlVar::new_witness(cs, || Ok(v[1]))?,
        ]))
    }

    pub fn c0(&self) -> &GlVar {
        &self.0[0]
    }

    pub fn c1(&self) -> &GlVar {
        &self.0[1]
    }

    pub fn value(&self) -> Result<GlExt, SynthesisError> {
        Ok([self.0[0].value()?, self.0[1].value()?])
    }

    pub fn add(&self, o: &Self) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].add(&o.0[0])?, self.0[1].add(&o.0[1])?]))
    }

    pub fn sub(&self, o: &Self) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].sub(&o.0[0])?, self.0[1].sub(&o.0[1])?]))
    }

    pub fn neg(&self) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].neg()?, self.0[1].neg()?]))
    }

    fn mul_acc(&self, o: &Self) -> Result<[GlAcc; 2], SynthesisError> {
        let [a0, a1] = &self.0;
        let [b0, b1] = &o.0;
        let c0 = a0
            .acc()
            .mul(&b0.acc())?
            .add(&a1.acc().mul(&b1.acc())?.mul_const(EXT_W));
        let c1 = a0.acc().mul(&b1.acc())?.add(&a1.acc().mul(&b0.acc())?);
        Ok([c0, c1])
    }

    pub fn mul(&self, o: &Self) -> Result<Self, SynthesisError> {
        let [c0, c1] = self.mul_acc(o)?;
        Ok(Self([c0.reduce()?, c1.reduce()?]))
    }

    /// `self·a + b` with one reduction per coordinate.
    pub fn mul_add(&self, a: &Self, b: &Self) -> Result<Self, SynthesisError> {
        let [c0, c1] = self.mul_acc(a)?;
        Ok(Self([
            c0.add_var(&b.0[0]).reduce()?,
            c1.add_var(&b.0[1]).reduce()?,
        ]))
    }

    /// `self·a - b` with one reduction per coordinate.
    pub fn mul_sub(&self, a: &Self, b: &Self) -> Result<Self, SynthesisError> {
        let [c0, c1] = self.mul_acc(a)?;
        Ok(Self([
            c0.sub(&b.0[0].acc()).reduce()?,
            c1.sub(&b.0[1].acc()).reduce()?,
        ]))
    }

    pub fn square(&self) -> Result<Self, SynthesisError> {
        self.mul(self)
    }

    pub fn scalar_mul(&self, s: &GlVar) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].mul(s)?, self.0[1].mul(s)?]))
    }

    pub fn mul_const(&self, c: GlExt) -> Result<Self, SynthesisError> {
        let [a0, a1] = &self.0;
        let c0 = a0.acc().mul_const(c[0]).add(&a1.acc().mul_const(gl_u64::gl_mul(c[1], EXT_W)));
        let c1 = a0.acc().mul_const(c[1]).add(&a1.acc().mul_const(c[0]));
        Ok(Self([c0.reduce()?, c1.reduce()?]))
    }

    pub fn mul_base_const(&self, c: u64) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].mul_const(c)?, self.0[1].mul_const(c)?]))
    }

    pub fn add_const(&self, c: GlExt) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].add_const(c[0])?, self.0[1].add_const(c[1])?]))
    }

    /// `self / d`; unsatisfiable when `d` is zero.
    pub fn div(&self, d: &Self) -> Result<Self, SynthesisError> {
        self.mul(&d.inverse()?)
    }

    /// Witnesses the inverse and enforces `self·inv = 1`; unsatisfiable at zero.
    pub fn inverse(&self) -> Result<Self, SynthesisError> {
        if self.0[0].is_constant() && self.0[1].is_constant() {
            let v = self.value()?;
            if v == [0, 0] {
                return Err(SynthesisError::DivisionByZero);
            }
            return Ok(Self::constant(gl_u64::ext_inv(v)));
        }
        let cs = self.0[0].native().cs().or(self.0[1].native().cs());
        let hint = self.value().ok().map(gl_u64::ext_inv);
        let inv = Self([
            GlVar::new_witness(cs.clone(), || {
                hint.map(|h| h[0]).ok_or(SynthesisError::AssignmentMissing)
            })?,
            GlVar::new_witness(cs, || {
                hint.map(|h| h[1]).ok_or(SynthesisError::AssignmentMissing)
            })?,
        ]);
        self.mul(&inv)?.enforce_equal(&Self::one())?;
        Ok(inv)
    }

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

    pub fn enforce_equal(&self, o: &Self) -> Result<(), SynthesisError> {
        self.0[0].enforce_equal(&o.0[0])?;
        self.0[1].enforce_equal(&o.0[1])
    }

    /// Flattens to base-field limbs in `[c0, c1]` order.
    pub fn to_base_limbs(&self) -> [GlVar; 2] {
        self.0.clone()
    }
}

impl CondSelectGadget<Fr> for GlExtVar {
    fn conditionally_select(
        cond: &Boolean<Fr>,
        t: &Self,
        f: &Self,
    ) -> Result<Self, SynthesisError> {
        Ok(Self([
            GlVar::conditionally_select(cond, &t.0[0], &f.0[0])?,
            GlVar::conditionally_select(cond, &t.0[1], &f.0[1])?,
        ]))
    }
}

/// Element of the algebra `E[Y]/(Y^2 - 7)` over the extension, as used by
/// gates that pack one extension value into two extension wires.
#[derive(Clone, Debug)]
pub struct GlExtAlgebraVar(pub [GlExtVar; 2]);

impl GlExtAlgebraVar {
    pub fn zero() -> Self {
        Self([GlExtVar::zero(), GlExtVar::zero()])
    }

    pub fn one() -> Self {
        Self([GlExtVar::one(), GlExtVar::zero()])
    }

    /// Embeds `e` as `e + 0·Y`.
    pub fn from_ext(e: GlExtVar) -> Self {
        Self([e, GlExtVar::zero()])
    }

    /// Reads two consecutive extension wires.
    pub fn from_slice(w: &[GlExtVar]) -> Self {
        Self([w[0].clone(), w[1].clone()])
    }

    pub fn add(&self, o: &Self) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].add(&o.0[0])?, self.0[1].add(&o.0[1])?]))
    }

    pub fn sub(&self, o: &Self) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].sub(&o.0[0])?, self.0[1].sub(&o.0[1])?]))
    }

    pub fn mul(&self, o: &Self) -> Result<Self, SynthesisError> {
        let [a0, a1] = &self.0;
        let [b0, b1] = &o.0;
        let c0 = a0.mul_add(b0, &a1.mul(b1)?.mul_base_const(EXT_W)?)?;
        let c1 = a0.mul_add(b1, &a1.mul(b0)?)?;
        Ok(Self([c0, c1]))
    }

    pub fn scalar_mul(&self, s: &GlExtVar) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].mul(s)?, self.0[1].mul(s)?]))
    }

    pub fn mul_base_const(&self, c: u64) -> Result<Self, SynthesisError> {
        Ok(Self([self.0[0].mul_base_const(c)?, self.0[1].mul_base_const(c)?]))
    }

    pub fn to_ext_array(self) -> [GlExtVar; 2] {
        self.0
    }
}

/// `k + Σ c_i·x_i` for public `c_i`, one reduction per coordinate.
pub fn linear_combination<'a>(
    terms: impl IntoIterator<Item = (&'a GlExtVar, u64)>,
    k: GlExt,
) -> Result<GlExtVar, SynthesisError> {
    let mut c0 = GlAcc::constant(k[0]);
    let mut c1 = GlAcc::constant(k[1]);
    for (x, c) in terms {
        c0 = c0.add(&x.0[0].acc().mul_const(c));
        c1 = c1.add(&x.0[1].acc().mul_const(c));
    }
    Ok(GlExtVar([c0.reduce()?, c1.reduce()?]))
}

/// `Σ terms[i]·alpha^i` by Horner.
pub fn reduce_with_powers(terms: &[GlExtVar], alpha: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
    let mut acc = GlExtVar::zero();
    for t in terms.iter().rev() {
        acc = acc.mul_add(alpha, t)?;
    }
    Ok(acc)
}

/// `Σ terms[i]·alpha^i` for base-field terms.
pub fn reduce_base_with_powers(terms: &[GlVar], alpha: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
    let mut acc = GlExtVar::zero();
    for t in terms.iter().rev() {
        acc = acc.mul_add(alpha, &GlExtVar::from_base(t.clone()))?;
    }
    Ok(acc)
}

/// Evaluates `Σ coeffs[i]·x^i` by Horner.
pub fn eval_poly(coeffs: &[GlExtVar], x: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
    reduce_with_powers(coeffs, x)
}
