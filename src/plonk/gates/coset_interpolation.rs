//! Interpolates values on the subgroup of size `2^subgroup_bits`, scaled by
//! the shift wire, at an algebra point. The barycentric sum is split into
//! chunks of `degree` points whose running `(eval, prod)` pairs are witnessed.
//!
//! Wires: shift at 0, values at `1 + D·i`, then the evaluation point, the
//! evaluation value, `n` intermediate evals, `n` intermediate products and the
//! shifted evaluation point.

use ark_relations::r1cs::SynthesisError;

use super::{EvaluationVars, D};
use crate::gadgets::gl_ext::{GlExtAlgebraVar, GlExtVar};
use crate::gl_u64::{gl_mul, primitive_root_of_unity};

pub(super) fn num_intermediates(subgroup_bits: usize, degree: usize) -> usize {
    (1usize << subgroup_bits).saturating_sub(2) / (degree - 1)
}

pub(super) fn num_wires(subgroup_bits: usize, degree: usize) -> usize {
    start_intermediates(subgroup_bits) + D * (2 * num_intermediates(subgroup_bits, degree) + 1)
}

fn start_intermediates(subgroup_bits: usize) -> usize {
    1 + ((1 << subgroup_bits) + 2) * D
}

fn partial_interpolate(
    domain: &[u64],
    values: &[GlExtAlgebraVar],
    weights: &[u64],
    point: &GlExtAlgebraVar,
    mut eval: GlExtAlgebraVar,
    mut prod: GlExtAlgebraVar,
) -> Result<(GlExtAlgebraVar, GlExtAlgebraVar), SynthesisError> {
    for ((&x, value), &weight) in domain.iter().zip(values).zip(weights) {
        let x = GlExtAlgebraVar::from_ext(GlExtVar::constant([x, 0]));
        let term = point.sub(&x)?;
        let weighted = value.mul_base_const(weight)?;
        eval = eval.mul(&term)?.add(&weighted.mul(&prod)?)?;
        prod = prod.mul(&term)?;
    }
    Ok((eval, prod))
}

pub(super) fn eval(
    subgroup_bits: usize,
    degree: usize,
    weights: &[u64],
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let w = vars.local_wires;
    let num_points = 1usize << subgroup_bits;
    let n_int = num_intermediates(subgroup_bits, degree);
    let start = start_intermediates(subgroup_bits);
    let alg = |i: usize| GlExtAlgebraVar::from_slice(&w[i..]);

    let shift = &w[0];
    let evaluation_point = alg(1 + num_points * D);
    let evaluation_value = alg(1 + num_points * D + D);
    let shifted_point = alg(start + 2 * D * n_int);

    let mut out = Vec::with_capacity(D * (2 + 2 * n_int));
    out.extend(evaluation_point.sub(&shifted_point.scalar_mul(shift)?)?.to_ext_array());

    let g = primitive_root_of_unity(subgroup_bits);
    let mut domain = Vec::with_capacity(num_points);
    let mut x = 1u64;
    for _ in 0..num_points {
        domain.push(x);
        x = gl_mul(x, g);
    }
    let values: Vec<GlExtAlgebraVar> = (0..num_points).map(|i| alg(1 + D * i)).collect();

    let (mut computed_eval, mut computed_prod) = partial_interpolate(
        &domain[..degree],
        &values[..degree],
        &weights[..degree],
        &shifted_point,
        GlExtAlgebraVar::zero(),
        GlExtAlgebraVar::one(),
    )?;
    for i in 0..n_int {
        let intermediate_eval = alg(start + D * i);
        let intermediate_prod = alg(start + D * (n_int + i));
        out.extend(intermediate_eval.sub(&computed_eval)?.to_ext_array());
        out.extend(intermediate_prod.sub(&computed_prod)?.to_ext_array());

        let lo = 1 + (degree - 1) * (i + 1);
        let hi = (lo + degree - 1).min(num_points);
        (computed_eval, computed_prod) = partial_interpolate(
            &domain[lo..hi],
            &values[lo..hi],
            &weights[lo..hi],
            &shifted_point,
            intermediate_eval,
            intermediate_prod,
        )?;
    }
    out.extend(evaluation_value.sub(&computed_eval)?.to_ext_array());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{all_zero, eval_on};
    use super::super::Gate;
    use super::*;
    use crate::gl_u64::{ext_add, ext_from_base, ext_mul, gl_add, ext_scalar_mul, ext_sub, gl_inv, GlExt};
    use crate::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    const ZERO: GlExt = [0, 0];

    fn subgroup(bits: usize) -> Vec<u64> {
        let g = primitive_root_of_unity(bits);
        let mut x = 1;
        (0..1 << bits)
            .map(|_| {
                let cur = x;
                x = gl_mul(x, g);
                cur
            })
            .collect()
    }

    /// `w_i = x_i / n` on a multiplicative subgroup.
    fn weights(bits: usize) -> Vec<u64> {
        let inv_n = gl_inv(1 << bits);
        subgroup(bits).into_iter().map(|x| gl_mul(x, inv_n)).collect()
    }

    /// Wire trace with every algebra value embedded in its first component.
    fn trace(bits: usize, degree: usize, values: &[GlExt], shift: u64, shifted: GlExt) -> Vec<GlExt> {
        let domain = subgroup(bits);
        let ws = weights(bits);
        let n_int = num_intermediates(bits, degree);
        let fold = |range: core::ops::Range<usize>, mut e: GlExt, mut p: GlExt| {
            for i in range {
                let term = ext_sub(shifted, ext_from_base(domain[i]));
                e = ext_add(ext_mul(e, term), ext_mul(ext_scalar_mul(values[i], ws[i]), p));
                p = ext_mul(p, term);
            }
            (e, p)
        };
        let (mut e, mut p) = fold(0..degree, ZERO, [1, 0]);
        let mut evals = Vec::new();
        let mut prods = Vec::new();
        for i in 0..n_int {
            evals.push(e);
            prods.push(p);
            let lo = 1 + (degree - 1) * (i + 1);
            let hi = (lo + degree - 1).min(1 << bits);
            (e, p) = fold(lo..hi, e, p);
        }

        let mut w = vec![[shift, 0]];
        for v in values {
            w.extend([*v, ZERO]);
        }
        w.extend([ext_scalar_mul(shifted, shift), ZERO]);
        w.extend([e, ZERO]);
        for v in evals.iter().chain(&prods) {
            w.extend([*v, ZERO]);
        }
        w.extend([shifted, ZERO]);
        w
    }

    fn gate(bits: usize, degree: usize) -> Gate {
        Gate::CosetInterpolation {
            subgroup_bits: bits,
            degree,
            barycentric_weights: weights(bits),
        }
    }

    #[test]
    fn two_points_interpolate_a_line() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        // f(x) = 5 + 3x on {1, -1}
        let values = [[8, 0], [2, 0]];
        let z: GlExt = [11, 4];
        let w = trace(1, 2, &values, 9, z);
        assert_eq!(w[1 + 2 * D + D], ext_add([5, 0], ext_scalar_mul(z, 3)));
        let g = gate(1, 2);
        assert_eq!(w.len(), g.num_wires());
        assert!(all_zero(&eval_on(&cs, &g, &[], &w, [0; 4])));
    }

    #[test]
    fn chunked_interpolation_with_intermediates() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let values: Vec<GlExt> = (0..8).map(|i| [i * 7 + 1, i]).collect();
        let w = trace(3, 3, &values, 3, [1234, 99]);
        let g = gate(3, 3);
        assert_eq!(num_intermediates(3, 3), 3);
        assert_eq!(w.len(), g.num_wires());
        assert!(all_zero(&eval_on(&cs, &g, &[], &w, [0; 4])));

        let mut bad = w.clone();
        let value_wire = 1 + 8 * D + D;
        bad[value_wire][0] = gl_add(bad[value_wire][0], 1);
        let out = eval_on(&cs, &g, &[], &bad, [0; 4]);
        assert_ne!(out[out.len() - D], ZERO);
    }
}
