//! Arithmetic gates: `output = c0·m0·m1 + c1·addend` over the base field, the
//! extension algebra, and the multiplication-only extension variant.

use ark_relations::r1cs::SynthesisError;

use super::{EvaluationVars, D};
use crate::gadgets::gl_ext::{GlExtAlgebraVar, GlExtVar};

pub(super) fn eval_base(num_ops: usize, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
    let c0 = &vars.local_constants[0];
    let c1 = &vars.local_constants[1];
    let w = vars.local_wires;
    (0..num_ops)
        .map(|i| {
            let m0 = &w[4 * i];
            let m1 = &w[4 * i + 1];
            let addend = &w[4 * i + 2];
            let output = &w[4 * i + 3];
            let computed = m0.mul(m1)?.mul(c0)?;
            let computed = addend.mul_add(c1, &computed)?;
            output.sub(&computed)
        })
        .collect()
}

pub(super) fn eval_extension(
    num_ops: usize,
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let c0 = &vars.local_constants[0];
    let c1 = &vars.local_constants[1];
    let w = vars.local_wires;
    let mut out = Vec::with_capacity(num_ops * D);
    for i in 0..num_ops {
        let base = 4 * D * i;
        let m0 = GlExtAlgebraVar::from_slice(&w[base..]);
        let m1 = GlExtAlgebraVar::from_slice(&w[base + D..]);
        let addend = GlExtAlgebraVar::from_slice(&w[base + 2 * D..]);
        let output = GlExtAlgebraVar::from_slice(&w[base + 3 * D..]);
        let computed = m0.mul(&m1)?.scalar_mul(c0)?.add(&addend.scalar_mul(c1)?)?;
        out.extend(output.sub(&computed)?.to_ext_array());
    }
    Ok(out)
}

pub(super) fn eval_mul_extension(
    num_ops: usize,
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let c0 = &vars.local_constants[0];
    let w = vars.local_wires;
    let mut out = Vec::with_capacity(num_ops * D);
    for i in 0..num_ops {
        let base = 3 * D * i;
        let m0 = GlExtAlgebraVar::from_slice(&w[base..]);
        let m1 = GlExtAlgebraVar::from_slice(&w[base + D..]);
        let output = GlExtAlgebraVar::from_slice(&w[base + 2 * D..]);
        let computed = m0.mul(&m1)?.scalar_mul(c0)?;
        out.extend(output.sub(&computed)?.to_ext_array());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{all_zero, eval_on};
    use super::super::Gate;
    use crate::gl_u64::{ext_add, ext_mul, GlExt, EXT_W};
    use crate::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn alg_mul(a: [GlExt; 2], b: [GlExt; 2]) -> [GlExt; 2] {
        let w = [EXT_W, 0];
        [
            ext_add(ext_mul(a[0], b[0]), ext_mul(w, ext_mul(a[1], b[1]))),
            ext_add(ext_mul(a[0], b[1]), ext_mul(a[1], b[0])),
        ]
    }

    #[test]
    fn base_arithmetic_accepts_correct_ops() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (c0, c1) = ([3, 0], [5, 0]);
        let mut wires = Vec::new();
        for i in 0..2u64 {
            let (m0, m1, add) = ([i + 2, 1], [i + 7, 4], [9, i]);
            let out = ext_add(ext_mul(c0, ext_mul(m0, m1)), ext_mul(c1, add));
            wires.extend([m0, m1, add, out]);
        }
        let gate = Gate::Arithmetic { num_ops: 2 };
        assert!(all_zero(&eval_on(&cs, &gate, &[c0, c1], &wires, [0; 4])));
        wires[3][0] += 1;
        assert!(!all_zero(&eval_on(&cs, &gate, &[c0, c1], &wires, [0; 4])));
    }

    #[test]
    fn extension_arithmetic_uses_algebra_products() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (c0, c1) = ([2, 1], [4, 0]);
        let m0 = [[1, 2], [3, 4]];
        let m1 = [[5, 6], [7, 8]];
        let add = [[9, 10], [11, 12]];
        let prod = alg_mul(m0, m1);
        let out = [
            ext_add(ext_mul(prod[0], c0), ext_mul(add[0], c1)),
            ext_add(ext_mul(prod[1], c0), ext_mul(add[1], c1)),
        ];
        let wires: Vec<GlExt> = [m0, m1, add, out].concat();
        let gate = Gate::ArithmeticExtension { num_ops: 1 };
        assert!(all_zero(&eval_on(&cs, &gate, &[c0, c1], &wires, [0; 4])));

        let mul_out = [ext_mul(prod[0], c0), ext_mul(prod[1], c0)];
        let wires: Vec<GlExt> = [m0, m1, mul_out].concat();
        let gate = Gate::MulExtension { num_ops: 1 };
        assert!(all_zero(&eval_on(&cs, &gate, &[c0], &wires, [0; 4])));
    }
}
