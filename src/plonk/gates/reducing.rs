use ark_relations::r1cs::SynthesisError;

use super::{EvaluationVars, D};
use crate::gadgets::gl_ext::{GlExtAlgebraVar, GlExtVar};

const WIRES_OUTPUT: usize = 0;
const WIRES_ALPHA: usize = D;
const WIRES_OLD_ACC: usize = 2 * D;
const START_COEFFS: usize = 3 * D;

/// Running `acc_{i+1} = acc_i·α + coeff_i`; the last accumulator is the
/// output wire pair.
fn accumulate(
    num_coeffs: usize,
    coeffs: Vec<GlExtAlgebraVar>,
    start_accs: usize,
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let w = vars.local_wires;
    let alpha = GlExtAlgebraVar::from_slice(&w[WIRES_ALPHA..]);
    let acc_at = |i: usize| {
        if i == num_coeffs - 1 {
            GlExtAlgebraVar::from_slice(&w[WIRES_OUTPUT..])
        } else {
            GlExtAlgebraVar::from_slice(&w[start_accs + D * i..])
        }
    };

    let mut out = Vec::with_capacity(D * num_coeffs);
    let mut acc = GlExtAlgebraVar::from_slice(&w[WIRES_OLD_ACC..]);
    for (i, coeff) in coeffs.iter().enumerate() {
        let next = acc_at(i);
        out.extend(acc.mul(&alpha)?.add(coeff)?.sub(&next)?.to_ext_array());
        acc = next;
    }
    Ok(out)
}

/// Base coefficients, one wire each.
pub(super) fn eval_base(num_coeffs: usize, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
    let coeffs = vars.local_wires[START_COEFFS..START_COEFFS + num_coeffs]
        .iter()
        .map(|c| GlExtAlgebraVar::from_ext(c.clone()))
        .collect();
    accumulate(num_coeffs, coeffs, START_COEFFS + num_coeffs, vars)
}

/// Extension coefficients, `D` wires each.
pub(super) fn eval_extension(
    num_coeffs: usize,
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let coeffs = (0..num_coeffs)
        .map(|i| GlExtAlgebraVar::from_slice(&vars.local_wires[START_COEFFS + D * i..]))
        .collect();
    accumulate(num_coeffs, coeffs, START_COEFFS + D * num_coeffs, vars)
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{all_zero, eval_on};
    use super::super::Gate;
    use crate::gl_u64::{ext_add, ext_mul, GlExt, EXT_W};
    use crate::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    type Alg = [GlExt; 2];

    fn alg_mul(a: Alg, b: Alg) -> Alg {
        [
            ext_add(ext_mul(a[0], b[0]), ext_mul([EXT_W, 0], ext_mul(a[1], b[1]))),
            ext_add(ext_mul(a[0], b[1]), ext_mul(a[1], b[0])),
        ]
    }

    fn alg_add(a: Alg, b: Alg) -> Alg {
        [ext_add(a[0], b[0]), ext_add(a[1], b[1])]
    }

    #[test]
    fn reduces_base_coefficients() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let alpha: Alg = [[3, 1], [0, 2]];
        let old: Alg = [[5, 0], [1, 1]];
        let coeffs: Vec<GlExt> = vec![[7, 0], [8, 0], [9, 0]];
        let mut accs = Vec::new();
        let mut acc = old;
        for c in &coeffs {
            acc = alg_add(alg_mul(acc, alpha), [*c, [0, 0]]);
            accs.push(acc);
        }
        let mut wires: Vec<GlExt> = Vec::new();
        wires.extend(accs[2]);
        wires.extend(alpha);
        wires.extend(old);
        wires.extend(coeffs.iter().copied());
        wires.extend(accs[0]);
        wires.extend(accs[1]);
        let gate = Gate::Reducing { num_coeffs: 3 };
        assert!(all_zero(&eval_on(&cs, &gate, &[], &wires, [0; 4])));
    }

    #[test]
    fn reduces_extension_coefficients() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let alpha: Alg = [[2, 0], [1, 0]];
        let old: Alg = [[0, 0], [0, 0]];
        let coeffs: Vec<Alg> = vec![[[1, 2], [3, 4]], [[5, 6], [7, 8]]];
        let first = alg_add(alg_mul(old, alpha), coeffs[0]);
        let second = alg_add(alg_mul(first, alpha), coeffs[1]);
        let mut wires: Vec<GlExt> = Vec::new();
        wires.extend(second);
        wires.extend(alpha);
        wires.extend(old);
        for c in &coeffs {
            wires.extend(*c);
        }
        wires.extend(first);
        let gate = Gate::ReducingExtension { num_coeffs: 2 };
        assert!(all_zero(&eval_on(&cs, &gate, &[], &wires, [0; 4])));

        wires[0][0] ^= 1;
        assert!(!all_zero(&eval_on(&cs, &gate, &[], &wires, [0; 4])));
    }
}
