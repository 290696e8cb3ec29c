use ark_relations::r1cs::SynthesisError;

use super::EvaluationVars;
use crate::gadgets::gl_ext::GlExtVar;

/// Per copy: boolean index bits, their recomposition into the access index,
/// and a fold of the list down to the claimed element. Extra constants are
/// copied into the trailing routed wires.
pub(super) fn eval(
    bits: usize,
    num_copies: usize,
    num_extra_constants: usize,
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let vec_size = 1usize << bits;
    let w = vars.local_wires;
    let stride = 2 + vec_size;
    let start_extra_constants = stride * num_copies;
    let num_routed = start_extra_constants + num_extra_constants;

    let mut out = Vec::with_capacity((bits + 2) * num_copies + num_extra_constants);
    for copy in 0..num_copies {
        let access_index = &w[stride * copy];
        let claimed_element = &w[stride * copy + 1];
        let mut list: Vec<GlExtVar> = w[stride * copy + 2..stride * copy + 2 + vec_size].to_vec();
        let index_bits = &w[num_routed + copy * bits..num_routed + (copy + 1) * bits];

        for b in index_bits {
            out.push(b.mul_sub(b, b)?);
        }
        let mut reconstructed = GlExtVar::zero();
        for b in index_bits.iter().rev() {
            reconstructed = reconstructed.mul_base_const(2)?.add(b)?;
        }
        out.push(reconstructed.sub(access_index)?);

        for b in index_bits {
            list = list
                .chunks(2)
                .map(|pair| {
                    let diff = pair[1].sub(&pair[0])?;
                    b.mul_add(&diff, &pair[0])
                })
                .collect::<Result<_, _>>()?;
        }
        out.push(list[0].sub(claimed_element)?);
    }
    for i in 0..num_extra_constants {
        out.push(vars.local_constants[i].sub(&w[start_extra_constants + i])?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{all_zero, eval_on};
    use super::super::Gate;
    use crate::gl_u64::GlExt;
    use crate::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn selects_the_indexed_item() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let gate = Gate::RandomAccess {
            bits: 2,
            num_copies: 1,
            num_extra_constants: 1,
        };
        let list: Vec<GlExt> = vec![[10, 1], [20, 2], [30, 3], [40, 4]];
        let mut wires = vec![[2, 0], [30, 3]];
        wires.extend(list.iter().copied());
        wires.push([77, 0]);
        // index 2 = bits (0, 1), least significant first
        wires.extend([[0, 0], [1, 0]]);
        assert!(all_zero(&eval_on(&cs, &gate, &[[77, 0]], &wires, [0; 4])));

        let mut wrong = wires.clone();
        wrong[1] = [40, 4];
        let out = eval_on(&cs, &gate, &[[77, 0]], &wrong, [0; 4]);
        assert_ne!(out[3], [0, 0]);
    }
}
