use ark_relations::r1cs::SynthesisError;

use super::EvaluationVars;
use crate::gadgets::gl_ext::GlExtVar;

/// `constant_i - wire_i` for each constant.
pub(super) fn eval_constant(
    num_consts: usize,
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    (0..num_consts)
        .map(|i| vars.local_constants[i].sub(&vars.local_wires[i]))
        .collect()
}

/// Wires 0..4 carry the public-input hash.
pub(super) fn eval_public_input(vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
    vars.public_inputs_hash
        .iter()
        .enumerate()
        .map(|(i, h)| vars.local_wires[i].sub(&GlExtVar::from_base(h.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{all_zero, eval_on};
    use super::super::Gate;
    use crate::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn constant_gate_binds_wires_to_constants() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let gate = Gate::Constant { num_consts: 2 };
        let ok = eval_on(&cs, &gate, &[[5, 1], [6, 2]], &[[5, 1], [6, 2]], [0; 4]);
        assert!(all_zero(&ok));
        let bad = eval_on(&cs, &gate, &[[5, 1], [6, 2]], &[[5, 1], [7, 2]], [0; 4]);
        assert_eq!(bad[1], [crate::gl_u64::P_GL - 1, 0]);
    }

    #[test]
    fn public_input_gate_reads_the_hash() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let hash = [11, 22, 33, 44];
        let wires: Vec<[u64; 2]> = hash.iter().map(|&h| [h, 0]).collect();
        assert!(all_zero(&eval_on(&cs, &Gate::PublicInput, &[], &wires, hash)));
        assert!(!all_zero(&eval_on(&cs, &Gate::PublicInput, &[], &wires, [11, 22, 33, 45])));
    }
}
