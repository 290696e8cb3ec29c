use ark_relations::r1cs::SynthesisError;

use super::EvaluationVars;
use crate::gadgets::gl_ext::GlExtVar;

const WIRE_SUM: usize = 0;
const START_LIMBS: usize = 1;

/// `sum = Σ limb_i·B^i` and every limb in `[0, B)`.
pub(super) fn eval(
    num_limbs: usize,
    base: usize,
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let sum = &vars.local_wires[WIRE_SUM];
    let limbs = &vars.local_wires[START_LIMBS..START_LIMBS + num_limbs];
    let b = GlExtVar::constant([base as u64, 0]);

    let mut computed = GlExtVar::zero();
    for limb in limbs.iter().rev() {
        computed = computed.mul_add(&b, limb)?;
    }
    let mut out = Vec::with_capacity(1 + num_limbs);
    out.push(computed.sub(sum)?);
    for limb in limbs {
        let mut range = limb.clone();
        for i in 1..base as u64 {
            range = range.mul(&limb.add_const([crate::gl_u64::gl_neg(i), 0])?)?;
        }
        out.push(range);
    }
    Ok(out)
}
