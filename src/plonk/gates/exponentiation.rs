use ark_relations::r1cs::SynthesisError;

use super::EvaluationVars;
use crate::gadgets::gl_ext::GlExtVar;

/// Square-and-multiply over big-endian power bits.
///
/// Wires: base at 0, bits at `1..=n`, output at `n + 1`, intermediate values
/// at `n + 2..2n + 2`.
pub(super) fn eval(num_power_bits: usize, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
    let n = num_power_bits;
    let w = vars.local_wires;
    let base = &w[0];
    let power_bits = &w[1..1 + n];
    let output = &w[1 + n];
    let intermediate = &w[2 + n..2 + 2 * n];

    let mut out = Vec::with_capacity(n + 1);
    for i in 0..n {
        let prev = if i == 0 {
            GlExtVar::one()
        } else {
            intermediate[i - 1].square()?
        };
        let cur_bit = &power_bits[n - i - 1];
        // cur_bit·base + (1 - cur_bit)
        let not_cur_bit = GlExtVar::one().sub(cur_bit)?;
        let factor = cur_bit.mul_add(base, &not_cur_bit)?;
        out.push(prev.mul_sub(&factor, &intermediate[i])?);
    }
    out.push(output.sub(&intermediate[n - 1])?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{all_zero, eval_on};
    use super::super::Gate;
    use crate::gl_u64::{ext_mul, ext_pow, GlExt};
    use crate::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn trace(base: GlExt, power: u64, n: usize) -> Vec<GlExt> {
        let bits: Vec<u64> = (0..n).map(|i| (power >> i) & 1).collect();
        let mut inter = Vec::with_capacity(n);
        let mut acc = [1, 0];
        for i in 0..n {
            let bit = bits[n - i - 1];
            acc = ext_mul(ext_mul(acc, acc), if bit == 1 { base } else { [1, 0] });
            inter.push(acc);
        }
        let mut wires = vec![base];
        wires.extend(bits.iter().map(|&b| [b, 0]));
        wires.push(ext_pow(base, power));
        wires.extend(inter);
        wires
    }

    #[test]
    fn raises_to_the_bit_encoded_power() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let gate = Gate::Exponentiation { num_power_bits: 5 };
        let wires = trace([3, 2], 0b10110, 5);
        assert!(all_zero(&eval_on(&cs, &gate, &[], &wires, [0; 4])));

        let mut bad = wires.clone();
        bad[6] = ext_pow([3, 2], 0b10111);
        let out = eval_on(&cs, &gate, &[], &bad, [0; 4]);
        assert_ne!(out[5], [0, 0]);
    }
}
