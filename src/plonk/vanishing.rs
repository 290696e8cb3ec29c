//! Vanishing-polynomial identity at the out-of-domain point ζ.

use ark_relations::r1cs::SynthesisError;

use crate::gadgets::gl::GlVar;
use crate::gadgets::gl_ext::{reduce_with_powers, GlExtVar};
use crate::plonk::gates::EvaluationVars;
use crate::types::common::CommonCircuitData;

/// Selector columns hold this value on rows whose gate group is unused.
const UNUSED_SELECTOR: u64 = u32::MAX as u64;

/// `L_0(x) = (x^n - 1) / (n·(x - 1))`; unsatisfiable at `x = 1`.
pub fn eval_l_0(n: usize, x: &GlExtVar, x_pow_n: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
    let numerator = x_pow_n.sub(&GlExtVar::one())?;
    let denominator = x.sub(&GlExtVar::one())?.mul_base_const(n as u64)?;
    numerator.div(&denominator)
}

/// `Π_{j∈group, j≠row}(j - s)`, times `(UNUSED - s)` when several selector
/// columns exist.
fn compute_filter(
    row: usize,
    group: &core::ops::Range<usize>,
    s: &GlExtVar,
    many_selectors: bool,
) -> Result<GlExtVar, SynthesisError> {
    let mut filter = GlExtVar::one();
    let others = group
        .clone()
        .filter(|&j| j != row)
        .map(|j| j as u64)
        .chain(many_selectors.then_some(UNUSED_SELECTOR));
    for j in others {
        filter = filter.mul(&s.neg()?.add_const([j, 0])?)?;
    }
    Ok(filter)
}

/// Sums the filtered constraints of every gate, index by index.
pub fn evaluate_gate_constraints(
    common: &CommonCircuitData,
    local_constants: &[GlExtVar],
    local_wires: &[GlExtVar],
    public_inputs_hash: &[GlVar; 4],
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let info = &common.selectors_info;
    let num_selectors = info.num_selectors();
    let mut constraints = vec![GlExtVar::zero(); common.num_gate_constraints];
    for (row, gate) in common.gates.iter().enumerate() {
        let selector_index = info.selector_indices[row];
        let filter = compute_filter(
            row,
            &info.groups[selector_index],
            &local_constants[selector_index],
            num_selectors > 1,
        )?;
        let vars = EvaluationVars {
            local_constants: &local_constants[num_selectors..],
            local_wires,
            public_inputs_hash,
        };
        for (acc, c) in constraints.iter_mut().zip(gate.eval_unfiltered(vars)?) {
            *acc = filter.mul_add(&c, acc)?;
        }
    }
    Ok(constraints)
}

/// `prev·Π num - next·Π den` per chunk, accumulators chained
/// `z(ζ), partials…, z(gζ)`.
fn check_partial_products(
    numerators: &[GlExtVar],
    denominators: &[GlExtVar],
    partials: &[GlExtVar],
    z_x: &GlExtVar,
    z_gx: &GlExtVar,
    max_degree: usize,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let accs: Vec<&GlExtVar> = core::iter::once(z_x).chain(partials).chain(core::iter::once(z_gx)).collect();
    let num_chunks = numerators.chunks(max_degree).len();
    if accs.len() != num_chunks + 1 {
        return Err(SynthesisError::Unsatisfiable);
    }
    numerators
        .chunks(max_degree)
        .zip(denominators.chunks(max_degree))
        .zip(accs.windows(2))
        .map(|((num, den), w)| {
            let mut num_prod = w[0].clone();
            for n in num {
                num_prod = num_prod.mul(n)?;
            }
            let mut den_prod = w[1].clone();
            for d in den {
                den_prod = den_prod.mul(d)?;
            }
            num_prod.sub(&den_prod)
        })
        .collect()
}

/// Openings and challenges the identity is evaluated on.
pub struct VanishingInputs<'a> {
    pub zeta: &'a GlExtVar,
    pub zeta_pow_deg: &'a GlExtVar,
    pub local_constants: &'a [GlExtVar],
    pub local_wires: &'a [GlExtVar],
    pub public_inputs_hash: &'a [GlVar; 4],
    pub local_zs: &'a [GlExtVar],
    pub next_zs: &'a [GlExtVar],
    pub partial_products: &'a [GlExtVar],
    pub s_sigmas: &'a [GlExtVar],
    pub betas: &'a [GlVar],
    pub gammas: &'a [GlVar],
    pub alphas: &'a [GlVar],
}

/// One combined vanishing value per challenge.
pub fn eval_vanishing_poly(
    common: &CommonCircuitData,
    v: &VanishingInputs<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let num_routed = common.config.num_routed_wires;
    let num_prods = common.num_partial_products;
    let constraint_terms =
        evaluate_gate_constraints(common, v.local_constants, v.local_wires, v.public_inputs_hash)?;
    let l_0 = eval_l_0(common.degree(), v.zeta, v.zeta_pow_deg)?;

    let mut z_1_terms = Vec::with_capacity(common.num_challenges());
    let mut partial_product_terms = Vec::new();
    for i in 0..common.num_challenges() {
        let z_x = &v.local_zs[i];
        let z_gx = &v.next_zs[i];
        z_1_terms.push(l_0.mul(&z_x.sub(&GlExtVar::one())?)?);

        let beta = GlExtVar::from_base(v.betas[i].clone());
        let gamma = GlExtVar::from_base(v.gammas[i].clone());
        let mut numerators = Vec::with_capacity(num_routed);
        let mut denominators = Vec::with_capacity(num_routed);
        for j in 0..num_routed {
            let wire = v.local_wires[j].add(&gamma)?;
            let s_id = v.zeta.mul_base_const(common.k_is[j])?;
            numerators.push(s_id.mul_add(&beta, &wire)?);
            denominators.push(v.s_sigmas[j].mul_add(&beta, &wire)?);
        }
        let partials = &v.partial_products[i * num_prods..(i + 1) * num_prods];
        partial_product_terms.extend(check_partial_products(
            &numerators,
            &denominators,
            partials,
            z_x,
            z_gx,
            common.quotient_degree_factor,
        )?);
    }

    let terms = [z_1_terms, partial_product_terms, constraint_terms].concat();
    v.alphas
        .iter()
        .map(|alpha| reduce_with_powers(&terms, &GlExtVar::from_base(alpha.clone())))
        .collect()
}

/// `vanishing_i = (ζ^n - 1)·Σ_k ζ^{nk}·t_{i,k}` for every challenge `i`.
pub fn check_quotient(
    common: &CommonCircuitData,
    vanishing: &[GlExtVar],
    quotient_polys: &[GlExtVar],
    zeta_pow_deg: &GlExtVar,
) -> Result<(), SynthesisError> {
    let z_h = zeta_pow_deg.sub(&GlExtVar::one())?;
    let chunks = quotient_polys.chunks(common.quotient_degree_factor);
    if chunks.len() != vanishing.len() {
        return Err(SynthesisError::Unsatisfiable);
    }
    for (v, chunk) in vanishing.iter().zip(chunks) {
        v.enforce_equal(&z_h.mul(&reduce_with_powers(chunk, zeta_pow_deg)?)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl_u64::{ext_div, ext_mul, ext_pow, ext_sub, GlExt};
    use crate::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn lagrange_basis_at_zeta() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let zeta: GlExt = [123_456_789, 42];
        let n = 1 << 10;
        let z = GlExtVar::new_witness(cs.clone(), zeta).unwrap();
        let z_n = z.exp_power_of_2(10).unwrap();
        let got = eval_l_0(n, &z, &z_n).unwrap().value().unwrap();
        let expected = ext_div(
            ext_sub(ext_pow(zeta, n as u64), [1, 0]),
            ext_mul([n as u64, 0], ext_sub(zeta, [1, 0])),
        );
        assert_eq!(got, expected);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn filter_vanishes_on_other_rows_of_the_group() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let group = 2..5;
        for (s, row, zero) in [(3u64, 2usize, true), (2, 2, false), (u32::MAX as u64, 4, true)] {
            let sv = GlExtVar::new_witness(cs.clone(), [s, 0]).unwrap();
            let f = compute_filter(row, &group, &sv, true).unwrap().value().unwrap();
            assert_eq!(f == [0, 0], zero, "s = {s}, row = {row}");
        }
    }

    #[test]
    fn partial_products_chain() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let w = |v: u64| GlExtVar::new_witness(cs.clone(), [v, 0]).unwrap();
        // Two chunks of two: z·(2·3)/(1·1) = p, p·(5·7)/(5·7) = z_next.
        let nums = [w(2), w(3), w(5), w(7)];
        let dens = [w(1), w(1), w(5), w(7)];
        let z = w(4);
        let partial = w(24);
        let out = check_partial_products(&nums, &dens, &[partial], &z, &w(24), 2).unwrap();
        assert!(out.iter().all(|o| o.value().unwrap() == [0, 0]));

        let out = check_partial_products(&nums, &dens, &[w(25)], &z, &w(24), 2).unwrap();
        assert_ne!(out[0].value().unwrap(), [0, 0]);
    }
}
