//! Binding between the outer Groth16 public inputs and the inner ones.

use ark_ff::{Field, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::config::{LimbBase, PublicInputBinding};
use crate::gadgets::gl::GlVar;
use crate::Fr;

fn base(b: LimbBase) -> Fr {
    Fr::from(2u64).pow([u64::from(b.log2())])
}

/// Host computation of the outer public inputs, one per group.
///
/// Limbs are folded from the highest index of a group down to the lowest,
/// `acc = base·acc + limb`, in the scalar field.
pub fn outer_public_inputs(binding: &PublicInputBinding, inner: &[u64]) -> Vec<Fr> {
    let b = base(binding.base);
    binding
        .groups
        .iter()
        .map(|g| {
            inner[g.clone()]
                .iter()
                .rev()
                .fold(Fr::from(0u64), |acc, &limb| acc * b + Fr::from(limb))
        })
        .collect()
}

/// Allocates one outer public input per group and enforces it equals the
/// folded limbs.
pub fn enforce_binding(
    cs: ConstraintSystemRef<Fr>,
    binding: &PublicInputBinding,
    limbs: &[GlVar],
) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    let b = base(binding.base);
    let mut outputs = Vec::with_capacity(binding.num_outputs());
    for g in &binding.groups {
        let group = limbs.get(g.clone()).ok_or(SynthesisError::Unsatisfiable)?;
        let mut acc = FpVar::<Fr>::zero();
        for limb in group.iter().rev() {
            if binding.base == LimbBase::Binary {
                limb.native().mul_equals(limb.native(), limb.native())?;
            }
            acc = acc * b + limb.native();
        }
        let input = FpVar::new_input(cs.clone(), || acc.value())?;
        input.enforce_equal(&acc)?;
        outputs.push(input);
    }
    tracing::debug!(
        groups = binding.num_outputs(),
        limbs = binding.num_limbs(),
        bits_per_limb = binding.base.log2(),
        "public input binding"
    );
    Ok(outputs)
}

/// Big-endian 32-byte encoding of an outer public input.
pub fn to_be_bytes(x: &Fr) -> [u8; 32] {
    use ark_ff::BigInteger;
    let mut out = [0u8; 32];
    out.copy_from_slice(&x.into_bigint().to_bytes_be());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use num_bigint::BigUint;

    fn bits_of(v: &BigUint, n: usize) -> Vec<u64> {
        (0..n).map(|i| u64::from(v.bit(i as u64))).collect()
    }

    #[test]
    fn binary_groups_read_least_significant_limb_first() {
        let a = BigUint::parse_bytes(b"0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcd", 16).unwrap();
        let b = BigUint::from(0xdead_beef_u64);
        let inner = [bits_of(&a, 256), bits_of(&b, 256)].concat();
        let out = outer_public_inputs(&PublicInputBinding::default(), &inner);
        assert_eq!(out, vec![Fr::from(a), Fr::from(b)]);
    }

    #[test]
    fn pow63_base() {
        let binding = PublicInputBinding {
            groups: vec![0..3],
            base: LimbBase::Pow63,
        };
        let inner = [5u64, 7, 11];
        let expected = (BigUint::from(11u64) << 126) + (BigUint::from(7u64) << 63) + 5u64;
        assert_eq!(outer_public_inputs(&binding, &inner), vec![Fr::from(expected)]);
    }

    #[test]
    fn circuit_binding_matches_host() {
        let binding = PublicInputBinding {
            groups: vec![0..4, 4..6],
            base: LimbBase::Binary,
        };
        let inner = [1u64, 0, 1, 1, 0, 1];
        let cs = ConstraintSystem::<Fr>::new_ref();
        let limbs = GlVar::new_witness_vec(cs.clone(), &inner).unwrap();
        let outs = enforce_binding(cs.clone(), &binding, &limbs).unwrap();
        let got: Vec<Fr> = outs.iter().map(|o| o.value().unwrap()).collect();
        assert_eq!(got, outer_public_inputs(&binding, &inner));
        assert_eq!(got, vec![Fr::from(13u64), Fr::from(2u64)]);
        assert_eq!(cs.num_instance_variables(), 1 + 2);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn binary_limbs_must_be_bits() {
        let binding = PublicInputBinding {
            groups: vec![0..2],
            base: LimbBase::Binary,
        };
        // 2 + 2·0 folds to 2, the same as bits [0, 1]; only the bit check tells them apart.
        let cs = ConstraintSystem::<Fr>::new_ref();
        let limbs = GlVar::new_witness_vec(cs.clone(), &[2, 0]).unwrap();
        enforce_binding(cs.clone(), &binding, &limbs).unwrap();
        assert!(!cs.is_satisfied().unwrap());

        let wide = PublicInputBinding {
            groups: vec![0..crate::config::MAX_BINARY_LIMBS + 1],
            base: LimbBase::Binary,
        };
        assert!(wide.validate(512).is_err());
        assert!(PublicInputBinding::default().validate(512).is_ok());
    }

    #[test]
    fn be_bytes_put_low_byte_last() {
        let bytes = to_be_bytes(&Fr::from(0x0102u64));
        assert_eq!(&bytes[30..], &[1, 2]);
        assert!(bytes[..30].iter().all(|&b| b == 0));
    }
}
