//! Wire formats and the `"true"`/`"false"` verify boundary, driven by a
//! small stand-in Groth16 circuit.

use ark_bls12_381::Fr;
use ark_groth16::Groth16;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};

use plonky2_groth16::wire::{CompactProof, CompactVk, VerboseProof, VerboseVk, WireProof, WireVk};
use plonky2_groth16::{check_proof, verify_proof, OuterE, OuterProof, OuterVk};

/// Public `y`, `z` with witness `x` such that `x² = y` and `x + y = z`.
#[derive(Clone)]
struct Square {
    x: Fr,
}

impl ConstraintSynthesizer<Fr> for Square {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let x = FpVar::new_witness(cs.clone(), || Ok(self.x))?;
        let y = FpVar::new_input(cs.clone(), || Ok(self.x * self.x))?;
        let z = FpVar::new_input(cs, || Ok(self.x * self.x + self.x))?;
        x.square()?.enforce_equal(&y)?;
        (&x + &y).enforce_equal(&z)
    }
}

fn proved() -> (OuterProof, OuterVk, Vec<Fr>) {
    let mut rng = StdRng::seed_from_u64(2024);
    let x = Fr::from(12_345u64);
    let (pk, vk) = Groth16::<OuterE>::circuit_specific_setup(Square { x }, &mut rng).unwrap();
    let proof = Groth16::<OuterE>::prove(&pk, Square { x }, &mut rng).unwrap();
    (proof, vk, vec![x * x, x * x + x])
}

fn json<T: serde::Serialize>(v: &T) -> String {
    serde_json::to_string(v).unwrap()
}

#[test]
fn verbose_and_compact_both_verify() {
    let (proof, vk, inputs) = proved();
    let verbose_proof = json(&VerboseProof::encode(&proof, &inputs).unwrap());
    let verbose_vk = json(&VerboseVk::encode(&vk).unwrap());
    let compact_proof = json(&CompactProof::encode(&proof, &inputs).unwrap());
    let compact_vk = json(&CompactVk::encode(&vk).unwrap());

    for p in [&verbose_proof, &compact_proof] {
        for v in [&verbose_vk, &compact_vk] {
            assert_eq!(verify_proof(p, v), "true");
        }
    }

    let (p1, i1) = WireProof::from_json(&verbose_proof).unwrap().decode().unwrap();
    let (p2, i2) = WireProof::from_json(&compact_proof).unwrap().decode().unwrap();
    assert_eq!((p1, i1), (p2, i2));
    assert_eq!(
        WireVk::from_json(&verbose_vk).unwrap().decode().unwrap(),
        WireVk::from_json(&compact_vk).unwrap().decode().unwrap()
    );
}

#[test]
fn verbose_layout_matches_external_verifiers() {
    let (proof, vk, inputs) = proved();
    let v: serde_json::Value = serde_json::from_str(&json(&VerboseProof::encode(&proof, &inputs).unwrap())).unwrap();
    assert_eq!(v["pi_a"].as_array().unwrap().len(), 2);
    assert_eq!(v["pi_b"][1][0].as_str().unwrap().len(), 96);
    assert_eq!(v["public_inputs"][0].as_str().unwrap().len(), 64);

    let k: serde_json::Value = serde_json::from_str(&json(&VerboseVk::encode(&vk).unwrap())).unwrap();
    for field in ["alpha_g1", "beta_g2", "gamma_g2", "delta_g2", "gamma_abc_g1"] {
        assert!(k.get(field).is_some(), "missing {field}");
    }
    assert_eq!(k["gamma_abc_g1"].as_array().unwrap().len(), inputs.len() + 1);
}

#[test]
fn tampering_turns_into_false() {
    let (proof, vk, inputs) = proved();
    let vk_json = json(&VerboseVk::encode(&vk).unwrap());

    let wrong_inputs = vec![inputs[0], inputs[1] + Fr::from(1u64)];
    let p = json(&VerboseProof::encode(&proof, &wrong_inputs).unwrap());
    assert_eq!(verify_proof(&p, &vk_json), "false");
    assert!(!check_proof(&p, &vk_json).unwrap());

    let p = json(&VerboseProof::encode(&proof, &inputs[..1]).unwrap());
    assert_eq!(verify_proof(&p, &vk_json), "false");

    let mut swapped = VerboseProof::encode(&proof, &inputs).unwrap();
    swapped.pi_c = swapped.pi_a.clone();
    assert_eq!(verify_proof(&json(&swapped), &vk_json), "false");

    let mut garbage = CompactProof::encode(&proof, &inputs).unwrap();
    garbage.pi_a.replace_range(0..2, "zz");
    assert!(check_proof(&json(&garbage), &vk_json).is_err());
    assert_eq!(verify_proof(&json(&garbage), &vk_json), "false");
}
