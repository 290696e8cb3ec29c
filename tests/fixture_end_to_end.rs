//! Wraps a real plonky2 proof. Ignored by default; run with
//! `cargo test --test fixture_end_to_end -- --ignored` and
//! `PLONKY2_GROTH16_FIXTURES` naming a directory holding
//! `common_circuit_data.json`, `proof_with_public_inputs.json` and
//! `verifier_only_circuit_data.json`.

use std::path::PathBuf;

use ark_relations::r1cs::{ConstraintLayer, ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use serial_test::serial;
use tracing_subscriber_02::layer::SubscriberExt;
use tracing_subscriber_02::Registry;

use plonky2_groth16::gl_u64::{gl_add, P_GL};
use plonky2_groth16::types::hash::HashOut;
use plonky2_groth16::{
    verify_proof, wrap, CommonCircuitData, Fr, LimbBase, ProofWithPublicInputs, PublicInputBinding,
    VerifierOnlyCircuitData, WrapperCircuit, WrapperConfig,
};

struct Fixture {
    common: CommonCircuitData,
    verifier_only: VerifierOnlyCircuitData,
    proof: ProofWithPublicInputs,
}

fn fixture() -> Fixture {
    let dir = PathBuf::from(
        std::env::var_os("PLONKY2_GROTH16_FIXTURES").expect("PLONKY2_GROTH16_FIXTURES must name a fixture directory"),
    );
    let read = |f: &str| std::fs::read_to_string(dir.join(f)).unwrap_or_else(|e| panic!("{f}: {e}"));
    Fixture {
        common: CommonCircuitData::from_json(&read("common_circuit_data.json")).unwrap(),
        verifier_only: VerifierOnlyCircuitData::from_json(&read("verifier_only_circuit_data.json")).unwrap(),
        proof: ProofWithPublicInputs::from_json(&read("proof_with_public_inputs.json")).unwrap(),
    }
}

/// The 512-limb binary binding when the proof has exactly that many public
/// inputs, otherwise one base-2^63 group over the first three.
fn binding(common: &CommonCircuitData) -> PublicInputBinding {
    if common.num_public_inputs == 512 {
        PublicInputBinding::default()
    } else {
        PublicInputBinding {
            groups: vec![0..common.num_public_inputs.min(3)],
            base: LimbBase::Pow63,
        }
    }
}

fn satisfied(f: &Fixture, proof: ProofWithPublicInputs) -> bool {
    let circuit = WrapperCircuit::new(
        f.common.clone(),
        f.verifier_only.clone(),
        proof,
        binding(&f.common),
    )
    .unwrap();
    // Named namespaces in `which_is_unsatisfied` need the constraint layer.
    let subscriber = Registry::default().with(ConstraintLayer::default());
    tracing::subscriber::with_default(subscriber, || {
        let cs: ConstraintSystemRef<Fr> = ConstraintSystem::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        let ok = cs.is_satisfied().unwrap();
        if !ok {
            eprintln!("first unsatisfied: {:?}", cs.which_is_unsatisfied().unwrap());
        }
        ok
    })
}

#[test]
#[ignore = "needs PLONKY2_GROTH16_FIXTURES"]
#[serial]
fn honest_proof_satisfies_and_tampered_ones_do_not() {
    let f = fixture();
    assert!(satisfied(&f, f.proof.clone()));

    let bump = |v: &mut u64| *v = gl_add(*v, 1);

    let mut p = f.proof.clone();
    let sibling = &mut p.proof.opening_proof.query_round_proofs[0]
        .initial_trees_proof
        .evals_proofs[1]
        .1
        .siblings[0];
    *sibling = HashOut(sibling.0 + Fr::from(1u64));
    assert!(!satisfied(&f, p));

    let mut p = f.proof.clone();
    bump(&mut p.proof.openings.wires[0][0]);
    assert!(!satisfied(&f, p));

    let mut p = f.proof.clone();
    bump(&mut p.proof.opening_proof.final_poly.coeffs[0][1]);
    assert!(!satisfied(&f, p));

    let mut p = f.proof.clone();
    let last = p.proof.opening_proof.query_round_proofs[0].steps.len() - 1;
    bump(&mut p.proof.opening_proof.query_round_proofs[0].steps[last].evals[0][0]);
    assert!(!satisfied(&f, p));

    let mut p = f.proof.clone();
    p.public_inputs[0] = (p.public_inputs[0] + 1) % P_GL;
    assert!(!satisfied(&f, p));
}

#[test]
#[ignore = "needs PLONKY2_GROTH16_FIXTURES"]
#[serial]
fn wrapped_proof_verifies_at_the_boundary() {
    let f = fixture();
    let dir = tempfile::tempdir().unwrap();
    let config = WrapperConfig::new(dir.path()).with_binding(binding(&f.common));
    let mut rng = StdRng::seed_from_u64(42);
    let wrapped = wrap(&f.common, &f.verifier_only, &f.proof, &config, &mut rng).unwrap();
    assert!(wrapped.verify().unwrap());

    let (proof_json, vk_json) = wrapped.to_json().unwrap();
    assert_eq!(verify_proof(&proof_json, &vk_json), "true");
}
