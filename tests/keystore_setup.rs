//! Key generation through the key store on a small descriptor.

use ark_std::rand::{rngs::StdRng, SeedableRng};
use serial_test::serial;

use plonky2_groth16::keystore::{CIRCUIT_FILE, PK_FILE, VK_FILE};
use plonky2_groth16::types::hash::{HashOut, MerkleCap};
use plonky2_groth16::{
    CommonCircuitData, ConfigError, Fr, KeyStore, LimbBase, PublicInputBinding, VerifierOnlyCircuitData,
};

fn descriptor(gates: &[&str], constraints: usize) -> String {
    let fri = serde_json::json!({
        "rate_bits": 1,
        "cap_height": 1,
        "proof_of_work_bits": 1,
        "reduction_strategy": {"ConstantArityBits": [1, 1]},
        "num_query_rounds": 1
    });
    serde_json::json!({
        "config": {
            "num_wires": 4,
            "num_routed_wires": 4,
            "num_constants": 2,
            "security_bits": 100,
            "num_challenges": 1,
            "zero_knowledge": false,
            "max_quotient_degree_factor": 2,
            "fri_config": fri
        },
        "fri_params": {
            "config": fri,
            "hiding": false,
            "degree_bits": 2,
            "reduction_arity_bits": [1]
        },
        "gates": gates,
        "selectors_info": {
            "selector_indices": vec![0; gates.len()],
            "groups": [{"start": 0, "end": gates.len()}]
        },
        "quotient_degree_factor": 2,
        "num_gate_constraints": constraints,
        "num_constants": 2,
        "num_public_inputs": 2,
        "k_is": [1, 7, 49, 343],
        "num_partial_products": 1
    })
    .to_string()
}

fn verifier_only() -> VerifierOnlyCircuitData {
    VerifierOnlyCircuitData {
        constants_sigmas_cap: MerkleCap(vec![HashOut(Fr::from(5u64)), HashOut(Fr::from(6u64))]),
        circuit_digest: HashOut(Fr::from(9u64)),
    }
}

#[test]
fn descriptor_errors_surface_before_synthesis() {
    assert!(matches!(
        CommonCircuitData::from_json(&descriptor(&["NoopGate", "FancyGate"], 4)),
        Err(ConfigError::UnknownGate(_))
    ));
    assert!(matches!(
        CommonCircuitData::from_json(&descriptor(&["NoopGate", "PublicInputGate"], 3)),
        Err(ConfigError::Length { .. })
    ));
    assert!(matches!(
        CommonCircuitData::from_json("{\"config\": 1}"),
        Err(ConfigError::Json(_))
    ));
}

#[test]
#[serial]
fn setup_runs_once_per_circuit() {
    let dir = tempfile::tempdir().unwrap();
    let store = KeyStore::new(dir.path());
    let common = CommonCircuitData::from_json(&descriptor(&["NoopGate", "PublicInputGate"], 4)).unwrap();
    let binding = PublicInputBinding {
        groups: vec![0..2],
        base: LimbBase::Pow63,
    };
    let mut rng = StdRng::seed_from_u64(1);

    let (_, vk) = store.load_or_setup(&common, &verifier_only(), &binding, &mut rng).unwrap();
    for file in [CIRCUIT_FILE, PK_FILE, VK_FILE] {
        assert!(dir.path().join(file).is_file(), "{file} not written");
    }
    assert_eq!(vk.gamma_abc_g1.len(), 2);

    // Same circuit: keys come back from disk, not from a new setup.
    let (_, again) = store.load_or_setup(&common, &verifier_only(), &binding, &mut rng).unwrap();
    assert_eq!(again, vk);
    assert_eq!(store.read_verifying_key().unwrap(), vk);

    // A different binding is a different circuit.
    let split = PublicInputBinding {
        groups: vec![0..1, 1..2],
        base: LimbBase::Binary,
    };
    let (_, other) = store.load_or_setup(&common, &verifier_only(), &split, &mut rng).unwrap();
    assert_eq!(other.gamma_abc_g1.len(), 3);
    assert_ne!(store.read_verifying_key().unwrap(), vk);
}
