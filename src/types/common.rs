//! Circuit descriptor of the wrapped proof system.
//!
//! Parsed once from `common_circuit_data.json`. Gate identifiers are decoded
//! into [`Gate`] values here; every later stage works from the typed form.

use core::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gl_u64::P_GL;
use crate::plonk::gates::Gate;

/// Merkle salt appended to every blinded leaf when hiding is enabled.
pub const SALT_SIZE: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriConfig {
    pub rate_bits: usize,
    pub cap_height: usize,
    pub proof_of_work_bits: u32,
    pub num_query_rounds: usize,
    #[serde(default)]
    pub reduction_strategy: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub num_wires: usize,
    pub num_routed_wires: usize,
    pub num_constants: usize,
    #[serde(default)]
    pub use_base_arithmetic_gate: bool,
    pub security_bits: usize,
    pub num_challenges: usize,
    pub zero_knowledge: bool,
    pub max_quotient_degree_factor: usize,
    pub fri_config: FriConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriParams {
    pub config: FriConfig,
    pub hiding: bool,
    pub degree_bits: usize,
    pub reduction_arity_bits: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorsInfo {
    pub selector_indices: Vec<usize>,
    pub groups: Vec<Range<usize>>,
}

impl SelectorsInfo {
    pub fn num_selectors(&self) -> usize {
        self.groups.len()
    }
}

/// Wire form of the descriptor, before gate decoding.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CommonCircuitDataJson {
    config: CircuitConfig,
    fri_params: FriParams,
    gates: Vec<String>,
    selectors_info: SelectorsInfo,
    quotient_degree_factor: usize,
    num_gate_constraints: usize,
    num_constants: usize,
    num_public_inputs: usize,
    k_is: Vec<u64>,
    num_partial_products: usize,
    #[serde(default)]
    num_lookup_polys: usize,
    #[serde(default)]
    num_lookup_selectors: usize,
}

/// The fixed description of one family of wrapped circuits.
#[derive(Clone, Debug)]
pub struct CommonCircuitData {
    pub config: CircuitConfig,
    pub fri_params: FriParams,
    pub gates: Vec<Gate>,
    pub selectors_info: SelectorsInfo,
    pub quotient_degree_factor: usize,
    pub num_gate_constraints: usize,
    pub num_constants: usize,
    pub num_public_inputs: usize,
    pub k_is: Vec<u64>,
    pub num_partial_products: usize,
}

impl CommonCircuitData {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let raw: CommonCircuitDataJson = serde_json::from_str(s)?;
        if raw.num_lookup_polys != 0 || raw.num_lookup_selectors != 0 {
            return Err(ConfigError::LookupsUnsupported);
        }
        let gates = raw
            .gates
            .iter()
            .map(|g| Gate::parse(g))
            .collect::<Result<Vec<_>, _>>()?;
        let data = Self {
            config: raw.config,
            fri_params: raw.fri_params,
            gates,
            selectors_info: raw.selectors_info,
            quotient_degree_factor: raw.quotient_degree_factor,
            num_gate_constraints: raw.num_gate_constraints,
            num_constants: raw.num_constants,
            num_public_inputs: raw.num_public_inputs,
            k_is: raw.k_is,
            num_partial_products: raw.num_partial_products,
        };
        data.validate()?;
        Ok(data)
    }

    /// Serializes back to the wire form; gate identifiers are regenerated.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let raw = CommonCircuitDataJson {
            config: self.config.clone(),
            fri_params: self.fri_params.clone(),
            gates: self.gates.iter().map(Gate::id).collect(),
            selectors_info: self.selectors_info.clone(),
            quotient_degree_factor: self.quotient_degree_factor,
            num_gate_constraints: self.num_gate_constraints,
            num_constants: self.num_constants,
            num_public_inputs: self.num_public_inputs,
            k_is: self.k_is.clone(),
            num_partial_products: self.num_partial_products,
            num_lookup_polys: 0,
            num_lookup_selectors: 0,
        };
        Ok(serde_json::to_string(&raw)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let len = |what: &str, expected: usize, got: usize| {
            if expected == got {
                Ok(())
            } else {
                Err(ConfigError::Length {
                    what: what.to_string(),
                    expected,
                    got,
                })
            }
        };
        len("selector_indices", self.gates.len(), self.selectors_info.selector_indices.len())?;
        len("k_is", self.config.num_routed_wires, self.k_is.len())?;
        let chunks = self.config.num_routed_wires.div_ceil(self.quotient_degree_factor.max(1));
        len("num_partial_products", chunks.saturating_sub(1), self.num_partial_products)?;
        if self.quotient_degree_factor == 0 {
            return Err(ConfigError::Unsupported("quotient_degree_factor of zero".into()));
        }
        for (i, &s) in self.selectors_info.selector_indices.iter().enumerate() {
            let group = self.selectors_info.groups.get(s).ok_or_else(|| {
                ConfigError::Unsupported(format!("gate {i} uses missing selector group {s}"))
            })?;
            if !group.contains(&i) {
                return Err(ConfigError::Unsupported(format!(
                    "gate {i} is outside its selector group {group:?}"
                )));
            }
        }
        if self.num_selectors() > self.num_constants {
            return Err(ConfigError::Unsupported("more selectors than constant polynomials".into()));
        }
        let max_constraints = self.gates.iter().map(Gate::num_constraints).max().unwrap_or(0);
        len("num_gate_constraints", max_constraints, self.num_gate_constraints)?;
        for g in &self.gates {
            if g.num_wires() > self.config.num_wires {
                return Err(ConfigError::MalformedGate {
                    gate: g.id(),
                    reason: format!("needs {} wires, circuit has {}", g.num_wires(), self.config.num_wires),
                });
            }
            if g.num_constants() + self.num_selectors() > self.num_constants {
                return Err(ConfigError::MalformedGate {
                    gate: g.id(),
                    reason: "needs more constants than the circuit provides".into(),
                });
            }
        }
        if let Some(&k) = self.k_is.iter().find(|&&k| k >= P_GL) {
            return Err(ConfigError::NonCanonical {
                what: "k_is".into(),
                value: k,
            });
        }
        let fri = &self.fri_params;
        if fri.config.proof_of_work_bits > 64 {
            return Err(ConfigError::Unsupported(format!(
                "{} proof-of-work bits exceed a 64-bit response",
                fri.config.proof_of_work_bits
            )));
        }
        if fri.config.cap_height > self.lde_bits() {
            return Err(ConfigError::Unsupported("cap height exceeds the LDE size".into()));
        }
        let total_arity: usize = fri.reduction_arity_bits.iter().sum();
        if total_arity > fri.degree_bits {
            return Err(ConfigError::Unsupported("FRI reductions exceed the degree".into()));
        }
        if self.lde_bits() - total_arity < fri.config.cap_height {
            return Err(ConfigError::Unsupported(
                "last FRI layer is smaller than the Merkle cap".into(),
            ));
        }
        if self.lde_bits() > crate::gl_u64::TWO_ADICITY {
            return Err(ConfigError::Unsupported("LDE larger than the two-adic subgroup".into()));
        }
        Ok(())
    }

    pub fn degree_bits(&self) -> usize {
        self.fri_params.degree_bits
    }

    pub fn degree(&self) -> usize {
        1 << self.degree_bits()
    }

    pub fn rate_bits(&self) -> usize {
        self.fri_params.config.rate_bits
    }

    pub fn cap_height(&self) -> usize {
        self.fri_params.config.cap_height
    }

    /// log2 of the evaluation (LDE) domain size.
    pub fn lde_bits(&self) -> usize {
        self.degree_bits() + self.rate_bits()
    }

    pub fn num_challenges(&self) -> usize {
        self.config.num_challenges
    }

    pub fn num_selectors(&self) -> usize {
        self.selectors_info.num_selectors()
    }

    pub fn num_zs_partial_products_polys(&self) -> usize {
        self.num_challenges() * (1 + self.num_partial_products)
    }

    pub fn num_quotient_polys(&self) -> usize {
        self.num_challenges() * self.quotient_degree_factor
    }

    pub fn salt_size(&self) -> usize {
        if self.fri_params.hiding {
            SALT_SIZE
        } else {
            0
        }
    }

    pub fn final_poly_len(&self) -> usize {
        1 << (self.degree_bits() - self.fri_params.reduction_arity_bits.iter().sum::<usize>())
    }

    /// Leaf widths of the four initial oracles, salt included.
    pub fn initial_leaf_lens(&self) -> [usize; 4] {
        let salt = self.salt_size();
        [
            self.num_constants + self.config.num_routed_wires,
            self.config.num_wires + salt,
            self.num_zs_partial_products_polys() + salt,
            self.num_quotient_polys() + salt,
        ]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small, self-consistent descriptor.
    pub(crate) fn sample_json() -> String {
        serde_json::json!({
            "config": {
                "num_wires": 135,
                "num_routed_wires": 80,
                "num_constants": 2,
                "use_base_arithmetic_gate": true,
                "security_bits": 100,
                "num_challenges": 2,
                "zero_knowledge": false,
                "max_quotient_degree_factor": 8,
                "fri_config": {
                    "rate_bits": 3,
                    "cap_height": 4,
                    "proof_of_work_bits": 16,
                    "reduction_strategy": {"ConstantArityBits": [4, 5]},
                    "num_query_rounds": 28
                }
            },
            "fri_params": {
                "config": {
                    "rate_bits": 3,
                    "cap_height": 4,
                    "proof_of_work_bits": 16,
                    "reduction_strategy": {"ConstantArityBits": [4, 5]},
                    "num_query_rounds": 28
                },
                "hiding": false,
                "degree_bits": 12,
                "reduction_arity_bits": [4, 4]
            },
            "gates": [
                "NoopGate",
                "ConstantGate { num_consts: 2 }",
                "PublicInputGate",
                "PoseidonGate(PhantomData<plonky2_field::goldilocks_field::GoldilocksField>)<WIDTH=12>"
            ],
            "selectors_info": {
                "selector_indices": [0, 0, 0, 1],
                "groups": [{"start": 0, "end": 3}, {"start": 3, "end": 4}]
            },
            "quotient_degree_factor": 8,
            "num_gate_constraints": 123,
            "num_constants": 4,
            "num_public_inputs": 3,
            "k_is": (0..80u64).map(|i| crate::gl_u64::gl_pow(7, i)).collect::<Vec<_>>(),
            "num_partial_products": 9,
            "num_lookup_polys": 0,
            "num_lookup_selectors": 0,
            "luts": []
        })
        .to_string()
    }

    #[test]
    fn parses_and_derives_sizes() {
        let c = CommonCircuitData::from_json(&sample_json()).unwrap();
        assert_eq!(c.gates.len(), 4);
        assert_eq!(c.lde_bits(), 15);
        assert_eq!(c.final_poly_len(), 16);
        assert_eq!(c.initial_leaf_lens(), [84, 135, 20, 16]);
        assert_eq!(c.num_selectors(), 2);
    }

    #[test]
    fn unknown_gate_is_a_config_error() {
        let s = sample_json().replace("PublicInputGate", "MysteryGate");
        assert!(matches!(
            CommonCircuitData::from_json(&s),
            Err(ConfigError::UnknownGate(g)) if g == "MysteryGate"
        ));
    }

    #[test]
    fn lookups_are_rejected() {
        let s = sample_json().replace("\"num_lookup_polys\":0", "\"num_lookup_polys\":2");
        assert!(matches!(
            CommonCircuitData::from_json(&s),
            Err(ConfigError::LookupsUnsupported)
        ));
    }

    #[test]
    fn constraint_count_must_match_gates() {
        let s = sample_json().replace("\"num_gate_constraints\":123", "\"num_gate_constraints\":5");
        assert!(matches!(
            CommonCircuitData::from_json(&s),
            Err(ConfigError::Length { .. })
        ));
    }

    #[test]
    fn json_roundtrip_preserves_gates() {
        let c = CommonCircuitData::from_json(&sample_json()).unwrap();
        let again = CommonCircuitData::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(again.gates, c.gates);
    }
}
