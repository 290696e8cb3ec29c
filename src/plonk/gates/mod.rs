//! Gate set of the wrapped circuits.
//!
//! [`Gate`] is a closed enum; each variant carries its typed parameters and
//! is decoded once from the descriptor's gate identifier by a tag table
//! (`GATE_TABLE`). Adding a gate means adding a variant, a table row and an
//! evaluator; dispatch does not change.
//!
//! Every evaluator works on extension values at the out-of-domain point and
//! returns its constraint values, which the vanishing check filters and
//! combines.

use std::collections::BTreeMap;

use ark_relations::r1cs::SynthesisError;

use crate::error::ConfigError;
use crate::gadgets::gl::GlVar;
use crate::gadgets::gl_ext::GlExtVar;

mod arithmetic;
mod base_sum;
mod coset_interpolation;
mod exponentiation;
mod poseidon;
mod random_access;
mod reducing;
mod simple;

/// Extension degree of the wrapped proof system.
pub const D: usize = 2;

/// Openings seen by one gate: wires and constants at ζ, with the selector
/// columns already stripped from the constants.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationVars<'a> {
    pub local_constants: &'a [GlExtVar],
    pub local_wires: &'a [GlExtVar],
    pub public_inputs_hash: &'a [GlVar; 4],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Noop,
    Constant {
        num_consts: usize,
    },
    PublicInput,
    Arithmetic {
        num_ops: usize,
    },
    ArithmeticExtension {
        num_ops: usize,
    },
    MulExtension {
        num_ops: usize,
    },
    BaseSum {
        num_limbs: usize,
        base: usize,
    },
    Exponentiation {
        num_power_bits: usize,
    },
    RandomAccess {
        bits: usize,
        num_copies: usize,
        num_extra_constants: usize,
    },
    Reducing {
        num_coeffs: usize,
    },
    ReducingExtension {
        num_coeffs: usize,
    },
    /// Width-12 Poseidon permutation with optional input swap.
    Poseidon,
    /// Width-12 Poseidon MDS layer over the extension algebra.
    PoseidonMds,
    CosetInterpolation {
        subgroup_bits: usize,
        degree: usize,
        barycentric_weights: Vec<u64>,
    },
}

/// Numeric parameters found in a gate identifier, keyed by name.
///
/// `ConstantGate { num_consts: 2 }` yields `num_consts -> [2]`,
/// `BaseSumGate { num_limbs: 63 } + Base: 2` additionally `Base -> [2]`,
/// `PoseidonGate(..)<WIDTH=12>` yields `WIDTH -> [12]` and lists such as
/// `barycentric_weights: [1, 2]` keep every element.
#[derive(Debug, Default)]
struct GateParams {
    values: BTreeMap<String, Vec<u64>>,
}

impl GateParams {
    fn parse(s: &str) -> Self {
        let b = s.as_bytes();
        let mut values = BTreeMap::new();
        let mut i = 0;
        while i < b.len() {
            if !(b[i].is_ascii_alphabetic() || b[i] == b'_') {
                i += 1;
                continue;
            }
            let start = i;
            while i < b.len() && (b[i].is_ascii_alphanumeric() || b[i] == b'_') {
                i += 1;
            }
            let key = &s[start..i];
            let mut j = i;
            while j < b.len() && b[j] == b' ' {
                j += 1;
            }
            let is_sep = j < b.len()
                && (b[j] == b'=' || (b[j] == b':' && b.get(j + 1) != Some(&b':')));
            if !is_sep {
                // Skip `::` paths so their segments are not read as keys.
                while i < b.len() && b[i] == b':' {
                    i += 1;
                }
                continue;
            }
            j += 1;
            while j < b.len() && b[j] == b' ' {
                j += 1;
            }
            if j < b.len() && b[j] == b'[' {
                let end = s[j..].find(']').map(|e| j + e).unwrap_or(b.len());
                let list: Vec<u64> = s[j + 1..end]
                    .split(',')
                    .filter_map(|t| t.trim().parse().ok())
                    .collect();
                values.insert(key.to_string(), list);
                i = end;
            } else {
                let num_end = s[j..]
                    .find(|c: char| !c.is_ascii_digit())
                    .map(|e| j + e)
                    .unwrap_or(b.len());
                if let Ok(v) = s[j..num_end].parse() {
                    values.insert(key.to_string(), vec![v]);
                }
                i = num_end.max(j);
            }
        }
        Self { values }
    }

    fn usize(&self, key: &str) -> Result<usize, String> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(|&v| v as usize)
            .ok_or_else(|| format!("missing parameter `{key}`"))
    }

    fn usize_at_least(&self, key: &str, min: usize) -> Result<usize, String> {
        match self.usize(key)? {
            v if v < min => Err(format!("`{key}` is {v}, expected at least {min}")),
            v => Ok(v),
        }
    }

    fn list(&self, key: &str) -> Result<Vec<u64>, String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| format!("missing parameter `{key}`"))
    }
}

type GateDecoder = fn(&GateParams) -> Result<Gate, String>;

/// Bound on index and subgroup bit counts; wider tables do not fit a row.
const MAX_ACCESS_BITS: usize = 16;

fn require_width(p: &GateParams) -> Result<(), String> {
    match p.usize("WIDTH")? {
        12 => Ok(()),
        w => Err(format!("unsupported width {w}")),
    }
}

/// Tag -> decoder. The tag is the identifier prefix up to the first
/// non-identifier character.
const GATE_TABLE: &[(&str, GateDecoder)] = &[
    ("NoopGate", |_| Ok(Gate::Noop)),
    ("ConstantGate", |p| Ok(Gate::Constant { num_consts: p.usize("num_consts")? })),
    ("PublicInputGate", |_| Ok(Gate::PublicInput)),
    ("ArithmeticGate", |p| Ok(Gate::Arithmetic { num_ops: p.usize("num_ops")? })),
    ("ArithmeticExtensionGate", |p| {
        Ok(Gate::ArithmeticExtension { num_ops: p.usize("num_ops")? })
    }),
    ("MulExtensionGate", |p| Ok(Gate::MulExtension { num_ops: p.usize("num_ops")? })),
    ("BaseSumGate", |p| {
        Ok(Gate::BaseSum {
            num_limbs: p.usize("num_limbs")?,
            base: p.usize("Base")?,
        })
    }),
    ("ExponentiationGate", |p| {
        Ok(Gate::Exponentiation { num_power_bits: p.usize_at_least("num_power_bits", 1)? })
    }),
    ("RandomAccessGate", |p| {
        let bits = p.usize("bits")?;
        if bits > MAX_ACCESS_BITS {
            return Err(format!("{bits} index bits exceed {MAX_ACCESS_BITS}"));
        }
        Ok(Gate::RandomAccess {
            bits,
            num_copies: p.usize("num_copies")?,
            num_extra_constants: p.usize("num_extra_constants")?,
        })
    }),
    ("ReducingGate", |p| Ok(Gate::Reducing { num_coeffs: p.usize_at_least("num_coeffs", 1)? })),
    ("ReducingExtensionGate", |p| {
        Ok(Gate::ReducingExtension { num_coeffs: p.usize_at_least("num_coeffs", 1)? })
    }),
    ("PoseidonGate", |p| require_width(p).map(|_| Gate::Poseidon)),
    ("PoseidonMdsGate", |p| require_width(p).map(|_| Gate::PoseidonMds)),
    ("CosetInterpolationGate", |p| {
        let subgroup_bits = p.usize("subgroup_bits")?;
        if subgroup_bits > MAX_ACCESS_BITS {
            return Err(format!("subgroup of 2^{subgroup_bits} points"));
        }
        let degree = p.usize_at_least("degree", 2)?;
        if degree > 1 << subgroup_bits {
            return Err(format!("degree {degree} exceeds the {} subgroup points", 1 << subgroup_bits));
        }
        let barycentric_weights = p.list("barycentric_weights")?;
        if barycentric_weights.len() != 1 << subgroup_bits {
            return Err("barycentric weight count differs from the subgroup size".into());
        }
        if barycentric_weights.iter().any(|&w| w >= crate::gl_u64::P_GL) {
            return Err("non-canonical barycentric weight".into());
        }
        Ok(Gate::CosetInterpolation {
            subgroup_bits,
            degree,
            barycentric_weights,
        })
    }),
];

const PHANTOM: &str = "PhantomData<plonky2_field::goldilocks_field::GoldilocksField>";

impl Gate {
    /// Decodes a gate identifier through `GATE_TABLE`.
    pub fn parse(id: &str) -> Result<Self, ConfigError> {
        let id = id.trim();
        let tag_end = id
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(id.len());
        let tag = &id[..tag_end];
        let decode = GATE_TABLE
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, f)| f)
            .ok_or_else(|| ConfigError::UnknownGate(tag.to_string()))?;
        let gate = decode(&GateParams::parse(id)).map_err(|reason| ConfigError::MalformedGate {
            gate: id.to_string(),
            reason,
        })?;
        if let Gate::BaseSum { base, .. } = gate {
            if base < 2 {
                return Err(ConfigError::MalformedGate {
                    gate: id.to_string(),
                    reason: format!("base {base}"),
                });
            }
        }
        Ok(gate)
    }

    /// Identifier in the descriptor's debug form.
    pub fn id(&self) -> String {
        match self {
            Gate::Noop => "NoopGate".into(),
            Gate::Constant { num_consts } => format!("ConstantGate {{ num_consts: {num_consts} }}"),
            Gate::PublicInput => "PublicInputGate".into(),
            Gate::Arithmetic { num_ops } => format!("ArithmeticGate {{ num_ops: {num_ops} }}"),
            Gate::ArithmeticExtension { num_ops } => {
                format!("ArithmeticExtensionGate {{ num_ops: {num_ops} }}")
            }
            Gate::MulExtension { num_ops } => format!("MulExtensionGate {{ num_ops: {num_ops} }}"),
            Gate::BaseSum { num_limbs, base } => {
                format!("BaseSumGate {{ num_limbs: {num_limbs} }} + Base: {base}")
            }
            Gate::Exponentiation { num_power_bits } => format!(
                "ExponentiationGate {{ num_power_bits: {num_power_bits}, _phantom: {PHANTOM} }}<D={D}>"
            ),
            Gate::RandomAccess {
                bits,
                num_copies,
                num_extra_constants,
            } => format!(
                "RandomAccessGate {{ bits: {bits}, num_copies: {num_copies}, \
                 num_extra_constants: {num_extra_constants}, _phantom: {PHANTOM} }}<D={D}>"
            ),
            Gate::Reducing { num_coeffs } => format!("ReducingGate {{ num_coeffs: {num_coeffs} }}"),
            Gate::ReducingExtension { num_coeffs } => {
                format!("ReducingExtensionGate {{ num_coeffs: {num_coeffs} }}")
            }
            Gate::Poseidon => format!("PoseidonGate({PHANTOM})<WIDTH=12>"),
            Gate::PoseidonMds => format!("PoseidonMdsGate({PHANTOM})<WIDTH=12>"),
            Gate::CosetInterpolation {
                subgroup_bits,
                degree,
                barycentric_weights,
            } => format!(
                "CosetInterpolationGate {{ subgroup_bits: {subgroup_bits}, degree: {degree}, \
                 barycentric_weights: {barycentric_weights:?}, _phantom: {PHANTOM} }}<D={D}>"
            ),
        }
    }

    pub fn num_constraints(&self) -> usize {
        match self {
            Gate::Noop => 0,
            Gate::Constant { num_consts } => *num_consts,
            Gate::PublicInput => 4,
            Gate::Arithmetic { num_ops } => *num_ops,
            Gate::ArithmeticExtension { num_ops } | Gate::MulExtension { num_ops } => num_ops * D,
            Gate::BaseSum { num_limbs, .. } => 1 + num_limbs,
            Gate::Exponentiation { num_power_bits } => num_power_bits + 1,
            Gate::RandomAccess {
                bits,
                num_copies,
                num_extra_constants,
            } => (bits + 2) * num_copies + num_extra_constants,
            Gate::Reducing { num_coeffs } | Gate::ReducingExtension { num_coeffs } => D * num_coeffs,
            Gate::Poseidon => poseidon::NUM_CONSTRAINTS,
            Gate::PoseidonMds => poseidon::MDS_NUM_CONSTRAINTS,
            Gate::CosetInterpolation {
                subgroup_bits, degree, ..
            } => {
                let n = coset_interpolation::num_intermediates(*subgroup_bits, *degree);
                D * (2 + 2 * n)
            }
        }
    }

    /// Highest wire index read, plus one.
    pub fn num_wires(&self) -> usize {
        match self {
            Gate::Noop => 0,
            Gate::Constant { num_consts } => *num_consts,
            Gate::PublicInput => 4,
            Gate::Arithmetic { num_ops } => 4 * num_ops,
            Gate::ArithmeticExtension { num_ops } => 4 * D * num_ops,
            Gate::MulExtension { num_ops } => 3 * D * num_ops,
            Gate::BaseSum { num_limbs, .. } => 1 + num_limbs,
            Gate::Exponentiation { num_power_bits } => 2 * num_power_bits + 2,
            Gate::RandomAccess {
                bits,
                num_copies,
                num_extra_constants,
            } => (2 + (1 << bits)) * num_copies + num_extra_constants + bits * num_copies,
            Gate::Reducing { num_coeffs } => 3 * D + num_coeffs + D * num_coeffs.saturating_sub(1),
            Gate::ReducingExtension { num_coeffs } => {
                3 * D + D * num_coeffs + D * num_coeffs.saturating_sub(1)
            }
            Gate::Poseidon => poseidon::NUM_WIRES,
            Gate::PoseidonMds => poseidon::MDS_NUM_WIRES,
            Gate::CosetInterpolation {
                subgroup_bits, degree, ..
            } => coset_interpolation::num_wires(*subgroup_bits, *degree),
        }
    }

    /// Gate constants consumed after the selector columns.
    pub fn num_constants(&self) -> usize {
        match self {
            Gate::Constant { num_consts } => *num_consts,
            Gate::Arithmetic { .. } | Gate::ArithmeticExtension { .. } => 2,
            Gate::MulExtension { .. } => 1,
            Gate::RandomAccess {
                num_extra_constants, ..
            } => *num_extra_constants,
            _ => 0,
        }
    }

    /// Constraint values of this gate, before filtering.
    pub fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        match self {
            Gate::Noop => Ok(Vec::new()),
            Gate::Constant { num_consts } => simple::eval_constant(*num_consts, vars),
            Gate::PublicInput => simple::eval_public_input(vars),
            Gate::Arithmetic { num_ops } => arithmetic::eval_base(*num_ops, vars),
            Gate::ArithmeticExtension { num_ops } => arithmetic::eval_extension(*num_ops, vars),
            Gate::MulExtension { num_ops } => arithmetic::eval_mul_extension(*num_ops, vars),
            Gate::BaseSum { num_limbs, base } => base_sum::eval(*num_limbs, *base, vars),
            Gate::Exponentiation { num_power_bits } => exponentiation::eval(*num_power_bits, vars),
            Gate::RandomAccess {
                bits,
                num_copies,
                num_extra_constants,
            } => random_access::eval(*bits, *num_copies, *num_extra_constants, vars),
            Gate::Reducing { num_coeffs } => reducing::eval_base(*num_coeffs, vars),
            Gate::ReducingExtension { num_coeffs } => reducing::eval_extension(*num_coeffs, vars),
            Gate::Poseidon => poseidon::eval(vars),
            Gate::PoseidonMds => poseidon::eval_mds(vars),
            Gate::CosetInterpolation {
                subgroup_bits,
                degree,
                barycentric_weights,
            } => coset_interpolation::eval(*subgroup_bits, *degree, barycentric_weights, vars),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::gl_u64::GlExt;
    use crate::Fr;
    use ark_relations::r1cs::ConstraintSystemRef;

    /// Evaluates `gate` on witness openings and returns the constraint values.
    pub(crate) fn eval_on(
        cs: &ConstraintSystemRef<Fr>,
        gate: &Gate,
        constants: &[GlExt],
        wires: &[GlExt],
        pi_hash: [u64; 4],
    ) -> Vec<GlExt> {
        let c: Vec<GlExtVar> = constants
            .iter()
            .map(|v| GlExtVar::new_witness(cs.clone(), *v).unwrap())
            .collect();
        let w: Vec<GlExtVar> = wires
            .iter()
            .map(|v| GlExtVar::new_witness(cs.clone(), *v).unwrap())
            .collect();
        let h = GlVar::new_witness_vec(cs.clone(), &pi_hash).unwrap();
        let h: [GlVar; 4] = core::array::from_fn(|i| h[i].clone());
        let vars = EvaluationVars {
            local_constants: &c,
            local_wires: &w,
            public_inputs_hash: &h,
        };
        let out = gate.eval_unfiltered(vars).unwrap();
        assert_eq!(out.len(), gate.num_constraints());
        out.iter().map(|v| v.value().unwrap()).collect()
    }

    pub(crate) fn all_zero(v: &[GlExt]) -> bool {
        v.iter().all(|e| *e == [0, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDS: &[&str] = &[
        "NoopGate",
        "ConstantGate { num_consts: 2 }",
        "PublicInputGate",
        "ArithmeticGate { num_ops: 20 }",
        "ArithmeticExtensionGate { num_ops: 10 }",
        "MulExtensionGate { num_ops: 13 }",
        "BaseSumGate { num_limbs: 63 } + Base: 2",
        "ExponentiationGate { num_power_bits: 66, _phantom: PhantomData<plonky2_field::goldilocks_field::GoldilocksField> }<D=2>",
        "RandomAccessGate { bits: 4, num_copies: 4, num_extra_constants: 2, _phantom: PhantomData<plonky2_field::goldilocks_field::GoldilocksField> }<D=2>",
        "ReducingGate { num_coeffs: 33 }",
        "ReducingExtensionGate { num_coeffs: 17 }",
        "PoseidonGate(PhantomData<plonky2_field::goldilocks_field::GoldilocksField>)<WIDTH=12>",
        "PoseidonMdsGate(PhantomData<plonky2_field::goldilocks_field::GoldilocksField>)<WIDTH=12>",
        "CosetInterpolationGate { subgroup_bits: 1, degree: 2, barycentric_weights: [9223372034707292161, 9223372034707292160], _phantom: PhantomData<plonky2_field::goldilocks_field::GoldilocksField> }<D=2>",
    ];

    #[test]
    fn every_identifier_parses_and_reprints() {
        for id in IDS {
            let g = Gate::parse(id).unwrap();
            assert_eq!(g.id(), *id);
        }
    }

    #[test]
    fn typed_parameters_are_extracted() {
        assert_eq!(
            Gate::parse(IDS[6]).unwrap(),
            Gate::BaseSum {
                num_limbs: 63,
                base: 2
            }
        );
        assert_eq!(
            Gate::parse(IDS[8]).unwrap(),
            Gate::RandomAccess {
                bits: 4,
                num_copies: 4,
                num_extra_constants: 2
            }
        );
        assert_eq!(Gate::parse(IDS[11]).unwrap().num_constraints(), 123);
    }

    #[test]
    fn unknown_and_malformed_identifiers() {
        assert!(matches!(
            Gate::parse("LookupGate { num_slots: 4 }"),
            Err(ConfigError::UnknownGate(t)) if t == "LookupGate"
        ));
        assert!(matches!(
            Gate::parse("ConstantGate { }"),
            Err(ConfigError::MalformedGate { .. })
        ));
        assert!(matches!(
            Gate::parse("PoseidonGate(PhantomData<F>)<WIDTH=8>"),
            Err(ConfigError::MalformedGate { .. })
        ));
    }

    #[test]
    fn parameters_outside_the_evaluator_range_are_malformed() {
        for id in [
            "ExponentiationGate { num_power_bits: 0, _phantom: PhantomData<F> }<D=2>",
            "ReducingGate { num_coeffs: 0 }",
            "ReducingExtensionGate { num_coeffs: 0 }",
            "RandomAccessGate { bits: 40, num_copies: 1, num_extra_constants: 0, _phantom: PhantomData<F> }<D=2>",
            "CosetInterpolationGate { subgroup_bits: 1, degree: 3, barycentric_weights: [1, 2], _phantom: PhantomData<F> }<D=2>",
            "CosetInterpolationGate { subgroup_bits: 1, degree: 1, barycentric_weights: [1, 2], _phantom: PhantomData<F> }<D=2>",
            "CosetInterpolationGate { subgroup_bits: 70, degree: 2, barycentric_weights: [1, 2], _phantom: PhantomData<F> }<D=2>",
        ] {
            assert!(
                matches!(Gate::parse(id), Err(ConfigError::MalformedGate { .. })),
                "{id} was accepted"
            );
        }
        // Smallest accepted values still evaluate.
        assert!(Gate::parse("ExponentiationGate { num_power_bits: 1, _phantom: PhantomData<F> }<D=2>").is_ok());
        assert!(Gate::parse("ReducingGate { num_coeffs: 1 }").is_ok());
    }
}
