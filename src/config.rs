//! Deployment configuration of the wrapper.

use core::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Positional base used to fold a group of inner limbs into one outer value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimbBase {
    /// `acc = 2·acc + limb`; each limb is constrained to be a bit.
    #[default]
    Binary,
    /// `acc = 2^63·acc + limb`.
    Pow63,
}

impl LimbBase {
    pub fn log2(self) -> u32 {
        match self {
            LimbBase::Binary => 1,
            LimbBase::Pow63 => 63,
        }
    }
}

/// Widest binary group: one 256-bit digest.
pub const MAX_BINARY_LIMBS: usize = 256;

/// How the outer public inputs are reconstructed from the inner ones.
///
/// Each group is a contiguous range of inner public input indices and
/// yields one outer public input. The lowest index of a group is its least
/// significant limb.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputBinding {
    pub groups: Vec<Range<usize>>,
    pub base: LimbBase,
}

impl Default for PublicInputBinding {
    /// Two 256-limb binary groups over 512 inner public inputs.
    fn default() -> Self {
        Self {
            groups: vec![0..256, 256..512],
            base: LimbBase::Binary,
        }
    }
}

impl PublicInputBinding {
    pub fn num_limbs(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }

    pub fn num_outputs(&self) -> usize {
        self.groups.len()
    }

    /// Groups must be non-empty, disjoint and inside the inner public inputs.
    ///
    /// A `Pow63` group must fit in a BLS12-381 scalar without wrapping. A
    /// `Binary` group holds at most [`MAX_BINARY_LIMBS`] bit limbs; a full
    /// 256-bit group is reduced modulo the scalar field order, identically on
    /// the host and in the circuit.
    pub fn validate(&self, num_public_inputs: usize) -> Result<(), ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::Binding("no limb groups".into()));
        }
        let mut seen = vec![false; num_public_inputs];
        for g in &self.groups {
            if g.is_empty() {
                return Err(ConfigError::Binding(format!("empty group {g:?}")));
            }
            if g.end > num_public_inputs {
                return Err(ConfigError::Binding(format!(
                    "group {g:?} exceeds the {num_public_inputs} inner public inputs"
                )));
            }
            // 64-bit limbs: the top limb contributes 64 bits, the rest `log2`.
            let bits = (g.len() as u64 - 1) * u64::from(self.base.log2()) + 64;
            if self.base == LimbBase::Pow63 && bits > 254 {
                return Err(ConfigError::Binding(format!(
                    "group {g:?} spans {bits} bits, more than a scalar holds"
                )));
            }
            if self.base == LimbBase::Binary && g.len() > MAX_BINARY_LIMBS {
                return Err(ConfigError::Binding(format!(
                    "binary group {g:?} has more than {MAX_BINARY_LIMBS} limbs"
                )));
            }
            for i in g.clone() {
                if core::mem::replace(&mut seen[i], true) {
                    return Err(ConfigError::Binding(format!("limb {i} is bound twice")));
                }
            }
        }
        Ok(())
    }
}

/// Everything a deployment chooses: the binding and where keys live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperConfig {
    #[serde(default)]
    pub binding: PublicInputBinding,
    pub keystore_dir: PathBuf,
}

impl WrapperConfig {
    pub fn new(keystore_dir: impl Into<PathBuf>) -> Self {
        Self {
            binding: PublicInputBinding::default(),
            keystore_dir: keystore_dir.into(),
        }
    }

    pub fn with_binding(mut self, binding: PublicInputBinding) -> Self {
        self.binding = binding;
        self
    }
}
