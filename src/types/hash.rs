use core::fmt;
use core::str::FromStr;

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::Fr;

/// Digest of the Merkle hasher: one BLS12-381 scalar.
///
/// Serialized as a decimal string. Decimal or `0x`-prefixed big-endian hex
/// strings are accepted on input; values at or above the modulus are refused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashOut(pub Fr);

impl fmt::Debug for HashOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashOut({})", self)
    }
}

impl fmt::Display for HashOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BigUint::from(self.0.into_bigint()))
    }
}

impl FromStr for HashOut {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let v = match s.strip_prefix("0x") {
            Some(h) => BigUint::parse_bytes(h.as_bytes(), 16),
            None => BigUint::parse_bytes(s.as_bytes(), 10),
        }
        .ok_or_else(|| s.to_string())?;
        let modulus = BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le());
        if v >= modulus {
            return Err(s.to_string());
        }
        Ok(HashOut(Fr::from(v)))
    }
}

impl Serialize for HashOut {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HashOut {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse()
            .map_err(|bad| de::Error::custom(format!("malformed hash digest `{bad}`")))
    }
}

/// Top `2^cap_height` nodes of a Merkle tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerkleCap(pub Vec<HashOut>);

impl MerkleCap {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub siblings: Vec<HashOut>,
}
