//! JSON wire formats of the outer proof and verifying key.
//!
//! *Verbose*: uncompressed big-endian coordinates as 96-character hex
//! strings. G1 points are `[x, y]`; G2 points are `[[x.c0, x.c1], [y.c0,
//! y.c1]]`. The point at infinity carries flag `0x40` in its first byte.
//! Public inputs are 32-byte big-endian hex.
//!
//! *Compact*: one x coordinate per point in little-endian hex, the top bit of
//! the last (most significant) byte set when `y` is odd. G2 points take the
//! parity of `y.c0` and store `x.c0` and `x.c1` separately, the flag on
//! `x.c1`. Public inputs are 32-byte little-endian hex. An all-zero
//! coordinate is the point at infinity.
//!
//! Both variants decode to the same [`OuterProof`] and [`OuterVk`].

use ark_bls12_381::{Fq, Fq2, G1Affine, G2Affine};
use ark_ec::short_weierstrass::{Affine, SWCurveConfig};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};

use crate::error::WireError;
use crate::outer::{OuterProof, OuterVk};
use crate::Fr;

const FQ_BYTES: usize = 48;
const FR_BYTES: usize = 32;
const ODD_FLAG: u8 = 0x80;
const INFINITY_FLAG: u8 = 0x40;
const FLAG_MASK: u8 = 0xe0;

fn decode_exact(what: &'static str, s: &str, len: usize) -> Result<Vec<u8>, WireError> {
    let bytes = hex::decode(s)?;
    if bytes.len() != len {
        return Err(WireError::Length {
            what,
            expected: len,
            got: bytes.len(),
        });
    }
    Ok(bytes)
}

fn fq_le(x: &Fq) -> Result<[u8; FQ_BYTES], WireError> {
    let mut out = [0u8; FQ_BYTES];
    x.serialize_compressed(&mut out[..])?;
    Ok(out)
}

fn fq_from_le(bytes: &[u8]) -> Result<Fq, WireError> {
    Ok(Fq::deserialize_compressed(bytes)?)
}

fn is_odd(x: &Fq) -> bool {
    x.into_bigint().is_odd()
}

fn checked<P: SWCurveConfig>(what: &'static str, p: Affine<P>) -> Result<Affine<P>, WireError> {
    if p.is_zero() || p.is_in_correct_subgroup_assuming_on_curve() {
        Ok(p)
    } else {
        Err(WireError::InvalidPoint(what))
    }
}

// ---- verbose ----

fn fq_to_be_hex(x: &Fq) -> Result<String, WireError> {
    let mut b = fq_le(x)?;
    b.reverse();
    Ok(hex::encode(b))
}

/// Returns the coordinate and whether the infinity flag was set.
fn fq_from_be_hex(what: &'static str, s: &str, flagged: bool) -> Result<(Fq, bool), WireError> {
    let mut b = decode_exact(what, s, FQ_BYTES)?;
    let mut infinity = false;
    if flagged {
        match b[0] & FLAG_MASK {
            0 => {}
            INFINITY_FLAG => infinity = true,
            _ => return Err(WireError::InvalidPoint(what)),
        }
        b[0] &= !FLAG_MASK;
    }
    b.reverse();
    Ok((fq_from_le(&b)?, infinity))
}

fn set_infinity_flag(s: &mut String) -> Result<(), WireError> {
    let mut b = hex::decode(&*s)?;
    b[0] |= INFINITY_FLAG;
    *s = hex::encode(b);
    Ok(())
}

pub fn g1_to_verbose(p: &G1Affine) -> Result<[String; 2], WireError> {
    let (x, y) = p.xy().unwrap_or((Fq::zero(), Fq::zero()));
    let mut out = [fq_to_be_hex(&x)?, fq_to_be_hex(&y)?];
    if p.is_zero() {
        set_infinity_flag(&mut out[0])?;
    }
    Ok(out)
}

pub fn g1_from_verbose(what: &'static str, v: &[String; 2]) -> Result<G1Affine, WireError> {
    let (x, infinity) = fq_from_be_hex(what, &v[0], true)?;
    if infinity {
        return Ok(G1Affine::zero());
    }
    let (y, _) = fq_from_be_hex(what, &v[1], false)?;
    let p = G1Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err(WireError::InvalidPoint(what));
    }
    checked(what, p)
}

pub fn g2_to_verbose(p: &G2Affine) -> Result<[[String; 2]; 2], WireError> {
    let (x, y) = p.xy().unwrap_or((Fq2::zero(), Fq2::zero()));
    let mut out = [
        [fq_to_be_hex(&x.c0)?, fq_to_be_hex(&x.c1)?],
        [fq_to_be_hex(&y.c0)?, fq_to_be_hex(&y.c1)?],
    ];
    if p.is_zero() {
        set_infinity_flag(&mut out[0][1])?;
    }
    Ok(out)
}

pub fn g2_from_verbose(what: &'static str, v: &[[String; 2]; 2]) -> Result<G2Affine, WireError> {
    // The flag lives on the leading coordinate of the raw encoding, x.c1.
    let (x_c1, infinity) = fq_from_be_hex(what, &v[0][1], true)?;
    if infinity {
        return Ok(G2Affine::zero());
    }
    let (x_c0, _) = fq_from_be_hex(what, &v[0][0], false)?;
    let (y_c0, _) = fq_from_be_hex(what, &v[1][0], false)?;
    let (y_c1, _) = fq_from_be_hex(what, &v[1][1], false)?;
    let p = G2Affine::new_unchecked(Fq2::new(x_c0, x_c1), Fq2::new(y_c0, y_c1));
    if !p.is_on_curve() {
        return Err(WireError::InvalidPoint(what));
    }
    checked(what, p)
}

fn fr_to_hex(x: &Fr, big_endian: bool) -> String {
    let mut b = x.into_bigint().to_bytes_le();
    if big_endian {
        b.reverse();
    }
    hex::encode(b)
}

fn fr_from_hex(s: &str, big_endian: bool) -> Result<Fr, WireError> {
    let mut b = decode_exact("public input", s, FR_BYTES)?;
    if big_endian {
        b.reverse();
    }
    Ok(Fr::deserialize_compressed(&b[..])?)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerboseProof {
    pub pi_a: [String; 2],
    pub pi_b: [[String; 2]; 2],
    pub pi_c: [String; 2],
    pub public_inputs: Vec<String>,
}

impl VerboseProof {
    pub fn encode(proof: &OuterProof, public_inputs: &[Fr]) -> Result<Self, WireError> {
        Ok(Self {
            pi_a: g1_to_verbose(&proof.a)?,
            pi_b: g2_to_verbose(&proof.b)?,
            pi_c: g1_to_verbose(&proof.c)?,
            public_inputs: public_inputs.iter().map(|x| fr_to_hex(x, true)).collect(),
        })
    }

    pub fn decode(&self) -> Result<(OuterProof, Vec<Fr>), WireError> {
        let proof = OuterProof {
            a: g1_from_verbose("pi_a", &self.pi_a)?,
            b: g2_from_verbose("pi_b", &self.pi_b)?,
            c: g1_from_verbose("pi_c", &self.pi_c)?,
        };
        let inputs = self
            .public_inputs
            .iter()
            .map(|s| fr_from_hex(s, true))
            .collect::<Result<_, _>>()?;
        Ok((proof, inputs))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerboseVk {
    pub alpha_g1: [String; 2],
    pub beta_g2: [[String; 2]; 2],
    pub gamma_g2: [[String; 2]; 2],
    pub delta_g2: [[String; 2]; 2],
    pub gamma_abc_g1: Vec<[String; 2]>,
}

impl VerboseVk {
    pub fn encode(vk: &OuterVk) -> Result<Self, WireError> {
        Ok(Self {
            alpha_g1: g1_to_verbose(&vk.alpha_g1)?,
            beta_g2: g2_to_verbose(&vk.beta_g2)?,
            gamma_g2: g2_to_verbose(&vk.gamma_g2)?,
            delta_g2: g2_to_verbose(&vk.delta_g2)?,
            gamma_abc_g1: vk.gamma_abc_g1.iter().map(g1_to_verbose).collect::<Result<_, _>>()?,
        })
    }

    pub fn decode(&self) -> Result<OuterVk, WireError> {
        Ok(OuterVk {
            alpha_g1: g1_from_verbose("alpha_g1", &self.alpha_g1)?,
            beta_g2: g2_from_verbose("beta_g2", &self.beta_g2)?,
            gamma_g2: g2_from_verbose("gamma_g2", &self.gamma_g2)?,
            delta_g2: g2_from_verbose("delta_g2", &self.delta_g2)?,
            gamma_abc_g1: self
                .gamma_abc_g1
                .iter()
                .map(|p| g1_from_verbose("gamma_abc_g1", p))
                .collect::<Result<_, _>>()?,
        })
    }
}

// ---- compact ----

fn x_to_compact(x: &Fq, odd: bool) -> Result<String, WireError> {
    let mut b = fq_le(x)?;
    if odd {
        b[FQ_BYTES - 1] |= ODD_FLAG;
    }
    Ok(hex::encode(b))
}

/// Returns the coordinate and its parity flag.
fn x_from_compact(what: &'static str, s: &str) -> Result<(Fq, bool), WireError> {
    let mut b = decode_exact(what, s, FQ_BYTES)?;
    let odd = match b[FQ_BYTES - 1] & FLAG_MASK {
        0 => false,
        ODD_FLAG => true,
        _ => return Err(WireError::InvalidPoint(what)),
    };
    b[FQ_BYTES - 1] &= !ODD_FLAG;
    Ok((fq_from_le(&b)?, odd))
}

pub fn g1_to_compact(p: &G1Affine) -> Result<String, WireError> {
    match p.xy() {
        Some((x, y)) => x_to_compact(&x, is_odd(&y)),
        None => x_to_compact(&Fq::zero(), false),
    }
}

pub fn g1_from_compact(what: &'static str, s: &str) -> Result<G1Affine, WireError> {
    let (x, odd) = x_from_compact(what, s)?;
    if x.is_zero() && !odd {
        return Ok(G1Affine::zero());
    }
    let p = G1Affine::get_point_from_x_unchecked(x, true).ok_or(WireError::InvalidPoint(what))?;
    let p = match p.xy() {
        Some((_, y)) if is_odd(&y) != odd => -p,
        _ => p,
    };
    checked(what, p)
}

pub fn g2_to_compact(p: &G2Affine) -> Result<[String; 2], WireError> {
    match p.xy() {
        Some((x, y)) => Ok([x_to_compact(&x.c0, false)?, x_to_compact(&x.c1, is_odd(&y.c0))?]),
        None => Ok([x_to_compact(&Fq::zero(), false)?, x_to_compact(&Fq::zero(), false)?]),
    }
}

pub fn g2_from_compact(what: &'static str, a0: &str, a1: &str) -> Result<G2Affine, WireError> {
    let (c0, flag) = x_from_compact(what, a0)?;
    if flag {
        return Err(WireError::InvalidPoint(what));
    }
    let (c1, odd) = x_from_compact(what, a1)?;
    let x = Fq2::new(c0, c1);
    if x.is_zero() && !odd {
        return Ok(G2Affine::zero());
    }
    let p = G2Affine::get_point_from_x_unchecked(x, true).ok_or(WireError::InvalidPoint(what))?;
    let p = match p.xy() {
        Some((_, y)) if is_odd(&y.c0) != odd => -p,
        _ => p,
    };
    checked(what, p)
}

fn g2_pair_to_compact(p: &G2Affine) -> Result<String, WireError> {
    let [a0, a1] = g2_to_compact(p)?;
    Ok(a0 + &a1)
}

fn g2_pair_from_compact(what: &'static str, s: &str) -> Result<G2Affine, WireError> {
    if s.len() != 4 * FQ_BYTES || !s.is_ascii() {
        return Err(WireError::Length {
            what,
            expected: 4 * FQ_BYTES,
            got: s.len(),
        });
    }
    let (a0, a1) = s.split_at(2 * FQ_BYTES);
    g2_from_compact(what, a0, a1)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactProof {
    pub pi_a: String,
    pub pi_b_a0: String,
    pub pi_b_a1: String,
    pub pi_c: String,
    pub public_inputs: Vec<String>,
}

impl CompactProof {
    pub fn encode(proof: &OuterProof, public_inputs: &[Fr]) -> Result<Self, WireError> {
        let [pi_b_a0, pi_b_a1] = g2_to_compact(&proof.b)?;
        Ok(Self {
            pi_a: g1_to_compact(&proof.a)?,
            pi_b_a0,
            pi_b_a1,
            pi_c: g1_to_compact(&proof.c)?,
            public_inputs: public_inputs.iter().map(|x| fr_to_hex(x, false)).collect(),
        })
    }

    pub fn decode(&self) -> Result<(OuterProof, Vec<Fr>), WireError> {
        let proof = OuterProof {
            a: g1_from_compact("pi_a", &self.pi_a)?,
            b: g2_from_compact("pi_b", &self.pi_b_a0, &self.pi_b_a1)?,
            c: g1_from_compact("pi_c", &self.pi_c)?,
        };
        let inputs = self
            .public_inputs
            .iter()
            .map(|s| fr_from_hex(s, false))
            .collect::<Result<_, _>>()?;
        Ok((proof, inputs))
    }
}

/// G2 entries are `x.c0 ‖ x.c1`, 192 hex characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactVk {
    pub alpha_g1: String,
    pub beta_g2: String,
    pub gamma_g2: String,
    pub delta_g2: String,
    pub g1_k: Vec<String>,
}

impl CompactVk {
    pub fn encode(vk: &OuterVk) -> Result<Self, WireError> {
        Ok(Self {
            alpha_g1: g1_to_compact(&vk.alpha_g1)?,
            beta_g2: g2_pair_to_compact(&vk.beta_g2)?,
            gamma_g2: g2_pair_to_compact(&vk.gamma_g2)?,
            delta_g2: g2_pair_to_compact(&vk.delta_g2)?,
            g1_k: vk.gamma_abc_g1.iter().map(g1_to_compact).collect::<Result<_, _>>()?,
        })
    }

    pub fn decode(&self) -> Result<OuterVk, WireError> {
        Ok(OuterVk {
            alpha_g1: g1_from_compact("alpha_g1", &self.alpha_g1)?,
            beta_g2: g2_pair_from_compact("beta_g2", &self.beta_g2)?,
            gamma_g2: g2_pair_from_compact("gamma_g2", &self.gamma_g2)?,
            delta_g2: g2_pair_from_compact("delta_g2", &self.delta_g2)?,
            gamma_abc_g1: self
                .g1_k
                .iter()
                .map(|k| g1_from_compact("g1_k", k))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// A proof in either variant; the field names tell them apart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireProof {
    Verbose(VerboseProof),
    Compact(CompactProof),
}

impl WireProof {
    pub fn from_json(s: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn decode(&self) -> Result<(OuterProof, Vec<Fr>), WireError> {
        match self {
            WireProof::Verbose(p) => p.decode(),
            WireProof::Compact(p) => p.decode(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireVk {
    Verbose(VerboseVk),
    Compact(CompactVk),
}

impl WireVk {
    pub fn from_json(s: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn decode(&self) -> Result<OuterVk, WireError> {
        match self {
            WireVk::Verbose(v) => v.decode(),
            WireVk::Compact(v) => v.decode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::CurveGroup;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use ark_std::UniformRand;

    fn points(seed: u64) -> (G1Affine, G2Affine) {
        let mut rng = StdRng::seed_from_u64(seed);
        let g1 = (G1Affine::generator() * Fr::rand(&mut rng)).into_affine();
        let g2 = (G2Affine::generator() * Fr::rand(&mut rng)).into_affine();
        (g1, g2)
    }

    #[test]
    fn compact_points_keep_their_sign() {
        for seed in 0..8 {
            let (g1, g2) = points(seed);
            for p in [g1, -g1] {
                assert_eq!(g1_from_compact("p", &g1_to_compact(&p).unwrap()).unwrap(), p);
            }
            for p in [g2, -g2] {
                let [a0, a1] = g2_to_compact(&p).unwrap();
                assert_eq!(g2_from_compact("p", &a0, &a1).unwrap(), p);
            }
        }
    }

    #[test]
    fn verbose_points_and_infinity() {
        let (g1, g2) = points(42);
        assert_eq!(g1_from_verbose("p", &g1_to_verbose(&g1).unwrap()).unwrap(), g1);
        assert_eq!(g2_from_verbose("p", &g2_to_verbose(&g2).unwrap()).unwrap(), g2);

        let inf = g1_to_verbose(&G1Affine::zero()).unwrap();
        assert!(inf[0].starts_with("40"));
        assert!(g1_from_verbose("p", &inf).unwrap().is_zero());
        assert!(g2_from_verbose("p", &g2_to_verbose(&G2Affine::zero()).unwrap())
            .unwrap()
            .is_zero());
        assert!(g1_from_compact("p", &g1_to_compact(&G1Affine::zero()).unwrap())
            .unwrap()
            .is_zero());
    }

    #[test]
    fn generator_encodings_are_big_and_little_endian() {
        let g = G1Affine::generator();
        let v = g1_to_verbose(&g).unwrap();
        // x of the BLS12-381 G1 generator.
        assert!(v[0].starts_with("17f1d3a73197d7942695638c4fa9ac0fc3688c4f9774b905a14e3a3f171bac58"));
        let c = g1_to_compact(&g).unwrap();
        let mut le = hex::decode(&v[0]).unwrap();
        le.reverse();
        let mut flagged = le.clone();
        flagged[FQ_BYTES - 1] |= if is_odd(&g.y) { ODD_FLAG } else { 0 };
        assert_eq!(c, hex::encode(flagged));
    }

    #[test]
    fn malformed_inputs_are_wire_errors() {
        assert!(matches!(g1_from_compact("p", "00"), Err(WireError::Length { .. })));
        assert!(matches!(g1_from_compact("p", "zz"), Err(WireError::Hex(_))));
        let (g1, _) = points(1);
        let mut v = g1_to_verbose(&g1).unwrap();
        v[1] = v[0].clone();
        assert!(matches!(g1_from_verbose("pi_a", &v), Err(WireError::InvalidPoint("pi_a"))));
        assert!(WireProof::from_json("{\"pi_a\": 1}").is_err());
    }

    #[test]
    fn both_variants_decode_to_the_same_proof() {
        let (a, b) = points(3);
        let (c, _) = points(4);
        let proof = OuterProof { a, b, c };
        let inputs = vec![Fr::from(7u64), -Fr::from(1u64)];

        let verbose = serde_json::to_string(&VerboseProof::encode(&proof, &inputs).unwrap()).unwrap();
        let compact = serde_json::to_string(&CompactProof::encode(&proof, &inputs).unwrap()).unwrap();
        let v = WireProof::from_json(&verbose).unwrap();
        let k = WireProof::from_json(&compact).unwrap();
        assert!(matches!(v, WireProof::Verbose(_)));
        assert!(matches!(k, WireProof::Compact(_)));
        assert_eq!(v.decode().unwrap(), (proof.clone(), inputs.clone()));
        assert_eq!(k.decode().unwrap(), (proof, inputs));
    }
}
