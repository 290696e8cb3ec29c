//! On-disk Groth16 artifacts for one wrapped circuit family.
//!
//! Layout under the store directory:
//!
//! | file                   | contents                                         |
//! |------------------------|--------------------------------------------------|
//! | `circuit_groth16.bin`  | SHA-256 fingerprint of descriptor and binding    |
//! | `pk_groth16.bin`       | proving key                                      |
//! | `vk_groth16.bin`       | verifying key                                    |
//! | `proof_groth16.bin`    | last proof                                       |
//! | `witness_groth16.bin`  | outer public inputs of the last proof            |
//!
//! All keys and proofs use the compressed `ark-serialize` encoding. A present
//! verifying key means setup already ran; a fingerprint mismatch forces it
//! again.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Compress, Validate};
use ark_std::rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::config::PublicInputBinding;
use crate::error::{ConfigError, Result};
use crate::outer::{self, OuterPk, OuterProof, OuterVk};
use crate::types::{CommonCircuitData, VerifierOnlyCircuitData};
use crate::verifier::WrapperCircuit;
use crate::Fr;

pub const CIRCUIT_FILE: &str = "circuit_groth16.bin";
pub const PK_FILE: &str = "pk_groth16.bin";
pub const VK_FILE: &str = "vk_groth16.bin";
pub const PROOF_FILE: &str = "proof_groth16.bin";
pub const WITNESS_FILE: &str = "witness_groth16.bin";

/// Hashes everything the circuit topology depends on.
pub fn circuit_fingerprint(
    common: &CommonCircuitData,
    verifier_only: &VerifierOnlyCircuitData,
    binding: &PublicInputBinding,
) -> std::result::Result<[u8; 32], ConfigError> {
    let mut h = Sha256::new();
    h.update(common.to_json()?.as_bytes());
    h.update(serde_json::to_vec(verifier_only)?);
    h.update(serde_json::to_vec(binding)?);
    Ok(h.finalize().into())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn has_verifying_key(&self) -> bool {
        self.path(VK_FILE).is_file()
    }

    fn write<T: CanonicalSerialize>(&self, file: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut w = BufWriter::new(File::create(self.path(file))?);
        value.serialize_with_mode(&mut w, Compress::Yes)?;
        w.flush()?;
        Ok(())
    }

    fn read<T: CanonicalDeserialize>(&self, file: &str) -> Result<T> {
        let r = BufReader::new(File::open(self.path(file))?);
        Ok(T::deserialize_with_mode(r, Compress::Yes, Validate::Yes)?)
    }

    pub fn read_fingerprint(&self) -> Result<Option<[u8; 32]>> {
        let path = self.path(CIRCUIT_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(<[u8; 32]>::try_from(fs::read(path)?.as_slice()).ok())
    }

    pub fn write_keys(&self, fingerprint: &[u8; 32], pk: &OuterPk, vk: &OuterVk) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(CIRCUIT_FILE), fingerprint)?;
        self.write(PK_FILE, pk)?;
        self.write(VK_FILE, vk)
    }

    pub fn read_proving_key(&self) -> Result<OuterPk> {
        self.read(PK_FILE)
    }

    pub fn read_verifying_key(&self) -> Result<OuterVk> {
        self.read(VK_FILE)
    }

    pub fn write_proof(&self, proof: &OuterProof, public_inputs: &[Fr]) -> Result<()> {
        self.write(PROOF_FILE, proof)?;
        self.write(WITNESS_FILE, &public_inputs.to_vec())
    }

    pub fn read_proof(&self) -> Result<(OuterProof, Vec<Fr>)> {
        Ok((self.read(PROOF_FILE)?, self.read(WITNESS_FILE)?))
    }

    /// Loads the keys when the stored fingerprint matches, otherwise runs
    /// setup and persists the result.
    pub fn load_or_setup(
        &self,
        common: &CommonCircuitData,
        verifier_only: &VerifierOnlyCircuitData,
        binding: &PublicInputBinding,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<(OuterPk, OuterVk)> {
        let fingerprint = circuit_fingerprint(common, verifier_only, binding)?;
        if self.has_verifying_key() && self.read_fingerprint()? == Some(fingerprint) {
            match self.read_proving_key() {
                Ok(pk) => {
                    tracing::info!(dir = %self.dir.display(), "reusing stored Groth16 keys");
                    let vk = pk.vk.clone();
                    return Ok((pk, vk));
                }
                Err(e) => tracing::warn!(error = %e, "stored proving key unreadable, rerunning setup"),
            }
        } else if self.has_verifying_key() {
            tracing::warn!(dir = %self.dir.display(), "stored keys belong to another circuit, rerunning setup");
        }
        let circuit = WrapperCircuit::for_setup(common.clone(), verifier_only.clone(), binding.clone())?;
        let (pk, vk) = outer::setup(circuit, rng)?;
        self.write_keys(&fingerprint, &pk, &vk)?;
        Ok((pk, vk))
    }
}
