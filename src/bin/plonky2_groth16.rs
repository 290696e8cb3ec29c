//! Command-line wrapper around the library.
//!
//! Fixture directories hold `common_circuit_data.json`,
//! `proof_with_public_inputs.json` and `verifier_only_circuit_data.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand_core::OsRng;
use tracing_subscriber::EnvFilter;

use plonky2_groth16::api;
use plonky2_groth16::config::{LimbBase, PublicInputBinding, WrapperConfig};
use plonky2_groth16::keystore::KeyStore;
use plonky2_groth16::types::{CommonCircuitData, ProofWithPublicInputs, VerifierOnlyCircuitData};
use plonky2_groth16::wire::{CompactProof, CompactVk};

const COMMON_FILE: &str = "common_circuit_data.json";
const PROOF_FILE: &str = "proof_with_public_inputs.json";
const VERIFIER_ONLY_FILE: &str = "verifier_only_circuit_data.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Wrap plonky2 proofs into BLS12-381 Groth16 proofs")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Verbose,
    Compact,
}

#[derive(clap::Args, Debug)]
struct BindingArgs {
    /// Limb groups as `start..end`, comma separated. Defaults to `0..256,256..512`.
    #[arg(long)]
    groups: Option<String>,
    /// Use base 2^63 accumulation instead of binary.
    #[arg(long, default_value_t = false)]
    pow63: bool,
}

impl BindingArgs {
    fn binding(&self) -> Result<PublicInputBinding> {
        let base = if self.pow63 { LimbBase::Pow63 } else { LimbBase::Binary };
        let groups = match &self.groups {
            None => PublicInputBinding::default().groups,
            Some(csv) => csv
                .split(',')
                .map(|g| {
                    let (a, b) = g
                        .trim()
                        .split_once("..")
                        .with_context(|| format!("group `{g}` is not `start..end`"))?;
                    Ok(a.parse::<usize>()?..b.parse::<usize>()?)
                })
                .collect::<Result<_>>()?,
        };
        Ok(PublicInputBinding { groups, base })
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate (or reuse) the Groth16 keys for a circuit descriptor.
    Setup {
        #[arg(long)]
        fixtures: PathBuf,
        #[arg(long)]
        keystore: PathBuf,
        #[command(flatten)]
        binding: BindingArgs,
    },
    /// Wrap an inner proof; writes `proof.json` and `vk.json` to `--out`.
    Prove {
        #[arg(long)]
        fixtures: PathBuf,
        #[arg(long)]
        keystore: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Verbose)]
        format: Format,
        #[command(flatten)]
        binding: BindingArgs,
    },
    /// Check a wrapped proof; prints `true` or `false`.
    Verify {
        #[arg(long)]
        proof: PathBuf,
        #[arg(long)]
        vk: PathBuf,
    },
}

fn read(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

fn load_fixtures(dir: &Path) -> Result<(CommonCircuitData, VerifierOnlyCircuitData)> {
    let common = CommonCircuitData::from_json(&read(dir, COMMON_FILE)?)?;
    let verifier_only = VerifierOnlyCircuitData::from_json(&read(dir, VERIFIER_ONLY_FILE)?)?;
    Ok((common, verifier_only))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Setup {
            fixtures,
            keystore,
            binding,
        } => {
            let (common, verifier_only) = load_fixtures(&fixtures)?;
            let binding = binding.binding()?;
            binding.validate(common.num_public_inputs)?;
            KeyStore::new(keystore).load_or_setup(&common, &verifier_only, &binding, &mut OsRng)?;
        }
        Cmd::Prove {
            fixtures,
            keystore,
            out,
            format,
            binding,
        } => {
            let (common, verifier_only) = load_fixtures(&fixtures)?;
            let proof = ProofWithPublicInputs::from_json(&read(&fixtures, PROOF_FILE)?)?;
            let config = WrapperConfig::new(keystore).with_binding(binding.binding()?);
            let wrapped = api::wrap(&common, &verifier_only, &proof, &config, &mut OsRng)?;
            let (proof_json, vk_json) = match format {
                Format::Verbose => wrapped.to_json()?,
                Format::Compact => (
                    serde_json::to_string(&CompactProof::encode(&wrapped.proof, &wrapped.public_inputs)?)?,
                    serde_json::to_string(&CompactVk::encode(&wrapped.vk)?)?,
                ),
            };
            fs::create_dir_all(&out)?;
            fs::write(out.join("proof.json"), proof_json)?;
            fs::write(out.join("vk.json"), vk_json)?;
            tracing::info!(out = %out.display(), "wrapped proof written");
        }
        Cmd::Verify { proof, vk } => {
            let proof = fs::read_to_string(&proof).with_context(|| format!("reading {}", proof.display()))?;
            let vk = fs::read_to_string(&vk).with_context(|| format!("reading {}", vk.display()))?;
            println!("{}", api::verify_proof(&proof, &vk));
        }
    }
    Ok(())
}
