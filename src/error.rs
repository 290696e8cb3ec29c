use ark_relations::r1cs::SynthesisError;
use ark_serialize::SerializationError;
use thiserror::Error;

/// Problems with the descriptor or fixture documents. Always fatal; raised
/// before any constraint depending on the proof is emitted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed fixture json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown gate identifier `{0}`")]
    UnknownGate(String),
    #[error("gate `{gate}`: {reason}")]
    MalformedGate { gate: String, reason: String },
    #[error("{what}: expected length {expected}, got {got}")]
    Length {
        what: String,
        expected: usize,
        got: usize,
    },
    #[error("{what}: value {value} is not a canonical Goldilocks element")]
    NonCanonical { what: String, value: u64 },
    #[error("malformed hash digest `{0}`")]
    BadDigest(String),
    #[error("lookup arguments are not supported")]
    LookupsUnsupported,
    #[error("public input binding: {0}")]
    Binding(String),
    #[error("unsupported parameter: {0}")]
    Unsupported(String),
}

/// Encoding problems in the outer proof wire formats.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{what}: expected {expected} bytes, got {got}")]
    Length {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{0} is not a valid curve point")]
    InvalidPoint(&'static str),
    #[error("serialization: {0}")]
    Serialization(#[from] SerializationError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("constraint synthesis: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("key serialization: {0}")]
    Serialization(#[from] SerializationError),
    #[error("key store io: {0}")]
    Io(#[from] std::io::Error),
    /// The witness does not satisfy the verifier circuit.
    #[error("inner proof rejected")]
    Rejected,
}

pub type Result<T> = core::result::Result<T, Error>;
