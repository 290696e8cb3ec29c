//! PLONK side of the wrapped verifier: gate evaluation, the vanishing
//! identity and the in-circuit form of the proof.

pub mod gates;
pub mod proof_var;
pub mod vanishing;
