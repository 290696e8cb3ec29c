//! In-circuit Fiat-Shamir challenger.
//!
//! Duplex sponge over Goldilocks Poseidon (width 12, rate 8). Observing
//! clears pending outputs and absorbs once eight inputs are buffered;
//! squeezing duplexes when inputs are pending or outputs are exhausted and
//! pops from the end of the rate. Every squeezed element is canonical, so
//! challenges can be decomposed into bits directly.

use ark_relations::r1cs::SynthesisError;

use crate::crypto::goldilocks_constants::RATE;
use crate::gadgets::gl::GlVar;
use crate::gadgets::gl_ext::GlExtVar;
use crate::gadgets::poseidon_bls::{to_vec, HashOutVar};
use crate::gadgets::poseidon_gl::{permute, GlStateVar};

#[derive(Clone, Debug)]
pub struct ChallengerVar {
    state: GlStateVar,
    input_buffer: Vec<GlVar>,
    output_buffer: Vec<GlVar>,
}

impl Default for ChallengerVar {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengerVar {
    pub fn new() -> Self {
        Self {
            state: core::array::from_fn(|_| GlVar::zero()),
            input_buffer: Vec::with_capacity(RATE),
            output_buffer: Vec::with_capacity(RATE),
        }
    }

    pub fn observe_element(&mut self, e: &GlVar) -> Result<(), SynthesisError> {
        self.output_buffer.clear();
        self.input_buffer.push(e.clone());
        if self.input_buffer.len() == RATE {
            self.duplex()?;
        }
        Ok(())
    }

    pub fn observe_elements(&mut self, es: &[GlVar]) -> Result<(), SynthesisError> {
        es.iter().try_for_each(|e| self.observe_element(e))
    }

    pub fn observe_extension_elements(&mut self, es: &[GlExtVar]) -> Result<(), SynthesisError> {
        for e in es {
            self.observe_elements(&e.0)?;
        }
        Ok(())
    }

    /// Observes a Merkle digest through its Goldilocks decomposition.
    pub fn observe_hash(&mut self, h: &HashOutVar) -> Result<(), SynthesisError> {
        self.observe_elements(&to_vec(h)?)
    }

    pub fn observe_cap(&mut self, cap: &[HashOutVar]) -> Result<(), SynthesisError> {
        cap.iter().try_for_each(|h| self.observe_hash(h))
    }

    pub fn get_challenge(&mut self) -> Result<GlVar, SynthesisError> {
        if !self.input_buffer.is_empty() || self.output_buffer.is_empty() {
            self.duplex()?;
        }
        self.output_buffer.pop().ok_or(SynthesisError::Unsatisfiable)
    }

    pub fn get_n_challenges(&mut self, n: usize) -> Result<Vec<GlVar>, SynthesisError> {
        (0..n).map(|_| self.get_challenge()).collect()
    }

    pub fn get_extension_challenge(&mut self) -> Result<GlExtVar, SynthesisError> {
        let c0 = self.get_challenge()?;
        let c1 = self.get_challenge()?;
        Ok(GlExtVar([c0, c1]))
    }

    fn duplex(&mut self) -> Result<(), SynthesisError> {
        debug_assert!(self.input_buffer.len() <= RATE);
        for (s, x) in self.state.iter_mut().zip(self.input_buffer.drain(..)) {
            *s = x;
        }
        self.state = permute(&self.state)?;
        self.output_buffer.clear();
        self.output_buffer.extend_from_slice(&self.state[..RATE]);
        Ok(())
    }
}
