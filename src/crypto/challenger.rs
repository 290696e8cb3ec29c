//! Host Fiat-Shamir challenger over Goldilocks Poseidon.
//!
//! Same duplex rules as the in-circuit challenger; used as its reference.

use super::goldilocks_constants::{RATE, WIDTH};
use super::poseidon_bls12_381;
use super::poseidon_goldilocks::{permute, GlState};
use crate::gl_u64::GlExt;
use crate::Fr;

#[derive(Clone, Debug, Default)]
pub struct Challenger {
    state: GlState,
    input_buffer: Vec<u64>,
    output_buffer: Vec<u64>,
}

impl Challenger {
    pub fn new() -> Self {
        Self {
            state: [0; WIDTH],
            input_buffer: Vec::with_capacity(RATE),
            output_buffer: Vec::with_capacity(RATE),
        }
    }

    pub fn observe_element(&mut self, e: u64) {
        self.output_buffer.clear();
        self.input_buffer.push(e);
        if self.input_buffer.len() == RATE {
            self.duplex();
        }
    }

    pub fn observe_elements(&mut self, es: &[u64]) {
        for &e in es {
            self.observe_element(e);
        }
    }

    pub fn observe_hash(&mut self, h: Fr) {
        self.observe_elements(&poseidon_bls12_381::to_vec(h));
    }

    pub fn get_challenge(&mut self) -> u64 {
        if !self.input_buffer.is_empty() || self.output_buffer.is_empty() {
            self.duplex();
        }
        self.output_buffer
            .pop()
            .expect("duplex leaves RATE outputs buffered")
    }

    pub fn get_extension_challenge(&mut self) -> GlExt {
        let c0 = self.get_challenge();
        let c1 = self.get_challenge();
        [c0, c1]
    }

    fn duplex(&mut self) {
        for (s, x) in self.state.iter_mut().zip(self.input_buffer.drain(..)) {
            *s = x;
        }
        self.state = permute(self.state);
        self.output_buffer.clear();
        self.output_buffer.extend_from_slice(&self.state[..RATE]);
    }
}
