//! Witness form of an inner proof.

use ark_r1cs_std::alloc::AllocVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::gadgets::fri::FriProofVar;
use crate::gadgets::gl_ext::GlExtVar;
use crate::gadgets::poseidon_bls::HashOutVar;
use crate::gl_u64::GlExt;
use crate::types::hash::MerkleCap;
use crate::types::proof::{OpeningSet, Proof};
use crate::Fr;

#[derive(Clone, Debug)]
pub struct OpeningSetVar {
    pub constants: Vec<GlExtVar>,
    pub plonk_sigmas: Vec<GlExtVar>,
    pub wires: Vec<GlExtVar>,
    pub plonk_zs: Vec<GlExtVar>,
    pub plonk_zs_next: Vec<GlExtVar>,
    pub partial_products: Vec<GlExtVar>,
    pub quotient_polys: Vec<GlExtVar>,
}

impl OpeningSetVar {
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, o: &OpeningSet) -> Result<Self, SynthesisError> {
        let alloc = |v: &[GlExt]| -> Result<Vec<GlExtVar>, SynthesisError> {
            v.iter().map(|e| GlExtVar::new_witness(cs.clone(), *e)).collect()
        };
        Ok(Self {
            constants: alloc(&o.constants)?,
            plonk_sigmas: alloc(&o.plonk_sigmas)?,
            wires: alloc(&o.wires)?,
            plonk_zs: alloc(&o.plonk_zs)?,
            plonk_zs_next: alloc(&o.plonk_zs_next)?,
            partial_products: alloc(&o.partial_products)?,
            quotient_polys: alloc(&o.quotient_polys)?,
        })
    }

    /// Openings at ζ then at g·ζ, in FRI batch order.
    pub fn to_fri_openings(&self) -> Vec<Vec<GlExtVar>> {
        let zeta = [
            self.constants.as_slice(),
            &self.plonk_sigmas,
            &self.wires,
            &self.plonk_zs,
            &self.partial_products,
            &self.quotient_polys,
        ]
        .concat();
        vec![zeta, self.plonk_zs_next.clone()]
    }
}

#[derive(Clone, Debug)]
pub struct ProofVar {
    pub wires_cap: Vec<HashOutVar>,
    pub plonk_zs_partial_products_cap: Vec<HashOutVar>,
    pub quotient_polys_cap: Vec<HashOutVar>,
    pub openings: OpeningSetVar,
    pub opening_proof: FriProofVar,
}

fn alloc_cap(cs: &ConstraintSystemRef<Fr>, cap: &MerkleCap) -> Result<Vec<HashOutVar>, SynthesisError> {
    cap.0
        .iter()
        .map(|h| HashOutVar::new_witness(cs.clone(), || Ok(h.0)))
        .collect()
}

impl ProofVar {
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, p: &Proof) -> Result<Self, SynthesisError> {
        Ok(Self {
            wires_cap: alloc_cap(&cs, &p.wires_cap)?,
            plonk_zs_partial_products_cap: alloc_cap(&cs, &p.plonk_zs_partial_products_cap)?,
            quotient_polys_cap: alloc_cap(&cs, &p.quotient_polys_cap)?,
            openings: OpeningSetVar::new_witness(cs.clone(), &p.openings)?,
            opening_proof: FriProofVar::new_witness(cs, &p.opening_proof)?,
        })
    }
}
