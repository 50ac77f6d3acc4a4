//! The sign flipper network backing `Neg` nodes.

use crate::encoder::Encoder;
use crate::error::StickError;
use crate::network::{Channel, Module};
use crate::neuron::{NeuronHeader, NeuronParams};

use super::{Weights, T_SYN};

/// Negates a signed interval-coded value by swapping the roles of the plus
/// and minus neurons: the output plus emits with the timing of the input
/// minus, and vice versa.
#[derive(Debug)]
pub struct SignFlipperNetwork {
    module: Module,
    input: NeuronHeader,
    out: NeuronHeader,
}

impl SignFlipperNetwork {
    pub fn build(
        name: impl Into<String>,
        encoder: &Encoder,
        params: NeuronParams,
    ) -> Result<Self, StickError> {
        let mut module = Module::new(name);
        let w = Weights::new(&params, encoder);

        let in_plus = module.add_neuron("in_plus", params)?;
        let in_minus = module.add_neuron("in_minus", params)?;
        let out_plus = module.add_neuron("out_plus", params)?;
        let out_minus = module.add_neuron("out_minus", params)?;

        module.connect(&in_plus, &out_minus, Channel::V, w.we, T_SYN)?;
        module.connect(&in_minus, &out_plus, Channel::V, w.we, T_SYN)?;

        Ok(SignFlipperNetwork {
            module,
            input: NeuronHeader::new(in_plus, in_minus),
            out: NeuronHeader::new(out_plus, out_minus),
        })
    }

    pub fn input(&self) -> &NeuronHeader {
        &self.input
    }

    pub fn out(&self) -> &NeuronHeader {
        &self.out
    }

    pub fn into_module(self) -> Module {
        self.module
    }
}
