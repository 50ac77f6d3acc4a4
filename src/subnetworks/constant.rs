//! A memory-style network replaying a signed constant on demand.

use crate::encoder::Encoder;
use crate::error::StickError;
use crate::network::{Channel, Module};
use crate::neuron::{NeuronHandle, NeuronHeader, NeuronParams};

use super::{Weights, T_SYN};

/// Stores one signed normalized constant in its synapse delays.
///
/// A single spike on the `recall` neuron makes the output header replay the
/// constant: two spikes separated by `Tmin + |value| * Tcod` on the plus or
/// minus side depending on the sign. Unlike [`super::InjectorNetwork`],
/// which receives its value from external triggers at run time, the value
/// here is baked into the network at build time.
#[derive(Debug)]
pub struct SignedConstantNetwork {
    module: Module,
    recall: NeuronHandle,
    out: NeuronHeader,
}

impl SignedConstantNetwork {
    /// Build a constant network for `value` in `[-1, 1]`.
    pub fn build(
        name: impl Into<String>,
        encoder: &Encoder,
        params: NeuronParams,
        value: f64,
    ) -> Result<Self, StickError> {
        let mut module = Module::new(name);
        let w = Weights::new(&params, encoder);
        let interval = encoder.encode_interval(value.abs());

        let recall = module.add_neuron("recall", params)?;
        let out_plus = module.add_neuron("out_plus", params)?;
        let out_minus = module.add_neuron("out_minus", params)?;

        let target = if value < 0.0 { &out_minus } else { &out_plus };
        module.connect(&recall, target, Channel::V, w.we, T_SYN)?;
        module.connect(&recall, target, Channel::V, w.we, T_SYN + interval)?;

        Ok(SignedConstantNetwork {
            module,
            recall,
            out: NeuronHeader::new(out_plus, out_minus),
        })
    }

    /// Returns the neuron whose spike triggers the replay.
    pub fn recall(&self) -> &NeuronHandle {
        &self.recall
    }

    pub fn out(&self) -> &NeuronHeader {
        &self.out
    }

    pub fn into_module(self) -> Module {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::Simulator;

    #[test]
    fn test_signed_constant_replays_negative_value() {
        let encoder = Encoder::default();
        let constant =
            SignedConstantNetwork::build("net.const", &encoder, NeuronParams::default(), -0.4)
                .unwrap();
        let recall = constant.recall().clone();
        let out = constant.out().clone();
        let module = constant.into_module();

        let mut sim = Simulator::new(&module, encoder, 0.01).unwrap();
        sim.apply_input_spike(&recall, 0.0).unwrap();
        sim.simulate(120.0).unwrap();

        let spikes = sim.spike_log(out.minus.uid()).unwrap();
        assert_eq!(spikes.len(), 2);
        let x = encoder.decode_interval(spikes[1] - spikes[0]);
        assert!((x - 0.4).abs() < 1e-3);
        assert!(sim.spike_log(out.plus.uid()).is_none());
    }
}
