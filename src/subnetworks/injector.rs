//! The injector network backing `Load` nodes.

use crate::encoder::Encoder;
use crate::error::StickError;
use crate::network::Module;
use crate::neuron::{NeuronHeader, NeuronParams};

/// Entry point of a compiled computation.
///
/// The injector exposes a single header pair. External spike pairs are
/// applied directly onto `out.plus` or `out.minus` (depending on the sign
/// of the loaded value), and the resulting interval propagates into the
/// downstream module through the compiler's header wiring.
#[derive(Debug)]
pub struct InjectorNetwork {
    module: Module,
    out: NeuronHeader,
}

impl InjectorNetwork {
    pub fn build(
        name: impl Into<String>,
        _encoder: &Encoder,
        params: NeuronParams,
    ) -> Result<Self, StickError> {
        let mut module = Module::new(name);
        let out_plus = module.add_neuron("out_plus", params)?;
        let out_minus = module.add_neuron("out_minus", params)?;

        Ok(InjectorNetwork {
            module,
            out: NeuronHeader::new(out_plus, out_minus),
        })
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

    #[test]
    fn test_injector_exposes_one_header_pair() {
        let injector =
            InjectorNetwork::build("net.load_0", &Encoder::default(), NeuronParams::default())
                .unwrap();
        assert_eq!(injector.out().plus.uid(), "net.load_0.out_plus");
        assert_eq!(injector.out().minus.uid(), "net.load_0.out_minus");
        assert_eq!(injector.into_module().num_neurons(), 2);
    }
}
