//! Pre-designed STICK circuits, one per symbolic operation, plus the
//! exponential/logarithmic primitive circuits they are built from.
//!
//! Every network here is parameterised by the shared [`Encoder`], so its
//! internal weights and delays are computed from `Tmin` and `Tcod` rather
//! than hard-coded. All networks expose their ports as `(plus, minus)`
//! header pairs (or single handles for the magnitude-only primitives).

pub mod adder;
pub mod constant;
pub mod explog;
pub mod injector;
pub mod multiplier;
pub mod sign_flipper;

pub use adder::AdderNetwork;
pub use constant::SignedConstantNetwork;
pub use explog::{ExponentialNetwork, LogarithmNetwork};
pub use injector::InjectorNetwork;
pub use multiplier::SignedMultiplierNormNetwork;
pub use sign_flipper::SignFlipperNetwork;

use super::encoder::Encoder;
use super::error::StickError;
use super::network::{Channel, Module};
use super::neuron::{NeuronHandle, NeuronParams};

/// The standard synaptic propagation delay between neurons of a circuit.
pub const T_SYN: f64 = 1.0;

/// The standard synaptic weights of the STICK circuits, derived from the
/// neuron parameters and the encoder timing:
///
/// - `we = Vt`: one excitatory spike drives the target to threshold;
/// - `wi = -Vt`: one inhibitory spike cancels an excitatory one;
/// - `gmult = Vt * tm / tf`: a fast conductance that would charge the
///   membrane to `Vt` if left to decay completely;
/// - `wacc = Vt * tm / Tcod`: a constant current that charges the membrane
///   from rest to `Vt` in exactly `Tcod`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Weights {
    pub we: f64,
    pub wi: f64,
    pub gmult: f64,
    pub wacc: f64,
}

impl Weights {
    pub fn new(params: &NeuronParams, encoder: &Encoder) -> Self {
        Weights {
            we: params.v_t(),
            wi: -params.v_t(),
            gmult: params.v_t() * params.tau_m() / params.tau_f(),
            wacc: params.v_t() * params.tau_m() / encoder.t_cod(),
        }
    }
}

/// The first/last gating pair splitting an incoming spike pair.
pub(crate) struct SpikeSplit {
    /// Fires once, on the first spike of the pair.
    pub first: NeuronHandle,
    /// Fires once, on the second spike of the pair.
    pub last: NeuronHandle,
}

/// Create a first/last gating pair listening to `input`, which is expected
/// to fire exactly twice per computation.
///
/// `first` reaches threshold on the first input spike; its self-inhibition
/// lands before the second spike (intervals are at least `Tmin > Tsyn`
/// apart) and cancels it, leaving the neuron back at rest. `last` halves
/// the input weight so it only reaches threshold on the second spike.
pub(crate) fn split_spike_pair(
    module: &mut Module,
    input: &NeuronHandle,
    label: &str,
    params: NeuronParams,
    w: &Weights,
) -> Result<SpikeSplit, StickError> {
    let first = module.add_neuron(&format!("first_{}", label), params)?;
    let last = module.add_neuron(&format!("last_{}", label), params)?;

    module.connect(input, &first, Channel::V, w.we, T_SYN)?;
    module.connect(&first, &first, Channel::V, w.wi, T_SYN)?;
    module.connect(input, &last, Channel::V, 0.5 * w.we, T_SYN)?;

    Ok(SpikeSplit { first, last })
}

/// Create a neuron that fires once, on the first spike of `input`, and
/// swallows the second through its own delayed self-inhibition.
pub(crate) fn once_detector(
    module: &mut Module,
    input: &NeuronHandle,
    label: &str,
    params: NeuronParams,
    w: &Weights,
) -> Result<NeuronHandle, StickError> {
    let first = module.add_neuron(&format!("first_{}", label), params)?;
    module.connect(input, &first, Channel::V, w.we, T_SYN)?;
    module.connect(&first, &first, Channel::V, w.wi, T_SYN)?;
    Ok(first)
}
