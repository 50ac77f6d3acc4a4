//! The exponential and logarithmic primitive circuits.
//!
//! Both circuits work on a single magnitude (no sign pair). They follow the
//! same scheme: a first/last gating pair measures the input interval, an
//! accumulator converts between a time window and a membrane charge through
//! the fast `gf` conductance, and a two-spike output relay re-encodes the
//! result with the standard `Tmin` offset.

use crate::encoder::Encoder;
use crate::error::StickError;
use crate::network::{Channel, Module};
use crate::neuron::{NeuronHandle, NeuronParams};

use super::{split_spike_pair, Weights, T_SYN};

/// Computes `y = exp(-x * Tcod / tf)` on interval-coded magnitudes.
///
/// The gating pair opens the `gf` pathway on the accumulator for exactly
/// `x * Tcod` (the input interval minus the `Tmin` floor, obtained with the
/// `Tsyn + Tmin` delay on the opening synapses). While the gate is open the
/// membrane charges to `Vt * (1 - exp(-x * Tcod / tf))`; the constant-current
/// readout then needs `Tcod * exp(-x * Tcod / tf)` to reach threshold, so
/// the output pair is separated by `Tmin + Tcod * exp(-x * Tcod / tf)`.
#[derive(Debug)]
pub struct ExponentialNetwork {
    module: Module,
    input: NeuronHandle,
    out: NeuronHandle,
}

impl ExponentialNetwork {
    pub fn build(
        name: impl Into<String>,
        encoder: &Encoder,
        params: NeuronParams,
    ) -> Result<Self, StickError> {
        let mut module = Module::new(name);
        let w = Weights::new(&params, encoder);
        let t_min = encoder.t_min();

        let input = module.add_neuron("input", params)?;
        let acc = module.add_neuron("acc", params)?;
        let out = module.add_neuron("out", params)?;
        let split = split_spike_pair(&mut module, &input, "input", params, &w)?;

        // Gate window: opens Tmin after the first spike would demand, closes
        // with the second spike, so the window length is the coded part of
        // the input interval.
        module.connect(&split.first, &acc, Channel::Gate, 1.0, T_SYN + t_min)?;
        module.connect(&split.first, &acc, Channel::Gf, w.gmult, T_SYN + t_min)?;
        module.connect(&split.last, &acc, Channel::Gate, -1.0, T_SYN)?;

        // Constant-current readout, started once the gate is closed.
        module.connect(&split.last, &acc, Channel::Ge, w.wacc, 2.0 * T_SYN)?;

        // Output pair: the relative delays re-insert the Tmin floor.
        module.connect(&split.last, &out, Channel::V, w.we, 3.0 * T_SYN)?;
        module.connect(&acc, &out, Channel::V, w.we, T_SYN + t_min)?;

        Ok(ExponentialNetwork { module, input, out })
    }

    pub fn input(&self) -> &NeuronHandle {
        &self.input
    }

    pub fn out(&self) -> &NeuronHandle {
        &self.out
    }

    pub fn into_module(self) -> Module {
        self.module
    }
}

/// Computes `y = -tf * ln(x) / Tcod` on interval-coded magnitudes, the
/// inverse of [`ExponentialNetwork`].
///
/// The input magnitude is first captured as a membrane charge `x * Vt` by a
/// constant-current window. The readout then drives the accumulator through
/// the gated `gf` pathway: starting from `x * Vt`, threshold is reached
/// after `-tf * ln(x)`, which the output relay re-encodes as the interval
/// `Tmin - tf * ln(x)`.
///
/// `x = 0` is not representable (its logarithm diverges); the accumulator
/// then never fires and the circuit stays silent.
#[derive(Debug)]
pub struct LogarithmNetwork {
    module: Module,
    input: NeuronHandle,
    out: NeuronHandle,
}

impl LogarithmNetwork {
    pub fn build(
        name: impl Into<String>,
        encoder: &Encoder,
        params: NeuronParams,
    ) -> Result<Self, StickError> {
        let mut module = Module::new(name);
        let w = Weights::new(&params, encoder);
        let t_min = encoder.t_min();

        let input = module.add_neuron("input", params)?;
        let acc = module.add_neuron("acc", params)?;
        let out = module.add_neuron("out", params)?;
        let split = split_spike_pair(&mut module, &input, "input", params, &w)?;

        // Capture window: charge the accumulator to x * Vt.
        module.connect(&split.first, &acc, Channel::Ge, w.wacc, T_SYN + t_min)?;
        module.connect(&split.last, &acc, Channel::Ge, -w.wacc, T_SYN)?;

        // Gated fast-conductance readout.
        module.connect(&split.last, &acc, Channel::Gf, w.gmult, 2.0 * T_SYN)?;
        module.connect(&split.last, &acc, Channel::Gate, 1.0, 2.0 * T_SYN)?;

        // Output pair.
        module.connect(&split.last, &out, Channel::V, w.we, 3.0 * T_SYN)?;
        module.connect(&acc, &out, Channel::V, w.we, T_SYN + t_min)?;

        Ok(LogarithmNetwork { module, input, out })
    }

    pub fn input(&self) -> &NeuronHandle {
        &self.input
    }

    pub fn out(&self) -> &NeuronHandle {
        &self.out
    }

    pub fn into_module(self) -> Module {
        self.module
    }
}
