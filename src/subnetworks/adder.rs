//! The signed adder network backing `Add` nodes.

use crate::encoder::Encoder;
use crate::error::StickError;
use crate::network::{Channel, Module};
use crate::neuron::{NeuronHeader, NeuronParams};

use super::{split_spike_pair, Weights, T_SYN};

/// Adds two signed interval-coded values.
///
/// Each input polarity feeds a first/last gating pair that converts its
/// interval into a constant-current window on two mirrored accumulators:
/// `sum_plus` integrates `a + b` and `sum_minus` integrates `-(a + b)`
/// (plus-side windows charge one and discharge the other). Once both
/// inputs have completed, the `sync` neuron starts a constant-current
/// readout on both accumulators.
///
/// The readout of an accumulator holding `s * Vt` fires after
/// `(1 - s) * Tcod`, i.e. it encodes the complement of the stored value, so
/// each path inverts twice: the `ramp` neuron captures the complement
/// emitted by its `sum` neuron and replays it against a second readout,
/// recovering `s`. The path holding the negative copy of the result runs
/// one `Tsyn` behind; whichever `sum` neuron fires first carries the true
/// sign and freezes the opposite path, so only one of `out.plus` /
/// `out.minus` ever emits.
///
/// Sums with a magnitude below `Tsyn / Tcod` fire both accumulators before
/// either freeze can land. The `zero` coincidence neuron catches exactly
/// that case: it absorbs the spikes both chains send to the outputs and
/// replays a clean `Tmin` pair on the plus side, so near-zero sums decode
/// as `+0` instead of poisoning downstream circuits.
#[derive(Debug)]
pub struct AdderNetwork {
    module: Module,
    in_a: NeuronHeader,
    in_b: NeuronHeader,
    out: NeuronHeader,
}

impl AdderNetwork {
    pub fn build(
        name: impl Into<String>,
        encoder: &Encoder,
        params: NeuronParams,
    ) -> Result<Self, StickError> {
        let mut module = Module::new(name);
        let w = Weights::new(&params, encoder);
        let t_min = encoder.t_min();

        let in_a_plus = module.add_neuron("in_a_plus", params)?;
        let in_a_minus = module.add_neuron("in_a_minus", params)?;
        let in_b_plus = module.add_neuron("in_b_plus", params)?;
        let in_b_minus = module.add_neuron("in_b_minus", params)?;

        let sync = module.add_neuron("sync", params)?;
        let sum_plus = module.add_neuron("sum_plus", params)?;
        let ramp_plus = module.add_neuron("ramp_plus", params)?;
        let sum_minus = module.add_neuron("sum_minus", params)?;
        let ramp_minus = module.add_neuron("ramp_minus", params)?;
        let zero = module.add_neuron("zero", params)?;
        let out_plus = module.add_neuron("out_plus", params)?;
        let out_minus = module.add_neuron("out_minus", params)?;

        // Interval capture, one gating pair per input polarity. A plus-side
        // interval charges sum_plus and discharges sum_minus; a minus-side
        // interval does the opposite. The `Tsyn + Tmin` opening delay strips
        // the Tmin floor so the captured charge is exactly x * Vt.
        for (input, label, sign) in [
            (&in_a_plus, "a_plus", 1.0),
            (&in_a_minus, "a_minus", -1.0),
            (&in_b_plus, "b_plus", 1.0),
            (&in_b_minus, "b_minus", -1.0),
        ] {
            let split = split_spike_pair(&mut module, input, label, params, &w)?;
            module.connect(&split.first, &sum_plus, Channel::Ge, sign * w.wacc, T_SYN + t_min)?;
            module.connect(&split.last, &sum_plus, Channel::Ge, -sign * w.wacc, T_SYN)?;
            module.connect(&split.first, &sum_minus, Channel::Ge, -sign * w.wacc, T_SYN + t_min)?;
            module.connect(&split.last, &sum_minus, Channel::Ge, sign * w.wacc, T_SYN)?;
            // Each input contributes one `last` spike; half weight makes
            // sync wait for both inputs.
            module.connect(&split.last, &sync, Channel::V, 0.5 * w.we, T_SYN)?;
        }

        // Plus path readout. The ramp captures the complement between the
        // readout start and the sum spike, then replays it against a second
        // readout started by that same spike.
        module.connect(&sync, &sum_plus, Channel::Ge, w.wacc, T_SYN)?;
        module.connect(&sync, &ramp_plus, Channel::Ge, w.wacc, 2.0 * T_SYN)?;
        module.connect(&sum_plus, &ramp_plus, Channel::Ge, -w.wacc, T_SYN)?;
        module.connect(&sum_plus, &ramp_plus, Channel::Ge, w.wacc, 2.0 * T_SYN)?;
        module.connect(&sum_plus, &out_plus, Channel::V, w.we, 3.0 * T_SYN)?;
        module.connect(&ramp_plus, &out_plus, Channel::V, w.we, T_SYN + t_min)?;

        // Minus path readout, one Tsyn behind the plus path so that exact
        // zero resolves on the plus side.
        module.connect(&sync, &sum_minus, Channel::Ge, w.wacc, 2.0 * T_SYN)?;
        module.connect(&sync, &ramp_minus, Channel::Ge, w.wacc, 3.0 * T_SYN)?;
        module.connect(&sum_minus, &ramp_minus, Channel::Ge, -w.wacc, T_SYN)?;
        module.connect(&sum_minus, &ramp_minus, Channel::Ge, w.wacc, 2.0 * T_SYN)?;
        module.connect(&sum_minus, &out_minus, Channel::V, w.we, 3.0 * T_SYN)?;
        module.connect(&ramp_minus, &out_minus, Channel::V, w.we, T_SYN + t_min)?;

        // Winner guard: the first sum spike cancels the losing path's
        // readout currents so its neurons never reach threshold.
        module.connect(&sum_plus, &sum_minus, Channel::Ge, -w.wacc, T_SYN)?;
        module.connect(&sum_plus, &ramp_minus, Channel::Ge, -w.wacc, T_SYN)?;
        module.connect(&sum_minus, &sum_plus, Channel::Ge, -w.wacc, T_SYN)?;
        module.connect(&sum_minus, &ramp_plus, Channel::Ge, -w.wacc, T_SYN)?;

        // Near-zero tie-break: if both sums fire anyway, the zero neuron
        // soaks up the at most two spikes each chain sends to its output
        // and substitutes a Tmin pair on the plus side.
        module.connect(&sum_plus, &zero, Channel::V, 0.5 * w.we, T_SYN)?;
        module.connect(&sum_minus, &zero, Channel::V, 0.5 * w.we, T_SYN)?;
        module.connect(&zero, &out_plus, Channel::V, 2.0 * w.wi, T_SYN)?;
        module.connect(&zero, &out_minus, Channel::V, 2.0 * w.wi, T_SYN)?;
        module.connect(&zero, &out_plus, Channel::V, w.we, 2.0 * T_SYN + t_min)?;
        module.connect(&zero, &out_plus, Channel::V, w.we, 2.0 * T_SYN + 2.0 * t_min)?;

        Ok(AdderNetwork {
            module,
            in_a: NeuronHeader::new(in_a_plus, in_a_minus),
            in_b: NeuronHeader::new(in_b_plus, in_b_minus),
            out: NeuronHeader::new(out_plus, out_minus),
        })
    }

    pub fn in_a(&self) -> &NeuronHeader {
        &self.in_a
    }

    pub fn in_b(&self) -> &NeuronHeader {
        &self.in_b
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

    fn run_adder(a: f64, b: f64) -> (Option<f64>, Option<f64>) {
        let encoder = Encoder::default();
        let adder = AdderNetwork::build("net.add_0", &encoder, NeuronParams::default()).unwrap();
        let (in_a, in_b, out) = (
            adder.in_a().clone(),
            adder.in_b().clone(),
            adder.out().clone(),
        );
        let module = adder.into_module();

        let mut sim = Simulator::new(&module, encoder, 0.01).unwrap();
        let a_target = if a < 0.0 { &in_a.minus } else { &in_a.plus };
        let b_target = if b < 0.0 { &in_b.minus } else { &in_b.plus };
        sim.apply_input_value(a.abs(), a_target, 0.0).unwrap();
        sim.apply_input_value(b.abs(), b_target, 0.0).unwrap();
        sim.simulate(500.0).unwrap();

        let decode = |uid: &str| {
            sim.spike_log(uid).and_then(|spikes| {
                (spikes.len() == 2).then(|| encoder.decode_interval(spikes[1] - spikes[0]))
            })
        };
        (decode(out.plus.uid()), decode(out.minus.uid()))
    }

    #[test]
    fn test_adder_positive_operands() {
        let (plus, minus) = run_adder(0.2, 0.3);
        assert!(minus.is_none());
        assert!((plus.unwrap() - 0.5).abs() < 2e-3);
    }

    #[test]
    fn test_adder_opposite_signs_positive_result() {
        let (plus, minus) = run_adder(0.7, -0.3);
        assert!(minus.is_none());
        assert!((plus.unwrap() - 0.4).abs() < 2e-3);
    }

    #[test]
    fn test_adder_opposite_signs_negative_result() {
        let (plus, minus) = run_adder(0.3, -0.5);
        assert!(plus.is_none());
        assert!((minus.unwrap() - 0.2).abs() < 2e-3);
    }

    #[test]
    fn test_adder_zero_operand() {
        let (plus, minus) = run_adder(0.0, 0.45);
        assert!(minus.is_none());
        assert!((plus.unwrap() - 0.45).abs() < 2e-3);
    }

    #[test]
    fn test_adder_near_zero_negative_sum_collapses_to_zero() {
        // Inside the arbitration window both paths fire; the zero neuron
        // rewrites the output as +0.
        let (plus, minus) = run_adder(0.3, -0.304);
        assert!(minus.is_none());
        assert!(plus.unwrap().abs() < 1e-3);
    }

    #[test]
    fn test_adder_never_emits_on_both_sides() {
        for (a, b) in [(0.2, 0.3), (0.5, -0.1), (0.1, -0.6), (0.0, 0.0), (0.4, -0.407)] {
            let (plus, minus) = run_adder(a, b);
            assert!(
                plus.is_none() || minus.is_none(),
                "both sides emitted for a = {}, b = {}",
                a,
                b
            );
        }
    }
}
