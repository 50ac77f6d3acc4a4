//! The signed, normalised multiplier network backing `Mul` nodes.

use crate::encoder::Encoder;
use crate::error::StickError;
use crate::network::{Channel, Module};
use crate::neuron::{NeuronHeader, NeuronParams};

use super::{once_detector, split_spike_pair, ExponentialNetwork, LogarithmNetwork, Weights, T_SYN};

/// Multiplies two signed interval-coded values through the log/exp identity
/// `x * y = exp(ln x + ln y)`, rescaled by a normalisation constant.
///
/// Magnitudes: both polarities of each input relay into a child
/// [`LogarithmNetwork`]; the log outputs are captured as negative charges on
/// a shared accumulator, together with a constant offset encoding
/// `ln(norm)`. Reading that accumulator out produces a window of length
/// `-tf * ln(x * y * norm) ` (as a fraction of `Tcod`), which the child
/// [`ExponentialNetwork`] turns back into the interval coding
/// `x * y * norm`. Products beyond full scale make the accumulator cross
/// threshold on the offset jump itself and the output saturates at
/// `Tmin + Tcod`.
///
/// Signs: a once-only detector per input polarity feeds four coincidence
/// neurons (`++`, `+-`, `-+`, `--`); the pair matching the observed signs
/// fires and inhibits the output neuron of the wrong polarity, XOR-style,
/// before the magnitude result arrives.
#[derive(Debug)]
pub struct SignedMultiplierNormNetwork {
    module: Module,
    in_a: NeuronHeader,
    in_b: NeuronHeader,
    out: NeuronHeader,
}

impl SignedMultiplierNormNetwork {
    pub fn build(
        name: impl Into<String>,
        encoder: &Encoder,
        params: NeuronParams,
        norm: f64,
    ) -> Result<Self, StickError> {
        let mut module = Module::new(name);
        let w = Weights::new(&params, encoder);
        let t_min = encoder.t_min();

        let in_a_plus = module.add_neuron("in_a_plus", params)?;
        let in_a_minus = module.add_neuron("in_a_minus", params)?;
        let in_b_plus = module.add_neuron("in_b_plus", params)?;
        let in_b_minus = module.add_neuron("in_b_minus", params)?;

        let sync = module.add_neuron("sync", params)?;
        let sum = module.add_neuron("sum", params)?;
        let sum_out = module.add_neuron("sum_out", params)?;
        let out_plus = module.add_neuron("out_plus", params)?;
        let out_minus = module.add_neuron("out_minus", params)?;

        // Magnitude path: child log networks, one per input.
        let log_a = LogarithmNetwork::build(module.scoped_name("log_a"), encoder, params)?;
        let log_b = LogarithmNetwork::build(module.scoped_name("log_b"), encoder, params)?;
        let exp = ExponentialNetwork::build(module.scoped_name("exp"), encoder, params)?;

        for (input, log_input) in [
            (&in_a_plus, log_a.input()),
            (&in_a_minus, log_a.input()),
            (&in_b_plus, log_b.input()),
            (&in_b_minus, log_b.input()),
        ] {
            module.connect(input, log_input, Channel::V, w.we, T_SYN)?;
        }

        // Capture the two log outputs as negative charges on the shared
        // accumulator, so it ends up holding -(ln-coded a + ln-coded b).
        for (log_out, label) in [(log_a.out(), "log_a"), (log_b.out(), "log_b")] {
            let split = split_spike_pair(&mut module, log_out, label, params, &w)?;
            module.connect(&split.first, &sum, Channel::Ge, -w.wacc, T_SYN + t_min)?;
            module.connect(&split.last, &sum, Channel::Ge, w.wacc, T_SYN)?;
            module.connect(&split.last, &sync, Channel::V, 0.5 * w.we, T_SYN)?;
        }

        // Offset jump and readout. The jump adds (1 + tf * ln(norm) / Tcod)
        // * Vt in one step, after which the remaining headroom encodes the
        // renormalised product; the self-inhibition keeps the accumulator
        // from firing a second time when the jump alone crosses threshold.
        let offset = params.tau_f() * norm.ln() / encoder.t_cod();
        module.connect(&sync, &sum, Channel::V, (1.0 + offset) * w.we, T_SYN)?;
        module.connect(&sync, &sum, Channel::Ge, w.wacc, 2.0 * T_SYN)?;
        module.connect(&sum, &sum, Channel::Ge, -w.wacc, T_SYN)?;

        // Re-encode the readout window as an interval and push it through
        // the exponential circuit.
        module.connect(&sync, &sum_out, Channel::V, w.we, 3.0 * T_SYN)?;
        module.connect(&sum, &sum_out, Channel::V, w.we, T_SYN + t_min)?;
        module.connect(&sum_out, exp.input(), Channel::V, w.we, T_SYN)?;

        module.connect(exp.out(), &out_plus, Channel::V, w.we, T_SYN)?;
        module.connect(exp.out(), &out_minus, Channel::V, w.we, T_SYN)?;

        // Sign path: once-only detectors and coincidence neurons. The
        // coincidence spike lands long before the magnitude result and
        // inhibits the wrong output polarity strongly enough to absorb both
        // of its would-be spikes.
        let first_a_plus = once_detector(&mut module, &in_a_plus, "a_plus", params, &w)?;
        let first_a_minus = once_detector(&mut module, &in_a_minus, "a_minus", params, &w)?;
        let first_b_plus = once_detector(&mut module, &in_b_plus, "b_plus", params, &w)?;
        let first_b_minus = once_detector(&mut module, &in_b_minus, "b_minus", params, &w)?;

        let sign_pp = module.add_neuron("sign_pp", params)?;
        let sign_pm = module.add_neuron("sign_pm", params)?;
        let sign_mp = module.add_neuron("sign_mp", params)?;
        let sign_mm = module.add_neuron("sign_mm", params)?;

        for (a_side, b_side, coincidence) in [
            (&first_a_plus, &first_b_plus, &sign_pp),
            (&first_a_plus, &first_b_minus, &sign_pm),
            (&first_a_minus, &first_b_plus, &sign_mp),
            (&first_a_minus, &first_b_minus, &sign_mm),
        ] {
            module.connect(a_side, coincidence, Channel::V, 0.5 * w.we, T_SYN)?;
            module.connect(b_side, coincidence, Channel::V, 0.5 * w.we, T_SYN)?;
        }

        // Same signs silence the minus output, opposite signs the plus one.
        module.connect(&sign_pp, &out_minus, Channel::V, 2.0 * w.wi, T_SYN)?;
        module.connect(&sign_mm, &out_minus, Channel::V, 2.0 * w.wi, T_SYN)?;
        module.connect(&sign_pm, &out_plus, Channel::V, 2.0 * w.wi, T_SYN)?;
        module.connect(&sign_mp, &out_plus, Channel::V, 2.0 * w.wi, T_SYN)?;

        module.add_child(log_a.into_module());
        module.add_child(log_b.into_module());
        module.add_child(exp.into_module());

        Ok(SignedMultiplierNormNetwork {
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

    fn run_multiplier(a: f64, b: f64, norm: f64) -> (Option<f64>, Option<f64>) {
        let encoder = Encoder::default();
        let mul =
            SignedMultiplierNormNetwork::build("net.mul_0", &encoder, NeuronParams::default(), norm)
                .unwrap();
        let (in_a, in_b, out) = (mul.in_a().clone(), mul.in_b().clone(), mul.out().clone());
        let module = mul.into_module();

        let mut sim = Simulator::new(&module, encoder, 0.01).unwrap();
        let a_target = if a < 0.0 { &in_a.minus } else { &in_a.plus };
        let b_target = if b < 0.0 { &in_b.minus } else { &in_b.plus };
        sim.apply_input_value(a.abs(), a_target, 0.0).unwrap();
        sim.apply_input_value(b.abs(), b_target, 0.0).unwrap();
        sim.simulate(600.0).unwrap();

        let decode = |uid: &str| {
            sim.spike_log(uid).and_then(|spikes| {
                (spikes.len() == 2).then(|| encoder.decode_interval(spikes[1] - spikes[0]))
            })
        };
        (decode(out.plus.uid()), decode(out.minus.uid()))
    }

    #[test]
    fn test_multiplier_positive_operands() {
        let (plus, minus) = run_multiplier(0.5, 0.4, 1.0);
        assert!(minus.is_none());
        assert!((plus.unwrap() - 0.2).abs() < 5e-3);
    }

    #[test]
    fn test_multiplier_renormalises_with_norm() {
        // 0.05 * 0.04 with norm 100 is 0.2 of full scale.
        let (plus, minus) = run_multiplier(0.05, 0.04, 100.0);
        assert!(minus.is_none());
        assert!((plus.unwrap() - 0.2).abs() < 5e-3);
    }

    #[test]
    fn test_multiplier_sign_resolution() {
        let (plus, minus) = run_multiplier(0.5, -0.4, 1.0);
        assert!(plus.is_none());
        assert!((minus.unwrap() - 0.2).abs() < 5e-3);

        let (plus, minus) = run_multiplier(-0.5, -0.4, 1.0);
        assert!(minus.is_none());
        assert!((plus.unwrap() - 0.2).abs() < 5e-3);
    }

    #[test]
    fn test_multiplier_saturates_out_of_range_product() {
        // 0.5 * 0.4 with norm 100 is 20 times full scale.
        let (plus, minus) = run_multiplier(0.5, 0.4, 100.0);
        assert!(minus.is_none());
        assert!((plus.unwrap() - 1.0).abs() < 5e-3);
    }
}
