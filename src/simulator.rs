//! This module implements the discrete-time STICK simulator.
//!
//! The simulator owns all mutable per-neuron state and the synaptic
//! delivery queue; the network module it is built from is only read. For a
//! fixed `(network, encoder, dt, triggers, simulation_time)` the spike and
//! voltage logs are bitwise-deterministic: deliveries are applied in FIFO
//! order within a time bucket, and same-step threshold crossings are
//! processed in uid-lexicographic order.

use log::{debug, info};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::compiler::ExecutionPlan;
use super::encoder::Encoder;
use super::error::StickError;
use super::network::{Channel, Module};
use super::neuron::{NeuronHandle, NeuronParams};

/// Minimum number of neurons to use parallel integration.
pub const MIN_PARALLEL_NEURONS: usize = 10000;

/// Margin added to the threshold when injecting external trigger spikes.
const INJECTION_EPS: f64 = 1e-6;

// Per-neuron mutable state, kept apart from the shared descriptors.
#[derive(Debug, Clone)]
struct SimNeuron {
    uid: String,
    params: NeuronParams,
    v: f64,
    ge: f64,
    gf: f64,
    gate: f64,
}

// A compiled outgoing synapse, resolved to a target index.
#[derive(Debug, Clone)]
struct OutSynapse {
    target: usize,
    channel: Channel,
    weight: f64,
    delay: f64,
}

// A pending synaptic delivery. Orders by time, then by insertion sequence,
// so simultaneous deliveries keep FIFO order.
#[derive(Debug)]
struct Delivery {
    time: f64,
    seq: u64,
    target: usize,
    channel: Channel,
    weight: f64,
}

impl PartialEq for Delivery {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Delivery {}

impl Ord for Delivery {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the binary heap is a max-heap and we want the earliest
        // delivery on top.
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Delivery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Discrete-time simulator for a STICK network.
///
/// # Examples
///
/// ```rust
/// use stick_snn::encoder::Encoder;
/// use stick_snn::network::{Channel, Module};
/// use stick_snn::neuron::NeuronParams;
/// use stick_snn::simulator::Simulator;
///
/// let mut module = Module::new("net");
/// let a = module.add_neuron("a", NeuronParams::default()).unwrap();
/// let b = module.add_neuron("b", NeuronParams::default()).unwrap();
/// module.connect(&a, &b, Channel::V, 10.0, 1.0).unwrap();
///
/// let mut sim = Simulator::new(&module, Encoder::default(), 0.01).unwrap();
/// sim.apply_input_spike(&a, 0.0).unwrap();
/// sim.simulate(10.0).unwrap();
/// assert_eq!(sim.spike_log(b.uid()).unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct Simulator {
    dt: f64,
    encoder: Encoder,
    neurons: Vec<SimNeuron>,
    index: HashMap<String, usize>,
    outgoing: Vec<Vec<OutSynapse>>,
    queue: BinaryHeap<Delivery>,
    next_seq: u64,
    next_step: usize,
    spike_log: HashMap<String, Vec<f64>>,
    voltage_log: HashMap<String, Vec<(f64, f64)>>,
    record_voltage: bool,
}

impl Simulator {
    /// Create a simulator for the given network. The network is flattened
    /// into uid-sorted state vectors; it is not mutated afterwards.
    ///
    /// `dt` is a correctness parameter: the reference circuits assume
    /// `dt <= 0.01 * Tmin`.
    pub fn new(network: &Module, encoder: Encoder, dt: f64) -> Result<Self, StickError> {
        network.validate_unique_uids()?;

        let mut neurons: Vec<SimNeuron> = network
            .all_neurons()
            .into_iter()
            .map(|n| SimNeuron {
                uid: n.uid().to_string(),
                params: *n.params(),
                v: 0.0,
                ge: 0.0,
                gf: 0.0,
                gate: 0.0,
            })
            .collect();
        neurons.sort_by(|a, b| a.uid.cmp(&b.uid));

        let index: HashMap<String, usize> = neurons
            .iter()
            .enumerate()
            .map(|(i, n)| (n.uid.clone(), i))
            .collect();

        let mut outgoing = vec![vec![]; neurons.len()];
        for synapse in network.all_synapses() {
            let source = *index
                .get(synapse.source().uid())
                .ok_or_else(|| StickError::NeuronNotFound(synapse.source().uid().to_string()))?;
            let target = *index
                .get(synapse.target().uid())
                .ok_or_else(|| StickError::NeuronNotFound(synapse.target().uid().to_string()))?;
            outgoing[source].push(OutSynapse {
                target,
                channel: synapse.channel(),
                weight: synapse.weight(),
                delay: synapse.delay(),
            });
        }

        debug!(
            "Simulator loaded: {} neurons, {} synapses, dt = {}",
            neurons.len(),
            outgoing.iter().map(|v| v.len()).sum::<usize>(),
            dt
        );

        Ok(Simulator {
            dt,
            encoder,
            neurons,
            index,
            outgoing,
            queue: BinaryHeap::new(),
            next_seq: 0,
            next_step: 0,
            spike_log: HashMap::new(),
            voltage_log: HashMap::new(),
            record_voltage: true,
        })
    }

    /// Create a simulator from a compiled plan: loads the network and
    /// registers every input trigger. The encoder should be the one the
    /// plan was compiled with (see [`ExecutionPlan::encoder`]).
    pub fn init_with_plan(
        plan: &ExecutionPlan,
        encoder: Encoder,
        dt: f64,
    ) -> Result<Self, StickError> {
        let mut sim = Simulator::new(plan.network(), encoder, dt)?;
        for trigger in plan.triggers() {
            sim.apply_input_value(trigger.value(), trigger.target(), trigger.t0())?;
        }
        Ok(sim)
    }

    /// Enable or disable the per-step voltage trace (enabled by default).
    pub fn set_voltage_recording(&mut self, record: bool) {
        self.record_voltage = record;
    }

    /// Returns the encoder used for input value encoding.
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Returns the simulation time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Inject a normalized value in `[0, 1]` as a pair of trigger spikes on
    /// the given neuron: one at `t0` and one at `t0 + interval(value)`.
    pub fn apply_input_value(
        &mut self,
        value: f64,
        neuron: &NeuronHandle,
        t0: f64,
    ) -> Result<(), StickError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(StickError::Range {
                value,
                max_range: 1.0,
            });
        }
        for t in self.encoder.encode_spike_times(value) {
            self.apply_input_spike(neuron, t0 + t)?;
        }
        Ok(())
    }

    /// Inject a single trigger spike at time `t`: the neuron's membrane
    /// jumps past threshold when the event is delivered, so it fires during
    /// the integration step containing `t`.
    pub fn apply_input_spike(&mut self, neuron: &NeuronHandle, t: f64) -> Result<(), StickError> {
        let target = *self
            .index
            .get(neuron.uid())
            .ok_or_else(|| StickError::NeuronNotFound(neuron.uid().to_string()))?;
        let weight = self.neurons[target].params.v_t() + INJECTION_EPS;
        self.enqueue(t, target, Channel::V, weight);
        Ok(())
    }

    /// Advance simulated time up to `simulation_time`, recording every
    /// spike and (unless disabled) one voltage sample per neuron per step.
    ///
    /// Calling `simulate` again with a larger horizon resumes where the
    /// previous call stopped, so a driver can run the network in slices and
    /// inspect the partial logs in between.
    pub fn simulate(&mut self, simulation_time: f64) -> Result<(), StickError> {
        let num_steps = (simulation_time / self.dt) as usize;
        let log_every = (num_steps / 100).max(1);

        for step in self.next_step..num_steps {
            let t = step as f64 * self.dt;

            // Deliver all synaptic events due at or before this step, in
            // FIFO order within the bucket. Effects apply before
            // integration.
            while self
                .queue
                .peek()
                .map_or(false, |delivery| delivery.time <= t)
            {
                if let Some(delivery) = self.queue.pop() {
                    let neuron = &mut self.neurons[delivery.target];
                    match delivery.channel {
                        Channel::V => neuron.v += delivery.weight,
                        Channel::Ge => neuron.ge += delivery.weight,
                        Channel::Gf => neuron.gf += delivery.weight,
                        Channel::Gate => neuron.gate += delivery.weight,
                    }
                }
            }

            // Forward Euler step for every neuron, using the pre-step
            // conductances.
            let dt = self.dt;
            let integrate = |neuron: &mut SimNeuron| {
                neuron.v += dt * (neuron.ge + neuron.gate * neuron.gf) / neuron.params.tau_m();
                neuron.gf -= dt * neuron.gf / neuron.params.tau_f();
            };
            if self.neurons.len() > MIN_PARALLEL_NEURONS {
                self.neurons.par_iter_mut().for_each(integrate);
            } else {
                self.neurons.iter_mut().for_each(integrate);
            }

            if self.record_voltage {
                for neuron in &self.neurons {
                    self.voltage_log
                        .entry(neuron.uid.clone())
                        .or_default()
                        .push((t, neuron.v));
                }
            }

            // Threshold crossings, in uid order (the state vector is
            // uid-sorted). Spiking resets the whole neuron state.
            for idx in 0..self.neurons.len() {
                let neuron = &self.neurons[idx];
                if !neuron.v.is_finite() {
                    return Err(StickError::SimulationDiverged {
                        uid: neuron.uid.clone(),
                        t,
                    });
                }
                if neuron.v < neuron.params.v_t() {
                    continue;
                }

                self.spike_log
                    .entry(neuron.uid.clone())
                    .or_default()
                    .push(t);
                for s in 0..self.outgoing[idx].len() {
                    let synapse = self.outgoing[idx][s].clone();
                    self.enqueue(
                        t + synapse.delay,
                        synapse.target,
                        synapse.channel,
                        synapse.weight,
                    );
                }

                let neuron = &mut self.neurons[idx];
                neuron.v = 0.0;
                neuron.ge = 0.0;
                neuron.gf = 0.0;
                neuron.gate = 0.0;
            }

            if step % log_every == 0 {
                debug!(
                    "Simulation progress: {:.2}% (Time: {:.2}/{:.2})",
                    100.0 * step as f64 / num_steps as f64,
                    t,
                    simulation_time
                );
            }
        }

        self.next_step = self.next_step.max(num_steps);
        info!("Simulation completed at t = {:.2}", self.time());
        Ok(())
    }

    /// Returns the time of the last executed integration step.
    pub fn time(&self) -> f64 {
        self.next_step.saturating_sub(1) as f64 * self.dt
    }

    /// Returns the spike times of the given neuron, if it spiked at all.
    pub fn spike_log(&self, uid: &str) -> Option<&[f64]> {
        self.spike_log.get(uid).map(|v| v.as_slice())
    }

    /// Returns the full spike log, keyed by neuron uid.
    pub fn spike_logs(&self) -> &HashMap<String, Vec<f64>> {
        &self.spike_log
    }

    /// Returns the `(t, V)` voltage trace of the given neuron.
    pub fn voltage_log(&self, uid: &str) -> Option<&[(f64, f64)]> {
        self.voltage_log.get(uid).map(|v| v.as_slice())
    }

    /// Returns the full voltage log, keyed by neuron uid.
    pub fn voltage_logs(&self) -> &HashMap<String, Vec<(f64, f64)>> {
        &self.voltage_log
    }

    fn enqueue(&mut self, time: f64, target: usize, channel: Channel, weight: f64) {
        self.queue.push(Delivery {
            time,
            seq: self.next_seq,
            target,
            channel,
            weight,
        });
        self.next_seq += 1;
    }
}
