//! Error module for the STICK toolkit.

use thiserror::Error;

/// Error types for the library.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum StickError {
    /// A `Load` value has a magnitude exceeding the compilation range.
    #[error("Value {value} exceeds the compilation range (max_range = {max_range})")]
    Range { value: f64, max_range: f64 },
    /// The encoder was built with non-positive timing parameters.
    #[error("Invalid encoder config: Tmin = {t_min}, Tcod = {t_cod} (both must be > 0)")]
    InvalidEncoderConfig { t_min: f64, t_cod: f64 },
    /// A neuron was built with non-positive parameters.
    #[error("Invalid neuron config: Vt = {v_t}, tm = {tau_m}, tf = {tau_f} (all must be > 0)")]
    InvalidNeuronConfig { v_t: f64, tau_m: f64, tau_f: f64 },
    /// A synapse was built with a negative delay or a non-finite weight.
    #[error("Invalid synapse config: weight = {weight}, delay = {delay}")]
    InvalidSynapseConfig { weight: f64, delay: f64 },
    /// Two neurons resolve to the same uid. This is a compiler bug and is fatal.
    #[error("Duplicate neuron uid: {0}")]
    DuplicateUid(String),
    /// No neuron with the requested uid exists in the network.
    #[error("Neuron not found: {0}")]
    NeuronNotFound(String),
    /// The output reader found both or neither of plus/minus with exactly two spikes.
    #[error("Undecodable output: plus emitted {plus_spikes} spike(s), minus emitted {minus_spikes} spike(s)")]
    UndecodableOutput {
        plus_spikes: usize,
        minus_spikes: usize,
    },
    /// A membrane voltage became non-finite during simulation.
    #[error("Simulation diverged: neuron {uid} has non-finite voltage at t = {t}")]
    SimulationDiverged { uid: String, t: f64 },
}
