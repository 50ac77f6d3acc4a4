//! This module provides the neuron descriptor and the handle types used to
//! reference neurons across modules.

use serde::{Deserialize, Serialize};

use super::error::StickError;

/// Immutable parameters of a STICK neuron.
///
/// # Examples
///
/// ```rust
/// use stick_snn::neuron::NeuronParams;
///
/// let params = NeuronParams::build(10.0, 100.0, 20.0).unwrap();
/// assert_eq!(params.v_t(), 10.0);
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct NeuronParams {
    // The firing threshold.
    v_t: f64,
    // The membrane time constant.
    tau_m: f64,
    // The fast synapse time constant.
    tau_f: f64,
}

impl NeuronParams {
    /// Create neuron parameters with the specified values.
    /// The function returns an error unless all three are strictly positive.
    pub fn build(v_t: f64, tau_m: f64, tau_f: f64) -> Result<Self, StickError> {
        if !(v_t > 0.0 && tau_m > 0.0 && tau_f > 0.0) {
            return Err(StickError::InvalidNeuronConfig { v_t, tau_m, tau_f });
        }
        Ok(NeuronParams { v_t, tau_m, tau_f })
    }

    /// Returns the firing threshold.
    pub fn v_t(&self) -> f64 {
        self.v_t
    }

    /// Returns the membrane time constant.
    pub fn tau_m(&self) -> f64 {
        self.tau_m
    }

    /// Returns the fast synapse time constant.
    pub fn tau_f(&self) -> f64 {
        self.tau_f
    }
}

impl Default for NeuronParams {
    /// The reference parameters: `Vt = 10`, `tm = 100`, `tf = 20`.
    fn default() -> Self {
        NeuronParams {
            v_t: 10.0,
            tau_m: 100.0,
            tau_f: 20.0,
        }
    }
}

/// An immutable neuron descriptor owned by a module.
///
/// Mutable simulation state (voltage, conductances) is *not* stored here;
/// the simulator keeps its own state vectors keyed by uid.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Neuron {
    // Network-wide unique identifier: dotted module path plus local name.
    uid: String,
    // The local, human-readable name within the owning module.
    name: String,
    params: NeuronParams,
}

impl Neuron {
    pub(crate) fn new(uid: String, name: String, params: NeuronParams) -> Self {
        Neuron { uid, name, params }
    }

    /// Returns the network-wide unique identifier of the neuron.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns the local name of the neuron within its module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the neuron parameters.
    pub fn params(&self) -> &NeuronParams {
        &self.params
    }

    /// Returns a stable handle to the neuron.
    pub fn handle(&self) -> NeuronHandle {
        NeuronHandle {
            uid: self.uid.clone(),
        }
    }
}

/// A cheap, stable reference to a neuron, valid for the lifetime of the
/// top-level module.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
pub struct NeuronHandle {
    uid: String,
}

impl NeuronHandle {
    /// Returns the uid the handle refers to.
    pub fn uid(&self) -> &str {
        &self.uid
    }
}

/// A `(plus, minus)` pair of neurons carrying one signed interval-coded
/// value. Wiring across module boundaries is always done in pairs, so a
/// header is the unit every plug resolves to.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct NeuronHeader {
    pub plus: NeuronHandle,
    pub minus: NeuronHandle,
}

impl NeuronHeader {
    pub fn new(plus: NeuronHandle, minus: NeuronHandle) -> Self {
        NeuronHeader { plus, minus }
    }
}
