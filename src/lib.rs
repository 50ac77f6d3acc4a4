//! This crate provides tools for building, compiling, and simulating STICK
//! (Spike Time Interval Computational Kernel) networks in Rust.
//!
//! STICK circuits encode a real number as the interval between two spikes:
//! `x` in `[0, 1]` maps to `Tmin + x * Tcod`. Symbolic scalar expressions
//! compile into networks of four-conductance neurons wired by typed
//! synapses, and a discrete-time simulator reads the result back as an
//! output spike interval.
//!
//! # Compiling and running an expression
//!
//! ```rust
//! use stick_snn::compiler::compile_computation;
//! use stick_snn::scalar::Scalar;
//!
//! // (2 + 3) on a range of 100, i.e. 0.05 of full scale.
//! let expr = Scalar::new(2.0) + Scalar::new(3.0);
//! let plan = compile_computation(&expr, 100.0).unwrap();
//!
//! let result = plan.run(0.01, 300.0).unwrap();
//! assert!((result - 5.0).abs() < 0.1);
//! ```
//!
//! # Simulating a hand-built network
//!
//! ```rust
//! use stick_snn::encoder::Encoder;
//! use stick_snn::network::{Channel, Module};
//! use stick_snn::neuron::NeuronParams;
//! use stick_snn::simulator::Simulator;
//!
//! let mut module = Module::new("net");
//! let input = module.add_neuron("input", NeuronParams::default()).unwrap();
//! let relay = module.add_neuron("relay", NeuronParams::default()).unwrap();
//! module.connect(&input, &relay, Channel::V, 10.0, 1.0).unwrap();
//!
//! let mut sim = Simulator::new(&module, Encoder::default(), 0.01).unwrap();
//! sim.apply_input_value(0.5, &input, 0.0).unwrap();
//! sim.simulate(100.0).unwrap();
//! assert_eq!(sim.spike_log(relay.uid()).unwrap().len(), 2);
//! ```

pub mod compiler;
pub mod encoder;
pub mod error;
pub mod export;
pub mod network;
pub mod neuron;
pub mod scalar;
pub mod simulator;
pub mod subnetworks;
