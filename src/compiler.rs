//! This module lowers symbolic scalar expressions into STICK networks.
//!
//! The pipeline flattens the expression DAG into one scaffold per node,
//! instantiates the matching subnetwork for each scaffold, wires producer
//! and consumer headers across module boundaries, and packages the result
//! with its input triggers and output reader into an [`ExecutionPlan`].
//! Compilation is deterministic: the same DAG yields identical uids,
//! identical wiring, and an identical plan.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::encoder::Encoder;
use super::error::StickError;
use super::network::{Channel, Module};
use super::neuron::{NeuronHandle, NeuronHeader, NeuronParams};
use super::scalar::{Scalar, ScalarOp};
use super::simulator::Simulator;
use super::subnetworks::{
    AdderNetwork, InjectorNetwork, SignFlipperNetwork, SignedMultiplierNormNetwork, T_SYN,
};

/// The operation kind of a lowered DAG node.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OpKind {
    Load,
    Add,
    Neg,
    Mul,
}

impl OpKind {
    fn label(&self) -> &'static str {
        match self {
            OpKind::Load => "load",
            OpKind::Add => "add",
            OpKind::Neg => "neg",
            OpKind::Mul => "mul",
        }
    }

    /// Returns the fixed plug schema of this operation kind.
    pub fn plugs(&self) -> &'static [Plug] {
        match self {
            OpKind::Load => &[Plug::Out],
            OpKind::Neg => &[Plug::In, Plug::Out],
            OpKind::Add | OpKind::Mul => &[Plug::InA, Plug::InB, Plug::Out],
        }
    }
}

/// A named logical port on an op scaffold. After instantiation every plug
/// resolves to a [`NeuronHeader`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Plug {
    In,
    InA,
    InB,
    Out,
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Plug::In => write!(f, "in"),
            Plug::InA => write!(f, "in_a"),
            Plug::InB => write!(f, "in_b"),
            Plug::Out => write!(f, "out"),
        }
    }
}

/// Compilation intermediate bound to one DAG node: the operation kind and
/// the mapping from logical plugs to the neuron headers of the
/// instantiated subnetwork.
#[derive(Debug)]
pub struct OpModuleScaffold {
    kind: OpKind,
    ordinal: usize,
    module_name: String,
    plugs: HashMap<Plug, NeuronHeader>,
}

impl OpModuleScaffold {
    /// Returns the operation kind.
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Returns the position of the scaffold in topological order.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Returns the name of the instantiated subnetwork module.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Returns the header a plug resolved to.
    pub fn plug(&self, plug: Plug) -> Option<&NeuronHeader> {
        self.plugs.get(&plug)
    }
}

/// A wiring directive produced by flattening: an edge between two
/// scaffolds, identified by their ordinals.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Connection {
    pub source: usize,
    pub source_plug: Plug,
    pub target: usize,
    pub target_plug: Plug,
}

/// The sign of an interval-coded value.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    /// Returns `+1.0` or `-1.0`.
    pub fn factor(&self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }
}

/// A pending external stimulus: a normalized magnitude injected as a spike
/// pair on one polarity neuron of an injector, starting at `t0`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct InputTrigger {
    value: f64,
    sign: Sign,
    target: NeuronHandle,
    t0: f64,
}

impl InputTrigger {
    /// Returns the normalized magnitude in `[0, 1]`.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the sign of the loaded value.
    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// Returns the neuron receiving the spike pair.
    pub fn target(&self) -> &NeuronHandle {
        &self.target
    }

    /// Returns the absolute injection time of the first spike.
    pub fn t0(&self) -> f64 {
        self.t0
    }
}

/// The output header of a compiled computation, with its decoding contract:
/// whichever of the two neurons emits exactly two spikes carries the
/// result.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OutputReader {
    plus: NeuronHandle,
    minus: NeuronHandle,
}

impl OutputReader {
    /// Returns the plus-side neuron.
    pub fn plus(&self) -> &NeuronHandle {
        &self.plus
    }

    /// Returns the minus-side neuron.
    pub fn minus(&self) -> &NeuronHandle {
        &self.minus
    }

    /// Decode the simulator's spike log into a signed denormalized value.
    /// Decoding failures leave the logs untouched and inspectable.
    pub fn decode(&self, sim: &Simulator, max_range: f64) -> Result<f64, StickError> {
        let plus = sim.spike_log(self.plus.uid()).unwrap_or(&[]);
        let minus = sim.spike_log(self.minus.uid()).unwrap_or(&[]);
        match (plus.len() == 2, minus.len() == 2) {
            (true, false) => Ok(sim.encoder().decode_interval(plus[1] - plus[0]) * max_range),
            (false, true) => Ok(-sim.encoder().decode_interval(minus[1] - minus[0]) * max_range),
            _ => Err(StickError::UndecodableOutput {
                plus_spikes: plus.len(),
                minus_spikes: minus.len(),
            }),
        }
    }
}

/// The compiled artefact: the network, its input triggers, the output
/// reader, and the compilation range. Immutable after compilation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ExecutionPlan {
    network: Module,
    triggers: Vec<InputTrigger>,
    reader: OutputReader,
    max_range: f64,
    encoder: Encoder,
}

impl ExecutionPlan {
    /// Returns the top-level network module.
    pub fn network(&self) -> &Module {
        &self.network
    }

    /// Returns the input triggers, one per `Load` node.
    pub fn triggers(&self) -> &[InputTrigger] {
        &self.triggers
    }

    /// Returns the output reader.
    pub fn reader(&self) -> &OutputReader {
        &self.reader
    }

    /// Returns the range the computation was compiled for.
    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Returns the encoder the plan was compiled with.
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Decode the result of a finished simulation of this plan.
    pub fn decode_output(&self, sim: &Simulator) -> Result<f64, StickError> {
        self.reader.decode(sim, self.max_range)
    }

    /// Run the plan to completion and decode the result.
    pub fn run(&self, dt: f64, simulation_time: f64) -> Result<f64, StickError> {
        let mut sim = Simulator::init_with_plan(self, self.encoder, dt)?;
        sim.simulate(simulation_time)?;
        self.decode_output(&sim)
    }
}

/// Lowers scalar expressions with a chosen encoder, neuron parameters, and
/// trigger start time.
#[derive(Debug, PartialEq, Clone)]
pub struct Compiler {
    encoder: Encoder,
    params: NeuronParams,
    t0: f64,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler {
            encoder: Encoder::default(),
            params: NeuronParams::default(),
            t0: 0.0,
        }
    }
}

impl Compiler {
    pub fn new(encoder: Encoder, params: NeuronParams, t0: f64) -> Self {
        Compiler {
            encoder,
            params,
            t0,
        }
    }

    /// Compile the expression rooted at `root` into an execution plan.
    ///
    /// `max_range` rescales every literal into the normalized domain:
    /// a `Load(v)` with `|v| > max_range` aborts compilation with a range
    /// error, and the decoded output is scaled back by the same factor.
    pub fn compile(&self, root: &Scalar, max_range: f64) -> Result<ExecutionPlan, StickError> {
        if !(max_range > 0.0) || !max_range.is_finite() {
            return Err(StickError::Range {
                value: max_range,
                max_range,
            });
        }

        let mut network = Module::new("net");

        // Flatten: one scaffold slot per distinct node, leaves first, plus
        // the list of producer-to-consumer edges.
        let nodes = root.topological_order();
        let ordinals: HashMap<usize, usize> = nodes
            .iter()
            .enumerate()
            .map(|(ordinal, node)| (node.node_id(), ordinal))
            .collect();

        let mut connections = vec![];
        for (ordinal, node) in nodes.iter().enumerate() {
            let input_plugs: &[Plug] = match node.op() {
                ScalarOp::Load(_) => &[],
                ScalarOp::Neg(_) => &[Plug::In],
                ScalarOp::Add(_, _) | ScalarOp::Mul(_, _) => &[Plug::InA, Plug::InB],
            };
            for (operand, plug) in node.operands().iter().zip(input_plugs) {
                connections.push(Connection {
                    source: ordinals[&operand.node_id()],
                    source_plug: Plug::Out,
                    target: ordinal,
                    target_plug: *plug,
                });
            }
        }
        debug!(
            "Flattened expression: {} nodes, {} connections",
            nodes.len(),
            connections.len()
        );

        // Spawn, fill, instantiate: build the subnetwork for each scaffold,
        // record its headers, and attach it under the top module. Child
        // names append the scaffold ordinal, so they are unique by
        // construction.
        let mut scaffolds = vec![];
        for (ordinal, node) in nodes.iter().enumerate() {
            let scaffold = self.spawn(&mut network, node, ordinal, max_range)?;
            scaffolds.push(scaffold);
        }

        // Wire: headers are connected pairwise so the signed coding
        // survives the module boundary.
        for connection in &connections {
            let source = self.plug_header(&scaffolds[connection.source], connection.source_plug)?;
            let target = self.plug_header(&scaffolds[connection.target], connection.target_plug)?;
            let we = self.params.v_t();
            network.connect(&source.plus, &target.plus, Channel::V, we, T_SYN)?;
            network.connect(&source.minus, &target.minus, Channel::V, we, T_SYN)?;
        }

        // Triggers: one spike pair per literal, routed to the polarity
        // matching its sign.
        let mut triggers = vec![];
        for (ordinal, node) in nodes.iter().enumerate() {
            let value = match node.as_load() {
                Some(value) => value,
                None => continue,
            };
            let magnitude = value.abs() / max_range;
            if !(magnitude <= 1.0) {
                return Err(StickError::Range { value, max_range });
            }
            let sign = if value < 0.0 { Sign::Minus } else { Sign::Plus };
            let out = self.plug_header(&scaffolds[ordinal], Plug::Out)?;
            let target = match sign {
                Sign::Plus => out.plus.clone(),
                Sign::Minus => out.minus.clone(),
            };
            triggers.push(InputTrigger {
                value: magnitude,
                sign,
                target,
                t0: self.t0,
            });
        }

        // Reader: the root scaffold's out header.
        let root_scaffold = scaffolds
            .last()
            .ok_or_else(|| StickError::NeuronNotFound("empty expression".to_string()))?;
        let out = self.plug_header(root_scaffold, Plug::Out)?;
        let reader = OutputReader {
            plus: out.plus.clone(),
            minus: out.minus.clone(),
        };

        network.validate_unique_uids()?;
        info!(
            "Compiled expression into {} subnetworks ({} neurons, {} synapses)",
            scaffolds.len(),
            network.num_neurons(),
            network.num_synapses()
        );

        Ok(ExecutionPlan {
            network,
            triggers,
            reader,
            max_range,
            encoder: self.encoder,
        })
    }

    fn spawn(
        &self,
        network: &mut Module,
        node: &Scalar,
        ordinal: usize,
        max_range: f64,
    ) -> Result<OpModuleScaffold, StickError> {
        let kind = match node.op() {
            ScalarOp::Load(_) => OpKind::Load,
            ScalarOp::Add(_, _) => OpKind::Add,
            ScalarOp::Neg(_) => OpKind::Neg,
            ScalarOp::Mul(_, _) => OpKind::Mul,
        };
        let module_name = network.scoped_name(&format!("{}_{}", kind.label(), ordinal));
        let mut plugs = HashMap::new();

        let child = match kind {
            OpKind::Load => {
                let net = InjectorNetwork::build(module_name.clone(), &self.encoder, self.params)?;
                plugs.insert(Plug::Out, net.out().clone());
                net.into_module()
            }
            OpKind::Neg => {
                let net =
                    SignFlipperNetwork::build(module_name.clone(), &self.encoder, self.params)?;
                plugs.insert(Plug::In, net.input().clone());
                plugs.insert(Plug::Out, net.out().clone());
                net.into_module()
            }
            OpKind::Add => {
                let net = AdderNetwork::build(module_name.clone(), &self.encoder, self.params)?;
                plugs.insert(Plug::InA, net.in_a().clone());
                plugs.insert(Plug::InB, net.in_b().clone());
                plugs.insert(Plug::Out, net.out().clone());
                net.into_module()
            }
            OpKind::Mul => {
                let net = SignedMultiplierNormNetwork::build(
                    module_name.clone(),
                    &self.encoder,
                    self.params,
                    max_range,
                )?;
                plugs.insert(Plug::InA, net.in_a().clone());
                plugs.insert(Plug::InB, net.in_b().clone());
                plugs.insert(Plug::Out, net.out().clone());
                net.into_module()
            }
        };
        network.add_child(child);

        Ok(OpModuleScaffold {
            kind,
            ordinal,
            module_name,
            plugs,
        })
    }

    fn plug_header<'a>(
        &self,
        scaffold: &'a OpModuleScaffold,
        plug: Plug,
    ) -> Result<&'a NeuronHeader, StickError> {
        scaffold.plug(plug).ok_or_else(|| {
            StickError::NeuronNotFound(format!("{}.{}", scaffold.module_name(), plug))
        })
    }
}

/// Compile the expression rooted at `root` with the default encoder and
/// neuron parameters, triggering inputs at `t0 = 0`.
pub fn compile_computation(root: &Scalar, max_range: f64) -> Result<ExecutionPlan, StickError> {
    Compiler::default().compile(root, max_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_load_plan_shape() {
        let plan = compile_computation(&Scalar::new(-7.0), 100.0).unwrap();
        assert_eq!(plan.triggers().len(), 1);
        let trigger = &plan.triggers()[0];
        assert_eq!(trigger.sign(), Sign::Minus);
        assert!((trigger.value() - 0.07).abs() < 1e-12);
        assert_eq!(trigger.target().uid(), "net.load_0.out_minus");
        assert_eq!(plan.reader().minus().uid(), "net.load_0.out_minus");
    }

    #[test]
    fn test_compile_rejects_out_of_range_load() {
        let expr = Scalar::new(150.0) + Scalar::new(1.0);
        assert_eq!(
            compile_computation(&expr, 100.0),
            Err(StickError::Range {
                value: 150.0,
                max_range: 100.0
            })
        );
    }

    #[test]
    fn test_compile_accepts_value_equal_to_max_range() {
        let plan = compile_computation(&Scalar::new(100.0), 100.0).unwrap();
        assert_eq!(plan.triggers()[0].value(), 1.0);
    }

    #[test]
    fn test_compile_shared_subexpression_instantiated_once() {
        let a = Scalar::new(2.0);
        let shared = &a + &Scalar::new(3.0);
        let expr = &shared + &shared;
        let plan = compile_computation(&expr, 100.0).unwrap();
        // Nodes: two loads, the shared add, the outer add.
        assert_eq!(plan.network().children().len(), 4);
        assert_eq!(plan.triggers().len(), 2);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let build = || {
            let a = Scalar::new(2.0);
            let b = Scalar::new(3.0);
            (&a + &b) * Scalar::new(4.0)
        };
        let plan_1 = compile_computation(&build(), 100.0).unwrap();
        let plan_2 = compile_computation(&build(), 100.0).unwrap();
        assert_eq!(plan_1, plan_2);
    }

    #[test]
    fn test_compile_all_uids_unique() {
        let a = Scalar::new(2.0);
        let b = Scalar::new(3.0);
        let expr = (&a + &b) * (-(&a * &b));
        let plan = compile_computation(&expr, 100.0).unwrap();
        assert!(plan.network().validate_unique_uids().is_ok());
    }

    #[test]
    fn test_compile_wires_headers_in_pairs() {
        let expr = -Scalar::new(5.0);
        let plan = compile_computation(&expr, 10.0).unwrap();
        // The only top-level synapses are the two V wires of the single
        // connection.
        let top_synapses = plan.network().synapses();
        assert_eq!(top_synapses.len(), 2);
        assert!(top_synapses
            .iter()
            .all(|s| s.channel() == Channel::V && s.delay() == T_SYN));
        assert_eq!(top_synapses[0].source().uid(), "net.load_0.out_plus");
        assert_eq!(top_synapses[0].target().uid(), "net.neg_1.in_plus");
        assert_eq!(top_synapses[1].source().uid(), "net.load_0.out_minus");
        assert_eq!(top_synapses[1].target().uid(), "net.neg_1.in_minus");
    }

    #[test]
    fn test_plug_schema_per_kind() {
        assert_eq!(OpKind::Load.plugs(), &[Plug::Out]);
        assert_eq!(OpKind::Neg.plugs(), &[Plug::In, Plug::Out]);
        assert_eq!(OpKind::Add.plugs(), &[Plug::InA, Plug::InB, Plug::Out]);
        assert_eq!(OpKind::Mul.plugs(), &[Plug::InA, Plug::InB, Plug::Out]);
    }
}
