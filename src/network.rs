//! This module implements the hierarchical network model: typed synapses and
//! the `Module` container owning neurons, synapses, and child modules.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::error::StickError;
use super::neuron::{Neuron, NeuronHandle, NeuronParams};

/// The four synaptic channels of the STICK neuron model.
///
/// | Channel | Effect on the target at delivery |
/// |---------|----------------------------------|
/// | `V`     | instantaneous jump `V += w`      |
/// | `Ge`    | `ge += w` (constant integration) |
/// | `Gf`    | `gf += w` (fast exponential)     |
/// | `Gate`  | `gate += w` (enables the `gf` pathway) |
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Channel {
    V,
    Ge,
    Gf,
    Gate,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Channel::V => write!(f, "V"),
            Channel::Ge => write!(f, "ge"),
            Channel::Gf => write!(f, "gf"),
            Channel::Gate => write!(f, "gate"),
        }
    }
}

/// A directed, typed connection between two neurons.
/// Immutable after creation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Synapse {
    source: NeuronHandle,
    target: NeuronHandle,
    channel: Channel,
    weight: f64,
    delay: f64,
}

impl Synapse {
    /// Returns a handle to the source neuron.
    pub fn source(&self) -> &NeuronHandle {
        &self.source
    }

    /// Returns a handle to the target neuron.
    pub fn target(&self) -> &NeuronHandle {
        &self.target
    }

    /// Returns the synaptic channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns the synaptic weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns the propagation delay.
    pub fn delay(&self) -> f64 {
        self.delay
    }
}

/// A hierarchical container owning neurons, synapses, and child modules.
///
/// A neuron belongs to exactly one module, and its uid is the dotted path of
/// module names followed by its local name, so uniqueness is structural and
/// needs no global registry. Child modules and neurons keep insertion order,
/// which makes uids reproducible across runs.
///
/// # Examples
///
/// ```rust
/// use stick_snn::network::{Channel, Module};
/// use stick_snn::neuron::NeuronParams;
///
/// let mut module = Module::new("net");
/// let a = module.add_neuron("a", NeuronParams::default()).unwrap();
/// let b = module.add_neuron("b", NeuronParams::default()).unwrap();
/// module.connect(&a, &b, Channel::V, 10.0, 1.0).unwrap();
///
/// assert_eq!(a.uid(), "net.a");
/// assert_eq!(module.num_neurons(), 2);
/// assert_eq!(module.num_synapses(), 1);
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Module {
    name: String,
    neurons: Vec<Neuron>,
    synapses: Vec<Synapse>,
    children: Vec<Module>,
}

impl Module {
    /// Create a new empty module with the given (possibly dotted) name.
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            neurons: vec![],
            synapses: vec![],
            children: vec![],
        }
    }

    /// Returns the module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the dotted name a child module or neuron with the given local
    /// name would get under this module.
    pub fn scoped_name(&self, local: &str) -> String {
        format!("{}.{}", self.name, local)
    }

    /// Create a neuron inside this module and return a stable handle to it.
    /// The function returns an error if the local name is already taken.
    pub fn add_neuron(
        &mut self,
        name: &str,
        params: NeuronParams,
    ) -> Result<NeuronHandle, StickError> {
        let uid = self.scoped_name(name);
        if self.neurons.iter().any(|n| n.uid() == uid) {
            return Err(StickError::DuplicateUid(uid));
        }
        let neuron = Neuron::new(uid, name.to_string(), params);
        let handle = neuron.handle();
        self.neurons.push(neuron);
        Ok(handle)
    }

    /// Connect two neurons on the given channel with the given weight and
    /// delay. The function returns an error for a negative delay or a
    /// non-finite weight.
    pub fn connect(
        &mut self,
        source: &NeuronHandle,
        target: &NeuronHandle,
        channel: Channel,
        weight: f64,
        delay: f64,
    ) -> Result<(), StickError> {
        if delay < 0.0 || !delay.is_finite() || !weight.is_finite() {
            return Err(StickError::InvalidSynapseConfig { weight, delay });
        }
        self.synapses.push(Synapse {
            source: source.clone(),
            target: target.clone(),
            channel,
            weight,
            delay,
        });
        Ok(())
    }

    /// Attach a child module. Children keep insertion order.
    pub fn add_child(&mut self, child: Module) {
        self.children.push(child);
    }

    /// Returns a slice of the neurons directly owned by this module.
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Returns a slice of the synapses directly owned by this module.
    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    /// Returns a slice of the child modules.
    pub fn children(&self) -> &[Module] {
        &self.children
    }

    /// Returns every neuron in this module and its descendants, parents
    /// before children, in insertion order.
    pub fn all_neurons(&self) -> Vec<&Neuron> {
        let mut neurons = vec![];
        let mut stack = vec![self];
        while let Some(module) = stack.pop() {
            neurons.extend(module.neurons.iter());
            // Push in reverse so children are visited in insertion order.
            stack.extend(module.children.iter().rev());
        }
        neurons
    }

    /// Returns every synapse in this module and its descendants.
    pub fn all_synapses(&self) -> Vec<&Synapse> {
        let mut synapses = vec![];
        let mut stack = vec![self];
        while let Some(module) = stack.pop() {
            synapses.extend(module.synapses.iter());
            stack.extend(module.children.iter().rev());
        }
        synapses
    }

    /// Returns the total number of neurons in the module tree.
    pub fn num_neurons(&self) -> usize {
        self.all_neurons().len()
    }

    /// Returns the total number of synapses in the module tree.
    pub fn num_synapses(&self) -> usize {
        self.all_synapses().len()
    }

    /// Returns a reference to the neuron with the given uid, searching the
    /// whole module tree.
    pub fn neuron(&self, uid: &str) -> Result<&Neuron, StickError> {
        self.all_neurons()
            .into_iter()
            .find(|n| n.uid() == uid)
            .ok_or_else(|| StickError::NeuronNotFound(uid.to_string()))
    }

    /// Check that every neuron uid in the module tree is unique.
    pub fn validate_unique_uids(&self) -> Result<(), StickError> {
        let mut seen = HashSet::new();
        for neuron in self.all_neurons() {
            if !seen.insert(neuron.uid()) {
                return Err(StickError::DuplicateUid(neuron.uid().to_string()));
            }
        }
        Ok(())
    }

    /// Save the module tree to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a module tree from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::NamedTempFile;

    use super::*;

    fn params() -> NeuronParams {
        NeuronParams::default()
    }

    #[test]
    fn test_module_add_neuron() {
        let mut module = Module::new("net");
        let a = module.add_neuron("a", params()).unwrap();
        assert_eq!(a.uid(), "net.a");
        assert_eq!(
            module.add_neuron("a", params()),
            Err(StickError::DuplicateUid("net.a".to_string()))
        );
    }

    #[test]
    fn test_module_connect_invalid_delay() {
        let mut module = Module::new("net");
        let a = module.add_neuron("a", params()).unwrap();
        let b = module.add_neuron("b", params()).unwrap();
        assert_eq!(
            module.connect(&a, &b, Channel::V, 1.0, -1.0),
            Err(StickError::InvalidSynapseConfig {
                weight: 1.0,
                delay: -1.0
            })
        );
        assert!(module.connect(&a, &b, Channel::Ge, -1.0, 0.0).is_ok());
    }

    #[test]
    fn test_module_hierarchy_uids() {
        let mut top = Module::new("net");
        let mut child = Module::new(top.scoped_name("add_0"));
        let out = child.add_neuron("out_plus", params()).unwrap();
        assert_eq!(out.uid(), "net.add_0.out_plus");
        top.add_child(child);

        assert_eq!(top.num_neurons(), 1);
        assert!(top.validate_unique_uids().is_ok());
        assert_eq!(top.neuron("net.add_0.out_plus").unwrap().name(), "out_plus");
        assert_eq!(
            top.neuron("net.add_0.missing"),
            Err(StickError::NeuronNotFound("net.add_0.missing".to_string()))
        );
    }

    #[test]
    fn test_module_all_neurons_order_is_stable() {
        let mut top = Module::new("net");
        top.add_neuron("a", params()).unwrap();
        let mut first = Module::new(top.scoped_name("first"));
        first.add_neuron("x", params()).unwrap();
        let mut second = Module::new(top.scoped_name("second"));
        second.add_neuron("y", params()).unwrap();
        top.add_child(first);
        top.add_child(second);

        let uids: Vec<_> = top.all_neurons().iter().map(|n| n.uid()).collect();
        assert_eq!(uids, vec!["net.a", "net.first.x", "net.second.y"]);
    }

    #[test]
    fn test_module_duplicate_uid_across_children() {
        let mut top = Module::new("net");
        let mut child_a = Module::new("net.sub");
        child_a.add_neuron("n", params()).unwrap();
        let mut child_b = Module::new("net.sub");
        child_b.add_neuron("n", params()).unwrap();
        top.add_child(child_a);
        top.add_child(child_b);
        assert_eq!(
            top.validate_unique_uids(),
            Err(StickError::DuplicateUid("net.sub.n".to_string()))
        );
    }

    #[test]
    fn test_module_save_load() {
        let mut module = Module::new("net");
        let a = module.add_neuron("a", params()).unwrap();
        let b = module.add_neuron("b", params()).unwrap();
        module.connect(&a, &b, Channel::Gf, 2.5, 1.0).unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        module.save_to(temp_file.path()).unwrap();
        let loaded = Module::load_from(temp_file.path()).unwrap();

        assert_eq!(module, loaded);
    }
}
