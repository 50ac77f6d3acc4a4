//! Flat record export of simulation logs, for external plotting and
//! persistence tooling.
//!
//! Consumers get plain `(uid, time)` / `(uid, time, V)` record lists in
//! ascending `(time, uid)` order, decoupled from the simulator's internal
//! map layout.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::simulator::Simulator;

/// One spike of one neuron.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SpikeRecord {
    pub uid: String,
    pub time: f64,
}

/// One voltage sample of one neuron.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct VoltageRecord {
    pub uid: String,
    pub time: f64,
    pub v: f64,
}

/// Returns every logged spike, ascending by `(time, uid)`.
pub fn spike_records(sim: &Simulator) -> Vec<SpikeRecord> {
    sim.spike_logs()
        .iter()
        .flat_map(|(uid, times)| {
            times.iter().map(|t| SpikeRecord {
                uid: uid.clone(),
                time: *t,
            })
        })
        .sorted_by(|a, b| a.time.total_cmp(&b.time).then_with(|| a.uid.cmp(&b.uid)))
        .collect()
}

/// Returns every logged voltage sample, ascending by `(time, uid)`.
pub fn voltage_records(sim: &Simulator) -> Vec<VoltageRecord> {
    sim.voltage_logs()
        .iter()
        .flat_map(|(uid, samples)| {
            samples.iter().map(|(t, v)| VoltageRecord {
                uid: uid.clone(),
                time: *t,
                v: *v,
            })
        })
        .sorted_by(|a, b| a.time.total_cmp(&b.time).then_with(|| a.uid.cmp(&b.uid)))
        .collect()
}

/// Write the spike records of a finished simulation to a JSON file.
pub fn save_spike_records<P: AsRef<Path>>(sim: &Simulator, path: P) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &spike_records(sim))?;
    writer.flush()?;
    Ok(())
}

/// Write the voltage records of a finished simulation to a JSON file.
pub fn save_voltage_records<P: AsRef<Path>>(sim: &Simulator, path: P) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &voltage_records(sim))?;
    writer.flush()?;
    Ok(())
}
