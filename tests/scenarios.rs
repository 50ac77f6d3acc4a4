//! End-to-end scenarios: compile a symbolic expression, simulate the
//! resulting network, and check the decoded output against the reference
//! values, all with the reference timing (`Tmin = 10`, `Tcod = 100`,
//! `dt = 0.01`, `max_range = 100`).

use stick_snn::compiler::{compile_computation, Sign};
use stick_snn::encoder::Encoder;
use stick_snn::error::StickError;
use stick_snn::neuron::NeuronParams;
use stick_snn::scalar::Scalar;
use stick_snn::simulator::Simulator;
use stick_snn::subnetworks::ExponentialNetwork;

const DT: f64 = 0.01;
const MAX_RANGE: f64 = 100.0;

/// Compile, simulate, decode, and check the reader sides: the losing
/// polarity must stay silent for a well-formed signed computation.
fn run(expr: &Scalar, simulation_time: f64) -> f64 {
    let _ = env_logger::builder().is_test(true).try_init();
    let plan = compile_computation(expr, MAX_RANGE).unwrap();
    let mut sim = Simulator::init_with_plan(&plan, *plan.encoder(), DT).unwrap();
    sim.set_voltage_recording(false);
    sim.simulate(simulation_time).unwrap();

    let result = plan.decode_output(&sim).unwrap();
    let loser = if result < 0.0 {
        plan.reader().plus()
    } else {
        plan.reader().minus()
    };
    assert!(
        sim.spike_log(loser.uid()).is_none(),
        "losing polarity {} spiked",
        loser.uid()
    );
    result
}

fn assert_within_two_percent(actual: f64, expected: f64) {
    let tolerance = 0.02 * expected.abs().max(1e-9);
    assert!(
        (actual - expected).abs() <= tolerance,
        "decoded {} but expected {} (±{})",
        actual,
        expected,
        tolerance
    );
}

#[test]
fn scenario_1_load() {
    let result = run(&Scalar::new(0.5), 150.0);
    assert!(result >= 0.0);
    assert_within_two_percent(result, 0.5);
}

#[test]
fn scenario_2_add() {
    let expr = Scalar::new(2.0) + Scalar::new(3.0);
    assert_within_two_percent(run(&expr, 300.0), 5.0);
}

#[test]
fn scenario_3_add_then_mul() {
    let expr = (Scalar::new(2.0) + Scalar::new(3.0)) * Scalar::new(4.0);
    assert_within_two_percent(run(&expr, 600.0), 20.0);
}

#[test]
fn scenario_4_neg() {
    let expr = -Scalar::new(7.0);
    let result = run(&expr, 200.0);
    assert!(result < 0.0);
    assert_within_two_percent(result, -7.0);
}

#[test]
fn scenario_5_add_with_opposite_signs() {
    let expr = Scalar::new(3.0) + (-Scalar::new(5.0));
    let result = run(&expr, 400.0);
    assert!(result < 0.0);
    assert_within_two_percent(result, -2.0);
}

#[test]
fn scenario_6_exponential_subnet_in_isolation() {
    let encoder = Encoder::default();
    let params = NeuronParams::default();
    let net = ExponentialNetwork::build("net.exp", &encoder, params).unwrap();
    let (input, out) = (net.input().clone(), net.out().clone());
    let module = net.into_module();

    let mut sim = Simulator::new(&module, encoder, DT).unwrap();
    sim.apply_input_value(0.5, &input, 10.0).unwrap();
    sim.simulate(150.0).unwrap();

    let spikes = sim.spike_log(out.uid()).unwrap();
    assert_eq!(spikes.len(), 2);
    let expected =
        encoder.t_min() + encoder.t_cod() * (-0.5 * encoder.t_cod() / params.tau_f()).exp();
    assert_within_two_percent(spikes[1] - spikes[0], expected);
}

#[test]
fn boundary_load_zero() {
    let result = run(&Scalar::new(0.0), 150.0);
    assert!(result.abs() <= 0.02);
}

#[test]
fn boundary_load_equal_to_max_range() {
    let result = run(&Scalar::new(100.0), 300.0);
    assert_within_two_percent(result, 100.0);
}

#[test]
fn boundary_subtraction_desugars_and_runs() {
    let expr = Scalar::new(4.0) - Scalar::new(6.5);
    let result = run(&expr, 400.0);
    assert_within_two_percent(result, -2.5);
}

#[test]
fn boundary_shared_subexpression_fans_out() {
    let shared = Scalar::new(2.0) + Scalar::new(3.0);
    let expr = &shared + &shared;

    let plan = compile_computation(&expr, MAX_RANGE).unwrap();
    // Four distinct nodes, four subnetworks, despite two uses of `shared`.
    assert_eq!(plan.network().children().len(), 4);

    assert_within_two_percent(run(&expr, 500.0), 10.0);
}

#[test]
fn compile_time_range_error() {
    let expr = Scalar::new(250.0) + Scalar::new(1.0);
    assert_eq!(
        compile_computation(&expr, MAX_RANGE),
        Err(StickError::Range {
            value: 250.0,
            max_range: MAX_RANGE
        })
    );
}

#[test]
fn undecodable_output_is_reported_without_losing_logs() {
    // Too short a horizon: the adder never emits its output pair.
    let expr = Scalar::new(2.0) + Scalar::new(3.0);
    let plan = compile_computation(&expr, MAX_RANGE).unwrap();
    let mut sim = Simulator::init_with_plan(&plan, *plan.encoder(), DT).unwrap();
    sim.set_voltage_recording(false);
    sim.simulate(30.0).unwrap();

    assert!(matches!(
        plan.decode_output(&sim),
        Err(StickError::UndecodableOutput { .. })
    ));
    // The injector spikes are still there for inspection.
    assert!(!sim.spike_logs().is_empty());
}

#[test]
fn determinism_across_runs() {
    let build = || (Scalar::new(2.0) + Scalar::new(3.0)) * Scalar::new(4.0);
    let run_once = || {
        let plan = compile_computation(&build(), MAX_RANGE).unwrap();
        let mut sim = Simulator::init_with_plan(&plan, *plan.encoder(), DT).unwrap();
        sim.set_voltage_recording(false);
        sim.simulate(600.0).unwrap();
        let mut spikes: Vec<(String, Vec<f64>)> = sim
            .spike_logs()
            .iter()
            .map(|(uid, times)| (uid.clone(), times.clone()))
            .collect();
        spikes.sort_by(|a, b| a.0.cmp(&b.0));
        spikes
    };
    let first = run_once();
    let second = run_once();
    assert_eq!(first, second);
}

#[test]
fn triggers_carry_signs_and_normalized_magnitudes() {
    let expr = Scalar::new(3.0) + (-Scalar::new(5.0));
    let plan = compile_computation(&expr, MAX_RANGE).unwrap();

    let signs: Vec<Sign> = plan.triggers().iter().map(|t| t.sign()).collect();
    assert_eq!(signs, vec![Sign::Plus, Sign::Plus]);
    // Neg is a network, not a trigger property: both loads are positive.
    assert!(plan
        .triggers()
        .iter()
        .all(|t| (0.0..=1.0).contains(&t.value())));
}
