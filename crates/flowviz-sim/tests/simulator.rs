use std::time::Duration;

use flowviz_core::catalog::DataTypeCatalog;
use flowviz_sim::{SimState, Simulator};
use rand::rngs::StdRng;
use rand::SeedableRng;

const PERIOD: Duration = Duration::from_millis(1200);

fn simulator(files: &[&str]) -> Simulator {
    let sim = Simulator::with_rng(PERIOD, StdRng::seed_from_u64(42));
    sim.refresh(files.iter().map(|f| f.to_string()).collect());
    sim
}

#[tokio::test(start_paused = true)]
async fn first_pulse_waits_one_period() {
    let mut sim = simulator(&["api.py", "utils.py"]);
    sim.start();
    tokio::time::sleep(PERIOD / 2).await;
    assert_eq!(sim.snapshot().ticks(), 0);
    tokio::time::sleep(PERIOD).await;
    assert_eq!(sim.snapshot().ticks(), 1);
}

#[tokio::test(start_paused = true)]
async fn starting_twice_keeps_one_timer() {
    let mut sim = simulator(&["api.py", "utils.py", "models.py"]);
    sim.start();
    sim.start();
    tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
    let stage = sim.snapshot();
    assert_eq!(stage.ticks(), 3);
    assert_eq!(stage.pulses().len(), 1);
    assert_eq!(sim.state(), SimState::Running);
}

#[tokio::test(start_paused = true)]
async fn stop_clears_transient_state() {
    let mut sim = simulator(&["api.py", "utils.py"]);
    sim.start();
    tokio::time::sleep(PERIOD + PERIOD / 2).await;
    assert_eq!(sim.snapshot().pulses().len(), 1);
    sim.stop();
    assert_eq!(sim.state(), SimState::Idle);
    let stage = sim.snapshot();
    assert!(stage.pulses().is_empty());
    assert_eq!(stage.active(), None);

    tokio::time::sleep(PERIOD * 2).await;
    assert_eq!(sim.snapshot().ticks(), 1);
}

#[tokio::test(start_paused = true)]
async fn toggle_flips_state() {
    let mut sim = simulator(&["a.js"]);
    assert_eq!(sim.toggle(), SimState::Running);
    assert!(sim.button_element().has_class("running"));
    assert_eq!(sim.toggle(), SimState::Idle);
    assert!(sim.button_element().text_content().contains("Start simulation"));
}

#[tokio::test(start_paused = true)]
async fn labels_follow_updated_catalog() {
    let mut sim = simulator(&["loader.rs"]);
    let mut catalog = DataTypeCatalog::default();
    catalog.sync_with(["loader.rs"]);
    catalog.remove_label("loader.rs", "Data");
    catalog.remove_label("loader.rs", "Information");
    sim.set_catalog(catalog);
    sim.start();
    tokio::time::sleep(PERIOD + PERIOD / 2).await;
    assert_eq!(sim.snapshot().pulses()[0].label, "Result");
}

#[tokio::test(start_paused = true)]
async fn new_period_restarts_timer() {
    let mut sim = simulator(&["a.py", "b.py"]);
    sim.start();
    sim.set_period(Duration::from_millis(300));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let stage = sim.snapshot();
    assert_eq!(stage.ticks(), 3);
    assert_eq!(stage.pulses()[0].duration_ms, 300);
}

#[tokio::test(start_paused = true)]
async fn zero_period_falls_back_to_default() {
    let mut sim = Simulator::with_rng(Duration::ZERO, StdRng::seed_from_u64(7));
    sim.refresh(vec!["a.py".into(), "b.py".into()]);
    assert_eq!(sim.period(), PERIOD);
    sim.start();
    tokio::time::sleep(PERIOD + PERIOD / 2).await;
    assert_eq!(sim.state(), SimState::Running);
    assert_eq!(sim.snapshot().ticks(), 1);

    sim.set_period(Duration::ZERO);
    assert_eq!(sim.period(), PERIOD);
    assert_eq!(sim.state(), SimState::Running);
}
