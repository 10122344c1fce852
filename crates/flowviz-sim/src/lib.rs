//! File-block pulse simulator.
//!
//! A single tokio interval task drives a [`Stage`]. Starting while running
//! replaces the timer rather than adding a second one; stopping aborts the
//! task and clears every pulse and highlight.

mod stage;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use flowviz_core::catalog::DataTypeCatalog;
use flowviz_core::render::{icon, Element};
use flowviz_core::DEFAULT_ANIMATION_MS;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub use stage::{Pulse, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimState {
    Idle,
    Running,
}

struct Shared {
    stage: Stage,
    catalog: DataTypeCatalog,
    rng: StdRng,
    period: Duration,
}

impl Shared {
    fn tick(&mut self) {
        let ms = self.period.as_millis() as u64;
        let Shared {
            stage,
            catalog,
            rng,
            ..
        } = self;
        if let Some(pulse) = stage.tick(catalog, ms, rng) {
            tracing::trace!(file = %pulse.filename, label = %pulse.label, "pulse");
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A zero period would make the interval panic inside the task.
fn usable_period(period: Duration) -> Duration {
    if period.is_zero() {
        tracing::warn!("zero simulation period, using default");
        Duration::from_millis(DEFAULT_ANIMATION_MS)
    } else {
        period
    }
}

pub struct Simulator {
    shared: Arc<Mutex<Shared>>,
    task: Option<JoinHandle<()>>,
}

impl Simulator {
    pub fn new(period: Duration) -> Self {
        Self::with_rng(period, StdRng::from_os_rng())
    }

    /// Use a fixed generator, e.g. a seeded one in tests.
    pub fn with_rng(period: Duration, rng: StdRng) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                stage: Stage::default(),
                catalog: DataTypeCatalog::default(),
                rng,
                period: usable_period(period),
            })),
            task: None,
        }
    }

    pub fn state(&self) -> SimState {
        match &self.task {
            Some(task) if !task.is_finished() => SimState::Running,
            _ => SimState::Idle,
        }
    }

    pub fn period(&self) -> Duration {
        lock(&self.shared).period
    }

    /// Start from the first container. Any running timer is aborted first so
    /// only one ever exists. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        self.abort_task();
        let period = {
            let mut shared = lock(&self.shared);
            shared.stage.rewind();
            shared.period
        };
        let shared = Arc::clone(&self.shared);
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                lock(&shared).tick();
            }
        }));
        tracing::info!(period_ms = period.as_millis() as u64, "simulation started");
    }

    pub fn stop(&mut self) {
        self.abort_task();
        lock(&self.shared).stage.clear();
        tracing::info!("simulation stopped");
    }

    /// Idle → Running or Running → Idle. Returns the new state.
    pub fn toggle(&mut self) -> SimState {
        match self.state() {
            SimState::Running => self.stop(),
            SimState::Idle => self.start(),
        }
        self.state()
    }

    /// Change the animation period. A running simulation restarts on the new
    /// timer.
    pub fn set_period(&mut self, period: Duration) {
        lock(&self.shared).period = usable_period(period);
        if self.state() == SimState::Running {
            self.start();
        }
    }

    /// Mirror the board's current filenames, in display order.
    pub fn refresh(&self, filenames: Vec<String>) {
        lock(&self.shared).stage.set_containers(filenames);
    }

    pub fn set_catalog(&self, catalog: DataTypeCatalog) {
        lock(&self.shared).catalog = catalog;
    }

    pub fn snapshot(&self) -> Stage {
        lock(&self.shared).stage.clone()
    }

    pub fn element(&self) -> Element {
        lock(&self.shared).stage.element()
    }

    pub fn button_element(&self) -> Element {
        let button = Element::new("button").id("simulateButton");
        match self.state() {
            SimState::Running => button
                .class("running")
                .child(icon("fa-solid fa-stop"))
                .text(" Stop simulation"),
            SimState::Idle => button
                .child(icon("fa-solid fa-play"))
                .text(" Start simulation"),
        }
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.abort_task();
    }
}
