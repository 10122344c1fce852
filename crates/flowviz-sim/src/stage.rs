use flowviz_core::catalog::DataTypeCatalog;
use flowviz_core::render::Element;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

/// A labelled unit of simulated data leaving one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pulse {
    pub container: usize,
    pub filename: String,
    pub label: String,
    pub duration_ms: u64,
}

impl Pulse {
    fn element(&self) -> Element {
        Element::new("div")
            .class("pulse animate")
            .attr(
                "style",
                format!(
                    "left: 50%; top: 100%; --animation-duration: {}ms",
                    self.duration_ms
                ),
            )
            .child(Element::new("span").class("data-label").text(self.label.clone()))
    }
}

/// What the simulation currently shows: the containers in cycle order, the
/// live pulses and the highlighted block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stage {
    containers: Vec<String>,
    cursor: usize,
    pulses: Vec<Pulse>,
    active: Option<usize>,
    ticks: u64,
}

impl Stage {
    pub fn new(containers: Vec<String>) -> Self {
        Self {
            containers,
            ..Self::default()
        }
    }

    pub fn containers(&self) -> &[String] {
        &self.containers
    }

    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Ticks since the last [`Stage::rewind`].
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Swap in a new container list after the board changed.
    pub fn set_containers(&mut self, containers: Vec<String>) {
        self.clear();
        self.cursor = if containers.is_empty() {
            0
        } else {
            self.cursor % containers.len()
        };
        self.containers = containers;
    }

    /// Back to the first container with no transient state.
    pub fn rewind(&mut self) {
        self.clear();
        self.cursor = 0;
        self.ticks = 0;
    }

    /// Remove every pulse and highlight.
    pub fn clear(&mut self) {
        self.pulses.clear();
        self.active = None;
    }

    /// One animation step. The previous step's pulse and highlight expire,
    /// the current container emits a pulse and the next one lights up.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        catalog: &DataTypeCatalog,
        duration_ms: u64,
        rng: &mut R,
    ) -> Option<&Pulse> {
        self.clear();
        if self.containers.is_empty() {
            return None;
        }
        let current = self.cursor % self.containers.len();
        let next = (current + 1) % self.containers.len();
        let filename = self.containers[current].clone();
        let labels = catalog.labels_for(&filename);
        let label = labels.choose(rng).cloned().unwrap_or_default();

        self.pulses.push(Pulse {
            container: current,
            filename,
            label,
            duration_ms,
        });
        self.active = Some(next);
        self.cursor = next;
        self.ticks += 1;
        self.pulses.last()
    }

    pub fn element(&self) -> Element {
        let mut root = Element::new("div").id("simulation");
        for (index, filename) in self.containers.iter().enumerate() {
            let mut block = Element::new("div")
                .class("file-block")
                .child(Element::new("span").class("filename").text(filename.clone()));
            if self.active == Some(index) {
                block.add_class("active");
            }
            let mut container = Element::new("div")
                .class("file-container")
                .attr("data-index", index.to_string())
                .child(block);
            for pulse in self.pulses.iter().filter(|p| p.container == index) {
                container.push(pulse.element());
            }
            root.push(container);
        }
        root
    }
}
