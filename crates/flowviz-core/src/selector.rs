//! Flow selector: built-in examples, then user-saved flows from the listing.

use serde::Serialize;

use crate::render::Element;
use crate::{CoreError, FlowEntry, FlowKind};

/// Selector value that switches to local file upload instead of a fetch.
pub const CUSTOM_VALUE: &str = "custom";

const SEPARATOR_LABEL: &str = "─────────────────";

const BUILTIN_OPTIONS: [(&str, &str); 3] = [
    ("llm_pipeline", "LLM pipeline"),
    ("vector_search", "Vector search"),
    (CUSTOM_VALUE, "Custom JSON file"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub disabled: bool,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
        }
    }
}

/// Where a selector value leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Show the file picker; nothing is fetched.
    Upload,
    /// Fetch the flow document at this path.
    Fetch(String),
}

/// Values starting with `/` are server paths; anything else names a
/// built-in example.
pub fn resolve(value: &str) -> Selection {
    if value == CUSTOM_VALUE {
        Selection::Upload
    } else if value.starts_with('/') {
        Selection::Fetch(value.to_string())
    } else {
        Selection::Fetch(format!("examples/{value}.json"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowSelector {
    options: Vec<SelectOption>,
    selected: String,
}

impl Default for FlowSelector {
    fn default() -> Self {
        let options: Vec<_> = BUILTIN_OPTIONS
            .iter()
            .map(|(value, label)| SelectOption::new(*value, *label))
            .collect();
        let selected = options[0].value.clone();
        Self { options, selected }
    }
}

impl FlowSelector {
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Rebuild the user section from a fresh listing. Built-in options are
    /// kept; the current selection survives when its option still exists.
    pub fn refresh(&mut self, entries: &[FlowEntry]) {
        self.options.truncate(BUILTIN_OPTIONS.len());
        let user: Vec<_> = entries.iter().filter(|e| e.kind == FlowKind::User).collect();
        if !user.is_empty() {
            self.options.push(SelectOption {
                value: String::new(),
                label: SEPARATOR_LABEL.to_string(),
                disabled: true,
            });
            self.options.extend(
                user.into_iter()
                    .map(|e| SelectOption::new(e.path.clone(), format!("{} (user)", e.name))),
            );
        }
        if !self.has_option(&self.selected) {
            self.selected = self.options[0].value.clone();
        }
    }

    fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| !o.disabled && o.value == value)
    }

    pub fn select(&mut self, value: &str) -> Result<Selection, CoreError> {
        if !self.has_option(value) {
            return Err(CoreError::Validation(format!("Unknown flow \"{value}\"")));
        }
        self.selected = value.to_string();
        Ok(resolve(value))
    }

    pub fn element(&self) -> Element {
        let mut select = Element::new("select").id("flow-selector");
        for option in &self.options {
            let mut el = Element::new("option")
                .attr("value", option.value.clone())
                .text(option.label.clone());
            if option.disabled {
                el = el.attr("disabled", "disabled");
            }
            if !option.disabled && option.value == self.selected {
                el = el.attr("selected", "selected");
            }
            select.push(el);
        }
        select
    }
}
