//! The data-type catalog: which labels each file emits in the simulator.
//!
//! Keys are filenames (or filename suffixes), values are ordered label
//! lists. The catalog is persisted in client-local storage, never on the
//! server.

use indexmap::IndexMap;

use crate::render::{icon, Element};
use crate::storage::LocalStore;
use crate::CoreError;

/// Local storage key holding the catalog JSON.
pub const DATA_TYPES_KEY: &str = "dataTypes";

/// Labels used when neither the filename nor any suffix key matches.
pub const GENERIC_LABELS: [&str; 3] = ["Data", "Info", "Message"];

pub fn default_entries() -> IndexMap<String, Vec<String>> {
    let table: [(&str, [&str; 3]); 5] = [
        ("api.py", ["API Request", "API Response", "Endpoint Data"]),
        ("search_engine.py", ["Search Query", "Search Results", "Index Data"]),
        ("utils.py", ["Utility Data", "Formatted Date", "Validation Result"]),
        ("models.py", ["Data Model", "Schema", "Database Query"]),
        ("config.py", ["Config Data", "Environment Variable", "Setting"]),
    ];
    table
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect()
}

/// Labels seeded for a newly visible file, chosen by extension.
pub fn seed_labels(filename: &str) -> Vec<String> {
    let labels: [&str; 3] = if filename.ends_with(".py") {
        ["Python Data", "Module Info", "Function Result"]
    } else if filename.ends_with(".js") {
        ["JavaScript Data", "JSON Object", "Function Result"]
    } else if filename.ends_with(".html") {
        ["HTML Content", "DOM Event", "Template Data"]
    } else if filename.ends_with(".css") {
        ["Style Property", "Media Query", "Animation Data"]
    } else {
        ["Data", "Information", "Result"]
    };
    labels.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTypeCatalog {
    entries: IndexMap<String, Vec<String>>,
    /// Scratch list of labels waiting to be committed under a new file type.
    pending: Vec<String>,
}

impl Default for DataTypeCatalog {
    fn default() -> Self {
        Self {
            entries: default_entries(),
            pending: Vec::new(),
        }
    }
}

impl DataTypeCatalog {
    pub fn from_entries(entries: IndexMap<String, Vec<String>>) -> Self {
        Self {
            entries,
            pending: Vec::new(),
        }
    }

    /// Load from local storage. Absent or corrupt entries give the defaults.
    pub fn load(store: &dyn LocalStore) -> Self {
        let Some(raw) = store.get_item(DATA_TYPES_KEY) else {
            return Self::default();
        };
        match serde_json::from_str::<IndexMap<String, Vec<String>>>(&raw) {
            Ok(entries) => Self::from_entries(entries),
            Err(e) => {
                tracing::error!(error = %e, "corrupt data-type catalog; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn LocalStore) -> Result<(), CoreError> {
        let json = serde_json::to_string(&self.entries)?;
        store.set_item(DATA_TYPES_KEY, &json)
    }

    pub fn entries(&self) -> &IndexMap<String, Vec<String>> {
        &self.entries
    }

    pub fn get(&self, file_type: &str) -> Option<&[String]> {
        self.entries.get(file_type).map(Vec::as_slice)
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Labels a file emits: its own entry, else the first key the filename
    /// ends with, else the generic list.
    pub fn labels_for(&self, filename: &str) -> Vec<String> {
        if let Some(labels) = self.entries.get(filename).filter(|l| !l.is_empty()) {
            return labels.clone();
        }
        self.entries
            .iter()
            .find(|(key, labels)| !labels.is_empty() && filename.ends_with(key.as_str()))
            .map(|(_, labels)| labels.clone())
            .unwrap_or_else(|| GENERIC_LABELS.iter().map(|s| s.to_string()).collect())
    }

    // --- Scratch list ---

    pub fn add_pending(&mut self, label: &str) -> Result<(), CoreError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(CoreError::Validation("Enter a data type".to_string()));
        }
        if self.pending.iter().any(|l| l == label) {
            return Err(CoreError::Validation(
                "This data type has already been added".to_string(),
            ));
        }
        self.pending.push(label.to_string());
        Ok(())
    }

    pub fn remove_pending(&mut self, label: &str) {
        self.pending.retain(|l| l != label);
    }

    /// Store the scratch list as the labels of `file_type` and clear it.
    /// Returns how many labels were committed.
    pub fn commit_pending(&mut self, file_type: &str) -> Result<usize, CoreError> {
        let file_type = file_type.trim();
        if file_type.is_empty() {
            return Err(CoreError::Validation("Enter a file type name".to_string()));
        }
        if self.pending.is_empty() {
            return Err(CoreError::Validation(
                "Add at least one data type".to_string(),
            ));
        }
        let labels = std::mem::take(&mut self.pending);
        let count = labels.len();
        self.entries.insert(file_type.to_string(), labels);
        Ok(count)
    }

    // --- Entries ---

    /// Remove a file type and all of its labels.
    pub fn delete_file_type(&mut self, file_type: &str) -> bool {
        self.entries.shift_remove(file_type).is_some()
    }

    /// Remove one label; a file type left with no labels is removed too.
    pub fn remove_label(&mut self, file_type: &str, label: &str) -> bool {
        let Some(labels) = self.entries.get_mut(file_type) else {
            return false;
        };
        let before = labels.len();
        labels.retain(|l| l != label);
        let removed = labels.len() != before;
        if labels.is_empty() {
            self.entries.shift_remove(file_type);
        }
        removed
    }

    pub fn reset(&mut self) {
        self.entries = default_entries();
    }

    /// Move a file's labels to its new name after a rename.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return false;
        }
        match self.entries.shift_remove(old) {
            Some(labels) => {
                self.entries.insert(new.to_string(), labels);
                true
            }
            None => false,
        }
    }

    /// Reconcile against the filenames currently on the board: visible files
    /// keep their labels, missing ones are seeded by extension, and entries
    /// for files no longer shown are dropped. Returns the visible count.
    pub fn sync_with<'a, I>(&mut self, filenames: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut synced = IndexMap::new();
        let mut count = 0;
        for filename in filenames {
            count += 1;
            let labels = self
                .entries
                .get(filename)
                .cloned()
                .unwrap_or_else(|| seed_labels(filename));
            synced.insert(filename.to_string(), labels);
        }
        tracing::debug!(visible = count, "synced data-type catalog with board");
        self.entries = synced;
        count
    }

    pub fn element(&self) -> Element {
        let mut container = Element::new("div").class("data-types-container");
        for (file_type, labels) in &self.entries {
            let header = Element::new("div")
                .class("file-type-header")
                .child(Element::new("div").class("file-type-name").text(file_type.clone()))
                .child(
                    Element::new("div").class("file-type-controls").child(
                        Element::new("button")
                            .class("delete-btn")
                            .attr("data-file", file_type.clone())
                            .attr("title", "Delete file type")
                            .child(icon("fa-solid fa-trash")),
                    ),
                );
            let mut list = Element::new("div")
                .class("data-type-list")
                .attr("data-file", file_type.clone());
            for label in labels {
                list.push(
                    Element::new("div").class("data-type-tag").text(label.clone()).child(
                        Element::new("button")
                            .class("remove-data-type")
                            .attr("data-file", file_type.clone())
                            .attr("data-type", label.clone())
                            .child(icon("fa-solid fa-xmark")),
                    ),
                );
            }
            container.push(
                Element::new("div")
                    .class("file-type-item")
                    .child(header)
                    .child(list),
            );
        }
        container
    }

    /// The scratch list shown under the new-file-type inputs.
    pub fn pending_element(&self) -> Element {
        let mut list = Element::new("div").class("temp-data-type-list");
        for label in &self.pending {
            list.push(
                Element::new("div").class("data-type-tag").text(label.clone()).child(
                    Element::new("button")
                        .class("remove-temp-data-type")
                        .attr("data-type", label.clone())
                        .child(icon("fa-solid fa-xmark")),
                ),
            );
        }
        list
    }
}
