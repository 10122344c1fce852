pub mod board;
pub mod catalog;
pub mod editor;
pub mod error;
pub mod form;
pub mod import;
pub mod inline;
pub mod modal;
pub mod notify;
pub mod render;
pub mod selector;
pub mod storage;
pub mod theme;

pub use error::CoreError;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// --- Types (matching the flow JSON documents) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Json,
    Http,
    Text,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Http => "http",
            DataFormat::Text => "text",
        }
    }
}

/// Sample payload shown for a block's input or output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataSample {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format: DataFormat,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlockDetails {
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// A named step in a flow. `id` is unique among the flow's blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: BlockDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<DataSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_data: Option<DataSample>,
}

impl Block {
    /// Minimal block with only an id, used by tests and imports of sparse documents.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            icon: String::new(),
            description: String::new(),
            details: BlockDetails::default(),
            input_data: None,
            output_data: None,
        }
    }
}

/// A labelled directed edge between two blocks, rendered as an arrow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
}

impl Connection {
    pub fn touches(&self, block_id: &str) -> bool {
        self.from == block_id || self.to == block_id
    }
}

/// A flow document: ordered blocks plus the connections between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
}

impl Default for Flow {
    fn default() -> Self {
        Self {
            title: "New data flow".to_string(),
            description: "Data flow description".to_string(),
            blocks: Vec::new(),
            connections: Vec::new(),
        }
    }
}

impl Flow {
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn contains_block(&self, id: &str) -> bool {
        self.blocks.iter().any(|b| b.id == id)
    }

    /// The connection drawn between two consecutive blocks, if one exists.
    pub fn connection_between(&self, from: &str, to: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.from == from && c.to == to)
    }
}

/// A server-tracked file node shown on the simulator board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileBlock {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub description: String,
}

/// Body for creating a file block; the server assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct NewFileBlock {
    pub filename: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    #[serde(alias = "example")]
    Builtin,
    User,
}

/// One row of the `GET /api/flows` listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FlowKind,
}

// --- Storage ---

/// Resolve the application directory (~/.flowviz/, or `$FLOWVIZ_DIR`).
pub fn app_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("FLOWVIZ_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".flowviz")
}

/// Write a file atomically (temp file + rename) inside `dir`.
pub fn write_atomic(dir: &Path, file_name: &str, data: &str) -> Result<(), CoreError> {
    fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(".{}.tmp", file_name));
    let path = dir.join(file_name);
    fs::write(&tmp, data)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

// --- Settings ---

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_ANIMATION_MS: u64 = 1200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_animation_ms")]
    pub animation_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_animation_ms() -> u64 {
    DEFAULT_ANIMATION_MS
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            animation_ms: default_animation_ms(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Settings {
    /// Apply `FLOWVIZ_BASE_URL` / `FLOWVIZ_ANIMATION_MS` on top of the stored values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("FLOWVIZ_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Some(ms) = std::env::var("FLOWVIZ_ANIMATION_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.animation_ms = ms;
        }
        self.sanitized()
    }

    /// Replace values the UI could never produce. An animation speed outside
    /// [`theme::ANIMATION_RANGE`] falls back to [`DEFAULT_ANIMATION_MS`].
    pub fn sanitized(mut self) -> Self {
        if !theme::ANIMATION_RANGE.contains(&self.animation_ms) {
            tracing::warn!(
                animation_ms = self.animation_ms,
                "animation speed out of range, using default"
            );
            self.animation_ms = DEFAULT_ANIMATION_MS;
        }
        self
    }
}

fn settings_path() -> PathBuf {
    app_dir().join("settings.json")
}

/// Read settings from disk. A missing or corrupt file yields the defaults.
pub fn read_settings() -> Settings {
    read_settings_from(&settings_path())
}

fn read_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str::<Settings>(&s).ok())
        .unwrap_or_default()
        .sanitized()
}

pub fn write_settings(settings: &Settings) -> Result<(), CoreError> {
    let json = serde_json::to_string_pretty(settings)?;
    write_atomic(&app_dir(), "settings.json", &json)
}
