use serde::{Deserialize, Serialize};

use crate::{Block, BlockDetails, CoreError, DataFormat, DataSample};

pub const DEFAULT_INPUT_TITLE: &str = "Input data";
pub const DEFAULT_OUTPUT_TITLE: &str = "Output data";

/// Flat field values of the block form, as typed by the user.
///
/// Used by both the main creator form and the inline editor; `tasks` holds
/// one task per line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockForm {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub description: String,
    pub explanation: String,
    pub tasks: String,
    pub input_title: String,
    pub input_description: String,
    pub input_format: DataFormat,
    pub input_data: String,
    pub output_title: String,
    pub output_description: String,
    pub output_format: DataFormat,
    pub output_data: String,
}

impl BlockForm {
    /// Pre-fill the form from an existing block.
    pub fn from_block(block: &Block) -> Self {
        let input = block.input_data.clone().unwrap_or_default();
        let output = block.output_data.clone().unwrap_or_default();
        Self {
            id: block.id.clone(),
            title: block.title.clone(),
            icon: block.icon.clone(),
            description: block.description.clone(),
            explanation: block.details.explanation.clone(),
            tasks: block.details.tasks.join("\n"),
            input_title: non_empty_or(&input.title, DEFAULT_INPUT_TITLE),
            input_description: input.description,
            input_format: input.format,
            input_data: input.data,
            output_title: non_empty_or(&output.title, DEFAULT_OUTPUT_TITLE),
            output_description: output.description,
            output_format: output.format,
            output_data: output.data,
        }
    }

    /// Required-field check. The id is only required when it comes from the
    /// main form; the inline editor takes it from the block being edited.
    pub fn validate(&self, require_id: bool) -> Result<(), CoreError> {
        let mut missing = Vec::new();
        if require_id && self.id.trim().is_empty() {
            missing.push("id");
        }
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.icon.trim().is_empty() {
            missing.push("icon");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "required field(s) empty: {}",
                missing.join(", ")
            )))
        }
    }

    /// Map the form into a block. Blank task lines are dropped and empty
    /// sample titles fall back to their defaults.
    pub fn to_block(&self) -> Block {
        let tasks = self
            .tasks
            .split('\n')
            .map(|t| t.trim_end_matches('\r'))
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .collect();

        Block {
            id: self.id.clone(),
            title: self.title.clone(),
            icon: self.icon.clone(),
            description: self.description.clone(),
            details: BlockDetails {
                explanation: self.explanation.clone(),
                tasks,
            },
            input_data: Some(DataSample {
                title: non_empty_or(&self.input_title, DEFAULT_INPUT_TITLE),
                description: self.input_description.clone(),
                format: self.input_format,
                data: self.input_data.clone(),
            }),
            output_data: Some(DataSample {
                title: non_empty_or(&self.output_title, DEFAULT_OUTPUT_TITLE),
                description: self.output_description.clone(),
                format: self.output_format,
                data: self.output_data.clone(),
            }),
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Whether the main creator form is adding a new block or editing one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    Edit(String),
}

impl FormMode {
    pub fn heading(&self) -> &'static str {
        match self {
            FormMode::Create => "Create new block",
            FormMode::Edit(_) => "Edit block",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            FormMode::Create => "Add block",
            FormMode::Edit(_) => "Save changes",
        }
    }

    /// The id input is locked while editing so the key cannot change.
    pub fn id_locked(&self) -> bool {
        matches!(self, FormMode::Edit(_))
    }
}
