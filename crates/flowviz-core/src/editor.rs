//! The flow editor controller.
//!
//! Owns the current [`Flow`] and the editing session state. Every mutation
//! the UI can trigger is a method here, so the whole editor can be driven
//! and tested without a DOM.

use std::collections::HashSet;
use std::time::Duration;

use crate::form::{BlockForm, FormMode};
use crate::import::{self, Download, ImportError};
use crate::inline::InlineEdit;
use crate::notify::{NoticeLayout, Notifier};
use crate::render::{self, DiagramView, Element};
use crate::{Block, Connection, CoreError, Flow};

/// Delay between confirming a delete and removing the block, matching the
/// fade-out animation.
pub const DELETE_ANIMATION: Duration = Duration::from_millis(300);

/// Which surface a block form came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSource {
    Main,
    Inline,
}

/// A block mutation, dispatched to a single handler whatever its source.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockCommand {
    Add(BlockForm),
    Update { source: FormSource, form: BlockForm },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(String),
    Updated(String),
    /// The update target no longer exists; nothing changed.
    Unchanged,
}

/// Result of finishing a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Removal {
    pub blocks: usize,
    pub connections: usize,
}

#[derive(Debug, Clone)]
pub struct FlowEditor {
    flow: Flow,
    /// Single global edit focus: at most one block is being edited.
    editing_id: Option<String>,
    form_mode: FormMode,
    inline: Option<InlineEdit>,
    expanded: HashSet<String>,
    confirming_delete: Option<String>,
    deleting: Option<String>,
    notices: Notifier,
}

impl Default for FlowEditor {
    fn default() -> Self {
        Self::new(Flow::default())
    }
}

impl FlowEditor {
    pub fn new(flow: Flow) -> Self {
        Self {
            flow,
            editing_id: None,
            form_mode: FormMode::Create,
            inline: None,
            expanded: HashSet::new(),
            confirming_delete: None,
            deleting: None,
            notices: Notifier::new(NoticeLayout::Single),
        }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn form_mode(&self) -> &FormMode {
        &self.form_mode
    }

    pub fn inline(&self) -> Option<&InlineEdit> {
        self.inline.as_ref()
    }

    pub fn notices(&mut self) -> &mut Notifier {
        &mut self.notices
    }

    // --- Loading ---

    /// Replace the current flow. Any edit session in progress is cancelled.
    pub fn load(&mut self, flow: Flow) {
        tracing::info!(blocks = flow.blocks.len(), title = %flow.title, "loading flow");
        self.flow = flow;
        self.expanded.clear();
        self.confirming_delete = None;
        self.deleting = None;
        self.cancel_edit();
    }

    /// Validate pasted or uploaded JSON and load it. On failure the current
    /// flow is left untouched.
    pub fn import_json(&mut self, text: &str) -> Result<(), ImportError> {
        match import::parse_flow(text) {
            Ok(flow) => {
                self.load(flow);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected flow import");
                Err(e)
            }
        }
    }

    pub fn export_json(&self) -> String {
        import::export_json(&self.flow)
    }

    pub fn export_download(&self) -> Download {
        Download::of(&self.flow)
    }

    // --- Editing session ---

    /// Start editing a block inline. Returns `None` if no such block exists.
    /// A previously edited block loses its highlight.
    pub fn enter_edit(&mut self, id: &str) -> Option<&InlineEdit> {
        let block = self.flow.block(id)?;
        let edit = InlineEdit::begin(block);
        self.editing_id = Some(id.to_string());
        self.form_mode = FormMode::Edit(id.to_string());
        self.inline = Some(edit);
        self.inline.as_ref()
    }

    /// Start editing a block through the main creator form, returning the
    /// pre-filled form.
    pub fn edit_in_form(&mut self, id: &str) -> Option<BlockForm> {
        let form = BlockForm::from_block(self.flow.block(id)?);
        self.editing_id = Some(id.to_string());
        self.form_mode = FormMode::Edit(id.to_string());
        self.inline = None;
        Some(form)
    }

    /// Replace the inline form's field values while the session is open.
    pub fn update_inline_form(&mut self, form: BlockForm) -> bool {
        match self.inline.as_mut() {
            Some(edit) => {
                edit.form = form;
                true
            }
            None => false,
        }
    }

    /// Abandon an inline edit and hand back the captured original markup.
    pub fn cancel_inline(&mut self) -> Option<String> {
        let edit = self.inline.take()?;
        self.editing_id = None;
        self.form_mode = FormMode::Create;
        Some(edit.original_markup)
    }

    /// Leave edit mode entirely and reset the main form.
    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
        self.form_mode = FormMode::Create;
        self.inline = None;
    }

    /// Build the command a form submission stands for: an update while a
    /// block is being edited, otherwise an add.
    pub fn command_for(&self, source: FormSource, form: BlockForm) -> BlockCommand {
        match (source, &self.inline) {
            (FormSource::Inline, Some(edit)) => BlockCommand::Update {
                source,
                form: BlockForm {
                    id: edit.block_id.clone(),
                    ..form
                },
            },
            _ if self.is_editing() => BlockCommand::Update { source, form },
            _ => BlockCommand::Add(form),
        }
    }

    /// Save the open inline form.
    pub fn save_inline(&mut self) -> Result<Outcome, CoreError> {
        let form = match &self.inline {
            Some(edit) => edit.submission(),
            None => return Ok(Outcome::Unchanged),
        };
        self.apply(BlockCommand::Update {
            source: FormSource::Inline,
            form,
        })
    }

    /// Validate and apply a block command. Validation failures leave the
    /// flow and the edit session untouched.
    pub fn apply(&mut self, command: BlockCommand) -> Result<Outcome, CoreError> {
        let result = match &command {
            BlockCommand::Add(form) => self.add_block(form),
            BlockCommand::Update { source, form } => self.update_block(*source, form),
        };
        match &result {
            Ok(Outcome::Added(id)) => {
                tracing::info!(block_id = %id, "block added");
            }
            Ok(Outcome::Updated(id)) => {
                tracing::info!(block_id = %id, "block updated");
            }
            Ok(Outcome::Unchanged) => {
                tracing::debug!("update target missing; nothing changed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "block command rejected");
                self.notices.error(e.to_string());
            }
        }
        result
    }

    fn add_block(&mut self, form: &BlockForm) -> Result<Outcome, CoreError> {
        form.validate(true)?;
        if self.flow.contains_block(&form.id) {
            return Err(CoreError::DuplicateBlock(form.id.clone()));
        }
        let block = form.to_block();
        let id = block.id.clone();
        let title = block.title.clone();
        self.push_block(block);
        self.notices
            .success(format!("Block \"{}\" added successfully", title));
        self.cancel_edit();
        Ok(Outcome::Added(id))
    }

    /// Append a block, linking it from the previous last block.
    fn push_block(&mut self, block: Block) {
        if let Some(prev) = self.flow.blocks.last() {
            let connection = Connection {
                from: prev.id.clone(),
                to: block.id.clone(),
                label: auto_label(&prev.id, &block.id),
            };
            self.flow.connections.push(connection);
        }
        self.flow.blocks.push(block);
    }

    fn update_block(&mut self, source: FormSource, form: &BlockForm) -> Result<Outcome, CoreError> {
        let Some(original_id) = self.editing_id.clone() else {
            return Ok(Outcome::Unchanged);
        };
        // The id field is locked while editing, so it is never required here.
        form.validate(false)?;
        tracing::debug!(block_id = %original_id, ?source, "applying block update");

        let Some(index) = self.flow.blocks.iter().position(|b| b.id == original_id) else {
            self.cancel_edit();
            return Ok(Outcome::Unchanged);
        };

        let mut block = form.to_block();
        block.id = original_id.clone();
        let title = block.title.clone();
        self.flow.blocks[index] = block;
        self.notices
            .success(format!("Block \"{}\" updated successfully", title));
        self.cancel_edit();
        Ok(Outcome::Updated(original_id))
    }

    // --- Deleting ---

    /// Show the confirmation panel on a block.
    pub fn request_delete(&mut self, id: &str) -> bool {
        if !self.flow.contains_block(id) {
            return false;
        }
        self.confirming_delete = Some(id.to_string());
        true
    }

    pub fn dismiss_delete(&mut self) {
        self.confirming_delete = None;
    }

    /// Confirm a delete: the block is marked as fading out and, if it was
    /// being edited, the edit session ends. The caller waits
    /// [`DELETE_ANIMATION`] and then calls [`FlowEditor::finish_delete`].
    pub fn confirm_delete(&mut self, id: &str) -> bool {
        if !self.flow.contains_block(id) {
            return false;
        }
        self.confirming_delete = None;
        self.deleting = Some(id.to_string());
        if self.editing_id.as_deref() == Some(id) {
            self.cancel_edit();
        }
        true
    }

    /// Remove a block and every connection that references it. Only a
    /// delete still pending from [`FlowEditor::confirm_delete`] is finished;
    /// a load in between discards it and nothing is removed.
    pub fn finish_delete(&mut self, id: &str) -> Removal {
        if self.deleting.as_deref() != Some(id) {
            tracing::debug!(block_id = %id, "delete no longer pending, skipped");
            return Removal::default();
        }
        self.deleting = None;
        if self.editing_id.as_deref() == Some(id) {
            self.cancel_edit();
        }
        self.expanded.remove(id);

        let before_blocks = self.flow.blocks.len();
        self.flow.blocks.retain(|b| b.id != id);
        let before_connections = self.flow.connections.len();
        self.flow.connections.retain(|c| !c.touches(id));

        let removal = Removal {
            blocks: before_blocks - self.flow.blocks.len(),
            connections: before_connections - self.flow.connections.len(),
        };
        if removal.blocks > 0 {
            tracing::info!(
                block_id = %id,
                connections = removal.connections,
                "block deleted"
            );
        }
        removal
    }

    // --- Misc UI state ---

    /// Toggle a block's expanded details. Returns the new state.
    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        if !self.flow.contains_block(id) {
            return false;
        }
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    /// Apply the save-dialog answers to the flow metadata and return the
    /// document to send. An empty or missing title aborts the save.
    pub fn prepare_save(
        &mut self,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Flow, CoreError> {
        let title = title.map(str::trim).filter(|t| !t.is_empty());
        let Some(title) = title else {
            return Err(CoreError::SaveCancelled);
        };
        self.flow.title = title.to_string();
        self.flow.description = description.unwrap_or_default().to_string();
        Ok(self.flow.clone())
    }

    pub fn render(&self) -> Element {
        let view = DiagramView {
            editing_id: self.editing_id.as_deref(),
            expanded: Some(&self.expanded),
            confirming_delete: self.confirming_delete.as_deref(),
            deleting: self.deleting.as_deref(),
            inline_form: self.inline.as_ref().map(|e| &e.form),
        };
        render::render_flow(&self.flow, &view)
    }
}

/// Label given to connections created when a block is appended.
pub fn auto_label(from: &str, to: &str) -> String {
    format!("Connection {} → {}", from, to)
}
