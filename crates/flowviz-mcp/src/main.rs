mod session;

use std::sync::Arc;

use flowviz_client::{FlowvizClient, LoadSequencer};
use flowviz_core::board::BlockSubmission;
use flowviz_core::editor::{BlockCommand, FormSource, Outcome, DELETE_ANIMATION};
use flowviz_core::form::BlockForm;
use flowviz_core::selector::{self, Selection};
use flowviz_core::storage::FileStore;
use flowviz_core::theme::Theme;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session::Session;

fn ok_text(text: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text.into())]))
}

fn err_text(text: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(text.into())]))
}

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => ok_text(json),
        Err(e) => err_text(format!("Serialization error: {}", e)),
    }
}

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SelectFlowRequest {
    /// Selector value: a built-in example name (e.g. "vector_search"), a server path starting with "/" (e.g. "/user_flows/my_flow.json"), or "custom" for a local upload via import_json.
    value: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct JsonTextRequest {
    /// Flow document as JSON text. Must be an object with "blocks" and "connections" arrays.
    json: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct PasteJsonRequest {
    /// Text to paste into the JSON modal. Text starting with "{" or "[" is validated immediately, like a clipboard paste.
    json: String,
    /// Load the flow if the text is valid. Default false: validate only.
    load: Option<bool>,
    /// Also ask the server's /api/validate-json for a second opinion.
    remote: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ExportRequest {
    /// Return a data:application/json;base64 URI instead of the JSON text.
    data_uri: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct BlockIdRequest {
    /// ID of the block in the current flow
    block_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct EditBlockRequest {
    /// ID of the block to edit
    block_id: String,
    /// Edit inline inside the rendered block instead of in the main form. Default false.
    inline: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SaveBlockRequest {
    /// Block form fields. "tasks" is newline-separated. id, title, icon and description are required; id is ignored while editing.
    form: BlockForm,
    /// Which surface the form comes from. Default false (main form).
    inline: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SaveFlowRequest {
    /// Flow title. Required; an empty title cancels the save.
    title: Option<String>,
    /// Flow description
    description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddFileRequest {
    /// File name shown on the board, e.g. "api.py"
    filename: String,
    /// What the file does
    description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateFileRequest {
    /// Server-assigned id of the file block
    id: i64,
    /// New file name. Renaming carries the file's data types over.
    filename: String,
    /// New description
    description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct FileIdRequest {
    /// Server-assigned id of the file block
    id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct FileInfoRequest {
    /// File block whose info box to open. Omit to close all info boxes.
    id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct LabelRequest {
    /// Data type label, e.g. "API Request"
    label: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct FileTypeRequest {
    /// File type key: a file name or suffix such as "api.py" or ".py"
    file_type: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RemoveLabelRequest {
    /// File type key
    file_type: String,
    /// Label to remove. A file type left without labels is removed too.
    label: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct LayoutRequest {
    /// Animation step in milliseconds (300-3000)
    animation_ms: Option<u64>,
    /// Gap between blocks in pixels (10-120)
    block_gap: Option<u32>,
    /// Block size in percent (50-150)
    block_size: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ThemeRequest {
    /// Accent colour as #rrggbb
    accent_color: Option<String>,
    /// Primary background as #rrggbb
    primary_bg: Option<String>,
    /// Secondary background as #rrggbb
    secondary_bg: Option<String>,
    /// Text colour as #rrggbb
    text_color: Option<String>,
}

// --- Server ---

#[derive(Clone)]
pub struct FlowvizServer {
    tool_router: ToolRouter<Self>,
    session: Arc<Mutex<Session>>,
    client: FlowvizClient,
    flow_loads: Arc<LoadSequencer>,
}

#[tool_router]
impl FlowvizServer {
    pub fn new(session: Session, client: FlowvizClient) -> Self {
        Self {
            tool_router: Self::tool_router(),
            session: Arc::new(Mutex::new(session)),
            client,
            flow_loads: Arc::new(LoadSequencer::new()),
        }
    }

    // ---- Flow editor ----

    #[tool(description = "Get the current flow document as JSON: {title, description, blocks: [{id, title, icon, description, details: {explanation, tasks}, inputData?, outputData?}], connections: [{from, to, label}]}")]
    async fn get_flow(&self) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        ok_json(session.editor.flow())
    }

    #[tool(description = "Render the editor page (flow selector, diagram, JSON modal) as HTML")]
    async fn render_flow(&self) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        ok_text(session.editor_view().to_html())
    }

    #[tool(description = "List flows available on the server (built-in examples and user-saved flows) and refresh the flow selector")]
    async fn list_flows(&self) -> Result<CallToolResult, McpError> {
        match self.client.list_flows().await {
            Ok(entries) => {
                let mut session = self.session.lock().await;
                session.selector.refresh(&entries);
                ok_json(&session.selector.options())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to list flows");
                err_text(format!("Failed to load flow list: {}", e))
            }
        }
    }

    #[tool(description = "Load a flow by selector value. Replaces the current flow and cancels any edit in progress. A newer selection supersedes one still in flight.")]
    async fn select_flow(&self, Parameters(req): Parameters<SelectFlowRequest>) -> Result<CallToolResult, McpError> {
        {
            let mut session = self.session.lock().await;
            if let Err(e) = session.selector.select(&req.value) {
                return err_text(e.to_string());
            }
        }
        let path = match selector::resolve(&req.value) {
            Selection::Upload => {
                return ok_text("Custom file selected. Send the document with import_json.");
            }
            Selection::Fetch(path) => path,
        };

        let ticket = self.flow_loads.begin();
        let fetched = self.client.fetch_flow(&path).await;
        let flow = match fetched {
            Ok(flow) => flow,
            Err(e) => {
                tracing::error!(error = %e, path = %path, "failed to load flow");
                return err_text(format!("Failed to load flow: {}", e));
            }
        };
        let Some(flow) = self.flow_loads.accept(ticket, flow) else {
            return ok_text(format!("Load of {} was superseded by a newer selection", path));
        };
        let mut session = self.session.lock().await;
        let title = flow.title.clone();
        session.editor.load(flow);
        ok_text(format!("Loaded \"{}\" from {}", title, path))
    }

    #[tool(description = "Replace the current flow with a JSON document (file upload). The document must contain \"blocks\" and \"connections\" arrays; on failure the current flow is unchanged.")]
    async fn import_json(&self, Parameters(req): Parameters<JsonTextRequest>) -> Result<CallToolResult, McpError> {
        // An upload is a load of its own and supersedes pending selections.
        self.flow_loads.begin();
        let mut session = self.session.lock().await;
        match session.editor.import_json(&req.json) {
            Ok(()) => ok_text(format!(
                "Imported flow with {} blocks",
                session.editor.flow().blocks.len()
            )),
            Err(e) => err_text(format!("Error: {}", e)),
        }
    }

    #[tool(description = "Paste JSON into the modal: validate it and optionally load it. With remote=true the server also validates it.")]
    async fn paste_json(&self, Parameters(req): Parameters<PasteJsonRequest>) -> Result<CallToolResult, McpError> {
        let mut lines = Vec::new();
        {
            let mut session = self.session.lock().await;
            session.json_modal.open(Some(&req.json));
            session.json_modal.text = req.json.clone();
            if let Err(e) = session.json_modal.validate() {
                return err_text(format!("Error: {}", e));
            }
            lines.push("JSON is valid".to_string());
        }

        if req.remote.unwrap_or(false) {
            let value: serde_json::Value = match serde_json::from_str(&req.json) {
                Ok(v) => v,
                Err(e) => return err_text(format!("Error: JSON parse error: {}", e)),
            };
            match self.client.validate_remote(&value).await {
                Ok(v) if v.valid => lines.push("Server validation passed".to_string()),
                Ok(v) => {
                    return err_text(format!(
                        "Server rejected the document: {}",
                        v.error.unwrap_or_default()
                    ))
                }
                Err(e) => lines.push(format!("Server validation unavailable: {}", e)),
            }
        }

        if req.load.unwrap_or(false) {
            self.flow_loads.begin();
            let mut session = self.session.lock().await;
            let Session {
                json_modal, editor, ..
            } = &mut *session;
            if let Err(e) = json_modal.load_into(editor) {
                return err_text(format!("Error: {}", e));
            }
            lines.push(format!("Loaded flow with {} blocks", editor.flow().blocks.len()));
        }
        ok_text(lines.join("\n"))
    }

    #[tool(description = "Export the current flow as pretty-printed JSON (the flow.json download), or as a data URI")]
    async fn export_flow(&self, Parameters(req): Parameters<ExportRequest>) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        if req.data_uri.unwrap_or(false) {
            ok_text(session.editor.export_download().data_uri())
        } else {
            ok_text(session.editor.export_json())
        }
    }

    #[tool(description = "Add a block to the end of the flow. A connection from the previous last block is created automatically. Fails if the id already exists.")]
    async fn add_block(&self, Parameters(req): Parameters<SaveBlockRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        match session.editor.apply(BlockCommand::Add(req.form)) {
            Ok(Outcome::Added(id)) => ok_text(format!("Block \"{}\" added", id)),
            Ok(_) => ok_text("No change"),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Start editing a block (single edit focus: any other edit is cancelled). Returns the form pre-filled from the block.")]
    async fn edit_block(&self, Parameters(req): Parameters<EditBlockRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let form = if req.inline.unwrap_or(false) {
            session.editor.enter_edit(&req.block_id).map(|e| e.form.clone())
        } else {
            session.editor.edit_in_form(&req.block_id)
        };
        match form {
            Some(form) => ok_json(&form),
            None => err_text(format!("Block \"{}\" not found", req.block_id)),
        }
    }

    #[tool(description = "Submit a block form. While a block is being edited this updates it (its id never changes); otherwise it adds a new block.")]
    async fn save_block(&self, Parameters(req): Parameters<SaveBlockRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let source = if req.inline.unwrap_or(false) {
            FormSource::Inline
        } else {
            FormSource::Main
        };
        let command = session.editor.command_for(source, req.form);
        match session.editor.apply(command) {
            Ok(Outcome::Added(id)) => ok_text(format!("Block \"{}\" added", id)),
            Ok(Outcome::Updated(id)) => ok_text(format!("Block \"{}\" updated", id)),
            Ok(Outcome::Unchanged) => ok_text("Block no longer exists; nothing changed"),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Cancel the current edit. For an inline edit, returns the block markup that is restored.")]
    async fn cancel_edit(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        match session.editor.cancel_inline() {
            Some(markup) => ok_text(markup),
            None => {
                session.editor.cancel_edit();
                ok_text("Edit cancelled")
            }
        }
    }

    #[tool(description = "Delete a block and every connection that references it")]
    async fn delete_block(&self, Parameters(req): Parameters<BlockIdRequest>) -> Result<CallToolResult, McpError> {
        {
            let mut session = self.session.lock().await;
            if !session.editor.request_delete(&req.block_id)
                || !session.editor.confirm_delete(&req.block_id)
            {
                return err_text(format!("Block \"{}\" not found", req.block_id));
            }
        }
        // Fade-out; the session stays usable meanwhile.
        tokio::time::sleep(DELETE_ANIMATION).await;
        let mut session = self.session.lock().await;
        let removal = session.editor.finish_delete(&req.block_id);
        ok_text(format!(
            "Removed {} block(s) and {} connection(s)",
            removal.blocks, removal.connections
        ))
    }

    #[tool(description = "Expand or collapse a block's details. Returns the new state.")]
    async fn toggle_block(&self, Parameters(req): Parameters<BlockIdRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if !session.editor.flow().contains_block(&req.block_id) {
            return err_text(format!("Block \"{}\" not found", req.block_id));
        }
        let expanded = session.editor.toggle_expanded(&req.block_id);
        ok_text(if expanded { "expanded" } else { "collapsed" })
    }

    #[tool(description = "Save the current flow to the server under a title, then refresh the flow list")]
    async fn save_flow(&self, Parameters(req): Parameters<SaveFlowRequest>) -> Result<CallToolResult, McpError> {
        let flow = {
            let mut session = self.session.lock().await;
            match session
                .editor
                .prepare_save(req.title.as_deref(), req.description.as_deref())
            {
                Ok(flow) => flow,
                Err(e) => return err_text(e.to_string()),
            }
        };
        let ack = match self.client.save_flow(&flow).await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::error!(error = %e, "failed to save flow");
                return err_text(format!("Error saving flow: {}", e));
            }
        };
        if let Ok(entries) = self.client.list_flows().await {
            self.session.lock().await.selector.refresh(&entries);
        }
        ok_text(format!(
            "Flow \"{}\" saved{}",
            flow.title,
            ack.path.map(|p| format!(" as {}", p)).unwrap_or_default()
        ))
    }

    // ---- File-block board ----

    #[tool(description = "Reload file blocks from the server and resync data types and the simulator. Returns the board as JSON.")]
    async fn list_files(&self) -> Result<CallToolResult, McpError> {
        match self.reload_board().await {
            Ok(()) => {
                let session = self.session.lock().await;
                ok_json(&session.board.blocks())
            }
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Render the simulator page (board, animation, notifications) as HTML")]
    async fn render_board(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        session.notices.expire(std::time::Instant::now());
        ok_text(session.board_view().to_html())
    }

    #[tool(description = "Add a file block on the server")]
    async fn add_file(&self, Parameters(req): Parameters<AddFileRequest>) -> Result<CallToolResult, McpError> {
        let submission = {
            let mut session = self.session.lock().await;
            session.block_modal.open_for_add();
            session.block_modal.filename = req.filename;
            session.block_modal.description = req.description.unwrap_or_default();
            match session.block_modal.submit() {
                Ok(s) => s,
                Err(e) => return err_text(e.to_string()),
            }
        };
        let BlockSubmission::Add(body) = submission else {
            return err_text("Unexpected edit submission");
        };
        if let Err(e) = self.client.add_block(&body).await {
            tracing::error!(error = %e, "failed to add file block");
            self.session.lock().await.notices.error("Error adding file");
            return err_text(format!("Error adding file: {}", e));
        }
        self.session.lock().await.block_modal.close();
        // The server assigns the id, so the board is re-fetched.
        if let Err(e) = self.reload_board().await {
            return err_text(e);
        }
        self.session.lock().await.notices.success("File added");
        ok_text(format!("File \"{}\" added", body.filename))
    }

    #[tool(description = "Update a file block's name and description. Renaming moves its data types to the new name.")]
    async fn update_file(&self, Parameters(req): Parameters<UpdateFileRequest>) -> Result<CallToolResult, McpError> {
        let submission = {
            let mut session = self.session.lock().await;
            let Some(block) = session.board.get(req.id).cloned() else {
                return err_text(format!("File block {} not found", req.id));
            };
            session.block_modal.open_for_edit(&block);
            session.block_modal.filename = req.filename;
            if let Some(description) = req.description {
                session.block_modal.description = description;
            }
            match session.block_modal.submit() {
                Ok(s) => s,
                Err(e) => return err_text(e.to_string()),
            }
        };
        let BlockSubmission::Update { id, patch } = submission else {
            return err_text("Unexpected add submission");
        };
        let previous = match self.client.update_block(id, &patch).await {
            Ok(previous) => previous,
            Err(e) => {
                tracing::error!(error = %e, block_id = id, "failed to update file block");
                self.session.lock().await.notices.error("Error updating file");
                return err_text(format!("Error updating file: {}", e));
            }
        };
        let mut session = self.session.lock().await;
        session.apply_file_update(id, &patch, &previous);
        session.block_modal.close();
        session.notices.success("File updated");
        ok_text(format!("File {} updated ({} → {})", id, previous, patch.filename))
    }

    #[tool(description = "Delete a file block on the server")]
    async fn delete_file(&self, Parameters(req): Parameters<FileIdRequest>) -> Result<CallToolResult, McpError> {
        if let Err(e) = self.client.delete_block(req.id).await {
            tracing::error!(error = %e, block_id = req.id, "failed to delete file block");
            self.session.lock().await.notices.error("Error deleting file");
            return err_text(format!("Error deleting file: {}", e));
        }
        let mut session = self.session.lock().await;
        session.remove_file(req.id);
        session.notices.success("File deleted");
        ok_text(format!("File {} deleted", req.id))
    }

    #[tool(description = "Open one file block's info box (closing the others), or close all when no id is given")]
    async fn show_file_info(&self, Parameters(req): Parameters<FileInfoRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        match req.id {
            Some(id) => {
                if !session.board.open_info(id) {
                    return err_text(format!("File block {} not found", id));
                }
                let block = session.board.get(id).cloned();
                ok_json(&block)
            }
            None => {
                session.board.close_info();
                ok_text("Info boxes closed")
            }
        }
    }

    // ---- Data-type catalog ----

    #[tool(description = "Sync the data-type catalog with the board and return it: {entries: {fileType: [labels]}, pending: [labels]}")]
    async fn get_data_types(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let count = session.open_data_types();
        let mut out = serde_json::json!({
            "entries": session.catalog.entries(),
            "pending": session.catalog.pending(),
        });
        if count == 0 {
            out["message"] = "No file blocks to configure animation data for".into();
        }
        ok_json(&out)
    }

    #[tool(description = "Add a label to the scratch list used by commit_file_type")]
    async fn add_pending_data_type(&self, Parameters(req): Parameters<LabelRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        match session.catalog.add_pending(&req.label) {
            Ok(()) => ok_json(&session.catalog.pending()),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Remove a label from the scratch list")]
    async fn remove_pending_data_type(&self, Parameters(req): Parameters<LabelRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        session.catalog.remove_pending(&req.label);
        ok_json(&session.catalog.pending())
    }

    #[tool(description = "Store the scratch list as the labels of a file type and clear the list")]
    async fn commit_file_type(&self, Parameters(req): Parameters<FileTypeRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let count = match session.catalog.commit_pending(&req.file_type) {
            Ok(count) => count,
            Err(e) => return err_text(e.to_string()),
        };
        if let Err(e) = session.save_catalog() {
            return err_text(e.to_string());
        }
        ok_text(format!(
            "File type \"{}\" added with {} data types",
            req.file_type.trim(),
            count
        ))
    }

    #[tool(description = "Delete a file type and all of its labels")]
    async fn delete_file_type(&self, Parameters(req): Parameters<FileTypeRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if !session.catalog.delete_file_type(&req.file_type) {
            return err_text(format!("File type \"{}\" not found", req.file_type));
        }
        if let Err(e) = session.save_catalog() {
            return err_text(e.to_string());
        }
        ok_text(format!("File type \"{}\" deleted", req.file_type))
    }

    #[tool(description = "Remove one label from a file type")]
    async fn remove_data_type(&self, Parameters(req): Parameters<RemoveLabelRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if !session.catalog.remove_label(&req.file_type, &req.label) {
            return err_text(format!(
                "Data type \"{}\" not found under \"{}\"",
                req.label, req.file_type
            ));
        }
        if let Err(e) = session.save_catalog() {
            return err_text(e.to_string());
        }
        ok_text(format!("Data type \"{}\" removed", req.label))
    }

    #[tool(description = "Reset the data-type catalog to the built-in defaults")]
    async fn reset_data_types(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        session.catalog.reset();
        if let Err(e) = session.save_catalog() {
            return err_text(e.to_string());
        }
        ok_text("Data types reset to defaults")
    }

    // ---- Simulation and appearance ----

    #[tool(description = "Start the pulse simulation, or stop it if it is running")]
    async fn toggle_simulation(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let state = session.simulator.toggle();
        ok_json(&state)
    }

    #[tool(description = "Current simulation state: running flag, containers, live pulses and highlighted block")]
    async fn simulation_status(&self) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        ok_json(&serde_json::json!({
            "state": session.simulator.state(),
            "periodMs": session.simulator.period().as_millis() as u64,
            "stage": session.simulator.snapshot(),
        }))
    }

    #[tool(description = "Adjust animation speed, block gap and block size")]
    async fn set_layout(&self, Parameters(req): Parameters<LayoutRequest>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        if let Err(e) = session.set_layout(req.animation_ms, req.block_gap, req.block_size) {
            return err_text(e.to_string());
        }
        let layout = session.layout;
        ok_text(format!(
            "Speed {}, gap {}, size {}",
            layout.speed_label(),
            layout.gap_label(),
            layout.size_label()
        ))
    }

    #[tool(description = "Change theme colours (#rrggbb) and save them on the server")]
    async fn set_theme(&self, Parameters(req): Parameters<ThemeRequest>) -> Result<CallToolResult, McpError> {
        let theme = {
            let session = self.session.lock().await;
            let mut theme = session.theme.clone();
            let changes = [
                ("accent_color", req.accent_color),
                ("primary_bg", req.primary_bg),
                ("secondary_bg", req.secondary_bg),
                ("text_color", req.text_color),
            ];
            for (property, value) in changes {
                if let Some(value) = value {
                    if let Err(e) = theme.set(property, &value) {
                        return err_text(e.to_string());
                    }
                }
            }
            theme
        };
        if let Err(e) = self.client.save_theme(&theme).await {
            tracing::error!(error = %e, "failed to save theme");
            self.session.lock().await.notices.error("Error saving settings");
            return err_text(format!("Error saving settings: {}", e));
        }
        let mut session = self.session.lock().await;
        session.theme = theme;
        session.notices.success("Settings saved");
        ok_json(&session.theme.css_vars())
    }

    #[tool(description = "Reset all server settings, then reload the board as a fresh page would")]
    async fn reset_settings(&self) -> Result<CallToolResult, McpError> {
        if let Err(e) = self.client.reset().await {
            tracing::error!(error = %e, "failed to reset settings");
            self.session.lock().await.notices.error("Error resetting settings");
            return err_text(format!("Error resetting settings: {}", e));
        }
        {
            let mut session = self.session.lock().await;
            session.theme = Theme::default();
            session.simulator.stop();
            session.board.close_info();
            session.block_modal.close();
        }
        match self.reload_board().await {
            Ok(()) => ok_text("Settings reset"),
            Err(e) => err_text(e),
        }
    }
}

impl FlowvizServer {
    async fn reload_board(&self) -> Result<(), String> {
        match self.client.list_blocks().await {
            Ok(blocks) => {
                let mut session = self.session.lock().await;
                let count = session.load_board(blocks);
                tracing::debug!(count, "board reloaded");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load file blocks");
                Err(format!("Failed to load file blocks: {}", e))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for FlowvizServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"flowviz edits data-flow diagrams and drives a file-block pulse simulator.

## Flows
A flow is {title, description, blocks, connections}. Blocks are ordered; a connection between two consecutive blocks is drawn as an arrow. Block ids are unique (exact, case-sensitive match).
- Load with list_flows + select_flow, import_json or paste_json; any load cancels an edit in progress.
- add_block appends and links the previous last block automatically.
- edit_block then save_block updates a block; the id never changes. cancel_edit abandons it.
- delete_block also removes every connection touching the block.
- export_flow returns flow.json; save_flow stores it on the server.

## Simulator
File blocks live on the server (list_files, add_file, update_file, delete_file). Each file emits labelled pulses chosen from the data-type catalog (get_data_types and friends). toggle_simulation starts or stops the animation; set_layout changes its speed."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // stdout carries the MCP transport, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowviz_mcp=info,flowviz_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = flowviz_core::read_settings().with_env_overrides();
    tracing::info!(base_url = %settings.base_url, "starting flowviz-mcp");
    let client = FlowvizClient::from_settings(&settings)?;
    let session = Session::new(&settings, Box::new(FileStore::default()));

    let service = FlowvizServer::new(session, client)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}
