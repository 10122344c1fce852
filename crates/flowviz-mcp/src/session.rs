//! State of one editing session: the flow editor plus the simulator view.

use std::time::Duration;

use flowviz_core::board::{BlockModal, FileBoard};
use flowviz_core::catalog::DataTypeCatalog;
use flowviz_core::editor::FlowEditor;
use flowviz_core::modal::JsonModal;
use flowviz_core::notify::{NoticeLayout, Notifier};
use flowviz_core::render::Element;
use flowviz_core::selector::FlowSelector;
use flowviz_core::storage::LocalStore;
use flowviz_core::theme::{self, LayoutControls, Theme};
use flowviz_core::{CoreError, FileBlock, NewFileBlock, Settings};
use flowviz_sim::Simulator;

pub struct Session {
    pub editor: FlowEditor,
    pub selector: FlowSelector,
    pub json_modal: JsonModal,
    pub board: FileBoard,
    pub block_modal: BlockModal,
    pub catalog: DataTypeCatalog,
    pub theme: Theme,
    pub layout: LayoutControls,
    /// Simulator-view notifications; the editor keeps its own single slot.
    pub notices: Notifier,
    pub simulator: Simulator,
    store: Box<dyn LocalStore + Send>,
}

impl Session {
    pub fn new(settings: &Settings, store: Box<dyn LocalStore + Send>) -> Self {
        let catalog = DataTypeCatalog::load(store.as_ref());
        let animation_ms = settings.clone().sanitized().animation_ms;
        let layout = LayoutControls {
            animation_ms,
            ..LayoutControls::default()
        };
        let simulator = Simulator::new(Duration::from_millis(animation_ms));
        simulator.set_catalog(catalog.clone());
        Self {
            editor: FlowEditor::default(),
            selector: FlowSelector::default(),
            json_modal: JsonModal::default(),
            board: FileBoard::default(),
            block_modal: BlockModal::default(),
            catalog,
            theme: Theme::default(),
            layout,
            notices: Notifier::new(NoticeLayout::Stacked),
            simulator,
            store,
        }
    }

    /// Write the catalog to local storage and hand a copy to the simulator.
    pub fn save_catalog(&mut self) -> Result<(), CoreError> {
        self.simulator.set_catalog(self.catalog.clone());
        self.catalog.save(self.store.as_mut())
    }

    /// Reconcile catalog and simulator with the board. Runs after every
    /// structural change to the file blocks. Returns the visible count.
    pub fn sync_board(&mut self) -> usize {
        let count = self.catalog.sync_with(self.board.filenames());
        if let Err(e) = self.save_catalog() {
            tracing::error!(error = %e, "failed to persist data-type catalog");
            self.notices.error(format!("Could not save data types: {e}"));
        }
        self.simulator
            .refresh(self.board.filenames().map(str::to_string).collect());
        count
    }

    /// Replace the board with a fresh server listing.
    pub fn load_board(&mut self, blocks: Vec<FileBlock>) -> usize {
        self.board.replace(blocks);
        self.sync_board()
    }

    /// Mirror a confirmed file update. A rename carries the file's labels
    /// over to the new name.
    pub fn apply_file_update(&mut self, id: i64, patch: &NewFileBlock, previous: &str) {
        self.board.apply_update(id, patch);
        if previous != patch.filename && self.catalog.rename(previous, &patch.filename) {
            tracing::info!(from = %previous, to = %patch.filename, "moved data types to renamed file");
        }
        self.sync_board();
    }

    pub fn remove_file(&mut self, id: i64) -> Option<FileBlock> {
        let removed = self.board.remove(id);
        if removed.is_some() {
            self.sync_board();
        }
        removed
    }

    /// Sync and report for the data-type settings panel.
    pub fn open_data_types(&mut self) -> usize {
        let count = self.sync_board();
        if count == 0 {
            self.notices.info("No file blocks to configure animation data for");
        }
        count
    }

    pub fn set_layout(
        &mut self,
        animation_ms: Option<u64>,
        block_gap: Option<u32>,
        block_size: Option<u32>,
    ) -> Result<(), CoreError> {
        let mut layout = self.layout;
        if let Some(ms) = animation_ms {
            layout.set_animation_ms(ms)?;
        }
        if let Some(px) = block_gap {
            layout.set_block_gap(px)?;
        }
        if let Some(pct) = block_size {
            layout.set_block_size(pct)?;
        }
        if layout.animation_ms != self.layout.animation_ms {
            self.simulator
                .set_period(Duration::from_millis(layout.animation_ms));
        }
        self.layout = layout;
        Ok(())
    }

    /// The simulator page: theme and layout variables, the board, the
    /// running animation and the notification stack.
    pub fn board_view(&self) -> Element {
        let mut vars = self.theme.css_vars();
        vars.extend(self.layout.css_vars());
        Element::new("div")
            .id("simulator-view")
            .child(theme::root_style(&vars))
            .child(self.simulator.button_element())
            .child(self.board.element())
            .child(self.simulator.element())
            .child(self.block_modal.element())
            .child(self.notices.element())
    }

    /// The editor page.
    pub fn editor_view(&self) -> Element {
        Element::new("div")
            .id("editor-view")
            .child(self.selector.element())
            .child(self.editor.render())
            .child(self.json_modal.element())
    }
}

#[cfg(test)]
mod tests {
    use flowviz_core::catalog::DATA_TYPES_KEY;
    use flowviz_core::storage::MemoryStore;

    use super::*;

    fn file(id: i64, name: &str) -> FileBlock {
        FileBlock {
            id,
            filename: name.to_string(),
            description: String::new(),
        }
    }

    fn session() -> Session {
        Session::new(&Settings::default(), Box::new(MemoryStore::new()))
    }

    #[test]
    fn loading_board_syncs_catalog() {
        let mut s = session();
        assert_eq!(s.load_board(vec![file(1, "api.py"), file(2, "app.js")]), 2);
        assert!(s.catalog.get("utils.py").is_none());
        assert_eq!(s.catalog.get("app.js").unwrap()[0], "JavaScript Data");
        assert_eq!(s.simulator.snapshot().containers(), ["api.py", "app.js"]);
        assert!(s.store.get_item(DATA_TYPES_KEY).unwrap().contains("app.js"));
    }

    #[test]
    fn rename_moves_labels() {
        let mut s = session();
        s.load_board(vec![file(1, "api.py")]);
        let patch = NewFileBlock {
            filename: "gateway.py".into(),
            description: "edge".into(),
        };
        s.apply_file_update(1, &patch, "api.py");
        assert!(s.catalog.get("api.py").is_none());
        assert_eq!(s.catalog.get("gateway.py").unwrap()[0], "API Request");
        assert_eq!(s.board.get(1).unwrap().filename, "gateway.py");
    }

    #[test]
    fn empty_board_reports_info() {
        let mut s = session();
        assert_eq!(s.open_data_types(), 0);
        assert_eq!(
            s.notices.latest().unwrap().message,
            "No file blocks to configure animation data for"
        );
    }

    #[test]
    fn invalid_layout_changes_nothing() {
        let mut s = session();
        assert!(s.set_layout(Some(900), Some(1), None).is_err());
        assert_eq!(s.layout, LayoutControls::default());
        s.set_layout(None, Some(24), Some(80)).unwrap();
        assert_eq!(s.layout.block_gap_px, 24);
    }

    #[test]
    fn unusable_stored_speed_uses_default() {
        let settings = Settings {
            animation_ms: 0,
            ..Settings::default()
        };
        let s = Session::new(&settings, Box::new(MemoryStore::new()));
        assert_eq!(s.layout.animation_ms, flowviz_core::DEFAULT_ANIMATION_MS);
        assert_eq!(
            s.simulator.period(),
            Duration::from_millis(flowviz_core::DEFAULT_ANIMATION_MS)
        );
    }

    #[test]
    fn board_view_carries_theme_vars() {
        let s = session();
        let html = s.board_view().to_html();
        assert!(html.contains("--accent-gradient"));
        assert!(html.contains("Start simulation"));
    }
}
