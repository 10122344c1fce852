//! The simulator board: a local mirror of the server's file blocks plus the
//! add/edit modal.

use serde::Serialize;

use crate::render::{icon, Element};
use crate::{CoreError, FileBlock, NewFileBlock};

/// Apply `patch` to the block with `id` inside a full block list.
/// Returns the block's previous filename, or `None` when no block matched.
pub fn patch_block_list(blocks: &mut [FileBlock], id: i64, patch: &NewFileBlock) -> Option<String> {
    let block = blocks.iter_mut().find(|b| b.id == id)?;
    let previous = std::mem::replace(&mut block.filename, patch.filename.clone());
    block.description = patch.description.clone();
    Some(previous)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileBoard {
    blocks: Vec<FileBlock>,
    /// Block whose info box is showing. At most one is open.
    open_info: Option<i64>,
}

impl FileBoard {
    pub fn new(blocks: Vec<FileBlock>) -> Self {
        Self {
            blocks,
            open_info: None,
        }
    }

    pub fn blocks(&self) -> &[FileBlock] {
        &self.blocks
    }

    pub fn get(&self, id: i64) -> Option<&FileBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Filenames in display order, as the simulator cycles through them.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.filename.as_str())
    }

    /// Replace the mirror with a fresh server listing.
    pub fn replace(&mut self, blocks: Vec<FileBlock>) {
        if let Some(id) = self.open_info {
            if !blocks.iter().any(|b| b.id == id) {
                self.open_info = None;
            }
        }
        self.blocks = blocks;
    }

    /// Mirror a confirmed server update. Returns the previous filename.
    pub fn apply_update(&mut self, id: i64, patch: &NewFileBlock) -> Option<String> {
        patch_block_list(&mut self.blocks, id, patch)
    }

    pub fn remove(&mut self, id: i64) -> Option<FileBlock> {
        let index = self.blocks.iter().position(|b| b.id == id)?;
        if self.open_info == Some(id) {
            self.open_info = None;
        }
        Some(self.blocks.remove(index))
    }

    /// Open one block's info box, closing any other.
    pub fn open_info(&mut self, id: i64) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.open_info = Some(id);
        true
    }

    pub fn close_info(&mut self) {
        self.open_info = None;
    }

    pub fn info_open(&self) -> Option<i64> {
        self.open_info
    }

    pub fn element(&self) -> Element {
        let mut board = Element::new("div").id("file-board");
        for block in &self.blocks {
            board.push(self.container_element(block));
        }
        board
    }

    fn container_element(&self, block: &FileBlock) -> Element {
        let open = self.open_info == Some(block.id);
        let mut file = Element::new("div")
            .class("file-block")
            .child(icon("fa-solid fa-file-code"))
            .child(Element::new("span").class("filename").text(block.filename.clone()))
            .child(
                Element::new("div")
                    .class("file-controls")
                    .child(
                        Element::new("button")
                            .class("edit-block-btn")
                            .attr("title", "Edit file")
                            .child(icon("fa-solid fa-pen")),
                    )
                    .child(
                        Element::new("button")
                            .class("delete-block-btn")
                            .attr("title", "Delete file")
                            .child(icon("fa-solid fa-trash")),
                    ),
            );
        let mut info = Element::new("div")
            .class("info-box")
            .child(Element::new("strong").text(block.filename.clone()))
            .text(block.description.clone());
        if open {
            file.add_class("info-active");
            info.add_class("visible");
        }
        Element::new("div")
            .class("file-container")
            .attr("data-id", block.id.to_string())
            .child(file)
            .child(info)
    }
}

/// What the block modal produces on a valid submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BlockSubmission {
    Add(NewFileBlock),
    Update { id: i64, patch: NewFileBlock },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockModal {
    open: bool,
    editing: Option<i64>,
    pub filename: String,
    pub description: String,
}

impl BlockModal {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn heading(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit file"
        } else {
            "Add new file"
        }
    }

    pub fn open_for_add(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    pub fn open_for_edit(&mut self, block: &FileBlock) {
        *self = Self {
            open: true,
            editing: Some(block.id),
            filename: block.filename.clone(),
            description: block.description.clone(),
        };
    }

    /// Close and clear every field.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Validate the fields. The modal stays open either way; callers close it
    /// once the server confirms.
    pub fn submit(&self) -> Result<BlockSubmission, CoreError> {
        let filename = self.filename.trim();
        if filename.is_empty() {
            return Err(CoreError::Validation("Please enter a file name".to_string()));
        }
        let body = NewFileBlock {
            filename: filename.to_string(),
            description: self.description.trim().to_string(),
        };
        Ok(match self.editing {
            Some(id) => BlockSubmission::Update { id, patch: body },
            None => BlockSubmission::Add(body),
        })
    }

    pub fn element(&self) -> Element {
        let mut modal = Element::new("div")
            .id("blockModal")
            .class("modal")
            .child(Element::new("h3").id("modalTitle").text(self.heading()))
            .child(
                Element::new("input")
                    .id("blockFilename")
                    .attr("type", "text")
                    .attr("value", self.filename.clone()),
            )
            .child(
                Element::new("textarea")
                    .id("blockDescription")
                    .text(self.description.clone()),
            )
            .child(
                Element::new("input")
                    .id("blockId")
                    .attr("type", "hidden")
                    .attr("value", self.editing.map(|id| id.to_string()).unwrap_or_default()),
            );
        if self.open {
            modal.add_class("open");
        }
        modal
    }
}
