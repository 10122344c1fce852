use flowviz_core::board::patch_block_list;
use flowviz_core::theme::Theme;
use flowviz_core::{FileBlock, NewFileBlock};

use crate::{ClientError, FlowvizClient, StatusResponse};

impl FlowvizClient {
    /// `GET /api/blocks`.
    pub async fn list_blocks(&self) -> Result<Vec<FileBlock>, ClientError> {
        let response = self.client.get(self.url("/api/blocks")).send().await?;
        Self::parse_response(response).await
    }

    /// `POST /api/blocks/add`. The server assigns the id, so callers re-fetch
    /// the list afterwards.
    pub async fn add_block(&self, block: &NewFileBlock) -> Result<StatusResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/blocks/add"))
            .json(block)
            .send()
            .await?;
        let ack = Self::confirm(response).await?;
        tracing::info!(filename = %block.filename, "file block added");
        Ok(ack)
    }

    /// `POST /api/blocks`: bulk replace of the whole list.
    pub async fn replace_blocks(&self, blocks: &[FileBlock]) -> Result<StatusResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/blocks"))
            .json(blocks)
            .send()
            .await?;
        Self::confirm(response).await
    }

    /// `DELETE /api/blocks/{id}`.
    pub async fn delete_block(&self, id: i64) -> Result<StatusResponse, ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/blocks/{id}")))
            .send()
            .await?;
        let ack = Self::confirm(response).await?;
        tracing::info!(block_id = id, "file block deleted");
        Ok(ack)
    }

    /// Update one file block. The API has no targeted update, so this fetches
    /// the full list, patches the entry and posts the list back. The three
    /// requests are not atomic: a concurrent writer between the fetch and the
    /// post is overwritten.
    ///
    /// Returns the block's filename before the update.
    pub async fn update_block(&self, id: i64, patch: &NewFileBlock) -> Result<String, ClientError> {
        let mut blocks = self.list_blocks().await?;
        let previous = patch_block_list(&mut blocks, id, patch).ok_or(ClientError::NotFound(id))?;
        self.replace_blocks(&blocks).await?;
        tracing::info!(block_id = id, from = %previous, to = %patch.filename, "file block updated");
        Ok(previous)
    }

    /// `POST /api/theme`.
    pub async fn save_theme(&self, theme: &Theme) -> Result<StatusResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/theme"))
            .json(theme)
            .send()
            .await?;
        Self::confirm(response).await
    }

    /// `POST /api/reset`. On success the caller reloads everything it mirrors.
    pub async fn reset(&self) -> Result<StatusResponse, ClientError> {
        let response = self.client.post(self.url("/api/reset")).send().await?;
        let ack = Self::confirm(response).await?;
        tracing::info!("server settings reset");
        Ok(ack)
    }
}
