use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::ServiceConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{InstructionError, InstructionResult};
use crate::models::{Instruction, ScoredInstruction, StatusResponse, check_metadata};
use crate::repository::InstructionRepository;

/// Instruction service: embeds text, then stores or queries it.
///
/// The embedding call always happens before the store call, so a provider
/// failure never reaches the store.
pub struct InstructionService<R: InstructionRepository> {
    repository: R,
    embedder: Arc<dyn EmbeddingProvider>,
    config: ServiceConfig,
}

fn require(field: &str, value: &str) -> InstructionResult<()> {
    if value.trim().is_empty() {
        return Err(InstructionError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

impl<R: InstructionRepository> InstructionService<R> {
    pub fn new(repository: R, embedder: Arc<dyn EmbeddingProvider>, config: ServiceConfig) -> Self {
        Self {
            repository,
            embedder,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn default_collection(&self) -> &str {
        &self.config.default_collection
    }

    // ===== Collection Management =====

    /// Create the collection unless it already exists.
    ///
    /// A creation failure is forgiven when the collection exists afterwards,
    /// i.e. another writer created it first.
    #[instrument(skip(self))]
    pub async fn ensure_collection(&self, name: &str) -> InstructionResult<()> {
        require("collection_name", name)?;

        if self.repository.collection_exists(name).await? {
            debug!(collection = name, "Collection already exists");
            return Ok(());
        }

        match self
            .repository
            .create_collection(name, self.config.vector_size)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                if matches!(self.repository.collection_exists(name).await, Ok(true)) {
                    debug!(collection = name, "Collection created concurrently");
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Ensure the configured default collection; run once before serving.
    pub async fn ensure_default_collection(&self) -> InstructionResult<()> {
        let name = self.config.default_collection.clone();
        self.ensure_collection(&name).await?;
        info!(
            collection = %name,
            vector_size = self.config.vector_size,
            "Default collection ready"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> InstructionResult<Vec<String>> {
        self.repository.list_collections().await
    }

    // ===== Instruction Operations =====

    /// Embed the content and upsert it under the instruction's id.
    #[instrument(skip(self, instruction), fields(instruction_id = %instruction.instruction_id))]
    pub async fn add_instruction(
        &self,
        collection: &str,
        instruction: Instruction,
    ) -> InstructionResult<StatusResponse> {
        require("collection_name", collection)?;
        require("instruction_id", &instruction.instruction_id)?;
        require("content", &instruction.content)?;
        check_metadata(&instruction.metadata)?;

        let vector = self.embedder.embed(&instruction.content).await?;

        if self.config.auto_create_collections {
            self.ensure_collection(collection).await?;
        }

        let instruction_id = instruction.instruction_id.clone();
        let status = self.repository.upsert(collection, instruction, vector).await?;

        if !status.is_completed() {
            warn!(?status, "Upsert did not complete");
            return Err(InstructionError::Store(format!(
                "upsert not completed (status: {:?})",
                status
            )));
        }

        info!(collection, instruction_id = %instruction_id, "Instruction stored");
        Ok(StatusResponse::success(format!(
            "Instruction '{}' added to collection '{}'",
            instruction_id, collection
        )))
    }

    #[instrument(skip(self))]
    pub async fn get_instruction(
        &self,
        collection: &str,
        instruction_id: &str,
    ) -> InstructionResult<Instruction> {
        require("collection_name", collection)?;
        require("instruction_id", instruction_id)?;

        self.repository
            .get(collection, instruction_id)
            .await?
            .ok_or_else(|| InstructionError::not_found(collection, instruction_id))
    }

    /// Instructions nearest to `query`, most similar first.
    #[instrument(skip(self, query))]
    pub async fn search_instructions(
        &self,
        collection: &str,
        query: &str,
        limit: u32,
    ) -> InstructionResult<Vec<ScoredInstruction>> {
        require("collection_name", collection)?;
        require("query", query)?;
        if limit == 0 {
            return Err(InstructionError::Store(
                "search limit must be a positive integer".to_string(),
            ));
        }

        let vector = self.embedder.embed(query).await?;
        let mut results = self
            .repository
            .search(collection, vector, u64::from(limit))
            .await?;
        results.truncate(limit as usize);

        debug!(hits = results.len(), "Search finished");
        Ok(results)
    }

    #[instrument(skip(self))]
    pub async fn delete_instruction(
        &self,
        collection: &str,
        instruction_id: &str,
    ) -> InstructionResult<StatusResponse> {
        require("collection_name", collection)?;
        require("instruction_id", instruction_id)?;

        let status = self.repository.delete(collection, instruction_id).await?;
        if !status.is_completed() {
            warn!(?status, "Delete did not complete");
            return Err(InstructionError::Store(format!(
                "delete not completed (status: {:?})",
                status
            )));
        }

        info!(collection, instruction_id, "Instruction deleted");
        Ok(StatusResponse::success(format!(
            "Instruction '{}' deleted from collection '{}'",
            instruction_id, collection
        )))
    }

    /// The first `limit` instructions of a collection, in store order.
    #[instrument(skip(self))]
    pub async fn list_instructions(
        &self,
        collection: &str,
        limit: u32,
    ) -> InstructionResult<Vec<Instruction>> {
        require("collection_name", collection)?;
        if limit == 0 {
            return Err(InstructionError::Store(
                "list limit must be a positive integer".to_string(),
            ));
        }

        self.repository.scroll(collection, limit).await
    }
}
