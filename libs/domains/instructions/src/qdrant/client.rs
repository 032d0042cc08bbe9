use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    self, CreateCollectionBuilder, DeletePointsBuilder, Distance, GetPointsBuilder, PointId,
    PointStruct, PointsIdsList, ScrollPointsBuilder, SearchPointsBuilder, UpdateStatus,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use tracing::instrument;

use super::QdrantConfig;
use super::payload::{from_qdrant_payload, to_qdrant_payload};
use crate::error::{InstructionError, InstructionResult};
use crate::models::{Instruction, ScoredInstruction, WriteStatus, point_id_for};
use crate::repository::InstructionRepository;

/// gRPC status code Qdrant uses for a missing collection.
const GRPC_NOT_FOUND: i32 = 5;

/// Qdrant-backed implementation of InstructionRepository
pub struct QdrantRepository {
    client: Qdrant,
}

impl QdrantRepository {
    pub fn new(config: &QdrantConfig) -> InstructionResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| {
                InstructionError::Config(format!("Failed to build Qdrant client: {}", e))
            })?;

        Ok(Self { client })
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn point_id(instruction_id: &str) -> PointId {
        PointId::from(point_id_for(instruction_id).to_string())
    }

    fn point_id_to_string(point_id: Option<&PointId>) -> String {
        match point_id.and_then(|id| id.point_id_options.as_ref()) {
            Some(qdrant::point_id::PointIdOptions::Uuid(uuid)) => uuid.clone(),
            Some(qdrant::point_id::PointIdOptions::Num(num)) => num.to_string(),
            None => String::new(),
        }
    }

    fn write_status(result: Option<qdrant::UpdateResult>) -> WriteStatus {
        match result.map(|r| r.status()) {
            Some(UpdateStatus::Completed) => WriteStatus::Completed,
            Some(UpdateStatus::Acknowledged) => WriteStatus::Acknowledged,
            _ => WriteStatus::Rejected,
        }
    }
}

/// Maps a client error for an operation on `collection`.
fn store_error(collection: &str, err: QdrantError) -> InstructionError {
    if let QdrantError::ResponseError { status } = &err {
        if status.code() as i32 == GRPC_NOT_FOUND
            && status.message().to_ascii_lowercase().contains("collection")
        {
            return InstructionError::CollectionNotFound(collection.to_string());
        }
    }
    InstructionError::Store(err.to_string())
}

#[async_trait]
impl InstructionRepository for QdrantRepository {
    #[instrument(skip(self))]
    async fn collection_exists(&self, name: &str) -> InstructionResult<bool> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| store_error(name, e))
    }

    #[instrument(skip(self))]
    async fn create_collection(&self, name: &str, vector_size: u64) -> InstructionResult<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .map_err(|e| store_error(name, e))?;

        tracing::info!(collection = name, vector_size, "Created collection");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_collections(&self) -> InstructionResult<Vec<String>> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| InstructionError::Store(e.to_string()))?;

        Ok(response
            .collections
            .into_iter()
            .map(|collection| collection.name)
            .collect())
    }

    #[instrument(
        skip(self, instruction, vector),
        fields(instruction_id = %instruction.instruction_id)
    )]
    async fn upsert(
        &self,
        collection: &str,
        instruction: Instruction,
        vector: Vec<f32>,
    ) -> InstructionResult<WriteStatus> {
        let point = PointStruct::new(
            Self::point_id(&instruction.instruction_id),
            vector,
            to_qdrant_payload(instruction.into_payload()),
        );

        let response = self
            .client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true))
            .await
            .map_err(|e| store_error(collection, e))?;

        Ok(Self::write_status(response.result))
    }

    #[instrument(skip(self))]
    async fn get(
        &self,
        collection: &str,
        instruction_id: &str,
    ) -> InstructionResult<Option<Instruction>> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(collection, vec![Self::point_id(instruction_id)])
                    .with_payload(true)
                    .with_vectors(false),
            )
            .await
            .map_err(|e| store_error(collection, e))?;

        Ok(response.result.into_iter().next().map(|point| {
            Instruction::from_payload(
                Self::point_id_to_string(point.id.as_ref()),
                from_qdrant_payload(point.payload),
            )
        }))
    }

    #[instrument(skip(self, vector))]
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> InstructionResult<Vec<ScoredInstruction>> {
        let response = self
            .client
            .search_points(SearchPointsBuilder::new(collection, vector, limit).with_payload(true))
            .await
            .map_err(|e| store_error(collection, e))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| {
                let instruction = Instruction::from_payload(
                    Self::point_id_to_string(point.id.as_ref()),
                    from_qdrant_payload(point.payload),
                );
                ScoredInstruction::new(instruction, point.score)
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete(
        &self,
        collection: &str,
        instruction_id: &str,
    ) -> InstructionResult<WriteStatus> {
        let response = self
            .client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(PointsIdsList {
                        ids: vec![Self::point_id(instruction_id)],
                    })
                    .wait(true),
            )
            .await
            .map_err(|e| store_error(collection, e))?;

        Ok(Self::write_status(response.result))
    }

    #[instrument(skip(self))]
    async fn scroll(&self, collection: &str, limit: u32) -> InstructionResult<Vec<Instruction>> {
        let response = self
            .client
            .scroll(
                ScrollPointsBuilder::new(collection)
                    .limit(limit)
                    .with_payload(true)
                    .with_vectors(false),
            )
            .await
            .map_err(|e| store_error(collection, e))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| {
                Instruction::from_payload(
                    Self::point_id_to_string(point.id.as_ref()),
                    from_qdrant_payload(point.payload),
                )
            })
            .collect())
    }

    async fn health_check(&self) -> InstructionResult<()> {
        self.client
            .health_check()
            .await
            .map(|_| ())
            .map_err(|e| InstructionError::Store(e.to_string()))
    }
}
