use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{InstructionError, InstructionResult};
use crate::models::{Instruction, ScoredInstruction, WriteStatus, point_id_for};

/// Repository trait for instruction storage
///
/// Abstracts the vector store (Qdrant). Instructions are addressed by the
/// caller's id; mapping to store point ids is the implementation's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstructionRepository: Send + Sync {
    // ===== Collection Management =====

    /// Whether a collection with this name exists
    async fn collection_exists(&self, name: &str) -> InstructionResult<bool>;

    /// Create a collection of `vector_size`-dimensional vectors with cosine distance
    async fn create_collection(&self, name: &str, vector_size: u64) -> InstructionResult<()>;

    /// Names of all collections, in store order
    async fn list_collections(&self) -> InstructionResult<Vec<String>>;

    // ===== Instruction Operations =====

    /// Insert or overwrite an instruction with its embedding, waiting for the write to apply
    async fn upsert(
        &self,
        collection: &str,
        instruction: Instruction,
        vector: Vec<f32>,
    ) -> InstructionResult<WriteStatus>;

    /// Fetch one instruction (payload only)
    async fn get(
        &self,
        collection: &str,
        instruction_id: &str,
    ) -> InstructionResult<Option<Instruction>>;

    /// Nearest instructions to `vector`, closest first, at most `limit`
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> InstructionResult<Vec<ScoredInstruction>>;

    /// Delete one instruction, waiting for the write to apply
    async fn delete(&self, collection: &str, instruction_id: &str)
    -> InstructionResult<WriteStatus>;

    /// First `limit` instructions in store iteration order (payload only)
    async fn scroll(&self, collection: &str, limit: u32) -> InstructionResult<Vec<Instruction>>;

    /// Connectivity check used by readiness probes
    async fn health_check(&self) -> InstructionResult<()>;
}

struct StoredPoint {
    instruction: Instruction,
    vector: Vec<f32>,
}

struct InMemoryCollection {
    vector_size: u64,
    points: BTreeMap<Uuid, StoredPoint>,
}

/// In-memory implementation of InstructionRepository (for development/testing)
///
/// Brute-force cosine search. Points iterate in point-id order, like Qdrant's scroll.
#[derive(Default, Clone)]
pub struct InMemoryInstructionRepository {
    collections: Arc<RwLock<BTreeMap<String, InMemoryCollection>>>,
}

impl InMemoryInstructionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn check_dimension(collection: &InMemoryCollection, vector: &[f32]) -> InstructionResult<()> {
    if vector.len() as u64 != collection.vector_size {
        return Err(InstructionError::Store(format!(
            "wrong vector dimension: expected {}, got {}",
            collection.vector_size,
            vector.len()
        )));
    }
    Ok(())
}

#[async_trait]
impl InstructionRepository for InMemoryInstructionRepository {
    async fn collection_exists(&self, name: &str) -> InstructionResult<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, name: &str, vector_size: u64) -> InstructionResult<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(InstructionError::Store(format!(
                "Collection '{}' already exists",
                name
            )));
        }

        collections.insert(
            name.to_string(),
            InMemoryCollection {
                vector_size,
                points: BTreeMap::new(),
            },
        );
        tracing::info!(collection = name, vector_size, "Created collection");
        Ok(())
    }

    async fn list_collections(&self) -> InstructionResult<Vec<String>> {
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn upsert(
        &self,
        collection: &str,
        instruction: Instruction,
        vector: Vec<f32>,
    ) -> InstructionResult<WriteStatus> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| InstructionError::CollectionNotFound(collection.to_string()))?;
        check_dimension(target, &vector)?;

        target
            .points
            .insert(instruction.point_id(), StoredPoint { instruction, vector });
        Ok(WriteStatus::Completed)
    }

    async fn get(
        &self,
        collection: &str,
        instruction_id: &str,
    ) -> InstructionResult<Option<Instruction>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| InstructionError::CollectionNotFound(collection.to_string()))?;

        Ok(target
            .points
            .get(&point_id_for(instruction_id))
            .map(|point| point.instruction.clone()))
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> InstructionResult<Vec<ScoredInstruction>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| InstructionError::CollectionNotFound(collection.to_string()))?;
        check_dimension(target, &vector)?;

        let mut hits: Vec<ScoredInstruction> = target
            .points
            .values()
            .map(|point| {
                ScoredInstruction::new(
                    point.instruction.clone(),
                    cosine_similarity(&vector, &point.vector),
                )
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(hits)
    }

    async fn delete(
        &self,
        collection: &str,
        instruction_id: &str,
    ) -> InstructionResult<WriteStatus> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| InstructionError::CollectionNotFound(collection.to_string()))?;

        // Deleting an absent point still completes.
        target.points.remove(&point_id_for(instruction_id));
        Ok(WriteStatus::Completed)
    }

    async fn scroll(&self, collection: &str, limit: u32) -> InstructionResult<Vec<Instruction>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| InstructionError::CollectionNotFound(collection.to_string()))?;

        Ok(target
            .points
            .values()
            .take(limit as usize)
            .map(|point| point.instruction.clone())
            .collect())
    }

    async fn health_check(&self) -> InstructionResult<()> {
        Ok(())
    }
}
