use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{InstructionError, InstructionResult};

/// Free-form key/value data stored next to an instruction, never embedded.
pub type Metadata = serde_json::Map<String, Value>;

/// Payload key holding the embedded text.
pub const CONTENT_KEY: &str = "content";

/// Payload key holding the caller's instruction id.
pub const INSTRUCTION_ID_KEY: &str = "instruction_id";

pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Namespace for deriving point ids from instruction ids that are not UUIDs.
const POINT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_3c2e_94a7_4d0b_8e55_2f7a_c0d1_e3b9);

/// A stored system instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Instruction {
    pub instruction_id: String,
    pub content: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}

impl Instruction {
    pub fn new(instruction_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            instruction_id: instruction_id.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Point id under which this instruction is stored.
    pub fn point_id(&self) -> Uuid {
        point_id_for(&self.instruction_id)
    }

    /// Flattens the instruction into a store payload: metadata plus the reserved keys.
    pub fn into_payload(self) -> Metadata {
        let mut payload = self.metadata;
        payload.insert(CONTENT_KEY.to_string(), Value::String(self.content));
        payload.insert(
            INSTRUCTION_ID_KEY.to_string(),
            Value::String(self.instruction_id),
        );
        payload
    }

    /// Rebuilds an instruction from a store payload.
    ///
    /// `fallback_id` is used when the point carries no `instruction_id`
    /// (written by another client). Missing or non-string content reads as empty.
    pub fn from_payload(fallback_id: String, mut payload: Metadata) -> Self {
        let content = match payload.remove(CONTENT_KEY) {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let instruction_id = match payload.remove(INSTRUCTION_ID_KEY) {
            Some(Value::String(s)) => s,
            _ => fallback_id,
        };

        Self {
            instruction_id,
            content,
            metadata: payload,
        }
    }
}

/// Maps an instruction id to a store point id.
///
/// UUIDs are used as-is; any other id gets a deterministic UUIDv5, so the same
/// id always lands on the same point.
pub fn point_id_for(instruction_id: &str) -> Uuid {
    Uuid::parse_str(instruction_id)
        .unwrap_or_else(|_| Uuid::new_v5(&POINT_ID_NAMESPACE, instruction_id.as_bytes()))
}

/// Rejects metadata that would shadow the reserved payload keys.
pub fn check_metadata(metadata: &Metadata) -> InstructionResult<()> {
    for key in [CONTENT_KEY, INSTRUCTION_ID_KEY] {
        if metadata.contains_key(key) {
            return Err(InstructionError::Validation(format!(
                "metadata key '{}' is reserved",
                key
            )));
        }
    }
    Ok(())
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoredInstruction {
    pub instruction_id: String,
    pub content: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    /// Cosine similarity to the query, higher is closer
    pub score: f32,
}

impl ScoredInstruction {
    pub fn new(instruction: Instruction, score: f32) -> Self {
        Self {
            instruction_id: instruction.instruction_id,
            content: instruction.content,
            metadata: instruction.metadata,
            score,
        }
    }
}

/// Outcome the store reports for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Completed,
    Acknowledged,
    Rejected,
}

impl WriteStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, WriteStatus::Completed)
    }
}

// ===== Request/Response DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct AddInstruction {
    #[validate(length(min = 1, max = 255))]
    pub collection_name: String,
    #[validate(length(min = 1, max = 512))]
    pub instruction_id: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
}

impl AddInstruction {
    pub fn into_instruction(self) -> (String, Instruction) {
        let instruction = Instruction {
            instruction_id: self.instruction_id,
            content: self.content,
            metadata: self.metadata.unwrap_or_default(),
        };
        (self.collection_name, instruction)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SearchInstructions {
    #[validate(length(min = 1, max = 255))]
    pub collection_name: String,
    #[validate(length(min = 1))]
    pub query: String,
    #[serde(default = "default_search_limit")]
    #[schema(default = 5)]
    pub limit: u32,
}

fn default_search_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ListInstructions {
    #[validate(length(min = 1, max = 255))]
    pub collection_name: String,
    #[serde(default = "default_list_limit")]
    #[schema(default = 100)]
    pub limit: u32,
}

fn default_list_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

/// Result of a write operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// "success" or "failure"
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

/// Liveness banner served at the root path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub name: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_point_id_keeps_uuid_ids() {
        let id = "0b9d4c6e-1f2a-4e55-9b0a-7c1d2e3f4a5b";
        assert_eq!(point_id_for(id).to_string(), id);
    }

    #[test]
    fn test_point_id_is_deterministic_for_opaque_ids() {
        assert_eq!(point_id_for("a1"), point_id_for("a1"));
        assert_ne!(point_id_for("a1"), point_id_for("a2"));
        assert_eq!(point_id_for("a1").get_version_num(), 5);
    }

    #[test]
    fn test_payload_round_trip_keeps_nested_metadata() {
        let instruction = Instruction::new("a1", "Always answer in French").with_metadata(
            metadata(json!({"lang": "fr", "tags": ["tone", 2], "owner": {"team": "core"}})),
        );

        let payload = instruction.clone().into_payload();
        assert_eq!(payload[CONTENT_KEY], "Always answer in French");
        assert_eq!(payload[INSTRUCTION_ID_KEY], "a1");

        let restored = Instruction::from_payload("ignored".to_string(), payload);
        assert_eq!(restored, instruction);
    }

    #[test]
    fn test_from_payload_falls_back_to_point_id() {
        let restored = Instruction::from_payload(
            "42".to_string(),
            metadata(json!({"content": "Be brief", "lang": "en"})),
        );
        assert_eq!(restored.instruction_id, "42");
        assert_eq!(restored.content, "Be brief");
        assert_eq!(restored.metadata, metadata(json!({"lang": "en"})));
    }

    #[test]
    fn test_check_metadata_rejects_reserved_keys() {
        assert!(check_metadata(&metadata(json!({"lang": "fr"}))).is_ok());
        assert!(matches!(
            check_metadata(&metadata(json!({"content": "x"}))),
            Err(InstructionError::Validation(_))
        ));
        assert!(check_metadata(&metadata(json!({"instruction_id": "x"}))).is_err());
    }

    #[test]
    fn test_request_defaults() {
        let search: SearchInstructions =
            serde_json::from_value(json!({"collection_name": "docs", "query": "q"})).unwrap();
        assert_eq!(search.limit, DEFAULT_SEARCH_LIMIT);

        let list: ListInstructions =
            serde_json::from_value(json!({"collection_name": "docs"})).unwrap();
        assert_eq!(list.limit, DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn test_add_instruction_validation() {
        let add: AddInstruction = serde_json::from_value(json!({
            "collection_name": "docs",
            "instruction_id": "",
            "content": "x"
        }))
        .unwrap();
        assert!(add.validate().is_err());
    }

    #[test]
    fn test_write_status() {
        assert!(WriteStatus::Completed.is_completed());
        assert!(!WriteStatus::Acknowledged.is_completed());
    }
}
