use core_config::{ConfigError, FromEnv, env_bool, env_or_default, env_parse};

use crate::embedding::DEFAULT_VECTOR_SIZE;

pub const DEFAULT_COLLECTION: &str = "system_instructions";

/// Collection handling settings for [`InstructionService`](crate::InstructionService)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Collection ensured at startup
    pub default_collection: String,
    /// Dimension of newly created collections
    pub vector_size: u64,
    /// Create a missing collection on first write
    pub auto_create_collections: bool,
}

impl ServiceConfig {
    pub fn new(default_collection: impl Into<String>) -> Self {
        Self {
            default_collection: default_collection.into(),
            ..Self::default()
        }
    }

    pub fn with_vector_size(mut self, vector_size: u64) -> Self {
        self.vector_size = vector_size;
        self
    }

    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create_collections = enabled;
        self
    }
}

impl FromEnv for ServiceConfig {
    /// Reads:
    /// - DEFAULT_QDRANT_COLLECTION: defaults to system_instructions
    /// - VECTOR_SIZE: defaults to 768
    /// - AUTO_CREATE_COLLECTIONS: defaults to true
    fn from_env() -> Result<Self, ConfigError> {
        let default_collection = env_or_default("DEFAULT_QDRANT_COLLECTION", DEFAULT_COLLECTION);
        if default_collection.trim().is_empty() {
            return Err(ConfigError::ParseError {
                key: "DEFAULT_QDRANT_COLLECTION".to_string(),
                details: "must not be blank".to_string(),
            });
        }

        let vector_size = env_parse("VECTOR_SIZE", DEFAULT_VECTOR_SIZE)?;
        if vector_size == 0 {
            return Err(ConfigError::ParseError {
                key: "VECTOR_SIZE".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            default_collection,
            vector_size,
            auto_create_collections: env_bool("AUTO_CREATE_COLLECTIONS", true)?,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_collection: DEFAULT_COLLECTION.to_string(),
            vector_size: DEFAULT_VECTOR_SIZE,
            auto_create_collections: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("DEFAULT_QDRANT_COLLECTION", None::<&str>),
                ("VECTOR_SIZE", None::<&str>),
                ("AUTO_CREATE_COLLECTIONS", None::<&str>),
            ],
            || {
                let config = ServiceConfig::from_env().unwrap();
                assert_eq!(config.default_collection, "system_instructions");
                assert_eq!(config.vector_size, 768);
                assert!(config.auto_create_collections);
            },
        );
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("DEFAULT_QDRANT_COLLECTION", Some("prompts")),
                ("VECTOR_SIZE", Some("384")),
                ("AUTO_CREATE_COLLECTIONS", Some("false")),
            ],
            || {
                let config = ServiceConfig::from_env().unwrap();
                assert_eq!(config.default_collection, "prompts");
                assert_eq!(config.vector_size, 384);
                assert!(!config.auto_create_collections);
            },
        );
    }

    #[test]
    fn test_rejects_zero_vector_size() {
        temp_env::with_vars(
            [
                ("DEFAULT_QDRANT_COLLECTION", None::<&str>),
                ("VECTOR_SIZE", Some("0")),
            ],
            || {
                let err = ServiceConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("VECTOR_SIZE"));
            },
        );
    }

    #[test]
    fn test_rejects_blank_collection() {
        temp_env::with_var("DEFAULT_QDRANT_COLLECTION", Some("  "), || {
            assert!(ServiceConfig::from_env().is_err());
        });
    }
}
