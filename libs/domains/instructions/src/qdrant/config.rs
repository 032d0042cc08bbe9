use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};

pub const DEFAULT_QDRANT_HOST: &str = "qdrant";
pub const DEFAULT_QDRANT_GRPC_PORT: u16 = 6334;
pub const DEFAULT_QDRANT_REST_PORT: u16 = 6333;
pub const DEFAULT_QDRANT_TIMEOUT_SECS: u64 = 30;

/// Qdrant connection configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// gRPC endpoint the client connects to
    pub url: String,
    /// REST/dashboard port, reported at startup only
    pub rest_port: u16,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Host part of the gRPC url, used to report the dashboard address.
    fn host(&self) -> &str {
        let without_scheme = self
            .url
            .split_once("://")
            .map_or(self.url.as_str(), |(_, rest)| rest);
        without_scheme
            .split(['/', ':'])
            .next()
            .unwrap_or(without_scheme)
    }

    pub fn dashboard_url(&self) -> String {
        format!("http://{}:{}/dashboard", self.host(), self.rest_port)
    }
}

impl FromEnv for QdrantConfig {
    /// Reads:
    /// - QDRANT_URL: full gRPC url, wins when set
    /// - QDRANT_HOST / QDRANT_PORT_GRPC: otherwise, defaults qdrant:6334
    /// - QDRANT_PORT_REST: defaults to 6333
    /// - QDRANT_API_KEY: optional, blank means none
    /// - QDRANT_TIMEOUT_SECS: defaults to 30
    fn from_env() -> Result<Self, ConfigError> {
        let url = match env_optional("QDRANT_URL") {
            Some(url) => url,
            None => {
                let host = env_or_default("QDRANT_HOST", DEFAULT_QDRANT_HOST);
                let port = env_parse("QDRANT_PORT_GRPC", DEFAULT_QDRANT_GRPC_PORT)?;
                format!("http://{}:{}", host, port)
            }
        };

        Ok(Self {
            url,
            rest_port: env_parse("QDRANT_PORT_REST", DEFAULT_QDRANT_REST_PORT)?,
            api_key: env_optional("QDRANT_API_KEY"),
            timeout_secs: env_parse("QDRANT_TIMEOUT_SECS", DEFAULT_QDRANT_TIMEOUT_SECS)?,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: format!("http://{}:{}", DEFAULT_QDRANT_HOST, DEFAULT_QDRANT_GRPC_PORT),
            rest_port: DEFAULT_QDRANT_REST_PORT,
            api_key: None,
            timeout_secs: DEFAULT_QDRANT_TIMEOUT_SECS,
        }
    }
}
