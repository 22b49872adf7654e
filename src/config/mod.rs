// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! All settings come from process environment (optionally seeded from a
//! `.env` file by the binaries). Each section has defaults matching the
//! historical deployment and a `validate()` that is run once at startup.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BUCKET: &str = "cyclic-plum-cautious-woodpecker-ap-southeast-2";
pub const DEFAULT_REGION: &str = "ap-southeast-2";
pub const DEFAULT_CORPUS_KEY: &str = "text_files/Kevin_resume.txt";
pub const DEFAULT_PERSIST_DIR: &str = "persist";
pub const TEXT_KEY_PREFIX: &str = "text_files/";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" | "fs" => Ok(Self::Local),
            "memory" | "mock" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                name: "STORAGE_BACKEND".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Local => "local",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    OpenAi,
    Offline,
}

impl FromStr for ModelBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "offline" | "local" => Ok(Self::Offline),
            other => Err(ConfigError::InvalidValue {
                name: "MODEL_BACKEND".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    /// Maximum accepted multipart body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ApiSettings {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: "API_HOST".to_string(),
                value: self.host.clone(),
            })
    }
}

/// Content store settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub region: String,
    /// S3-compatible endpoint; the SDK resolves the regional AWS endpoint when unset
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Named profile for the shared credentials and config files
    pub profile: Option<String>,
    pub shared_credentials_file: Option<PathBuf>,
    pub local_root: PathBuf,
    pub timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            profile: None,
            shared_credentials_file: None,
            local_root: PathBuf::from("./store"),
            timeout_seconds: 30,
        }
    }
}

/// Retrieval pipeline settings shared by ingestion, the index builder and
/// the query handler.
#[derive(Debug, Clone)]
pub struct RagConfig {
    pub bucket: String,
    /// Text blob used as the retrieval corpus
    pub default_corpus_key: String,
    pub persist_directory: PathBuf,
    pub persist: bool,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            default_corpus_key: DEFAULT_CORPUS_KEY.to_string(),
            persist_directory: PathBuf::from(DEFAULT_PERSIST_DIR),
            persist: false,
            top_k: 1,
            chunk_size: 1000,
            chunk_overlap: 0,
        }
    }
}

impl RagConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Missing("S3_BUCKET".to_string()));
        }
        if self.default_corpus_key.trim().is_empty() {
            return Err(ConfigError::Missing("CORPUS_KEY".to_string()));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid(
                "RETRIEVAL_TOP_K must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "CHUNK_SIZE must be at least 1".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Embedding and chat model settings
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub backend: ModelBackend,
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub timeout: Duration,
    /// Dimensions of the offline hashing embedder
    pub offline_dimensions: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::OpenAi,
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(60),
            offline_dimensions: 384,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == ModelBackend::OpenAi
            && self.api_key.as_deref().map(str::trim).unwrap_or("").is_empty()
        {
            return Err(ConfigError::Missing("OPENAI_API_KEY".to_string()));
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "OPENAI_BASE_URL".to_string(),
                value: self.base_url.clone(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(
                "CHAT_TEMPERATURE must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.offline_dimensions == 0 {
            return Err(ConfigError::Invalid(
                "OFFLINE_EMBEDDING_DIMENSIONS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub api: ApiSettings,
    pub storage: StorageConfig,
    pub rag: RagConfig,
    pub models: ModelConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        let api = ApiSettings {
            host: lookup("API_HOST").unwrap_or(defaults.api.host),
            port: parse_or(&lookup, "API_PORT", defaults.api.port)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.api.max_upload_bytes)?,
        };

        let storage = StorageConfig {
            backend: match lookup("STORAGE_BACKEND") {
                Some(v) => v.parse()?,
                None => defaults.storage.backend,
            },
            region: lookup("AWS_REGION").unwrap_or(defaults.storage.region),
            endpoint: lookup("S3_ENDPOINT").filter(|v| !v.trim().is_empty()),
            access_key_id: lookup("AWS_ACCESS_KEY_ID"),
            secret_access_key: lookup("AWS_SECRET_ACCESS_KEY"),
            session_token: lookup("AWS_SESSION_TOKEN"),
            profile: lookup("AWS_PROFILE").filter(|v| !v.trim().is_empty()),
            shared_credentials_file: lookup("AWS_SHARED_CREDENTIALS_FILE").map(PathBuf::from),
            local_root: lookup("LOCAL_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.local_root),
            timeout_seconds: parse_or(&lookup, "STORAGE_TIMEOUT_SECS", defaults.storage.timeout_seconds)?,
        };

        let rag = RagConfig {
            bucket: lookup("S3_BUCKET").unwrap_or(defaults.rag.bucket),
            default_corpus_key: lookup("CORPUS_KEY").unwrap_or(defaults.rag.default_corpus_key),
            persist_directory: lookup("INDEX_PERSIST_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.rag.persist_directory),
            persist: lookup("INDEX_PERSIST")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.rag.persist),
            top_k: parse_or(&lookup, "RETRIEVAL_TOP_K", defaults.rag.top_k)?,
            chunk_size: parse_or(&lookup, "CHUNK_SIZE", defaults.rag.chunk_size)?,
            chunk_overlap: parse_or(&lookup, "CHUNK_OVERLAP", defaults.rag.chunk_overlap)?,
        };

        let models = ModelConfig {
            backend: match lookup("MODEL_BACKEND") {
                Some(v) => v.parse()?,
                None => defaults.models.backend,
            },
            api_key: lookup("OPENAI_API_KEY"),
            base_url: lookup("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.models.base_url),
            chat_model: lookup("OPENAI_CHAT_MODEL").unwrap_or(defaults.models.chat_model),
            embedding_model: lookup("OPENAI_EMBEDDING_MODEL")
                .unwrap_or(defaults.models.embedding_model),
            temperature: parse_or(&lookup, "CHAT_TEMPERATURE", defaults.models.temperature)?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "MODEL_TIMEOUT_SECS",
                defaults.models.timeout.as_secs(),
            )?),
            offline_dimensions: parse_or(
                &lookup,
                "OFFLINE_EMBEDDING_DIMENSIONS",
                defaults.models.offline_dimensions,
            )?,
        };

        Ok(Self {
            api,
            storage,
            rag,
            models,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.listen_addr()?;
        if self.api.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "MAX_UPLOAD_BYTES must be at least 1".to_string(),
            ));
        }
        if let (StorageBackend::S3, Some(endpoint)) =
            (self.storage.backend, &self.storage.endpoint)
        {
            url::Url::parse(endpoint).map_err(|_| ConfigError::InvalidValue {
                name: "S3_ENDPOINT".to_string(),
                value: endpoint.clone(),
            })?;
        }
        self.rag.validate()?;
        self.models.validate()
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
