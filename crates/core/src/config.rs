//! Configuration management for Sage.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`SAGE_CONFIG` or `.sage/config.yaml` in the workspace)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones. Validation only checks that the
//! required endpoints and credentials are present; nothing is probed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Fixed agent identifier used when persisting conversation turns.
pub const DEFAULT_AGENT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .sage/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub server: ServerConfig,

    pub vector: VectorStoreConfig,

    pub completion: CompletionConfig,

    pub memory: MemoryConfig,

    pub embedding: EmbeddingSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "127.0.0.1:3000"
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Remote vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VectorStoreConfig {
    pub base_url: Option<String>,
    pub project_id: Option<String>,
    pub api_key: Option<String>,

    /// Namespace searched on every query
    pub namespace: String,

    /// Maximum number of hits requested
    pub top_k: usize,

    /// Minimum similarity a hit must reach
    pub similarity_threshold: f32,

    /// Client-side request timeout for vector search
    pub request_timeout_secs: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            project_id: None,
            api_key: None,
            namespace: "transmutes_only".to_string(),
            top_k: 5,
            similarity_threshold: 0.7,
            request_timeout_secs: 30,
        }
    }
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,

    /// Model used when a request does not name one
    pub model: String,

    /// Response length cap; not overridable per request
    pub max_tokens: u32,

    /// Deadline for a single completion call
    pub timeout_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "Llama-4-Maverick-17B-128E-Instruct-FP8".to_string(),
            max_tokens: 1000,
            timeout_ms: 30_000,
        }
    }
}

/// Conversation memory store settings.
///
/// Unset endpoint, project and key fall back to the vector store values,
/// since both live in the same remote project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryConfig {
    pub base_url: Option<String>,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub agent_id: String,
    pub request_timeout_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            project_id: None,
            api_key: None,
            agent_id: DEFAULT_AGENT_ID.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Local embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Model identifier, e.g. "bge-small-en-v1.5"
    pub model: String,

    /// Expected vector length
    pub dimensions: usize,

    /// Where downloaded model files are cached
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "bge-small-en-v1.5".to_string(),
            dimensions: 384,
            cache_dir: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    server: Option<ServerConfig>,
    vector: Option<VectorStoreConfig>,
    completion: Option<CompletionConfig>,
    memory: Option<MemoryConfig>,
    embedding: Option<EmbeddingSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            server: ServerConfig::default(),
            vector: VectorStoreConfig::default(),
            completion: CompletionConfig::default(),
            memory: MemoryConfig::default(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file, and environment variables.
    ///
    /// Environment variables:
    /// - `SAGE_WORKSPACE`, `SAGE_CONFIG`, `SAGE_BIND`
    /// - `SAGE_VECTOR_URL`, `SAGE_VECTOR_PROJECT_ID`, `SAGE_VECTOR_API_KEY`,
    ///   `SAGE_VECTOR_NAMESPACE`, `SAGE_VECTOR_TOP_K`, `SAGE_VECTOR_THRESHOLD`
    /// - `SAGE_COMPLETION_URL`, `SAGE_COMPLETION_API_KEY`, `SAGE_COMPLETION_MODEL`
    /// - `SAGE_MEMORY_URL`, `SAGE_MEMORY_API_KEY`
    /// - `SAGE_EMBEDDING_MODEL`, `SAGE_EMBEDDING_CACHE_DIR`
    /// - `RUST_LOG`, `NO_COLOR`
    ///
    /// # Example
    /// ```no_run
    /// use sage_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Namespace: {}", config.vector.namespace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with a workspace and config file chosen on
    /// the command line taking precedence over `SAGE_WORKSPACE` and
    /// `SAGE_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var("SAGE_WORKSPACE").ok().map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("SAGE_CONFIG").ok().map(PathBuf::from));

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.sage_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        config.apply_env_with(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(server) = config_file.server {
            result.server = server;
        }
        if let Some(vector) = config_file.vector {
            result.vector = vector;
        }
        if let Some(completion) = config_file.completion {
            result.completion = completion;
        }
        if let Some(memory) = config_file.memory {
            result.memory = memory;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        Ok(result)
    }

    /// Apply environment overrides using the given variable lookup.
    fn apply_env_with<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("SAGE_BIND") {
            self.server.bind = bind;
        }

        if let Some(url) = lookup("SAGE_VECTOR_URL") {
            self.vector.base_url = Some(url);
        }
        if let Some(project) = lookup("SAGE_VECTOR_PROJECT_ID") {
            self.vector.project_id = Some(project);
        }
        if let Some(key) = lookup("SAGE_VECTOR_API_KEY") {
            self.vector.api_key = Some(key);
        }
        if let Some(namespace) = lookup("SAGE_VECTOR_NAMESPACE") {
            self.vector.namespace = namespace;
        }
        if let Some(top_k) = lookup("SAGE_VECTOR_TOP_K") {
            self.vector.top_k = parse_env("SAGE_VECTOR_TOP_K", &top_k)?;
        }
        if let Some(threshold) = lookup("SAGE_VECTOR_THRESHOLD") {
            self.vector.similarity_threshold = parse_env("SAGE_VECTOR_THRESHOLD", &threshold)?;
        }

        if let Some(url) = lookup("SAGE_COMPLETION_URL") {
            self.completion.base_url = Some(url);
        }
        if let Some(key) = lookup("SAGE_COMPLETION_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(model) = lookup("SAGE_COMPLETION_MODEL") {
            self.completion.model = model;
        }

        if let Some(url) = lookup("SAGE_MEMORY_URL") {
            self.memory.base_url = Some(url);
        }
        if let Some(key) = lookup("SAGE_MEMORY_API_KEY") {
            self.memory.api_key = Some(key);
        }

        if let Some(model) = lookup("SAGE_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(dir) = lookup("SAGE_EMBEDDING_CACHE_DIR") {
            self.embedding.cache_dir = Some(PathBuf::from(dir));
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        bind: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(bind) = bind {
            self.server.bind = bind;
        }

        if let Some(model) = model {
            self.completion.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .sage directory.
    pub fn sage_dir(&self) -> PathBuf {
        self.workspace.join(".sage")
    }

    /// Memory store base URL, falling back to the vector store URL.
    pub fn memory_base_url(&self) -> Option<&str> {
        self.memory
            .base_url
            .as_deref()
            .or(self.vector.base_url.as_deref())
    }

    /// Memory store project, falling back to the vector store project.
    pub fn memory_project_id(&self) -> Option<&str> {
        self.memory
            .project_id
            .as_deref()
            .or(self.vector.project_id.as_deref())
    }

    /// Memory store API key, falling back to the vector store key.
    pub fn memory_api_key(&self) -> Option<&str> {
        self.memory
            .api_key
            .as_deref()
            .or(self.vector.api_key.as_deref())
    }

    /// Check that every endpoint and credential needed by the pipeline is present.
    pub fn validate(&self) -> AppResult<()> {
        let required = [
            ("vector.baseUrl (SAGE_VECTOR_URL)", self.vector.base_url.as_deref()),
            ("vector.projectId (SAGE_VECTOR_PROJECT_ID)", self.vector.project_id.as_deref()),
            ("vector.apiKey (SAGE_VECTOR_API_KEY)", self.vector.api_key.as_deref()),
            ("completion.baseUrl (SAGE_COMPLETION_URL)", self.completion.base_url.as_deref()),
            ("completion.apiKey (SAGE_COMPLETION_API_KEY)", self.completion.api_key.as_deref()),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.vector.top_k == 0 {
            return Err(AppError::Config("vector.topK must be at least 1".to_string()));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid value for {}: '{}' ({})", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn complete_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.vector.base_url = Some("https://vectors.example".to_string());
        config.vector.project_id = Some("project".to_string());
        config.vector.api_key = Some("vector-key".to_string());
        config.completion.base_url = Some("https://llm.example/v1".to_string());
        config.completion.api_key = Some("llm-key".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.vector.namespace, "transmutes_only");
        assert_eq!(config.vector.top_k, 5);
        assert!((config.vector.similarity_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.completion.max_tokens, 1000);
        assert_eq!(config.completion.timeout_ms, 30_000);
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.memory.agent_id, DEFAULT_AGENT_ID);
        assert!(!config.verbose);
    }

    #[test]
    fn test_sage_dir() {
        let config = AppConfig::default();
        assert!(config.sage_dir().ends_with(".sage"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            None,
            Some("0.0.0.0:8080".to_string()),
            Some("small-model".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.completion.model, "small-model");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SAGE_VECTOR_URL", "https://vectors.example"),
            ("SAGE_VECTOR_TOP_K", "8"),
            ("SAGE_VECTOR_THRESHOLD", "0.55"),
            ("SAGE_COMPLETION_MODEL", "other-model"),
            ("NO_COLOR", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_with(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.vector.base_url.as_deref(), Some("https://vectors.example"));
        assert_eq!(config.vector.top_k, 8);
        assert!((config.vector.similarity_threshold - 0.55).abs() < 1e-6);
        assert_eq!(config.completion.model, "other-model");
        assert!(config.no_color);
    }

    #[test]
    fn test_env_rejects_bad_number() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_with(|key| (key == "SAGE_VECTOR_TOP_K").then(|| "five".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("SAGE_VECTOR_TOP_K"));
    }

    #[test]
    fn test_merge_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
vector:
  baseUrl: https://vectors.example
  namespace: teachings
  topK: 3
completion:
  model: yaml-model
logging:
  level: debug
  color: false
"#
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(file.path()).unwrap();
        assert_eq!(merged.vector.namespace, "teachings");
        assert_eq!(merged.vector.top_k, 3);
        // Unlisted fields keep their defaults
        assert!((merged.vector.similarity_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(merged.completion.model, "yaml-model");
        assert_eq!(merged.completion.max_tokens, 1000);
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
        assert!(merged.no_color);
    }

    #[test]
    fn test_explicit_missing_config_file_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");

        let err = AppConfig::load_with(Some(temp.path().to_path_buf()), Some(missing)).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_complete() {
        assert!(complete_config().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_missing() {
        let mut config = complete_config();
        config.vector.api_key = None;
        config.completion.base_url = Some("  ".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("SAGE_VECTOR_API_KEY"));
        assert!(err.contains("SAGE_COMPLETION_URL"));
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        let mut config = complete_config();
        config.embedding.dimensions = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("embedding.dimensions"));
    }

    #[test]
    fn test_memory_falls_back_to_vector_settings() {
        let mut config = complete_config();
        assert_eq!(config.memory_base_url(), Some("https://vectors.example"));
        assert_eq!(config.memory_api_key(), Some("vector-key"));

        config.memory.base_url = Some("https://memory.example".to_string());
        assert_eq!(config.memory_base_url(), Some("https://memory.example"));
        assert_eq!(config.memory_project_id(), Some("project"));
    }
}
