//! formplot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main formplot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// HTTP listener
    pub server: ServerConfig,

    /// Template repository backend
    pub repository: RepositoryConfig,

    /// Credential exchange endpoint
    pub auth: AuthConfig,

    /// Remote form entries endpoint
    pub entries: EntriesConfig,

    /// Outbound HTTP client settings
    pub http: HttpConfig,

    /// Visualization sessions
    pub viz: VizConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.repository.backend == RepositoryBackend::Remote {
            if self.repository.endpoint.as_deref().is_none_or(str::is_empty) {
                return Err(eyre::eyre!("repository.endpoint is required for the remote backend"));
            }
            if self.repository.credentials_file.is_none() {
                return Err(eyre::eyre!(
                    "repository.credentials-file is required for the remote backend"
                ));
            }
        }
        if self.viz.max_sessions == 0 {
            return Err(eyre::eyre!("viz.max-sessions must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(p) => p.clone(),
            None => Self::default_paths().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<Self>(&content).ok()?.log_level
    }

    /// Project-local `.formplot.yml`, then `~/.config/formplot/formplot.yml`
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".formplot.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("formplot").join("formplot.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. 127.0.0.1:8000
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Which document store answers template lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryBackend {
    /// SQLite database managed with the `ts` tool
    #[default]
    Local,
    /// HTTP document-store gateway
    Remote,
}

/// Template repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub backend: RepositoryBackend,

    /// SQLite database for the local backend
    #[serde(rename = "sqlite-path")]
    pub sqlite_path: PathBuf,

    /// Gateway base URL for the remote backend
    pub endpoint: Option<String>,

    /// JSON file holding the store access key and secret
    #[serde(rename = "credentials-file")]
    pub credentials_file: Option<PathBuf>,

    /// Remote table holding plot templates
    #[serde(rename = "plot-table")]
    pub plot_table: String,

    /// Remote table holding visual templates
    #[serde(rename = "visual-table")]
    pub visual_table: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            backend: RepositoryBackend::Local,
            sqlite_path: templatestore::config::default_store_path(),
            endpoint: None,
            credentials_file: None,
            plot_table: "PlotTemplates".to_string(),
            visual_table: "VisualTemplates".to_string(),
        }
    }
}

impl RepositoryConfig {
    /// SQLite path with `~/` expanded
    pub fn sqlite_path(&self) -> PathBuf {
        expand_home(&self.sqlite_path)
    }

    /// Credentials file with `~/` expanded
    pub fn credentials_file(&self) -> Option<PathBuf> {
        self.credentials_file.as_deref().map(expand_home)
    }
}

/// Credential exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth token endpoint accepting client-credentials grants
    #[serde(rename = "token-url")]
    pub token_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_url: "https://stage.veoci.com/api/v2/oauth/token".to_string(),
        }
    }
}

/// Remote form entries configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntriesConfig {
    /// Base URL; entries live at `{base}/{container}/forms/{object}/entries/`
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for EntriesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://stage.veoci.com/api/v1".to_string(),
        }
    }
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in milliseconds; unset means wait indefinitely
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

impl HttpConfig {
    /// Build the shared reqwest client
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(concat!("formplot/", env!("CARGO_PKG_VERSION")));
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        builder.build()
    }
}

/// Visualization session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// `host:port` origins allowed to drive sessions
    #[serde(rename = "allowed-origins")]
    pub allowed_origins: Vec<String>,

    /// Open sessions kept before the oldest is evicted
    #[serde(rename = "max-sessions")]
    pub max_sessions: usize,

    /// Browser runtime that renders embedded session documents
    #[serde(rename = "script-url")]
    pub script_url: String,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["localhost:8000".to_string(), "127.0.0.1:8000".to_string()],
            max_sessions: 1024,
            script_url: "/static/formplot-viz.js".to_string(),
        }
    }
}

impl VizConfig {
    /// Check an `Origin` header value (`scheme://host:port`) against the allow list
    pub fn origin_allowed(&self, origin: &str) -> bool {
        let host = origin.split_once("://").map(|(_, rest)| rest).unwrap_or(origin);
        let host = host.trim_end_matches('/');
        self.allowed_origins.iter().any(|allowed| allowed == host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.repository.backend, RepositoryBackend::Local);
        assert_eq!(config.repository.plot_table, "PlotTemplates");
        assert_eq!(config.repository.visual_table, "VisualTemplates");
        assert!(config.auth.token_url.ends_with("/oauth/token"));
        assert!(config.http.timeout_ms.is_none());
        assert_eq!(config.viz.max_sessions, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug
server:
  bind: 0.0.0.0:9000
repository:
  backend: remote
  endpoint: http://store.internal
  credentials-file: /etc/formplot/store.json
  plot-table: Plots
auth:
  token-url: https://auth.example.com/oauth/token
entries:
  base-url: https://forms.example.com/api/v1
http:
  timeout-ms: 5000
viz:
  allowed-origins: [example.com]
  max-sessions: 10
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.repository.backend, RepositoryBackend::Remote);
        assert_eq!(config.repository.endpoint.as_deref(), Some("http://store.internal"));
        assert_eq!(config.repository.plot_table, "Plots");
        assert_eq!(config.repository.visual_table, "VisualTemplates");
        assert_eq!(config.auth.token_url, "https://auth.example.com/oauth/token");
        assert_eq!(config.entries.base_url, "https://forms.example.com/api/v1");
        assert_eq!(config.http.timeout_ms, Some(5000));
        assert_eq!(config.viz.allowed_origins, vec!["example.com"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_backend_requires_endpoint_and_credentials() {
        let mut config = Config::default();
        config.repository.backend = RepositoryBackend::Remote;
        assert!(config.validate().is_err());

        config.repository.endpoint = Some("http://store.internal".to_string());
        assert!(config.validate().is_err());

        config.repository.credentials_file = Some(PathBuf::from("store.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_log_level_from_explicit_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("formplot.yml");
        std::fs::write(&path, "log-level: trace\n").unwrap();

        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("trace"));
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home(Path::new("~/data/templates.db"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("data/templates.db"));
        }
        assert_eq!(expand_home(Path::new("/abs/t.db")), PathBuf::from("/abs/t.db"));
    }

    #[test]
    fn test_origin_allowed() {
        let viz = VizConfig::default();
        assert!(viz.origin_allowed("http://localhost:8000"));
        assert!(viz.origin_allowed("127.0.0.1:8000"));
        assert!(!viz.origin_allowed("http://evil.example.com"));
    }
}
