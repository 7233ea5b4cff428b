//! Configuration structures.
//!
//! Configuration is loaded from an optional JSON file and environment
//! overrides. Every section has defaults; with no file at all the gateway
//! serves the standard nine-service fleet on port 8020.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use super::errors::{Error, Result};

/// Environment variable overriding `server.listen_addr`.
pub const ENV_LISTEN_ADDR: &str = "MCP_GATEWAY_LISTEN_ADDR";
/// Environment variable overriding `probe.timeout` (humantime, e.g. `500ms`).
pub const ENV_PROBE_TIMEOUT: &str = "MCP_GATEWAY_PROBE_TIMEOUT";
/// Environment variable overriding `backend.timeout` (humantime, e.g. `10s`).
pub const ENV_BACKEND_TIMEOUT: &str = "MCP_GATEWAY_BACKEND_TIMEOUT";

/// Global gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Reachability probe settings.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Outbound backend call settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Backend services and prefix routing rules.
    #[serde(default)]
    pub fleet: FleetConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections use defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_LISTEN_ADDR) {
            self.server.listen_addr = addr;
        }
        if let Some(raw) = lookup(ENV_PROBE_TIMEOUT) {
            self.probe.timeout = parse_duration(ENV_PROBE_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BACKEND_TIMEOUT) {
            self.backend.timeout = parse_duration(ENV_BACKEND_TIMEOUT, &raw)?;
        }
        Ok(())
    }

    /// Check values that serde cannot. Fleet consistency is checked when the
    /// registry is built.
    pub fn validate(&self) -> Result<()> {
        self.server.socket_addr()?;
        if self.server.max_concurrent_requests == Some(0) {
            return Err(Error::config("server.max_concurrent_requests must be positive"));
        }
        if self.probe.timeout.is_zero() {
            return Err(Error::config("probe.timeout must be positive"));
        }
        if self.backend.timeout.is_zero() {
            return Err(Error::config("backend.timeout must be positive"));
        }
        if !self.backend.proxy_path.starts_with('/') {
            return Err(Error::config(format!(
                "backend.proxy_path must start with '/', got '{}'",
                self.backend.proxy_path
            )));
        }
        Ok(())
    }
}

fn parse_duration(key: &str, raw: &str) -> Result<Duration> {
    humantime::parse_duration(raw)
        .map_err(|e| Error::config(format!("{key} must be a duration like '2s', got '{raw}': {e}")))
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub listen_addr: String,

    /// Display name reported by `/health` and `/services`.
    pub name: String,

    /// In-flight request ceiling. `None` admits everything.
    pub max_concurrent_requests: Option<usize>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            Error::config(format!(
                "server.listen_addr '{}' is not a socket address: {}",
                self.listen_addr, e
            ))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8020".to_string(),
            name: "MCP Gateway".to_string(),
            max_concurrent_requests: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Reachability probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Upper bound on a single TCP connect attempt.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
        }
    }
}

/// Backend call configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Overall timeout for one JSON-RPC call (connect + response).
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Path every backend serves JSON-RPC on.
    pub proxy_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            proxy_path: "/mcp".to_string(),
        }
    }
}

/// One backend service as declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub container: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

/// Prefix fallback rule as declared in configuration. Order matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRuleConfig {
    pub prefix: String,
    pub service: String,
}

/// Fleet definition. When present in a file, `services` is required and
/// `prefix_rules` defaults to none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub prefix_rules: Vec<PrefixRuleConfig>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            services: default_services(),
            prefix_rules: default_prefix_rules(),
        }
    }
}

fn service(name: &str, description: &str, port: u16, tools: &[&str]) -> ServiceConfig {
    ServiceConfig {
        name: name.to_string(),
        description: description.to_string(),
        host: default_host(),
        port,
        tools: tools.iter().map(|t| t.to_string()).collect(),
        container: format!("mcp-{name}"),
    }
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        service(
            "filesystem",
            "Filesystem MCP",
            8001,
            &["file_read", "file_write", "file_list", "file_search", "file_analyze"],
        ),
        service(
            "git",
            "Git Operations MCP",
            8002,
            &["git_status", "git_commit", "git_push", "git_log", "git_diff"],
        ),
        service(
            "terminal",
            "Terminal Operations MCP",
            8003,
            &["terminal_exec", "shell_command", "system_info"],
        ),
        service(
            "database",
            "Database Operations MCP",
            8004,
            &["db_query", "db_connect", "db_schema", "db_backup"],
        ),
        service(
            "memory",
            "Memory & Context MCP",
            8005,
            &["store_memory", "search_memories", "get_context", "memory_stats"],
        ),
        service(
            "cldmemory",
            "Advanced Memory & Context MCP (PostgreSQL + Qdrant)",
            8006,
            &["store_memory", "search_memories", "get_context", "memory_stats"],
        ),
        service(
            "qdrant",
            "Qdrant Vector Database",
            8007,
            &["vector_search", "collection_info", "vector_stats"],
        ),
        service(
            "transcriber",
            "WebM Transcriber MCP",
            8008,
            &["transcribe_webm", "transcribe_url", "audio_convert"],
        ),
        service(
            "research",
            "Research & Perplexity MCP",
            8011,
            &["research_query", "perplexity_search", "web_search"],
        ),
    ]
}

// memory's store_/search_ rules precede cldmemory's, so memory wins both.
// Reorder here to hand them to cldmemory instead.
fn default_prefix_rules() -> Vec<PrefixRuleConfig> {
    [
        ("file_", "filesystem"),
        ("git_", "git"),
        ("terminal_", "terminal"),
        ("shell_", "terminal"),
        ("db_", "database"),
        ("store_", "memory"),
        ("search_", "memory"),
        ("memory_", "memory"),
        ("store_", "cldmemory"),
        ("search_", "cldmemory"),
        ("vector_", "qdrant"),
        ("collection_", "qdrant"),
        ("transcribe_", "transcriber"),
        ("audio_", "transcriber"),
        ("research_", "research"),
        ("web_", "research"),
    ]
    .into_iter()
    .map(|(prefix, service)| PrefixRuleConfig {
        prefix: prefix.to_string(),
        service: service.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_values() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8020");
        assert_eq!(config.probe.timeout, Duration::from_secs(2));
        assert_eq!(config.backend.timeout, Duration::from_secs(10));
        assert_eq!(config.backend.proxy_path, "/mcp");
        assert_eq!(config.fleet.services.len(), 9);
        assert_eq!(config.fleet.prefix_rules.len(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_default_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server": {{"listen_addr": "127.0.0.1:9000"}}, "probe": {{"timeout": "500ms"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.server.name, "MCP Gateway");
        assert_eq!(config.probe.timeout, Duration::from_millis(500));
        assert_eq!(config.backend.timeout, Duration::from_secs(10));
        assert_eq!(config.fleet.services.len(), 9);
    }

    #[test]
    fn test_custom_fleet_without_rules() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"fleet": {{"services": [{{"name": "echo", "port": 9100, "tools": ["echo"]}}]}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.fleet.services.len(), 1);
        assert_eq!(config.fleet.services[0].host, "localhost");
        assert!(config.fleet.prefix_rules.is_empty());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/nonexistent/gateway.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            Config::from_file(file.path()).unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                ENV_LISTEN_ADDR => Some("127.0.0.1:18020".to_string()),
                ENV_PROBE_TIMEOUT => Some("250ms".to_string()),
                ENV_BACKEND_TIMEOUT => Some("3s".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:18020");
        assert_eq!(config.probe.timeout, Duration::from_millis(250));
        assert_eq!(config.backend.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_override_duration() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == ENV_PROBE_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_PROBE_TIMEOUT));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.listen_addr = "not-an-addr".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.probe.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backend.proxy_path = "mcp".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.max_concurrent_requests = Some(0);
        assert!(config.validate().is_err());
    }
}
