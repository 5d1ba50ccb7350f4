//! Configuration schema types
//!
//! This module defines the configuration structure for trac2gitlab. Every
//! section maps to a TOML table of the same name.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Main migration configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Trac (source) connection settings
    pub trac: TracConfig,

    /// GitLab (target) connection settings
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Export phase settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Import/synchronization phase settings
    #[serde(default)]
    pub import: ImportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MigrationConfig {
    /// Validates the configuration needed by every command
    ///
    /// GitLab credentials are only required by [`MigrationConfig::validate_import`].
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.trac.validate()?;
        self.export.validate()?;
        self.import.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Validates the settings the import phase additionally needs
    pub fn validate_import(&self) -> Result<(), String> {
        self.validate()?;
        self.gitlab.validate()
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Trac server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracConfig {
    /// Base URL of the Trac project (e.g. `https://trac.example.com/project`)
    pub base_url: String,

    /// Path of the XML-RPC endpoint relative to `base_url`
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Username for HTTP basic authentication (optional)
    #[serde(default)]
    pub username: Option<String>,

    /// Password for HTTP basic authentication (optional)
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification
    ///
    /// Only disable this for test servers with self-signed certificates.
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl TracConfig {
    fn validate(&self) -> Result<(), String> {
        validate_http_url("trac.base_url", &self.base_url)?;

        if !self.rpc_path.starts_with('/') {
            return Err(format!(
                "trac.rpc_path must start with '/', got '{}'",
                self.rpc_path
            ));
        }

        if self.password.is_some() && self.username.as_deref().unwrap_or("").is_empty() {
            return Err("trac.username is required when trac.password is set".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("trac.timeout_seconds must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Full URL of the XML-RPC endpoint
    pub fn rpc_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.rpc_path)
    }
}

impl Default for TracConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/project".to_string(),
            rpc_path: default_rpc_path(),
            username: None,
            password: None,
            timeout_seconds: default_timeout_seconds(),
            tls_verify: true,
        }
    }
}

/// GitLab configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Base URL of the GitLab instance
    #[serde(default = "default_gitlab_url")]
    pub base_url: String,

    /// API path relative to `base_url`
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Personal access token (admin scope is needed for impersonation)
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Numeric project ID or `namespace/project` path
    #[serde(default)]
    pub project_id: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl GitLabConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        validate_http_url("gitlab.base_url", &self.base_url)?;

        if self
            .token
            .as_ref()
            .map(|t| t.expose_secret().is_empty())
            .unwrap_or(true)
        {
            return Err("gitlab.token cannot be empty".to_string());
        }

        if self.project_id.trim().is_empty() {
            return Err("gitlab.project_id cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("gitlab.timeout_seconds must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Full URL of the REST API root
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.api_path)
    }
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: default_gitlab_url(),
            api_path: default_api_path(),
            token: None,
            project_id: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root directory of the intermediate store
    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    /// Export wiki pages with their full version history
    #[serde(default = "default_true")]
    pub include_wiki: bool,

    /// Download ticket and wiki attachments
    #[serde(default = "default_true")]
    pub include_attachments: bool,

    /// Export closed tickets too
    #[serde(default = "default_true")]
    pub include_closed_tickets: bool,

    /// Write the `users.txt` list of every referenced user
    #[serde(default = "default_true")]
    pub include_users: bool,

    /// Write `ticket-fields.json`
    #[serde(default = "default_true")]
    pub include_ticket_fields: bool,

    /// Number of ticket export workers
    #[serde(default = "default_workers")]
    pub ticket_workers: usize,

    /// Maximum number of wiki pages exported concurrently
    #[serde(default = "default_workers")]
    pub wiki_concurrency: usize,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.export_dir.trim().is_empty() {
            return Err("export.export_dir cannot be empty".to_string());
        }

        if self.ticket_workers == 0 || self.ticket_workers > 100 {
            return Err(format!(
                "export.ticket_workers must be between 1 and 100, got {}",
                self.ticket_workers
            ));
        }

        if self.wiki_concurrency == 0 || self.wiki_concurrency > 100 {
            return Err(format!(
                "export.wiki_concurrency must be between 1 and 100, got {}",
                self.wiki_concurrency
            ));
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
            include_wiki: true,
            include_attachments: true,
            include_closed_tickets: true,
            include_users: true,
            include_ticket_fields: true,
            ticket_workers: default_workers(),
            wiki_concurrency: default_workers(),
        }
    }
}

/// Import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Synchronize milestones
    #[serde(default = "default_true")]
    pub import_milestones: bool,

    /// Synchronize issues
    #[serde(default = "default_true")]
    pub import_issues: bool,

    /// Create new issues as their reporter using impersonation tokens
    #[serde(default)]
    pub impersonate_users: bool,

    /// Create missing GitLab users for reporters (requires impersonation)
    #[serde(default)]
    pub create_users: bool,

    /// Name given to impersonation tokens created by the import
    #[serde(default = "default_token_name")]
    pub impersonation_token_name: String,

    /// Maximum number of records read from one store directory
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Plan changes without writing to GitLab
    #[serde(default)]
    pub dry_run: bool,
}

impl ImportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.create_users && !self.impersonate_users {
            return Err("import.create_users requires import.impersonate_users".to_string());
        }

        if self.impersonation_token_name.trim().is_empty() {
            return Err("import.impersonation_token_name cannot be empty".to_string());
        }

        if self.max_files == 0 {
            return Err("import.max_files must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            import_milestones: true,
            import_issues: true,
            impersonate_users: false,
            create_users: false,
            impersonation_token_name: default_token_name(),
            max_files: default_max_files(),
            dry_run: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to rolling files
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory of the log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation policy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(format!("{field} must start with http:// or https://"));
    }
    url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_rpc_path() -> String {
    "/login/rpc".to_string()
}

fn default_gitlab_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_api_path() -> String {
    "/api/v4".to_string()
}

fn default_export_dir() -> String {
    "data".to_string()
}

fn default_workers() -> usize {
    10
}

fn default_token_name() -> String {
    "trac2gitlab-import".to_string()
}

fn default_max_files() -> usize {
    1000
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
