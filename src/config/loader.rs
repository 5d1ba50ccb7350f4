//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::MigrationConfig;
use super::secret::secret_string;
use crate::domain::errors::MigrationError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix of environment variables that override configuration values
pub const ENV_PREFIX: &str = "TRAC2GITLAB";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`MigrationConfig`]
/// 4. Applies environment variable overrides (`TRAC2GITLAB_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - A referenced environment variable is not set
/// - TOML parsing fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use trac2gitlab::config::loader::load_config;
///
/// let config = load_config("trac2gitlab.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<MigrationConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MigrationError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        MigrationError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut config = parse_config(&contents)?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        MigrationError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Parses configuration text after environment substitution, without validating it
pub fn parse_config(contents: &str) -> Result<MigrationConfig> {
    let contents = substitute_env_vars(contents)?;
    toml::from_str(&contents)
        .map_err(|e| MigrationError::Configuration(format!("Failed to parse TOML: {}", e)))
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| MigrationError::Other(format!("invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(MigrationError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_override(section: &str, key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{section}_{key}")).ok()
}

fn env_flag(section: &str, key: &str, current: bool) -> bool {
    env_override(section, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(current)
}

/// Applies environment variable overrides
///
/// Variables follow the pattern `TRAC2GITLAB_<SECTION>_<KEY>`, for example
/// `TRAC2GITLAB_GITLAB_TOKEN` or `TRAC2GITLAB_EXPORT_EXPORT_DIR`.
/// Unparseable numeric or boolean values leave the file value in place.
fn apply_env_overrides(config: &mut MigrationConfig) {
    if let Some(val) = env_override("APPLICATION", "LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Trac overrides
    if let Some(val) = env_override("TRAC", "BASE_URL") {
        config.trac.base_url = val;
    }
    if let Some(val) = env_override("TRAC", "RPC_PATH") {
        config.trac.rpc_path = val;
    }
    if let Some(val) = env_override("TRAC", "USERNAME") {
        config.trac.username = Some(val);
    }
    if let Some(val) = env_override("TRAC", "PASSWORD") {
        config.trac.password = Some(secret_string(val));
    }
    config.trac.tls_verify = env_flag("TRAC", "TLS_VERIFY", config.trac.tls_verify);

    // GitLab overrides
    if let Some(val) = env_override("GITLAB", "BASE_URL") {
        config.gitlab.base_url = val;
    }
    if let Some(val) = env_override("GITLAB", "TOKEN") {
        config.gitlab.token = Some(secret_string(val));
    }
    if let Some(val) = env_override("GITLAB", "PROJECT_ID") {
        config.gitlab.project_id = val;
    }

    // Export overrides
    if let Some(val) = env_override("EXPORT", "EXPORT_DIR") {
        config.export.export_dir = val;
    }
    if let Some(workers) = env_override("EXPORT", "TICKET_WORKERS").and_then(|v| v.parse().ok()) {
        config.export.ticket_workers = workers;
    }
    if let Some(limit) = env_override("EXPORT", "WIKI_CONCURRENCY").and_then(|v| v.parse().ok()) {
        config.export.wiki_concurrency = limit;
    }
    config.export.include_wiki = env_flag("EXPORT", "INCLUDE_WIKI", config.export.include_wiki);
    config.export.include_attachments = env_flag(
        "EXPORT",
        "INCLUDE_ATTACHMENTS",
        config.export.include_attachments,
    );
    config.export.include_closed_tickets = env_flag(
        "EXPORT",
        "INCLUDE_CLOSED_TICKETS",
        config.export.include_closed_tickets,
    );

    // Import overrides
    config.import.dry_run = env_flag("IMPORT", "DRY_RUN", config.import.dry_run);
    config.import.impersonate_users = env_flag(
        "IMPORT",
        "IMPERSONATE_USERS",
        config.import.impersonate_users,
    );
    config.import.create_users = env_flag("IMPORT", "CREATE_USERS", config.import.create_users);

    // Logging overrides
    config.logging.local_enabled =
        env_flag("LOGGING", "LOCAL_ENABLED", config.logging.local_enabled);
    if let Some(val) = env_override("LOGGING", "LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
