use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::DEFAULT_RANK_COUNT;
use crate::resolve::DEFAULT_LEDGER_SCORE_CUTOFF;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub nlu: NluConfig,
    pub resolver: ResolverConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
    pub ledger_procedure: String,
    pub product_procedure: String,
}

#[derive(Clone, Debug)]
pub struct NluConfig {
    pub base_url: String,
    pub token: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub ledger_score_cutoff: f64,
    pub default_rank_count: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub nlu_base_url: Option<String>,
    pub nlu_token: Option<String>,
    pub ledger_score_cutoff: Option<f64>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["ledgerline.toml", "config/ledgerline.toml"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgres://ledgerline@localhost:5432/ledgerline".to_string(),
                max_connections: 5,
                timeout_secs: 30,
                ledger_procedure: "sp_ledger_operations".to_string(),
                product_procedure: "sp_product_operations".to_string(),
            },
            nlu: NluConfig {
                base_url: "http://localhost:5005".to_string(),
                token: None,
                timeout_secs: 30,
            },
            resolver: ResolverConfig {
                ledger_score_cutoff: DEFAULT_LEDGER_SCORE_CUTOFF,
                default_rank_count: DEFAULT_RANK_COUNT,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
            if let Some(ledger_procedure) = database.ledger_procedure {
                self.database.ledger_procedure = ledger_procedure;
            }
            if let Some(product_procedure) = database.product_procedure {
                self.database.product_procedure = product_procedure;
            }
        }

        if let Some(nlu) = patch.nlu {
            if let Some(base_url) = nlu.base_url {
                self.nlu.base_url = base_url;
            }
            if let Some(token) = nlu.token {
                self.nlu.token = Some(secret_value(token));
            }
            if let Some(timeout_secs) = nlu.timeout_secs {
                self.nlu.timeout_secs = timeout_secs;
            }
        }

        if let Some(resolver) = patch.resolver {
            if let Some(ledger_score_cutoff) = resolver.ledger_score_cutoff {
                self.resolver.ledger_score_cutoff = ledger_score_cutoff;
            }
            if let Some(default_rank_count) = resolver.default_rank_count {
                self.resolver.default_rank_count = default_rank_count;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LEDGERLINE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("LEDGERLINE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("LEDGERLINE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("LEDGERLINE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("LEDGERLINE_DATABASE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("LEDGERLINE_DATABASE_LEDGER_PROCEDURE") {
            self.database.ledger_procedure = value;
        }
        if let Some(value) = read_env("LEDGERLINE_DATABASE_PRODUCT_PROCEDURE") {
            self.database.product_procedure = value;
        }

        if let Some(value) = read_env("LEDGERLINE_NLU_BASE_URL") {
            self.nlu.base_url = value;
        }
        if let Some(value) = read_env("LEDGERLINE_NLU_TOKEN") {
            self.nlu.token = Some(secret_value(value));
        }
        if let Some(value) = read_env("LEDGERLINE_NLU_TIMEOUT_SECS") {
            self.nlu.timeout_secs = parse_u64("LEDGERLINE_NLU_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LEDGERLINE_RESOLVER_LEDGER_SCORE_CUTOFF") {
            self.resolver.ledger_score_cutoff =
                parse_f64("LEDGERLINE_RESOLVER_LEDGER_SCORE_CUTOFF", &value)?;
        }
        if let Some(value) = read_env("LEDGERLINE_RESOLVER_DEFAULT_RANK_COUNT") {
            self.resolver.default_rank_count =
                parse_u32("LEDGERLINE_RESOLVER_DEFAULT_RANK_COUNT", &value)?;
        }

        if let Some(value) = read_env("LEDGERLINE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("LEDGERLINE_SERVER_PORT") {
            self.server.port = parse_u16("LEDGERLINE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("LEDGERLINE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("LEDGERLINE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("LEDGERLINE_LOGGING_LEVEL").or_else(|| read_env("LEDGERLINE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LEDGERLINE_LOGGING_FORMAT").or_else(|| read_env("LEDGERLINE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(nlu_base_url) = overrides.nlu_base_url {
            self.nlu.base_url = nlu_base_url;
        }
        if let Some(nlu_token) = overrides.nlu_token {
            self.nlu.token = Some(secret_value(nlu_token));
        }
        if let Some(ledger_score_cutoff) = overrides.ledger_score_cutoff {
            self.resolver.ledger_score_cutoff = ledger_score_cutoff;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_nlu(&self.nlu)?;
        validate_resolver(&self.resolver)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
        return Err(ConfigError::Validation(
            "database.url must be a postgres URL (`postgres://...` or `postgresql://...`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    for (key, name) in [
        ("database.ledger_procedure", &database.ledger_procedure),
        ("database.product_procedure", &database.product_procedure),
    ] {
        if !is_sql_identifier(name) {
            return Err(ConfigError::Validation(format!(
                "{key} must be a plain SQL identifier \
                 (letters, digits, `_`, optional schema prefix), got `{name}`"
            )));
        }
    }

    Ok(())
}

/// `[A-Za-z_][A-Za-z0-9_]*` segments joined by single dots.
pub fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
                && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        })
}

fn validate_nlu(nlu: &NluConfig) -> Result<(), ConfigError> {
    let base_url = nlu.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "nlu.base_url must start with http:// or https://".to_string(),
        ));
    }

    if nlu.timeout_secs == 0 || nlu.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "nlu.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let blank_token =
        nlu.token.as_ref().is_some_and(|token| token.expose_secret().trim().is_empty());
    if blank_token {
        return Err(ConfigError::Validation(
            "nlu.token must not be blank when set; remove it to call the NLU server without a token"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_resolver(resolver: &ResolverConfig) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&resolver.ledger_score_cutoff) {
        return Err(ConfigError::Validation(
            "resolver.ledger_score_cutoff must be in range 0..=100".to_string(),
        ));
    }

    if resolver.default_rank_count == 0 {
        return Err(ConfigError::Validation(
            "resolver.default_rank_count must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    nlu: Option<NluPatch>,
    resolver: Option<ResolverPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
    ledger_procedure: Option<String>,
    product_procedure: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NluPatch {
    base_url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ResolverPatch {
    ledger_score_cutoff: Option<f64>,
    default_rank_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
