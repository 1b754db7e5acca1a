use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable pointing at the configuration file.
pub const CONFIG_PATH_ENV: &str = "PROVISIONER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
    #[error("Failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Admin principal used to talk to the identity provider.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeycloakConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Realms users are provisioned into, in order.
    pub realms: Vec<String>,
    pub client_id: String,
    pub request_timeout_secs: u64,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1:8080".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            realms: vec!["master".to_string()],
            client_id: "admin-cli".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for KeycloakConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("realms", &self.realms)
            .field("client_id", &self.client_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningMode {
    /// Create the user in every configured realm that lacks it.
    #[default]
    AllRealms,
    /// Only ever touch the first configured realm.
    FirstRealm,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    pub mode: ProvisioningMode,
    pub email_domain: String,
    /// Use `<username>123` as the temporary password instead of a random one.
    pub legacy_passwords: bool,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            mode: ProvisioningMode::default(),
            email_domain: "kgeu.ru".to_string(),
            legacy_passwords: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_file: String,
    pub log_level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_file: "keycloak-provisioner.log".to_string(),
            log_level: "DEBUG".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub keycloak: KeycloakConfig,
    pub provisioning: ProvisioningConfig,
    pub logger: LoggerConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.keycloak.host.trim();
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "keycloak.host must start with http:// or https://".into(),
            ));
        }
        if self.keycloak.realms.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "keycloak.realms must not contain empty names".into(),
            ));
        }
        if self.provisioning.email_domain.trim().is_empty() {
            return Err(ConfigError::Validation(
                "provisioning.email_domain must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Path of the configuration file, honouring [`CONFIG_PATH_ENV`].
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Create the configuration file with defaults, or add any keys missing from an
/// existing one. Values already present are never overwritten.
///
/// Returns `true` when the file was written.
pub fn ensure_config_file(path: &Path) -> Result<bool, ConfigError> {
    let defaults = toml::Table::try_from(AppConfig::default())?;

    if !path.exists() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(&defaults)?)?;
        return Ok(true);
    }

    let mut existing: toml::Table = std::fs::read_to_string(path)?.parse()?;
    if !merge_missing(&mut existing, &defaults) {
        return Ok(false);
    }
    std::fs::write(path, toml::to_string_pretty(&existing)?)?;
    Ok(true)
}

/// Copies keys from `defaults` that are absent in `target`, recursing into tables.
fn merge_missing(target: &mut toml::Table, defaults: &toml::Table) -> bool {
    let mut changed = false;
    for (key, default) in defaults {
        match (target.get_mut(key), default) {
            (None, _) => {
                target.insert(key.clone(), default.clone());
                changed = true;
            }
            (Some(toml::Value::Table(section)), toml::Value::Table(default_section)) => {
                changed |= merge_missing(section, default_section);
            }
            _ => {}
        }
    }
    changed
}

/// Load application configuration from a TOML file + environment overrides.
///
/// Environment variables use the `PROVISIONER__` prefix and double underscores between
/// key segments, e.g. `PROVISIONER__KEYCLOAK__PASSWORD`. `PROVISIONER__KEYCLOAK__REALMS`
/// takes a comma separated list.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File, FileFormat};
    let cfg = Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml))
        .add_source(
            Environment::with_prefix("PROVISIONER")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("keycloak.realms")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Create or update the configuration file at [`config_path`] and load it.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_path();
    ensure_config_file(&path)?;
    load_config_from(&path)
}
