//! Configuration module for junos-provider
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - User configuration (~/.config/junos-provider/config.toml)
//! - Project configuration (./junos-provider.toml)
//! - Environment variables (`JUNOS_*`)
//! - Command-line arguments
//!
//! An explicit `--config` path, or `JUNOS_PROVIDER_CONFIG`, replaces the
//! user and project files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::connection::{TransportKind, DEFAULT_NETCONF_PORT};
use crate::engine::ProviderOptions;
use crate::session::setfile::parse_permission;
use crate::session::{NetconfSessionFactory, SetFile};

/// Environment variable pointing at a configuration file
pub const CONFIG_ENV: &str = "JUNOS_PROVIDER_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Device connection settings
    pub device: DeviceConfig,

    /// Commit settings
    pub commit: CommitConfig,

    /// Fake operations writing to a set file
    pub fake: FakeConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Device connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device address
    pub host: String,

    /// NETCONF port
    pub port: u16,

    /// Login user, the OpenSSH default when unset
    pub username: Option<String>,

    /// Private key file (`~` is expanded)
    pub key_file: Option<String>,

    /// Transport to the device
    pub transport: TransportKind,

    /// Seconds to establish the connection
    pub connect_timeout: u64,

    /// Seconds to wait for one NETCONF reply
    pub read_timeout: u64,

    /// Verify the device host key against known hosts
    pub host_key_checking: bool,

    /// ssh binary
    pub ssh_command: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_NETCONF_PORT,
            username: None,
            key_file: None,
            transport: TransportKind::default(),
            connect_timeout: 30,
            read_timeout: 120,
            host_key_checking: true,
            ssh_command: "ssh".to_string(),
        }
    }
}

impl DeviceConfig {
    /// Options for an SSH NETCONF connection
    #[cfg(feature = "ssh")]
    pub fn ssh_options(&self) -> crate::connection::SshOptions {
        let mut options = crate::connection::SshOptions::new(self.host.clone()).with_port(self.port);
        if let Some(ref username) = self.username {
            options = options.with_username(username.clone());
        }
        if let Some(ref key_file) = self.key_file {
            options = options.with_key_file(shellexpand::tilde(key_file).to_string());
        }
        options.connect_timeout = self.connect_timeout;
        options.read_timeout = self.read_timeout;
        options.host_key_checking = self.host_key_checking;
        options.ssh_command = self.ssh_command.clone();
        options
    }
}

/// Commit settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Minutes before auto-rollback of a `commit confirmed`; plain commits when unset
    pub confirmed: Option<u32>,
}

/// Fake operations settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FakeConfig {
    /// Append create lines to this file instead of touching the device
    pub create_setfile: Option<String>,

    /// Also fake updates
    pub update_also: bool,

    /// Also fake deletes
    pub delete_also: bool,

    /// Octal permission of the set file
    pub file_permission: String,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            create_setfile: None,
            update_also: false,
            delete_also: false,
            file_permission: "0644".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when neither `-v` nor `RUST_LOG` is given
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl ProviderConfig {
    /// Load configuration from files and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut merged = Value::Object(Default::default());

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                let value = Self::read_file(&path)?;
                merge_values(&mut merged, value);
            } else if config_path.is_some() {
                bail!("Config file not found: {}", path.display());
            }
        }

        let mut config: ProviderConfig =
            serde_json::from_value(merged).context("Invalid provider configuration")?;

        // Apply environment variable overrides
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&Path>) -> Vec<PathBuf> {
        // Explicit path takes priority
        if let Some(path) = explicit_path {
            return vec![path.to_path_buf()];
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return vec![PathBuf::from(shellexpand::tilde(&path).to_string())];
        }

        let mut paths = Vec::new();

        // User config
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("junos-provider").join("config.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("junos-provider.toml"));

        paths
    }

    /// Parse one configuration file into a generic value
    fn read_file(path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let value: Value = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };
        Ok(value)
    }

    /// Apply `JUNOS_*` environment variables
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("JUNOS_HOST") {
            self.device.host = host;
        }
        if let Ok(port) = std::env::var("JUNOS_PORT") {
            self.device.port = port
                .parse()
                .with_context(|| format!("JUNOS_PORT '{}' is not a port number", port))?;
        }
        if let Ok(username) = std::env::var("JUNOS_USERNAME") {
            self.device.username = Some(username);
        }
        if let Ok(key_file) = std::env::var("JUNOS_KEYFILE") {
            self.device.key_file = Some(key_file);
        }
        if let Ok(transport) = std::env::var("JUNOS_TRANSPORT") {
            self.device.transport = transport
                .parse()
                .with_context(|| format!("JUNOS_TRANSPORT '{}' is invalid", transport))?;
        }
        if let Ok(timeout) = std::env::var("JUNOS_SSH_TIMEOUT_TO_ESTABLISH") {
            self.device.connect_timeout = timeout.parse().with_context(|| {
                format!("JUNOS_SSH_TIMEOUT_TO_ESTABLISH '{}' is not a number", timeout)
            })?;
        }
        if let Ok(minutes) = std::env::var("JUNOS_COMMIT_CONFIRMED") {
            self.commit.confirmed = Some(minutes.parse().with_context(|| {
                format!("JUNOS_COMMIT_CONFIRMED '{}' is not a number", minutes)
            })?);
        }
        if let Ok(path) = std::env::var("JUNOS_FAKECREATE_SETFILE") {
            self.fake.create_setfile = Some(path);
        }
        if let Ok(flag) = std::env::var("JUNOS_FAKEUPDATE_ALSO") {
            self.fake.update_also = parse_bool("JUNOS_FAKEUPDATE_ALSO", &flag)?;
        }
        if let Ok(flag) = std::env::var("JUNOS_FAKEDELETE_ALSO") {
            self.fake.delete_also = parse_bool("JUNOS_FAKEDELETE_ALSO", &flag)?;
        }
        if let Ok(permission) = std::env::var("JUNOS_FILE_PERMISSION") {
            self.fake.file_permission = permission;
        }
        Ok(())
    }

    /// Reject values the device or the file system would refuse
    pub fn validate(&self) -> Result<()> {
        if self.device.port == 0 {
            bail!("device.port must not be 0");
        }
        if self.device.connect_timeout == 0 || self.device.read_timeout == 0 {
            bail!("device timeouts must be greater than 0");
        }
        if let Some(minutes) = self.commit.confirmed {
            if !(1..=65535).contains(&minutes) {
                bail!(
                    "commit.confirmed must be in the range (1 - 65535), got {}",
                    minutes
                );
            }
        }
        parse_permission(&self.fake.file_permission)
            .with_context(|| "fake.file_permission is invalid".to_string())?;
        if (self.fake.update_also || self.fake.delete_also) && self.fake.create_setfile.is_none() {
            bail!("fake.update_also and fake.delete_also need fake.create_setfile");
        }
        Ok(())
    }

    /// Orchestrator options derived from the commit and fake settings
    pub fn provider_options(&self) -> Result<ProviderOptions> {
        let fake_create = match self.fake.create_setfile {
            Some(ref path) => Some(SetFile::new(
                shellexpand::tilde(path).to_string(),
                parse_permission(&self.fake.file_permission)?,
            )),
            None => None,
        };
        Ok(ProviderOptions {
            commit_confirmed: self.commit.confirmed,
            fake_create,
            fake_update_also: self.fake.update_also,
            fake_delete_also: self.fake.delete_also,
        })
    }

    /// Session factory for the configured device
    pub fn session_factory(&self) -> NetconfSessionFactory {
        NetconfSessionFactory::new(self.device.clone())
    }
}

/// Recursively merge `overlay` into `base`; overlay scalars win
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("{} '{}' is not a boolean", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_VARS: &[&str] = &[
        CONFIG_ENV,
        "JUNOS_HOST",
        "JUNOS_PORT",
        "JUNOS_USERNAME",
        "JUNOS_KEYFILE",
        "JUNOS_TRANSPORT",
        "JUNOS_SSH_TIMEOUT_TO_ESTABLISH",
        "JUNOS_COMMIT_CONFIRMED",
        "JUNOS_FAKECREATE_SETFILE",
        "JUNOS_FAKEUPDATE_ALSO",
        "JUNOS_FAKEDELETE_ALSO",
        "JUNOS_FILE_PERMISSION",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.device.port, 830);
        assert_eq!(config.device.transport, TransportKind::Ssh);
        assert_eq!(config.fake.file_permission, "0644");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_toml_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "provider.toml",
            r#"
[device]
host = "192.0.2.10"
username = "netconf"
key_file = "~/.ssh/id_ed25519"

[commit]
confirmed = 5
"#,
        );

        let config = ProviderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.device.host, "192.0.2.10");
        assert_eq!(config.device.port, 830);
        assert_eq!(config.device.username.as_deref(), Some("netconf"));
        assert_eq!(config.commit.confirmed, Some(5));
        assert_eq!(config.provider_options().unwrap().commit_confirmed, Some(5));
    }

    #[test]
    #[serial]
    fn test_load_yaml_from_env_path() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "provider.yaml",
            "device:\n  host: fw1.example.net\n  transport: local\nlogging:\n  format: json\n",
        );
        std::env::set_var(CONFIG_ENV, &path);

        let config = ProviderConfig::load(None).unwrap();
        clear_env();
        assert_eq!(config.device.host, "fw1.example.net");
        assert_eq!(config.device.transport, TransportKind::Local);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "provider.json", r#"{"device": {"host": "a"}}"#);
        std::env::set_var("JUNOS_HOST", "b");
        std::env::set_var("JUNOS_PORT", "2830");
        std::env::set_var("JUNOS_SSH_TIMEOUT_TO_ESTABLISH", "10");
        std::env::set_var("JUNOS_FAKECREATE_SETFILE", "/tmp/junos.set");
        std::env::set_var("JUNOS_FAKEDELETE_ALSO", "true");
        std::env::set_var("JUNOS_FILE_PERMISSION", "0600");

        let config = ProviderConfig::load(Some(&path));
        clear_env();
        let config = config.unwrap();
        assert_eq!(config.device.host, "b");
        assert_eq!(config.device.port, 2830);
        assert_eq!(config.device.connect_timeout, 10);

        let options = config.provider_options().unwrap();
        let set_file = options.fake_create.unwrap();
        assert_eq!(set_file.path(), Path::new("/tmp/junos.set"));
        assert_eq!(set_file.permission(), 0o600);
        assert!(options.fake_delete_also);
        assert!(!options.fake_update_also);
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "provider.toml", "");
        std::env::set_var("JUNOS_PORT", "eight-thirty");
        let result = ProviderConfig::load(Some(&path));
        clear_env();
        assert!(result.unwrap_err().to_string().contains("JUNOS_PORT"));
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file() {
        clear_env();
        let result = ProviderConfig::load(Some(Path::new("/nonexistent/junos-provider.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = ProviderConfig::default();
        config.commit.confirmed = Some(0);
        assert!(config.validate().is_err());

        let mut config = ProviderConfig::default();
        config.fake.file_permission = "rwx".to_string();
        assert!(config.validate().is_err());

        let mut config = ProviderConfig::default();
        config.fake.update_also = true;
        assert!(config.validate().is_err());
        config.fake.create_setfile = Some("/tmp/junos.set".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_values() {
        let mut base = serde_json::json!({"device": {"host": "a", "port": 830}, "commit": {}});
        merge_values(
            &mut base,
            serde_json::json!({"device": {"host": "b"}, "commit": {"confirmed": 2}}),
        );
        assert_eq!(
            base,
            serde_json::json!({"device": {"host": "b", "port": 830}, "commit": {"confirmed": 2}})
        );
    }

    #[cfg(feature = "ssh")]
    #[test]
    fn test_ssh_options_from_device() {
        let device = DeviceConfig {
            host: "192.0.2.10".to_string(),
            username: Some("netconf".to_string()),
            host_key_checking: false,
            ..Default::default()
        };
        let args = device.ssh_options().args();
        assert!(args.contains(&"StrictHostKeyChecking=no".to_string()));
        assert!(args.windows(2).any(|w| w == ["-l", "netconf"]));
    }
}
