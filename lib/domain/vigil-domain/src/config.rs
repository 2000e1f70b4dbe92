use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub platform: PlatformConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub checks: ChecksConfig,
    pub auth: AuthConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the monitored platform.
    pub url: String,
    pub internal_api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".into(),
            internal_api_key: None,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Public URL of this status page, used in emails and chat links.
    pub site_url: String,
    pub site_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".into(),
            site_url: "http://localhost:8080".into(),
            site_name: "Status".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub sqlite_path: PathBuf,
    pub retention_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("vigil.db"),
            retention_days: 90,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Seconds between internally scheduled passes. 0 leaves scheduling to
    /// an external trigger hitting the cron endpoint.
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub cron_secret: Option<String>,
    pub admins: Vec<AdminCredential>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCredential {
    pub token: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_url: String,
    pub from_email: String,
    pub from_name: String,
    pub slack_webhook_url: Option<String>,
    pub discord_webhook_url: Option<String>,
    /// Verify new subscribers immediately when no mailer is configured.
    pub auto_verify_without_mailer: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            sendgrid_api_key: None,
            sendgrid_url: "https://api.sendgrid.com/v3/mail/send".into(),
            from_email: "status@localhost".into(),
            from_name: "Status".into(),
            slack_webhook_url: None,
            discord_webhook_url: None,
            auto_verify_without_mailer: false,
        }
    }
}

impl VigilConfig {
    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config at {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `VIGIL_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("VIGIL_PLATFORM_URL") {
            self.platform.url = url;
        }
        if let Some(key) = get("VIGIL_INTERNAL_API_KEY") {
            self.platform.internal_api_key = Some(key);
        }
        if let Some(secret) = get("VIGIL_CRON_SECRET") {
            self.auth.cron_secret = Some(secret);
        }
        if let Some(key) = get("VIGIL_SENDGRID_API_KEY") {
            self.notifications.sendgrid_api_key = Some(key);
        }
        if let Some(url) = get("VIGIL_SLACK_WEBHOOK_URL") {
            self.notifications.slack_webhook_url = Some(url);
        }
        if let Some(url) = get("VIGIL_DISCORD_WEBHOOK_URL") {
            self.notifications.discord_webhook_url = Some(url);
        }
        if let Some(addr) = get("VIGIL_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }
        if let Some(path) = get("VIGIL_DATABASE_PATH") {
            self.storage.sqlite_path = PathBuf::from(path);
        }
        if let Some(raw) = get("VIGIL_ADMIN_TOKENS") {
            self.auth.admins = parse_admin_tokens(&raw)?;
        }
        Ok(())
    }
}

/// Parse `token=email,token=email`.
pub fn parse_admin_tokens(raw: &str) -> Result<Vec<AdminCredential>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (token, email) = pair
                .split_once('=')
                .with_context(|| format!("admin token entry without '=': {pair}"))?;
            Ok(AdminCredential {
                token: token.trim().to_string(),
                email: email.trim().to_lowercase(),
            })
        })
        .collect()
}

/// Resolve the config file: explicit path, `VIGIL_CONFIG_PATH`,
/// `$HOME/.vigil/config.yaml`, then `vigil-config.yaml`.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(path) = std::env::var("VIGIL_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        let candidate = Path::new(&home).join(".vigil").join("config.yaml");
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from("vigil-config.yaml")
}
