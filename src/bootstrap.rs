use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use vigil_adapter_notification::{Branding, SendGridMailer, chat_channels, http_client};
use vigil_adapter_probe::HttpProbe;
use vigil_adapter_storage::SqliteStorage;
use vigil_application::Services;
use vigil_domain::{VigilConfig, config_path};
use vigil_ports::{NullProbe, PortSet, ProbePort};

/// Loaded configuration plus the services built from it.
pub struct Vigil {
    pub config: VigilConfig,
    pub config_path: PathBuf,
    pub services: Services,
}

impl Vigil {
    /// Resolve and load the config file, apply `VIGIL_*` overrides and wire
    /// the production adapters.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path(explicit);
        let mut config = VigilConfig::load_from_path(&config_path)?;
        config
            .apply_env()
            .context("invalid VIGIL_* environment override")?;
        Self::from_config(config, config_path)
    }

    pub fn from_config(config: VigilConfig, config_path: PathBuf) -> Result<Self> {
        let ports = build_ports(&config)?;
        let services = Services::new(ports, &config);
        Ok(Self {
            config,
            config_path,
            services,
        })
    }
}

pub fn build_ports(config: &VigilConfig) -> Result<PortSet> {
    let probe: Arc<dyn ProbePort> = if config.platform.url.trim().is_empty() {
        warn!("platform url not configured, every check will report an outage");
        Arc::new(NullProbe)
    } else {
        Arc::new(HttpProbe::new(&config.platform)?)
    };

    let storage = SqliteStorage::open(&config.storage.sqlite_path).with_context(|| {
        format!(
            "failed to open storage at {}",
            config.storage.sqlite_path.display()
        )
    })?;

    let client = http_client().context("failed to build notification http client")?;
    let branding = Branding::new(&config.server.site_name, &config.server.site_url);
    let chats = chat_channels(&client, &config.notifications, &branding);
    let mailer = SendGridMailer::new(client, &config.notifications);

    info!(
        platform = %config.platform.url,
        chats = chats.len(),
        email = config.notifications.sendgrid_api_key.is_some(),
        "adapters ready"
    );

    Ok(PortSet {
        probe,
        storage: Arc::new(storage),
        mailer: Arc::new(mailer),
        chats,
    })
}
