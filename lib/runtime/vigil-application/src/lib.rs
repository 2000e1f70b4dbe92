//! Application services wired over the outbound ports.

pub mod auth;
pub mod health_checker;
pub mod incidents;
pub mod maintenance;
pub mod monitor;
pub mod notifier;
pub mod status;
pub mod subscriptions;
pub mod tokens;
pub mod uptime;

#[cfg(test)]
mod testing;

pub use auth::{AdminIdentity, Authorizer};
pub use health_checker::HealthChecker;
pub use incidents::{IncidentPage, IncidentService, Pagination};
pub use maintenance::MaintenanceService;
pub use monitor::{CheckPassReport, Monitor};
pub use notifier::{FanOut, NotificationService, SiteInfo};
pub use status::{ComponentDetail, HistoryReport, StatusOverview, StatusService};
pub use subscriptions::{SubscribeOutcome, SubscriptionService, VerifyOutcome};
pub use uptime::UptimeCalculator;

use vigil_domain::VigilConfig;
use vigil_ports::PortSet;

/// One instance of every service, sharing the same ports.
#[derive(Clone)]
pub struct Services {
    pub status: StatusService,
    pub incidents: IncidentService,
    pub maintenance: MaintenanceService,
    pub subscriptions: SubscriptionService,
    pub monitor: Monitor,
    pub authorizer: Authorizer,
}

impl Services {
    pub fn new(ports: PortSet, config: &VigilConfig) -> Self {
        let site = SiteInfo::new(&config.server.site_name, &config.server.site_url);
        let notifier =
            NotificationService::new(ports.storage.clone(), ports.mailer, ports.chats, site);
        let monitor = Monitor::new(
            HealthChecker::new(ports.probe),
            ports.storage.clone(),
            notifier.clone(),
            config.storage.retention_days,
        );

        Self {
            status: StatusService::new(ports.storage.clone()),
            incidents: IncidentService::new(ports.storage.clone(), notifier.clone()),
            maintenance: MaintenanceService::new(ports.storage.clone()),
            subscriptions: SubscriptionService::new(
                ports.storage,
                notifier,
                config.notifications.auto_verify_without_mailer,
            ),
            monitor,
            authorizer: Authorizer::new(&config.auth),
        }
    }
}
