//! Port traits the application talks through, plus in-process
//! implementations used for wiring without external services.

use std::sync::Arc;

pub mod memory;
pub mod notify;
pub mod probe;
pub mod storage;

pub use memory::InMemoryStorage;
pub use notify::{
    ChatEvent, ChatPort, Delivery, EmailMessage, IncidentAnnouncement, MailerPort, NullMailer,
};
pub use probe::{NullProbe, ProbePort};
pub use storage::{IncidentStore, MaintenanceStore, StatusCheckStore, StoragePort, SubscriberStore};

/// Every outbound dependency of the application, as trait objects.
#[derive(Clone)]
pub struct PortSet {
    pub probe: Arc<dyn ProbePort>,
    pub storage: Arc<dyn StoragePort>,
    pub mailer: Arc<dyn MailerPort>,
    pub chats: Vec<Arc<dyn ChatPort>>,
}

impl PortSet {
    /// In-memory storage, no mailer, no chat webhooks, no platform.
    pub fn in_memory() -> Self {
        Self {
            probe: Arc::new(NullProbe),
            storage: Arc::new(InMemoryStorage::new()),
            mailer: Arc::new(NullMailer),
            chats: Vec::new(),
        }
    }
}
