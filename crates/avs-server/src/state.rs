//! Shared handler state

use crate::config::StudioConfig;
use crate::session::SessionStore;
use avs_genai::Generator;
use avs_objects::{ObjectStore, UploadTickets};
use avs_store::Storage;
use std::fmt;
use std::sync::Arc;

/// Everything a request handler needs, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub generator: Arc<dyn Generator>,
    pub objects: Arc<dyn ObjectStore>,
    pub uploads: Arc<UploadTickets>,
    pub sessions: SessionStore,
    pub config: Arc<StudioConfig>,
}

impl AppState {
    /// Assemble state from its backends
    #[must_use]
    pub fn new(
        config: StudioConfig,
        storage: Arc<dyn Storage>,
        generator: Arc<dyn Generator>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(&config.session, config.server.production),
            uploads: Arc::new(UploadTickets::new(config.objects.ticket_ttl())),
            storage,
            generator,
            objects,
            config: Arc::new(config),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("storage", &self.storage)
            .field("objects", &self.objects)
            .field("sessions", &self.sessions.len())
            .field("uploads", &self.uploads.len())
            .finish_non_exhaustive()
    }
}
