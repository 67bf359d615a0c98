use std::sync::Arc;

use enermina_application::{
    IntegrationService, LifecycleService, RecordService, StorageAccessService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub record_service: RecordService,
    pub lifecycle_service: LifecycleService,
    pub integration_service: IntegrationService,
    pub storage_access_service: StorageAccessService,
    pub gateway_shared_secret: Arc<str>,
}
