use std::sync::Arc;

use enermina_application::{
    AuthorizationService, IntegrationService, LifecycleService, RecordService,
    StorageAccessService,
};
use enermina_core::AppError;
use enermina_domain::{EmailAddress, SchemaCatalog};
use enermina_infrastructure::{InMemoryIdentityDirectory, JwtStreamTokenIssuer};

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::adapters::{build_email_service, build_record_store, build_search_index};

pub async fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let catalog = Arc::new(SchemaCatalog::standard());
    let store = build_record_store(config, &catalog).await?;
    let authorization_service = AuthorizationService::new(catalog);

    let support_address = EmailAddress::new(config.support_email_address.as_str())?;
    let integration_service = IntegrationService::new(
        authorization_service.clone(),
        store.clone(),
        Arc::new(InMemoryIdentityDirectory::new()),
        build_search_index(config),
        Arc::new(JwtStreamTokenIssuer::new(config.stream_api_secret.as_str())?),
        build_email_service(config),
        support_address,
    );

    Ok(AppState {
        record_service: RecordService::new(store.clone(), authorization_service.clone()),
        lifecycle_service: LifecycleService::new(store, authorization_service, config.lifecycle),
        integration_service,
        storage_access_service: StorageAccessService::new(),
        gateway_shared_secret: Arc::from(config.gateway_shared_secret.as_str()),
    })
}
