use std::sync::Arc;

use enermina_application::{EmailService, RecordStore, SearchIndex};
use enermina_core::AppError;
use enermina_domain::SchemaCatalog;
use enermina_infrastructure::{
    ConsoleEmailService, HttpSearchIndexClient, InMemoryRecordStore, InMemorySearchIndex,
    PostgresRecordStore, SearchIndexConfig, SmtpEmailConfig, SmtpEmailService,
};
use tracing::info;

use crate::api_config::{
    ApiConfig, EmailProviderConfig, SearchProviderConfig, StoreBackendConfig,
};

use super::connect_and_migrate;

const SEARCH_MAX_ATTEMPTS: u8 = 3;
const SEARCH_RETRY_BACKOFF_MS: u64 = 200;

pub(super) async fn build_record_store(
    config: &ApiConfig,
    catalog: &SchemaCatalog,
) -> Result<Arc<dyn RecordStore>, AppError> {
    let store: Arc<dyn RecordStore> = match &config.store_backend {
        StoreBackendConfig::Memory => {
            info!("using in-memory record store");
            Arc::new(InMemoryRecordStore::for_catalog(catalog))
        }
        StoreBackendConfig::Postgres { database_url } => {
            let pool = connect_and_migrate(database_url).await?;
            let store = PostgresRecordStore::new(pool);
            store.ensure_indexes(&catalog.index_plan()).await?;
            info!("using postgres record store");
            Arc::new(store)
        }
    };

    Ok(store)
}

pub(super) fn build_email_service(config: &ApiConfig) -> Arc<dyn EmailService> {
    match &config.email_provider {
        EmailProviderConfig::Console => Arc::new(ConsoleEmailService::new()),
        EmailProviderConfig::Smtp(smtp) => Arc::new(SmtpEmailService::new(SmtpEmailConfig {
            host: smtp.host.clone(),
            port: smtp.port,
            username: smtp.username.clone(),
            password: smtp.password.clone(),
            from_address: smtp.from_address.clone(),
        })),
    }
}

pub(super) fn build_search_index(config: &ApiConfig) -> Arc<dyn SearchIndex> {
    match &config.search_provider {
        SearchProviderConfig::Memory => Arc::new(InMemorySearchIndex::new()),
        SearchProviderConfig::Http(search) => Arc::new(HttpSearchIndexClient::new(
            reqwest::Client::new(),
            SearchIndexConfig {
                api_url: search.api_url.clone(),
                app_id: search.app_id.clone(),
                api_key: search.api_key.clone(),
            },
            SEARCH_MAX_ATTEMPTS,
            SEARCH_RETRY_BACKOFF_MS,
        )),
    }
}
