//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod http_search_index_client;
mod in_memory_identity_directory;
mod in_memory_record_store;
mod in_memory_search_index;
mod jwt_stream_token_issuer;
mod postgres_record_store;
mod record_counters;
mod smtp_email_service;

pub use console_email_service::ConsoleEmailService;
pub use http_search_index_client::{HttpSearchIndexClient, SearchIndexConfig};
pub use in_memory_identity_directory::InMemoryIdentityDirectory;
pub use in_memory_record_store::InMemoryRecordStore;
pub use in_memory_search_index::InMemorySearchIndex;
pub use jwt_stream_token_issuer::JwtStreamTokenIssuer;
pub use postgres_record_store::PostgresRecordStore;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
