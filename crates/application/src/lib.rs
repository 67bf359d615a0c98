//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod integration_ports;
mod integration_service;
mod lifecycle_service;
mod record_ports;
mod record_service;
mod storage_access_service;

#[cfg(test)]
mod test_support;

pub use authorization_service::AuthorizationService;
pub use integration_ports::{EmailService, IdentityProvider, SearchIndex, StreamTokenIssuer};
pub use integration_service::{
    IntegrationService, MutationReceipt, PostConfirmationInput, SupportContactInput,
};
pub use lifecycle_service::{LifecycleConfig, LifecycleService};
pub use record_ports::{RecordListQuery, RecordStore, RecordWrite, WriteBatch};
pub use record_service::RecordService;
pub use storage_access_service::{StorageAccessService, StorageGrant};
