mod common;
mod integration;
mod lifecycle;
mod records;
mod storage;

pub use common::HealthResponse;
pub use integration::{
    AddUserToGroupRequest, AdminCreateUserRequest, CreateStreamTokenRequest,
    DeleteSearchableRecordRequest, MutationResponse, PostConfirmationRequest,
    SearchableRecordRequest, SupportContactRequest,
};
pub use lifecycle::TransitionRequest;
pub use records::{
    CreateRecordRequest, RecordResponse, SubscriptionScopeResponse, UpdateRecordRequest,
};
pub use storage::{StorageAccessRequest, StorageGrantResponse};

#[cfg(test)]
mod tests {
    use ts_rs::{Config, TS};

    use super::{
        AddUserToGroupRequest, AdminCreateUserRequest, CreateRecordRequest,
        CreateStreamTokenRequest, DeleteSearchableRecordRequest, HealthResponse, MutationResponse,
        PostConfirmationRequest, RecordResponse, SearchableRecordRequest, StorageAccessRequest,
        StorageGrantResponse, SubscriptionScopeResponse, SupportContactRequest, TransitionRequest,
        UpdateRecordRequest,
    };
    use crate::error::ErrorResponse;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        HealthResponse::export(&config)?;
        ErrorResponse::export(&config)?;
        CreateRecordRequest::export(&config)?;
        UpdateRecordRequest::export(&config)?;
        RecordResponse::export(&config)?;
        SubscriptionScopeResponse::export(&config)?;
        TransitionRequest::export(&config)?;
        AddUserToGroupRequest::export(&config)?;
        AdminCreateUserRequest::export(&config)?;
        SearchableRecordRequest::export(&config)?;
        DeleteSearchableRecordRequest::export(&config)?;
        CreateStreamTokenRequest::export(&config)?;
        SupportContactRequest::export(&config)?;
        PostConfirmationRequest::export(&config)?;
        MutationResponse::export(&config)?;
        StorageAccessRequest::export(&config)?;
        StorageGrantResponse::export(&config)?;

        Ok(())
    }
}
