//! Domain model of the Enermina platform: tag registry, entity schemas,
//! access policies, relationships and lifecycle state machines.

#![forbid(unsafe_code)]

mod account;
mod entity;
mod gateway;
mod registry;
mod subject;

pub mod lifecycle;
pub mod policy;
/// Stored records and their keys.
pub mod record;
/// Relationship declarations and reference extraction.
pub mod relationship;
pub mod schema;
/// Object storage paths and their access matrix.
pub mod storage;

pub use account::{EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, validate_password};
pub use entity::EntityType;
pub use gateway::{GatewayMutation, evaluate_gateway_access, gateway_policy};
pub use policy::{Decision, DenyReason, ListingScope, Operation, OwnerCheck, Policy};
pub use record::{Record, RecordKey};
pub use registry::{
    AddressOwnerType, ArticleStatus, CardBrand, CategoryType, EventRegistrationStatus,
    EventStatus, EventType, Gender, InvoiceSourceType, InvoiceStatus, LikedItemType, MediaType,
    MobileProviderName, NotificationRelatedItemType, NotificationStatus, NotificationTemplateKey,
    NotificationType, OpportunityStatus, OpportunityType, OrderStatus, PaymentMethodType,
    PaymentTermsType, PaymentTransactionStatus, Priority, RatedItemType, RemindedItemType,
    ReminderStatus, RepeatType, ResourceItemStatus, UserBusinessRole, UserRole, ViewedItemType,
};
pub use schema::{EntitySchema, SchemaCatalog};
pub use subject::Subject;
