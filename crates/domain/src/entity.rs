use std::fmt::{Display, Formatter};
use std::str::FromStr;

use enermina_core::AppError;
use serde::{Deserialize, Serialize};

use crate::registry::tag_set;

tag_set! {
    /// Every persisted entity type, addressed by its logical name.
    EntityType, "entity type" {
        /// Platform user keyed by the identity-provider subject.
        User => "user",
        /// Editorial article.
        Article => "article",
        /// Ordered body block of an article.
        ContentBlock => "contentBlock",
        /// Image or video attached to an article or content block.
        Media => "media",
        /// Taxonomy category.
        Category => "category",
        /// Article to category link.
        ArticleCategory => "articleCategory",
        /// Resource to category link.
        ResourceCategory => "resourceCategory",
        /// Business to category link.
        BusinessCategory => "businessCategory",
        /// Postal address of a user, business or event.
        Address => "address",
        /// Professional profile of a user.
        Professional => "professional",
        /// Career history entry.
        Career => "career",
        /// Education history entry.
        Education => "education",
        /// Portfolio project.
        Project => "project",
        /// Certification held by a professional or business.
        Certification => "certification",
        /// Business profile.
        Business => "business",
        /// Staff membership of a user in a business.
        BusinessStaff => "businessStaff",
        /// Operating license of a business.
        License => "license",
        /// Opening hour container of a business.
        BusinessOpeningHour => "businessOpeningHour",
        /// Weekly opening hour entry.
        BusinessRegularOpeningHour => "businessRegularOpeningHour",
        /// Dated opening hour override.
        BusinessSpecialOpeningHour => "businessSpecialOpeningHour",
        /// Event organised by a business.
        Event => "event",
        /// Ticket registration for an event.
        EventRegistration => "eventRegistration",
        /// Downloadable resource published by a professional.
        Resource => "resource",
        /// Competition, vacancy, scholarship or fund.
        Opportunity => "opportunity",
        /// Notification addressed to a user.
        Notification => "notification",
        /// View of an item.
        View => "view",
        /// Like of an item by a user.
        Like => "like",
        /// Rating of an item by a user.
        Rating => "rating",
        /// Reminder about an item.
        Reminder => "reminder",
        /// Invoice billing one order.
        Invoice => "invoice",
        /// Payment attempt against an invoice.
        PaymentTransaction => "paymentTransaction",
        /// Stored payment method.
        PaymentMethod => "paymentMethod",
        /// Line item of a resource order.
        ResourceOrderItem => "resourceOrderItem",
        /// Order of resources.
        ResourceOrder => "resourceOrder",
        /// Order of event tickets.
        EventOrder => "eventOrder",
    }
}

impl EntityType {
    /// Parses a logical name received at the transport boundary.
    ///
    /// Unknown names are schema violations rather than validation errors:
    /// the caller addressed a type the catalog does not declare.
    pub fn from_logical_name(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
            .map_err(|_| AppError::SchemaViolation(format!("unknown entity type '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::EntityType;

    #[test]
    fn logical_names_are_camel_case() {
        assert_eq!(EntityType::PaymentTransaction.as_str(), "paymentTransaction");
        assert_eq!(EntityType::all().len(), 35);
    }

    #[test]
    fn unknown_logical_name_is_schema_violation() {
        let result = EntityType::from_logical_name("conversation");
        assert!(matches!(
            result,
            Err(enermina_core::AppError::SchemaViolation(_))
        ));
    }
}
