use serde_json::json;

use super::{CREATE_READ_UPDATE, READ, admins_and_professionals};
use crate::policy::SubjectMatcher;
use crate::schema::{EntitySchema, FieldSpec, Invariant};
use crate::{EntityType, EventRegistrationStatus, EventStatus, EventType};

pub(super) fn schemas() -> Vec<EntitySchema> {
    vec![event(), event_registration(), resource()]
}

fn counter(name: &'static str) -> FieldSpec {
    FieldSpec::integer(name)
        .required()
        .default_value(json!(0))
        .managed()
}

fn event() -> EntitySchema {
    EntitySchema::builder(EntityType::Event)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::text("title").required())
        .field(FieldSpec::text("description").required())
        .field(FieldSpec::tag("type", EventType::TAGS))
        .field(FieldSpec::text_list("tags").required())
        .field(FieldSpec::date("date").required())
        .field(FieldSpec::text("time").required())
        .field(FieldSpec::boolean("isVirtual").required())
        .field(FieldSpec::text("virtualLink"))
        .field(FieldSpec::text("location").required())
        .field(FieldSpec::integer("capacity").required())
        .field(FieldSpec::integer("ticketsAvailable").required().managed())
        .field(FieldSpec::float("price").required())
        .field(FieldSpec::id("businessId").required())
        .field(FieldSpec::text_list("images").required())
        .field(FieldSpec::tag("status", EventStatus::TAGS))
        .implicit_owner()
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
        .has_one_tagged(
            "address",
            EntityType::Address,
            "addressOwnerId",
            ("addressOwnerType", "EVENT"),
        )
        .has_many("registrations", EntityType::EventRegistration, "eventId")
        .belongs_to("organizer", "businessId", EntityType::Business)
        .invariant(Invariant::IntegerRange {
            field: "capacity",
            min: Some(0),
            max: None,
        })
        .invariant(Invariant::IntegerRange {
            field: "ticketsAvailable",
            min: Some(0),
            max: None,
        })
        .invariant(Invariant::NotGreaterThan {
            field: "ticketsAvailable",
            limit: "capacity",
        })
        .invariant(Invariant::NonNegative("price"))
        .invariant(Invariant::RequiredWhen {
            field: "virtualLink",
            flag: "isVirtual",
        })
        .build()
}

fn event_registration() -> EntitySchema {
    EntitySchema::builder(EntityType::EventRegistration)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("eventId").required().immutable())
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::id("orderId").required().immutable())
        .field(FieldSpec::datetime("registeredAt").required())
        .field(FieldSpec::text("ticketId").required())
        .field(FieldSpec::text("description"))
        .field(FieldSpec::float("price").required())
        .field(
            FieldSpec::tag("status", EventRegistrationStatus::TAGS)
                .required()
                .default_value(json!("PENDING"))
                .managed(),
        )
        .owned_by("ownerId")
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
        .belongs_to("event", "eventId", EntityType::Event)
        .belongs_to("user", "ownerId", EntityType::User)
        .belongs_to("eventOrder", "orderId", EntityType::EventOrder)
        .invariant(Invariant::NonNegative("price"))
        .unique(&["ticketId"])
        .build()
}

fn resource() -> EntitySchema {
    EntitySchema::builder(EntityType::Resource)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("professionalId").required())
        .field(FieldSpec::text("authorName").required())
        .field(FieldSpec::text("title").required())
        .field(FieldSpec::text("description").required())
        .field(FieldSpec::text("contentUrl").required())
        .field(FieldSpec::text("imageUrl").required())
        .field(FieldSpec::float("price").required())
        .field(counter("downloadCount"))
        .field(FieldSpec::boolean("isPublished").required())
        .field(counter("likes"))
        .field(FieldSpec::datetime("uploadAt").required())
        .implicit_owner()
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
        .belongs_to("uploadedBy", "professionalId", EntityType::Professional)
        .has_many_tagged(
            "ratings",
            EntityType::Rating,
            "ratedItemId",
            ("ratedItemType", "RESOURCE"),
        )
        .has_many(
            "resourceOrderItems",
            EntityType::ResourceOrderItem,
            "resourceId",
        )
        .has_many("categories", EntityType::ResourceCategory, "resourceId")
        .invariant(Invariant::NonNegative("price"))
        .invariant(Invariant::NonNegative("downloadCount"))
        .invariant(Invariant::NonNegative("likes"))
        .build()
}
