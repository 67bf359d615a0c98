use serde_json::json;

use super::{CREATE_READ_UPDATE, CRUD, READ, admins_and_professionals};
use crate::policy::SubjectMatcher;
use crate::schema::{EntitySchema, EntitySchemaBuilder, FieldSpec, Invariant};
use crate::{EntityType, UserBusinessRole};

pub(super) fn schemas() -> Vec<EntitySchema> {
    vec![
        business(),
        business_staff(),
        license(),
        opening_hour(),
        regular_opening_hour(),
        special_opening_hour(),
    ]
}

/// Business sub-records editable by their creator.
fn owned_business_record(entity_type: EntityType) -> EntitySchemaBuilder {
    EntitySchema::builder(entity_type)
        .field(FieldSpec::id("id").required())
        .implicit_owner()
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CRUD)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
}

fn time_range() -> FieldSpec {
    FieldSpec::object(
        "timeRange",
        vec![
            FieldSpec::text("openingTime").required(),
            FieldSpec::text("closingTime").required(),
        ],
    )
}

fn opening_hour_entry(entity_type: EntityType) -> EntitySchemaBuilder {
    owned_business_record(entity_type)
        .field(time_range())
        .field(
            FieldSpec::boolean("isClosed")
                .required()
                .default_value(json!(false)),
        )
        .field(
            FieldSpec::boolean("is24Hours")
                .required()
                .default_value(json!(false)),
        )
        .field(FieldSpec::id("businessOpeningHourId").required())
        .belongs_to(
            "businessOpeningHour",
            "businessOpeningHourId",
            EntityType::BusinessOpeningHour,
        )
        .invariant(Invariant::OpeningTimeRange {
            field: "timeRange",
            waived_by: &["isClosed", "is24Hours"],
        })
}

fn business() -> EntitySchema {
    EntitySchema::builder(EntityType::Business)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::text("businessRegistrationNumber").required())
        .field(FieldSpec::text("uniqueTaxIdentificationNumber").required())
        .field(FieldSpec::text("name").required())
        .field(FieldSpec::text("description").required())
        .field(FieldSpec::text("contactEmail").required())
        .field(FieldSpec::text("contactPhone").required())
        .field(FieldSpec::text("website"))
        .field(FieldSpec::text("logoUrl").required())
        .field(FieldSpec::datetime("establishedDate"))
        .field(FieldSpec::integer("employeeCount"))
        .field(FieldSpec::float("revenue"))
        .field(
            FieldSpec::integer("likes")
                .required()
                .default_value(json!(0))
                .managed(),
        )
        .field(FieldSpec::object(
            "socialLinks",
            vec![
                FieldSpec::text("linkedin"),
                FieldSpec::text("twitter"),
                FieldSpec::text("facebook"),
                FieldSpec::text("instagram"),
            ],
        ))
        .field(FieldSpec::boolean("isPublished").required())
        .implicit_owner()
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
        .has_one_tagged(
            "address",
            EntityType::Address,
            "addressOwnerId",
            ("addressOwnerType", "BUSINESS"),
        )
        .has_many("certifications", EntityType::Certification, "businessId")
        .has_many("licenses", EntityType::License, "businessId")
        .has_one(
            "businessOpeningHour",
            EntityType::BusinessOpeningHour,
            "businessId",
        )
        .has_many("businessStaffs", EntityType::BusinessStaff, "businessId")
        .has_many_tagged(
            "ratings",
            EntityType::Rating,
            "ratedItemId",
            ("ratedItemType", "BUSINESS"),
        )
        .has_many("event", EntityType::Event, "businessId")
        .has_many("categories", EntityType::BusinessCategory, "businessId")
        .invariant(Invariant::NonNegative("likes"))
        .build()
}

fn business_staff() -> EntitySchema {
    EntitySchema::builder(EntityType::BusinessStaff)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::id("businessId").required())
        .field(FieldSpec::tag("role", UserBusinessRole::TAGS))
        .owned_by("ownerId")
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CRUD)
        .allow(admins_and_professionals(), CRUD)
        .belongs_to("user", "ownerId", EntityType::User)
        .belongs_to("business", "businessId", EntityType::Business)
        .unique(&["businessId", "ownerId"])
        .build()
}

fn license() -> EntitySchema {
    owned_business_record(EntityType::License)
        .field(FieldSpec::text("issuedBy").required())
        .field(FieldSpec::text("licenseNumber").required())
        .field(FieldSpec::datetime("issueDate").required())
        .field(FieldSpec::datetime("expiryDate"))
        .field(FieldSpec::text("description"))
        .field(FieldSpec::id("businessId").required())
        .belongs_to("business", "businessId", EntityType::Business)
        .build()
}

fn opening_hour() -> EntitySchema {
    owned_business_record(EntityType::BusinessOpeningHour)
        .field(FieldSpec::id("businessId").required())
        .has_many(
            "regularOpeningHours",
            EntityType::BusinessRegularOpeningHour,
            "businessOpeningHourId",
        )
        .has_many(
            "specialOpeningHours",
            EntityType::BusinessSpecialOpeningHour,
            "businessOpeningHourId",
        )
        .belongs_to("business", "businessId", EntityType::Business)
        .unique(&["businessId"])
        .build()
}

fn regular_opening_hour() -> EntitySchema {
    opening_hour_entry(EntityType::BusinessRegularOpeningHour)
        .field(FieldSpec::integer("dayOfWeek").required())
        .invariant(Invariant::IntegerRange {
            field: "dayOfWeek",
            min: Some(0),
            max: Some(6),
        })
        .unique(&["businessOpeningHourId", "dayOfWeek"])
        .build()
}

fn special_opening_hour() -> EntitySchema {
    opening_hour_entry(EntityType::BusinessSpecialOpeningHour)
        .field(FieldSpec::date("date").required())
        .unique(&["businessOpeningHourId", "date"])
        .build()
}
