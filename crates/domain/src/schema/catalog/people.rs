use serde_json::json;

use super::{CREATE_READ_UPDATE, CRUD, READ, admins, admins_and_professionals};
use crate::policy::{Operation, SubjectMatcher};
use crate::schema::{EntitySchema, FieldSpec, Invariant};
use crate::{AddressOwnerType, EntityType, Gender, UserRole};

const ADDRESS_OWNERS: &[(&str, EntityType)] = &[
    ("BUSINESS", EntityType::Business),
    ("EVENT", EntityType::Event),
    ("USER", EntityType::User),
];

fn social_links() -> FieldSpec {
    FieldSpec::object(
        "socialLinks",
        vec![
            FieldSpec::text("linkedin"),
            FieldSpec::text("twitter"),
            FieldSpec::text("facebook"),
            FieldSpec::text("instagram"),
        ],
    )
}

pub(super) fn schemas() -> Vec<EntitySchema> {
    vec![
        user(),
        address(),
        professional(),
        career(),
        education(),
        project(),
        certification(),
    ]
}

fn user() -> EntitySchema {
    EntitySchema::builder(EntityType::User)
        .identified_by(&["authId"])
        .field(FieldSpec::id("authId").required())
        .field(FieldSpec::text("email").required())
        .field(FieldSpec::text("name"))
        .field(FieldSpec::text("phone"))
        .field(FieldSpec::tag("role", UserRole::TAGS))
        .field(FieldSpec::tag("gender", Gender::TAGS))
        .field(FieldSpec::datetime("dateOfBirth"))
        .field(FieldSpec::datetime("lastLogin"))
        .field(FieldSpec::text("profilePicture"))
        .field(FieldSpec::text("bio"))
        .field(FieldSpec::text_list("pushTokens").default_value(json!([])))
        .field(
            FieldSpec::boolean("isDeleted")
                .required()
                .default_value(json!(false)),
        )
        .owned_by("authId")
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins(), CREATE_READ_UPDATE)
        .disable(&[Operation::Subscribe])
        .has_many("articles", EntityType::Article, "authorId")
        .has_many("likes", EntityType::Like, "ownerId")
        .has_many("views", EntityType::View, "ownerId")
        .has_one_tagged(
            "address",
            EntityType::Address,
            "addressOwnerId",
            ("addressOwnerType", "USER"),
        )
        .has_one("professional", EntityType::Professional, "ownerId")
        .has_many("ratings", EntityType::Rating, "ownerId")
        .has_many("eventRegistrations", EntityType::EventRegistration, "ownerId")
        .has_many("reminders", EntityType::Reminder, "ownerId")
        .has_many("businessStaffs", EntityType::BusinessStaff, "ownerId")
        .has_many("resourceOrders", EntityType::ResourceOrder, "ownerId")
        .has_many("resourceOrderItems", EntityType::ResourceOrderItem, "ownerId")
        .has_many("paymentMethods", EntityType::PaymentMethod, "ownerId")
        .has_many("invoices", EntityType::Invoice, "ownerId")
        .has_many("eventOrders", EntityType::EventOrder, "ownerId")
        .soft_delete()
        .build()
}

fn address() -> EntitySchema {
    EntitySchema::builder(EntityType::Address)
        .identified_by(&["addressOwnerId"])
        .field(FieldSpec::id("addressOwnerId").required())
        .field(FieldSpec::tag("addressOwnerType", AddressOwnerType::TAGS).required())
        .field(FieldSpec::text("addressLine1").required())
        .field(FieldSpec::text("neighborhoodOrDistrict").required())
        .field(FieldSpec::text("city").required())
        .field(FieldSpec::text("province").required())
        .field(FieldSpec::text("postalCode"))
        .field(FieldSpec::text("country").required())
        .field(FieldSpec::float("latitude"))
        .field(FieldSpec::float("longitude"))
        .implicit_owner()
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
        .disable(&[Operation::Subscribe])
        .polymorphic(
            "addressOwner",
            "addressOwnerType",
            "addressOwnerId",
            ADDRESS_OWNERS,
        )
        .build()
}

fn professional() -> EntitySchema {
    EntitySchema::builder(EntityType::Professional)
        .identified_by(&["ownerId"])
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::text("professionalRegistrationNumber").required())
        .field(FieldSpec::text("name").required())
        .field(FieldSpec::text("bio").required())
        .field(FieldSpec::text("profession").required())
        .field(FieldSpec::text("contactEmail").required())
        .field(FieldSpec::text("contactPhone").required())
        .field(FieldSpec::text("website"))
        .field(FieldSpec::text_list("skills").required())
        .field(FieldSpec::text("profilePictureUrl").required())
        .field(FieldSpec::boolean("availableForWork").default_value(json!(true)))
        .field(social_links())
        .owned_by("ownerId")
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
        .disable(&[Operation::Subscribe])
        .belongs_to("user", "ownerId", EntityType::User)
        .has_many("certifications", EntityType::Certification, "professionalId")
        .has_many("careerHistories", EntityType::Career, "professionalId")
        .has_many("educationHistories", EntityType::Education, "professionalId")
        .has_many("projects", EntityType::Project, "professionalId")
        .has_many_tagged(
            "ratings",
            EntityType::Rating,
            "ratedItemId",
            ("ratedItemType", "PROFESSIONAL"),
        )
        .has_many("uploadedResources", EntityType::Resource, "professionalId")
        .has_many("opportunities", EntityType::Opportunity, "createdById")
        .build()
}

fn history_entry(entity_type: EntityType) -> crate::schema::EntitySchemaBuilder {
    EntitySchema::builder(entity_type)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("professionalId").required())
        .implicit_owner()
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CRUD)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
        .belongs_to("professional", "professionalId", EntityType::Professional)
}

fn career() -> EntitySchema {
    history_entry(EntityType::Career)
        .field(FieldSpec::text("companyName").required())
        .field(FieldSpec::text("jobTitle").required())
        .field(FieldSpec::datetime("startDate").required())
        .field(FieldSpec::datetime("endDate"))
        .field(FieldSpec::text("description"))
        .build()
}

fn education() -> EntitySchema {
    history_entry(EntityType::Education)
        .field(FieldSpec::text("institutionName").required())
        .field(FieldSpec::text("degree").required())
        .field(FieldSpec::text("fieldOfStudy").required())
        .field(FieldSpec::datetime("startDate").required())
        .field(FieldSpec::datetime("endDate"))
        .field(FieldSpec::text("description"))
        .build()
}

fn project() -> EntitySchema {
    history_entry(EntityType::Project)
        .field(FieldSpec::text("projectName").required())
        .field(FieldSpec::text("description"))
        .field(FieldSpec::text("projectUrl"))
        .field(FieldSpec::datetime("startDate").required())
        .field(FieldSpec::datetime("endDate"))
        .build()
}

fn certification() -> EntitySchema {
    EntitySchema::builder(EntityType::Certification)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::text("issuedBy").required())
        .field(FieldSpec::text("name").required())
        .field(FieldSpec::text("description"))
        .field(FieldSpec::id("professionalId"))
        .field(FieldSpec::id("businessId"))
        .allow(SubjectMatcher::Authenticated, CRUD)
        .allow(admins_and_professionals(), CREATE_READ_UPDATE)
        .belongs_to("professional", "professionalId", EntityType::Professional)
        .belongs_to("business", "businessId", EntityType::Business)
        .invariant(Invariant::AtMostOneOf(&["professionalId", "businessId"]))
        .build()
}
