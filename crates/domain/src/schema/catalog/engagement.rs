use serde_json::json;

use super::{CREATE_READ_UPDATE, CRUD, READ, READ_UPDATE, admins, admins_and_professionals};
use crate::policy::{Operation, SubjectMatcher};
use crate::schema::{EntitySchema, FieldSpec, Invariant};
use crate::{
    EntityType, LikedItemType, NotificationRelatedItemType, NotificationStatus,
    NotificationTemplateKey, NotificationType, Priority, RatedItemType, RemindedItemType,
    ReminderStatus, RepeatType, ViewedItemType,
};

const VIEWED_ITEMS: &[(&str, EntityType)] = &[
    ("BUSINESS", EntityType::Business),
    ("PROFESSIONAL", EntityType::Professional),
    ("ARTICLE", EntityType::Article),
    ("RESOURCE", EntityType::Resource),
];

const LIKED_ITEMS: &[(&str, EntityType)] = &[
    ("BUSINESS", EntityType::Business),
    ("ARTICLE", EntityType::Article),
    ("RESOURCE", EntityType::Resource),
];

const RATED_ITEMS: &[(&str, EntityType)] = &[
    ("BUSINESS", EntityType::Business),
    ("PROFESSIONAL", EntityType::Professional),
    ("RESOURCE", EntityType::Resource),
];

const REMINDED_ITEMS: &[(&str, EntityType)] = RATED_ITEMS;

pub(super) fn schemas() -> Vec<EntitySchema> {
    vec![notification(), view(), like(), rating(), reminder()]
}

fn notification() -> EntitySchema {
    EntitySchema::builder(EntityType::Notification)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("userId").required().immutable())
        .field(FieldSpec::text("title"))
        .field(FieldSpec::text("shortMessage"))
        .field(FieldSpec::text("message"))
        .field(FieldSpec::tag("templateKey", NotificationTemplateKey::TAGS))
        .field(FieldSpec::json("templateData").required())
        .field(FieldSpec::tag("type", NotificationType::TAGS))
        .field(FieldSpec::tag("priority", Priority::TAGS))
        .field(FieldSpec::boolean("bypassPreferences").default_value(json!(false)))
        .field(FieldSpec::id("relatedItemId"))
        .field(FieldSpec::tag(
            "relatedItemType",
            NotificationRelatedItemType::TAGS,
        ))
        .field(FieldSpec::object(
            "payload",
            vec![FieldSpec::text("href"), FieldSpec::json("actionData")],
        ))
        .field(FieldSpec::json("channels").required())
        .field(
            FieldSpec::tag("status", NotificationStatus::TAGS)
                .required()
                .default_value(json!("PENDING"))
                .managed(),
        )
        .field(FieldSpec::boolean("isInAppEnabled").default_value(json!(false)))
        .field(FieldSpec::datetime("sentAt").managed())
        .field(FieldSpec::datetime("deliveredAt").managed())
        .field(
            FieldSpec::integer("deliveryAttempts")
                .required()
                .default_value(json!(0))
                .managed(),
        )
        .field(FieldSpec::text("lastAttemptError").managed())
        .field(FieldSpec::text("createdBy"))
        .allow(SubjectMatcher::Authenticated, READ_UPDATE)
        .allow(admins_and_professionals(), CRUD)
        .disable(&[Operation::Subscribe])
        .belongs_to("user", "userId", EntityType::User)
        .invariant(Invariant::TemplateData {
            key: "templateKey",
            data: "templateData",
        })
        .invariant(Invariant::DeliveryChannels("channels"))
        .invariant(Invariant::IntegerRange {
            field: "deliveryAttempts",
            min: Some(0),
            max: None,
        })
        .build()
}

fn view() -> EntitySchema {
    EntitySchema::builder(EntityType::View)
        .identified_by(&["viewedItemId"])
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("ownerId"))
        .field(FieldSpec::text("identityId"))
        .field(FieldSpec::id("viewedItemId").required())
        .field(FieldSpec::tag("viewedItemType", ViewedItemType::TAGS).required())
        .field(FieldSpec::datetime("timestamp").required())
        .owned_by("ownerId")
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .disable(&[Operation::Subscribe, Operation::Update, Operation::Delete])
        .belongs_to("user", "ownerId", EntityType::User)
        .polymorphic("viewedItem", "viewedItemType", "viewedItemId", VIEWED_ITEMS)
        .build()
}

fn like() -> EntitySchema {
    EntitySchema::builder(EntityType::Like)
        .identified_by(&["likedItemId", "ownerId"])
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::id("likedItemId").required())
        .field(FieldSpec::tag("likedItemType", LikedItemType::TAGS).required())
        .owned_by("ownerId")
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(
            SubjectMatcher::Owner,
            &[Operation::Create, Operation::Read, Operation::Delete],
        )
        .disable(&[Operation::Subscribe, Operation::Update])
        .belongs_to("user", "ownerId", EntityType::User)
        .polymorphic("likedItem", "likedItemType", "likedItemId", LIKED_ITEMS)
        .build()
}

fn rating() -> EntitySchema {
    EntitySchema::builder(EntityType::Rating)
        .identified_by(&["ratedItemId", "ownerId"])
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::id("ratedItemId").required())
        .field(FieldSpec::tag("ratedItemType", RatedItemType::TAGS).required())
        .field(FieldSpec::integer("rating").required())
        .field(FieldSpec::text("comment"))
        .field(
            FieldSpec::boolean("verifiedPurchase")
                .required()
                .default_value(json!(false)),
        )
        .field(FieldSpec::text("responseComment"))
        .field(FieldSpec::datetime("responseCreatedAt"))
        .owned_by("ownerId")
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CRUD)
        .allow(admins(), CREATE_READ_UPDATE)
        .disable(&[Operation::Subscribe, Operation::Delete])
        .belongs_to("user", "ownerId", EntityType::User)
        .polymorphic("ratedItem", "ratedItemType", "ratedItemId", RATED_ITEMS)
        .invariant(Invariant::IntegerRange {
            field: "rating",
            min: Some(1),
            max: Some(5),
        })
        .build()
}

fn reminder() -> EntitySchema {
    EntitySchema::builder(EntityType::Reminder)
        .identified_by(&["remindedItemId", "ownerId"])
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::id("remindedItemId").required())
        .field(FieldSpec::tag("remindedItemType", RemindedItemType::TAGS).required())
        .field(FieldSpec::text("title").required())
        .field(FieldSpec::text("message").required())
        .field(FieldSpec::datetime("dateTime").required())
        .field(FieldSpec::tag("status", ReminderStatus::TAGS))
        .field(FieldSpec::tag("repeat", RepeatType::TAGS))
        .owned_by("ownerId")
        .allow(SubjectMatcher::Owner, CRUD)
        .allow(admins_and_professionals(), CRUD)
        .belongs_to("user", "ownerId", EntityType::User)
        .polymorphic(
            "remindedItem",
            "remindedItemType",
            "remindedItemId",
            REMINDED_ITEMS,
        )
        .build()
}
