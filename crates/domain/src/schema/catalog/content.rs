use serde_json::json;

use super::{CRUD, READ, admins, admins_and_professionals};
use crate::policy::{Operation, SubjectMatcher};
use crate::schema::{EntitySchema, EntitySchemaBuilder, FieldSpec, Invariant};
use crate::{
    ArticleStatus, CategoryType, EntityType, MediaType, OpportunityStatus, OpportunityType,
};

pub(super) fn schemas() -> Vec<EntitySchema> {
    vec![
        article(),
        content_block(),
        media(),
        category(),
        category_link(EntityType::ArticleCategory, "articleId", EntityType::Article)
            .allow(admins(), &[Operation::Create, Operation::Read, Operation::Delete])
            .build(),
        category_link(EntityType::ResourceCategory, "resourceId", EntityType::Resource)
            .allow(
                admins_and_professionals(),
                &[Operation::Create, Operation::Read, Operation::Delete],
            )
            .build(),
        category_link(EntityType::BusinessCategory, "businessId", EntityType::Business)
            .allow(
                admins_and_professionals(),
                &[Operation::Create, Operation::Read, Operation::Delete],
            )
            .build(),
        opportunity(),
    ]
}

/// Publicly readable, admin-managed content.
fn public_content(entity_type: EntityType) -> EntitySchemaBuilder {
    EntitySchema::builder(entity_type)
        .field(FieldSpec::id("id").required())
        .allow(SubjectMatcher::Guest, READ)
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(admins(), CRUD)
}

fn article() -> EntitySchema {
    public_content(EntityType::Article)
        .field(FieldSpec::text("title").required())
        .field(FieldSpec::text("slug").required())
        .field(FieldSpec::text("excerpt"))
        .field(FieldSpec::id("authorId").required())
        .field(FieldSpec::tag("status", ArticleStatus::TAGS))
        .field(FieldSpec::text_list("tags").required())
        .field(FieldSpec::datetime("publishedAt").required())
        .field(
            FieldSpec::integer("viewCount")
                .required()
                .default_value(json!(0)),
        )
        .field(
            FieldSpec::integer("likeCount")
                .required()
                .default_value(json!(0))
                .managed(),
        )
        .field(FieldSpec::boolean("isDeleted").default_value(json!(false)))
        .has_one("featuredImage", EntityType::Media, "articleId")
        .belongs_to("author", "authorId", EntityType::User)
        .has_many("contentBlocks", EntityType::ContentBlock, "articleId")
        .has_many("categories", EntityType::ArticleCategory, "articleId")
        .has_many_tagged(
            "likes",
            EntityType::Like,
            "likedItemId",
            ("likedItemType", "ARTICLE"),
        )
        .has_many_tagged(
            "views",
            EntityType::View,
            "viewedItemId",
            ("viewedItemType", "ARTICLE"),
        )
        .invariant(Invariant::NonNegative("viewCount"))
        .invariant(Invariant::NonNegative("likeCount"))
        .soft_delete()
        .listed_under("authorId", EntityType::User)
        .build()
}

fn content_block() -> EntitySchema {
    public_content(EntityType::ContentBlock)
        .field(FieldSpec::id("articleId").required())
        .field(FieldSpec::text("title"))
        .field(FieldSpec::text("content").required())
        .field(FieldSpec::integer("order").required())
        .disable(&[Operation::Subscribe])
        .belongs_to("article", "articleId", EntityType::Article)
        .has_many("medias", EntityType::Media, "contentBlockId")
        .invariant(Invariant::IntegerRange {
            field: "order",
            min: Some(0),
            max: None,
        })
        .unique(&["articleId", "order"])
        .listed_under("articleId", EntityType::Article)
        .build()
}

fn media() -> EntitySchema {
    public_content(EntityType::Media)
        .field(FieldSpec::text("url").required())
        .field(FieldSpec::text("thumbnailUrl"))
        .field(FieldSpec::tag("type", MediaType::TAGS))
        .field(FieldSpec::integer("fileSize"))
        .field(FieldSpec::text("mimeType"))
        .field(FieldSpec::id("articleId"))
        .field(FieldSpec::id("contentBlockId"))
        .disable(&[Operation::Subscribe])
        .belongs_to("article", "articleId", EntityType::Article)
        .belongs_to("contentBlock", "contentBlockId", EntityType::ContentBlock)
        .invariant(Invariant::ExactlyOneOf(&["articleId", "contentBlockId"]))
        .listed_under("articleId", EntityType::Article)
        .build()
}

fn category() -> EntitySchema {
    public_content(EntityType::Category)
        .field(FieldSpec::tag("type", CategoryType::TAGS))
        .field(FieldSpec::text("name").required())
        .field(FieldSpec::text("slug").required())
        .field(FieldSpec::text("description"))
        .field(
            FieldSpec::boolean("isDeleted")
                .required()
                .default_value(json!(false)),
        )
        .field(FieldSpec::text_list("subCategories").default_value(json!([])))
        .disable(&[Operation::Subscribe, Operation::Delete])
        .has_many("articles", EntityType::ArticleCategory, "categoryId")
        .has_many("resources", EntityType::ResourceCategory, "categoryId")
        .has_many("business", EntityType::BusinessCategory, "categoryId")
        .soft_delete()
        .build()
}

/// Junction between a parent and a category, keyed by the pair.
fn category_link(
    entity_type: EntityType,
    parent_field: &'static str,
    parent: EntityType,
) -> EntitySchemaBuilder {
    let parent_name = match parent {
        EntityType::Article => "article",
        EntityType::Resource => "resource",
        _ => "business",
    };

    EntitySchema::builder(entity_type)
        .identified_by(&[parent_field, "categoryId"])
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id(parent_field).required())
        .field(FieldSpec::id("categoryId").required())
        .allow(SubjectMatcher::Guest, READ)
        .allow(SubjectMatcher::Authenticated, READ)
        .disable(&[Operation::Update])
        .belongs_to(parent_name, parent_field, parent)
        .belongs_to("category", "categoryId", EntityType::Category)
        .listed_under("categoryId", EntityType::Category)
}

fn opportunity() -> EntitySchema {
    EntitySchema::builder(EntityType::Opportunity)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::text("image"))
        .field(FieldSpec::text("title").required())
        .field(FieldSpec::text("description").required())
        .field(FieldSpec::tag("type", OpportunityType::TAGS))
        .field(FieldSpec::tag("status", OpportunityStatus::TAGS))
        .field(FieldSpec::datetime("applicationDeadline").required())
        .field(FieldSpec::datetime("postedDate").required())
        .field(FieldSpec::text("eligibilityCriteria"))
        .field(FieldSpec::text("benefits"))
        .field(FieldSpec::text("applicationLink").required())
        .field(FieldSpec::text("contactEmail").required())
        .field(FieldSpec::text("contactPhone").required())
        .field(FieldSpec::text("organization"))
        .field(FieldSpec::id("createdById").required())
        .field(FieldSpec::text_list("tags"))
        .owned_by("createdById")
        .allow(SubjectMatcher::Guest, READ)
        .allow(SubjectMatcher::Authenticated, READ)
        .allow(SubjectMatcher::Owner, CRUD)
        .allow(admins(), CRUD)
        .disable(&[Operation::Subscribe])
        .belongs_to("professional", "createdById", EntityType::Professional)
        .build()
}
