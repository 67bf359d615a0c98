use serde_json::json;

use super::{CREATE_READ_UPDATE, CRUD, READ_UPDATE, admins_and_professionals};
use crate::policy::{Operation, SubjectMatcher};
use crate::schema::{EntitySchema, FieldSpec, Invariant};
use crate::{
    CardBrand, EntityType, InvoiceSourceType, InvoiceStatus, MobileProviderName, OrderStatus,
    PaymentMethodType, PaymentTermsType, PaymentTransactionStatus, ResourceItemStatus,
};

const INVOICE_SOURCES: &[(&str, EntityType)] = &[
    ("RESOURCE_ORDER", EntityType::ResourceOrder),
    ("EVENT_ORDER", EntityType::EventOrder),
];

const NOT_SUBSCRIBABLE_OR_DELETABLE: &[Operation] = &[Operation::Subscribe, Operation::Delete];

pub(super) fn schemas() -> Vec<EntitySchema> {
    vec![
        invoice(),
        payment_transaction(),
        payment_method(),
        resource_order_item(),
        order(EntityType::ResourceOrder, "RESOURCE_ORDER", EntityType::ResourceOrderItem),
        order(EntityType::EventOrder, "EVENT_ORDER", EntityType::EventRegistration),
    ]
}

fn lifecycle_status(tags: &'static [&'static str], initial: &str) -> FieldSpec {
    FieldSpec::tag("status", tags)
        .required()
        .default_value(json!(initial))
        .managed()
}

fn invoice() -> EntitySchema {
    EntitySchema::builder(EntityType::Invoice)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::text("invoiceNumber").required())
        .field(FieldSpec::id("ownerId").required())
        .field(
            FieldSpec::tag("invoiceSourceType", InvoiceSourceType::TAGS)
                .required()
                .immutable(),
        )
        .field(FieldSpec::id("invoiceSourceId").required().immutable())
        .field(FieldSpec::float("subTotal").required())
        .field(FieldSpec::float("discount").required())
        .field(FieldSpec::float("taxes").required())
        .field(FieldSpec::float("totalAmount").required())
        .field(FieldSpec::tag("paymentTerms", PaymentTermsType::TAGS))
        .field(FieldSpec::datetime("dueDate").required())
        .field(lifecycle_status(InvoiceStatus::TAGS, "UNPAID"))
        .field(FieldSpec::text("documentUrl"))
        .field(FieldSpec::integer("documentVersion"))
        .field(FieldSpec::json_list("documentHistory"))
        .owned_by("ownerId")
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(
            admins_and_professionals(),
            &[Operation::Read, Operation::Update, Operation::Delete],
        )
        .disable(NOT_SUBSCRIBABLE_OR_DELETABLE)
        .belongs_to("user", "ownerId", EntityType::User)
        .polymorphic(
            "source",
            "invoiceSourceType",
            "invoiceSourceId",
            INVOICE_SOURCES,
        )
        .has_many("transactions", EntityType::PaymentTransaction, "invoiceId")
        .invariant(Invariant::NonNegative("subTotal"))
        .invariant(Invariant::NonNegative("discount"))
        .invariant(Invariant::NonNegative("taxes"))
        .invariant(Invariant::NonNegative("totalAmount"))
        .invariant(Invariant::AmountBalance {
            total: "totalAmount",
            sub_total: "subTotal",
            discount: "discount",
            taxes: "taxes",
        })
        .unique(&["invoiceNumber"])
        .build()
}

fn payment_transaction() -> EntitySchema {
    EntitySchema::builder(EntityType::PaymentTransaction)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("invoiceId").required().immutable())
        .field(FieldSpec::id("paymentMethodId").required())
        .field(FieldSpec::text("transactionID"))
        .field(FieldSpec::float("amount").required().immutable())
        .field(FieldSpec::datetime("transactionDate").required())
        .field(lifecycle_status(PaymentTransactionStatus::TAGS, "PENDING"))
        .field(FieldSpec::text("notes"))
        .implicit_owner()
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), READ_UPDATE)
        .disable(NOT_SUBSCRIBABLE_OR_DELETABLE)
        .belongs_to("invoice", "invoiceId", EntityType::Invoice)
        .belongs_to("paymentMethod", "paymentMethodId", EntityType::PaymentMethod)
        .invariant(Invariant::NonNegative("amount"))
        .build()
}

fn payment_method() -> EntitySchema {
    EntitySchema::builder(EntityType::PaymentMethod)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::text("ownerName").required())
        .field(FieldSpec::tag("type", PaymentMethodType::TAGS).required())
        .field(FieldSpec::text("paymentToken").required())
        .field(FieldSpec::boolean("isDefault").required())
        .field(FieldSpec::object(
            "cardDetails",
            vec![
                FieldSpec::tag("cardBrand", CardBrand::TAGS),
                FieldSpec::text("lastFourDigits").required(),
            ],
        ))
        .field(FieldSpec::object(
            "mobileDetails",
            vec![
                FieldSpec::text("mobileNumber").required(),
                FieldSpec::tag("mobileProviderName", MobileProviderName::TAGS),
            ],
        ))
        .owned_by("ownerId")
        .allow(SubjectMatcher::Owner, CRUD)
        .allow(admins_and_professionals(), READ_UPDATE)
        .disable(NOT_SUBSCRIBABLE_OR_DELETABLE)
        .belongs_to("user", "ownerId", EntityType::User)
        .has_many("transactions", EntityType::PaymentTransaction, "paymentMethodId")
        .has_many("resourceOrders", EntityType::ResourceOrder, "paymentMethodId")
        .has_many("eventOrders", EntityType::EventOrder, "paymentMethodId")
        .invariant(Invariant::PaymentDetails {
            kind: "type",
            card: "cardDetails",
            mobile: "mobileDetails",
        })
        .unique_when(&["ownerId"], "isDefault", json!(true))
        .build()
}

fn resource_order_item() -> EntitySchema {
    EntitySchema::builder(EntityType::ResourceOrderItem)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::id("orderId").required().immutable())
        .field(FieldSpec::id("resourceId").required())
        .field(FieldSpec::text("description").required())
        .field(FieldSpec::integer("quantity").required())
        .field(FieldSpec::float("price").required())
        .field(
            FieldSpec::tag("status", ResourceItemStatus::TAGS)
                .required()
                .default_value(json!("PENDING")),
        )
        .owned_by("ownerId")
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), READ_UPDATE)
        .disable(NOT_SUBSCRIBABLE_OR_DELETABLE)
        .belongs_to("user", "ownerId", EntityType::User)
        .belongs_to("order", "orderId", EntityType::ResourceOrder)
        .belongs_to("resource", "resourceId", EntityType::Resource)
        .invariant(Invariant::IntegerRange {
            field: "quantity",
            min: Some(1),
            max: None,
        })
        .invariant(Invariant::NonNegative("price"))
        .build()
}

fn order(entity_type: EntityType, source_tag: &'static str, items: EntityType) -> EntitySchema {
    EntitySchema::builder(entity_type)
        .field(FieldSpec::id("id").required())
        .field(FieldSpec::text("orderNumber").required())
        .field(FieldSpec::id("ownerId").required())
        .field(FieldSpec::id("paymentMethodId").required())
        .field(lifecycle_status(OrderStatus::TAGS, "PENDING"))
        .owned_by("ownerId")
        .allow(SubjectMatcher::Owner, CREATE_READ_UPDATE)
        .allow(admins_and_professionals(), READ_UPDATE)
        .belongs_to("user", "ownerId", EntityType::User)
        .has_many_tagged(
            "invoices",
            EntityType::Invoice,
            "invoiceSourceId",
            ("invoiceSourceType", source_tag),
        )
        .has_many("items", items, "orderId")
        .belongs_to("paymentMethod", "paymentMethodId", EntityType::PaymentMethod)
        .unique(&["orderNumber"])
        .build()
}
