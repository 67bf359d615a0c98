use std::sync::Arc;

use enermina_core::AppError;
use enermina_domain::{EntityType, RecordKey, SchemaCatalog, Subject, UserRole};
use serde_json::{Value, json};

use enermina_domain::lifecycle::RegistrationEvent;

use crate::test_support::{FakeRecordStore, member};
use crate::{AuthorizationService, LifecycleConfig, LifecycleService, RecordListQuery};

use super::RecordService;

fn service(store: &Arc<FakeRecordStore>) -> RecordService {
    RecordService::new(
        store.clone(),
        AuthorizationService::new(Arc::new(SchemaCatalog::standard())),
    )
}

fn key(value: &str) -> RecordKey {
    value.parse().unwrap_or_else(|_| unreachable!())
}

fn admin() -> Subject {
    member("admin-1", &[UserRole::Admin])
}

fn page() -> RecordListQuery {
    RecordListQuery {
        limit: 50,
        offset: 0,
    }
}

fn article(id: Option<&str>, author: &str) -> Value {
    let mut article = json!({
        "title": "Solar basics",
        "slug": "solar-basics",
        "authorId": author,
        "tags": ["solar"],
        "publishedAt": "2026-01-10T08:00:00Z",
    });
    if let (Some(id), Some(fields)) = (id, article.as_object_mut()) {
        fields.insert("id".to_owned(), json!(id));
    }
    article
}

async fn seed_user(store: &FakeRecordStore, auth_id: &str) {
    store
        .seed(
            EntityType::User,
            json!({
                "authId": auth_id,
                "email": format!("{auth_id}@enermina.org"),
                "isDeleted": false,
            }),
        )
        .await;
}

async fn seed_article(store: &FakeRecordStore, id: &str, author: &str, likes: i64) {
    let mut data = article(Some(id), author);
    if let Some(fields) = data.as_object_mut() {
        fields.insert("likeCount".to_owned(), json!(likes));
        fields.insert("viewCount".to_owned(), json!(0));
    }
    store.seed(EntityType::Article, data).await;
}

fn like_of(item: &str, owner: &str) -> Value {
    json!({
        "ownerId": owner,
        "likedItemId": item,
        "likedItemType": "ARTICLE",
    })
}

#[tokio::test]
async fn guests_cannot_create_articles() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "author-1").await;

    let result = service(&store)
        .create_record(&Subject::Guest, EntityType::Article, article(None, "author-1"))
        .await;

    assert!(matches!(result, Err(AppError::NotAuthorized(_))));
    assert_eq!(store.commit_count().await, 0);
}

#[tokio::test]
async fn created_article_gets_an_id_and_defaults() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "author-1").await;

    let record = service(&store)
        .create_record(&admin(), EntityType::Article, article(None, "author-1"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let id = record.text("id").unwrap_or_default();
    assert_eq!(id.len(), 36);
    assert_eq!(record.key().as_single(), Some(id));
    assert_eq!(record.integer("likeCount"), Some(0));
    assert_eq!(record.version(), 1);
}

#[tokio::test]
async fn missing_author_is_a_dangling_reference() {
    let store = Arc::new(FakeRecordStore::default());

    let result = service(&store)
        .create_record(&admin(), EntityType::Article, article(None, "ghost"))
        .await;

    assert!(matches!(result, Err(AppError::DanglingReference(_))));
}

#[tokio::test]
async fn liking_twice_is_rejected_and_counts_once() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "user-a").await;
    seed_user(&store, "author-1").await;
    seed_article(&store, "article-1", "author-1", 0).await;
    let service = service(&store);
    let subject = member("user-a", &[UserRole::Subscriber]);

    let (first, second) = tokio::join!(
        service.create_record(&subject, EntityType::Like, like_of("article-1", "user-a")),
        service.create_record(&subject, EntityType::Like, like_of("article-1", "user-a")),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|outcome| matches!(outcome, Err(AppError::AlreadyExists(_))))
    );

    let article = store.stored(EntityType::Article, "article-1").await;
    assert_eq!(article.and_then(|article| article.integer("likeCount")), Some(1));
}

#[tokio::test]
async fn unliking_gives_the_count_back_but_not_below_zero() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "user-a").await;
    seed_user(&store, "author-1").await;
    seed_article(&store, "article-1", "author-1", 0).await;
    let service = service(&store);
    let subject = member("user-a", &[]);

    service
        .create_record(&subject, EntityType::Like, like_of("article-1", "user-a"))
        .await
        .unwrap_or_else(|_| unreachable!());
    service
        .delete_record(&subject, EntityType::Like, &key("article-1,user-a"))
        .await
        .unwrap_or_else(|_| unreachable!());

    let article = store.stored(EntityType::Article, "article-1").await;
    assert_eq!(article.and_then(|article| article.integer("likeCount")), Some(0));
    assert!(store.stored(EntityType::Like, "article-1,user-a").await.is_none());

    store
        .seed(
            EntityType::Like,
            json!({
                "id": "like-9",
                "ownerId": "user-a",
                "likedItemId": "article-1",
                "likedItemType": "ARTICLE",
            }),
        )
        .await;
    service
        .delete_record(&subject, EntityType::Like, &key("article-1,user-a"))
        .await
        .unwrap_or_else(|_| unreachable!());
    let article = store.stored(EntityType::Article, "article-1").await;
    assert_eq!(article.and_then(|article| article.integer("likeCount")), Some(0));
}

#[tokio::test]
async fn invoice_delete_is_disabled_even_for_admins() {
    let store = Arc::new(FakeRecordStore::default());

    let result = service(&store)
        .delete_record(&admin(), EntityType::Invoice, &key("invoice-1"))
        .await;

    assert!(matches!(result, Err(AppError::OperationDisabled(_))));
}

#[tokio::test]
async fn reminder_updates_are_limited_to_owner_and_staff() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "user-b").await;
    store
        .seed(EntityType::Business, json!({ "id": "business-1", "likes": 0 }))
        .await;
    store
        .seed(
            EntityType::Reminder,
            json!({
                "id": "reminder-1",
                "ownerId": "user-b",
                "remindedItemId": "business-1",
                "remindedItemType": "BUSINESS",
                "title": "Visit",
                "message": "Opening day",
                "dateTime": "2026-03-01T09:00:00Z",
            }),
        )
        .await;
    let service = service(&store);
    let patch = json!({ "title": "Visit again" });
    let key = key("business-1,user-b");

    let denied = service
        .update_record(
            &member("user-a", &[UserRole::Subscriber]),
            EntityType::Reminder,
            &key,
            patch.clone(),
        )
        .await;
    assert!(matches!(denied, Err(AppError::NotAuthorized(_))));

    let updated = service
        .update_record(
            &member("user-a", &[UserRole::Admin]),
            EntityType::Reminder,
            &key,
            patch,
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(updated.text("title"), Some("Visit again"));
    assert_eq!(updated.version(), 2);
}

#[tokio::test]
async fn managed_counters_cannot_be_patched() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "author-1").await;
    seed_article(&store, "article-1", "author-1", 3).await;

    let result = service(&store)
        .update_record(
            &admin(),
            EntityType::Article,
            &key("article-1"),
            json!({ "likeCount": 40 }),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn invoice_owner_must_own_the_source_order() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "user-a").await;
    store
        .seed(
            EntityType::ResourceOrder,
            json!({
                "id": "order-1",
                "orderNumber": "RO-1",
                "ownerId": "user-b",
                "paymentMethodId": "method-1",
                "status": "PENDING",
            }),
        )
        .await;

    let result = service(&store)
        .create_record(
            &member("user-a", &[]),
            EntityType::Invoice,
            json!({
                "id": "invoice-1",
                "invoiceNumber": "INV-1",
                "ownerId": "user-a",
                "invoiceSourceType": "RESOURCE_ORDER",
                "invoiceSourceId": "order-1",
                "subTotal": 100,
                "discount": 0,
                "taxes": 0,
                "totalAmount": 100,
                "dueDate": "2026-11-01T00:00:00Z",
            }),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(store.stored(EntityType::Invoice, "invoice-1").await.is_none());
}

#[tokio::test]
async fn paid_invoices_accept_no_new_transactions() {
    let store = Arc::new(FakeRecordStore::default());
    store
        .seed(
            EntityType::Invoice,
            json!({ "id": "invoice-1", "ownerId": "user-a", "status": "PAID", "totalAmount": 100 }),
        )
        .await;
    store
        .seed(
            EntityType::PaymentMethod,
            json!({ "id": "method-1", "ownerId": "user-a" }),
        )
        .await;

    let result = service(&store)
        .create_record(
            &member("user-a", &[]),
            EntityType::PaymentTransaction,
            json!({
                "invoiceId": "invoice-1",
                "paymentMethodId": "method-1",
                "amount": 10,
                "transactionDate": "2026-10-01T10:00:00Z",
            }),
        )
        .await;

    assert!(matches!(result, Err(AppError::PreconditionFailed(_))));
}

#[tokio::test]
async fn implicit_owner_is_stamped_from_the_subject() {
    let store = Arc::new(FakeRecordStore::default());
    store
        .seed(EntityType::Professional, json!({ "ownerId": "pro-1" }))
        .await;

    let record = service(&store)
        .create_record(
            &member("pro-1", &[UserRole::Professional]),
            EntityType::Resource,
            json!({
                "professionalId": "pro-1",
                "authorName": "Ada",
                "title": "Grid sizing",
                "description": "Worksheet",
                "contentUrl": "resources/grid.pdf",
                "imageUrl": "resources/grid.png",
                "price": 12.5,
                "isPublished": true,
                "uploadAt": "2026-02-01T00:00:00Z",
            }),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(record.text("owner"), Some("pro-1"));
    assert_eq!(record.integer("downloadCount"), Some(0));
}

#[tokio::test]
async fn downloads_are_counted() {
    let store = Arc::new(FakeRecordStore::default());
    store
        .seed(
            EntityType::Resource,
            json!({ "id": "resource-1", "owner": "pro-1", "downloadCount": 4 }),
        )
        .await;

    let record = service(&store)
        .record_download(&member("user-a", &[]), &key("resource-1"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(record.integer("downloadCount"), Some(5));
}

#[tokio::test]
async fn owner_only_listings_return_own_records() {
    let store = Arc::new(FakeRecordStore::default());
    for (item, owner) in [("business-1", "user-a"), ("business-2", "user-b")] {
        store
            .seed(
                EntityType::Reminder,
                json!({
                    "id": format!("{item}-{owner}"),
                    "ownerId": owner,
                    "remindedItemId": item,
                    "remindedItemType": "BUSINESS",
                }),
            )
            .await;
    }

    let listed = service(&store)
        .list_records(
            &member("user-a", &[UserRole::Subscriber]),
            EntityType::Reminder,
            page(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].text("ownerId"), Some("user-a"));
}

#[tokio::test]
async fn soft_deleted_articles_leave_listings_but_stay_resolvable() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "author-1").await;
    seed_article(&store, "article-1", "author-1", 0).await;
    seed_article(&store, "article-2", "author-1", 0).await;
    let service = service(&store);

    let deleted = service
        .delete_record(&admin(), EntityType::Article, &key("article-1"))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(deleted.flag("isDeleted"));

    let listed = service
        .list_records(&Subject::Guest, EntityType::Article, page())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].key().as_single(), Some("article-2"));

    let fetched = service
        .get_record(&Subject::Guest, EntityType::Article, &key("article-1"))
        .await;
    assert!(fetched.is_ok());
}

#[tokio::test]
async fn articles_of_deleted_authors_are_hidden_from_listings() {
    let store = Arc::new(FakeRecordStore::default());
    store
        .seed(
            EntityType::User,
            json!({ "authId": "author-1", "email": "a@enermina.org", "isDeleted": true }),
        )
        .await;
    seed_article(&store, "article-1", "author-1", 0).await;

    let listed = service(&store)
        .list_records(&Subject::Guest, EntityType::Article, page())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(listed.is_empty());
}

#[tokio::test]
async fn belongs_to_and_has_many_resolve_each_other() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "author-1").await;
    seed_article(&store, "article-1", "author-1", 0).await;
    let service = service(&store);
    let reader = member("user-a", &[]);

    let authors = service
        .related_records(&reader, EntityType::Article, &key("article-1"), "author")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(authors.len(), 1);

    let articles = service
        .related_records(&reader, EntityType::User, authors[0].key(), "articles")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        articles
            .iter()
            .filter(|article| article.key().as_single() == Some("article-1"))
            .count(),
        1
    );
}

#[tokio::test]
async fn related_records_skip_what_the_subject_cannot_read() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "user-a").await;
    store
        .seed(
            EntityType::Reminder,
            json!({
                "id": "reminder-1",
                "ownerId": "user-a",
                "remindedItemId": "business-1",
                "remindedItemType": "BUSINESS",
            }),
        )
        .await;
    let service = service(&store);

    let seen_by_stranger = service
        .related_records(
            &member("user-b", &[]),
            EntityType::User,
            &key("user-a"),
            "reminders",
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(seen_by_stranger.is_empty());

    let seen_by_owner = service
        .related_records(
            &member("user-a", &[]),
            EntityType::User,
            &key("user-a"),
            "reminders",
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(seen_by_owner.len(), 1);
}

#[tokio::test]
async fn unknown_relationships_are_not_found() {
    let store = Arc::new(FakeRecordStore::default());
    seed_user(&store, "user-a").await;

    let result = service(&store)
        .related_records(&admin(), EntityType::User, &key("user-a"), "friends")
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

async fn seed_invoice(store: &FakeRecordStore, status: &str, total: i64) {
    seed_user(store, "user-a").await;
    store
        .seed(
            EntityType::ResourceOrder,
            json!({ "id": "order-1", "ownerId": "user-a", "status": "PENDING" }),
        )
        .await;
    store
        .seed(
            EntityType::Invoice,
            json!({
                "id": "invoice-1",
                "invoiceNumber": "INV-1",
                "ownerId": "user-a",
                "invoiceSourceType": "RESOURCE_ORDER",
                "invoiceSourceId": "order-1",
                "subTotal": total,
                "discount": 0,
                "taxes": 0,
                "totalAmount": total,
                "dueDate": "2026-11-01T00:00:00Z",
                "status": status,
            }),
        )
        .await;
}

async fn seed_transaction(store: &FakeRecordStore, id: &str, status: &str, amount: i64) {
    store
        .seed(
            EntityType::PaymentTransaction,
            json!({
                "id": id,
                "invoiceId": "invoice-1",
                "paymentMethodId": "method-1",
                "amount": amount,
                "transactionDate": "2026-10-01T10:00:00Z",
                "status": status,
                "owner": "user-a",
            }),
        )
        .await;
}

fn amounts(total: i64) -> Value {
    json!({ "subTotal": total, "totalAmount": total })
}

#[tokio::test]
async fn paid_invoice_amounts_are_fixed() {
    let store = Arc::new(FakeRecordStore::default());
    seed_invoice(&store, "PAID", 100).await;
    seed_transaction(&store, "transaction-1", "SUCCESS", 100).await;
    let service = service(&store);
    let owner = member("user-a", &[]);

    for total in [40, 500] {
        let result = service
            .update_record(&owner, EntityType::Invoice, &key("invoice-1"), amounts(total))
            .await;
        assert!(matches!(result, Err(AppError::PreconditionFailed(_))));
    }

    let invoice = store.stored(EntityType::Invoice, "invoice-1").await;
    assert_eq!(invoice.and_then(|invoice| invoice.integer("totalAmount")), Some(100));

    let relabelled = service
        .update_record(
            &owner,
            EntityType::Invoice,
            &key("invoice-1"),
            json!({ "documentUrl": "invoices/inv-1.pdf" }),
        )
        .await;
    assert!(relabelled.is_ok());
}

#[tokio::test]
async fn unpaid_invoice_total_stays_above_successful_payments() {
    let store = Arc::new(FakeRecordStore::default());
    seed_invoice(&store, "UNPAID", 100).await;
    seed_transaction(&store, "transaction-1", "SUCCESS", 60).await;
    seed_transaction(&store, "transaction-2", "FAILED", 40).await;
    let service = service(&store);
    let owner = member("user-a", &[]);

    let lowered = service
        .update_record(&owner, EntityType::Invoice, &key("invoice-1"), amounts(50))
        .await;
    assert!(matches!(lowered, Err(AppError::PreconditionFailed(_))));

    let adjusted = service
        .update_record(&owner, EntityType::Invoice, &key("invoice-1"), amounts(80))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(adjusted.integer("totalAmount"), Some(80));
}

async fn seed_event(store: &FakeRecordStore, capacity: i64, tickets: i64) {
    store
        .seed(EntityType::Business, json!({ "id": "business-1", "likes": 0 }))
        .await;
    store
        .seed(
            EntityType::Event,
            json!({
                "id": "event-1",
                "title": "Grid day",
                "description": "Workshops",
                "tags": [],
                "date": "2026-12-01",
                "time": "09:00",
                "isVirtual": false,
                "location": "Dakar",
                "capacity": capacity,
                "ticketsAvailable": tickets,
                "price": 10,
                "businessId": "business-1",
                "images": [],
                "owner": "pro-1",
            }),
        )
        .await;
}

#[tokio::test]
async fn capacity_changes_keep_held_seats() {
    let store = Arc::new(FakeRecordStore::default());
    seed_event(&store, 10, 9).await;
    let service = service(&store);

    let too_small = service
        .update_record(&admin(), EntityType::Event, &key("event-1"), json!({ "capacity": 0 }))
        .await;
    assert!(matches!(too_small, Err(AppError::PreconditionFailed(_))));

    let shrunk = service
        .update_record(&admin(), EntityType::Event, &key("event-1"), json!({ "capacity": 9 }))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(shrunk.integer("capacity"), Some(9));
    assert_eq!(shrunk.integer("ticketsAvailable"), Some(8));

    let grown = service
        .update_record(&admin(), EntityType::Event, &key("event-1"), json!({ "capacity": 12 }))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(grown.integer("ticketsAvailable"), Some(11));
}

#[tokio::test]
async fn confirmed_seat_is_released_after_capacity_shrinks() {
    let store = Arc::new(FakeRecordStore::default());
    seed_event(&store, 10, 9).await;
    store
        .seed(
            EntityType::EventRegistration,
            json!({
                "id": "registration-1",
                "eventId": "event-1",
                "ownerId": "user-a",
                "orderId": "order-1",
                "ticketId": "ticket-1",
                "status": "CONFIRMED",
            }),
        )
        .await;
    let authorization_service = AuthorizationService::new(Arc::new(SchemaCatalog::standard()));
    let lifecycle = LifecycleService::new(
        store.clone(),
        authorization_service,
        LifecycleConfig::default(),
    );

    service(&store)
        .update_record(&admin(), EntityType::Event, &key("event-1"), json!({ "capacity": 9 }))
        .await
        .unwrap_or_else(|_| unreachable!());
    lifecycle
        .transition_registration(&admin(), &key("registration-1"), RegistrationEvent::Cancel)
        .await
        .unwrap_or_else(|_| unreachable!());

    let event = store.stored(EntityType::Event, "event-1").await;
    assert_eq!(event.and_then(|event| event.integer("ticketsAvailable")), Some(9));
}
