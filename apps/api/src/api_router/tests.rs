use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use enermina_application::{
    AuthorizationService, IntegrationService, LifecycleConfig, LifecycleService, RecordService,
    StorageAccessService,
};
use enermina_domain::{EmailAddress, SchemaCatalog};
use enermina_infrastructure::{
    ConsoleEmailService, InMemoryIdentityDirectory, InMemoryRecordStore, InMemorySearchIndex,
    JwtStreamTokenIssuer,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::build_router;
use crate::middleware::{GATEWAY_SECRET_HEADER, GROUPS_HEADER, SUBJECT_HEADER};
use crate::state::AppState;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn test_router() -> Router {
    let catalog = Arc::new(SchemaCatalog::standard());
    let store = Arc::new(InMemoryRecordStore::for_catalog(&catalog));
    let authorization_service = AuthorizationService::new(catalog);
    let stream_tokens =
        JwtStreamTokenIssuer::new("stream-secret").unwrap_or_else(|_| unreachable!());
    let support_address =
        EmailAddress::new("svp@enermina.org").unwrap_or_else(|_| unreachable!());

    let app_state = AppState {
        record_service: RecordService::new(store.clone(), authorization_service.clone()),
        lifecycle_service: LifecycleService::new(
            store.clone(),
            authorization_service.clone(),
            LifecycleConfig::default(),
        ),
        integration_service: IntegrationService::new(
            authorization_service,
            store,
            Arc::new(InMemoryIdentityDirectory::new()),
            Arc::new(InMemorySearchIndex::new()),
            Arc::new(stream_tokens),
            Arc::new(ConsoleEmailService::new()),
            support_address,
        ),
        storage_access_service: StorageAccessService::new(),
        gateway_shared_secret: Arc::from(SECRET),
    };

    build_router(app_state, "http://localhost:3000").unwrap_or_else(|_| unreachable!())
}

enum Caller<'a> {
    Guest,
    Member(&'a str, &'a str),
    Forged(&'a str),
    Trigger,
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    caller: Caller<'_>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    match caller {
        Caller::Guest => {}
        Caller::Member(subject, groups) => {
            builder = builder
                .header(SUBJECT_HEADER, subject)
                .header(GROUPS_HEADER, groups)
                .header(GATEWAY_SECRET_HEADER, SECRET);
        }
        Caller::Forged(subject) => {
            builder = builder.header(SUBJECT_HEADER, subject);
        }
        Caller::Trigger => {
            builder = builder.header(GATEWAY_SECRET_HEADER, SECRET);
        }
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_else(|_| unreachable!());

    let response = router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|_| unreachable!());
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn confirm_sign_up(router: &Router, auth_id: &str) -> (StatusCode, Value) {
    call(
        router,
        Method::POST,
        "/internal/triggers/post-confirmation",
        Caller::Trigger,
        Some(json!({ "authId": auth_id, "email": format!("{auth_id}@enermina.org") })),
    )
    .await
}

#[tokio::test]
async fn health_is_public() {
    let router = test_router();
    let (status, body) = call(&router, Method::GET, "/health", Caller::Guest, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn asserted_identities_without_the_secret_are_unauthenticated() {
    let router = test_router();
    let (status, body) = call(
        &router,
        Method::GET,
        "/api/records/article",
        Caller::Forged("intruder"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().is_some_and(|message| message.contains("gateway")));
}

#[tokio::test]
async fn post_confirmation_requires_the_gateway_secret() {
    let router = test_router();
    let (status, _) = call(
        &router,
        Method::POST,
        "/internal/triggers/post-confirmation",
        Caller::Guest,
        Some(json!({ "authId": "user-1", "email": "user-1@enermina.org" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn confirmed_sign_ups_are_created_once_and_readable_by_their_owner() {
    let router = test_router();

    let (status, first) = confirm_sign_up(&router, "user-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["role"], json!("SUBSCRIBER"));

    let (status, second) = confirm_sign_up(&router, "user-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["key"], first["key"]);
    assert_eq!(second["version"], first["version"]);

    let (status, own) = call(
        &router,
        Method::GET,
        "/api/records/user/user-1",
        Caller::Member("user-1", "SUBSCRIBER"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own["data"]["email"], json!("user-1@enermina.org"));
}

#[tokio::test]
async fn guests_read_articles_but_only_admins_write_them() {
    let router = test_router();
    let (status, _) = confirm_sign_up(&router, "author-1").await;
    assert_eq!(status, StatusCode::OK);

    let article = json!({
        "data": {
            "title": "Solar basics",
            "slug": "solar-basics",
            "authorId": "author-1",
            "tags": ["solar"],
            "publishedAt": "2024-05-01T08:00:00Z"
        }
    });

    let (status, _) = call(
        &router,
        Method::POST,
        "/api/records/article",
        Caller::Guest,
        Some(article.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = call(
        &router,
        Method::POST,
        "/api/records/article",
        Caller::Member("admin-1", "ADMIN"),
        Some(article),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let key = created["key"].as_str().unwrap_or_default().to_owned();

    let (status, listed) =
        call(&router, Method::GET, "/api/records/article", Caller::Guest, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, author) = call(
        &router,
        Method::GET,
        &format!("/api/records/article/{key}/relationships/author"),
        Caller::Member("reader-1", "SUBSCRIBER"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(author[0]["key"], json!("author-1"));

    let (status, hidden) = call(
        &router,
        Method::GET,
        &format!("/api/records/article/{key}/relationships/author"),
        Caller::Guest,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hidden, json!([]));
}

#[tokio::test]
async fn articles_must_reference_an_existing_author() {
    let router = test_router();
    let (status, _) = call(
        &router,
        Method::POST,
        "/api/records/article",
        Caller::Member("admin-1", "ADMIN"),
        Some(json!({
            "data": {
                "title": "Orphan",
                "slug": "orphan",
                "authorId": "nobody",
                "tags": [],
                "publishedAt": "2024-05-01T08:00:00Z"
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn disabled_operations_answer_method_not_allowed() {
    let router = test_router();
    let (status, body) = call(
        &router,
        Method::GET,
        "/api/subscriptions/user",
        Caller::Member("user-1", "ADMIN"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn unknown_entity_types_are_not_found() {
    let router = test_router();
    let (status, _) = call(
        &router,
        Method::GET,
        "/api/records/spaceship",
        Caller::Guest,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn records_without_a_lifecycle_reject_transitions() {
    let router = test_router();
    let (status, _) = call(
        &router,
        Method::POST,
        "/api/records/article/a-1/transitions",
        Caller::Member("admin-1", "ADMIN"),
        Some(json!({ "event": "publish" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storage_access_follows_the_prefix_matrix() {
    let router = test_router();

    let (status, grant) = call(
        &router,
        Method::POST,
        "/api/storage/access",
        Caller::Guest,
        Some(json!({ "path": "articles/cover.jpg", "action": "read" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grant["action"], json!("read"));

    let (status, _) = call(
        &router,
        Method::POST,
        "/api/storage/access",
        Caller::Guest,
        Some(json!({ "path": "articles/cover.jpg", "action": "write" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &router,
        Method::POST,
        "/api/storage/access",
        Caller::Guest,
        Some(json!({ "path": "articles/../users/secret.jpg", "action": "read" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn guests_reach_support_but_not_stream_tokens() {
    let router = test_router();

    let (status, receipt) = call(
        &router,
        Method::POST,
        "/api/mutations/support-contact-email",
        Caller::Guest,
        Some(json!({
            "name": "Ada",
            "email": "ada@example.org",
            "reason": "PARTNERSHIP",
            "message": "Hello"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["content"], json!("support request sent"));

    let (status, _) = call(
        &router,
        Method::POST,
        "/api/mutations/create-stream-token",
        Caller::Guest,
        Some(json!({ "userId": "user-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, token) = call(
        &router,
        Method::POST,
        "/api/mutations/create-stream-token",
        Caller::Member("user-1", "SUBSCRIBER"),
        Some(json!({ "userId": "user-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(token["content"].as_str().is_some_and(|content| !content.is_empty()));
}
