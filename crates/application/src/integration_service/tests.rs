use std::sync::Arc;

use async_trait::async_trait;
use enermina_core::{AppError, AppResult};
use enermina_domain::{EmailAddress, EntityType, SchemaCatalog, Subject, UserRole};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;

use crate::AuthorizationService;
use crate::integration_ports::{EmailService, IdentityProvider, SearchIndex, StreamTokenIssuer};
use crate::test_support::{FakeRecordStore, member};

use super::{IntegrationService, PostConfirmationInput, SupportContactInput};

#[derive(Default)]
struct FakeIdentityProvider {
    groups: Mutex<Vec<(String, UserRole)>>,
    created: Mutex<Vec<String>>,
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn add_user_to_group(&self, auth_id: &str, group: UserRole) -> AppResult<()> {
        self.groups.lock().await.push((auth_id.to_owned(), group));
        Ok(())
    }

    async fn admin_create_user(&self, email: &EmailAddress, _password: &str) -> AppResult<String> {
        let mut created = self.created.lock().await;
        if created.iter().any(|existing| existing == email.as_str()) {
            return Err(AppError::AlreadyExists(format!(
                "identity '{}' already exists",
                email.as_str()
            )));
        }
        created.push(email.as_str().to_owned());
        Ok(format!("identity-{}", created.len()))
    }
}

#[derive(Default)]
struct FakeSearchIndex {
    documents: Mutex<Vec<(String, String, Map<String, Value>)>>,
}

#[async_trait]
impl SearchIndex for FakeSearchIndex {
    async fn upsert(
        &self,
        index_name: &str,
        object_id: &str,
        body: Map<String, Value>,
    ) -> AppResult<()> {
        let mut documents = self.documents.lock().await;
        documents.retain(|(index, id, _)| !(index == index_name && id == object_id));
        documents.push((index_name.to_owned(), object_id.to_owned(), body));
        Ok(())
    }

    async fn delete(&self, index_name: &str, object_id: &str) -> AppResult<()> {
        self.documents
            .lock()
            .await
            .retain(|(index, id, _)| !(index == index_name && id == object_id));
        Ok(())
    }
}

struct FakeStreamTokens;

#[async_trait]
impl StreamTokenIssuer for FakeStreamTokens {
    async fn issue(&self, user_id: &str) -> AppResult<String> {
        Ok(format!("token-for-{user_id}"))
    }
}

#[derive(Debug, Clone)]
struct SentEmail {
    to: String,
    reply_to: Option<String>,
    subject: String,
    text_body: String,
}

#[derive(Default)]
struct FakeEmailService {
    sent: Mutex<Vec<SentEmail>>,
}

#[async_trait]
impl EmailService for FakeEmailService {
    async fn send_email(
        &self,
        to: &str,
        reply_to: Option<&str>,
        subject: &str,
        text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        self.sent.lock().await.push(SentEmail {
            to: to.to_owned(),
            reply_to: reply_to.map(str::to_owned),
            subject: subject.to_owned(),
            text_body: text_body.to_owned(),
        });
        Ok(())
    }
}

struct Fixture {
    service: IntegrationService,
    store: Arc<FakeRecordStore>,
    identities: Arc<FakeIdentityProvider>,
    search: Arc<FakeSearchIndex>,
    emails: Arc<FakeEmailService>,
}

fn fixture() -> Fixture {
    let store = Arc::new(FakeRecordStore::default());
    let identities = Arc::new(FakeIdentityProvider::default());
    let search = Arc::new(FakeSearchIndex::default());
    let emails = Arc::new(FakeEmailService::default());
    let service = IntegrationService::new(
        AuthorizationService::new(Arc::new(SchemaCatalog::standard())),
        store.clone(),
        identities.clone(),
        search.clone(),
        Arc::new(FakeStreamTokens),
        emails.clone(),
        EmailAddress::new("svp@enermina.org").unwrap_or_else(|_| unreachable!()),
    );
    Fixture {
        service,
        store,
        identities,
        search,
        emails,
    }
}

fn contact(subject: Option<&str>) -> SupportContactInput {
    SupportContactInput {
        name: "Awa".to_owned(),
        email: "Awa@Example.org".to_owned(),
        phone: None,
        reason: "Billing".to_owned(),
        subject: subject.map(str::to_owned),
        message: "My invoice looks wrong.".to_owned(),
    }
}

#[tokio::test]
async fn guests_can_contact_support_with_reply_to_the_sender() {
    let fixture = fixture();

    let receipt = fixture
        .service
        .support_contact_email(&Subject::Guest, contact(Some("Invoice 42")))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(receipt.content, "support request sent");

    let sent = fixture.emails.sent.lock().await.clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "svp@enermina.org");
    assert_eq!(sent[0].reply_to.as_deref(), Some("awa@example.org"));
    assert_eq!(sent[0].subject, "[Billing] Invoice 42");
    assert!(sent[0].text_body.contains("Phone: not provided"));
    assert!(sent[0].text_body.ends_with("My invoice looks wrong."));
}

#[tokio::test]
async fn support_subject_falls_back_to_the_sender_name() {
    let fixture = fixture();

    fixture
        .service
        .support_contact_email(&member("user-1", &[]), contact(Some("   ")))
        .await
        .unwrap_or_else(|_| unreachable!());

    let sent = fixture.emails.sent.lock().await.clone();
    assert_eq!(sent[0].subject, "[Billing] Contact from Awa");
}

#[tokio::test]
async fn support_requests_need_a_valid_sender_address() {
    let fixture = fixture();
    let mut input = contact(None);
    input.email = "not-an-address".to_owned();

    let result = fixture
        .service
        .support_contact_email(&Subject::Guest, input)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(fixture.emails.sent.lock().await.is_empty());
}

#[tokio::test]
async fn guests_cannot_issue_stream_tokens() {
    let fixture = fixture();

    let denied = fixture
        .service
        .create_stream_token(&Subject::Guest, "user-1")
        .await;
    assert!(matches!(denied, Err(AppError::NotAuthorized(_))));

    let receipt = fixture
        .service
        .create_stream_token(&member("user-1", &[]), "user-1")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(receipt.content, "token-for-user-1");
}

#[tokio::test]
async fn only_admins_provision_identities() {
    let fixture = fixture();

    let denied = fixture
        .service
        .admin_create_user(
            &member("user-1", &[UserRole::Professional]),
            "new@enermina.org",
            "secret123",
        )
        .await;
    assert!(matches!(denied, Err(AppError::NotAuthorized(_))));
    assert!(fixture.identities.created.lock().await.is_empty());

    let weak = fixture
        .service
        .admin_create_user(
            &member("admin-1", &[UserRole::Admin]),
            "new@enermina.org",
            "no-digits",
        )
        .await;
    assert!(matches!(weak, Err(AppError::Validation(_))));

    let receipt = fixture
        .service
        .admin_create_user(
            &member("admin-1", &[UserRole::Admin]),
            "new@enermina.org",
            "secret123",
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(receipt.content, "identity-1");
}

#[tokio::test]
async fn adding_to_a_group_aligns_the_stored_role() {
    let fixture = fixture();
    fixture
        .store
        .seed(
            EntityType::User,
            json!({ "authId": "user-1", "email": "a@enermina.org", "role": "SUBSCRIBER" }),
        )
        .await;

    fixture
        .service
        .add_user_to_group(&member("user-1", &[]), "user-1", "PROFESSIONAL")
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        fixture.identities.groups.lock().await.clone(),
        vec![("user-1".to_owned(), UserRole::Professional)]
    );
    let user = fixture
        .store
        .stored(EntityType::User, "user-1")
        .await
        .unwrap_or_else(|| unreachable!());
    assert_eq!(user.text("role"), Some("PROFESSIONAL"));
    assert_eq!(user.version(), 2);
}

#[tokio::test]
async fn unknown_groups_are_rejected() {
    let fixture = fixture();

    let result = fixture
        .service
        .add_user_to_group(&member("user-1", &[]), "user-1", "SUPERUSER")
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(fixture.identities.groups.lock().await.is_empty());
}

#[tokio::test]
async fn search_documents_must_be_objects() {
    let fixture = fixture();
    let subject = member("user-1", &[]);

    let rejected = fixture
        .service
        .add_or_update_searchable_record(&subject, "articles", "a-1", json!(["not", "an object"]))
        .await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));

    fixture
        .service
        .add_or_update_searchable_record(&subject, "articles", "a-1", json!({ "title": "Solar" }))
        .await
        .unwrap_or_else(|_| unreachable!());
    fixture
        .service
        .add_or_update_searchable_record(&subject, "articles", "a-1", json!({ "title": "Wind" }))
        .await
        .unwrap_or_else(|_| unreachable!());

    let documents = fixture.search.documents.lock().await.clone();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].2.get("title"), Some(&json!("Wind")));

    fixture
        .service
        .delete_searchable_record(&subject, "articles", "a-1")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(fixture.search.documents.lock().await.is_empty());
}

#[tokio::test]
async fn confirmed_sign_ups_become_subscribers_once() {
    let fixture = fixture();
    let input = PostConfirmationInput {
        auth_id: "user-9".to_owned(),
        email: "New@Enermina.org".to_owned(),
        name: Some("Kofi".to_owned()),
    };

    let user = fixture
        .service
        .handle_post_confirmation(input.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(user.text("role"), Some("SUBSCRIBER"));
    assert_eq!(user.text("email"), Some("new@enermina.org"));
    assert_eq!(user.data().get("isDeleted"), Some(&json!(false)));
    assert_eq!(user.data().get("pushTokens"), Some(&json!([])));

    let again = fixture
        .service
        .handle_post_confirmation(input)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(again.version(), user.version());
    assert_eq!(fixture.store.commit_count().await, 1);
    assert_eq!(
        fixture.identities.groups.lock().await.clone(),
        vec![("user-9".to_owned(), UserRole::Subscriber)]
    );
}
