#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use bson::{oid::ObjectId, Document};
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use bcm_backend::app::{build_router, AppState};
use bcm_backend::config::{AppEnvironment, JwtConfig, RateLimitConfig};
use bcm_backend::model::lead::{timestamp, LeadDocument, LeadStatus};
use bcm_backend::model::user::User;
use bcm_backend::repository::lead_repo::{status_changes, LeadFilter, LeadRepository};
use bcm_backend::repository::mongo::StoreHealth;
use bcm_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use bcm_backend::repository::user_repo::UserRepository;
use bcm_backend::service::notification::{EmailNotifier, Mailer};
use bcm_backend::util::email::{EmailError, EmailMessage};
use bcm_backend::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl, Subject};
use bcm_backend::model::contact::Contact;
use bcm_backend::model::enquiry::Enquiry;
use bcm_backend::util::rate_limiter::RateLimiter;

pub const OPERATOR_EMAIL: &str = "ops@bcm.test";

/// A record as the store would hold it.
fn stored<T: LeadDocument>(record: &T) -> Document {
    bson::to_document(record).unwrap()
}

fn created_at(document: &Document) -> String {
    document.get_str("createdAt").unwrap_or_default().to_string()
}

/// Lead store kept in a vector.
pub struct MemoryLeadRepo<T> {
    pub records: Mutex<Vec<T>>,
}

impl<T: LeadDocument> MemoryLeadRepo<T> {
    pub fn new() -> Self {
        MemoryLeadRepo { records: Mutex::new(Vec::new()) }
    }

    /// Insert a record as if it had been created `minutes_ago`.
    pub fn seed(&self, mut record: T, minutes_ago: i64) -> T {
        record.assign_identity(ObjectId::new(), &timestamp(Utc::now() - Duration::minutes(minutes_ago)));
        self.records.lock().push(record.clone());
        record
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl<T: LeadDocument> LeadRepository<T> for MemoryLeadRepo<T> {
    async fn create(&self, mut record: T) -> RepositoryResult<T> {
        record.assign_identity(ObjectId::new(), &timestamp(Utc::now()));
        self.records.lock().push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<T>> {
        Ok(self.records.lock().iter().find(|r| r.id() == Some(id)).cloned())
    }

    async fn list(&self, page: u64, limit: u64) -> RepositoryResult<Vec<T>> {
        let mut records = self.records.lock().clone();
        records.sort_by_key(|r| std::cmp::Reverse(created_at(&stored(r))));
        Ok(records
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> RepositoryResult<u64> {
        Ok(self.records.lock().len() as u64)
    }

    async fn count_where(&self, filter: LeadFilter) -> RepositoryResult<u64> {
        let after = filter.created_after.map(timestamp);
        let matching = self
            .records
            .lock()
            .iter()
            .map(stored)
            .filter(|d| filter.status.map_or(true, |s| d.get_str("status").ok() == Some(s.as_str())))
            .filter(|d| after.as_ref().map_or(true, |after| created_at(d) > *after))
            .count();
        Ok(matching as u64)
    }

    async fn update_status(&self, id: ObjectId, status: LeadStatus) -> RepositoryResult<Option<T>> {
        let mut records = self.records.lock();
        Ok(records.iter_mut().find(|r| r.id() == Some(id)).map(|record| {
            let mut document = stored(record);
            document.extend(status_changes(status, Utc::now()));
            *record = bson::from_document(document).unwrap();
            record.clone()
        }))
    }
}

/// Every call fails as if the database were down.
pub struct FailingLeadRepo;

fn down<T>() -> RepositoryResult<T> {
    Err(RepositoryError::unavailable("connection refused"))
}

#[async_trait]
impl<T: LeadDocument> LeadRepository<T> for FailingLeadRepo {
    async fn create(&self, _record: T) -> RepositoryResult<T> {
        down()
    }

    async fn find_by_id(&self, _id: ObjectId) -> RepositoryResult<Option<T>> {
        down()
    }

    async fn list(&self, _page: u64, _limit: u64) -> RepositoryResult<Vec<T>> {
        down()
    }

    async fn count(&self) -> RepositoryResult<u64> {
        down()
    }

    async fn count_where(&self, _filter: LeadFilter) -> RepositoryResult<u64> {
        down()
    }

    async fn update_status(&self, _id: ObjectId, _status: LeadStatus) -> RepositoryResult<Option<T>> {
        down()
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    pub users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        user.id = Some(ObjectId::new());
        self.users.lock().push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().iter().find(|u| u.email == email).cloned())
    }
}

/// Records every outgoing message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().push(message);
        Ok(())
    }
}

pub struct StubStore {
    pub healthy: bool,
}

#[async_trait]
impl StoreHealth for StubStore {
    async fn ping(&self) -> RepositoryResult<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(RepositoryError::unavailable("server selection timeout"))
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub enquiries: Arc<MemoryLeadRepo<Enquiry>>,
    pub contacts: Arc<MemoryLeadRepo<Contact>>,
    pub users: Arc<MemoryUsers>,
    pub mailer: Arc<RecordingMailer>,
    pub jwt: JwtTokenUtilsImpl,
}

pub struct TestAppBuilder {
    store_healthy: bool,
    failing_store: bool,
    rate_limit: RateLimitConfig,
    environment: AppEnvironment,
}

impl TestAppBuilder {
    pub fn store_down(mut self) -> Self {
        self.store_healthy = false;
        self
    }

    pub fn failing_repositories(mut self) -> Self {
        self.failing_store = true;
        self
    }

    /// Key clients on `X-Forwarded-For`, as when deployed behind a proxy.
    pub fn trust_proxy(mut self) -> Self {
        self.rate_limit.trust_proxy = true;
        self
    }

    pub fn environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn build(self) -> TestApp {
        let enquiries = Arc::new(MemoryLeadRepo::<Enquiry>::new());
        let contacts = Arc::new(MemoryLeadRepo::<Contact>::new());
        let users = Arc::new(MemoryUsers::default());
        let mailer = Arc::new(RecordingMailer::default());
        let (enquiry_repo, contact_repo): (Arc<dyn LeadRepository<Enquiry>>, Arc<dyn LeadRepository<Contact>>) =
            if self.failing_store {
                (Arc::new(FailingLeadRepo) as Arc<dyn LeadRepository<Enquiry>>, Arc::new(FailingLeadRepo) as Arc<dyn LeadRepository<Contact>>)
            } else {
                (
                    enquiries.clone() as Arc<dyn LeadRepository<Enquiry>>,
                    contacts.clone() as Arc<dyn LeadRepository<Contact>>,
                )
            };

        let router = build_router(AppState {
            enquiry_repo,
            contact_repo,
            user_repo: users.clone(),
            notifier: Arc::new(EmailNotifier::new(mailer.clone(), OPERATOR_EMAIL)),
            store: Arc::new(StubStore { healthy: self.store_healthy }),
            limiter: Arc::new(RateLimiter::in_memory(&self.rate_limit)),
            jwt_config: JwtConfig::default(),
            environment: self.environment,
            allowed_origins: vec!["http://localhost:5173".to_string()],
        });

        TestApp {
            router,
            enquiries,
            contacts,
            users,
            mailer,
            jwt: JwtTokenUtilsImpl::new(JwtConfig::default()),
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            store_healthy: true,
            failing_store: false,
            rate_limit: RateLimitConfig::default(),
            environment: AppEnvironment::Production,
        }
    }

    pub fn new() -> TestApp {
        Self::builder().build()
    }

    /// Bearer header value for a token pair issued with `role`.
    pub fn bearer(&self, role: &str) -> String {
        let tokens = self
            .jwt
            .generate_token_pair(&Subject { user_id: "test-admin", email: "admin@bcm.test", role }, None)
            .unwrap();
        format!("Bearer {}", tokens.access_token)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, headers, body)
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, HeaderMap, Value) {
        self.send(json_request("POST", uri, body, None)).await
    }

    pub async fn admin_get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", self.bearer("admin"))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    pub async fn admin_put(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        let (status, _, body) = self.send(json_request("PUT", uri, body, Some(&self.bearer("admin")))).await;
        (status, body)
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Attach the socket peer the server would see for this request.
pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub fn with_forwarded_for(mut request: Request<Body>, value: &str) -> Request<Body> {
    request.headers_mut().insert("x-forwarded-for", value.parse().unwrap());
    request
}

pub fn enquiry(name: &str) -> Enquiry {
    Enquiry {
        id: None,
        full_name: name.to_string(),
        email: "asha@example.com".to_string(),
        phone: "+91 98765 43210".to_string(),
        location: Some("Mumbai".to_string()),
        interested_in: Some("Skyline Towers".to_string()),
        budget: Some("1cr-2cr".to_string()),
        message: None,
        project_name: None,
        status: LeadStatus::Pending,
        created_at: None,
        updated_at: None,
    }
}

pub fn contact(name: &str) -> Contact {
    Contact {
        id: None,
        name: name.to_string(),
        email: "jane@x.com".to_string(),
        phone: None,
        service: "Interior Design".to_string(),
        message: "Need a kitchen remodel quote please.".to_string(),
        status: LeadStatus::Pending,
        created_at: None,
        updated_at: None,
    }
}
