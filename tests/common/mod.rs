#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use blog_api::auth::{generate_jwt, Claims};
use blog_api::config::{AppConfig, Environment};
use blog_api::database::models::{Comment, CommentChanges, NewComment, NewPost, Post, PostChanges, PostFilter};
use blog_api::database::query::{PageRequest, PostSort};
use blog_api::database::{MemoryStore, Store, StoreError};
use blog_api::AppState;

pub const SECRET: &str = "integration-test-secret";

/// Memory store that counts every call, so tests can prove a request
/// never reached the store
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn find_posts(&self, filter: &PostFilter, sort: Option<PostSort>, page: PageRequest) -> Result<Vec<Post>, StoreError> {
        self.hit();
        self.inner.find_posts(filter, sort, page).await
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, StoreError> {
        self.hit();
        self.inner.count_posts(filter).await
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        self.hit();
        self.inner.find_post(id).await
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        self.hit();
        self.inner.create_post(post).await
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        self.hit();
        self.inner.update_post(id, changes).await
    }

    async fn delete_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        self.hit();
        self.inner.delete_post(id).await
    }

    async fn find_comments(&self, post: Uuid, page: PageRequest) -> Result<Vec<Comment>, StoreError> {
        self.hit();
        self.inner.find_comments(post, page).await
    }

    async fn count_comments(&self, post: Uuid) -> Result<u64, StoreError> {
        self.hit();
        self.inner.count_comments(post).await
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        self.hit();
        self.inner.find_comment(id).await
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        self.hit();
        self.inner.create_comment(comment).await
    }

    async fn update_comment(&self, id: Uuid, changes: CommentChanges) -> Result<Option<Comment>, StoreError> {
        self.hit();
        self.inner.update_comment(id, changes).await
    }

    async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        self.hit();
        self.inner.delete_comment(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.hit();
        self.inner.ping().await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    /// Every body must be an envelope whose flags agree with the status line
    pub fn assert_envelope(&self) {
        assert_eq!(self.body["statusCode"].as_u64(), Some(u64::from(self.status.as_u16())), "statusCode mismatch: {}", self.body);
        assert_eq!(self.body["success"].as_bool(), Some(self.status.as_u16() < 400), "success mismatch: {}", self.body);
        assert!(self.body.get("data").is_some(), "missing data field: {}", self.body);
        assert!(self.body["message"].is_string(), "missing message: {}", self.body);
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub user_id: Uuid,
    pub token: String,
}

pub fn test_config(environment: Environment) -> AppConfig {
    let mut config = AppConfig::development();
    config.environment = environment;
    config.security.jwt_secret = SECRET.to_string();
    config
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(Environment::Production))
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(CountingStore::default());
        let router = blog_api::app(AppState::new(store.clone(), config));
        let user_id = Uuid::new_v4();
        let token = token_for(user_id);
        Self {
            router,
            store,
            user_id,
            token,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        send_to(&self.router, request).await
    }

    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        self.send(Request::get(path).body(Body::empty())?).await
    }

    /// Authenticated JSON request with this app's token
    pub async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<TestResponse> {
        let token = self.token.clone();
        self.call_as(method, path, body, Some(&token)).await
    }

    pub async fn call_as(&self, method: Method, path: &str, body: Option<Value>, token: Option<&str>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    /// Create a post and return its id
    pub async fn create_post(&self, title: &str, content: &str) -> Result<String> {
        let res = self
            .call(Method::POST, "/posts", Some(serde_json::json!({ "title": title, "content": content })))
            .await?;
        assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.body);
        res.data()["id"].as_str().map(str::to_string).context("created post has no id")
    }

    pub async fn create_comment(&self, post_id: &str, content: &str) -> Result<String> {
        let res = self
            .call(Method::POST, &format!("/posts/{}/comments", post_id), Some(serde_json::json!({ "content": content })))
            .await?;
        assert_eq!(res.status, StatusCode::CREATED, "comment failed: {}", res.body);
        res.data()["id"].as_str().map(str::to_string).context("created comment has no id")
    }
}

/// Drive one request through `router` and check the envelope invariants
pub async fn send_to(router: &Router, request: Request<Body>) -> Result<TestResponse> {
    let response = router.clone().oneshot(request).await.context("router failed")?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = serde_json::from_slice(&bytes)
        .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?;
    let response = TestResponse { status, body };
    response.assert_envelope();
    Ok(response)
}

pub fn token_for(user_id: Uuid) -> String {
    generate_jwt(&Claims::new(user_id, 1), SECRET).expect("token generation")
}
