//! In-process mock of the platform gateway
//!
//! Implements just enough of the auth, content, submission and guardian
//! contracts for the scenarios to run, with switches to make individual
//! services misbehave.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::{Mutex, MutexGuard};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use vaultcheck_e2e::config::PollPolicy;
use vaultcheck_e2e::ScenarioConfig;

pub const ADMIN_EMAIL: &str = "admin@techvaultkids.io";
pub const ADMIN_PASSWORD: &str = "admin123";

/// What a pending-consent account gets back from login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingLogin {
    Forbidden,
    ServerError,
    OkAsLearner,
    /// 200 for an account already marked ACTIVE, consent gate ignored
    OkAsActiveLearner,
    OkAsAdmin,
}

#[derive(Debug, Clone)]
pub struct GatewayBehavior {
    pub admin_login_ok: bool,
    /// Refuse vault creation as if the slug were taken
    pub vault_conflict: bool,
    pub pending_login: PendingLogin,
    /// Grading reports COMPLETED from this poll on; `None` never completes
    pub grading_after: Option<u32>,
    /// Quest types whose creation fails with 500
    pub failing_quest_types: Vec<&'static str>,
    /// Acknowledge guardian links without persisting them
    pub drop_links: bool,
}

impl Default for GatewayBehavior {
    fn default() -> Self {
        Self {
            admin_login_ok: true,
            vault_conflict: false,
            pending_login: PendingLogin::Forbidden,
            grading_after: Some(2),
            failing_quest_types: Vec::new(),
            drop_links: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub status: String,
}

impl User {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "displayName": self.username,
            "role": self.role,
        })
    }
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    pub users: HashMap<String, User>,
    pub tokens: HashMap<String, String>,
    pub vaults: Vec<Value>,
    pub quests: Vec<Value>,
    pub submission_polls: HashMap<String, u32>,
    pub consent_requests: Vec<(String, String)>,
    /// guardian email -> linked learner usernames
    pub links: HashMap<String, Vec<String>>,
    pub roster_reads: u32,
    /// `vaultId` values received by the quest listing, decoded
    pub quest_queries: Vec<String>,
}

impl Store {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn issue_token(&mut self, user: &User) -> String {
        let token = format!("token-{}", user.id);
        self.tokens.insert(token.clone(), user.email.clone());
        token
    }

    fn caller(&self, headers: &HeaderMap) -> Option<User> {
        let token = headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let email = self.tokens.get(token)?;
        self.users.get(email).cloned()
    }

    pub fn add_vault(&mut self, vault: Value) {
        self.vaults.push(vault);
    }

    pub fn add_quest(&mut self, quest: Value) {
        self.quests.push(quest);
    }
}

pub struct GatewayState {
    behavior: GatewayBehavior,
    store: Mutex<Store>,
}

type Shared = State<Arc<GatewayState>>;

pub struct MockGateway {
    pub addr: SocketAddr,
    state: Arc<GatewayState>,
}

impl MockGateway {
    pub async fn start(behavior: GatewayBehavior) -> Self {
        let mut store = Store::default();
        let admin = User {
            id: "admin-0".to_string(),
            email: ADMIN_EMAIL.to_string(),
            username: "admin".to_string(),
            password: ADMIN_PASSWORD.to_string(),
            role: "ADMIN".to_string(),
            status: "ACTIVE".to_string(),
        };
        store.users.insert(admin.email.clone(), admin);

        let state = Arc::new(GatewayState {
            behavior,
            store: Mutex::new(store),
        });

        let app = Router::new()
            .route("/api/auth/register", post(register_handler))
            .route("/api/auth/login", post(login_handler))
            .route("/api/auth/consent-request", post(consent_handler))
            .route("/api/users/me", get(profile_handler))
            .route("/api/vaults", get(public_vaults_handler))
            .route("/api/quests", get(quests_handler))
            .route("/api/admin/vaults", get(admin_list_vaults_handler).post(admin_create_vault_handler))
            .route("/api/admin/quests", post(admin_create_quest_handler))
            .route("/api/submissions", post(submit_handler))
            .route("/api/submissions/:submission_id", get(submission_status_handler))
            .route(
                "/api/guardians/me/learners",
                get(list_learners_handler).post(link_learner_handler),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock gateway");
        let addr = listener.local_addr().expect("mock gateway addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock gateway serve");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Config pointing at this gateway with a fast grading poll
    pub fn config(&self) -> ScenarioConfig {
        ScenarioConfig {
            base_url: self.base_url(),
            request_timeout_ms: 5_000,
            grading_poll: PollPolicy {
                max_attempts: 3,
                interval_ms: 10,
            },
            ..Default::default()
        }
    }

    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.state.store.lock()
    }
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    reply(StatusCode::UNAUTHORIZED, json!({"message": "Unauthorized"}))
}

fn field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or_default()
}

async fn register_handler(State(state): Shared, Json(body): Json<Value>) -> Response {
    let mut store = state.store.lock();
    let email = field(&body, "email").to_string();
    if store.users.contains_key(&email) {
        return reply(StatusCode::CONFLICT, json!({"message": "Email already registered"}));
    }
    let age = body.get("age").and_then(Value::as_u64).unwrap_or(0);
    let user = User {
        id: store.next("user"),
        email: email.clone(),
        username: field(&body, "username").to_string(),
        password: field(&body, "password").to_string(),
        role: field(&body, "role").to_string(),
        status: if age < 13 { "PENDING_CONSENT" } else { "ACTIVE" }.to_string(),
    };
    let token = store.issue_token(&user);
    let response = json!({ "token": token, "user": user.to_json() });
    store.users.insert(email, user);
    reply(StatusCode::CREATED, response)
}

async fn login_handler(State(state): Shared, Json(body): Json<Value>) -> Response {
    let mut store = state.store.lock();
    let Some(user) = store.users.get(field(&body, "email")).cloned() else {
        return unauthorized();
    };
    if user.password != field(&body, "password") {
        return unauthorized();
    }
    if user.role == "ADMIN" && !state.behavior.admin_login_ok {
        return reply(StatusCode::UNAUTHORIZED, json!({"message": "Invalid email or password"}));
    }

    if user.status == "PENDING_CONSENT" {
        return match state.behavior.pending_login {
            PendingLogin::Forbidden => reply(
                StatusCode::FORBIDDEN,
                json!({"message": "Account is pending guardian consent."}),
            ),
            PendingLogin::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Account is pending guardian consent.",
            )
                .into_response(),
            PendingLogin::OkAsLearner => {
                let token = store.issue_token(&user);
                let mut user_json = user.to_json();
                user_json["status"] = json!("PENDING_CONSENT");
                reply(StatusCode::OK, json!({ "token": token, "user": user_json }))
            }
            PendingLogin::OkAsActiveLearner => {
                let token = store.issue_token(&user);
                let mut user_json = user.to_json();
                user_json["status"] = json!("ACTIVE");
                reply(StatusCode::OK, json!({ "token": token, "user": user_json }))
            }
            PendingLogin::OkAsAdmin => {
                let token = store.issue_token(&user);
                let mut user_json = user.to_json();
                user_json["role"] = json!("ADMIN");
                reply(StatusCode::OK, json!({ "token": token, "user": user_json }))
            }
        };
    }

    let token = store.issue_token(&user);
    reply(StatusCode::OK, json!({ "token": token, "user": user.to_json() }))
}

async fn consent_handler(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut store = state.store.lock();
    let Some(user) = store.caller(&headers) else {
        return unauthorized();
    };
    store
        .consent_requests
        .push((user.email, field(&body, "parentEmail").to_string()));
    StatusCode::OK.into_response()
}

async fn profile_handler(State(state): Shared, headers: HeaderMap) -> Response {
    let store = state.store.lock();
    match store.caller(&headers) {
        Some(user) => reply(StatusCode::OK, user.to_json()),
        None => unauthorized(),
    }
}

async fn public_vaults_handler(State(state): Shared) -> Response {
    let store = state.store.lock();
    reply(StatusCode::OK, Value::Array(store.vaults.clone()))
}

async fn quests_handler(State(state): Shared, Query(params): Query<HashMap<String, String>>) -> Response {
    let mut store = state.store.lock();
    let vault_id = params.get("vaultId").cloned().unwrap_or_default();
    store.quest_queries.push(vault_id.clone());
    let quests: Vec<Value> = store
        .quests
        .iter()
        .filter(|q| field(q, "vaultId") == vault_id)
        .cloned()
        .collect();
    reply(StatusCode::OK, Value::Array(quests))
}

fn require_admin(store: &Store, headers: &HeaderMap) -> Result<User, Response> {
    match store.caller(headers) {
        Some(user) if user.role == "ADMIN" => Ok(user),
        Some(_) => Err(reply(StatusCode::FORBIDDEN, json!({"message": "Admin role required"}))),
        None => Err(unauthorized()),
    }
}

async fn admin_list_vaults_handler(State(state): Shared, headers: HeaderMap) -> Response {
    let store = state.store.lock();
    if let Err(denied) = require_admin(&store, &headers) {
        return denied;
    }
    reply(StatusCode::OK, Value::Array(store.vaults.clone()))
}

async fn admin_create_vault_handler(State(state): Shared, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    let mut store = state.store.lock();
    if let Err(denied) = require_admin(&store, &headers) {
        return denied;
    }
    if state.behavior.vault_conflict {
        return (StatusCode::CONFLICT, "Vault slug already exists").into_response();
    }
    body["id"] = json!(store.next("vault"));
    store.vaults.push(body.clone());
    reply(StatusCode::CREATED, body)
}

async fn admin_create_quest_handler(State(state): Shared, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    let mut store = state.store.lock();
    if let Err(denied) = require_admin(&store, &headers) {
        return denied;
    }
    let quest_type = field(&body, "type");
    if state.behavior.failing_quest_types.iter().any(|t| *t == quest_type) {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "quest rejected"}));
    }
    body["id"] = json!(store.next("quest"));
    store.quests.push(body.clone());
    reply(StatusCode::CREATED, body)
}

async fn submit_handler(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut store = state.store.lock();
    if store.caller(&headers).is_none() {
        return unauthorized();
    }
    let submission_id = store.next("submission");
    store.submission_polls.insert(submission_id.clone(), 0);
    reply(
        StatusCode::ACCEPTED,
        json!({
            "submissionId": submission_id,
            "questId": body.get("questId").cloned().unwrap_or(Value::Null),
            "status": "PENDING",
        }),
    )
}

async fn submission_status_handler(
    State(state): Shared,
    headers: HeaderMap,
    Path(submission_id): Path<String>,
) -> Response {
    let mut store = state.store.lock();
    if store.caller(&headers).is_none() {
        return unauthorized();
    }
    let Some(polls) = store.submission_polls.get_mut(&submission_id) else {
        return reply(StatusCode::NOT_FOUND, json!({"message": "Submission not found"}));
    };
    *polls += 1;
    let status = match state.behavior.grading_after {
        Some(after) if *polls >= after => "COMPLETED",
        _ => "PENDING",
    };
    reply(
        StatusCode::OK,
        json!({ "submissionId": submission_id, "status": status }),
    )
}

fn require_guardian(store: &Store, headers: &HeaderMap) -> Result<User, Response> {
    match store.caller(headers) {
        Some(user) if user.role == "GUARDIAN" => Ok(user),
        Some(_) => Err(reply(StatusCode::FORBIDDEN, json!({"message": "Guardian role required"}))),
        None => Err(unauthorized()),
    }
}

async fn link_learner_handler(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut store = state.store.lock();
    let guardian = match require_guardian(&store, &headers) {
        Ok(user) => user,
        Err(denied) => return denied,
    };
    let identifier = field(&body, "learnerIdentifier").to_string();
    let Some(learner) = store
        .users
        .values()
        .find(|u| u.username == identifier || u.email == identifier)
        .cloned()
    else {
        return reply(StatusCode::NOT_FOUND, json!({"message": "Learner not found"}));
    };
    if !state.behavior.drop_links {
        store
            .links
            .entry(guardian.email)
            .or_default()
            .push(learner.username.clone());
    }
    reply(StatusCode::CREATED, learner_json(&learner))
}

async fn list_learners_handler(State(state): Shared, headers: HeaderMap) -> Response {
    let mut store = state.store.lock();
    store.roster_reads += 1;
    let guardian = match require_guardian(&store, &headers) {
        Ok(user) => user,
        Err(denied) => return denied,
    };
    let learners: Vec<Value> = store
        .links
        .get(&guardian.email)
        .into_iter()
        .flatten()
        .filter_map(|username| store.users.values().find(|u| &u.username == username))
        .map(learner_json)
        .collect();
    reply(StatusCode::OK, Value::Array(learners))
}

fn learner_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "displayName": user.username,
        "username": user.username,
        "xp": 0,
        "level": 1,
        "currentStreak": 0,
    })
}
