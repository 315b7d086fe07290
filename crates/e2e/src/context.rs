//! Run-scoped state threaded through every step

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::session::{Actor, ActorSession};
use crate::transport::{ApiResponse, Body};

/// Longest response-body excerpt kept in a failure detail
const DETAIL_BODY_LIMIT: usize = 300;

/// Verdict for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub group: String,
    pub name: String,
    pub passed: bool,
    /// Step did not run because something it needed was absent
    #[serde(default)]
    pub skipped: bool,
    pub status: u16,
    pub detail: String,
}

/// Accumulates sessions, shared identifiers and verdicts for one run
pub struct ScenarioContext {
    run_id: String,
    group: String,
    sessions: BTreeMap<Actor, ActorSession>,
    shared: BTreeMap<String, String>,
    results: Vec<StepResult>,
}

impl ScenarioContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            group: String::new(),
            sessions: BTreeMap::new(),
            shared: BTreeMap::new(),
            results: Vec::new(),
        }
    }

    /// Suffix that keeps this run's accounts and slugs unique
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn begin_group(&mut self, group: &str) {
        self.group = group.to_string();
    }

    pub fn session(&self, actor: Actor) -> Option<&ActorSession> {
        self.sessions.get(&actor)
    }

    pub fn session_mut(&mut self, actor: Actor) -> Option<&mut ActorSession> {
        self.sessions.get_mut(&actor)
    }

    pub fn insert_session(&mut self, actor: Actor, session: ActorSession) {
        self.sessions.insert(actor, session);
    }

    /// Bearer token of `actor`, if that actor has authenticated
    pub fn token(&self, actor: Actor) -> Option<String> {
        self.session(actor)?.token.clone()
    }

    pub fn require_token(&self, actor: Actor, step: &str) -> E2eResult<String> {
        match self.session(actor) {
            Some(session) => session.require_token(step).map(str::to_string),
            None => Err(E2eError::missing(step, &format!("{:?} session", actor))),
        }
    }

    pub fn publish(&mut self, key: &str, value: impl Into<String>) {
        self.shared.insert(key.to_string(), value.into());
    }

    pub fn shared(&self, key: &str) -> Option<&str> {
        self.shared.get(key).map(String::as_str)
    }

    pub fn record(&mut self, name: &str, passed: bool, status: u16, detail: impl Into<String>) {
        let detail = detail.into();
        if passed {
            info!("[PASS] {} {}", name, detail);
        } else {
            error!("[FAIL] {} {}", name, detail);
        }
        self.results.push(StepResult {
            group: self.group.clone(),
            name: name.to_string(),
            passed,
            skipped: false,
            status,
            detail,
        });
    }

    pub fn pass(&mut self, name: &str, status: u16, detail: impl Into<String>) {
        self.record(name, true, status, detail);
    }

    pub fn fail(&mut self, name: &str, status: u16, detail: impl Into<String>) {
        self.record(name, false, status, detail);
    }

    /// Record a step that could not run; counts as a failure
    pub fn skip(&mut self, name: &str, reason: &E2eError) {
        warn!("[SKIP] {} {}", name, reason);
        self.results.push(StepResult {
            group: self.group.clone(),
            name: name.to_string(),
            passed: false,
            skipped: true,
            status: 0,
            detail: reason.to_string(),
        });
    }

    /// Record pass/fail from the response status alone
    pub fn check(&mut self, name: &str, response: &ApiResponse, accepted: &[u16]) -> bool {
        let passed = response.status_in(accepted);
        if passed {
            self.pass(name, response.status, format!("Status: {}", response.status));
        } else {
            self.reject(name, response, accepted);
        }
        passed
    }

    /// Record a failed response: either its status is outside `accepted`, or
    /// the status was fine but the body lacked what the step needed.
    pub fn reject(&mut self, name: &str, response: &ApiResponse, accepted: &[u16]) {
        let detail = if response.status_in(accepted) {
            failure_detail(response)
        } else if response.is_transport_failure() {
            status_error(name, response, accepted).to_string()
        } else {
            let error = status_error(name, response, accepted);
            format!("{}; body: {}", error, body_excerpt(&response.body))
        };
        self.fail(name, response.status, detail);
    }

    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<StepResult> {
        self.results
    }
}

/// Error kind for a response outside the accepted statuses
pub fn status_error(step: &str, response: &ApiResponse, accepted: &[u16]) -> E2eError {
    if response.is_transport_failure() {
        E2eError::TransportFailure(response.body.to_string())
    } else {
        E2eError::unexpected(step, response.status, accepted)
    }
}

/// "Status: N Body: ..." with the body truncated
fn failure_detail(response: &ApiResponse) -> String {
    format!("Status: {} Body: {}", response.status, body_excerpt(&response.body))
}

fn body_excerpt(body: &Body) -> String {
    let body = body.to_string();
    if body.chars().count() > DETAIL_BODY_LIMIT {
        let cut: String = body.chars().take(DETAIL_BODY_LIMIT).collect();
        format!("{}...", cut)
    } else {
        body
    }
}
