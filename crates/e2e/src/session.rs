//! Actor identities and the credentials they accumulate during a run

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::{E2eError, E2eResult};

/// Who is acting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Learner,
    LearnerMinor,
    Guardian,
    Admin,
}

impl Role {
    /// Role name as the auth service expects it at registration
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::Learner | Role::LearnerMinor => "LEARNER",
            Role::Guardian => "GUARDIAN",
            Role::Admin => "ADMIN",
        }
    }
}

/// The distinct actors a run drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Admin,
    Minor,
    Teen,
    Guardian,
    Learner,
}

impl Actor {
    pub fn role(&self) -> Role {
        match self {
            Actor::Admin => Role::Admin,
            Actor::Minor => Role::LearnerMinor,
            Actor::Teen | Actor::Learner => Role::Learner,
            Actor::Guardian => Role::Guardian,
        }
    }

    /// Username/email prefix for accounts registered by this actor
    pub fn account_prefix(&self) -> &'static str {
        match self {
            Actor::Admin => "admin",
            Actor::Minor => "young",
            Actor::Teen => "teen",
            Actor::Guardian => "guardian",
            Actor::Learner => "learner",
        }
    }
}

/// Keys under which sessions keep identifiers they derived
pub mod keys {
    pub const VAULT_ID: &str = "vaultId";
    pub const CHALLENGE_QUEST_ID: &str = "challengeQuestId";
    pub const QUIZ_QUEST_ID: &str = "quizQuestId";
    pub const LESSON_QUEST_ID: &str = "lessonQuestId";
    pub const SUBMISSION_ID: &str = "submissionId";
}

/// Registration payload for a fresh account
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub username: String,
    pub role: &'static str,
    pub age: u32,
}

impl Registration {
    /// A collision-free account for `actor`, unique per run suffix
    pub fn unique(actor: Actor, age: u32, password: &str, suffix: &str) -> Self {
        let username = format!("{}{}", actor.account_prefix(), suffix);
        Self {
            email: format!("{}@test.com", username),
            password: password.to_string(),
            username,
            role: actor.role().wire_name(),
            age,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "email": self.email,
            "password": self.password,
            "username": self.username,
            "role": self.role,
            "age": self.age,
        })
    }

    pub fn login_json(&self) -> Value {
        json!({ "email": self.email, "password": self.password })
    }
}

/// One actor's state within a run
///
/// Sessions never reference each other; linking between actors happens by
/// passing identifier values in request payloads.
#[derive(Debug, Clone, Serialize)]
pub struct ActorSession {
    pub role: Role,
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub derived: BTreeMap<String, String>,
}

impl ActorSession {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            username: None,
            email: None,
            token: None,
            user_id: None,
            derived: BTreeMap::new(),
        }
    }

    pub fn for_registration(role: Role, registration: &Registration) -> Self {
        Self {
            username: Some(registration.username.clone()),
            email: Some(registration.email.clone()),
            ..Self::new(role)
        }
    }

    pub fn authenticate(&mut self, token: impl Into<String>, user_id: Option<String>) {
        self.token = Some(token.into());
        if user_id.is_some() {
            self.user_id = user_id;
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Bearer token, or a `MissingPrecondition` naming the step that needed it
    pub fn require_token(&self, step: &str) -> E2eResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| E2eError::missing(step, &format!("{:?} bearer token", self.role)))
    }

    pub fn set_derived(&mut self, key: &str, id: impl Into<String>) {
        self.derived.insert(key.to_string(), id.into());
    }

    pub fn derived(&self, key: &str) -> Option<&str> {
        self.derived.get(key).map(String::as_str)
    }
}
