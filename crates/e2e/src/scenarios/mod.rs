//! Scenario groups: one linear user journey each
//!
//! A group function records a [`StepResult`](crate::context::StepResult) per
//! assertion and returns `Err` only when the journey cannot continue at all.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::context::ScenarioContext;
use crate::error::E2eResult;
use crate::session::Registration;
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub mod admin;
pub mod guardian;
pub mod minor;
pub mod smoke;
pub mod submission;
pub mod teen;

/// Gateway routes consumed by the scenarios
pub mod paths {
    pub const REGISTER: &str = "/api/auth/register";
    pub const LOGIN: &str = "/api/auth/login";
    pub const CONSENT_REQUEST: &str = "/api/auth/consent-request";
    pub const PROFILE: &str = "/api/users/me";
    pub const VAULTS: &str = "/api/vaults";
    pub const QUESTS: &str = "/api/quests";
    pub const ADMIN_VAULTS: &str = "/api/admin/vaults";
    pub const ADMIN_QUESTS: &str = "/api/admin/quests";
    pub const SUBMISSIONS: &str = "/api/submissions";
    pub const GUARDIAN_LEARNERS: &str = "/api/guardians/me/learners";
}

pub const OK: &[u16] = &[200];
pub const CREATED: &[u16] = &[201];
pub const OK_OR_CREATED: &[u16] = &[200, 201];

/// Borrowed collaborators every step needs
pub struct StepEnv<'a> {
    pub transport: &'a dyn Transport,
    pub config: &'a ScenarioConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum GroupId {
    AdminSetup,
    MinorConsent,
    TeenRegistration,
    Submission,
    GuardianLinking,
    LearnerSmoke,
}

impl GroupId {
    /// Fixed execution order
    pub const ORDER: [GroupId; 6] = [
        GroupId::AdminSetup,
        GroupId::MinorConsent,
        GroupId::TeenRegistration,
        GroupId::Submission,
        GroupId::GuardianLinking,
        GroupId::LearnerSmoke,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GroupId::AdminSetup => "admin_setup",
            GroupId::MinorConsent => "minor_consent",
            GroupId::TeenRegistration => "teen_registration",
            GroupId::Submission => "submission",
            GroupId::GuardianLinking => "guardian_linking",
            GroupId::LearnerSmoke => "learner_smoke",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GroupId::AdminSetup => "Admin Content Creation",
            GroupId::MinorConsent => "User < 13 (Consent)",
            GroupId::TeenRegistration => "User >= 13",
            GroupId::Submission => "Submission",
            GroupId::GuardianLinking => "Guardian",
            GroupId::LearnerSmoke => "Learner Smoke",
        }
    }

    /// Groups whose abort makes this one pointless
    pub fn depends_on(&self) -> &'static [GroupId] {
        match self {
            GroupId::Submission => &[GroupId::AdminSetup, GroupId::TeenRegistration],
            GroupId::GuardianLinking => &[GroupId::TeenRegistration],
            _ => &[],
        }
    }

    pub async fn run(&self, env: &StepEnv<'_>, ctx: &mut ScenarioContext) -> E2eResult<()> {
        match self {
            GroupId::AdminSetup => admin::run(env, ctx).await,
            GroupId::MinorConsent => minor::run(env, ctx).await,
            GroupId::TeenRegistration => teen::run(env, ctx).await,
            GroupId::Submission => submission::run(env, ctx).await,
            GroupId::GuardianLinking => guardian::run(env, ctx).await,
            GroupId::LearnerSmoke => smoke::run(env, ctx).await,
        }
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Register `registration` and return the response; shared by every learner-side group
pub(crate) async fn register(env: &StepEnv<'_>, registration: &Registration) -> ApiResponse {
    env.transport
        .send(ApiRequest::post(paths::REGISTER).json(registration.to_json()))
        .await
}
