//! Admin content setup: login, ensure a vault, author quests

use serde_json::{json, Value};
use tracing::{info, warn};

use super::{paths, StepEnv, OK, OK_OR_CREATED};
use crate::context::ScenarioContext;
use crate::error::{E2eError, E2eResult};
use crate::session::{keys, Actor, ActorSession, Role};
use crate::transport::{id_string, ApiRequest};

pub async fn run(env: &StepEnv<'_>, ctx: &mut ScenarioContext) -> E2eResult<()> {
    let token = login(env, ctx).await?;
    let vault_id = ensure_vault(env, ctx, &token).await?;

    let challenge = create_quest(env, ctx, &token, "Create Code Challenge", challenge_payload(&vault_id)).await;
    let quiz = create_quest(env, ctx, &token, "Create Quiz", quiz_payload(&vault_id)).await;
    let lesson = create_quest(env, ctx, &token, "Create Lesson", lesson_payload(&vault_id)).await;

    if let Some(session) = ctx.session_mut(Actor::Admin) {
        for (key, id) in [
            (keys::CHALLENGE_QUEST_ID, &challenge),
            (keys::QUIZ_QUEST_ID, &quiz),
            (keys::LESSON_QUEST_ID, &lesson),
        ] {
            if let Some(id) = id {
                session.set_derived(key, id.clone());
            }
        }
    }
    // Consumed by the submission group
    if let Some(id) = challenge {
        ctx.publish(keys::CHALLENGE_QUEST_ID, id);
    }

    Ok(())
}

async fn login(env: &StepEnv<'_>, ctx: &mut ScenarioContext) -> E2eResult<String> {
    const STEP: &str = "Admin Login";
    let credentials = &env.config.admin;
    let response = env
        .transport
        .send(ApiRequest::post(paths::LOGIN).json(json!({
            "email": credentials.email,
            "password": credentials.password,
        })))
        .await;

    let token = response.body.str_at("/token").map(str::to_string);
    match token {
        Some(token) if response.status_in(OK) => {
            let mut session = ActorSession::new(Role::Admin);
            session.email = Some(credentials.email.clone());
            session.authenticate(token.clone(), response.body.str_at("/user/id").map(str::to_string));
            ctx.insert_session(Actor::Admin, session);
            ctx.pass(STEP, response.status, "");
            Ok(token)
        }
        _ => {
            ctx.reject(STEP, &response, OK);
            Err(E2eError::GroupAborted(format!("admin login returned {}", response.status)))
        }
    }
}

/// Create this run's vault, or adopt the first existing one when creation is refused
async fn ensure_vault(env: &StepEnv<'_>, ctx: &mut ScenarioContext, token: &str) -> E2eResult<String> {
    let suffix = ctx.run_id().to_string();
    let payload = json!({
        "title": format!("Demo Vault {}", suffix),
        "description": "A vault for testing scenarios.",
        "theme": "Space",
        "slug": format!("demo-vault-{}", suffix),
        "category": "Demo",
        "difficulty": "Beginner",
        "status": "PUBLISHED",
        "displayOrder": 1,
    });
    let created = env
        .transport
        .send(ApiRequest::post(paths::ADMIN_VAULTS).bearer(token).json(payload))
        .await;

    let vault_id = match created.resource_id() {
        Some(id) if created.status_in(OK_OR_CREATED) => {
            ctx.pass("Create Vault", created.status, format!("ID: {}", id));
            id
        }
        _ => {
            ctx.reject("Create Vault", &created, OK_OR_CREATED);
            warn!("Vault creation refused, falling back to existing vaults");
            adopt_existing_vault(env, ctx, token).await?
        }
    };

    if let Some(session) = ctx.session_mut(Actor::Admin) {
        session.set_derived(keys::VAULT_ID, vault_id.clone());
    }
    Ok(vault_id)
}

async fn adopt_existing_vault(env: &StepEnv<'_>, ctx: &mut ScenarioContext, token: &str) -> E2eResult<String> {
    const STEP: &str = "Adopt Existing Vault";
    let listed = env
        .transport
        .send(ApiRequest::get(paths::ADMIN_VAULTS).bearer(token))
        .await;

    let first = listed
        .body
        .array()
        .and_then(|vaults| vaults.first())
        .and_then(|vault| vault.get("id"))
        .and_then(id_string);

    match first {
        Some(id) if listed.status_in(OK) => {
            info!("Using existing vault ID: {}", id);
            ctx.pass(STEP, listed.status, format!("ID: {}", id));
            Ok(id)
        }
        _ => {
            ctx.reject(STEP, &listed, OK);
            Err(E2eError::GroupAborted("no vault could be created or adopted".to_string()))
        }
    }
}

/// Quest creation steps are siblings: a failure is recorded, never propagated
async fn create_quest(
    env: &StepEnv<'_>,
    ctx: &mut ScenarioContext,
    token: &str,
    step: &str,
    payload: Value,
) -> Option<String> {
    let response = env
        .transport
        .send(ApiRequest::post(paths::ADMIN_QUESTS).bearer(token).json(payload))
        .await;

    match response.resource_id() {
        Some(id) if response.status_in(OK_OR_CREATED) => {
            ctx.pass(step, response.status, format!("ID: {}", id));
            Some(id)
        }
        _ => {
            ctx.reject(step, &response, OK_OR_CREATED);
            None
        }
    }
}

fn challenge_payload(vault_id: &str) -> Value {
    json!({
        "vaultId": vault_id,
        "type": "CODE_CHALLENGE",
        "title": "Sort Orbs",
        "order": 1,
        "xpValue": 100,
        "difficulty": "Easy",
        "worldTheme": "Space",
        "estimatedTime": "10 min",
        "description": "Sort the array of orbs.",
        "language": "javascript",
        "starterCode": "function sortOrbs(orbs) { return []; }",
        "hints": "Use .sort()",
        "gradingStrategy": "UNIT_TEST",
        "testCases": [
            { "input": "[3, 1, 2]", "expectedOutput": "[1, 2, 3]", "hidden": false }
        ],
    })
}

fn quiz_payload(vault_id: &str) -> Value {
    json!({
        "vaultId": vault_id,
        "type": "QUIZ",
        "title": "Orb Knowledge",
        "order": 2,
        "xpValue": 50,
        "difficulty": "Easy",
        "worldTheme": "Space",
        "estimatedTime": "5 min",
        "description": "Test your knowledge.",
    })
}

fn lesson_payload(vault_id: &str) -> Value {
    json!({
        "vaultId": vault_id,
        "type": "LESSON",
        "title": "Orb History",
        "order": 3,
        "xpValue": 10,
        "difficulty": "Beginner",
        "worldTheme": "Space",
        "estimatedTime": "5 min",
        "content": "# The History of Orbs\nOrbs are ancient...",
        "videoUrl": "http://example.com/orb-video",
    })
}
