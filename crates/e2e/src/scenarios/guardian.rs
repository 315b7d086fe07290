//! Guardian registration and linking to the teen learner

use serde_json::json;

use super::{paths, register, StepEnv, CREATED, OK, OK_OR_CREATED};
use crate::context::ScenarioContext;
use crate::error::{E2eError, E2eResult};
use crate::session::{Actor, ActorSession, Registration};
use crate::transport::ApiRequest;

pub const GUARDIAN_AGE: u32 = 40;

const LINK_STEP: &str = "Link Child";
const ROSTER_STEP: &str = "Check Child Progress";

pub async fn run(env: &StepEnv<'_>, ctx: &mut ScenarioContext) -> E2eResult<()> {
    let registration = Registration::unique(
        Actor::Guardian,
        GUARDIAN_AGE,
        &env.config.user_password,
        ctx.run_id(),
    );

    let registered = register(env, &registration).await;
    if !ctx.check("Register Guardian", &registered, CREATED) {
        return Err(E2eError::GroupAborted(format!(
            "guardian registration returned {}",
            registered.status
        )));
    }
    let Some(token) = registered.body.str_at("/token").map(str::to_string) else {
        ctx.reject("Guardian Token", &registered, CREATED);
        return Err(E2eError::GroupAborted("guardian has no token".to_string()));
    };

    let mut session = ActorSession::for_registration(Actor::Guardian.role(), &registration);
    session.authenticate(token.clone(), registered.body.str_at("/user/id").map(str::to_string));
    ctx.insert_session(Actor::Guardian, session);

    // The teen is referenced by username only; the two sessions share nothing else
    let learner = match ctx.session(Actor::Teen).and_then(|s| s.username.clone()) {
        Some(username) => username,
        None => {
            let missing = E2eError::missing(LINK_STEP, "teen username");
            ctx.skip(LINK_STEP, &missing);
            ctx.skip(ROSTER_STEP, &missing);
            return Ok(());
        }
    };

    let linked = env
        .transport
        .send(
            ApiRequest::post(paths::GUARDIAN_LEARNERS)
                .bearer(token.clone())
                .json(json!({ "learnerIdentifier": learner })),
        )
        .await;
    ctx.check(LINK_STEP, &linked, OK_OR_CREATED);

    // Read-after-write: a single immediate read must already show the link
    let roster = env
        .transport
        .send(ApiRequest::get(paths::GUARDIAN_LEARNERS).bearer(token))
        .await;
    if !roster.status_in(OK) {
        ctx.reject(ROSTER_STEP, &roster, OK);
        return Ok(());
    }

    let found = roster
        .body
        .array()
        .map(|learners| {
            learners
                .iter()
                .any(|l| l.get("username").and_then(|u| u.as_str()) == Some(learner.as_str()))
        })
        .unwrap_or(false);
    ctx.record(ROSTER_STEP, found, roster.status, format!("Found: {}", found));

    Ok(())
}
