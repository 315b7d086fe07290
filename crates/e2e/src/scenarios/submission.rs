//! Code submission and asynchronous grading
//!
//! The gateway only acknowledges receipt; grading happens in the background.
//! Completion is observed with a bounded poll on the submission resource.

use serde_json::json;
use tracing::info;

use super::{paths, StepEnv};
use crate::context::ScenarioContext;
use crate::error::{E2eError, E2eResult};
use crate::poll::{poll_until, Probe};
use crate::session::{keys, Actor};
use crate::transport::{id_string, ApiRequest, ApiResponse};

/// Receipt of a submission, graded or not
pub const SUBMISSION_ACCEPTED: &[u16] = &[200, 201, 202];

/// Grading states that mean "still working on it"
pub const IN_FLIGHT_STATUSES: &[&str] = &["PENDING", "QUEUED", "RUNNING"];

const SUBMIT_STEP: &str = "Submit Code Challenge";
const GRADING_STEP: &str = "Grading Completed";

pub async fn run(env: &StepEnv<'_>, ctx: &mut ScenarioContext) -> E2eResult<()> {
    let token = match ctx.require_token(Actor::Teen, SUBMIT_STEP) {
        Ok(token) => token,
        Err(e) => {
            ctx.skip(SUBMIT_STEP, &e);
            return Ok(());
        }
    };
    let Some(quest_id) = ctx.shared(keys::CHALLENGE_QUEST_ID).map(str::to_string) else {
        let missing = E2eError::missing(SUBMIT_STEP, "code challenge quest id");
        ctx.skip(SUBMIT_STEP, &missing);
        return Ok(());
    };

    let response = env
        .transport
        .send(
            ApiRequest::post(paths::SUBMISSIONS)
                .bearer(token.clone())
                .json(json!({
                    "questId": quest_id,
                    "source": "function sortOrbs(orbs) { return orbs.sort(); }",
                    "language": "javascript",
                    "testCases": [],
                })),
        )
        .await;

    if !response.status_in(SUBMISSION_ACCEPTED) {
        ctx.reject(SUBMIT_STEP, &response, SUBMISSION_ACCEPTED);
        return Ok(());
    }
    ctx.pass(
        SUBMIT_STEP,
        response.status,
        format!("Status: {} Body: {}", response.status, response.body),
    );

    let Some(submission_id) = acknowledged_id(&response) else {
        let missing = E2eError::missing(GRADING_STEP, "submission id in acknowledgement");
        ctx.skip(GRADING_STEP, &missing);
        return Ok(());
    };
    if let Some(session) = ctx.session_mut(Actor::Teen) {
        session.set_derived(keys::SUBMISSION_ID, submission_id.clone());
    }

    await_grading(env, ctx, &token, &submission_id).await;
    Ok(())
}

fn acknowledged_id(response: &ApiResponse) -> Option<String> {
    let body = response.body.json()?;
    body.get("submissionId")
        .and_then(id_string)
        .or_else(|| body.get("id").and_then(id_string))
}

async fn await_grading(env: &StepEnv<'_>, ctx: &mut ScenarioContext, token: &str, submission_id: &str) {
    let transport = env.transport;
    let path = format!("{}/{}", paths::SUBMISSIONS, submission_id);

    let outcome = poll_until(&env.config.grading_poll, "grading", |_| {
        let request = ApiRequest::get(path.clone()).bearer(token);
        async move {
            let response = transport.send(request).await;
            if response.status != 200 {
                return Probe::Pending(format!("HTTP {}", response.status));
            }
            match response.body.str_at("/status") {
                Some(status) if !IN_FLIGHT_STATUSES.contains(&status) => {
                    Probe::Ready((response.status, status.to_string()))
                }
                Some(status) => Probe::Pending(status.to_string()),
                None => Probe::Pending("no status field".to_string()),
            }
        }
    })
    .await;

    match outcome {
        Ok(((http_status, grading_status), attempts)) => {
            info!("Submission {} graded as {} after {} probe(s)", submission_id, grading_status, attempts);
            ctx.pass(
                GRADING_STEP,
                http_status,
                format!("Status: {} after {} attempt(s)", grading_status, attempts),
            );
        }
        Err(e) => ctx.fail(GRADING_STEP, 0, e.to_string()),
    }
}
