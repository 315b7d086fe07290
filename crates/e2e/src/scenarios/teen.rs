//! Learner aged 13 or over: registration authenticates immediately

use super::{register, StepEnv, CREATED};
use crate::context::ScenarioContext;
use crate::error::{E2eError, E2eResult};
use crate::session::{Actor, ActorSession, Registration};

pub const TEEN_AGE: u32 = 15;

pub async fn run(env: &StepEnv<'_>, ctx: &mut ScenarioContext) -> E2eResult<()> {
    let registration = Registration::unique(
        Actor::Teen,
        TEEN_AGE,
        &env.config.user_password,
        ctx.run_id(),
    );

    let registered = register(env, &registration).await;
    if !ctx.check("Register > 13", &registered, CREATED) {
        return Err(E2eError::GroupAborted(format!(
            "teen registration returned {}",
            registered.status
        )));
    }

    let token = registered.body.str_at("/token");
    let user_id = registered.body.str_at("/user/id");
    let (token, user_id) = match (token, user_id) {
        (Some(token), Some(user_id)) => (token.to_string(), user_id.to_string()),
        _ => {
            ctx.fail(
                "Teen Credentials",
                registered.status,
                "registration response lacked token or user id",
            );
            return Err(E2eError::GroupAborted("teen has no usable credentials".to_string()));
        }
    };

    let mut session = ActorSession::for_registration(Actor::Teen.role(), &registration);
    session.authenticate(token, Some(user_id.clone()));
    ctx.insert_session(Actor::Teen, session);
    ctx.pass("Teen Credentials", registered.status, format!("User ID: {}", user_id));

    Ok(())
}
