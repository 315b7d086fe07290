//! Bounded polling for eventually-consistent results

use std::future::Future;
use tokio::time::sleep;
use tracing::debug;

use crate::config::PollPolicy;
use crate::error::{E2eError, E2eResult};

/// What a single probe observed
#[derive(Debug)]
pub enum Probe<T> {
    Ready(T),
    /// Not there yet; the string says what was seen instead
    Pending(String),
}

/// Probe until ready or `max_attempts` probes have been made.
///
/// Returns the ready value together with the attempt that produced it.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, what: &str, mut probe: F) -> E2eResult<(T, u32)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        attempts += 1;

        match probe(attempts).await {
            Probe::Ready(value) => return Ok((value, attempts)),
            Probe::Pending(seen) => {
                debug!("{} not ready (attempt {}/{}): {}", what, attempts, policy.max_attempts, seen);
            }
        }

        if attempts < policy.max_attempts {
            sleep(policy.interval()).await;
        }
    }

    Err(E2eError::PollTimeout {
        what: what.to_string(),
        attempts,
    })
}
