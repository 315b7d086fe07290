//! VaultCheck scenario validator
//!
//! Drives the learning platform through its HTTP gateway as a black box:
//! - Sequences dependent calls across actors (anonymous, learner, guardian, admin)
//! - Threads bearer tokens and created identifiers from step to step
//! - Observes asynchronous grading with a bounded poll
//! - Records a pass/fail verdict per assertion and one verdict per run
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  for group in [admin_setup, minor_consent, teen_registration│
//! │                submission, guardian_linking, learner_smoke] │
//! │    ├── skip if a dependency did not complete                │
//! │    └── group.run(StepEnv, &mut ScenarioContext)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioContext                                            │
//! │    ├── sessions: Actor -> ActorSession { token, ids }       │
//! │    ├── shared identifiers (challenge quest id)              │
//! │    └── results: [StepResult]                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport (HttpTransport)  -> ApiResponse { status, body } │
//! │  Reporter (console | json | junit) <- RunReport             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod poll;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod session;
pub mod transport;

pub use config::ScenarioConfig;
pub use error::{E2eError, E2eResult};
pub use runner::{RunReport, RunSummary, ScenarioRunner};
pub use scenarios::GroupId;
