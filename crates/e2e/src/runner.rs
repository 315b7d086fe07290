//! Scenario runner: executes groups in order and aggregates verdicts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::ScenarioConfig;
use crate::context::{ScenarioContext, StepResult};
use crate::error::{E2eError, E2eResult};
use crate::scenarios::{GroupId, StepEnv};
use crate::transport::{HttpTransport, Transport};

/// How a group ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GroupStatus {
    Completed,
    Aborted { reason: String },
    Skipped { reason: String },
}

impl GroupStatus {
    /// Dependents of a group that did not complete are skipped
    pub fn blocks_dependents(&self) -> bool {
        !matches!(self, GroupStatus::Completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub group: GroupId,
    pub title: String,
    pub status: GroupStatus,
    pub duration_ms: u64,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub groups: Vec<GroupReport>,
    pub results: Vec<StepResult>,
}

/// Totals and the single verdict automation keys off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub incomplete_groups: usize,
    pub success: bool,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let total = self.results.len();
        let passed = self.results.iter().filter(|r| r.passed).count();
        let skipped = self.results.iter().filter(|r| r.skipped).count();
        let failed = total - passed - skipped;
        let incomplete_groups = self
            .groups
            .iter()
            .filter(|g| g.status.blocks_dependents())
            .count();

        RunSummary {
            total,
            passed,
            failed,
            skipped,
            incomplete_groups,
            success: total > 0 && passed == total && incomplete_groups == 0,
        }
    }

    pub fn results_for(&self, group: GroupId) -> impl Iterator<Item = &StepResult> {
        self.results.iter().filter(move |r| r.group == group.name())
    }

    pub fn group(&self, group: GroupId) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.group == group)
    }
}

/// Drives every selected scenario group against one gateway
pub struct ScenarioRunner {
    config: ScenarioConfig,
    transport: Box<dyn Transport>,
    selected: Vec<GroupId>,
}

impl ScenarioRunner {
    /// Runner talking HTTP to `config.base_url`
    pub fn new(config: ScenarioConfig) -> E2eResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.base_url, config.request_timeout())?;
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    pub fn with_transport(config: ScenarioConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            selected: GroupId::ORDER.to_vec(),
        }
    }

    /// Restrict the run to `groups`; execution order stays fixed
    pub fn only(mut self, groups: &[GroupId]) -> Self {
        if !groups.is_empty() {
            self.selected = GroupId::ORDER
                .into_iter()
                .filter(|g| groups.contains(g))
                .collect();
        }
        self
    }

    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = started_at.timestamp_millis().to_string();
        let mut ctx = ScenarioContext::new(run_id.clone());
        let env = StepEnv {
            transport: self.transport.as_ref(),
            config: &self.config,
        };
        let mut groups: Vec<GroupReport> = Vec::new();

        info!(
            "Starting scenario run {} against {} ({} group(s))",
            run_id,
            self.transport.base_url(),
            self.selected.len()
        );

        for &group in &self.selected {
            ctx.begin_group(group.name());
            let group_start = Instant::now();

            let blocked_by = group.depends_on().iter().find(|dep| {
                groups
                    .iter()
                    .any(|g| g.group == **dep && g.status.blocks_dependents())
            });

            let status = if let Some(dep) = blocked_by {
                let reason = format!("dependency '{}' did not complete", dep);
                warn!("--- Scenario: {} --- skipped: {}", group.title(), reason);
                ctx.skip(group.title(), &E2eError::missing(group.name(), &reason));
                GroupStatus::Skipped { reason }
            } else {
                info!("--- Scenario: {} ---", group.title());
                match group.run(&env, &mut ctx).await {
                    Ok(()) => GroupStatus::Completed,
                    Err(e) => {
                        error!("Scenario '{}' aborted: {}", group.title(), e);
                        GroupStatus::Aborted {
                            reason: e.to_string(),
                        }
                    }
                }
            };

            groups.push(GroupReport {
                group,
                title: group.title().to_string(),
                status,
                duration_ms: group_start.elapsed().as_millis() as u64,
            });
        }

        let report = RunReport {
            run_id,
            base_url: self.transport.base_url().to_string(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            groups,
            results: ctx.into_results(),
        };

        let summary = report.summary();
        info!(
            "Scenario results: {} passed, {} failed, {} skipped ({} ms)",
            summary.passed, summary.failed, summary.skipped, report.duration_ms
        );
        report
    }
}
