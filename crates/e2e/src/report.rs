//! Rendering run reports for people and for CI

use clap::ValueEnum;
use colored::Colorize;
use std::fmt::Write;

use crate::context::StepResult;
use crate::runner::{GroupStatus, RunReport};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// One colored line per step
    #[default]
    Console,
    /// Pretty-printed JSON report
    Json,
    /// JUnit XML, one testsuite per scenario group
    Junit,
}

impl OutputFormat {
    pub fn reporter(&self) -> Box<dyn Reporter> {
        match self {
            OutputFormat::Console => Box::new(ConsoleReporter),
            OutputFormat::Json => Box::new(JsonReporter),
            OutputFormat::Junit => Box::new(JunitReporter),
        }
    }
}

/// Turns a finished run into text; no side effects
pub trait Reporter {
    fn render(&self, report: &RunReport) -> String;
}

pub struct ConsoleReporter;

impl ConsoleReporter {
    fn line(result: &StepResult) -> String {
        let tag = if result.passed {
            "PASS".green()
        } else if result.skipped {
            "SKIP".yellow()
        } else {
            "FAIL".red()
        };
        if result.detail.is_empty() {
            format!("[{}] {}", tag, result.name)
        } else {
            format!("[{}] {} {}", tag, result.name, result.detail)
        }
    }
}

impl Reporter for ConsoleReporter {
    fn render(&self, report: &RunReport) -> String {
        let mut out = String::new();
        for group in &report.groups {
            let _ = writeln!(out, "\n--- Scenario: {} ---", group.title);
            for result in report.results_for(group.group) {
                let _ = writeln!(out, "{}", Self::line(result));
            }
            match &group.status {
                GroupStatus::Completed => {}
                GroupStatus::Aborted { reason } => {
                    let _ = writeln!(out, "{} {}", "aborted:".red().bold(), reason);
                }
                GroupStatus::Skipped { reason } => {
                    let _ = writeln!(out, "{} {}", "skipped:".yellow().bold(), reason);
                }
            }
        }

        let summary = report.summary();
        let verdict = if summary.success {
            "SUCCESS".green().bold()
        } else {
            "FAILURE".red().bold()
        };
        let _ = writeln!(
            out,
            "\n{}: {} passed, {} failed, {} skipped of {} ({} ms)",
            verdict, summary.passed, summary.failed, summary.skipped, summary.total, report.duration_ms
        );
        out
    }
}

pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn render(&self, report: &RunReport) -> String {
        let document = serde_json::json!({
            "summary": report.summary(),
            "report": report,
        });
        serde_json::to_string_pretty(&document).unwrap_or_default()
    }
}

pub struct JunitReporter;

impl Reporter for JunitReporter {
    fn render(&self, report: &RunReport) -> String {
        let summary = report.summary();
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            "<testsuites name=\"vaultcheck\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{:.3}\">",
            summary.total,
            summary.failed,
            summary.skipped,
            report.duration_ms as f64 / 1000.0
        );

        for group in &report.groups {
            let results: Vec<&StepResult> = report.results_for(group.group).collect();
            let failures = results.iter().filter(|r| !r.passed && !r.skipped).count();
            let skipped = results.iter().filter(|r| r.skipped).count();
            let _ = writeln!(
                out,
                "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{:.3}\">",
                xml_escape(group.group.name()),
                results.len(),
                failures,
                skipped,
                group.duration_ms as f64 / 1000.0
            );
            for result in results {
                let _ = write!(
                    out,
                    "    <testcase classname=\"{}\" name=\"{}\"",
                    xml_escape(group.group.name()),
                    xml_escape(&result.name)
                );
                if result.passed {
                    out.push_str("/>\n");
                } else if result.skipped {
                    let _ = writeln!(
                        out,
                        ">\n      <skipped message=\"{}\"/>\n    </testcase>",
                        xml_escape(&result.detail)
                    );
                } else {
                    let _ = writeln!(
                        out,
                        ">\n      <failure message=\"status {}\">{}</failure>\n    </testcase>",
                        result.status,
                        xml_escape(&result.detail)
                    );
                }
            }
            out.push_str("  </testsuite>\n");
        }

        out.push_str("</testsuites>\n");
        out
    }
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if c.is_control() && c != '\n' && c != '\t' => {}
            c => escaped.push(c),
        }
    }
    escaped
}
