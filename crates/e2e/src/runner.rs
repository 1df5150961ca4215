//! Test runner that executes a pipeline and collects results

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::client::ApiClient;
use crate::config::{new_run_id, HarnessConfig, RunMode};
use crate::context::RunContext;
use crate::error::{HarnessError, HarnessResult};
use crate::pipeline::{MissingPolicy, Pipeline, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of running a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    /// Failure message, or the reason a step was skipped
    pub error: Option<String>,
}

/// Result of running a whole pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub run_id: String,
    pub base_url: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub requests: usize,
    pub results: Vec<TestResult>,
    /// Context as left by the last step
    pub context: RunContext,
}

impl TestSuiteResult {
    /// True when nothing failed
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn result(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Sequential pipeline runner
pub struct TestRunner {
    config: HarnessConfig,
    client: ApiClient,
    run_id: String,
    output_dir: PathBuf,
}

impl TestRunner {
    pub fn new(mut config: HarnessConfig) -> HarnessResult<Self> {
        config.normalize();
        config.validate()?;
        let client = ApiClient::new(&config)?;
        Ok(Self {
            config,
            client,
            run_id: new_run_id(),
            output_dir: PathBuf::from("test-results"),
        })
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Run every step in order, threading the context from one to the next
    pub async fn run(&mut self, pipeline: &Pipeline) -> TestSuiteResult {
        let start = Instant::now();
        let mut ctx = RunContext::new(self.run_id.clone(), &self.config.fixtures);
        let mut results = Vec::with_capacity(pipeline.len());
        let mut halted = false;

        info!(
            "Running {} test(s) against {} with unique run identifier: {}",
            pipeline.len(),
            self.config.base_url,
            self.run_id
        );

        for step in pipeline.steps() {
            let result = if halted && !step.always_run() {
                skipped_result(step.name(), "not run after an earlier failure")
            } else {
                let (result, next) = self.run_step(&**step, &ctx).await;
                if let Some(next) = next {
                    ctx = next;
                }
                result
            };

            match result.status {
                StepStatus::Passed => info!("✓ {} ({} ms)", result.name, result.duration_ms),
                StepStatus::Skipped => info!(
                    "- {} skipped: {}",
                    result.name,
                    result.error.as_deref().unwrap_or("no reason given")
                ),
                StepStatus::Failed => {
                    error!(
                        "✗ {} - {}",
                        result.name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                    if self.config.mode == RunMode::FailFast {
                        halted = true;
                    }
                }
            }

            results.push(result);
        }

        let count = |status: StepStatus| results.iter().filter(|r| r.status == status).count();
        let passed = count(StepStatus::Passed);
        let failed = count(StepStatus::Failed);
        let skipped = count(StepStatus::Skipped);
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        TestSuiteResult {
            run_id: self.run_id.clone(),
            base_url: self.config.base_url.clone(),
            total: results.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            requests: self.client.history().len(),
            results,
            context: ctx,
        }
    }

    async fn run_step(&mut self, step: &dyn Step, ctx: &RunContext) -> (TestResult, Option<RunContext>) {
        let start = Instant::now();
        debug!("Running step: {}", step.name());

        if let Some(fact) = step.requires().iter().copied().find(|f| !ctx.has(*f)) {
            let reason = HarnessError::MissingPrerequisite {
                step: step.name().to_string(),
                fact,
            }
            .to_string();
            let result = match step.on_missing() {
                MissingPolicy::Skip => skipped_result(step.name(), &reason),
                MissingPolicy::Fail => TestResult {
                    name: step.name().to_string(),
                    status: StepStatus::Failed,
                    duration_ms: 0,
                    error: Some(reason),
                },
            };
            return (result, None);
        }

        let outcome = step.run(&mut self.client, ctx, &self.config).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(next) => (
                TestResult {
                    name: step.name().to_string(),
                    status: StepStatus::Passed,
                    duration_ms,
                    error: None,
                },
                Some(next),
            ),
            Err(e) => (
                TestResult {
                    name: step.name().to_string(),
                    status: StepStatus::Failed,
                    duration_ms,
                    error: Some(e.to_string()),
                },
                None,
            ),
        }
    }

    /// Write results to `test-results.json` in the output directory
    pub fn write_results(&self, results: &TestSuiteResult) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn skipped_result(name: &str, reason: &str) -> TestResult {
    TestResult {
        name: name.to_string(),
        status: StepStatus::Skipped,
        duration_ms: 0,
        error: Some(reason.to_string()),
    }
}
