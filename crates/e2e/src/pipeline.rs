//! Ordered pipeline of named test steps
//!
//! A step declares which facts it reads and which it publishes. The pipeline
//! checks at construction that every requirement is published by an earlier
//! step, so a misordered or incomplete pipeline never sends a request.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;

use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::context::{Fact, RunContext};
use crate::error::{HarnessError, HarnessResult};

/// What the runner does when a required fact is absent at run time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Record a precondition failure
    #[default]
    Fail,
    /// Record the step as skipped
    Skip,
}

#[async_trait]
pub trait Step: Send + Sync {
    /// Display name, unique within a pipeline
    fn name(&self) -> &'static str;

    fn requires(&self) -> &'static [Fact] {
        &[]
    }

    fn provides(&self) -> &'static [Fact] {
        &[]
    }

    fn on_missing(&self) -> MissingPolicy {
        MissingPolicy::Fail
    }

    /// Run even after a failure in fail-fast mode
    fn always_run(&self) -> bool {
        false
    }

    /// Execute against the service and return the updated context
    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext>;
}

/// Static description of a step, for listings
#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    pub name: &'static str,
    pub requires: Vec<Fact>,
    pub provides: Vec<Fact>,
}

pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.steps.iter().map(|s| s.name())).finish()
    }
}

impl Pipeline {
    /// Build a pipeline, rejecting duplicate names and unmet requirements
    pub fn new(steps: Vec<Box<dyn Step>>) -> HarnessResult<Self> {
        let mut names = HashSet::new();
        let mut available = HashSet::new();

        for step in &steps {
            if !names.insert(step.name()) {
                return Err(HarnessError::Pipeline(format!(
                    "duplicate step name '{}'",
                    step.name()
                )));
            }
            for fact in step.requires() {
                if !available.contains(fact) {
                    return Err(HarnessError::Pipeline(format!(
                        "step '{}' requires {} but no earlier step provides it",
                        step.name(),
                        fact
                    )));
                }
            }
            available.extend(step.provides().iter().copied());
        }

        Ok(Self { steps })
    }

    /// Keep only the named steps, in pipeline order, and re-validate
    pub fn select(self, names: &[String]) -> HarnessResult<Self> {
        for name in names {
            if !self.steps.iter().any(|s| s.name() == name) {
                return Err(HarnessError::Pipeline(format!("unknown step '{}'", name)));
            }
        }
        let steps = self
            .steps
            .into_iter()
            .filter(|s| names.iter().any(|n| n == s.name()))
            .collect();
        Self::new(steps)
    }

    pub fn steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn describe(&self) -> Vec<StepInfo> {
        self.steps
            .iter()
            .map(|s| StepInfo {
                name: s.name(),
                requires: s.requires().to_vec(),
                provides: s.provides().to_vec(),
            })
            .collect()
    }
}
