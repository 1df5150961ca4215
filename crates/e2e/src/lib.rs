//! Learning Navigator API harness
//!
//! Drives the students/subjects/exams HTTP service through an ordered
//! pipeline of named steps and reports pass/fail per step.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TestRunner                            │
//! │    run(pipeline) -> TestSuiteResult                         │
//! │    write_results(result) -> test-results.json               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pipeline: [Step]  (validated: requires ⊆ earlier provides) │
//! │    Step::run(client, &RunContext, config) -> RunContext     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ApiClient (reqwest, history)   assertions (HarnessResult)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod assertions;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod steps;

pub use client::{ApiClient, ApiResponse};
pub use config::{HarnessConfig, RunMode};
pub use context::{Fact, RunContext};
pub use error::{HarnessError, HarnessResult};
pub use pipeline::{Pipeline, Step};
pub use runner::{StepStatus, TestRunner, TestSuiteResult};
