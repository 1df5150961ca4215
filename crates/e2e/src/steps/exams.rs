//! Exam creation and retrieval
//!
//! The server names an exam after its subject, so exam checks match on the
//! subject name rather than on a name chosen by the harness.

use async_trait::async_trait;
use serde_json::Value;

use super::{created_id, find_index, note, require};
use crate::assertions as check;
use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::context::{Fact, RunContext};
use crate::error::{HarnessError, HarnessResult};
use crate::pipeline::{MissingPolicy, Step};

pub struct CreateExam;

#[async_trait]
impl Step for CreateExam {
    fn name(&self) -> &'static str {
        "Create Exam"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::SubjectId]
    }

    fn provides(&self) -> &'static [Fact] {
        &[Fact::ExamId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let subject_id = require(ctx.subject.id, self.name(), Fact::SubjectId)?;
        note(config, format!("Creating exam for subject with ID: {}", subject_id));

        let resp = client
            .post(&format!("exams/subjects/{}", subject_id), None, Some(201))
            .await?;
        check::status_code(&resp, 201)?;
        check::json_field_contains_text(&resp, "examName", &ctx.subject.subject_name)?;

        let id = created_id(&resp, "exam")?;
        let exam_name = resp
            .json()
            .and_then(|body| body.get("examName"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        note(config, format!("Created exam with ID: {} and name: {}", id, exam_name));
        Ok(ctx.with_exam(id, exam_name))
    }
}

pub struct GetAllExams;

#[async_trait]
impl Step for GetAllExams {
    fn name(&self) -> &'static str {
        "Get All Exams"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::ExamId]
    }

    fn on_missing(&self) -> MissingPolicy {
        MissingPolicy::Skip
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let subject_name = &ctx.subject.subject_name;
        note(config, "Getting all exams");

        let resp = client.get("exams", Some(200)).await?;
        check::status_code(&resp, 200)?;

        let index = find_index(&resp, "examName", |n| n.contains(subject_name.as_str())).ok_or_else(|| {
            HarnessError::assertion(format!(
                "Test exam for subject '{}' not found in exams list",
                subject_name
            ))
        })?;
        note(config, format!("Found test exam at index {}", index));
        Ok(ctx.clone())
    }
}

pub struct GetExamById;

#[async_trait]
impl Step for GetExamById {
    fn name(&self) -> &'static str {
        "Get Exam By ID"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::ExamId]
    }

    fn on_missing(&self) -> MissingPolicy {
        MissingPolicy::Skip
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let exam_id = require(ctx.exam.id, self.name(), Fact::ExamId)?;
        note(config, format!("Getting exam with ID: {}", exam_id));

        let resp = client.get(&format!("exams/{}", exam_id), Some(200)).await?;
        check::status_code(&resp, 200)?;
        check::json_field_contains_text(&resp, "examName", &ctx.subject.subject_name)?;
        Ok(ctx.clone())
    }
}
