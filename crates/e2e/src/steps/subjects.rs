//! Subject creation and retrieval

use async_trait::async_trait;
use serde_json::json;

use super::{created_id, find_index, note, require};
use crate::assertions as check;
use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::context::{Fact, RunContext};
use crate::error::{HarnessError, HarnessResult};
use crate::pipeline::Step;

pub struct CreateSubject;

#[async_trait]
impl Step for CreateSubject {
    fn name(&self) -> &'static str {
        "Create Subject"
    }

    fn provides(&self) -> &'static [Fact] {
        &[Fact::SubjectId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let subject_name = &ctx.subject.subject_name;
        note(config, format!("Creating subject with name: {}", subject_name));

        let resp = client
            .post("subjects", Some(&json!({ "subjectName": subject_name })), Some(201))
            .await?;
        check::status_code(&resp, 201)?;
        check::json_field(&resp, "subjectName", &json!(subject_name))?;

        let id = created_id(&resp, "subject")?;
        note(config, format!("Created subject with ID: {}", id));
        Ok(ctx.with_subject(id))
    }
}

pub struct GetAllSubjects;

#[async_trait]
impl Step for GetAllSubjects {
    fn name(&self) -> &'static str {
        "Get All Subjects"
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let subject_name = &ctx.subject.subject_name;
        note(config, "Getting all subjects");

        let resp = client.get("subjects", Some(200)).await?;
        check::status_code(&resp, 200)?;

        let index = find_index(&resp, "subjectName", |n| n == subject_name).ok_or_else(|| {
            HarnessError::assertion(format!(
                "Test subject '{}' not found in subjects list",
                subject_name
            ))
        })?;
        note(config, format!("Found test subject at index {}", index));
        Ok(ctx.clone())
    }
}

pub struct GetSubjectById;

#[async_trait]
impl Step for GetSubjectById {
    fn name(&self) -> &'static str {
        "Get Subject By ID"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::SubjectId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let subject_id = require(ctx.subject.id, self.name(), Fact::SubjectId)?;
        note(config, format!("Getting subject with ID: {}", subject_id));

        let resp = client.get(&format!("subjects/{}", subject_id), Some(200)).await?;
        check::status_code(&resp, 200)?;
        check::json_field(&resp, "subjectName", &json!(ctx.subject.subject_name))?;
        Ok(ctx.clone())
    }
}
