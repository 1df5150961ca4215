//! Student creation, enrollment and retrieval

use async_trait::async_trait;
use serde_json::json;

use super::{created_id, find_index, note, require};
use crate::assertions as check;
use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::context::{Fact, RunContext};
use crate::error::{HarnessError, HarnessResult};
use crate::pipeline::Step;

pub struct CreateStudent;

#[async_trait]
impl Step for CreateStudent {
    fn name(&self) -> &'static str {
        "Create Student"
    }

    fn provides(&self) -> &'static [Fact] {
        &[Fact::StudentId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let name = &ctx.student.name;
        note(config, format!("Creating student with name: {}", name));

        let resp = client
            .post("students", Some(&json!({ "name": name })), Some(201))
            .await?;
        check::status_code(&resp, 201)?;
        check::json_field(&resp, "name", &json!(name))?;
        check::json_field(&resp, "enrolledSubjects", &json!([]))?;
        check::json_field(&resp, "enrolledExams", &json!([]))?;

        let id = created_id(&resp, "student")?;
        note(config, format!("Created student with ID: {}", id));
        Ok(ctx.with_student(id))
    }
}

pub struct EnrollStudentInSubject;

#[async_trait]
impl Step for EnrollStudentInSubject {
    fn name(&self) -> &'static str {
        "Enroll Student in Subject"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::StudentId, Fact::SubjectId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let student_id = require(ctx.student.id, self.name(), Fact::StudentId)?;
        let subject_id = require(ctx.subject.id, self.name(), Fact::SubjectId)?;
        note(config, format!("Enrolling student {} in subject {}", student_id, subject_id));

        let resp = client
            .post(&format!("students/{}/subjects/{}", student_id, subject_id), None, Some(200))
            .await?;
        check::status_code(&resp, 200)?;
        check::json_field(&resp, "name", &json!(ctx.student.name))?;
        check::list_field_contains_text(&resp, "enrolledSubjects", "subjectName", &ctx.subject.subject_name)?;
        check::json_field(&resp, "enrolledExams", &json!([]))?;
        Ok(ctx.clone())
    }
}

pub struct PreventDuplicateSubjectEnrollment;

#[async_trait]
impl Step for PreventDuplicateSubjectEnrollment {
    fn name(&self) -> &'static str {
        "Prevent Duplicate Subject Enrollment"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::StudentId, Fact::SubjectId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let student_id = require(ctx.student.id, self.name(), Fact::StudentId)?;
        let subject_id = require(ctx.subject.id, self.name(), Fact::SubjectId)?;
        note(
            config,
            format!("Attempting to re-enroll student {} in subject {}", student_id, subject_id),
        );

        let resp = client
            .post(&format!("students/{}/subjects/{}", student_id, subject_id), None, Some(409))
            .await?;
        check::status_code(&resp, 409)?;
        check::json_field_contains_text(
            &resp,
            "message",
            &format!("Student with id: {} has already enrolled in subject", student_id),
        )?;
        Ok(ctx.clone())
    }
}

pub struct GetStudentById;

#[async_trait]
impl Step for GetStudentById {
    fn name(&self) -> &'static str {
        "Get Student By ID"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::StudentId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let student_id = require(ctx.student.id, self.name(), Fact::StudentId)?;
        note(config, format!("Getting student with ID: {}", student_id));

        let resp = client.get(&format!("students/{}", student_id), Some(200)).await?;
        check::status_code(&resp, 200)?;
        check::json_field(&resp, "name", &json!(ctx.student.name))?;
        check::list_field_contains(
            &resp,
            "enrolledSubjects",
            "subjectName",
            &json!(ctx.subject.subject_name),
        )?;
        check::json_field(&resp, "enrolledExams", &json!([]))?;
        Ok(ctx.clone())
    }
}

pub struct EnrollStudentInExam;

#[async_trait]
impl Step for EnrollStudentInExam {
    fn name(&self) -> &'static str {
        "Enroll Student in Exam"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::StudentId, Fact::ExamId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let student_id = require(ctx.student.id, self.name(), Fact::StudentId)?;
        let exam_id = require(ctx.exam.id, self.name(), Fact::ExamId)?;
        let subject_name = &ctx.subject.subject_name;
        note(config, format!("Enrolling student {} in exam {}", student_id, exam_id));

        let resp = client
            .post(&format!("students/{}/exams/{}", student_id, exam_id), None, Some(200))
            .await?;
        check::status_code(&resp, 200)?;
        check::json_field(&resp, "name", &json!(ctx.student.name))?;
        check::list_field_contains_text(&resp, "enrolledSubjects", "subjectName", subject_name)?;
        check::list_field_contains_text(&resp, "enrolledExams", "examName", subject_name)?;
        Ok(ctx.clone())
    }
}

pub struct PreventDuplicateExamEnrollment;

#[async_trait]
impl Step for PreventDuplicateExamEnrollment {
    fn name(&self) -> &'static str {
        "Prevent Duplicate Exam Enrollment"
    }

    fn requires(&self) -> &'static [Fact] {
        &[Fact::StudentId, Fact::ExamId]
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let student_id = require(ctx.student.id, self.name(), Fact::StudentId)?;
        let exam_id = require(ctx.exam.id, self.name(), Fact::ExamId)?;
        note(
            config,
            format!("Attempting to re-enroll student {} in exam {}", student_id, exam_id),
        );

        let resp = client
            .post(&format!("students/{}/exams/{}", student_id, exam_id), None, Some(409))
            .await?;
        check::status_code(&resp, 409)?;
        check::json_field_contains_text(
            &resp,
            "message",
            &format!(
                "Student with id: {} has already enrolled for this particular exam with id: {}",
                student_id, exam_id
            ),
        )?;
        Ok(ctx.clone())
    }
}

/// Lists all students and checks the run's student and its enrollments
pub struct GetAllStudents;

#[async_trait]
impl Step for GetAllStudents {
    fn name(&self) -> &'static str {
        "Get All Students"
    }

    async fn run(
        &self,
        client: &mut ApiClient,
        ctx: &RunContext,
        config: &HarnessConfig,
    ) -> HarnessResult<RunContext> {
        let student_name = &ctx.student.name;
        let subject_name = &ctx.subject.subject_name;
        note(config, "Getting all students");

        let resp = client.get("students", Some(200)).await?;
        check::status_code(&resp, 200)?;

        let index = find_index(&resp, "name", |n| n == student_name).ok_or_else(|| {
            HarnessError::assertion(format!(
                "Test student '{}' not found in students list",
                student_name
            ))
        })?;
        note(config, format!("Found test student at index {}", index));

        check::list_field_contains_at_index(
            &resp,
            index,
            "enrolledSubjects",
            "subjectName",
            &json!(subject_name),
        )?;
        if ctx.has(Fact::ExamId) {
            check::list_field_contains_text_at_index(&resp, index, "enrolledExams", "examName", subject_name)?;
        }
        Ok(ctx.clone())
    }
}
