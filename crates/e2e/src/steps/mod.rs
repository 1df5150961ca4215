//! Test steps for the learning-management service
//!
//! Registration order is the execution order: creation, enrollment,
//! retrieval, then cleanup.

use std::fmt::Display;

use tracing::info;

use crate::client::ApiResponse;
use crate::config::HarnessConfig;
use crate::context::Fact;
use crate::error::{HarnessError, HarnessResult};
use crate::pipeline::Pipeline;

pub mod cleanup;
pub mod easter_egg;
pub mod exams;
pub mod students;
pub mod subjects;

pub use cleanup::CleanupTestData;
pub use easter_egg::CheckEasterEgg;
pub use exams::{CreateExam, GetAllExams, GetExamById};
pub use students::{
    CreateStudent, EnrollStudentInExam, EnrollStudentInSubject, GetAllStudents, GetStudentById,
    PreventDuplicateExamEnrollment, PreventDuplicateSubjectEnrollment,
};
pub use subjects::{CreateSubject, GetAllSubjects, GetSubjectById};

/// The full suite in dependency order
pub fn default_pipeline() -> HarnessResult<Pipeline> {
    Pipeline::new(vec![
        Box::new(CreateStudent),
        Box::new(CreateSubject),
        Box::new(EnrollStudentInSubject),
        Box::new(PreventDuplicateSubjectEnrollment),
        Box::new(GetStudentById),
        Box::new(CreateExam),
        Box::new(EnrollStudentInExam),
        Box::new(PreventDuplicateExamEnrollment),
        Box::new(CheckEasterEgg),
        Box::new(GetAllStudents),
        Box::new(GetAllExams),
        Box::new(GetExamById),
        Box::new(GetAllSubjects),
        Box::new(GetSubjectById),
        Box::new(CleanupTestData),
    ])
}

/// Informational line, gated on `detailed_logging`
pub(crate) fn note(config: &HarnessConfig, message: impl Display) {
    if config.detailed_logging {
        info!("{}", message);
    }
}

/// Typed accessor for an ID the step declared in `requires()`
///
/// The runner checks every required fact before calling `run`, so inside a
/// step this only unwraps the value. The error exists for steps run outside
/// a `TestRunner`.
pub(crate) fn require(value: Option<i64>, step: &str, fact: Fact) -> HarnessResult<i64> {
    value.ok_or_else(|| HarnessError::MissingPrerequisite {
        step: step.to_string(),
        fact,
    })
}

/// Server-assigned ID of a freshly created entity
pub(crate) fn created_id(resp: &ApiResponse, entity: &str) -> HarnessResult<i64> {
    resp.json()
        .and_then(|body| body.get("id"))
        .and_then(|id| id.as_i64())
        .ok_or_else(|| HarnessError::assertion(format!("Created {} has no numeric 'id'", entity)))
}

/// Position of the first array element whose `field` satisfies `pred`
pub(crate) fn find_index(
    resp: &ApiResponse,
    field: &str,
    pred: impl Fn(&str) -> bool,
) -> Option<usize> {
    resp.json()?
        .as_array()?
        .iter()
        .position(|item| item.get(field).and_then(|v| v.as_str()).map(|s| pred(s)).unwrap_or(false))
}
