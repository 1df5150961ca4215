//! Run context threaded from step to step
//!
//! Steps never mutate shared state. Each one receives the context produced by
//! the previous step and hands back an updated copy, which the runner passes on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FixtureConfig;

/// A piece of state a step can publish for later steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fact {
    StudentId,
    SubjectId,
    ExamId,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Fact::StudentId => "student id",
            Fact::SubjectId => "subject id",
            Fact::ExamId => "exam id",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub subject_name: String,
    pub id: Option<i64>,
}

/// The exam name is assigned by the server, so it is unknown until creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub exam_name: Option<String>,
    pub id: Option<i64>,
}

/// IDs of everything this run created, for teardown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedEntities {
    pub students: Vec<i64>,
    pub subjects: Vec<i64>,
    pub exams: Vec<i64>,
}

impl CreatedEntities {
    pub fn is_empty(&self) -> bool {
        self.students.is_empty() && self.subjects.is_empty() && self.exams.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    pub student: StudentRecord,
    pub subject: SubjectRecord,
    pub exam: ExamRecord,
    pub created: CreatedEntities,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, fixtures: &FixtureConfig) -> Self {
        Self {
            run_id: run_id.into(),
            student: StudentRecord {
                name: fixtures.student_name.clone(),
                id: None,
            },
            subject: SubjectRecord {
                subject_name: fixtures.subject_name.clone(),
                id: None,
            },
            exam: ExamRecord::default(),
            created: CreatedEntities::default(),
        }
    }

    /// Whether a fact has been published by an earlier step
    pub fn has(&self, fact: Fact) -> bool {
        match fact {
            Fact::StudentId => self.student.id.is_some(),
            Fact::SubjectId => self.subject.id.is_some(),
            Fact::ExamId => self.exam.id.is_some(),
        }
    }

    pub fn with_student(&self, id: i64) -> Self {
        let mut next = self.clone();
        next.student.id = Some(id);
        next.created.students.push(id);
        next
    }

    pub fn with_subject(&self, id: i64) -> Self {
        let mut next = self.clone();
        next.subject.id = Some(id);
        next.created.subjects.push(id);
        next
    }

    pub fn with_exam(&self, id: i64, exam_name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.exam.id = Some(id);
        next.exam.exam_name = Some(exam_name.into());
        next.created.exams.push(id);
        next
    }
}
