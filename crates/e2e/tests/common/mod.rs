//! In-process mock of the Learning Navigator service
//!
//! Mirrors the service's routes, status codes and conflict messages closely
//! enough for the harness pipeline to run end to end. Faults can be switched
//! on to exercise failure paths.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use navigator_e2e::HarnessConfig;

#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// POST /students answers 500
    pub fail_student_create: bool,
    /// DELETE /exams/:id answers 500
    pub fail_exam_delete: bool,
}

#[derive(Debug, Clone)]
struct Student {
    name: String,
    subjects: Vec<i64>,
    exams: Vec<i64>,
}

#[derive(Debug, Clone)]
struct Exam {
    name: String,
    subject_id: i64,
}

#[derive(Debug, Default)]
pub struct Lms {
    next_id: i64,
    students: BTreeMap<i64, Student>,
    subjects: BTreeMap<i64, String>,
    exams: BTreeMap<i64, Exam>,
    /// Successful deletions in the order they happened, e.g. "exams/3"
    pub deletions: Vec<String>,
    faults: Faults,
}

impl Lms {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn subject_json(&self, id: i64) -> Value {
        json!({ "id": id, "subjectName": self.subjects.get(&id).cloned().unwrap_or_default() })
    }

    fn exam_json(&self, id: i64) -> Value {
        let name = self.exams.get(&id).map(|e| e.name.clone()).unwrap_or_default();
        json!({ "id": id, "examName": name })
    }

    fn student_json(&self, id: i64, student: &Student) -> Value {
        json!({
            "id": id,
            "name": student.name,
            "enrolledSubjects": student.subjects.iter().map(|s| self.subject_json(*s)).collect::<Vec<_>>(),
            "enrolledExams": student.exams.iter().map(|e| self.exam_json(*e)).collect::<Vec<_>>(),
        })
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    pub fn exam_count(&self) -> usize {
        self.exams.len()
    }
}

type Shared = Arc<Mutex<Lms>>;

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({ "status": status.as_u16(), "message": message.into() });
    (status, Json(body)).into_response()
}

fn not_found(kind: &str, id: i64) -> Response {
    error(StatusCode::NOT_FOUND, format!("{} with id: {} not found", kind, id))
}

async fn create_student(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut lms = state.lock();
    if lms.faults.fail_student_create {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred");
    }
    let name = body.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
    let id = lms.next_id();
    let student = Student {
        name,
        subjects: Vec::new(),
        exams: Vec::new(),
    };
    let out = lms.student_json(id, &student);
    lms.students.insert(id, student);
    (StatusCode::CREATED, Json(out)).into_response()
}

async fn list_students(State(state): State<Shared>) -> Response {
    let lms = state.lock();
    let all: Vec<Value> = lms.students.iter().map(|(id, s)| lms.student_json(*id, s)).collect();
    Json(Value::Array(all)).into_response()
}

async fn get_student(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let lms = state.lock();
    match lms.students.get(&id) {
        Some(s) => Json(lms.student_json(id, s)).into_response(),
        None => not_found("Student", id),
    }
}

async fn delete_student(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut lms = state.lock();
    match lms.students.remove(&id) {
        Some(_) => {
            lms.deletions.push(format!("students/{}", id));
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found("Student", id),
    }
}

async fn enroll_subject(State(state): State<Shared>, Path((id, subject_id)): Path<(i64, i64)>) -> Response {
    let mut lms = state.lock();
    if !lms.subjects.contains_key(&subject_id) {
        return not_found("Subject", subject_id);
    }
    let Some(student) = lms.students.get_mut(&id) else {
        return not_found("Student", id);
    };
    if student.subjects.contains(&subject_id) {
        return error(
            StatusCode::CONFLICT,
            format!("Student with id: {} has already enrolled in subject with id: {}", id, subject_id),
        );
    }
    student.subjects.push(subject_id);
    let student = student.clone();
    Json(lms.student_json(id, &student)).into_response()
}

async fn enroll_exam(State(state): State<Shared>, Path((id, exam_id)): Path<(i64, i64)>) -> Response {
    let mut lms = state.lock();
    let Some(exam_subject) = lms.exams.get(&exam_id).map(|e| e.subject_id) else {
        return not_found("Exam", exam_id);
    };
    let Some(student) = lms.students.get_mut(&id) else {
        return not_found("Student", id);
    };
    if student.exams.contains(&exam_id) {
        return error(
            StatusCode::CONFLICT,
            format!(
                "Student with id: {} has already enrolled for this particular exam with id: {}",
                id, exam_id
            ),
        );
    }
    if !student.subjects.contains(&exam_subject) {
        return error(
            StatusCode::BAD_REQUEST,
            format!("Student with id: {} is not enrolled in the exam's subject", id),
        );
    }
    student.exams.push(exam_id);
    let student = student.clone();
    Json(lms.student_json(id, &student)).into_response()
}

async fn create_subject(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut lms = state.lock();
    let name = body
        .get("subjectName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let id = lms.next_id();
    lms.subjects.insert(id, name);
    (StatusCode::CREATED, Json(lms.subject_json(id))).into_response()
}

async fn list_subjects(State(state): State<Shared>) -> Response {
    let lms = state.lock();
    let all: Vec<Value> = lms.subjects.keys().map(|id| lms.subject_json(*id)).collect();
    Json(Value::Array(all)).into_response()
}

async fn get_subject(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let lms = state.lock();
    if lms.subjects.contains_key(&id) {
        Json(lms.subject_json(id)).into_response()
    } else {
        not_found("Subject", id)
    }
}

async fn delete_subject(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut lms = state.lock();
    match lms.subjects.remove(&id) {
        Some(_) => {
            lms.deletions.push(format!("subjects/{}", id));
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found("Subject", id),
    }
}

async fn create_exam(State(state): State<Shared>, Path(subject_id): Path<i64>) -> Response {
    let mut lms = state.lock();
    let Some(subject_name) = lms.subjects.get(&subject_id).cloned() else {
        return not_found("Subject", subject_id);
    };
    let id = lms.next_id();
    lms.exams.insert(
        id,
        Exam {
            name: format!("{} EXAM", subject_name),
            subject_id,
        },
    );
    (StatusCode::CREATED, Json(lms.exam_json(id))).into_response()
}

async fn list_exams(State(state): State<Shared>) -> Response {
    let lms = state.lock();
    let all: Vec<Value> = lms.exams.keys().map(|id| lms.exam_json(*id)).collect();
    Json(Value::Array(all)).into_response()
}

async fn get_exam(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let lms = state.lock();
    if lms.exams.contains_key(&id) {
        Json(lms.exam_json(id)).into_response()
    } else {
        not_found("Exam", id)
    }
}

async fn delete_exam(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut lms = state.lock();
    if lms.faults.fail_exam_delete {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred");
    }
    match lms.exams.remove(&id) {
        Some(_) => {
            for student in lms.students.values_mut() {
                student.exams.retain(|e| *e != id);
            }
            lms.deletions.push(format!("exams/{}", id));
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found("Exam", id),
    }
}

async fn hidden_feature(Path(number): Path<i64>) -> Response {
    Json(json!({
        "message": "Great! You have found the hidden number fact ",
        "response": format!("{} is the number of a test fact.", number),
    }))
    .into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/:id", get(get_student).delete(delete_student))
        .route("/students/:id/subjects/:subject_id", post(enroll_subject))
        .route("/students/:id/exams/:exam_id", post(enroll_exam))
        .route("/subjects", get(list_subjects).post(create_subject))
        .route("/subjects/:id", get(get_subject).delete(delete_subject))
        .route("/exams", get(list_exams))
        .route("/exams/:id", get(get_exam).delete(delete_exam))
        .route("/exams/subjects/:id", post(create_exam))
        .route("/easter-egg/hidden-feature/:number", get(hidden_feature))
        .with_state(state)
}

/// A running mock bound to an ephemeral loopback port
pub struct MockLms {
    pub base_url: String,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl MockLms {
    pub async fn start() -> Self {
        Self::start_with(Faults::default()).await
    }

    pub async fn start_with(faults: Faults) -> Self {
        let state: Shared = Arc::new(Mutex::new(Lms {
            faults,
            ..Default::default()
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock local addr");
        let app = router(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    /// Harness config pointed at this mock, with quiet logging
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url.clone(),
            detailed_logging: false,
            ..Default::default()
        }
    }
}

impl Drop for MockLms {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL of a loopback port with nothing listening
pub fn closed_base_url() -> String {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind throwaway listener")
        .local_addr()
        .expect("throwaway local addr")
        .port();
    format!("http://127.0.0.1:{}", port)
}
