//! In-memory doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use futures_util::stream;
use futures_util::StreamExt;
use uuid::Uuid;

use gradepal_types::chat::{ChatMessage, ChatThread};
use gradepal_types::error::RepositoryError;
use gradepal_types::identity::{ChatUser, UserRole};
use gradepal_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, StreamEvent, Usage,
};
use gradepal_types::records::{Assessment, Grade, GradeInput, StudentProfile, Subject};

use crate::chat::repository::ChatRepository;
use crate::llm::provider::{LlmProvider, ProviderEventStream};
use crate::records::repository::RecordsRepository;

// ---------------------------------------------------------------------------
// Chat persistence
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ChatState {
    threads: HashMap<Uuid, ChatThread>,
    messages: Vec<ChatMessage>,
}

#[derive(Clone, Default)]
pub struct InMemoryChat {
    state: Arc<Mutex<ChatState>>,
}

impl ChatRepository for InMemoryChat {
    async fn create_thread(&self, thread: &ChatThread) -> Result<ChatThread, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.threads.contains_key(&thread.id) {
            return Err(RepositoryError::Conflict(thread.id.to_string()));
        }
        state.threads.insert(thread.id, thread.clone());
        Ok(thread.clone())
    }

    async fn get_thread(&self, thread_id: &Uuid) -> Result<Option<ChatThread>, RepositoryError> {
        Ok(self.state.lock().unwrap().threads.get(thread_id).cloned())
    }

    async fn list_threads(&self, owner_id: &Uuid) -> Result<Vec<ChatThread>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut threads: Vec<ChatThread> = state
            .threads
            .values()
            .filter(|t| t.owner_id == *owner_id)
            .cloned()
            .collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(threads)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let thread = state
            .threads
            .get_mut(&message.thread_id)
            .ok_or(RepositoryError::NotFound)?;
        thread.updated_at = message.created_at;
        state.messages.push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, thread_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|m| m.thread_id == *thread_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }
}

// ---------------------------------------------------------------------------
// Academic records
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordsState {
    users: Vec<ChatUser>,
    subjects: Vec<Subject>,
    enrollments: Vec<(Uuid, Uuid)>,
    assessments: Vec<Assessment>,
    grades: Vec<Grade>,
    ticks: i64,
}

impl RecordsState {
    /// Strictly increasing timestamps so "newest first" is deterministic.
    fn next_time(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        DateTime::<Utc>::UNIX_EPOCH
            + Duration::seconds(1_700_000_000)
            + Duration::milliseconds(self.ticks)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRecords {
    state: Arc<Mutex<RecordsState>>,
}

impl InMemoryRecords {
    pub fn add_user(
        &self,
        username: &str,
        role: UserRole,
        student_number: Option<&str>,
    ) -> ChatUser {
        let user = ChatUser {
            id: Uuid::now_v7(),
            username: username.to_string(),
            role,
            student_number: student_number.map(str::to_string),
        };
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn add_subject(&self, lecturer_id: Uuid, code: &str, name: &str) -> Subject {
        let subject = Subject {
            id: Uuid::now_v7(),
            lecturer_id,
            code: code.to_string(),
            name: name.to_string(),
        };
        self.state.lock().unwrap().subjects.push(subject.clone());
        subject
    }

    pub fn enroll(&self, student_id: Uuid, subject_id: Uuid) {
        self.state.lock().unwrap().enrollments.push((student_id, subject_id));
    }

    pub fn add_assessment(
        &self,
        subject_id: Uuid,
        name: &str,
        max_score: f64,
        weight: f64,
    ) -> Assessment {
        let mut state = self.state.lock().unwrap();
        let assessment = Assessment {
            id: Uuid::now_v7(),
            subject_id,
            name: name.to_string(),
            max_score,
            weight,
            created_at: state.next_time(),
        };
        state.assessments.push(assessment.clone());
        assessment
    }

    pub fn add_grade(&self, assessment_id: Uuid, student: &ChatUser, score: f64) -> Grade {
        let mut state = self.state.lock().unwrap();
        let now = state.next_time();
        let grade = Grade {
            id: Uuid::now_v7(),
            assessment_id,
            student_id: student.id,
            student_number: student.grade_key().to_string(),
            score,
            created_at: now,
            updated_at: now,
        };
        state.grades.push(grade.clone());
        grade
    }
}

impl RecordsRepository for InMemoryRecords {
    async fn subjects_for_lecturer(
        &self,
        lecturer_id: &Uuid,
    ) -> Result<Vec<Subject>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut subjects: Vec<Subject> = state
            .subjects
            .iter()
            .filter(|s| s.lecturer_id == *lecturer_id)
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn subjects_for_student(
        &self,
        student_id: &Uuid,
    ) -> Result<Vec<Subject>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut subjects: Vec<Subject> = state
            .subjects
            .iter()
            .filter(|s| state.enrollments.contains(&(*student_id, s.id)))
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn assessments_for_subjects(
        &self,
        subject_ids: &[Uuid],
    ) -> Result<Vec<Assessment>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut assessments: Vec<Assessment> = state
            .assessments
            .iter()
            .filter(|a| subject_ids.contains(&a.subject_id))
            .cloned()
            .collect();
        assessments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assessments)
    }

    async fn assessments_by_ids(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<Vec<Assessment>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .assessments
            .iter()
            .filter(|a| assessment_ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn grade_counts(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut counts = HashMap::new();
        for grade in state.grades.iter().filter(|g| assessment_ids.contains(&g.assessment_id)) {
            *counts.entry(grade.assessment_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn grades_for_student_number(
        &self,
        student_number: &str,
    ) -> Result<Vec<Grade>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut grades: Vec<Grade> = state
            .grades
            .iter()
            .filter(|g| g.student_number == student_number)
            .cloned()
            .collect();
        grades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(grades)
    }

    async fn grades_for_assessments(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<Vec<Grade>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut grades: Vec<Grade> = state
            .grades
            .iter()
            .filter(|g| assessment_ids.contains(&g.assessment_id))
            .cloned()
            .collect();
        grades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(grades)
    }

    async fn students_for_lecturer(
        &self,
        lecturer_id: &Uuid,
    ) -> Result<Vec<StudentProfile>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut students: Vec<StudentProfile> = state
            .users
            .iter()
            .filter(|u| u.role == UserRole::Student)
            .filter(|u| {
                state.enrollments.iter().any(|(student, subject)| {
                    *student == u.id
                        && state
                            .subjects
                            .iter()
                            .any(|s| s.id == *subject && s.lecturer_id == *lecturer_id)
                })
            })
            .map(|u| StudentProfile {
                id: u.id,
                username: u.username.clone(),
                full_name: u.username.clone(),
                student_number: u.student_number.clone(),
            })
            .collect();
        students.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(students)
    }

    async fn subject_for_assessment(
        &self,
        assessment_id: &Uuid,
    ) -> Result<Option<Subject>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .assessments
            .iter()
            .find(|a| a.id == *assessment_id)
            .and_then(|a| state.subjects.iter().find(|s| s.id == a.subject_id))
            .cloned())
    }

    async fn upsert_grade(&self, input: &GradeInput) -> Result<Grade, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let now = state.next_time();
        if let Some(existing) = state
            .grades
            .iter_mut()
            .find(|g| g.assessment_id == input.assessment_id && g.student_id == input.student_id)
        {
            existing.score = input.score;
            existing.student_number = input.student_number.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let grade = Grade {
            id: Uuid::now_v7(),
            assessment_id: input.assessment_id,
            student_id: input.student_id,
            student_number: input.student_number.clone(),
            score: input.score,
            created_at: now,
            updated_at: now,
        };
        state.grades.push(grade.clone());
        Ok(grade)
    }
}

// ---------------------------------------------------------------------------
// LLM provider
// ---------------------------------------------------------------------------

/// Provider with a fixed script: one reply for `complete`, a list of deltas
/// for `stream`.
pub struct ScriptedProvider {
    reply: Option<String>,
    deltas: Vec<String>,
    fail_stream: bool,
    hang: bool,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    fn scripted(reply: Option<String>, deltas: Vec<String>) -> Self {
        Self {
            reply,
            deltas,
            fail_stream: false,
            hang: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `complete` returns `reply`; `stream` yields it as a single delta.
    pub fn replying(reply: &str) -> Self {
        Self::scripted(Some(reply.to_string()), vec![reply.to_string()])
    }

    /// Every call fails.
    pub fn failing() -> Self {
        let mut provider = Self::scripted(None, Vec::new());
        provider.fail_stream = true;
        provider
    }

    /// `stream` yields `deltas`; `complete` fails.
    pub fn streaming(deltas: &[&str]) -> Self {
        Self::scripted(None, deltas.iter().map(|d| d.to_string()).collect())
    }

    /// Fail the stream after the scripted deltas.
    pub fn then_fail(mut self) -> Self {
        self.fail_stream = true;
        self
    }

    /// Never end the stream after the scripted deltas.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let content = self.reply.clone().ok_or_else(|| LlmError::Provider {
            message: "scripted failure".to_string(),
        })?;
        Ok(CompletionResponse {
            id: "resp-scripted".to_string(),
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }

    fn stream(&self, request: CompletionRequest) -> ProviderEventStream {
        self.requests.lock().unwrap().push(request);
        let mut events: Vec<Result<StreamEvent, LlmError>> = vec![Ok(StreamEvent::Connected)];
        events.extend(
            self.deltas
                .iter()
                .map(|text| Ok(StreamEvent::TextDelta { text: text.clone() })),
        );
        if self.fail_stream {
            events.push(Err(LlmError::Stream("scripted stream failure".to_string())));
        } else if !self.hang {
            events.push(Ok(StreamEvent::Done));
        }

        if self.hang {
            Box::pin(stream::iter(events).chain(stream::pending()))
        } else {
            Box::pin(stream::iter(events))
        }
    }
}
