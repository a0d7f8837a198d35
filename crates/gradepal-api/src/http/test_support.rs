//! In-process app for handler tests: a temp SQLite database, two users with
//! tokens, one subject with an assessment, and a scripted provider.

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, header};
use axum::response::Response;
use futures_util::stream;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use gradepal_core::llm::box_provider::BoxLlmProvider;
use gradepal_core::llm::provider::{LlmProvider, ProviderEventStream};
use gradepal_infra::sqlite::pool::{DatabasePool, database_url};
use gradepal_infra::sqlite::records::SqliteRecordsRepository;
use gradepal_types::config::AppConfig;
use gradepal_types::identity::UserRole;
use gradepal_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, StreamEvent, Usage,
};

use crate::http::router::build_router;
use crate::state::AppState;

enum Script {
    Reply(String),
    Chunks(Vec<String>),
    Fail,
}

struct FakeProvider(Script);

impl LlmProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match &self.0 {
            Script::Reply(text) => Ok(CompletionResponse {
                id: "fake-1".to_string(),
                content: text.clone(),
                model: "fake-model".to_string(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            }),
            _ => Err(LlmError::Provider {
                message: "scripted failure".to_string(),
            }),
        }
    }

    fn stream(&self, _request: CompletionRequest) -> ProviderEventStream {
        let events: Vec<Result<StreamEvent, LlmError>> = match &self.0 {
            Script::Reply(text) => vec![
                Ok(StreamEvent::Connected),
                Ok(StreamEvent::TextDelta { text: text.clone() }),
                Ok(StreamEvent::Done),
            ],
            Script::Chunks(chunks) => chunks
                .iter()
                .map(|text| Ok(StreamEvent::TextDelta { text: text.clone() }))
                .chain(std::iter::once(Ok(StreamEvent::Done)))
                .collect(),
            Script::Fail => vec![Err(LlmError::Provider {
                message: "scripted failure".to_string(),
            })],
        };
        Box::pin(stream::iter(events))
    }
}

pub(crate) struct Seed {
    pub student_id: Uuid,
    pub assessment_id: Uuid,
}

pub(crate) struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub student_token: String,
    pub lecturer_token: String,
    pub seed: Seed,
    _dir: TempDir,
}

impl TestApp {
    pub async fn replying(text: &str) -> Self {
        Self::with_script(Script::Reply(text.to_string())).await
    }

    pub async fn streaming(chunks: &[&str]) -> Self {
        Self::with_script(Script::Chunks(chunks.iter().map(|c| c.to_string()).collect())).await
    }

    pub async fn failing() -> Self {
        Self::with_script(Script::Fail).await
    }

    async fn with_script(script: Script) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url(dir.path())).await.unwrap();
        let state = AppState::from_parts(
            AppConfig::default(),
            dir.path().to_path_buf(),
            pool.clone(),
            BoxLlmProvider::new(FakeProvider(script)),
        )
        .unwrap();

        let lecturer = state
            .identity
            .create_user("drsmith", "Dr Smith", UserRole::Lecturer, None)
            .await
            .unwrap();
        let student = state
            .identity
            .create_user("alice", "Alice Mokoena", UserRole::Student, Some("S1001"))
            .await
            .unwrap();
        let lecturer_token = state.identity.issue_token(&lecturer.id).await.unwrap();
        let student_token = state.identity.issue_token(&student.id).await.unwrap();

        let records = SqliteRecordsRepository::new(pool);
        let subject = records
            .create_subject(&lecturer.id, "MTH101", "Calculus I")
            .await
            .unwrap();
        records.enroll(&student.id, &subject.id).await.unwrap();
        let assessment = records
            .create_assessment(&subject.id, "Midterm", 100.0, 40.0)
            .await
            .unwrap();

        Self {
            router: build_router(state.clone()),
            state,
            student_token,
            lecturer_token,
            seed: Seed {
                student_id: student.id,
                assessment_id: assessment.id,
            },
            _dir: dir,
        }
    }

    pub async fn post_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Response {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::get(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

pub(crate) async fn read_body(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}
