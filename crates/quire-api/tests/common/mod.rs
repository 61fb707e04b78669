//! Shared harness: in-memory repositories, token minting and a server
//! spawned on an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use uuid::Uuid;

use quire_api::config::{HttpConfig, JwtConfig, RateLimitConfig};
use quire_api::{build_router, AppState};
use quire_core::{
    CreateNoteRequest, CreateTaskRequest, Error, ListNotesRequest, ListNotesResponse,
    ListTasksRequest, ListTasksResponse, Note, NoteRepository, NoteSort, Profile,
    ProfileRepository, Result, Task, TaskRepository, Theme, UpdateNoteRequest,
    UpdateProfileRequest, UpdateTaskRequest,
};
use quire_inference::mock::{InMemoryAiRunRepository, MockGenerationBackend};
use quire_inference::AiPipeline;

pub const TEST_SECRET: &str = "integration-test-secret";

/// A note body long enough to pass the content guard.
pub const MEETING_NOTE: &str = "Met with the design team today. We need to finalize the \
                                color palette and send the mockups to the client by Friday.";

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================

#[derive(Clone, Default)]
pub struct InMemoryNoteRepository {
    notes: Arc<Mutex<Vec<Note>>>,
    runs: Option<InMemoryAiRunRepository>,
}

impl InMemoryNoteRepository {
    /// Deleting a note also drops its runs from `runs`.
    pub fn cascading_to(runs: InMemoryAiRunRepository) -> Self {
        Self {
            notes: Arc::default(),
            runs: Some(runs),
        }
    }
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn insert(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::now_v7(),
            user_id,
            title: req.title,
            content: req.content,
            tags: req.tags,
            pinned: req.pinned,
            created_at: now,
            updated_at: now,
        };
        self.notes.lock().unwrap().push(note.clone());
        Ok(note)
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Note> {
        self.notes
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == id && n.user_id == user_id)
            .cloned()
            .ok_or(Error::NoteNotFound(id))
    }

    async fn list(&self, user_id: Uuid, req: &ListNotesRequest) -> Result<ListNotesResponse> {
        let needle = req.search_text().map(str::to_lowercase);
        let mut matching: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| match &needle {
                Some(q) => {
                    n.title.to_lowercase().contains(q) || n.content.to_lowercase().contains(q)
                }
                None => true,
            })
            .filter(|n| req.tag.as_ref().map_or(true, |t| n.tags.contains(t)))
            .filter(|n| req.pinned.map_or(true, |p| n.pinned == p))
            .cloned()
            .collect();

        match req.sort {
            NoteSort::UpdatedDesc => matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            NoteSort::UpdatedAsc => matching.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
            NoteSort::CreatedDesc => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            NoteSort::CreatedAsc => matching.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            NoteSort::TitleAsc => matching.sort_by(|a, b| a.title.cmp(&b.title)),
            NoteSort::TitleDesc => matching.sort_by(|a, b| b.title.cmp(&a.title)),
        }

        let total = matching.len() as i64;
        let notes = matching
            .into_iter()
            .skip(req.offset as usize)
            .take(req.limit as usize)
            .collect();
        Ok(ListNotesResponse { notes, total })
    }

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or(Error::NoteNotFound(id))?;
        if let Some(title) = req.title {
            note.title = title;
        }
        if let Some(content) = req.content {
            note.content = content;
        }
        if let Some(tags) = req.tags {
            note.tags = tags;
        }
        if let Some(pinned) = req.pinned {
            note.pinned = pinned;
        }
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| !(n.id == id && n.user_id == user_id));
        if notes.len() == before {
            return Err(Error::NoteNotFound(id));
        }
        if let Some(runs) = &self.runs {
            runs.remove_note(id);
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<Mutex<Vec<Task>>>,
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, user_id: Uuid, req: CreateTaskRequest) -> Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::now_v7(),
            user_id,
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            deadline: req.deadline,
            tags: req.tags,
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Task> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned()
            .ok_or(Error::TaskNotFound(id))
    }

    async fn list(&self, user_id: Uuid, req: &ListTasksRequest) -> Result<ListTasksResponse> {
        let needle = req.search_text().map(str::to_lowercase);
        let mut matching: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter(|t| match &needle {
                Some(q) => t.title.to_lowercase().contains(q),
                None => true,
            })
            .filter(|t| req.status.map_or(true, |s| t.status == s))
            .filter(|t| req.priority.map_or(true, |p| t.priority == p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let tasks = matching
            .into_iter()
            .skip(req.offset as usize)
            .take(req.limit as usize)
            .collect();
        Ok(ListTasksResponse { tasks, total })
    }

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateTaskRequest) -> Result<Task> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
            .ok_or(Error::TaskNotFound(id))?;
        if let Some(title) = req.title {
            task.title = title;
        }
        if let Some(description) = req.description {
            task.description = description;
        }
        if let Some(status) = req.status {
            task.status = status;
        }
        if let Some(priority) = req.priority {
            task.priority = priority;
        }
        if let Some(deadline) = req.deadline {
            task.deadline = deadline;
        }
        if let Some(tags) = req.tags {
            task.tags = tags;
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.user_id == user_id));
        if tasks.len() == before {
            return Err(Error::TaskNotFound(id));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProfileRepository {
    profiles: Arc<Mutex<HashMap<Uuid, Profile>>>,
}

impl InMemoryProfileRepository {
    pub fn len(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn fetch_or_create(&self, user_id: Uuid) -> Result<Profile> {
        let now = Utc::now();
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .entry(user_id)
            .or_insert_with(|| Profile {
                id: user_id,
                full_name: None,
                theme: Theme::System,
                created_at: now,
                updated_at: now,
            })
            .clone())
    }

    async fn update(&self, user_id: Uuid, req: UpdateProfileRequest) -> Result<Profile> {
        let mut profile = self.fetch_or_create(user_id).await?;
        if let Some(name) = req.full_name {
            profile.full_name = Some(name);
        }
        if let Some(theme) = req.theme {
            profile.theme = theme;
        }
        profile.updated_at = Utc::now();
        self.profiles.lock().unwrap().insert(user_id, profile.clone());
        Ok(profile)
    }
}

// =============================================================================
// TOKENS
// =============================================================================

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        audience: "authenticated".to_string(),
        issuer: None,
    }
}

/// Sign arbitrary claims with the test secret.
pub fn sign(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Token for `user_id` expiring `expires_in_secs` from now.
pub fn token_expiring(user_id: Uuid, expires_in_secs: i64) -> String {
    sign(json!({
        "sub": user_id.to_string(),
        "aud": "authenticated",
        "exp": Utc::now().timestamp() + expires_in_secs,
    }))
}

pub fn token_for(user_id: Uuid) -> String {
    token_expiring(user_id, 3600)
}

// =============================================================================
// SERVER
// =============================================================================

pub struct TestAppBuilder {
    backend: Option<MockGenerationBackend>,
    runs: InMemoryAiRunRepository,
    rate_limit: RateLimitConfig,
}

impl TestAppBuilder {
    pub fn backend(mut self, backend: MockGenerationBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn runs(mut self, runs: InMemoryAiRunRepository) -> Self {
        self.runs = runs;
        self
    }

    pub fn rate_limit(mut self, requests: u32, ai_requests: u32) -> Self {
        self.rate_limit = RateLimitConfig {
            enabled: true,
            requests,
            ai_requests,
            period: Duration::from_secs(900),
        };
        self
    }

    pub async fn spawn(self) -> TestApp {
        let notes = InMemoryNoteRepository::cascading_to(self.runs.clone());
        let tasks = InMemoryTaskRepository::default();
        let profiles = InMemoryProfileRepository::default();

        let mut state = AppState::new(
            Arc::new(notes.clone()),
            Arc::new(tasks.clone()),
            Arc::new(profiles.clone()),
            Arc::new(self.runs.clone()),
            &jwt_config(),
        )
        .with_rate_limits(&self.rate_limit)
        .unwrap();
        if let Some(backend) = &self.backend {
            state = state.with_ai(AiPipeline::new(
                Arc::new(backend.clone()),
                Arc::new(self.runs.clone()),
            ));
        }

        let router = build_router(state, &HttpConfig::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        TestApp {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            notes,
            tasks,
            profiles,
            runs: self.runs,
            backend: self.backend,
        }
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub notes: InMemoryNoteRepository,
    pub tasks: InMemoryTaskRepository,
    pub profiles: InMemoryProfileRepository,
    pub runs: InMemoryAiRunRepository,
    pub backend: Option<MockGenerationBackend>,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            backend: None,
            runs: InMemoryAiRunRepository::new(),
            rate_limit: RateLimitConfig {
                enabled: false,
                ..RateLimitConfig::default()
            },
        }
    }

    /// Server without an AI backend and without rate limits.
    pub async fn spawn() -> TestApp {
        Self::builder().spawn().await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn patch(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Create a note through the API and return its id.
    pub async fn create_note(&self, token: &str, title: &str, content: &str) -> Uuid {
        let res = self
            .post("/api/notes", token)
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
        let body: Value = res.json().await.unwrap();
        body["data"]["note"]["id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap()
    }
}

/// `error.code` of an error response body.
pub async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"]["code"].as_str().unwrap_or_default().to_string()
}
