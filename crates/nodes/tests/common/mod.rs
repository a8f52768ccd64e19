//! Scripted port implementations shared by the orchestration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nodes::{
    GenerationOrchestrator, PipelineExecutor, PublishOrchestrator, ResearchOrchestrator, Sleeper,
};
use pipeline::{
    Completion, CompletionRequest, FailureKind, GenerationProvider, PostDraft, PostId,
    ProviderFailure, PublishedPost, PublishingBackend, ResearchProvider, ResearchSource,
    SearchRequest, SearchResponse, TokenCount, TopicManager, TopicRepository,
};

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

type Script<T> = Box<dyn Fn(u32) -> Result<T, ProviderFailure> + Send + Sync>;

/// Answers each call from a script keyed by the 1-based call number.
pub struct Scripted<T> {
    script: Script<T>,
    calls: AtomicU32,
}

impl<T> Scripted<T> {
    pub fn new(script: impl Fn(u32) -> Result<T, ProviderFailure> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<T, ProviderFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        (self.script)(call)
    }
}

/// Research provider that also remembers the last query.
pub struct FakeResearch {
    pub scripted: Scripted<SearchResponse>,
    pub last_query: Mutex<Option<String>>,
}

impl FakeResearch {
    pub fn new(
        script: impl Fn(u32) -> Result<SearchResponse, ProviderFailure> + Send + Sync + 'static,
    ) -> Self {
        Self {
            scripted: Scripted::new(script),
            last_query: Mutex::new(None),
        }
    }

    pub fn ok() -> Self {
        Self::new(|_| Ok(search_response()))
    }
}

#[async_trait]
impl ResearchProvider for FakeResearch {
    fn name(&self) -> &'static str {
        "fake-research"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ProviderFailure> {
        *self.last_query.lock().unwrap() = Some(request.query.clone());
        self.scripted.next()
    }
}

pub struct FakeGeneration(pub Scripted<Completion>);

impl FakeGeneration {
    pub fn new(
        script: impl Fn(u32) -> Result<Completion, ProviderFailure> + Send + Sync + 'static,
    ) -> Self {
        Self(Scripted::new(script))
    }

    pub fn ok() -> Self {
        Self::new(|_| Ok(completion(ARTICLE_JSON)))
    }
}

#[async_trait]
impl GenerationProvider for FakeGeneration {
    fn name(&self) -> &'static str {
        "fake-generation"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, ProviderFailure> {
        self.0.next()
    }
}

/// Publishing backend that records created drafts and deletions.
pub struct FakeBackend {
    pub scripted: Scripted<PublishedPost>,
    pub drafts: Mutex<Vec<PostDraft>>,
    pub deleted: Mutex<Vec<PostId>>,
    pub fail_delete: bool,
}

impl FakeBackend {
    pub fn new(
        script: impl Fn(u32) -> Result<PublishedPost, ProviderFailure> + Send + Sync + 'static,
    ) -> Self {
        Self {
            scripted: Scripted::new(script),
            drafts: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            fail_delete: false,
        }
    }

    pub fn ok() -> Self {
        Self::new(|call| Ok(published_post(call)))
    }
}

#[async_trait]
impl PublishingBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake-backend"
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<PublishedPost, ProviderFailure> {
        self.drafts.lock().unwrap().push(draft.clone());
        self.scripted.next()
    }

    async fn delete_post(&self, id: PostId) -> Result<(), ProviderFailure> {
        if self.fail_delete {
            return Err(ProviderFailure::new(FailureKind::Forbidden, "cannot delete"));
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const ARTICLE_JSON: &str = r#"{
    "title": "Valtos Beach: The Complete Guide",
    "content": "<h2>Why Valtos</h2><p>Golden sand below the castle.</p>",
    "excerpt": "Everything you need for a day at Valtos Beach in Parga: how to get there, where to eat, water taxis, sunbeds, and the best time of day to visit it.",
    "keywords": ["valtos beach", "parga beaches"]
}"#;

pub fn search_response() -> SearchResponse {
    SearchResponse {
        results: vec![ResearchSource {
            title: "Valtos Beach".into(),
            content: "A long sandy beach west of Parga.".into(),
            url: "https://example.com/valtos".into(),
            score: 0.9,
        }],
        answer: Some("Valtos is Parga's largest beach.".into()),
    }
}

pub fn completion(text: &str) -> Completion {
    Completion {
        text: text.to_owned(),
        input_tokens: TokenCount::new(1200),
        output_tokens: TokenCount::new(1800),
    }
}

pub fn published_post(id: u32) -> PublishedPost {
    PublishedPost {
        id: PostId::new(u64::from(id) + 100),
        url: format!("https://parga.example/?p={}", u64::from(id) + 100),
        status: "publish".into(),
        title: "Valtos Beach: The Complete Guide".into(),
    }
}

pub fn failure(kind: FailureKind) -> ProviderFailure {
    ProviderFailure::new(kind, format!("scripted {}", kind.label()))
}

/// Fakes wired into a complete executor.
pub struct Harness {
    pub research: Arc<FakeResearch>,
    pub generation: Arc<FakeGeneration>,
    pub backend: Arc<FakeBackend>,
    pub sleeper: Arc<RecordingSleeper>,
    pub executor: PipelineExecutor,
}

impl Harness {
    pub fn new(
        repository: Arc<dyn TopicRepository>,
        research: FakeResearch,
        generation: FakeGeneration,
        backend: FakeBackend,
    ) -> Self {
        let research = Arc::new(research);
        let generation = Arc::new(generation);
        let backend = Arc::new(backend);
        let sleeper = Arc::new(RecordingSleeper::default());

        let executor = PipelineExecutor::new(
            TopicManager::new(repository, 10),
            ResearchOrchestrator::new(research.clone(), sleeper.clone()),
            GenerationOrchestrator::new(generation.clone(), sleeper.clone()),
            PublishOrchestrator::new(backend.clone(), sleeper.clone()),
        );
        Self {
            research,
            generation,
            backend,
            sleeper,
            executor,
        }
    }
}
