//! Retry behaviour of the three call orchestrators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    completion, failure, published_post, FakeBackend, FakeGeneration, FakeResearch,
    RecordingSleeper, ARTICLE_JSON,
};
use nodes::{GenerationOrchestrator, PublishOrchestrator, ResearchOrchestrator};
use pipeline::{
    FailureKind, GenerationError, PostStatus, ProviderFailure, PublishError, ResearchError,
    ResearchResult, SearchResponse,
};

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[tokio::test]
async fn test_research_builds_query_and_retries_connection_failures() {
    let provider = Arc::new(FakeResearch::new(|call| match call {
        1 => Err(failure(FailureKind::Unreachable)),
        _ => Ok(common::search_response()),
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = ResearchOrchestrator::new(provider.clone(), sleeper.clone());

    let result = orchestrator.research("Valtos Beach").await.unwrap();

    assert_eq!(result.topic, "Valtos Beach");
    assert_eq!(result.sources.len(), 1);
    assert_eq!(
        provider.last_query.lock().unwrap().as_deref(),
        Some("Valtos Beach Parga Greece")
    );
    assert_eq!(provider.scripted.calls(), 2);
    assert_eq!(sleeper.delays(), vec![secs(2)]);
}

#[tokio::test]
async fn test_research_other_failure_is_fatal_immediately() {
    let provider = Arc::new(FakeResearch::new(|_| Err(failure(FailureKind::Other))));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = ResearchOrchestrator::new(provider.clone(), sleeper.clone());

    let err = orchestrator.research("Parga Castle").await.unwrap_err();

    assert!(matches!(err, ResearchError::Other { .. }));
    assert_eq!(provider.scripted.calls(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_research_rate_limit_exhaustion() {
    let provider = Arc::new(FakeResearch::new(|_| {
        Err(failure(FailureKind::RateLimited { retry_after: None }))
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = ResearchOrchestrator::new(provider.clone(), sleeper.clone());

    let err = orchestrator.research("Parga Castle").await.unwrap_err();

    assert!(matches!(err, ResearchError::RateLimited { .. }));
    assert!(err.to_string().contains("TAVILY_API_KEY"));
    assert_eq!(provider.scripted.calls(), 3);
    assert_eq!(sleeper.delays(), vec![secs(2), secs(4)]);
}

#[tokio::test]
async fn test_generation_reasks_after_malformed_output() {
    let provider = Arc::new(FakeGeneration::new(|call| match call {
        1 => Ok(completion("Sure! Here is your article about Parga.")),
        _ => Ok(completion(&format!("```json\n{ARTICLE_JSON}\n```"))),
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = GenerationOrchestrator::new(provider.clone(), sleeper.clone());
    let research = ResearchResult::new("Valtos Beach", SearchResponse::default());

    let article = orchestrator.generate("Valtos Beach", &research).await.unwrap();

    assert_eq!(article.title, "Valtos Beach: The Complete Guide");
    assert_eq!(article.keywords[0], "parga");
    assert_eq!(article.tokens_used.as_u64(), 3000);
    assert_eq!(provider.0.calls(), 2);
    assert_eq!(sleeper.delays(), vec![secs(2)]);
}

#[tokio::test]
async fn test_generation_rate_limit_uses_longer_base_delay() {
    let provider = Arc::new(FakeGeneration::new(|_| {
        Err(failure(FailureKind::RateLimited { retry_after: None }))
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = GenerationOrchestrator::new(provider.clone(), sleeper.clone());
    let research = ResearchResult::new("Parga Castle", SearchResponse::default());

    let err = orchestrator.generate("Parga Castle", &research).await.unwrap_err();

    assert!(matches!(err, GenerationError::RateLimited { .. }));
    assert_eq!(provider.0.calls(), 3);
    assert_eq!(sleeper.delays(), vec![secs(10), secs(20)]);
}

#[tokio::test]
async fn test_generation_rate_limit_hint_then_server_fault_backoff() {
    let provider = Arc::new(FakeGeneration::new(|call| match call {
        1 => Err(failure(FailureKind::RateLimited {
            retry_after: Some(secs(30)),
        })),
        2 => Err(failure(FailureKind::ServerFault)),
        _ => Ok(completion(ARTICLE_JSON)),
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = GenerationOrchestrator::new(provider.clone(), sleeper.clone());
    let research = ResearchResult::new("Parga Castle", SearchResponse::default());

    orchestrator.generate("Parga Castle", &research).await.unwrap();

    assert_eq!(sleeper.delays(), vec![secs(30), secs(4)]);
}

#[tokio::test]
async fn test_generation_gives_up_on_persistently_malformed_output() {
    let provider = Arc::new(FakeGeneration::new(|_| Ok(completion("{\"title\": \"only\"}"))));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = GenerationOrchestrator::new(provider.clone(), sleeper.clone());
    let research = ResearchResult::new("Parga Castle", SearchResponse::default());

    let err = orchestrator.generate("Parga Castle", &research).await.unwrap_err();

    assert!(matches!(err, GenerationError::Malformed { .. }));
    assert_eq!(provider.0.calls(), 3);
}

#[tokio::test]
async fn test_publish_server_faults_exhaust_with_doubling_delays() {
    let backend = Arc::new(FakeBackend::new(|_| Err(failure(FailureKind::ServerFault))));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = PublishOrchestrator::new(backend.clone(), sleeper.clone());

    let err = orchestrator
        .create_draft("Title", "<p>Body</p>", "Excerpt")
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::ServerFault { .. }));
    assert_eq!(backend.scripted.calls(), 3);
    assert_eq!(sleeper.delays(), vec![secs(1), secs(2)]);
}

#[tokio::test]
async fn test_publish_unauthorized_is_not_retried() {
    let backend = Arc::new(FakeBackend::new(|_| {
        Err(ProviderFailure::new(
            FailureKind::Unauthorized,
            "WordPress API error (rest_not_logged_in): You are not currently logged in.",
        ))
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let orchestrator = PublishOrchestrator::new(backend.clone(), sleeper.clone());

    let err = orchestrator
        .create_draft("Title", "<p>Body</p>", "Excerpt")
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Unauthorized { .. }));
    assert!(err.to_string().contains("WORDPRESS_APP_PASSWORD"));
    assert!(err.to_string().contains("rest_not_logged_in"));
    assert_eq!(backend.scripted.calls(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_publish_sends_requested_status() {
    let backend = Arc::new(FakeBackend::ok());
    let orchestrator =
        PublishOrchestrator::new(backend.clone(), Arc::new(RecordingSleeper::default()));

    orchestrator.create_draft("Draft", "<p>x</p>", "e").await.unwrap();

    let drafts = backend.drafts.lock().unwrap();
    assert_eq!(drafts[0].status, PostStatus::Draft);
    assert_eq!(drafts[0].title, "Draft");
}

#[tokio::test]
async fn test_credential_check_deletes_draft_and_tolerates_delete_failure() {
    let backend = Arc::new(FakeBackend::ok());
    let orchestrator =
        PublishOrchestrator::new(backend.clone(), Arc::new(RecordingSleeper::default()));
    let post = orchestrator.verify_credentials(true).await.unwrap();
    assert_eq!(*backend.deleted.lock().unwrap(), vec![post.id]);

    let mut failing = FakeBackend::new(|call| Ok(published_post(call)));
    failing.fail_delete = true;
    let failing = Arc::new(failing);
    let orchestrator =
        PublishOrchestrator::new(failing.clone(), Arc::new(RecordingSleeper::default()));
    assert!(orchestrator.verify_credentials(true).await.is_ok());
    assert!(failing.deleted.lock().unwrap().is_empty());

    let kept = Arc::new(FakeBackend::ok());
    let orchestrator =
        PublishOrchestrator::new(kept.clone(), Arc::new(RecordingSleeper::default()));
    orchestrator.verify_credentials(false).await.unwrap();
    assert!(kept.deleted.lock().unwrap().is_empty());
    assert_eq!(kept.drafts.lock().unwrap()[0].status, PostStatus::Draft);
}
