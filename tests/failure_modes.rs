mod common;

use std::sync::Arc;

use common::*;
use procurement_crew::core::TraceStatus;
use procurement_crew::prelude::*;
use procurement_crew::{CompletionRequest, CrewError, LLMError, MemoryTelemetry, SchemaError};
use serde_json::json;

fn queries(request: &CompletionRequest) -> Option<Result<String, LLMError>> {
    is_role(request, "search_queries_recommendation_agent")
        .then(|| Ok(json!({"queries": ["Philips 3200 LatteGo price Saudi"]}).to_string()))
}

fn search_done() -> Result<String, LLMError> {
    Ok(json!({
        "final_answer": {"results": [{
            "title": "Philips 3200",
            "url": "https://www.noon.com/saudi-en/p/3200",
            "content": "LatteGo",
            "score": 0.9,
            "rating": 4.4,
            "search_query": "Philips 3200 LatteGo price Saudi"
        }]}
    })
    .to_string())
}

fn pipeline(
    backend: Arc<ScriptedBackend>,
    dir: &std::path::Path,
    max_iterations: usize,
) -> ProcurementPipeline {
    let (fast, strong) = handles(backend);
    let mut deps = PipelineDeps::new(fast, strong, dir)
        .with_search(Arc::new(StaticSearch::default()))
        .with_scrape(Arc::new(StaticScrape::default()));
    deps.max_iterations = max_iterations;
    ProcurementPipeline::assemble(deps).unwrap()
}

#[tokio::test]
async fn test_schema_violation_aborts_and_keeps_earlier_files() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(|request| {
        if let Some(reply) = queries(request) {
            return reply;
        }
        if is_role(request, "Search Engine Agent") {
            return search_done();
        }
        if is_role(request, "Web scraping agent") {
            // Rank 9 is outside 1..=5.
            let product = product("https://www.noon.com/saudi-en/p/3200", 2450.0, 9);
            return Ok(json!({"final_answer": {"products": [product]}}).to_string());
        }
        Err(LLMError::InvalidResponse("stage should not run".to_string()))
    });
    let telemetry = Arc::new(MemoryTelemetry::new());
    let pipeline = pipeline(backend.clone(), dir.path(), 5)
        .with_observer(Observer::new(telemetry.clone()));

    let err = pipeline
        .run(Vec::new(), &RunInputs::default())
        .await
        .unwrap_err();

    match err {
        CrewError::Schema { task, source } => {
            assert_eq!(task, "extract_products");
            assert!(matches!(source, SchemaError::OutOfRange { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(dir.path().join("step_1_suggested_search_queries.json").exists());
    assert!(dir.path().join("step_2_search_engine.json").exists());
    assert!(!dir.path().join("step_3_search_results.json").exists());
    assert!(backend.requests_for("Procurement Report Author Agent").is_empty());

    let traces = telemetry.get_traces();
    assert_eq!(traces.len(), 3);
    assert_eq!(traces[2].status, TraceStatus::Failed);
    assert_eq!(traces[2].task, "extract_products");
}

#[tokio::test]
async fn test_llm_error_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(|_| {
        Err(LLMError::GroqError("rate limit reached for model".to_string()))
    });

    let err = pipeline(backend, dir.path(), 5)
        .run(Vec::new(), &RunInputs::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CrewError::Llm(LLMError::GroqError(_))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_too_many_queries_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(|request| {
        if is_role(request, "search_queries_recommendation_agent") {
            let queries: Vec<String> = (0..4).map(|i| format!("espresso machine {i}")).collect();
            return Ok(json!({ "queries": queries }).to_string());
        }
        Err(LLMError::InvalidResponse("stage should not run".to_string()))
    });
    let inputs = RunInputs {
        max_queries: 3,
        ..RunInputs::default()
    };

    let err = pipeline(backend, dir.path(), 5)
        .run(Vec::new(), &inputs)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CrewError::Schema {
            source: SchemaError::Cardinality { actual: 4, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_iteration_cap_forces_final_answer() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(|request| {
        if let Some(reply) = queries(request) {
            return reply;
        }
        if is_role(request, "Search Engine Agent") {
            if last_message(request).starts_with("You have used all the iterations") {
                return search_done();
            }
            return Ok(json!({"action": "web_search", "action_input": "Philips 3200"}).to_string());
        }
        Err(LLMError::InvalidResponse("stop here".to_string()))
    });

    let err = pipeline(backend.clone(), dir.path(), 2)
        .run(Vec::new(), &RunInputs::default())
        .await
        .unwrap_err();

    // The forced answer is accepted; the run stops later at the scraper.
    assert!(matches!(err, CrewError::Llm(LLMError::InvalidResponse(_))));
    assert!(dir.path().join("step_2_search_engine.json").exists());
    assert_eq!(backend.requests_for("Search Engine Agent").len(), 3);
}

#[tokio::test]
async fn test_iteration_cap_exceeded() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(|request| {
        if let Some(reply) = queries(request) {
            return reply;
        }
        Ok(json!({"action": "web_search", "action_input": {"query": "Philips 3200"}}).to_string())
    });

    let err = pipeline(backend, dir.path(), 2)
        .run(Vec::new(), &RunInputs::default())
        .await
        .unwrap_err();

    match err {
        CrewError::MaxIterationsExceeded { task, iterations } => {
            assert_eq!(task, "search_products");
            assert_eq!(iterations, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unknown_tool_is_reported_back_to_the_agent() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(|request| {
        if let Some(reply) = queries(request) {
            return reply;
        }
        if is_role(request, "Search Engine Agent") {
            if last_message(request).starts_with("Observation:") {
                return search_done();
            }
            return Ok(json!({"action": "google", "action_input": {"query": "x"}}).to_string());
        }
        Err(LLMError::InvalidResponse("stop here".to_string()))
    });

    let _ = pipeline(backend.clone(), dir.path(), 5)
        .run(Vec::new(), &RunInputs::default())
        .await;

    let search = backend.requests_for("Search Engine Agent");
    assert_eq!(search.len(), 2);
    let observation = last_message(&search[1]);
    assert!(observation.contains("unknown tool `google`"));
    assert!(observation.contains("web_search"));
}

#[tokio::test]
async fn test_invalid_inputs_fail_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(|_| Ok(String::new()));
    let inputs = RunInputs {
        websites: Vec::new(),
        ..RunInputs::default()
    };

    let err = pipeline(backend.clone(), dir.path(), 5)
        .run(Vec::new(), &inputs)
        .await
        .unwrap_err();

    assert!(matches!(err, CrewError::Config(_)));
    assert!(backend.requests().is_empty());
}
