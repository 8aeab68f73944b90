mod common;

use std::sync::Arc;

use common::*;
use procurement_crew::core::TraceStatus;
use procurement_crew::crew::CONTEXT_HEADER;
use procurement_crew::prelude::*;
use procurement_crew::{CompletionRequest, LLMError, MemoryTelemetry};
use serde_json::{json, Value};

const AUTHOR: &str = "Procurement Report Author Agent";
const CRITIC: &str = "Procurement Quality Assurance Expert";

fn coffee_machine_inputs() -> RunInputs {
    RunInputs {
        product_name: "Coffee Machine for the Office".to_string(),
        websites: vec![
            "www.amazon.eg".to_string(),
            "www.jumia.com.eg".to_string(),
            "www.noon.com/saudi-en".to_string(),
        ],
        country: "Saudi".to_string(),
        max_queries: 10,
        score_threshold: 0.10,
        rating_threshold: 3.5,
    }
}

fn search_result(url: &str, score: f64, rating: f64) -> Value {
    json!({
        "title": "Coffee machine",
        "url": url,
        "content": "Bean to cup espresso machine",
        "score": score,
        "rating": rating,
        "search_query": "De'Longhi Magnifica S price Saudi"
    })
}

fn happy_path(request: &CompletionRequest) -> Result<String, LLMError> {
    if is_role(request, "search_queries_recommendation_agent") {
        return Ok(json!({
            "queries": [
                "De'Longhi Magnifica S ECAM22 price Saudi",
                "Philips 3200 LatteGo noon Saudi",
                "Nespresso Vertuo Next office amazon.eg"
            ]
        })
        .to_string());
    }

    if is_role(request, "Search Engine Agent") {
        if !last_message(request).starts_with("Observation:") {
            return Ok(json!({
                "thought": "Run the first suggested query",
                "action": "web_search",
                "action_input": {"query": "De'Longhi Magnifica S ECAM22 price Saudi"}
            })
            .to_string());
        }
        return Ok(json!({
            "thought": "I now know the final answer",
            "final_answer": {
                "results": [
                    search_result("https://www.amazon.eg/dp/B001", 0.92, 4.6),
                    search_result("https://blog.example.com/best", 0.05, 4.9),
                    search_result("https://www.noon.com/saudi-en/p/2", 0.81, 3.0)
                ]
            }
        })
        .to_string());
    }

    if is_role(request, "Web scraping agent") {
        if !last_message(request).starts_with("Observation:") {
            return Ok(json!({
                "thought": "Scrape the only result",
                "action": "web_scraping",
                "action_input": {"page_url": "https://www.amazon.eg/dp/B001"}
            })
            .to_string());
        }
        return Ok(json!({
            "thought": "I now know the final answer",
            "final_answer": {"products": [product("https://www.amazon.eg/dp/B001", 8999.0, 4)]}
        })
        .to_string());
    }

    if is_role(request, AUTHOR) {
        if first_user_prompt(request).contains("Revise and improve") {
            return Ok(format!("```html\n{}\n```", html_report("Revised report")));
        }
        return Ok(html_report("Draft report"));
    }

    if is_role(request, CRITIC) {
        if first_user_prompt(request).contains("step-by-step plan") {
            let plan = json!({"plan": "Check cost factors, then structure", "ready": true});
            return Ok(plan.to_string());
        }
        return Ok("CRITIQUE: the Findings section lacks total cost of ownership.".to_string());
    }

    Err(LLMError::InvalidResponse("unexpected request".to_string()))
}

#[tokio::test]
async fn test_coffee_machine_run_produces_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(happy_path);
    let (fast, strong) = handles(backend.clone());
    let search = Arc::new(StaticSearch::default());
    let scrape = Arc::new(StaticScrape::default());
    let telemetry = Arc::new(MemoryTelemetry::new());

    let pipeline = ProcurementPipeline::assemble(
        PipelineDeps::new(fast, strong, dir.path())
            .with_search(search.clone())
            .with_scrape(scrape.clone()),
    )
    .unwrap()
    .with_observer(Observer::new(telemetry.clone()).with_default_tags(["crew"]));

    let knowledge = vec![KnowledgeSource::text(
        "ohay is a company that provides AI solutions to help websites refine their search and recommendation systems.",
    )];
    let output = pipeline
        .run(knowledge, &coffee_machine_inputs())
        .await
        .unwrap();

    // Artifacts, in execution order; the critique stays in memory.
    let written: Vec<String> = output
        .tasks_output
        .iter()
        .filter_map(|t| t.output_file.as_ref())
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        written,
        vec![
            "step_1_suggested_search_queries.json",
            "step_2_search_engine.json",
            "step_3_search_results.json",
            "step_4_procurement_report.html",
            "step_4_updated_procurement_report.html",
        ]
    );
    assert_eq!(output.tasks_output.len(), 6);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 5);

    let queries: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("step_1_suggested_search_queries.json")).unwrap(),
    )
    .unwrap();
    let queries = queries["queries"].as_array().unwrap();
    assert!(!queries.is_empty() && queries.len() <= 10);

    let results: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("step_2_search_engine.json")).unwrap(),
    )
    .unwrap();
    let urls: Vec<&str> = results["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["url"].as_str().unwrap())
        .collect();
    assert_eq!(urls, vec!["https://www.amazon.eg/dp/B001"]);

    let products: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("step_3_search_results.json")).unwrap(),
    )
    .unwrap();
    for product in products["products"].as_array().unwrap() {
        let specs = product["product_specs"].as_array().unwrap().len();
        let rank = product["agent_recommendation_rank"].as_u64().unwrap();
        assert!((1..=5).contains(&specs));
        assert!((1..=5).contains(&rank));
    }

    let revised = std::fs::read_to_string(
        dir.path().join("step_4_updated_procurement_report.html"),
    )
    .unwrap();
    assert!(revised.starts_with("<!DOCTYPE html>"));
    assert!(revised.contains("Revised report"));
    assert_eq!(output.raw, revised);

    // The revision runs on the author's worker and sees both the report and the critique.
    let revision_requests: Vec<CompletionRequest> = backend
        .requests_for(AUTHOR)
        .into_iter()
        .filter(|r| first_user_prompt(r).contains("Revise and improve"))
        .collect();
    assert_eq!(revision_requests.len(), 1);
    let revision_prompt = first_user_prompt(&revision_requests[0]);
    let context = revision_prompt.split(CONTEXT_HEADER).nth(1).unwrap();
    assert!(context.contains("Draft report"));
    assert!(context.contains("CRITIQUE: the Findings section lacks total cost of ownership."));
    assert!(context.find("Draft report").unwrap() < context.find("CRITIQUE").unwrap());

    let critic_task = output
        .task(pipeline.report_critic().critique_task().handle())
        .unwrap();
    assert_eq!(critic_task.worker_role, CRITIC);
    assert!(critic_task.output_file.is_none());
    let revision_task = output
        .task(pipeline.report_critic().revision_task().unwrap().handle())
        .unwrap();
    assert_eq!(revision_task.worker_role, AUTHOR);

    // Tools were actually exercised.
    assert_eq!(search.queries.lock().unwrap().len(), 1);
    let scrape_calls = scrape.calls.lock().unwrap();
    assert_eq!(scrape_calls[0].0, "https://www.amazon.eg/dp/B001");
    assert!(scrape_calls[0].1.contains("product_current_price"));

    // One trace per unit of work, all in the same session.
    let traces = telemetry.get_traces();
    assert_eq!(traces.len(), 6);
    let session = traces[0].session_id.unwrap();
    assert!(traces.iter().all(|t| t.session_id == Some(session)));
    assert!(traces.iter().all(|t| t.status == TraceStatus::Success));
    assert_eq!(traces[5].worker_role, AUTHOR);
    assert_eq!(traces[4].context, vec!["write_procurement_report"]);
    assert_eq!(
        traces[5].context,
        vec!["write_procurement_report", "critique_procurement_report"]
    );
}

#[tokio::test]
async fn test_prompts_carry_inputs_models_and_knowledge() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(happy_path);
    let (fast, strong) = handles(backend.clone());
    let pipeline = ProcurementPipeline::assemble(
        PipelineDeps::new(fast, strong, dir.path())
            .with_search(Arc::new(StaticSearch::default()))
            .with_scrape(Arc::new(StaticScrape::default())),
    )
    .unwrap();

    pipeline
        .run(
            vec![KnowledgeSource::text("ohay is a company that provides AI solutions.")],
            &coffee_machine_inputs(),
        )
        .await
        .unwrap();

    let recommender = backend.requests_for("search_queries_recommendation_agent");
    assert_eq!(recommender.len(), 1);
    let request = &recommender[0];
    assert_eq!(request.model.as_deref(), Some("llama-3.1-8b-instant"));
    assert_eq!(request.temperature, Some(0.1));
    assert!(request.json_mode);
    assert!(system_prompt(request).contains("ohay is a company"));
    let prompt = first_user_prompt(request);
    assert!(prompt.contains("Ohay is looking to buy Coffee Machine for the Office"));
    assert!(prompt.contains("www.amazon.eg, www.jumia.com.eg, www.noon.com/saudi-en"));
    assert!(prompt.contains("sell the product in Saudi"));
    assert!(prompt.contains("Generate at maximum 10 queries."));
    assert!(!prompt.contains(CONTEXT_HEADER));

    let search = backend.requests_for("Search Engine Agent");
    assert!(search.iter().all(|r| r.model.as_deref() == Some("llama-3.3-70b-versatile")));
    let prompt = first_user_prompt(&search[0]);
    assert!(prompt.contains("confidence score less than (0.1)"));
    assert!(prompt.contains("rating (score) lower than (3.5)"));
    assert!(prompt.contains("web_search"));
    assert!(prompt.contains("De'Longhi Magnifica S ECAM22 price Saudi"));

    // Reasoning pass happens before the critique itself.
    let critic = backend.requests_for(CRITIC);
    assert_eq!(critic.len(), 2);
    assert!(first_user_prompt(&critic[0]).contains("step-by-step plan"));
    assert!(system_prompt(&critic[0]).contains("ohay is a company"));
    assert!(system_prompt(&critic[1]).contains("ohay is a company"));
    assert!(first_user_prompt(&critic[1]).contains("Check cost factors, then structure"));
}

#[tokio::test]
async fn test_runs_offline_without_tool_clients() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(happy_path);
    let (fast, strong) = handles(backend.clone());
    let pipeline =
        ProcurementPipeline::assemble(PipelineDeps::new(fast, strong, dir.path())).unwrap();

    pipeline
        .run(Vec::new(), &coffee_machine_inputs())
        .await
        .unwrap();

    let search = backend.requests_for("Search Engine Agent");
    assert!(last_message(&search[1])
        .starts_with("Observation: Search results for: De'Longhi Magnifica S ECAM22 price Saudi"));

    let scraper = backend.requests_for("Web scraping agent");
    assert_eq!(
        last_message(&scraper[1]),
        "Observation: {\"error\":\"Scrape client not configured\"}"
    );
}
