//! The agent loop: drives one worker through one unit of work.

use serde_json::Value;

use crate::core::contract::extract_json;
use crate::core::Worker;
use crate::crew::prompt;
use crate::error::CrewError;
use crate::llm::{ChatMessage, LLMError};
use crate::tools::error_payload;

/// Everything the loop needs about the unit of work, already interpolated.
pub(crate) struct Assignment<'a> {
    pub task: &'a str,
    pub description: String,
    pub expected_output: String,
    pub schema: Option<Value>,
    pub context: Vec<&'a str>,
    pub knowledge: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Execution {
    pub answer: String,
    pub llm_calls: usize,
    pub tool_calls: usize,
}

#[derive(Debug, PartialEq)]
enum Step {
    Action { tool: String, input: Value },
    Final(String),
    Invalid(String),
}

fn parse_step(reply: &str) -> Step {
    let Some(body) = extract_json(reply) else {
        return Step::Invalid("your reply did not contain a JSON object".to_string());
    };
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => return Step::Invalid(format!("your reply is not valid JSON ({err})")),
    };

    if let Some(answer) = value.get("final_answer") {
        return match answer {
            Value::String(s) => Step::Final(s.clone()),
            Value::Null => Step::Invalid("`final_answer` is null".to_string()),
            other => Step::Final(other.to_string()),
        };
    }

    match value.get("action").and_then(Value::as_str) {
        Some(tool) => Step::Action {
            tool: tool.to_string(),
            input: value.get("action_input").cloned().unwrap_or(Value::Null),
        },
        None => Step::Invalid("reply has neither `action` nor `final_answer`".to_string()),
    }
}

/// Draft and refine a plan. Returns the last plan and the number of calls made.
async fn draft_plan(
    worker: &Worker,
    knowledge: Option<&str>,
    task_prompt: &str,
    attempts: u8,
) -> Result<(Option<String>, usize), LLMError> {
    let mut messages = vec![
        ChatMessage::system(prompt::system(worker, knowledge)),
        ChatMessage::user(format!("{}{}", prompt::PLAN_REQUEST, task_prompt)),
    ];
    let mut plan = None;
    let mut calls = 0;

    for attempt in 1..=attempts {
        let reply = worker.llm().chat(messages.clone(), true).await?;
        calls += 1;
        let parsed = extract_json(&reply).and_then(|body| serde_json::from_str::<Value>(body).ok());
        let (text, ready) = match parsed {
            Some(value) => (
                value
                    .get("plan")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
                value.get("ready").and_then(Value::as_bool).unwrap_or(true),
            ),
            None => (reply.trim().to_string(), true),
        };
        log::debug!(
            "'{}' plan attempt {}/{} (ready: {})",
            worker.role(),
            attempt,
            attempts,
            ready
        );
        plan = Some(text);
        if ready {
            break;
        }
        messages.push(ChatMessage::assistant(reply));
        messages.push(ChatMessage::user(prompt::PLAN_REFINE));
    }

    Ok((plan, calls))
}

pub(crate) async fn execute(
    worker: &Worker,
    assignment: &Assignment<'_>,
) -> Result<Execution, CrewError> {
    let mut llm_calls = 0;
    let mut tool_calls = 0;

    let mut task_prompt = prompt::task(
        &assignment.description,
        &assignment.expected_output,
        assignment.schema.as_ref(),
        &assignment.context,
    );

    if let Some(attempts) = worker.reasoning_attempts() {
        let (plan, calls) = draft_plan(worker, assignment.knowledge, &task_prompt, attempts).await?;
        llm_calls += calls;
        if let Some(plan) = plan {
            task_prompt.push_str("\n\nFollow the plan you made for this task:\n");
            task_prompt.push_str(&plan);
        }
    }

    let mut messages = vec![ChatMessage::system(prompt::system(worker, assignment.knowledge))];
    let wants_json = assignment.schema.is_some();

    if worker.tools().is_empty() {
        messages.push(ChatMessage::user(task_prompt));
        let answer = worker.llm().chat(messages, wants_json).await?;
        return Ok(Execution {
            answer,
            llm_calls: llm_calls + 1,
            tool_calls,
        });
    }

    task_prompt.push_str(&prompt::tool_protocol(worker.tools()));
    messages.push(ChatMessage::user(task_prompt));

    for iteration in 1..=worker.max_iterations() {
        let reply = worker.llm().chat(messages.clone(), true).await?;
        llm_calls += 1;
        let step = parse_step(&reply);
        messages.push(ChatMessage::assistant(reply));

        match step {
            Step::Final(answer) => {
                return Ok(Execution {
                    answer,
                    llm_calls,
                    tool_calls,
                });
            }
            Step::Action { tool, input } => {
                let result = match worker.tool(&tool) {
                    Some(t) => {
                        tool_calls += 1;
                        log::info!(
                            "[{}] '{}' calls {} (iteration {})",
                            assignment.task,
                            worker.role(),
                            tool,
                            iteration
                        );
                        t.invoke(input).await
                    }
                    None => {
                        let available: Vec<&str> =
                            worker.tools().iter().map(|t| t.name()).collect();
                        error_payload(format!(
                            "unknown tool `{}`; available tools: {}",
                            tool,
                            available.join(", ")
                        ))
                    }
                };
                messages.push(ChatMessage::user(prompt::observation(&result)));
            }
            Step::Invalid(reason) => {
                log::warn!("[{}] unusable reply: {}", assignment.task, reason);
                messages.push(ChatMessage::user(format!(
                    "Observation: {reason}. Reply with a single JSON object using `action` or `final_answer`."
                )));
            }
        }
    }

    messages.push(ChatMessage::user(prompt::FORCE_FINAL_ANSWER));
    let reply = worker.llm().chat(messages, true).await?;
    llm_calls += 1;
    match parse_step(&reply) {
        Step::Final(answer) => Ok(Execution {
            answer,
            llm_calls,
            tool_calls,
        }),
        _ => Err(CrewError::MaxIterationsExceeded {
            task: assignment.task.to_string(),
            iterations: worker.max_iterations(),
        }),
    }
}
