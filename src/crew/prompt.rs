//! Prompt assembly for the agent loop.

use serde_json::Value;

use crate::core::Worker;
use crate::tools::Tool;

pub const CONTEXT_HEADER: &str = "This is the context you're working with:";
pub(crate) const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

pub(crate) fn system(worker: &Worker, knowledge: Option<&str>) -> String {
    let mut prompt = format!(
        "You are {}. {}\nYour personal goal is: {}",
        worker.role(),
        worker.backstory(),
        worker.goal()
    );
    if let Some(knowledge) = knowledge {
        prompt.push_str("\n\nAdditional information about the company you work for:\n");
        prompt.push_str(knowledge);
    }
    prompt
}

/// The task message: instructions, expected output, schema and upstream context.
pub(crate) fn task(
    description: &str,
    expected_output: &str,
    schema: Option<&Value>,
    context: &[&str],
) -> String {
    let mut prompt = format!(
        "Current Task: {description}\n\nThis is the expected criteria for your final answer: {expected_output}\nyou MUST return the actual complete content as the final answer, not a summary."
    );

    if let Some(schema) = schema {
        let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
        prompt.push_str(
            "\n\nYour final answer MUST be a single JSON object that follows this JSON schema:\n",
        );
        prompt.push_str(&rendered);
    }

    if !context.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_HEADER);
        prompt.push('\n');
        prompt.push_str(&context.join(CONTEXT_SEPARATOR));
    }

    prompt
}

pub(crate) fn tool_protocol(tools: &[std::sync::Arc<dyn Tool>]) -> String {
    let mut prompt = String::from("\n\nYou have access to the following tools:\n");
    for tool in tools {
        let args = serde_json::to_string(&tool.args_schema()).unwrap_or_default();
        prompt.push_str(&format!(
            "- {}: {}\n  arguments schema: {}\n",
            tool.name(),
            tool.description(),
            args
        ));
    }
    prompt.push_str(
        "\nReply with exactly one JSON object per message, in one of these two forms:\n\
         {\"thought\": \"what you are doing\", \"action\": \"<tool name>\", \"action_input\": {<arguments>}}\n\
         {\"thought\": \"I now know the final answer\", \"final_answer\": <your complete final answer>}\n\
         After each action you will receive an Observation with the tool result.",
    );
    prompt
}

pub(crate) fn observation(result: &Value) -> String {
    let body = match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("Observation: {body}")
}

pub(crate) const FORCE_FINAL_ANSWER: &str = "You have used all the iterations you were given. \
Stop using tools and reply now with {\"thought\": \"...\", \"final_answer\": ...} containing your complete final answer.";

pub(crate) const PLAN_REQUEST: &str = "Before you start, create a step-by-step plan for the task below. \
Reply with a JSON object {\"plan\": \"<your plan>\", \"ready\": <true if the plan is complete and you are ready to execute it>}.\n\n";

pub(crate) const PLAN_REFINE: &str = "Refine your plan. Address anything missing or unclear, then reply with the same JSON object.";
