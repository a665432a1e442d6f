//! Prompt building and response parsing shared by all HTTP providers.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{AIError, GeneratedPlan, PlanRequest};

/// Matches the body of a fenced code block, with or without a language tag.
static CODE_FENCE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*\n?(.*?)```").ok());

/// Build the prompt asking a model for a JSON task plan.
pub fn build_plan_prompt(request: &PlanRequest) -> String {
    let timeframe = request.timeframe.as_deref().unwrap_or("not specified, pick a realistic one");

    format!(
        r#"You are a planning assistant that breaks personal goals into concrete tasks.

Goal: {}
Details: {}
Timeframe: {}

Respond with JSON only, in exactly this shape:
{{
  "totalDuration": "overall duration, e.g. 3 months",
  "tasks": [
    {{
      "title": "short task title",
      "description": "what to do",
      "timeScope": "daily | weekly | monthly",
      "estimatedDuration": minutes as an integer,
      "executionTips": "practical advice"
    }}
  ]
}}

Rules:
1. Between 3 and 8 tasks, ordered from first to last
2. Each task must be actionable on its own
3. Do not include any text outside the JSON"#,
        request.goal_title,
        if request.goal_description.trim().is_empty() { "none" } else { request.goal_description.as_str() },
        timeframe
    )
}

/// Parse a model's text answer into a [`GeneratedPlan`].
///
/// Accepts bare JSON, JSON inside a code fence, or JSON surrounded by prose.
pub fn parse_plan_response(text: &str) -> Result<GeneratedPlan, AIError> {
    let body = extract_json(text)
        .ok_or_else(|| AIError::MalformedResponse("no JSON object in response".to_string()))?;

    serde_json::from_str(body).map_err(|e| AIError::MalformedResponse(e.to_string()))
}

fn extract_json(text: &str) -> Option<&str> {
    let fenced = CODE_FENCE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str());

    let start = fenced.find('{')?;
    let end = fenced.rfind('}')?;
    (start < end).then(|| &fenced[start..=end])
}
