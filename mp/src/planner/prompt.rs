//! Prompt text and response schema for plan generation

use serde_json::{Value, json};

/// Build the generation prompt for a board URL
///
/// The URL is embedded verbatim; nothing here fetches or parses it.
pub fn build_prompt(board_url: &str) -> String {
    format!(
        r#"Analyze this Pinterest board URL: "{board_url}".
Based on the words in the URL and common aesthetic trends, imagine what kind of life inspiration this board represents (e.g., fitness, home decor, mindfulness, productivity, fashion).

Create a detailed "Life Action Plan" that turns this visual inspiration into real-world reality.
Be encouraging, "bestie-like", and actionable.

The response must be in JSON format."#
    )
}

/// Response schema pinning the ActionPlan shape
///
/// Uses the Gemini schema dialect (upper-case type names). Every top-level
/// field and both `weeklyPlan` item fields are required.
pub fn response_schema() -> Value {
    let string_array = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "goal": {
                "type": "STRING",
                "description": "A catchy, motivating summary of the detected goal."
            },
            "weeklyPlan": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "day": { "type": "STRING" },
                        "actions": string_array
                    },
                    "required": ["day", "actions"]
                }
            },
            "firstSteps": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "3-5 very small, immediate actions."
            },
            "suggestedHabits": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "2-3 long-term habits."
            }
        },
        "required": ["goal", "weeklyPlan", "firstSteps", "suggestedHabits"]
    })
}
