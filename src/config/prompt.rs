use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize, Debug, Clone)]
pub struct StarterPrompt {
    pub title: String,
    pub description: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PromptConfig {
    pub answer_template: String,
    pub suggestion_template: String,
    pub starter_prompts: Vec<StarterPrompt>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            answer_template: DEFAULT_ANSWER_TEMPLATE.to_string(),
            suggestion_template: DEFAULT_SUGGESTION_TEMPLATE.to_string(),
            starter_prompts: default_starter_prompts(),
        }
    }
}

/// Outbound prompt contract: the model must keep chart payloads in a
/// standalone fenced block so the interpreter can assume at most one chart
/// per response.
const DEFAULT_ANSWER_TEMPLATE: &str = r##"You are an Analytics Assistant for a retail bank. The user is a data analyst.

Always start your response with a short, friendly opening relevant to the user's question or topic.
Always end your response with a relevant closing, such as a summary or an invitation to ask more questions.

If the answer requires data visualization (such as a chart/graph), provide the chart data in a code block as follows, and the chart code block MUST stand alone (not in the middle of a sentence, not combined with other text):

<p>Here is the chart:</p>
```chart
{
  "type": "line",
  "data": {
    "labels": ["Jan", "Feb", "Mar"],
    "datasets": [
      { "label": "Loan", "data": [100, 200, 150], "borderColor": "#F52D2D", "backgroundColor": "rgba(245,45,45,0.2)" }
    ]
  },
  "options": {}
}
```
<p>Additional explanation or insights below the chart.</p>

If the user requests a specific format (table, chart, CSV, etc.), follow that format.

NEVER put the chart code block in the middle of a sentence. The chart code block MUST start with ```chart on its own line, followed by JSON, and end with ``` on its own line.

If no chart is needed, answer as usual.

ALWAYS respond in English for all content, explanations, and chart labels.

User Question: "{query}"
Only provide the content block.
"##;

const DEFAULT_SUGGESTION_TEMPLATE: &str = r#"Based on the data analysis question: "{query}", provide 3 relevant and concise follow-up questions. Format the response as a JSON array of strings. Example: ["What is the NPL level per region?", "Who is the top product manager?", "Compare with the previous quarter."]"#;

fn default_starter_prompts() -> Vec<StarterPrompt> {
    let cards = [
        (
            "Loan Trends",
            "Show approved loan trends (last 2 fiscal years) as an interactive line chart.",
        ),
        (
            "Customer Performance",
            "List top 5 customers (largest portfolio) who haven't borrowed in the last year. Include contact and portfolio value.",
        ),
        (
            "Account Balance",
            "What's the average priority savings balance by region last quarter?",
        ),
        (
            "Approval Efficiency",
            "Show average loan approval time per product type for the last 6 months.",
        ),
        (
            "Loan Risk",
            "Identify largest approved loans that are undisbursed and overdue (>30 days). Provide a CSV.",
        ),
        (
            "Card Activity",
            "List international credit card transactions above 10M from last quarter. Provide a preview and download option.",
        ),
        (
            "Data Correlation",
            "Calculate and visualize loan amount vs. credit score correlation by region in a scatter plot.",
        ),
        (
            "Monthly NPL",
            "Display the monthly NPL ratio (last 12 months) in a line chart.",
        ),
    ];
    cards
        .iter()
        .map(|(title, description)| StarterPrompt {
            title: title.to_string(),
            description: description.to_string(),
        })
        .collect()
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    Ok(Arc::new(config))
}

pub fn get_answer_prompt(config: &PromptConfig, query: &str) -> String {
    config.answer_template.replace("{query}", query)
}

pub fn get_suggestion_prompt(config: &PromptConfig, query: &str) -> String {
    config.suggestion_template.replace("{query}", query)
}
