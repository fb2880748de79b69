pub mod render;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

static CHART_BLOCK_RE: Lazy<Regex> = Lazy::new(||
    Regex::new(r"(?is)```chart\n(.*?)```").unwrap()
);
static TABLE_TAG_RE: Lazy<Regex> = Lazy::new(||
    Regex::new(r"(?is)<table.*?>.*?</table>").unwrap()
);
static FENCED_BLOCK_RE: Lazy<Regex> = Lazy::new(||
    Regex::new(r"(?is)```(?:html|markdown)?\n(.*?)```").unwrap()
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Doughnut,
    Unknown(String),
}

impl ChartKind {
    fn from_type(s: &str) -> Self {
        match s {
            "line" => ChartKind::Line,
            "bar" => ChartKind::Bar,
            "pie" => ChartKind::Pie,
            "doughnut" => ChartKind::Doughnut,
            other => ChartKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Unknown(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub data: JsonValue,
    pub options: JsonValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Chart(ChartSpec),
    Html(String),
}

/// Classify a raw model response: a fenced chart block wins, everything else
/// goes through HTML/table extraction.
pub fn interpret(raw: &str) -> Rendered {
    match extract_chart(raw) {
        Some(spec) => Rendered::Chart(spec),
        None => Rendered::Html(extract_html(raw)),
    }
}

/// Extract a chart specification from a fenced block tagged `chart`. The JSON
/// body must parse and carry both `type` and `data`; anything else yields
/// nothing and the caller falls through to HTML extraction.
pub fn extract_chart(raw: &str) -> Option<ChartSpec> {
    let body = CHART_BLOCK_RE.captures(raw)?.get(1)?.as_str();
    let value: JsonValue = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Malformed chart block, treating message as having no chart: {}", e);
            return None;
        }
    };

    let kind = match value.get("type") {
        Some(JsonValue::String(s)) if !s.is_empty() => ChartKind::from_type(s),
        _ => {
            return None;
        }
    };
    let data = match value.get("data") {
        Some(d) if !d.is_null() => d.clone(),
        _ => {
            return None;
        }
    };
    let options = value
        .get("options")
        .cloned()
        .unwrap_or_else(|| JsonValue::Object(Default::default()));

    Some(ChartSpec { kind, data, options })
}

/// HTML/table extraction, in priority order: literal `<table>` pass-through,
/// Markdown pipe table conversion, fenced html/markdown block, raw text.
pub fn extract_html(raw: &str) -> String {
    if TABLE_TAG_RE.is_match(raw) {
        return raw.to_string();
    }
    if let Some(table) = markdown_table_to_html(raw) {
        return table;
    }
    if let Some(caps) = FENCED_BLOCK_RE.captures(raw) {
        return caps[1].to_string();
    }
    raw.to_string()
}

fn markdown_table_to_html(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('|') || !trimmed.contains("\n|---") {
        return None;
    }

    let lines: Vec<&str> = trimmed
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.len() < 2 {
        return None;
    }

    let header = split_row(lines[0]);
    let mut html = String::from("<table><thead><tr>");
    for cell in &header {
        html.push_str(&format!("<th>{}</th>", cell));
    }
    html.push_str("</tr></thead><tbody>");

    // Header and separator are consumed; the header row fixes the column count.
    for line in &lines[2..] {
        let cells = split_row(line);
        html.push_str("<tr>");
        for i in 0..header.len() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            html.push_str(&format!("<td>{}</td>", cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    Some(html)
}

fn split_row(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() <= 2 {
        return Vec::new();
    }
    parts[1..parts.len() - 1]
        .iter()
        .map(|c| c.trim().to_string())
        .collect()
}
