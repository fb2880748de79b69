use serde_json::json;

use super::{ ChartKind, ChartSpec, Rendered };

/// Produce the HTML fragment stored on the bot message. Chart data and
/// options are embedded verbatim; the chart library on the display side owns
/// their shape.
pub fn to_html(rendered: &Rendered) -> String {
    match rendered {
        Rendered::Html(html) => html.clone(),
        Rendered::Chart(spec) => chart_html(spec),
    }
}

fn chart_html(spec: &ChartSpec) -> String {
    if let ChartKind::Unknown(other) = &spec.kind {
        // Unrecognized chart type: fall back to the raw specification as
        // preformatted text.
        let raw = json!({
            "type": other,
            "data": spec.data,
            "options": spec.options,
        });
        let pretty = serde_json::to_string_pretty(&raw).unwrap_or_default();
        return format!("<pre>{}</pre>", pretty);
    }

    let payload = json!({
        "data": spec.data,
        "options": spec.options,
    });
    format!(
        "<div class=\"chart-container\" data-chart-type=\"{}\">{}</div>",
        spec.kind.as_str(),
        serde_json::to_string(&payload).unwrap_or_default()
    )
}

/// Inline error fragment substituted for the bot response when the remote
/// call fails.
pub fn error_fragment(message: &str) -> String {
    format!(
        "<div class=\"p-4 bg-rose-100 text-rose-700 rounded-lg\"><p class=\"font-bold\">Error</p><p>{}</p></div>",
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_chart_kind_renders_container_with_payload() {
        let spec = ChartSpec {
            kind: ChartKind::Bar,
            data: json!({ "labels": ["Q1", "Q2"] }),
            options: json!({}),
        };
        let html = chart_html(&spec);
        assert!(html.starts_with("<div class=\"chart-container\" data-chart-type=\"bar\">"));
        assert!(html.contains("\"labels\":[\"Q1\",\"Q2\"]"));
    }

    #[test]
    fn unknown_chart_kind_renders_preformatted_json() {
        let spec = ChartSpec {
            kind: ChartKind::Unknown("scatter".to_string()),
            data: json!({}),
            options: json!({}),
        };
        let html = chart_html(&spec);
        assert!(html.starts_with("<pre>"));
        assert!(html.contains("\"type\": \"scatter\""));
    }

    #[test]
    fn error_fragment_carries_the_message() {
        let html = error_fragment("API call failed: 500 - boom");
        assert!(html.contains("font-bold"));
        assert!(html.contains("API call failed: 500 - boom"));
    }
}
