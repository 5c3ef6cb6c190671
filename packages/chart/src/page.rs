//! HTML pages.
//!
//! [`render_page`] is the standalone report: charts are embedded as inline
//! Vega-Lite JSON and drawn client-side with `vega-embed`, next to the
//! error banner, the feedback acknowledgement and the feedback form.
//! [`render_index`] is the interactive page served at `/`: it posts URLs
//! and PDFs to `/api/incidents/upload`, sends the returned incidents to
//! `/api/analyze` and embeds the resulting charts.

use std::fmt::Write as _;

use crate::{ChartError, ChartSet};

const VEGA_SCRIPTS: [&str; 3] = [
    "https://cdn.jsdelivr.net/npm/vega@5",
    "https://cdn.jsdelivr.net/npm/vega-lite@5",
    "https://cdn.jsdelivr.net/npm/vega-embed@6",
];

/// Title of both pages.
pub const PAGE_TITLE: &str = "Incident Lens";
/// Shown after feedback has been recorded.
pub const FEEDBACK_THANKS: &str = "Thank you for your feedback!";

const FEEDBACK_FORM: &str = "<form id=\"feedback\"><label for=\"feedback-text\">Feedback</label>\
<textarea id=\"feedback-text\" name=\"feedback\" rows=\"3\"></textarea>\
<button type=\"submit\">Send</button></form>";

const INGEST_FORM: &str = "<form id=\"ingest\" enctype=\"multipart/form-data\">\
<label for=\"urls\">Incident summary URLs (one per line)</label>\
<textarea id=\"urls\" name=\"urls\" rows=\"4\"></textarea>\
<label for=\"files\">Incident summary PDFs</label>\
<input id=\"files\" type=\"file\" name=\"files\" accept=\".pdf\" multiple>\
<button type=\"submit\">Analyze</button></form>\
<div id=\"messages\"></div><div id=\"charts\"></div>";

/// Chart element ids must agree with [`crate::ChartSpec::element_id`].
const INGEST_SCRIPT: &str = "\
const messages = document.getElementById('messages');\n\
const charts = document.getElementById('charts');\n\
function show(text, className) {\n\
  messages.appendChild(Object.assign(document.createElement('p'), { className, textContent: text }));\n\
}\n\
document.getElementById('ingest').addEventListener('submit', async (e) => {\n\
  e.preventDefault();\n\
  messages.replaceChildren();\n\
  charts.replaceChildren();\n\
  const ingest = await fetch('/api/incidents/upload', { method: 'POST', body: new FormData(e.target) });\n\
  const ingested = await ingest.json();\n\
  if (!ingest.ok) { show(ingested.error, 'error'); return; }\n\
  ingested.errors.forEach((msg) => show(msg, 'warning'));\n\
  const analysis = await fetch('/api/analyze', { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify({ incidents: ingested.incidents }) });\n\
  const result = await analysis.json();\n\
  if (!analysis.ok) { show(result.error, 'error'); return; }\n\
  for (const kind of ['scatter', 'bar', 'pie']) {\n\
    const div = Object.assign(document.createElement('div'), { id: `chart-${kind}`, className: 'chart' });\n\
    charts.appendChild(div);\n\
    vegaEmbed(div, result.charts[kind].spec, { actions: false });\n\
  }\n\
});\n";

/// Escapes text for an HTML element body or attribute.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON that is safe to inline in a `<script>` element.
fn script_json(value: &serde_json::Value) -> Result<String, ChartError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn feedback_script() -> String {
    format!(
        "document.getElementById('feedback').addEventListener('submit', async (e) => {{\n\
  e.preventDefault();\n\
  const feedback = document.getElementById('feedback-text').value;\n\
  const res = await fetch('/api/feedback', {{ method: 'POST', headers: {{ 'Content-Type': 'application/json' }}, body: JSON.stringify({{ feedback }}) }});\n\
  if (res.ok && (await res.json()).submitted) {{\n\
    e.target.replaceWith(Object.assign(document.createElement('p'), {{ className: 'notice', textContent: '{FEEDBACK_THANKS}' }}));\n\
  }}\n\
}});\n"
    )
}

/// Wraps a body and its script in the shared page shell.
fn document(body: &str, script: &str) -> String {
    let scripts: String = VEGA_SCRIPTS
        .iter()
        .map(|src| format!("<script src=\"{src}\"></script>"))
        .collect();

    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{PAGE_TITLE}</title>{scripts}\
<style>body{{font-family:sans-serif;margin:2em}}label,textarea,input{{display:block;margin:.5em 0}}\
.error{{color:#b00}}.warning{{color:#a60}}.notice{{color:#070}}.chart{{margin:1em 0}}</style>\
</head><body><h1>{PAGE_TITLE}</h1>{body}<script>\n{script}</script></body></html>"
    )
}

/// Renders the report page.
///
/// Any of the three parts may be absent: no charts before an analysis has
/// run, no error on success.
///
/// # Errors
///
/// Returns [`ChartError::Serialize`] if a chart spec cannot be serialised.
pub fn render_page(
    charts: Option<&ChartSet>,
    error: Option<&str>,
    feedback_submitted: bool,
) -> Result<String, ChartError> {
    let mut body = String::new();

    if let Some(error) = error {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape_html(error));
    }

    if feedback_submitted {
        let _ = write!(body, "<p class=\"notice\">{FEEDBACK_THANKS}</p>");
    }

    let mut script = String::new();
    if let Some(charts) = charts {
        for chart in charts.charts() {
            let id = chart.element_id();
            let _ = write!(body, "<div id=\"{id}\" class=\"chart\"></div>");
            let _ = writeln!(
                script,
                "vegaEmbed('#{id}', {}, {{ actions: false }});",
                script_json(&chart.spec)?
            );
        }
    }

    body.push_str(FEEDBACK_FORM);
    script.push_str(&feedback_script());

    Ok(document(&body, &script))
}

/// Renders the interactive page: URL and PDF inputs, a chart area filled
/// in the browser, and the feedback form.
#[must_use]
pub fn render_index() -> String {
    let body = format!("{INGEST_FORM}{FEEDBACK_FORM}");
    let script = format!("{INGEST_SCRIPT}{}", feedback_script());
    document(&body, &script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::report;
    use crate::{ChartKind, render_charts};

    #[test]
    fn embeds_every_chart() {
        let charts = render_charts(&report());
        let html = render_page(Some(&charts), None, false).unwrap();
        for id in ["chart-scatter", "chart-bar", "chart-pie"] {
            assert!(html.contains(&format!("<div id=\"{id}\"")), "{id}");
            assert!(html.contains(&format!("vegaEmbed('#{id}'")), "{id}");
        }
        assert!(html.contains("Incident Clusters Based on Nature"));
        assert!(!html.contains("class=\"error\""));
        assert!(!html.contains("id=\"ingest\""));
    }

    #[test]
    fn error_is_escaped() {
        let html = render_page(None, Some("<b>Failed</b> & more"), false).unwrap();
        assert!(html.contains("<p class=\"error\">&lt;b&gt;Failed&lt;/b&gt; &amp; more</p>"));
        assert!(!html.contains("vegaEmbed('#"));
        assert!(!html.contains("<p class=\"notice\">"));
    }

    #[test]
    fn feedback_acknowledgement() {
        let html = render_page(None, None, true).unwrap();
        assert!(html.contains(&format!("<p class=\"notice\">{FEEDBACK_THANKS}</p>")));
    }

    #[test]
    fn script_json_cannot_close_the_script() {
        let value = serde_json::json!({ "Nature": "</script><script>alert(1)" });
        assert!(!script_json(&value).unwrap().contains("</script>"));
    }

    #[test]
    fn index_takes_urls_and_pdfs() {
        let html = render_index();
        assert!(html.contains("<textarea id=\"urls\" name=\"urls\""));
        assert!(html.contains("type=\"file\" name=\"files\" accept=\".pdf\" multiple"));
        assert!(html.contains("fetch('/api/incidents/upload'"));
        assert!(html.contains("fetch('/api/analyze'"));
        assert!(html.contains("<form id=\"feedback\">"));
    }

    #[test]
    fn index_script_embeds_every_chart_kind() {
        for kind in [ChartKind::Scatter, ChartKind::Bar, ChartKind::Pie] {
            assert!(INGEST_SCRIPT.contains(&format!("'{}'", kind.as_ref())), "{kind}");
        }
        assert!(INGEST_SCRIPT.contains("`chart-${kind}`"));
    }
}
