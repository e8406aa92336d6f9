//! Human-readable renderings of a [`Report`].
//!
//! Renderers only interpolate; every count and pass/fail flag comes from the
//! report as built.

use std::fmt::Write as _;

use crate::report::{Report, ScenarioReport};

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 0; padding: 2rem; background: #f5f5f7; color: #1d1d1f; }
h1 { margin-top: 0; }
.status { padding: 1rem 1.5rem; border-radius: 12px; color: #fff; font-size: 1.25rem; font-weight: 600; margin-bottom: 1.5rem; }
.status.pass { background: #1f9d55; }
.status.fail { background: #cc1f1a; }
.counters { display: flex; gap: 1rem; margin-bottom: 2rem; }
.counter { background: #fff; border-radius: 12px; padding: 1rem 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
.counter .value { font-size: 1.75rem; font-weight: 700; }
.counter .label { color: #6e6e73; font-size: .85rem; }
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 1rem; }
.card { background: #fff; border-radius: 12px; padding: 1rem 1.25rem; box-shadow: 0 1px 3px rgba(0,0,0,.08); border-left: 6px solid #1f9d55; }
.card.fail { border-left-color: #cc1f1a; }
.badge { display: inline-block; padding: .15rem .6rem; border-radius: 999px; font-size: .75rem; font-weight: 700; color: #fff; background: #1f9d55; }
.badge.fail { background: #cc1f1a; }
.card dl { display: grid; grid-template-columns: auto 1fr; gap: .25rem 1rem; margin: .75rem 0 0; }
.card dt { color: #6e6e73; }
.card dd { margin: 0; }
.error { margin-top: .75rem; color: #cc1f1a; font-family: monospace; white-space: pre-wrap; }
"#;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn pass_class(passed: bool) -> &'static str {
    if passed {
        "pass"
    } else {
        "fail"
    }
}

fn render_card(out: &mut String, scenario: &ScenarioReport) {
    let class = pass_class(scenario.passed);
    let _ = writeln!(out, r#"<section class="card {class}">"#);
    let _ = writeln!(
        out,
        r#"<h2>{} <span class="badge {class}">{}</span></h2>"#,
        escape(&scenario.name),
        if scenario.passed { "PASS" } else { "FAIL" }
    );
    out.push_str("<dl>\n");
    let _ = writeln!(out, "<dt>Duration</dt><dd>{} ms</dd>", scenario.duration_ms);
    let _ = writeln!(
        out,
        "<dt>Steps</dt><dd>{}/{} passed</dd>",
        scenario.steps.saturating_sub(scenario.failed_steps),
        scenario.steps
    );
    let _ = writeln!(
        out,
        "<dt>Assertions</dt><dd>{}/{} passed</dd>",
        scenario.assertions.passed, scenario.assertions.total
    );
    if scenario.assertions.expected_failures > 0 {
        let _ = writeln!(
            out,
            "<dt>Expected denials</dt><dd>{}</dd>",
            scenario.assertions.expected_failures
        );
    }
    let _ = writeln!(out, "<dt>Warnings</dt><dd>{}</dd>", scenario.warnings);
    let _ = writeln!(out, "<dt>Errors</dt><dd>{}</dd>", scenario.errors);
    out.push_str("</dl>\n");
    if let Some(error) = &scenario.error {
        let _ = writeln!(out, r#"<div class="error">{}</div>"#, escape(error));
    }
    out.push_str("</section>\n");
}

/// Render the report as a self-contained HTML page.
pub fn render_html(report: &Report) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>Launch Simulation Report</title>\n");
    let _ = writeln!(out, "<style>{STYLE}</style>");
    out.push_str("</head>\n<body>\n<h1>Launch Simulation Report</h1>\n");
    let _ = writeln!(out, "<p>Generated {}</p>", escape(&report.timestamp));

    let _ = writeln!(
        out,
        r#"<div class="status {}">{}</div>"#,
        pass_class(summary.passed),
        if summary.passed {
            "READY FOR LAUNCH: all scenarios passed"
        } else {
            "NOT READY: some scenarios failed"
        }
    );

    out.push_str("<div class=\"counters\">\n");
    for (value, label) in [
        (summary.total_scenarios.to_string(), "Scenarios"),
        (summary.passed_scenarios.to_string(), "Passed"),
        (summary.failed_scenarios.to_string(), "Failed"),
        (format!("{} ms", summary.total_duration_ms), "Total duration"),
    ] {
        let _ = writeln!(
            out,
            r#"<div class="counter"><div class="value">{value}</div><div class="label">{label}</div></div>"#
        );
    }
    out.push_str("</div>\n<div class=\"cards\">\n");

    for scenario in &report.scenarios {
        render_card(&mut out, scenario);
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

/// Render the console summary printed at the end of a run.
pub fn render_text(report: &Report) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "=== Launch Simulation ===");
    for scenario in &report.scenarios {
        let _ = writeln!(
            out,
            "  [{}] {} ({} ms, assertions {}/{}, warnings {}, errors {})",
            if scenario.passed { "PASS" } else { "FAIL" },
            scenario.name,
            scenario.duration_ms,
            scenario.assertions.passed,
            scenario.assertions.total,
            scenario.warnings,
            scenario.errors,
        );
        if let Some(error) = &scenario.error {
            let _ = writeln!(out, "         {error}");
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Scenarios: {} total, {} passed, {} failed",
        summary.total_scenarios, summary.passed_scenarios, summary.failed_scenarios
    );
    let _ = writeln!(out, "Duration:  {} ms", summary.total_duration_ms);
    let _ = writeln!(
        out,
        "Result:    {}",
        if summary.passed { "PASSED" } else { "FAILED" }
    );
    out
}
