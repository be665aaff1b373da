//! Publish report formatting

use skiff_types::PublishResult;
use std::time::Duration;

/// Route count above which the summary is abbreviated
pub const DEFAULT_ROUTE_SUMMARY_LIMIT: usize = 10;

/// Elapsed time as shown in reports, e.g. `(1.23 sec)`
pub fn format_time(elapsed: Duration) -> String {
    format!("({:.2} sec)", elapsed.as_secs_f64())
}

/// Route patterns in report form
///
/// With more than `limit` routes, the first `limit - 1` are named and the
/// rest collapse into a single `+N more` line.
pub fn summarize_routes(routes: &[String], limit: usize) -> Vec<String> {
    if routes.len() <= limit {
        return routes.to_vec();
    }

    let shown = limit.saturating_sub(1);
    let mut lines: Vec<String> = routes[..shown].to_vec();
    lines.push(format!("+{} more", routes.len() - shown));
    lines
}

/// Lines describing a completed publish
pub fn render(result: &PublishResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Uploaded {} {}",
        result.script,
        format_time(result.upload_duration())
    )];

    if result.has_targets() {
        lines.push(format!(
            "Published {} {}",
            result.script,
            format_time(result.activation_duration())
        ));
        lines.extend(result.activated_targets.iter().map(|t| format!("  {}", t)));
    } else {
        lines.push(format!(
            "No publish targets for {} {}",
            result.script,
            format_time(result.activation_duration())
        ));
    }
    lines
}
