//! Prometheus text exposition format.
//!
//! Renders the counter registry into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use std::collections::BTreeMap;

use crate::dispatch::{GLOBAL_ERRORS, GLOBAL_TOTAL};

const CHECKS_TOTAL: &str = "throttle_checks_total";
const CHECK_ERRORS_TOTAL: &str = "throttle_check_errors_total";
const APP_CHECKS_TOTAL: &str = "throttle_app_checks_total";
const APP_CHECK_ERRORS_TOTAL: &str = "throttle_app_check_errors_total";

/// Render a counter snapshot into Prometheus text format.
///
/// The global counters become `throttle_checks_total` and
/// `throttle_check_errors_total`. Per-app counters `check.<app>.total` and
/// `check.<app>.error` become `throttle_app_checks_total{app="<app>"}` and
/// `throttle_app_check_errors_total{app="<app>"}`. Any other name is
/// sanitized into a bare `throttle_` metric name.
pub fn render_prometheus(counters: &[(String, u64)]) -> String {
    let mut families: BTreeMap<String, Vec<(Option<&str>, u64)>> = BTreeMap::new();
    for (name, value) in counters {
        let (family, app) = family_of(name);
        families.entry(family).or_default().push((app, *value));
    }

    let mut out = String::new();
    for (family, samples) in &families {
        if let Some(help) = help_for(family) {
            out.push_str(&format!("# HELP {family} {help}\n"));
        }
        out.push_str(&format!("# TYPE {family} counter\n"));
        for (app, value) in samples {
            match app {
                Some(app) => out.push_str(&format!(
                    "{family}{{app=\"{}\"}} {value}\n",
                    escape_label(app)
                )),
                None => out.push_str(&format!("{family} {value}\n")),
            }
        }
    }

    out
}

fn family_of(name: &str) -> (String, Option<&str>) {
    if name == GLOBAL_TOTAL {
        return (CHECKS_TOTAL.to_string(), None);
    }
    if name == GLOBAL_ERRORS {
        return (CHECK_ERRORS_TOTAL.to_string(), None);
    }
    if let Some(rest) = name.strip_prefix("check.") {
        if let Some((app, kind)) = rest.rsplit_once('.') {
            if !app.is_empty() && !kind.is_empty() {
                let family = match kind {
                    "total" => APP_CHECKS_TOTAL.to_string(),
                    "error" => APP_CHECK_ERRORS_TOTAL.to_string(),
                    other => format!("throttle_app_check_{}_total", sanitize(other)),
                };
                return (family, Some(app));
            }
        }
    }
    (format!("throttle_{}", sanitize(name)), None)
}

fn help_for(family: &str) -> Option<&'static str> {
    match family {
        CHECKS_TOTAL => Some("Throttle checks evaluated across all apps."),
        CHECK_ERRORS_TOTAL => Some("Throttle checks not admitted across all apps."),
        APP_CHECKS_TOTAL => Some("Throttle checks evaluated per app."),
        APP_CHECK_ERRORS_TOTAL => Some("Throttle checks not admitted per app."),
        _ => None,
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
