//! Content extraction: fetch one candidate page under a deadline and
//! reduce its markup to bounded, noise-free text.
//!
//! `extract_page` is a total function. Slow, unreachable, or unreadable
//! pages log a warning and come back as an empty string; the failure
//! never reaches the rest of the batch.

use crate::{dom, text};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::sleep;
use websift_browser::Session;
use websift_common::RetrievalConfig;

const READ_RETRIES: usize = 2;
const READ_BACKOFF: Duration = Duration::from_millis(100);

/// Bounds applied to one extraction.
#[derive(Debug, Clone)]
pub struct ExtractLimits {
    pub nav_deadline: Duration,
    pub max_chars: usize,
}

impl ExtractLimits {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            nav_deadline: Duration::from_millis(config.page_timeout_ms),
            max_chars: config.max_content_chars,
        }
    }
}

/// Fetch `url` through a dedicated page in `session` and return its text.
///
/// Returns `""` on any failure; the page opened here is closed on every
/// exit path.
pub async fn extract_page(session: &Session, url: &str, limits: &ExtractLimits) -> String {
    let page = match session.open_page().await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(target: "web.extract", url = %url, error = %e, "page.open_failed");
            return String::new();
        }
    };

    match tokio::time::timeout(limits.nav_deadline, page.goto(url)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(target: "web.extract", url = %url, error = %e, "page.unreachable");
            page.close().await;
            return String::new();
        }
        Err(_) => {
            tracing::warn!(
                target: "web.extract",
                url = %url,
                deadline_ms = limits.nav_deadline.as_millis() as u64,
                "page.slow"
            );
            page.close().await;
            return String::new();
        }
    }

    let mut html = None;
    for attempt in 0..=READ_RETRIES {
        match page.content().await {
            Ok(content) => {
                html = Some(content);
                break;
            }
            Err(e) => {
                if attempt < READ_RETRIES {
                    sleep(READ_BACKOFF).await;
                } else {
                    tracing::warn!(
                        target: "web.extract",
                        url = %url,
                        error = %e,
                        attempts = READ_RETRIES + 1,
                        "page.unreadable"
                    );
                }
            }
        }
    }
    page.close().await;

    match html {
        Some(html) => render_page_text(url, &html, limits.max_chars),
        None => String::new(),
    }
}

/// Reduce raw markup to the attributed, bounded, sanitized text artifact.
pub fn render_page_text(url: &str, html: &str, max_chars: usize) -> String {
    let mut body = dom::parse_body(html);
    dom::prune(&mut body);
    let converted = text::to_markdown(&body);

    let combined = format!("Contents of {url}:\n\n{}", truncate(&converted, max_chars));
    sanitize_separators(&combined)
}

/// Cap `text` at `max` characters, appending an explicit marker when
/// anything was cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut out: String = text.chars().take(max).collect();
        out.push_str("...");
        out
    } else {
        text.to_string()
    }
}

fn dash_runs() -> &'static Regex {
    static DASH_RUNS: OnceLock<Regex> = OnceLock::new();
    DASH_RUNS.get_or_init(|| Regex::new(r"-{3,}").expect("valid regex"))
}

/// Replace every run of 3+ dashes with an equal-length run of
/// underscores, so page content can never masquerade as the pipeline's
/// own section separator.
fn sanitize_separators(text: &str) -> String {
    dash_runs()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            "_".repeat(caps[0].len())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_text_is_attributed_and_converted() {
        let out = render_page_text(
            "https://a.example",
            "<html><body><h1>Title</h1><p>Body text.</p></body></html>",
            80_000,
        );
        assert_eq!(out, "Contents of https://a.example:\n\n# Title\n\nBody text.");
    }

    #[test]
    fn long_content_is_truncated_with_a_marker() {
        let body = format!("<html><body><p>{}</p></body></html>", "x".repeat(500));
        let out = render_page_text("https://a.example", &body, 100);

        let prefix = "Contents of https://a.example:\n\n";
        assert!(out.starts_with(prefix));
        let rest = &out[prefix.len()..];
        assert_eq!(rest.chars().count(), 100 + 3);
        assert!(rest.ends_with("..."));
    }

    #[test]
    fn short_content_is_not_marked() {
        let out = render_page_text(
            "https://a.example",
            "<html><body><p>short</p></body></html>",
            80_000,
        );
        assert!(!out.ends_with("..."));
    }

    #[test]
    fn dash_runs_become_underscores_of_equal_length() {
        assert_eq!(sanitize_separators("a --- b"), "a ___ b");
        assert_eq!(sanitize_separators("a ------ b"), "a ______ b");
        assert_eq!(sanitize_separators("a -- b"), "a -- b");
    }

    #[test]
    fn page_dashes_cannot_imitate_the_separator() {
        let body = "<html><body><p>before</p><p>----------</p><p>after</p></body></html>";
        let out = render_page_text("https://a.example", body, 80_000);
        assert!(!out.contains("---"));
        assert!(out.contains("__________"));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        let out = truncate(&text, 5);
        assert_eq!(out, format!("{}...", "é".repeat(5)));
    }
}
