//! Search execution: navigate the results endpoint and parse the organic
//! result listing into ordered, deduplicated candidates.

use anyhow::anyhow;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use websift_browser::Session;
use websift_common::{Result, WebsiftError};

const SEARCH_ENDPOINT: &str = "https://www.google.com/search";

/// One candidate result. No identity beyond the URL; URLs are unique
/// within one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
}

/// Run one search on the given (scripts-enabled) session.
///
/// The search step is load-bearing: navigation or read failures are fatal
/// and not retried. An empty hit list is a valid outcome.
pub async fn search(session: &Session, query: &str, deadline: Duration) -> Result<Vec<SearchHit>> {
    let endpoint = Url::parse_with_params(SEARCH_ENDPOINT, &[("q", query), ("udm", "14")])
        .map_err(|e| WebsiftError::SearchNavigation(anyhow!("building search url: {e}")))?;

    let page = session
        .open_page()
        .await
        .map_err(WebsiftError::SearchNavigation)?;

    let nav = tokio::time::timeout(deadline, page.goto(endpoint.as_str())).await;
    match nav {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            page.close().await;
            return Err(WebsiftError::SearchNavigation(e));
        }
        Err(_) => {
            page.close().await;
            return Err(WebsiftError::SearchNavigation(anyhow!(
                "search navigation timed out after {}ms",
                deadline.as_millis()
            )));
        }
    }

    let html = match page.content().await {
        Ok(html) => html,
        Err(e) => {
            page.close().await;
            return Err(WebsiftError::SearchNavigation(e));
        }
    };
    page.close().await;

    let hits = parse_search_results(&html);
    tracing::info!(
        target: "web.search",
        query = %query,
        hit_count = hits.len(),
        "search.results"
    );
    Ok(hits)
}

/// Parse the organic-results region of a rendered results page.
///
/// Anchors carrying the result-tracking attribute are taken in DOM order
/// (the engine's relevance order); the nested heading supplies the title.
/// Entries with an empty title, video-watch links, and repeated URLs are
/// dropped.
pub fn parse_search_results(html: &str) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);
    let (Ok(anchor_sel), Ok(title_sel)) = (
        Selector::parse("#rso a[jsname]"),
        Selector::parse("h3"),
    ) else {
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut hits = Vec::new();

    for anchor in doc.select(&anchor_sel) {
        let url = anchor.value().attr("href").unwrap_or_default();
        let title: String = anchor
            .select(&title_sel)
            .next()
            .map(|h| h.text().collect::<String>())
            .unwrap_or_default();
        let title = title.trim();

        if url.is_empty() || title.is_empty() {
            continue;
        }
        if url.contains("youtube.com/watch?v") {
            continue;
        }
        if seen.insert(url.to_string()) {
            hits.push(SearchHit {
                url: url.to_string(),
                title: title.to_string(),
            });
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_page(anchors: &str) -> String {
        format!(
            "<html><body><div id=\"search\"><div id=\"rso\">{anchors}</div></div></body></html>"
        )
    }

    fn anchor(url: &str, title: &str) -> String {
        format!("<a jsname=\"x1\" href=\"{url}\"><h3>{title}</h3></a>")
    }

    #[test]
    fn parses_anchors_in_dom_order() {
        let html = results_page(&format!(
            "{}{}",
            anchor("https://a.example", "France"),
            anchor("https://b.example", "France facts"),
        ));
        let hits = parse_search_results(&html);
        assert_eq!(
            hits,
            vec![
                SearchHit {
                    url: "https://a.example".into(),
                    title: "France".into()
                },
                SearchHit {
                    url: "https://b.example".into(),
                    title: "France facts".into()
                },
            ]
        );
    }

    #[test]
    fn duplicate_urls_keep_first_occurrence() {
        let html = results_page(&format!(
            "{}{}{}",
            anchor("https://a.example", "First"),
            anchor("https://a.example", "Second"),
            anchor("https://b.example", "Third"),
        ));
        let hits = parse_search_results(&html);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "First");
        assert_eq!(hits[1].url, "https://b.example");
    }

    #[test]
    fn entries_without_titles_are_dropped() {
        let html = results_page(&format!(
            "<a jsname=\"x1\" href=\"https://a.example\"></a>{}",
            anchor("https://b.example", "Titled"),
        ));
        let hits = parse_search_results(&html);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://b.example");
    }

    #[test]
    fn video_watch_links_are_dropped() {
        let html = results_page(&format!(
            "{}{}",
            anchor("https://www.youtube.com/watch?v=abc123", "A video"),
            anchor("https://a.example", "An article"),
        ));
        let hits = parse_search_results(&html);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://a.example");
    }

    #[test]
    fn anchors_outside_the_results_region_are_ignored() {
        let html = format!(
            "<html><body><div id=\"nav\">{}</div><div id=\"rso\">{}</div></body></html>",
            anchor("https://nav.example", "Navigation"),
            anchor("https://a.example", "Result"),
        );
        let hits = parse_search_results(&html);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://a.example");
    }

    #[test]
    fn untracked_anchors_are_ignored() {
        let html = results_page(
            "<a href=\"https://plain.example\"><h3>No tracking attribute</h3></a>",
        );
        assert!(parse_search_results(&html).is_empty());
    }

    #[test]
    fn empty_page_yields_empty_list() {
        assert!(parse_search_results("<html><body></body></html>").is_empty());
    }
}
