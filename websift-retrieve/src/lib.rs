//! Retrieval orchestration: one question in, one joined text blob out.
//!
//! A retrieval runs query formulation and session opening concurrently,
//! issues a single search, fans page extraction out over a bounded pool
//! of scripts-disabled sessions, joins the surviving texts in dispatch
//! order, and closes every session it opened on every exit path.

pub mod answer;
pub mod query;

use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use websift_browser::Session;
use websift_common::{RetrievalConfig, Result, WebsiftError};
use websift_llm::traits::LlmClient;
use websift_web::extract::{extract_page, ExtractLimits};
use websift_web::search::search;

/// Literal token between concatenated per-page texts. Extraction rewrites
/// dash runs inside page content so nothing upstream can imitate it.
pub const PAGE_SEPARATOR: &str = "\n\n{PAGE SEPARATOR}\n\n";

/// Coordinates one retrieval per call. Sessions live only for the span of
/// a single `retrieve` invocation and are never shared across runs.
pub struct Retriever {
    llm: Arc<dyn LlmClient + Send + Sync>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, config: RetrievalConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Answer-material retrieval for `question`.
    ///
    /// Session storage lives under `workspace_root` and is gone by the
    /// time this returns, whether with a text blob or an error. An empty
    /// string is a valid result: it means no page yielded usable content.
    pub async fn retrieve(&self, question: &str, workspace_root: &Path) -> Result<String> {
        tracing::info!(target: "retrieve", question = %snippet(question), "retrieve.start");

        // Both halves run to completion before either result is
        // inspected, so a query failure can still close the sessions the
        // other half opened.
        let (query_res, sessions_res) = tokio::join!(
            query::formulate_query(self.llm.as_ref(), question),
            open_session_set(&self.config, workspace_root),
        );

        let sessions = sessions_res?;
        let query = match query_res {
            Ok(query) => query,
            Err(e) => {
                sessions.close().await;
                return Err(e);
            }
        };

        let result = self.fetch_and_join(&query, &sessions).await;
        sessions.close().await;

        match &result {
            Ok(text) => {
                tracing::info!(target: "retrieve", chars = text.len(), "retrieve.done")
            }
            Err(e) => tracing::warn!(target: "retrieve", error = %e, "retrieve.failed"),
        }
        result
    }

    async fn fetch_and_join(&self, query: &str, sessions: &SessionSet) -> Result<String> {
        let hits = search(
            &sessions.search,
            query,
            Duration::from_millis(self.config.search_timeout_ms),
        )
        .await?;

        if hits.is_empty() {
            tracing::info!(target: "retrieve", query = %snippet(query), "retrieve.no_results");
            return Ok(String::new());
        }

        let limits = ExtractLimits::from_config(&self.config);

        // One candidate per pooled session, in search order; `zip` bounds
        // the fan-out to whichever side is shorter. `join_all` collects in
        // dispatch order regardless of which page finishes first.
        let jobs = hits
            .iter()
            .zip(sessions.fetchers.iter())
            .map(|(hit, session)| extract_page(session, &hit.url, &limits));
        let texts = join_all(jobs).await;

        Ok(join_pages(texts))
    }
}

/// Drop empty extractions and join the rest with [`PAGE_SEPARATOR`].
pub fn join_pages(texts: Vec<String>) -> String {
    texts
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// The sessions one retrieval owns: a scripts-enabled one for the search
/// plus a fixed pool of scripts-disabled ones for the page fan-out.
struct SessionSet {
    search: Session,
    fetchers: Vec<Session>,
}

impl SessionSet {
    async fn close(self) {
        let mut closers = vec![self.search.close()];
        closers.extend(self.fetchers.into_iter().map(|s| s.close()));
        join_all(closers).await;
    }
}

async fn open_session_set(config: &RetrievalConfig, workspace_root: &Path) -> Result<SessionSet> {
    let search_fut = Session::open(config, workspace_root, true);
    let fetcher_futs = (0..config.pool_size).map(|_| Session::open(config, workspace_root, false));

    let (search_res, fetcher_res) = tokio::join!(search_fut, join_all(fetcher_futs));

    let mut errors = Vec::new();
    let search_session = match search_res {
        Ok(session) => Some(session),
        Err(e) => {
            errors.push(e);
            None
        }
    };
    let mut fetchers = Vec::new();
    for res in fetcher_res {
        match res {
            Ok(session) => fetchers.push(session),
            Err(e) => errors.push(e),
        }
    }

    match (search_session, errors.into_iter().next()) {
        (Some(search), None) => Ok(SessionSet { search, fetchers }),
        (search_session, first_error) => {
            // A partial set is useless; close whatever did open before
            // surfacing the failure.
            let mut closers: Vec<_> = search_session.into_iter().map(|s| s.close()).collect();
            closers.extend(fetchers.into_iter().map(|s| s.close()));
            join_all(closers).await;
            Err(first_error.unwrap_or_else(|| {
                WebsiftError::NoRenderingEngine("no session could be opened".into())
            }))
        }
    }
}

fn snippet(text: &str) -> String {
    if text.chars().count() > 120 {
        let head: String = text.chars().take(120).collect();
        format!("{head}…")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::sync::Mutex;
    use websift_common::{Result, WebsiftError};
    use websift_llm::traits::{LlmClient, LlmResponse, TextStream};

    /// Canned-response collaborator for orchestration tests.
    pub struct FakeLlm {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeLlm {
        pub fn returning(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn last_prompt(&self) -> String {
            self.prompts
                .lock()
                .unwrap()
                .last()
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for FakeLlm {
        async fn generate(
            &self,
            prompt: &str,
            _system_prompt: Option<&str>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> Result<LlmResponse> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.clone(),
                    model: Some("fake".into()),
                    tokens_used: None,
                }),
                Err(message) => Err(WebsiftError::Llm(message.clone())),
            }
        }

        async fn generate_stream(
            &self,
            prompt: &str,
            system_prompt: Option<&str>,
            max_tokens: Option<u32>,
            temperature: Option<f32>,
        ) -> Result<TextStream> {
            let response = self
                .generate(prompt, system_prompt, max_tokens, temperature)
                .await?;
            Ok(Box::pin(futures::stream::once(async move {
                Ok::<_, WebsiftError>(response.text)
            })))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn model_name(&self) -> &str {
            "fake"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joining_zero_pages_yields_empty_string() {
        assert_eq!(join_pages(vec![]), "");
    }

    #[test]
    fn joining_k_pages_yields_k_minus_one_separators() {
        let joined = join_pages(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(joined.matches("{PAGE SEPARATOR}").count(), 2);
        assert_eq!(joined, format!("a{PAGE_SEPARATOR}b{PAGE_SEPARATOR}c"));
    }

    #[test]
    fn failed_extractions_are_dropped_before_joining() {
        let joined = join_pages(vec!["first".into(), String::new(), "third".into()]);
        assert_eq!(joined, format!("first{PAGE_SEPARATOR}third"));
    }

    #[test]
    fn single_surviving_page_has_no_separator() {
        let joined = join_pages(vec![String::new(), "only".into()]);
        assert_eq!(joined, "only");
        assert!(!joined.contains("{PAGE SEPARATOR}"));
    }

    #[test]
    fn join_preserves_dispatch_order() {
        let joined = join_pages(vec!["z".into(), "a".into(), "m".into()]);
        assert_eq!(joined, format!("z{PAGE_SEPARATOR}a{PAGE_SEPARATOR}m"));
    }

    #[test]
    fn joined_output_matches_the_retrieval_format() {
        let a = websift_web::extract::render_page_text(
            "https://a.example",
            "<html><body><p>A body.</p></body></html>",
            80_000,
        );
        let b = websift_web::extract::render_page_text(
            "https://b.example",
            "<html><body><p>B body.</p></body></html>",
            80_000,
        );
        let joined = join_pages(vec![a, b]);
        assert_eq!(
            joined,
            "Contents of https://a.example:\n\nA body.\
             \n\n{PAGE SEPARATOR}\n\n\
             Contents of https://b.example:\n\nB body."
        );
    }
}
