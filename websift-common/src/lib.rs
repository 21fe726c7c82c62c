//! Common types and utilities shared across Websift crates.
//!
//! This crate defines the shared error taxonomy, the runtime configuration
//! for a retrieval run, and observability helpers used throughout the
//! Websift workspace. It is intentionally lightweight and
//! dependency‑minimal so that all crates can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`RetrievalConfig`]: Tunables for one question‑answering retrieval
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`WebsiftError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use websift_common::RetrievalConfig;
//!
//! let cfg = RetrievalConfig::default();
//! assert_eq!(cfg.pool_size, 3);
//! assert_eq!(cfg.page_timeout_ms, 1000);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Tunables for one retrieval run.
///
/// The defaults are the representative values the pipeline ships with;
/// deployments override them through `websift-config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of scripts-disabled sessions opened for the page-fetch fan-out.
    pub pool_size: usize,
    /// Deadline for a single candidate page navigation, in milliseconds.
    pub page_timeout_ms: u64,
    /// Deadline for the search results navigation. The search step is
    /// load-bearing and not retried, so it gets a wider budget than a
    /// candidate page.
    pub search_timeout_ms: u64,
    /// Cap on extracted text per page, in characters.
    pub max_content_chars: usize,
    /// Whether browser sessions run without a visible window.
    pub headless: bool,
    /// Chromedriver endpoint, tried first.
    pub chromedriver_url: String,
    /// Geckodriver endpoint, tried when Chromium is unavailable.
    pub geckodriver_url: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            pool_size: 3,
            page_timeout_ms: 1000,
            search_timeout_ms: 10_000,
            max_content_chars: 80_000,
            headless: true,
            chromedriver_url: "http://localhost:9515".to_string(),
            geckodriver_url: "http://localhost:4444".to_string(),
        }
    }
}

/// Error types used across the Websift system.
///
/// Only failures that leave the final text blob undefined surface through
/// these variants; a single unreachable candidate page degrades to an empty
/// extraction and never reaches the caller as an error.
#[derive(thiserror::Error, Debug)]
pub enum WebsiftError {
    /// No supported rendering engine could be launched. The message
    /// aggregates the per-engine launch errors.
    #[error("no rendering engine available: {0}")]
    NoRenderingEngine(String),

    /// The search-query generation call failed.
    #[error("query generation failed: {0}")]
    QueryGeneration(String),

    /// Navigating to or reading the search results page failed.
    #[error("search navigation failed: {0}")]
    SearchNavigation(#[from] anyhow::Error),

    /// An LLM collaborator reported an error.
    #[error("llm error: {0}")]
    Llm(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`WebsiftError`].
pub type Result<T> = std::result::Result<T, WebsiftError>;
