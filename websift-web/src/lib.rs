//! Web discovery and acquisition for the retrieval pipeline.
//!
//! - Search results parsing and navigation (`search`)
//! - Page content extraction under a deadline (`extract`)
//! - DOM pruning over a generic node tree (`dom`)
//! - Deterministic HTML→Markdown-like text conversion (`text`)

pub mod dom;
pub mod extract;
pub mod search;
pub mod text;
