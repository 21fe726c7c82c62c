//! Isolated browser sessions for the retrieval pipeline.
//!
//! A [`Session`] is a persistent WebDriver context bound to a private,
//! disposable storage directory. Sessions are opened against the first
//! rendering engine that answers (Chromium, then Firefox), optionally with
//! script execution disabled, and are exclusively owned by the retrieval
//! that opened them.

pub mod page;
pub mod session;
pub mod stealth;

pub use page::SessionPage;
pub use session::{Engine, Session};
