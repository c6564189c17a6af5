//! Browser session abstraction
//!
//! The runner only talks to a [`BrowserSession`]; the Playwright bridge is
//! one implementation, the integration tests provide another.

use std::path::Path;

use async_trait::async_trait;

use crate::error::E2eResult;

/// A live browser page driven by the runner.
///
/// Selector-taking methods act on the first matching element. None of them
/// wait for the element to appear; synchronization is done with
/// [`crate::wait::wait_until`].
#[async_trait]
pub trait BrowserSession: Send {
    /// Open a URL in the page
    async fn goto(&mut self, url: &str) -> E2eResult<()>;

    /// Click the element; fails with `ElementNotFound` if nothing matches
    async fn click(&mut self, selector: &str) -> E2eResult<()>;

    /// Move the pointer over the element
    async fn hover(&mut self, selector: &str) -> E2eResult<()>;

    /// Number of elements currently matching
    async fn count(&mut self, selector: &str) -> E2eResult<usize>;

    /// Text content of the first match, `None` if nothing matches
    async fn text(&mut self, selector: &str) -> E2eResult<Option<String>>;

    /// Type into the element one key at a time
    async fn type_text(&mut self, selector: &str, text: &str, delay_ms: u64) -> E2eResult<()>;

    /// Replace the element's value
    async fn fill(&mut self, selector: &str, value: &str) -> E2eResult<()>;

    /// Press a key, on the element if given, otherwise on the focused one
    async fn press(&mut self, selector: Option<&str>, key: &str) -> E2eResult<()>;

    /// Write a PNG of the viewport
    async fn screenshot(&mut self, path: &Path) -> E2eResult<()>;

    async fn close(&mut self) -> E2eResult<()>;
}

/// Opens a fresh session for each scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession;

    async fn open(&self) -> E2eResult<Self::Session>;
}
