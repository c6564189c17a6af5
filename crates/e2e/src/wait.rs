//! Readiness predicates
//!
//! Every synchronization point polls a predicate against the live page with
//! a hard bound, instead of sleeping for a fixed amount of time.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::error::{E2eError, E2eResult};
use crate::session::BrowserSession;

/// A condition on the current page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// At least one element matches
    Present(String),

    /// No element matches
    Absent(String),

    /// The first match's text contains `text`
    TextContains { selector: String, text: String },

    /// At least `count` elements match
    CountAtLeast { selector: String, count: usize },
}

impl Readiness {
    pub async fn holds<S>(&self, session: &mut S) -> E2eResult<bool>
    where
        S: BrowserSession + ?Sized,
    {
        match self {
            Readiness::Present(selector) => Ok(session.count(selector).await? > 0),
            Readiness::Absent(selector) => Ok(session.count(selector).await? == 0),
            Readiness::TextContains { selector, text } => Ok(session
                .text(selector)
                .await?
                .map(|actual| actual.contains(text.as_str()))
                .unwrap_or(false)),
            Readiness::CountAtLeast { selector, count } => {
                Ok(session.count(selector).await? >= *count)
            }
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Present(selector) => write!(f, "{} to appear", selector),
            Readiness::Absent(selector) => write!(f, "{} to disappear", selector),
            Readiness::TextContains { selector, text } => {
                write!(f, "{} to contain '{}'", selector, text)
            }
            Readiness::CountAtLeast { selector, count } => {
                write!(f, "at least {} of {}", count, selector)
            }
        }
    }
}

/// Poll `predicate` until it holds or `timeout` elapses.
///
/// The predicate is always evaluated at least once, so a zero timeout is a
/// plain check. Returns the time spent waiting.
pub async fn wait_until<S>(
    session: &mut S,
    predicate: &Readiness,
    timeout: Duration,
    interval: Duration,
) -> E2eResult<Duration>
where
    S: BrowserSession + ?Sized,
{
    let start = Instant::now();
    let mut polls = 0usize;

    loop {
        polls += 1;
        if predicate.holds(session).await? {
            let waited = start.elapsed();
            debug!("Ready: {} after {} ms ({} polls)", predicate, waited.as_millis(), polls);
            return Ok(waited);
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(E2eError::Timeout {
                what: predicate.to_string(),
                waited_ms: elapsed.as_millis() as u64,
            });
        }

        trace!("Not ready yet: {} (poll {})", predicate, polls);
        sleep(interval.min(timeout - elapsed)).await;
    }
}

/// Shorthand for waiting on a selector to be present
pub async fn wait_for_selector<S>(
    session: &mut S,
    selector: &str,
    timeout: Duration,
    interval: Duration,
) -> E2eResult<Duration>
where
    S: BrowserSession + ?Sized,
{
    wait_until(session, &Readiness::Present(selector.to_string()), timeout, interval).await
}
