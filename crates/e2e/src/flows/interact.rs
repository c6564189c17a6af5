//! Pointer and keyboard helpers used by flows and scenario steps

use std::time::Duration;

use tracing::debug;

use crate::error::E2eResult;
use crate::session::BrowserSession;
use crate::wait::wait_for_selector;

/// Hover the element, then click it.
///
/// With a non-zero `wait` the element is awaited first; with zero it must
/// already be on the page.
pub async fn move_pointer_and_click<S>(
    session: &mut S,
    selector: &str,
    wait: Duration,
    interval: Duration,
) -> E2eResult<()>
where
    S: BrowserSession + ?Sized,
{
    if !wait.is_zero() {
        wait_for_selector(session, selector, wait, interval).await?;
    }
    debug!("Pointer to {}", selector);
    session.hover(selector).await?;
    session.click(selector).await
}

/// Type `text` key by key, optionally clearing first and pressing Enter after.
pub async fn animated_type<S>(
    session: &mut S,
    selector: &str,
    text: &str,
    clear: bool,
    commit: bool,
    delay_ms: u64,
) -> E2eResult<()>
where
    S: BrowserSession + ?Sized,
{
    if clear {
        session.fill(selector, "").await?;
    }
    session.type_text(selector, text, delay_ms).await?;
    if commit {
        session.press(Some(selector), "Enter").await?;
    }
    Ok(())
}
