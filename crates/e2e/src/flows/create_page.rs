//! Page-creation flow

use tracing::info;

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::report::TestCase;
use crate::session::BrowserSession;
use crate::wait::{wait_for_selector, wait_until, Readiness};

use super::interact::{animated_type, move_pointer_and_click};

/// Add a page and give it `name` through its preview tab.
///
/// Does not look for an existing page with the same name.
pub async fn create_page<S>(
    session: &mut S,
    case: &mut TestCase,
    config: &HarnessConfig,
    name: &str,
) -> E2eResult<()>
where
    S: BrowserSession + ?Sized,
{
    let sel = &config.selectors;
    let timeout = config.browser.default_timeout();
    let interval = config.browser.poll_interval();
    let delay = config.browser.typing_delay_ms;

    info!("Creating page {}", name);

    let result = async {
        let before = session.count(&sel.page_tabs).await?;
        move_pointer_and_click(session, &sel.add_page_button, timeout, interval).await?;

        let added = Readiness::CountAtLeast {
            selector: sel.page_tabs.clone(),
            count: before + 1,
        };
        wait_until(session, &added, timeout, interval).await?;

        move_pointer_and_click(session, &sel.active_tab, timeout, interval).await?;
        wait_for_selector(session, &sel.rename_input, timeout, interval).await?;
        animated_type(session, &sel.rename_input, name, true, true, delay).await?;

        let named = Readiness::TextContains {
            selector: sel.active_tab_name.clone(),
            text: name.to_string(),
        };
        wait_until(session, &named, timeout, interval).await?;
        Ok::<_, E2eError>(())
    }
    .await;

    let message = format!("page {} created", name);
    match result {
        Ok(()) => {
            case.assert_ok(message);
            Ok(())
        }
        Err(e) => {
            case.assert_failed(message, e.to_string());
            Err(E2eError::setup("create_page", e))
        }
    }
}
