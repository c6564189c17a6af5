//! Login flow

use tracing::info;

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::report::TestCase;
use crate::session::BrowserSession;
use crate::wait::wait_for_selector;

use super::interact::{animated_type, move_pointer_and_click};

/// Log in through the login form and wait for the logged-in view.
pub async fn login<S>(
    session: &mut S,
    case: &mut TestCase,
    config: &HarnessConfig,
    username: &str,
    password: &str,
) -> E2eResult<()>
where
    S: BrowserSession + ?Sized,
{
    let sel = &config.selectors;
    let timeout = config.browser.default_timeout();
    let interval = config.browser.poll_interval();
    let delay = config.browser.typing_delay_ms;

    info!("Logging in as {}", username);

    let result = async {
        wait_for_selector(session, &sel.username_field, timeout, interval).await?;
        animated_type(session, &sel.username_field, username, true, false, delay).await?;
        animated_type(session, &sel.password_field, password, true, false, delay).await?;
        move_pointer_and_click(session, &sel.login_button, timeout, interval).await?;
        wait_for_selector(session, &sel.logged_in_marker, timeout, interval).await?;
        Ok::<_, E2eError>(())
    }
    .await;

    let message = format!("logged in as {}", username);
    match result {
        Ok(()) => {
            case.assert_ok(message);
            Ok(())
        }
        Err(e) => {
            case.assert_failed(message, e.to_string());
            Err(E2eError::setup("login", e))
        }
    }
}
