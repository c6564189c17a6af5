//! Target probing - making sure the application under test answers before
//! a browser is pointed at it

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

const PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `base_url` until it answers any HTTP response.
///
/// Fragments are stripped before probing. Returns the number of attempts.
pub async fn wait_until_reachable(base_url: &str, timeout: Duration) -> E2eResult<usize> {
    let url = probe_url(base_url);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match client.get(&url).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    // Login redirects and 401s still mean the server is up
                    info!("Target answered {} at {}", resp.status(), url);
                }
                return Ok(attempts);
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} to come up...", url);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Probe error: {}", e);
                }
            }
        }

        if start.elapsed() >= timeout {
            return Err(E2eError::TargetUnreachable { url, attempts });
        }
        sleep(PROBE_INTERVAL).await;
    }
}

fn probe_url(base_url: &str) -> String {
    base_url.split('#').next().unwrap_or(base_url).to_string()
}
