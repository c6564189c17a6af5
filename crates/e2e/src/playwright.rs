//! Playwright browser automation
//!
//! A small Node.js bridge script owns the Playwright browser and serves
//! line-delimited JSON requests on stdin/stdout:
//!
//! ```text
//! -> {"id": 3, "op": "click", "args": {"selector": "#add_page"}}
//! <- {"id": 3, "ok": true, "result": null}
//! ```
//!
//! The bridge answers `id: 0` once the browser is up. One session is one
//! browser, one context and one page.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::{E2eError, E2eResult};
use crate::session::{BrowserSession, SessionFactory};

/// Upper bound for a single bridge round trip (navigation included)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const pw = require('playwright');

const config = JSON.parse(process.argv[2]);
const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');
const notFound = (selector) => {
  const e = new Error('no element matches ' + selector);
  e.notFound = true;
  return e;
};

(async () => {
  let browser, page;
  try {
    browser = await pw[config.browser].launch({ headless: config.headless });
    const context = await browser.newContext({
      viewport: { width: config.width, height: config.height }
    });
    page = await context.newPage();
  } catch (e) {
    reply({ id: 0, ok: false, error: e.message });
    process.exit(1);
  }
  reply({ id: 0, ok: true, result: browser.version() });

  const first = async (selector) => {
    const el = await page.$(selector);
    if (!el) throw notFound(selector);
    return el;
  };

  const ops = {
    goto: async (a) => { await page.goto(a.url); return null; },
    click: async (a) => { await (await first(a.selector)).click(); return null; },
    hover: async (a) => { await (await first(a.selector)).hover(); return null; },
    count: async (a) => await page.locator(a.selector).count(),
    text: async (a) => {
      const el = await page.$(a.selector);
      return el ? await el.textContent() : null;
    },
    type: async (a) => {
      const el = await first(a.selector);
      await el.type(a.text, { delay: a.delay });
      return null;
    },
    fill: async (a) => { await (await first(a.selector)).fill(a.value); return null; },
    press: async (a) => {
      if (a.selector) {
        await (await first(a.selector)).press(a.key);
      } else {
        await page.keyboard.press(a.key);
      }
      return null;
    },
    screenshot: async (a) => { await page.screenshot({ path: a.path }); return null; },
    close: async () => { await browser.close(); return null; },
  };

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let req;
    try {
      req = JSON.parse(line);
    } catch (e) {
      reply({ id: -1, ok: false, error: 'malformed request: ' + e.message });
      continue;
    }
    try {
      const op = ops[req.op];
      if (!op) throw new Error('unknown op ' + req.op);
      const result = await op(req.args || {});
      reply({ id: req.id, ok: true, result: result === undefined ? null : result });
    } catch (e) {
      reply({ id: req.id, ok: false, error: e.message, not_found: !!e.notFound });
    }
    if (req.op === 'close') break;
  }
  process.exit(0);
})();
"#;

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    op: &'a str,
    args: Value,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: i64,
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    not_found: bool,
}

/// Launch settings passed to the bridge on its command line
#[derive(Debug, Serialize)]
struct LaunchArgs<'a> {
    browser: &'a str,
    headless: bool,
    width: u32,
    height: u32,
}

/// A browser page driven through the Playwright bridge
pub struct PlaywrightSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    closed: bool,
    /// Keeps the bridge script on disk for the life of the process
    _script_dir: tempfile::TempDir,
}

impl PlaywrightSession {
    /// Start the bridge and wait for the browser to come up
    pub async fn launch(config: &BrowserConfig) -> E2eResult<Self> {
        check_playwright_installed(&config.node_binary).await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let launch_args = serde_json::to_string(&LaunchArgs {
            browser: config.kind.as_str(),
            headless: config.headless,
            width: config.viewport_width,
            height: config.viewport_height,
        })?;

        info!(
            "Launching {} ({}x{}, headless: {})",
            config.kind.as_str(),
            config.viewport_width,
            config.viewport_height,
            config.headless
        );

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .arg(&launch_args)
            .env("NODE_PATH", node_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::SessionStart(format!(
                    "Failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::SessionStart("Failed to get bridge stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::SessionStart("Failed to get bridge stdout".to_string()))?;

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            closed: false,
            _script_dir: script_dir,
        };

        match session.read_response(0).await {
            Ok(version) => {
                info!("Browser ready (version {})", version.as_str().unwrap_or("unknown"));
                Ok(session)
            }
            Err(e) => {
                session.terminate().await;
                Err(E2eError::SessionStart(e.to_string()))
            }
        }
    }

    /// Send a request and wait for its response
    async fn request(&mut self, op: &str, args: Value) -> E2eResult<Value> {
        if self.closed {
            return Err(E2eError::Bridge("session already closed".to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;

        let selector = args
            .get("selector")
            .and_then(|s| s.as_str())
            .map(String::from);

        let line = serde_json::to_string(&BridgeRequest { id, op, args })?;
        debug!("Bridge >>> {}", line);
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        match self.read_response(id as i64).await {
            Err(E2eError::ElementNotFound(_)) => Err(E2eError::ElementNotFound(
                selector.unwrap_or_else(|| op.to_string()),
            )),
            other => other,
        }
    }

    /// Read the response with `id`, bounded by the request timeout
    async fn read_response(&mut self, id: i64) -> E2eResult<Value> {
        match tokio::time::timeout(REQUEST_TIMEOUT, self.next_response(id)).await {
            Ok(result) => result,
            Err(_) => Err(E2eError::Timeout {
                what: format!("bridge response {}", id),
                waited_ms: REQUEST_TIMEOUT.as_millis() as u64,
            }),
        }
    }

    async fn next_response(&mut self, id: i64) -> E2eResult<Value> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Bridge("bridge exited".to_string()))?;
            debug!("Bridge <<< {}", line);

            let response: BridgeResponse = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(_) => {
                    // Playwright or the page may print to stdout
                    debug!("Ignoring non-protocol output: {}", line);
                    continue;
                }
            };

            if response.id != id {
                warn!("Dropping response for id {} while waiting for {}", response.id, id);
                continue;
            }

            if response.ok {
                return Ok(response.result);
            }
            let error = response.error.unwrap_or_else(|| "unknown error".to_string());
            if response.not_found {
                return Err(E2eError::ElementNotFound(error));
            }
            return Err(E2eError::Bridge(error));
        }
    }

    /// Stop the bridge: SIGTERM first, kill if it lingers
    async fn terminate(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && tokio::time::timeout(Duration::from_millis(500), self.child.wait())
                        .await
                        .is_ok()
                {
                    return;
                }
            }
        }

        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

#[async_trait]
impl BrowserSession for PlaywrightSession {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.request("goto", json!({ "url": url })).await.map(|_| ())
    }

    async fn click(&mut self, selector: &str) -> E2eResult<()> {
        self.request("click", json!({ "selector": selector })).await.map(|_| ())
    }

    async fn hover(&mut self, selector: &str) -> E2eResult<()> {
        self.request("hover", json!({ "selector": selector })).await.map(|_| ())
    }

    async fn count(&mut self, selector: &str) -> E2eResult<usize> {
        let value = self.request("count", json!({ "selector": selector })).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| E2eError::Bridge(format!("count returned {}", value)))
    }

    async fn text(&mut self, selector: &str) -> E2eResult<Option<String>> {
        let value = self.request("text", json!({ "selector": selector })).await?;
        Ok(value.as_str().map(String::from))
    }

    async fn type_text(&mut self, selector: &str, text: &str, delay_ms: u64) -> E2eResult<()> {
        self.request(
            "type",
            json!({ "selector": selector, "text": text, "delay": delay_ms }),
        )
        .await
        .map(|_| ())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> E2eResult<()> {
        self.request("fill", json!({ "selector": selector, "value": value }))
            .await
            .map(|_| ())
    }

    async fn press(&mut self, selector: Option<&str>, key: &str) -> E2eResult<()> {
        self.request("press", json!({ "selector": selector, "key": key }))
            .await
            .map(|_| ())
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.request("screenshot", json!({ "path": path.to_string_lossy() }))
            .await
            .map(|_| ())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }
        if let Err(e) = self.request("close", json!({})).await {
            warn!("Bridge close failed: {}", e);
        }
        self.closed = true;
        self.terminate().await;
        Ok(())
    }
}

/// Opens a fresh Playwright session per scenario
#[derive(Debug, Clone)]
pub struct PlaywrightLauncher {
    config: BrowserConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for PlaywrightLauncher {
    type Session = PlaywrightSession;

    async fn open(&self) -> E2eResult<PlaywrightSession> {
        PlaywrightSession::launch(&self.config).await
    }
}

/// Check that node can resolve the playwright package
async fn check_playwright_installed(node: &Path) -> E2eResult<()> {
    let status = Command::new(node)
        .args(["-e", "require.resolve('playwright')"])
        .env("NODE_PATH", node_path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

/// The bridge runs from a temp dir, so point module resolution at the
/// working directory's node_modules as well
fn node_path() -> String {
    let local = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("node_modules");

    match std::env::var("NODE_PATH") {
        Ok(existing) if !existing.is_empty() => {
            let sep = if cfg!(windows) { ";" } else { ":" };
            format!("{}{}{}", local.display(), sep, existing)
        }
        _ => local.display().to_string(),
    }
}
