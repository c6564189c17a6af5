//! Scenario runner
//!
//! Executes the steps of a scenario in order against one browser session.
//! Setup and driver errors abort the scenario; failed assertions are
//! recorded and the run goes on.

use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::flows::{animated_type, create_page, login, move_pointer_and_click};
use crate::recording::{Recorder, Walkthrough};
use crate::report::{Outcome, SuiteResult, TestCase};
use crate::scenario::{Scenario, ScenarioStep};
use crate::session::{BrowserSession, SessionFactory};
use crate::target::wait_until_reachable;
use crate::wait::{wait_for_selector, wait_until};

/// Per-run state threaded through the steps
struct RunState {
    case: TestCase,
    walkthrough: Walkthrough,
    recorder: Recorder,
}

/// Runs a single scenario against a session it is handed
pub struct ScenarioRunner<'a> {
    config: &'a HarnessConfig,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    /// Run `scenario` to completion and close the session.
    ///
    /// Never returns an error: every failure ends up in the test case.
    pub async fn run<S>(&self, scenario: &Scenario, session: &mut S) -> TestCase
    where
        S: BrowserSession + ?Sized,
    {
        let start = Instant::now();
        info!("Running scenario: {}", scenario.name);

        if let Err(e) = scenario.validate() {
            error!("{}", e);
            let mut case = TestCase::begin(&scenario.name, scenario.planned_assertions);
            case.abort(e);
            if let Err(e) = session.close().await {
                warn!("Closing session for {} failed: {}", scenario.name, e);
            }
            case.finish(0);
            return case;
        }

        let recorder = if self.config.recording.enabled {
            Recorder::new(self.config.frames_dir(&scenario.name), true).unwrap_or_else(|e| {
                warn!("Recording disabled for {}: {}", scenario.name, e);
                Recorder::disabled()
            })
        } else {
            Recorder::disabled()
        };

        let mut state = RunState {
            case: TestCase::begin(&scenario.name, scenario.planned_assertions),
            walkthrough: Walkthrough::new(
                &scenario.name,
                scenario.heading(),
                &scenario.description,
            ),
            recorder,
        };

        match self.initialize(session).await {
            Ok(()) => {
                state.recorder.capture(session, "initialize").await;
                self.run_steps(scenario, session, &mut state).await;
            }
            Err(e) => {
                error!("{}: {}", scenario.name, e);
                state.case.abort(e);
            }
        }

        if let Err(e) = session.close().await {
            warn!("Closing session for {} failed: {}", scenario.name, e);
        }

        let outcome = state.case.finish(start.elapsed().as_millis() as u64);
        info!(
            "Scenario {} finished: {:?} ({}/{} assertions passed)",
            scenario.name,
            outcome,
            state.case.passed_count(),
            state.case.planned
        );
        state.case
    }

    /// Open the base URL in the fresh session
    async fn initialize<S>(&self, session: &mut S) -> E2eResult<()>
    where
        S: BrowserSession + ?Sized,
    {
        debug!("Opening {}", self.config.base_url);
        session
            .goto(&self.config.base_url)
            .await
            .map_err(|e| E2eError::setup("initialize", e))
    }

    async fn run_steps<S>(&self, scenario: &Scenario, session: &mut S, state: &mut RunState)
    where
        S: BrowserSession + ?Sized,
    {
        let total = scenario.steps.len();
        for (i, step) in scenario.steps.iter().enumerate() {
            let name = step.name();
            debug!("Step {}/{}: {}", i + 1, total, name);

            if let Err(e) = self.execute(step, session, state).await {
                error!("Step {}/{} ({}) failed: {}", i + 1, total, name, e);
                let e = match e {
                    e @ (E2eError::Setup { .. } | E2eError::Timeout { .. }) => e,
                    other => E2eError::StepFailed {
                        step: name,
                        reason: other.to_string(),
                    },
                };
                state.case.abort(e);
                return;
            }

            if step.is_interaction() {
                state.recorder.capture(session, &name).await;
            }
        }
    }

    async fn execute<S>(&self, step: &ScenarioStep, session: &mut S, state: &mut RunState) -> E2eResult<()>
    where
        S: BrowserSession + ?Sized,
    {
        let browser = &self.config.browser;
        let interval = browser.poll_interval();

        match step {
            ScenarioStep::Navigate { url } => session.goto(&self.resolve_url(url)).await,
            ScenarioStep::Login { username, password } => {
                let creds = &self.config.credentials;
                let username = username.as_deref().unwrap_or(&creds.username);
                let password = password.as_deref().unwrap_or(&creds.password);
                login(session, &mut state.case, self.config, username, password).await
            }
            ScenarioStep::CreatePage { name } => {
                create_page(session, &mut state.case, self.config, name).await
            }
            ScenarioStep::Click { selector, wait_ms } => {
                move_pointer_and_click(session, selector, Duration::from_millis(*wait_ms), interval)
                    .await
            }
            ScenarioStep::Hover { selector } => session.hover(selector).await,
            ScenarioStep::WaitFor { selector, timeout_ms } => {
                let timeout = timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| browser.default_timeout());
                let message = format!("{} appeared", selector);
                match wait_for_selector(session, selector, timeout, interval).await {
                    Ok(_) => {
                        state.case.assert_ok(message);
                        Ok(())
                    }
                    Err(e) => {
                        if e.is_timeout() {
                            state.case.assert_failed(message, e.to_string());
                        }
                        Err(e)
                    }
                }
            }
            ScenarioStep::Type {
                selector,
                text,
                clear,
                commit,
                delay_ms,
            } => {
                let delay = delay_ms.unwrap_or(browser.typing_delay_ms);
                animated_type(session, selector, text, *clear, *commit, delay).await
            }
            ScenarioStep::Press { selector, key } => session.press(selector.as_deref(), key).await,
            ScenarioStep::Settle { until, timeout_ms } => {
                wait_until(session, until, Duration::from_millis(*timeout_ms), interval)
                    .await
                    .map(|_| ())
            }
            ScenarioStep::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(())
            }
            ScenarioStep::AssertText {
                selector,
                text,
                equals,
                matches,
            } => {
                let actual = session.text(selector).await?;
                let (message, passed) = match (text, equals, matches) {
                    (Some(expected), _, _) => (
                        format!("Find \"{}\" within the selector \"{}\"", expected, selector),
                        actual.as_deref().map_or(false, |a| a.contains(expected.as_str())),
                    ),
                    (_, Some(expected), _) => (
                        format!("Text of \"{}\" equals \"{}\"", selector, expected),
                        actual.as_deref().map_or(false, |a| a.trim() == expected),
                    ),
                    (_, _, Some(pattern)) => {
                        let re = Regex::new(pattern)?;
                        (
                            format!("Text of \"{}\" matches /{}/", selector, pattern),
                            actual.as_deref().map_or(false, |a| re.is_match(a)),
                        )
                    }
                    (None, None, None) => {
                        return Err(E2eError::ScenarioParse(format!(
                            "assert_text on {} has no expectation",
                            selector
                        )))
                    }
                };
                let detail = match &actual {
                    Some(a) => format!("actual text: {:?}", a),
                    None => "no element matched".to_string(),
                };
                state.case.record(message, passed, (!passed).then_some(detail));
                Ok(())
            }
            ScenarioStep::Screenshot { name } => {
                let path = self
                    .config
                    .output_dir
                    .join(&state.case.name)
                    .join(format!("{}.png", name));
                session.screenshot(&path).await
            }
            ScenarioStep::Section { text } => {
                state.walkthrough.push_section(text.as_str());
                Ok(())
            }
            ScenarioStep::Log { message } => {
                info!("[{}] {}", state.case.name, message);
                Ok(())
            }
            ScenarioStep::RenderWalkthrough => {
                if self.config.recording.render_walkthrough {
                    let path = state
                        .walkthrough
                        .render(&self.config.output_dir, state.recorder.frames())?;
                    state.case.walkthrough = Some(path);
                }
                Ok(())
            }
        }
    }

    /// Absolute URLs pass through; a leading `#` replaces the base URL's
    /// fragment; anything else is joined to the base URL without fragment.
    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        let base = self.config.base_url.split('#').next().unwrap_or_default();
        if url.starts_with('#') {
            return format!("{}{}", base, url);
        }
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

/// Runs scenarios one after another, each in a fresh session
pub struct SuiteRunner<F> {
    factory: F,
    config: HarnessConfig,
}

impl<F: SessionFactory> SuiteRunner<F> {
    pub fn new(factory: F, config: HarnessConfig) -> Self {
        Self { factory, config }
    }

    /// Run a list of scenarios
    pub async fn run_all(&self, scenarios: &[Scenario]) -> SuiteResult {
        let start = Instant::now();
        let mut cases = Vec::with_capacity(scenarios.len());

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let case = self.run_scenario(scenario).await;
            match case.outcome {
                Outcome::Passed => info!("✓ {} ({} ms)", case.name, case.duration_ms),
                _ => error!(
                    "✗ {} - {}",
                    case.name,
                    case.error.as_deref().unwrap_or("unknown error")
                ),
            }
            cases.push(case);
        }

        let result = SuiteResult::from_cases(cases, start.elapsed().as_millis() as u64);
        info!(
            "Results: {} passed, {} failed, {} errored ({} ms)",
            result.passed, result.failed, result.errored, result.duration_ms
        );
        result
    }

    /// Probe the target, open a session and run one scenario
    pub async fn run_scenario(&self, scenario: &Scenario) -> TestCase {
        if self.config.probe_target {
            if let Err(e) = wait_until_reachable(&self.config.base_url, self.config.probe_timeout()).await {
                return aborted(scenario, E2eError::setup("initialize", e));
            }
        }

        let mut session = match self.factory.open().await {
            Ok(session) => session,
            Err(e) => return aborted(scenario, E2eError::setup("initialize", e)),
        };

        ScenarioRunner::new(&self.config).run(scenario, &mut session).await
    }

    /// Where walkthroughs and the JSON report end up
    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir.clone()
    }
}

fn aborted(scenario: &Scenario, error: E2eError) -> TestCase {
    error!("{}: {}", scenario.name, error);
    let mut case = TestCase::begin(&scenario.name, scenario.planned_assertions);
    case.abort(error);
    case.finish(0);
    case
}
