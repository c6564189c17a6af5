//! uitour E2E walkthrough framework
//!
//! This crate drives a content-management UI through scripted walkthrough
//! scenarios:
//! - Loads declarative YAML scenarios (the rename-page walkthrough ships built in)
//! - Controls a browser through a long-lived Playwright bridge process
//! - Synchronizes on readiness predicates with bounded timeouts
//! - Records frames and renders an HTML walkthrough per scenario
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SuiteRunner<SessionFactory>                │
//! │    ├── wait_until_reachable(base_url)                       │
//! │    ├── factory.open() -> BrowserSession                     │
//! │    └── ScenarioRunner::run(scenario, session) -> TestCase   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                             │
//! │    ├── initialize: goto(base_url)                           │
//! │    ├── flows: login, create_page (one assertion each)       │
//! │    ├── click / wait_for / type / settle / assert_text       │
//! │    └── Recorder frames + Walkthrough sections -> .html      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod flows;
pub mod playwright;
pub mod recording;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod target;
pub mod wait;

pub use config::HarnessConfig;
pub use error::{E2eError, E2eResult};
pub use playwright::{PlaywrightLauncher, PlaywrightSession};
pub use report::{Outcome, SuiteResult, TestCase};
pub use runner::{ScenarioRunner, SuiteRunner};
pub use scenario::{Scenario, ScenarioStep};
pub use session::{BrowserSession, SessionFactory};
pub use wait::Readiness;
