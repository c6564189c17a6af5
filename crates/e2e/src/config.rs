//! Harness configuration
//!
//! Loaded from a TOML file (`uitour.toml` by default). A missing file yields
//! the defaults, which target a local Structr instance.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// URL opened when a scenario starts
    pub base_url: String,

    /// Probe the base URL over HTTP before launching the browser
    pub probe_target: bool,

    /// How long the target probe keeps trying
    pub probe_timeout_ms: u64,

    /// Directory for reports, frames and walkthrough pages
    pub output_dir: PathBuf,

    /// Directory scanned for scenario files
    pub scenarios_dir: PathBuf,

    pub credentials: Credentials,

    pub browser: BrowserConfig,

    pub recording: RecordingConfig,

    pub selectors: Selectors,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8082/structr/#pages".to_string(),
            probe_target: true,
            probe_timeout_ms: 10_000,
            output_dir: PathBuf::from("test-results"),
            scenarios_dir: PathBuf::from("scenarios"),
            credentials: Credentials::default(),
            browser: BrowserConfig::default(),
            recording: RecordingConfig::default(),
            selectors: Selectors::default(),
        }
    }
}

/// Login credentials used when a scenario does not name its own
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// Which browser engine Playwright launches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = E2eError;

    fn from_str(s: &str) -> E2eResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" | "safari" => Ok(BrowserKind::Webkit),
            other => Err(E2eError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// Browser session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub kind: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Bound applied to selector waits that don't carry their own
    pub default_timeout_ms: u64,

    /// Poll interval for readiness predicates
    pub poll_interval_ms: u64,

    /// Per-keystroke delay for animated typing
    pub typing_delay_ms: u64,

    /// Executable used to run the Playwright bridge
    pub node_binary: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            default_timeout_ms: 5000,
            poll_interval_ms: 50,
            typing_delay_ms: 60,
            node_binary: PathBuf::from("node"),
        }
    }
}

impl BrowserConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Screen recording for walkthrough pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub enabled: bool,

    /// Render the walkthrough page even when recording is off
    pub render_walkthrough: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            render_walkthrough: true,
        }
    }
}

/// Selectors used by the login and page-creation flows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub username_field: String,
    pub password_field: String,
    pub login_button: String,
    pub logged_in_marker: String,
    pub add_page_button: String,
    pub page_tabs: String,
    pub active_tab: String,
    pub active_tab_name: String,
    pub rename_input: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            username_field: "#usernameField".to_string(),
            password_field: "#passwordField".to_string(),
            login_button: "#loginButton".to_string(),
            logged_in_marker: "#pages".to_string(),
            add_page_button: "#add_page".to_string(),
            page_tabs: "#previewTabs li.page".to_string(),
            active_tab: "#previewTabs li.page.active".to_string(),
            active_tab_name: "#previewTabs li.page.active .name_".to_string(),
            rename_input: "#previewTabs li input.new-name".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(E2eError::Config("base_url must not be empty".to_string()));
        }
        if self.browser.default_timeout_ms == 0 {
            return Err(E2eError::Config(
                "browser.default_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Directory holding the frames recorded for one scenario
    pub fn frames_dir(&self, scenario: &str) -> PathBuf {
        self.output_dir.join(scenario).join("frames")
    }
}
