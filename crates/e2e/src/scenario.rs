//! Declarative YAML scenarios

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};
use crate::wait::Readiness;

const RENAME_PAGE_YAML: &str = include_str!("../scenarios/005_rename_page.yaml");

/// A walkthrough scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name, also the walkthrough file stem
    pub name: String,

    /// Heading of the rendered walkthrough
    #[serde(default)]
    pub heading: Option<String>,

    /// One-line summary shown under the heading
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Number of assertions a conforming run checks
    #[serde(alias = "expected_assertions")]
    pub planned_assertions: usize,

    /// Steps to execute in order
    pub steps: Vec<ScenarioStep>,
}

/// A single step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Open a URL; relative URLs are joined to the base URL
    Navigate { url: String },

    /// Run the login flow
    Login {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },

    /// Run the page-creation flow
    CreatePage { name: String },

    /// Move the pointer to an element and click it
    Click {
        selector: String,
        /// Bound for waiting on the element first; 0 clicks right away
        #[serde(default)]
        wait_ms: u64,
    },

    Hover { selector: String },

    /// Wait for an element to appear; counts as an assertion
    WaitFor {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Animated typing, optionally followed by Enter
    Type {
        selector: String,
        text: String,
        #[serde(default)]
        clear: bool,
        #[serde(default)]
        commit: bool,
        #[serde(default)]
        delay_ms: Option<u64>,
    },

    Press {
        #[serde(default)]
        selector: Option<String>,
        key: String,
    },

    /// Wait until a readiness predicate holds
    Settle {
        until: Readiness,
        #[serde(default = "default_settle_timeout")]
        timeout_ms: u64,
    },

    /// Fixed delay (prefer `settle`)
    Sleep { ms: u64 },

    /// Check the text of the first matching element; exactly one of
    /// `text` (contains), `equals` or `matches` (regex) must be set
    AssertText {
        selector: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        equals: Option<String>,
        #[serde(default)]
        matches: Option<String>,
    },

    Screenshot { name: String },

    /// Append a paragraph to the walkthrough
    Section { text: String },

    Log { message: String },

    /// Render the walkthrough page from the sections gathered so far
    RenderWalkthrough,
}

fn default_settle_timeout() -> u64 {
    1000
}

impl ScenarioStep {
    /// Short label used in logs and frame names
    pub fn name(&self) -> String {
        match self {
            ScenarioStep::Navigate { url } => format!("navigate:{}", url),
            ScenarioStep::Login { username, .. } => {
                format!("login:{}", username.as_deref().unwrap_or("<default>"))
            }
            ScenarioStep::CreatePage { name } => format!("create_page:{}", name),
            ScenarioStep::Click { selector, .. } => format!("click:{}", selector),
            ScenarioStep::Hover { selector } => format!("hover:{}", selector),
            ScenarioStep::WaitFor { selector, .. } => format!("wait_for:{}", selector),
            ScenarioStep::Type { selector, .. } => format!("type:{}", selector),
            ScenarioStep::Press { key, .. } => format!("press:{}", key),
            ScenarioStep::Settle { until, .. } => format!("settle:{}", until),
            ScenarioStep::Sleep { ms } => format!("sleep:{}ms", ms),
            ScenarioStep::AssertText { selector, .. } => format!("assert_text:{}", selector),
            ScenarioStep::Screenshot { name } => format!("screenshot:{}", name),
            ScenarioStep::Section { .. } => "section".to_string(),
            ScenarioStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
            ScenarioStep::RenderWalkthrough => "render_walkthrough".to_string(),
        }
    }

    /// Whether the step changes what is on screen
    pub fn is_interaction(&self) -> bool {
        matches!(
            self,
            ScenarioStep::Navigate { .. }
                | ScenarioStep::Login { .. }
                | ScenarioStep::CreatePage { .. }
                | ScenarioStep::Click { .. }
                | ScenarioStep::Hover { .. }
                | ScenarioStep::Type { .. }
                | ScenarioStep::Press { .. }
                | ScenarioStep::Settle { .. }
        )
    }

    fn validate(&self, index: usize) -> E2eResult<()> {
        let invalid = |reason: &str| {
            Err(E2eError::ScenarioParse(format!(
                "step {} ({}): {}",
                index + 1,
                self.name(),
                reason
            )))
        };

        match self {
            ScenarioStep::Click { selector, .. }
            | ScenarioStep::Hover { selector }
            | ScenarioStep::WaitFor { selector, .. }
            | ScenarioStep::Type { selector, .. }
                if selector.trim().is_empty() =>
            {
                invalid("selector must not be empty")
            }
            ScenarioStep::CreatePage { name } if name.trim().is_empty() => {
                invalid("page name must not be empty")
            }
            ScenarioStep::AssertText { selector, text, equals, matches } => {
                if selector.trim().is_empty() {
                    return invalid("selector must not be empty");
                }
                let set = [text.is_some(), equals.is_some(), matches.is_some()]
                    .iter()
                    .filter(|b| **b)
                    .count();
                if set != 1 {
                    return invalid("exactly one of text, equals, matches is required");
                }
                if let Some(pattern) = matches {
                    regex::Regex::new(pattern)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl Scenario {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            E2eError::ScenarioParse(msg) => {
                E2eError::ScenarioParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load all scenarios from a directory, sorted by name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        scenarios.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scenarios)
    }

    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// The rename-page walkthrough shipped with the crate
    pub fn builtin() -> E2eResult<Vec<Self>> {
        Ok(vec![Self::from_yaml(RENAME_PAGE_YAML)?])
    }

    pub fn heading(&self) -> &str {
        self.heading.as_deref().unwrap_or(&self.name)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::ScenarioParse("scenario name must not be empty".to_string()));
        }
        if !is_file_stem(&self.name) {
            return Err(E2eError::ScenarioParse(format!(
                "scenario name '{}' must be a plain file name",
                self.name
            )));
        }
        if self.planned_assertions == 0 {
            return Err(E2eError::ScenarioParse(format!(
                "{}: planned_assertions must be positive",
                self.name
            )));
        }
        for (i, step) in self.steps.iter().enumerate() {
            step.validate(i)?;
        }
        Ok(())
    }
}

/// The name is used as a file stem under the output directory
fn is_file_stem(name: &str) -> bool {
    if name.contains(['/', '\\']) || name.contains("..") {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    )
}
