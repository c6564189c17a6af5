//! Scripted stand-in for the CMS page editor, driven through `BrowserSession`
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uitour_e2e::config::{HarnessConfig, Selectors};
use uitour_e2e::{BrowserSession, E2eError, E2eResult, SessionFactory};

/// Knobs for misbehaving UIs
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub fail_goto: bool,
    pub reject_login: bool,
    /// How many times clicking the active tab opens the rename input
    pub rename_input_opens: Option<usize>,
    /// How many committed renames are applied; later ones are dropped
    pub renames_applied: Option<usize>,
    /// The rename input stays open after a commit
    pub input_lingers: bool,
}

/// In-memory page editor with a login form, an add-page button and preview tabs
pub struct FakeCms {
    sel: Selectors,
    behavior: Behavior,
    url: Option<String>,
    username: String,
    password: String,
    logged_in: bool,
    pages: Vec<String>,
    active: Option<usize>,
    rename_input: Option<String>,
    inputs_opened: usize,
    renames: usize,
    pub closed: bool,
    pub actions: Vec<String>,
    pub screenshots: Vec<PathBuf>,
}

impl FakeCms {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            sel: Selectors::default(),
            behavior,
            url: None,
            username: String::new(),
            password: String::new(),
            logged_in: false,
            pages: Vec::new(),
            active: None,
            rename_input: None,
            inputs_opened: 0,
            renames: 0,
            closed: false,
            actions: Vec::new(),
            screenshots: Vec::new(),
        }
    }

    /// Already logged in, showing one active page
    pub fn with_active_page(name: &str) -> Self {
        let mut cms = Self::new(Behavior::default());
        cms.logged_in = true;
        cms.pages.push(name.to_string());
        cms.active = Some(0);
        cms
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    fn matches(&self, selector: &str) -> usize {
        let s = &self.sel;
        let on_page = self.url.is_some();
        let shown = |b: bool| usize::from(on_page && b);

        if selector == s.username_field || selector == s.password_field || selector == s.login_button {
            shown(!self.logged_in)
        } else if selector == s.logged_in_marker || selector == s.add_page_button {
            shown(self.logged_in)
        } else if selector == s.page_tabs {
            if on_page && self.logged_in {
                self.pages.len()
            } else {
                0
            }
        } else if selector == s.active_tab || selector == s.active_tab_name {
            shown(self.logged_in && self.active.is_some())
        } else if selector == s.rename_input {
            shown(self.rename_input.is_some())
        } else {
            0
        }
    }

    fn require(&self, selector: &str) -> E2eResult<()> {
        if self.matches(selector) == 0 {
            Err(E2eError::ElementNotFound(selector.to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BrowserSession for FakeCms {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.actions.push(format!("goto {}", url));
        if self.behavior.fail_goto {
            return Err(E2eError::Bridge("net::ERR_CONNECTION_REFUSED".to_string()));
        }
        self.url = Some(url.to_string());
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> E2eResult<()> {
        self.require(selector)?;
        self.actions.push(format!("click {}", selector));

        if selector == self.sel.login_button {
            if !self.behavior.reject_login && self.username == "admin" && self.password == "admin" {
                self.logged_in = true;
            }
        } else if selector == self.sel.add_page_button {
            self.pages.push(format!("New Page {}", self.pages.len() + 1));
            self.active = Some(self.pages.len() - 1);
        } else if selector == self.sel.active_tab || selector == self.sel.active_tab_name {
            let allowed = self
                .behavior
                .rename_input_opens
                .map_or(true, |limit| self.inputs_opened < limit);
            if allowed {
                self.inputs_opened += 1;
                self.rename_input = self.active.map(|i| self.pages[i].clone());
            }
        }
        Ok(())
    }

    async fn hover(&mut self, selector: &str) -> E2eResult<()> {
        self.require(selector)
    }

    async fn count(&mut self, selector: &str) -> E2eResult<usize> {
        Ok(self.matches(selector))
    }

    async fn text(&mut self, selector: &str) -> E2eResult<Option<String>> {
        if selector == self.sel.active_tab_name && self.matches(selector) > 0 {
            return Ok(self.active.map(|i| self.pages[i].clone()));
        }
        Ok(None)
    }

    async fn type_text(&mut self, selector: &str, text: &str, _delay_ms: u64) -> E2eResult<()> {
        self.require(selector)?;
        if selector == self.sel.username_field {
            self.username.push_str(text);
        } else if selector == self.sel.password_field {
            self.password.push_str(text);
        } else if selector == self.sel.rename_input {
            if let Some(value) = self.rename_input.as_mut() {
                value.push_str(text);
            }
        }
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> E2eResult<()> {
        self.require(selector)?;
        if selector == self.sel.username_field {
            self.username = value.to_string();
        } else if selector == self.sel.password_field {
            self.password = value.to_string();
        } else if selector == self.sel.rename_input {
            self.rename_input = Some(value.to_string());
        }
        Ok(())
    }

    async fn press(&mut self, selector: Option<&str>, key: &str) -> E2eResult<()> {
        if let Some(selector) = selector {
            self.require(selector)?;
        }
        self.actions.push(format!("press {}", key));

        let on_input = selector.map_or(true, |s| s == self.sel.rename_input);
        if on_input && (key == "Enter" || key == "Tab") {
            let taken = if self.behavior.input_lingers {
                self.rename_input.clone()
            } else {
                self.rename_input.take()
            };
            if let Some(value) = taken {
                let allowed = self
                    .behavior
                    .renames_applied
                    .map_or(true, |limit| self.renames < limit);
                if allowed {
                    if let Some(i) = self.active {
                        self.pages[i] = value;
                        self.renames += 1;
                    }
                }
            }
        }
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let frame = format!("frame {} {:?}", self.screenshots.len(), self.pages);
        std::fs::write(path, frame)?;
        self.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// Hands out a fresh `FakeCms` per scenario
pub struct FakeFactory {
    pub behavior: Behavior,
    pub fail_open: bool,
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeCms;

    async fn open(&self) -> E2eResult<FakeCms> {
        if self.fail_open {
            return Err(E2eError::PlaywrightNotFound);
        }
        Ok(FakeCms::new(self.behavior.clone()))
    }
}

/// Config writing into `output`, with no target probe
pub fn test_config(output: &Path) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.output_dir = output.to_path_buf();
    config.probe_target = false;
    config
}
