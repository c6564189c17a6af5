//! Screen recording and walkthrough pages
//!
//! The recorder keeps one numbered PNG per interaction step. The walkthrough
//! collects the prose sections of a scenario and renders them, together with
//! the frames, into `<output>/<test name>.html` plus a JSON manifest.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::E2eResult;
use crate::session::BrowserSession;

/// A captured frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    pub label: String,
    pub path: PathBuf,
    pub sha256: String,
}

/// Captures frames from a session into a directory
pub struct Recorder {
    dir: PathBuf,
    enabled: bool,
    frames: Vec<Frame>,
}

impl Recorder {
    pub fn new(dir: PathBuf, enabled: bool) -> E2eResult<Self> {
        if enabled {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Self {
            dir,
            enabled,
            frames: Vec::new(),
        })
    }

    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
            frames: Vec::new(),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Capture the current viewport. Failures are logged and skipped.
    pub async fn capture<S>(&mut self, session: &mut S, label: &str) -> Option<&Frame>
    where
        S: BrowserSession + ?Sized,
    {
        if !self.enabled {
            return None;
        }

        let index = self.frames.len() + 1;
        let path = self.dir.join(format!("{:03}-{}.png", index, slug(label)));

        if let Err(e) = session.screenshot(&path).await {
            warn!("Frame {} ({}) not captured: {}", index, label, e);
            return None;
        }

        let sha256 = match hash_file(&path) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Frame {} written but unreadable: {}", index, e);
                return None;
            }
        };

        debug!("Captured frame {}: {}", index, path.display());
        self.frames.push(Frame {
            index,
            label: label.to_string(),
            path,
            sha256,
        });
        self.frames.last()
    }
}

/// Prose and metadata of a walkthrough page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Walkthrough {
    pub test_name: String,
    pub heading: String,
    pub description: String,
    pub sections: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    #[serde(flatten)]
    walkthrough: &'a Walkthrough,
    frames: Vec<Frame>,
    generated_at: DateTime<Utc>,
}

impl Walkthrough {
    pub fn new(
        test_name: impl Into<String>,
        heading: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            heading: heading.into(),
            description: description.into(),
            sections: Vec::new(),
        }
    }

    pub fn push_section(&mut self, text: impl Into<String>) {
        self.sections.push(text.into());
    }

    /// Write the HTML page and JSON manifest, returning the HTML path.
    ///
    /// Sections are authored HTML and inserted as-is; heading and
    /// description are escaped.
    pub fn render(&self, output_dir: &Path, frames: &[Frame]) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", encode_text(&self.heading)));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!(
            "<h1 data-test=\"{}\">{}</h1>\n",
            encode_double_quoted_attribute(&self.test_name),
            encode_text(&self.heading)
        ));
        if !self.description.is_empty() {
            html.push_str(&format!("<p class=\"description\">{}</p>\n", encode_text(&self.description)));
        }
        for section in &self.sections {
            html.push_str(&format!("<p class=\"section\">{}</p>\n", section));
        }
        if !frames.is_empty() {
            html.push_str("<ol class=\"frames\">\n");
            for frame in frames {
                let src = frame.path.strip_prefix(output_dir).unwrap_or(frame.path.as_path());
                html.push_str(&format!(
                    "  <li><img src=\"{}\" alt=\"{}\"></li>\n",
                    encode_double_quoted_attribute(&src.to_string_lossy()),
                    encode_double_quoted_attribute(&frame.label)
                ));
            }
            html.push_str("</ol>\n");
        }
        html.push_str("</body>\n</html>\n");

        let html_path = output_dir.join(format!("{}.html", self.test_name));
        std::fs::write(&html_path, html)?;

        let manifest = Manifest {
            walkthrough: self,
            frames: frames.to_vec(),
            generated_at: Utc::now(),
        };
        let manifest_path = output_dir.join(format!("{}.json", self.test_name));
        std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

        info!("Walkthrough written to: {}", html_path.display());
        Ok(html_path)
    }
}

fn hash_file(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn slug(label: &str) -> String {
    let mut out = String::new();
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
        if out.len() >= 40 {
            break;
        }
    }
    out.trim_matches('-').to_string()
}
