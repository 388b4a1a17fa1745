//! Filter configuration: which response media types get fingerprinted.

use crate::error::{EtagError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable holding a comma-separated list of media types.
pub const MIME_TYPES_ENV: &str = "ETAGGER_MIME_TYPES";

/// Media types the filter knows how to fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedMimeType {
    /// `application/json`
    #[serde(rename = "application/json")]
    ApplicationJson,
    /// `text/html`
    #[serde(rename = "text/html")]
    TextHtml,
    /// `text/css`
    #[serde(rename = "text/css")]
    TextCss,
    /// `text/csv`
    #[serde(rename = "text/csv")]
    TextCsv,
    /// `text/plain`
    #[serde(rename = "text/plain")]
    TextPlain,
    /// `text/javascript`
    #[serde(rename = "text/javascript")]
    TextJavascript,
}

impl SupportedMimeType {
    /// Every supported media type.
    pub const ALL: [Self; 6] = [
        Self::ApplicationJson,
        Self::TextHtml,
        Self::TextCss,
        Self::TextCsv,
        Self::TextPlain,
        Self::TextJavascript,
    ];

    /// The media type as it appears in a `Content-Type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationJson => "application/json",
            Self::TextHtml => "text/html",
            Self::TextCss => "text/css",
            Self::TextCsv => "text/csv",
            Self::TextPlain => "text/plain",
            Self::TextJavascript => "text/javascript",
        }
    }
}

impl fmt::Display for SupportedMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedMimeType {
    type Err = EtagError;

    /// Exact, case-sensitive parse.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mime| mime.as_str() == s)
            .ok_or_else(|| EtagError::UnsupportedMimeType(s.to_string()))
    }
}

/// Options for [`EtagFilter`](crate::EtagFilter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtagOptions {
    /// Response media types eligible for fingerprinting
    pub mime_types: Vec<SupportedMimeType>,
}

impl Default for EtagOptions {
    fn default() -> Self {
        Self {
            mime_types: SupportedMimeType::ALL.to_vec(),
        }
    }
}

impl EtagOptions {
    /// Create options from an explicit list of media types.
    pub fn new(mime_types: impl IntoIterator<Item = SupportedMimeType>) -> Self {
        Self {
            mime_types: mime_types.into_iter().collect(),
        }
    }

    /// Builder-style method to add a media type
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: SupportedMimeType) -> Self {
        if !self.mime_types.contains(&mime_type) {
            self.mime_types.push(mime_type);
        }
        self
    }

    /// Parse options from TOML text.
    ///
    /// ```toml
    /// mime_types = ["application/json", "text/plain"]
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| EtagError::config(format!("Failed to parse options: {e}")))
    }

    /// Load options from a file, or from the first config file found in the
    /// standard locations, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

        match config_path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "Loading etag options");
                let content = std::fs::read_to_string(&p)?;
                Self::from_toml_str(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Create options from the `ETAGGER_MIME_TYPES` environment variable.
    ///
    /// An unset variable yields the defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var(MIME_TYPES_ENV) {
            Ok(list) => Ok(Self::new(parse_mime_list(&list)?)),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(EtagError::config(format!("{MIME_TYPES_ENV}: {e}"))),
        }
    }
}

/// Parse a comma-separated media type list, ignoring blank entries.
pub fn parse_mime_list(list: &str) -> Result<Vec<SupportedMimeType>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(SupportedMimeType::from_str)
        .collect()
}

/// Find a configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let candidates = [".etagger.toml", "etagger.toml", ".config/etagger.toml"];

    candidates
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}
