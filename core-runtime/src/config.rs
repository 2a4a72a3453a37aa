//! # Upload Configuration
//!
//! Limits and presentation settings for one upload widget instance.
//!
//! ## Overview
//!
//! An [`UploadConfig`] is fixed for the lifetime of a widget. It is built either
//! through [`UploadConfigBuilder`] or deserialized from the JSON the page hands
//! over (field names are accepted in both `snake_case` and the `camelCase` used
//! by the web layer). Every construction path ends in [`UploadConfig::validate`],
//! so a widget never runs with a zero limit or an empty type allow-list.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::UploadConfig;
//!
//! let config = UploadConfig::builder()
//!     .max_file_size_bytes(4 * 1024 * 1024)
//!     .max_file_count(6)
//!     .accepted_types(["image/*"])
//!     .helper_text("Up to 6 trip photos")
//!     .build()?;
//! ```
//!
//! ## Response interpretation
//!
//! The remote upload endpoint has answered in more than one shape over time.
//! `url_fields` is the ordered list of descriptor fields tried for the stored
//! file's URL, `list_fields` the object keys tried when the response is not a
//! bare array. Deployments with a fixed contract can shrink both to one entry.

use crate::error::{Error, Result};
use serde::Deserialize;

/// Default per-file size limit (4 MB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 4 * 1024 * 1024;

/// Default number of entries a widget may hold
pub const DEFAULT_MAX_FILE_COUNT: usize = 6;

/// Default accepted MIME patterns
pub const DEFAULT_ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Default fields tried, in order, for a result descriptor's URL
pub const DEFAULT_URL_FIELDS: &[&str] = &["url", "secure_url", "secureUrl", "location", "path"];

/// Default keys tried, in order, for the result list inside an object response
pub const DEFAULT_LIST_FIELDS: &[&str] = &["files", "results", "data"];

/// Configuration of a single upload widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted file, in bytes
    #[serde(alias = "maxFileSizeBytes")]
    pub max_file_size_bytes: u64,

    /// Maximum number of entries (local and committed together)
    #[serde(alias = "maxFileCount")]
    pub max_file_count: usize,

    /// Accepted MIME patterns: exact (`image/png`) or wildcard (`image/*`, `*/*`)
    #[serde(alias = "acceptedTypes")]
    pub accepted_types: Vec<String>,

    /// Text shown under the drop zone; generated from the limits when unset
    #[serde(alias = "helperText")]
    pub helper_text: Option<String>,

    /// Descriptor fields tried for the stored URL, first non-empty wins
    #[serde(alias = "urlFields")]
    pub url_fields: Vec<String>,

    /// Object keys tried for the result list when the body is not an array
    #[serde(alias = "listFields")]
    pub list_fields: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_file_count: DEFAULT_MAX_FILE_COUNT,
            accepted_types: to_strings(DEFAULT_ACCEPTED_TYPES),
            helper_text: None,
            url_fields: to_strings(DEFAULT_URL_FIELDS),
            list_fields: to_strings(DEFAULT_LIST_FIELDS),
        }
    }
}

impl UploadConfig {
    /// Creates a new builder seeded with the defaults.
    pub fn builder() -> UploadConfigBuilder {
        UploadConfigBuilder::default()
    }

    /// Parses and validates a JSON configuration object.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed JSON and the usual validation
    /// errors otherwise.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Size and count limits are non-zero
    /// - At least one accepted type is given and every pattern is `type/subtype`
    /// - At least one URL field is configured
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size_bytes == 0 {
            return Err(Error::Config(
                "Maximum file size must be greater than 0 bytes".to_string(),
            ));
        }

        if self.max_file_count == 0 {
            return Err(Error::Config(
                "Maximum file count must be at least 1".to_string(),
            ));
        }

        if self.accepted_types.is_empty() {
            return Err(Error::Config(
                "At least one accepted type is required. Use \"*/*\" to accept anything."
                    .to_string(),
            ));
        }

        for pattern in &self.accepted_types {
            check_type_pattern(pattern)?;
        }

        if self.url_fields.iter().all(|f| f.trim().is_empty()) {
            return Err(Error::Config(
                "At least one result URL field is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Helper text to render under the drop zone.
    pub fn helper_text(&self) -> String {
        match &self.helper_text {
            Some(text) => text.clone(),
            None => format!(
                "Up to {} file{}, {} each",
                self.max_file_count,
                if self.max_file_count == 1 { "" } else { "s" },
                format_bytes(self.max_file_size_bytes)
            ),
        }
    }
}

fn check_type_pattern(pattern: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidTypePattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let Some((kind, subtype)) = pattern.trim().split_once('/') else {
        return Err(invalid("expected type/subtype"));
    };

    if kind.is_empty() || subtype.is_empty() {
        return Err(invalid("type and subtype must be non-empty"));
    }
    if subtype.contains('/') {
        return Err(invalid("more than one '/'"));
    }
    if kind == "*" && subtype != "*" {
        return Err(invalid("a wildcard type needs a wildcard subtype"));
    }

    Ok(())
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Renders a byte count the way limits are shown to users (`4 MB`, `1.5 KB`).
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    let (value, unit) = match bytes {
        b if b >= GB => (b as f64 / GB as f64, "GB"),
        b if b >= MB => (b as f64 / MB as f64, "MB"),
        b if b >= KB => (b as f64 / KB as f64, "KB"),
        b => return format!("{} bytes", b),
    };

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, unit)
    } else {
        format!("{:.1} {}", rounded, unit)
    }
}

/// Builder for constructing [`UploadConfig`] instances.
#[derive(Debug, Default)]
pub struct UploadConfigBuilder {
    max_file_size_bytes: Option<u64>,
    max_file_count: Option<usize>,
    accepted_types: Option<Vec<String>>,
    helper_text: Option<String>,
    url_fields: Option<Vec<String>>,
    list_fields: Option<Vec<String>>,
}

impl UploadConfigBuilder {
    pub fn max_file_size_bytes(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = Some(bytes);
        self
    }

    pub fn max_file_count(mut self, count: usize) -> Self {
        self.max_file_count = Some(count);
        self
    }

    pub fn accepted_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn helper_text(mut self, text: impl Into<String>) -> Self {
        self.helper_text = Some(text.into());
        self
    }

    /// Replace the URL field fallback chain
    pub fn url_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.url_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the list key fallback chain
    pub fn list_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the configuration, validating it on the way out.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails (see [`UploadConfig::validate`]).
    pub fn build(self) -> Result<UploadConfig> {
        let defaults = UploadConfig::default();
        let config = UploadConfig {
            max_file_size_bytes: self
                .max_file_size_bytes
                .unwrap_or(defaults.max_file_size_bytes),
            max_file_count: self.max_file_count.unwrap_or(defaults.max_file_count),
            accepted_types: self.accepted_types.unwrap_or(defaults.accepted_types),
            helper_text: self.helper_text,
            url_fields: self.url_fields.unwrap_or(defaults.url_fields),
            list_fields: self.list_fields.unwrap_or(defaults.list_fields),
        };

        config.validate()?;
        Ok(config)
    }
}
