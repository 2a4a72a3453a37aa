//! # Validation Gate
//!
//! Accepts or rejects candidate files against the widget's type, size and
//! count limits. Rules are checked in that order and the first violation wins.
//! A rejection only concerns the file at hand; the rest of the selection is
//! still processed, and nothing is mutated for a rejected file.

use crate::error::ValidationError;
use bridge_traits::FilePayload;
use core_runtime::config::UploadConfig;
use core_runtime::logging::strip_path;

/// One entry of the accepted-types allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimePattern {
    /// `*/*`
    Any,
    /// `image/*`
    Category(String),
    /// `image/png`
    Exact(String),
}

impl MimePattern {
    /// Parse a pattern, lowercasing it. Malformed patterns are filtered out by
    /// config validation before they get here.
    pub fn parse(pattern: &str) -> Self {
        let pattern = normalize(pattern);
        match pattern.split_once('/') {
            Some(("*", "*")) => MimePattern::Any,
            Some((kind, "*")) => MimePattern::Category(kind.to_string()),
            _ => MimePattern::Exact(pattern),
        }
    }

    pub fn matches(&self, mime_type: &str) -> bool {
        let mime_type = normalize(mime_type);
        match self {
            MimePattern::Any => true,
            MimePattern::Category(kind) => mime_type
                .split_once('/')
                .is_some_and(|(k, subtype)| k == kind && !subtype.is_empty()),
            MimePattern::Exact(exact) => &mime_type == exact,
        }
    }
}

/// Lowercase and drop parameters (`image/svg+xml; charset=utf-8` → `image/svg+xml`)
fn normalize(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[derive(Debug, Clone)]
pub struct ValidationGate {
    patterns: Vec<MimePattern>,
    max_file_size_bytes: u64,
    max_file_count: usize,
}

impl ValidationGate {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            patterns: config
                .accepted_types
                .iter()
                .map(|p| MimePattern::parse(p))
                .collect(),
            max_file_size_bytes: config.max_file_size_bytes,
            max_file_count: config.max_file_count,
        }
    }

    /// Check one file given how many entries exist, counting files already
    /// accepted earlier in the same selection.
    pub fn check(&self, file: &FilePayload, current_count: usize) -> Result<(), ValidationError> {
        let name = strip_path(&file.name).to_string();

        if !self.patterns.iter().any(|p| p.matches(&file.mime_type)) {
            return Err(ValidationError::UnsupportedType {
                file: name,
                mime_type: file.mime_type.clone(),
            });
        }

        if file.size() > self.max_file_size_bytes {
            return Err(ValidationError::TooLarge {
                file: name,
                size: file.size(),
                limit: self.max_file_size_bytes,
            });
        }

        if current_count + 1 > self.max_file_count {
            return Err(ValidationError::TooMany {
                file: name,
                limit: self.max_file_count,
            });
        }

        Ok(())
    }

    /// Run a whole selection through the gate.
    ///
    /// Returns the accepted files in selection order and the rejected ones with
    /// their reasons.
    pub fn partition(
        &self,
        files: Vec<FilePayload>,
        existing: usize,
    ) -> (Vec<FilePayload>, Vec<(FilePayload, ValidationError)>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for file in files {
            match self.check(&file, existing + accepted.len()) {
                Ok(()) => accepted.push(file),
                Err(err) => rejected.push((file, err)),
            }
        }

        (accepted, rejected)
    }
}
