//! Result descriptor parsing
//!
//! The transport's response shape is not fixed. The descriptor list is either
//! the top-level array or the first array found under one of the configured
//! list keys, and each descriptor's URL is read through an ordered chain of
//! field names. A batch is all-or-nothing: any descriptor without a URL fails
//! the whole batch.

use crate::error::BatchUploadError;
use serde_json::Value;

/// Pull one URL per uploaded file out of a transport response.
///
/// Returns exactly `expected` URLs in descriptor order. Extra descriptors are
/// ignored.
pub fn extract_urls(
    body: &Value,
    expected: usize,
    url_fields: &[String],
    list_fields: &[String],
) -> Result<Vec<String>, BatchUploadError> {
    let descriptors = find_list(body, list_fields).ok_or(BatchUploadError::MissingResults)?;

    if descriptors.len() < expected {
        return Err(BatchUploadError::TooFewResults {
            expected,
            received: descriptors.len(),
        });
    }

    let urls: Vec<Option<String>> = descriptors
        .iter()
        .take(expected)
        .map(|d| descriptor_url(d, url_fields))
        .collect();

    if expected > 0 && urls.iter().all(Option::is_none) {
        return Err(BatchUploadError::NoUsableUrls);
    }

    urls.into_iter()
        .enumerate()
        .map(|(index, url)| url.ok_or(BatchUploadError::MissingUrl { index }))
        .collect()
}

fn find_list<'a>(body: &'a Value, list_fields: &[String]) -> Option<&'a Vec<Value>> {
    if let Value::Array(items) = body {
        return Some(items);
    }

    let object = body.as_object()?;
    list_fields
        .iter()
        .find_map(|key| object.get(key).and_then(Value::as_array))
}

fn descriptor_url(descriptor: &Value, url_fields: &[String]) -> Option<String> {
    match descriptor {
        Value::String(url) => non_empty(url),
        Value::Object(fields) => url_fields
            .iter()
            .find_map(|key| fields.get(key).and_then(Value::as_str).and_then(non_empty)),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
