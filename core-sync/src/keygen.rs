//! Collision-free object keys for uploads.
//!
//! Keys look like `folder/1716800000000-photo.png`. The timestamp is the
//! clock's millisecond reading, bumped past the previously issued value when
//! the clock has not advanced, so two calls never share a timestamp.

use crate::error::ValidationError;
use bridge_traits::Clock;
use std::sync::{Arc, Mutex, PoisonError};

pub struct KeyGenerator {
    clock: Arc<dyn Clock>,
    last_issued: Mutex<i64>,
}

impl KeyGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last_issued: Mutex::new(i64::MIN),
        }
    }

    /// Builds `<folder/>` + timestamp + `-` + `name`.
    ///
    /// An empty folder (or one made only of slashes) yields a root-level key.
    pub fn generate(&self, folder: &str, name: &str) -> Result<String, ValidationError> {
        validate_name(name)?;
        let folder = normalize_folder(folder)?;
        let timestamp = self.next_timestamp();

        Ok(match folder {
            Some(folder) => format!("{}/{}-{}", folder, timestamp, name),
            None => format!("{}-{}", timestamp, name),
        })
    }

    fn next_timestamp(&self) -> i64 {
        let now = self.clock.unix_timestamp_millis();
        let mut last = self
            .last_issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let issued = now.max(last.saturating_add(1));
        *last = issued;
        issued
    }
}

impl std::fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGenerator").finish_non_exhaustive()
    }
}

/// A file name must be a single non-empty path segment.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let reason = if name.is_empty() {
        "file name is empty"
    } else if name.contains('/') || name.contains('\\') {
        "file name contains a path separator"
    } else if name.chars().any(char::is_control) {
        "file name contains control characters"
    } else {
        return Ok(());
    };

    Err(ValidationError::MalformedKey {
        value: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Trims surrounding slashes and rejects empty, `.` or `..` segments.
fn normalize_folder(folder: &str) -> Result<Option<&str>, ValidationError> {
    let trimmed = folder.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(None);
    }

    let malformed = |reason: &str| ValidationError::MalformedKey {
        value: folder.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.contains('\\') {
        return Err(malformed("folder contains a backslash"));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(malformed("folder contains control characters"));
    }
    for segment in trimmed.split('/') {
        match segment {
            "" => return Err(malformed("folder contains an empty segment")),
            "." | ".." => return Err(malformed("folder contains a relative segment")),
            _ => {}
        }
    }

    Ok(Some(trimmed))
}
