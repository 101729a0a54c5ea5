use std::collections::HashMap;
use std::path::Path;

use crate::error::{DeviceError, Result};

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Constants published by an accelerator build.
///
/// The engine toolchain emits a C header with one `#define` per constant,
/// e.g. `#define DGEMM_tileSize (16)`. `key = value` lines are accepted as
/// well so a description can be written by hand. Anything else is ignored.
#[derive(Debug, Clone, Default)]
pub struct BuildDescription {
    entries: HashMap<String, String>,
}

impl BuildDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a build header or a `key = value` listing.
    pub fn parse(text: &str) -> Self {
        let mut desc = BuildDescription::new();
        for line in text.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("#define") {
                let mut parts = rest.split_whitespace();
                // Include guards and other value-less defines are skipped.
                if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
                    desc.insert(key, value);
                }
            } else if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if is_identifier(key) {
                    desc.insert(key, value.trim());
                }
            }
        }
        desc
    }

    /// Read and parse a build description from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Set a constant, stripping the parentheses the header generator wraps
    /// values in.
    pub fn insert(&mut self, key: &str, value: &str) {
        let value = value.trim().trim_start_matches('(').trim_end_matches(')').trim();
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Retrieve a raw value by key.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| DeviceError::MissingKey(key.to_string()))
    }

    /// Retrieve an unsigned integer value by key.
    pub fn get_u64(&self, key: &str) -> Result<u64> {
        let raw = self.get_str(key)?;
        raw.parse().map_err(|_| DeviceError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        })
    }

    /// Retrieve a `usize` value by key.
    pub fn get_usize(&self, key: &str) -> Result<usize> {
        let v = self.get_u64(key)?;
        usize::try_from(v).map_err(|_| DeviceError::InvalidValue {
            key: key.to_string(),
            value: v.to_string(),
        })
    }
}
