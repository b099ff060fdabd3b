//! Data locations backed by files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::LocationError;
use super::normalize_input;

/// A collection of files, addressed by absolute path
///
/// Patterns are expanded when the location is built. A pattern that matches
/// nothing contributes no address; whether the files exist is a separate
/// question answered by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct FilesystemLocation {
    addresses: Vec<String>,
}

/// Saved form: already-expanded paths, which are not globbed again
#[derive(Deserialize)]
struct RawLocation {
    addresses: Vec<String>,
}

impl TryFrom<RawLocation> for FilesystemLocation {
    type Error = LocationError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        let addresses = normalize_input(raw.addresses)?;
        if let Some(relative) = addresses.iter().find(|a| !Path::new(a).is_absolute()) {
            return Err(LocationError::UnresolvablePath {
                path: relative.clone(),
                reason: "saved addresses must be absolute".to_string(),
            });
        }
        Ok(Self { addresses })
    }
}

impl FilesystemLocation {
    /// Expand one or more glob patterns into absolute file paths
    pub fn new<I, S>(patterns: I) -> Result<Self, LocationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = normalize_input(patterns)?;
        let mut addresses = Vec::new();

        for pattern in patterns {
            let absolute = absolute_path(Path::new(&pattern))?;
            let full_pattern = absolute.to_string_lossy().to_string();
            let entries = glob::glob(&full_pattern)
                .map_err(|e| LocationError::InvalidPattern(format!("{}: {}", pattern, e)))?;

            let mut matched = 0usize;
            for entry in entries {
                match entry {
                    Ok(path) => {
                        matched += 1;
                        addresses.push(path.to_string_lossy().to_string());
                    }
                    Err(e) => {
                        tracing::warn!("Error accessing path: {}", e);
                    }
                }
            }
            if matched == 0 {
                tracing::debug!(pattern = %full_pattern, "Pattern matched no files");
            }
        }

        Ok(Self { addresses })
    }

    /// Use the given paths as-is, without glob expansion
    ///
    /// Sinks need this: a file that does not exist yet cannot be matched by a
    /// pattern.
    pub fn literal<I, S>(paths: I) -> Result<Self, LocationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths = normalize_input(paths)?;
        let addresses = paths
            .iter()
            .map(|p| absolute_path(Path::new(p)).map(|a| a.to_string_lossy().to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { addresses })
    }

    /// Absolute file paths
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Absolute file paths as `PathBuf`s
    pub fn paths(&self) -> Vec<PathBuf> {
        self.addresses.iter().map(PathBuf::from).collect()
    }
}

fn absolute_path(path: &Path) -> Result<PathBuf, LocationError> {
    std::path::absolute(path).map_err(|e| LocationError::UnresolvablePath {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
