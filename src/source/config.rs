//! Configuration types for data sources

use serde::{Deserialize, Serialize};

/// Tuning and policy for one data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Rows per chunk when reading
    pub chunk_size: usize,
    /// Worker threads for partitioned writes
    pub workers: usize,
    /// Do not count rows at construction; the declared size stays unknown
    pub skip_row_count: bool,
    /// Treat a multi-table database location as one partitioned target
    pub partitioned_target: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            workers: 1,
            skip_row_count: false,
            partitioned_target: false,
        }
    }
}

impl SourceConfig {
    /// Create a new builder for SourceConfig
    pub fn builder() -> SourceConfigBuilder {
        SourceConfigBuilder::default()
    }

    /// Check the values are usable
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Builder for SourceConfig
#[derive(Debug, Default)]
pub struct SourceConfigBuilder {
    chunk_size: Option<usize>,
    workers: Option<usize>,
    skip_row_count: bool,
    partitioned_target: bool,
}

impl SourceConfigBuilder {
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn skip_row_count(mut self, skip: bool) -> Self {
        self.skip_row_count = skip;
        self
    }

    pub fn partitioned_target(mut self, partitioned: bool) -> Self {
        self.partitioned_target = partitioned;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SourceConfig, String> {
        let defaults = SourceConfig::default();
        let config = SourceConfig {
            chunk_size: self.chunk_size.unwrap_or(defaults.chunk_size),
            workers: self.workers.unwrap_or(defaults.workers),
            skip_row_count: self.skip_row_count,
            partitioned_target: self.partitioned_target,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Layout of delimited files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// Field delimiter, a single ASCII character
    pub delimiter: char,
    /// First line of each file names the columns
    pub has_header: bool,
    /// Column names for files without a header; defaults to catalog order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_names: Option<Vec<String>>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
            column_names: None,
        }
    }
}

impl FileOptions {
    /// Delimiter as a byte, failing for non-ASCII characters
    pub fn delimiter_byte(&self) -> Result<u8, String> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(format!("delimiter must be ASCII, got '{}'", self.delimiter))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SourceConfig::default();
        assert_eq!(config.chunk_size, 10_000);
        assert_eq!(config.workers, 1);
        assert!(!config.skip_row_count);
        assert_eq!(FileOptions::default().delimiter_byte().unwrap(), b',');
    }

    #[test]
    fn test_builder() {
        let config = SourceConfig::builder().chunk_size(4).workers(3).build().unwrap();
        assert_eq!(config.chunk_size, 4);
        assert_eq!(config.workers, 3);
        assert!(SourceConfig::builder().chunk_size(0).build().is_err());
    }

    #[test]
    fn test_non_ascii_delimiter() {
        let options = FileOptions {
            delimiter: '§',
            ..Default::default()
        };
        assert!(options.delimiter_byte().is_err());
    }
}
