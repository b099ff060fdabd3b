//! Delimited-file backend

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::config::FileOptions;
use super::error::SourceError;
use crate::catalog::MetadataCatalog;
use crate::catalog::formats::format_temporal;
use crate::location::FilesystemLocation;
use crate::models::{DataFrame, FrameError, Value};

/// Reads and writes delimited files with one set of options
#[derive(Debug, Clone)]
pub(crate) struct FileBackend {
    pub(crate) options: FileOptions,
    delimiter: u8,
}

impl FileBackend {
    pub(crate) fn new(options: FileOptions) -> Result<Self, SourceError> {
        let delimiter = options.delimiter_byte().map_err(SourceError::InvalidConfig)?;
        Ok(Self { options, delimiter })
    }

    /// Data records across all files, excluding headers
    pub(crate) fn count_rows(&self, location: &FilesystemLocation) -> Result<u64, SourceError> {
        location
            .paths()
            .iter()
            .try_fold(0u64, |total, path| Ok(total + self.count_file_rows(path)?))
    }

    /// Data records in one file, parsed the way cursors parse them
    ///
    /// A quoted field may span several physical lines, so this can be less
    /// than the line count.
    pub(crate) fn count_file_rows(&self, path: &Path) -> Result<u64, SourceError> {
        let file = File::open(path).map_err(|e| SourceError::io(path, e))?;
        let mut reader = self
            .reader_builder()
            .has_headers(self.options.has_header)
            .from_reader(file);
        let mut record = csv::ByteRecord::new();
        let mut rows = 0u64;
        while reader.read_byte_record(&mut record)? {
            rows += 1;
        }
        debug!(path = %path.display(), rows, "Counted records");
        Ok(rows)
    }

    /// Every address is an existing regular file
    pub(crate) fn exists(&self, location: &FilesystemLocation) -> bool {
        let paths = location.paths();
        !paths.is_empty() && paths.iter().all(|p| p.is_file())
    }

    /// Remove every file of the location that exists
    pub(crate) fn drop_files(&self, location: &FilesystemLocation) -> Result<(), SourceError> {
        for path in location.paths() {
            if path.exists() {
                info!(path = %path.display(), "Removing file");
                fs::remove_file(&path).map_err(|e| SourceError::io(&path, e))?;
            }
        }
        Ok(())
    }

    /// Create empty files, with a header row when the layout has one
    pub(crate) fn create(
        &self,
        location: &FilesystemLocation,
        catalog: &MetadataCatalog,
    ) -> Result<(), SourceError> {
        let names = self.column_order(catalog);
        for path in location.paths() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| SourceError::io(parent, e))?;
            }
            let file = File::create(&path).map_err(|e| SourceError::io(&path, e))?;
            if self.options.has_header {
                let mut writer = self.writer_builder().from_writer(file);
                writer.write_record(&names)?;
                writer.flush().map_err(|e| SourceError::io(&path, e))?;
            }
            debug!(path = %path.display(), columns = names.len(), "Created file");
        }
        Ok(())
    }

    /// Header row of a file, `None` for headerless layouts or empty files
    pub(crate) fn read_header(&self, path: &Path) -> Result<Option<Vec<String>>, SourceError> {
        if !self.options.has_header {
            return Ok(None);
        }
        let mut reader = self
            .reader_builder()
            .has_headers(false)
            .from_path(path)?;
        let mut record = csv::StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Ok(None);
        }
        Ok(Some(record.iter().map(|s| s.trim().to_string()).collect()))
    }

    /// Variables the created files disagree on with the catalog
    pub(crate) fn verify_created(
        &self,
        location: &FilesystemLocation,
        catalog: &MetadataCatalog,
    ) -> Result<Vec<String>, SourceError> {
        let mut differences = Vec::new();
        let declared = catalog.variable_names();
        for path in location.paths() {
            let Some(header) = self.read_header(&path)? else {
                continue;
            };
            let mut observed: Vec<String> =
                header.iter().map(|h| catalog.normalize_name(h)).collect();
            observed.sort();
            for name in declared.iter().filter(|n| !observed.contains(n)) {
                differences.push(name.clone());
            }
            for name in observed.iter().filter(|n| !declared.contains(n)) {
                differences.push(name.clone());
            }
        }
        differences.sort();
        differences.dedup();
        Ok(differences)
    }

    /// Open a chunk cursor over one file
    pub(crate) fn open_cursor(
        &self,
        path: &Path,
        catalog: Option<&MetadataCatalog>,
    ) -> Result<FileCursor, SourceError> {
        let mut reader = self
            .reader_builder()
            .has_headers(self.options.has_header)
            .from_path(path)?;
        let names: Vec<String> = if self.options.has_header {
            reader.headers()?.iter().map(|h| h.trim().to_string()).collect()
        } else if let Some(names) = &self.options.column_names {
            names.clone()
        } else if let Some(catalog) = catalog {
            catalog.variable_names()
        } else {
            return Err(SourceError::InvalidConfig(
                "headerless files need column names or metadata".to_string(),
            ));
        };
        Ok(FileCursor {
            path: path.to_path_buf(),
            reader,
            names,
        })
    }

    /// Append one partition to a file, writing a header if the file is new
    pub(crate) fn write_partition(
        &self,
        path: &Path,
        frame: &DataFrame,
        catalog: &MetadataCatalog,
    ) -> Result<usize, SourceError> {
        let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let header = if is_new { None } else { self.read_header(path)? };
        let order: Vec<String> = match header {
            Some(header) => header.iter().map(|h| catalog.normalize_name(h)).collect(),
            None => self.column_order(catalog),
        };
        let needs_header = self.options.has_header && is_new;

        let indices: Vec<usize> = order
            .iter()
            .map(|name| {
                frame
                    .column_index(name)
                    .ok_or_else(|| SourceError::from(FrameError::ColumnNotFound(name.clone())))
            })
            .collect::<Result<_, _>>()?;
        let formats: Vec<Option<String>> = order
            .iter()
            .map(|name| {
                catalog
                    .get_datetime_format(name)
                    .map(|f| f.map(str::to_string))
            })
            .collect::<Result<_, _>>()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SourceError::io(path, e))?;
        let mut writer = self.writer_builder().from_writer(file);
        if needs_header {
            writer.write_record(&order)?;
        }
        for row in 0..frame.num_rows() {
            let record: Vec<String> = indices
                .iter()
                .zip(&formats)
                .map(|(&column, format)| {
                    render(&frame.columns()[column].values[row], format.as_deref())
                })
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|e| SourceError::io(path, e))?;
        debug!(path = %path.display(), rows = frame.num_rows(), "Wrote partition");
        Ok(frame.num_rows())
    }

    /// File name of one address
    pub(crate) fn file_name(path: &str) -> String {
        Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string())
    }

    fn column_order(&self, catalog: &MetadataCatalog) -> Vec<String> {
        match &self.options.column_names {
            Some(names) if !self.options.has_header => {
                names.iter().map(|n| catalog.normalize_name(n)).collect()
            }
            _ => catalog.variable_names(),
        }
    }

    fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.delimiter(self.delimiter);
        builder
    }

    fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(self.delimiter).has_headers(false);
        builder
    }
}

fn render(value: &Value, format: Option<&str>) -> String {
    format
        .and_then(|f| format_temporal(value, f))
        .unwrap_or_else(|| value.to_string())
}

/// Streams one file in chunks
pub(crate) struct FileCursor {
    path: PathBuf,
    reader: csv::Reader<File>,
    names: Vec<String>,
}

impl FileCursor {
    pub(crate) fn address(&self) -> String {
        self.path.display().to_string()
    }

    /// Next chunk of at most `chunk_size` rows; empty when the file is drained
    pub(crate) fn next_chunk(&mut self, chunk_size: usize) -> Result<DataFrame, SourceError> {
        let mut rows = Vec::with_capacity(chunk_size);
        let mut record = csv::StringRecord::new();
        while rows.len() < chunk_size && self.reader.read_record(&mut record)? {
            let row: Vec<Value> = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(field.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }
        DataFrame::from_rows(&self.names, rows).map_err(|source| SourceError::InvalidRows {
            address: self.path.display().to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for FileCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCursor")
            .field("path", &self.path)
            .field("names", &self.names)
            .finish()
    }
}
