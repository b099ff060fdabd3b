//! The data source engine

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::{FileOptions, SourceConfig};
use super::database::{DatabaseBackend, unique_tables};
use super::error::SourceError;
use super::file::FileBackend;
use super::partition::{Partitioning, partition_rows};
use super::preprocess::{preprocess_chunk, technical_preprocessing};
use super::reader::{ChunkReader, Cursor, QueryCursor};
use super::uniques::HistogramSet;
use super::{
    AccessMode, ChunkSummary, ReadResult, SourceKind, SourceShape, Uniques, WriteSummary,
};
use crate::catalog::MetadataCatalog;
use crate::connection::{
    COUNT_COLUMN, ConnectionError, SessionProvider, SqlDialect, VALUE_COLUMN,
};
use crate::dictionary::Dictionary;
use crate::location::{DataLocation, DatabaseLocation, FilesystemLocation, LocationKind};
use crate::models::{DataFrame, Value};

#[derive(Debug, Clone)]
enum Backend {
    File(FileBackend),
    Database(DatabaseBackend),
}

/// A backend paired with the location variant it serves
enum Target<'a> {
    Files(&'a FileBackend, &'a FilesystemLocation),
    Tables(&'a DatabaseBackend, &'a DatabaseLocation),
}

#[derive(Debug)]
enum Pending {
    File {
        location: FilesystemLocation,
        options: FileOptions,
    },
    Database {
        location: DatabaseLocation,
        provider: Arc<dyn SessionProvider>,
        dialect: Arc<dyn SqlDialect>,
    },
}

/// Collects everything a data source needs before it is opened
#[derive(Debug)]
pub struct DataSourceBuilder {
    pending: Pending,
    dictionary: Option<Arc<dyn Dictionary>>,
    metadata: Option<MetadataCatalog>,
    config: SourceConfig,
}

impl DataSourceBuilder {
    /// Dictionary describing an existing location
    ///
    /// Database sources default to the database's own system catalog.
    pub fn dictionary(mut self, dictionary: Arc<dyn Dictionary>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Metadata for the target created in create mode
    pub fn metadata(mut self, metadata: MetadataCatalog) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn config(mut self, config: SourceConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the location for `mode`, establish its catalog and size
    ///
    /// Read-only and append sources read their catalog from the dictionary
    /// and require the location to exist. Create sources drop any existing
    /// target, create it from the supplied metadata and check that the new
    /// target reports the same schema.
    pub fn open(self, mode: AccessMode) -> Result<DataSource, SourceError> {
        self.config.validate().map_err(SourceError::InvalidConfig)?;
        let (backend, location) = match self.pending {
            Pending::File { location, options } => (
                Backend::File(FileBackend::new(options)?),
                DataLocation::Filesystem(location),
            ),
            Pending::Database {
                location,
                provider,
                dialect,
            } => (
                Backend::Database(DatabaseBackend::new(provider, dialect)),
                DataLocation::Database(location),
            ),
        };
        check_targets(&location, mode, &self.config)?;

        let dictionary: Option<Arc<dyn Dictionary>> = match (self.dictionary, &backend) {
            (Some(dictionary), _) => Some(dictionary),
            (None, Backend::Database(db)) => Some(Arc::new(db.dictionary())),
            (None, Backend::File(_)) => None,
        };

        let mut source = DataSource {
            backend,
            mode,
            location: Arc::new(location),
            dictionary,
            catalog: Arc::new(MetadataCatalog::new(Vec::new(), true)?),
            shape: SourceShape::default(),
            config: self.config,
            reader: None,
        };

        let catalog = match mode {
            AccessMode::ReadOnly | AccessMode::Append => source.fetch_existing_metadata()?,
            AccessMode::Create => {
                let metadata = self.metadata.ok_or_else(|| {
                    SourceError::InvalidConfig("create mode needs metadata".to_string())
                })?;
                metadata.ensure_complete()?;
                source.create_target(&metadata)?;
                metadata
            }
        };
        source.shape.columns = catalog.size();
        source.catalog = Arc::new(catalog);
        source.shape.rows = if source.config.skip_row_count {
            None
        } else {
            Some(source.compute_size()?)
        };

        info!(
            source = %source.location,
            kind = %source.kind(),
            mode = %mode,
            rows = ?source.shape.rows,
            columns = source.shape.columns,
            "Opened data source"
        );
        Ok(source)
    }
}

/// Query locations are read-only; writable sources need one target
fn check_targets(
    location: &DataLocation,
    mode: AccessMode,
    config: &SourceConfig,
) -> Result<(), SourceError> {
    if location.kind() == LocationKind::DatabaseQuery && mode != AccessMode::ReadOnly {
        return Err(SourceError::AccessMode {
            mode,
            operation: "use a query location".to_string(),
        });
    }
    if !mode.is_writable() {
        return Ok(());
    }
    let targets = match location {
        DataLocation::Filesystem(files) => {
            if files.addresses().is_empty() {
                return Err(SourceError::NotFound(location.to_string()));
            }
            1
        }
        DataLocation::Database(database) => {
            let tables = unique_tables(database).len();
            if config.partitioned_target && tables > 0 { 1 } else { tables }
        }
    };
    if targets != 1 {
        return Err(SourceError::MultipleTargets { mode, targets });
    }
    Ok(())
}

/// One dataset bound to a location, a catalog and an access mode
///
/// Reading is lazy: the chunk reader is built on the first read and discarded
/// once drained. A data source is not meant to be shared between concurrent
/// callers; hand out [`DataSource::read_only_copy`] instead.
#[derive(Debug)]
pub struct DataSource {
    backend: Backend,
    mode: AccessMode,
    location: Arc<DataLocation>,
    dictionary: Option<Arc<dyn Dictionary>>,
    catalog: Arc<MetadataCatalog>,
    shape: SourceShape,
    config: SourceConfig,
    reader: Option<ChunkReader>,
}

impl DataSource {
    /// Start a data source over delimited files
    pub fn file(location: FilesystemLocation, options: FileOptions) -> DataSourceBuilder {
        Self::builder(Pending::File { location, options })
    }

    /// Start a data source over database tables or queries
    pub fn database(
        location: impl Into<DatabaseLocation>,
        provider: Arc<dyn SessionProvider>,
        dialect: Arc<dyn SqlDialect>,
    ) -> DataSourceBuilder {
        Self::builder(Pending::Database {
            location: location.into(),
            provider,
            dialect,
        })
    }

    fn builder(pending: Pending) -> DataSourceBuilder {
        DataSourceBuilder {
            pending,
            dictionary: None,
            metadata: None,
            config: SourceConfig::default(),
        }
    }

    fn target(&self) -> Result<Target<'_>, SourceError> {
        match (&self.backend, self.location.as_ref()) {
            (Backend::File(backend), DataLocation::Filesystem(files)) => {
                Ok(Target::Files(backend, files))
            }
            (Backend::Database(backend), DataLocation::Database(database)) => {
                Ok(Target::Tables(backend, database))
            }
            _ => Err(SourceError::InvalidConfig(format!(
                "{} location {} on a {} source",
                self.location.kind(),
                self.location,
                self.kind()
            ))),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self.backend {
            Backend::File(_) => SourceKind::File,
            Backend::Database(_) => SourceKind::Database,
        }
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    pub fn location(&self) -> &DataLocation {
        &self.location
    }

    pub fn catalog(&self) -> &MetadataCatalog {
        &self.catalog
    }

    pub fn shape(&self) -> SourceShape {
        self.shape
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Declared variable names, sorted
    pub fn variable_names(&self) -> Vec<String> {
        self.catalog.variable_names()
    }

    /// Number of independently addressable locations
    ///
    /// A file collection is read as one stream and counts once.
    pub fn num_data_locations(&self) -> usize {
        match self.backend {
            Backend::File(_) => 1,
            Backend::Database(_) => self.location.size(),
        }
    }

    /// Short name of the address at `index`: file name or table name
    pub fn get_name(&self, index: usize) -> Option<String> {
        match self.target().ok()? {
            Target::Files(_, files) => files.addresses().get(index).map(|p| FileBackend::file_name(p)),
            Target::Tables(_, database) => database.table_names().into_iter().nth(index),
        }
    }

    /// Check the underlying store can be reached
    pub fn test_connection(&self) -> bool {
        match &self.backend {
            Backend::File(_) => true,
            Backend::Database(db) => db.provider.test_connection(),
        }
    }

    /// Check every address of the location exists
    pub fn exists(&self) -> Result<bool, SourceError> {
        match self.target()? {
            Target::Files(backend, files) => Ok(backend.exists(files)),
            Target::Tables(backend, database) => backend.exists(database),
        }
    }

    /// Remove the files or tables behind the location
    #[allow(clippy::should_implement_trait)]
    pub fn drop(&mut self) -> Result<(), SourceError> {
        if !self.mode.is_writable() {
            return Err(SourceError::AccessMode {
                mode: self.mode,
                operation: "drop".to_string(),
            });
        }
        match self.target()? {
            Target::Files(backend, files) => backend.drop_files(files)?,
            Target::Tables(backend, database) => backend.drop_tables(&unique_tables(database))?,
        }
        self.reader = None;
        self.shape.rows = None;
        Ok(())
    }

    /// An independent read-only source sharing this one's catalog and location
    pub fn read_only_copy(&self) -> DataSource {
        DataSource {
            backend: self.backend.clone(),
            mode: AccessMode::ReadOnly,
            location: self.location.clone(),
            dictionary: self.dictionary.clone(),
            catalog: self.catalog.clone(),
            shape: self.shape,
            config: self.config.clone(),
            reader: None,
        }
    }

    /// A read-only source over the same store with a given catalog and shape
    ///
    /// Nothing is fetched or counted; `location` defaults to this source's.
    pub fn read_only_view(
        &self,
        catalog: Arc<MetadataCatalog>,
        shape: SourceShape,
        location: Option<DataLocation>,
    ) -> Result<DataSource, SourceError> {
        let mut view = self.read_only_copy();
        if let Some(location) = location {
            view.location = Arc::new(location);
            view.target()?;
        }
        view.catalog = catalog;
        view.shape = shape;
        Ok(view)
    }

    fn fetch_existing_metadata(&self) -> Result<MetadataCatalog, SourceError> {
        let dictionary = self.dictionary.as_ref().ok_or_else(|| {
            SourceError::InvalidConfig(format!("a dictionary is needed in {} mode", self.mode))
        })?;
        if !self.exists()? {
            return Err(SourceError::NotFound(self.location.to_string()));
        }
        let mut catalog = dictionary.read_metadata(&self.location)?;
        if let Some(database) = self.location.as_database() {
            let projection = database.variable_names();
            if !projection.is_empty() {
                catalog = catalog.sub_catalog(&projection)?;
            }
        }
        catalog.ensure_complete()?;
        debug!(
            source = %self.location,
            variables = catalog.size(),
            "Fetched metadata"
        );
        Ok(catalog)
    }

    fn create_target(&self, metadata: &MetadataCatalog) -> Result<(), SourceError> {
        let differences = match self.target()? {
            Target::Files(backend, files) => {
                backend.drop_files(files)?;
                backend.create(files, metadata)?;
                let mut differences = backend.verify_created(files, metadata)?;
                if let Some(dictionary) = &self.dictionary {
                    let fetched = dictionary.read_metadata(&self.location)?;
                    differences.extend(metadata.schema_differences(&fetched));
                }
                differences
            }
            Target::Tables(backend, database) => {
                let tables = unique_tables(database);
                backend.drop_tables(&tables)?;
                backend.create_tables(&tables, metadata)?;
                let fetched = backend.dictionary().read_metadata(&self.location)?;
                metadata.schema_differences(&fetched)
            }
        };
        if !differences.is_empty() {
            return Err(SourceError::RoundTrip {
                variables: differences,
            });
        }
        Ok(())
    }

    /// Data rows across all addresses
    pub fn compute_size(&self) -> Result<u64, SourceError> {
        match self.target()? {
            Target::Files(backend, files) => backend.count_rows(files),
            Target::Tables(backend, database) => backend.count_rows(database),
        }
    }

    fn open_reader(&self) -> Result<ChunkReader, SourceError> {
        let cursors = match self.target()? {
            Target::Files(backend, files) => files
                .paths()
                .iter()
                .map(|path| {
                    let cursor = backend.open_cursor(path, Some(&self.catalog))?;
                    Ok((path.display().to_string(), Cursor::File(cursor)))
                })
                .collect::<Result<Vec<_>, SourceError>>()?,
            Target::Tables(_, DatabaseLocation::Table(tables)) => tables
                .addresses()
                .iter()
                .map(|table| {
                    let cursor = QueryCursor::for_table(table, self.catalog.variable_names());
                    (table.clone(), Cursor::Query(cursor))
                })
                .collect(),
            Target::Tables(_, DatabaseLocation::Query(queries)) => queries
                .addresses()
                .iter()
                .map(|query| {
                    let cursor = QueryCursor::new(query.clone(), self.catalog.variable_names());
                    (query.clone(), Cursor::Query(cursor))
                })
                .collect(),
        };
        Ok(ChunkReader::new(cursors))
    }

    /// Stream preprocessed chunks to `f` in location order
    ///
    /// Returning `ControlFlow::Break` stops before the next chunk; a later
    /// call resumes where this one stopped. Once every location is drained the
    /// rows read must equal the declared row count.
    pub fn read_chunks<F>(&mut self, mut f: F) -> Result<ChunkSummary, SourceError>
    where
        F: FnMut(DataFrame) -> ControlFlow<()>,
    {
        let mut reader = match self.reader.take() {
            Some(reader) => reader,
            None => self.open_reader()?,
        };
        let (mut session, dialect) = match &self.backend {
            Backend::Database(db) if reader.needs_session() => {
                (Some(db.session()?), Some(db.dialect.clone()))
            }
            _ => (None, None),
        };
        let start_rows = reader.rows_read();
        let start_chunks = reader.chunks_read();

        while let Some(chunk) =
            reader.next_chunk(session.as_mut(), dialect.as_deref(), self.config.chunk_size)?
        {
            let frame = preprocess_chunk(chunk.frame, &self.catalog, &chunk.address)?;
            debug!(address = %chunk.address, rows = frame.num_rows(), "Read chunk");
            if f(frame).is_break() {
                let summary = ChunkSummary {
                    rows: reader.rows_read() - start_rows,
                    chunks: reader.chunks_read() - start_chunks,
                    drained: false,
                };
                self.reader = Some(reader);
                if let Some(session) = session {
                    session.close()?;
                }
                return Ok(summary);
            }
        }
        if let Some(session) = session {
            session.close()?;
        }

        let rows_read = reader.rows_read();
        match self.shape.rows {
            Some(expected) if rows_read != expected => {
                return Err(SourceError::RowCountMismatch {
                    expected,
                    actual: rows_read,
                });
            }
            _ => {}
        }
        Ok(ChunkSummary {
            rows: rows_read - start_rows,
            chunks: reader.chunks_read() - start_chunks,
            drained: true,
        })
    }

    /// Read every row into one frame, in catalog column order
    pub fn read_all(&mut self) -> Result<ReadResult, SourceError> {
        let start = Instant::now();
        self.reader = None;
        let mut frame = DataFrame::empty(&self.catalog.variable_names());
        let mut failure = None;
        self.read_chunks(|chunk| match frame.append(chunk) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        })?;
        if let Some(reason) = failure {
            self.reader = None;
            return Err(reason.into());
        }

        let elapsed = start.elapsed();
        info!(
            source = %self.location,
            rows = frame.num_rows(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Read data source"
        );
        Ok(ReadResult { frame, elapsed })
    }

    /// Write rows, partitioned across the location's targets
    ///
    /// Partitions are written concurrently by `workers` threads. A failed
    /// partition does not undo the others; the first error is returned once
    /// all partitions have finished.
    pub fn write(
        &mut self,
        frame: DataFrame,
        partitioning: &Partitioning,
    ) -> Result<WriteSummary, SourceError> {
        if !self.mode.is_writable() {
            return Err(SourceError::AccessMode {
                mode: self.mode,
                operation: "write".to_string(),
            });
        }
        let frame = preprocess_chunk(frame, &self.catalog, &self.location.to_string())?;
        let targets: Vec<String> = match self.target()? {
            Target::Files(_, files) => files.addresses().to_vec(),
            Target::Tables(_, database) => unique_tables(database),
        };
        let partitioning = match partitioning {
            Partitioning::ByVariable {
                variable,
                assignment,
            } => Partitioning::ByVariable {
                variable: self.catalog.normalize_name(variable),
                assignment: assignment.clone(),
            },
            Partitioning::Even => Partitioning::Even,
        };
        let partitions = partition_rows(&frame, targets.len(), &partitioning)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| SourceError::InvalidConfig(format!("worker pool: {}", e)))?;
        let backend = &self.backend;
        let catalog = self.catalog.as_ref();
        let results: Vec<Result<usize, SourceError>> = pool.install(|| {
            targets
                .par_iter()
                .zip(partitions.par_iter())
                .map(|(target, rows)| {
                    let partition = frame.take_rows(rows);
                    match backend {
                        Backend::File(files) => {
                            files.write_partition(Path::new(target), &partition, catalog)
                        }
                        Backend::Database(db) => db.write_partition(target, &partition),
                    }
                })
                .collect()
        });

        let mut summary = WriteSummary::default();
        let mut first_error = None;
        for (target, result) in targets.iter().zip(results) {
            match result {
                Ok(rows) => summary.rows_per_location.push(rows),
                Err(e) => {
                    warn!(target = %target, "Partition write failed: {}", e);
                    summary.rows_per_location.push(0);
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(rows) = self.shape.rows.as_mut() {
            *rows += summary.total() as u64;
        }
        self.reader = None;
        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            source = %self.location,
            rows = summary.total(),
            partitions = targets.len(),
            "Wrote data source"
        );
        Ok(summary)
    }

    /// Distinct values and missing counts of every variable
    ///
    /// Histograms of all addresses are merged. Each variable's counts must
    /// add up to the declared row count.
    pub fn get_uniques(&self) -> Result<Uniques, SourceError> {
        let mut histograms = HistogramSet::default();
        for name in self.catalog.variable_names() {
            histograms.declare(&name);
        }
        match self.target()? {
            Target::Files(_, _) => {
                let mut copy = self.read_only_copy();
                copy.read_chunks(|chunk| {
                    histograms.add_frame(&chunk);
                    ControlFlow::Continue(())
                })?;
            }
            Target::Tables(backend, database) => {
                self.table_histograms(backend, database, &mut histograms)?;
            }
        }
        histograms.finish(self.shape.rows)
    }

    fn table_histograms(
        &self,
        backend: &DatabaseBackend,
        database: &DatabaseLocation,
        histograms: &mut HistogramSet,
    ) -> Result<(), SourceError> {
        let mut session = backend.session()?;
        for (table, predicate) in database.table_names().iter().zip(database.where_clauses()) {
            for name in self.catalog.variable_names() {
                let query = backend.dialect.histogram_sql(table, &name, &predicate);
                let frame = session.fetch(&query)?;
                let (values, counts) = histogram_columns(&frame, &query)?;
                let variable_type = self.catalog.get_type(&name)?;
                let values = technical_preprocessing(&name, variable_type, values);
                let values = self.catalog.format_datetime_data(&name, values)?;
                for (value, count) in values.into_iter().zip(counts) {
                    histograms.add(&name, value, count);
                }
            }
            debug!(table = %table, predicate = %predicate, "Computed histograms");
        }
        session.close()?;
        Ok(())
    }
}

/// Values and counts of a histogram query result
fn histogram_columns(frame: &DataFrame, query: &str) -> Result<(Vec<Value>, Vec<u64>), SourceError> {
    let unexpected = |reason: &str| ConnectionError::UnexpectedResult {
        query: query.to_string(),
        reason: reason.to_string(),
    };
    let columns = frame.columns();
    let values = frame
        .column(VALUE_COLUMN)
        .or_else(|| columns.first())
        .ok_or_else(|| unexpected("no value column"))?;
    let counts = frame
        .column(COUNT_COLUMN)
        .or_else(|| columns.get(1))
        .ok_or_else(|| unexpected("no count column"))?;
    let counts = counts
        .values
        .iter()
        .map(|v| {
            v.as_i64()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| unexpected("count is not a non-negative integer"))
        })
        .collect::<Result<Vec<u64>, _>>()?;
    Ok((values.values.clone(), counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{VariableMetadata, VariableType};
    use crate::location::{DatabaseQueryLocation, DatabaseTableLocation};
    use crate::models::Column;

    fn tables(names: &[&str]) -> DataLocation {
        DatabaseTableLocation::new(names.iter().copied()).unwrap().into()
    }

    #[test]
    fn test_query_locations_are_read_only() {
        let location: DataLocation =
            DatabaseQueryLocation::new(["SELECT * FROM S.T WHERE X = 1"]).unwrap().into();
        let config = SourceConfig::default();
        assert!(check_targets(&location, AccessMode::ReadOnly, &config).is_ok());
        assert!(matches!(
            check_targets(&location, AccessMode::Append, &config),
            Err(SourceError::AccessMode { .. })
        ));
    }

    #[test]
    fn test_writable_sources_need_a_single_target() {
        let config = SourceConfig::default();
        assert!(check_targets(&tables(&["S.A"]), AccessMode::Create, &config).is_ok());
        assert!(matches!(
            check_targets(&tables(&["S.A", "S.B"]), AccessMode::Append, &config),
            Err(SourceError::MultipleTargets { targets: 2, .. })
        ));
        assert!(check_targets(&tables(&["S.A", "S.B"]), AccessMode::ReadOnly, &config).is_ok());

        let partitioned = SourceConfig {
            partitioned_target: true,
            ..Default::default()
        };
        assert!(check_targets(&tables(&["S.A", "S.B"]), AccessMode::Create, &partitioned).is_ok());
    }

    #[test]
    fn test_empty_file_location_is_not_writable() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let pattern = dir.path().join("*.csv").display().to_string();
        let location: DataLocation = FilesystemLocation::new([pattern]).unwrap().into();
        assert!(matches!(
            check_targets(&location, AccessMode::Append, &SourceConfig::default()),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_histogram_columns() {
        let frame = DataFrame::from_columns(vec![
            Column::new(VALUE_COLUMN, vec!["a".into(), Value::Null]),
            Column::new(COUNT_COLUMN, vec![Value::Integer(3), Value::Integer(1)]),
        ])
        .unwrap();
        let (values, counts) = histogram_columns(&frame, "q").unwrap();
        assert_eq!(values, vec![Value::from("a"), Value::Null]);
        assert_eq!(counts, vec![3, 1]);

        let bad = DataFrame::from_columns(vec![
            Column::new(VALUE_COLUMN, vec!["a".into()]),
            Column::new(COUNT_COLUMN, vec![Value::Integer(-1)]),
        ])
        .unwrap();
        assert!(histogram_columns(&bad, "q").is_err());
    }

    #[test]
    fn test_create_mode_needs_metadata() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("out.csv").display().to_string();
        let err = DataSource::file(
            FilesystemLocation::literal([path]).unwrap(),
            FileOptions::default(),
        )
        .open(AccessMode::Create)
        .unwrap_err();
        assert!(matches!(err, SourceError::InvalidConfig(_)));
    }

    #[test]
    fn test_read_only_view_rejects_foreign_location() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("out.csv").display().to_string();
        let catalog = MetadataCatalog::new(
            vec![VariableMetadata::new("ID", VariableType::Integer)],
            false,
        )
        .unwrap();
        let source = DataSource::file(
            FilesystemLocation::literal([path]).unwrap(),
            FileOptions::default(),
        )
        .metadata(catalog.clone())
        .open(AccessMode::Create)
        .expect("Failed to create source");

        assert!(
            source
                .read_only_view(Arc::new(catalog.clone()), source.shape(), Some(tables(&["S.T"])))
                .is_err()
        );
        let view = source
            .read_only_view(Arc::new(catalog), SourceShape::default(), None)
            .unwrap();
        assert_eq!(view.access_mode(), AccessMode::ReadOnly);
        assert_eq!(view.shape().rows, None);
    }
}
