use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::filter::{FilterCriteria, filter_records};
use super::loader::load_file;
use super::model::{Dataset, Field, Record, unique_values};
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// RecordSource – where the dashboard gets its rows
// ---------------------------------------------------------------------------

/// A provider of dashboard records.
///
/// `get_filtered` must agree with [`filter_records`] applied to `get_all`,
/// which is what the default implementation does.
pub trait RecordSource {
    /// Every record, in source order.
    fn get_all(&self) -> Result<Vec<Record>, SourceError>;

    /// Records passing `criteria`, in source order.
    fn get_filtered(&self, criteria: &FilterCriteria) -> Result<Vec<Record>, SourceError> {
        let records = self.get_all()?;
        Ok(filter_records(&records, criteria)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Distinct non-empty values of `field` over the full dataset.
    fn get_unique_values(&self, field: Field) -> Result<BTreeSet<String>, SourceError> {
        Ok(unique_values(&self.get_all()?, field))
    }

    /// [`RecordSource::get_unique_values`] addressed by column name.
    fn get_unique_values_of(&self, column: &str) -> Result<BTreeSet<String>, SourceError> {
        let field = column.parse::<Field>()?;
        self.get_unique_values(field)
    }
}

/// An already loaded dataset serves itself.
impl RecordSource for Dataset {
    fn get_all(&self) -> Result<Vec<Record>, SourceError> {
        Ok(self.records.clone())
    }

    fn get_filtered(&self, criteria: &FilterCriteria) -> Result<Vec<Record>, SourceError> {
        Ok(filter_records(&self.records, criteria)
            .into_iter()
            .cloned()
            .collect())
    }

    fn get_unique_values(&self, field: Field) -> Result<BTreeSet<String>, SourceError> {
        Ok(unique_values(&self.records, field))
    }
}

// ---------------------------------------------------------------------------
// FileSource – re-reads a JSON / CSV / Parquet export on every fetch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Dataset, SourceError> {
        load_file(&self.path).map_err(|e| {
            log::warn!("Record source {} failed: {e:#}", self.path.display());
            SourceError::unavailable(format!("{e:#}"))
        })
    }
}

impl RecordSource for FileSource {
    fn get_all(&self) -> Result<Vec<Record>, SourceError> {
        Ok(self.load()?.records)
    }
}
