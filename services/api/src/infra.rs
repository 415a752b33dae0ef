use bsd_index::error::AppError;
use bsd_index::{BsdRepository, BsdType, RepositoryError, WasteDocument};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Fixture files are either a bare list of bordereaux or `{ "bsds": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    List(Vec<WasteDocument>),
    Wrapped { bsds: Vec<WasteDocument> },
}

impl FixtureFile {
    fn into_records(self) -> Vec<WasteDocument> {
        match self {
            FixtureFile::List(records) | FixtureFile::Wrapped { bsds: records } => records,
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBsdRepository {
    records: Arc<Mutex<BTreeMap<String, WasteDocument>>>,
}

impl InMemoryBsdRepository {
    pub(crate) fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let fixtures: FixtureFile = serde_json::from_reader(reader)?;
        let repository = Self::default();
        for record in fixtures.into_records() {
            repository.upsert(record);
        }
        Ok(repository)
    }

    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Stores a record, replacing any earlier revision with the same id.
    pub(crate) fn upsert(&self, record: WasteDocument) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id().to_string(), record);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl BsdRepository for InMemoryBsdRepository {
    fn get_record_for_indexing(&self, id: &str) -> Result<WasteDocument, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    fn list_ids(&self, bsd_type: Option<BsdType>) -> Result<Vec<String>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| bsd_type.map_or(true, |wanted| record.bsd_type() == wanted))
            .map(|record| record.id().to_string())
            .collect())
    }
}

pub(crate) fn parse_bsd_type(raw: &str) -> Result<BsdType, String> {
    BsdType::from_str(raw).map_err(|err| err.to_string())
}
