use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::document::IndexDocument;
use super::search_index::{IndexAdmin, IndexError, SearchIndex};
use crate::registry::Predicate;

/// Process-local index with alias support, used by the service and in tests.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    state: Mutex<IndexState>,
}

#[derive(Debug, Default)]
struct IndexState {
    indices: BTreeMap<String, BTreeMap<String, IndexDocument>>,
    aliases: BTreeMap<String, String>,
}

impl IndexState {
    fn resolve<'a>(&'a self, target: &'a str) -> &'a str {
        self.aliases.get(target).map(String::as_str).unwrap_or(target)
    }
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, IndexState>, IndexError> {
        self.state
            .lock()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))
    }

    pub fn index_names(&self) -> Result<Vec<String>, IndexError> {
        Ok(self.state()?.indices.keys().cloned().collect())
    }

    pub fn count(&self, target: &str) -> Result<usize, IndexError> {
        let state = self.state()?;
        let name = state.resolve(target);
        state
            .indices
            .get(name)
            .map(BTreeMap::len)
            .ok_or_else(|| IndexError::UnknownTarget(target.to_string()))
    }

    pub fn get(&self, target: &str, id: &str) -> Result<Option<IndexDocument>, IndexError> {
        let state = self.state()?;
        let name = state.resolve(target);
        let index = state
            .indices
            .get(name)
            .ok_or_else(|| IndexError::UnknownTarget(target.to_string()))?;
        Ok(index.get(id).cloned())
    }
}

impl SearchIndex for InMemoryIndex {
    fn submit(&self, target: &str, documents: &[IndexDocument]) -> Result<(), IndexError> {
        let mut state = self.state()?;
        let name = state.resolve(target).to_string();
        let index = state.indices.entry(name).or_default();
        for document in documents {
            index.insert(document.id.clone(), document.clone());
        }
        Ok(())
    }

    fn search(
        &self,
        target: &str,
        predicates: &[Predicate],
    ) -> Result<Vec<IndexDocument>, IndexError> {
        let state = self.state()?;
        let name = state.resolve(target);
        let index = state
            .indices
            .get(name)
            .ok_or_else(|| IndexError::UnknownTarget(target.to_string()))?;

        let mut hits: Vec<IndexDocument> = index
            .values()
            .filter(|document| predicates.iter().all(|predicate| predicate.matches(document)))
            .cloned()
            .collect();
        hits.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(hits)
    }
}

impl IndexAdmin for InMemoryIndex {
    fn create_index(&self, name: &str) -> Result<(), IndexError> {
        self.state()?.indices.entry(name.to_string()).or_default();
        Ok(())
    }

    fn point_alias(&self, alias: &str, index: &str) -> Result<(), IndexError> {
        let mut state = self.state()?;
        if !state.indices.contains_key(index) {
            return Err(IndexError::UnknownTarget(index.to_string()));
        }
        state.aliases.insert(alias.to_string(), index.to_string());
        Ok(())
    }

    fn alias_target(&self, alias: &str) -> Result<Option<String>, IndexError> {
        Ok(self.state()?.aliases.get(alias).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsds::participants::company_for_tests;
    use crate::bsds::{Bsvhu, BsvhuStatus, WasteDocument};
    use crate::index::UnionIndexWriter;
    use chrono::Utc;

    fn document(id: &str, status: BsvhuStatus) -> IndexDocument {
        let record = WasteDocument::Bsvhu(Bsvhu {
            id: id.to_string(),
            status,
            emitter: company_for_tests("11111111111111"),
            ..Bsvhu::default()
        });
        UnionIndexWriter::<InMemoryIndex>::build(&record, Utc::now())
    }

    #[test]
    fn writes_replace_documents_by_id() {
        let index = InMemoryIndex::new();
        index
            .submit("bsds", &[document("VHU-1", BsvhuStatus::Initial)])
            .expect("first write");
        index
            .submit("bsds", &[document("VHU-1", BsvhuStatus::Processed)])
            .expect("second write");

        assert_eq!(index.count("bsds").expect("index exists"), 1);
        let stored = index.get("bsds", "VHU-1").expect("index exists").expect("stored");
        assert_eq!(stored.status, "PROCESSED");
    }

    #[test]
    fn aliases_route_reads_and_writes() {
        let index = InMemoryIndex::new();
        index.create_index("bsds_v2").expect("created");
        index.point_alias("bsds", "bsds_v2").expect("alias set");
        index
            .submit("bsds", &[document("VHU-2", BsvhuStatus::Initial)])
            .expect("write through alias");

        assert_eq!(index.count("bsds_v2").expect("index exists"), 1);
        assert_eq!(index.alias_target("bsds").expect("state"), Some("bsds_v2".to_string()));
        assert!(matches!(
            index.point_alias("other", "missing"),
            Err(IndexError::UnknownTarget(_))
        ));
    }

    #[test]
    fn searching_an_unknown_target_fails() {
        let index = InMemoryIndex::new();
        assert!(matches!(
            index.search("nope", &[]),
            Err(IndexError::UnknownTarget(_))
        ));
    }
}
