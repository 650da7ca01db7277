//! In-memory record source
//!
//! Holds one collection per entity in a `DashMap`, so fetches and mutations
//! for different entities never contend. It is seeded either directly or from
//! a directory of exports named after the envelope keys (`users.json`,
//! `kyc.csv`, `clients.json`, ...).

use dashmap::DashMap;
use std::future::Future;
use std::path::Path;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, info};

use crate::core::entities::EntityKind;
use crate::core::traits::{Mutation, RecordSource};
use crate::io::async_reader::AsyncReader;
use crate::io::json_format::parse_list_envelope;
use crate::types::{Collection, DashboardError, Record};

/// Default number of CSV rows read per batch when seeding from disk
pub const DEFAULT_SEED_BATCH_SIZE: usize = 1000;

/// Thread-safe in-memory [`RecordSource`]
#[derive(Debug, Default)]
pub struct MemorySource {
    collections: DashMap<EntityKind, Collection>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding
    pub fn with(self, kind: EntityKind, collection: Collection) -> Self {
        self.insert(kind, collection);
        self
    }

    /// Replace the collection for `kind`
    pub fn insert(&self, kind: EntityKind, collection: Collection) {
        self.collections.insert(kind, collection);
    }

    /// Seed every entity that has an export in `dir`
    ///
    /// For each entity, `<envelope_key>.json` is preferred over
    /// `<envelope_key>.csv`. Entities without an export start empty.
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if `dir` does not exist
    /// * Any parse error from an export that does exist
    pub async fn from_dir(dir: &Path, batch_size: usize) -> Result<Self, DashboardError> {
        if tokio::fs::metadata(dir).await.is_err() {
            return Err(DashboardError::FileNotFound {
                path: dir.display().to_string(),
            });
        }

        let source = Self::new();
        for kind in EntityKind::ALL {
            let json = dir.join(format!("{}.json", kind.envelope_key()));
            let csv = dir.join(format!("{}.csv", kind.envelope_key()));

            let collection = if tokio::fs::try_exists(&json).await? {
                let body = tokio::fs::read_to_string(&json).await?;
                parse_list_envelope(kind, &body)?
            } else if tokio::fs::try_exists(&csv).await? {
                let file = tokio::fs::File::open(&csv).await?;
                AsyncReader::new(file.compat()).read_all(batch_size).await?
            } else {
                debug!(entity = %kind, "no export found");
                continue;
            };

            info!(entity = %kind, records = collection.len(), "seeded collection");
            source.insert(kind, collection);
        }
        Ok(source)
    }

    fn apply(&self, kind: EntityKind, mutation: Mutation) -> Result<Record, DashboardError> {
        let mut entry = self.collections.entry(kind).or_default();
        let collection: &mut Collection = &mut entry;

        let record = match mutation {
            Mutation::Create(mut record) => {
                match record.id() {
                    Some(id) if position_of(collection, &id).is_some() => {
                        return Err(DashboardError::Api {
                            status: 409,
                            message: format!("{} '{}' already exists", kind.singular_key(), id),
                        });
                    }
                    Some(_) => {}
                    None => record.insert("id", next_id(&collection.records)),
                }
                // Newest first, the way the API lists them
                collection.records.insert(0, record.clone());
                record
            }
            Mutation::Update { id, changes } => {
                let index = position_of(collection, &id)
                    .ok_or_else(|| DashboardError::not_found(kind.singular_key(), &id))?;
                let target = &mut collection.records[index];
                target.apply(&changes);
                target.clone()
            }
            Mutation::Delete { id } => {
                let index = position_of(collection, &id)
                    .ok_or_else(|| DashboardError::not_found(kind.singular_key(), &id))?;
                collection.records.remove(index)
            }
        };

        for (field, _) in record.fields() {
            if !collection.columns.iter().any(|c| c == field) {
                collection.columns.push(field.to_string());
            }
        }
        Ok(record)
    }
}

fn position_of(collection: &Collection, id: &str) -> Option<usize> {
    collection
        .records
        .iter()
        .position(|record| record.id().as_deref() == Some(id))
}

fn next_id(records: &[Record]) -> i64 {
    records
        .iter()
        .filter_map(|record| record.id()?.parse::<i64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

impl RecordSource for MemorySource {
    fn fetch(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Collection, DashboardError>> + Send {
        let collection = self
            .collections
            .get(&kind)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        async move { Ok(collection) }
    }

    fn mutate(
        &self,
        kind: EntityKind,
        mutation: Mutation,
    ) -> impl Future<Output = Result<Record, DashboardError>> + Send {
        let result = self.apply(kind, mutation);
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use std::fs;
    use tempfile::TempDir;

    fn users() -> Collection {
        Collection::from_records(vec![
            Record::new().with("id", 1).with("name", "Ana"),
            Record::new().with("id", 2).with("name", "Bob"),
        ])
    }

    #[tokio::test]
    async fn test_fetch_unseeded_entity_is_empty() {
        let source = MemorySource::new();
        let collection = source.fetch(EntityKind::Products).await.unwrap();
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn test_create_assigns_next_id_and_lists_first() {
        let source = MemorySource::new().with(EntityKind::Users, users());

        let created = source
            .mutate(
                EntityKind::Users,
                Mutation::Create(Record::new().with("name", "Carla").with("gender", "female")),
            )
            .await
            .unwrap();
        assert_eq!(created.id(), Some("3".to_string()));

        let collection = source.fetch(EntityKind::Users).await.unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.records[0].get("name"), Some(&Value::from("Carla")));
        assert!(collection.columns.contains(&"gender".to_string()));
    }

    #[tokio::test]
    async fn test_create_with_existing_id_conflicts() {
        let source = MemorySource::new().with(EntityKind::Users, users());

        let result = source
            .mutate(EntityKind::Users, Mutation::Create(Record::new().with("id", 2)))
            .await;
        assert!(matches!(result, Err(DashboardError::Api { status: 409, .. })));
    }

    #[tokio::test]
    async fn test_update_and_delete_by_id() {
        let source = MemorySource::new().with(EntityKind::Users, users());

        let updated = source
            .mutate(
                EntityKind::Users,
                Mutation::Update {
                    id: "1".to_string(),
                    changes: Record::new().with("name", "Ana Silva"),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.get("name"), Some(&Value::from("Ana Silva")));

        let removed = source
            .mutate(EntityKind::Users, Mutation::Delete { id: "2".to_string() })
            .await
            .unwrap();
        assert_eq!(removed.get("name"), Some(&Value::from("Bob")));
        assert_eq!(source.fetch(EntityKind::Users).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let source = MemorySource::new().with(EntityKind::Users, users());

        let result = source
            .mutate(EntityKind::Users, Mutation::Delete { id: "99".to_string() })
            .await;
        assert_eq!(result, Err(DashboardError::not_found("user", "99")));
    }

    #[tokio::test]
    async fn test_from_dir_reads_json_and_csv() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("users.json"),
            r#"{"users": [{"id": 1, "name": "Ana"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("kyc.csv"), "id,status\n1,approved\n2,pending\n").unwrap();

        let source = MemorySource::from_dir(dir.path(), 1).await.unwrap();
        assert_eq!(source.fetch(EntityKind::Users).await.unwrap().len(), 1);
        assert_eq!(source.fetch(EntityKind::Kyc).await.unwrap().len(), 2);
        assert!(source.fetch(EntityKind::Contracts).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_dir_missing_directory() {
        let result = MemorySource::from_dir(Path::new("/nonexistent/exports"), 10).await;
        assert!(matches!(result, Err(DashboardError::FileNotFound { .. })));
    }
}
