//! Capture the tracked collections and reconcile the service back to them.
//!
//! Reconciliation matches entities by title, since ids are not stable across
//! delete/create cycles. Records and live entities pair up one-to-one in
//! listing order, so entities sharing a title each keep their own record.
//! Live duplicates beyond the captured count are left alone.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{Collection, Entity};
use crate::fixtures;
use crate::http::ApiClient;
use crate::testing::assert::{Failure, expect_status};

/// What restore compares and writes back for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub title: String,
    pub description: String,
    pub flags: BTreeMap<String, bool>,
}

impl EntityRecord {
    fn from_entity(collection: Collection, entity: &Entity) -> Self {
        let flags = collection
            .status_fields()
            .iter()
            .map(|field| ((*field).to_string(), entity.flag(field).unwrap_or(false)))
            .collect();
        Self {
            title: entity.title.clone(),
            description: entity.description.clone(),
            flags,
        }
    }

    fn differs_from(&self, collection: Collection, entity: &Entity) -> bool {
        self != &Self::from_entity(collection, entity)
    }

    fn to_payload(&self) -> Value {
        let mut body = Map::new();
        body.insert("title".into(), Value::String(self.title.clone()));
        body.insert("description".into(), Value::String(self.description.clone()));
        for (field, flag) in &self.flags {
            body.insert(field.clone(), Value::Bool(*flag));
        }
        Value::Object(body)
    }
}

/// Baseline of the tracked collections. Read-only once captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    records: BTreeMap<Collection, Vec<EntityRecord>>,
}

impl Snapshot {
    pub fn capture(client: &ApiClient, collections: &[Collection]) -> Result<Self, Failure> {
        let mut records = BTreeMap::new();
        for &collection in collections {
            let entities = fixtures::list(client, collection)?;
            let captured: Vec<EntityRecord> = entities
                .iter()
                .map(|entity| EntityRecord::from_entity(collection, entity))
                .collect();
            tracing::debug!(%collection, count = captured.len(), "captured collection");
            records.insert(collection, captured);
        }
        Ok(Self { records })
    }

    pub fn collections(&self) -> impl Iterator<Item = Collection> + '_ {
        self.records.keys().copied()
    }

    pub fn records(&self, collection: Collection) -> &[EntityRecord] {
        self.records.get(&collection).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreCounts {
    pub deleted: usize,
    pub recreated: usize,
    pub updated: usize,
}

impl RestoreCounts {
    pub fn total(&self) -> usize {
        self.deleted + self.recreated + self.updated
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub collections: BTreeMap<Collection, RestoreCounts>,
}

impl RestoreReport {
    pub fn is_noop(&self) -> bool {
        self.collections.values().all(|counts| counts.total() == 0)
    }
}

/// Brings every captured collection back in line with `snapshot`. The first
/// failing delete, update or create aborts the remaining steps.
pub fn restore(client: &ApiClient, snapshot: &Snapshot) -> Result<RestoreReport, Failure> {
    let mut report = RestoreReport::default();
    for collection in snapshot.collections() {
        let counts = restore_collection(client, collection, snapshot.records(collection))?;
        if counts.total() > 0 {
            tracing::info!(
                %collection,
                deleted = counts.deleted,
                recreated = counts.recreated,
                updated = counts.updated,
                "restored collection"
            );
        }
        report.collections.insert(collection, counts);
    }
    Ok(report)
}

fn restore_collection(
    client: &ApiClient,
    collection: Collection,
    records: &[EntityRecord],
) -> Result<RestoreCounts, Failure> {
    let current = fixtures::list(client, collection)?;
    let known: HashSet<&str> = records.iter().map(|record| record.title.as_str()).collect();
    let mut counts = RestoreCounts::default();

    for entity in current.iter().filter(|entity| !known.contains(entity.title.as_str())) {
        tracing::debug!(%collection, id = %entity.id, title = %entity.title, "deleting added entity");
        fixtures::delete(client, collection, &entity.id).map_err(|failure| {
            Failure::assertion(format!(
                "Failed to delete {collection} with title '{}': {failure}",
                entity.title
            ))
        })?;
        counts.deleted += 1;
    }

    let mut claimed: HashSet<&str> = HashSet::new();
    for record in records {
        let matched = current
            .iter()
            .find(|entity| entity.title == record.title && !claimed.contains(entity.id.as_str()));
        if let Some(entity) = matched {
            claimed.insert(entity.id.as_str());
        }
        match matched {
            Some(existing) if record.differs_from(collection, existing) => {
                let path = collection.item_path(&existing.id);
                let response = client.put_json(&path, &record.to_payload())?;
                expect_status(
                    &response,
                    200,
                    &format!("Failed to update {collection} with title '{}'", record.title),
                )?;
                counts.updated += 1;
            }
            Some(_) => {}
            None => {
                let response = client.post_json(&collection.path(), &record.to_payload())?;
                expect_status(
                    &response,
                    201,
                    &format!("Failed to recreate {collection} with title '{}'", record.title),
                )?;
                counts.recreated += 1;
            }
        }
    }

    Ok(counts)
}
