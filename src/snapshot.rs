//! Serializable view of a designer's collections.
//!
//! Storage itself lives outside this crate; a snapshot is what gets handed
//! to it and what comes back when a project is opened.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DesignerConfig;
use crate::designer::Designer;
use crate::error::DesignerError;
use crate::inference::RelationDelta;
use crate::model::{Field, Relation, Table};
use crate::store::SchemaStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tables: Vec<Table>,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Snapshot {
    pub fn capture(designer: &Designer) -> Self {
        Self {
            tables: designer.tables().cloned().collect(),
            fields: designer.fields().cloned().collect(),
            relations: designer.relations().copied().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, DesignerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self, DesignerError> {
        Ok(serde_json::from_str(input)?)
    }

    fn into_store(self) -> Result<SchemaStore, DesignerError> {
        let mut store = SchemaStore::new();
        for table in self.tables {
            store.insert_table(table);
        }
        for field in self.fields {
            if store.table(field.table_id).is_none() {
                return Err(DesignerError::OrphanedField {
                    field: field.id,
                    table: field.table_id,
                });
            }
            store.insert_field(field);
        }
        for relation in self.relations {
            store.insert_relation(relation);
        }
        Ok(store)
    }
}

impl Designer {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Loads a snapshot and recomputes its relations, so stale or missing
    /// edges in the stored data are repaired on open. Fields owned by a
    /// table absent from the snapshot are rejected.
    pub fn from_snapshot(
        snapshot: Snapshot,
        config: DesignerConfig,
    ) -> Result<(Self, RelationDelta), DesignerError> {
        let store = snapshot.into_store()?;
        let mut designer = Designer::from_store(store, config);
        let delta = designer.reconcile();
        if !delta.is_empty() {
            warn!(
                created = delta.created.len(),
                retracted = delta.retracted.len(),
                "snapshot relations repaired on load"
            );
        }
        Ok((designer, delta))
    }
}
