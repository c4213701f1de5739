//! Relation inference passes.
//!
//! Relations are derived state: a field carries exactly one relation when its
//! name references an existing table by convention (see [`crate::naming`]),
//! and none otherwise. Each pass below restores that property for the part
//! of the graph touched by one mutation and records what it changed.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::model::{FieldId, Relation, RelationId, TableId};
use crate::naming;
use crate::store::SchemaStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationDelta {
    pub created: Vec<Relation>,
    pub retracted: Vec<Relation>,
}

impl RelationDelta {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.retracted.is_empty()
    }

    fn create(&mut self, store: &mut SchemaStore, relation: Relation) {
        debug!(
            field = %relation.field_id,
            from = %relation.from_table_id,
            to = %relation.to_table_id,
            "relation inferred"
        );
        store.insert_relation(relation);
        self.created.push(relation);
    }

    fn retract(&mut self, store: &mut SchemaStore, id: RelationId) {
        if let Some(relation) = store.remove_relation(id) {
            debug!(field = %relation.field_id, to = %relation.to_table_id, "relation retracted");
            self.retracted.push(relation);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    OrphanedField { field: FieldId, table: TableId },
    DanglingRelation { relation: RelationId },
    MismatchedSource { relation: RelationId },
    StaleRelation { relation: RelationId },
    DuplicateRelation { field: FieldId },
    MissingRelation { field: FieldId, target: TableId },
}

/// Table the field's name points at, first match in insertion order.
pub fn resolve_target(store: &SchemaStore, field_id: FieldId) -> Option<TableId> {
    let field = store.field(field_id)?;
    let target = naming::referenced_table_name(&field.name)?;
    store.table_named(&target).map(|t| t.id)
}

pub fn relation_is_valid(store: &SchemaStore, relation: &Relation) -> bool {
    let Some(field) = store.field(relation.field_id) else {
        return false;
    };
    let Some(to_table) = store.table(relation.to_table_id) else {
        return false;
    };
    field.table_id == relation.from_table_id
        && store.table(relation.from_table_id).is_some()
        && naming::references(&field.name, &to_table.name)
}

/// A still-valid relation is kept as is.
pub fn infer_field(store: &mut SchemaStore, field_id: FieldId, delta: &mut RelationDelta) {
    let Some(from_table_id) = store.field(field_id).map(|f| f.table_id) else {
        return;
    };

    if let Some(existing) = store.relation_for_field(field_id).copied() {
        if relation_is_valid(store, &existing) {
            return;
        }
        delta.retract(store, existing.id);
    }

    if store.table(from_table_id).is_none() {
        return;
    }

    if let Some(to_table_id) = resolve_target(store, field_id) {
        delta.create(
            store,
            Relation {
                id: RelationId::new(),
                field_id,
                from_table_id,
                to_table_id,
            },
        );
    }
}

/// Fields already related elsewhere keep their relation.
pub fn table_renamed(store: &mut SchemaStore, table_id: TableId, delta: &mut RelationDelta) {
    let Some(name) = store.table(table_id).map(|t| t.name.clone()) else {
        return;
    };

    let stale: Vec<Relation> = store
        .relations_to(table_id)
        .filter(|r| !relation_is_valid(store, r))
        .copied()
        .collect();
    for relation in &stale {
        delta.retract(store, relation.id);
    }

    link_incoming(store, table_id, &name, delta);

    for relation in &stale {
        infer_field(store, relation.field_id, delta);
    }

    if !delta.is_empty() {
        info!(
            table = %table_id,
            name = %name,
            created = delta.created.len(),
            retracted = delta.retracted.len(),
            "table rename re-inferred relations"
        );
    }
}

pub fn table_created(store: &mut SchemaStore, table_id: TableId, delta: &mut RelationDelta) {
    if let Some(name) = store.table(table_id).map(|t| t.name.clone()) {
        link_incoming(store, table_id, &name, delta);
    }
}

fn link_incoming(store: &mut SchemaStore, table_id: TableId, name: &str, delta: &mut RelationDelta) {
    let candidates: Vec<(FieldId, TableId)> = store
        .fields()
        .filter(|f| naming::references(&f.name, name))
        .filter(|f| store.table(f.table_id).is_some())
        .filter(|f| store.relation_for_field(f.id).is_none())
        .map(|f| (f.id, f.table_id))
        .collect();

    for (field_id, from_table_id) in candidates {
        delta.create(
            store,
            Relation {
                id: RelationId::new(),
                field_id,
                from_table_id,
                to_table_id: table_id,
            },
        );
    }
}

pub fn detach_field(store: &mut SchemaStore, field_id: FieldId, delta: &mut RelationDelta) {
    if let Some(id) = store.relation_for_field(field_id).map(|r| r.id) {
        delta.retract(store, id);
    }
}

/// Returns the fields that lost their target.
pub fn detach_incoming(
    store: &mut SchemaStore,
    table_id: TableId,
    delta: &mut RelationDelta,
) -> Vec<FieldId> {
    let incoming: Vec<Relation> = store.relations_to(table_id).copied().collect();
    let mut fields = Vec::with_capacity(incoming.len());
    for relation in incoming {
        delta.retract(store, relation.id);
        fields.push(relation.field_id);
    }
    fields
}

pub fn reconcile(store: &mut SchemaStore) -> RelationDelta {
    let mut delta = RelationDelta::default();

    let mut seen = HashSet::new();
    let mut doomed = Vec::new();
    for relation in store.relations() {
        let dangling = store.field(relation.field_id).is_none()
            || store.table(relation.from_table_id).is_none()
            || store.table(relation.to_table_id).is_none();
        if dangling || !seen.insert(relation.field_id) {
            doomed.push(relation.id);
        }
    }
    for id in doomed {
        delta.retract(store, id);
    }

    let field_ids: Vec<FieldId> = store.fields().map(|f| f.id).collect();
    for field_id in field_ids {
        infer_field(store, field_id, &mut delta);
    }

    if !delta.is_empty() {
        info!(
            created = delta.created.len(),
            retracted = delta.retracted.len(),
            "relations reconciled"
        );
    }
    delta
}

pub fn audit(store: &SchemaStore) -> Vec<Violation> {
    let mut violations = Vec::new();

    for field in store.fields() {
        if store.table(field.table_id).is_none() {
            violations.push(Violation::OrphanedField {
                field: field.id,
                table: field.table_id,
            });
        }
    }

    let mut seen = HashSet::new();
    for relation in store.relations() {
        if !seen.insert(relation.field_id) {
            violations.push(Violation::DuplicateRelation {
                field: relation.field_id,
            });
        }

        let Some(field) = store.field(relation.field_id) else {
            violations.push(Violation::DanglingRelation {
                relation: relation.id,
            });
            continue;
        };
        if store.table(relation.from_table_id).is_none()
            || store.table(relation.to_table_id).is_none()
        {
            violations.push(Violation::DanglingRelation {
                relation: relation.id,
            });
        } else if field.table_id != relation.from_table_id {
            violations.push(Violation::MismatchedSource {
                relation: relation.id,
            });
        } else if !relation_is_valid(store, relation) {
            violations.push(Violation::StaleRelation {
                relation: relation.id,
            });
        }
    }

    for field in store.fields() {
        if store.table(field.table_id).is_none() || store.relation_for_field(field.id).is_some() {
            continue;
        }
        if let Some(target) = resolve_target(store, field.id) {
            violations.push(Violation::MissingRelation {
                field: field.id,
                target,
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, FieldType, Position, Table, TableOptions};
    use chrono::Utc;

    fn add_table(store: &mut SchemaStore, name: &str) -> TableId {
        let id = TableId::new();
        store.insert_table(Table {
            id,
            name: name.to_string(),
            position: Position::default(),
            options: TableOptions::default(),
            created_at: Utc::now(),
        });
        id
    }

    fn add_field(store: &mut SchemaStore, table_id: TableId, name: &str) -> FieldId {
        let id = FieldId::new();
        store.insert_field(Field {
            id,
            table_id,
            name: name.to_string(),
            field_type: FieldType::Integer,
        });
        id
    }

    #[test]
    fn test_infer_field_creates_once() {
        let mut store = SchemaStore::new();
        let user = add_table(&mut store, "User");
        let post = add_table(&mut store, "Post");
        let field = add_field(&mut store, post, "user_id");

        let mut delta = RelationDelta::default();
        infer_field(&mut store, field, &mut delta);
        infer_field(&mut store, field, &mut delta);

        assert_eq!(delta.created.len(), 1);
        assert_eq!(store.relation_count(), 1);
        let rel = store.relation_for_field(field).unwrap();
        assert_eq!((rel.from_table_id, rel.to_table_id), (post, user));
    }

    #[test]
    fn test_infer_field_without_target_table() {
        let mut store = SchemaStore::new();
        let post = add_table(&mut store, "Post");
        let field = add_field(&mut store, post, "author_id");

        let mut delta = RelationDelta::default();
        infer_field(&mut store, field, &mut delta);
        assert!(delta.is_empty());
        assert_eq!(store.relation_count(), 0);
    }

    #[test]
    fn test_infer_field_repoints_stale_relation() {
        let mut store = SchemaStore::new();
        let user = add_table(&mut store, "User");
        let post = add_table(&mut store, "Post");
        let field = add_field(&mut store, post, "user_id");
        let mut delta = RelationDelta::default();
        infer_field(&mut store, field, &mut delta);

        store.field_mut(field).unwrap().name = "post_id".into();
        let mut delta = RelationDelta::default();
        infer_field(&mut store, field, &mut delta);

        assert_eq!(delta.retracted.len(), 1);
        assert_eq!(delta.retracted[0].to_table_id, user);
        assert_eq!(store.relation_for_field(field).unwrap().to_table_id, post);
    }

    #[test]
    fn test_table_renamed_keeps_foreign_relation() {
        let mut store = SchemaStore::new();
        let first = add_table(&mut store, "Account");
        let post = add_table(&mut store, "Post");
        let field = add_field(&mut store, post, "account_id");
        let mut delta = RelationDelta::default();
        infer_field(&mut store, field, &mut delta);

        let second = add_table(&mut store, "Draft");
        store.table_mut(second).unwrap().name = "Account".into();
        let mut delta = RelationDelta::default();
        table_renamed(&mut store, second, &mut delta);

        assert!(delta.is_empty());
        assert_eq!(store.relation_for_field(field).unwrap().to_table_id, first);
    }

    #[test]
    fn test_table_renamed_falls_back_to_namesake() {
        let mut store = SchemaStore::new();
        let first = add_table(&mut store, "User");
        let second = add_table(&mut store, "User");
        let post = add_table(&mut store, "Post");
        let field = add_field(&mut store, post, "user_id");
        let mut delta = RelationDelta::default();
        infer_field(&mut store, field, &mut delta);
        assert_eq!(store.relation_for_field(field).unwrap().to_table_id, first);

        store.table_mut(first).unwrap().name = "Member".into();
        let mut delta = RelationDelta::default();
        table_renamed(&mut store, first, &mut delta);

        assert_eq!(store.relation_for_field(field).unwrap().to_table_id, second);
        assert!(audit(&store).is_empty());
    }

    #[test]
    fn test_reconcile_repairs_everything() {
        let mut store = SchemaStore::new();
        let user = add_table(&mut store, "User");
        let post = add_table(&mut store, "Post");
        let field = add_field(&mut store, post, "user_id");
        let title = add_field(&mut store, post, "title");
        let ghost = TableId::new();
        for (field_id, to) in [(title, user), (field, ghost), (field, user), (field, user)] {
            store.insert_relation(Relation {
                id: RelationId::new(),
                field_id,
                from_table_id: post,
                to_table_id: to,
            });
        }
        assert!(!audit(&store).is_empty());

        reconcile(&mut store);

        assert!(audit(&store).is_empty());
        assert_eq!(store.relation_count(), 1);
        assert_eq!(store.relation_for_field(field).unwrap().to_table_id, user);
    }

    #[test]
    fn test_audit_reports_missing_relation() {
        let mut store = SchemaStore::new();
        let user = add_table(&mut store, "User");
        let post = add_table(&mut store, "Post");
        let field = add_field(&mut store, post, "user_id");

        assert_eq!(
            audit(&store),
            vec![Violation::MissingRelation {
                field,
                target: user
            }]
        );
    }

    #[test]
    fn test_detach_incoming_reports_fields() {
        let mut store = SchemaStore::new();
        let user = add_table(&mut store, "User");
        let post = add_table(&mut store, "Post");
        let comment = add_table(&mut store, "Comment");
        let a = add_field(&mut store, post, "user_id");
        let b = add_field(&mut store, comment, "user_id");
        reconcile(&mut store);

        let mut delta = RelationDelta::default();
        let fields = detach_incoming(&mut store, user, &mut delta);

        assert_eq!(fields, vec![a, b]);
        assert_eq!(delta.retracted.len(), 2);
        assert_eq!(store.relation_count(), 0);
    }
}
