//! Id-indexed collections of tables, fields and relations.
//!
//! The store performs no inference; it only keeps the three collections and
//! answers the lookups the designer and the presentation layer need.
//! Iteration follows insertion order.

use indexmap::IndexMap;

use crate::model::{Field, FieldId, Relation, RelationId, Table, TableId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaStore {
    tables: IndexMap<TableId, Table>,
    fields: IndexMap<FieldId, Field>,
    relations: IndexMap<RelationId, Relation>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(&id)
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.get_mut(&id)
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(&id)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.fields.get_mut(&id)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn insert_table(&mut self, table: Table) {
        self.tables.insert(table.id, table);
    }

    pub fn insert_field(&mut self, field: Field) {
        self.fields.insert(field.id, field);
    }

    pub fn insert_relation(&mut self, relation: Relation) {
        self.relations.insert(relation.id, relation);
    }

    pub fn remove_table(&mut self, id: TableId) -> Option<Table> {
        self.tables.shift_remove(&id)
    }

    pub fn remove_field(&mut self, id: FieldId) -> Option<Field> {
        self.fields.shift_remove(&id)
    }

    pub fn remove_relation(&mut self, id: RelationId) -> Option<Relation> {
        self.relations.shift_remove(&id)
    }

    /// Fields owned by `table_id`, in insertion order.
    pub fn fields_of(&self, table_id: TableId) -> impl Iterator<Item = &Field> {
        self.fields.values().filter(move |f| f.table_id == table_id)
    }

    /// At most one relation exists per field.
    pub fn relation_for_field(&self, field_id: FieldId) -> Option<&Relation> {
        self.relations.values().find(|r| r.field_id == field_id)
    }

    pub fn relations_to(&self, table_id: TableId) -> impl Iterator<Item = &Relation> {
        self.relations
            .values()
            .filter(move |r| r.to_table_id == table_id)
    }

    pub fn relations_from(&self, table_id: TableId) -> impl Iterator<Item = &Relation> {
        self.relations
            .values()
            .filter(move |r| r.from_table_id == table_id)
    }

    /// Relations where the table is either source or target.
    pub fn relations_touching(&self, table_id: TableId) -> impl Iterator<Item = &Relation> {
        self.relations.values().filter(move |r| r.touches(table_id))
    }

    /// First table (in insertion order) carrying `name`.
    pub fn table_named(&self, name: &str) -> Option<&Table> {
        self.tables.values().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, Position, TableOptions};
    use chrono::Utc;

    fn table(name: &str) -> Table {
        Table {
            id: TableId::new(),
            name: name.to_string(),
            position: Position::default(),
            options: TableOptions::default(),
            created_at: Utc::now(),
        }
    }

    fn field(table_id: TableId, name: &str) -> Field {
        Field {
            id: FieldId::new(),
            table_id,
            name: name.to_string(),
            field_type: FieldType::Integer,
        }
    }

    #[test]
    fn test_fields_of_filters_by_owner() {
        let mut store = SchemaStore::new();
        let user = table("User");
        let post = table("Post");
        let (user_id, post_id) = (user.id, post.id);
        store.insert_table(user);
        store.insert_table(post);
        store.insert_field(field(user_id, "name"));
        store.insert_field(field(post_id, "title"));
        store.insert_field(field(post_id, "user_id"));

        let names: Vec<&str> = store.fields_of(post_id).map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "user_id"]);
        assert_eq!(store.fields_of(user_id).count(), 1);
    }

    #[test]
    fn test_relations_touching_both_sides() {
        let mut store = SchemaStore::new();
        let (a, b, c) = (TableId::new(), TableId::new(), TableId::new());
        let rel = |from, to| Relation {
            id: RelationId::new(),
            field_id: FieldId::new(),
            from_table_id: from,
            to_table_id: to,
        };
        store.insert_relation(rel(a, b));
        store.insert_relation(rel(b, c));
        store.insert_relation(rel(c, a));

        assert_eq!(store.relations_touching(b).count(), 2);
        assert_eq!(store.relations_to(a).count(), 1);
        assert_eq!(store.relations_from(a).count(), 1);
    }

    #[test]
    fn test_table_named_returns_first() {
        let mut store = SchemaStore::new();
        let first = table("User");
        let first_id = first.id;
        store.insert_table(first);
        store.insert_table(table("User"));
        assert_eq!(store.table_named("User").map(|t| t.id), Some(first_id));
        assert!(store.table_named("Account").is_none());
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut store = SchemaStore::new();
        let ids: Vec<TableId> = ["A", "B", "C"]
            .iter()
            .map(|n| {
                let t = table(n);
                let id = t.id;
                store.insert_table(t);
                id
            })
            .collect();
        store.remove_table(ids[1]);
        let names: Vec<&str> = store.tables().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
