//! The schema graph manager.
//!
//! [`Designer`] owns the tables, fields and relations of one project and is
//! the only writer of them. Every mutation runs its inference pass before
//! returning, so readers only ever observe a convention-consistent graph.
//! Each operation also records [`Change`]s and flags the project as
//! modified for whoever persists or re-renders it.

use chrono::Utc;
use tracing::{debug, info};

use crate::config::DesignerConfig;
use crate::error::DesignerError;
use crate::inference::{self, RelationDelta, Violation};
use crate::model::{
    Field, FieldId, FieldUpdate, Position, Relation, RelationId, Table, TableId, TableOption,
    TableOptions,
};
use crate::placement::Placer;
use crate::store::SchemaStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    TableAdded(TableId),
    TableUpdated(TableId),
    TableRemoved(TableId),
    FieldAdded(FieldId),
    FieldUpdated(FieldId),
    FieldRemoved(FieldId),
    RelationAdded(RelationId),
    RelationRemoved(RelationId),
}

impl Change {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TableAdded(_) => "table-added",
            Self::TableUpdated(_) => "table-updated",
            Self::TableRemoved(_) => "table-removed",
            Self::FieldAdded(_) => "field-added",
            Self::FieldUpdated(_) => "field-updated",
            Self::FieldRemoved(_) => "field-removed",
            Self::RelationAdded(_) => "relation-added",
            Self::RelationRemoved(_) => "relation-removed",
        }
    }

    pub fn entity_id(&self) -> String {
        match self {
            Self::TableAdded(id) | Self::TableUpdated(id) | Self::TableRemoved(id) => id.to_string(),
            Self::FieldAdded(id) | Self::FieldUpdated(id) | Self::FieldRemoved(id) => id.to_string(),
            Self::RelationAdded(id) | Self::RelationRemoved(id) => id.to_string(),
        }
    }
}

/// What a table removal took down with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removal {
    pub fields: Vec<FieldId>,
    pub relations: Vec<RelationId>,
}

pub struct Designer {
    store: SchemaStore,
    config: DesignerConfig,
    placer: Placer,
    pointer: Position,
    modified: bool,
    changes: Vec<Change>,
}

impl Default for Designer {
    fn default() -> Self {
        Self::with_config(DesignerConfig::default())
    }
}

impl Designer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DesignerConfig) -> Self {
        Self::from_store(SchemaStore::new(), config)
    }

    /// Relations are taken as stored; see [`Designer::reconcile`].
    pub fn from_store(store: SchemaStore, config: DesignerConfig) -> Self {
        Self {
            store,
            placer: Placer::new(config.placement_step),
            config,
            pointer: Position::default(),
            modified: false,
            changes: Vec::new(),
        }
    }

    // Reads

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.store.tables()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.store.fields()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.store.relations()
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.store.table(id)
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.store.field(id)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.store.relation(id)
    }

    pub fn fields_of(&self, table_id: TableId) -> impl Iterator<Item = &Field> {
        self.store.fields_of(table_id)
    }

    pub fn relations_touching(&self, table_id: TableId) -> impl Iterator<Item = &Relation> {
        self.store.relations_touching(table_id)
    }

    pub fn relation_for_field(&self, field_id: FieldId) -> Option<&Relation> {
        self.store.relation_for_field(field_id)
    }

    // Project state

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    pub fn set_pointer(&mut self, position: Position) {
        self.pointer = position;
    }

    pub fn check(&self) -> Vec<Violation> {
        inference::audit(&self.store)
    }

    pub fn reconcile(&mut self) -> RelationDelta {
        let delta = inference::reconcile(&mut self.store);
        if !delta.is_empty() {
            self.record_delta(&delta);
            self.modified = true;
        }
        delta
    }

    // Tables

    pub fn create_table(&mut self) -> TableId {
        let occupied: Vec<Position> = self.store.tables().map(|t| t.position).collect();
        let position = self.placer.place(self.pointer, &occupied);

        let table = Table {
            id: TableId::new(),
            name: self.config.default_table_name.clone(),
            position,
            options: self.config.default_options,
            created_at: Utc::now(),
        };
        let table_id = table.id;
        debug!(table = %table_id, x = position.x, y = position.y, "table created");
        self.store.insert_table(table);
        self.changes.push(Change::TableAdded(table_id));

        let field_id = self.insert_default_field(table_id);

        let mut delta = RelationDelta::default();
        inference::table_created(&mut self.store, table_id, &mut delta);
        inference::infer_field(&mut self.store, field_id, &mut delta);
        self.record_delta(&delta);

        self.modified = true;
        table_id
    }

    /// Fields elsewhere that lost their target are re-resolved.
    pub fn remove_table(&mut self, table_id: TableId) -> Option<Removal> {
        if self.store.table(table_id).is_none() {
            debug!(table = %table_id, "remove_table: unknown table");
            return None;
        }

        let mut delta = RelationDelta::default();
        let orphaned = inference::detach_incoming(&mut self.store, table_id, &mut delta);

        let owned: Vec<FieldId> = self.store.fields_of(table_id).map(|f| f.id).collect();
        for &field_id in &owned {
            inference::detach_field(&mut self.store, field_id, &mut delta);
            self.store.remove_field(field_id);
        }
        self.store.remove_table(table_id);

        let removal = Removal {
            fields: owned.clone(),
            relations: delta.retracted.iter().map(|r| r.id).collect(),
        };

        for field_id in orphaned {
            inference::infer_field(&mut self.store, field_id, &mut delta);
        }

        info!(
            table = %table_id,
            fields = removal.fields.len(),
            relations = removal.relations.len(),
            "table removed"
        );
        self.record_delta(&delta);
        self.changes
            .extend(owned.into_iter().map(Change::FieldRemoved));
        self.changes.push(Change::TableRemoved(table_id));
        self.modified = true;
        Some(removal)
    }

    pub fn rename_table(&mut self, table_id: TableId, name: &str) -> Result<(), DesignerError> {
        let table = self
            .store
            .table_mut(table_id)
            .ok_or(DesignerError::TableNotFound(table_id))?;
        debug!(table = %table_id, from = %table.name, to = %name, "table renamed");
        table.name = name.to_string();

        let mut delta = RelationDelta::default();
        inference::table_renamed(&mut self.store, table_id, &mut delta);
        self.record_delta(&delta);

        self.touch_table(table_id);
        Ok(())
    }

    pub fn reposition_table(
        &mut self,
        table_id: TableId,
        position: Position,
    ) -> Result<(), DesignerError> {
        let table = self
            .store
            .table_mut(table_id)
            .ok_or(DesignerError::TableNotFound(table_id))?;
        table.position = position;
        self.touch_table(table_id);
        Ok(())
    }

    pub fn set_table_option(
        &mut self,
        table_id: TableId,
        option: TableOption,
        value: bool,
    ) -> Result<(), DesignerError> {
        let table = self
            .store
            .table_mut(table_id)
            .ok_or(DesignerError::TableNotFound(table_id))?;
        debug!(table = %table_id, %option, value, "table option set");
        table.options.set(option, value);
        self.touch_table(table_id);
        Ok(())
    }

    pub fn update_table_options(
        &mut self,
        table_id: TableId,
        options: TableOptions,
    ) -> Result<(), DesignerError> {
        let table = self
            .store
            .table_mut(table_id)
            .ok_or(DesignerError::TableNotFound(table_id))?;
        table.options = options;
        self.touch_table(table_id);
        Ok(())
    }

    // Fields

    pub fn add_field(&mut self, table_id: TableId) -> Result<FieldId, DesignerError> {
        if self.store.table(table_id).is_none() {
            return Err(DesignerError::TableNotFound(table_id));
        }
        let field_id = self.insert_default_field(table_id);

        let mut delta = RelationDelta::default();
        inference::infer_field(&mut self.store, field_id, &mut delta);
        self.record_delta(&delta);

        self.modified = true;
        Ok(field_id)
    }

    pub fn update_field(
        &mut self,
        field_id: FieldId,
        update: FieldUpdate,
    ) -> Result<(), DesignerError> {
        let field = self
            .store
            .field_mut(field_id)
            .ok_or(DesignerError::FieldNotFound(field_id))?;

        match update {
            FieldUpdate::Name(name) => {
                debug!(field = %field_id, from = %field.name, to = %name, "field renamed");
                field.name = name;
                let mut delta = RelationDelta::default();
                inference::infer_field(&mut self.store, field_id, &mut delta);
                self.record_delta(&delta);
            }
            FieldUpdate::Type(field_type) => {
                debug!(field = %field_id, %field_type, "field type changed");
                field.field_type = field_type;
            }
        }

        self.changes.push(Change::FieldUpdated(field_id));
        self.modified = true;
        Ok(())
    }

    pub fn rename_field(&mut self, field_id: FieldId, name: &str) -> Result<(), DesignerError> {
        self.update_field(field_id, FieldUpdate::Name(name.to_string()))
    }

    pub fn remove_field(&mut self, field_id: FieldId) -> Option<Field> {
        self.store.field(field_id)?;

        let mut delta = RelationDelta::default();
        inference::detach_field(&mut self.store, field_id, &mut delta);
        let field = self.store.remove_field(field_id)?;
        debug!(field = %field_id, name = %field.name, "field removed");

        self.record_delta(&delta);
        self.changes.push(Change::FieldRemoved(field_id));
        self.modified = true;
        Some(field)
    }

    fn insert_default_field(&mut self, table_id: TableId) -> FieldId {
        let field = Field {
            id: FieldId::new(),
            table_id,
            name: self.config.default_field_name.clone(),
            field_type: self.config.default_field_type,
        };
        let field_id = field.id;
        self.store.insert_field(field);
        self.changes.push(Change::FieldAdded(field_id));
        field_id
    }

    fn touch_table(&mut self, table_id: TableId) {
        self.changes.push(Change::TableUpdated(table_id));
        self.modified = true;
    }

    fn record_delta(&mut self, delta: &RelationDelta) {
        self.changes
            .extend(delta.retracted.iter().map(|r| Change::RelationRemoved(r.id)));
        self.changes
            .extend(delta.created.iter().map(|r| Change::RelationAdded(r.id)));
    }
}
