use crate::model::{FieldId, TableId};

#[derive(Debug, thiserror::Error)]
pub enum DesignerError {
    #[error("Table not found: {0}")]
    TableNotFound(TableId),
    #[error("Field not found: {0}")]
    FieldNotFound(FieldId),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Unknown table option: {0}")]
    UnknownOption(String),
    #[error("Unknown field attribute: {0}")]
    UnknownAttribute(String),
    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),
    #[error("Field {field} belongs to missing table {table}")]
    OrphanedField { field: FieldId, table: TableId },
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(#[source] serde_json::Error),
}
