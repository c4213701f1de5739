use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DesignerError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = DesignerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| DesignerError::InvalidId(s.to_string()))
            }
        }
    };
}

entity_id!(
    /// Opaque identifier of a table on the canvas.
    TableId
);
entity_id!(
    /// Opaque identifier of a field (column).
    FieldId
);
entity_id!(
    /// Opaque identifier of an inferred relation.
    RelationId
);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Exact coincidence on both axes. Visual overlap is not considered.
    pub fn coincides_with(&self, other: &Position) -> bool {
        self.x == other.x && self.y == other.y
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOption {
    HasAutoId,
    RememberToken,
    SoftDeletes,
    Timestamps,
}

impl TableOption {
    pub const ALL: [TableOption; 4] = [
        TableOption::HasAutoId,
        TableOption::RememberToken,
        TableOption::SoftDeletes,
        TableOption::Timestamps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasAutoId => "hasAutoId",
            Self::RememberToken => "rememberToken",
            Self::SoftDeletes => "softDeletes",
            Self::Timestamps => "timestamps",
        }
    }
}

impl fmt::Display for TableOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableOption {
    type Err = DesignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" | "hasAutoId" | "has_auto_id" => Ok(Self::HasAutoId),
            "rememberToken" | "remember_token" => Ok(Self::RememberToken),
            "softDeletes" | "soft_deletes" => Ok(Self::SoftDeletes),
            "timestamps" => Ok(Self::Timestamps),
            _ => Err(DesignerError::UnknownOption(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    pub has_auto_id: bool,
    pub remember_token: bool,
    pub soft_deletes: bool,
    pub timestamps: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            has_auto_id: true,
            remember_token: false,
            soft_deletes: false,
            timestamps: true,
        }
    }
}

impl TableOptions {
    pub fn get(&self, option: TableOption) -> bool {
        match option {
            TableOption::HasAutoId => self.has_auto_id,
            TableOption::RememberToken => self.remember_token,
            TableOption::SoftDeletes => self.soft_deletes,
            TableOption::Timestamps => self.timestamps,
        }
    }

    pub fn set(&mut self, option: TableOption, value: bool) {
        let flag = match option {
            TableOption::HasAutoId => &mut self.has_auto_id,
            TableOption::RememberToken => &mut self.remember_token,
            TableOption::SoftDeletes => &mut self.soft_deletes,
            TableOption::Timestamps => &mut self.timestamps,
        };
        *flag = value;
    }
}

/// Column types offered by the designer's type picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Increments,
    Integer,
    BigInteger,
    String,
    Text,
    Boolean,
    Date,
    DateTime,
    Timestamp,
    Float,
    Decimal,
    Json,
    Binary,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increments => "INCREMENTS",
            Self::Integer => "INTEGER",
            Self::BigInteger => "BIG_INTEGER",
            Self::String => "STRING",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::DateTime => "DATE_TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Float => "FLOAT",
            Self::Decimal => "DECIMAL",
            Self::Json => "JSON",
            Self::Binary => "BINARY",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = DesignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase().replace('-', "_");
        match upper.as_str() {
            "INCREMENTS" => Ok(Self::Increments),
            "INTEGER" | "INT" => Ok(Self::Integer),
            "BIG_INTEGER" | "BIGINTEGER" | "BIGINT" => Ok(Self::BigInteger),
            "STRING" | "VARCHAR" => Ok(Self::String),
            "TEXT" => Ok(Self::Text),
            "BOOLEAN" | "BOOL" => Ok(Self::Boolean),
            "DATE" => Ok(Self::Date),
            "DATE_TIME" | "DATETIME" => Ok(Self::DateTime),
            "TIMESTAMP" => Ok(Self::Timestamp),
            "FLOAT" => Ok(Self::Float),
            "DECIMAL" => Ok(Self::Decimal),
            "JSON" => Ok(Self::Json),
            "BINARY" => Ok(Self::Binary),
            _ => Err(DesignerError::UnknownFieldType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub position: Position,
    pub options: TableOptions,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: FieldId,
    #[serde(rename = "tableID")]
    pub table_id: TableId,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Foreign-key edge from the table owning `field_id` to `to_table_id`.
/// Never authored directly; see [`crate::inference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    #[serde(rename = "fieldID")]
    pub field_id: FieldId,
    #[serde(rename = "fromTableID")]
    pub from_table_id: TableId,
    #[serde(rename = "toTableID")]
    pub to_table_id: TableId,
}

impl Relation {
    pub fn touches(&self, table_id: TableId) -> bool {
        self.from_table_id == table_id || self.to_table_id == table_id
    }
}

/// A single-attribute edit of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Name(String),
    Type(FieldType),
}

impl FieldUpdate {
    /// Builds an update from an attribute name as sent by the UI layer
    /// (`"name"` or `"type"`).
    pub fn parse(attribute: &str, value: &str) -> Result<Self, DesignerError> {
        match attribute {
            "name" => Ok(Self::Name(value.to_string())),
            "type" => Ok(Self::Type(value.parse()?)),
            _ => Err(DesignerError::UnknownAttribute(attribute.to_string())),
        }
    }
}
