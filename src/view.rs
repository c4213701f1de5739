//! Display projection of the schema graph for renderers.

use serde::Serialize;

use crate::designer::Designer;
use crate::model::{FieldId, Position, RelationId, TableId, TableOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Tables,
    Keys,
    All,
}

impl DetailLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tables" => Some(Self::Tables),
            "keys" | "fk" => Some(Self::Keys),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagramView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: TableId,
    pub label: String,
    pub position: Position,
    pub options: TableOptions,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    pub id: FieldId,
    pub name: String,
    pub typ: String,
    pub is_fk: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub relation: RelationId,
    pub field: FieldId,
    pub from: TableId,
    pub to: TableId,
    pub label: String,
}

impl DiagramView {
    /// Projects the designer's graph. `include` restricts the nodes to the
    /// given tables; edges are kept only when both ends are included.
    pub fn build(designer: &Designer, include: Option<&[TableId]>, detail: DetailLevel) -> Self {
        let nodes: Vec<Node> = designer
            .tables()
            .filter(|t| include.is_none_or(|ids| ids.contains(&t.id)))
            .map(|t| {
                let columns = designer
                    .fields_of(t.id)
                    .filter_map(|f| {
                        let is_fk = designer.relation_for_field(f.id).is_some();
                        let keep = match detail {
                            DetailLevel::Tables => false,
                            DetailLevel::Keys => is_fk,
                            DetailLevel::All => true,
                        };
                        keep.then(|| ColumnView {
                            id: f.id,
                            name: f.name.clone(),
                            typ: f.field_type.to_string(),
                            is_fk,
                        })
                    })
                    .collect();

                Node {
                    id: t.id,
                    label: t.name.clone(),
                    position: t.position,
                    options: t.options,
                    columns,
                }
            })
            .collect();

        let node_ids: Vec<TableId> = nodes.iter().map(|n| n.id).collect();

        let edges = designer
            .relations()
            .filter(|r| node_ids.contains(&r.from_table_id) && node_ids.contains(&r.to_table_id))
            .map(|r| Edge {
                relation: r.id,
                field: r.field_id,
                from: r.from_table_id,
                to: r.to_table_id,
                label: designer
                    .field(r.field_id)
                    .map(|f| f.name.clone())
                    .unwrap_or_default(),
            })
            .collect();

        DiagramView { nodes, edges }
    }
}
