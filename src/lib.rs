pub mod config;
pub mod designer;
pub mod error;
pub mod inference;
pub mod model;
pub mod naming;
pub mod placement;
pub mod snapshot;
pub mod store;
pub mod view;

use wasm_bindgen::prelude::*;

use config::DesignerConfig;
use designer::{Change, Designer};
use model::{FieldId, FieldUpdate, Position, TableId, TableOption};
use snapshot::Snapshot;
use view::{DetailLevel, DiagramView};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Designer handle exposed to the canvas UI. Ids cross the boundary as
/// strings, collections as JSON.
#[wasm_bindgen]
pub struct WasmDesigner {
    inner: Designer,
}

#[wasm_bindgen]
impl WasmDesigner {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: Designer::new(),
        }
    }

    #[wasm_bindgen(js_name = "fromSnapshot")]
    pub fn from_snapshot(json: &str) -> Result<WasmDesigner, String> {
        let snapshot = Snapshot::from_json(json).map_err(|e| e.to_string())?;
        let (inner, _) =
            Designer::from_snapshot(snapshot, DesignerConfig::default()).map_err(|e| e.to_string())?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = "setPointer")]
    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.inner.set_pointer(Position::new(x, y));
    }

    #[wasm_bindgen(js_name = "createTable")]
    pub fn create_table(&mut self) -> String {
        self.inner.create_table().to_string()
    }

    #[wasm_bindgen(js_name = "removeTable")]
    pub fn remove_table(&mut self, table_id: &str) -> Result<bool, String> {
        let id = parse_arg::<TableId>(table_id)?;
        Ok(self.inner.remove_table(id).is_some())
    }

    #[wasm_bindgen(js_name = "renameTable")]
    pub fn rename_table(&mut self, table_id: &str, name: &str) -> Result<(), String> {
        let id = parse_arg::<TableId>(table_id)?;
        self.inner.rename_table(id, name).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "repositionTable")]
    pub fn reposition_table(&mut self, table_id: &str, x: f64, y: f64) -> Result<(), String> {
        let id = parse_arg::<TableId>(table_id)?;
        self.inner
            .reposition_table(id, Position::new(x, y))
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "setTableOption")]
    pub fn set_table_option(&mut self, table_id: &str, option: &str, value: bool) -> Result<(), String> {
        let id = parse_arg::<TableId>(table_id)?;
        let option = parse_arg::<TableOption>(option)?;
        self.inner
            .set_table_option(id, option, value)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "addField")]
    pub fn add_field(&mut self, table_id: &str) -> Result<String, String> {
        let id = parse_arg::<TableId>(table_id)?;
        self.inner
            .add_field(id)
            .map(|field_id| field_id.to_string())
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "updateField")]
    pub fn update_field(&mut self, field_id: &str, attribute: &str, value: &str) -> Result<(), String> {
        let id = parse_arg::<FieldId>(field_id)?;
        let update = FieldUpdate::parse(attribute, value).map_err(|e| e.to_string())?;
        self.inner.update_field(id, update).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "removeField")]
    pub fn remove_field(&mut self, field_id: &str) -> Result<bool, String> {
        let id = parse_arg::<FieldId>(field_id)?;
        Ok(self.inner.remove_field(id).is_some())
    }

    #[wasm_bindgen(js_name = "isModified")]
    pub fn is_modified(&self) -> bool {
        self.inner.is_modified()
    }

    #[wasm_bindgen(js_name = "markSaved")]
    pub fn mark_saved(&mut self) {
        self.inner.mark_saved();
    }

    /// Changes since the last call as `{ kind, id }` objects.
    #[wasm_bindgen(js_name = "takeChanges")]
    pub fn take_changes(&mut self) -> Result<js_sys::Array, String> {
        self.inner
            .take_changes()
            .iter()
            .map(change_to_js)
            .collect()
    }

    /// Ids of the fields owned by a table.
    #[wasm_bindgen(js_name = "fieldIds")]
    pub fn field_ids(&self, table_id: &str) -> Result<js_sys::Array, String> {
        let id = parse_arg::<TableId>(table_id)?;
        Ok(self
            .inner
            .fields_of(id)
            .map(|f| JsValue::from_str(&f.id.to_string()))
            .collect())
    }

    /// Ids of the relations a table takes part in, as source or target.
    #[wasm_bindgen(js_name = "relationIds")]
    pub fn relation_ids(&self, table_id: &str) -> Result<js_sys::Array, String> {
        let id = parse_arg::<TableId>(table_id)?;
        Ok(self
            .inner
            .relations_touching(id)
            .map(|r| JsValue::from_str(&r.id.to_string()))
            .collect())
    }

    pub fn snapshot(&self) -> Result<String, String> {
        self.inner.snapshot().to_json().map_err(|e| e.to_string())
    }

    /// Render-ready projection as JSON. `detail` is one of `tables`, `keys`,
    /// `all` (default).
    pub fn diagram(&self, detail: Option<String>) -> Result<String, String> {
        let detail_level = detail
            .as_deref()
            .and_then(DetailLevel::from_str)
            .unwrap_or(DetailLevel::All);
        let view = DiagramView::build(&self.inner, None, detail_level);
        serde_json::to_string(&view).map_err(|e| e.to_string())
    }
}

impl Default for WasmDesigner {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_arg<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr<Err = error::DesignerError>,
{
    s.parse().map_err(|e: error::DesignerError| e.to_string())
}

fn change_entries(change: &Change) -> [(&'static str, String); 2] {
    [("kind", change.kind().to_string()), ("id", change.entity_id())]
}

fn change_to_js(change: &Change) -> Result<JsValue, String> {
    let object = js_sys::Object::new();
    for (key, value) in change_entries(change) {
        js_sys::Reflect::set(&object, &key.into(), &value.into())
            .map_err(|e| format!("Failed to set {}: {:?}", key, e))?;
    }
    Ok(object.into())
}
