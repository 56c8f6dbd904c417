use crate::types::record::Pointer;
use serde::Deserialize;
use serde_json::Value;

pub const FIELD_TYPE_REFERENCE: &str = "Reference";

/// Back-reference from a draft row to the published row it edits.
pub const DRAFT_OWNER_FIELD: &str = "t__owner";

/// A content model; its rows live in the class named by `table_name`.
#[derive(Deserialize, Debug, Clone)]
pub struct Model {
    #[serde(rename = "objectId", default)]
    pub id: Option<String>,
    pub site: Pointer,
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(rename = "nameId", default)]
    pub name_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelField {
    #[serde(rename = "objectId", default)]
    pub id: Option<String>,
    pub model: Pointer,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub validations: Option<Value>,
}

/// Removes `name_id` from `validations.models.modelsList` when the models
/// validation is active. Returns whether anything changed; every other entry
/// and key is left untouched.
pub fn scrub_model_reference(validations: &mut Value, name_id: &str) -> bool {
    let Some(models) = validations.get_mut("models") else {
        return false;
    };
    let active = models.get("active").and_then(Value::as_bool).unwrap_or(false);
    if !active {
        return false;
    }
    let Some(list) = models.get_mut("modelsList").and_then(Value::as_array_mut) else {
        return false;
    };
    match list.iter().position(|v| v.as_str() == Some(name_id)) {
        Some(i) => {
            list.remove(i);
            true
        }
        None => false,
    }
}
