use crate::types::acl::Acl;
use crate::types::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Keys the backend owns; they are never sent back on save.
const RESERVED: [&str; 5] = ["className", "objectId", "createdAt", "updatedAt", "ACL"];

/// Reference to another record.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "objectId")]
    pub object_id: String,
}

impl Pointer {
    pub fn new(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "__type": "Pointer",
            "className": self.class_name,
            "objectId": self.object_id,
        })
    }
}

impl From<Pointer> for Value {
    fn from(pointer: Pointer) -> Self {
        pointer.to_value()
    }
}

impl From<&Pointer> for Value {
    fn from(pointer: &Pointer) -> Self {
        pointer.to_value()
    }
}

impl Serialize for Pointer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// A schemaless object-store record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(into = "Value", try_from = "Value")]
pub struct Record {
    pub class_name: String,
    pub id: Option<String>,
    pub acl: Option<Acl>,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            id: None,
            acl: None,
            fields: Map::new(),
        }
    }

    /// Builds a record from the backend's JSON, forcing the class name when
    /// the payload omits it (REST reads do).
    pub fn from_json(class_name: &str, value: Value) -> Result<Self, AppError> {
        let Value::Object(mut map) = value else {
            return Err(AppError::Internal(format!("{class_name} record is not an object")));
        };
        map.entry("className")
            .or_insert_with(|| Value::String(class_name.to_string()));
        Record::try_from(Value::Object(map))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.acl = Some(acl);
        self
    }

    pub fn id(&self) -> Result<&str, AppError> {
        self.id
            .as_deref()
            .ok_or_else(|| AppError::Validation(format!("{} record has no objectId", self.class_name)))
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn pointer(&self, key: &str) -> Option<Pointer> {
        self.fields
            .get(key)
            .filter(|v| v.is_object())
            .and_then(|v| Pointer::deserialize(v).ok())
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn to_pointer(&self) -> Result<Pointer, AppError> {
        Ok(Pointer::new(self.class_name.clone(), self.id()?))
    }

    /// Decodes the record into a typed view; `objectId` is visible to it.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let mut map = self.fields.clone();
        if let Some(id) = &self.id {
            map.insert("objectId".into(), Value::String(id.clone()));
        }
        serde_json::from_value(Value::Object(map)).map_err(|e| {
            AppError::Validation(format!("malformed {} record: {e}", self.class_name))
        })
    }

    /// Body for a create/update call: user fields plus the ACL.
    pub fn to_write_body(&self) -> Value {
        let mut map = self.fields.clone();
        for key in RESERVED {
            map.remove(key);
        }
        if let Some(acl) = &self.acl {
            map.insert("ACL".into(), serde_json::to_value(acl).unwrap_or(Value::Null));
        }
        Value::Object(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        let mut map = record.fields;
        map.insert("className".into(), Value::String(record.class_name));
        if let Some(id) = record.id {
            map.insert("objectId".into(), Value::String(id));
        }
        if let Some(acl) = record.acl {
            if let Ok(acl) = serde_json::to_value(acl) {
                map.insert("ACL".into(), acl);
            }
        }
        Value::Object(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut map) = value else {
            return Err(AppError::Validation("record must be a JSON object".into()));
        };
        let class_name = match map.remove("className") {
            Some(Value::String(name)) => name,
            _ => return Err(AppError::Validation("record has no className".into())),
        };
        let id = match map.remove("objectId") {
            Some(Value::String(id)) => Some(id),
            _ => None,
        };
        let acl = match map.remove("ACL") {
            Some(Value::Null) | None => None,
            Some(acl) => Some(serde_json::from_value(acl)?),
        };
        map.remove("__type");
        Ok(Record {
            class_name,
            id,
            acl,
            fields: map,
        })
    }
}
