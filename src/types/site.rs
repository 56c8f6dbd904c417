use crate::types::record::Pointer;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Site {
    #[serde(rename = "objectId")]
    pub id: String,
    pub owner: Pointer,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MediaItem {
    #[serde(rename = "objectId", default)]
    pub id: Option<String>,
    pub site: Pointer,
}
