use serde::{Deserialize, Serialize};

/// Response of `GET /crm/v3/schemas`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaListResponse {
    #[serde(default)]
    pub results: Vec<ObjectSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    pub object_type_id: Option<String>,
    pub name: Option<String>,
}

impl SchemaListResponse {
    /// Object type ids of every schema that has one.
    pub fn object_type_ids(self) -> Vec<String> {
        self.results
            .into_iter()
            .filter_map(|schema| schema.object_type_id)
            .filter(|id| !id.trim().is_empty())
            .collect()
    }
}

/// Response of `GET /crm/v3/objects/{objectType}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectPageResponse {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging {
    pub next: Option<NextPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextPage {
    pub after: Option<String>,
    pub link: Option<String>,
}

impl ObjectPageResponse {
    pub fn next_after(&self) -> Option<String> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .and_then(|n| n.after.clone())
            .filter(|after| !after.is_empty())
    }
}
