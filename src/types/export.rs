use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Denormalized artifact consumed by the downstream app.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExportDocument {
    pub makes: Vec<ExportMake>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExportMake {
    pub id: i64,
    pub name: String,
    pub models: Vec<ExportModel>,
    /// Fields added downstream; carried through canonicalization untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExportModel {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExportMake {
    pub fn new(id: i64, name: impl Into<String>, models: Vec<ExportModel>) -> Self {
        Self {
            id,
            name: name.into(),
            models,
            extra: Map::new(),
        }
    }
}

impl ExportModel {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Map::new(),
        }
    }
}

impl ExportDocument {
    pub fn new(makes: Vec<ExportMake>) -> Self {
        Self {
            makes,
            extra: Map::new(),
        }
    }

    pub fn model_count(&self) -> usize {
        self.makes.iter().map(|m| m.models.len()).sum()
    }
}
