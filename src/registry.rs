//! Field maps keyed by transaction set code
//!
//! The mapping file has the layout
//! `{ "850": { "fields": [ { "code": "poNumber", "segment": "BEG03", "include": true } ] } }`.
//! Path expressions are compiled when the registry loads, so a bad entry fails at startup
//! rather than halfway through a document.
use super::error::{ConfigError, PipelineError};
use super::query::PathExpr;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_MAPPING: &str = include_str!("../config/edi_mapping.json");

#[derive(Debug, Deserialize)]
struct DocumentMapping {
    #[serde(default)]
    description: Option<String>,
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    code: String,
    segment: String,
    #[serde(default = "included")]
    include: bool,
}

fn included() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct FieldMap {
    pub doc_type: String,
    pub description: Option<String>,
    fields: Vec<(String, PathExpr)>, // canonical name -> path, in file order
}

#[derive(Debug, Clone, Default)]
pub struct FieldMapRegistry {
    maps: HashMap<String, FieldMap>,
}

impl FieldMap {
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, path: PathExpr) -> Self {
        self.fields.push((name.into(), path));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &PathExpr)> {
        self.fields.iter().map(|(name, path)| (name.as_str(), path))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldMapRegistry {
    /// The mapping shipped with the crate: 850, 856 and 810.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_MAPPING)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mappings: HashMap<String, DocumentMapping> = serde_json::from_str(raw)?;
        let mut registry = Self::default();

        for (doc_type, mapping) in mappings {
            let mut map = FieldMap::new(doc_type.clone());
            map.description = mapping.description;

            for entry in mapping.fields.into_iter().filter(|f| f.include) {
                let path =
                    entry
                        .segment
                        .parse::<PathExpr>()
                        .map_err(|source| ConfigError::InvalidPath {
                            doc_type: doc_type.clone(),
                            field: entry.code.clone(),
                            source,
                        })?;
                map = map.with_field(entry.code, path);
            }
            registry.insert(map);
        }

        tracing::debug!(doc_types = ?registry.doc_types(), "Loaded field maps");
        Ok(registry)
    }

    pub fn insert(&mut self, map: FieldMap) {
        self.maps.insert(map.doc_type.clone(), map);
    }

    pub fn map_for(&self, doc_type: &str) -> Result<&FieldMap, PipelineError> {
        self.maps
            .get(doc_type)
            .ok_or_else(|| PipelineError::UnknownDocumentType(doc_type.to_string()))
    }

    pub fn doc_types(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.maps.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}
