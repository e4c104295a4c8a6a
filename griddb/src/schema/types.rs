use crate::document::Document;
use crate::error::{GridError, Result};
use crate::grid::Grid;
use crate::item::{DataType, Feature, Item};
use crate::query::QueryDefaults;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Top-level grid definition parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    /// Reject rows that fail validation instead of warning
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub query: QueryDefaults,
    pub columns: Vec<ColumnDefinition>,
}

/// Definition of a single column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl SchemaDefinition {
    /// Build the schema document, rejecting duplicate names and multiple primary keys
    pub fn to_document(&self) -> Result<Document> {
        let mut seen = HashSet::new();
        let mut columns = Document::new(self.name.clone());

        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(GridError::Schema(format!(
                    "Column '{}' is declared more than once",
                    column.name
                )));
            }
            let mut item = Item::new(column.name.clone(), column.data_type);
            for feature in &column.features {
                item.enable_feature(feature.clone());
            }
            columns.add(item);
        }

        let primary = columns.items_with_feature(&Feature::IsPrimary).count();
        if primary > 1 {
            return Err(GridError::Schema(format!(
                "Schema '{}' tags {primary} columns as primary key",
                self.name
            )));
        }

        Ok(columns)
    }

    /// An empty grid with this schema
    pub fn new_grid(&self) -> Result<Grid> {
        Ok(Grid::new(self.name.clone(), self.to_document()?))
    }
}
