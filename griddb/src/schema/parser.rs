use crate::error::Result;
use super::types::SchemaDefinition;

/// Parse a grid definition YAML string into a SchemaDefinition
pub fn parse_schema_str(content: &str) -> Result<SchemaDefinition> {
    let schema: SchemaDefinition = serde_yaml::from_str(content)?;
    schema.to_document()?;
    Ok(schema)
}
