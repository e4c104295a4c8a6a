use crate::document::Document;
use crate::error::{GridError, Result};
use crate::item::{scalar, Feature};

/// Result of validating a row
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Validate a row against the grid's columns.
/// In strict mode every issue is an error; otherwise issues are warnings only.
pub fn validate_row(columns: &Document, row: &Document, strict: bool) -> ValidationResult {
    let mut result = ValidationResult::default();

    for item in row.items() {
        let Some(column) = columns.item(item.name()) else {
            add_issue(
                &mut result,
                strict,
                format!("Unexpected field '{}' (not in schema)", item.name()),
            );
            continue;
        };

        let data_type = column.data_type();
        for value in item.values().iter().filter(|v| !v.trim().is_empty()) {
            if !scalar::parses_as(data_type, value) {
                add_issue(
                    &mut result,
                    strict,
                    format!(
                        "Field '{}' expected {data_type}, got '{value}'",
                        item.name()
                    ),
                );
            }
        }
    }

    for column in columns.items_with_feature(&Feature::IsRequired) {
        if row.item(column.name()).map_or(true, |i| i.is_empty()) {
            add_issue(
                &mut result,
                strict,
                format!("Required field '{}' is missing", column.name()),
            );
        }
    }

    result
}

/// Validate a row and fail on errors; warnings are logged.
pub fn check_row(columns: &Document, row: &Document, strict: bool) -> Result<()> {
    let result = validate_row(columns, row, strict);

    for warning in &result.warnings {
        log::warn!("Row '{}': {}", row.name(), warning);
    }

    if !result.is_ok() {
        return Err(GridError::Validation(result.errors.join("; ")));
    }
    Ok(())
}

fn add_issue(result: &mut ValidationResult, strict: bool, message: String) {
    if strict {
        result.errors.push(message);
    } else {
        result.warnings.push(message);
    }
}
