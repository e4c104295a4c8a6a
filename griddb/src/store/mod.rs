mod analyze;

use crate::criteria::{Criteria, Operator, SortOrder};
use crate::document::Document;
use crate::error::{GridError, Result};
use crate::grid::{Grid, FEATURE_COL_COUNT, FEATURE_ROW_COUNT};
use crate::item::{scalar, DataType, Feature, Item};
use crate::query::{self, QueryDefaults, QueryEngine};
use crate::schema::SchemaDefinition;
use crate::validation;

pub use analyze::ColumnStatistics;

/// The main entry point: owns one grid and answers queries and writes against it.
///
/// Every query builds a fresh result grid; the owned grid is only changed through
/// `add`, `update`, `upsert`, `load_apply_update` and `delete`.
///
/// The store does no locking of its own. Reads take `&self` and may run from many
/// threads at once (share an `Arc<GridStore>`); writes take `&mut self`, so callers
/// that mix writers with other readers or writers must serialize access themselves,
/// e.g. behind an `RwLock`.
#[derive(Debug, Clone)]
pub struct GridStore {
    grid: Grid,
    defaults: QueryDefaults,
    strict: bool,
}

impl GridStore {
    /// Wrap an already populated grid, using default pagination and strict validation
    pub fn new(grid: Grid) -> Self {
        GridStore {
            grid,
            defaults: QueryDefaults::default(),
            strict: true,
        }
    }

    /// An empty store for a parsed grid definition
    pub fn from_schema(schema: &SchemaDefinition) -> Result<Self> {
        Ok(GridStore {
            grid: schema.new_grid()?,
            defaults: schema.query,
            strict: schema.strict,
        })
    }

    pub fn with_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Strict stores reject rows that fail validation; lenient ones log a warning
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    pub fn defaults(&self) -> QueryDefaults {
        self.defaults
    }

    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(self.grid.columns())
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// The whole grid, unfiltered and unpaginated
    pub fn fetch(&self) -> &Grid {
        &self.grid
    }

    /// One page of the grid in insertion order
    pub fn fetch_page(&self, offset: usize, limit: usize) -> Result<Grid> {
        let mut engine = self.engine();
        engine.prepare_unfiltered(offset, limit);
        engine.execute(&self.grid)
    }

    /// Run a criteria, paginated by its own offset/limit features or the store defaults
    pub fn fetch_criteria(&self, criteria: &Criteria) -> Result<Grid> {
        let (offset, limit) = self.defaults.page_for(criteria);
        self.fetch_criteria_page(criteria, offset, limit)
    }

    pub fn fetch_criteria_page(
        &self,
        criteria: &Criteria,
        offset: usize,
        limit: usize,
    ) -> Result<Grid> {
        let mut engine = self.engine();
        engine.prepare(criteria, offset, limit)?;
        engine.execute(&self.grid)
    }

    /// Free-text search over every searchable column.
    ///
    /// Each column is matched on its own (CONTAINS unless `operator` says otherwise)
    /// and the matches are concatenated, so a row matching two columns appears twice.
    /// Pagination is applied to the combined rows.
    pub fn search(
        &self,
        terms: &str,
        operator: Option<Operator>,
        offset: usize,
        limit: usize,
    ) -> Result<Grid> {
        let searchable = Feature::IsSearchable;
        let fields: Vec<&Item> = self.grid.columns().items_with_feature(&searchable).collect();
        if fields.is_empty() {
            return Err(GridError::MissingFeature {
                feature: searchable.to_string(),
            });
        }

        let operator = operator.unwrap_or(Operator::Contains);
        let mut union = Vec::new();
        for field in fields {
            let mut criteria =
                Criteria::new(format!("search:{}", field.name())).case_sensitive(false);
            criteria.add_item(
                operator,
                Item::with_value(field.name(), field.data_type(), terms),
            );

            let mut engine = self.engine();
            let pipeline = engine.prepare(&criteria, 0, usize::MAX)?;
            if pipeline.skipped_count() > 0 {
                log::debug!(
                    "Search skipped field '{}': {operator} does not apply",
                    field.name()
                );
                continue;
            }
            union.extend(engine.matches(&self.grid)?);
        }

        Ok(query::page_of(&self.grid, union, offset, limit))
    }

    /// Prefix suggestions from the single suggestable column, matched case-insensitively
    pub fn suggest(
        &self,
        fragment: &str,
        operator: Option<Operator>,
        limit: usize,
    ) -> Result<Grid> {
        let feature = Feature::IsSuggest;
        let mut suggestable = self.grid.columns().items_with_feature(&feature);
        let field = match (suggestable.next(), suggestable.next()) {
            (Some(field), None) => field,
            (None, _) => {
                return Err(GridError::MissingFeature {
                    feature: feature.to_string(),
                })
            }
            (Some(_), Some(_)) => {
                return Err(GridError::Schema(format!(
                    "Grid '{}' has more than one suggestable column",
                    self.grid.name()
                )))
            }
        };

        let mut criteria = Criteria::new(format!("suggest:{}", field.name())).case_sensitive(false);
        criteria.add_item(
            operator.unwrap_or(Operator::StartsWith),
            Item::with_value(field.name(), field.data_type(), fragment),
        );
        self.fetch_criteria_page(&criteria, 0, limit)
    }

    // ── Writes ──────────────────────────────────────────────────────

    fn primary_key(&self) -> Result<Item> {
        self.grid
            .columns()
            .primary_key()
            .cloned()
            .ok_or_else(|| GridError::MissingFeature {
                feature: Feature::IsPrimary.to_string(),
            })
    }

    fn required_key(key: &Item, document: &Document) -> Result<String> {
        key_of(key, document).map(String::from).ok_or_else(|| {
            GridError::Validation(format!(
                "Document has no value for primary key '{}'",
                key.name()
            ))
        })
    }

    fn positions_of(&self, key: &Item, value: &str) -> Vec<usize> {
        self.grid
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.value(key.name())
                    .is_some_and(|v| scalar::same_value(key.data_type(), v, value))
            })
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Position of the one row holding `value` as primary key
    fn position_of(&self, key: &Item, value: &str) -> Result<usize> {
        match self.positions_of(key, value).as_slice() {
            [pos] => Ok(*pos),
            [] => Err(GridError::NotFound {
                grid: self.grid.name().to_string(),
                key: value.to_string(),
            }),
            many => Err(GridError::AmbiguousKey {
                grid: self.grid.name().to_string(),
                key: value.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Key for a row added without one: one past the current numeric maximum,
    /// or a random hex id for non-numeric keys
    fn next_key(&self, key: &Item) -> Result<String> {
        let data_type = key.data_type();
        if !data_type.is_numeric() {
            return Ok(uuid::Uuid::new_v4().simple().to_string());
        }

        let stats = self.column_statistics(key.name())?;
        match data_type {
            DataType::Integer | DataType::Long => {
                let max = stats.max.as_deref().and_then(|m| m.trim().parse::<i64>().ok());
                let next = match max {
                    None => Some(1),
                    Some(max) => max.checked_add(1),
                };
                let limit = if data_type == DataType::Integer {
                    i64::from(i32::MAX)
                } else {
                    i64::MAX
                };
                match next.filter(|n| *n <= limit) {
                    Some(next) => Ok(next.to_string()),
                    None => Err(GridError::Validation(format!(
                        "No {data_type} primary key left after {} in '{}'",
                        stats.max.unwrap_or_default(),
                        self.grid.name()
                    ))),
                }
            }
            _ => {
                let next = stats.max_number().map_or(1.0, |max| max.floor() + 1.0);
                Ok(next.to_string())
            }
        }
    }

    /// Append a row, assigning a primary key when it has none. Returns the stored row.
    pub fn add(&mut self, mut document: Document) -> Result<Document> {
        let key = self.primary_key()?;

        let value = match key_of(&key, &document) {
            Some(value) => value.to_string(),
            None => {
                let value = self.next_key(&key)?;
                match document.item_mut(key.name()) {
                    Some(item) => item.set_value(value.clone()),
                    None => {
                        document.add(Item::with_value(key.name(), key.data_type(), value.clone()))
                    }
                }
                value
            }
        };

        if !self.positions_of(&key, &value).is_empty() {
            return Err(GridError::DuplicateKey {
                grid: self.grid.name().to_string(),
                key: value,
            });
        }
        validation::check_row(self.grid.columns(), &document, self.strict)?;

        log::debug!("Adding {}/{value}", self.grid.name());
        self.grid.add_row(document.clone());
        Ok(document)
    }

    /// Replace the row with the same primary key
    pub fn update(&mut self, document: Document) -> Result<()> {
        let key = self.primary_key()?;
        let value = Self::required_key(&key, &document)?;
        let pos = self.position_of(&key, &value)?;
        validation::check_row(self.grid.columns(), &document, self.strict)?;

        log::debug!("Updating {}/{value}", self.grid.name());
        self.grid.rows_mut()[pos] = document;
        Ok(())
    }

    /// Update when the primary key exists, add otherwise
    pub fn upsert(&mut self, document: Document) -> Result<Document> {
        let key = self.primary_key()?;
        let exists =
            key_of(&key, &document).is_some_and(|v| !self.positions_of(&key, v).is_empty());
        if exists {
            self.update(document.clone())?;
            Ok(document)
        } else {
            self.add(document)
        }
    }

    /// Load the row with `partial`'s primary key, overlay the items `partial` carries,
    /// store the result and return it.
    pub fn load_apply_update(&mut self, partial: Document) -> Result<Document> {
        let key = self.primary_key()?;
        let value = Self::required_key(&key, &partial)?;

        let mut criteria = Criteria::new(format!("load:{}", key.name())).case_sensitive(true);
        criteria.add_item(
            Operator::Equal,
            Item::with_value(key.name(), key.data_type(), value.clone()),
        );
        let found = self.fetch_criteria_page(&criteria, 0, usize::MAX)?;

        let mut merged = match found.rows() {
            [row] => row.clone(),
            [] => {
                return Err(GridError::NotFound {
                    grid: self.grid.name().to_string(),
                    key: value,
                })
            }
            many => {
                return Err(GridError::AmbiguousKey {
                    grid: self.grid.name().to_string(),
                    key: value,
                    count: many.len(),
                })
            }
        };

        for item in partial.items() {
            merged.add(item.clone());
        }
        self.update(merged.clone())?;
        Ok(merged)
    }

    /// Remove the row with the document's primary key, returning it
    pub fn delete(&mut self, document: &Document) -> Result<Document> {
        let key = self.primary_key()?;
        let value = Self::required_key(&key, document)?;
        let pos = self.position_of(&key, &value)?;

        log::debug!("Deleting {}/{value}", self.grid.name());
        Ok(self.grid.rows_mut().remove(pos))
    }

    // ── Analysis ────────────────────────────────────────────────────

    /// Statistics for one column from a full scan (no median)
    pub fn column_statistics(&self, name: &str) -> Result<ColumnStatistics> {
        let column = self
            .grid
            .columns()
            .item(name)
            .ok_or_else(|| GridError::UnknownField(name.to_string()))?;
        Ok(analyze::scan_column(&self.grid, column, 0))
    }

    /// One row of statistics per column, with up to `sample_count` distinct values each.
    ///
    /// The median of a numeric column is the last row of the ascending sort cut to
    /// `ceil(rows / 2)`: exact for odd row counts, the lower middle value for even ones.
    pub fn analyze(&self, sample_count: usize) -> Result<Grid> {
        let row_count = self.grid.row_count();
        if row_count < 2 {
            return Err(GridError::InsufficientData(format!(
                "Grid '{}' needs at least two rows to analyze, has {row_count}",
                self.grid.name()
            )));
        }

        let columns = analyze::analysis_columns();
        let mut result = Grid::new(format!("{}_analysis", self.grid.name()), columns.clone());
        for column in self.grid.columns().items() {
            let mut stats = analyze::scan_column(&self.grid, column, sample_count);
            if column.data_type().is_numeric() {
                stats.median = self.median(column.name())?;
            }
            result.add_row(stats.to_row(&columns));
        }

        result.set_feature(FEATURE_ROW_COUNT, row_count);
        result.set_feature(FEATURE_COL_COUNT, self.grid.columns().len());
        Ok(result)
    }

    /// Blank cells count toward the row total and sort first, so a column that is
    /// at least half blank reports a blank median.
    fn median(&self, field: &str) -> Result<Option<String>> {
        let mut criteria = Criteria::new(format!("median:{field}"));
        criteria.add_sort(field, SortOrder::Ascending);
        let half = self.grid.row_count().div_ceil(2);
        let lower = self.fetch_criteria_page(&criteria, 0, half)?;
        Ok(lower
            .rows()
            .last()
            .and_then(|row| row.value(field))
            .map(String::from))
    }
}

/// Non-blank primary key value of a document
fn key_of<'d>(key: &Item, document: &'d Document) -> Option<&'d str> {
    document.value(key.name()).filter(|v| !v.trim().is_empty())
}
