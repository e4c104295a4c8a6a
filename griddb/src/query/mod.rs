mod builders;
pub mod stage;

use crate::criteria::{Criteria, Criterion};
use crate::document::Document;
use crate::error::{GridError, Result};
use crate::grid::{Grid, Pagination};
use crate::item::DataType;
use serde::{Deserialize, Serialize};

pub use stage::{Pipeline, Skipped, Stage};

pub const DEFAULT_OFFSET: usize = 0;
pub const DEFAULT_LIMIT: usize = 100;

/// Offset and limit applied when a criteria carries none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefaults {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for QueryDefaults {
    fn default() -> Self {
        QueryDefaults {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl QueryDefaults {
    /// Offset and limit from the criteria's features, falling back to these defaults
    pub fn page_for(&self, criteria: &Criteria) -> (usize, usize) {
        (
            criteria.offset().unwrap_or(self.offset),
            criteria.limit().unwrap_or(self.limit),
        )
    }
}

struct Prepared {
    pipeline: Pipeline,
    offset: usize,
    limit: usize,
}

/// Compiles criteria into a pipeline of typed stages and runs it against a grid.
///
/// Field types come from the schema the engine was created with; a criterion
/// item's own type is only used for fields the schema does not declare.
pub struct QueryEngine<'a> {
    columns: &'a Document,
    prepared: Option<Prepared>,
}

impl<'a> QueryEngine<'a> {
    pub fn new(columns: &'a Document) -> Self {
        QueryEngine {
            columns,
            prepared: None,
        }
    }

    /// The type a criterion is compiled for: schema first, then the item's own
    pub fn resolve_type(&self, criterion: &Criterion) -> DataType {
        match self.columns.data_type(criterion.field()) {
            Some(declared) => {
                if declared != criterion.item.data_type() {
                    log::debug!(
                        "Field '{}' compiled as {declared} (criterion item says {})",
                        criterion.field(),
                        criterion.item.data_type()
                    );
                }
                declared
            }
            None => criterion.item.data_type(),
        }
    }

    /// Compile `criteria` for a page of `limit` rows starting at `offset`.
    /// Entries that cannot be compiled are dropped and recorded on the pipeline.
    pub fn prepare(
        &mut self,
        criteria: &Criteria,
        offset: usize,
        limit: usize,
    ) -> Result<&Pipeline> {
        if criteria.is_empty() {
            return Err(GridError::InvalidCriteria(format!(
                "Criteria '{}' has no entries",
                criteria.name
            )));
        }

        let mut pipeline = Pipeline::new();
        for criterion in criteria.entries() {
            let data_type = self.resolve_type(criterion);
            pipeline.push(builders::build_stage(
                data_type,
                criterion,
                criteria.case_sensitive,
            ));
        }

        log::debug!(
            "Prepared criteria '{}': {} stage(s), {} skipped, offset {offset}, limit {limit}",
            criteria.name,
            pipeline.len(),
            pipeline.skipped_count()
        );

        Ok(self.install(pipeline, offset, limit))
    }

    /// Prepare a pipeline that keeps every row, for plain pagination
    pub fn prepare_unfiltered(&mut self, offset: usize, limit: usize) -> &Pipeline {
        self.install(Pipeline::new(), offset, limit)
    }

    fn install(&mut self, pipeline: Pipeline, offset: usize, limit: usize) -> &Pipeline {
        &self
            .prepared
            .insert(Prepared {
                pipeline,
                offset,
                limit,
            })
            .pipeline
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.prepared.as_ref().map(|p| &p.pipeline)
    }

    /// Every row the prepared pipeline keeps, filtered and sorted, before pagination
    pub fn matches<'g>(&self, grid: &'g Grid) -> Result<Vec<&'g Document>> {
        let prepared = self.prepared.as_ref().ok_or(GridError::NotPrepared)?;
        Ok(prepared.pipeline.run(grid.rows().iter().collect()))
    }

    /// Run the prepared pipeline and cut the requested page.
    ///
    /// The full result is materialised before offset and limit are applied so that
    /// `total_documents` counts every match, not just the returned page.
    pub fn execute(&self, grid: &Grid) -> Result<Grid> {
        let prepared = self.prepared.as_ref().ok_or(GridError::NotPrepared)?;
        let matched = prepared.pipeline.run(grid.rows().iter().collect());
        Ok(page_of(grid, matched, prepared.offset, prepared.limit))
    }
}

/// A new grid holding `offset..offset + limit` of `matched`, with pagination features
pub(crate) fn page_of(source: &Grid, matched: Vec<&Document>, offset: usize, limit: usize) -> Grid {
    let total = matched.len();
    let mut result = source.empty_like();
    for row in matched.into_iter().skip(offset).take(limit) {
        result.add_row(row.clone());
    }
    result.set_pagination(Pagination::compute(total, offset, limit));

    log::debug!(
        "Grid '{}': {total} match(es), returning {} from offset {offset}",
        source.name(),
        result.row_count()
    );
    result
}
