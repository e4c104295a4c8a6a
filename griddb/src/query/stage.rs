use crate::criteria::Operator;
use crate::document::Document;
use crate::item::DataType;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

pub type Predicate = Box<dyn Fn(&Document) -> bool + Send + Sync>;
pub type Comparator = Box<dyn Fn(&Document, &Document) -> Ordering + Send + Sync>;

/// One executable step of a compiled query
pub enum Stage {
    Filter(Predicate),
    /// Stable sort, so earlier orderings survive as tie-breakers
    Sort(Comparator),
}

impl Stage {
    pub fn filter(predicate: impl Fn(&Document) -> bool + Send + Sync + 'static) -> Self {
        Stage::Filter(Box::new(predicate))
    }

    pub fn sort(
        comparator: impl Fn(&Document, &Document) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        Stage::Sort(Box::new(comparator))
    }

    pub fn apply<'a>(&self, mut rows: Vec<&'a Document>) -> Vec<&'a Document> {
        match self {
            Stage::Filter(predicate) => {
                rows.retain(|row| predicate(*row));
                rows
            }
            Stage::Sort(comparator) => {
                rows.sort_by(|a, b| comparator(*a, *b));
                rows
            }
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Filter(_) => f.write_str("Filter"),
            Stage::Sort(_) => f.write_str("Sort"),
        }
    }
}

/// Why a criterion entry contributed no stage
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Skipped {
    #[error("operator {operator} is not supported for {data_type} field '{field}'")]
    UnsupportedOperator {
        field: String,
        operator: Operator,
        data_type: DataType,
    },

    #[error("value '{value}' for field '{field}' is not a valid {data_type}")]
    MalformedValue {
        field: String,
        value: String,
        data_type: DataType,
    },

    #[error("{operator} on field '{field}' needs exactly two values")]
    RangeNotMultiValued { field: String, operator: Operator },

    #[error("{operator} on field '{field}' has no value")]
    MissingValue { field: String, operator: Operator },

    #[error("unknown sort order '{value}' for field '{field}'")]
    InvalidSortOrder { field: String, value: String },

    #[error("invalid pattern for field '{field}': {reason}")]
    InvalidPattern { field: String, reason: String },
}

/// The ordered stages compiled from one criteria, plus the entries that were dropped.
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
    skipped: Vec<Skipped>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub(crate) fn push(&mut self, stage: Result<Stage, Skipped>) {
        match stage {
            Ok(stage) => self.stages.push(stage),
            Err(reason) => {
                log::debug!("Criterion skipped: {reason}");
                self.skipped.push(reason);
            }
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Fold the stages over `rows` in declaration order. Each stage receives the
    /// output of the one before it, so the last sort decides the final order.
    pub fn run<'a>(&self, rows: Vec<&'a Document>) -> Vec<&'a Document> {
        self.stages.iter().fold(rows, |rows, stage| stage.apply(rows))
    }
}
