pub mod criteria;
pub mod document;
pub mod error;
pub mod grid;
pub mod item;
pub mod query;
pub mod schema;
pub mod store;
pub mod validation;

pub use criteria::{Criteria, Criterion, Operator, SortOrder};
pub use document::Document;
pub use error::{GridError, Result};
pub use grid::{Grid, Pagination};
pub use item::{DataType, Feature, Item, Scalar};
pub use query::{Pipeline, QueryDefaults, QueryEngine, Skipped, Stage};
pub use schema::{parse_schema_str, SchemaDefinition};
pub use store::{ColumnStatistics, GridStore};
