use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FEATURE_NEXT_OFFSET: &str = "next_offset";
pub const FEATURE_CUR_LIMIT: &str = "cur_limit";
pub const FEATURE_CUR_OFFSET: &str = "cur_offset";
pub const FEATURE_TOTAL_DOCUMENTS: &str = "total_documents";
pub const FEATURE_ROW_COUNT: &str = "row_count";
pub const FEATURE_COL_COUNT: &str = "col_count";

/// An in-memory table: a schema document plus an ordered sequence of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    name: String,
    columns: Document,
    #[serde(default)]
    rows: Vec<Document>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    features: BTreeMap<String, String>,
}

/// Pagination metadata a query result carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub cur_offset: usize,
    pub cur_limit: usize,
    pub next_offset: usize,
    pub total_documents: usize,
}

impl Pagination {
    /// Pagination for a page cut from `total` matches.
    /// `next_offset` is `min(total - 1, offset + limit)`, or 0 without matches.
    pub fn compute(total: usize, offset: usize, limit: usize) -> Self {
        let next_offset = if total == 0 {
            0
        } else {
            (total - 1).min(offset.saturating_add(limit))
        };
        Pagination {
            cur_offset: offset,
            cur_limit: limit,
            next_offset,
            total_documents: total,
        }
    }
}

impl Grid {
    pub fn new(name: impl Into<String>, columns: Document) -> Self {
        Grid {
            name: name.into(),
            columns,
            rows: Vec::new(),
            features: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &Document {
        &self.columns
    }

    pub fn rows(&self) -> &[Document] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Document> {
        &mut self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Append a row without validation
    pub fn add_row(&mut self, row: Document) {
        self.rows.push(row);
    }

    /// All values of one column in row order (rows missing the field are skipped)
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.rows.iter().filter_map(move |row| row.value(name))
    }

    pub fn features(&self) -> &BTreeMap<String, String> {
        &self.features
    }

    pub fn set_feature(&mut self, key: impl Into<String>, value: impl ToString) {
        self.features.insert(key.into(), value.to_string());
    }

    pub fn feature(&self, key: &str) -> Option<&str> {
        self.features.get(key).map(String::as_str)
    }

    pub fn feature_usize(&self, key: &str) -> Option<usize> {
        self.feature(key).and_then(|v| v.parse().ok())
    }

    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.set_feature(FEATURE_NEXT_OFFSET, pagination.next_offset);
        self.set_feature(FEATURE_CUR_LIMIT, pagination.cur_limit);
        self.set_feature(FEATURE_CUR_OFFSET, pagination.cur_offset);
        self.set_feature(FEATURE_TOTAL_DOCUMENTS, pagination.total_documents);
    }

    /// Pagination features, present only on query results
    pub fn pagination(&self) -> Option<Pagination> {
        Some(Pagination {
            cur_offset: self.feature_usize(FEATURE_CUR_OFFSET)?,
            cur_limit: self.feature_usize(FEATURE_CUR_LIMIT)?,
            next_offset: self.feature_usize(FEATURE_NEXT_OFFSET)?,
            total_documents: self.feature_usize(FEATURE_TOTAL_DOCUMENTS)?,
        })
    }

    /// An empty grid sharing this grid's name and schema
    pub fn empty_like(&self) -> Grid {
        Grid::new(self.name.clone(), self.columns.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{DataType, Item};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pagination_formula() {
        assert_eq!(
            Pagination::compute(25, 10, 10),
            Pagination {
                cur_offset: 10,
                cur_limit: 10,
                next_offset: 20,
                total_documents: 25
            }
        );
        assert_eq!(Pagination::compute(25, 20, 10).next_offset, 24);
        assert_eq!(Pagination::compute(0, 0, 10).next_offset, 0);
        assert_eq!(Pagination::compute(3, 0, usize::MAX).next_offset, 2);
    }

    #[test]
    fn test_pagination_round_trips_through_features() {
        let mut grid = Grid::new("g", Document::new("cols"));
        assert!(grid.pagination().is_none());

        let page = Pagination::compute(5, 2, 2);
        grid.set_pagination(page);
        assert_eq!(grid.pagination(), Some(page));
        assert_eq!(grid.feature(FEATURE_TOTAL_DOCUMENTS), Some("5"));
    }

    #[test]
    fn test_column_values() {
        let columns = Document::new("cols").with(Item::new("n", DataType::Integer));
        let mut grid = Grid::new("g", columns);
        for v in ["1", "2"] {
            grid.add_row(Document::new("row").with(Item::with_value("n", DataType::Integer, v)));
        }
        grid.add_row(Document::new("row"));
        let values: Vec<&str> = grid.column_values("n").collect();
        assert_eq!(values, vec!["1", "2"]);
        assert_eq!(grid.row_count(), 3);
    }
}
