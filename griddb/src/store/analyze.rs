// Per-column statistics used by analyze() and primary key assignment

use crate::document::Document;
use crate::grid::Grid;
use crate::item::{scalar, DataType, Feature, Item, Scalar};
use chrono::{NaiveDate, NaiveDateTime};

/// Summary of one column from a full grid scan
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
    pub name: String,
    pub data_type: DataType,
    /// Rows holding a non-blank value
    pub count: usize,
    pub min: Option<String>,
    pub max: Option<String>,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1)
    pub stddev: Option<f64>,
    pub median: Option<String>,
    pub samples: Vec<String>,
}

impl ColumnStatistics {
    pub fn max_number(&self) -> Option<f64> {
        self.max
            .as_deref()
            .and_then(|m| scalar::parse_number(self.data_type, m))
    }

    pub(crate) fn to_row(&self, columns: &Document) -> Document {
        let mut row = columns.new_row();
        let fields = [
            ("name", Some(self.name.clone())),
            ("type", Some(self.data_type.to_string())),
            ("count", Some(self.count.to_string())),
            ("min", self.min.clone()),
            ("max", self.max.clone()),
            ("mean", self.mean.map(|v| v.to_string())),
            ("stddev", self.stddev.map(|v| v.to_string())),
            ("median", self.median.clone()),
        ];
        for (name, value) in fields {
            if let (Some(item), Some(value)) = (row.item_mut(name), value) {
                item.set_value(value);
            }
        }
        if let Some(item) = row.item_mut("samples") {
            item.set_values(self.samples.iter().cloned());
        }
        row
    }
}

/// Schema of the grid `analyze()` returns
pub(crate) fn analysis_columns() -> Document {
    Document::new("analysis")
        .with(Item::new("name", DataType::Text).feature(Feature::IsPrimary))
        .with(Item::new("type", DataType::Text))
        .with(Item::new("count", DataType::Long))
        .with(Item::new("min", DataType::Text))
        .with(Item::new("max", DataType::Text))
        .with(Item::new("mean", DataType::Double))
        .with(Item::new("stddev", DataType::Double))
        .with(Item::new("median", DataType::Text))
        .with(Item::new("samples", DataType::Text))
}

pub(crate) fn scan_column(grid: &Grid, column: &Item, sample_count: usize) -> ColumnStatistics {
    let data_type = column.data_type();
    let values: Vec<&str> = grid
        .column_values(column.name())
        .filter(|v| !v.trim().is_empty())
        .collect();

    let (min, max) = match data_type {
        DataType::Boolean => extremes::<bool>(&values),
        DataType::Integer => extremes::<i32>(&values),
        DataType::Long => extremes::<i64>(&values),
        DataType::Float => extremes::<f32>(&values),
        DataType::Double => extremes::<f64>(&values),
        DataType::Date => extremes::<NaiveDate>(&values),
        DataType::DateTime => extremes::<NaiveDateTime>(&values),
        DataType::Text => (
            values.iter().min().map(|v| v.to_string()),
            values.iter().max().map(|v| v.to_string()),
        ),
    };

    let numbers: Vec<f64> = values
        .iter()
        .filter_map(|v| scalar::parse_number(data_type, v))
        .collect();
    let (mean, stddev) = moments(&numbers);

    let mut samples = Vec::new();
    if !column.is_feature_enabled(&Feature::IsSecret) {
        for value in values.iter().copied() {
            if samples.len() >= sample_count {
                break;
            }
            if !samples.iter().any(|s: &String| s == value) {
                samples.push(value.to_string());
            }
        }
    }

    ColumnStatistics {
        name: column.name().to_string(),
        data_type,
        count: values.len(),
        min,
        max,
        mean,
        stddev,
        median: None,
        samples,
    }
}

/// Text of the smallest and largest parseable values
fn extremes<T: Scalar>(values: &[&str]) -> (Option<String>, Option<String>) {
    let mut min: Option<(T, &str)> = None;
    let mut max: Option<(T, &str)> = None;

    for raw in values.iter().copied() {
        let Some(value) = T::parse(raw) else {
            continue;
        };
        if min.as_ref().map_or(true, |(m, _)| value.compare(m).is_lt()) {
            min = Some((value.clone(), raw));
        }
        if max.as_ref().map_or(true, |(m, _)| value.compare(m).is_gt()) {
            max = Some((value, raw));
        }
    }

    (
        min.map(|(_, raw)| raw.to_string()),
        max.map(|(_, raw)| raw.to_string()),
    )
}

fn moments(numbers: &[f64]) -> (Option<f64>, Option<f64>) {
    if numbers.is_empty() {
        return (None, None);
    }
    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;
    if numbers.len() < 2 {
        return (Some(mean), None);
    }
    let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (Some(mean), Some(variance.sqrt()))
}
