// Typed, named values and their feature tags

pub mod scalar;

use crate::error::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use scalar::Scalar;

/// Declared value type of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    Date,
    #[serde(alias = "datetime")]
    DateTime,
    Text,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Integer | DataType::Long | DataType::Float | DataType::Double
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Long => "long",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Date => "date",
            DataType::DateTime => "date_time",
            DataType::Text => "text",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "").as_str() {
            "boolean" | "bool" => Ok(DataType::Boolean),
            "integer" | "int" => Ok(DataType::Integer),
            "long" => Ok(DataType::Long),
            "float" => Ok(DataType::Float),
            "double" => Ok(DataType::Double),
            "date" => Ok(DataType::Date),
            "datetime" => Ok(DataType::DateTime),
            "text" | "string" => Ok(DataType::Text),
            other => Err(GridError::Schema(format!("Unknown data type '{other}'"))),
        }
    }
}

/// Flags attached to an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    IsPrimary,
    IsRequired,
    IsSearchable,
    IsSuggest,
    IsSecret,
    IsHidden,
    #[serde(untagged)]
    Custom(String),
}

impl Feature {
    pub fn as_str(&self) -> &str {
        match self {
            Feature::IsPrimary => "is_primary",
            Feature::IsRequired => "is_required",
            Feature::IsSearchable => "is_searchable",
            Feature::IsSuggest => "is_suggest",
            Feature::IsSecret => "is_secret",
            Feature::IsHidden => "is_hidden",
            Feature::Custom(name) => name,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named, typed value or multi-value.
///
/// Values are kept in their textual form; the query engine interprets them
/// according to the type it resolves for the field, so a criterion item carrying
/// untyped text still compares correctly against a typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    features: Vec<Feature>,
}

impl Item {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Item {
            name: name.into(),
            data_type,
            values: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn with_value(
        name: impl Into<String>,
        data_type: DataType,
        value: impl Into<String>,
    ) -> Self {
        let mut item = Item::new(name, data_type);
        item.values.push(value.into());
        item
    }

    pub fn with_values<I, S>(name: impl Into<String>, data_type: DataType, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut item = Item::new(name, data_type);
        item.values = values.into_iter().map(Into::into).collect();
        item
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Change the declared type. Only format-coercion callers should need this.
    pub fn retype(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    /// First value, if any
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_multi_value(&self) -> bool {
        self.values.len() > 1
    }

    /// True when the item holds no non-blank value
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }

    /// Replace all values with a single value
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.values.clear();
        self.values.push(value.into());
    }

    pub fn add_value(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    pub fn set_values<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
    }

    /// First value parsed as `T`
    pub fn value_as<T: Scalar>(&self) -> Option<T> {
        self.value().and_then(T::parse)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn enable_feature(&mut self, feature: Feature) {
        if !self.features.contains(&feature) {
            self.features.push(feature);
        }
    }

    pub fn disable_feature(&mut self, feature: &Feature) {
        self.features.retain(|f| f != feature);
    }

    pub fn is_feature_enabled(&self, feature: &Feature) -> bool {
        self.features.contains(feature)
    }

    /// Builder form of `enable_feature`
    pub fn feature(mut self, feature: Feature) -> Self {
        self.enable_feature(feature);
        self
    }

    /// Same name, type and features, no values
    pub fn without_values(&self) -> Self {
        Item {
            name: self.name.clone(),
            data_type: self.data_type,
            values: Vec::new(),
            features: self.features.clone(),
        }
    }
}
