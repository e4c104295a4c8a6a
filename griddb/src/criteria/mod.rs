use crate::error::GridError;
use crate::item::{DataType, Item};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const FEATURE_OFFSET: &str = "offset";
pub const FEATURE_LIMIT: &str = "limit";

/// Comparison operator of a criterion entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
    Between,
    BetweenInclusive,
    In,
    Empty,
    NotEmpty,
    Sort,
    EqualField,
    NotEqualField,
    GreaterThanField,
    GreaterThanEqualField,
    LessThanField,
    LessThanEqualField,
    ContainsField,
    StartsWithField,
    EndsWithField,
}

/// Every operator, in declaration order
pub const ALL_OPERATORS: [Operator; 25] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::GreaterThan,
    Operator::GreaterThanEqual,
    Operator::LessThan,
    Operator::LessThanEqual,
    Operator::Contains,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Regex,
    Operator::Between,
    Operator::BetweenInclusive,
    Operator::In,
    Operator::Empty,
    Operator::NotEmpty,
    Operator::Sort,
    Operator::EqualField,
    Operator::NotEqualField,
    Operator::GreaterThanField,
    Operator::GreaterThanEqualField,
    Operator::LessThanField,
    Operator::LessThanEqualField,
    Operator::ContainsField,
    Operator::StartsWithField,
    Operator::EndsWithField,
];

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "EQUAL",
            Operator::NotEqual => "NOT_EQUAL",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanEqual => "GREATER_THAN_EQUAL",
            Operator::LessThan => "LESS_THAN",
            Operator::LessThanEqual => "LESS_THAN_EQUAL",
            Operator::Contains => "CONTAINS",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::Regex => "REGEX",
            Operator::Between => "BETWEEN",
            Operator::BetweenInclusive => "BETWEEN_INCLUSIVE",
            Operator::In => "IN",
            Operator::Empty => "EMPTY",
            Operator::NotEmpty => "NOT_EMPTY",
            Operator::Sort => "SORT",
            Operator::EqualField => "EQUAL_FIELD",
            Operator::NotEqualField => "NOT_EQUAL_FIELD",
            Operator::GreaterThanField => "GREATER_THAN_FIELD",
            Operator::GreaterThanEqualField => "GREATER_THAN_EQUAL_FIELD",
            Operator::LessThanField => "LESS_THAN_FIELD",
            Operator::LessThanEqualField => "LESS_THAN_EQUAL_FIELD",
            Operator::ContainsField => "CONTAINS_FIELD",
            Operator::StartsWithField => "STARTS_WITH_FIELD",
            Operator::EndsWithField => "ENDS_WITH_FIELD",
        }
    }

    /// Whether the operator compares two fields of the same row
    pub fn is_field_comparison(&self) -> bool {
        matches!(
            self,
            Operator::EqualField
                | Operator::NotEqualField
                | Operator::GreaterThanField
                | Operator::GreaterThanEqualField
                | Operator::LessThanField
                | Operator::LessThanEqualField
                | Operator::ContainsField
                | Operator::StartsWithField
                | Operator::EndsWithField
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        ALL_OPERATORS
            .iter()
            .find(|op| op.as_str() == wanted)
            .copied()
            .ok_or_else(|| GridError::InvalidCriteria(format!("Unknown operator '{s}'")))
    }
}

/// Direction of a SORT entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASCENDING",
            SortOrder::Descending => "DESCENDING",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASCENDING" | "ASC" => Ok(SortOrder::Ascending),
            "DESCENDING" | "DESC" => Ok(SortOrder::Descending),
            other => Err(GridError::InvalidCriteria(format!(
                "Unknown sort order '{other}'"
            ))),
        }
    }
}

/// One clause of a criteria: an operator applied to the field named by `item`.
///
/// The item's values are the operator's comparison values; for `_FIELD`
/// operators the value names the other field, and for `SORT` it holds the
/// sort direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub operator: Operator,
    pub item: Item,
}

impl Criterion {
    pub fn new(operator: Operator, item: Item) -> Self {
        Criterion { operator, item }
    }

    pub fn field(&self) -> &str {
        self.item.name()
    }
}

/// A conjunctive query: every entry must hold for a row to match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub name: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    entries: Vec<Criterion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    features: BTreeMap<String, String>,
}

impl Criteria {
    pub fn new(name: impl Into<String>) -> Self {
        Criteria {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn entries(&self) -> &[Criterion] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a prebuilt item; its declared type is only used when the schema lacks the field
    pub fn add_item(&mut self, operator: Operator, item: Item) -> &mut Self {
        self.entries.push(Criterion::new(operator, item));
        self
    }

    /// Field compared against one literal value
    pub fn add(&mut self, field: &str, operator: Operator, value: impl Into<String>) -> &mut Self {
        self.add_item(operator, Item::with_value(field, DataType::Text, value))
    }

    /// Field compared against several values (IN, BETWEEN)
    pub fn add_values<I, S>(&mut self, field: &str, operator: Operator, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_item(operator, Item::with_values(field, DataType::Text, values))
    }

    /// Field compared against another field of the same row
    pub fn add_field(&mut self, field: &str, operator: Operator, other_field: &str) -> &mut Self {
        self.add(field, operator, other_field)
    }

    pub fn add_between(
        &mut self,
        field: &str,
        low: impl Into<String>,
        high: impl Into<String>,
        inclusive: bool,
    ) -> &mut Self {
        let operator = if inclusive {
            Operator::BetweenInclusive
        } else {
            Operator::Between
        };
        self.add_values(field, operator, [low.into(), high.into()])
    }

    pub fn add_sort(&mut self, field: &str, order: SortOrder) -> &mut Self {
        self.add(field, Operator::Sort, order.as_str())
    }

    pub fn features(&self) -> &BTreeMap<String, String> {
        &self.features
    }

    pub fn set_feature(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.features.insert(key.into(), value.to_string());
        self
    }

    pub fn feature(&self, key: &str) -> Option<&str> {
        self.features.get(key).map(String::as_str)
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.set_feature(FEATURE_OFFSET, offset);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.set_feature(FEATURE_LIMIT, limit);
        self
    }

    pub fn offset(&self) -> Option<usize> {
        self.feature(FEATURE_OFFSET).and_then(|v| v.trim().parse().ok())
    }

    pub fn limit(&self) -> Option<usize> {
        self.feature(FEATURE_LIMIT).and_then(|v| v.trim().parse().ok())
    }
}
