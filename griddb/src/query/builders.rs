// Stage builders, one per resolved field type

use super::stage::{Skipped, Stage};
use crate::criteria::{Criterion, Operator, SortOrder};
use crate::document::Document;
use crate::item::{DataType, Item, Scalar};
use chrono::{NaiveDate, NaiveDateTime};
use regex::RegexBuilder;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Relation a comparison must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Cmp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Cmp::Eq => ordering == Ordering::Equal,
            Cmp::Ne => ordering != Ordering::Equal,
            Cmp::Gt => ordering == Ordering::Greater,
            Cmp::Ge => ordering != Ordering::Less,
            Cmp::Lt => ordering == Ordering::Less,
            Cmp::Le => ordering != Ordering::Greater,
        }
    }
}

/// Relational operators shared by every ordered type. The flag marks the
/// field-vs-field form. STARTS_WITH means "at least" for non-text types.
fn comparison(operator: Operator) -> Option<(Cmp, bool)> {
    Some(match operator {
        Operator::Equal => (Cmp::Eq, false),
        Operator::NotEqual => (Cmp::Ne, false),
        Operator::GreaterThan => (Cmp::Gt, false),
        Operator::GreaterThanEqual | Operator::StartsWith => (Cmp::Ge, false),
        Operator::LessThan => (Cmp::Lt, false),
        Operator::LessThanEqual => (Cmp::Le, false),
        Operator::EqualField => (Cmp::Eq, true),
        Operator::NotEqualField => (Cmp::Ne, true),
        Operator::GreaterThanField => (Cmp::Gt, true),
        Operator::GreaterThanEqualField | Operator::StartsWithField => (Cmp::Ge, true),
        Operator::LessThanField => (Cmp::Lt, true),
        Operator::LessThanEqualField => (Cmp::Le, true),
        _ => return None,
    })
}

/// Compile one criterion entry for a field of the given resolved type
pub(crate) fn build_stage(
    data_type: DataType,
    criterion: &Criterion,
    case_sensitive: bool,
) -> Result<Stage, Skipped> {
    match data_type {
        DataType::Boolean => build_ordered::<bool>(criterion, data_type),
        DataType::Integer => build_ordered::<i32>(criterion, data_type),
        DataType::Long => build_ordered::<i64>(criterion, data_type),
        DataType::Float => build_ordered::<f32>(criterion, data_type),
        DataType::Double => build_ordered::<f64>(criterion, data_type),
        DataType::Date => build_ordered::<NaiveDate>(criterion, data_type),
        DataType::DateTime => build_ordered::<NaiveDateTime>(criterion, data_type),
        DataType::Text => build_text(criterion, case_sensitive),
    }
}

fn unsupported(criterion: &Criterion, data_type: DataType) -> Skipped {
    Skipped::UnsupportedOperator {
        field: criterion.field().to_string(),
        operator: criterion.operator,
        data_type,
    }
}

fn row_value<T: Scalar>(row: &Document, field: &str) -> Option<T> {
    row.value(field).and_then(T::parse)
}

fn is_empty_in(row: &Document, field: &str) -> bool {
    row.item(field).map_or(true, Item::is_empty)
}

fn parse_literal<T: Scalar>(
    criterion: &Criterion,
    raw: &str,
    data_type: DataType,
) -> Result<T, Skipped> {
    T::parse(raw).ok_or_else(|| Skipped::MalformedValue {
        field: criterion.field().to_string(),
        value: raw.to_string(),
        data_type,
    })
}

fn first_value(criterion: &Criterion) -> Result<&str, Skipped> {
    criterion.item.value().ok_or_else(|| Skipped::MissingValue {
        field: criterion.field().to_string(),
        operator: criterion.operator,
    })
}

/// The other field named by a `_FIELD` criterion
fn other_field(criterion: &Criterion) -> Result<String, Skipped> {
    let name = first_value(criterion)?.trim();
    if name.is_empty() {
        return Err(Skipped::MissingValue {
            field: criterion.field().to_string(),
            operator: criterion.operator,
        });
    }
    Ok(name.to_string())
}

/// Exactly two values, otherwise the range contributes nothing
fn range_bounds(criterion: &Criterion) -> Result<(&str, &str), Skipped> {
    match criterion.item.values() {
        [low, high] => Ok((low.as_str(), high.as_str())),
        _ => Err(Skipped::RangeNotMultiValued {
            field: criterion.field().to_string(),
            operator: criterion.operator,
        }),
    }
}

fn sort_order(criterion: &Criterion) -> Result<SortOrder, Skipped> {
    match criterion.item.value().map(str::trim) {
        None | Some("") => Ok(SortOrder::Ascending),
        Some(raw) => raw.parse().map_err(|_| Skipped::InvalidSortOrder {
            field: criterion.field().to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Missing values order before present ones
fn compare_present<T: Scalar>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

fn empty_stage(criterion: &Criterion) -> Stage {
    let field = criterion.field().to_string();
    Stage::filter(move |row| is_empty_in(row, &field))
}

/// Numeric, date and boolean fields: everything is a comparison of parsed values.
/// Booleans order `false` before `true`.
fn build_ordered<T: Scalar>(criterion: &Criterion, data_type: DataType) -> Result<Stage, Skipped> {
    let field = criterion.field().to_string();

    if let Some((cmp, against_field)) = comparison(criterion.operator) {
        if against_field {
            let other = other_field(criterion)?;
            return Ok(Stage::filter(move |row| {
                match (row_value::<T>(row, &field), row_value::<T>(row, &other)) {
                    (Some(a), Some(b)) => cmp.holds(a.compare(&b)),
                    _ => false,
                }
            }));
        }
        let literal: T = parse_literal(criterion, first_value(criterion)?, data_type)?;
        return Ok(Stage::filter(move |row| {
            row_value::<T>(row, &field).is_some_and(|v| cmp.holds(v.compare(&literal)))
        }));
    }

    match criterion.operator {
        Operator::Between | Operator::BetweenInclusive => {
            let (low, high) = range_bounds(criterion)?;
            let low: T = parse_literal(criterion, low, data_type)?;
            let high: T = parse_literal(criterion, high, data_type)?;
            let (lower, upper) = if criterion.operator == Operator::BetweenInclusive {
                (Cmp::Ge, Cmp::Le)
            } else {
                (Cmp::Gt, Cmp::Lt)
            };
            Ok(Stage::filter(move |row| {
                row_value::<T>(row, &field).is_some_and(|v| {
                    lower.holds(v.compare(&low)) && upper.holds(v.compare(&high))
                })
            }))
        }
        Operator::In => {
            if criterion.item.values().is_empty() {
                return Err(Skipped::MissingValue {
                    field,
                    operator: criterion.operator,
                });
            }
            let members = criterion
                .item
                .values()
                .iter()
                .map(|raw| parse_literal::<T>(criterion, raw, data_type))
                .collect::<Result<Vec<T>, Skipped>>()?;
            Ok(Stage::filter(move |row| {
                row_value::<T>(row, &field).is_some_and(|v| members.iter().any(|m| v.equals(m)))
            }))
        }
        Operator::Empty => Ok(empty_stage(criterion)),
        Operator::Sort => {
            let order = sort_order(criterion)?;
            Ok(Stage::sort(move |a, b| {
                directed(
                    compare_present(row_value::<T>(a, &field), row_value::<T>(b, &field)),
                    order,
                )
            }))
        }
        _ => Err(unsupported(criterion, data_type)),
    }
}

fn fold(value: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.to_lowercase())
    }
}

fn text_value<'a>(row: &'a Document, field: &str, case_sensitive: bool) -> Option<Cow<'a, str>> {
    row.value(field).map(|v| fold(v, case_sensitive))
}

/// Substring tests shared by the literal and field forms
#[derive(Debug, Clone, Copy)]
enum TextMatch {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextMatch {
    fn of(operator: Operator) -> Option<(TextMatch, bool)> {
        Some(match operator {
            Operator::Contains => (TextMatch::Contains, false),
            Operator::StartsWith => (TextMatch::StartsWith, false),
            Operator::EndsWith => (TextMatch::EndsWith, false),
            Operator::ContainsField => (TextMatch::Contains, true),
            Operator::StartsWithField => (TextMatch::StartsWith, true),
            Operator::EndsWithField => (TextMatch::EndsWith, true),
            _ => return None,
        })
    }

    fn matches(self, value: &str, pattern: &str) -> bool {
        match self {
            TextMatch::Contains => value.contains(pattern),
            TextMatch::StartsWith => value.starts_with(pattern),
            TextMatch::EndsWith => value.ends_with(pattern),
        }
    }
}

/// Text fields. Case-insensitive mode lower-cases both sides before comparing.
fn build_text(criterion: &Criterion, case_sensitive: bool) -> Result<Stage, Skipped> {
    let field = criterion.field().to_string();
    let cs = case_sensitive;

    if let Some((test, against_field)) = TextMatch::of(criterion.operator) {
        if against_field {
            let other = other_field(criterion)?;
            return Ok(Stage::filter(move |row| {
                match (text_value(row, &field, cs), text_value(row, &other, cs)) {
                    (Some(a), Some(b)) => test.matches(&a, &b),
                    _ => false,
                }
            }));
        }
        let pattern = fold(first_value(criterion)?, cs).into_owned();
        return Ok(Stage::filter(move |row| {
            text_value(row, &field, cs).is_some_and(|v| test.matches(&v, &pattern))
        }));
    }

    if let Some((cmp, against_field)) = comparison(criterion.operator) {
        if against_field {
            let other = other_field(criterion)?;
            return Ok(Stage::filter(move |row| {
                match (text_value(row, &field, cs), text_value(row, &other, cs)) {
                    (Some(a), Some(b)) => cmp.holds(a.cmp(&b)),
                    _ => false,
                }
            }));
        }
        let literal = fold(first_value(criterion)?, cs).into_owned();
        return Ok(Stage::filter(move |row| {
            text_value(row, &field, cs).is_some_and(|v| cmp.holds((*v).cmp(literal.as_str())))
        }));
    }

    match criterion.operator {
        Operator::Regex => {
            let pattern = first_value(criterion)?;
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(!cs)
                .build()
                .map_err(|e| Skipped::InvalidPattern {
                    field: field.clone(),
                    reason: e.to_string(),
                })?;
            Ok(Stage::filter(move |row| {
                row.value(&field).is_some_and(|v| regex.is_match(v))
            }))
        }
        Operator::Between | Operator::BetweenInclusive => {
            let (low, high) = range_bounds(criterion)?;
            let low = fold(low, cs).into_owned();
            let high = fold(high, cs).into_owned();
            let inclusive = criterion.operator == Operator::BetweenInclusive;
            Ok(Stage::filter(move |row| {
                text_value(row, &field, cs).is_some_and(|v| {
                    let v: &str = &v;
                    if inclusive {
                        v >= low.as_str() && v <= high.as_str()
                    } else {
                        v > low.as_str() && v < high.as_str()
                    }
                })
            }))
        }
        Operator::In => {
            if criterion.item.values().is_empty() {
                return Err(Skipped::MissingValue {
                    field,
                    operator: criterion.operator,
                });
            }
            let members: Vec<String> = criterion
                .item
                .values()
                .iter()
                .map(|v| fold(v, cs).into_owned())
                .collect();
            Ok(Stage::filter(move |row| {
                text_value(row, &field, cs).is_some_and(|v| members.iter().any(|m| *m == *v))
            }))
        }
        Operator::Empty => Ok(empty_stage(criterion)),
        Operator::NotEmpty => Ok(Stage::filter(move |row| !is_empty_in(row, &field))),
        Operator::Sort => {
            let order = sort_order(criterion)?;
            Ok(Stage::sort(move |a, b| {
                let ordering = match (text_value(a, &field, cs), text_value(b, &field, cs)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                directed(ordering, order)
            }))
        }
        _ => Err(unsupported(criterion, DataType::Text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, DataType, &str)]) -> Document {
        let mut doc = Document::new("row");
        for (name, data_type, value) in pairs {
            doc.add(Item::with_value(*name, *data_type, *value));
        }
        doc
    }

    fn criterion(field: &str, operator: Operator, values: &[&str]) -> Criterion {
        Criterion::new(
            operator,
            Item::with_values(field, DataType::Text, values.iter().copied()),
        )
    }

    fn keeps(stage: &Stage, doc: &Document) -> bool {
        stage.apply(vec![doc]).len() == 1
    }

    #[test]
    fn test_cmp_relations() {
        assert!(Cmp::Ge.holds(Ordering::Equal));
        assert!(!Cmp::Gt.holds(Ordering::Equal));
        assert!(Cmp::Ne.holds(Ordering::Less));
        assert!(Cmp::Le.holds(Ordering::Less));
    }

    #[test]
    fn test_numeric_starts_with_is_at_least() {
        let stage = build_stage(
            DataType::Integer,
            &criterion("n", Operator::StartsWith, &["5"]),
            true,
        )
        .unwrap();
        assert!(keeps(&stage, &row(&[("n", DataType::Integer, "5")])));
        assert!(keeps(&stage, &row(&[("n", DataType::Integer, "50")])));
        assert!(!keeps(&stage, &row(&[("n", DataType::Integer, "4")])));
    }

    #[test]
    fn test_numbers_compare_numerically_not_lexically() {
        let stage = build_stage(
            DataType::Long,
            &criterion("n", Operator::GreaterThan, &["9"]),
            true,
        )
        .unwrap();
        assert!(keeps(&stage, &row(&[("n", DataType::Long, "10")])));
    }

    #[test]
    fn test_malformed_literal_is_skipped() {
        let err = build_stage(
            DataType::Double,
            &criterion("price", Operator::Equal, &["cheap"]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Skipped::MalformedValue { .. }));
    }

    #[test]
    fn test_unparseable_row_value_never_matches() {
        let stage = build_stage(
            DataType::Integer,
            &criterion("n", Operator::NotEqual, &["1"]),
            true,
        )
        .unwrap();
        assert!(!keeps(&stage, &row(&[("n", DataType::Integer, "abc")])));
        assert!(!keeps(&stage, &Document::new("row")));
    }

    #[test]
    fn test_boolean_orders_false_before_true() {
        let off = row(&[("active", DataType::Boolean, "false")]);
        let on = row(&[("active", DataType::Boolean, "yes")]);

        let above = build_stage(
            DataType::Boolean,
            &criterion("active", Operator::GreaterThan, &["false"]),
            true,
        )
        .unwrap();
        assert!(keeps(&above, &on));
        assert!(!keeps(&above, &off));

        let only_false = build_stage(
            DataType::Boolean,
            &criterion("active", Operator::BetweenInclusive, &["false", "no"]),
            true,
        )
        .unwrap();
        assert!(keeps(&only_false, &off));
        assert!(!keeps(&only_false, &on));

        let equal = build_stage(
            DataType::Boolean,
            &criterion("active", Operator::Equal, &["1"]),
            true,
        )
        .unwrap();
        assert!(keeps(&equal, &on));
    }

    #[test]
    fn test_boolean_field_comparison() {
        let stage = build_stage(
            DataType::Boolean,
            &criterion("active", Operator::LessThanEqualField, &["verified"]),
            true,
        )
        .unwrap();
        let pending = row(&[
            ("active", DataType::Boolean, "true"),
            ("verified", DataType::Boolean, "false"),
        ]);
        let done = row(&[
            ("active", DataType::Boolean, "false"),
            ("verified", DataType::Boolean, "true"),
        ]);
        assert!(!keeps(&stage, &pending));
        assert!(keeps(&stage, &done));
    }

    #[test]
    fn test_boolean_rejects_text_operators() {
        let err = build_stage(
            DataType::Boolean,
            &criterion("active", Operator::Contains, &["t"]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Skipped::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_float_builder() {
        let stage = build_stage(
            DataType::Float,
            &criterion("ratio", Operator::Between, &["0.5", "1.5"]),
            true,
        )
        .unwrap();
        assert!(keeps(&stage, &row(&[("ratio", DataType::Float, "1.25")])));
        assert!(!keeps(&stage, &row(&[("ratio", DataType::Float, "1.5")])));
        assert!(!keeps(&stage, &row(&[("ratio", DataType::Float, "2e0")])));

        let below = build_stage(
            DataType::Float,
            &criterion("ratio", Operator::LessThanEqual, &["-0.5"]),
            true,
        )
        .unwrap();
        assert!(keeps(&below, &row(&[("ratio", DataType::Float, "-3")])));
        assert!(!keeps(&below, &row(&[("ratio", DataType::Float, "0")])));
    }

    #[test]
    fn test_datetime_builder() {
        let stage = build_stage(
            DataType::DateTime,
            &criterion("at", Operator::GreaterThan, &["2024-03-01T12:00:00"]),
            true,
        )
        .unwrap();
        assert!(keeps(&stage, &row(&[("at", DataType::DateTime, "2024-03-01 12:30:00")])));
        assert!(keeps(&stage, &row(&[("at", DataType::DateTime, "2024-03-02")])));
        // a bare date is midnight
        assert!(!keeps(&stage, &row(&[("at", DataType::DateTime, "2024-03-01")])));

        let sorted = build_stage(
            DataType::DateTime,
            &criterion("at", Operator::Sort, &["DESC"]),
            true,
        )
        .unwrap();
        let docs = vec![
            row(&[("at", DataType::DateTime, "2024-03-01T08:00:00")]),
            row(&[("at", DataType::DateTime, "2024-03-01T09:15:00")]),
        ];
        let order: Vec<&str> = sorted
            .apply(docs.iter().collect())
            .iter()
            .filter_map(|r| r.value("at"))
            .collect();
        assert_eq!(order, vec!["2024-03-01T09:15:00", "2024-03-01T08:00:00"]);
    }

    #[test]
    fn test_numeric_field_at_least() {
        let same = row(&[("a", DataType::Integer, "5"), ("b", DataType::Integer, "5")]);
        let lower = row(&[("a", DataType::Integer, "4"), ("b", DataType::Integer, "5")]);
        for operator in [Operator::StartsWithField, Operator::GreaterThanEqualField] {
            let stage =
                build_stage(DataType::Integer, &criterion("a", operator, &["b"]), true).unwrap();
            assert!(keeps(&stage, &same), "{operator}");
            assert!(!keeps(&stage, &lower), "{operator}");
        }
    }

    #[test]
    fn test_numeric_field_comparisons() {
        // "3" sorts after "10" as text but not as a number
        let doc = row(&[("a", DataType::Long, "3"), ("b", DataType::Long, "10")]);
        let less = build_stage(
            DataType::Long,
            &criterion("a", Operator::LessThanField, &["b"]),
            true,
        )
        .unwrap();
        assert!(keeps(&less, &doc));

        let not_equal = build_stage(
            DataType::Double,
            &criterion("x", Operator::NotEqualField, &["y"]),
            true,
        )
        .unwrap();
        let same = row(&[("x", DataType::Double, "2"), ("y", DataType::Double, "2.0")]);
        let differs = row(&[("x", DataType::Double, "2"), ("y", DataType::Double, "2.5")]);
        assert!(!keeps(&not_equal, &same));
        assert!(keeps(&not_equal, &differs));
    }

    #[test]
    fn test_date_range_inclusive() {
        let stage = build_stage(
            DataType::Date,
            &criterion("day", Operator::BetweenInclusive, &["2024-01-01", "2024-01-31"]),
            true,
        )
        .unwrap();
        assert!(keeps(&stage, &row(&[("day", DataType::Date, "2024-01-31")])));
        assert!(!keeps(&stage, &row(&[("day", DataType::Date, "2024-02-01")])));
    }

    #[test]
    fn test_between_single_value_is_skipped() {
        let err = build_stage(
            DataType::Integer,
            &criterion("n", Operator::Between, &["10"]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Skipped::RangeNotMultiValued { .. }));
    }

    #[test]
    fn test_in_membership() {
        let stage = build_stage(
            DataType::Integer,
            &criterion("n", Operator::In, &["1", "3"]),
            true,
        )
        .unwrap();
        assert!(keeps(&stage, &row(&[("n", DataType::Integer, "3")])));
        assert!(!keeps(&stage, &row(&[("n", DataType::Integer, "2")])));

        let err = build_stage(
            DataType::Integer,
            &criterion("n", Operator::In, &[]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Skipped::MissingValue { .. }));
    }

    #[test]
    fn test_empty_on_typed_field() {
        let stage = build_stage(
            DataType::Double,
            &criterion("x", Operator::Empty, &[]),
            true,
        )
        .unwrap();
        assert!(keeps(&stage, &row(&[("x", DataType::Double, "")])));
        assert!(keeps(&stage, &Document::new("row")));
        assert!(!keeps(&stage, &row(&[("x", DataType::Double, "1.5")])));
    }

    #[test]
    fn test_text_case_folding() {
        let c = criterion("name", Operator::Contains, &["ALI"]);
        let alice = row(&[("name", DataType::Text, "Alice")]);
        assert!(keeps(&build_stage(DataType::Text, &c, false).unwrap(), &alice));
        assert!(!keeps(&build_stage(DataType::Text, &c, true).unwrap(), &alice));
    }

    #[test]
    fn test_text_starts_and_ends_with() {
        let doc = row(&[("name", DataType::Text, "Alice")]);
        let starts = build_stage(
            DataType::Text,
            &criterion("name", Operator::StartsWith, &["Al"]),
            true,
        )
        .unwrap();
        let ends = build_stage(
            DataType::Text,
            &criterion("name", Operator::EndsWith, &["ce"]),
            true,
        )
        .unwrap();
        let not_ends = build_stage(
            DataType::Text,
            &criterion("name", Operator::EndsWith, &["Al"]),
            true,
        )
        .unwrap();
        assert!(keeps(&starts, &doc));
        assert!(keeps(&ends, &doc));
        assert!(!keeps(&not_ends, &doc));
    }

    #[test]
    fn test_text_regex() {
        let doc = row(&[("code", DataType::Text, "AB-123")]);
        let re = build_stage(
            DataType::Text,
            &criterion("code", Operator::Regex, &["^ab-\\d+$"]),
            false,
        )
        .unwrap();
        assert!(keeps(&re, &doc));

        let strict = build_stage(
            DataType::Text,
            &criterion("code", Operator::Regex, &["^ab-\\d+$"]),
            true,
        )
        .unwrap();
        assert!(!keeps(&strict, &doc));

        let err = build_stage(
            DataType::Text,
            &criterion("code", Operator::Regex, &["("]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Skipped::InvalidPattern { .. }));
    }

    #[test]
    fn test_text_not_empty() {
        let stage = build_stage(
            DataType::Text,
            &criterion("note", Operator::NotEmpty, &[]),
            true,
        )
        .unwrap();
        assert!(keeps(&stage, &row(&[("note", DataType::Text, "x")])));
        assert!(!keeps(&stage, &row(&[("note", DataType::Text, " ")])));
    }

    #[test]
    fn test_not_empty_unsupported_for_numbers() {
        let err = build_stage(
            DataType::Integer,
            &criterion("n", Operator::NotEmpty, &[]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Skipped::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_text_field_comparisons() {
        let doc = row(&[
            ("first", DataType::Text, "Anna"),
            ("nick", DataType::Text, "ann"),
        ]);
        let contains = build_stage(
            DataType::Text,
            &criterion("first", Operator::ContainsField, &["nick"]),
            false,
        )
        .unwrap();
        assert!(keeps(&contains, &doc));
        let sensitive = build_stage(
            DataType::Text,
            &criterion("first", Operator::StartsWithField, &["nick"]),
            true,
        )
        .unwrap();
        assert!(!keeps(&sensitive, &doc));
        let greater = build_stage(
            DataType::Text,
            &criterion("nick", Operator::GreaterThanField, &["first"]),
            true,
        )
        .unwrap();
        assert!(keeps(&greater, &doc));
    }

    #[test]
    fn test_sort_descending_with_missing_values() {
        let docs = vec![
            row(&[("n", DataType::Integer, "2")]),
            Document::new("row"),
            row(&[("n", DataType::Integer, "10")]),
        ];
        let asc = build_stage(
            DataType::Integer,
            &criterion("n", Operator::Sort, &[]),
            true,
        )
        .unwrap();
        let desc = build_stage(
            DataType::Integer,
            &criterion("n", Operator::Sort, &["desc"]),
            true,
        )
        .unwrap();

        let values = |rows: Vec<&Document>| -> Vec<Option<String>> {
            rows.iter().map(|r| r.value("n").map(String::from)).collect()
        };
        assert_eq!(
            values(asc.apply(docs.iter().collect())),
            vec![None, Some("2".into()), Some("10".into())]
        );
        assert_eq!(
            values(desc.apply(docs.iter().collect())),
            vec![Some("10".into()), Some("2".into()), None]
        );
    }

    #[test]
    fn test_text_in() {
        let c = criterion("city", Operator::In, &["Oslo", "Lima"]);
        let lima = row(&[("city", DataType::Text, "LIMA")]);
        let rome = row(&[("city", DataType::Text, "Rome")]);
        assert!(keeps(&build_stage(DataType::Text, &c, false).unwrap(), &lima));
        assert!(!keeps(&build_stage(DataType::Text, &c, true).unwrap(), &lima));
        assert!(!keeps(&build_stage(DataType::Text, &c, false).unwrap(), &rome));
    }

    #[test]
    fn test_text_sort_folds_case() {
        let docs = vec![
            row(&[("name", DataType::Text, "carol")]),
            row(&[("name", DataType::Text, "Bob")]),
            row(&[("name", DataType::Text, "alice")]),
        ];
        let c = criterion("name", Operator::Sort, &["ASC"]);
        let names = |stage: Stage| -> Vec<String> {
            stage
                .apply(docs.iter().collect())
                .iter()
                .filter_map(|r| r.value("name").map(String::from))
                .collect()
        };

        let folded = build_stage(DataType::Text, &c, false).unwrap();
        assert_eq!(names(folded), vec!["alice", "Bob", "carol"]);
        let exact = build_stage(DataType::Text, &c, true).unwrap();
        assert_eq!(names(exact), vec!["Bob", "alice", "carol"]);
    }

    #[test]
    fn test_invalid_sort_order() {
        let err = build_stage(
            DataType::Text,
            &criterion("n", Operator::Sort, &["up"]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Skipped::InvalidSortOrder { .. }));
    }
}
