use chrono::{DateTime, Utc};

use super::filter::{FilterExpression, IdFilter, RangeFilter, StringFilter, TypeFilter};
use super::predicate::{Predicate, RangeBound, Scalar};
use super::FilterError;
use crate::index::IndexField;

/// Translates a registry filter into ANDed index predicates.
///
/// Predicates follow the field order of [`FilterExpression`]. Empty constraints
/// produce nothing; contradictory bounds fail before any predicate is returned.
pub fn translate(expression: &FilterExpression) -> Result<Vec<Predicate>, FilterError> {
    let mut predicates = Vec::new();

    if let Some(filter) = &expression.id {
        predicates.extend(id_predicates(filter));
    }
    if let Some(filter) = &expression.bsd_type {
        predicates.extend(type_predicates(filter));
    }

    let dates = [
        ("createdAt", IndexField::CreatedAt, &expression.created_at),
        (
            "transporterTakenOverAt",
            IndexField::TransporterTransportTakenOverAt,
            &expression.transporter_taken_over_at,
        ),
        (
            "destinationReceptionDate",
            IndexField::DestinationReceptionDate,
            &expression.destination_reception_date,
        ),
        (
            "destinationOperationDate",
            IndexField::DestinationOperationDate,
            &expression.destination_operation_date,
        ),
    ];
    for (name, field, filter) in dates {
        if let Some(filter) = filter {
            predicates.extend(range_predicates(name, field, filter, date_scalar)?);
        }
    }

    let strings = [
        (IndexField::EmitterCompanySiret, &expression.emitter_company_siret),
        (IndexField::TransporterCompanySiret, &expression.transporter_company_siret),
        (IndexField::DestinationCompanySiret, &expression.destination_company_siret),
        (IndexField::WasteCode, &expression.waste_code),
        (IndexField::DestinationOperationCode, &expression.destination_operation_code),
    ];
    for (field, filter) in strings {
        if let Some(filter) = filter {
            predicates.extend(string_predicates(field, filter));
        }
    }

    if let Some(filter) = &expression.destination_reception_weight {
        predicates.extend(range_predicates(
            "destinationReceptionWeight",
            IndexField::DestinationReceptionWeight,
            filter,
            |value: &f64| Scalar::Number(*value),
        )?);
    }

    Ok(predicates)
}

fn text(value: &str) -> Scalar {
    Scalar::Text(value.to_string())
}

fn date_scalar(value: &DateTime<Utc>) -> Scalar {
    Scalar::Date(*value)
}

/// The id filter also matches the human readable id.
fn id_predicates(filter: &IdFilter) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if let Some(id) = &filter.eq {
        predicates.push(Predicate::AnyOf(vec![
            Predicate::term(IndexField::Id, text(id)),
            Predicate::term(IndexField::ReadableId, text(id)),
        ]));
    }
    if let Some(ids) = &filter.one_of {
        let values: Vec<Scalar> = ids.iter().map(|id| text(id)).collect();
        predicates.push(Predicate::AnyOf(vec![
            Predicate::Terms {
                field: IndexField::Id,
                values: values.clone(),
            },
            Predicate::Terms {
                field: IndexField::ReadableId,
                values,
            },
        ]));
    }
    predicates
}

fn type_predicates(filter: &TypeFilter) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if let Some(bsd_type) = filter.eq {
        predicates.push(Predicate::term(IndexField::Type, text(bsd_type.as_str())));
    }
    if let Some(types) = &filter.one_of {
        predicates.push(Predicate::Terms {
            field: IndexField::Type,
            values: types.iter().map(|bsd_type| text(bsd_type.as_str())).collect(),
        });
    }
    predicates
}

fn string_predicates(field: IndexField, filter: &StringFilter) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if let Some(value) = &filter.eq {
        predicates.push(Predicate::term(field, text(value)));
    }
    if let Some(values) = &filter.one_of {
        predicates.push(Predicate::Terms {
            field,
            values: values.iter().map(|value| text(value)).collect(),
        });
    }
    if let Some(needle) = &filter.contains {
        predicates.push(Predicate::Contains {
            field,
            needle: needle.clone(),
        });
    }
    predicates
}

fn range_predicates<T>(
    name: &'static str,
    field: IndexField,
    filter: &RangeFilter<T>,
    scalar: impl Fn(&T) -> Scalar,
) -> Result<Vec<Predicate>, FilterError> {
    let lower = exclusive_pair(name, "_gt", filter.gt.as_ref(), "_gte", filter.gte.as_ref())?;
    let upper = exclusive_pair(name, "_lt", filter.lt.as_ref(), "_lte", filter.lte.as_ref())?;

    let mut predicates = Vec::new();
    if let Some(value) = &filter.eq {
        predicates.push(Predicate::term(field, scalar(value)));
    }
    if lower.is_some() || upper.is_some() {
        let bound = |(value, inclusive): (&T, bool)| RangeBound {
            value: scalar(value),
            inclusive,
        };
        predicates.push(Predicate::Range {
            field,
            lower: lower.map(bound),
            upper: upper.map(bound),
        });
    }
    Ok(predicates)
}

/// At most one of a strict and an inclusive bound on the same side.
fn exclusive_pair<'a, T>(
    field: &'static str,
    strict_operator: &'static str,
    strict: Option<&'a T>,
    inclusive_operator: &'static str,
    inclusive: Option<&'a T>,
) -> Result<Option<(&'a T, bool)>, FilterError> {
    match (strict, inclusive) {
        (Some(_), Some(_)) => Err(FilterError::ConflictingBounds {
            field,
            first: strict_operator,
            second: inclusive_operator,
        }),
        (Some(value), None) => Ok(Some((value, false))),
        (None, Some(value)) => Ok(Some((value, true))),
        (None, None) => Ok(None),
    }
}
