use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::FilterError;
use crate::bsds::BsdType;

/// Registry `where` clause. Every present field constrains the result; fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterExpression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IdFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bsd_type: Option<TypeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transporter_taken_over_at: Option<DateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_reception_date: Option<DateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_operation_date: Option<DateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitter_company_siret: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transporter_company_siret: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_company_siret: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waste_code: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_operation_code: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_reception_weight: Option<NumericFilter>,
}

impl FilterExpression {
    /// Parses a JSON `where` clause, as given on the command line.
    pub fn from_json(raw: &str) -> Result<Self, FilterError> {
        serde_json::from_str(raw).map_err(|err| FilterError::Malformed(err.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdFilter {
    #[serde(rename = "_eq", default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<String>,
    #[serde(rename = "_in", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeFilter {
    #[serde(rename = "_eq", default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<BsdType>,
    #[serde(rename = "_in", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<BsdType>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringFilter {
    #[serde(rename = "_eq", default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<String>,
    #[serde(rename = "_in", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<String>>,
    #[serde(rename = "_contains", default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
}

/// Comparison operators shared by date and numeric filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, bound(deserialize = "T: RangeValue"))]
pub struct RangeFilter<T> {
    #[serde(
        rename = "_eq",
        default,
        deserialize_with = "range_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub eq: Option<T>,
    #[serde(
        rename = "_gt",
        default,
        deserialize_with = "range_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub gt: Option<T>,
    #[serde(
        rename = "_gte",
        default,
        deserialize_with = "range_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub gte: Option<T>,
    #[serde(
        rename = "_lt",
        default,
        deserialize_with = "range_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub lt: Option<T>,
    #[serde(
        rename = "_lte",
        default,
        deserialize_with = "range_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub lte: Option<T>,
}

/// Operand of a range operator as read from the wire.
pub trait RangeValue: Sized {
    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error>;
}

impl RangeValue for f64 {
    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer)
    }
}

/// RFC 3339 instants, or `YYYY-MM-DD` read as midnight UTC.
impl RangeValue for DateTime<Utc> {
    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(instant) = raw.parse::<DateTime<Utc>>() {
            return Ok(instant);
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| Utc.from_utc_datetime(&midnight))
            .ok_or_else(|| {
                D::Error::custom(format!("`{raw}` is neither an RFC 3339 instant nor a date"))
            })
    }
}

fn range_bound<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: RangeValue,
{
    struct Bound<T>(T);

    impl<'de, T: RangeValue> Deserialize<'de> for Bound<T> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            T::deserialize_value(deserializer).map(Bound)
        }
    }

    Ok(Option::<Bound<T>>::deserialize(deserializer)?.map(|bound| bound.0))
}

pub type DateFilter = RangeFilter<DateTime<Utc>>;
pub type NumericFilter = RangeFilter<f64>;
