use std::borrow::Cow;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use fixed::types::U51F13;

/// Possible errors to occur while turning a raw row into a sale record
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("The sale date `{0}` is not a valid DD/MM/YYYY date")]
    InvalidDate(String),
}

/// The zip code of a sale, normalized to its textual form
///
/// The source data carries zip codes either as JSON numbers or as strings,
/// both end up as the same `ZipCode`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct ZipCode(String);

impl ZipCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ZipCode {
    fn from(zip: &str) -> Self {
        Self(zip.trim().to_owned())
    }
}

impl From<String> for ZipCode {
    fn from(zip: String) -> Self {
        Self::from(zip.as_str())
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single cell of the source sheet
///
/// Cells are typed loosely in the source, a price may be `100` or `"100"`.
/// Anything else, like a boolean or a nested object, reads as an empty cell.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(untagged)]
enum Cell {
    Text(String),
    Number(serde_json::Number),
    Other(serde::de::IgnoredAny),
}

impl Cell {
    fn text(&self) -> Cow<'_, str> {
        match self {
            Cell::Text(text) => Cow::Borrowed(text.as_str()),
            Cell::Number(number) => Cow::Owned(number.to_string()),
            Cell::Other(_) => Cow::Borrowed(""),
        }
    }
}

fn text_of(cell: &Option<Cell>) -> String {
    cell.as_ref()
        .map(|cell| cell.text().trim().to_owned())
        .unwrap_or_default()
}

/// One row of the `Sheet1` array, exactly as it comes from the source
#[derive(Clone, Debug, serde::Deserialize)]
pub struct RawSaleRow {
    #[serde(rename = "BOROUGH NAME", default)]
    borough_name: Option<Cell>,
    #[serde(rename = "NEIGHBORHOOD", default)]
    neighborhood: Option<Cell>,
    #[serde(rename = "BUILDING CLASS CATEGORY", default)]
    building_class_category: Option<Cell>,
    #[serde(rename = "ZIP CODE", default)]
    zip_code: Option<Cell>,
    #[serde(rename = "SALE DATE", default)]
    sale_date: Option<Cell>,
    #[serde(rename = "SALE PRICE", default)]
    sale_price: Option<Cell>,
    #[serde(rename = "RESIDENTIAL UNITS", default)]
    residential_units: Option<Cell>,
    #[serde(rename = "COMMERCIAL UNITS", default)]
    commercial_units: Option<Cell>,
    #[serde(rename = "TOTAL UNITS", default)]
    total_units: Option<Cell>,
    #[serde(rename = "GROUP YEAR BUILT", default)]
    year_built_group: Option<Cell>,
    #[serde(rename = "YEAR BUILT", default)]
    year_built: Option<Cell>,
}

/// A parcel sale transaction
///
/// Records are immutable once parsed. Numeric fields have already been
/// coerced, the sale date has already been parsed.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SaleRecord {
    borough_name: String,
    neighborhood: String,
    building_class_category: String,
    zip_code: ZipCode,
    sale_date: NaiveDate,
    sale_price: U51F13,
    residential_units: u64,
    commercial_units: u64,
    total_units: u64,
    year_built_group: String,
    year_built: String,
}

impl SaleRecord {
    /// The borough the parcel is located in
    pub fn borough_name(&self) -> &str {
        &self.borough_name
    }

    pub fn neighborhood(&self) -> &str {
        &self.neighborhood
    }

    pub fn building_class_category(&self) -> &str {
        &self.building_class_category
    }

    pub fn zip_code(&self) -> &ZipCode {
        &self.zip_code
    }

    pub fn sale_date(&self) -> NaiveDate {
        self.sale_date
    }

    /// The calendar month of the sale as `(year, month)`, month is 1-indexed
    pub fn sale_month(&self) -> (i32, u32) {
        (self.sale_date.year(), self.sale_date.month())
    }

    pub fn sale_price(&self) -> U51F13 {
        self.sale_price
    }

    pub fn residential_units(&self) -> u64 {
        self.residential_units
    }

    pub fn commercial_units(&self) -> u64 {
        self.commercial_units
    }

    /// The total number of units as stated by the source
    ///
    /// This is usually, but not necessarily, the sum of residential and
    /// commercial units.
    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    /// The year built bucket label, e.g. `1900` for the parcels built in the 1900s
    pub fn year_built_group(&self) -> &str {
        &self.year_built_group
    }

    /// The raw year built, only used for display
    pub fn year_built(&self) -> &str {
        &self.year_built
    }
}

impl TryFrom<RawSaleRow> for SaleRecord {
    type Error = RecordError;

    fn try_from(row: RawSaleRow) -> Result<Self, Self::Error> {
        let sale_date = parse_sale_date(&text_of(&row.sale_date))?;

        Ok(Self {
            borough_name: text_of(&row.borough_name),
            neighborhood: text_of(&row.neighborhood),
            building_class_category: text_of(&row.building_class_category),
            zip_code: ZipCode::from(text_of(&row.zip_code)),
            sale_date,
            sale_price: coerce_amount(&text_of(&row.sale_price)),
            residential_units: coerce_count(&text_of(&row.residential_units)),
            commercial_units: coerce_count(&text_of(&row.commercial_units)),
            total_units: coerce_count(&text_of(&row.total_units)),
            year_built_group: text_of(&row.year_built_group),
            year_built: text_of(&row.year_built),
        })
    }
}

/// Parses a `DD/MM/YYYY` sale date
///
/// Every deviation from the format is an error, including dates that
/// don't exist like `31/02/2017`.
pub(crate) fn parse_sale_date(value: &str) -> Result<NaiveDate, RecordError> {
    let invalid = || RecordError::InvalidDate(value.to_owned());

    let mut parts = value.trim().split('/').map(str::trim);
    let (day, month, year) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(day), Some(month), Some(year), None) => (day, month, year),
        _ => return Err(invalid()),
    };

    let day = day.parse::<u32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Coerces a textual amount into a non-negative fixed point number
///
/// Anything that isn't a non-negative number counts as zero.
pub(crate) fn coerce_amount(value: &str) -> U51F13 {
    let value = value.trim();
    if value.is_empty() {
        return U51F13::ZERO;
    }

    value
        .parse::<U51F13>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|amount| amount.is_finite() && *amount >= 0.0)
                .and_then(U51F13::checked_from_num)
        })
        .unwrap_or(U51F13::ZERO)
}

/// Coerces a textual unit count into a non-negative integer
///
/// Fractional counts are truncated, anything else that isn't a
/// non-negative number counts as zero.
pub(crate) fn coerce_count(value: &str) -> u64 {
    let value = value.trim();

    value
        .parse::<u64>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|count| count.is_finite() && *count >= 0.0 && *count < u64::MAX as f64)
                .map(|count| count.trunc() as u64)
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> Result<SaleRecord, RecordError> {
        let row: RawSaleRow = serde_json::from_str(json).unwrap();
        SaleRecord::try_from(row)
    }

    #[test]
    fn parses_a_complete_row() {
        let record = record(r#"{
            "BOROUGH NAME": "BRONX",
            "NEIGHBORHOOD": "BATHGATE",
            "BUILDING CLASS CATEGORY": "01 ONE FAMILY DWELLINGS",
            "ZIP CODE": 10457,
            "SALE DATE": "15/01/2017",
            "SALE PRICE": "499000",
            "RESIDENTIAL UNITS": 2,
            "COMMERCIAL UNITS": "1",
            "TOTAL UNITS": 3,
            "GROUP YEAR BUILT": "1900",
            "YEAR BUILT": 1910
        }"#).unwrap();

        assert_eq!(record.borough_name(), "BRONX");
        assert_eq!(record.neighborhood(), "BATHGATE");
        assert_eq!(record.building_class_category(), "01 ONE FAMILY DWELLINGS");
        assert_eq!(record.zip_code().as_str(), "10457");
        assert_eq!(record.sale_date(), NaiveDate::from_ymd_opt(2017, 1, 15).unwrap());
        assert_eq!(record.sale_month(), (2017, 1));
        assert_eq!(record.sale_price(), U51F13::from_num(499_000));
        assert_eq!(record.residential_units(), 2);
        assert_eq!(record.commercial_units(), 1);
        assert_eq!(record.total_units(), 3);
        assert_eq!(record.year_built_group(), "1900");
        assert_eq!(record.year_built(), "1910");
    }

    #[test]
    fn numeric_and_textual_zip_codes_are_equal() {
        let numeric = record(r#"{"ZIP CODE": 11201, "SALE DATE": "01/01/2017"}"#).unwrap();
        let textual = record(r#"{"ZIP CODE": " 11201", "SALE DATE": "01/01/2017"}"#).unwrap();

        assert_eq!(numeric.zip_code(), textual.zip_code());
    }

    #[test]
    fn malformed_numbers_count_as_zero() {
        let record = record(r#"{
            "SALE DATE": "01/01/2017",
            "SALE PRICE": " -  ",
            "RESIDENTIAL UNITS": "n/a",
            "COMMERCIAL UNITS": null
        }"#).unwrap();

        assert_eq!(record.sale_price(), U51F13::ZERO);
        assert_eq!(record.residential_units(), 0);
        assert_eq!(record.commercial_units(), 0);
        assert_eq!(record.total_units(), 0);
    }

    #[test]
    fn cells_of_other_json_types_count_as_zero() {
        let record = record(r#"{
            "SALE DATE": "01/01/2017",
            "SALE PRICE": true,
            "RESIDENTIAL UNITS": [1, 2],
            "COMMERCIAL UNITS": {"value": 3},
            "NEIGHBORHOOD": false
        }"#).unwrap();

        assert_eq!(record.sale_price(), U51F13::ZERO);
        assert_eq!(record.residential_units(), 0);
        assert_eq!(record.commercial_units(), 0);
        assert_eq!(record.neighborhood(), "");
    }

    #[test]
    fn date_of_another_json_type_is_rejected() {
        assert_eq!(
            record(r#"{"SALE DATE": true}"#),
            Err(RecordError::InvalidDate(String::new())),
        );
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for date in ["", "2017-01-15", "15/01", "15/01/2017/1", "aa/01/2017", "31/02/2017", "15/13/2017"] {
            let json = format!(r#"{{"SALE DATE": "{date}"}}"#);
            assert_eq!(
                record(&json),
                Err(RecordError::InvalidDate(date.to_owned())),
                "{date}",
            );
        }
    }

    #[test]
    fn missing_date_is_rejected() {
        assert!(record(r#"{"BOROUGH NAME": "BRONX"}"#).is_err());
    }

    #[test]
    fn coerce_amount_accepts_plain_and_fractional_numbers() {
        assert_eq!(coerce_amount("100"), U51F13::from_num(100));
        assert_eq!(coerce_amount(" 12.5 "), U51F13::from_num(12.5));
        assert_eq!(coerce_amount("1e3"), U51F13::from_num(1000));
        assert_eq!(coerce_amount(""), U51F13::ZERO);
        assert_eq!(coerce_amount("-10"), U51F13::ZERO);
        assert_eq!(coerce_amount("1,000"), U51F13::ZERO);
        assert_eq!(coerce_amount("NaN"), U51F13::ZERO);
    }

    #[test]
    fn coerce_count_truncates_fractions() {
        assert_eq!(coerce_count("7"), 7);
        assert_eq!(coerce_count("7.9"), 7);
        assert_eq!(coerce_count("-1"), 0);
        assert_eq!(coerce_count("x"), 0);
    }
}
