use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, Months, NaiveDate};
use fixed::types::U51F13;

use crate::store::distinct;
use crate::{SaleRecord, ZipCode};

/// The first day of the default date range
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 9, 1).unwrap_or(NaiveDate::MIN)
}

/// The last day of the default date range
pub fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 8, 31).unwrap_or(NaiveDate::MAX)
}

/// Defines which records are visible
///
/// Both ends of the date range are inclusive. An empty borough or zip code
/// selection means no restriction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    start: NaiveDate,
    end: NaiveDate,
    boroughs: BTreeSet<String>,
    zip_codes: BTreeSet<ZipCode>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::new(default_start(), default_end())
    }
}

impl FilterSpec {
    /// Creates a filter for the date range, without borough or zip code restriction
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            boroughs: BTreeSet::new(),
            zip_codes: BTreeSet::new(),
        }
    }

    pub fn with_boroughs<I, S>(mut self, boroughs: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>,
    {
        self.boroughs = boroughs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_zip_codes<I, Z>(mut self, zip_codes: I) -> Self
        where I: IntoIterator<Item = Z>,
              Z: Into<ZipCode>,
    {
        self.zip_codes = zip_codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn boroughs(&self) -> &BTreeSet<String> {
        &self.boroughs
    }

    pub fn zip_codes(&self) -> &BTreeSet<ZipCode> {
        &self.zip_codes
    }

    fn selects_borough(&self, borough: &str) -> bool {
        self.boroughs.is_empty() || self.boroughs.contains(borough)
    }

    fn selects_zip_code(&self, zip_code: &ZipCode) -> bool {
        self.zip_codes.is_empty() || self.zip_codes.contains(zip_code)
    }

    fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Whether the record passes all three predicates
    pub fn matches(&self, record: &SaleRecord) -> bool {
        self.selects_borough(record.borough_name())
            && self.selects_zip_code(record.zip_code())
            && self.covers(record.sale_date())
    }

    /// Applies the filter, see [`filter`]
    pub fn apply<'a>(&self, records: &'a [SaleRecord]) -> FilteredView<'a> {
        filter(records, self)
    }
}

/// The records visible under a [`FilterSpec`]
///
/// Records keep the order of the store. The borough set is not derived from
/// the visible records: it holds every borough of the store that the borough
/// selection admits, so that a selected borough keeps its series even when
/// the date or zip code filter hides all of its sales.
#[derive(Clone, Debug)]
pub struct FilteredView<'a> {
    spec: FilterSpec,
    records: Vec<&'a SaleRecord>,
    boroughs: Vec<&'a str>,
}

/// Selects the records matching the filter
pub fn filter<'a>(records: &'a [SaleRecord], spec: &FilterSpec) -> FilteredView<'a> {
    let boroughs = distinct(records.iter().map(SaleRecord::borough_name))
        .into_iter()
        .filter(|borough| spec.selects_borough(borough))
        .collect::<Vec<_>>();

    let visible = records
        .iter()
        .filter(|record| spec.matches(record))
        .collect::<Vec<_>>();

    tracing::debug!(
        start = %spec.start,
        end = %spec.end,
        boroughs = boroughs.len(),
        visible = visible.len(),
        total = records.len(),
        "filtered records",
    );

    FilteredView {
        spec: spec.clone(),
        records: visible,
        boroughs,
    }
}

impl<'a> FilteredView<'a> {
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// The visible records in store order
    pub fn records(&self) -> &[&'a SaleRecord] {
        &self.records
    }

    /// The boroughs that form the series of the monthly sales chart
    pub fn boroughs(&self) -> &[&'a str] {
        &self.boroughs
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sums the sale prices per borough and calendar month
    ///
    /// There is one bucket for every month from the month of the range start
    /// up to and including the month of the range end. Every borough of
    /// [`FilteredView::boroughs`] gets a series, months without sales are zero.
    pub fn monthly_sales(&self) -> MonthlySales {
        let months = month_buckets(self.spec.start, self.spec.end);
        let month_index = months
            .iter()
            .enumerate()
            .map(|(i, month)| ((month.year(), month.month()), i))
            .collect::<HashMap<_, _>>();
        let borough_index = self.boroughs
            .iter()
            .enumerate()
            .map(|(i, borough)| (*borough, i))
            .collect::<HashMap<_, _>>();

        let mut series = self.boroughs
            .iter()
            .map(|borough| BoroughSeries {
                borough: borough.to_string(),
                sales: vec![U51F13::ZERO; months.len()],
            })
            .collect::<Vec<_>>();

        for record in &self.records {
            let borough = borough_index.get(record.borough_name());
            let month = month_index.get(&record.sale_month());
            if let (Some(&borough), Some(&month)) = (borough, month) {
                let sum = &mut series[borough].sales[month];
                *sum = sum.saturating_add(record.sale_price());
            }
        }

        MonthlySales {
            labels: months.iter().map(|month| month.format("%b %Y").to_string()).collect(),
            series,
        }
    }
}

/// The first day of every month touched by the inclusive range
fn month_buckets(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }

    let mut buckets = Vec::new();
    let mut month = start.with_day(1);
    while let Some(current) = month.filter(|month| *month <= end) {
        buckets.push(current);
        month = current.checked_add_months(Months::new(1));
    }

    buckets
}

/// The monthly sale totals of one borough
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BoroughSeries {
    pub borough: String,
    /// One sum per month, parallel to [`MonthlySales::labels`]
    pub sales: Vec<U51F13>,
}

/// The monthly sales time series of all boroughs
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct MonthlySales {
    /// `Mon YYYY` labels, one per month bucket
    pub labels: Vec<String>,
    pub series: Vec<BoroughSeries>,
}
