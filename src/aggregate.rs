use std::cmp::Ordering;
use std::collections::BTreeMap;

use fixed::types::U51F13;

use crate::SaleRecord;

/// The number of groups kept by the average price rankings
pub const TOP_GROUPS: usize = 10;

/// Sale and unit totals of one borough
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct BoroughTotals {
    pub name: String,
    pub total_sale_price: U51F13,
    pub total_residential_units: u64,
    pub total_commercial_units: u64,
}

impl BoroughTotals {
    fn add(&mut self, record: &SaleRecord) {
        self.total_sale_price = self.total_sale_price.saturating_add(record.sale_price());
        self.total_residential_units = self.total_residential_units.saturating_add(record.residential_units());
        self.total_commercial_units = self.total_commercial_units.saturating_add(record.commercial_units());
    }
}

/// Sums the sales of every borough present in the records
///
/// The result is ordered by total sale price, largest first.
pub fn borough_totals(records: &[&SaleRecord]) -> Vec<BoroughTotals> {
    let mut groups = BTreeMap::<&str, BoroughTotals>::new();
    for record in records {
        groups
            .entry(record.borough_name())
            .or_insert_with(|| BoroughTotals {
                name: record.borough_name().to_owned(),
                ..BoroughTotals::default()
            })
            .add(record);
    }

    let mut totals = groups.into_values().collect::<Vec<_>>();
    totals.sort_by(|a, b| b.total_sale_price.cmp(&a.total_sale_price));
    totals
}

/// The number of units in one year built bucket
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct YearBuiltTotals {
    pub year_built: String,
    pub total_units: u64,
}

/// Sums the units per year built bucket
///
/// Buckets are ordered by their numeric value. Labels that aren't numbers
/// come first, ordered by label.
pub fn year_built_totals(records: &[&SaleRecord]) -> Vec<YearBuiltTotals> {
    let mut groups = BTreeMap::<&str, u64>::new();
    for record in records {
        let units = groups.entry(record.year_built_group()).or_default();
        *units = units.saturating_add(record.total_units());
    }

    let mut totals = groups
        .into_iter()
        .map(|(year_built, total_units)| YearBuiltTotals {
            year_built: year_built.to_owned(),
            total_units,
        })
        .collect::<Vec<_>>();
    totals.sort_by(|a, b| compare_year_built(&a.year_built, &b.year_built));
    totals
}

fn compare_year_built(a: &str, b: &str) -> Ordering {
    let numeric = |label: &str| label.trim().parse::<f64>().ok().filter(|value| value.is_finite());

    match (numeric(a), numeric(b)) {
        (None, None) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
    }
}

/// The average sale price of one group
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AveragePrice {
    pub name: String,
    pub average_sale_price: U51F13,
    /// The number of sales the average is built from, never zero
    pub sales: usize,
}

#[derive(Default)]
struct PriceSum {
    total: U51F13,
    count: usize,
}

/// Ranks the groups formed by `key` by their average sale price
///
/// Only the [`TOP_GROUPS`] most expensive groups are kept, most expensive first.
pub fn top_by_average_price<'a, F>(records: &[&'a SaleRecord], key: F) -> Vec<AveragePrice>
    where F: Fn(&'a SaleRecord) -> &'a str
{
    let mut groups = BTreeMap::<&str, PriceSum>::new();
    for record in records {
        let sum = groups.entry(key(*record)).or_default();
        sum.total = sum.total.saturating_add(record.sale_price());
        sum.count += 1;
    }

    let mut averages = groups
        .into_iter()
        .filter_map(|(name, sum)| {
            let average_sale_price = sum.total.checked_div_int(sum.count as u64)?;
            Some(AveragePrice {
                name: name.to_owned(),
                average_sale_price,
                sales: sum.count,
            })
        })
        .collect::<Vec<_>>();
    averages.sort_by(|a, b| b.average_sale_price.cmp(&a.average_sale_price));
    averages.truncate(TOP_GROUPS);
    averages
}

/// The ten building class categories with the highest average sale price
pub fn top_building_classes(records: &[&SaleRecord]) -> Vec<AveragePrice> {
    top_by_average_price(records, SaleRecord::building_class_category)
}

/// The ten neighborhoods with the highest average sale price
pub fn top_neighborhoods(records: &[&SaleRecord]) -> Vec<AveragePrice> {
    top_by_average_price(records, SaleRecord::neighborhood)
}

/// Grand totals over all records
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub total_sale_price: U51F13,
    pub total_units: u64,
    pub total_residential_units: u64,
    pub total_commercial_units: u64,
}

pub fn summarize(records: &[&SaleRecord]) -> Summary {
    records
        .iter()
        .fold(Summary::default(), |summary, record| Summary {
            total_sale_price: summary.total_sale_price.saturating_add(record.sale_price()),
            total_units: summary.total_units.saturating_add(record.total_units()),
            total_residential_units: summary.total_residential_units.saturating_add(record.residential_units()),
            total_commercial_units: summary.total_commercial_units.saturating_add(record.commercial_units()),
        })
}
