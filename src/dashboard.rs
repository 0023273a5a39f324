use crate::aggregate::{self, AveragePrice, BoroughTotals, Summary, YearBuiltTotals};
use crate::filter::{FilteredView, MonthlySales};
use crate::{format, SaleRecord};

/// One row of the sales table
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SalesTableRow {
    #[serde(rename = "BOROUGH NAME")]
    pub borough_name: String,
    #[serde(rename = "BUILDING CLASS CATEGORY")]
    pub building_class_category: String,
    #[serde(rename = "NEIGHBORHOOD")]
    pub neighborhood: String,
    #[serde(rename = "COMMERCIAL UNITS")]
    pub commercial_units: u64,
    #[serde(rename = "RESIDENTIAL UNITS")]
    pub residential_units: u64,
    #[serde(rename = "SALE PRICE")]
    pub sale_price: String,
    #[serde(rename = "TOTAL UNITS")]
    pub total_units: u64,
    #[serde(rename = "YEAR BUILT")]
    pub year_built: String,
    #[serde(rename = "ZIP CODE")]
    pub zip_code: String,
}

impl From<&SaleRecord> for SalesTableRow {
    fn from(record: &SaleRecord) -> Self {
        Self {
            borough_name: record.borough_name().to_owned(),
            building_class_category: record.building_class_category().to_owned(),
            neighborhood: record.neighborhood().to_owned(),
            commercial_units: record.commercial_units(),
            residential_units: record.residential_units(),
            sale_price: format::currency(record.sale_price().to_num()),
            total_units: record.total_units(),
            year_built: record.year_built().to_owned(),
            zip_code: record.zip_code().to_string(),
        }
    }
}

/// The grand totals, formatted for display
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Scorecards {
    pub sales: String,
    pub units: String,
    pub residential_units: String,
    pub commercial_units: String,
}

impl From<&Summary> for Scorecards {
    fn from(summary: &Summary) -> Self {
        Self {
            sales: format::thousands(summary.total_sale_price.to_num()),
            units: format::thousands(summary.total_units as f64),
            residential_units: format::thousands(summary.total_residential_units as f64),
            commercial_units: format::thousands(summary.total_commercial_units as f64),
        }
    }
}

/// Everything there is to render for one selection
///
/// A dashboard is built from scratch for every selection change and owns
/// all of its data.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Dashboard {
    pub table: Vec<SalesTableRow>,
    pub monthly_sales: MonthlySales,
    pub borough_totals: Vec<BoroughTotals>,
    pub year_built_totals: Vec<YearBuiltTotals>,
    pub top_building_classes: Vec<AveragePrice>,
    pub top_neighborhoods: Vec<AveragePrice>,
    pub summary: Summary,
    pub scorecards: Scorecards,
}

impl Dashboard {
    /// Runs every aggregation over the view
    pub fn build(view: &FilteredView<'_>) -> Self {
        let records = view.records();
        let summary = aggregate::summarize(records);

        Self {
            table: records.iter().map(|record| SalesTableRow::from(*record)).collect(),
            monthly_sales: view.monthly_sales(),
            borough_totals: aggregate::borough_totals(records),
            year_built_totals: aggregate::year_built_totals(records),
            top_building_classes: aggregate::top_building_classes(records),
            top_neighborhoods: aggregate::top_neighborhoods(records),
            scorecards: Scorecards::from(&summary),
            summary,
        }
    }

    /// Whether the selection matched no sale at all
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
