use chrono::NaiveDate;

use crate::filter::{default_end, default_start};
use crate::{Dashboard, FilterSpec, RecordStore, ZipCode};

/// The current choice of the three selection controls
///
/// Every control only ever replaces its own part of the selection, changing
/// the borough selection keeps the date range and zip codes as they are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    start: NaiveDate,
    end: NaiveDate,
    boroughs: Vec<String>,
    zip_codes: Vec<ZipCode>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            boroughs: Vec::new(),
            zip_codes: Vec::new(),
        }
    }
}

impl Selection {
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.start = start;
        self.end = end;
    }

    /// Replaces the borough selection, an empty selection selects all boroughs
    pub fn set_boroughs<I, S>(&mut self, boroughs: I)
        where I: IntoIterator<Item = S>,
              S: Into<String>,
    {
        self.boroughs = boroughs.into_iter().map(Into::into).collect();
    }

    /// Replaces the zip code selection, an empty selection selects all zip codes
    pub fn set_zip_codes<I, Z>(&mut self, zip_codes: I)
        where I: IntoIterator<Item = Z>,
              Z: Into<ZipCode>,
    {
        self.zip_codes = zip_codes.into_iter().map(Into::into).collect();
    }

    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.start, self.end)
    }

    pub fn boroughs(&self) -> &[String] {
        &self.boroughs
    }

    pub fn zip_codes(&self) -> &[ZipCode] {
        &self.zip_codes
    }

    /// A snapshot of the selection as a filter
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec::new(self.start, self.end)
            .with_boroughs(self.boroughs.iter().cloned())
            .with_zip_codes(self.zip_codes.iter().cloned())
    }
}

/// The dataset together with the current selection
///
/// Every selection change rebuilds the dashboard from the full dataset.
#[derive(Debug)]
pub struct DashboardState {
    store: RecordStore,
    selection: Selection,
}

impl DashboardState {
    /// Creates the state with the default selection
    pub fn new(store: RecordStore) -> Self {
        Self::with_selection(store, Selection::default())
    }

    pub fn with_selection(store: RecordStore, selection: Selection) -> Self {
        Self { store, selection }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Builds the dashboard for the current selection
    pub fn dashboard(&self) -> Dashboard {
        let spec = self.selection.filter_spec();
        let view = spec.apply(self.store.records());

        if view.is_empty() {
            tracing::info!(?spec, "no sales match the selection");
        }

        Dashboard::build(&view)
    }

    pub fn select_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Dashboard {
        self.selection.set_date_range(start, end);
        self.dashboard()
    }

    pub fn select_boroughs<I, S>(&mut self, boroughs: I) -> Dashboard
        where I: IntoIterator<Item = S>,
              S: Into<String>,
    {
        self.selection.set_boroughs(boroughs);
        self.dashboard()
    }

    pub fn select_zip_codes<I, Z>(&mut self, zip_codes: I) -> Dashboard
        where I: IntoIterator<Item = Z>,
              Z: Into<ZipCode>,
    {
        self.selection.set_zip_codes(zip_codes);
        self.dashboard()
    }
}
