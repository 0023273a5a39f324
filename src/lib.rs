pub use self::{
    aggregate::{AveragePrice, BoroughTotals, Summary, YearBuiltTotals},
    chart::{Chart, ChartBackend, ChartBoard, ChartSlot, ChartTarget, SpecBackend},
    dashboard::{Dashboard, SalesTableRow, Scorecards},
    filter::{filter, BoroughSeries, FilterSpec, FilteredView, MonthlySales},
    record::{RawSaleRow, RecordError, SaleRecord, ZipCode},
    state::{DashboardState, Selection},
    store::{LoadError, LoadStats, RecordStore, RowPolicy, DEFAULT_SOURCE},
};

pub mod aggregate;
pub mod chart;
pub mod format;
mod dashboard;
mod filter;
mod record;
mod state;
mod store;
