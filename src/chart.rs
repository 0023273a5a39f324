use std::collections::BTreeMap;

use crate::{format, Dashboard};

/// The line colors of the monthly sales chart, cycled per borough
pub const SERIES_PALETTE: [&str; 5] = ["#302de0", "#49084f", "#b51818", "#0e758c", "#fa3981"];

/// The places a chart can be rendered to
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartTarget {
    TotalMonthlySales,
    PropertyTypeSales,
    UnitsByYearBuilt,
    TopBuildingClassCategorySales,
    TopNeighborhoodSales,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    Bar,
    /// Bars growing from the category axis on the left
    HorizontalBar,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub color: String,
}

/// Everything a chart library needs to draw one chart
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    /// Whether the datasets are stacked on top of each other
    pub stacked: bool,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl Chart {
    /// The label of a tick on the value axis
    pub fn tick_label(value: f64) -> String {
        format::compact(value)
    }

    /// The largest value of all datasets, or zero
    pub fn max_value(&self) -> f64 {
        self.datasets
            .iter()
            .flat_map(|dataset| dataset.data.iter().copied())
            .fold(0.0, f64::max)
    }
}

fn dataset(label: &str, data: Vec<f64>, color: &str) -> Dataset {
    Dataset {
        label: label.to_owned(),
        data,
        color: color.to_owned(),
    }
}

/// Builds the specification of every chart of the dashboard
pub fn charts(dashboard: &Dashboard) -> Vec<(ChartTarget, Chart)> {
    let monthly = &dashboard.monthly_sales;
    let boroughs = &dashboard.borough_totals;
    let year_built = &dashboard.year_built_totals;

    vec![
        (ChartTarget::TotalMonthlySales, Chart {
            kind: ChartKind::Line,
            stacked: false,
            labels: monthly.labels.clone(),
            datasets: monthly.series
                .iter()
                .zip(SERIES_PALETTE.iter().cycle())
                .map(|(series, color)| dataset(
                    &series.borough,
                    series.sales.iter().map(|sum| sum.to_num()).collect(),
                    color,
                ))
                .collect(),
        }),
        (ChartTarget::PropertyTypeSales, Chart {
            kind: ChartKind::Bar,
            stacked: true,
            labels: boroughs.iter().map(|totals| totals.name.clone()).collect(),
            datasets: vec![
                dataset(
                    "Total Residential Units",
                    boroughs.iter().map(|totals| totals.total_residential_units as f64).collect(),
                    "rgba(75, 192, 192, 0.6)",
                ),
                dataset(
                    "Total Commercial Units",
                    boroughs.iter().map(|totals| totals.total_commercial_units as f64).collect(),
                    "rgba(255, 159, 64, 0.6)",
                ),
            ],
        }),
        (ChartTarget::UnitsByYearBuilt, Chart {
            kind: ChartKind::Bar,
            stacked: false,
            labels: year_built.iter().map(|totals| totals.year_built.clone()).collect(),
            datasets: vec![dataset(
                "Total Units",
                year_built.iter().map(|totals| totals.total_units as f64).collect(),
                "rgba(54, 162, 235, 0.6)",
            )],
        }),
        (ChartTarget::TopBuildingClassCategorySales, average_price_chart(
            &dashboard.top_building_classes,
            "rgba(255, 99, 132, 0.6)",
        )),
        (ChartTarget::TopNeighborhoodSales, average_price_chart(
            &dashboard.top_neighborhoods,
            "rgba(75, 192, 192, 0.6)",
        )),
    ]
}

fn average_price_chart(ranking: &[crate::AveragePrice], color: &str) -> Chart {
    Chart {
        kind: ChartKind::HorizontalBar,
        stacked: false,
        labels: ranking.iter().map(|average| average.name.clone()).collect(),
        datasets: vec![dataset(
            "Average Sale Price",
            ranking.iter().map(|average| average.average_sale_price.to_num()).collect(),
            color,
        )],
    }
}

/// Holds at most one live chart handle
///
/// Installing a new handle releases the previous one first.
#[derive(Debug)]
pub struct ChartSlot<H> {
    handle: Option<H>,
}

impl<H> Default for ChartSlot<H> {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl<H> ChartSlot<H> {
    /// Replaces the current handle, returns whether there was one
    pub fn install(&mut self, create: impl FnOnce() -> H) -> bool {
        let replaced = self.release().is_some();
        self.handle = Some(create());
        replaced
    }

    /// Takes the current handle out of the slot
    pub fn release(&mut self) -> Option<H> {
        self.handle.take()
    }

    pub fn get(&self) -> Option<&H> {
        self.handle.as_ref()
    }
}

/// Draws chart specifications, e.g. onto a canvas
pub trait ChartBackend {
    /// The live chart, dropping it releases its resources
    type Handle;

    fn draw(&mut self, target: ChartTarget, chart: &Chart) -> Self::Handle;
}

/// One slot per chart target, drawing through a backend
pub struct ChartBoard<B: ChartBackend> {
    backend: B,
    slots: BTreeMap<ChartTarget, ChartSlot<B::Handle>>,
}

impl<B: ChartBackend> ChartBoard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            slots: BTreeMap::new(),
        }
    }

    /// Draws every chart of the dashboard, replacing the previous ones
    ///
    /// Returns the number of charts that replaced an existing one.
    pub fn render(&mut self, dashboard: &Dashboard) -> usize {
        let mut replaced = 0;
        for (target, chart) in charts(dashboard) {
            let backend = &mut self.backend;
            let slot = self.slots.entry(target).or_default();
            if slot.install(|| backend.draw(target, &chart)) {
                replaced += 1;
            }
        }

        tracing::debug!(charts = self.slots.len(), replaced, "rendered charts");
        replaced
    }

    pub fn handle(&self, target: ChartTarget) -> Option<&B::Handle> {
        self.slots.get(&target).and_then(ChartSlot::get)
    }

    /// All live handles, ordered by target
    pub fn handles(&self) -> impl Iterator<Item = (ChartTarget, &B::Handle)> {
        self.slots
            .iter()
            .filter_map(|(target, slot)| slot.get().map(|handle| (*target, handle)))
    }
}

/// A backend that keeps the specification itself as the live chart
#[derive(Clone, Copy, Debug, Default)]
pub struct SpecBackend;

impl ChartBackend for SpecBackend {
    type Handle = Chart;

    fn draw(&mut self, _target: ChartTarget, chart: &Chart) -> Chart {
        chart.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::{FilterSpec, RecordStore, RowPolicy};

    const SALES: &str = r#"{"Sheet1": [
        {"BOROUGH NAME": "BRONX",  "NEIGHBORHOOD": "BATHGATE", "SALE DATE": "15/01/2017", "SALE PRICE": "1500000",
         "RESIDENTIAL UNITS": 2, "COMMERCIAL UNITS": 1, "TOTAL UNITS": 3, "GROUP YEAR BUILT": "1900"},
        {"BOROUGH NAME": "QUEENS", "NEIGHBORHOOD": "ASTORIA",  "SALE DATE": "15/02/2017", "SALE PRICE": "2500",
         "RESIDENTIAL UNITS": 1, "COMMERCIAL UNITS": 0, "TOTAL UNITS": 1, "GROUP YEAR BUILT": "2000"}
    ]}"#;

    fn dashboard(spec: FilterSpec) -> Dashboard {
        let store = RecordStore::from_json(SALES, RowPolicy::Strict).unwrap();
        Dashboard::build(&spec.apply(store.records()))
    }

    /// Records which charts are alive
    #[derive(Default)]
    struct Canvas {
        live: Rc<RefCell<Vec<ChartTarget>>>,
    }

    struct LiveChart {
        target: ChartTarget,
        live: Rc<RefCell<Vec<ChartTarget>>>,
    }

    impl Drop for LiveChart {
        fn drop(&mut self) {
            self.live.borrow_mut().retain(|target| *target != self.target);
        }
    }

    impl ChartBackend for Canvas {
        type Handle = LiveChart;

        fn draw(&mut self, target: ChartTarget, _chart: &Chart) -> LiveChart {
            assert!(
                !self.live.borrow().contains(&target),
                "{target:?} was drawn before the previous chart was released",
            );
            self.live.borrow_mut().push(target);
            LiveChart {
                target,
                live: Rc::clone(&self.live),
            }
        }
    }

    #[test]
    fn builds_five_charts() {
        let charts = charts(&dashboard(FilterSpec::default()));

        let targets = charts.iter().map(|(target, _)| *target).collect::<Vec<_>>();
        assert_eq!(targets, vec![
            ChartTarget::TotalMonthlySales,
            ChartTarget::PropertyTypeSales,
            ChartTarget::UnitsByYearBuilt,
            ChartTarget::TopBuildingClassCategorySales,
            ChartTarget::TopNeighborhoodSales,
        ]);

        let (_, monthly) = &charts[0];
        assert_eq!(monthly.kind, ChartKind::Line);
        assert_eq!(monthly.datasets[0].color, SERIES_PALETTE[0]);
        assert_eq!(monthly.datasets[1].label, "QUEENS");
        assert_eq!(monthly.max_value(), 1_500_000.0);

        let (_, property) = &charts[1];
        assert!(property.stacked);
        assert_eq!(property.labels, vec!["BRONX", "QUEENS"]);
        assert_eq!(property.datasets[0].data, vec![2.0, 1.0]);
        assert_eq!(property.datasets[1].data, vec![1.0, 0.0]);

        let (_, neighborhoods) = &charts[4];
        assert_eq!(neighborhoods.kind, ChartKind::HorizontalBar);
        assert_eq!(neighborhoods.datasets[0].data, vec![1_500_000.0, 2_500.0]);
    }

    #[test]
    fn palette_cycles_for_many_boroughs() {
        let mut json = String::from(r#"{"Sheet1": ["#);
        for i in 0..7 {
            if i > 0 {
                json.push(',');
            }
            json.push_str(&format!(r#"{{"BOROUGH NAME": "B{i}", "SALE DATE": "01/01/2017"}}"#));
        }
        json.push_str("]}");
        let store = RecordStore::from_json(&json, RowPolicy::Strict).unwrap();
        let dashboard = Dashboard::build(&FilterSpec::default().apply(store.records()));

        let charts = charts(&dashboard);
        let colors = charts[0].1.datasets.iter().map(|dataset| dataset.color.as_str()).collect::<Vec<_>>();
        assert_eq!(colors[5], SERIES_PALETTE[0]);
        assert_eq!(colors[6], SERIES_PALETTE[1]);
    }

    #[test]
    fn tick_labels_are_abbreviated() {
        assert_eq!(Chart::tick_label(250_000.0), "250K");
        assert_eq!(Chart::tick_label(1_500_000.0), "1.5M");
        assert_eq!(Chart::tick_label(500.0), "500");
    }

    #[test]
    fn slot_releases_before_installing() {
        let mut slot = ChartSlot::default();
        let released = Rc::new(RefCell::new(Vec::new()));

        struct Handle(u8, Rc<RefCell<Vec<u8>>>);
        impl Drop for Handle {
            fn drop(&mut self) {
                self.1.borrow_mut().push(self.0);
            }
        }

        assert!(!slot.install(|| Handle(1, Rc::clone(&released))));
        assert!(slot.install(|| {
            assert_eq!(*released.borrow(), vec![1]);
            Handle(2, Rc::clone(&released))
        }));
        assert_eq!(slot.get().map(|handle| handle.0), Some(2));

        drop(slot.release());
        assert_eq!(*released.borrow(), vec![1, 2]);
        assert!(slot.get().is_none());
    }

    #[test]
    fn board_replaces_charts_on_every_render() {
        let canvas = Canvas::default();
        let live = Rc::clone(&canvas.live);
        let mut board = ChartBoard::new(canvas);

        assert_eq!(board.render(&dashboard(FilterSpec::default())), 0);
        assert_eq!(live.borrow().len(), 5);

        let filtered = FilterSpec::default().with_boroughs(["QUEENS"]);
        assert_eq!(board.render(&dashboard(filtered)), 5);
        assert_eq!(live.borrow().len(), 5);
        assert!(board.handle(ChartTarget::UnitsByYearBuilt).is_some());
    }

    #[test]
    fn spec_backend_keeps_the_latest_charts() {
        let mut board = ChartBoard::new(SpecBackend);
        board.render(&dashboard(FilterSpec::default()));
        board.render(&dashboard(FilterSpec::default().with_boroughs(["QUEENS"])));

        let monthly = board.handle(ChartTarget::TotalMonthlySales).unwrap();
        assert_eq!(monthly.datasets.len(), 1);
        assert_eq!(monthly.datasets[0].label, "QUEENS");
        assert_eq!(board.handles().count(), 5);
    }
}
