use std::path::Path;

use crate::data::filter::{
    scatter_by_bill_range_and_time, scatter_by_day, smoker_split_by_time, tip_by_size_for_sex,
    toggle, BillTip, FilterState, SizeTip, SmokerSplit,
};
use crate::data::loader::{fetch_url_with_report, load_file_with_report, LoadReport};
use crate::data::model::{Day, Sex, Time, TipsDataset};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Chart views
// ---------------------------------------------------------------------------

/// The derived data each chart is currently drawn from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartViews {
    pub day_scatter: Vec<BillTip>,
    pub smoker_split: SmokerSplit,
    pub size_tips: Vec<SizeTip>,
    pub range_scatter: Vec<BillTip>,
    /// Validation message replacing the filtered scatter when the range is invalid.
    pub range_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<TipsDataset>,

    /// Where the dataset came from (file path or URL).
    pub source: Option<String>,

    /// Cleaning report of the last successful load.
    pub report: Option<LoadReport>,

    /// Per-chart filter selections.
    pub filters: FilterState,

    /// Derived views for the current filters (cached).
    pub views: ChartViews,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Load `path`, replacing the current dataset on success.
    ///
    /// On failure the previous dataset stays in place; the error is logged
    /// and returned for the caller to report.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let origin = path.display().to_string();
        self.ingest(load_file_with_report(path), origin)
    }

    /// Fetch a tips CSV from `url`, replacing the current dataset on success.
    pub fn load_url(&mut self, url: &str) -> Result<()> {
        self.ingest(fetch_url_with_report(url), url.to_string())
    }

    fn ingest(
        &mut self,
        loaded: Result<(TipsDataset, LoadReport)>,
        origin: String,
    ) -> Result<()> {
        match loaded {
            Ok((dataset, report)) => {
                self.set_dataset(dataset, report, origin);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {origin}: {e}");
                Err(e)
            }
        }
    }

    /// Ingest a newly loaded dataset, reset filters and recompute every chart.
    pub fn set_dataset(&mut self, dataset: TipsDataset, report: LoadReport, source: String) {
        self.filters = FilterState::for_dataset(&dataset);
        self.dataset = Some(dataset);
        self.report = Some(report);
        self.source = Some(source);
        self.status_message = None;
        self.refresh_all();
    }

    /// Recompute all four views.
    pub fn refresh_all(&mut self) {
        self.refresh_day_scatter();
        self.refresh_smoker_split();
        self.refresh_size_tips();
        self.refresh_range_scatter();
    }

    fn refresh_day_scatter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.views.day_scatter = scatter_by_day(ds, &self.filters.days);
        }
    }

    fn refresh_smoker_split(&mut self) {
        if let Some(ds) = &self.dataset {
            self.views.smoker_split = smoker_split_by_time(ds, &self.filters.split_times);
        }
    }

    fn refresh_size_tips(&mut self) {
        if let Some(ds) = &self.dataset {
            self.views.size_tips = tip_by_size_for_sex(ds, self.filters.sex);
        }
    }

    fn refresh_range_scatter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let (lo, hi) = self.filters.bill_range;
        match scatter_by_bill_range_and_time(ds, lo, hi, &self.filters.range_times) {
            Ok(points) => {
                self.views.range_scatter = points;
                self.views.range_error = None;
            }
            Err(e) => {
                log::warn!("{e}");
                self.views.range_scatter.clear();
                self.views.range_error = Some(e.to_string());
            }
        }
    }

    /// Toggle a day in the bill/tip scatter filter.
    pub fn toggle_day(&mut self, day: Day) {
        toggle(&mut self.filters.days, day);
        self.refresh_day_scatter();
    }

    /// Toggle a service in the smoker split filter.
    pub fn toggle_split_time(&mut self, time: Time) {
        toggle(&mut self.filters.split_times, time);
        self.refresh_smoker_split();
    }

    pub fn set_sex(&mut self, sex: Sex) {
        self.filters.sex = sex;
        self.refresh_size_tips();
    }

    pub fn set_bill_low(&mut self, lo: f64) {
        self.filters.bill_range.0 = lo;
        self.refresh_range_scatter();
    }

    pub fn set_bill_high(&mut self, hi: f64) {
        self.filters.bill_range.1 = hi;
        self.refresh_range_scatter();
    }

    /// Toggle a service in the filtered scatter.
    pub fn toggle_range_time(&mut self, time: Time) {
        toggle(&mut self.filters.range_times, time);
        self.refresh_range_scatter();
    }
}
