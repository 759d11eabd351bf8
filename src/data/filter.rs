use std::collections::BTreeSet;

use super::model::{Day, Sex, Smoker, Time, TipsDataset};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Derived views: what each chart is drawn from
// ---------------------------------------------------------------------------

/// A (total bill, tip) point for the scatter charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillTip {
    pub total_bill: f64,
    pub tip: f64,
}

/// A (party size, tip) pair for the size/tip bar chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeTip {
    pub size: u32,
    pub tip: f64,
}

/// Smoker / non-smoker counts for the split chart. Either count may be zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmokerSplit {
    pub smokers: usize,
    pub non_smokers: usize,
}

impl SmokerSplit {
    pub fn total(&self) -> usize {
        self.smokers + self.non_smokers
    }

    /// Fraction of smokers, `None` when nothing was counted.
    pub fn smoker_share(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.smokers as f64 / total as f64),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine operations (one per chart)
// ---------------------------------------------------------------------------

/// Bill/tip points of the records paid on one of `days`, in dataset order.
/// An empty selection yields no points.
pub fn scatter_by_day(dataset: &TipsDataset, days: &BTreeSet<Day>) -> Vec<BillTip> {
    dataset
        .iter()
        .filter(|r| days.contains(&r.day))
        .map(|r| BillTip {
            total_bill: r.total_bill,
            tip: r.tip,
        })
        .collect()
}

/// Count smokers and non-smokers among records served at one of `times`.
pub fn smoker_split_by_time(dataset: &TipsDataset, times: &BTreeSet<Time>) -> SmokerSplit {
    dataset
        .iter()
        .filter(|r| times.contains(&r.time))
        .fold(SmokerSplit::default(), |mut split, r| {
            match r.smoker {
                Smoker::Yes => split.smokers += 1,
                Smoker::No => split.non_smokers += 1,
            }
            split
        })
}

/// Size/tip pair of every record paid by `sex`, unaggregated.
pub fn tip_by_size_for_sex(dataset: &TipsDataset, sex: Sex) -> Vec<SizeTip> {
    dataset
        .iter()
        .filter(|r| r.sex == sex)
        .map(|r| SizeTip {
            size: r.size,
            tip: r.tip,
        })
        .collect()
}

/// Bill/tip points with `total_bill` in the closed range `[lo, hi]` and a
/// time in `times`.
///
/// Fails with [`DashboardError::InvalidRange`] when `lo > hi` or either bound
/// is NaN.
pub fn scatter_by_bill_range_and_time(
    dataset: &TipsDataset,
    lo: f64,
    hi: f64,
    times: &BTreeSet<Time>,
) -> Result<Vec<BillTip>> {
    if lo.is_nan() || hi.is_nan() || lo > hi {
        return Err(DashboardError::InvalidRange { lo, hi });
    }
    Ok(dataset
        .iter()
        .filter(|r| (lo..=hi).contains(&r.total_bill) && times.contains(&r.time))
        .map(|r| BillTip {
            total_bill: r.total_bill,
            tip: r.tip,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Filter selections
// ---------------------------------------------------------------------------

/// The user's selection for every chart.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    /// Days shown in the bill/tip scatter.
    pub days: BTreeSet<Day>,
    /// Services counted in the smoker split.
    pub split_times: BTreeSet<Time>,
    /// Payer shown in the size/tip bars.
    pub sex: Sex,
    /// Closed bill range of the filtered scatter.
    pub bill_range: (f64, f64),
    /// Services shown in the filtered scatter.
    pub range_times: BTreeSet<Time>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            days: Day::ALL.iter().copied().collect(),
            split_times: Time::ALL.iter().copied().collect(),
            sex: Sex::Female,
            bill_range: (0.0, 0.0),
            range_times: Time::ALL.iter().copied().collect(),
        }
    }
}

impl FilterState {
    /// Initial selections: everything selected, Female payers, and the full
    /// bill range of `dataset`.
    pub fn for_dataset(dataset: &TipsDataset) -> Self {
        Self {
            bill_range: dataset.bill_bounds().unwrap_or((0.0, 0.0)),
            ..Self::default()
        }
    }
}

/// Add `value` to `set` if absent, remove it otherwise.
pub fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TipRecord;

    fn record(
        total_bill: f64,
        tip: f64,
        day: Day,
        time: Time,
        sex: Sex,
        smoker: Smoker,
        size: u32,
    ) -> TipRecord {
        TipRecord {
            total_bill,
            tip,
            sex,
            smoker,
            day,
            time,
            size,
        }
    }

    fn bill_tip(total_bill: f64, tip: f64) -> BillTip {
        BillTip { total_bill, tip }
    }

    fn size_tip(size: u32, tip: f64) -> SizeTip {
        SizeTip { size, tip }
    }

    fn split(smokers: usize, non_smokers: usize) -> SmokerSplit {
        SmokerSplit {
            smokers,
            non_smokers,
        }
    }

    /// A small dataset touching every category.
    fn sample() -> TipsDataset {
        TipsDataset::from_records(vec![
            record(16.99, 1.01, Day::Sun, Time::Dinner, Sex::Female, Smoker::No, 2),
            record(10.34, 1.66, Day::Sun, Time::Dinner, Sex::Male, Smoker::No, 3),
            record(27.20, 4.00, Day::Thur, Time::Lunch, Sex::Male, Smoker::No, 4),
            record(15.69, 1.50, Day::Fri, Time::Lunch, Sex::Male, Smoker::Yes, 2),
            record(38.01, 3.00, Day::Sat, Time::Dinner, Sex::Male, Smoker::Yes, 4),
            record(8.77, 2.00, Day::Sat, Time::Dinner, Sex::Female, Smoker::No, 2),
            record(13.42, 1.68, Day::Thur, Time::Lunch, Sex::Female, Smoker::No, 2),
            record(40.17, 4.73, Day::Fri, Time::Dinner, Sex::Male, Smoker::Yes, 4),
        ])
    }

    fn set<T: Ord + Copy>(values: &[T]) -> BTreeSet<T> {
        values.iter().copied().collect()
    }

    #[test]
    fn scatter_by_day_keeps_order() {
        let ds = TipsDataset::from_records(vec![
            record(10.0, 2.0, Day::Sat, Time::Dinner, Sex::Male, Smoker::No, 2),
            record(20.0, 3.0, Day::Sun, Time::Dinner, Sex::Male, Smoker::No, 2),
            record(15.0, 1.0, Day::Sat, Time::Dinner, Sex::Male, Smoker::No, 2),
        ]);
        let points = scatter_by_day(&ds, &set(&[Day::Sat]));
        assert_eq!(points, vec![bill_tip(10.0, 2.0), bill_tip(15.0, 1.0)]);
    }

    #[test]
    fn scatter_by_day_only_returns_selected_days() {
        let ds = sample();
        let days = set(&[Day::Thur, Day::Fri]);
        let points = scatter_by_day(&ds, &days);
        let expected: Vec<BillTip> = ds
            .iter()
            .filter(|r| days.contains(&r.day))
            .map(|r| bill_tip(r.total_bill, r.tip))
            .collect();
        assert_eq!(points.len(), 4);
        assert_eq!(points, expected);
    }

    #[test]
    fn empty_day_selection_means_no_points() {
        assert!(scatter_by_day(&sample(), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn smoker_split_covers_everything_with_all_times() {
        let ds = sample();
        let counts = smoker_split_by_time(&ds, &set(Time::ALL));
        assert_eq!(counts.total(), ds.len());
        assert_eq!(counts, split(3, 5));
    }

    #[test]
    fn smoker_split_reports_zero_counts() {
        let ds = TipsDataset::from_records(vec![
            record(12.0, 2.0, Day::Thur, Time::Lunch, Sex::Female, Smoker::No, 2),
            record(14.0, 2.5, Day::Thur, Time::Lunch, Sex::Male, Smoker::No, 2),
        ]);
        let lunch = smoker_split_by_time(&ds, &set(&[Time::Lunch]));
        assert_eq!(lunch, split(0, 2));
        assert_eq!(lunch.smoker_share(), Some(0.0));

        let none = smoker_split_by_time(&ds, &set(&[Time::Dinner]));
        assert_eq!(none.total(), 0);
        assert_eq!(none.smoker_share(), None);
    }

    #[test]
    fn tip_by_size_partitions_by_sex() {
        let ds = sample();
        let male = tip_by_size_for_sex(&ds, Sex::Male);
        let female = tip_by_size_for_sex(&ds, Sex::Female);
        assert_eq!(male.len() + female.len(), ds.len());

        // Walking the dataset in order consumes both outputs exactly once.
        let mut male_iter = male.iter();
        let mut female_iter = female.iter();
        for r in &ds {
            let next = match r.sex {
                Sex::Male => male_iter.next(),
                Sex::Female => female_iter.next(),
            };
            assert_eq!(next, Some(&size_tip(r.size, r.tip)));
        }
        assert_eq!(male_iter.next(), None);
        assert_eq!(female_iter.next(), None);

        assert_eq!(
            female,
            vec![size_tip(2, 1.01), size_tip(2, 2.00), size_tip(2, 1.68)]
        );
    }

    #[test]
    fn bill_range_is_closed() {
        let ds = sample();
        let points = scatter_by_bill_range_and_time(&ds, 10.34, 27.20, &set(Time::ALL)).unwrap();
        assert!(points.iter().all(|p| (10.34..=27.20).contains(&p.total_bill)));
        assert_eq!(points.len(), 5);
        assert!(points.iter().any(|p| p.total_bill == 10.34));
        assert!(points.iter().any(|p| p.total_bill == 27.20));
    }

    #[test]
    fn bill_range_combines_with_time() {
        let ds = sample();
        let lunch = set(&[Time::Lunch]);
        let points = scatter_by_bill_range_and_time(&ds, 0.0, 100.0, &lunch).unwrap();
        assert_eq!(points.len(), 3);

        let none = scatter_by_bill_range_and_time(&ds, 0.0, 100.0, &BTreeSet::new()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn degenerate_range_is_allowed() {
        let ds = sample();
        let points = scatter_by_bill_range_and_time(&ds, 8.77, 8.77, &set(Time::ALL)).unwrap();
        assert_eq!(points, vec![bill_tip(8.77, 2.0)]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let ds = sample();
        let all = set(Time::ALL);

        let err = scatter_by_bill_range_and_time(&ds, 30.0, 10.0, &all).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::InvalidRange { lo, hi } if lo == 30.0 && hi == 10.0
        ));

        let err = scatter_by_bill_range_and_time(&ds, f64::NAN, 10.0, &all).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
    }

    #[test]
    fn operations_are_idempotent() {
        let ds = sample();
        let days = set(&[Day::Sat, Day::Sun]);
        let times = set(&[Time::Dinner]);
        assert_eq!(scatter_by_day(&ds, &days), scatter_by_day(&ds, &days));
        assert_eq!(
            smoker_split_by_time(&ds, &times),
            smoker_split_by_time(&ds, &times)
        );
        assert_eq!(
            tip_by_size_for_sex(&ds, Sex::Male),
            tip_by_size_for_sex(&ds, Sex::Male)
        );
        assert_eq!(
            scatter_by_bill_range_and_time(&ds, 5.0, 20.0, &times).unwrap(),
            scatter_by_bill_range_and_time(&ds, 5.0, 20.0, &times).unwrap()
        );
        assert_eq!(ds, sample());
    }

    #[test]
    fn filter_state_defaults_follow_dataset() {
        let filters = FilterState::for_dataset(&sample());
        assert_eq!(filters.days.len(), 4);
        assert_eq!(filters.split_times.len(), 2);
        assert_eq!(filters.range_times.len(), 2);
        assert_eq!(filters.sex, Sex::Female);
        assert_eq!(filters.bill_range, (8.77, 40.17));
    }

    #[test]
    fn toggle_flips_membership() {
        let mut days = set(&[Day::Sat]);
        toggle(&mut days, Day::Sat);
        assert!(days.is_empty());
        toggle(&mut days, Day::Sun);
        assert_eq!(days, set(&[Day::Sun]));
    }
}
