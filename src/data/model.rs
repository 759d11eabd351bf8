use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Categorical columns
// ---------------------------------------------------------------------------

/// A label that does not belong to the categorical column it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {column} label")]
pub struct UnknownLabel {
    pub column: &'static str,
    pub value: String,
}

/// Generates a fieldless enum for one categorical column of the dataset,
/// together with its label table, `Display` and `FromStr`.
///
/// Variant order is the natural display order (Thur before Fri, ...), which
/// is also the `Ord` used by the `BTreeSet` selections in the filter layer.
macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident, $column:literal, [$($variant:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value of this column, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Column name in the source dataset.
            pub const COLUMN: &'static str = $column;

            /// Label as it appears in the source dataset.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == trimmed)
                    .ok_or_else(|| UnknownLabel {
                        column: $column,
                        value: s.to_string(),
                    })
            }
        }
    };
}

categorical!(
    /// Sex of the bill payer.
    Sex, "sex", [Male, Female]
);

categorical!(
    /// Whether the party had smokers.
    Smoker, "smoker", [Yes, No]
);

categorical!(
    /// Day of the week the bill was paid (the dataset covers Thursday to Sunday).
    Day, "day", [Thur, Fri, Sat, Sun]
);

categorical!(
    /// Meal service.
    Time, "time", [Lunch, Dinner]
);

// ---------------------------------------------------------------------------
// TipRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// One cleaned row of the tips dataset.
///
/// Invariants (held by the loader's cleaning pass): `total_bill` and `tip`
/// are finite and non-negative, `size` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TipRecord {
    pub total_bill: f64,
    pub tip: f64,
    pub sex: Sex,
    pub smoker: Smoker,
    pub day: Day,
    pub time: Time,
    pub size: u32,
}

// ---------------------------------------------------------------------------
// TipsDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The cleaned dataset. Immutable once built; share it by reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipsDataset {
    records: Vec<TipRecord>,
}

impl TipsDataset {
    pub fn from_records(records: Vec<TipRecord>) -> Self {
        TipsDataset { records }
    }

    /// All records in source order.
    pub fn records(&self) -> &[TipRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TipRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Smallest and largest `total_bill`, or `None` for an empty dataset.
    pub fn bill_bounds(&self) -> Option<(f64, f64)> {
        self.records.iter().fold(None, |acc, r| match acc {
            None => Some((r.total_bill, r.total_bill)),
            Some((lo, hi)) => Some((lo.min(r.total_bill), hi.max(r.total_bill))),
        })
    }
}

impl<'a> IntoIterator for &'a TipsDataset {
    type Item = &'a TipRecord;
    type IntoIter = std::slice::Iter<'a, TipRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(total_bill: f64, day: Day) -> TipRecord {
        TipRecord {
            total_bill,
            tip: 1.0,
            sex: Sex::Female,
            smoker: Smoker::No,
            day,
            time: Time::Dinner,
            size: 2,
        }
    }

    #[test]
    fn labels_parse_and_display() {
        assert_eq!("Thur".parse::<Day>().unwrap(), Day::Thur);
        assert_eq!(" Dinner ".parse::<Time>().unwrap(), Time::Dinner);
        assert_eq!(Smoker::Yes.to_string(), "Yes");
        assert_eq!(Sex::ALL, &[Sex::Male, Sex::Female]);
    }

    #[test]
    fn labels_are_case_sensitive() {
        let err = "thur".parse::<Day>().unwrap_err();
        assert_eq!(err.column, "day");
        assert_eq!(err.value, "thur");
        assert!("Wed".parse::<Day>().is_err());
    }

    #[test]
    fn days_order_by_week() {
        let mut days = vec![Day::Sun, Day::Thur, Day::Sat, Day::Fri];
        days.sort();
        assert_eq!(days, Day::ALL);
    }

    #[test]
    fn bill_bounds_span_all_records() {
        let ds = TipsDataset::from_records(vec![
            record(20.5, Day::Sat),
            record(3.07, Day::Sun),
            record(50.81, Day::Fri),
        ]);
        assert_eq!(ds.bill_bounds(), Some((3.07, 50.81)));
        assert_eq!(TipsDataset::default().bill_bounds(), None);
    }
}
