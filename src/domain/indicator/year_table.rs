//! Per-calendar-year grouping of a symbol's bars.
//!
//! Built once per symbol so the indicator never has to re-filter the series
//! for each year it looks up.

use crate::domain::price_bar::PriceBar;
use std::collections::BTreeMap;

/// High/low extent of one calendar year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlyRange {
    pub high: f64,
    pub low: f64,
}

impl YearlyRange {
    pub fn span(&self) -> f64 {
        self.high - self.low
    }
}

/// What the indicator needs to know about one year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSummary {
    pub bar_count: usize,
    /// Open of the year's first bar; `None` when that bar has no open.
    pub open: Option<f64>,
    /// Highest high over the year's bars that carry one.
    pub high: Option<f64>,
    /// Lowest low over the year's bars that carry one.
    pub low: Option<f64>,
}

impl YearSummary {
    fn starting_with(bar: &PriceBar) -> Self {
        Self {
            bar_count: 0,
            open: bar.open.filter(|o| o.is_finite()),
            high: None,
            low: None,
        }
    }

    /// `None` when the year has no high or no low at all.
    pub fn range(&self) -> Option<YearlyRange> {
        Some(YearlyRange {
            high: self.high?,
            low: self.low?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct YearTable {
    years: BTreeMap<i32, YearSummary>,
}

impl YearTable {
    /// Groups `bars` by calendar year. Bars are expected in ascending date
    /// order; only the first bar in a year supplies its open. Highs and lows
    /// are folded independently, skipping bars that lack one.
    pub fn build(bars: &[PriceBar]) -> Self {
        let mut years: BTreeMap<i32, YearSummary> = BTreeMap::new();

        for bar in bars {
            let entry = years
                .entry(bar.year())
                .or_insert_with(|| YearSummary::starting_with(bar));
            entry.bar_count += 1;

            if let Some(high) = bar.high.filter(|h| h.is_finite()) {
                entry.high = Some(entry.high.map_or(high, |h| h.max(high)));
            }
            if let Some(low) = bar.low.filter(|l| l.is_finite()) {
                entry.low = Some(entry.low.map_or(low, |l| l.min(low)));
            }
        }

        Self { years }
    }

    pub fn get(&self, year: i32) -> Option<&YearSummary> {
        self.years.get(&year)
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.keys().next().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// PROFITHIGH1 for `year`: the year's open plus `multiplier` times the
    /// previous calendar year's range.
    ///
    /// `None` for the first year in the table, when the previous year has no
    /// usable range (gap year), or when `year` has no open.
    pub fn profit_high1(&self, year: i32, multiplier: f64) -> Option<f64> {
        if Some(year) == self.first_year() {
            return None;
        }
        let open = self.get(year)?.open?;
        let prev = self.get(year - 1)?.range()?;
        Some(open + multiplier * prev.span())
    }

    /// PROFITHIGH1 for every year in the table.
    pub fn levels(&self, multiplier: f64) -> BTreeMap<i32, Option<f64>> {
        self.years()
            .map(|year| (year, self.profit_high1(year, multiplier)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(date: &str, open: f64, high: Option<f64>, low: Option<f64>) -> PriceBar {
        PriceBar {
            symbol: "TEST".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: Some(open),
            high,
            low,
            close: open,
        }
    }

    #[test]
    fn groups_by_calendar_year() {
        let bars = vec![
            bar("2022-12-26", 10.0, Some(12.0), Some(9.0)),
            bar("2023-01-02", 11.0, Some(15.0), Some(10.0)),
            bar("2023-01-09", 14.0, Some(20.0), Some(8.0)),
        ];
        let table = YearTable::build(&bars);

        assert_eq!(table.first_year(), Some(2022));
        assert_eq!(table.years().collect::<Vec<_>>(), vec![2022, 2023]);

        let y2023 = table.get(2023).unwrap();
        assert_eq!(y2023.bar_count, 2);
        assert_eq!(y2023.open, Some(11.0));
        assert_eq!(
            y2023.range(),
            Some(YearlyRange {
                high: 20.0,
                low: 8.0
            })
        );
    }

    #[test]
    fn high_and_low_fold_independently() {
        let bars = vec![
            bar("2023-01-02", 11.0, None, Some(1.0)),
            bar("2023-01-09", 14.0, Some(20.0), Some(8.0)),
            bar("2023-01-16", 15.0, Some(25.0), None),
            bar("2023-01-23", 15.0, Some(f64::NAN), Some(f64::NAN)),
        ];
        let table = YearTable::build(&bars);
        assert_eq!(
            table.get(2023).unwrap().range(),
            Some(YearlyRange {
                high: 25.0,
                low: 1.0
            })
        );
    }

    #[test]
    fn split_high_low_bars_still_form_a_range() {
        let bars = vec![
            bar("2022-03-07", 90.0, Some(120.0), None),
            bar("2022-09-05", 95.0, None, Some(80.0)),
            bar("2023-01-02", 100.0, None, None),
        ];
        let table = YearTable::build(&bars);
        let level = table.profit_high1(2023, 0.792).unwrap();
        assert!((level - 131.68).abs() < 1e-9);
    }

    #[test]
    fn year_without_any_high_low_has_no_range() {
        let bars = vec![
            bar("2022-03-07", 11.0, None, None),
            bar("2023-01-02", 14.0, Some(20.0), Some(8.0)),
        ];
        let table = YearTable::build(&bars);
        assert_eq!(table.get(2022).unwrap().range(), None);
        assert_eq!(table.profit_high1(2023, 0.792), None);
    }

    #[test]
    fn missing_first_open_leaves_year_without_level() {
        let mut first = bar("2023-01-02", 0.0, Some(20.0), Some(8.0));
        first.open = None;
        let bars = vec![
            bar("2022-06-06", 90.0, Some(120.0), Some(80.0)),
            first,
            bar("2023-01-09", 14.0, Some(20.0), Some(8.0)),
        ];
        let table = YearTable::build(&bars);
        assert_eq!(table.get(2023).unwrap().open, None);
        assert_eq!(table.profit_high1(2023, 0.792), None);
    }

    #[test]
    fn first_year_has_no_level() {
        let bars = vec![bar("2023-01-02", 100.0, Some(120.0), Some(80.0))];
        let table = YearTable::build(&bars);
        assert_eq!(table.profit_high1(2023, 0.792), None);
    }

    #[test]
    fn level_uses_previous_year_range() {
        let bars = vec![
            bar("2022-06-06", 90.0, Some(120.0), Some(85.0)),
            bar("2022-09-05", 95.0, Some(110.0), Some(80.0)),
            bar("2023-01-02", 100.0, Some(500.0), Some(1.0)),
        ];
        let table = YearTable::build(&bars);
        let level = table.profit_high1(2023, 0.792).unwrap();
        assert!((level - 131.68).abs() < 1e-9);
    }

    #[test]
    fn empty_table() {
        let table = YearTable::build(&[]);
        assert!(table.is_empty());
        assert_eq!(table.first_year(), None);
        assert!(table.levels(0.792).is_empty());
    }
}
