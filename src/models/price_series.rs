use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date (exchange-local)
    pub date: NaiveDate,

    /// Closing price in the instrument's quote currency
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily closing prices for one ticker
///
/// Always date-ascending with no duplicate dates and only finite closes.
/// When the same date appears more than once the last row wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Self {
        let by_date: BTreeMap<NaiveDate, f64> = points
            .into_iter()
            .filter(|p| p.close.is_finite())
            .map(|p| (p.date, p.close))
            .collect();

        Self {
            ticker: ticker.into(),
            points: by_date
                .into_iter()
                .map(|(date, close)| PricePoint { date, close })
                .collect(),
        }
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            points: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint::new(date(3), 103.0),
                PricePoint::new(date(1), 101.0),
                PricePoint::new(date(2), 102.0),
                PricePoint::new(date(2), 102.5),
            ],
        );

        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![101.0, 102.5, 103.0]);
        assert_eq!(series.first_date(), Some(date(1)));
        assert_eq!(series.last_date(), Some(date(3)));
    }

    #[test]
    fn test_series_drops_non_finite_closes() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint::new(date(1), f64::NAN),
                PricePoint::new(date(2), 100.0),
                PricePoint::new(date(3), f64::INFINITY),
            ],
        );

        assert_eq!(series.closes(), vec![100.0]);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::empty("MSFT");
        assert!(series.is_empty());
        assert_eq!(series.ticker(), "MSFT");
        assert_eq!(series.last_date(), None);
    }
}
