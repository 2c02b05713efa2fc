use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of POST /predict/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Ticker symbol as understood by the market-data provider (e.g. AAPL, RELIANCE.NS)
    pub ticker: String,

    /// First day of history to train on (YYYY-MM-DD)
    #[serde(alias = "start_date")]
    pub start: String,
}

impl ForecastRequest {
    pub fn new(ticker: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            start: start.into(),
        }
    }
}

/// One forecast day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Calendar day (YYYY-MM-DD on the wire)
    #[serde(with = "date_format")]
    pub date: NaiveDate,

    /// Predicted close in original price units
    pub price: f64,
}

mod date_format {
    use crate::constants::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
