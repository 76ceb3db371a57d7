pub mod event_study;
pub mod report;
pub mod scoring;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use event_study::{EventStudy, EventStudyConfig};
pub use report::{IntegrityBand, InsiderReport, TradeAssessment};
pub use scoring::{integrity_score, IntegrityScorer, ScoreWeights, ScoringConfig};

pub type Result<T> = std::result::Result<T, SignalsError>;

#[derive(Error, Debug)]
pub enum SignalsError {
    #[error("Invalid signal data: {0}")]
    InvalidData(String),

    #[error("Invalid scoring configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    #[serde(alias = "Buy", alias = "BUY", alias = "P")]
    Buy,
    #[serde(alias = "Sell", alias = "SELL", alias = "S")]
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected direction of the price reaction to a disclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// +1 positive, -1 negative, 0 neutral.
    pub fn polarity(&self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Negative => -1.0,
            Sentiment::Neutral => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl FromStr for Sentiment {
    type Err = SignalsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(SignalsError::InvalidData(format!("Unknown sentiment: {}", other))),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed insider transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TradeRecord")]
pub struct Trade {
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub shares: u64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insider_holdings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_outstanding: Option<f64>,
}

#[derive(Deserialize)]
struct TradeRecord {
    #[serde(rename = "type")]
    trade_type: TradeType,
    shares: u64,
    date: NaiveDate,
    #[serde(default)]
    insider_holdings: Option<f64>,
    #[serde(default)]
    total_outstanding: Option<f64>,
}

impl TryFrom<TradeRecord> for Trade {
    type Error = SignalsError;

    fn try_from(record: TradeRecord) -> Result<Self> {
        Trade::new(record.trade_type, record.shares, record.date)?
            .with_insider_holdings(record.insider_holdings)?
            .with_total_outstanding(record.total_outstanding)
    }
}

impl Trade {
    pub fn new(trade_type: TradeType, shares: u64, date: NaiveDate) -> Result<Self> {
        if shares == 0 {
            return Err(SignalsError::InvalidData("Trade must move at least one share".to_string()));
        }
        Ok(Self {
            trade_type,
            shares,
            date,
            insider_holdings: None,
            total_outstanding: None,
        })
    }

    /// Zero or negative holdings are kept as unknown so sizing falls through to outstanding.
    pub fn with_insider_holdings(mut self, holdings: Option<f64>) -> Result<Self> {
        self.insider_holdings = positive_or_none("insider_holdings", holdings)?;
        Ok(self)
    }

    pub fn with_total_outstanding(mut self, outstanding: Option<f64>) -> Result<Self> {
        self.total_outstanding = positive_or_none("total_outstanding", outstanding)?;
        Ok(self)
    }
}

fn positive_or_none(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(SignalsError::InvalidData(format!(
            "{} must be a finite number, got {}",
            field, v
        ))),
        Some(v) if v <= 0.0 => Ok(None),
        other => Ok(other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(alias = "Date")]
    pub date: NaiveDate,
    #[serde(alias = "Close")]
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily closes, strictly ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        for point in &points {
            if !(point.close.is_finite() && point.close > 0.0) {
                return Err(SignalsError::InvalidData(format!(
                    "Close on {} must be a positive number, got {}",
                    point.date, point.close
                )));
            }
        }
        if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(SignalsError::InvalidData(format!(
                "Prices must be strictly ascending by date ({} is followed by {})",
                pair[0].date, pair[1].date
            )));
        }
        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
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

    /// Index of the exact date, if the series has a close for it.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&date, |p| p.date).ok()
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = SignalsError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self> {
        PriceSeries::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

/// A dated disclosure with its expected price direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct Event {
    pub date: NaiveDate,
    pub sentiment: Sentiment,
    pub confidence: f64,
}

#[derive(Deserialize)]
struct EventRecord {
    date: NaiveDate,
    sentiment: Sentiment,
    confidence: f64,
}

impl TryFrom<EventRecord> for Event {
    type Error = SignalsError;

    fn try_from(record: EventRecord) -> Result<Self> {
        Event::new(record.date, record.sentiment, record.confidence)
    }
}

impl Event {
    pub fn new(date: NaiveDate, sentiment: Sentiment, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SignalsError::InvalidData(format!(
                "Event confidence must lie in [0, 1], got {}",
                confidence
            )));
        }
        Ok(Self {
            date,
            sentiment,
            confidence,
        })
    }
}

/// The four sub-scores and the fused risk they produce.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub risk: f64,
    #[serde(rename = "T")]
    pub time: f64,
    #[serde(rename = "S")]
    pub sentiment: f64,
    #[serde(rename = "P")]
    pub price: f64,
    #[serde(rename = "Q")]
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityScore {
    /// 0.0 to 5.0, higher is cleaner.
    pub value: f64,
    pub breakdown: ScoreBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_event: Option<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_trade_validation() {
        assert!(Trade::new(TradeType::Sell, 0, day(1)).is_err());
        let trade = Trade::new(TradeType::Sell, 500, day(1)).unwrap();
        assert!(trade.clone().with_insider_holdings(Some(-3.0)).is_err());
        assert!(trade.with_insider_holdings(Some(1_000.0)).is_ok());
    }

    #[test]
    fn test_trade_json() {
        let trade: Trade = serde_json::from_str(
            r#"{"type": "sell", "shares": 1200, "date": "2024-03-04", "insider_holdings": 50000}"#,
        )
        .unwrap();
        assert_eq!(trade.trade_type, TradeType::Sell);
        assert_eq!(trade.insider_holdings, Some(50_000.0));
        assert_eq!(trade.total_outstanding, None);

        let zero = serde_json::from_str::<Trade>(r#"{"type": "buy", "shares": 0, "date": "2024-03-04"}"#);
        assert!(zero.is_err());

        // an insider who sold out reports zero holdings; sizing uses outstanding instead
        let sold_out: Trade = serde_json::from_str(
            r#"{"type": "sell", "shares": 5050, "date": "2024-03-04",
                "insider_holdings": 0, "total_outstanding": 1000000}"#,
        )
        .unwrap();
        assert_eq!(sold_out.insider_holdings, None);
        assert_eq!(sold_out.total_outstanding, Some(1_000_000.0));
        let study = crate::event_study::EventStudy::with_default_config();
        let q = study.trade_size_score(sold_out.shares, sold_out.insider_holdings, sold_out.total_outstanding);
        assert!((q - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_trade_rejects_non_finite_holdings() {
        let trade = Trade::new(TradeType::Buy, 10, day(1)).unwrap();
        assert!(trade.clone().with_insider_holdings(Some(f64::NAN)).is_err());
        assert!(trade.with_total_outstanding(Some(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_price_series_validation() {
        assert!(PriceSeries::new(vec![PricePoint::new(day(2), 10.0), PricePoint::new(day(1), 10.0)]).is_err());
        assert!(PriceSeries::new(vec![PricePoint::new(day(1), 10.0), PricePoint::new(day(1), 11.0)]).is_err());
        assert!(PriceSeries::new(vec![PricePoint::new(day(1), 0.0)]).is_err());

        let series = PriceSeries::new(vec![
            PricePoint::new(day(1), 10.0),
            PricePoint::new(day(4), 11.0),
            PricePoint::new(day(5), 12.0),
        ])
        .unwrap();
        assert_eq!(series.index_of(day(4)), Some(1));
        assert_eq!(series.index_of(day(3)), None);
    }

    #[test]
    fn test_price_series_accepts_capitalised_fields() {
        let series: PriceSeries = serde_json::from_str(
            r#"[{"Date": "2024-03-01", "Close": 10.5}, {"date": "2024-03-04", "close": 10.7}]"#,
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.5, 10.7]);
    }

    #[test]
    fn test_event_confidence_bounds() {
        assert!(Event::new(day(1), Sentiment::Negative, 1.2).is_err());
        assert!(Event::new(day(1), Sentiment::Negative, f64::NAN).is_err());
        assert!(Event::new(day(1), Sentiment::Negative, 0.0).is_ok());
    }

    #[test]
    fn test_sentiment_polarity() {
        assert_eq!(Sentiment::Positive.polarity(), 1.0);
        assert_eq!(Sentiment::Negative.polarity(), -1.0);
        assert_eq!(Sentiment::Neutral.polarity(), 0.0);
        assert_eq!("Negative".parse::<Sentiment>().unwrap(), Sentiment::Negative);
    }
}
