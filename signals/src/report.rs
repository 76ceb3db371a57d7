use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::scoring::{round2, IntegrityScorer, MAX_INTEGRITY};
use crate::{Event, IntegrityScore, PriceSeries, Trade};

/// Coarse reading of an integrity value on the 0-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrityBand {
    High,
    Medium,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl IntegrityBand {
    pub fn from_value(value: f64) -> Self {
        if value >= 4.0 {
            IntegrityBand::High
        } else if value >= 3.0 {
            IntegrityBand::Medium
        } else if value >= 2.0 {
            IntegrityBand::Low
        } else {
            IntegrityBand::VeryLow
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, IntegrityBand::Low | IntegrityBand::VeryLow)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrityBand::High => "High",
            IntegrityBand::Medium => "Medium",
            IntegrityBand::Low => "Low",
            IntegrityBand::VeryLow => "Very Low",
        }
    }
}

impl fmt::Display for IntegrityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAssessment {
    pub trade: Trade,
    pub score: IntegrityScore,
    pub band: IntegrityBand,
}

/// All trades of one insider against one company's prices and events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderReport {
    pub insider: String,
    /// Mean of the per-trade values; 5.0 when there are no trades
    pub overall_integrity: f64,
    pub min_integrity: Option<f64>,
    pub band: IntegrityBand,
    pub flagged: usize,
    pub assessments: Vec<TradeAssessment>,
}

impl InsiderReport {
    pub fn build(
        scorer: &IntegrityScorer,
        insider: impl Into<String>,
        trades: &[Trade],
        prices: &PriceSeries,
        events: &[Event],
    ) -> Self {
        let insider = insider.into();
        let assessments: Vec<TradeAssessment> = trades
            .iter()
            .map(|trade| {
                let score = scorer.score(trade, prices, events);
                let band = IntegrityBand::from_value(score.value);
                TradeAssessment {
                    trade: trade.clone(),
                    score,
                    band,
                }
            })
            .collect();

        let overall_integrity = if assessments.is_empty() {
            MAX_INTEGRITY
        } else {
            round2(assessments.iter().map(|a| a.score.value).sum::<f64>() / assessments.len() as f64)
        };
        let min_integrity = assessments
            .iter()
            .map(|a| a.score.value)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))));
        let flagged = assessments.iter().filter(|a| a.band.is_flagged()).count();

        info!(
            "{}: {} trades, integrity {:.2}, {} flagged",
            insider,
            assessments.len(),
            overall_integrity,
            flagged
        );

        Self {
            insider,
            overall_integrity,
            min_integrity,
            band: IntegrityBand::from_value(overall_integrity),
            flagged,
            assessments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PricePoint, Sentiment, TradeType};
    use chrono::{Duration, NaiveDate};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn test_band_thresholds() {
        assert_eq!(IntegrityBand::from_value(5.0), IntegrityBand::High);
        assert_eq!(IntegrityBand::from_value(4.0), IntegrityBand::High);
        assert_eq!(IntegrityBand::from_value(3.99), IntegrityBand::Medium);
        assert_eq!(IntegrityBand::from_value(3.0), IntegrityBand::Medium);
        assert_eq!(IntegrityBand::from_value(2.0), IntegrityBand::Low);
        assert_eq!(IntegrityBand::from_value(1.99), IntegrityBand::VeryLow);
        assert!(IntegrityBand::Low.is_flagged());
        assert!(!IntegrityBand::Medium.is_flagged());
    }

    #[test]
    fn test_empty_report_is_clean() {
        let scorer = IntegrityScorer::with_default_config();
        let report = InsiderReport::build(&scorer, "J. Doe", &[], &PriceSeries::empty(), &[]);
        assert_eq!(report.overall_integrity, 5.0);
        assert_eq!(report.min_integrity, None);
        assert_eq!(report.flagged, 0);
        assert_eq!(report.band, IntegrityBand::High);
    }

    #[test]
    fn test_report_flags_suspicious_trade() {
        let prices = PriceSeries::new(
            (0..40)
                .map(|i| PricePoint::new(day(i), if i > 10 { 70.0 } else { 100.0 }))
                .collect(),
        )
        .unwrap();
        let events = vec![Event::new(day(10), Sentiment::Negative, 0.9).unwrap()];
        let trades = vec![
            Trade::new(TradeType::Sell, 50_000, day(8))
                .unwrap()
                .with_insider_holdings(Some(1_000_000.0))
                .unwrap(),
            Trade::new(TradeType::Buy, 10, day(30)).unwrap(),
        ];

        let scorer = IntegrityScorer::with_default_config();
        let report = InsiderReport::build(&scorer, "J. Doe", &trades, &prices, &events);

        assert_eq!(report.assessments.len(), 2);
        assert_eq!(report.flagged, 1);
        assert_eq!(report.assessments[0].band, IntegrityBand::VeryLow);
        assert_eq!(report.assessments[1].score.value, 5.0);
        assert_eq!(report.min_integrity, Some(report.assessments[0].score.value));
        let mean = (report.assessments[0].score.value + 5.0) / 2.0;
        assert!((report.overall_integrity - mean).abs() <= 0.005 + 1e-12);
    }

    #[test]
    fn test_band_serializes_with_space() {
        assert_eq!(serde_json::to_string(&IntegrityBand::VeryLow).unwrap(), "\"Very Low\"");
    }
}
