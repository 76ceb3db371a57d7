use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event_study::{EventStudy, EventStudyConfig};
use crate::{Event, IntegrityScore, PriceSeries, Result, ScoreBreakdown, SignalsError, Trade};

/// Highest integrity value; a trade with zero risk scores this.
pub const MAX_INTEGRITY: f64 = 5.0;

/// Linear weights of the four sub-scores in the fused risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub time: f64,
    pub sentiment: f64,
    pub price: f64,
    pub size: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            time: 0.30,
            sentiment: 0.30,
            price: 0.25,
            size: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Events strictly after the trade and at most this many days later are candidates
    pub event_window_days: i64,
    pub weights: ScoreWeights,
    pub event_study: EventStudyConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            event_window_days: 30,
            weights: ScoreWeights::default(),
            event_study: EventStudyConfig::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.event_window_days <= 0 {
            return Err(SignalsError::InvalidConfig("event_window_days must be positive".into()));
        }
        let ScoreWeights { time, sentiment, price, size } = self.weights;
        if [time, sentiment, price, size].iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SignalsError::InvalidConfig("Score weights must be finite and non-negative".into()));
        }
        self.event_study.validate()
    }
}

/// Fuses timing, sentiment, price reaction and size into one integrity score per trade.
#[derive(Debug, Clone, Default)]
pub struct IntegrityScorer {
    config: ScoringConfig,
    study: EventStudy,
}

impl IntegrityScorer {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        let study = EventStudy::new(config.event_study.clone());
        Ok(Self { config, study })
    }

    pub fn with_default_config() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn event_study(&self) -> &EventStudy {
        &self.study
    }

    /// Nearest event strictly after the trade and within the window. Earlier list entries
    /// win ties.
    pub fn nearest_event<'a>(&self, trade: &Trade, events: &'a [Event]) -> Option<&'a Event> {
        events
            .iter()
            .map(|event| ((event.date - trade.date).num_days(), event))
            .filter(|(delta, _)| *delta > 0 && *delta <= self.config.event_window_days)
            .min_by_key(|(delta, _)| *delta)
            .map(|(_, event)| event)
    }

    pub fn score(&self, trade: &Trade, prices: &PriceSeries, events: &[Event]) -> IntegrityScore {
        let matched_event = self.nearest_event(trade, events).copied();

        let (time, sentiment, price) = match &matched_event {
            None => (0.0, 0.0, 0.0),
            Some(event) => {
                let time = self.study.time_score(trade.date, event.date);
                let sentiment = self
                    .study
                    .sentiment_match_score(trade.trade_type, event.sentiment, event.confidence);
                let price = match prices.index_of(event.date) {
                    Some(index) => {
                        let car = self.study.compute_car(prices, index);
                        self.study.price_movement_score(car, Some(event.sentiment))
                    }
                    None => {
                        debug!("No close on event date {}; price score is 0", event.date);
                        0.0
                    }
                };
                (time, sentiment, price)
            }
        };

        let size = self
            .study
            .trade_size_score(trade.shares, trade.insider_holdings, trade.total_outstanding);

        let (value, breakdown) = self.combine(time, sentiment, price, size);
        debug!(
            "Scored {} of {} shares on {}: integrity {:.2} (T={:.3} S={:.3} P={:.3} Q={:.3})",
            trade.trade_type, trade.shares, trade.date, value, time, sentiment, price, size
        );

        IntegrityScore {
            value,
            breakdown,
            matched_event,
        }
    }

    /// Weighted sum clamped to [0, 1], mapped to a 0-5 integrity rounded to two decimals.
    pub fn combine(&self, time: f64, sentiment: f64, price: f64, size: f64) -> (f64, ScoreBreakdown) {
        let w = &self.config.weights;
        let risk = (w.time * time + w.sentiment * sentiment + w.price * price + w.size * size)
            .clamp(0.0, 1.0);
        let value = round2(MAX_INTEGRITY * (1.0 - risk));

        let breakdown = ScoreBreakdown {
            risk,
            time,
            sentiment,
            price,
            size,
        };
        (value, breakdown)
    }
}

/// Scores one trade with the default configuration.
pub fn integrity_score(trade: &Trade, prices: &PriceSeries, events: &[Event]) -> IntegrityScore {
    IntegrityScorer::with_default_config().score(trade, prices, events)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PricePoint, Sentiment, TradeType};
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap() + Duration::days(offset)
    }

    fn prices_with_drop(len: usize, drop_at: usize) -> PriceSeries {
        let points = (0..len)
            .map(|i| {
                let close = if i > drop_at { 80.0 } else { 100.0 };
                PricePoint::new(day(i as i64), close)
            })
            .collect();
        PriceSeries::new(points).unwrap()
    }

    fn sell(shares: u64, on: i64) -> Trade {
        Trade::new(TradeType::Sell, shares, day(on))
            .unwrap()
            .with_insider_holdings(Some(1_000_000.0))
            .unwrap()
    }

    #[test]
    fn test_no_event_in_window_scores_size_only() {
        let trade = sell(100, 0);
        let events = vec![
            Event::new(day(45), Sentiment::Negative, 0.9).unwrap(),
            Event::new(day(0), Sentiment::Negative, 0.9).unwrap(),
            Event::new(day(-3), Sentiment::Negative, 0.9).unwrap(),
        ];
        let score = integrity_score(&trade, &PriceSeries::empty(), &events);
        assert_eq!(score.value, 5.0);
        assert_eq!(score.breakdown.time, 0.0);
        assert_eq!(score.breakdown.sentiment, 0.0);
        assert_eq!(score.breakdown.price, 0.0);
        assert_eq!(score.breakdown.risk, 0.0);
        assert!(score.matched_event.is_none());
    }

    #[test]
    fn test_no_event_with_large_trade() {
        let trade = sell(20_000, 0);
        let score = integrity_score(&trade, &PriceSeries::empty(), &[]);
        assert_relative_eq!(score.breakdown.risk, 0.15);
        assert_eq!(score.value, 4.25);
    }

    #[test]
    fn test_nearest_event_is_chosen() {
        let trade = sell(100, 0);
        let events = vec![
            Event::new(day(20), Sentiment::Positive, 0.9).unwrap(),
            Event::new(day(4), Sentiment::Negative, 0.6).unwrap(),
            Event::new(day(4), Sentiment::Positive, 0.6).unwrap(),
            Event::new(day(10), Sentiment::Negative, 0.9).unwrap(),
        ];
        let scorer = IntegrityScorer::with_default_config();
        let chosen = scorer.nearest_event(&trade, &events).unwrap();
        assert_eq!(chosen.date, day(4));
        assert_eq!(chosen.sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_well_timed_sale_before_bad_news() {
        let trade = sell(20_000, 0);
        let event = Event::new(day(20), Sentiment::Negative, 0.9).unwrap();
        let prices = prices_with_drop(40, 20);

        let score = integrity_score(&trade, &prices, &[event]);
        let b = score.breakdown;
        assert_relative_eq!(b.time, (-20.0_f64 / 7.0).exp());
        assert_relative_eq!(b.sentiment, 0.9);
        assert_eq!(b.price, 1.0);
        assert_eq!(b.size, 1.0);

        let risk = 0.30 * b.time + 0.30 * 0.9 + 0.25 + 0.15;
        assert_relative_eq!(b.risk, risk, epsilon = 1e-12);
        assert_eq!(score.value, round2(5.0 * (1.0 - risk)));
        assert!(score.value < 2.0);
    }

    #[test]
    fn test_missing_event_price_scores_zero() {
        let trade = sell(20_000, 0);
        let event = Event::new(day(50), Sentiment::Negative, 0.9).unwrap();
        let scorer = IntegrityScorer::new(ScoringConfig {
            event_window_days: 60,
            event_study: EventStudyConfig {
                window_before_days: 60,
                ..EventStudyConfig::default()
            },
            ..ScoringConfig::default()
        })
        .unwrap();

        let score = scorer.score(&trade, &prices_with_drop(40, 20), &[event]);
        assert!(score.breakdown.time > 0.0);
        assert_eq!(score.breakdown.price, 0.0);
    }

    #[test]
    fn test_bounds_hold() {
        let scorer = IntegrityScorer::with_default_config();
        for &t in &[0.0, 0.5, 1.0] {
            for &s in &[0.0, 0.5, 1.0] {
                for &p in &[0.0, 0.5, 1.0] {
                    for &q in &[0.0, 0.5, 1.0] {
                        let (value, b) = scorer.combine(t, s, p, q);
                        assert!((0.0..=1.0).contains(&b.risk));
                        assert!((0.0..=5.0).contains(&value));
                    }
                }
            }
        }
    }

    #[test]
    fn test_integrity_non_increasing_in_each_sub_score() {
        let scorer = IntegrityScorer::with_default_config();
        let steps: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        let fixed = [0.0, 0.3, 0.7, 1.0];

        for &a in &fixed {
            for &b in &fixed {
                for &c in &fixed {
                    let mut prev = [f64::INFINITY; 4];
                    for &x in &steps {
                        let values = [
                            scorer.combine(x, a, b, c).0,
                            scorer.combine(a, x, b, c).0,
                            scorer.combine(a, b, x, c).0,
                            scorer.combine(a, b, c, x).0,
                        ];
                        for (v, p) in values.iter().zip(prev.iter()) {
                            assert!(v <= p);
                        }
                        prev = values;
                    }
                }
            }
        }
    }

    #[test]
    fn test_risk_clamped_with_heavy_weights() {
        let scorer = IntegrityScorer::new(ScoringConfig {
            weights: ScoreWeights { time: 1.0, sentiment: 1.0, price: 1.0, size: 1.0 },
            ..ScoringConfig::default()
        })
        .unwrap();
        let (value, b) = scorer.combine(1.0, 1.0, 1.0, 1.0);
        assert_eq!(b.risk, 1.0);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(ScoringConfig::default().validate().is_ok());
        let bad = ScoringConfig {
            weights: ScoreWeights { time: -0.1, ..ScoreWeights::default() },
            ..ScoringConfig::default()
        };
        assert!(IntegrityScorer::new(bad).is_err());
    }
}
