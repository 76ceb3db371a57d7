use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{PriceSeries, Result, Sentiment, SignalsError, TradeType};

/// Event-study parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStudyConfig {
    /// Days before an event in which a trade still counts as well-timed
    pub window_before_days: i64,
    /// Decay constant of the timing score, in days
    pub tau_days: f64,
    /// Post-event trading days summed into the CAR
    pub car_days: usize,
    /// Trading days of baseline returns before the event
    pub estimation_window: usize,
    /// |CAR| at which the price score crosses 0.5
    pub car_threshold: f64,
    /// Steepness of the price score sigmoid
    pub car_scale: f64,
    /// Multiplier bonus when the move agrees with the sentiment
    pub direction_bonus: f64,
    /// Fraction of holdings at or below which size scores 0
    pub size_floor: f64,
    /// Fraction of holdings at or above which size scores 1
    pub size_cap: f64,
    /// Denominator used when neither holdings nor outstanding shares are known
    pub fallback_denominator: f64,
}

impl Default for EventStudyConfig {
    fn default() -> Self {
        Self {
            window_before_days: 30,
            tau_days: 7.0,
            car_days: 3,
            estimation_window: 60,
            car_threshold: 0.03,
            car_scale: 0.02,
            direction_bonus: 0.5,
            size_floor: 0.0001,
            size_cap: 0.01,
            fallback_denominator: 1e9,
        }
    }
}

impl EventStudyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_before_days <= 0 {
            return Err(SignalsError::InvalidConfig("window_before_days must be positive".into()));
        }
        if self.tau_days.is_nan() || self.tau_days <= 0.0 || self.car_scale.is_nan() || self.car_scale <= 0.0 {
            return Err(SignalsError::InvalidConfig("tau_days and car_scale must be positive".into()));
        }
        if self.car_days == 0 || self.estimation_window == 0 {
            return Err(SignalsError::InvalidConfig("car_days and estimation_window must be positive".into()));
        }
        if !(self.size_floor >= 0.0 && self.size_floor < self.size_cap) {
            return Err(SignalsError::InvalidConfig("size_floor must be below size_cap".into()));
        }
        if self.fallback_denominator.is_nan() || self.fallback_denominator <= 0.0 || self.direction_bonus < 0.0 {
            return Err(SignalsError::InvalidConfig(
                "fallback_denominator must be positive and direction_bonus non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// The four sub-scorers. Every score lies in [0, 1]; edge cases score 0 instead of failing.
#[derive(Debug, Clone, Default)]
pub struct EventStudy {
    config: EventStudyConfig,
}

impl EventStudy {
    pub fn new(config: EventStudyConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(EventStudyConfig::default())
    }

    pub fn config(&self) -> &EventStudyConfig {
        &self.config
    }

    /// exp(-delta / tau) for trades strictly before the event and inside the window.
    pub fn time_score(&self, trade_date: NaiveDate, event_date: NaiveDate) -> f64 {
        let delta = (event_date - trade_date).num_days();
        if delta <= 0 || delta > self.config.window_before_days {
            return 0.0;
        }
        (-(delta as f64) / self.config.tau_days).exp()
    }

    /// Confidence when the trade direction anticipates the sentiment, else 0.
    pub fn sentiment_match_score(&self, trade_type: TradeType, sentiment: Sentiment, confidence: f64) -> f64 {
        let polarity = sentiment.polarity();
        let matched = match trade_type {
            TradeType::Sell => polarity < 0.0,
            TradeType::Buy => polarity > 0.0,
        };
        if !matched {
            return 0.0;
        }
        (confidence * polarity.abs()).clamp(0.0, 1.0)
    }

    /// Cumulative abnormal return over the `car_days` after `event_index`, against the mean
    /// daily return of the estimation window ending at the event.
    pub fn compute_car(&self, prices: &PriceSeries, event_index: usize) -> f64 {
        let n = self.config.car_days;
        if event_index < 2 || event_index + n + 1 >= prices.len() {
            return 0.0;
        }

        let closes = prices.closes();
        let start = event_index.saturating_sub(self.config.estimation_window);
        let historical = simple_returns(&closes[start..=event_index]);
        if historical.is_empty() {
            return 0.0;
        }
        let expected = historical.iter().sum::<f64>() / historical.len() as f64;

        simple_returns(&closes[event_index..=event_index + n])
            .iter()
            .map(|realized| realized - expected)
            .sum()
    }

    pub fn price_movement_score(&self, car: f64, sentiment: Option<Sentiment>) -> f64 {
        let raw = sigmoid((car.abs() - self.config.car_threshold) / self.config.car_scale);
        let agrees = sentiment.map_or(false, |s| car * s.polarity() > 0.0);
        let score = if agrees {
            raw * (1.0 + self.config.direction_bonus)
        } else {
            raw
        };
        score.min(1.0)
    }

    /// Linear between `size_floor` and `size_cap` of the insider's holdings, falling back to
    /// shares outstanding and then to a fixed large denominator.
    pub fn trade_size_score(&self, shares: u64, insider_shares: Option<f64>, outstanding: Option<f64>) -> f64 {
        let denominator = insider_shares
            .filter(|d| *d > 0.0)
            .or(outstanding.filter(|d| *d > 0.0))
            .unwrap_or(self.config.fallback_denominator);

        let q = shares as f64 / denominator;
        let EventStudyConfig { size_floor, size_cap, .. } = self.config;
        if q <= size_floor {
            0.0
        } else if q >= size_cap {
            1.0
        } else {
            (q - size_floor) / (size_cap - size_floor)
        }
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn simple_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PricePoint;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn series(closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(base() + Duration::days(i as i64), c))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn test_time_score() {
        let study = EventStudy::with_default_config();
        let d = base();
        assert_relative_eq!(study.time_score(d, d + Duration::days(5)), (-5.0_f64 / 7.0).exp());
        assert_relative_eq!(study.time_score(d, d + Duration::days(5)), 0.4895, epsilon = 1e-4);
        assert_eq!(study.time_score(d, d + Duration::days(31)), 0.0);
        assert_eq!(study.time_score(d, d), 0.0);
        assert_eq!(study.time_score(d + Duration::days(2), d), 0.0);
        assert!(study.time_score(d, d + Duration::days(30)) > 0.0);
    }

    #[test]
    fn test_time_score_decays() {
        let study = EventStudy::with_default_config();
        let d = base();
        let near = study.time_score(d, d + Duration::days(1));
        let far = study.time_score(d, d + Duration::days(20));
        assert!(near > far);
        assert!(near < 1.0);
    }

    #[test]
    fn test_sentiment_match_score() {
        let study = EventStudy::with_default_config();
        assert_relative_eq!(study.sentiment_match_score(TradeType::Sell, Sentiment::Negative, 0.8), 0.8);
        assert_eq!(study.sentiment_match_score(TradeType::Buy, Sentiment::Negative, 0.8), 0.0);
        assert_relative_eq!(study.sentiment_match_score(TradeType::Buy, Sentiment::Positive, 0.6), 0.6);
        assert_eq!(study.sentiment_match_score(TradeType::Sell, Sentiment::Neutral, 0.9), 0.0);
        assert_eq!(study.sentiment_match_score(TradeType::Buy, Sentiment::Neutral, 0.9), 0.0);
    }

    #[test]
    fn test_trade_size_score() {
        let study = EventStudy::with_default_config();
        assert_eq!(study.trade_size_score(100, Some(1_000_000.0), None), 0.0);
        assert_eq!(study.trade_size_score(15_000, Some(1_000_000.0), None), 1.0);
        assert_relative_eq!(
            study.trade_size_score(5_050, Some(1_000_000.0), None),
            0.5,
            epsilon = 1e-9
        );
        // holdings take priority over shares outstanding
        assert_eq!(study.trade_size_score(15_000, Some(1_000_000.0), Some(1e12)), 1.0);
        assert_eq!(study.trade_size_score(15_000, None, Some(1_000_000.0)), 1.0);
        // fallback denominator 1e9
        assert_eq!(study.trade_size_score(50_000, None, None), 0.0);
        assert_eq!(study.trade_size_score(20_000_000, None, None), 1.0);
    }

    #[test]
    fn test_compute_car_flat_series_is_zero() {
        let study = EventStudy::with_default_config();
        let prices = series(&[50.0; 80]);
        for idx in [2, 10, 40, 75] {
            assert_eq!(study.compute_car(&prices, idx), 0.0);
        }
    }

    #[test]
    fn test_compute_car_edges_are_zero() {
        let study = EventStudy::with_default_config();
        let prices = series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0]);
        assert_eq!(study.compute_car(&prices, 0), 0.0);
        assert_eq!(study.compute_car(&prices, 1), 0.0);
        // len 8, N 3: indices 4.. are too close to the end
        assert_eq!(study.compute_car(&prices, 4), 0.0);
        assert_eq!(study.compute_car(&prices, 7), 0.0);
        assert_ne!(study.compute_car(&prices, 3), 0.0);
    }

    #[test]
    fn test_compute_car_detects_post_event_jump() {
        let study = EventStudy::with_default_config();
        let mut closes = vec![100.0; 10];
        closes.extend_from_slice(&[110.0, 110.0, 110.0, 110.0]);
        let prices = series(&closes);
        // event at index 9: flat baseline, then a 10% jump on the first day after
        assert_relative_eq!(study.compute_car(&prices, 9), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_compute_car_subtracts_baseline_drift() {
        let study = EventStudy::with_default_config();
        // steady 1% daily growth is expected, not abnormal
        let closes: Vec<f64> = (0..20).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let prices = series(&closes);
        assert_relative_eq!(study.compute_car(&prices, 10), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_price_movement_score() {
        let study = EventStudy::with_default_config();
        assert_relative_eq!(study.price_movement_score(0.0, None), sigmoid(-1.5));
        assert_relative_eq!(study.price_movement_score(0.0, Some(Sentiment::Negative)), 0.1824, epsilon = 1e-4);
        assert_relative_eq!(study.price_movement_score(0.03, None), 0.5);
        assert_relative_eq!(study.price_movement_score(-0.03, Some(Sentiment::Negative)), 0.75);
        assert_relative_eq!(study.price_movement_score(-0.03, Some(Sentiment::Positive)), 0.5);
        assert_relative_eq!(study.price_movement_score(0.03, Some(Sentiment::Neutral)), 0.5);
        assert_eq!(study.price_movement_score(0.5, Some(Sentiment::Positive)), 1.0);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EventStudyConfig::default().validate().is_ok());
        let bad = EventStudyConfig { size_floor: 0.02, ..EventStudyConfig::default() };
        assert!(bad.validate().is_err());
    }
}
