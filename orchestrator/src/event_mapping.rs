use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::debug;

use integrity_signals::{Event, Sentiment};
use vdatabase::{Classification, ConfidenceBand, Impact};

/// Characters kept from non-annual filings before classification.
pub const FILING_TEXT_LIMIT: usize = 8000;

/// Numeric confidence handed to the event study for each classifier band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMapping {
    pub high: f64,
    pub moderate: f64,
    pub low: f64,
}

impl Default for ConfidenceMapping {
    fn default() -> Self {
        Self {
            high: 0.9,
            moderate: 0.6,
            low: 0.3,
        }
    }
}

impl ConfidenceMapping {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let mapping = Self {
            high: env_f64("CONFIDENCE_HIGH", defaults.high)?,
            moderate: env_f64("CONFIDENCE_MODERATE", defaults.moderate)?,
            low: env_f64("CONFIDENCE_LOW", defaults.low)?,
        };
        mapping.validate()?;
        Ok(mapping)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("high", self.high), ("moderate", self.moderate), ("low", self.low)] {
            if !(0.0..=1.0).contains(&value) {
                bail!("Confidence for {} band must lie in [0, 1], got {}", name, value);
            }
        }
        if !(self.low <= self.moderate && self.moderate <= self.high) {
            bail!("Confidence mapping must satisfy low <= moderate <= high");
        }
        Ok(())
    }

    pub fn confidence_for(&self, band: ConfidenceBand) -> f64 {
        match band {
            ConfidenceBand::High => self.high,
            ConfidenceBand::Moderate => self.moderate,
            ConfidenceBand::Low => self.low,
            ConfidenceBand::None => 0.0,
        }
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

/// STOCK_UP reads as positive, STOCK_DOWN as negative. ERROR has no sentiment.
pub fn sentiment_for(impact: Impact) -> Option<Sentiment> {
    match impact {
        Impact::StockUp => Some(Sentiment::Positive),
        Impact::StockDown => Some(Sentiment::Negative),
        Impact::Neutral => Some(Sentiment::Neutral),
        Impact::Error => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingForm {
    #[serde(rename = "8-K")]
    EightK,
    #[serde(rename = "10-Q")]
    TenQ,
    #[serde(rename = "10-K")]
    TenK,
    #[serde(rename = "other", other)]
    Other,
}

impl FilingForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingForm::EightK => "8-K",
            FilingForm::TenQ => "10-Q",
            FilingForm::TenK => "10-K",
            FilingForm::Other => "other",
        }
    }

    /// Annual reports go in whole; everything else is cut to `FILING_TEXT_LIMIT` characters.
    pub fn prepare_text<'a>(&self, text: &'a str) -> &'a str {
        if *self == FilingForm::TenK {
            return text;
        }
        match text.char_indices().nth(FILING_TEXT_LIMIT) {
            Some((byte_index, _)) => &text[..byte_index],
            None => text,
        }
    }
}

impl std::str::FromStr for FilingForm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "8-K" | "8K" => FilingForm::EightK,
            "10-Q" | "10Q" => FilingForm::TenQ,
            "10-K" | "10K" => FilingForm::TenK,
            _ => FilingForm::Other,
        })
    }
}

/// Turns classifier output into event-study input.
#[derive(Debug, Clone, Default)]
pub struct EventMapper {
    confidence: ConfidenceMapping,
}

impl EventMapper {
    pub fn new(confidence: ConfidenceMapping) -> Self {
        Self { confidence }
    }

    pub fn confidence_mapping(&self) -> &ConfidenceMapping {
        &self.confidence
    }

    /// `None` for an ERROR classification, which must not be scored as a neutral event.
    pub fn to_event(&self, date: NaiveDate, classification: &Classification) -> Option<Event> {
        let result = classification.to_result();
        let sentiment = sentiment_for(result.impact)?;
        let confidence = self.confidence.confidence_for(result.confidence);

        match Event::new(date, sentiment, confidence) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Dropping unmappable classification on {}: {}", date, e);
                None
            }
        }
    }
}
