use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use integrity_signals::{Event, PriceSeries, Trade};

use crate::event_mapping::FilingForm;

/// One company's scoring case: prices, disclosures and the insiders who traded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFile {
    #[serde(default)]
    pub company: Option<String>,
    pub prices: PriceSeries,
    /// Disclosures still to be classified
    #[serde(default)]
    pub filings: Vec<FilingInput>,
    /// Events supplied already classified
    #[serde(default)]
    pub events: Vec<Event>,
    pub insiders: Vec<InsiderInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingInput {
    pub date: NaiveDate,
    #[serde(default = "default_form")]
    pub form: FilingForm,
    #[serde(default)]
    pub text: Option<String>,
    /// Read when `text` is absent; relative paths resolve against the case file
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_form() -> FilingForm {
    FilingForm::Other
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderInput {
    pub name: String,
    #[serde(default)]
    pub trades: Vec<Trade>,
}

impl CaseFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read case file {}", path.display()))?;
        let mut case: CaseFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse case file {}", path.display()))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        case.resolve_filing_text(base_dir)?;

        info!(
            "Loaded case {}: {} closes, {} filings, {} events, {} insiders",
            case.company.as_deref().unwrap_or("<unnamed>"),
            case.prices.len(),
            case.filings.len(),
            case.events.len(),
            case.insiders.len()
        );
        Ok(case)
    }

    fn resolve_filing_text(&mut self, base_dir: &Path) -> Result<()> {
        for filing in &mut self.filings {
            if filing.text.is_some() {
                continue;
            }
            let Some(relative) = &filing.path else {
                bail!("Filing dated {} has neither text nor path", filing.date);
            };
            let full = base_dir.join(relative);
            let text = fs::read_to_string(&full)
                .with_context(|| format!("Failed to read filing {}", full.display()))?;
            filing.text = Some(text);
        }
        Ok(())
    }
}

impl FilingInput {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}
