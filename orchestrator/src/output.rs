use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use integrity_signals::{InsiderReport, IntegrityScore};
use vdatabase::{Classification, RebuildReport};

use crate::pipeline::CaseReport;

pub struct ResultFormatter {
    start_time: DateTime<Utc>,
}

impl ResultFormatter {
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
        }
    }

    pub fn display_rebuild(&self, report: &RebuildReport) {
        println!("\n{}", "=".repeat(60));
        println!("INDEX REBUILD");
        println!("{}", "=".repeat(60));
        println!("Snippets:  {}", report.total);
        println!("Inserted:  {}", report.inserted);
        println!("Skipped:   {}", report.skipped());
    }

    pub fn display_classification(&self, classification: &Classification) {
        println!("\n{}", "-".repeat(40));
        println!("CLASSIFICATION");
        println!("{}", "-".repeat(40));
        match classification {
            Classification::Classified { impact, confidence, confidence_level } => {
                println!("Impact:     {}", impact);
                println!("Confidence: {} ({:.3})", confidence, confidence_level);
            }
            Classification::Unavailable => {
                let result = classification.to_result();
                println!("Impact:     {}", result.impact);
                println!("Confidence: {}", result.confidence);
                println!("Note:       embedding model unavailable");
            }
            Classification::Error { detail } => {
                println!("Impact:     ERROR");
                println!("Confidence: None");
                println!("Detail:     {}", detail);
            }
        }
    }

    pub fn display_case_report(&self, report: &CaseReport) {
        println!("\n{}", "=".repeat(80));
        println!("INSIDER TRADE INTEGRITY: {}", report.company.as_deref().unwrap_or("unnamed case"));
        println!("{}", "=".repeat(80));

        if !report.filings.is_empty() {
            println!("\nFilings:");
            for filing in &report.filings {
                let result = filing.classification.to_result();
                let event = match &filing.event {
                    Some(event) => format!("{} @ {:.2}", event.sentiment, event.confidence),
                    None => "no event".to_string(),
                };
                println!(
                    "   {} {:<5} {:<10} {:<8} -> {}",
                    filing.date,
                    filing.form.as_str(),
                    result.impact,
                    result.confidence,
                    event
                );
            }
        }
        if report.classification_errors > 0 {
            println!(
                "\n   {} filing(s) failed to classify and were excluded",
                report.classification_errors
            );
        }

        for insider in &report.insiders {
            self.display_insider(insider);
        }

        let runtime = Utc::now().signed_duration_since(self.start_time);
        println!("\n{}", "-".repeat(40));
        println!("Scored {} insider(s) in {}ms", report.insiders.len(), runtime.num_milliseconds());
        println!("{}", "=".repeat(80));
    }

    fn display_insider(&self, insider: &InsiderReport) {
        println!("\n{}", "-".repeat(40));
        println!("{}", insider.insider);
        println!("{}", "-".repeat(40));
        println!("Integrity: {:.2} / 5 ({})", insider.overall_integrity, insider.band);
        if let Some(min) = insider.min_integrity {
            println!("Lowest:    {:.2}", min);
        }
        println!("Flagged:   {} of {} trades", insider.flagged, insider.assessments.len());

        for assessment in &insider.assessments {
            let trade = &assessment.trade;
            println!(
                "   {} {:<4} {:>10} shares  {:.2} {:<8} {}",
                trade.date,
                trade.trade_type,
                trade.shares,
                assessment.score.value,
                assessment.band.as_str(),
                self.breakdown_line(&assessment.score)
            );
        }
    }

    fn breakdown_line(&self, score: &IntegrityScore) -> String {
        let b = &score.breakdown;
        let event = match &score.matched_event {
            Some(event) => format!(" event {}", event.date),
            None => String::new(),
        };
        format!(
            "risk={:.3} T={:.2} S={:.2} P={:.2} Q={:.2}{}",
            b.risk, b.time, b.sentiment, b.price, b.size, event
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
