use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use integrity_signals::{Event, InsiderReport, IntegrityScorer};
use vdatabase::{
    Classification, ClassifierConfig, IndexBackend, IndexConfig, RebuildReport, SentimentClassifier,
    TrainingCorpus, VectorStorage,
};

use crate::event_mapping::{EventMapper, FilingForm};
use crate::input::{CaseFile, FilingInput};

#[derive(Debug, Clone, Serialize)]
pub struct FilingOutcome {
    pub date: NaiveDate,
    pub form: FilingForm,
    pub classification: Classification,
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub company: Option<String>,
    pub filings: Vec<FilingOutcome>,
    /// Filings whose classification failed on infrastructure and produced no event
    pub classification_errors: usize,
    pub events: Vec<Event>,
    pub insiders: Vec<InsiderReport>,
}

/// Owns the classifier stack and the scorer between `open` and `close`.
pub struct PipelineOrchestrator {
    storage: Arc<VectorStorage>,
    classifier: SentimentClassifier,
    mapper: EventMapper,
    scorer: IntegrityScorer,
}

impl PipelineOrchestrator {
    pub async fn open(
        index_config: IndexConfig,
        classifier_config: ClassifierConfig,
        mapper: EventMapper,
        scorer: IntegrityScorer,
    ) -> Result<Self> {
        info!("Initializing pipeline orchestrator...");
        let storage = VectorStorage::open(index_config)
            .await
            .context("Failed to open vector storage")?;
        storage.initialize().await.context("Vector index is not healthy")?;

        Ok(Self::from_parts(Arc::new(storage), classifier_config, mapper, scorer))
    }

    pub fn from_parts(
        storage: Arc<VectorStorage>,
        classifier_config: ClassifierConfig,
        mapper: EventMapper,
        scorer: IntegrityScorer,
    ) -> Self {
        let classifier = SentimentClassifier::new(Arc::clone(&storage), classifier_config);
        Self {
            storage,
            classifier,
            mapper,
            scorer,
        }
    }

    pub fn backend(&self) -> IndexBackend {
        self.storage.config().backend
    }

    pub async fn rebuild_index(&self, corpus: &TrainingCorpus) -> Result<RebuildReport> {
        let report = self.storage.rebuild(corpus.snippets()).await?;
        if report.inserted == 0 {
            warn!("Index is empty after rebuild; every classification will be neutral");
        }
        Ok(report)
    }

    /// The in-memory backend starts empty, so it is filled before first use.
    pub async fn prepare(&self, corpus: &TrainingCorpus) -> Result<()> {
        if self.backend() == IndexBackend::Memory {
            info!("In-memory index selected; building from {} snippets", corpus.len());
            self.rebuild_index(corpus).await?;
        }
        Ok(())
    }

    pub async fn classify_text(&self, text: &str, form: FilingForm) -> Classification {
        self.classifier.classify(form.prepare_text(text)).await
    }

    pub async fn classify_filing(&self, filing: &FilingInput) -> FilingOutcome {
        let classification = self.classify_text(filing.text(), filing.form).await;
        let event = self.mapper.to_event(filing.date, &classification);
        FilingOutcome {
            date: filing.date,
            form: filing.form,
            classification,
            event,
        }
    }

    pub async fn score_case(&self, case: &CaseFile) -> CaseReport {
        let mut filings = Vec::with_capacity(case.filings.len());
        for filing in &case.filings {
            filings.push(self.classify_filing(filing).await);
        }

        let classification_errors = filings.iter().filter(|f| f.classification.is_error()).count();
        if classification_errors > 0 {
            warn!(
                "{} of {} filings could not be classified and were left out of scoring",
                classification_errors,
                filings.len()
            );
        }

        let mut events = case.events.clone();
        events.extend(filings.iter().filter_map(|f| f.event));
        events.sort_by_key(|e| e.date);

        let insiders = case
            .insiders
            .iter()
            .map(|insider| {
                InsiderReport::build(&self.scorer, insider.name.as_str(), &insider.trades, &case.prices, &events)
            })
            .collect();

        CaseReport {
            company: case.company.clone(),
            filings,
            classification_errors,
            events,
            insiders,
        }
    }

    pub fn close(&self) {
        self.storage.close();
        info!("Pipeline orchestrator closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InsiderInput;
    use integrity_signals::{PricePoint, PriceSeries, Sentiment, Trade, TradeType};
    use chrono::Duration;
    use vdatabase::{ImpactLabel, InMemoryIndex, TextEmbedder, TrainingSnippet};

    const DIM: usize = 384;

    /// Texts mentioning "loss" point one way, everything else the other.
    struct KeywordEmbedder;

    impl TextEmbedder for KeywordEmbedder {
        fn embed(&self, text: &str) -> Option<Vec<f32>> {
            let mut v = vec![0.0; DIM];
            if text.to_lowercase().contains("loss") {
                v[0] = 1.0;
            } else {
                v[1] = 1.0;
            }
            Some(v)
        }

        fn dimension(&self) -> usize {
            DIM
        }
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + Duration::days(offset)
    }

    async fn orchestrator() -> PipelineOrchestrator {
        let storage = VectorStorage::with_components(
            IndexConfig::in_memory(),
            Arc::new(InMemoryIndex::default()),
            Arc::new(KeywordEmbedder),
        )
        .unwrap();
        let orchestrator = PipelineOrchestrator::from_parts(
            Arc::new(storage),
            ClassifierConfig::default(),
            EventMapper::default(),
            IntegrityScorer::with_default_config(),
        );

        let corpus = TrainingCorpus::new(vec![
            TrainingSnippet::new("Net loss widened", ImpactLabel::StockDown),
            TrainingSnippet::new("Unexpected loss on impairment", ImpactLabel::StockDown),
            TrainingSnippet::new("Annual meeting scheduled", ImpactLabel::Neutral),
        ])
        .unwrap();
        orchestrator.prepare(&corpus).await.unwrap();
        orchestrator
    }

    fn case() -> CaseFile {
        let prices = PriceSeries::new(
            (0..40)
                .map(|i| PricePoint::new(day(i), if i > 10 { 75.0 } else { 100.0 }))
                .collect(),
        )
        .unwrap();
        let trade = Trade::new(TradeType::Sell, 30_000, day(7))
            .unwrap()
            .with_insider_holdings(Some(1_000_000.0))
            .unwrap();

        CaseFile {
            company: Some("ACME".into()),
            prices,
            filings: vec![FilingInput {
                date: day(10),
                form: FilingForm::EightK,
                text: Some("The company reported a net loss for the quarter.".into()),
                path: None,
            }],
            events: Vec::new(),
            insiders: vec![InsiderInput {
                name: "J. Doe".into(),
                trades: vec![trade],
            }],
        }
    }

    #[tokio::test]
    async fn test_score_case_maps_filing_to_event() {
        let orchestrator = orchestrator().await;
        let report = orchestrator.score_case(&case()).await;

        assert_eq!(report.classification_errors, 0);
        let event = report.filings[0].event.unwrap();
        assert_eq!(event.sentiment, Sentiment::Negative);
        assert_eq!(event.date, day(10));

        let insider = &report.insiders[0];
        assert_eq!(insider.flagged, 1);
        assert!(insider.overall_integrity < 2.0);
    }

    #[tokio::test]
    async fn test_closed_orchestrator_reports_errors_without_events() {
        let orchestrator = orchestrator().await;
        orchestrator.close();

        let report = orchestrator.score_case(&case()).await;
        assert_eq!(report.classification_errors, 1);
        assert!(report.filings[0].event.is_none());
        assert!(report.events.is_empty());
        // only trade size remains: 0.15 risk
        assert_eq!(report.insiders[0].overall_integrity, 4.25);
    }
}
