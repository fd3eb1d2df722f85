//! Pipeline — coordinates detectors, merge, coreference, and replacement.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use cloak_anonymize::{anonymize, AnonymizedDocument, AuditReport, ReplacementGenerator};
use cloak_core::{Error, PipelineConfig, Result};
use cloak_detect::{
    Detector, HeuristicNerDetector, PatternDetector, PiiEngineDetector, Span,
};
use cloak_intent::{
    Embedder, HashedBowEmbedder, HttpChatCompleter, IntentDecision, IntentEnsemble, LlmConfig,
};
use cloak_resolve::{
    expand_coreferences, group_entities, CoreferenceResolver, MergeEngine, MergePolicy,
    PronounCoref,
};

/// Anonymization and intent-classification entry point.
///
/// Detector and resolver handles are read-only and shared across
/// requests; everything request-scoped (spans, groups, the replacement
/// map) lives on the stack of one call.
pub struct Pipeline {
    config: PipelineConfig,
    detectors: Vec<Arc<dyn Detector>>,
    coref: Arc<dyn CoreferenceResolver>,
    ensemble: IntentEnsemble,
}

impl Pipeline {
    /// Standard configuration: all three detectors, rule-based
    /// coreference, and the three-voter ensemble with env-driven LLM
    /// settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Anonymize a document: detect → merge → group → expand coreference
    /// → generate replacements → substitute.
    ///
    /// Either the full anonymized document plus mapping is returned, or a
    /// single fatal error — never a partially anonymized text.
    pub async fn anonymize(&self, text: &str) -> Result<AnonymizedDocument> {
        self.anonymize_with_report(text).await.map(|(doc, _)| doc)
    }

    /// As [`Pipeline::anonymize`], also returning the audit summary.
    pub async fn anonymize_with_report(
        &self,
        text: &str,
    ) -> Result<(AnonymizedDocument, AuditReport)> {
        if text.trim().is_empty() {
            return Err(Error::Validation("empty document".into()));
        }
        let started = Instant::now();

        let spans = self.detect_all(text).await;
        debug!("detectors produced {} raw spans", spans.len());

        let policy = MergePolicy {
            merge_adjacent_names: self.config.merge_adjacent_names,
            ..MergePolicy::default()
        };
        let resolved = MergeEngine::new(policy).merge(text, spans)?;

        let mut groups = group_entities(resolved);

        match self.coref.resolve(text) {
            Ok(clusters) => expand_coreferences(text, &mut groups, &clusters),
            Err(e) => warn!("coreference resolver unavailable: {}", e),
        }

        let mut generator = ReplacementGenerator::new(
            self.config.replacement_seed,
            self.config.max_collision_retries,
        );
        let mapping = generator.assign(text, &groups);

        let document = anonymize(text, &groups, &mapping)?;
        let report = AuditReport::from_groups(
            &groups,
            document.mapping.len(),
            started.elapsed().as_millis() as u64,
        );

        // Counts only; raw text never reaches the log.
        info!(
            "pipeline complete | groups={} replacements={} duration_ms={}",
            report.group_count, report.replacement_count, report.duration_ms
        );

        Ok((document, report))
    }

    /// Classify a query's intent via the voter ensemble. Never fails;
    /// degraded results are flagged low-confidence.
    pub async fn classify_intent(&self, query: &str) -> IntentDecision {
        self.ensemble.classify(query).await
    }

    /// Run every detector concurrently, each under its own timeout.
    /// A failed or slow detector is excluded without affecting siblings.
    async fn detect_all(&self, text: &str) -> Vec<Span> {
        let budget = Duration::from_millis(self.config.detector_timeout_ms);
        let tasks = self.detectors.iter().map(|detector| {
            let detector = Arc::clone(detector);
            let text = text.to_string();
            async move {
                let id = detector.id();
                let handle = tokio::task::spawn_blocking(move || detector.detect(&text));
                match timeout(budget, handle).await {
                    Ok(Ok(Ok(spans))) => spans,
                    Ok(Ok(Err(e))) => {
                        warn!("{}", Error::DetectorUnavailable(format!("{}: {}", id, e)));
                        Vec::new()
                    }
                    Ok(Err(e)) => {
                        warn!("detector {} panicked: {}", id, e);
                        Vec::new()
                    }
                    Err(_) => {
                        warn!("detector {} timed out after {:?}", id, budget);
                        Vec::new()
                    }
                }
            }
        });

        join_all(tasks).await.into_iter().flatten().collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder with overridable detectors, resolver, and ensemble.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    detectors: Vec<Arc<dyn Detector>>,
    coref: Option<Arc<dyn CoreferenceResolver>>,
    ensemble: Option<IntentEnsemble>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Add a detector (replaces the default set).
    #[must_use]
    pub fn detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    #[must_use]
    pub fn coref(mut self, coref: Arc<dyn CoreferenceResolver>) -> Self {
        self.coref = Some(coref);
        self
    }

    #[must_use]
    pub fn ensemble(mut self, ensemble: IntentEnsemble) -> Self {
        self.ensemble = Some(ensemble);
        self
    }

    pub fn build(self) -> Pipeline {
        let config = self.config.unwrap_or_default();

        let detectors = if self.detectors.is_empty() {
            vec![
                Arc::new(PiiEngineDetector::new()) as Arc<dyn Detector>,
                Arc::new(PatternDetector::new()),
                Arc::new(HeuristicNerDetector::new()),
            ]
        } else {
            self.detectors
        };

        let coref = self
            .coref
            .unwrap_or_else(|| Arc::new(PronounCoref::new()));

        let ensemble = self.ensemble.unwrap_or_else(|| {
            let completer = Arc::new(HttpChatCompleter::new(LlmConfig::from_env()));
            let embedder: Arc<dyn Embedder> = Arc::new(HashedBowEmbedder::default());
            IntentEnsemble::standard(
                completer,
                embedder,
                Duration::from_millis(config.voter_timeout_ms),
            )
        });

        Pipeline {
            config,
            detectors,
            coref,
            ensemble,
        }
    }
}
