//! Per-session orchestration of one "predict" action:
//! validate → build features → infer → tier/gauge → recommendation.
//!
//! Steps run strictly in sequence; the recommendation needs the
//! probability. Only the latest assessment is kept, and starting a new
//! prediction drops it together with its cached recommendation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::AttriSenseConfig;
use crate::error::{AttriSenseError, ConfigurationError};
use crate::features::{self, FeatureRecord};
use crate::inference::{InferenceAdapter, PredictionResult};
use crate::input::RawInputSet;
use crate::prompts::PromptContext;
use crate::recommend::{Recommendation, RecommendationRequester};
use crate::risk::{classify, render_gauge, GaugeSpec, RiskTier};

/// Everything the renderer needs for one prediction.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub record: FeatureRecord,
    pub prediction: PredictionResult,
    pub tier: RiskTier,
    pub gauge: GaugeSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_context: Option<PromptContext>,
    pub recommendation: Recommendation,
}

impl Assessment {
    /// Tier label, e.g. "High Risk".
    pub fn risk_label(&self) -> &'static str {
        self.tier.label()
    }

    /// Classifier headline, e.g. "High Risk of Employee Attrition".
    pub fn headline(&self) -> &'static str {
        self.prediction.label.headline()
    }

    pub fn probability_sentence(&self) -> String {
        format!(
            "The predicted probability of attrition is {}.",
            self.prediction.percent()
        )
    }
}

/// One user session.
pub struct Orchestrator {
    adapter: InferenceAdapter,
    requester: RecommendationRequester,
    include_context: bool,
    current: Option<Assessment>,
}

impl Orchestrator {
    pub fn new(adapter: InferenceAdapter, requester: RecommendationRequester) -> Self {
        Self {
            adapter,
            requester,
            include_context: true,
            current: None,
        }
    }

    /// Load the model and set up the provider. Fails only on a fatal
    /// configuration problem; a missing credential just disables AI advice.
    pub fn from_config(config: &AttriSenseConfig) -> Result<Self, ConfigurationError> {
        let adapter = InferenceAdapter::load(&config.model.artifact_path)?;
        let requester = RecommendationRequester::from_config(&config.provider);
        Ok(Self::new(adapter, requester).with_prompt_context(config.provider.include_context))
    }

    pub fn with_prompt_context(mut self, include: bool) -> Self {
        self.include_context = include;
        self
    }

    pub fn adapter(&self) -> &InferenceAdapter {
        &self.adapter
    }

    pub fn requester(&self) -> &RecommendationRequester {
        &self.requester
    }

    pub fn current(&self) -> Option<&Assessment> {
        self.current.as_ref()
    }

    /// Run one prediction. Provider trouble never fails this call; it shows
    /// up as a fallback recommendation.
    pub fn predict(&mut self, raw: &RawInputSet) -> Result<&Assessment, AttriSenseError> {
        raw.validate()?;

        self.current = None;
        self.requester.invalidate();

        let record = features::build(raw)?;
        let prediction = self.adapter.predict(&record)?;
        let probability = prediction.probability;
        let tier = classify(probability);
        let gauge = render_gauge(probability);

        let id = Uuid::new_v4();
        let prompt_context = if self.include_context {
            PromptContext::from_record(&record)
        } else {
            None
        };
        let recommendation = self
            .requester
            .recommend(id, probability, prompt_context.as_ref());

        info!(
            "Assessment {}: {} ({}), recommendation from {}",
            id,
            tier,
            prediction.percent(),
            if recommendation.is_fallback() { "fallback" } else { "provider" }
        );

        Ok(self.current.insert(Assessment {
            id,
            created_at: Utc::now(),
            record,
            prediction,
            tier,
            gauge,
            prompt_context,
            recommendation,
        }))
    }

    /// Re-display the latest assessment. The recommendation comes from the
    /// requester's cache, so the provider is not called again.
    pub fn rerender(&mut self) -> Option<&Assessment> {
        let current = self.current.as_mut()?;
        current.recommendation = self.requester.recommend(
            current.id,
            current.prediction.probability,
            current.prompt_context.as_ref(),
        );
        Some(&*current)
    }
}
