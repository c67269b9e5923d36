//! Inference adapter around the trained classifier.
//!
//! The classifier is loaded once at startup and shared read-only through an
//! `Arc`; predictions never mutate it, so concurrent sessions need no lock.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ConfigurationError, InferenceError};
use crate::features::FeatureRecord;
use crate::model::LogisticPipeline;

/// Signed contribution of one encoded feature to the logit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub feature: String,
    pub value: f64,
}

/// Binary classifier contract of the trained pipeline.
pub trait AttritionClassifier: Send + Sync {
    /// Class label: 1 = attrition, 0 = retain.
    fn predict(&self, record: &FeatureRecord) -> Result<u8, InferenceError>;

    /// Probability of class 1.
    fn predict_proba(&self, record: &FeatureRecord) -> Result<f64, InferenceError>;

    /// Identifier for logs.
    fn describe(&self) -> String {
        "attrition classifier".to_string()
    }

    /// Encoded features ordered by absolute contribution, if supported.
    fn explain(&self, _record: &FeatureRecord) -> Vec<Contribution> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionLabel {
    Retain,
    AttritionRisk,
}

impl PredictionLabel {
    /// Headline shown above the gauge.
    pub fn headline(&self) -> &'static str {
        match self {
            PredictionLabel::Retain => "Low Risk of Employee Attrition",
            PredictionLabel::AttritionRisk => "High Risk of Employee Attrition",
        }
    }
}

/// Classifier output for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: PredictionLabel,
    /// Probability of attrition in [0, 1].
    pub probability: f64,
    /// Top contributing encoded features, strongest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_features: Vec<Contribution>,
}

impl PredictionResult {
    /// Probability as a percentage with two decimals, e.g. `82.00%`.
    pub fn percent(&self) -> String {
        format_percent(self.probability)
    }
}

pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// How many contributions a prediction carries.
const TOP_FEATURES: usize = 5;

/// Shared handle to the process-wide classifier.
#[derive(Clone)]
pub struct InferenceAdapter {
    classifier: Arc<dyn AttritionClassifier>,
}

impl std::fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("classifier", &self.classifier.describe())
            .finish()
    }
}

impl InferenceAdapter {
    pub fn new(classifier: Arc<dyn AttritionClassifier>) -> Self {
        Self { classifier }
    }

    /// Load the pipeline artifact. Failure here is fatal for the process.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let pipeline = LogisticPipeline::load(path)?;
        Ok(Self::new(Arc::new(pipeline)))
    }

    pub fn describe(&self) -> String {
        self.classifier.describe()
    }

    /// Score one record. Errors abort this request only and are not retried.
    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, InferenceError> {
        let label = self.classifier.predict(record)?;
        let probability = self.classifier.predict_proba(record)?;

        if !probability.is_finite() {
            return Err(InferenceError::NonFiniteScore);
        }
        if !(0.0..=1.0).contains(&probability) {
            return Err(InferenceError::ProbabilityOutOfRange(probability));
        }
        let label = match label {
            0 => PredictionLabel::Retain,
            1 => PredictionLabel::AttritionRisk,
            other => {
                return Err(InferenceError::Classifier(format!(
                    "unexpected class label {}",
                    other
                )))
            }
        };

        let mut top_features = self.classifier.explain(record);
        top_features.truncate(TOP_FEATURES);
        debug!(
            "Prediction {:?} p={:.4} top={:?}",
            label,
            probability,
            top_features.iter().map(|c| c.feature.as_str()).collect::<Vec<_>>()
        );

        Ok(PredictionResult {
            label,
            probability,
            top_features,
        })
    }
}
