//! AttriSense Common - employee attrition risk assessment
//!
//! Feature contract, trained-pipeline inference, risk presentation and
//! retention advice with a fallback when the text provider is unavailable.

pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod input;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod provider;
pub mod recommend;
pub mod risk;
pub mod schema;

pub use config::AttriSenseConfig;
pub use error::{AttriSenseError, ConfigurationError, InferenceError, ValidationError, ValidationReport};
pub use features::{build, FeatureRecord, FeatureValue};
pub use inference::{AttritionClassifier, InferenceAdapter, PredictionLabel, PredictionResult};
pub use input::{RawInputSet, RawValue};
pub use orchestrator::{Assessment, Orchestrator};
pub use recommend::{Recommendation, RecommendationRequester, RecommendationUnavailable, FALLBACK_RECOMMENDATION};
pub use risk::{classify, render_gauge, GaugeSpec, RiskTier};
