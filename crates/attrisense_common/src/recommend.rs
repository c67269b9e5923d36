//! Recommendation requester.
//!
//! State machine per displayed result:
//!
//! ```text
//! NotRequested -> Pending -> Succeeded
//!                         -> FailedWithFallback
//! ```
//!
//! Terminal states are cached against the result id, so re-rendering the
//! same result never reaches the provider twice. A new prediction
//! invalidates the cache.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::prompts::{build_prompt, PromptContext};
use crate::provider::{GeminiClient, ProviderError, TextProvider};

/// Advice shown whenever the provider cannot be used.
pub const FALLBACK_RECOMMENDATION: &str = "Consider these general retention actions:\n\
- Improve work-life balance with flexible schedules, manageable workloads and limited overtime.\n\
- Review compensation and benefits against market rates.\n\
- Offer clear career growth paths, training and promotion opportunities.\n\
- Recognize and reward contributions regularly.";

/// Non-fatal signal that the advice is the generic fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("AI suggestions unavailable: {reason}")]
pub struct RecommendationUnavailable {
    pub reason: ProviderError,
}

/// Either provider text or the fallback with the reason it was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    Generated(String),
    Fallback(RecommendationUnavailable),
}

impl Recommendation {
    pub fn text(&self) -> &str {
        match self {
            Recommendation::Generated(text) => text.as_str(),
            Recommendation::Fallback(_) => FALLBACK_RECOMMENDATION,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Recommendation::Fallback(_))
    }

    pub fn unavailable(&self) -> Option<&RecommendationUnavailable> {
        match self {
            Recommendation::Fallback(u) => Some(u),
            Recommendation::Generated(_) => None,
        }
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Recommendation", 3)?;
        match self {
            Recommendation::Generated(text) => {
                s.serialize_field("source", "provider")?;
                s.serialize_field("text", text)?;
                s.serialize_field("unavailable_reason", &None::<String>)?;
            }
            Recommendation::Fallback(u) => {
                s.serialize_field("source", "fallback")?;
                s.serialize_field("text", FALLBACK_RECOMMENDATION)?;
                s.serialize_field("unavailable_reason", &Some(u.reason.to_string()))?;
            }
        }
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationState {
    NotRequested,
    Pending {
        result_id: Uuid,
    },
    Succeeded {
        result_id: Uuid,
        text: String,
    },
    FailedWithFallback {
        result_id: Uuid,
        unavailable: RecommendationUnavailable,
    },
}

/// Asks the provider for retention advice, at most once per result.
pub struct RecommendationRequester {
    provider: Option<Arc<dyn TextProvider>>,
    /// Why `provider` is absent.
    disabled: ProviderError,
    state: RecommendationState,
}

impl RecommendationRequester {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider: Some(provider),
            disabled: ProviderError::Disabled,
            state: RecommendationState::NotRequested,
        }
    }

    /// Requester that always falls back without attempting a call.
    pub fn unavailable(reason: ProviderError) -> Self {
        Self {
            provider: None,
            disabled: reason,
            state: RecommendationState::NotRequested,
        }
    }

    /// Build from configuration. A missing credential or disabled provider
    /// is a normal state, not an error.
    pub fn from_config(config: &ProviderConfig) -> Self {
        if !config.enabled {
            info!("AI recommendations disabled in configuration");
            return Self::unavailable(ProviderError::Disabled);
        }
        let Some(api_key) = config.credential() else {
            info!(
                "{} not set; AI recommendations will use the fallback",
                config.api_key_env
            );
            return Self::unavailable(ProviderError::MissingCredential);
        };
        match GeminiClient::new(config, api_key) {
            Ok(client) => Self::new(Arc::new(client)),
            Err(e) => {
                warn!("Could not build provider client: {}", e);
                Self::unavailable(ProviderError::HttpError(e.to_string()))
            }
        }
    }

    pub fn state(&self) -> &RecommendationState {
        &self.state
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Forget the cached advice. Called when a new prediction starts.
    pub fn invalidate(&mut self) {
        self.state = RecommendationState::NotRequested;
    }

    fn cached(&self, result_id: Uuid) -> Option<Recommendation> {
        match &self.state {
            RecommendationState::Succeeded { result_id: id, text } if *id == result_id => {
                Some(Recommendation::Generated(text.clone()))
            }
            RecommendationState::FailedWithFallback {
                result_id: id,
                unavailable,
            } if *id == result_id => Some(Recommendation::Fallback(unavailable.clone())),
            _ => None,
        }
    }

    /// Advice for one displayed result. Never fails: any provider problem
    /// yields the fallback text with the reason attached.
    pub fn recommend(
        &mut self,
        result_id: Uuid,
        probability: f64,
        context: Option<&PromptContext>,
    ) -> Recommendation {
        if let Some(cached) = self.cached(result_id) {
            debug!("Reusing cached recommendation for {}", result_id);
            return cached;
        }

        let Some(provider) = self.provider.clone() else {
            let unavailable = RecommendationUnavailable {
                reason: self.disabled.clone(),
            };
            self.state = RecommendationState::FailedWithFallback {
                result_id,
                unavailable: unavailable.clone(),
            };
            return Recommendation::Fallback(unavailable);
        };

        self.state = RecommendationState::Pending { result_id };
        let prompt = build_prompt(probability, context);
        debug!("Requesting recommendation from {}", provider.name());

        match provider.generate(&prompt) {
            Ok(text) => {
                self.state = RecommendationState::Succeeded {
                    result_id,
                    text: text.clone(),
                };
                Recommendation::Generated(text)
            }
            Err(reason) => {
                warn!("AI suggestions unavailable, using fallback: {}", reason);
                let unavailable = RecommendationUnavailable { reason };
                self.state = RecommendationState::FailedWithFallback {
                    result_id,
                    unavailable: unavailable.clone(),
                };
                Recommendation::Fallback(unavailable)
            }
        }
    }
}
