//! Trained attrition pipeline: one-hot/standard-scaled encoder followed by a
//! logistic regression, exported offline as JSON.
//!
//! # Artifact format
//!
//! ```text
//! {
//!   "model_id": "...", "model_version": "...", "schema_version": 1,
//!   "feature_names": ["Age", "Gender", ...],          // contract order
//!   "numeric":     [{"name": "Age", "mean": .., "scale": .., "weight": ..}, ...],
//!   "categorical": [{"name": "OverTime",
//!                    "categories": [{"value": "Yes", "weight": ..}, ...]}, ...],
//!   "intercept": .., "threshold": 0.5
//! }
//! ```
//!
//! The runtime only scores. Loading validates the artifact against the
//! feature contract and refuses anything that would silently mis-encode.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ConfigurationError, InferenceError};
use crate::features::{FeatureRecord, FeatureValue};
use crate::inference::{AttritionClassifier, Contribution};
use crate::schema::{self, FieldKind, FIELDS, SCHEMA_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub value: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<CategoryWeight>,
}

/// Serialized pipeline as produced by the training job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub model_id: String,
    pub model_version: String,
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
    pub intercept: f64,
    /// Probability at or above which the label is 1.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl PipelineArtifact {
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            return Err(ConfigurationError::ArtifactMissing(path.to_path_buf()));
        }
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::ArtifactUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&content)
    }

    /// Check the artifact against the feature contract.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigurationError::SchemaVersion {
                expected: SCHEMA_VERSION,
                found: self.schema_version,
            });
        }

        let expected: Vec<&str> = schema::feature_names().collect();
        let found: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        if expected != found {
            return Err(ConfigurationError::FeatureMismatch(describe_name_diff(
                &expected, &found,
            )));
        }

        let numeric: Vec<&str> = self.numeric.iter().map(|c| c.name.as_str()).collect();
        let categorical: Vec<&str> = self.categorical.iter().map(|c| c.name.as_str()).collect();
        for spec in FIELDS.iter() {
            let wanted = match spec.kind {
                FieldKind::Integer { .. } => &numeric,
                FieldKind::Categorical(_) => &categorical,
            };
            match wanted.iter().filter(|n| **n == spec.name).count() {
                1 => {}
                0 => {
                    return Err(ConfigurationError::FeatureMismatch(format!(
                        "{} has no {} encoder",
                        spec.name,
                        spec.kind.type_name()
                    )))
                }
                _ => {
                    return Err(ConfigurationError::FeatureMismatch(format!(
                        "{} is encoded more than once",
                        spec.name
                    )))
                }
            }
        }
        if numeric.len() + categorical.len() != FIELDS.len() {
            return Err(ConfigurationError::FeatureMismatch(format!(
                "{} encoders for {} contract fields",
                numeric.len() + categorical.len(),
                FIELDS.len()
            )));
        }

        for column in &self.categorical {
            let Some(spec) = schema::field(&column.name) else {
                continue;
            };
            let FieldKind::Categorical(contract) = spec.kind else {
                continue;
            };
            let expected: BTreeSet<&str> = contract.iter().copied().collect();
            let found: BTreeSet<&str> = column.categories.iter().map(|c| c.value.as_str()).collect();
            if expected != found || found.len() != column.categories.len() {
                return Err(ConfigurationError::CategoryMismatch {
                    field: spec.name,
                    expected: contract.iter().map(|s| s.to_string()).collect(),
                    found: column.categories.iter().map(|c| c.value.clone()).collect(),
                });
            }
            for category in &column.categories {
                check_finite(&format!("{}={}", column.name, category.value), category.weight)?;
            }
        }

        for column in &self.numeric {
            check_finite(&format!("{} weight", column.name), column.weight)?;
            check_finite(&format!("{} mean", column.name), column.mean)?;
            if !column.scale.is_finite() || column.scale <= 0.0 {
                return Err(ConfigurationError::InvalidParameter(format!(
                    "{} scale must be positive, got {}",
                    column.name, column.scale
                )));
            }
        }

        check_finite("intercept", self.intercept)?;
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigurationError::InvalidParameter(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }
}

fn check_finite(what: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidParameter(format!(
            "{} is not finite ({})",
            what, value
        )))
    }
}

fn describe_name_diff(expected: &[&str], found: &[&str]) -> String {
    let expected_set: HashSet<&str> = expected.iter().copied().collect();
    let found_set: HashSet<&str> = found.iter().copied().collect();
    let mut missing: Vec<&str> = expected.iter().copied().filter(|n| !found_set.contains(n)).collect();
    let mut extra: Vec<&str> = found.iter().copied().filter(|n| !expected_set.contains(n)).collect();
    missing.sort_unstable();
    extra.sort_unstable();

    if missing.is_empty() && extra.is_empty() {
        "fields are out of order".to_string()
    } else {
        format!("missing {:?}, unexpected {:?}", missing, extra)
    }
}

/// Per-field encoder, resolved to contract positions at load time.
#[derive(Debug, Clone)]
enum ColumnEncoder {
    Scaled { mean: f64, scale: f64, weight: f64 },
    OneHot(Vec<(String, f64)>),
}

/// Loaded, validated pipeline. Read-only after construction.
#[derive(Debug, Clone)]
pub struct LogisticPipeline {
    model_id: String,
    model_version: String,
    schema_version: u32,
    encoders: Vec<ColumnEncoder>,
    intercept: f64,
    threshold: f64,
}

impl LogisticPipeline {
    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self, ConfigurationError> {
        artifact.validate()?;

        let mut encoders = Vec::with_capacity(FIELDS.len());
        for spec in FIELDS.iter() {
            let encoder = match spec.kind {
                FieldKind::Integer { .. } => artifact
                    .numeric
                    .iter()
                    .find(|c| c.name == spec.name)
                    .map(|c| ColumnEncoder::Scaled {
                        mean: c.mean,
                        scale: c.scale,
                        weight: c.weight,
                    }),
                FieldKind::Categorical(_) => artifact
                    .categorical
                    .iter()
                    .find(|c| c.name == spec.name)
                    .map(|c| {
                        ColumnEncoder::OneHot(
                            c.categories
                                .iter()
                                .map(|cw| (cw.value.clone(), cw.weight))
                                .collect(),
                        )
                    }),
            };
            let encoder = encoder.ok_or_else(|| {
                ConfigurationError::FeatureMismatch(format!("{} has no encoder", spec.name))
            })?;
            encoders.push(encoder);
        }

        Ok(Self {
            model_id: artifact.model_id,
            model_version: artifact.model_version,
            schema_version: artifact.schema_version,
            encoders,
            intercept: artifact.intercept,
            threshold: artifact.threshold,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Self::from_artifact(PipelineArtifact::from_json(json)?)
    }

    /// Load and validate the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let pipeline = Self::from_artifact(PipelineArtifact::from_file(path)?)?;
        info!(
            "Loaded attrition pipeline {} v{} from {}",
            pipeline.model_id,
            pipeline.model_version,
            path.display()
        );
        Ok(pipeline)
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Signed logit contribution of every encoded feature.
    fn contributions(&self, record: &FeatureRecord) -> Result<Vec<Contribution>, InferenceError> {
        if record.schema_version() != self.schema_version {
            return Err(InferenceError::SchemaMismatch {
                expected: self.schema_version,
                found: record.schema_version(),
            });
        }

        let mut out = Vec::with_capacity(self.encoders.len());
        for ((name, value), encoder) in record.iter().zip(self.encoders.iter()) {
            match (encoder, value) {
                (ColumnEncoder::Scaled { mean, scale, weight }, FeatureValue::Integer(v)) => {
                    out.push(Contribution {
                        feature: name.to_string(),
                        value: weight * ((v as f64 - mean) / scale),
                    });
                }
                (ColumnEncoder::OneHot(weights), FeatureValue::Category(c)) => {
                    let weight = weights
                        .iter()
                        .find(|(category, _)| category == c)
                        .map(|(_, w)| *w)
                        .ok_or_else(|| InferenceError::UnknownCategory {
                            field: name.to_string(),
                            value: c.to_string(),
                        })?;
                    out.push(Contribution {
                        feature: format!("{}={}", name, c),
                        value: weight,
                    });
                }
                _ => {
                    return Err(InferenceError::Classifier(format!(
                        "{} has the wrong type for its encoder",
                        name
                    )))
                }
            }
        }
        Ok(out)
    }
}

impl AttritionClassifier for LogisticPipeline {
    fn predict(&self, record: &FeatureRecord) -> Result<u8, InferenceError> {
        let p = self.predict_proba(record)?;
        Ok(u8::from(p >= self.threshold))
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<f64, InferenceError> {
        let z = self.intercept
            + self
                .contributions(record)?
                .iter()
                .map(|c| c.value)
                .sum::<f64>();
        if !z.is_finite() {
            return Err(InferenceError::NonFiniteScore);
        }
        Ok(sigmoid(z))
    }

    fn describe(&self) -> String {
        format!("{} v{}", self.model_id, self.model_version)
    }

    fn explain(&self, record: &FeatureRecord) -> Vec<Contribution> {
        match self.contributions(record) {
            Ok(mut contributions) => {
                contributions.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
                contributions
            }
            Err(e) => {
                debug!("No explanation available: {}", e);
                Vec::new()
            }
        }
    }
}

/// Logistic sigmoid, stable for large |z|.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::build;
    use crate::input::RawInputSet;
    use approx::assert_abs_diff_eq;

    /// Artifact whose only non-zero parameter is the OverTime one-hot.
    fn overtime_only_artifact() -> PipelineArtifact {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for spec in FIELDS.iter() {
            match spec.kind {
                FieldKind::Integer { .. } => numeric.push(NumericColumn {
                    name: spec.name.to_string(),
                    mean: 0.0,
                    scale: 1.0,
                    weight: 0.0,
                }),
                FieldKind::Categorical(categories) => categorical.push(CategoricalColumn {
                    name: spec.name.to_string(),
                    categories: categories
                        .iter()
                        .map(|c| CategoryWeight {
                            value: c.to_string(),
                            weight: match (spec.name, *c) {
                                ("OverTime", "Yes") => 2.0,
                                ("OverTime", "No") => -2.0,
                                _ => 0.0,
                            },
                        })
                        .collect(),
                }),
            }
        }
        PipelineArtifact {
            model_id: "test".to_string(),
            model_version: "0.0.1".to_string(),
            schema_version: SCHEMA_VERSION,
            feature_names: schema::feature_names().map(String::from).collect(),
            numeric,
            categorical,
            intercept: 0.0,
            threshold: 0.5,
        }
    }

    #[test]
    fn test_sigmoid() {
        assert_abs_diff_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert_abs_diff_eq!(sigmoid(2.0) + sigmoid(-2.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_overtime_drives_probability() {
        let pipeline = LogisticPipeline::from_artifact(overtime_only_artifact()).unwrap();

        let overtime = build(&RawInputSet::form_defaults().with("OverTime", "Yes")).unwrap();
        let p = pipeline.predict_proba(&overtime).unwrap();
        assert_abs_diff_eq!(p, sigmoid(2.0), epsilon = 1e-12);
        assert_eq!(pipeline.predict(&overtime).unwrap(), 1);

        let regular = build(&RawInputSet::form_defaults().with("OverTime", "No")).unwrap();
        assert_abs_diff_eq!(pipeline.predict_proba(&regular).unwrap(), sigmoid(-2.0), epsilon = 1e-12);
        assert_eq!(pipeline.predict(&regular).unwrap(), 0);
    }

    #[test]
    fn test_explain_ranks_by_magnitude() {
        let pipeline = LogisticPipeline::from_artifact(overtime_only_artifact()).unwrap();
        let record = build(&RawInputSet::form_defaults()).unwrap();
        let top = pipeline.explain(&record);
        assert_eq!(top.len(), FIELDS.len());
        assert_eq!(top[0].feature, "OverTime=Yes");
        assert_abs_diff_eq!(top[0].value, 2.0);
    }

    #[test]
    fn test_rejects_wrong_schema_version() {
        let mut artifact = overtime_only_artifact();
        artifact.schema_version = 2;
        assert!(matches!(
            artifact.validate(),
            Err(ConfigurationError::SchemaVersion { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn test_rejects_reordered_features() {
        let mut artifact = overtime_only_artifact();
        artifact.feature_names.swap(0, 1);
        match artifact.validate() {
            Err(ConfigurationError::FeatureMismatch(msg)) => {
                assert_eq!(msg, "fields are out of order")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_feature_name() {
        let mut artifact = overtime_only_artifact();
        artifact.feature_names.retain(|n| n != "JobRole");
        match artifact.validate() {
            Err(ConfigurationError::FeatureMismatch(msg)) => assert!(msg.contains("JobRole")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_category_drift() {
        let mut artifact = overtime_only_artifact();
        let roles = artifact
            .categorical
            .iter_mut()
            .find(|c| c.name == "JobRole")
            .unwrap();
        roles.categories.pop();
        roles.categories.push(CategoryWeight {
            value: "Data Scientist".to_string(),
            weight: 0.0,
        });
        assert!(matches!(
            artifact.validate(),
            Err(ConfigurationError::CategoryMismatch { field: "JobRole", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut artifact = overtime_only_artifact();
        artifact.numeric[0].scale = 0.0;
        assert!(matches!(
            artifact.validate(),
            Err(ConfigurationError::InvalidParameter(_))
        ));

        let mut artifact = overtime_only_artifact();
        artifact.intercept = f64::NAN;
        assert!(matches!(
            artifact.validate(),
            Err(ConfigurationError::InvalidParameter(_))
        ));

        let mut artifact = overtime_only_artifact();
        artifact.threshold = 1.5;
        assert!(matches!(
            artifact.validate(),
            Err(ConfigurationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_numeric_field_encoded_as_category() {
        let mut artifact = overtime_only_artifact();
        let age = artifact.numeric.remove(0);
        artifact.categorical.push(CategoricalColumn {
            name: age.name,
            categories: Vec::new(),
        });
        match artifact.validate() {
            Err(ConfigurationError::FeatureMismatch(msg)) => assert!(msg.starts_with("Age")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            LogisticPipeline::load(&missing),
            Err(ConfigurationError::ArtifactMissing(_))
        ));

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(
            LogisticPipeline::load(&corrupt),
            Err(ConfigurationError::ArtifactCorrupt(_))
        ));
    }

    #[test]
    fn test_load_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        let json = serde_json::to_string_pretty(&overtime_only_artifact()).unwrap();
        std::fs::write(&path, json).unwrap();

        let pipeline = LogisticPipeline::load(&path).unwrap();
        assert_eq!(pipeline.model_id(), "test");
        assert_eq!(pipeline.describe(), "test v0.0.1");
        assert_abs_diff_eq!(pipeline.threshold(), 0.5);
    }
}
