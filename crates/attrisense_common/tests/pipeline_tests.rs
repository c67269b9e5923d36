//! Tests for the shipped pipeline artifact and the feature contract it is fit on.

use approx::assert_abs_diff_eq;
use attrisense_common::inference::AttritionClassifier;
use attrisense_common::model::{LogisticPipeline, PipelineArtifact};
use attrisense_common::schema::{self, FEATURE_COUNT};
use attrisense_common::{
    build, classify, ConfigurationError, FeatureValue, InferenceAdapter, PredictionLabel,
    RawInputSet, RiskTier,
};
use std::path::{Path, PathBuf};

fn artifact_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../models/attrition_pipeline.json")
}

/// Reference employee used across the suite.
fn reference_employee() -> RawInputSet {
    RawInputSet::new()
        .with("Age", 30)
        .with("Gender", "Male")
        .with("MaritalStatus", "Single")
        .with("Department", "Sales")
        .with("JobRole", "Sales Executive")
        .with("Education", 3)
        .with("EducationField", "Marketing")
        .with("JobLevel", 2)
        .with("MonthlyIncome", 5000)
        .with("PercentSalaryHike", 12)
        .with("StockOptionLevel", 1)
        .with("OverTime", "No")
        .with("BusinessTravel", "Travel_Rarely")
        .with("JobSatisfaction", 3)
        .with("EnvironmentSatisfaction", 3)
        .with("RelationshipSatisfaction", 3)
        .with("WorkLifeBalance", 3)
        .with("JobInvolvement", 3)
        .with("TotalWorkingYears", 8)
        .with("YearsAtCompany", 5)
        .with("YearsInCurrentRole", 3)
        .with("YearsWithCurrManager", 3)
        .with("YearsSinceLastPromotion", 2)
        .with("NumCompaniesWorked", 2)
}

#[test]
fn test_reference_record_matches_input() {
    let raw = reference_employee();
    assert!(raw.validate().is_ok());

    let record = build(&raw).unwrap();
    assert_eq!(record.len(), FEATURE_COUNT);

    let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
    assert_eq!(names, schema::feature_names().collect::<Vec<_>>());

    for (name, value) in record.iter() {
        let expected = raw.get(name).unwrap().to_string();
        assert_eq!(value.to_string(), expected, "field {}", name);
    }
    assert_eq!(record.get("JobRole"), Some(FeatureValue::Category("Sales Executive")));
    assert_eq!(record.get("NumCompaniesWorked"), Some(FeatureValue::Integer(2)));
}

#[test]
fn test_shipped_artifact_is_valid() {
    let artifact = PipelineArtifact::from_file(&artifact_path()).unwrap();
    artifact.validate().unwrap();
    assert_eq!(artifact.schema_version, schema::SCHEMA_VERSION);
    assert_eq!(artifact.feature_names.len(), FEATURE_COUNT);
}

#[test]
fn test_reference_prediction_is_stable() {
    let adapter = InferenceAdapter::load(&artifact_path()).unwrap();
    let record = build(&reference_employee()).unwrap();

    let first = adapter.predict(&record).unwrap();
    for _ in 0..10 {
        assert_eq!(adapter.predict(&record).unwrap(), first);
    }

    let reloaded = InferenceAdapter::load(&artifact_path()).unwrap();
    assert_eq!(reloaded.predict(&build(&reference_employee()).unwrap()).unwrap(), first);

    assert_eq!(first.label, PredictionLabel::Retain);
    assert_abs_diff_eq!(first.probability, 0.128177, epsilon = 1e-5);
    assert_eq!(classify(first.probability), RiskTier::Low);
    assert_eq!(first.top_features.len(), 5);
}

#[test]
fn test_form_defaults_score_high() {
    let pipeline = LogisticPipeline::load(&artifact_path()).unwrap();
    let record = build(&RawInputSet::form_defaults()).unwrap();

    let p = pipeline.predict_proba(&record).unwrap();
    assert!(p > 0.9, "p = {}", p);
    assert_eq!(pipeline.predict(&record).unwrap(), 1);

    let top = pipeline.explain(&record);
    assert_eq!(top.len(), FEATURE_COUNT);
    assert!(top[..3].iter().any(|c| c.feature == "OverTime=Yes"));
    assert!(top.windows(2).all(|w| w[0].value.abs() >= w[1].value.abs()));
}

#[test]
fn test_overtime_raises_risk() {
    let adapter = InferenceAdapter::load(&artifact_path()).unwrap();
    let base = adapter.predict(&build(&reference_employee()).unwrap()).unwrap();
    let overtime = adapter
        .predict(&build(&reference_employee().with("OverTime", "Yes")).unwrap())
        .unwrap();
    assert!(overtime.probability > base.probability);
}

#[test]
fn test_category_drift_is_fatal() {
    let json = std::fs::read_to_string(artifact_path()).unwrap();
    let drifted = json.replace("\"Travel_Frequently\"", "\"Travel_Often\"");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drifted.json");
    std::fs::write(&path, drifted).unwrap();

    match InferenceAdapter::load(&path) {
        Err(ConfigurationError::CategoryMismatch { field, found, .. }) => {
            assert_eq!(field, "BusinessTravel");
            assert!(found.contains(&"Travel_Often".to_string()));
        }
        other => panic!("expected category mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_renamed_feature_is_fatal() {
    let json = std::fs::read_to_string(artifact_path()).unwrap();
    let renamed = json.replace("\"YearsWithCurrManager\"", "\"YearsWithManager\"");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("renamed.json");
    std::fs::write(&path, renamed).unwrap();

    assert!(matches!(
        InferenceAdapter::load(&path),
        Err(ConfigurationError::FeatureMismatch(_))
    ));
}

#[test]
fn test_demo_record_is_the_reference_employee() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/employee.toml");
    let raw = RawInputSet::from_path(&path).unwrap();
    assert_eq!(raw, reference_employee());
}
